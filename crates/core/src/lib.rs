pub mod detection {
    pub mod domain {
        pub mod face;
        pub mod face_landmarks;
    }
    pub mod infrastructure {
        pub mod arcface_embedder;
        pub mod execution_provider;
        pub mod model_resolver;
        pub mod onnx_yolo_detector;
    }
}

pub mod model {
    pub mod domain {
        pub mod face_model;
    }
    pub mod infrastructure {
        pub mod onnx_face_model;
    }
}

pub mod swapping {
    pub mod infrastructure {
        pub mod inswapper_swapper;
    }
}

pub mod pipeline {
    pub mod face_swap_service;
}

pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod image;
    pub mod image_codec;
    pub mod upload;
}
