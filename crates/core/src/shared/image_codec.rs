//! Conversions between encoded bytes / files and [`Image`].
//!
//! The only place the `image` crate's codecs are touched; the rest of the
//! crate works with decoded RGB buffers.
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::shared::constants::OUTPUT_JPEG_QUALITY;
use crate::shared::error::FaceSwapError;
use crate::shared::image::Image;

/// Decodes any format the `image` crate recognizes into an RGB image.
pub fn decode_image(bytes: &[u8]) -> Result<Image, FaceSwapError> {
    if bytes.is_empty() {
        return Err(FaceSwapError::InvalidImage("Could not decode image".into()));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| FaceSwapError::InvalidImage(format!("Invalid image format: {e}")))?;
    let image = Image::from_rgb(decoded.to_rgb8());
    if image.is_empty() {
        return Err(FaceSwapError::InvalidImage("Image dimensions are zero".into()));
    }
    Ok(image)
}

/// Reads and decodes an image file from disk.
pub fn load_image_file(path: &Path) -> Result<Image, Box<dyn std::error::Error + Send + Sync>> {
    let decoded = image::open(path)?;
    let image = Image::from_rgb(decoded.to_rgb8());
    if image.is_empty() {
        return Err(format!("Image has zero dimensions: {}", path.display()).into());
    }
    Ok(image)
}

pub fn encode_jpeg(image: &Image) -> Result<Vec<u8>, FaceSwapError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, OUTPUT_JPEG_QUALITY);
    encoder
        .encode_image(&image.to_rgb())
        .map_err(|e| FaceSwapError::Model(Box::new(e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let image = decode_image(&png_bytes(8, 4)).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 4);
        assert_eq!(&image.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_decode_garbage_is_invalid_image() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, FaceSwapError::InvalidImage(_)));
        assert!(err.to_string().starts_with("Invalid image format"));
    }

    #[test]
    fn test_decode_empty_payload_is_invalid_image() {
        let err = decode_image(&[]).unwrap_err();
        assert!(matches!(err, FaceSwapError::InvalidImage(_)));
    }

    #[test]
    fn test_truncated_jpeg_header_is_invalid_image() {
        let bytes = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01\x01\x01\x00H\x00H\x00\x00\
                      \xff\xdb\x00C\x00";
        assert!(matches!(
            decode_image(bytes),
            Err(FaceSwapError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_produces_decodable_jpeg() {
        let image = Image::new(vec![128u8; 16 * 16 * 3], 16, 16);
        let jpeg = encode_jpeg(&image).unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        let back = decode_image(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (16, 16));
    }

    #[test]
    fn test_load_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.png");
        std::fs::write(&path, png_bytes(5, 7)).unwrap();
        let image = load_image_file(&path).unwrap();
        assert_eq!((image.width(), image.height()), (5, 7));
    }

    #[test]
    fn test_load_image_file_missing() {
        assert!(load_image_file(Path::new("/nonexistent/dest.jpg")).is_err());
    }
}
