mod api_error;
mod app;
mod kserve;
mod rest;
mod settings;
#[cfg(test)]
mod test_support;
mod wire;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use swaparoony_core::model::infrastructure::onnx_face_model::OnnxModelLoader;
use swaparoony_core::pipeline::face_swap_service::FaceSwapService;

use crate::app::{router, AppState};
use crate::settings::Settings;

/// Face swap service: REST and KServe endpoints over preloaded destination images.
#[derive(Parser, Debug)]
#[command(name = "swaparoony", version)]
struct Cli {
    /// JSON settings file.
    #[arg(long, env = "SWAPAROONY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Destination image; repeat for several. Replaces the configured list.
    #[arg(long = "destination")]
    destinations: Vec<PathBuf>,

    /// Swap requests processed at once.
    #[arg(long)]
    max_concurrent_requests: Option<usize>,

    /// Directory searched for model files.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.host = host;
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if !self.destinations.is_empty() {
            settings.destination_images = self.destinations;
        }
        if let Some(n) = self.max_concurrent_requests {
            settings.max_concurrent_requests = n;
        }
        if let Some(dir) = self.model_dir {
            settings.model_dir = Some(dir);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate()?;

    // Model download uses a blocking HTTP client, so this runs before the
    // async runtime exists.
    let service = FaceSwapService::new(
        Box::new(OnnxModelLoader::new(settings.model_config())),
        settings.destination_images.clone(),
    );
    service.initialize()?;
    let status = service.status();
    log::info!(
        "Face swap service ready with {} destination images",
        status.destination_images_count
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(settings, Arc::new(service)))
}

async fn serve(
    settings: Settings,
    service: Arc<FaceSwapService>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(service, &settings);
    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    log::info!(
        "Listening on {} (model {})",
        listener.local_addr()?,
        settings.model_name
    );
    let shutdown_state = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_state.close();
        })
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("swaparoony").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_overrides_settings() {
        let mut settings = Settings {
            destination_images: vec![PathBuf::from("configured.jpg")],
            ..Default::default()
        };
        parse(&[
            "--host",
            "127.0.0.1",
            "--port",
            "9001",
            "--destination",
            "a.jpg",
            "--destination",
            "b.jpg",
            "--max-concurrent-requests",
            "2",
        ])
        .apply(&mut settings);

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 9001);
        assert_eq!(
            settings.destination_images,
            vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]
        );
        assert_eq!(settings.max_concurrent_requests, 2);
    }

    #[test]
    fn test_cli_without_flags_keeps_settings() {
        let original = Settings {
            destination_images: vec![PathBuf::from("configured.jpg")],
            port: 8123,
            ..Default::default()
        };
        let mut settings = original.clone();
        parse(&[]).apply(&mut settings);
        assert_eq!(settings, original);
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["swaparoony", "--port", "http"]).is_err());
    }
}
