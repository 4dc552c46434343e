use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {0} is not cached, bundled or downloadable")]
    Unavailable(String),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Where to look for one model file.
#[derive(Clone, Debug, Default)]
pub struct ModelSource<'a> {
    pub name: &'a str,
    /// Configured path; when set it must exist and nothing else is tried.
    pub explicit: Option<&'a Path>,
    pub bundled_dir: Option<&'a Path>,
    pub url: Option<&'a str>,
}

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicitly configured path
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory
/// 4. Download from URL to cache
pub fn resolve(source: &ModelSource<'_>) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = source.explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ModelResolveError::Missing(path.to_path_buf()));
    }

    let cache_dir = model_cache_dir()?;
    resolve_in(source, &cache_dir)
}

fn resolve_in(source: &ModelSource<'_>, cache_dir: &Path) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(source.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = source.bundled_dir {
        let bundled_path = dir.join(source.name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    let Some(url) = source.url else {
        return Err(ModelResolveError::Unavailable(source.name.to_string()));
    };
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", source.name);
    download(url, &cached_path)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Swaparoony/models/`
/// - Linux: `$XDG_CACHE_HOME/Swaparoony/models/` or `~/.cache/Swaparoony/models/`
/// - Windows: `%LOCALAPPDATA%/Swaparoony/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Swaparoony").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Swaparoony").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(url: &str, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    // Stream to disk; models can be several hundred MB.
    let mut buf = vec![0u8; 1024 * 1024];
    let mut downloaded: u64 = 0;
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
    }
    file.flush().map_err(write_err)?;
    drop(file);
    log::info!("Downloaded {downloaded} bytes to {}", dest.display());

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.onnx");
        fs::write(&path, b"model").unwrap();

        let resolved = resolve(&ModelSource {
            name: "other.onnx",
            explicit: Some(&path),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.onnx");
        let err = resolve(&ModelSource {
            name: "absent.onnx",
            explicit: Some(&path),
            url: Some("http://invalid.example.com/model.onnx"),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelResolveError::Missing(p) if p == path));
    }

    #[test]
    fn test_cached_file_preferred_over_bundled() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&bundled).unwrap();
        fs::write(cache.join("m.onnx"), b"cached").unwrap();
        fs::write(bundled.join("m.onnx"), b"bundled").unwrap();

        let source = ModelSource {
            name: "m.onnx",
            bundled_dir: Some(&bundled),
            ..Default::default()
        };
        assert_eq!(resolve_in(&source, &cache).unwrap(), cache.join("m.onnx"));
    }

    #[test]
    fn test_bundled_file_found() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("m.onnx"), b"bundled").unwrap();

        let source = ModelSource {
            name: "m.onnx",
            bundled_dir: Some(&bundled),
            ..Default::default()
        };
        let resolved = resolve_in(&source, &tmp.path().join("cache")).unwrap();
        assert_eq!(resolved, bundled.join("m.onnx"));
    }

    #[test]
    fn test_not_downloadable_model_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let source = ModelSource {
            name: "inswapper_128.onnx",
            ..Default::default()
        };
        let err = resolve_in(&source, tmp.path()).unwrap_err();
        assert!(matches!(err, ModelResolveError::Unavailable(_)));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Swaparoony"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        assert!(download("http://invalid.nonexistent.example.com/model", &dest).is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
