use std::path::PathBuf;

use crate::error::Error;

/// Resolves image sources referenced by a captured view.
///
/// Loads run on a worker thread and are abandoned once the capture budget is
/// spent, so an implementation may block without stalling generation.
pub trait AssetLoader: Send + Sync {
    fn load(&self, src: &str) -> Result<Vec<u8>, Error>;
}

/// Reads sources as file paths, relative ones against `root`.
pub struct FsAssetLoader {
    root: PathBuf,
    max_bytes: u64,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>, Error> {
        let src = src.strip_prefix("file://").unwrap_or(src);
        let path = self.root.join(src);
        let len = std::fs::metadata(&path)
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", e, path.display()),
                ))
            })?
            .len();
        if len > self.max_bytes {
            return Err(Error::Io(std::io::Error::other(format!(
                "{}: {len} bytes exceeds the {} byte asset limit",
                path.display(),
                self.max_bytes
            ))));
        }
        Ok(std::fs::read(&path)?)
    }
}
