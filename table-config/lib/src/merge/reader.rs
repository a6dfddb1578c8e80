use std::future::Future;
use std::path::Path;

/// Supplies the previous content of an output file.
///
/// A reader never fails: anything that prevents reading is reported as
/// `None`, which the merge treats as "no baseline".
pub trait ExistingFileReader: Send + Sync {
    fn read(&self, path: &Path) -> impl Future<Output = Option<String>> + Send;
}

/// Reads existing files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl ExistingFileReader for FsReader {
    async fn read(&self, path: &Path) -> Option<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no existing file");
                None
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "failed to read existing file");
                None
            }
        }
    }
}
