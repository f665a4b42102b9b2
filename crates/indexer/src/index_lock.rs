use crate::{IndexerError, Result};
use codeqa_vector_store::lock_path_for_project_root;
use fs2::FileExt;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Exclusive advisory lock on `<root>/.codeqa/index.lock`, released on drop
pub(crate) struct IndexWriteLock {
    file: File,
}

impl Drop for IndexWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub(crate) async fn acquire_index_write_lock(root: &Path) -> Result<IndexWriteLock> {
    let path = lock_path_for_project_root(root);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::task::spawn_blocking(move || -> Result<IndexWriteLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                IndexerError::Other(format!("open index lock {}: {err}", path.display()))
            })?;

        let start = Instant::now();
        file.lock_exclusive().map_err(|err| {
            IndexerError::Other(format!("acquire index lock {}: {err}", path.display()))
        })?;
        log::debug!(
            "Acquired index lock {} after {}ms",
            path.display(),
            start.elapsed().as_millis()
        );

        Ok(IndexWriteLock { file })
    })
    .await
    .map_err(|err| IndexerError::Other(format!("join index lock task: {err}")))?
}
