//! Temp-file storage for uploaded multipart fields.
//!
//! Files land in `<root>/<folder>/<ticks>.tmp`, where `ticks` counts 100 ns
//! intervals since the Unix epoch. The folder is created on first use. Two
//! uploads landing in the same tick get consecutive stamps; a file is never
//! overwritten.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::Result;

const MAX_NAME_ATTEMPTS: u128 = 64;

/// A directory that uploaded files are copied into.
#[derive(Clone, Debug)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens a fresh, uniquely named file under `folder`.
    pub async fn create(&self, folder: &str) -> Result<(PathBuf, File)> {
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).await?;

        let stamp = ticks();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(format!("{}.tmp", stamp + attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free temp name in {}", dir.display()),
        )
        .into())
    }

    /// Copies one multipart field into a new temp file and returns its path.
    ///
    /// If the field breaks off or the write fails, the partial file is
    /// removed before the error is returned.
    pub async fn save_field(&self, folder: &str, mut field: multer::Field<'_>) -> Result<PathBuf> {
        let (path, mut file) = self.create(folder).await?;

        let written = match copy_field(&mut field, &mut file).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(rm) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), "failed to remove partial upload: {rm}");
                }
                return Err(e);
            }
        };

        debug!(
            field = field.name().unwrap_or_default(),
            file_name = field.file_name().unwrap_or_default(),
            path = %path.display(),
            bytes = written,
            "upload stored"
        );
        Ok(path)
    }
}

async fn copy_field(field: &mut multer::Field<'_>, file: &mut File) -> Result<usize> {
    let mut written = 0;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;
    Ok(written)
}

fn ticks() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() / 100)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_never_reuses_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = TempStore::new(dir.path());

        let (first, _) = store.create("uploads").await.unwrap();
        let (second, _) = store.create("uploads").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(dir.path().join("uploads").as_path()));
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("tmp"));
    }
}
