use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// On-disk storage for uploaded media.
///
/// Each upload lives at `{dir}/{uuid}/{sanitized name}`; the database keeps
/// the `{uuid}/{name}` part as the file's `filename`.
pub struct Storage {
    dir: PathBuf,
}

/// Result of writing an upload to disk.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub relative_path: String,
    pub sha256: String,
    pub size: u64,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Absolute path for a stored relative path. Rejects anything that could
    /// escape the storage directory.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            bail!("Refusing storage path outside upload dir: {}", relative);
        }
        Ok(self.dir.join(rel))
    }

    /// Write an upload under a fresh folder and hash it.
    pub async fn save(&self, original_name: Option<&str>, data: &[u8]) -> Result<StoredFile> {
        let folder = Uuid::new_v4().to_string();
        let name = sanitize_filename(original_name.unwrap_or_default());
        let relative_path = format!("{}/{}", folder, name);

        fs::create_dir_all(self.dir.join(&folder)).await?;
        let path = self.resolve(&relative_path)?;
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        let sha256 = hex::encode(Sha256::digest(data));

        Ok(StoredFile {
            relative_path,
            sha256,
            size: data.len() as u64,
        })
    }

    pub async fn open(&self, relative: &str) -> Result<fs::File> {
        let path = self.resolve(relative)?;
        Ok(fs::File::open(&path).await?)
    }

    /// Delete a stored file and its per-upload folder.
    pub async fn delete(&self, relative: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => info!("Deleted stored file {}", relative),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Stored file {} already gone", relative);
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent().filter(|p| *p != self.dir.as_path()) {
            // Only removes the folder when empty
            let _ = fs::remove_dir(parent).await;
        }
        Ok(())
    }

    /// Best-effort removal of files whose rows were already deleted.
    pub async fn delete_all(&self, relatives: &[String]) {
        for relative in relatives {
            if let Err(e) = self.delete(relative).await {
                warn!("Failed to delete stored file {}: {}", relative, e);
            }
        }
    }
}

/// Reduce a client-supplied filename to its last path segment made of
/// `[A-Za-z0-9._-]`. Falls back to `file` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');

    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.chars().take(255).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cat pic.jpg"), "cat_pic.jpg");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[tokio::test]
    async fn save_open_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path().to_path_buf()).await.unwrap();

        let stored = storage.save(Some("notes.txt"), b"hello").await.unwrap();
        assert!(stored.relative_path.ends_with("/notes.txt"));
        assert_eq!(stored.size, 5);
        assert_eq!(
            stored.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let path = storage.resolve(&stored.relative_path).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        storage.delete(&stored.relative_path).await.unwrap();
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());

        // Second delete is a no-op
        storage.delete(&stored.relative_path).await.unwrap();
    }

    #[tokio::test]
    async fn resolve_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path().to_path_buf()).await.unwrap();
        assert!(storage.resolve("../outside").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("abc/file.txt").is_ok());
    }
}
