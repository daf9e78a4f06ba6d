//! Scoped directory for one run's transient artifacts.
//!
//! A [`Workspace`] is created by [`Workspace::acquire`] before any stage
//! writes, and removed by [`Workspace::release`] on every exit path. If a
//! run is abandoned without calling `release` (panic, dropped future), the
//! `Drop` impl removes the directory synchronously.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use vedit_models::frame_filename;

use crate::error::MediaResult;

/// Entry document served to the rendering surface.
pub const ENTRY_DOCUMENT: &str = "index.html";
/// Concat demuxer list file.
pub const CONCAT_LIST: &str = "concat.txt";

/// A file or directory that could not be removed during release.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create the workspace directory. Succeeds if it already exists.
    pub async fn acquire(root: impl AsRef<Path>) -> MediaResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!(workspace = %root.display(), "Workspace acquired");
        Ok(Self {
            root,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path for a named artifact inside the workspace.
    pub fn artifact_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Path of frame `index` in a capture of `frame_count` frames.
    pub fn frame_path(&self, index: u32, frame_count: u32) -> PathBuf {
        self.root.join(frame_filename(index, frame_count))
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.root.join(CONCAT_LIST)
    }

    /// Create (or reuse) a subdirectory for staged intermediates.
    pub async fn subdir(&self, name: &str) -> MediaResult<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Write the entry document and return its path.
    pub async fn write_document(&self, contents: &str) -> MediaResult<PathBuf> {
        let path = self.root.join(ENTRY_DOCUMENT);
        fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Remove every entry, then the directory itself.
    ///
    /// A failed removal is recorded and the remaining entries are still
    /// attempted. Never returns an error.
    pub async fn release(mut self) -> Vec<CleanupFailure> {
        self.released = true;
        let mut failures = Vec::new();

        match fs::read_dir(&self.root).await {
            Ok(mut entries) => loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        failures.push(CleanupFailure {
                            path: self.root.clone(),
                            error: e.to_string(),
                        });
                        break;
                    }
                };

                let path = entry.path();
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                let result = if is_dir {
                    fs::remove_dir_all(&path).await
                } else {
                    fs::remove_file(&path).await
                };

                if let Err(e) = result {
                    warn!(path = %path.display(), error = %e, "Failed to remove workspace entry");
                    failures.push(CleanupFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return failures,
            Err(e) => failures.push(CleanupFailure {
                path: self.root.clone(),
                error: e.to_string(),
            }),
        }

        // Whatever survived the per-entry pass goes with the directory. When
        // an entry already failed, the directory cannot be empty and that
        // entry is the failure worth reporting.
        if let Err(e) = fs::remove_dir_all(&self.root).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(workspace = %self.root.display(), error = %e, "Failed to remove workspace");
                if failures.is_empty() {
                    failures.push(CleanupFailure {
                        path: self.root.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(
            workspace = %self.root.display(),
            failures = failures.len(),
            "Workspace released"
        );
        failures
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => warn!(workspace = %self.root.display(), "Workspace removed without release"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(workspace = %self.root.display(), error = %e, "Failed to remove abandoned workspace")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_acquire_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("frames");

        let first = Workspace::acquire(&root).await.unwrap();
        fs::write(first.artifact_path("keep.txt"), b"x").await.unwrap();
        let second = Workspace::acquire(&root).await.unwrap();

        assert!(second.artifact_path("keep.txt").exists());
        assert!(first.release().await.is_empty());
        assert!(second.release().await.is_empty());
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_release_removes_files_and_subdirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("run");
        let ws = Workspace::acquire(&root).await.unwrap();

        ws.write_document("<html></html>").await.unwrap();
        fs::write(ws.frame_path(0, 60), b"png").await.unwrap();
        let staged = ws.subdir("gif-input").await.unwrap();
        fs::write(staged.join("enc-00000.png"), b"png").await.unwrap();

        let failures = ws.release().await;
        assert!(failures.is_empty());
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_release_of_missing_directory_is_quiet() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("gone");
        let ws = Workspace::acquire(&root).await.unwrap();
        fs::remove_dir_all(&root).await.unwrap();

        assert!(ws.release().await.is_empty());
    }

    #[tokio::test]
    async fn test_drop_without_release_removes_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("abandoned");
        {
            let ws = Workspace::acquire(&root).await.unwrap();
            fs::write(ws.artifact_path("partial.gif"), b"gif").await.unwrap();
        }
        assert!(!root.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_release_continues_past_a_stuck_entry() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("run");
        let ws = Workspace::acquire(&root).await.unwrap();

        ws.write_document("<html></html>").await.unwrap();
        fs::write(ws.frame_path(0, 60), b"png").await.unwrap();
        fs::write(ws.frame_path(1, 60), b"png").await.unwrap();
        let staged = ws.subdir("gif-input").await.unwrap();
        fs::write(staged.join("enc-00000.png"), b"png").await.unwrap();

        // A read-only directory whose file cannot be unlinked
        let locked = ws.subdir("locked").await.unwrap();
        fs::write(locked.join("frame.png"), b"png").await.unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory permissions.
        if std::fs::write(locked.join("write-check"), b"").is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            ws.release().await;
            return;
        }

        let failures = ws.release().await;

        let remaining: Vec<PathBuf> = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(remaining, vec![locked.clone()]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, locked);
        assert!(!failures[0].error.is_empty());
    }

    #[test]
    fn test_frame_path_naming() {
        let ws = Workspace {
            root: PathBuf::from("frames"),
            released: true,
        };
        assert_eq!(ws.frame_path(7, 60), PathBuf::from("frames/frame-007.png"));
        assert_eq!(ws.concat_list_path(), PathBuf::from("frames/concat.txt"));
    }
}
