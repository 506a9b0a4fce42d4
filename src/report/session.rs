use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

const MAX_CREATE_ATTEMPTS: usize = 5;

/// A freshly created output directory named by a random UUID v4.
///
/// The directory is never removed implicitly; call [`SessionDir::remove`]
/// when the images are no longer needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDir {
    id: Uuid,
    path: PathBuf,
}

impl SessionDir {
    /// Create a new session directory under `root`, creating `root` first
    /// when it is missing.
    ///
    /// Creation of the leaf is atomic, so two concurrent sessions can never
    /// end up sharing a directory.
    pub fn create(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let mut last_err = None;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let id = Uuid::new_v4();
            let path = root.join(id.to_string());
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    tracing::debug!("Created session directory {}", path.display());
                    return Ok(Self { id, path });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!(
                        "Session directory {} already exists; drawing a new id",
                        path.display()
                    );
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AlreadyExists, "no free session directory name")
        }))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `file_name` inside the session directory.
    pub fn join(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }

    /// Delete the directory and everything in it.
    pub fn remove(self) -> io::Result<()> {
        std::fs::remove_dir_all(&self.path)
    }
}
