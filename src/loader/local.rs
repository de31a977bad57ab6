use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Loader for templates used in place from the local filesystem.
pub struct LocalLoader<P: AsRef<Path>> {
    path: P,
}

impl<P: AsRef<Path>> LocalLoader<P> {
    /// Creates a new LocalLoader instance.
    pub fn new(path: P) -> Self {
        Self { path }
    }

    /// Returns the template directory.
    ///
    /// # Errors
    /// * `Error::TemplateDoesNotExistsError` if the path is not a directory
    pub fn load(&self) -> Result<PathBuf> {
        let path = self.path.as_ref();
        if !path.is_dir() {
            return Err(Error::TemplateDoesNotExistsError {
                template_dir: path.display().to_string(),
            });
        }

        Ok(path.to_path_buf())
    }
}
