//! Temporary files for exercising file sources and sinks.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// A temporary file that is deleted when dropped.
pub struct TempFilePath {
    #[allow(dead_code)]
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// Create a new, empty temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn new() -> std::io::Result<Self> {
        Self::with_contents(b"")
    }

    /// Create a temporary file holding `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn with_contents(bytes: &[u8]) -> std::io::Result<Self> {
        let mut temp_file = tempfile::Builder::new()
            .prefix("textbeam-")
            .suffix(".txt")
            .tempfile()?;
        temp_file.write_all(bytes)?;
        temp_file.flush()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory that is deleted, with its contents, when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path inside this directory. Nothing is created.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// Names of the entries currently in the directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn entries(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Create a temporary UTF-8 text file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created.
///
/// # Example
///
/// ```
/// use textbeam::testing::text_file;
///
/// let input = text_file("Hello\tWorld").unwrap();
/// assert_eq!(std::fs::read_to_string(input.path()).unwrap(), "Hello\tWorld");
/// ```
pub fn text_file(contents: &str) -> std::io::Result<TempFilePath> {
    TempFilePath::with_contents(contents.as_bytes())
}
