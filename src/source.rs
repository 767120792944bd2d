//! Reading RAML sources from disk.
//!
//! Every file the parser touches, the root document as well as anything
//! pulled in through `!include`, is read through [`read`]. There is no
//! caching and no retrying; a failed read is terminal for the parse.

use std::{
    io,
    path::{Path, PathBuf},
};

/// Reads the file `name` relative to `directory`.
///
/// An absolute `name` replaces `directory` entirely.
///
/// # Errors
///
/// Returns an error if `name` is empty, or if the file cannot be found or
/// read.
#[tracing::instrument(level = "debug")]
pub fn read(directory: &Path, name: &Path) -> Result<Vec<u8>, FileError> {
    let path = directory.join(name);

    if name.as_os_str().is_empty() {
        return Err(FileError::EmptyName(path));
    }

    std::fs::read(&path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => FileError::NotFound { path },
        _ => FileError::Unreadable { path, source },
    })
}

/// Reads the file `name` relative to `directory` as UTF-8 text.
///
/// # Errors
///
/// Returns an error if the file cannot be read (see [`read`]) or is not
/// valid UTF-8.
pub fn read_to_string(directory: &Path, name: &Path) -> Result<String, FileError> {
    let bytes = read(directory, name)?;
    String::from_utf8(bytes).map_err(|_| FileError::Encoding {
        path: directory.join(name),
    })
}

/// Errors that can occur when reading a source file.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The file name was empty.
    #[error("file name cannot be empty: {}", .0.display())]
    EmptyName(PathBuf),

    /// The file does not exist.
    #[error("could not find file {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("could not read file {}", path.display())]
    Unreadable {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The file is not valid UTF-8.
    #[error("file {} is not valid UTF-8", path.display())]
    Encoding {
        /// The path that was read.
        path: PathBuf,
    },
}

impl FileError {
    /// The full path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::EmptyName(path)
            | Self::NotFound { path }
            | Self::Unreadable { path, .. }
            | Self::Encoding { path } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn reads_relative_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("api.raml"), "#%RAML 0.8\n").unwrap();

        let bytes = read(tmp.path(), Path::new("api.raml")).unwrap();
        assert_eq!(bytes, b"#%RAML 0.8\n");
    }

    #[test]
    fn absolute_name_replaces_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("schema.json");
        std::fs::write(&file, "{}").unwrap();

        let text = read_to_string(Path::new("/nonexistent"), &file).unwrap();
        assert_eq!(text, "{}");
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let error = read(tmp.path(), Path::new("missing.raml")).unwrap_err();

        assert!(matches!(error, FileError::NotFound { .. }));
        assert_eq!(error.path(), tmp.path().join("missing.raml"));
        assert!(error.to_string().contains("missing.raml"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let error = read(tmp.path(), Path::new("")).unwrap_err();
        assert!(matches!(error, FileError::EmptyName(_)));
    }

    #[test]
    fn directory_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        let error = read(tmp.path(), Path::new("sub")).unwrap_err();
        assert!(matches!(error, FileError::Unreadable { .. }));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bin.raml"), [0xff, 0xfe, 0x00]).unwrap();

        let error = read_to_string(tmp.path(), Path::new("bin.raml")).unwrap_err();
        assert!(matches!(error, FileError::Encoding { .. }));
    }
}
