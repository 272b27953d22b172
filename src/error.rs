use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, OldFolderError>;

#[derive(Debug, Error)]
pub enum OldFolderError {
    #[error("Path does not exist or is not a directory: {}", path.display())]
    RootPathNotFound { path: PathBuf },

    #[error(
        "The operation has been aborted because a folder\n\
         named {name} already exists in that location.\n\
         Please try again using a different storage folder name."
    )]
    FolderAlreadyExists { name: String, root: PathBuf },

    #[error("Invalid storage folder name {name:?}: must be a single folder name")]
    InvalidStorageName { name: String },

    #[error("Invalid number of years {years}: must be a non-negative number")]
    InvalidThreshold { years: f64 },

    #[error("Failed to {operation} {}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(
        "Failed to move {} to {} ({completed} move(s) already completed)",
        from.display(),
        to.display()
    )]
    Move {
        from: PathBuf,
        to: PathBuf,
        completed: usize,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read answer from standard input")]
    ReadAnswer {
        #[source]
        source: io::Error,
    },

    #[error("Failed to read confirmation")]
    Prompt {
        #[source]
        source: dialoguer::Error,
    },
}

impl OldFolderError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_the_folder() {
        let err = OldFolderError::FolderAlreadyExists {
            name: "old_stuff".to_string(),
            root: PathBuf::from("/data"),
        };
        assert_eq!(
            err.to_string(),
            "The operation has been aborted because a folder\n\
             named old_stuff already exists in that location.\n\
             Please try again using a different storage folder name."
        );
    }

    #[test]
    fn root_not_found_names_the_path() {
        let err = OldFolderError::RootPathNotFound {
            path: PathBuf::from("/no/such/place"),
        };
        assert!(err.to_string().contains("/no/such/place"));
    }
}
