use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the discovery engine.
///
/// During a multi-root scan these are collected into
/// [`DiscoverResult::errors`](crate::core::DiscoverResult) instead of aborting;
/// single-file entry points return them directly.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("root not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("dependency cycle in {} involving `{name}`", file.display())]
    DependencyCycle { file: PathBuf, name: String },
}

impl DiscoverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
