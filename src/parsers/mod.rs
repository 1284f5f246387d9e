pub mod common;
pub mod go;

use std::path::{Path, PathBuf};
use tree_sitter::{Node as TSNode, Tree};

/// A successfully parsed source file. Read-only once built.
pub struct SyntaxTree {
    path: PathBuf,
    source: String,
    tree: Tree,
}

impl SyntaxTree {
    pub(crate) fn new(path: PathBuf, source: String, tree: Tree) -> Self {
        Self { path, source, tree }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn root(&self) -> TSNode<'_> {
        self.tree.root_node()
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("path", &self.path)
            .field("root", &self.root().kind())
            .finish()
    }
}
