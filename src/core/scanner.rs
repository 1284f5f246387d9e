use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::DiscoverError;

/// Extension of the source files the scanner visits.
pub const SOURCE_EXTENSION: &str = "go";

const VENDOR_DIR: &str = "vendor";
const TESTDATA_DIR: &str = "testdata";
const TEST_FILE_SUFFIX: &str = "_test.go";

/// Skip rules applied while walking a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Prune directories whose name starts with `.`.
    pub skip_hidden: bool,
    /// Prune `vendor` directories.
    pub skip_vendor: bool,
    /// Prune `testdata` directories.
    pub skip_testdata: bool,
    /// Skip `*_test.go` files.
    pub skip_tests: bool,
    /// Additional directory names to prune.
    pub exclude_dirs: BTreeSet<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            skip_vendor: true,
            skip_testdata: true,
            skip_tests: true,
            exclude_dirs: BTreeSet::new(),
        }
    }
}

impl WalkOptions {
    /// Options with every skip rule disabled.
    pub fn permissive() -> Self {
        Self {
            skip_hidden: false,
            skip_vendor: false,
            skip_testdata: false,
            skip_tests: false,
            exclude_dirs: BTreeSet::new(),
        }
    }

    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    pub fn with_skip_vendor(mut self, skip: bool) -> Self {
        self.skip_vendor = skip;
        self
    }

    pub fn with_skip_testdata(mut self, skip: bool) -> Self {
        self.skip_testdata = skip;
        self
    }

    pub fn with_skip_tests(mut self, skip: bool) -> Self {
        self.skip_tests = skip;
        self
    }

    pub fn with_excluded_dir(mut self, name: impl Into<String>) -> Self {
        self.exclude_dirs.insert(name.into());
        self
    }

    /// Whether a directory with this name is pruned, descendants included.
    pub fn excludes_dir(&self, name: &str) -> bool {
        (self.skip_hidden && name.starts_with('.'))
            || (self.skip_vendor && name == VENDOR_DIR)
            || (self.skip_testdata && name == TESTDATA_DIR)
            || self.exclude_dirs.contains(name)
    }

    /// Whether a file with this name is a source file the walk should visit.
    pub fn accepts_file(&self, name: &str) -> bool {
        let is_source = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == SOURCE_EXTENSION);

        is_source && !(self.skip_tests && name.ends_with(TEST_FILE_SUFFIX))
    }
}

/// Enumerates candidate source files under a root.
#[derive(Debug, Clone, Default)]
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    /// Calls `visit` for every accepted source file under `root`, in sorted
    /// order. Stops at the first traversal error and returns it.
    pub fn walk<F>(
        &self,
        root: &Path,
        options: &WalkOptions,
        mut visit: F,
    ) -> Result<(), DiscoverError>
    where
        F: FnMut(&Path),
    {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_pruned(entry, options));

        for entry in walker {
            let entry = entry.map_err(|source| DiscoverError::Walk {
                root: root.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let accepted = entry
                .file_name()
                .to_str()
                .is_some_and(|name| options.accepts_file(name));
            if accepted {
                visit(entry.path());
            }
        }

        Ok(())
    }

    /// Collects every accepted source file under `root`.
    pub fn scan_directory(
        &self,
        root: &Path,
        options: &WalkOptions,
    ) -> Result<Vec<PathBuf>, DiscoverError> {
        let mut files = Vec::new();
        self.walk(root, options, |path| files.push(path.to_path_buf()))?;
        Ok(files)
    }
}

fn is_pruned(entry: &DirEntry, options: &WalkOptions) -> bool {
    // The root itself is never pruned, even when it is e.g. a hidden directory.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    entry
        .file_name()
        .to_str()
        .is_some_and(|name| options.excludes_dir(name))
}
