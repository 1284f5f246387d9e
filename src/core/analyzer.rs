use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{DiscoverResult, DiscoveredResource, FileScanner, TypeClassifier, WalkOptions};
use crate::error::DiscoverError;
use crate::parsers::go::{extract_dependencies, GoParser};
use crate::parsers::SyntaxTree;

/// Drives the walk and the per-file pipeline over a set of roots.
#[derive(Debug, Clone)]
pub struct ResourceDiscoverer {
    file_scanner: FileScanner,
    parser: GoParser,
    options: WalkOptions,
    parallel: bool,
}

impl ResourceDiscoverer {
    pub fn new(options: WalkOptions) -> Self {
        Self {
            file_scanner: FileScanner::new(),
            parser: GoParser::new(),
            options,
            parallel: true,
        }
    }

    /// Process files on the rayon pool. Output order does not depend on this.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Scans every root and aggregates the outcome.
    ///
    /// Never fails: missing roots, walk failures and unparsable files are
    /// recorded in [`DiscoverResult::errors`] and the scan moves on.
    pub fn discover<P, C>(&self, roots: &[P], classifier: &C) -> DiscoverResult
    where
        P: AsRef<Path>,
        C: TypeClassifier + ?Sized,
    {
        let result = roots.iter().fold(DiscoverResult::new(), |result, root| {
            result.merge(self.discover_root(root.as_ref(), classifier))
        });

        info!(
            roots = roots.len(),
            resources = result.resources.len(),
            names = result.known_names.len(),
            errors = result.errors.len(),
            "Discovery finished"
        );
        result
    }

    /// Runs the per-file pipeline on one file, propagating any failure.
    pub fn discover_file<C>(
        &self,
        path: &Path,
        classifier: &C,
    ) -> Result<DiscoverResult, DiscoverError>
    where
        C: TypeClassifier + ?Sized,
    {
        let tree = self.parser.parse_file(path)?;
        Ok(self.discover_tree(&tree, classifier))
    }

    /// Declaration extraction, classification and dependency extraction over
    /// an already parsed file.
    pub fn discover_tree<C>(&self, tree: &SyntaxTree, classifier: &C) -> DiscoverResult
    where
        C: TypeClassifier + ?Sized,
    {
        let imports = self.parser.extract_imports(tree);
        let source = tree.source_bytes();

        let mut resources = Vec::new();
        let mut known_names = BTreeSet::new();
        // Names recorded before the current declaration; later ones stay invisible.
        // A declaration's own name is recorded after its dependencies, so it
        // never depends on itself.
        let mut seen_so_far = HashSet::new();

        for declaration in self.parser.extract_declarations(tree) {
            let kind = declaration
                .type_descriptor
                .as_ref()
                .and_then(|descriptor| classifier.classify(descriptor, &imports));

            if let Some(kind) = kind {
                let dependencies = declaration
                    .initializer
                    .map(|initializer| extract_dependencies(&initializer, source, &seen_so_far))
                    .unwrap_or_default();

                debug!(
                    name = %declaration.name,
                    kind = %kind,
                    file = %tree.path().display(),
                    dependencies = dependencies.len(),
                    "Discovered resource"
                );

                resources.push(DiscoveredResource {
                    name: declaration.name.clone(),
                    kind,
                    file: tree.path().to_path_buf(),
                    line: declaration.line,
                    dependencies,
                });
            }

            seen_so_far.insert(declaration.name.clone());
            known_names.insert(declaration.name);
        }

        DiscoverResult {
            resources,
            known_names,
            errors: Vec::new(),
        }
    }

    fn discover_root<C>(&self, root: &Path, classifier: &C) -> DiscoverResult
    where
        C: TypeClassifier + ?Sized,
    {
        let metadata = match std::fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(err) => {
                let error = if err.kind() == std::io::ErrorKind::NotFound {
                    DiscoverError::RootNotFound {
                        path: root.to_path_buf(),
                    }
                } else {
                    DiscoverError::io(root, err)
                };
                warn!("Skipping root: {}", error);
                return DiscoverResult::from_error(error);
            }
        };

        // File roots go through the walk too, so the extension filter applies.
        let mut files = Vec::new();
        let walk_error = self
            .file_scanner
            .walk(root, &self.options, |path| files.push(path.to_path_buf()))
            .err();
        debug!(
            root = %root.display(),
            is_dir = metadata.is_dir(),
            files = files.len(),
            "Walked root"
        );

        self.discover_walked(&files, walk_error, classifier)
    }

    /// Files visited before a walk error are still processed; the error is
    /// recorded after their results.
    fn discover_walked<C>(
        &self,
        files: &[PathBuf],
        walk_error: Option<DiscoverError>,
        classifier: &C,
    ) -> DiscoverResult
    where
        C: TypeClassifier + ?Sized,
    {
        let mut result = self.discover_files(files, classifier);
        if let Some(error) = walk_error {
            warn!("Walk halted: {}", error);
            result.errors.push(error);
        }
        result
    }

    fn discover_files<C>(&self, files: &[PathBuf], classifier: &C) -> DiscoverResult
    where
        C: TypeClassifier + ?Sized,
    {
        // Indexed collect keeps walk order, so both branches fold identically.
        let per_file: Vec<DiscoverResult> = if self.parallel {
            files
                .par_iter()
                .map(|path| self.discover_path(path, classifier))
                .collect()
        } else {
            files
                .iter()
                .map(|path| self.discover_path(path, classifier))
                .collect()
        };

        per_file
            .into_iter()
            .fold(DiscoverResult::new(), DiscoverResult::merge)
    }

    fn discover_path<C>(&self, path: &Path, classifier: &C) -> DiscoverResult
    where
        C: TypeClassifier + ?Sized,
    {
        debug!(file = %path.display(), "Processing file");
        match self.discover_file(path, classifier) {
            Ok(result) => result,
            Err(error) => {
                warn!("Skipping file: {}", error);
                DiscoverResult::from_error(error)
            }
        }
    }
}

impl Default for ResourceDiscoverer {
    fn default() -> Self {
        Self::new(WalkOptions::default())
    }
}

/// One-shot scan of `roots` with a fresh [`ResourceDiscoverer`].
pub fn discover<P, C>(roots: &[P], options: &WalkOptions, classifier: &C) -> DiscoverResult
where
    P: AsRef<Path>,
    C: TypeClassifier + ?Sized,
{
    ResourceDiscoverer::new(options.clone()).discover(roots, classifier)
}
