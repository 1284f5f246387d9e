use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::DiscoverError;

/// A top-level binding whose type the classifier recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredResource {
    pub name: String,
    pub kind: String,
    pub file: PathBuf,
    /// 1-based line of the binding name.
    pub line: usize,
    /// Same-file bindings referenced by the initializer, in first-seen order.
    pub dependencies: Vec<String>,
}

/// Aggregated outcome of a scan.
///
/// Every name listed in a resource's `dependencies` is also in `known_names`.
#[derive(Debug, Default, Serialize)]
pub struct DiscoverResult {
    pub resources: Vec<DiscoveredResource>,
    pub known_names: BTreeSet<String>,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<DiscoverError>,
}

impl DiscoverResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result holding a single failure.
    pub fn from_error(error: DiscoverError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Folds `other` into `self`: resources and errors are appended, names unioned.
    pub fn merge(mut self, other: DiscoverResult) -> Self {
        self.resources.extend(other.resources);
        self.known_names.extend(other.known_names);
        self.errors.extend(other.errors);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.known_names.is_empty() && self.errors.is_empty()
    }

    pub fn resource(&self, name: &str) -> Option<&DiscoveredResource> {
        self.resources.iter().find(|resource| resource.name == name)
    }
}

fn serialize_errors<S>(errors: &[DiscoverError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}
