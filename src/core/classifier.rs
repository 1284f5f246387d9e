use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Import alias used in a file mapped to the module path it resolves to.
pub type ImportTable = BTreeMap<String, String>;

/// Apparent type of a binding: an optional package qualifier plus a type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Package alias as written in the file; empty for unqualified types.
    pub qualifier: String,
    pub name: String,
}

impl TypeDescriptor {
    pub fn new(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            name: name.into(),
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    pub fn is_qualified(&self) -> bool {
        !self.qualifier.is_empty()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_qualified() {
            write!(f, "{}.{}", self.qualifier, self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Decides which type shapes count as resources.
///
/// Implementations must be pure: the same descriptor and import table always
/// yield the same answer, and "no match" is reported as `None`, never as a
/// failure. Closures with the matching signature implement this trait.
pub trait TypeClassifier: Sync {
    fn classify(&self, descriptor: &TypeDescriptor, imports: &ImportTable) -> Option<String>;
}

impl<F> TypeClassifier for F
where
    F: Fn(&TypeDescriptor, &ImportTable) -> Option<String> + Sync,
{
    fn classify(&self, descriptor: &TypeDescriptor, imports: &ImportTable) -> Option<String> {
        self(descriptor, imports)
    }
}

/// Classifier that never matches; discovery then only tracks names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMatch;

impl TypeClassifier for NoMatch {
    fn classify(&self, _descriptor: &TypeDescriptor, _imports: &ImportTable) -> Option<String> {
        None
    }
}

/// Matches types by the import path their qualifier resolves to.
///
/// Resources are labelled `import/path.TypeName`. Unqualified types resolve to
/// the empty import path, i.e. the file's own package.
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    types: BTreeMap<String, BTreeSet<String>>,
    packages: BTreeSet<String>,
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a single type of an import path.
    pub fn with_type(mut self, import_path: impl Into<String>, name: impl Into<String>) -> Self {
        self.types
            .entry(import_path.into())
            .or_default()
            .insert(name.into());
        self
    }

    /// Match every type declared by an import path.
    pub fn with_package(mut self, import_path: impl Into<String>) -> Self {
        self.packages.insert(import_path.into());
        self
    }

    /// Parses `import/path.TypeName`, splitting at the last `.` after the last `/`.
    pub fn with_qualified_type(self, qualified: &str) -> Option<Self> {
        let (path, name) = split_qualified(qualified)?;
        Some(self.with_type(path, name))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.packages.is_empty()
    }

    fn resolve_path<'a>(
        &self,
        descriptor: &TypeDescriptor,
        imports: &'a ImportTable,
    ) -> Option<&'a str> {
        if descriptor.is_qualified() {
            imports.get(&descriptor.qualifier).map(String::as_str)
        } else {
            Some("")
        }
    }
}

impl TypeClassifier for RuleClassifier {
    fn classify(&self, descriptor: &TypeDescriptor, imports: &ImportTable) -> Option<String> {
        let path = self.resolve_path(descriptor, imports)?;

        let matched = self.packages.contains(path)
            || self
                .types
                .get(path)
                .is_some_and(|names| names.contains(&descriptor.name));
        if !matched {
            return None;
        }

        if path.is_empty() {
            Some(descriptor.name.clone())
        } else {
            Some(format!("{}.{}", path, descriptor.name))
        }
    }
}

fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    let last_segment_start = qualified.rfind('/').map_or(0, |idx| idx + 1);
    let dot = qualified[last_segment_start..].rfind('.')? + last_segment_start;
    let (path, name) = (&qualified[..dot], &qualified[dot + 1..]);
    if path.is_empty() || name.is_empty() {
        return None;
    }
    Some((path, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports() -> ImportTable {
        ImportTable::from([
            (
                "schema".to_string(),
                "github.com/acme/graph/schema".to_string(),
            ),
            ("yaml".to_string(), "gopkg.in/yaml.v3".to_string()),
        ])
    }

    #[test]
    fn rule_classifier_resolves_qualifier_through_imports() {
        let classifier = RuleClassifier::new().with_type("github.com/acme/graph/schema", "NodeType");

        assert_eq!(
            classifier.classify(&TypeDescriptor::new("schema", "NodeType"), &imports()),
            Some("github.com/acme/graph/schema.NodeType".to_string())
        );
        assert_eq!(
            classifier.classify(&TypeDescriptor::new("schema", "Other"), &imports()),
            None
        );
        assert_eq!(
            classifier.classify(&TypeDescriptor::new("missing", "NodeType"), &imports()),
            None
        );
    }

    #[test]
    fn package_rule_matches_every_type() {
        let classifier = RuleClassifier::new().with_package("gopkg.in/yaml.v3");
        assert_eq!(
            classifier.classify(&TypeDescriptor::new("yaml", "Node"), &imports()),
            Some("gopkg.in/yaml.v3.Node".to_string())
        );
    }

    #[test]
    fn unqualified_types_match_the_empty_path() {
        let classifier = RuleClassifier::new().with_type("", "Kind");
        assert_eq!(
            classifier.classify(&TypeDescriptor::local("Kind"), &ImportTable::new()),
            Some("Kind".to_string())
        );
    }

    #[test]
    fn qualified_type_parsing_splits_after_last_slash() {
        assert_eq!(
            split_qualified("gopkg.in/yaml.v3.Node"),
            Some(("gopkg.in/yaml.v3", "Node"))
        );
        assert_eq!(
            split_qualified("github.com/acme/schema.NodeType"),
            Some(("github.com/acme/schema", "NodeType"))
        );
        assert_eq!(split_qualified("NodeType"), None);
        assert_eq!(split_qualified("github.com/acme/schema"), None);
    }

    #[test]
    fn closures_are_classifiers() {
        let classifier = |descriptor: &TypeDescriptor, _: &ImportTable| {
            (descriptor.name == "Kind").then(|| "kind".to_string())
        };
        assert_eq!(
            classifier.classify(&TypeDescriptor::local("Kind"), &ImportTable::new()),
            Some("kind".to_string())
        );
        assert_eq!(NoMatch.classify(&TypeDescriptor::local("Kind"), &ImportTable::new()), None);
    }
}
