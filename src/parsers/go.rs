use std::collections::HashSet;
use std::path::Path;
use tree_sitter::Node as TSNode;

use super::common::{
    extract_text, find_child_by_kind, find_children_by_kind, named_children, read_source,
    TreeSitterParser,
};
use super::SyntaxTree;
use crate::core::{ImportTable, TypeDescriptor};
use crate::error::DiscoverError;

/// A top-level `var` binding.
#[derive(Debug, Clone)]
pub struct Declaration<'tree> {
    pub name: String,
    /// 1-based line of the binding name.
    pub line: usize,
    pub type_descriptor: Option<TypeDescriptor>,
    pub initializer: Option<TSNode<'tree>>,
}

/// Go front end: parsing, import tables, declarations and references.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParser;

impl GoParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_file(&self, file_path: &Path) -> Result<SyntaxTree, DiscoverError> {
        let source = read_source(file_path)?;
        self.parse_source(file_path, source)
    }

    pub fn parse_source(
        &self,
        file_path: &Path,
        source: String,
    ) -> Result<SyntaxTree, DiscoverError> {
        // tree_sitter::Parser is not Sync, so each parse gets its own.
        let mut parser = TreeSitterParser::new(tree_sitter_go::language())?;
        let tree = parser.parse_source(file_path, &source)?;
        Ok(SyntaxTree::new(file_path.to_path_buf(), source, tree))
    }

    /// Alias to import path for every import of the file.
    pub fn extract_imports(&self, tree: &SyntaxTree) -> ImportTable {
        let root = tree.root();
        let source = tree.source_bytes();
        let mut imports = ImportTable::new();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() != "import_declaration" {
                continue;
            }
            for import_spec in import_specs(&child) {
                if let Some((alias, path)) = self.process_import_spec(&import_spec, source) {
                    imports.insert(alias, path);
                }
            }
        }

        imports
    }

    fn process_import_spec(
        &self,
        import_spec: &TSNode,
        source: &[u8],
    ) -> Option<(String, String)> {
        let path_node = import_spec
            .child_by_field_name("path")
            .or_else(|| find_child_by_kind(import_spec, "interpreted_string_literal"))
            .or_else(|| find_child_by_kind(import_spec, "raw_string_literal"))?;
        let path = extract_text(&path_node, source)
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        if path.is_empty() {
            return None;
        }

        let alias = match import_spec.child_by_field_name("name") {
            Some(name) => extract_text(&name, source).to_string(),
            None => default_import_alias(&path),
        };
        if alias == "_" {
            return None;
        }

        Some((alias, path))
    }

    /// Top-level `var` bindings in declaration order.
    ///
    /// Constants, functions and anything nested inside them are ignored.
    pub fn extract_declarations<'tree>(&self, tree: &'tree SyntaxTree) -> Vec<Declaration<'tree>> {
        let root = tree.root();
        let source = tree.source_bytes();
        let mut declarations = Vec::new();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "var_declaration" {
                for var_spec in var_specs(&child) {
                    self.process_var_spec(&var_spec, source, &mut declarations);
                }
            }
        }

        declarations
    }

    fn process_var_spec<'tree>(
        &self,
        var_spec: &TSNode<'tree>,
        source: &[u8],
        declarations: &mut Vec<Declaration<'tree>>,
    ) {
        // The `name` field also yields the `,` tokens between names.
        let names = find_children_by_kind(var_spec, "identifier");

        let declared_type = var_spec
            .child_by_field_name("type")
            .or_else(|| declared_type_node(var_spec))
            .and_then(|type_node| resolve_declared_type(&type_node, source));

        let values = var_spec
            .child_by_field_name("value")
            .or_else(|| find_child_by_kind(var_spec, "expression_list"))
            .map(|expression_list| named_children(&expression_list))
            .unwrap_or_default();

        for (index, identifier) in names.iter().enumerate() {
            let initializer = values.get(index).copied();
            let type_descriptor = declared_type.clone().or_else(|| {
                initializer.and_then(|value| resolve_initializer_type(&value, source))
            });

            declarations.push(Declaration {
                name: extract_text(identifier, source).to_string(),
                line: identifier.start_position().row + 1,
                type_descriptor,
                initializer,
            });
        }
    }
}

/// Names referenced by `initializer` that are members of `known_names`,
/// deduplicated in first-seen order.
pub fn extract_dependencies(
    initializer: &TSNode,
    source: &[u8],
    known_names: &HashSet<String>,
) -> Vec<String> {
    let mut dependencies = Vec::new();
    let mut seen = HashSet::new();
    collect_references(initializer, source, known_names, &mut seen, &mut dependencies);
    dependencies
}

fn collect_references(
    node: &TSNode,
    source: &[u8],
    known_names: &HashSet<String>,
    seen: &mut HashSet<String>,
    dependencies: &mut Vec<String>,
) {
    if node.kind() == "identifier" {
        let name = extract_text(node, source);
        if known_names.contains(name) && seen.insert(name.to_string()) {
            dependencies.push(name.to_string());
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_references(&child, source, known_names, seen, dependencies);
    }
}

/// Type written in a declaration: `T`, `pkg.T`, `*T`, `[]T`, `[N]T`, `T[U]`.
pub fn resolve_declared_type(node: &TSNode, source: &[u8]) -> Option<TypeDescriptor> {
    match node.kind() {
        "type_identifier" | "identifier" => {
            Some(TypeDescriptor::local(extract_text(node, source)))
        }
        "qualified_type" => resolve_qualified_type(node, source),
        "pointer_type" | "parenthesized_type" => named_children(node)
            .first()
            .and_then(|inner| resolve_declared_type(inner, source)),
        "slice_type" | "array_type" | "implicit_length_array_type" => node
            .child_by_field_name("element")
            .and_then(|element| resolve_declared_type(&element, source)),
        "generic_type" => node
            .child_by_field_name("type")
            .and_then(|base| resolve_declared_type(&base, source)),
        _ => None,
    }
}

/// Type implied by the shape of an initializer expression.
pub fn resolve_initializer_type(node: &TSNode, source: &[u8]) -> Option<TypeDescriptor> {
    match node.kind() {
        "composite_literal" => node
            .child_by_field_name("type")
            .and_then(|type_node| resolve_declared_type(&type_node, source)),
        "unary_expression" => {
            let is_address_of = node
                .child_by_field_name("operator")
                .is_some_and(|operator| operator.kind() == "&");
            let operand = node.child_by_field_name("operand")?;
            if is_address_of && operand.kind() == "composite_literal" {
                resolve_initializer_type(&operand, source)
            } else {
                None
            }
        }
        "call_expression" => node
            .child_by_field_name("function")
            .and_then(|function| resolve_conversion_target(&function, source)),
        "type_conversion_expression" => node
            .child_by_field_name("type")
            .and_then(|type_node| resolve_declared_type(&type_node, source)),
        _ => None,
    }
}

fn resolve_conversion_target(function: &TSNode, source: &[u8]) -> Option<TypeDescriptor> {
    match function.kind() {
        "identifier" => Some(TypeDescriptor::local(extract_text(function, source))),
        "selector_expression" => {
            let operand = function.child_by_field_name("operand")?;
            let field = function.child_by_field_name("field")?;
            if operand.kind() != "identifier" {
                return None;
            }
            Some(TypeDescriptor::new(
                extract_text(&operand, source),
                extract_text(&field, source),
            ))
        }
        _ => None,
    }
}

fn resolve_qualified_type(node: &TSNode, source: &[u8]) -> Option<TypeDescriptor> {
    let package = node
        .child_by_field_name("package")
        .or_else(|| find_child_by_kind(node, "package_identifier"))?;
    let name = node
        .child_by_field_name("name")
        .or_else(|| find_child_by_kind(node, "type_identifier"))?;
    Some(TypeDescriptor::new(
        extract_text(&package, source),
        extract_text(&name, source),
    ))
}

/// Type child of a `var_spec` for grammars that do not tag it with a field.
fn declared_type_node<'tree>(var_spec: &TSNode<'tree>) -> Option<TSNode<'tree>> {
    named_children(var_spec)
        .into_iter()
        .find(|child| !matches!(child.kind(), "identifier" | "expression_list" | "comment"))
}

/// `var x` and `var ( ... )` forms, with or without a `var_spec_list` wrapper.
fn var_specs<'tree>(var_declaration: &TSNode<'tree>) -> Vec<TSNode<'tree>> {
    specs_of(var_declaration, "var_spec", "var_spec_list")
}

fn import_specs<'tree>(import_declaration: &TSNode<'tree>) -> Vec<TSNode<'tree>> {
    specs_of(import_declaration, "import_spec", "import_spec_list")
}

fn specs_of<'tree>(
    declaration: &TSNode<'tree>,
    spec_kind: &str,
    list_kind: &str,
) -> Vec<TSNode<'tree>> {
    let mut specs = Vec::new();
    for child in named_children(declaration) {
        if child.kind() == spec_kind {
            specs.push(child);
        } else if child.kind() == list_kind {
            specs.extend(find_children_by_kind(&child, spec_kind));
        }
    }
    specs
}

/// Package name Go assumes for an unaliased import path.
pub fn default_import_alias(import_path: &str) -> String {
    let mut segments = import_path.rsplit('/');
    let mut last = segments.next().unwrap_or(import_path);
    if is_major_version(last) {
        if let Some(previous) = segments.next() {
            last = previous;
        }
    }

    match last.rfind(".v") {
        Some(idx) if is_major_version(&last[idx + 1..]) => last[..idx].to_string(),
        _ => last.to_string(),
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}
