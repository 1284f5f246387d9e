use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

use crate::error::DiscoverError;

const MAX_SNIPPET_LEN: usize = 32;

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self, DiscoverError> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    /// Parses `source`, rejecting trees that contain any syntax error.
    pub fn parse_source(&mut self, file_path: &Path, source: &str) -> Result<Tree, DiscoverError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| DiscoverError::Parse {
                path: file_path.to_path_buf(),
                line: 1,
                column: 1,
                message: "parser produced no syntax tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let error_node = first_error_node(&root).unwrap_or(root);
            let position = error_node.start_position();
            return Err(DiscoverError::Parse {
                path: file_path.to_path_buf(),
                line: position.row + 1,
                column: position.column + 1,
                message: describe_error(&error_node, source.as_bytes()),
            });
        }

        Ok(tree)
    }
}

/// Buffered whole-file read.
pub fn read_source(file_path: &Path) -> Result<String, DiscoverError> {
    let file = File::open(file_path).map_err(|err| DiscoverError::io(file_path, err))?;
    let file_size = file
        .metadata()
        .map_err(|err| DiscoverError::io(file_path, err))?
        .len() as usize;

    let mut reader = BufReader::with_capacity(file_size.clamp(1, 8192), file);
    let mut content = String::with_capacity(file_size);
    reader
        .read_to_string(&mut content)
        .map_err(|err| DiscoverError::io(file_path, err))?;
    Ok(content)
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

pub fn find_child_by_kind<'tree>(node: &TSNode<'tree>, kind: &str) -> Option<TSNode<'tree>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            return Some(child);
        }
    }
    None
}

pub fn find_children_by_kind<'tree>(node: &TSNode<'tree>, kind: &str) -> Vec<TSNode<'tree>> {
    let mut results = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            results.push(child);
        }
    }
    results
}

pub fn named_children<'tree>(node: &TSNode<'tree>) -> Vec<TSNode<'tree>> {
    let mut cursor = node.walk();
    let children: Vec<TSNode<'tree>> = node.named_children(&mut cursor).collect();
    children
}

/// First `ERROR` or `MISSING` node in document order.
fn first_error_node<'tree>(node: &TSNode<'tree>) -> Option<TSNode<'tree>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(&child) {
            return Some(found);
        }
    }
    None
}

fn describe_error(node: &TSNode, source: &[u8]) -> String {
    if node.is_missing() {
        return format!("missing {}", node.kind());
    }

    let text = extract_text(node, source).trim();
    if text.is_empty() {
        return "syntax error".to_string();
    }

    let snippet: String = text
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(MAX_SNIPPET_LEN)
        .collect();
    format!("syntax error near `{snippet}`")
}
