//! # resource-discovery
//!
//! Finds the top-level Go bindings whose type a caller-supplied classifier
//! recognizes as a resource, and the same-file bindings each one references.
//!
//! ## Pipeline
//!
//! - **Walk**: enumerate `.go` files under each root, pruning hidden, `vendor`,
//!   `testdata` and caller-excluded directories.
//! - **Parse**: tree-sitter syntax tree per file; malformed files are rejected.
//! - **Extract**: top-level `var` bindings with a type descriptor resolved from the
//!   declared type or the initializer shape.
//! - **Classify**: an injected [`TypeClassifier`](core::TypeClassifier).
//! - **Aggregate**: per-file results merged in walk order; failures are collected,
//!   never raised.

pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;

pub use crate::core::{
    discover, DependencyPlan, DiscoverResult, DiscoveredResource, ImportTable, NoMatch,
    ResourceDiscoverer, RuleClassifier, TypeClassifier, TypeDescriptor, WalkOptions,
};
pub use crate::error::DiscoverError;
