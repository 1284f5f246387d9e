pub mod analyzer;
pub mod classifier;
pub mod graph;
pub mod result;
pub mod scanner;

pub use analyzer::{discover, ResourceDiscoverer};
pub use classifier::{ImportTable, NoMatch, RuleClassifier, TypeClassifier, TypeDescriptor};
pub use graph::{DependencyPlan, FilePlan};
pub use result::{DiscoverResult, DiscoveredResource};
pub use scanner::{FileScanner, WalkOptions};
