use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Direction, Graph};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::path::{Path, PathBuf};

use super::{DiscoverResult, DiscoveredResource};
use crate::error::DiscoverError;

/// Edge from a dependency to the resource that references it.
pub type ResourceGraph<'a> = Graph<&'a DiscoveredResource, (), Directed>;

/// Generation order of one file's resources: dependencies come first.
#[derive(Debug, Clone, Serialize)]
pub struct FilePlan {
    pub file: PathBuf,
    pub order: Vec<String>,
}

/// Per-file dependency ordering of a [`DiscoverResult`].
///
/// Files appear in the order they were discovered. Nothing is ordered across
/// files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyPlan {
    pub files: Vec<FilePlan>,
}

impl DependencyPlan {
    pub fn build(result: &DiscoverResult) -> Result<Self, DiscoverError> {
        let mut files = Vec::new();
        for (file, resources) in group_by_file(&result.resources) {
            let order = order_file(file, &resources)?;
            files.push(FilePlan {
                file: file.to_path_buf(),
                order,
            });
        }
        Ok(Self { files })
    }

    pub fn order_for(&self, file: &Path) -> Option<&[String]> {
        self.files
            .iter()
            .find(|plan| plan.file == file)
            .map(|plan| plan.order.as_slice())
    }
}

struct GraphBuilder<'a> {
    graph: ResourceGraph<'a>,
    node_map: HashMap<&'a str, NodeIndex>,
}

impl<'a> GraphBuilder<'a> {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
        }
    }

    fn add_node(&mut self, resource: &'a DiscoveredResource) -> NodeIndex {
        let index = self.graph.add_node(resource);
        self.node_map.insert(resource.name.as_str(), index);
        index
    }

    /// Dependencies that are known names but not resources get no edge.
    fn add_edge(&mut self, dependency: &str, dependent: &str) -> Option<()> {
        let source = *self.node_map.get(dependency)?;
        let target = *self.node_map.get(dependent)?;
        self.graph.add_edge(source, target, ());
        Some(())
    }

    fn build(self) -> ResourceGraph<'a> {
        self.graph
    }
}

/// Builds the dependency graph of resources that share one file.
pub fn build_file_graph<'a>(resources: &[&'a DiscoveredResource]) -> ResourceGraph<'a> {
    let mut builder = GraphBuilder::new();
    for &resource in resources {
        builder.add_node(resource);
    }
    for resource in resources {
        for dependency in &resource.dependencies {
            builder.add_edge(dependency, &resource.name);
        }
    }
    builder.build()
}

fn order_file(
    file: &Path,
    resources: &[&DiscoveredResource],
) -> Result<Vec<String>, DiscoverError> {
    let graph = build_file_graph(resources);
    if let Err(cycle) = toposort(&graph, None) {
        return Err(DiscoverError::DependencyCycle {
            file: file.to_path_buf(),
            name: graph[cycle.node_id()].name.clone(),
        });
    }

    // Kahn's algorithm; among ready resources the earliest declared goes first.
    let mut indegree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(index)) = ready.pop() {
        let node = NodeIndex::new(index);
        order.push(graph[node].name.clone());
        for next in graph.neighbors_directed(node, Direction::Outgoing) {
            indegree[next.index()] -= 1;
            if indegree[next.index()] == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }

    Ok(order)
}

fn group_by_file(resources: &[DiscoveredResource]) -> Vec<(&Path, Vec<&DiscoveredResource>)> {
    let mut groups: Vec<(&Path, Vec<&DiscoveredResource>)> = Vec::new();
    let mut positions: HashMap<&Path, usize> = HashMap::new();

    for resource in resources {
        let file = resource.file.as_path();
        let position = *positions.entry(file).or_insert_with(|| {
            groups.push((file, Vec::new()));
            groups.len() - 1
        });
        groups[position].1.push(resource);
    }

    groups
}
