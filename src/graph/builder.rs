//! Graph construction from requires/creates declarations.
//!
//! Nodes live in an arena owned by [`StepGraph`]; children are indices, so a
//! step reachable from two parents is the same node under both.
//!
//! Attachment compares every requirement of every step with every creation
//! of every other step. That is quadratic in the number of steps, which is
//! fine for pipelines of a few dozen steps.

use std::collections::HashSet;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::error::{PipegraphError, Result};
use crate::graph::link::{has_any_links, StepLink};
use crate::steps::Step;

/// Index of a node inside its [`StepGraph`].
pub type NodeId = usize;

/// A graph node: one step and the nodes that depend on it.
pub struct StepNode {
    step: Arc<dyn Step>,
    children: Vec<NodeId>,
}

impl StepNode {
    fn new(step: Arc<dyn Step>) -> Self {
        Self {
            step,
            children: Vec::new(),
        }
    }

    /// The wrapped step.
    pub fn step(&self) -> &Arc<dyn Step> {
        &self.step
    }

    /// Dependents in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }
}

impl fmt::Debug for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepNode")
            .field("step", &self.step.name())
            .field("children", &self.children)
            .finish()
    }
}

/// The nodes of a pipeline and the subset of them that are roots.
#[derive(Debug, Default)]
pub struct StepGraph {
    nodes: Vec<StepNode>,
    roots: Vec<NodeId>,
}

impl StepGraph {
    /// Nodes no other step has to run before.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> &StepNode {
        &self.nodes[id]
    }

    /// Every node, indexed by [`NodeId`].
    pub fn nodes(&self) -> &[StepNode] {
        &self.nodes
    }

    /// Number of steps in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no steps.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node by step name. Unnamed steps are never found.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        self.nodes.iter().position(|n| n.step.name() == name)
    }

    /// Number of parents of each node, indexed by [`NodeId`].
    pub fn parent_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nodes.len()];
        for node in &self.nodes {
            for &child in &node.children {
                counts[child] += 1;
            }
        }
        counts
    }

    /// Render the graph as an indented tree, one line per node visit.
    ///
    /// A node with several parents is printed under each of them.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        for &root in &self.roots {
            self.render_node(root, 0, &mut path, &mut out);
        }
        out
    }

    fn render_node(&self, id: NodeId, depth: usize, path: &mut Vec<NodeId>, out: &mut String) {
        let step = &self.nodes[id].step;
        let label = if step.name().is_empty() {
            step.description().to_string()
        } else {
            format!("{} - {}", step.name(), step.description())
        };
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), label);

        if path.contains(&id) {
            return;
        }
        path.push(id);
        for &child in &self.nodes[id].children {
            self.render_node(child, depth + 1, path, out);
        }
        path.pop();
    }
}

/// Build the graph of every step.
///
/// A step is a root when no other step creates anything it requires.
/// Otherwise it becomes a child of every step that satisfies at least one
/// of its requirements.
pub fn build_graph(steps: &[Arc<dyn Step>]) -> StepGraph {
    let mut nodes: Vec<StepNode> = steps.iter().cloned().map(StepNode::new).collect();
    let requires: Vec<Vec<StepLink>> = steps.iter().map(|s| s.requires()).collect();
    let creates: Vec<Vec<StepLink>> = steps.iter().map(|s| s.creates()).collect();

    let mut roots = Vec::new();
    for node in 0..nodes.len() {
        let mut is_root = true;
        for other in 0..nodes.len() {
            if other == node {
                continue;
            }
            if has_any_links(&requires[node], &creates[other]) {
                is_root = false;
                nodes[other].add_child(node);
            }
        }
        if is_root {
            roots.push(node);
        }
    }

    debug!(steps = nodes.len(), roots = roots.len(), "built step graph");
    StepGraph { nodes, roots }
}

/// Build the graph of only the steps needed to run the named targets.
///
/// An empty target list builds the full graph.
pub fn build_partial_graph(steps: &[Arc<dyn Step>], names: &[String]) -> Result<StepGraph> {
    if names.is_empty() {
        return Ok(build_graph(steps));
    }

    let mut requested: HashSet<&str> = HashSet::new();
    for name in names {
        if !requested.insert(name.as_str()) {
            return Err(PipegraphError::DuplicateTarget { name: name.clone() });
        }
    }

    let mut candidates = vec![false; steps.len()];
    let mut required: Vec<StepLink> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for name in names {
        let matching: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.name().is_empty() && s.name() == name)
            .map(|(i, _)| i)
            .collect();
        match matching.as_slice() {
            [] => missing.push(name.clone()),
            [index] => {
                candidates[*index] = true;
                required.extend(steps[*index].requires());
            }
            _ => return Err(PipegraphError::DuplicateTarget { name: name.clone() }),
        }
    }

    if !missing.is_empty() {
        return Err(PipegraphError::UnknownTargets { names: missing });
    }

    loop {
        let mut added = 0;
        for (i, step) in steps.iter().enumerate() {
            if candidates[i] {
                continue;
            }
            if has_any_links(&required, &step.creates()) {
                added += 1;
                candidates[i] = true;
                required.extend(step.requires());
            }
        }
        if added == 0 {
            break;
        }
    }

    let targeted: Vec<Arc<dyn Step>> = steps
        .iter()
        .zip(candidates)
        .filter(|(_, keep)| *keep)
        .map(|(step, _)| Arc::clone(step))
        .collect();

    debug!(
        targets = names.len(),
        steps = targeted.len(),
        "resolved partial graph"
    );
    Ok(build_graph(&targeted))
}
