#![forbid(unsafe_code)]

//! chainfx filter vocabulary and chain topology.
//!
//! This crate is **contract-only**: no GL handles, no filter state. It knows the closed set of
//! filter type names and the single-link wiring between named nodes (`Input → ... → Output`).
//!
//! Every node has at most one predecessor and at most one successor, so a chain is always a
//! simple line. Sub-pipelines (e.g. the Gaussian blur stages) live inside a node and are not
//! visible here.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

use chainfx_core::EngineError;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Role of a filter inside a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Input,
    Algo,
    /// Reserved for multi-input nodes; nothing produces it yet.
    Merge,
    Output,
}

/// The closed set of filter types a declarative chain may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    Input,
    Output,
    GaussianBlur,
    HorizontalBlur,
    VerticalBlur,
    Scale,
    Saturation,
    Contrast,
    Brightness,
}

impl FilterType {
    pub const ALL: [FilterType; 9] = [
        FilterType::Input,
        FilterType::Output,
        FilterType::GaussianBlur,
        FilterType::HorizontalBlur,
        FilterType::VerticalBlur,
        FilterType::Scale,
        FilterType::Saturation,
        FilterType::Contrast,
        FilterType::Brightness,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        FilterType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterType::Input => "Input",
            FilterType::Output => "Output",
            FilterType::GaussianBlur => "GaussianBlur",
            FilterType::HorizontalBlur => "HorizontalBlur",
            FilterType::VerticalBlur => "VerticalBlur",
            FilterType::Scale => "Scale",
            FilterType::Saturation => "Saturation",
            FilterType::Contrast => "Contrast",
            FilterType::Brightness => "Brightness",
        }
    }

    pub fn kind(self) -> FilterKind {
        match self {
            FilterType::Input => FilterKind::Input,
            FilterType::Output => FilterKind::Output,
            _ => FilterKind::Algo,
        }
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every current filter has exactly one input slot and one output slot.
pub const MAX_INPUTS: u32 = 1;
pub const MAX_OUTPUTS: u32 = 1;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub ty: FilterType,
    pub name: String,
    previous: Option<NodeId>,
    next: Option<NodeId>,
}

impl Node {
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

#[derive(Debug, Default, Clone)]
pub struct Graph {
    next_node: u32,
    nodes: HashMap<NodeId, Node>,
    by_name: HashMap<String, NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Add an unlinked node. Names must be unique within a graph.
    pub fn add_node(&mut self, ty: FilterType, name: &str) -> Result<NodeId, EngineError> {
        if self.by_name.contains_key(name) {
            return Err(EngineError::other(format!(
                "add_node: duplicate filter name '{name}'"
            )));
        }
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                ty,
                name: name.to_string(),
                previous: None,
                next: None,
            },
        );
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Set (or clear, with `None`) the successor slot of `id`.
    ///
    /// Only this slot is touched; the successor's `previous` is left alone. Use [`Graph::connect`]
    /// to wire both sides.
    pub fn add_next_filter(&mut self, id: NodeId, next: Option<NodeId>) -> Result<(), EngineError> {
        if let Some(n) = next {
            self.require(n)?;
        }
        self.node_mut(id)?.next = next;
        Ok(())
    }

    /// Set (or clear, with `None`) the predecessor slot of `id`.
    pub fn add_previous_filter(
        &mut self,
        id: NodeId,
        previous: Option<NodeId>,
    ) -> Result<(), EngineError> {
        if let Some(p) = previous {
            self.require(p)?;
        }
        self.node_mut(id)?.previous = previous;
        Ok(())
    }

    /// Wire `from → to` on both sides so that `from.next == to` and `to.previous == from`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        if from == to {
            return Err(EngineError::other("connect: a filter cannot feed itself"));
        }
        self.require(to)?;
        self.add_next_filter(from, Some(to))?;
        self.add_previous_filter(to, Some(from))
    }

    pub fn next_filter(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.next)
    }

    pub fn previous_filter(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.previous)
    }

    /// 1 when a predecessor is linked, else 0.
    pub fn input_number(&self, id: NodeId) -> u32 {
        u32::from(self.previous_filter(id).is_some())
    }

    /// 1 when a successor is linked, else 0.
    pub fn output_number(&self, id: NodeId) -> u32 {
        u32::from(self.next_filter(id).is_some())
    }

    pub fn max_input_number(&self, _id: NodeId) -> u32 {
        MAX_INPUTS
    }

    pub fn max_output_number(&self, _id: NodeId) -> u32 {
        MAX_OUTPUTS
    }

    /// Input nodes, in id order.
    pub fn input_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.ty.kind() == FilterKind::Input)
            .map(|n| n.id)
            .collect();
        ids.sort();
        ids
    }

    /// Walk `next` links starting at `root` (inclusive).
    pub fn chain_from(&self, root: NodeId) -> Result<Vec<NodeId>, EngineError> {
        self.require(root)?;
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut cur = Some(root);
        while let Some(id) = cur {
            if !seen.insert(id) {
                return Err(EngineError::other(format!(
                    "chain_from: cycle through filter '{}'",
                    self.nodes[&id].name
                )));
            }
            order.push(id);
            cur = self.next_filter(id);
        }
        Ok(order)
    }

    /// Resolve the linear order for each root.
    pub fn compile(&self, roots: &[NodeId]) -> Result<Plan, EngineError> {
        let mut chains = Vec::with_capacity(roots.len());
        for root in roots {
            let node = self
                .node(*root)
                .ok_or_else(|| EngineError::other("compile: root not found"))?;
            if node.ty.kind() != FilterKind::Input {
                return Err(EngineError::other(format!(
                    "compile: root '{}' is a {} filter, not an Input",
                    node.name, node.ty
                )));
            }
            chains.push(self.chain_from(*root)?);
        }
        Ok(Plan {
            roots: roots.to_vec(),
            chains,
        })
    }

    fn require(&self, id: NodeId) -> Result<(), EngineError> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(EngineError::other(format!("node {} not found", id.0)))
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EngineError> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| EngineError::other(format!("node {} not found", id.0)))
    }
}

/// The execution order resolved from a graph: one linear chain per root.
#[derive(Debug, Clone)]
pub struct Plan {
    pub roots: Vec<NodeId>,
    pub chains: Vec<Vec<NodeId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> (Graph, NodeId, NodeId, NodeId) {
        let mut g = Graph::new();
        let a = g.add_node(FilterType::Input, "in").unwrap();
        let b = g.add_node(FilterType::Contrast, "c").unwrap();
        let c = g.add_node(FilterType::Output, "out").unwrap();
        (g, a, b, c)
    }

    #[test]
    fn kinds_separate_adapters_from_effects() {
        assert_eq!(FilterType::Input.kind(), FilterKind::Input);
        assert_eq!(FilterType::Output.kind(), FilterKind::Output);
        assert_ne!(FilterType::Output.kind(), FilterKind::Algo);
        for t in FilterType::ALL {
            assert_eq!(FilterType::from_name(t.name()), Some(t));
        }
        assert_eq!(FilterType::from_name("Sharpen"), None);
    }

    #[test]
    fn clearing_next_leaves_no_link() {
        let (mut g, a, b, _) = three();
        g.add_next_filter(a, Some(b)).unwrap();
        assert_eq!(g.next_filter(a), Some(b));
        assert_eq!(g.output_number(a), 1);

        g.add_next_filter(a, None).unwrap();
        assert_eq!(g.next_filter(a), None);
        assert_eq!(g.output_number(a), 0);
    }

    #[test]
    fn single_slot_setters_do_not_touch_the_other_side() {
        let (mut g, a, b, _) = three();
        g.add_next_filter(a, Some(b)).unwrap();
        assert_eq!(g.previous_filter(b), None);
        assert_eq!(g.input_number(b), 0);

        g.add_previous_filter(b, Some(a)).unwrap();
        assert_eq!(g.previous_filter(b), Some(a));
        assert_eq!(g.input_number(b), 1);
        assert_eq!(g.max_input_number(b), 1);
        assert_eq!(g.max_output_number(b), 1);
    }

    #[test]
    fn connect_keeps_both_sides_consistent() {
        let (mut g, a, b, c) = three();
        g.connect(a, b).unwrap();
        g.connect(b, c).unwrap();
        assert_eq!(g.next_filter(a), Some(b));
        assert_eq!(g.previous_filter(b), Some(a));
        assert_eq!(g.chain_from(a).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut g, ..) = three();
        assert!(g.add_node(FilterType::Scale, "c").is_err());
    }

    #[test]
    fn cycles_are_reported_instead_of_looping() {
        let (mut g, a, b, c) = three();
        g.connect(a, b).unwrap();
        g.connect(b, c).unwrap();
        g.add_next_filter(c, Some(b)).unwrap();
        assert!(g.chain_from(a).is_err());
    }

    #[test]
    fn compile_requires_input_roots() {
        let (mut g, a, b, c) = three();
        g.connect(a, b).unwrap();
        g.connect(b, c).unwrap();

        let plan = g.compile(&[a]).unwrap();
        assert_eq!(plan.chains, vec![vec![a, b, c]]);
        assert!(g.compile(&[b]).is_err());
        assert_eq!(g.input_nodes(), vec![a]);
    }
}
