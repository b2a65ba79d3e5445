use super::types::{DebtNode, Node};

/// Month-indexed storage of a projection. Month `t` lives at index `t`.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    debt_nodes: Vec<Vec<DebtNode>>,
}

impl NodeStore {
    pub fn with_capacity(months: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(months),
            debt_nodes: Vec::with_capacity(months),
        }
    }

    /// Appends the next month and returns its index.
    pub fn push(&mut self, node: Node, debt_nodes: Vec<DebtNode>) -> u32 {
        debug_assert_eq!(node.month as usize, self.nodes.len());
        self.nodes.push(node);
        self.debt_nodes.push(debt_nodes);
        (self.nodes.len() - 1) as u32
    }

    pub fn node(&self, month: u32) -> Option<&Node> {
        self.nodes.get(month as usize)
    }

    pub fn debt_nodes(&self, month: u32) -> Option<&[DebtNode]> {
        self.debt_nodes.get(month as usize).map(Vec::as_slice)
    }

    pub fn latest(&self) -> Option<(&Node, &[DebtNode])> {
        Some((self.nodes.last()?, self.debt_nodes.last()?.as_slice()))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Remaining balance of one debt across every stored month.
    pub fn debt_history(&self, debt_index: usize) -> impl Iterator<Item = (u32, &DebtNode)> + '_ {
        self.debt_nodes
            .iter()
            .enumerate()
            .filter_map(move |(month, row)| row.get(debt_index).map(|node| (month as u32, node)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
