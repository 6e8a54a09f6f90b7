/// Identifier of a NUMA node as exposed under `/sys/devices/system/node`.
pub type NodeId = u32;

/// Number of nodes the rebalancer knows how to handle.
pub const SUPPORTED_NODES: usize = 2;

/// The node registry as read at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub node_ids: Vec<NodeId>, // sorted ascending
}

impl Topology {
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    // Bitmask of the configured nodes, same shape as libnuma's node mask.
    pub fn node_mask(&self) -> u64 {
        self.node_ids
            .iter()
            .filter(|&&id| id < 64)
            .fold(0, |mask, &id| mask | (1u64 << id))
    }

    /// True when the registry holds exactly nodes 0 and 1.
    pub fn is_two_node(&self) -> bool {
        self.node_ids == [0, 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    pub id: NodeId,
    pub free_pages: u64,
}

/// Per-process count of region pages resident on each node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeTally {
    pub pages: [u64; SUPPORTED_NODES],
    pub not_resident: u64,
}

impl NodeTally {
    pub fn record(&mut self, status: i32) {
        match usize::try_from(status) {
            Ok(node) if node < SUPPORTED_NODES => self.pages[node] += 1,
            _ => self.not_resident += 1,
        }
    }

    pub fn on(&self, node: NodeId) -> u64 {
        self.pages.get(node as usize).copied().unwrap_or(0)
    }
}

/// The node that is not `node` in a two-node system.
pub fn other_node(node: NodeId) -> NodeId {
    if node == 0 { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_node_requires_ids_zero_and_one() {
        let topo = Topology { node_ids: vec![0, 1] };
        assert!(topo.is_two_node());
        assert_eq!(topo.node_mask(), 0b11);

        let gapped = Topology { node_ids: vec![0, 2] };
        assert_eq!(gapped.node_count(), 2);
        assert!(!gapped.is_two_node());

        let three = Topology { node_ids: vec![0, 1, 2] };
        assert!(!three.is_two_node());
    }

    #[test]
    fn tally_counts_negative_and_out_of_range_as_not_resident() {
        let mut tally = NodeTally::default();
        for status in [0, 1, 1, -libc::ENOENT, -libc::EFAULT, 5] {
            tally.record(status);
        }
        assert_eq!(tally.on(0), 1);
        assert_eq!(tally.on(1), 2);
        assert_eq!(tally.not_resident, 3);
    }

    #[test]
    fn other_node_flips() {
        assert_eq!(other_node(0), 1);
        assert_eq!(other_node(1), 0);
    }
}
