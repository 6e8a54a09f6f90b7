use crate::error::{Error, Result};
use crate::move_pages::{PageMover, is_stale};
use crate::numa_node::{NodeId, NodeState, NodeTally, other_node};
use crate::proc_info::ProcessMemoryRegion;
use cli_log::*;

/// Residency snapshot of one process region: `status[i]` is the node
/// backing `addresses[i]`, or a negative errno when the page is not resident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlacement {
    pub pid: u32,
    pub addresses: Vec<usize>,
    pub status: Vec<i32>,
}

impl PagePlacement {
    pub fn tally(&self) -> NodeTally {
        let mut tally = NodeTally::default();
        for &status in &self.status {
            tally.record(status);
        }
        tally
    }
}

/// Queries the current node of every page in `region`, `batch_size` pages
/// per call. A stale call leaves its pages marked not resident.
pub fn query_placement(
    mover: &mut impl PageMover,
    region: &ProcessMemoryRegion,
    page_size: usize,
    batch_size: usize,
) -> Result<PagePlacement> {
    let batch_size = batch_size.max(1);
    let addresses = region.page_addresses(page_size)?;
    let mut status = vec![-libc::ENOENT; addresses.len()];

    for (pages, batch_status) in addresses
        .chunks(batch_size)
        .zip(status.chunks_mut(batch_size))
    {
        match mover.move_pages(region.pid, pages, None, batch_status) {
            Ok(()) => {}
            Err(e) if is_stale(&e) => {
                warn!(
                    "pid {}: status query at {:#x} went stale: {}",
                    region.pid, pages[0], e
                );
                batch_status.fill(-libc::ENOENT);
            }
            Err(source) => {
                return Err(Error::Syscall {
                    pid: region.pid,
                    source,
                });
            }
        }
    }

    Ok(PagePlacement {
        pid: region.pid,
        addresses,
        status,
    })
}

/// Pages selected from one process, in address order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMoves {
    pub pid: u32,
    pub addresses: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// The over-pressured node pages are taken from.
    pub source_node: NodeId,
    pub destination_node: NodeId,
    /// Global number of pages the free counts asked for.
    pub quota: u64,
    pub moves: Vec<ProcessMoves>,
}

impl MigrationPlan {
    pub fn len(&self) -> usize {
        self.moves.iter().map(|m| m.addresses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(pid, address, destination)` for every planned move, in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize, NodeId)> + '_ {
        self.moves.iter().flat_map(move |m| {
            m.addresses
                .iter()
                .map(move |&addr| (m.pid, addr, self.destination_node))
        })
    }
}

/// The node with less free memory and half the free-page difference.
/// Equal counts give a zero quota.
pub fn pages_to_move(free: &[NodeState; 2]) -> (NodeId, u64) {
    let (f0, f1) = (free[0].free_pages, free[1].free_pages);
    let source = if f0 < f1 { free[0].id } else { free[1].id };
    (source, f0.abs_diff(f1) / 2)
}

/// Greedy selection: walk processes in request order and their pages in
/// address order, taking pages that sit on the over-pressured node until
/// the quota runs out. Process order decides who gets rebalanced first.
pub fn plan(placements: &[PagePlacement], free: &[NodeState; 2]) -> MigrationPlan {
    let (source_node, quota) = pages_to_move(free);
    let mut remaining = quota;
    let mut moves = Vec::new();

    for placement in placements {
        if remaining == 0 {
            break;
        }
        let mut addresses = Vec::new();
        for (&addr, &status) in placement.addresses.iter().zip(&placement.status) {
            if remaining == 0 {
                break;
            }
            if status >= 0 && status as NodeId == source_node {
                addresses.push(addr);
                remaining -= 1;
            }
        }
        if !addresses.is_empty() {
            moves.push(ProcessMoves {
                pid: placement.pid,
                addresses,
            });
        }
    }

    let plan = MigrationPlan {
        source_node,
        destination_node: other_node(source_node),
        quota,
        moves,
    };
    debug!(
        "planned {} of {} pages off node {}",
        plan.len(),
        quota,
        source_node
    );
    plan
}
