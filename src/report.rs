use crate::executor::MigrationReport;
use crate::numa_node::{NodeState, NodeTally, Topology};
use crate::planner::MigrationPlan;
use std::fmt::Write;

pub fn unsupported_topology(topology: &Topology) -> String {
    format!(
        "Exactly 2 nodes is required (found {}: {:?}, mask {:#x})",
        topology.node_count(),
        topology.node_ids,
        topology.node_mask()
    )
}

pub fn allocation(pid: u32, tally: &NodeTally) -> String {
    let mut text = format!("Pid {} current allocation:\n", pid);
    for (node, count) in tally.pages.iter().enumerate() {
        let _ = writeln!(text, "\t{}: {}", node, count);
    }
    if tally.not_resident > 0 {
        let _ = writeln!(text, "\tnot resident: {}", tally.not_resident);
    }
    text
}

pub fn free_counts(nodes: &[NodeState]) -> String {
    let mut text = String::from("\nNode free counts:\n");
    for node in nodes {
        let _ = writeln!(text, "\t{}: {} free pages", node.id, node.free_pages);
    }
    text
}

pub fn freeing(plan: &MigrationPlan) -> String {
    let mut text = format!(
        "\nFreeing {} pages on node {}",
        plan.quota, plan.source_node
    );
    if (plan.len() as u64) < plan.quota {
        let _ = write!(text, " (only {} pages available)", plan.len());
    }
    text
}

pub fn summary(report: &MigrationReport) -> String {
    format!(
        "Moved {} pages in {} calls ({} stale, {} not moved)",
        report.moved, report.calls, report.stale, report.failed
    )
}
