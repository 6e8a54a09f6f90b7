use crate::error::{Error, Result};
use crate::move_pages::{PageMover, is_stale};
use crate::planner::MigrationPlan;
use cli_log::*;

/// Outcome of executing a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub calls: usize,
    pub moved: u64,
    /// Pages whose process or mapping vanished before they could move.
    pub stale: u64,
    /// Pages the kernel refused to move, e.g. busy or shared pages.
    pub failed: u64,
}

/// Issues the plan's migrations, `batch_size` pages per call.
///
/// Stale failures are skipped. Any other call failure aborts with the OS
/// error; moves already made stay in place.
pub fn execute(
    plan: &MigrationPlan,
    mover: &mut impl PageMover,
    batch_size: usize,
) -> Result<MigrationReport> {
    let batch_size = batch_size.max(1);
    let mut report = MigrationReport::default();
    let dest = plan.destination_node;

    for moves in &plan.moves {
        let nodes = vec![dest; batch_size.min(moves.addresses.len())];

        for batch in moves.addresses.chunks(batch_size) {
            let mut status = vec![0; batch.len()];
            report.calls += 1;

            match mover.move_pages(moves.pid, batch, Some(&nodes[..batch.len()]), &mut status) {
                Ok(()) => {}
                Err(e) if is_stale(&e) => {
                    warn!("pid {}: skipping {} stale pages: {}", moves.pid, batch.len(), e);
                    report.stale += batch.len() as u64;
                    continue;
                }
                Err(source) => {
                    return Err(Error::Syscall {
                        pid: moves.pid,
                        source,
                    });
                }
            }

            for (&addr, &s) in batch.iter().zip(&status) {
                if s >= 0 && s as u32 == dest {
                    report.moved += 1;
                } else if s == -libc::ENOENT || s == -libc::ESRCH {
                    report.stale += 1;
                } else {
                    debug!("pid {}: page {:#x} not moved (status {})", moves.pid, addr, s);
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        "migration done: {} calls, {} moved, {} stale, {} failed",
        report.calls, report.moved, report.stale, report.failed
    );
    Ok(report)
}
