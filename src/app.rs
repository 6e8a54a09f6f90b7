use crate::config::Config;
use crate::error::{Result, UsageError};
use crate::executor::{self, MigrationReport};
use crate::move_pages::{KernelPageMover, PageMover};
use crate::numa_node::{NodeState, Topology};
use crate::planner::{self, MigrationPlan};
use crate::proc_info::{self, ProcessMemoryRegion};
use crate::report;
use crate::sys_numa_info::{read_node_state, read_topology};
use cli_log::*;

#[derive(Debug)]
pub enum Outcome {
    /// The machine is not a two-node system; nothing was touched.
    UnsupportedTopology(Topology),
    Rebalanced {
        plan: MigrationPlan,
        report: MigrationReport,
    },
}

pub struct App<M: PageMover> {
    pub config: Config,
    mover: M,
}

impl App<KernelPageMover> {
    pub fn new(config: Config) -> Self {
        App::with_mover(config, KernelPageMover)
    }
}

impl<M: PageMover> App<M> {
    pub fn with_mover(config: Config, mover: M) -> Self {
        App { config, mover }
    }

    pub fn mover(&self) -> &M {
        &self.mover
    }

    /// One rebalancing pass over `pids`.
    ///
    /// Every residency query finishes before free memory is read, and the
    /// plan is built from that single snapshot before any page moves.
    pub fn run(&mut self, pids: &[u32]) -> Result<Outcome> {
        self.check_pids(pids)?;

        let topology = read_topology(&self.config.node_root)?;
        if !topology.is_two_node() {
            println!("{}", report::unsupported_topology(&topology));
            return Ok(Outcome::UnsupportedTopology(topology));
        }

        let regions = pids
            .iter()
            .map(|&pid| proc_info::locate_region(&self.config, pid))
            .collect::<Result<Vec<ProcessMemoryRegion>>>()?;

        let mut placements = Vec::with_capacity(regions.len());
        for region in &regions {
            let placement = planner::query_placement(
                &mut self.mover,
                region,
                self.config.page_size,
                self.config.batch_size,
            )?;
            print!("{}", report::allocation(region.pid, &placement.tally()));
            placements.push(placement);
        }

        let free = self.read_free()?;
        print!("{}", report::free_counts(&free));

        let plan = planner::plan(&placements, &free);
        println!("{}", report::freeing(&plan));

        let report = executor::execute(&plan, &mut self.mover, self.config.batch_size)?;
        println!("{}", report::summary(&report));

        Ok(Outcome::Rebalanced { plan, report })
    }

    fn check_pids(&self, pids: &[u32]) -> Result<()> {
        if pids.is_empty() {
            return Err(UsageError::NoProcesses.into());
        }
        if pids.len() > self.config.max_processes {
            return Err(UsageError::TooManyProcesses {
                max: self.config.max_processes,
                requested: pids.len(),
            }
            .into());
        }
        if pids.contains(&0) {
            return Err(UsageError::InvalidPid("0".to_string()).into());
        }
        Ok(())
    }

    fn read_free(&self) -> Result<[NodeState; 2]> {
        let node0 = read_node_state(&self.config.node_root, 0, self.config.page_size)?;
        let node1 = read_node_state(&self.config.node_root, 1, self.config.page_size)?;
        info!(
            "free pages: node0 {}, node1 {}",
            node0.free_pages, node1.free_pages
        );
        Ok([node0, node1])
    }
}

/// Converts command-line arguments to process ids.
pub fn parse_pids<I, S>(args: I) -> std::result::Result<Vec<u32>, UsageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.as_ref();
            match arg.parse::<u32>() {
                Ok(pid) if pid > 0 => Ok(pid),
                _ => Err(UsageError::InvalidPid(arg.to_string())),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pids_accepts_positive_integers() {
        assert_eq!(parse_pids(["12", "3400"]).unwrap(), vec![12, 3400]);
    }

    #[test]
    fn parse_pids_rejects_garbage() {
        for bad in ["0", "-5", "abc", ""] {
            assert!(matches!(
                parse_pids([bad]),
                Err(UsageError::InvalidPid(_))
            ));
        }
    }

    #[test]
    fn too_many_pids_is_usage_error() {
        let mut app = App::new(Config::default());
        let pids: Vec<u32> = (1..=11).collect();
        let err = app.run(&pids).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Usage(UsageError::TooManyProcesses {
                max: 10,
                requested: 11
            })
        ));
    }
}
