use cli_log::*;
use std::{env, path::PathBuf, str::FromStr};

pub const DEFAULT_NODE_ROOT: &str = "/sys/devices/system/node";
pub const DEFAULT_PROC_ROOT: &str = "/proc";
/// Upper bound on pages handed to a single move_pages call.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MIN_REGION_BYTES: u64 = 1 << 30;
pub const DEFAULT_MAX_PROCESSES: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub node_root: PathBuf,
    pub proc_root: PathBuf,
    pub page_size: usize,
    pub batch_size: usize,
    pub min_region_bytes: u64,
    pub max_processes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_root: PathBuf::from(DEFAULT_NODE_ROOT),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            page_size: page_size::get(),
            batch_size: DEFAULT_BATCH_SIZE,
            min_region_bytes: DEFAULT_MIN_REGION_BYTES,
            max_processes: DEFAULT_MAX_PROCESSES,
        }
    }
}

impl Config {
    /// Defaults overridden by `NUMABAL_NODE_ROOT`, `NUMABAL_PROC_ROOT`
    /// and `NUMABAL_BATCH_SIZE`.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(root) = env::var_os("NUMABAL_NODE_ROOT") {
            config.node_root = root.into();
        }
        if let Some(root) = env::var_os("NUMABAL_PROC_ROOT") {
            config.proc_root = root.into();
        }
        if let Some(batch) = parse_var::<usize>("NUMABAL_BATCH_SIZE") {
            if batch > 0 {
                config.batch_size = batch;
            } else {
                warn!("NUMABAL_BATCH_SIZE must be at least 1, keeping {}", config.batch_size);
            }
        }
        debug!("config: {:?}", config);
        config
    }

    /// Minimum region size, in pages, for a process to be rebalanced.
    pub fn min_region_pages(&self) -> u64 {
        self.min_region_bytes / self.page_size as u64
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // the environment is process-wide; tests touching it take this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 3] = ["NUMABAL_NODE_ROOT", "NUMABAL_PROC_ROOT", "NUMABAL_BATCH_SIZE"];

    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: every test that reads or writes the environment holds ENV_LOCK.
        unsafe {
            for key in VARS {
                env::remove_var(key);
            }
            for (key, value) in vars {
                env::set_var(key, value);
            }
        }
        let out = f();
        // SAFETY: still under ENV_LOCK.
        unsafe {
            for (key, _) in vars {
                env::remove_var(key);
            }
        }
        out
    }

    #[test]
    fn env_overrides_paths_and_batch_size() {
        let config = with_env(
            &[
                ("NUMABAL_NODE_ROOT", "/tmp/fake/node"),
                ("NUMABAL_PROC_ROOT", "/tmp/fake/proc"),
                ("NUMABAL_BATCH_SIZE", " 250 "),
            ],
            Config::from_env,
        );
        assert_eq!(config.node_root, PathBuf::from("/tmp/fake/node"));
        assert_eq!(config.proc_root, PathBuf::from("/tmp/fake/proc"));
        assert_eq!(config.batch_size, 250);
    }

    #[test]
    fn empty_env_keeps_defaults() {
        let config = with_env(&[], Config::from_env);
        assert_eq!(config.node_root, PathBuf::from(DEFAULT_NODE_ROOT));
        assert_eq!(config.proc_root, PathBuf::from(DEFAULT_PROC_ROOT));
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = with_env(&[("NUMABAL_BATCH_SIZE", "0")], Config::from_env);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn unparseable_batch_size_is_ignored() {
        let config = with_env(&[("NUMABAL_BATCH_SIZE", "lots")], Config::from_env);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn parse_var_trims_and_rejects_garbage() {
        with_env(&[("NUMABAL_BATCH_SIZE", "  42\n")], || {
            assert_eq!(parse_var::<usize>("NUMABAL_BATCH_SIZE"), Some(42));
        });
        with_env(&[("NUMABAL_BATCH_SIZE", "-1")], || {
            assert_eq!(parse_var::<usize>("NUMABAL_BATCH_SIZE"), None);
        });
        with_env(&[], || {
            assert_eq!(parse_var::<usize>("NUMABAL_BATCH_SIZE"), None);
        });
    }

    #[test]
    fn one_gib_threshold_in_pages() {
        let config = Config {
            page_size: 4096,
            ..Config::default()
        };
        assert_eq!(config.min_region_pages(), 262_144);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_processes, 10);
    }
}
