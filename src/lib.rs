pub mod app;
pub mod config;
pub mod error;
pub mod executor;
pub mod move_pages;
pub mod numa_node;
pub mod planner;
pub mod proc_info;
pub mod report;
pub mod sys_numa_info;

pub use app::{App, Outcome};
pub use config::Config;
pub use error::{Error, Result, UsageError};
