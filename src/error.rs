use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("no process ids given")]
    NoProcesses,

    #[error("max supported procs is {max} ({requested} requested)")]
    TooManyProcesses { max: usize, requested: usize },

    #[error("invalid process id: {0:?}")]
    InvalidPid(String),

    #[error("get anon set failed for pid {pid}")]
    RegionNotFound { pid: u32 },

    #[error(
        "pid {pid}: largest anon mem region size too small, buffer pool not found ({size_kb} kB)"
    )]
    RegionTooSmall { pid: u32, size_kb: u64 },

    #[error("pid {pid}: region base {base:#x} is not a usable page address")]
    BadRegionBase { pid: u32, base: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("unable to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{field} not found in {path:?}")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("move_pages for pid {pid}: {source}")]
    Syscall {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    /// Whether the command-line usage line should follow this error.
    /// A region that exists but is unusable gets only its own message.
    pub fn shows_usage(&self) -> bool {
        matches!(
            self,
            Error::Usage(
                UsageError::NoProcesses
                    | UsageError::InvalidPid(_)
                    | UsageError::RegionNotFound { .. }
            )
        )
    }

    /// Process exit status for this error: 1 for usage and read failures,
    /// the OS errno for a fatal migration failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) | Error::Read { .. } | Error::MissingField { .. } => 1,
            Error::Syscall { source, .. } => source.raw_os_error().unwrap_or(1),
        }
    }
}
