//! Thin wrapper over the `move_pages(2)` system call.
//!
//! The kernel call is the only place the crate touches another process's
//! address space; everything above it deals in plain `usize` addresses.

use crate::numa_node::NodeId;
use cli_log::*;
use std::io;

/// Query or migrate the pages of a process.
///
/// With `nodes == None` the call is a pure residency query: `status[i]`
/// receives the node currently backing `pages[i]`, or a negative errno.
/// With `Some(nodes)` each `pages[i]` is moved to `nodes[i]` and
/// `status[i]` receives the resulting node or a negative errno.
///
/// Implementations do not split large requests; callers keep each call
/// within the configured batch size.
pub trait PageMover {
    fn move_pages(
        &mut self,
        pid: u32,
        pages: &[usize],
        nodes: Option<&[NodeId]>,
        status: &mut [i32],
    ) -> io::Result<()>;
}

/// True for call failures caused by the process or its pages disappearing
/// underneath us. These are skipped rather than aborting the run.
pub fn is_stale(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(libc::ENOENT) | Some(libc::ESRCH))
}

/// `PageMover` backed by the real system call.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelPageMover;

impl PageMover for KernelPageMover {
    #[cfg(target_os = "linux")]
    fn move_pages(
        &mut self,
        pid: u32,
        pages: &[usize],
        nodes: Option<&[NodeId]>,
        status: &mut [i32],
    ) -> io::Result<()> {
        if status.len() != pages.len() || nodes.is_some_and(|n| n.len() != pages.len()) {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        if pages.is_empty() {
            return Ok(());
        }
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::from_raw_os_error(libc::ESRCH))?;
        let nodes: Option<Vec<libc::c_int>> = match nodes {
            Some(nodes) => Some(
                nodes
                    .iter()
                    .map(|&n| libc::c_int::try_from(n))
                    .collect::<Result<_, _>>()
                    .map_err(|_| io::Error::from_raw_os_error(libc::EINVAL))?,
            ),
            None => None,
        };
        let nodes_ptr = nodes
            .as_ref()
            .map_or(std::ptr::null(), |n| n.as_ptr());

        // SAFETY: `pages`, `nodes` and `status` all hold `pages.len()`
        // elements and outlive the call. The kernel only dereferences the
        // addresses in `pages` inside the target process and validates them
        // itself; a null `nodes` pointer requests a residency query.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_move_pages,
                pid,
                pages.len() as libc::c_ulong,
                pages.as_ptr() as *const *mut libc::c_void,
                nodes_ptr,
                status.as_mut_ptr(),
                0 as libc::c_int,
            )
        };

        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        if rc > 0 {
            debug!("move_pages pid {}: {} pages not migrated", pid, rc);
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn move_pages(
        &mut self,
        _pid: u32,
        _pages: &[usize],
        _nodes: Option<&[NodeId]>,
        _status: &mut [i32],
    ) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_errors() {
        assert!(is_stale(&io::Error::from_raw_os_error(libc::ENOENT)));
        assert!(is_stale(&io::Error::from_raw_os_error(libc::ESRCH)));
        assert!(!is_stale(&io::Error::from_raw_os_error(libc::EPERM)));
        assert!(!is_stale(&io::Error::from_raw_os_error(libc::EINVAL)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut status = [0; 1];
        let err = KernelPageMover
            .move_pages(1, &[0x1000, 0x2000], None, &mut status)
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }
}
