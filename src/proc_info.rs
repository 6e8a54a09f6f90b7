use crate::config::Config;
use crate::error::{Result, UsageError};
use cli_log::*;
use std::{
    fs,
    io::{self, BufRead},
};

/// The largest anonymous mapping of a process, in pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessMemoryRegion {
    pub pid: u32,
    pub base: usize,
    pub page_count: u64,
}

impl ProcessMemoryRegion {
    pub fn size_kb(&self, page_size: usize) -> u64 {
        self.page_count.saturating_mul(page_size as u64) >> 10
    }

    /// Virtual address of every page in the region, in address order.
    pub fn page_addresses(
        &self,
        page_size: usize,
    ) -> std::result::Result<Vec<usize>, UsageError> {
        let bad_base = || UsageError::BadRegionBase {
            pid: self.pid,
            base: self.base,
        };
        let count = usize::try_from(self.page_count).map_err(|_| bad_base())?;
        if count == 0 {
            return Ok(Vec::new());
        }
        // the last page must still be addressable
        count
            .checked_sub(1)
            .and_then(|last| last.checked_mul(page_size))
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(bad_base)?;

        Ok((0..count).map(|i| self.base + i * page_size).collect())
    }
}

/// Locates the largest anonymous region of `pid` from `/proc/<pid>/numa_maps`
/// and checks it against the configured minimum size.
pub fn locate_region(config: &Config, pid: u32) -> Result<ProcessMemoryRegion> {
    let path = config.proc_root.join(pid.to_string()).join("numa_maps");
    let found = fs::File::open(&path)
        .and_then(|f| largest_anon_region(io::BufReader::new(f), config.page_size));

    let (base, page_count) = match found {
        Ok(Some(region)) => region,
        Ok(None) => {
            warn!("no anonymous region in {}", path.display());
            return Err(UsageError::RegionNotFound { pid }.into());
        }
        Err(e) => {
            warn!("reading {}: {}", path.display(), e);
            return Err(UsageError::RegionNotFound { pid }.into());
        }
    };

    let region = ProcessMemoryRegion {
        pid,
        base,
        page_count,
    };
    info!(
        "pid {}: largest anon region at {:#x}, {} pages",
        pid, base, page_count
    );

    if page_count < config.min_region_pages() {
        return Err(UsageError::RegionTooSmall {
            pid,
            size_kb: region.size_kb(config.page_size),
        }
        .into());
    }
    if base == 0 || base % config.page_size != 0 {
        return Err(UsageError::BadRegionBase { pid, base }.into());
    }
    Ok(region)
}

/// Scans a numa_maps report for the line with the largest anon size.
/// Returns `(base_address, page_count)`, or `None` when no line has
/// any anonymous pages.
pub fn largest_anon_region(
    reader: impl BufRead,
    page_size: usize,
) -> io::Result<Option<(usize, u64)>> {
    let mut best: Option<(usize, u64)> = None;

    // file= paths are raw bytes; only the ASCII tokens matter here
    for raw in reader.split(b'\n') {
        let raw = raw?;
        let line = String::from_utf8_lossy(&raw);
        let Some(pages) = anon_pages(&line, page_size) else {
            continue;
        };
        if pages <= best.map_or(0, |(_, p)| p) {
            continue;
        }
        let addr_str = line.split_whitespace().next().unwrap_or("");
        match usize::from_str_radix(addr_str, 16) {
            Ok(base) => best = Some((base, pages)),
            Err(_) => debug!("unparseable region address in {:?}", line),
        }
    }

    Ok(best)
}

// Size following the first "anon" marker. A "kB" unit means kilobytes,
// a bare count (numa_maps "anon=<N>") means pages. No digits counts as zero.
fn anon_pages(line: &str, page_size: usize) -> Option<u64> {
    let idx = line.find("anon")?;
    let rest = &line[idx..];
    let Some(start) = rest.find(|c: char| c.is_ascii_digit()) else {
        return Some(0);
    };
    let digits = &rest[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<u64>().unwrap_or(0);

    if digits[end..].trim_start().starts_with("kB") {
        Some(value.saturating_mul(1024) / page_size as u64)
    } else {
        Some(value)
    }
}
