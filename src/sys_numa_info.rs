use crate::error::{Error, Result};
use crate::numa_node::{NodeId, NodeState, Topology};
use cli_log::*;
use std::{
    fs,
    io::{self, BufRead},
    path::Path,
};

/// Enumerates the `node<N>` entries of the node registry.
pub fn read_topology(node_root: &Path) -> Result<Topology> {
    let mut node_ids = Vec::new();

    for entry in fs::read_dir(node_root).map_err(|e| Error::read(node_root, e))? {
        let entry = entry.map_err(|e| Error::read(node_root, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(suffix) = name.strip_prefix("node") {
            match suffix.parse::<NodeId>() {
                Ok(id) => node_ids.push(id),
                Err(_) => debug!("skipping registry entry {:?}", name),
            }
        }
    }

    node_ids.sort_unstable();
    debug!("configured nodes: {:?}", node_ids);
    Ok(Topology { node_ids })
}

/// Reads the current free memory of `node` and converts it to pages.
pub fn read_node_state(node_root: &Path, node: NodeId, page_size: usize) -> Result<NodeState> {
    let path = node_root.join(format!("node{}", node)).join("meminfo");
    let file = fs::File::open(&path).map_err(|e| Error::read(&path, e))?;
    let free_kb = parse_mem_free_kb(io::BufReader::new(file))
        .map_err(|e| Error::read(&path, e))?
        .ok_or_else(|| Error::MissingField {
            path: path.clone(),
            field: "MemFree",
        })?;

    let free_pages = free_kb.saturating_mul(1024) / page_size as u64;
    debug!("node {} MemFree {} kB = {} pages", node, free_kb, free_pages);
    Ok(NodeState {
        id: node,
        free_pages,
    })
}

// Lines look like "Node 0 MemFree:   123456 kB"; the value is the token
// right before the kB unit.
fn parse_mem_free_kb(reader: impl BufRead) -> io::Result<Option<u64>> {
    let mut mem_free_kb = None;

    for line in reader.lines() {
        let line = line?;
        if !line.contains("MemFree") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(unit_idx) = parts.iter().position(|&p| p == "kB") else {
            continue;
        };
        mem_free_kb = unit_idx
            .checked_sub(1)
            .and_then(|i| parts[i].parse::<u64>().ok());
    }

    Ok(mem_free_kb)
}
