// src/hostlist.rs

use crate::core::models::Host;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::info;

/// Reads the line-oriented host list: one host per line, blank lines
/// ignored, every line normalized, duplicates collapsed while preserving
/// first-appearance order.
///
/// A missing or unreadable file is the one fatal input error of the whole
/// program; the caller maps it to a non-zero exit.
pub fn read_hosts(path: &Path) -> io::Result<Vec<Host>> {
    let contents = std::fs::read_to_string(path)?;

    let mut seen = HashSet::new();
    let mut hosts = Vec::new();
    for line in contents.lines() {
        if let Some(host) = Host::normalize(line) {
            if seen.insert(host.clone()) {
                hosts.push(host);
            }
        }
    }

    info!(count = hosts.len(), "Host list loaded.");
    Ok(hosts)
}
