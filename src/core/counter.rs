// src/core/counter.rs

use crate::core::models::Host;
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-run accounting of how many distinct locations each host was found at.
///
/// Shared across every concurrently scheduled host task for the lifetime of
/// one run. Once a host reaches the configured cap, no further probing is
/// scheduled for it in any remaining chunk or location pass.
pub struct HitCounter {
    cap: u32,
    counts: Mutex<HashMap<Host, u32>>,
}

impl HitCounter {
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Whether the host has already been found at the capped number of
    /// distinct locations.
    pub fn is_capped(&self, host: &Host) -> bool {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(host).copied().unwrap_or(0) >= self.cap
    }

    /// Atomically increments the host's count and returns the new value, so
    /// the caller can compare against the cap without a second lock.
    pub fn increment(&self, host: &Host) -> u32 {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(host.clone()).or_insert(0);
        *count += 1;
        *count
    }
}
