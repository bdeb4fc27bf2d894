// src/config.rs

use crate::core::models::Protocol;
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration, loadable from a JSON file.
///
/// Every field has a default, so a partial file only overrides what it
/// names and no file at all means the stock scan profile: the bundled
/// jQuery paths probed at the root, then across the folder and subdomain
/// lists below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on simultaneously in-flight requests, process-wide.
    pub concurrent_requests: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries per URL after a connection failure; TLS failures are never
    /// retried and do not count against this budget.
    pub retry_count: u32,
    /// Hosts per chunk; bounds peak in-flight task count per pass.
    pub chunk_size: usize,
    /// Distinct locations a host may be found at before it is dropped from
    /// all remaining passes.
    pub hit_cap: u32,
    /// Relative resource paths tried in order at every location.
    pub resource_paths: Vec<String>,
    /// Folder names probed after the root pass, in order.
    pub folders: Vec<String>,
    /// Subdomain names probed after the folder passes, in order.
    pub subdomains: Vec<String>,
    /// Protocol priority order; the first entry is tried first.
    pub protocols: Vec<Protocol>,
    /// Content-Type substrings accepted as a script response.
    pub content_types: Vec<String>,
    /// Input host list, one host per line.
    pub domain_file: PathBuf,
    /// Output CSV of discoveries.
    pub output_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrent_requests: 50,
            timeout_secs: 40,
            retry_count: 1,
            chunk_size: 5000,
            hit_cap: 3,
            resource_paths: to_strings(&[
                "/wp-includes/js/jquery/jquery.js",
                "/wp-includes/js/jquery/jquery.min.js",
            ]),
            folders: to_strings(&[
                "blog", "site", "wp", "news", "wpress", "cms", "home", "main", "public",
                "html", "wp1", "wp2", "v1", "wp-site", "new", "test", "dev", "portal",
                "newsite", "wpbackup", "backup", "beta", "prod", "site1", "demo", "old",
                "wordpress",
            ]),
            subdomains: to_strings(&["blog", "test", "wp", "old", "dev"]),
            protocols: vec![Protocol::Https, Protocol::Http],
            content_types: to_strings(&[
                "javascript",
                "application/javascript",
                "text/javascript",
                "application/x-javascript",
            ]),
            domain_file: PathBuf::from("domains.txt"),
            output_file: PathBuf::from("found_js.csv"),
        }
    }
}

impl Config {
    /// Loads configuration from an optional JSON file; `None` means pure
    /// defaults. An unreadable or malformed file is a startup error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("could not read config file {}", path.display()))?;
                let config = serde_json::from_str(&contents)
                    .wrap_err_with(|| format!("could not parse config file {}", path.display()))?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
