// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

// --- Host ---

// A normalized network identifier: no scheme, no leading "www.", no path,
// lower-cased. Created once at ingestion and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host(String);

impl Host {
    /// Normalizes a raw host line into a `Host`.
    ///
    /// Strips the scheme, a leading `www.`, any path component and the
    /// trailing slash, and lower-cases the result. Returns `None` when
    /// nothing host-shaped is left. Normalization is idempotent, so feeding
    /// an already-normalized host back in returns it unchanged.
    pub fn normalize(raw: &str) -> Option<Host> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        // Parse through the `url` crate when possible; it lower-cases the
        // host and discards path, port and userinfo in one step.
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let mut host = Url::parse(&with_scheme)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| strip_known_prefixes(trimmed));

        host = host.to_lowercase();
        if let Some(stripped) = host.strip_prefix("www.") {
            host = stripped.to_string();
        }
        let host = host
            .trim_end_matches('/')
            .split('/')
            .next()
            .unwrap_or("")
            .to_string();

        if host.is_empty() { None } else { Some(Host(host)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Fallback for inputs the `url` crate rejects (bare hosts with unusual
// characters). Mirrors the prefix stripping the parser would have done.
fn strip_known_prefixes(raw: &str) -> String {
    let mut host = raw;
    for prefix in ["http://", "https://"] {
        if let Some(stripped) = host.strip_prefix(prefix) {
            host = stripped;
        }
    }
    host.to_string()
}

// --- Protocol ---

// Transport scheme for a probe attempt. The configured priority order puts
// the encrypted transport first and plaintext as the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Http,
}

impl Protocol {
    pub fn prefix(&self) -> &'static str {
        match self {
            Protocol::Https => "https://",
            Protocol::Http => "http://",
        }
    }
}

// --- Location Strategy ---

// Where under/around a host to probe: the site root, a well-known folder,
// or a well-known subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationStrategy {
    Root,
    Folder(String),
    Subdomain(String),
}

impl LocationStrategy {
    /// Human-readable tag used in log lines: `root`, `folder(blog)`,
    /// `subdomain(blog)`.
    pub fn tag(&self) -> String {
        match self {
            LocationStrategy::Root => "root".to_string(),
            LocationStrategy::Folder(folder) => format!("folder({folder})"),
            LocationStrategy::Subdomain(subdomain) => format!("subdomain({subdomain})"),
        }
    }

    /// The identifier recorded in the sink's first column: the host itself
    /// for root, `host/folder` for folders, `sub.host` for subdomains.
    pub fn identifier(&self, host: &Host) -> String {
        match self {
            LocationStrategy::Root => host.as_str().to_string(),
            LocationStrategy::Folder(folder) => format!("{host}/{folder}"),
            LocationStrategy::Subdomain(subdomain) => format!("{subdomain}.{host}"),
        }
    }
}

// --- Probe Outcome ---

// Classification of a single existence check. Drives retry and
// short-circuit decisions; the probe never surfaces a raw error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    // Exact success status plus a script content type.
    Found { content_type: String },
    // Clean negative: wrong status, a redirect, or a non-script content type.
    NotFound,
    // Network-level failure that survived the retry budget.
    Transient,
    // TLS failure or any other unexpected request error; never retried.
    Permanent,
}

// --- Candidate URL ---

// One fully-formed URL to probe, paired with the resource path it targets.
// Ephemeral: generated per attempt, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub resource_path: String,
}

// --- Discovery ---

// The unit written to the sink: at most one per (host, location) pair,
// because the first success short-circuits the remaining candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub host: Host,
    pub location: LocationStrategy,
    pub resource_path: String,
}

impl Discovery {
    pub fn identifier(&self) -> String {
        self.location.identifier(&self.host)
    }
}

// --- Run Summary ---

// Totals reported when a run finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanSummary {
    pub found: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_www_and_slash() {
        let host = Host::normalize("HTTPS://WWW.Example.com/").unwrap();
        assert_eq!(host.as_str(), "example.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = Host::normalize("http://www.Example.com/blog/").unwrap();
        let twice = Host::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_drops_path_components() {
        let host = Host::normalize("example.com/wp/index.php").unwrap();
        assert_eq!(host.as_str(), "example.com");
    }

    #[test]
    fn normalize_rejects_blank_lines() {
        assert_eq!(Host::normalize(""), None);
        assert_eq!(Host::normalize("   "), None);
    }

    #[test]
    fn normalize_keeps_subdomains() {
        let host = Host::normalize("blog.example.com").unwrap();
        assert_eq!(host.as_str(), "blog.example.com");
    }

    #[test]
    fn location_tags() {
        assert_eq!(LocationStrategy::Root.tag(), "root");
        assert_eq!(LocationStrategy::Folder("blog".into()).tag(), "folder(blog)");
        assert_eq!(
            LocationStrategy::Subdomain("dev".into()).tag(),
            "subdomain(dev)"
        );
    }

    #[test]
    fn location_identifiers() {
        let host = Host::normalize("example.com").unwrap();
        assert_eq!(LocationStrategy::Root.identifier(&host), "example.com");
        assert_eq!(
            LocationStrategy::Folder("blog".into()).identifier(&host),
            "example.com/blog"
        );
        assert_eq!(
            LocationStrategy::Subdomain("blog".into()).identifier(&host),
            "blog.example.com"
        );
    }
}
