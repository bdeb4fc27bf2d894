// src/core/scanner/mod.rs

// Public interface of the probing engine: candidate generation, the HTTP
// probe, and the orchestrator that drives them across the host list.
pub mod candidates;
pub mod probe;

use self::candidates::build_candidates;
use self::probe::Probe;
use crate::config::Config;
use crate::core::counter::HitCounter;
use crate::core::models::{Discovery, Host, LocationStrategy, ProbeOutcome, Protocol, ScanSummary};
use crate::sink::ResultSink;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{error, info};

/// Work-distribution loop for one run.
///
/// Drives a fixed pass order over the host list: one full pass at the root,
/// then one per configured folder, then one per configured subdomain. Each
/// pass is independently chunked; every task in a chunk finishes before the
/// next chunk starts. The only state threaded through all passes is the
/// per-host hit counter and the set of already-recorded locations.
pub struct ScanRunner<P, S> {
    probe: P,
    sink: Arc<S>,
    hits: HitCounter,
    recorded: HashSet<String>,
    resource_paths: Vec<String>,
    folders: Vec<String>,
    subdomains: Vec<String>,
    protocols: Vec<Protocol>,
    chunk_size: usize,
    found: AtomicUsize,
    scanned: AtomicUsize,
    started: Instant,
}

impl<P: Probe, S: ResultSink> ScanRunner<P, S> {
    /// `recorded` is the set of location identifiers reconstructed from an
    /// existing output file; those exact (host, location) pairs are skipped
    /// so an interrupted run can resume without duplicating results.
    pub fn new(config: &Config, probe: P, sink: Arc<S>, recorded: HashSet<String>) -> Self {
        Self {
            probe,
            sink,
            hits: HitCounter::new(config.hit_cap),
            recorded,
            resource_paths: config.resource_paths.clone(),
            folders: config.folders.clone(),
            subdomains: config.subdomains.clone(),
            protocols: config.protocols.clone(),
            chunk_size: config.chunk_size.max(1),
            found: AtomicUsize::new(0),
            scanned: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Runs every pass to completion and returns the run totals.
    pub async fn run(&self, hosts: &[Host]) -> ScanSummary {
        info!(hosts = hosts.len(), "Starting root pass.");
        self.run_pass(hosts, &LocationStrategy::Root).await;

        for folder in &self.folders {
            info!(folder = %folder, "Starting folder pass.");
            self.run_pass(hosts, &LocationStrategy::Folder(folder.clone()))
                .await;
        }

        for subdomain in &self.subdomains {
            info!(subdomain = %subdomain, "Starting subdomain pass.");
            self.run_pass(hosts, &LocationStrategy::Subdomain(subdomain.clone()))
                .await;
        }

        ScanSummary {
            found: self.found.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }

    /// One full pass over the host list with a single location strategy,
    /// processed in fixed-size chunks to bound peak in-flight work.
    async fn run_pass(&self, hosts: &[Host], location: &LocationStrategy) {
        let total_chunks = hosts.len().div_ceil(self.chunk_size);

        for (index, chunk) in hosts.chunks(self.chunk_size).enumerate() {
            info!(
                chunk = index + 1,
                total_chunks,
                location = %location.tag(),
                hosts = chunk.len(),
                "Scanning chunk."
            );
            self.scan_chunk(chunk, location).await;

            let elapsed = self.started.elapsed().as_secs_f64();
            let scanned = self.scanned.load(Ordering::Relaxed);
            let rate = if elapsed > 0.0 {
                scanned as f64 / elapsed
            } else {
                0.0
            };
            info!(
                chunk = index + 1,
                total_chunks,
                found = self.found.load(Ordering::Relaxed),
                hosts_per_sec = %format_args!("{rate:.2}"),
                "Chunk finished."
            );
        }
    }

    /// Launches one concurrent task per eligible host and waits for the
    /// whole chunk to settle. Hosts at the hit cap and (host, location)
    /// pairs already present in the output are filtered out before any
    /// probe is issued.
    async fn scan_chunk(&self, chunk: &[Host], location: &LocationStrategy) {
        let eligible: Vec<&Host> = chunk
            .iter()
            .filter(|host| !self.hits.is_capped(host))
            .filter(|host| !self.recorded.contains(&location.identifier(host)))
            .collect();

        if eligible.is_empty() {
            return;
        }

        self.scanned.fetch_add(eligible.len(), Ordering::Relaxed);
        join_all(
            eligible
                .into_iter()
                .map(|host| self.scan_host(host, location)),
        )
        .await;
    }

    /// Probes one host's candidate URLs strictly in order, stopping at the
    /// first `Found`. The discovery is persisted the moment it is known; a
    /// sink failure is logged and never aborts the run.
    async fn scan_host(&self, host: &Host, location: &LocationStrategy) {
        let candidates =
            build_candidates(host, location, &self.resource_paths, &self.protocols);

        for candidate in candidates {
            match self.probe.probe(&candidate.url).await {
                ProbeOutcome::Found { content_type } => {
                    info!(url = %candidate.url, content_type = %content_type, "Script found.");

                    let discovery = Discovery {
                        host: host.clone(),
                        location: location.clone(),
                        resource_path: candidate.resource_path,
                    };
                    if let Err(err) = self.sink.record(&discovery).await {
                        error!(
                            identifier = %discovery.identifier(),
                            error = %err,
                            "Failed to persist discovery."
                        );
                    }

                    self.found.fetch_add(1, Ordering::Relaxed);
                    let count = self.hits.increment(host);
                    if count == self.hits.cap() {
                        info!(host = %host, cap = count, "Hit cap reached, host will not be scanned again.");
                    }
                    return;
                }
                ProbeOutcome::NotFound | ProbeOutcome::Transient | ProbeOutcome::Permanent => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    struct ScriptedProbe {
        outcomes: HashMap<String, ProbeOutcome>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProbe {
        fn new(outcomes: &[(&str, ProbeOutcome)]) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let probe = Self {
                outcomes: outcomes
                    .iter()
                    .map(|(url, outcome)| (url.to_string(), outcome.clone()))
                    .collect(),
                calls: Arc::clone(&calls),
            };
            (probe, calls)
        }
    }

    impl Probe for ScriptedProbe {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            self.outcomes
                .get(url)
                .cloned()
                .unwrap_or(ProbeOutcome::NotFound)
        }
    }

    struct MemorySink {
        records: Mutex<Vec<Discovery>>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }

        fn records(&self) -> Vec<Discovery> {
            self.records.lock().unwrap().clone()
        }
    }

    impl ResultSink for MemorySink {
        async fn record(&self, discovery: &Discovery) -> io::Result<()> {
            self.records.lock().unwrap().push(discovery.clone());
            Ok(())
        }
    }

    fn found() -> ProbeOutcome {
        ProbeOutcome::Found {
            content_type: "application/javascript".to_string(),
        }
    }

    fn base_config() -> Config {
        Config {
            resource_paths: vec!["/a.js".to_string()],
            folders: Vec::new(),
            subdomains: Vec::new(),
            chunk_size: 2,
            ..Config::default()
        }
    }

    fn hosts(raw: &[&str]) -> Vec<Host> {
        raw.iter().map(|h| Host::normalize(h).unwrap()).collect()
    }

    async fn run(
        config: Config,
        outcomes: &[(&str, ProbeOutcome)],
        recorded: &[&str],
        host_list: &[&str],
    ) -> (Vec<Discovery>, Vec<String>, ScanSummary) {
        let (probe, calls) = ScriptedProbe::new(outcomes);
        let sink = Arc::new(MemorySink::new());
        let recorded = recorded.iter().map(|r| r.to_string()).collect();
        let runner = ScanRunner::new(&config, probe, Arc::clone(&sink), recorded);
        let summary = runner.run(&hosts(host_list)).await;
        let calls = calls.lock().unwrap().clone();
        (sink.records(), calls, summary)
    }

    #[tokio::test]
    async fn records_first_success_immediately() {
        let (records, calls, summary) = run(
            base_config(),
            &[("https://example.com/a.js", found())],
            &[],
            &["example.com"],
        )
        .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier(), "example.com");
        assert_eq!(records[0].resource_path, "/a.js");
        assert_eq!(summary.found, 1);
        // First success short-circuits: the plaintext fallback never runs.
        assert_eq!(calls, vec!["https://example.com/a.js"]);
    }

    #[tokio::test]
    async fn probes_candidates_strictly_in_order() {
        let mut config = base_config();
        config.resource_paths = vec!["/a.js".to_string(), "/b.js".to_string()];

        let (records, calls, _) = run(
            config,
            &[("http://example.com/b.js", found())],
            &[],
            &["example.com"],
        )
        .await;

        assert_eq!(
            calls,
            vec![
                "https://example.com/a.js",
                "https://example.com/b.js",
                "http://example.com/a.js",
                "http://example.com/b.js",
            ]
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resource_path, "/b.js");
    }

    #[tokio::test]
    async fn transient_failures_emit_nothing() {
        let (records, _, summary) = run(
            base_config(),
            &[
                ("https://example.com/a.js", ProbeOutcome::Transient),
                ("http://example.com/a.js", ProbeOutcome::Transient),
            ],
            &[],
            &["example.com"],
        )
        .await;

        assert!(records.is_empty());
        assert_eq!(summary.found, 0);
    }

    #[tokio::test]
    async fn tls_failure_still_reaches_plaintext_fallback() {
        let (records, calls, _) = run(
            base_config(),
            &[
                ("https://example.com/a.js", ProbeOutcome::Permanent),
                ("http://example.com/a.js", found()),
            ],
            &[],
            &["example.com"],
        )
        .await;

        assert_eq!(
            calls,
            vec!["https://example.com/a.js", "http://example.com/a.js"]
        );
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn folder_discovery_uses_folder_identifier() {
        let mut config = base_config();
        config.folders = vec!["blog".to_string()];

        let (records, _, _) = run(
            config,
            &[("https://example.com/blog/a.js", found())],
            &[],
            &["example.com"],
        )
        .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier(), "example.com/blog");
    }

    #[tokio::test]
    async fn subdomain_discovery_uses_subdomain_identifier() {
        let mut config = base_config();
        config.subdomains = vec!["blog".to_string()];

        let (records, _, _) = run(
            config,
            &[("https://blog.example.com/a.js", found())],
            &[],
            &["example.com"],
        )
        .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier(), "blog.example.com");
    }

    #[tokio::test]
    async fn capped_hosts_are_never_scheduled_again() {
        let mut config = base_config();
        config.hit_cap = 2;
        config.folders = vec!["blog".to_string(), "wp".to_string(), "old".to_string()];

        // Found at the root and in the first folder; the cap of 2 must stop
        // every later pass before a single probe is issued.
        let (records, calls, summary) = run(
            config,
            &[
                ("https://example.com/a.js", found()),
                ("https://example.com/blog/a.js", found()),
                ("https://example.com/wp/a.js", found()),
                ("https://example.com/old/a.js", found()),
            ],
            &[],
            &["example.com"],
        )
        .await;

        assert_eq!(records.len(), 2);
        assert_eq!(summary.found, 2);
        assert!(!calls.iter().any(|url| url.contains("/wp/")));
        assert!(!calls.iter().any(|url| url.contains("/old/")));
    }

    #[tokio::test]
    async fn resume_skips_recorded_pair_but_probes_other_locations() {
        let mut config = base_config();
        config.folders = vec!["blog".to_string()];

        let (records, calls, _) = run(
            config,
            &[
                ("https://example.com/a.js", found()),
                ("https://example.com/blog/a.js", found()),
            ],
            &["example.com"],
            &["example.com"],
        )
        .await;

        // The root pair was already in the output: no root probe at all,
        // while the untried folder location is still attempted.
        assert!(!calls.contains(&"https://example.com/a.js".to_string()));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier(), "example.com/blog");
    }

    #[tokio::test]
    async fn chunking_covers_every_host() {
        let (records, _, summary) = run(
            base_config(),
            &[
                ("https://one.com/a.js", found()),
                ("https://two.com/a.js", found()),
                ("https://three.com/a.js", found()),
            ],
            &[],
            &["one.com", "two.com", "three.com"],
        )
        .await;

        assert_eq!(records.len(), 3);
        assert_eq!(summary.found, 3);
    }
}
