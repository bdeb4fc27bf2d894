// src/sink.rs

use crate::core::models::Discovery;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

const CSV_HEADER: &str = "url,js_path";

/// Durable destination for discoveries.
///
/// Implementations must persist each record as soon as it arrives, so an
/// interrupted run keeps everything already found.
#[allow(async_fn_in_trait)]
pub trait ResultSink {
    async fn record(&self, discovery: &Discovery) -> io::Result<()>;
}

/// Append-only CSV output with two columns: the location identifier and the
/// discovered resource path.
///
/// The header row is written exactly once, when the file is first created.
/// Re-opening an existing file parses the first column back into the set of
/// already-recorded identifiers, which the orchestrator uses to skip exact
/// (host, location) pairs on resume.
pub struct CsvSink {
    file: Mutex<File>,
    recorded: HashSet<String>,
}

impl CsvSink {
    pub async fn open(path: &Path) -> io::Result<Self> {
        let existing = match tokio::fs::read_to_string(path).await {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };
        let recorded = existing.as_deref().map(parse_recorded).unwrap_or_default();

        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        if existing.is_none() {
            file.write_all(format!("{CSV_HEADER}\n").as_bytes()).await?;
            file.flush().await?;
        }

        if !recorded.is_empty() {
            info!(
                count = recorded.len(),
                "Previously recorded locations will be skipped."
            );
        }

        Ok(Self {
            file: Mutex::new(file),
            recorded,
        })
    }

    /// Location identifiers already present in the output file.
    pub fn recorded(&self) -> HashSet<String> {
        self.recorded.clone()
    }
}

impl ResultSink for CsvSink {
    async fn record(&self, discovery: &Discovery) -> io::Result<()> {
        // The whole row goes out in a single write followed by a flush, so
        // no partial record is ever visible in the file.
        let line = format!("{},{}\n", discovery.identifier(), discovery.resource_path);
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(
            identifier = %discovery.identifier(),
            resource = %discovery.resource_path,
            "Result recorded."
        );
        Ok(())
    }
}

fn parse_recorded(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .skip(1) // header row
        .filter_map(|line| line.split(',').next())
        .filter(|identifier| !identifier.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Host, LocationStrategy};

    fn discovery(location: LocationStrategy, resource_path: &str) -> Discovery {
        Discovery {
            host: Host::normalize("example.com").unwrap(),
            location,
            resource_path: resource_path.to_string(),
        }
    }

    #[tokio::test]
    async fn writes_header_once_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.csv");

        let sink = CsvSink::open(&path).await.unwrap();
        sink.record(&discovery(LocationStrategy::Root, "/a.js"))
            .await
            .unwrap();
        drop(sink);

        let sink = CsvSink::open(&path).await.unwrap();
        sink.record(&discovery(LocationStrategy::Folder("blog".into()), "/b.js"))
            .await
            .unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "url,js_path\nexample.com,/a.js\nexample.com/blog,/b.js\n"
        );
    }

    #[tokio::test]
    async fn reopening_reconstructs_recorded_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.csv");

        let sink = CsvSink::open(&path).await.unwrap();
        sink.record(&discovery(LocationStrategy::Root, "/a.js"))
            .await
            .unwrap();
        sink.record(&discovery(
            LocationStrategy::Subdomain("blog".into()),
            "/a.js",
        ))
        .await
        .unwrap();
        drop(sink);

        let sink = CsvSink::open(&path).await.unwrap();
        let recorded = sink.recorded();
        assert!(recorded.contains("example.com"));
        assert!(recorded.contains("blog.example.com"));
        assert_eq!(recorded.len(), 2);
    }

    #[tokio::test]
    async fn fresh_file_has_no_recorded_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.csv");

        let sink = CsvSink::open(&path).await.unwrap();
        assert!(sink.recorded().is_empty());
    }
}
