//! # Decision Sources
//!
//! Where the dashboard's records come from. [`HttpSource`] wraps the backend
//! client; [`FileSource`] replays a JSONL decision log straight off disk,
//! which is how pipeline output files get reviewed without a backend running.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::client::{DecisionsClient, FetchError};
use crate::decision::{Decision, DecisionsMeta, DecisionsPayload};

/// A fetchable provider of decision payloads.
///
/// Implementations are IO boundaries. Everything downstream of
/// [`crate::store`] is source-agnostic.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn fetch(&self) -> Result<DecisionsPayload, FetchError>;

    /// Human-readable origin, shown in the dashboard header.
    fn describe(&self) -> String;
}

/// Live routing backend over HTTP.
pub struct HttpSource {
    client: DecisionsClient,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: DecisionsClient::new(base_url),
        }
    }
}

#[async_trait]
impl DecisionSource for HttpSource {
    async fn fetch(&self) -> Result<DecisionsPayload, FetchError> {
        self.client.fetch_decisions().await
    }

    fn describe(&self) -> String {
        self.client.base_url().to_string()
    }
}

/// JSONL decision log on disk, one record per line.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DecisionSource for FileSource {
    async fn fetch(&self) -> Result<DecisionsPayload, FetchError> {
        read_decision_log(&self.path)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Parse a JSONL decision log into a payload with synthesized meta.
///
/// Blank lines are skipped but still counted, so line numbers in parse
/// errors match what an editor shows (1-based).
fn read_decision_log(path: &Path) -> Result<DecisionsPayload, FetchError> {
    let text = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut decisions = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let decision: Decision =
            serde_json::from_str(line).map_err(|source| FetchError::Parse {
                path: path.display().to_string(),
                line: idx + 1,
                source,
            })?;
        decisions.push(decision);
    }

    Ok(DecisionsPayload {
        meta: DecisionsMeta {
            source: "file".to_string(),
            count: decisions.len() as u64,
            generated_at: Some(chrono::Utc::now().to_rfc3339()),
        },
        decisions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_log(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_read_decision_log() {
        let (_dir, path) = write_log(concat!(
            "{\"predicted_country\": \"US\", \"region\": \"AMER\", \"confidence\": 0.12}\n",
            "\n",
            "{\"supplier_country\": \"JP\", \"continent\": \"APAC\", \"confidence\": 0.05}\n",
        ));

        let payload = read_decision_log(&path).unwrap();
        assert_eq!(payload.meta.source, "file");
        assert_eq!(payload.meta.count, 2);
        assert!(payload.meta.generated_at.is_some());
        assert_eq!(payload.decisions.len(), 2);
        assert_eq!(payload.decisions[1].predicted_country.as_deref(), Some("JP"));
    }

    #[test]
    fn test_parse_error_reports_editor_line_number() {
        let (_dir, path) = write_log(concat!(
            "{\"predicted_country\": \"US\"}\n",
            "\n",
            "not json\n",
        ));

        let err = read_decision_log(&path).unwrap_err();
        match err {
            FetchError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Parse error, got {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_decision_log(&dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn test_file_source_through_trait() {
        let (_dir, path) = write_log("{\"predicted_country\": \"DE\"}\n");
        let source: Box<dyn DecisionSource> = Box::new(FileSource::new(&path));

        let payload = source.fetch().await.unwrap();
        assert_eq!(payload.decisions.len(), 1);
        assert!(source.describe().starts_with("file:"));
    }

    #[test]
    fn test_http_source_describe_is_base_url() {
        let source = HttpSource::new("http://localhost:8000");
        assert_eq!(source.describe(), "http://localhost:8000");
    }
}
