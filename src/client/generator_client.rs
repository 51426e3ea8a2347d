use crate::generator::api::{GenerationRequest, GenerationResponse, TASK_INDEX_HEADER};
use crate::storage::StoredRow;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generator returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("request task did not finish: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Paragraphs generated for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub task_index: usize,
    pub paragraphs: Vec<String>,
}

impl GenerationResult {
    /// One row per paragraph, numbered from 1, all tagged with `batch_stamp`
    pub fn into_rows(self, batch_stamp: i64) -> Vec<StoredRow> {
        let task_index = self.task_index as i64;
        self.paragraphs
            .into_iter()
            .enumerate()
            .map(|(i, text)| StoredRow::new(task_index, i as i64 + 1, text, batch_stamp))
            .collect()
    }
}

/// HTTP client for the generator service
#[derive(Debug, Clone)]
pub struct GeneratorClient {
    endpoint: String,
    client: reqwest::Client,
}

impl GeneratorClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// `http://<host>:<port>/lorem`, bracketing an IPv6 host
    pub fn endpoint_for(host: &str, port: u16) -> String {
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{}]:{}/lorem", host, port)
        } else {
            format!("http://{}:{}/lorem", host, port)
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request one text on behalf of task `task_index`
    pub async fn generate(
        &self,
        task_index: usize,
        request: GenerationRequest,
    ) -> Result<GenerationResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(TASK_INDEX_HEADER, task_index.to_string())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerationResponse = serde_json::from_str(&body)?;
        Ok(GenerationResult {
            task_index,
            paragraphs: parsed.paragraphs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_for() {
        assert_eq!(
            GeneratorClient::endpoint_for("localhost", 8000),
            "http://localhost:8000/lorem"
        );
        assert_eq!(
            GeneratorClient::endpoint_for("::1", 8000),
            "http://[::1]:8000/lorem"
        );
    }

    #[test]
    fn test_into_rows_numbers_paragraphs_from_one() {
        let result = GenerationResult {
            task_index: 5,
            paragraphs: vec!["first".to_string(), "second".to_string()],
        };

        let rows = result.into_rows(1234);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], StoredRow::new(5, 1, "first".to_string(), 1234));
        assert_eq!(rows[1], StoredRow::new(5, 2, "second".to_string(), 1234));
    }

    #[test]
    fn test_into_rows_empty() {
        let result = GenerationResult {
            task_index: 0,
            paragraphs: Vec::new(),
        };
        assert!(result.into_rows(1).is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = GeneratorClient::new(
            GeneratorClient::endpoint_for("127.0.0.1", port),
            Duration::from_secs(2),
        )
        .unwrap();

        let result = client
            .generate(0, GenerationRequest { paragraphs: 1, words: 1 })
            .await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }
}
