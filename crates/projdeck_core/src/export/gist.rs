//! Paste service client for secret gists.
//!
//! # Responsibility
//! - Publish one markdown file as a private gist.
//! - Decode the provider response into the fields the pipeline consumes.
//!
//! # Invariants
//! - Requests are never sent without a credential.
//! - Non-2xx responses are errors; the body is not trusted.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("projdeck/", env!("CARGO_PKG_VERSION"));

/// Decoded gist creation response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GistResponse {
    /// Canonical browser URL of the created gist.
    pub html_url: String,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

/// One file entry echoed back by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub content: Option<String>,
}

impl GistResponse {
    /// Returns the echoed content for `file_name`, if the provider kept it.
    pub fn file_content(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name)?.content.as_deref()
    }
}

/// Paste service failures.
#[derive(Debug)]
pub enum GistError {
    MissingCredential,
    Status { code: u16, body: String },
    Transport(String),
    InvalidResponse(String),
    /// Carries the expected file name; `Display` omits it so titles stay
    /// out of log lines.
    MissingFile(String),
}

impl Display for GistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "gist credential is not configured"),
            Self::Status { code, .. } => write!(f, "gist api responded with status {code}"),
            Self::Transport(message) => write!(f, "gist api transport error: {message}"),
            Self::InvalidResponse(message) => write!(f, "invalid gist api response: {message}"),
            Self::MissingFile(_) => write!(f, "expected file not found in the gist"),
        }
    }
}

impl Error for GistError {}

/// Publishes private single-file gists.
pub trait GistPublisher {
    fn create_secret_gist(&self, file_name: &str, content: &str)
        -> Result<GistResponse, GistError>;
}

/// Builds the JSON payload for a private single-file gist.
pub fn gist_payload(file_name: &str, content: &str) -> Value {
    json!({
        "files": {
            file_name: { "content": content }
        },
        "public": false,
    })
}

/// Decodes a provider response body.
pub fn parse_gist_response(body: Value) -> Result<GistResponse, GistError> {
    serde_json::from_value(body).map_err(|err| GistError::InvalidResponse(err.to_string()))
}

/// HTTP gist client backed by `ureq`.
pub struct HttpGistPublisher {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl HttpGistPublisher {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            endpoint: endpoint.into(),
            token: token.filter(|value| !value.trim().is_empty()),
        }
    }
}

impl GistPublisher for HttpGistPublisher {
    fn create_secret_gist(
        &self,
        file_name: &str,
        content: &str,
    ) -> Result<GistResponse, GistError> {
        let token = self.token.as_deref().ok_or(GistError::MissingCredential)?;

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("token {token}"))
            .set("Accept", ACCEPT_HEADER)
            .set("User-Agent", USER_AGENT)
            .send_json(gist_payload(file_name, content));

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(GistError::Status { code, body });
            }
            Err(other) => return Err(GistError::Transport(other.to_string())),
        };

        let body: Value = response
            .into_json()
            .map_err(|err| GistError::InvalidResponse(err.to_string()))?;
        parse_gist_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::{gist_payload, parse_gist_response, GistError, GistPublisher, HttpGistPublisher};
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serves one canned response and returns the endpoint plus the raw
    /// request head it received.
    fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/gists", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            head
        });
        (endpoint, handle)
    }

    #[test]
    fn payload_is_private_single_file() {
        let payload = gist_payload("Sprint1.md", "# Sprint1\n");
        assert_eq!(payload["public"], false);
        assert_eq!(payload["files"]["Sprint1.md"]["content"], "# Sprint1\n");
    }

    #[test]
    fn response_exposes_echoed_content() {
        let parsed = parse_gist_response(json!({
            "html_url": "https://gist.github.com/abc",
            "files": { "Sprint1.md": { "content": "# Sprint1\n" } }
        }))
        .unwrap();
        assert_eq!(parsed.html_url, "https://gist.github.com/abc");
        assert_eq!(parsed.file_content("Sprint1.md"), Some("# Sprint1\n"));
        assert_eq!(parsed.file_content("Other.md"), None);
    }

    #[test]
    fn response_without_url_is_invalid() {
        let err = parse_gist_response(json!({ "files": {} })).unwrap_err();
        assert!(matches!(err, GistError::InvalidResponse(_)));
    }

    #[test]
    fn missing_credential_fails_before_any_request() {
        let publisher = HttpGistPublisher::new("http://127.0.0.1:9/gists", Some("  ".into()));
        let err = publisher.create_secret_gist("a.md", "a").unwrap_err();
        assert!(matches!(err, GistError::MissingCredential));
    }

    #[test]
    fn non_success_status_is_reported_with_code() {
        let (endpoint, server) = serve_once(
            "401 Unauthorized",
            r#"{"message":"Bad credentials"}"#,
        );
        let publisher = HttpGistPublisher::new(endpoint, Some("secret-token".into()));

        let err = publisher.create_secret_gist("a.md", "x").unwrap_err();
        match &err {
            GistError::Status { code, body } => {
                assert_eq!(*code, 401);
                assert!(body.contains("Bad credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains("Bad credentials"));

        let head = server.join().unwrap();
        assert!(head.starts_with("POST /gists "));
        assert!(head.contains("token secret-token"));
    }

    #[test]
    fn created_response_is_decoded() {
        let (endpoint, server) = serve_once(
            "201 Created",
            r#"{"html_url":"https://g/x","files":{"a.md":{"content":"x"}}}"#,
        );
        let publisher = HttpGistPublisher::new(endpoint, Some("secret-token".into()));

        let response = publisher.create_secret_gist("a.md", "x").unwrap();
        assert_eq!(response.html_url, "https://g/x");
        assert_eq!(response.file_content("a.md"), Some("x"));
        server.join().unwrap();
    }

    #[test]
    fn success_with_malformed_body_is_invalid_response() {
        let (endpoint, server) = serve_once("201 Created", r#"{"files":{}}"#);
        let publisher = HttpGistPublisher::new(endpoint, Some("secret-token".into()));

        let err = publisher.create_secret_gist("a.md", "x").unwrap_err();
        assert!(matches!(err, GistError::InvalidResponse(_)));
        server.join().unwrap();
    }
}
