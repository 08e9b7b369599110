//! Kroki HTTP client.

use std::time::Duration;

use tracing::debug;
use ureq::Agent;

/// Public Kroki instance used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "https://kroki.io";

/// Default timeout for Kroki requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("empty response from Kroki")]
    EmptyResponse,
}

/// Pick the Kroki endpoint: an explicit setting (command line or
/// environment), then the document config, then [`DEFAULT_ENDPOINT`].
///
/// Trailing slashes are dropped.
#[must_use]
pub fn resolve_endpoint(explicit: Option<&str>, config: Option<&str>) -> String {
    explicit
        .or(config)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_ENDPOINT)
        .trim_end_matches('/')
        .to_owned()
}

/// Create HTTP agent with the specified timeout.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Render `source` with Kroki and return the response body.
///
/// `kind` is the Kroki diagram type (`mermaid`, `plantuml`, ...), `format`
/// the output format (`png`, `svg`).
pub fn render(
    agent: &Agent,
    endpoint: &str,
    kind: &str,
    format: &str,
    source: &str,
) -> Result<Vec<u8>, DiagramError> {
    let url = format!("{endpoint}/{kind}/{format}");
    debug!(url, "Rendering diagram");

    let response = agent
        .post(&url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| DiagramError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(DiagramError::Http(format!("HTTP {status}: {error_body}")));
    }

    let bytes = body
        .read_to_vec()
        .map_err(|e| DiagramError::Io(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DiagramError::EmptyResponse);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_endpoint_precedence() {
        assert_eq!(
            resolve_endpoint(Some("http://cli:8000/"), Some("http://config")),
            "http://cli:8000"
        );
        assert_eq!(resolve_endpoint(None, Some("http://config")), "http://config");
        assert_eq!(resolve_endpoint(None, None), DEFAULT_ENDPOINT);
        assert_eq!(resolve_endpoint(Some("  "), None), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_render_connection_refused() {
        let agent = create_agent(Duration::from_secs(2));

        let err = render(&agent, "http://127.0.0.1:9", "mermaid", "png", "graph TD; A-->B").unwrap_err();

        assert!(matches!(err, DiagramError::Http(_)));
    }
}
