//! HTTP request node.
//!
//! Non-2xx responses are data, not failures: the status and body land in
//! `payload.httpResponse` so a downstream condition can branch on them.
//! Only transport failures (DNS, connect, TLS, timeout) fail the node.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::path::{object_or_empty, render_template, render_value};
use super::types::{NodeContext, NodeExecutor};
use crate::config::HttpSettings;
use crate::error::{Error, Result};
use crate::workflow::Node;

/// HTTP request node.
pub struct HttpRequestNode {
    client: Client,
    allow_internal_urls: bool,
}

impl HttpRequestNode {
    pub fn new() -> Self {
        Self::with_settings(&HttpSettings::default())
    }

    pub fn with_settings(settings: &HttpSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with configured timeouts: {}", e);
                Client::new()
            });
        Self {
            client,
            allow_internal_urls: settings.allow_internal_urls,
        }
    }
}

impl Default for HttpRequestNode {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct HttpConfig {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: Option<Map<String, Value>>,
    #[serde(default)]
    body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[async_trait]
impl NodeExecutor for HttpRequestNode {
    fn node_type(&self) -> &str {
        "http-request"
    }

    fn description(&self) -> &str {
        "Call an HTTP endpoint; the response is stored in httpResponse"
    }

    async fn execute(&self, node: &Node, payload: &Value, ctx: &NodeContext) -> Result<Value> {
        let config: HttpConfig = serde_json::from_value(node.config())
            .map_err(|e| Error::Executor(format!("Invalid http-request config: {}", e)))?;

        let url = render_template(&config.url, payload);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| Error::Executor(format!("Invalid URL '{}': {}", url, e)))?;
        if !self.allow_internal_urls {
            check_public_url(&parsed)?;
        }

        let method = parse_method(&config.method)?;
        debug!(execution_id = %ctx.execution_id, "HTTP {} {}", method, url);

        let mut request = self.client.request(method.clone(), parsed);
        if let Some(headers) = &config.headers {
            for (key, value) in headers {
                let header_value = match value {
                    Value::String(s) => render_template(s, payload),
                    other => other.to_string(),
                };
                request = request.header(key.as_str(), header_value);
            }
        }
        match config.body.as_ref().map(|b| render_value(b, payload)) {
            Some(Value::String(text)) => request = request.body(text),
            Some(Value::Null) | None => {}
            Some(body) => request = request.json(&body),
        }

        let start = std::time::Instant::now();
        let response = request.send().await.map_err(|e| {
            Error::Executor(format!(
                "HTTP {} {} failed: {}",
                method,
                url,
                error_chain(&e)
            ))
        })?;

        let status = response.status();
        let mut headers = Map::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            );
        }

        let body_text = response.text().await.map_err(|e| {
            Error::Executor(format!(
                "Failed to read HTTP response body from {}: {}",
                url,
                error_chain(&e)
            ))
        })?;
        let body = if body_text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body_text).unwrap_or(Value::String(body_text))
        };

        info!(
            "HTTP {} {} -> {} ({}ms)",
            method,
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        let mut output = object_or_empty(payload);
        output.insert(
            "httpResponse".to_string(),
            json!({
                "status": status.as_u16(),
                "ok": status.is_success(),
                "headers": headers,
                "body": body,
            }),
        );
        Ok(Value::Object(output))
    }
}

fn parse_method(method: &str) -> Result<Method> {
    match method.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        _ => Err(Error::Executor(format!("Unknown HTTP method: {}", method))),
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Refuse non-http(s) schemes and loopback, private, or metadata hosts.
fn check_public_url(url: &reqwest::Url) -> Result<()> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::Executor(format!(
                "Unsupported URL scheme '{}'. Only http and https are allowed.",
                scheme
            )))
        }
    }

    let Some(host) = url.host_str() else {
        return Ok(());
    };
    let host = host.trim_start_matches('[').trim_end_matches(']').to_lowercase();

    let internal_name = host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.ends_with(".internal");
    let internal_ip = host.parse::<IpAddr>().map(is_internal_ip).unwrap_or(false);

    if internal_name || internal_ip {
        warn!("Blocked request to internal host: {}", url);
        return Err(Error::Executor(format!(
            "Requests to internal host '{}' are not allowed (set http.allow_internal_urls to permit)",
            host
        )));
    }
    Ok(())
}

fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.to_ipv4_mapped().map(|v4| is_internal_ip(IpAddr::V4(v4))).unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::NodeKind;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/profile", get(|| async { Json(json!({"handle": "ana"})) }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "no such page") }),
            )
            .route(
                "/echo",
                post(|Json(body): Json<Value>| async move { Json(body) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn local_node() -> HttpRequestNode {
        HttpRequestNode::with_settings(&HttpSettings {
            allow_internal_urls: true,
            ..HttpSettings::default()
        })
    }

    fn http_node(config: Value) -> Node {
        Node::new("call", NodeKind::Action, "http-request").with_config(config)
    }

    #[tokio::test]
    async fn test_get_parses_json_body() {
        let base = spawn_server().await;
        let node = http_node(json!({"url": format!("{}/profile", base)}));
        let ctx = NodeContext::new("exec-1", "wf");

        let result = local_node()
            .execute(&node, &json!({"keep": true}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["keep"], true);
        assert_eq!(result["httpResponse"]["status"], 200);
        assert_eq!(result["httpResponse"]["ok"], true);
        assert_eq!(result["httpResponse"]["body"]["handle"], "ana");
    }

    #[tokio::test]
    async fn test_non_2xx_is_recorded_not_raised() {
        let base = spawn_server().await;
        let node = http_node(json!({"url": format!("{}/missing", base)}));
        let ctx = NodeContext::new("exec-1", "wf");

        let result = local_node()
            .execute(&node, &json!({}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["httpResponse"]["status"], 404);
        assert_eq!(result["httpResponse"]["ok"], false);
        assert_eq!(result["httpResponse"]["body"], "no such page");
    }

    #[tokio::test]
    async fn test_post_renders_templates_in_body() {
        let base = spawn_server().await;
        let node = http_node(json!({
            "url": format!("{}/echo", base),
            "method": "post",
            "headers": {"X-User": "{{ user }}"},
            "body": {"greeting": "hello {{ user }}"}
        }));
        let ctx = NodeContext::new("exec-1", "wf");

        let result = local_node()
            .execute(&node, &json!({"user": "ana"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["httpResponse"]["body"]["greeting"], "hello ana");
    }

    #[tokio::test]
    async fn test_connection_refused_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let node = http_node(json!({"url": format!("http://{}/", addr)}));
        let ctx = NodeContext::new("exec-1", "wf");
        let err = local_node()
            .execute(&node, &json!({}), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Executor(_)));
        assert!(err.to_string().contains("failed"));
    }

    #[tokio::test]
    async fn test_unresolvable_public_host_fails_with_defaults() {
        let node = http_node(json!({"url": "http://linkflow-unreachable.invalid/ping"}));
        let ctx = NodeContext::new("exec-1", "wf");
        let err = HttpRequestNode::new()
            .execute(&node, &json!({}), &ctx)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, Error::Executor(_)));
        assert!(message.contains("HTTP GET"));
        assert!(message.contains("failed"));
        assert!(!message.contains("not allowed"));
    }

    #[tokio::test]
    async fn test_missing_url_is_config_error() {
        let ctx = NodeContext::new("exec-1", "wf");
        let err = HttpRequestNode::new()
            .execute(&http_node(json!({})), &json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid http-request config"));
    }

    #[tokio::test]
    async fn test_unknown_method_fails() {
        let ctx = NodeContext::new("exec-1", "wf");
        let node = http_node(json!({"url": "https://example.com", "method": "BREW"}));
        let err = HttpRequestNode::new()
            .execute(&node, &json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown HTTP method"));
    }

    #[test]
    fn test_internal_hosts_blocked() {
        for url in [
            "http://localhost:8080/admin",
            "http://127.0.0.1:6379",
            "http://10.0.0.1/internal",
            "http://192.168.1.1/",
            "http://169.254.169.254/latest/meta-data/",
            "http://db.internal/query",
            "http://[::1]/",
        ] {
            let parsed = reqwest::Url::parse(url).unwrap();
            assert!(check_public_url(&parsed).is_err(), "{} should be blocked", url);
        }
    }

    #[test]
    fn test_public_hosts_and_schemes() {
        let ok = reqwest::Url::parse("https://api.example.com/v1/users").unwrap();
        assert!(check_public_url(&ok).is_ok());

        let ftp = reqwest::Url::parse("ftp://example.com/file").unwrap();
        let err = check_public_url(&ftp).unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }
}
