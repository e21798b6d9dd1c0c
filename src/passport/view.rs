//! Framework-agnostic request view handed to strategies.
//!
//! Strategies never see the native [`poem::Request`]. The view is an owned
//! copy of the parts strategies care about, so nothing a strategy does can
//! leak back into the request the rest of the application handles.

use std::collections::BTreeMap;

use poem::Request;
use poem::http::{HeaderMap, header};
use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;
use tracing::debug;
use uuid::Uuid;

use super::config::PassportConfig;
use super::error::PassportError;
use super::initialize::AuthenticationContext;

/// Snapshot of an inbound request.
#[derive(Debug, Clone)]
pub struct RequestView {
    pub headers: HeaderMap,
    /// Parsed query string. Repeated keys keep the last value.
    pub query: BTreeMap<String, String>,
    /// Parsed body: JSON and form bodies become JSON values, other UTF-8
    /// bodies a JSON string, empty or binary bodies `null`.
    pub body: Value,
    /// Uppercased HTTP method.
    pub method: String,
    /// Full original URI.
    pub url: String,
    /// Id of the [`AuthenticationContext`](super::AuthenticationContext)
    /// this view was built for.
    pub request_id: Uuid,
}

impl RequestView {
    /// Build a view of `req` for the attempt tracked by `ctx`.
    ///
    /// The URL comes from the context, which captured it before any nested
    /// route stripped its prefix. When body parsing is enabled the body is
    /// buffered (up to `max_body_bytes`) and put back on the request, so
    /// downstream handlers can still read it.
    pub async fn synthesize(
        req: &mut Request,
        ctx: &AuthenticationContext,
        config: &PassportConfig,
    ) -> Result<Self, PassportError> {
        let query = parse_query(req.uri().query().unwrap_or_default())?;

        let body = if config.parse_body {
            let content_type = req.content_type().map(str::to_owned);
            let bytes = buffer_body(req, config.max_body_bytes).await?;
            parse_body(content_type.as_deref(), &bytes)?
        } else {
            Value::Null
        };

        Ok(Self {
            headers: req.headers().clone(),
            query,
            body,
            method: req.method().as_str().to_ascii_uppercase(),
            url: ctx.url().to_string(),
            request_id: ctx.request_id(),
        })
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Top-level field of an object body.
    pub fn body_field(&self, key: &str) -> Option<&Value> {
        self.body.as_object().and_then(|body| body.get(key))
    }
}

fn parse_query(query: &str) -> Result<BTreeMap<String, String>, PassportError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| PassportError::MalformedRequest(format!("invalid query string: {}", e)))?;
    Ok(pairs.into_iter().collect())
}

async fn buffer_body(req: &mut Request, limit: usize) -> Result<Vec<u8>, PassportError> {
    // Reject on the declared length before consuming anything
    if let Some(declared) = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        && declared > limit
    {
        return Err(PassportError::PayloadTooLarge(limit));
    }

    let mut buf = Vec::new();
    let read = req
        .take_body()
        .into_async_read()
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut buf)
        .await?;

    if read > limit {
        return Err(PassportError::PayloadTooLarge(limit));
    }

    debug!("Buffered {} body bytes for request view", read);
    req.set_body(buf.clone());
    Ok(buf)
}

fn parse_body(content_type: Option<&str>, bytes: &[u8]) -> Result<Value, PassportError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/json" || mime.ends_with("+json") {
        return serde_json::from_slice(bytes)
            .map_err(|e| PassportError::MalformedRequest(format!("invalid JSON body: {}", e)));
    }

    if mime == "application/x-www-form-urlencoded" {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)
            .map_err(|e| PassportError::MalformedRequest(format!("invalid form body: {}", e)))?;
        let fields: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        return Ok(Value::Object(fields));
    }

    Ok(std::str::from_utf8(bytes)
        .map(|text| Value::String(text.to_string()))
        .unwrap_or(Value::Null))
}
