//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the backend URL from the resolved path, base identifier and query
//! - Replace client credentials with the configured backend credential
//! - Stream request and response bodies through the pooled client
//! - Strip backend CORS headers from responses
//!
//! # Design Decisions
//! - Path segments are re-encoded when appended, the router works on decoded text
//! - `/data/v1/` style data URLs carry the base identifier in the path

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use axum::response::Response;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::error::ProxyError;

const BASE_IN_PATH_MARKER: &str = "/data/v1/";
const CORS_HEADER_PREFIX: &str = "access-control-";

/// Forwards routed requests to the data API.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    data_url: Url,
    base_in_path: bool,
    default_base_id: String,
    credential: Option<(HeaderName, HeaderValue)>,
}

impl Forwarder {
    pub fn new(upstream: &UpstreamConfig) -> Result<Self, ProxyError> {
        let data_url = Url::parse(&upstream.data_url)
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", upstream.data_url, e)))?;
        if data_url.cannot_be_a_base() || data_url.scheme() != "http" {
            return Err(ProxyError::InvalidTarget(upstream.data_url.clone()));
        }

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            base_in_path: upstream.data_url.contains(BASE_IN_PATH_MARKER),
            data_url,
            default_base_id: upstream.base_id.clone(),
            credential: credential(upstream)?,
        })
    }

    /// Backend URL for `upstream_path`.
    ///
    /// `base_id` overrides the configured base identifier when non-empty.
    pub fn target_url(
        &self,
        upstream_path: &str,
        base_id: Option<&str>,
        query: Option<&str>,
    ) -> Result<Url, ProxyError> {
        let mut url = self.data_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ProxyError::InvalidTarget(self.data_url.to_string()))?;
            segments.pop_if_empty();
            if self.base_in_path {
                let base = base_id
                    .filter(|b| !b.is_empty())
                    .unwrap_or(self.default_base_id.as_str());
                segments.push(base);
            }
            segments.extend(upstream_path.split('/'));
        }
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Send `request` to `target` and stream the backend response back.
    pub async fn forward(&self, request: Request<Body>, target: &Url) -> Result<Response, ProxyError> {
        let uri: Uri = target
            .as_str()
            .parse()
            .map_err(|_| ProxyError::InvalidTarget(target.to_string()))?;

        let (parts, body) = request.into_parts();
        let mut builder = Request::builder().method(parts.method).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in parts.headers.iter() {
                if name == header::AUTHORIZATION || name == header::HOST {
                    continue;
                }
                headers.append(name.clone(), value.clone());
            }
            if let Some((name, value)) = &self.credential {
                headers.insert(name.clone(), value.clone());
            }
        }
        let upstream_request = builder
            .body(body)
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;

        let response = self
            .client
            .request(upstream_request)
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let (mut parts, body) = response.into_parts();
        strip_cors_headers(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

fn credential(upstream: &UpstreamConfig) -> Result<Option<(HeaderName, HeaderValue)>, ProxyError> {
    if upstream.token.is_empty() {
        return Ok(None);
    }
    let (name, value) = if upstream.token_header.eq_ignore_ascii_case("authorization") {
        (header::AUTHORIZATION, format!("Bearer {}", upstream.token))
    } else {
        let name = HeaderName::from_bytes(upstream.token_header.as_bytes())
            .map_err(|e| ProxyError::Credential(e.to_string()))?;
        (name, upstream.token.clone())
    };
    let mut value = HeaderValue::from_str(&value).map_err(|e| ProxyError::Credential(e.to_string()))?;
    value.set_sensitive(true);
    Ok(Some((name, value)))
}

/// The proxy owns CORS for its clients; backend policy must not leak through.
fn strip_cors_headers(headers: &mut HeaderMap) {
    let cors: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(CORS_HEADER_PREFIX))
        .cloned()
        .collect();
    for name in cors {
        headers.remove(&name);
    }
}
