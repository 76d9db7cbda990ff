use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Method;
use tracing::{debug, warn};
use url::Url;

use crate::{
    domain::request::{
        AuthMode, HeaderEntry, HttpMethod, QueryParam, RequestDescriptor, RequestHeaders,
        TestRequestInput, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS,
    },
    error::{ApiHubError, Result},
};

pub fn convert_http_method(input: HttpMethod) -> Method {
    match input {
        HttpMethod::GET => Method::GET,
        HttpMethod::POST => Method::POST,
        HttpMethod::PUT => Method::PUT,
        HttpMethod::PATCH => Method::PATCH,
        HttpMethod::DELETE => Method::DELETE,
        HttpMethod::HEAD => Method::HEAD,
        HttpMethod::OPTIONS => Method::OPTIONS,
    }
}

/// Turns form state into a dispatchable descriptor.
///
/// Only a blank or unknown method and a blank URL are rejected. Everything
/// else degrades: bad URLs keep their raw text and lose their params,
/// disabled or nameless rows are skipped, and a body on a method that
/// doesn't carry one is dropped.
pub fn normalize(input: TestRequestInput) -> Result<RequestDescriptor> {
    if input.method.trim().is_empty() {
        return Err(ApiHubError::validation("method is required"));
    }
    let method = input
        .method
        .parse::<HttpMethod>()
        .map_err(|e| ApiHubError::validation(e.to_string()))?;

    let raw_url = input.url.trim();
    if raw_url.is_empty() {
        return Err(ApiHubError::validation("url is required"));
    }

    let url = apply_query_params(raw_url, &input.params);
    let headers = merge_headers(&input.headers, &input.auth);
    let body_text = if method.carries_body() {
        input.body
    } else {
        if input.body.is_some() {
            debug!("dropping body for {} request", method);
        }
        None
    };

    Ok(RequestDescriptor {
        method,
        url,
        headers,
        body_text,
        timeout_ms: clamp_timeout(input.timeout_ms),
    })
}

/// Appends enabled, named params to the URL's query in list order. A URL
/// that does not parse is returned untouched and the params are dropped.
pub fn apply_query_params(raw_url: &str, params: &[QueryParam]) -> String {
    let mut enabled = params
        .iter()
        .filter(|p| p.enabled && !p.key.is_empty())
        .peekable();
    if enabled.peek().is_none() {
        return raw_url.to_string();
    }

    let mut url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(e) => {
            // TODO: surface this to the caller once the client can show a field-level warning
            warn!("could not parse url '{}' ({}), skipping query params", raw_url, e);
            return raw_url.to_string();
        }
    };
    url.query_pairs_mut().extend_pairs(enabled.map(|p| (&p.key, &p.value)));
    url.to_string()
}

/// Explicit headers first, then the auth header wins over any same-named one.
pub fn merge_headers(entries: &[HeaderEntry], auth: &AuthMode) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    for entry in entries.iter().filter(|h| h.enabled && !h.key.trim().is_empty()) {
        headers.insert(entry.key.trim(), entry.value.clone());
    }
    if let Some((name, value)) = auth_header(auth) {
        headers.insert(name, value);
    }
    headers
}

/// The single header an auth selection resolves to. Empty secrets add nothing.
pub fn auth_header(auth: &AuthMode) -> Option<(&'static str, String)> {
    match auth {
        AuthMode::None => None,
        AuthMode::Bearer(token) if !token.is_empty() => {
            Some(("Authorization", format!("Bearer {}", token)))
        }
        AuthMode::Basic(credentials) if !credentials.is_empty() => Some((
            "Authorization",
            format!("Basic {}", STANDARD.encode(credentials.as_bytes())),
        )),
        AuthMode::ApiKey(value) if !value.is_empty() => Some(("X-API-Key", value.clone())),
        _ => None,
    }
}

pub fn clamp_timeout(timeout_ms: Option<u64>) -> u64 {
    timeout_ms
        .unwrap_or(DEFAULT_TIMEOUT_MS)
        .clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)
}
