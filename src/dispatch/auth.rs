// src/dispatch/auth.rs

//! Bearer token extraction and checking.
//!
//! The comparison is plain string equality.
// TODO: switch to a constant-time comparison once a hardening pass decides on it.

use crate::dispatch::request::InboundRequest;
use crate::dispatch::routes::Route;
use crate::types::BearerSource;

/// Query parameters consulted for `bearer_source = "query"`, in order.
const QUERY_TOKEN_KEYS: [&str; 2] = ["bearer", "token"];

/// True when the request may run `route`'s chain.
pub fn authorize(route: &Route, request: &InboundRequest) -> bool {
    let Some(expected) = route.bearer_key.as_deref() else {
        return true;
    };

    match extract_token(route.bearer_source, request) {
        Some(token) => token == expected,
        None => false,
    }
}

/// Pull the candidate token out of the request.
pub fn extract_token(source: BearerSource, request: &InboundRequest) -> Option<String> {
    match source {
        BearerSource::Header => header_token(request.authorization.as_deref()),
        BearerSource::Query => query_token(request.query.as_deref()),
    }
}

/// `Authorization: Bearer <token>`; the token is trimmed and must be non-empty.
fn header_token(value: Option<&str>) -> Option<String> {
    let token = value?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// First `bearer`, else first `token` query parameter. Values are not trimmed.
fn query_token(query: Option<&str>) -> Option<String> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query?.as_bytes())
        .into_owned()
        .collect();

    QUERY_TOKEN_KEYS.iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
}
