//! Header policy tables.
//!
//! Two rulesets, both immutable after process start: headers
//! stripped before the request reaches the upstream, and headers stripped
//! before the response reaches the client. A header in the request table
//! never appears in an outbound call; a header in the response table never
//! appears in the value returned to the client.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::auth::Credential;

/// Headers never forwarded to the upstream: hop-by-hop transport headers
/// and browser headers the backend has no use for.
const STRIP_ON_REQUEST: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "accept-encoding",
    "forwarded",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
];

/// Browser fingerprinting header families, matched by prefix.
const STRIP_ON_REQUEST_PREFIXES: &[&str] = &["sec-fetch-", "sec-ch-ua"];

/// Headers never returned to the client: encoding and framing headers that
/// no longer describe the buffered body, plus CSP variants meant for the
/// backend's own origin.
const STRIP_ON_RESPONSE: &[&str] = &[
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "content-security-policy",
    "content-security-policy-report-only",
];

fn strips_on_request(name: &str) -> bool {
    STRIP_ON_REQUEST.contains(&name)
        || STRIP_ON_REQUEST_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn strips_on_response(name: &str) -> bool {
    STRIP_ON_RESPONSE.contains(&name)
}

/// Build the outbound header set for an upstream call.
///
/// Strips the request table, forces `accept-encoding: identity` so the
/// upstream never replies with a body the gateway would have to
/// transparently decompress, and overwrites `authorization` with the
/// minted credential when one was obtained. Without a credential the
/// client's own `authorization` value (normally absent) passes through.
pub fn filter_request_headers(
    inbound: &HeaderMap,
    credential: Option<&Credential>,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 2);
    for (name, value) in inbound {
        if strips_on_request(name.as_str()) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    outbound.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    if let Some(credential) = credential {
        match HeaderValue::from_str(&credential.bearer()) {
            Ok(value) => {
                outbound.insert(header::AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("minted credential is not a valid header value, dropping it");
            }
        }
    }

    outbound
}

/// Build the client-facing header set from an upstream response.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if strips_on_response(name.as_str()) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    outbound
}
