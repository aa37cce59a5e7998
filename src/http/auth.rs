//! HTTP basic authentication for the metrics path.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::exporter::BasicAuth;

pub const REALM_CHALLENGE: &str = "Basic realm=\"redis-exporter\"";

pub async fn basic_auth_middleware(
    State(auth): State<Arc<BasicAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_authorized(&auth, request.headers()) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Rejected scrape without valid credentials");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM_CHALLENGE)],
        "Unauthorized\n",
    )
        .into_response()
}

fn is_authorized(auth: &BasicAuth, headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some((scheme, encoded)) = value.split_once(' ') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return false;
    }
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Some(sep) = decoded.iter().position(|b| *b == b':') else {
        return false;
    };

    // Evaluate both halves so timing does not reveal which one failed.
    let user_ok = constant_time_eq(&decoded[..sep], auth.username.as_bytes());
    let pass_ok = constant_time_eq(&decoded[sep + 1..], auth.password.as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth() -> BasicAuth {
        BasicAuth {
            username: "prom".to_string(),
            password: "s3cret".to_string(),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_matching_credentials() {
        let value = format!("Basic {}", STANDARD.encode("prom:s3cret"));
        assert!(is_authorized(&auth(), &headers(&value)));

        let lower = format!("basic {}", STANDARD.encode("prom:s3cret"));
        assert!(is_authorized(&auth(), &headers(&lower)));
    }

    #[test]
    fn rejects_wrong_or_malformed_credentials() {
        let wrong = format!("Basic {}", STANDARD.encode("prom:nope"));
        assert!(!is_authorized(&auth(), &headers(&wrong)));
        assert!(!is_authorized(&auth(), &headers("Bearer token")));
        assert!(!is_authorized(&auth(), &headers("Basic !!!")));
        assert!(!is_authorized(&auth(), &HeaderMap::new()));

        let no_colon = format!("Basic {}", STANDARD.encode("proms3cret"));
        assert!(!is_authorized(&auth(), &headers(&no_colon)));
    }

    #[test]
    fn password_may_contain_colons() {
        let auth = BasicAuth {
            username: "prom".to_string(),
            password: "a:b".to_string(),
        };
        let value = format!("Basic {}", STANDARD.encode("prom:a:b"));
        assert!(is_authorized(&auth, &headers(&value)));
    }

    #[test]
    fn constant_time_eq_checks_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"abc", b"abd"));
    }
}
