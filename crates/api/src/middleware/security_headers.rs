//! Static security headers added to every response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use nexus_core::SECURITY_HEADERS;
use tracing::warn;

/// Insert every security header, replacing values a handler may have set.
pub fn insert_security_headers(headers: &mut HeaderMap) {
    for header in SECURITY_HEADERS {
        match HeaderName::from_bytes(header.name.as_bytes()) {
            Ok(name) => {
                headers.insert(name, HeaderValue::from_static(header.value));
            }
            Err(e) => warn!(header = header.name, error = %e, "Invalid security header name"),
        }
    }
}

pub async fn apply_security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    insert_security_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_headers_inserted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));

        insert_security_headers(&mut headers);

        assert_eq!(headers.len(), SECURITY_HEADERS.len());
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "origin-when-cross-origin");
        assert!(headers["content-security-policy"]
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'"));
    }
}
