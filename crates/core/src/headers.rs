//! HTTP security headers applied to every response.

/// Content Security Policy directives, joined with `"; "`.
pub const CSP_HEADER: &str = concat!(
    "default-src 'self'; ",
    "script-src 'self' 'unsafe-eval' 'unsafe-inline' https://localhost:* http://localhost:*; ",
    "style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; ",
    "style-src-elem 'self' 'unsafe-inline' https://fonts.googleapis.com; ",
    "img-src 'self' data: https: blob:; ",
    "font-src 'self' data: https://fonts.gstatic.com; ",
    "connect-src 'self' https://api.mainnet-beta.solana.com https://meteora.ag https://*.meteora.ag ",
    "https://dlmm-api.meteora.ag https://vault-api.meteora.ag ws://localhost:* wss://localhost:*; ",
    "frame-src 'none'; ",
    "object-src 'none'; ",
    "base-uri 'self'; ",
    "form-action 'self'; ",
    "frame-ancestors 'none'; ",
    "upgrade-insecure-requests",
);

/// A static response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityHeader {
    pub name: &'static str,
    pub value: &'static str,
}

pub const SECURITY_HEADERS: &[SecurityHeader] = &[
    SecurityHeader {
        name: "X-DNS-Prefetch-Control",
        value: "on",
    },
    SecurityHeader {
        name: "Strict-Transport-Security",
        value: "max-age=63072000; includeSubDomains; preload",
    },
    SecurityHeader {
        name: "X-XSS-Protection",
        value: "1; mode=block",
    },
    SecurityHeader {
        name: "X-Frame-Options",
        value: "DENY",
    },
    SecurityHeader {
        name: "X-Content-Type-Options",
        value: "nosniff",
    },
    SecurityHeader {
        name: "Referrer-Policy",
        value: "origin-when-cross-origin",
    },
    SecurityHeader {
        name: "Content-Security-Policy",
        value: CSP_HEADER,
    },
    SecurityHeader {
        name: "Permissions-Policy",
        value: "camera=(), microphone=(), geolocation=()",
    },
];

/// Look up a security header value by case-insensitive name.
pub fn security_header(name: &str) -> Option<&'static str> {
    SECURITY_HEADERS
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value)
}
