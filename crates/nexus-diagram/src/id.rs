//! Render-target identifiers.
//!
//! The engine uses the target id as the root `<svg id>` and as a prefix for marker and title ids,
//! so two diagrams live on one page must never share one.

use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_PREFIX: &str = "mermaid";
pub const RETRY_PREFIX: &str = "mermaid-retry";

static NEXT: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh id of the form `<prefix>-<unix millis>-<counter>-<random>`.
///
/// The counter makes ids distinct within the process even when the clock does not advance; the
/// random suffix keeps them distinct across processes sharing a page.
pub fn next_render_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = NEXT.fetch_add(1, Ordering::Relaxed);
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{millis}-{seq}-{}",
        sanitize_render_id(prefix),
        &random[..8]
    )
}

/// Converts an arbitrary string into a conservative id token.
///
/// This helper:
/// - trims whitespace
/// - replaces unsupported characters with `-`
/// - ensures the id starts with an ASCII letter by prefixing `m-` when needed
pub fn sanitize_render_id(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_PREFIX.to_string();
    }

    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
        out.push(if ok { ch } else { '-' });
    }

    let starts_ok = out.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_ok {
        out.insert_str(0, "m-");
    }

    while out.contains("--") {
        out = out.replace("--", "-");
    }
    let out = out.trim_matches('-');
    if out.is_empty() || out == "m" {
        return DEFAULT_PREFIX.to_string();
    }
    out.to_string()
}
