use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per method and normalized path.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(start.elapsed().as_secs_f64());

    response
}

/// Replaces session ids, draft question ids and option indexes with
/// placeholders to keep label cardinality bounded.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_uuid_like(segment) {
                "{id}"
            } else if is_draft_id(segment) {
                "{qid}"
            } else if is_numeric_id(segment) {
                "{index}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// UUID format: 8-4-4-4-12 hex characters
fn is_uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// `q-<uuid>` for drafts added by hand, `csv-<uuid>-<line>` for imported ones.
fn is_draft_id(s: &str) -> bool {
    if let Some(rest) = s.strip_prefix("q-") {
        return is_uuid_like(rest);
    }
    match s.strip_prefix("csv-") {
        Some(rest) if rest.len() > 37 => {
            let (uuid, line) = rest.split_at(36);
            is_uuid_like(uuid) && line.strip_prefix('-').is_some_and(is_numeric_id)
        }
        _ => false,
    }
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
