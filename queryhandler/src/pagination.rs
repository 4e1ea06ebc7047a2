use axum::http::{HeaderMap, HeaderValue, header::CONTENT_RANGE};

/// `Content-Range` header for one page of a listing: `posts 0-29/120`.
///
/// The end of the range is clamped to the last record. An empty listing is
/// reported as `posts 0-0/0`, and an offset past the last record as the
/// unsatisfied range `posts */120`.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    limit: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let content_range = if total_count > 0 && offset >= total_count {
        format!("{resource_name} */{total_count}")
    } else {
        let last = total_count.saturating_sub(1);
        let end = offset.saturating_add(limit).saturating_sub(1).min(last);
        let start = offset.min(end);
        format!("{resource_name} {start}-{end}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&content_range) {
        headers.insert(CONTENT_RANGE, value);
    }
    headers
}
