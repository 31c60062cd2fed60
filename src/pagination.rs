/// Page size shared by every listing endpoint.
pub const QUESTIONS_PER_PAGE: usize = 10;

/// Parses a 1-based page number from a query parameter. Absent or
/// non-numeric values fall back to page 1.
pub fn page_from_query(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.parse::<usize>().ok())
        .filter(|&page| page > 0)
        .unwrap_or(1)
}

/// Returns the `page`-th fixed-size window over an already-filtered,
/// already-ordered listing. Out-of-range pages yield an empty slice;
/// callers decide whether that is a 404.
pub fn paginate<T: Clone>(page: usize, items: &[T]) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(QUESTIONS_PER_PAGE);
    let end = start.saturating_add(QUESTIONS_PER_PAGE).min(items.len());
    if start >= items.len() {
        return Vec::new();
    }
    items[start..end].to_vec()
}
