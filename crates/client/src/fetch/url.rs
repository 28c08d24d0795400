//! URL validation for delegated requests.

use tilecache_core::Error;

/// Parse a resource URL, accepting only `http` and `https`.
///
/// Surrounding whitespace is trimmed and fragments are dropped; the query
/// string is kept as-is since tile servers often carry tokens there.
pub fn parse_http_url(input: &str) -> Result<url::Url, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
