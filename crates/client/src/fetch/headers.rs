//! Cache validation metadata from HTTP response headers.

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{self, HeaderMap};
use tilecache_core::Response;

/// Copy `ETag`, `Last-Modified` and expiry from `headers` into `response`.
///
/// `Cache-Control: max-age` wins over `Expires`, as in HTTP/1.1.
pub fn apply_cache_headers(response: &mut Response, headers: &HeaderMap, now: DateTime<Utc>) {
    response.etag = header_str(headers, header::ETAG).map(str::to_string);
    response.modified = header_str(headers, header::LAST_MODIFIED).and_then(parse_http_date);

    let max_age = header_str(headers, header::CACHE_CONTROL).and_then(max_age);
    response.expires = match max_age {
        Some(secs) => Some(now + Duration::seconds(secs)),
        None => header_str(headers, header::EXPIRES).and_then(parse_http_date),
    };
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse an IMF-fixdate such as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `max-age` directive of a Cache-Control value, in seconds.
pub fn max_age(cache_control: &str) -> Option<i64> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") { value.trim().trim_matches('"').parse().ok() } else { None }
    })
}
