//! Utilities for truncating HTML for log output.

use memchr::memrchr;

/// Truncates HTML to approximately `max_bytes` while ensuring the cut point
/// is at a safe boundary (not mid-tag, mid-entity, or mid-character).
///
/// The tag and entity markers (`<`, `>`, `&`, `;`) are all ASCII, so any
/// position found by searching for them is also a character boundary.
///
/// # Examples
///
/// ```rust
/// use cachepress_html::safe_html_truncate;
/// let html = "<div>Hello World</div>";
/// // Will truncate at a safe boundary, not mid-tag
/// assert_eq!(safe_html_truncate(html, 10).len(), 10);
/// assert_eq!(safe_html_truncate(html, 18).len(), 16)
/// ```
pub fn safe_html_truncate(html: &str, max_bytes: usize) -> &str {
    if html.len() <= max_bytes {
        return html;
    }
    let mut end = max_bytes;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    let candidate = &html[..end];
    let bytes = candidate.as_bytes();
    let open_tag_match = memrchr(b'<', bytes);
    let close_tag_match = memrchr(b'>', bytes);
    if let Some(open_tag_position) = open_tag_match
        && close_tag_match.map(|gt| gt < open_tag_position).unwrap_or(true)
    {
        // Inside a tag, cut before the '<'
        return &candidate[..open_tag_position];
    }
    let start_entity_match = memrchr(b'&', bytes);
    let end_entity_match = memrchr(b';', bytes);
    if let Some(amp_pos) = start_entity_match
        && end_entity_match.map(|semi| semi < amp_pos).unwrap_or(true)
    {
        // Inside an entity, cut before the '&'
        return &candidate[..amp_pos];
    }
    candidate
}
