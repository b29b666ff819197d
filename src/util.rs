const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

// Most filesystems cap a name at 255 bytes; leave room for the index and ".png".
pub const MAX_TITLE_BYTES: usize = 200;

// Invisible format characters (bidi overrides, zero-width marks) that would
// make a filename display differently from its bytes.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

/// Unsafe, control and format characters become `_`; the trimmed result is
/// cut to `max_len` chars and `MAX_TITLE_BYTES` bytes, or `fallback` if empty.
pub fn sanitize_filename_component(s: &str, max_len: usize, fallback: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| {
            if c.is_control() || is_format_char(c) || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let mut cut: String = replaced.trim().chars().take(max_len).collect();
    while cut.len() > MAX_TITLE_BYTES {
        cut.pop();
    }
    // Truncation can expose trailing whitespace again.
    let cut = cut.trim_end();
    if cut.is_empty() {
        fallback.to_string()
    } else {
        cut.to_string()
    }
}

// Enough digits for 1..=total to sort as strings, never below 2.
pub fn index_width(total: usize) -> usize {
    let digits = total.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(2)
}

pub fn qr_filename(index: usize, width: usize, sanitized_title: &str) -> String {
    format!("{:0width$}_{}.png", index, sanitized_title, width = width)
}

pub fn single_line(s: &str) -> String {
    s.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

fn id_component(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

pub fn video_id_from_url(url: &str) -> Option<String> {
    // Very small heuristic; avoids adding a URL parser dependency.
    if let Some(idx) = url.find("v=") {
        let rest = &url[idx + 2..];
        let id = rest.split('&').next().unwrap_or(rest);
        let id = id_component(id.split('#').next().unwrap_or(id));
        if !id.is_empty() {
            return Some(id);
        }
    }
    for marker in ["youtu.be/", "/shorts/"] {
        if let Some(idx) = url.find(marker) {
            let rest = &url[idx + marker.len()..];
            let id = rest.split(['?', '/', '#']).next().unwrap_or(rest);
            let id = id_component(id);
            if !id.is_empty() {
                return Some(id);
            }
        }
    }
    None
}
