// Case-insensitive scanning over simple, well-formed HTML tables.

use quick_xml::escape::unescape;

fn to_lower(s: &str) -> String {
    // ASCII only, so byte offsets stay valid between `s` and its lowercase copy.
    s.to_ascii_lowercase()
}

// `lc`, `open` and `close` are already lowercase.
fn find_block(lc: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    let start = lc.get(from..)?.find(open)? + from;
    let open_end = lc[start..].find('>')? + start + 1;
    let end = lc[open_end..].find(close)? + open_end + close.len();
    Some((start, end))
}

/// Find the next `open ... close` block at or after `from`, returning its byte range
/// including both tags.
pub fn next_tag_block_ci(s: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    find_block(&to_lower(s), &to_lower(open), &to_lower(close), from)
}

/// All `open ... close` blocks, in document order. Blocks do not nest.
pub fn tag_blocks_ci<'a>(s: &'a str, open: &str, close: &str) -> Vec<&'a str> {
    let lc = to_lower(s);
    let open = to_lower(open);
    let close = to_lower(close);
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some((start, end)) = find_block(&lc, &open, &close, pos) {
        blocks.push(&s[start..end]);
        pos = end;
    }
    blocks
}

/// Content between the end of the opening tag and the start of the closing tag.
pub fn inner_after_open_tag(block: &str) -> &str {
    match (block.find('>'), block.rfind('<')) {
        (Some(open_end), Some(close_start)) if close_start > open_end => &block[open_end + 1..close_start],
        _ => "",
    }
}

/// Split on `<br>`, `<br/>` and `<br />` in any case.
pub fn split_br(s: &str) -> Vec<&str> {
    let lc = to_lower(s);
    let mut parts = Vec::new();
    let mut pos = 0;
    while let Some(rel) = lc[pos..].find("<br") {
        let start = pos + rel;
        let Some(end_rel) = lc[start..].find('>') else { break };
        parts.push(&s[pos..start]);
        pos = start + end_rel + 1;
    }
    parts.push(&s[pos..]);
    parts
}

/// Decode named and numeric character references. A `&` that does not start a known
/// reference is kept as it is.
pub fn normalize_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = reference_len(tail)
            .and_then(|len| Some((len, unescape(&tail[..len]).ok()?)));
        match decoded {
            Some((len, text)) => {
                out.push_str(&text);
                rest = &tail[len..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

/// Length of `&name;` at the start of `tail`, if it is shaped like a reference.
fn reference_len(tail: &str) -> Option<usize> {
    let end = tail[1..].find(|c: char| c == ';' || c == '&' || c.is_whitespace())? + 1;
    (end > 1 && tail.as_bytes()[end] == b';').then_some(end + 1)
}

pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {},
        }
    }
    normalize_ws(&normalize_entities(&out))
}
