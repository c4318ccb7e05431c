//! Input sanitizers applied to request fields before they reach the store.

/// Elements whose content is dropped along with the tags.
const DROPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Plain-text sanitization: strips markup, percent-encoded octets, line
/// breaks and repeated whitespace.
pub fn sanitize_text_field(input: &str) -> String {
    let stripped = strip_tags(input);
    let decoded = strip_percent_octets(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rich-text sanitization: keeps an allow-list of post markup and removes
/// everything else, including script and style contents.
pub fn sanitize_post_html(input: &str) -> String {
    ammonia::Builder::default()
        .link_rel(None)
        .clean(input)
        .to_string()
}

/// Lowercase key made of `a-z`, `0-9`, `_` and `-` only.
pub fn sanitize_key(input: &str) -> String {
    input
        .chars()
        .filter_map(|ch| {
            let ch = ch.to_ascii_lowercase();
            (ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-').then_some(ch)
        })
        .collect()
}

/// Removes tags. A `<` that does not open a tag is kept, escaped.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let opens_tag = after
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic() || matches!(ch, '/' | '!' | '?'));
        if !opens_tag {
            out.push_str("&lt;");
            rest = after;
            continue;
        }

        let Some(end) = after.find('>') else {
            // Unterminated tag: drop the remainder.
            return out;
        };
        let tag = &after[..end];
        rest = &after[end + 1..];

        let name: String = tag
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if DROPPED_ELEMENTS.contains(&name.as_str()) {
            let closing = format!("</{name}");
            rest = match find_ignore_ascii_case(rest, &closing) {
                Some(pos) => rest[pos..].find('>').map_or("", |gt| &rest[pos + gt + 1..]),
                None => "",
            };
        }
    }

    out.push_str(rest);
    out
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn strip_percent_octets(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            i += 3;
            continue;
        }
        let ch = input[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8().max(1);
    }

    out
}
