//! URL-safe slugs derived from titles.

/// Suffix appended to the slug of a trashed entity, freeing the original slug.
pub const TRASHED_SUFFIX: &str = "__trashed";

/// Lowercase, hyphen-separated form of `title`. Non-alphanumeric runs collapse to one hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else if ch != '\'' {
            pending_hyphen = true;
        }
    }

    slug
}

/// First of `base`, `base-2`, `base-3`, ... for which `taken` is false.
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }

    (2u64..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
