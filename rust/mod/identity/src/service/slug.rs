/// Fallback when nothing usable survives slugification.
const EMPTY_SLUG: &str = "user";

/// Turn free text into a URL-safe handle: ASCII letters are lowercased,
/// digits kept, and every run of anything else becomes a single '-'.
/// Leading and trailing separators are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}
