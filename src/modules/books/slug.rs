/// Build the URL slug for a book: `<id>-<title>` with the title lower-cased,
/// every run of characters outside `[a-z0-9]` collapsed to one hyphen, and
/// hyphens trimmed from both ends.
pub fn slugify(id: u64, title: &str) -> String {
    let mut slug = format!("{}-", id);
    let prefix_len = slug.len();
    let mut pending_hyphen = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && slug.len() > prefix_len {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
