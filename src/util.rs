use chrono::Utc;

/// Builds a URL-safe slug from an article title: lowercased, alphanumerics
/// kept, everything else collapsed into single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Current time formatted the way the database stores timestamps.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("GTA VI: Everything We Know"), "gta-vi-everything-we-know");
        assert_eq!(slugify("  iPhone 16 -- review!  "), "iphone-16-review");
    }

    #[test]
    fn slugify_handles_empty_title() {
        assert_eq!(slugify("!!!"), "");
    }
}
