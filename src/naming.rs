//! Post filename convention: `YYYY-MM-DD-slug`.
//!
//! The site generator publishes a post at `<baseurl>/<slug>/`, so the date
//! prefix is dropped from the URL but still serves as the post's date when
//! the front matter has none.
//!
//! - `2024-03-01-hello-world` → date `2024-03-01`, slug `hello-world`
//! - `about` → no date, slug `about`

/// Result of parsing a post file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct PostName {
    /// `YYYY-MM-DD` if the stem starts with one.
    pub date: Option<String>,
    /// Everything after the date prefix, or the full stem.
    pub slug: String,
}

fn is_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

/// Parse a post file stem following the `YYYY-MM-DD-slug` convention.
pub fn parse_post_stem(stem: &str) -> PostName {
    if let (Some(date), Some(rest)) = (stem.get(..10), stem.get(10..))
        && is_date(date)
        && let Some(slug) = rest.strip_prefix('-')
        && !slug.is_empty()
    {
        return PostName {
            date: Some(date.to_string()),
            slug: slug.to_string(),
        };
    }
    PostName {
        date: None,
        slug: stem.to_string(),
    }
}
