//! Title normalization

use almanac_domain::constants::LEADING_ARTICLES;

/// Canonical form of a title for comparison.
///
/// Lowercases, moves a trailing ", The" style article off, strips
/// punctuation, collapses whitespace, and drops a leading article.
/// "The Hobbit" and "Hobbit, The" both become "hobbit".
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let without_suffix = strip_trailing_article(&lowered);

    let cleaned: String = without_suffix
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '/' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 && LEADING_ARTICLES.contains(&words[0]) {
        words.remove(0);
    }
    words.join(" ")
}

fn strip_trailing_article(text: &str) -> &str {
    let Some((head, tail)) = text.rsplit_once(',') else {
        return text;
    };
    if LEADING_ARTICLES.contains(&tail.trim()) && !head.trim().is_empty() {
        head
    } else {
        text
    }
}
