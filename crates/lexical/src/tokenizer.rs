/// English function words dropped from both documents and queries
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "if", "in", "into", "is", "it", "its", "me", "my", "no", "not", "of", "on",
    "or", "our", "she", "so", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "to", "too", "us", "was", "we", "were", "what", "when", "where",
    "which", "who", "whom", "why", "will", "with", "would", "you", "your",
];

#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Tokenize text for indexing and querying.
///
/// Lowercases, splits on punctuation, underscores, hyphens and camel-case boundaries, then drops
/// single-character tokens, stop words and pure numbers.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .flat_map(split_identifier)
        .map(|token| token.to_lowercase())
        .filter(|token| keep_token(token))
        .collect()
}

fn keep_token(token: &str) -> bool {
    token.chars().count() > 1
        && !token.chars().all(|c| c.is_ascii_digit())
        && !is_stop_word(token)
}

/// Split camelCase / PascalCase words, including acronym runs (`HTTPServer` → `HTTP`, `Server`).
///
/// Letter/digit boundaries stay inside one token.
#[must_use]
pub fn split_identifier(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    for i in 1..chars.len() {
        let (offset, cur) = chars[i];
        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|&(_, c)| c);

        let lower_to_upper = (prev.is_lowercase() || prev.is_ascii_digit()) && cur.is_uppercase();
        let acronym_end =
            prev.is_uppercase() && cur.is_uppercase() && next.is_some_and(char::is_lowercase);

        if lower_to_upper || acronym_end {
            parts.push(&word[start..offset]);
            start = offset;
        }
    }

    if start < word.len() {
        parts.push(&word[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_identifiers() {
        assert_eq!(split_identifier("errorHandling"), vec!["error", "Handling"]);
        assert_eq!(split_identifier("ErrorHandling"), vec!["Error", "Handling"]);
        assert_eq!(split_identifier("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_identifier("parseJSON"), vec!["parse", "JSON"]);
        assert_eq!(split_identifier("utf8Decoder"), vec!["utf8", "Decoder"]);
        assert_eq!(split_identifier("plain"), vec!["plain"]);
    }

    #[test]
    fn tokenize_normalizes_and_filters() {
        assert_eq!(
            tokenize("The getUserName() function, in user_service.rs!"),
            vec!["get", "user", "name", "function", "user", "service", "rs"]
        );
        assert_eq!(tokenize("a 42 x-ray v2 HTTPServer"), vec!["ray", "v2", "http", "server"]);
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("of the and").is_empty());
    }
}
