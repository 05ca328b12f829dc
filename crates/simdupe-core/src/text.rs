use ahash::AHashMap;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "must", "can", "this", "that", "these", "those",
];

#[derive(Debug, Clone, Default)]
pub struct PreprocessOptions {
    pub remove_numbers: bool,
    pub remove_punctuation: bool,
    pub min_word_length: Option<usize>,
}

/// Collapse whitespace runs to one space, trim, lower-case.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn preprocess_text(text: &str, options: &PreprocessOptions) -> String {
    let mut processed = normalize_whitespace(text);

    if options.remove_numbers {
        processed.retain(|c| !c.is_ascii_digit());
    }

    if options.remove_punctuation {
        processed = processed
            .chars()
            .map(|c| if is_word_char(c) || c.is_whitespace() { c } else { ' ' })
            .collect();
    }

    if let Some(min_len) = options.min_word_length {
        processed = processed
            .split_whitespace()
            .filter(|word| word.chars().count() >= min_len)
            .collect::<Vec<_>>()
            .join(" ");
    }

    processed
}

/// Most frequent non-stop-words longer than two characters. Ties keep
/// first-occurrence order.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect();

    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 2 || STOP_WORDS.contains(&word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // sort_by is stable, so equal counts stay in first-seen order
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(max_keywords)
        .map(str::to_string)
        .collect()
}
