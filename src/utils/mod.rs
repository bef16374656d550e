use lazy_static::lazy_static;
use unicode_segmentation::UnicodeSegmentation;

pub mod parallelism;

// see https://stackoverflow.com/questions/38406793/why-is-capitalizing-the-first-letter-of-a-string-so-convoluted-in-rust
pub fn apply_to_first<F>(string: &str, func: F) -> String
where
    F: Fn(char) -> String,
{
    let mut c = string.chars();
    match c.next() {
        None => String::new(),
        Some(first) => func(first) + c.as_str(),
    }
}

pub fn is_title_case(string: &str) -> bool {
    let mut char_case = string.chars().map(|x| x.is_uppercase());

    char_case.next().unwrap_or(false) && !char_case.any(|x| x)
}

/// Whether the string has at least one uppercase char and no lowercase chars.
pub fn is_uppercase(string: &str) -> bool {
    string.chars().any(|x| x.is_uppercase()) && !string.chars().any(|x| x.is_lowercase())
}

pub fn capitalize(string: &str) -> String {
    apply_to_first(string, |c| c.to_uppercase().collect())
}

#[inline]
pub fn splitting_chars() -> &'static str {
    r##"«»'’`´‘],.:;!?¡¿/\()<=>„“”"+#…*"##
}

#[inline]
pub fn no_space_chars() -> &'static str {
    r##",.;:!?"##
}

/// Joins words with single spaces, without a space before punctuation which attaches to the previous word.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    let mut text = String::new();

    for word in words {
        let word = word.as_ref();
        let attaches = word
            .chars()
            .next()
            .map_or(false, |c| no_space_chars().contains(c));

        if !text.is_empty() && !attaches {
            text.push(' ');
        }
        text.push_str(word);
    }

    text
}

/// Splits text at whitespace and around splitting chars. Splitting chars become words of their own.
pub fn split(text: &str) -> Vec<&str> {
    lazy_static! {
        static ref SPLITTING: Vec<char> = splitting_chars().chars().collect();
    }

    let mut words = Vec::new();

    for part in text.split_whitespace() {
        let mut start = 0;

        for (i, c) in part.char_indices() {
            if SPLITTING.contains(&c) {
                if start < i {
                    words.push(&part[start..i]);
                }
                words.push(&part[i..i + c.len_utf8()]);
                start = i + c.len_utf8();
            }
        }

        if start < part.len() {
            words.push(&part[start..]);
        }
    }

    words
}

/// Splits text into sentences at unicode sentence boundaries.
pub fn sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing() {
        assert!(is_title_case("Casa"));
        assert!(!is_title_case("CASA"));
        assert!(!is_title_case("casa"));
        assert!(is_uppercase("ONU"));
        assert!(!is_uppercase("Onu"));
        assert!(!is_uppercase("."));
        assert_eq!(capitalize("árbol"), "Árbol");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn joins_without_space_before_punctuation() {
        assert_eq!(join_words(&["the", "house", ",", "the", "dog", "."]), "the house, the dog.");
        assert_eq!(join_words::<&str>(&[]), "");
    }

    #[test]
    fn splits_punctuation() {
        assert_eq!(
            split("¿Dónde está la casa roja?  Aquí."),
            vec!["¿", "Dónde", "está", "la", "casa", "roja", "?", "Aquí", "."]
        );
    }

    #[test]
    fn splits_sentences() {
        assert_eq!(
            sentences("La casa es roja. El perro come."),
            vec!["La casa es roja.", "El perro come."]
        );
    }
}
