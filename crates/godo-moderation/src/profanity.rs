use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Dictionary of censored words, matched as whole words, case-insensitively.
const WORDS: &[&str] = &[
    // English
    "asshole",
    "bastard",
    "bitch",
    "bullshit",
    "cunt",
    "dickhead",
    "fuck",
    "fucked",
    "fucker",
    "fucking",
    "motherfucker",
    "shit",
    "slut",
    "whore",
    // Turkish
    "amk",
    "amına",
    "göt",
    "orospu",
    "orospu çocuğu",
    "piç",
    "sik",
    "siktir",
    "yarak",
    "yarrak",
];

pub(crate) static PROFANITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // Longest first so multi-word entries win over their prefixes
    let mut words: Vec<&str> = WORDS.to_vec();
    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()
        .expect("profanity dictionary must compile")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_words_only() {
        assert!(PROFANITY_PATTERN.is_match("what the FUCK"));
        assert!(PROFANITY_PATTERN.is_match("siktir git"));
        assert!(!PROFANITY_PATTERN.is_match("Scunthorpe"));
        assert!(!PROFANITY_PATTERN.is_match("shitake"));
    }

    #[test]
    fn test_multi_word_entry_matched_as_one() {
        let found: Vec<_> = PROFANITY_PATTERN
            .find_iter("orospu çocuğu")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["orospu çocuğu"]);
    }
}
