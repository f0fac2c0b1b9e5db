use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

pub const PHONE_REDACTION: &str = "[telefon gizlendi]";
pub const EMAIL_REDACTION: &str = "[email gizlendi]";
pub const SOCIAL_MEDIA_REDACTION: &str = "[sosyal medya gizlendi]";
pub const BANNED_WORD_REDACTION: &str = "[içerik gizlendi]";
pub const PROFANITY_CENSOR: &str = "****";

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("built-in moderation pattern must compile")
}

/// Applied in order; later patterns only see what earlier ones left behind.
pub(crate) static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Turkish mobile: +90 / 90 / 0 prefix, then 5xx xxx xx xx
        case_insensitive(r"(?:\+?90[\s-]?|0)?5\d{2}[\s-]?\d{3}[\s-]?\d{2}[\s-]?\d{2}"),
        // Generic international
        case_insensitive(r"\+?\d{1,3}[-.\s]?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}"),
        // Bare digit runs
        case_insensitive(r"\d{10,11}"),
        // (212) 555-1234
        case_insensitive(r"\(\d{3}\)\s*\d{3}[-.\s]?\d{4}"),
    ]
});

pub(crate) static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| case_insensitive(r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}"));

pub(crate) static SOCIAL_MEDIA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        case_insensitive(r"@[a-z0-9_]{3,}"),
        case_insensitive(r"(?:https?://)?(?:www\.)?instagram\.com/[a-z0-9_.]+"),
        case_insensitive(r"(?:https?://)?(?:www\.)?twitter\.com/[a-z0-9_]+"),
        case_insensitive(r"(?:https?://)?(?:www\.)?\bx\.com/[a-z0-9_]+"),
        case_insensitive(r"(?:https?://)?(?:www\.)?facebook\.com/[a-z0-9.]+"),
        case_insensitive(r"(?:https?://)?\bt\.me/[a-z0-9_]+"),
    ]
});
