use serde::{Deserialize, Serialize};

/// Which moderation rule produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PhoneNumber,
    Email,
    SocialMedia,
    Profanity,
    BannedWord,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::PhoneNumber => "phone_number",
            ViolationKind::Email => "email",
            ViolationKind::SocialMedia => "social_media",
            ViolationKind::Profanity => "profanity",
            ViolationKind::BannedWord => "banned_word",
        }
    }

    /// Localized message shown to the author
    pub fn user_message(&self) -> &'static str {
        match self {
            ViolationKind::PhoneNumber => "Telefon numarası paylaşımı yasaktır.",
            ViolationKind::Email => "E-posta adresi paylaşımı yasaktır.",
            ViolationKind::SocialMedia => "Sosyal medya hesabı paylaşımı yasaktır.",
            ViolationKind::Profanity => "Uygunsuz dil kullanımı tespit edildi.",
            ViolationKind::BannedWord => "Yasaklı içerik tespit edildi.",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All distinct substrings one rule matched within a single filter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub matches: Vec<String>,
}

/// One sentence per violated kind, in the order the kinds were found
pub fn violation_message(violations: &[Violation]) -> String {
    let mut seen = Vec::new();
    for violation in violations {
        if !seen.contains(&violation.kind) {
            seen.push(violation.kind);
        }
    }
    seen.iter()
        .map(|kind| kind.user_message())
        .collect::<Vec<_>>()
        .join(" ")
}
