//! # GoDo Moderation
//!
//! User-generated content filter shared by chat messages and activity texts.
//!
//! The filter runs five passes in a fixed order, each on the output of the
//! previous one:
//!
//! 1. phone numbers → `[telefon gizlendi]`
//! 2. email addresses → `[email gizlendi]`
//! 3. social media handles and profile URLs → `[sosyal medya gizlendi]`
//! 4. profanity → `****`
//! 5. moderator-managed banned words → `[içerik gizlendi]`
//!
//! Passes 1-4 are pure. Pass 5 reads the active banned-word set from a
//! [`BannedWordStore`] on every call and is skipped if the store fails.

mod banned;
mod filter;
mod patterns;
mod profanity;
mod violation;

pub use banned::{BannedWord, BannedWordStore, StaticBannedWords};
pub use filter::{filter_text, ContentFilter, FilterPasses, FilterResult};
pub use patterns::{
    BANNED_WORD_REDACTION, EMAIL_REDACTION, PHONE_REDACTION, PROFANITY_CENSOR,
    SOCIAL_MEDIA_REDACTION,
};
pub use violation::{violation_message, Violation, ViolationKind};
