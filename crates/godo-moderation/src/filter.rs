use crate::banned::{BannedWord, BannedWordStore};
use crate::patterns::*;
use crate::profanity::PROFANITY_PATTERN;
use crate::violation::{Violation, ViolationKind};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Outcome of one filter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub filtered_text: String,
    pub original_text: String,
    pub is_clean: bool,
    pub violations: Vec<Violation>,
}

impl FilterResult {
    fn clean(text: &str) -> Self {
        Self {
            filtered_text: text.to_string(),
            original_text: text.to_string(),
            is_clean: true,
            violations: Vec::new(),
        }
    }
}

/// Enables or disables individual passes. Production uses `default()` (all on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPasses {
    pub phone_numbers: bool,
    pub emails: bool,
    pub social_media: bool,
    pub profanity: bool,
    pub banned_words: bool,
}

impl Default for FilterPasses {
    fn default() -> Self {
        Self {
            phone_numbers: true,
            emails: true,
            social_media: true,
            profanity: true,
            banned_words: true,
        }
    }
}

/// Accumulates matches grouped per kind, each distinct match once
#[derive(Default)]
struct Findings(Vec<Violation>);

impl Findings {
    fn record(&mut self, kind: ViolationKind, matched: &str) {
        let idx = match self.0.iter().position(|v| v.kind == kind) {
            Some(idx) => idx,
            None => {
                self.0.push(Violation {
                    kind,
                    matches: Vec::new(),
                });
                self.0.len() - 1
            }
        };
        let matches = &mut self.0[idx].matches;
        if !matches.iter().any(|m| m == matched) {
            matches.push(matched.to_string());
        }
    }
}

fn redact(
    text: String,
    re: &Regex,
    kind: ViolationKind,
    token: &str,
    found: &mut Findings,
) -> String {
    let mut hit = false;
    for m in re.find_iter(&text) {
        found.record(kind, m.as_str());
        hit = true;
    }
    if hit {
        re.replace_all(&text, token).into_owned()
    } else {
        text
    }
}

fn compile_banned(entry: &BannedWord) -> Option<Regex> {
    if entry.pattern.trim().is_empty() {
        return None;
    }
    let pattern = if entry.is_regex {
        entry.pattern.clone()
    } else {
        regex::escape(&entry.pattern)
    };
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %entry.pattern, error = %e, "Skipping invalid banned word pattern");
            None
        }
    }
}

/// Run the enabled passes over `text` with an already-fetched banned-word set.
///
/// `banned` is `None` when the set could not be loaded; pass 5 is skipped then.
pub fn filter_text(
    text: &str,
    passes: &FilterPasses,
    banned: Option<&[BannedWord]>,
) -> FilterResult {
    if text.is_empty() {
        return FilterResult::clean(text);
    }

    let mut found = Findings::default();
    let mut current = text.to_string();

    if passes.phone_numbers {
        for re in PHONE_PATTERNS.iter() {
            current = redact(
                current,
                re,
                ViolationKind::PhoneNumber,
                PHONE_REDACTION,
                &mut found,
            );
        }
    }

    if passes.emails {
        current = redact(
            current,
            &EMAIL_PATTERN,
            ViolationKind::Email,
            EMAIL_REDACTION,
            &mut found,
        );
    }

    if passes.social_media {
        for re in SOCIAL_MEDIA_PATTERNS.iter() {
            current = redact(
                current,
                re,
                ViolationKind::SocialMedia,
                SOCIAL_MEDIA_REDACTION,
                &mut found,
            );
        }
    }

    if passes.profanity {
        current = redact(
            current,
            &PROFANITY_PATTERN,
            ViolationKind::Profanity,
            PROFANITY_CENSOR,
            &mut found,
        );
    }

    if passes.banned_words {
        for re in banned.unwrap_or_default().iter().filter_map(compile_banned) {
            current = redact(
                current,
                &re,
                ViolationKind::BannedWord,
                BANNED_WORD_REDACTION,
                &mut found,
            );
        }
    }

    let violations = found.0;
    FilterResult {
        filtered_text: current,
        original_text: text.to_string(),
        is_clean: violations.is_empty(),
        violations,
    }
}

/// Content filter bound to a banned-word source
#[derive(Clone)]
pub struct ContentFilter {
    banned_words: Arc<dyn BannedWordStore>,
    passes: FilterPasses,
}

impl ContentFilter {
    pub fn new(banned_words: Arc<dyn BannedWordStore>) -> Self {
        Self {
            banned_words,
            passes: FilterPasses::default(),
        }
    }

    pub fn with_passes(mut self, passes: FilterPasses) -> Self {
        self.passes = passes;
        self
    }

    /// Filter `text`, fetching the active banned words for this call.
    ///
    /// Never fails: absent or empty input is clean, and a banned-word store
    /// error only disables pass 5.
    pub async fn filter(&self, text: Option<&str>) -> FilterResult {
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return FilterResult::clean(""),
        };

        let banned = if self.passes.banned_words {
            match self.banned_words.active_entries().await {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(error = %e, "Banned word lookup failed, skipping banned word pass");
                    None
                }
            }
        } else {
            None
        };

        filter_text(text, &self.passes, banned.as_deref())
    }

    pub async fn is_content_safe(&self, text: &str) -> bool {
        self.filter(Some(text)).await.is_clean
    }
}
