use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    User,
    Activity,
    Message,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::User => "user",
            ReportType::Activity => "activity",
            ReportType::Message => "message",
        }
    }
}

impl FromStr for ReportType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ReportType::User),
            "activity" => Ok(ReportType::Activity),
            "message" => Ok(ReportType::Message),
            other => anyhow::bail!("Unknown report type '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Inappropriate,
    Harassment,
    HateSpeech,
    Violence,
    Scam,
    FakeProfile,
    Other,
}

impl ReportReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::Spam => "spam",
            ReportReason::Inappropriate => "inappropriate",
            ReportReason::Harassment => "harassment",
            ReportReason::HateSpeech => "hate_speech",
            ReportReason::Violence => "violence",
            ReportReason::Scam => "scam",
            ReportReason::FakeProfile => "fake_profile",
            ReportReason::Other => "other",
        }
    }
}

impl FromStr for ReportReason {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(ReportReason::Spam),
            "inappropriate" => Ok(ReportReason::Inappropriate),
            "harassment" => Ok(ReportReason::Harassment),
            "hate_speech" => Ok(ReportReason::HateSpeech),
            "violence" => Ok(ReportReason::Violence),
            "scam" => Ok(ReportReason::Scam),
            "fake_profile" => Ok(ReportReason::FakeProfile),
            "other" => Ok(ReportReason::Other),
            other => anyhow::bail!("Unknown report reason '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    ActionTaken,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::ActionTaken => "action_taken",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "action_taken" => Ok(ReportStatus::ActionTaken),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => anyhow::bail!("Unknown report status '{}'", other),
        }
    }
}

/// What a report points at. Exactly one target per report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportTarget {
    User(Uuid),
    Activity(Uuid),
    Message(Uuid),
}

impl ReportTarget {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportTarget::User(_) => ReportType::User,
            ReportTarget::Activity(_) => ReportType::Activity,
            ReportTarget::Message(_) => ReportType::Message,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ReportTarget::User(id) | ReportTarget::Activity(id) | ReportTarget::Message(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub target: ReportTarget,
    pub reason: ReportReason,
    pub description: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    /// Automatic: the content filter altered a stored message
    ContentFiltered,
    Warn,
    ContentRemoved,
    UserSuspended,
    UserBanned,
    ReportDismissed,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::ContentFiltered => "content_filtered",
            ModerationAction::Warn => "warn",
            ModerationAction::ContentRemoved => "content_removed",
            ModerationAction::UserSuspended => "user_suspended",
            ModerationAction::UserBanned => "user_banned",
            ModerationAction::ReportDismissed => "report_dismissed",
        }
    }
}

/// Append-only moderation log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: Uuid,
    /// `None` for automatic actions
    pub moderator_id: Option<Uuid>,
    pub target_user_id: Uuid,
    pub action: ModerationAction,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
