use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityMode {
    Social,
    Professional,
}

impl ActivityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityMode::Social => "social",
            ActivityMode::Professional => "professional",
        }
    }
}

impl FromStr for ActivityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "social" => Ok(ActivityMode::Social),
            "professional" => Ok(ActivityMode::Professional),
            other => anyhow::bail!("Unknown activity mode '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Active,
    Full,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Active => "active",
            ActivityStatus::Full => "full",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ActivityStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ActivityStatus::Active),
            "full" => Ok(ActivityStatus::Full),
            "completed" => Ok(ActivityStatus::Completed),
            "cancelled" => Ok(ActivityStatus::Cancelled),
            other => anyhow::bail!("Unknown activity status '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub mode: ActivityMode,
    pub address_display: String,
    pub city: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_participants: i32,
    pub current_participants: i32,
    pub status: ActivityStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn spots_left(&self) -> i32 {
        (self.max_participants - self.current_participants).max(0)
    }

    /// Past once the end time (or the start time, without an end) is behind `now`
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end_time.unwrap_or(self.start_time) < now
    }

    /// Derived status update, run on every save.
    ///
    /// Nothing recomputes status on a schedule: an activity nobody writes to
    /// keeps its last stored status after it ends.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        if self.is_full() && self.status == ActivityStatus::Active {
            self.status = ActivityStatus::Full;
        } else if self.is_past(now)
            && matches!(self.status, ActivityStatus::Active | ActivityStatus::Full)
        {
            self.status = ActivityStatus::Completed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "pending",
            ParticipationStatus::Approved => "approved",
            ParticipationStatus::Rejected => "rejected",
            ParticipationStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ParticipationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ParticipationStatus::Pending),
            "approved" => Ok(ParticipationStatus::Approved),
            "rejected" => Ok(ParticipationStatus::Rejected),
            "cancelled" => Ok(ParticipationStatus::Cancelled),
            other => anyhow::bail!("Unknown participation status '{}'", other),
        }
    }
}

/// A user's application to join an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participation {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub is_group: bool,
    /// Seats taken on approval
    pub group_member_count: i32,
    pub status: ParticipationStatus,
    pub applied_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity(max: i32, current: i32) -> Activity {
        let now = Utc::now();
        Activity {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Sabah koşusu".into(),
            description: "Moda sahili".into(),
            mode: ActivityMode::Social,
            address_display: "Kadıköy, ~500m".into(),
            city: "İstanbul".into(),
            start_time: now + Duration::days(1),
            end_time: None,
            max_participants: max,
            current_participants: current,
            status: ActivityStatus::Active,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_spots_left_never_negative() {
        assert_eq!(activity(5, 4).spots_left(), 1);
        assert_eq!(activity(5, 7).spots_left(), 0);
    }

    #[test]
    fn test_full_activity_becomes_full() {
        let mut a = activity(5, 5);
        a.refresh_status(Utc::now());
        assert_eq!(a.status, ActivityStatus::Full);
    }

    #[test]
    fn test_past_activity_becomes_completed() {
        let mut a = activity(5, 1);
        a.start_time = Utc::now() - Duration::hours(3);
        a.end_time = Some(Utc::now() - Duration::hours(1));
        a.refresh_status(Utc::now());
        assert_eq!(a.status, ActivityStatus::Completed);

        let mut full = activity(5, 5);
        full.status = ActivityStatus::Full;
        full.start_time = Utc::now() - Duration::hours(1);
        full.refresh_status(Utc::now());
        assert_eq!(full.status, ActivityStatus::Completed);
    }

    #[test]
    fn test_end_time_takes_precedence_over_start() {
        let mut a = activity(5, 1);
        a.start_time = Utc::now() - Duration::hours(1);
        a.end_time = Some(Utc::now() + Duration::hours(1));
        assert!(!a.is_past(Utc::now()));
        a.refresh_status(Utc::now());
        assert_eq!(a.status, ActivityStatus::Active);
    }

    #[test]
    fn test_cancelled_is_never_recomputed() {
        let mut a = activity(5, 5);
        a.status = ActivityStatus::Cancelled;
        a.start_time = Utc::now() - Duration::hours(1);
        a.refresh_status(Utc::now());
        assert_eq!(a.status, ActivityStatus::Cancelled);
    }
}
