use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use godo_error::{AppError, AppResult};

use super::model::{
    Activity, ActivityMode, ActivityStatus, Participation, ParticipationStatus,
};
use crate::context::AppContext;
use crate::messaging::conversations::ParticipantView;
use crate::notifications::{notify_users, PushNotification};
use crate::store::User;

const ACTIVITY_NOT_FOUND: &str = "Aktivite bulunamadı.";
const PARTICIPATION_NOT_FOUND: &str = "Başvuru bulunamadı.";
const NOT_ALLOWED: &str = "Bu işlem için yetkiniz yok.";
const UNCLEAN_CONTENT: &str = "İçeriğiniz uygunsuz ifadeler içeriyor.";
const UNCLEAN_MESSAGE: &str = "Mesajınız uygunsuz ifadeler içeriyor.";
const NOT_ENOUGH_SPOTS: &str = "Yeterli kontenjan yok.";
const ALREADY_APPLIED: &str = "Bu aktiviteye zaten başvurdunuz.";

const MAX_TITLE_CHARS: usize = 200;
const MAX_APPLICATION_MESSAGE_CHARS: usize = 500;
const MAX_GROUP_MEMBERS: i32 = 10;

fn default_mode() -> ActivityMode {
    ActivityMode::Social
}

fn default_max_participants() -> i32 {
    10
}

fn default_group_member_count() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    pub description: String,
    #[serde(default = "default_mode")]
    pub mode: ActivityMode,
    #[serde(default)]
    pub address_display: String,
    #[serde(default)]
    pub city: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_max_participants")]
    pub max_participants: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default = "default_group_member_count")]
    pub group_member_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: ResponseAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub spots_left: i32,
    pub is_full: bool,
}

impl From<Activity> for ActivityView {
    fn from(activity: Activity) -> Self {
        Self {
            spots_left: activity.spots_left(),
            is_full: activity.is_full(),
            activity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationView {
    #[serde(flatten)]
    pub participation: Participation,
    pub user: Option<ParticipantView>,
}

pub async fn create_activity(
    ctx: &AppContext,
    creator: &User,
    request: CreateActivityRequest,
) -> AppResult<ActivityView> {
    let title = request.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation(format!(
            "Başlık 1 ile {} karakter arasında olmalıdır.",
            MAX_TITLE_CHARS
        )));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::validation("Açıklama boş olamaz."));
    }
    if let Some(end_time) = request.end_time {
        if end_time <= request.start_time {
            return Err(AppError::validation(
                "Bitiş zamanı başlangıçtan sonra olmalıdır.",
            ));
        }
    }
    if request.max_participants < 1 {
        return Err(AppError::validation(
            "Maksimum katılımcı sayısı en az 1 olmalıdır.",
        ));
    }

    let title_result = ctx.filter.filter(Some(title)).await;
    let description_result = ctx.filter.filter(Some(&request.description)).await;
    if !title_result.is_clean || !description_result.is_clean {
        let violations: Vec<_> = title_result
            .violations
            .into_iter()
            .chain(description_result.violations)
            .collect();
        tracing::info!(
            violations = violations.len(),
            "Activity rejected by content filter"
        );
        return Err(AppError::content_rejected(
            UNCLEAN_CONTENT,
            serde_json::to_value(&violations).unwrap_or_default(),
        ));
    }

    let now = Utc::now();
    let mut activity = Activity {
        id: Uuid::new_v4(),
        creator_id: creator.id,
        title: title.to_string(),
        description: request.description,
        mode: request.mode,
        address_display: request.address_display,
        city: request.city,
        start_time: request.start_time,
        end_time: request.end_time,
        max_participants: request.max_participants,
        current_participants: 0,
        status: ActivityStatus::Active,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    activity.refresh_status(now);
    ctx.store.insert_activity(&activity).await?;

    tracing::info!(activity_id = %activity.id, mode = activity.mode.as_str(), "Activity created");
    Ok(activity.into())
}

/// Stored activity as last written. Status is not recomputed on read.
pub async fn get_activity(ctx: &AppContext, activity_id: Uuid) -> AppResult<ActivityView> {
    Ok(find_activity(ctx, activity_id).await?.into())
}

pub async fn apply_to_activity(
    ctx: &AppContext,
    applicant: &User,
    activity_id: Uuid,
    request: ApplyRequest,
) -> AppResult<Participation> {
    let activity = find_activity(ctx, activity_id).await?;

    if ctx
        .store
        .find_participation(activity.id, applicant.id)
        .await?
        .is_some()
    {
        return Err(AppError::validation(ALREADY_APPLIED));
    }
    if activity.creator_id == applicant.id {
        return Err(AppError::validation("Kendi aktivitenize başvuramazsınız."));
    }
    if activity.is_full() {
        return Err(AppError::validation("Bu aktivite dolu."));
    }

    if request.message.chars().count() > MAX_APPLICATION_MESSAGE_CHARS {
        return Err(AppError::validation(format!(
            "Mesaj en fazla {} karakter olabilir.",
            MAX_APPLICATION_MESSAGE_CHARS
        )));
    }
    if !(1..=MAX_GROUP_MEMBERS).contains(&request.group_member_count) {
        return Err(AppError::validation(format!(
            "Grup üye sayısı 1 ile {} arasında olmalıdır.",
            MAX_GROUP_MEMBERS
        )));
    }
    if !request.message.is_empty() && !ctx.filter.is_content_safe(&request.message).await {
        return Err(AppError::validation(UNCLEAN_MESSAGE));
    }

    let participation = Participation {
        id: Uuid::new_v4(),
        activity_id: activity.id,
        user_id: applicant.id,
        message: request.message,
        is_group: request.is_group,
        group_member_count: request.group_member_count,
        status: ParticipationStatus::Pending,
        applied_at: Utc::now(),
        responded_at: None,
    };
    // A concurrent application by the same user got in first
    if !ctx.store.insert_participation(&participation).await? {
        return Err(AppError::conflict(ALREADY_APPLIED));
    }

    tracing::info!(
        activity_id = %activity.id,
        participation_id = %participation.id,
        group_member_count = participation.group_member_count,
        "Application submitted"
    );

    if let Some(creator) = ctx.store.get_user(activity.creator_id).await? {
        notify_users(
            ctx.notifier.clone(),
            vec![creator],
            PushNotification::new(
                "Yeni Başvuru",
                format!("{} aktivitenize başvurdu.", applicant.public_name()),
                json!({
                    "activity_id": activity.id,
                    "participation_id": participation.id,
                }),
            ),
        );
    }

    Ok(participation)
}

/// Applications for an activity, visible to its creator only
pub async fn list_applications(
    ctx: &AppContext,
    user: &User,
    activity_id: Uuid,
) -> AppResult<Vec<ParticipationView>> {
    let activity = find_activity(ctx, activity_id).await?;
    if activity.creator_id != user.id {
        return Err(AppError::forbidden(NOT_ALLOWED));
    }

    let participations = ctx.store.participations_for_activity(activity.id).await?;
    let mut views = Vec::with_capacity(participations.len());
    for participation in participations {
        let user = ctx
            .store
            .get_user(participation.user_id)
            .await?
            .map(|u| ParticipantView::from(&u));
        views.push(ParticipationView {
            participation,
            user,
        });
    }
    Ok(views)
}

/// Approves or rejects an application.
///
/// Approval takes `group_member_count` seats and fails with no change when
/// fewer seats are left. Approving an already approved application is a
/// no-op. The capacity check and the counter update are not atomic with
/// respect to a concurrent approval of another application.
pub async fn respond_to_application(
    ctx: &AppContext,
    user: &User,
    activity_id: Uuid,
    participation_id: Uuid,
    action: ResponseAction,
) -> AppResult<Participation> {
    let mut activity = find_activity(ctx, activity_id).await?;
    if activity.creator_id != user.id {
        return Err(AppError::forbidden(NOT_ALLOWED));
    }

    let mut participation = match ctx.store.get_participation(participation_id).await? {
        Some(p) if p.activity_id == activity.id => p,
        _ => return Err(AppError::not_found(PARTICIPATION_NOT_FOUND)),
    };

    let now = Utc::now();
    let body = match action {
        ResponseAction::Approve => {
            if participation.status == ParticipationStatus::Approved {
                tracing::debug!(participation_id = %participation.id, "Already approved");
                return Ok(participation);
            }
            if activity.spots_left() < participation.group_member_count {
                return Err(AppError::validation(NOT_ENOUGH_SPOTS));
            }

            participation.status = ParticipationStatus::Approved;
            participation.responded_at = Some(now);
            activity.current_participants += participation.group_member_count;
            activity.updated_at = now;
            activity.refresh_status(now);
            "Başvurunuz onaylandı!"
        }
        ResponseAction::Reject => {
            participation.status = ParticipationStatus::Rejected;
            participation.responded_at = Some(now);
            "Başvurunuz reddedildi."
        }
    };

    ctx.store.save_response(&participation, &activity).await?;

    tracing::info!(
        activity_id = %activity.id,
        participation_id = %participation.id,
        status = participation.status.as_str(),
        current_participants = activity.current_participants,
        "Application answered"
    );

    if let Some(applicant) = ctx.store.get_user(participation.user_id).await? {
        notify_users(
            ctx.notifier.clone(),
            vec![applicant],
            PushNotification::new(
                "Başvuru Durumu",
                body,
                json!({ "activity_id": activity.id }),
            ),
        );
    }

    Ok(participation)
}

async fn find_activity(ctx: &AppContext, activity_id: Uuid) -> AppResult<Activity> {
    match ctx.store.get_activity(activity_id).await? {
        Some(activity) if activity.is_active => Ok(activity),
        _ => Err(AppError::not_found(ACTIVITY_NOT_FOUND)),
    }
}
