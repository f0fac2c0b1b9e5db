use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use godo_error::{AppError, AppResult};

use super::models::{Block, Report, ReportReason, ReportStatus, ReportTarget, ReportType};
use crate::context::AppContext;
use crate::store::User;
use crate::utils::loggable_user;

const USER_NOT_FOUND: &str = "Kullanıcı bulunamadı.";
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_BLOCK_REASON_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub reason: ReportReason,
    #[serde(default)]
    pub description: String,
    pub user_id: Option<Uuid>,
    pub activity_id: Option<Uuid>,
    pub message_id: Option<Uuid>,
}

impl ReportRequest {
    /// The id matching `report_type`, required
    fn target(&self) -> AppResult<ReportTarget> {
        match self.report_type {
            ReportType::User => self
                .user_id
                .map(ReportTarget::User)
                .ok_or_else(|| AppError::validation("Kullanıcı ID gerekli.")),
            ReportType::Activity => self
                .activity_id
                .map(ReportTarget::Activity)
                .ok_or_else(|| AppError::validation("Aktivite ID gerekli.")),
            ReportType::Message => self
                .message_id
                .map(ReportTarget::Message)
                .ok_or_else(|| AppError::validation("Mesaj ID gerekli.")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Created(Uuid),
    /// The reporter already has a pending report on the same target
    AlreadyPending,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Created,
    AlreadyBlocked,
}

pub async fn report_content(
    ctx: &AppContext,
    reporter: &User,
    request: ReportRequest,
) -> AppResult<ReportOutcome> {
    let target = request.target()?;

    if request.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::validation(format!(
            "Açıklama en fazla {} karakter olabilir.",
            MAX_DESCRIPTION_CHARS
        )));
    }

    match target {
        ReportTarget::User(user_id) => {
            if user_id == reporter.id {
                return Err(AppError::validation("Kendinizi şikayet edemezsiniz."));
            }
            if !is_active_user(ctx, user_id).await? {
                return Err(AppError::not_found(USER_NOT_FOUND));
            }
        }
        ReportTarget::Activity(activity_id) => {
            if ctx.store.get_activity(activity_id).await?.is_none() {
                return Err(AppError::not_found("Aktivite bulunamadı."));
            }
        }
        ReportTarget::Message(message_id) => {
            let message = ctx
                .store
                .get_message(message_id)
                .await?
                .ok_or_else(|| AppError::not_found("Mesaj bulunamadı."))?;
            let in_conversation = ctx
                .store
                .get_conversation(message.conversation_id)
                .await?
                .map(|c| c.has_participant(&reporter.id))
                .unwrap_or(false);
            if !in_conversation {
                return Err(AppError::forbidden("Bu mesajı şikayet etme yetkiniz yok."));
            }
        }
    }

    if ctx
        .store
        .find_pending_report(reporter.id, target)
        .await?
        .is_some()
    {
        return Ok(ReportOutcome::AlreadyPending);
    }

    let report = Report {
        id: Uuid::new_v4(),
        reporter_id: reporter.id,
        target,
        reason: request.reason,
        description: request.description,
        status: ReportStatus::Pending,
        created_at: Utc::now(),
    };
    ctx.store.insert_report(&report).await?;

    tracing::info!(
        report_id = %report.id,
        report_type = target.report_type().as_str(),
        reason = report.reason.as_str(),
        reporter = %loggable_user(&reporter.id, &ctx.config.logging),
        "Report received"
    );

    Ok(ReportOutcome::Created(report.id))
}

pub async fn block_user(
    ctx: &AppContext,
    blocker: &User,
    blocked_id: Uuid,
    request: BlockRequest,
) -> AppResult<BlockOutcome> {
    if blocked_id == blocker.id {
        return Err(AppError::validation("Kendinizi engelleyemezsiniz."));
    }
    if request.reason.chars().count() > MAX_BLOCK_REASON_CHARS {
        return Err(AppError::validation(format!(
            "Sebep en fazla {} karakter olabilir.",
            MAX_BLOCK_REASON_CHARS
        )));
    }
    if !is_active_user(ctx, blocked_id).await? {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }

    let block = Block {
        blocker_id: blocker.id,
        blocked_id,
        reason: request.reason,
        created_at: Utc::now(),
    };
    if !ctx.store.insert_block(&block).await? {
        return Ok(BlockOutcome::AlreadyBlocked);
    }

    tracing::info!(
        blocker = %loggable_user(&blocker.id, &ctx.config.logging),
        "User blocked"
    );
    Ok(BlockOutcome::Created)
}

pub async fn unblock_user(ctx: &AppContext, blocker: &User, blocked_id: Uuid) -> AppResult<()> {
    if ctx.store.delete_block(blocker.id, blocked_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Bu kullanıcı engellenmiş değil."))
    }
}

async fn is_active_user(ctx: &AppContext, user_id: Uuid) -> AppResult<bool> {
    Ok(ctx
        .store
        .get_user(user_id)
        .await?
        .map(|u| u.is_active)
        .unwrap_or(false))
}
