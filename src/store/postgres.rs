// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// Enum-like columns are TEXT and parsed on read. Conversation participants
// live in their own table and are aggregated with array_agg.
//
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use godo_moderation::{BannedWord, BannedWordStore};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    ActivityStore, AuditLog, BlockStore, Conversation, ConversationStore, ConversationType,
    Message, MessageStore, NewMessage, ReportStore, Store, TypingStore, User, UserStore,
};
use crate::activities::{Activity, Participation};
use crate::moderation::{AuditEntry, Block, Report, ReportTarget};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const CONVERSATION_SELECT: &str = r#"
    SELECT c.id, c.conversation_type, c.activity_id, c.created_at, c.last_message_at,
           COALESCE(array_agg(cp.user_id) FILTER (WHERE cp.user_id IS NOT NULL), '{}') AS participant_ids
    FROM conversations c
    LEFT JOIN conversation_participants cp ON cp.conversation_id = c.id
"#;

#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    conversation_type: String,
    activity_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
    participant_ids: Vec<Uuid>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = anyhow::Error;

    fn try_from(row: ConversationRow) -> Result<Self> {
        Ok(Conversation {
            id: row.id,
            conversation_type: row.conversation_type.parse()?,
            activity_id: row.activity_id,
            participant_ids: row.participant_ids,
            created_at: row.created_at,
            last_message_at: row.last_message_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    creator_id: Uuid,
    title: String,
    description: String,
    mode: String,
    address_display: String,
    city: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    max_participants: i32,
    current_participants: i32,
    status: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = anyhow::Error;

    fn try_from(row: ActivityRow) -> Result<Self> {
        Ok(Activity {
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            description: row.description,
            mode: row.mode.parse()?,
            address_display: row.address_display,
            city: row.city,
            start_time: row.start_time,
            end_time: row.end_time,
            max_participants: row.max_participants,
            current_participants: row.current_participants,
            status: row.status.parse()?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ParticipationRow {
    id: Uuid,
    activity_id: Uuid,
    user_id: Uuid,
    message: String,
    is_group: bool,
    group_member_count: i32,
    status: String,
    applied_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<ParticipationRow> for Participation {
    type Error = anyhow::Error;

    fn try_from(row: ParticipationRow) -> Result<Self> {
        Ok(Participation {
            id: row.id,
            activity_id: row.activity_id,
            user_id: row.user_id,
            message: row.message,
            is_group: row.is_group,
            group_member_count: row.group_member_count,
            status: row.status.parse()?,
            applied_at: row.applied_at,
            responded_at: row.responded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    reporter_id: Uuid,
    report_type: String,
    reported_user_id: Option<Uuid>,
    reported_activity_id: Option<Uuid>,
    reported_message_id: Option<Uuid>,
    reason: String,
    description: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for Report {
    type Error = anyhow::Error;

    fn try_from(row: ReportRow) -> Result<Self> {
        use crate::moderation::ReportType;

        let target = match row.report_type.parse::<ReportType>()? {
            ReportType::User => row.reported_user_id.map(ReportTarget::User),
            ReportType::Activity => row.reported_activity_id.map(ReportTarget::Activity),
            ReportType::Message => row.reported_message_id.map(ReportTarget::Message),
        }
        .with_context(|| format!("Report {} has no target for its type", row.id))?;

        Ok(Report {
            id: row.id,
            reporter_id: row.reporter_id,
            target,
            reason: row.reason.parse()?,
            description: row.description,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

/// Splits a report target into the (user, activity, message) id columns
fn target_columns(target: ReportTarget) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
    match target {
        ReportTarget::User(id) => (Some(id), None, None),
        ReportTarget::Activity(id) => (None, Some(id), None),
        ReportTarget::Message(id) => (None, None, Some(id)),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, is_active, fcm_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")
    }

    async fn active_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, is_active, fcm_token
            FROM users
            WHERE id = ANY($1) AND is_active
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch active users")
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, is_active, fcm_token)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                is_active = EXCLUDED.is_active,
                fcm_token = EXCLUDED.fcm_token
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(&user.fcm_token)
        .execute(&self.pool)
        .await
        .context("Failed to upsert user")?;

        Ok(())
    }
}

const DIRECT_CONVERSATION_FILTER: &str = r#"
    WHERE c.conversation_type = 'direct'
      AND c.id IN (
        SELECT conversation_id
        FROM conversation_participants
        GROUP BY conversation_id
        HAVING COUNT(*) = 2 AND bool_or(user_id = $1) AND bool_or(user_id = $2)
      )
    GROUP BY c.id
    ORDER BY c.created_at
    LIMIT 1
"#;

/// Inserts the conversation row and its participants inside `tx`
async fn insert_conversation_rows(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    conversation_type: ConversationType,
    activity_id: Option<Uuid>,
    participant_ids: &[Uuid],
) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO conversations (id, conversation_type, activity_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(id)
    .bind(conversation_type.as_str())
    .bind(activity_id)
    .execute(&mut **tx)
    .await
    .context("Failed to insert conversation")?;

    sqlx::query(
        r#"
        INSERT INTO conversation_participants (conversation_id, user_id)
        SELECT $1, unnest($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(id)
    .bind(participant_ids)
    .execute(&mut **tx)
    .await
    .context("Failed to insert conversation participants")?;

    Ok(id)
}

/// Advisory lock key for an unordered user pair
fn pair_lock_key(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("direct:{low}:{high}")
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn create_conversation(
        &self,
        conversation_type: ConversationType,
        activity_id: Option<Uuid>,
        participant_ids: &[Uuid],
    ) -> Result<Conversation> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let id =
            insert_conversation_rows(&mut tx, conversation_type, activity_id, participant_ids)
                .await?;
        tx.commit().await.context("Failed to commit conversation")?;

        self.get_conversation(id)
            .await?
            .context("Conversation vanished after insert")
    }

    async fn find_or_create_direct(&self, a: Uuid, b: Uuid) -> Result<(Conversation, bool)> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // Serializes creators of the same pair until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(pair_lock_key(a, b))
            .execute(&mut *tx)
            .await
            .context("Failed to take direct conversation lock")?;

        let query = format!("{CONVERSATION_SELECT}{DIRECT_CONVERSATION_FILTER}");
        let existing = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to find direct conversation")?;

        if let Some(row) = existing {
            tx.commit().await.context("Failed to release direct conversation lock")?;
            return Ok((Conversation::try_from(row)?, false));
        }

        let id = insert_conversation_rows(&mut tx, ConversationType::Direct, None, &[a, b]).await?;
        tx.commit().await.context("Failed to commit conversation")?;

        let conversation = self
            .get_conversation(id)
            .await?
            .context("Conversation vanished after insert")?;
        Ok((conversation, true))
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        let query = format!("{CONVERSATION_SELECT} WHERE c.id = $1 GROUP BY c.id");
        let row = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch conversation")?;

        row.map(Conversation::try_from).transpose()
    }

    async fn find_direct_conversation(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>> {
        let query = format!("{CONVERSATION_SELECT}{DIRECT_CONVERSATION_FILTER}");
        let row = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find direct conversation")?;

        row.map(Conversation::try_from).transpose()
    }

    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let query = format!(
            r#"{CONVERSATION_SELECT}
            WHERE c.id IN (
                SELECT conversation_id FROM conversation_participants WHERE user_id = $1
            )
            GROUP BY c.id
            ORDER BY c.last_message_at DESC"#
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list conversations")?;

        rows.into_iter().map(Conversation::try_from).collect()
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let stored = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, is_filtered, original_content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, conversation_id, sender_id, content, is_filtered, original_content,
                      is_read, read_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.is_filtered)
        .bind(&message.original_content)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert message")?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_at = GREATEST(last_message_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(stored.conversation_id)
        .bind(stored.created_at)
        .execute(&mut *tx)
        .await
        .context("Failed to advance conversation last_message_at")?;

        tx.commit().await.context("Failed to commit message")?;

        Ok(stored)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, is_filtered, original_content,
                   is_read, read_at, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch message")
    }

    async fn messages_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, is_filtered, original_content,
                   is_read, read_at, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list messages")
    }

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, is_filtered, original_content,
                   is_read, read_at, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch last message")
    }

    async fn unread_count(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE conversation_id = $1 AND NOT is_read AND sender_id <> $2
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count unread messages")?;

        Ok(count)
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE, read_at = NOW()
            WHERE conversation_id = $1 AND NOT is_read AND sender_id <> $2
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await
        .context("Failed to mark messages as read")?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TypingStore for PgStore {
    async fn upsert_typing(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        is_typing: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO typing_indicators (conversation_id, user_id, is_typing, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (conversation_id, user_id) DO UPDATE
            SET is_typing = EXCLUDED.is_typing, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(is_typing)
        .execute(&self.pool)
        .await
        .context("Failed to upsert typing indicator")?;

        Ok(())
    }

    async fn delete_typing_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM typing_indicators WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .context("Failed to delete stale typing indicators")?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn insert_activity(&self, activity: &Activity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (
                id, creator_id, title, description, mode, address_display, city,
                start_time, end_time, max_participants, current_participants,
                status, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(activity.id)
        .bind(activity.creator_id)
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(activity.mode.as_str())
        .bind(&activity.address_display)
        .bind(&activity.city)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(activity.max_participants)
        .bind(activity.current_participants)
        .bind(activity.status.as_str())
        .bind(activity.is_active)
        .bind(activity.created_at)
        .bind(activity.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert activity")?;

        Ok(())
    }

    async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, creator_id, title, description, mode, address_display, city,
                   start_time, end_time, max_participants, current_participants,
                   status, is_active, created_at, updated_at
            FROM activities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch activity")?;

        row.map(Activity::try_from).transpose()
    }

    async fn find_participation(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participation>> {
        let row = sqlx::query_as::<_, ParticipationRow>(
            r#"
            SELECT id, activity_id, user_id, message, is_group, group_member_count,
                   status, applied_at, responded_at
            FROM activity_participations
            WHERE activity_id = $1 AND user_id = $2
            "#,
        )
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find participation")?;

        row.map(Participation::try_from).transpose()
    }

    async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>> {
        let row = sqlx::query_as::<_, ParticipationRow>(
            r#"
            SELECT id, activity_id, user_id, message, is_group, group_member_count,
                   status, applied_at, responded_at
            FROM activity_participations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch participation")?;

        row.map(Participation::try_from).transpose()
    }

    async fn participations_for_activity(&self, activity_id: Uuid) -> Result<Vec<Participation>> {
        let rows = sqlx::query_as::<_, ParticipationRow>(
            r#"
            SELECT id, activity_id, user_id, message, is_group, group_member_count,
                   status, applied_at, responded_at
            FROM activity_participations
            WHERE activity_id = $1
            ORDER BY applied_at DESC
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list participations")?;

        rows.into_iter().map(Participation::try_from).collect()
    }

    async fn insert_participation(&self, participation: &Participation) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_participations (
                id, activity_id, user_id, message, is_group, group_member_count,
                status, applied_at, responded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (activity_id, user_id) DO NOTHING
            "#,
        )
        .bind(participation.id)
        .bind(participation.activity_id)
        .bind(participation.user_id)
        .bind(&participation.message)
        .bind(participation.is_group)
        .bind(participation.group_member_count)
        .bind(participation.status.as_str())
        .bind(participation.applied_at)
        .bind(participation.responded_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert participation")?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_response(
        &self,
        participation: &Participation,
        activity: &Activity,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE activity_participations
            SET status = $2, responded_at = $3
            WHERE id = $1
            "#,
        )
        .bind(participation.id)
        .bind(participation.status.as_str())
        .bind(participation.responded_at)
        .execute(&mut *tx)
        .await
        .context("Failed to update participation")?;

        sqlx::query(
            r#"
            UPDATE activities
            SET current_participants = $2, status = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(activity.id)
        .bind(activity.current_participants)
        .bind(activity.status.as_str())
        .bind(activity.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to update activity")?;

        tx.commit().await.context("Failed to commit response")?;

        Ok(())
    }
}

#[async_trait]
impl BlockStore for PgStore {
    async fn any_block_between(&self, user_id: Uuid, others: &[Uuid]) -> Result<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_blocks
                WHERE (blocker_id = $1 AND blocked_id = ANY($2))
                   OR (blocked_id = $1 AND blocker_id = ANY($2))
            )
            "#,
        )
        .bind(user_id)
        .bind(others)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check blocks")?;

        Ok(exists)
    }

    async fn insert_block(&self, block: &Block) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_blocks (blocker_id, blocked_id, reason, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (blocker_id, blocked_id) DO NOTHING
            "#,
        )
        .bind(block.blocker_id)
        .bind(block.blocked_id)
        .bind(&block.reason)
        .bind(block.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert block")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM user_blocks WHERE blocker_id = $1 AND blocked_id = $2")
                .bind(blocker_id)
                .bind(blocked_id)
                .execute(&self.pool)
                .await
                .context("Failed to delete block")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn find_pending_report(
        &self,
        reporter_id: Uuid,
        target: ReportTarget,
    ) -> Result<Option<Report>> {
        let (user_id, activity_id, message_id) = target_columns(target);
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, reporter_id, report_type, reported_user_id, reported_activity_id,
                   reported_message_id, reason, description, status, created_at
            FROM reports
            WHERE reporter_id = $1
              AND report_type = $2
              AND reported_user_id IS NOT DISTINCT FROM $3
              AND reported_activity_id IS NOT DISTINCT FROM $4
              AND reported_message_id IS NOT DISTINCT FROM $5
              AND status = 'pending'
            LIMIT 1
            "#,
        )
        .bind(reporter_id)
        .bind(target.report_type().as_str())
        .bind(user_id)
        .bind(activity_id)
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find pending report")?;

        row.map(Report::try_from).transpose()
    }

    async fn insert_report(&self, report: &Report) -> Result<()> {
        let (user_id, activity_id, message_id) = target_columns(report.target);
        sqlx::query(
            r#"
            INSERT INTO reports (
                id, reporter_id, report_type, reported_user_id, reported_activity_id,
                reported_message_id, reason, description, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.target.report_type().as_str())
        .bind(user_id)
        .bind(activity_id)
        .bind(message_id)
        .bind(report.reason.as_str())
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert report")?;

        Ok(())
    }
}

#[async_trait]
impl AuditLog for PgStore {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO moderation_logs (id, moderator_id, target_user_id, action, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.moderator_id)
        .bind(entry.target_user_id)
        .bind(entry.action.as_str())
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to append moderation log")?;

        Ok(())
    }
}

#[async_trait]
impl BannedWordStore for PgStore {
    async fn active_entries(&self) -> Result<Vec<BannedWord>> {
        let rows = sqlx::query_as::<_, (String, bool)>(
            r#"
            SELECT word, is_regex
            FROM banned_words
            WHERE is_active
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load banned words")?;

        Ok(rows
            .into_iter()
            .map(|(pattern, is_regex)| BannedWord { pattern, is_regex })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_columns_fill_exactly_one_slot() {
        let id = Uuid::new_v4();
        assert_eq!(target_columns(ReportTarget::User(id)), (Some(id), None, None));
        assert_eq!(target_columns(ReportTarget::Activity(id)), (None, Some(id), None));
        assert_eq!(target_columns(ReportTarget::Message(id)), (None, None, Some(id)));
    }

    #[test]
    fn test_report_row_without_target_is_rejected() {
        let row = ReportRow {
            id: Uuid::new_v4(),
            reporter_id: Uuid::new_v4(),
            report_type: "user".into(),
            reported_user_id: None,
            reported_activity_id: Some(Uuid::new_v4()),
            reported_message_id: None,
            reason: "spam".into(),
            description: String::new(),
            status: "pending".into(),
            created_at: Utc::now(),
        };
        assert!(Report::try_from(row).is_err());
    }
}
