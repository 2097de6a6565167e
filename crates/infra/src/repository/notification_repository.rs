//! # NotificationRepository
//!
//! 通知レコードの永続化を担当するリポジトリ。
//!
//! 書き込みは「作成時の INSERT」と「送信成功時の送信記録の UPDATE」の 2 種類だけ。
//! 送信失敗時は何も書き込まない。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notiflow_domain::notification::{
    Channel,
    Notification,
    NotificationId,
    NotificationRecord,
    SenderRef,
    SentMailHandle,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 通知リポジトリトレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 通知を挿入する
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError>;

    /// 送信記録（`sent_recipients` / `sent_handle`）を保存する
    async fn mark_sent(&self, notification: &Notification) -> Result<(), InfraError>;

    /// ID で通知を検索する
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError>;
}

/// DB の notifications テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id:              Uuid,
    channel:         String,
    sender_type:     Option<String>,
    sender_id:       Option<String>,
    sender_email:    Option<String>,
    from_address:    Option<String>,
    recipients:      Vec<String>,
    cc:              Vec<String>,
    sent_recipients: Vec<String>,
    template_name:   String,
    template_data:   Option<serde_json::Value>,
    subject:         String,
    text_message:    String,
    html_message:    String,
    sent_handle:     Option<String>,
    created_at:      DateTime<Utc>,
    updated_at:      DateTime<Utc>,
}

fn sender_from_columns(
    sender_type: Option<String>,
    sender_id: Option<String>,
    sender_email: Option<String>,
) -> SenderRef {
    match (sender_type, sender_id) {
        (Some(sender_type), Some(id)) if sender_type == "user" => {
            SenderRef::user(id, sender_email.unwrap_or_default())
        }
        (Some(sender_type), Some(id)) => SenderRef::other(sender_type, id),
        _ => SenderRef::None,
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = InfraError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Notification::from_db(NotificationRecord {
            id:              NotificationId::from_uuid(row.id),
            channel:         Channel::from(row.channel),
            sender:          sender_from_columns(row.sender_type, row.sender_id, row.sender_email),
            from_address:    row.from_address,
            recipients:      row.recipients,
            cc:              row.cc,
            sent_recipients: row.sent_recipients,
            template_name:   row.template_name,
            template_data:   row.template_data.unwrap_or(serde_json::Value::Null),
            subject:         row.subject,
            text_body:       row.text_message,
            html_body:       row.html_message,
            sent_handle:     row.sent_handle.map(SentMailHandle::new),
            created_at:      row.created_at,
            updated_at:      row.updated_at,
        })
        .map_err(|e| InfraError::inconsistent_data(e.to_string()))
    }
}

/// PostgreSQL 実装の NotificationRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %notification.id()))]
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        let sender = notification.sender();
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, channel, sender_type, sender_id, sender_email, from_address,
                recipients, cc, sent_recipients, template_name, template_data,
                subject, text_message, html_message, sent_handle,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(notification.id().as_uuid())
        .bind(notification.channel().as_str())
        .bind(sender.entity_type())
        .bind(sender.entity_id())
        .bind(sender.email())
        .bind(notification.from_address())
        .bind(notification.recipients())
        .bind(notification.cc())
        .bind(notification.sent_recipients())
        .bind(notification.template_name())
        .bind(notification.template_data())
        .bind(notification.subject())
        .bind(notification.text_body())
        .bind(notification.html_body())
        .bind(notification.sent_handle().map(SentMailHandle::as_str))
        .bind(notification.created_at())
        .bind(notification.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %notification.id()))]
    async fn mark_sent(&self, notification: &Notification) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET sent_recipients = $2, sent_handle = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(notification.id().as_uuid())
        .bind(notification.sent_recipients())
        .bind(notification.sent_handle().map(SentMailHandle::as_str))
        .bind(notification.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::unexpected(format!(
                "通知が存在しません: {}",
                notification.id()
            )));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %id))]
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT
                id,
                channel,
                sender_type,
                sender_id,
                sender_email,
                from_address,
                recipients,
                cc,
                sent_recipients,
                template_name,
                template_data,
                subject,
                text_message,
                html_message,
                sent_handle,
                created_at,
                updated_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn NotificationRepository>>();
    }

    #[rstest]
    #[case(Some("user"), Some("9"), Some("ann@example.com"), SenderRef::user("9", "ann@example.com"))]
    #[case(Some("user"), Some("9"), None, SenderRef::user("9", ""))]
    #[case(Some("sample.author"), Some("3"), None, SenderRef::other("sample.author", "3"))]
    #[case(None, None, None, SenderRef::None)]
    #[case(Some("sample.author"), None, None, SenderRef::None)]
    fn test_送信者カラムから送信者参照を復元する(
        #[case] sender_type: Option<&str>,
        #[case] sender_id: Option<&str>,
        #[case] sender_email: Option<&str>,
        #[case] expected: SenderRef,
    ) {
        let sender = sender_from_columns(
            sender_type.map(str::to_string),
            sender_id.map(str::to_string),
            sender_email.map(str::to_string),
        );
        assert_eq!(sender, expected);
    }

    #[test]
    fn test_未送信なのに送信記録がある行はデータ不整合になる() {
        let now = Utc::now();
        let row = NotificationRow {
            id:              Uuid::now_v7(),
            channel:         "Email".to_string(),
            sender_type:     None,
            sender_id:       None,
            sender_email:    None,
            from_address:    None,
            recipients:      vec!["a@x.com".to_string()],
            cc:              Vec::new(),
            sent_recipients: vec!["a@x.com".to_string()],
            template_name:   "welcome".to_string(),
            template_data:   None,
            subject:         String::new(),
            text_message:    String::new(),
            html_message:    String::new(),
            sent_handle:     None,
            created_at:      now,
            updated_at:      now,
        };

        let err = Notification::try_from(row).unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::InfraErrorKind::InconsistentData(_)
        ));
    }
}
