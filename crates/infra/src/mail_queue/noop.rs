//! Noop メールキュー実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! テスト環境や通知無効化時に使用する。

use async_trait::async_trait;
use notiflow_domain::notification::{MailQueueError, OutgoingMail, SentMailHandle};
use uuid::Uuid;

use super::MailQueue;

/// Noop メールキュー（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopMailQueue;

#[async_trait]
impl MailQueue for NoopMailQueue {
    async fn send(&self, mail: &OutgoingMail) -> Result<SentMailHandle, MailQueueError> {
        tracing::info!(
            to = ?mail.recipients,
            cc = ?mail.cc,
            template_name = %mail.template_name,
            subject = %mail.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(SentMailHandle::new(format!("noop-{}", Uuid::now_v7())))
    }
}
