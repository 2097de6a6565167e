//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのリポジトリとメールキュー。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! notiflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notiflow_domain::{
    email_template::EmailTemplate,
    notification::{MailQueueError, Notification, NotificationId, OutgoingMail, SentMailHandle},
};

use crate::{
    error::InfraError,
    mail_queue::MailQueue,
    repository::{EmailTemplateRepository, NotificationRepository},
};

// ===== MockMailQueue =====

/// 送信依頼を記録するメールキュー
///
/// `failing` で作成すると、すべての送信が `MailQueueError::SendFailed` になる。
#[derive(Clone, Default)]
pub struct MockMailQueue {
    calls:   Arc<Mutex<Vec<OutgoingMail>>>,
    failure: Option<String>,
}

impl MockMailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信失敗するメールキュー
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls:   Arc::new(Mutex::new(Vec::new())),
            failure: Some(message.into()),
        }
    }

    /// 受け付けた送信依頼（失敗したものを含む）
    pub fn calls(&self) -> Vec<OutgoingMail> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MailQueue for MockMailQueue {
    async fn send(&self, mail: &OutgoingMail) -> Result<SentMailHandle, MailQueueError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(mail.clone());

        match &self.failure {
            Some(message) => Err(MailQueueError::SendFailed(message.clone())),
            None => Ok(SentMailHandle::new(format!("mock-{}", calls.len()))),
        }
    }
}

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
    sent_writes:   Arc<Mutex<Vec<NotificationId>>>,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されている通知（送信記録を含む最新の状態）
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    /// `mark_sent` が呼ばれた通知 ID
    pub fn sent_writes(&self) -> Vec<NotificationId> {
        self.sent_writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        self.notifications
            .lock()
            .unwrap()
            .push(notification.clone());
        Ok(())
    }

    async fn mark_sent(&self, notification: &Notification) -> Result<(), InfraError> {
        let mut notifications = self.notifications.lock().unwrap();
        let Some(stored) = notifications
            .iter_mut()
            .find(|n| n.id() == notification.id())
        else {
            return Err(InfraError::unexpected(format!(
                "通知が存在しません: {}",
                notification.id()
            )));
        };
        *stored = notification.clone();
        self.sent_writes
            .lock()
            .unwrap()
            .push(notification.id().clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id() == id)
            .cloned())
    }
}

// ===== InMemoryEmailTemplateRepository =====

#[derive(Clone, Default)]
pub struct InMemoryEmailTemplateRepository {
    templates: Arc<Mutex<Vec<EmailTemplate>>>,
}

impl InMemoryEmailTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テンプレートを登録する（同名があれば置き換える）
    pub fn add(&self, template: EmailTemplate) {
        let mut templates = self.templates.lock().unwrap();
        templates.retain(|t| t.name != template.name);
        templates.push(template);
    }
}

#[async_trait]
impl EmailTemplateRepository for InMemoryEmailTemplateRepository {
    async fn exists(&self, name: &str) -> Result<bool, InfraError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.name == name))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<EmailTemplate>, InfraError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn upsert(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        self.add(template.clone());
        Ok(())
    }
}
