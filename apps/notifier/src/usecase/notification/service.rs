//! # 通知サービス
//!
//! 通知の検証 → 保存 → ディスパッチを統合するサービス。
//!
//! ## 設計方針
//!
//! - **送信失敗は握りつぶす**: メールキューが返したエラーはログに記録するだけで、
//!   呼び出し元には返さない。通知は `Unsent` のまま残る
//! - **チャネル不正は返す**: 未実装チャネルのディスパッチは呼び出し元の不具合として扱う
//! - **依存性注入**: リポジトリとメールキューは trait で抽象化

use std::sync::Arc;

use chrono::Utc;
use notiflow_domain::{
    context::{TemplateContext, normalize_context},
    notification::{
        Channel,
        DeliveryState,
        NewNotification,
        Notification,
        NotificationId,
        SenderRef,
        ValidationError,
    },
};
use notiflow_infra::{
    MailQueue,
    TemplateRenderer,
    repository::{EmailTemplateRepository, NotificationRepository},
};
use notiflow_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::{
    ContentNotificationRequest,
    ContentSource,
    TemplateNotificationRequest,
    resolve_from_address,
};
use crate::error::NotifierError;

/// 通知サービス
pub struct NotificationService {
    repository:         Arc<dyn NotificationRepository>,
    templates:          Arc<dyn EmailTemplateRepository>,
    mail_queue:         Arc<dyn MailQueue>,
    renderer:           TemplateRenderer,
    default_from_email: String,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        templates: Arc<dyn EmailTemplateRepository>,
        mail_queue: Arc<dyn MailQueue>,
        renderer: TemplateRenderer,
        default_from_email: String,
    ) -> Self {
        Self {
            repository,
            templates,
            mail_queue,
            renderer,
            default_from_email,
        }
    }

    /// 通知を検証する
    ///
    /// チャネル・コンテンツ指定の排他性に加え、テンプレート名が指定されていれば
    /// テンプレートストアに存在することを確認する。
    pub async fn validate(&self, notification: &Notification) -> Result<(), NotifierError> {
        notification.validate()?;

        if notification.has_template()
            && !self.templates.exists(notification.template_name()).await?
        {
            return Err(NotifierError::Validation(ValidationError::UnknownTemplate(
                notification.template_name().to_string(),
            )));
        }

        Ok(())
    }

    /// 通知を作成し、検証して保存する
    #[tracing::instrument(skip_all, fields(notification_id = %params.id))]
    pub async fn create(&self, params: NewNotification) -> Result<Notification, NotifierError> {
        let notification = Notification::new(params);
        self.validate(&notification).await?;
        self.repository.insert(&notification).await?;

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_CREATED,
            event.entity_type = event::entity_type::NOTIFICATION,
            event.entity_id = %notification.id(),
            event.result = event::result::SUCCESS,
            notification.template_name = notification.template_name(),
            "通知を作成"
        );

        Ok(notification)
    }

    /// 通知をディスパッチする
    ///
    /// 送信に成功すると送信記録を保存し `Sent` を返す。メールキューが失敗した場合は
    /// エラーログを 1 件出力し、何も保存せずに `Unsent` を返す。
    ///
    /// # Errors
    ///
    /// - `NotificationError::ChannelNotImplemented`: `Email` 以外のチャネル（送信は試みない）
    /// - `NotificationError::InvalidTemplateData`: テンプレートデータがマッピングでない
    /// - `NotifierError::Database`: 送信記録の保存に失敗した
    #[tracing::instrument(skip_all, fields(notification_id = %notification.id()))]
    pub async fn dispatch(
        &self,
        notification: &mut Notification,
    ) -> Result<DeliveryState, NotifierError> {
        notification.ensure_dispatchable()?;

        let sender = resolve_from_address(
            notification.sender(),
            notification.from_address(),
            &self.default_from_email,
        );
        let context = notification.context()?;
        let mail = notification.to_outgoing_mail(sender, context);

        let handle = match self.mail_queue.send(&mail).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::MAIL_SEND,
                    notification_id = %notification.id(),
                    error = %e,
                    "メール送信に失敗"
                );
                return Ok(DeliveryState::Unsent);
            }
        };

        notification.mark_sent(handle, Utc::now());
        if let Err(e) = self.repository.mark_sent(notification).await {
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::DATABASE,
                notification_id = %notification.id(),
                error = %e,
                "送信記録の保存に失敗"
            );
            return Err(e.into());
        }

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_SENT,
            event.entity_type = event::entity_type::NOTIFICATION,
            event.entity_id = %notification.id(),
            event.result = event::result::SUCCESS,
            notification.recipients = notification.sent_recipients().len(),
            "通知メール送信成功"
        );

        Ok(notification.state())
    }

    /// 生コンテンツまたはファイルテンプレートで通知を送信する
    ///
    /// 件名・本文・HTML 本文をそれぞれ解決してから通知を作成し、ディスパッチする。
    pub async fn send_notification(
        &self,
        request: ContentNotificationRequest,
    ) -> Result<Notification, NotifierError> {
        let context = normalize_context(request.context.clone());
        let subject = self.resolve_logged(&request.subject, &context).await?;
        let text_body = self.resolve_logged(&request.content, &context).await?;
        let html_body = self.resolve_logged(&request.html_content, &context).await?;

        let from_address = self.initial_from_address(&request.sender, request.from_address);
        let mut notification = self
            .create(NewNotification {
                id: NotificationId::new(),
                channel: Channel::Email,
                sender: request.sender,
                from_address,
                recipients: request.recipients.into_vec(),
                cc: request.cc,
                template_name: String::new(),
                template_data: request.context,
                subject,
                text_body,
                html_body,
                now: Utc::now(),
            })
            .await?;

        self.dispatch(&mut notification).await?;
        Ok(notification)
    }

    /// テンプレートストアのテンプレートで通知を送信する
    ///
    /// `send_disabled` の場合は作成・保存のみ行う。
    pub async fn send_notification_with_template(
        &self,
        request: TemplateNotificationRequest,
    ) -> Result<Notification, NotifierError> {
        let from_address = self.initial_from_address(&request.sender, request.from_address);
        let mut notification = self
            .create(NewNotification {
                id: NotificationId::new(),
                channel: Channel::Email,
                sender: request.sender,
                from_address,
                recipients: request.recipients.into_vec(),
                cc: request.cc,
                template_name: request.template_name,
                template_data: request.context,
                subject: String::new(),
                text_body: String::new(),
                html_body: String::new(),
                now: Utc::now(),
            })
            .await?;

        if request.send_disabled {
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SEND_SKIPPED,
                event.entity_type = event::entity_type::NOTIFICATION,
                event.entity_id = %notification.id(),
                event.result = event::result::SUCCESS,
                "送信無効のためディスパッチをスキップ"
            );
            return Ok(notification);
        }

        self.dispatch(&mut notification).await?;
        Ok(notification)
    }

    async fn resolve_logged(
        &self,
        source: &ContentSource,
        context: &TemplateContext,
    ) -> Result<String, NotifierError> {
        source.resolve(&self.renderer, context).await.map_err(|e| {
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::TEMPLATE_RENDER,
                filename = %source.filename,
                error = %e,
                "テンプレートのレンダリングに失敗"
            );
            NotifierError::Template(e)
        })
    }

    /// 送信者も送信元アドレスも指定されていなければ既定アドレスを記録する
    fn initial_from_address(
        &self,
        sender: &SenderRef,
        from_address: String,
    ) -> Option<String> {
        if !from_address.is_empty() {
            Some(from_address)
        } else if sender.is_none() {
            Some(self.default_from_email.clone())
        } else {
            None
        }
    }
}
