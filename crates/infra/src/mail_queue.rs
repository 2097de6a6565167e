//! # メールキュー
//!
//! 送信依頼（[`OutgoingMail`]）を受け取り、メッセージを組み立てて配送する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailQueue` trait で配送手段を抽象化
//! - **3 つの実装**: SMTP（Mailpit 開発用）、SES（本番用）、Noop（テスト用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **レンダリングはキュー側**: テンプレート名付きの依頼はテンプレートストアから引いて、
//!   それ以外は依頼の件名・本文そのものをテンプレートとして、[`MailComposer`] が
//!   コンテキストでレンダリングする

mod noop;
mod ses;
mod smtp;

use async_trait::async_trait;
use notiflow_domain::notification::{MailQueueError, OutgoingMail, SentMailHandle};
pub use noop::NoopMailQueue;
pub use ses::SesMailQueue;
pub use smtp::SmtpMailQueue;

use crate::template::{TemplateError, TemplateRenderer};

/// メールキュートレイト
#[async_trait]
pub trait MailQueue: Send + Sync {
    /// メールを送信し、送信済みメールのハンドルを返す
    async fn send(&self, mail: &OutgoingMail) -> Result<SentMailHandle, MailQueueError>;
}

/// 配送直前のメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMail {
    pub to:        Vec<String>,
    pub cc:        Vec<String>,
    pub from:      String,
    pub subject:   String,
    pub text_body: String,
    pub html_body: String,
}

/// 送信依頼からメッセージを組み立てる
#[derive(Clone)]
pub struct MailComposer {
    renderer: TemplateRenderer,
}

impl MailComposer {
    pub fn new(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// 送信依頼を配送可能なメッセージにする
    ///
    /// テンプレート名があればストアのテンプレートを、なければ依頼の件名・本文を
    /// テンプレートとしてレンダリングする。
    pub async fn compose(&self, mail: &OutgoingMail) -> Result<ComposedMail, MailQueueError> {
        if mail.destination_count() == 0 {
            return Err(MailQueueError::NoRecipients);
        }

        let result = if mail.uses_template() {
            let template = self
                .renderer
                .loader()
                .store()
                .find_by_name(&mail.template_name)
                .await
                .map_err(|e| MailQueueError::TemplateStore(e.to_string()))?
                .ok_or_else(|| MailQueueError::TemplateNotFound(mail.template_name.clone()))?;

            self.renderer
                .render_email_template(&template, &mail.context)
                .await
        } else {
            self.renderer
                .render_parts(
                    "message",
                    &mail.subject,
                    &mail.text_body,
                    &mail.html_body,
                    &mail.context,
                )
                .await
        };
        let rendered = result.map_err(|e| match e {
            TemplateError::Store(e) => MailQueueError::TemplateStore(e.to_string()),
            other => MailQueueError::TemplateFailed(other.to_string()),
        })?;

        Ok(ComposedMail {
            to:        mail.recipients.clone(),
            cc:        mail.cc.clone(),
            from:      mail.sender.clone(),
            subject:   rendered.subject,
            text_body: rendered.text_body,
            html_body: rendered.html_body,
        })
    }
}
