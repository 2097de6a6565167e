//! SES メールキュー実装
//!
//! AWS SES v2 API を使用してメールを送信する。
//! 本番環境で使用する。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    types::{Body, Content, Destination, EmailContent, Message},
};
use notiflow_domain::notification::{MailQueueError, OutgoingMail, SentMailHandle};

use super::{ComposedMail, MailComposer, MailQueue};

/// SES メールキュー
///
/// `aws_sdk_sesv2::Client` をラップする。ハンドルには SES が返す MessageId を使う。
pub struct SesMailQueue {
    client:   Client,
    composer: MailComposer,
}

impl SesMailQueue {
    /// 新しい SES メールキューを作成
    ///
    /// 送信元アドレスは SES で検証済みであること。
    pub fn new(client: Client, composer: MailComposer) -> Self {
        Self { client, composer }
    }
}

fn content(data: &str, part: &str) -> Result<Content, MailQueueError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| MailQueueError::MessageBuild(format!("{part}構築失敗: {e}")))
}

fn build_content(mail: &ComposedMail) -> Result<EmailContent, MailQueueError> {
    let html = if mail.html_body.is_empty() {
        None
    } else {
        Some(content(&mail.html_body, "HTML 本文")?)
    };

    let message = Message::builder()
        .subject(content(&mail.subject, "件名")?)
        .body(
            Body::builder()
                .text(content(&mail.text_body, "テキスト本文")?)
                .set_html(html)
                .build(),
        )
        .build();

    Ok(EmailContent::builder().simple(message).build())
}

#[async_trait]
impl MailQueue for SesMailQueue {
    async fn send(&self, mail: &OutgoingMail) -> Result<SentMailHandle, MailQueueError> {
        let composed = self.composer.compose(mail).await?;

        let destination = Destination::builder()
            .set_to_addresses(Some(composed.to.clone()))
            .set_cc_addresses(Some(composed.cc.clone()))
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&composed.from)
            .destination(destination)
            .content(build_content(&composed)?)
            .send()
            .await
            .map_err(|e| MailQueueError::SendFailed(format!("SES 送信失敗: {e}")))?;

        let message_id = output.message_id().ok_or_else(|| {
            MailQueueError::SendFailed("SES が MessageId を返しませんでした".to_string())
        })?;

        Ok(SentMailHandle::new(message_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SesMailQueue>();
    }

    #[test]
    fn html本文がなければテキストのみのボディになる() {
        let composed = ComposedMail {
            to:        vec!["a@x.com".to_string()],
            cc:        Vec::new(),
            from:      "webmaster@localhost".to_string(),
            subject:   "件名".to_string(),
            text_body: "本文".to_string(),
            html_body: String::new(),
        };

        let content = build_content(&composed).unwrap();
        let body = content.simple().unwrap().body().unwrap();

        assert!(body.html().is_none());
        assert_eq!(body.text().unwrap().data(), "本文");
    }
}
