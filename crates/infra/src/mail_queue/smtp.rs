//! SMTP メールキュー実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
};
use notiflow_domain::notification::{MailQueueError, OutgoingMail, SentMailHandle};
use uuid::Uuid;

use super::{ComposedMail, MailComposer, MailQueue};

/// SMTP メールキュー
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// ハンドルには送信時に採番した Message-ID を使う。
pub struct SmtpMailQueue {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    composer:  MailComposer,
}

impl SmtpMailQueue {
    /// 新しい SMTP メールキューを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `composer`: メッセージの組み立て
    pub fn new(host: &str, port: u16, composer: MailComposer) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self {
            transport,
            composer,
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailQueueError> {
    address
        .parse()
        .map_err(|e| MailQueueError::InvalidAddress(format!("{address}: {e}")))
}

/// lettre のメッセージを組み立てる
///
/// HTML 本文があれば text/plain + text/html の multipart/alternative、
/// なければ text/plain のみ。
fn build_message(mail: &ComposedMail, message_id: &str) -> Result<Message, MailQueueError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .subject(&mail.subject)
        .message_id(Some(message_id.to_string()));
    for address in &mail.to {
        builder = builder.to(parse_mailbox(address)?);
    }
    for address in &mail.cc {
        builder = builder.cc(parse_mailbox(address)?);
    }

    let text_part = SinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .body(mail.text_body.clone());

    let message = if mail.html_body.is_empty() {
        builder.singlepart(text_part)
    } else {
        builder.multipart(
            MultiPart::alternative().singlepart(text_part).singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(mail.html_body.clone()),
            ),
        )
    };

    message.map_err(|e| MailQueueError::MessageBuild(e.to_string()))
}

#[async_trait]
impl MailQueue for SmtpMailQueue {
    async fn send(&self, mail: &OutgoingMail) -> Result<SentMailHandle, MailQueueError> {
        let composed = self.composer.compose(mail).await?;
        let message_id = format!("<{}@notiflow>", Uuid::now_v7());
        let message = build_message(&composed, &message_id)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailQueueError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        tracing::debug!(
            message_id = %message_id,
            destinations = composed.to.len() + composed.cc.len(),
            "SMTP: メールを送信"
        );
        Ok(SentMailHandle::new(message_id))
    }
}
