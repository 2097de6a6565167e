//! メールキューとの境界型
//!
//! ディスパッチがメールキューに渡す送信依頼と、メールキューから返る
//! ハンドル・エラーを定義する。

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::TemplateContext;

/// メールキューへの送信依頼
///
/// `template_name` が空でない場合、件名・本文はメールキュー側でストアのテンプレートから
/// レンダリングされる。空の場合は `subject` / `text_body` / `html_body` 自体がテンプレートとして
/// `context` でレンダリングされる。
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub recipients:    Vec<String>,
    pub cc:            Vec<String>,
    pub sender:        String,
    pub template_name: String,
    pub context:       TemplateContext,
    pub subject:       String,
    pub text_body:     String,
    pub html_body:     String,
}

impl OutgoingMail {
    pub fn uses_template(&self) -> bool {
        !self.template_name.is_empty()
    }

    /// to と cc を合わせた宛先数
    pub fn destination_count(&self) -> usize {
        self.recipients.len() + self.cc.len()
    }
}

/// 送信済みメールへの不透明なハンドル
///
/// メールキューが発行した識別子。中身の解釈はメールキュー側にしかできない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct SentMailHandle(String);

impl SentMailHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// メールキューのエラー
///
/// いずれも配送側の失敗として扱われ、ディスパッチはログに記録して握りつぶす。
#[derive(Debug, Error)]
pub enum MailQueueError {
    /// to / cc のどちらにも宛先がない
    #[error("宛先が指定されていません")]
    NoRecipients,

    /// メールアドレスとして解釈できない
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),

    /// テンプレートストアに存在しない
    #[error("メールテンプレートが存在しません: {0}")]
    TemplateNotFound(String),

    #[error("テンプレートのレンダリングに失敗: {0}")]
    TemplateFailed(String),

    #[error("テンプレートストアの参照に失敗: {0}")]
    TemplateStore(String),

    #[error("メッセージの構築に失敗: {0}")]
    MessageBuild(String),

    /// SMTP / SES など配送先での失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),
}
