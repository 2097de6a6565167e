//! # 通知
//!
//! 送信依頼 1 件分を表す通知レコードと、そのバリデーション・送信状態を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Notification`] | 通知 | 宛先・送信者・コンテンツの指定と送信後の記録 |
//! | [`Channel`] | 通知チャネル | 配送手段。実装済みは `Email` のみ |
//! | [`SenderRef`] | 送信者参照 | 送信元アドレスの導出にだけ使う |
//! | [`DeliveryState`] | 送信状態 | `Unsent` → `Sent`。失敗状態は持たない |
//!
//! ## 設計方針
//!
//! - **コンテンツ指定は排他**: テンプレート名か、件名・本文・HTML 本文のいずれかか。
//!   この整合性は生成時ではなく [`Notification::validate`] で検証する
//! - **宛先は空でもよい**: 呼び出し元が手元のアドレス一覧をそのまま渡せるようにする
//! - **送信記録は再計算**: 成功時に `sent_recipients` を `recipients ++ cc` で上書きする

mod channel;
mod mail;
mod sender;

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::IntoStaticStr;
use thiserror::Error;

pub use self::{
    channel::Channel,
    mail::{MailQueueError, OutgoingMail, SentMailHandle},
    sender::SenderRef,
};
use crate::context::{ContextValue, TemplateContext, normalize_context};

define_uuid_id! {
    /// 通知 ID（一意識別子）
    ///
    /// notifications テーブルの主キー。UUID v7 を使用。
    pub struct NotificationId;
}

/// 通知のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// テンプレート名と生コンテンツの両方が指定されている
    #[error("テンプレート名と件名・本文・HTML 本文を同時に指定することはできません")]
    BothContentSources,

    /// テンプレート名も生コンテンツも指定されていない
    #[error("テンプレート名、件名、本文、HTML 本文のいずれかが必要です")]
    NoContentSource,

    /// テンプレートストアに存在しないテンプレート名
    #[error("メールテンプレートが存在しません: {0}")]
    UnknownTemplate(String),

    /// 未実装のチャネル
    #[error("通知チャネルは 'Email' である必要があります: {0}")]
    UnsupportedChannel(String),
}

/// 通知のドメインエラー
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("バリデーションエラー: {0}")]
    Validation(#[from] ValidationError),

    /// 未実装チャネルのディスパッチ（呼び出し元の不具合）
    #[error("未実装の通知チャネル: {0}")]
    ChannelNotImplemented(String),

    /// テンプレートデータをマッピングとして解釈できない
    #[error("テンプレートデータが不正: {0}")]
    InvalidTemplateData(String),

    /// DB から復元したレコードが不変条件を満たさない
    #[error("通知レコードが不整合: {0}")]
    InconsistentRecord(String),
}

/// 送信状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryState {
    /// 未送信（送信失敗を含む）
    Unsent,
    /// 送信済み（終端）
    Sent,
}

/// 通知
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    id:              NotificationId,
    channel:         Channel,
    sender:          SenderRef,
    from_address:    Option<String>,
    recipients:      Vec<String>,
    cc:              Vec<String>,
    sent_recipients: Vec<String>,
    template_name:   String,
    template_data:   Value,
    subject:         String,
    text_body:       String,
    html_body:       String,
    sent_handle:     Option<SentMailHandle>,
    created_at:      DateTime<Utc>,
    updated_at:      DateTime<Utc>,
}

/// 通知の新規作成パラメータ
///
/// 文字列フィールドは空文字列を「未指定」として扱う。
pub struct NewNotification {
    pub id:            NotificationId,
    pub channel:       Channel,
    pub sender:        SenderRef,
    pub from_address:  Option<String>,
    pub recipients:    Vec<String>,
    pub cc:            Vec<String>,
    pub template_name: String,
    pub template_data: Vec<(String, ContextValue)>,
    pub subject:       String,
    pub text_body:     String,
    pub html_body:     String,
    pub now:           DateTime<Utc>,
}

/// 通知の DB 復元パラメータ
///
/// `template_data` はエンコード済み JSON 文字列のまま保存されている場合がある。
pub struct NotificationRecord {
    pub id:              NotificationId,
    pub channel:         Channel,
    pub sender:          SenderRef,
    pub from_address:    Option<String>,
    pub recipients:      Vec<String>,
    pub cc:              Vec<String>,
    pub sent_recipients: Vec<String>,
    pub template_name:   String,
    pub template_data:   Value,
    pub subject:         String,
    pub text_body:       String,
    pub html_body:       String,
    pub sent_handle:     Option<SentMailHandle>,
    pub created_at:      DateTime<Utc>,
    pub updated_at:      DateTime<Utc>,
}

impl Notification {
    /// 新しい通知を作成する
    ///
    /// テンプレートデータはこの時点でシリアライズ可能な形に正規化される。
    pub fn new(params: NewNotification) -> Self {
        Self {
            id:              params.id,
            channel:         params.channel,
            sender:          params.sender,
            from_address:    params.from_address,
            recipients:      params.recipients,
            cc:              params.cc,
            sent_recipients: Vec::new(),
            template_name:   params.template_name,
            template_data:   Value::Object(normalize_context(params.template_data)),
            subject:         params.subject,
            text_body:       params.text_body,
            html_body:       params.html_body,
            sent_handle:     None,
            created_at:      params.now,
            updated_at:      params.now,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - `NotificationError::InconsistentRecord`: 未送信なのに `sent_recipients` が記録されている
    pub fn from_db(record: NotificationRecord) -> Result<Self, NotificationError> {
        if record.sent_handle.is_none() && !record.sent_recipients.is_empty() {
            return Err(NotificationError::InconsistentRecord(format!(
                "未送信の通知に sent_recipients が記録されています: {}",
                record.id
            )));
        }

        Ok(Self {
            id:              record.id,
            channel:         record.channel,
            sender:          record.sender,
            from_address:    record.from_address,
            recipients:      record.recipients,
            cc:              record.cc,
            sent_recipients: record.sent_recipients,
            template_name:   record.template_name,
            template_data:   record.template_data,
            subject:         record.subject,
            text_body:       record.text_body,
            html_body:       record.html_body,
            sent_handle:     record.sent_handle,
            created_at:      record.created_at,
            updated_at:      record.updated_at,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn sender(&self) -> &SenderRef {
        &self.sender
    }

    pub fn from_address(&self) -> Option<&str> {
        self.from_address.as_deref()
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    pub fn sent_recipients(&self) -> &[String] {
        &self.sent_recipients
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// 保存されている形のままのテンプレートデータ
    pub fn template_data(&self) -> &Value {
        &self.template_data
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn text_body(&self) -> &str {
        &self.text_body
    }

    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    pub fn sent_handle(&self) -> Option<&SentMailHandle> {
        self.sent_handle.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn state(&self) -> DeliveryState {
        if self.sent_handle.is_some() {
            DeliveryState::Sent
        } else {
            DeliveryState::Unsent
        }
    }

    pub fn has_template(&self) -> bool {
        !self.template_name.is_empty()
    }

    pub fn has_raw_content(&self) -> bool {
        !(self.subject.is_empty() && self.text_body.is_empty() && self.html_body.is_empty())
    }

    // ビジネスロジック

    /// 通知を検証する
    ///
    /// チャネルとコンテンツ指定の排他性だけを検証する。宛先の有無や
    /// メールアドレスの形式は検証しない。テンプレートの存在確認はストアを
    /// 参照するため呼び出し側で行う。
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Channel::Unsupported(value) = &self.channel {
            return Err(ValidationError::UnsupportedChannel(value.clone()));
        }

        match (self.has_template(), self.has_raw_content()) {
            (true, true) => Err(ValidationError::BothContentSources),
            (false, false) => Err(ValidationError::NoContentSource),
            _ => Ok(()),
        }
    }

    /// ディスパッチ可能なチャネルか検証する
    ///
    /// # Errors
    ///
    /// - `NotificationError::ChannelNotImplemented`: `Email` 以外のチャネル
    pub fn ensure_dispatchable(&self) -> Result<(), NotificationError> {
        match &self.channel {
            Channel::Email => Ok(()),
            Channel::Unsupported(value) => {
                Err(NotificationError::ChannelNotImplemented(value.clone()))
            }
        }
    }

    /// テンプレートデータをマッピングとして取り出す
    ///
    /// エンコード済み JSON 文字列で保存されている場合はデコードする。
    /// 未設定（null）は空のマッピングとして扱う。
    pub fn context(&self) -> Result<TemplateContext, NotificationError> {
        match &self.template_data {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(TemplateContext::new()),
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(Value::Null) => Ok(TemplateContext::new()),
                Ok(other) => Err(NotificationError::InvalidTemplateData(format!(
                    "マッピングではありません: {other}"
                ))),
                Err(e) => Err(NotificationError::InvalidTemplateData(e.to_string())),
            },
            other => Err(NotificationError::InvalidTemplateData(format!(
                "マッピングではありません: {other}"
            ))),
        }
    }

    /// メールキューへの送信依頼を組み立てる
    pub fn to_outgoing_mail(&self, sender: String, context: TemplateContext) -> OutgoingMail {
        OutgoingMail {
            recipients:    self.recipients.clone(),
            cc:            self.cc.clone(),
            sender,
            template_name: self.template_name.clone(),
            context,
            subject:       self.subject.clone(),
            text_body:     self.text_body.clone(),
            html_body:     self.html_body.clone(),
        }
    }

    /// 送信成功を記録する
    ///
    /// `sent_recipients` は `recipients ++ cc` で置き換える（重複はそのまま残す）。
    pub fn mark_sent(&mut self, handle: SentMailHandle, now: DateTime<Utc>) {
        self.sent_recipients = self.recipients.iter().chain(&self.cc).cloned().collect();
        self.sent_handle = Some(handle);
        self.updated_at = now;
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Notification from {}: {}",
            self.channel, self.sender, self.template_data
        )
    }
}
