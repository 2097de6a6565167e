//! # 通知ユースケース
//!
//! 通知レコードの作成・検証・ディスパッチと、それらをまとめた送信ヘルパーを提供する。
//!
//! ## モジュール構成
//!
//! - [`content`] - 件名・本文の解決（生コンテンツ優先、次にファイルテンプレート）
//! - [`sender`] - 送信元アドレスの解決
//! - [`request`] - 送信ヘルパーの入力
//! - [`service`] - バリデーション・ディスパッチ・送信ヘルパー

pub mod content;
pub mod request;
pub mod sender;
pub mod service;

pub use content::{ContentSource, resolve_content, strip_text};
pub use request::{ContentNotificationRequest, Recipients, TemplateNotificationRequest};
pub use sender::resolve_from_address;
pub use service::NotificationService;
