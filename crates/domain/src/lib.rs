//! # Notiflow ドメイン層
//!
//! 通知ディスパッチの中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: [`notification::Notification`]（送信依頼 1 件分の記録）
//! - **値オブジェクト**: [`notification::Channel`], [`notification::SenderRef`],
//!   [`email_template::TemplatePrefix`]
//! - **ドメインエラー**: [`notification::ValidationError`] などビジネスルール違反を表現する型
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//! ```
//!
//! ドメイン層は DB・テンプレートエンジン・SMTP など外部システムに一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`notification`] - 通知レコード、チャネル、送信者参照、メールキューとの境界型
//! - [`email_template`] - テンプレートストアに保存されるメールテンプレート
//! - [`context`] - レンダリングコンテキストのシリアライズ可能な形への正規化

#[macro_use]
mod macros;

pub mod context;
pub mod email_template;
pub mod notification;
