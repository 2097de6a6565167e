//! # リポジトリ実装
//!
//! 通知レコードとメールテンプレートの永続化を提供する。
//!
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod email_template_repository;
pub mod notification_repository;

pub use email_template_repository::{EmailTemplateRepository, PostgresEmailTemplateRepository};
pub use notification_repository::{NotificationRepository, PostgresNotificationRepository};
