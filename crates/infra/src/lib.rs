//! # Notiflow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **リポジトリ実装**: 通知レコードとメールテンプレートの永続化
//! - **テンプレート**: tera によるレンダリングと、テンプレートストアを参照するローダー
//! - **メールキュー**: SMTP / SES / Noop の送信アダプタ
//!
//! ## 依存関係
//!
//! ```text
//! notifier → infra → domain
//!     ↘        ↓
//!       shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`template`] - テンプレートのロードとレンダリング
//! - [`mail_queue`] - メールキュー（送信アダプタ）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use notiflow_infra::{db, repository::PostgresNotificationRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/notiflow").await?;
//!     let repository = PostgresNotificationRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod mail_queue;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;
pub mod template;

pub use error::InfraError;
pub use mail_queue::MailQueue;
pub use template::{TemplateError, TemplateRenderer};
