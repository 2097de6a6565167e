//! # Notiflow Notifier
//!
//! 通知レコードの作成・検証・ディスパッチを行うユースケース層。
//!
//! ## モジュール構成
//!
//! - [`config`] - 環境変数からの設定読み込み
//! - [`bootstrap`] - 設定から依存コンポーネントを組み立てる
//! - [`usecase`] - 通知のバリデーション・ディスパッチ・送信ヘルパー
//! - [`error`] - ユースケース層のエラー定義
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `ses` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` | No | SMTP ホスト（デフォルト: `localhost`） |
//! | `SMTP_PORT` | No | SMTP ポート（デフォルト: `1025`） |
//! | `DEFAULT_FROM_EMAIL` | No | 既定の送信元アドレス（デフォルト: `webmaster@localhost`） |
//! | `EMAIL_TEMPLATE_PREFIX` | No | ストアテンプレートのプレフィックス（デフォルト: `email-templates/`） |
//! | `NOTIFICATION_TEMPLATE_DIR` | No | ファイルテンプレートのディレクトリ（デフォルト: `templates`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod usecase;

pub use config::NotifierConfig;
pub use error::NotifierError;
pub use usecase::NotificationService;
