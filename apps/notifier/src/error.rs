//! # Notifier エラー定義
//!
//! 呼び出し元に返すエラー。メール送信の失敗はここに含まれない
//! （ディスパッチがログに記録して握りつぶすため）。

use notiflow_domain::notification::{NotificationError, ValidationError};
use notiflow_infra::{InfraError, TemplateError};
use thiserror::Error;

/// Notifier で発生するエラー
#[derive(Debug, Error)]
pub enum NotifierError {
    /// 通知のバリデーション失敗
    #[error("バリデーションエラー: {0}")]
    Validation(#[from] ValidationError),

    /// 未実装チャネルのディスパッチ、テンプレートデータの不正など
    #[error(transparent)]
    Domain(#[from] NotificationError),

    /// ファイルテンプレートのレンダリング失敗
    #[error("テンプレートエラー: {0}")]
    Template(#[from] TemplateError),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),
}

impl NotifierError {
    /// バリデーションエラーなら中身を返す
    ///
    /// ドメイン層のエラーにくるまれたバリデーションエラーも対象にする。
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) | Self::Domain(NotificationError::Validation(e)) => Some(e),
            _ => None,
        }
    }
}
