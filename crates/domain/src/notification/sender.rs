//! 送信者参照

use std::fmt;

use serde::{Deserialize, Serialize};

/// 通知の送信者参照
///
/// 任意のエンティティを指せるが、ディスパッチで参照されるのは
/// 「メールアドレスを持つユーザーかどうか」だけ。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SenderRef {
    /// 送信者なし
    #[default]
    None,
    /// ユーザー
    User { id: String, email: String },
    /// ユーザー以外のエンティティ（型タグ + ID）
    Other { entity_type: String, id: String },
}

impl SenderRef {
    pub fn user(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self::User {
            id:    id.into(),
            email: email.into(),
        }
    }

    pub fn other(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Other {
            entity_type: entity_type.into(),
            id:          id.into(),
        }
    }

    /// 送信元として使えるメールアドレス
    ///
    /// メールアドレスが空でないユーザーのときだけ `Some`。
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::User { email, .. } if !email.is_empty() => Some(email),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// 永続化用の型タグ
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::User { .. } => Some("user"),
            Self::Other { entity_type, .. } => Some(entity_type),
        }
    }

    /// 永続化用の ID
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::User { id, .. } | Self::Other { id, .. } => Some(id),
        }
    }
}

impl fmt::Display for SenderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::User { email, .. } => f.write_str(email),
            Self::Other { entity_type, id } => write!(f, "{entity_type}#{id}"),
        }
    }
}
