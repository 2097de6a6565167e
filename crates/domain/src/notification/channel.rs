//! 通知チャネル

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// 通知チャネル
///
/// 実装済みのチャネルは `Email` のみ。DB や呼び出し元から渡された未知の値は
/// [`Channel::Unsupported`] として保持し、バリデーションとディスパッチで拒否する。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Channel {
    #[default]
    Email,
    Unsupported(String),
}

impl Channel {
    pub const EMAIL: &'static str = "Email";

    pub fn as_str(&self) -> &str {
        match self {
            Self::Email => Self::EMAIL,
            Self::Unsupported(value) => value,
        }
    }
}

impl FromStr for Channel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            Self::EMAIL => Self::Email,
            other => Self::Unsupported(other.to_string()),
        })
    }
}

impl From<String> for Channel {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::EMAIL => Self::Email,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Email => Channel::EMAIL.to_string(),
            Channel::Unsupported(value) => value,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
