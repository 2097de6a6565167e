//! # Notifier 設定
//!
//! 環境変数から通知ディスパッチの設定を読み込む。
//! 不正な値は起動時に [`ConfigError`] として報告する。

use std::{env, path::PathBuf, str::FromStr};

use notiflow_domain::email_template::{DEFAULT_TEMPLATE_PREFIX, TemplatePrefix};
use strum::{Display, EnumString};
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value:?}（{reason}）")]
    Invalid {
        name:   &'static str,
        value:  String,
        reason: String,
    },
}

/// 送信バックエンド
///
/// - `smtp`: Mailpit（開発）/ SMTP サーバー経由で送信
/// - `ses`: Amazon SES v2 経由で送信（本番）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationBackend {
    Smtp,
    Ses,
    #[default]
    Noop,
}

/// Notifier の設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// データベース接続 URL
    pub database_url: String,
    /// 通知設定
    pub notification: NotificationConfig,
}

/// 通知機能の設定
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub backend:            NotificationBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:          String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:          u16,
    /// 送信者・送信元アドレスのどちらも指定されない場合の送信元
    pub default_from_email: String,
    pub template_prefix:    TemplatePrefix,
    /// ファイルテンプレートのディレクトリ
    pub template_dir:       PathBuf,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            notification: NotificationConfig::from_lookup(&lookup)?,
        })
    }
}

impl NotificationConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            backend:            parse(lookup, "NOTIFICATION_BACKEND")?.unwrap_or_default(),
            smtp_host:          or_default("SMTP_HOST", "localhost"),
            smtp_port:          parse(lookup, "SMTP_PORT")?.unwrap_or(1025),
            default_from_email: or_default("DEFAULT_FROM_EMAIL", "webmaster@localhost"),
            template_prefix:    TemplatePrefix::new(or_default(
                "EMAIL_TEMPLATE_PREFIX",
                DEFAULT_TEMPLATE_PREFIX,
            )),
            template_dir:       PathBuf::from(or_default("NOTIFICATION_TEMPLATE_DIR", "templates")),
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_未設定の項目はデフォルト値になる() {
        let config =
            NotifierConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/n")]))
                .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/n");
        assert_eq!(config.notification.backend, NotificationBackend::Noop);
        assert_eq!(config.notification.smtp_host, "localhost");
        assert_eq!(config.notification.smtp_port, 1025);
        assert_eq!(config.notification.default_from_email, "webmaster@localhost");
        assert_eq!(config.notification.template_prefix, TemplatePrefix::default());
        assert_eq!(config.notification.template_dir, PathBuf::from("templates"));
    }

    #[test]
    fn test_環境変数の値で上書きできる() {
        let config = NotifierConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/n"),
            ("NOTIFICATION_BACKEND", "smtp"),
            ("SMTP_HOST", "mailpit"),
            ("SMTP_PORT", "2525"),
            ("DEFAULT_FROM_EMAIL", "noreply@example.com"),
            ("EMAIL_TEMPLATE_PREFIX", "mail/"),
        ]))
        .unwrap();

        assert_eq!(config.notification.backend, NotificationBackend::Smtp);
        assert_eq!(config.notification.smtp_host, "mailpit");
        assert_eq!(config.notification.smtp_port, 2525);
        assert_eq!(config.notification.default_from_email, "noreply@example.com");
        assert_eq!(config.notification.template_prefix.as_str(), "mail/");
    }

    #[test]
    fn test_database_urlがなければmissingになる() {
        let result = NotifierConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_不正な値はinvalidになる() {
        let result = NotifierConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/n"),
            ("SMTP_PORT", "not-a-port"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "SMTP_PORT", .. })
        ));

        let result = NotifierConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/n"),
            ("NOTIFICATION_BACKEND", "sms"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "NOTIFICATION_BACKEND", .. })
        ));
    }
}
