//! 送信ヘルパーの入力

use notiflow_domain::{context::ContextValue, notification::SenderRef};

use super::ContentSource;

/// 宛先リスト
///
/// 単一のアドレスとリストのどちらからでも作成できる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Self(addresses.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(addresses: [&str; N]) -> Self {
        Self(addresses.into_iter().map(str::to_string).collect())
    }
}

/// 件名・本文を生コンテンツまたはファイルテンプレートで指定する送信依頼
#[derive(Debug, Clone, Default)]
pub struct ContentNotificationRequest {
    pub recipients:   Recipients,
    pub cc:           Vec<String>,
    pub sender:       SenderRef,
    /// 空文字列は未指定
    pub from_address: String,
    pub context:      Vec<(String, ContextValue)>,
    pub subject:      ContentSource,
    pub content:      ContentSource,
    pub html_content: ContentSource,
}

/// テンプレートストアのテンプレートで送信する依頼
#[derive(Debug, Clone, Default)]
pub struct TemplateNotificationRequest {
    pub recipients:    Recipients,
    pub cc:            Vec<String>,
    pub sender:        SenderRef,
    /// 空文字列は未指定
    pub from_address:  String,
    pub template_name: String,
    pub context:       Vec<(String, ContextValue)>,
    /// 作成・保存だけ行い、ディスパッチしない
    pub send_disabled: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_単一アドレスは1件のリストになる() {
        assert_eq!(Recipients::from("a@x.com").into_vec(), ["a@x.com"]);
        assert_eq!(
            Recipients::from(["a@x.com", "b@x.com"]).as_slice(),
            ["a@x.com", "b@x.com"]
        );
        assert!(Recipients::from(Vec::<String>::new()).as_slice().is_empty());
    }
}
