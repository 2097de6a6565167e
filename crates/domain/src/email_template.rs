//! # メールテンプレート
//!
//! テンプレートストアに保存される名前付きメールテンプレートと、
//! テンプレート参照の名前空間（プレフィックス）を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`EmailTemplate`] | メールテンプレート | 件名・本文・HTML 本文のテンプレートソース |
//! | [`TemplatePrefix`] | テンプレートプレフィックス | ストア上のテンプレートを参照するときの名前空間 |
//!
//! テンプレート同士は `{% extends "email-templates/base" %}` のように
//! プレフィックス付きの名前で参照し合う。

use serde::{Deserialize, Serialize};

/// テンプレートプレフィックスの既定値
pub const DEFAULT_TEMPLATE_PREFIX: &str = "email-templates/";

/// メールテンプレート
///
/// `name` はストア内で一意。`html_content` は他のストアテンプレートを
/// 継承元として参照できる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub name:         String,
    pub description:  String,
    pub subject:      String,
    pub content:      String,
    pub html_content: String,
}

impl EmailTemplate {
    /// HTML 本文だけを持つテンプレートを作成する
    ///
    /// 継承元として使う base テンプレートの登録に使う。
    pub fn html(name: impl Into<String>, html_content: impl Into<String>) -> Self {
        Self {
            name:         name.into(),
            description:  String::new(),
            subject:      String::new(),
            content:      String::new(),
            html_content: html_content.into(),
        }
    }
}

/// テンプレートプレフィックス
///
/// テンプレートエンジンに渡される名前のうち、このプレフィックスで始まるものだけが
/// テンプレートストアから読み込まれる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePrefix(String);

impl TemplatePrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// プレフィックスを取り除いたストア上の名前を返す
    ///
    /// プレフィックスで始まらない名前は `None`。
    pub fn strip<'a>(&self, template_name: &'a str) -> Option<&'a str> {
        template_name.strip_prefix(self.0.as_str())
    }

    /// ストア上の名前にプレフィックスを付ける
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{name}", self.0)
    }
}

impl Default for TemplatePrefix {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_PREFIX)
    }
}
