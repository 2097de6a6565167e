//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンでメールの件名・本文・HTML 本文を生成する。
//!
//! ## 設計方針
//!
//! - **参照テンプレートの事前解決**: `extends` / `include` / `import` で参照される
//!   テンプレートを再帰的に集めてから tera に登録する
//! - **2 種類の参照先**: プレフィックス付きの名前は [`EmailTemplateLoader`] 経由で
//!   テンプレートストアから、それ以外はテンプレートディレクトリのファイルから読む
//! - **レンダリングごとに登録**: ストアの内容は実行時に変わるため、エンジンは
//!   レンダリングのたびに組み立てる
//! - **HTML パートだけエスケープ**: HTML 本文は `.html` 付きの名前で登録し、tera の
//!   自動エスケープを効かせる。件名とテキスト本文はエスケープしない
//!
//! 参照の収集はテキスト走査で行う。`{# ... #}` コメントと `{% raw %}` ブロックの中は
//! 走査対象から除くが、`{% if %}` などで到達しない分岐の参照は読み込まれる。

mod loader;

use std::{
    collections::{HashSet, VecDeque},
    error::Error as _,
    path::{Path, PathBuf},
};

use notiflow_domain::{
    context::TemplateContext,
    email_template::{EmailTemplate, TemplatePrefix},
};
use regex::Regex;
use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;

pub use self::loader::{EmailTemplateLoader, TemplateOrigin};
use crate::error::InfraError;

/// テンプレートのロード・レンダリングエラー
#[derive(Debug, Error)]
pub enum TemplateError {
    /// 参照されたテンプレートが見つからない
    #[error("テンプレートが存在しません: {0}")]
    TemplateDoesNotExist(String),

    /// テンプレートストアの参照に失敗した
    #[error("テンプレートストアの参照に失敗: {0}")]
    Store(#[from] InfraError),

    /// テンプレートファイルの読み込みに失敗した
    #[error("テンプレートファイルの読み込みに失敗: {path}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 構文エラー、未定義変数など
    #[error("テンプレートのレンダリングに失敗: {0}")]
    Render(String),
}

impl From<tera::Error> for TemplateError {
    fn from(error: tera::Error) -> Self {
        // tera のエラーメッセージは原因をチェーンの奥に持つため連結する
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Render(message)
    }
}

/// ストアテンプレートのレンダリング結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedEmail {
    pub subject:   String,
    pub text_body: String,
    pub html_body: String,
}

/// テンプレートレンダラー
#[derive(Clone)]
pub struct TemplateRenderer {
    loader:       EmailTemplateLoader,
    template_dir: PathBuf,
    reference:    Regex,
    inert:        Regex,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// # 引数
    ///
    /// - `loader`: テンプレートストアを参照するローダー
    /// - `template_dir`: ファイルテンプレートの置き場所
    pub fn new(
        loader: EmailTemplateLoader,
        template_dir: impl Into<PathBuf>,
    ) -> Result<Self, TemplateError> {
        let reference = Regex::new(r#"\{%-?\s*(?:extends|include|import)\s+["']([^"']+)["']"#)
            .map_err(|e| TemplateError::Render(e.to_string()))?;
        let inert = Regex::new(
            r"(?s)\{#.*?#\}|\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}",
        )
        .map_err(|e| TemplateError::Render(e.to_string()))?;

        Ok(Self {
            loader,
            template_dir: template_dir.into(),
            reference,
            inert,
        })
    }

    pub fn loader(&self) -> &EmailTemplateLoader {
        &self.loader
    }

    pub fn prefix(&self) -> &TemplatePrefix {
        self.loader.prefix()
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// テンプレートソースをレンダリングする
    ///
    /// `name` はソース自身の登録名。ソースから参照されるテンプレートは
    /// 事前にすべて読み込まれる。
    #[tracing::instrument(skip(self, source, context), level = "debug")]
    pub async fn render_source(
        &self,
        name: &str,
        source: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let mut templates = vec![(name.to_string(), source.to_string())];
        let mut visited = HashSet::from([name.to_string()]);
        let mut pending = VecDeque::from(self.references(source));

        while let Some(reference) = pending.pop_front() {
            if !visited.insert(reference.clone()) {
                continue;
            }
            let content = self.load(&reference).await?;
            pending.extend(self.references(&content));
            templates.push((reference, content));
        }

        let mut engine = Tera::default();
        engine.add_raw_templates(templates)?;

        let context = Context::from_value(Value::Object(context.clone()))?;
        Ok(engine.render(name, &context)?)
    }

    /// テンプレートディレクトリのファイルをレンダリングする
    pub async fn render_file(
        &self,
        filename: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let source = self.read_file(filename).await?;
        self.render_source(filename, &source, context).await
    }

    /// ストアテンプレートの件名・本文・HTML 本文をレンダリングする
    ///
    /// 空のパートはレンダリングせず空文字列のまま返す。
    pub async fn render_email_template(
        &self,
        template: &EmailTemplate,
        context: &TemplateContext,
    ) -> Result<RenderedEmail, TemplateError> {
        let name = self.prefix().qualify(&template.name);
        self.render_parts(
            &name,
            &template.subject,
            &template.content,
            &template.html_content,
            context,
        )
        .await
    }

    /// 件名・本文・HTML 本文をそれぞれテンプレートとしてレンダリングする
    ///
    /// `name` は各パートの登録名の元になる。HTML 本文だけが `{name}.html` として
    /// 登録され、コンテキストの値がエスケープされる。空のパートは空文字列のまま。
    pub async fn render_parts(
        &self,
        name: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
        context: &TemplateContext,
    ) -> Result<RenderedEmail, TemplateError> {
        Ok(RenderedEmail {
            subject:   self
                .render_part(&format!("{name}#subject"), subject, context)
                .await?,
            text_body: self
                .render_part(&format!("{name}#content"), text_body, context)
                .await?,
            html_body: self
                .render_part(&format!("{name}.html"), html_body, context)
                .await?,
        })
    }

    async fn render_part(
        &self,
        name: &str,
        source: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        if source.is_empty() {
            return Ok(String::new());
        }
        self.render_source(name, source, context).await
    }

    /// コメントと raw ブロックを除いた部分から参照先の名前を集める
    fn references(&self, source: &str) -> Vec<String> {
        let scanned = self.inert.replace_all(source, "");
        self.reference
            .captures_iter(&scanned)
            .filter_map(|captures| captures.get(1))
            .map(|name| name.as_str().to_string())
            .collect()
    }

    async fn load(&self, template_name: &str) -> Result<String, TemplateError> {
        if self.loader.template_sources(template_name).is_some() {
            let (content, _) = self.loader.load_template_source(template_name).await?;
            return Ok(content);
        }
        self.read_file(template_name).await
    }

    async fn read_file(&self, filename: &str) -> Result<String, TemplateError> {
        let path = self.template_dir.join(filename);
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TemplateError::TemplateDoesNotExist(filename.to_string()))
            }
            Err(source) => Err(TemplateError::Io { path, source }),
        }
    }
}
