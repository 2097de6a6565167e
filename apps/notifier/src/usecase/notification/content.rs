//! 件名・本文の解決

use notiflow_domain::context::TemplateContext;
use notiflow_infra::{TemplateError, TemplateRenderer};

/// 件名・本文・HTML 本文それぞれの指定
///
/// 生コンテンツとファイルテンプレート名の両方を指定した場合は生コンテンツが使われる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSource {
    pub content:  String,
    pub filename: String,
}

impl ContentSource {
    /// 生コンテンツ
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            content:  content.into(),
            filename: String::new(),
        }
    }

    /// テンプレートディレクトリ内のファイル
    pub fn file(filename: impl Into<String>) -> Self {
        Self {
            content:  String::new(),
            filename: filename.into(),
        }
    }

    pub async fn resolve(
        &self,
        renderer: &TemplateRenderer,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        resolve_content(renderer, &self.content, &self.filename, context).await
    }
}

/// コンテンツを解決する
///
/// 1. `content` が空でなければそのまま返す（レンダリングしない）
/// 2. `filename` が空でなければそのファイルをレンダリングして返す
/// 3. どちらも空なら空文字列
pub async fn resolve_content(
    renderer: &TemplateRenderer,
    content: &str,
    filename: &str,
    context: &TemplateContext,
) -> Result<String, TemplateError> {
    if !content.is_empty() {
        return Ok(content.to_string());
    }
    if !filename.is_empty() {
        return renderer.render_file(filename, context).await;
    }
    Ok(String::new())
}

/// 各行の先頭の空白を取り除き、CRLF で連結する
pub fn strip_text(text: &str) -> String {
    text.lines()
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\r\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use notiflow_domain::email_template::TemplatePrefix;
    use notiflow_infra::{mock::InMemoryEmailTemplateRepository, template::EmailTemplateLoader};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn make_renderer(template_dir: &std::path::Path) -> TemplateRenderer {
        let loader = EmailTemplateLoader::new(
            Arc::new(InMemoryEmailTemplateRepository::new()),
            TemplatePrefix::default(),
        );
        TemplateRenderer::new(loader, template_dir).unwrap()
    }

    fn context() -> TemplateContext {
        let mut context = TemplateContext::new();
        context.insert("name".to_string(), json!("Ann"));
        context
    }

    #[tokio::test]
    async fn test_生コンテンツはファイル指定より優先される() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("subject.txt"), "From file {{ name }}").unwrap();
        let renderer = make_renderer(dir.path());

        for filename in ["subject.txt", "missing.txt", ""] {
            let resolved = resolve_content(&renderer, "X {{ name }}", filename, &context())
                .await
                .unwrap();
            assert_eq!(resolved, "X {{ name }}");
        }
    }

    #[tokio::test]
    async fn test_生コンテンツが空ならファイルをレンダリングする() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("subject.txt"), "Hello {{ name }}").unwrap();
        let renderer = make_renderer(dir.path());

        let resolved = ContentSource::file("subject.txt")
            .resolve(&renderer, &context())
            .await
            .unwrap();

        assert_eq!(resolved, "Hello Ann");
    }

    #[tokio::test]
    async fn test_どちらも空なら空文字列() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = make_renderer(dir.path());

        let resolved = ContentSource::default()
            .resolve(&renderer, &context())
            .await
            .unwrap();

        assert_eq!(resolved, "");
    }

    #[tokio::test]
    async fn test_存在しないファイルはエラーになる() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = make_renderer(dir.path());

        let result = resolve_content(&renderer, "", "missing.txt", &context()).await;

        assert!(matches!(result, Err(TemplateError::TemplateDoesNotExist(_))));
    }

    #[rstest]
    #[case("  Dear Ann,\n    Welcome.\n", "Dear Ann,\r\nWelcome.")]
    #[case("one\r\n\ttwo", "one\r\ntwo")]
    #[case("", "")]
    #[case("no indent", "no indent")]
    fn test_strip_textは行頭の空白を除きcrlfで連結する(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(strip_text(input), expected);
    }
}
