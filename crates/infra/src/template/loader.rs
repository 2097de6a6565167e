//! テンプレートストアを参照するテンプレートローダー
//!
//! プレフィックス付きの名前（例: `email-templates/base`）だけを受け付け、
//! プレフィックスを取り除いた名前でテンプレートストアを引く。

use std::sync::Arc;

use notiflow_domain::email_template::TemplatePrefix;

use super::TemplateError;
use crate::repository::EmailTemplateRepository;

/// ローダーが解決したテンプレートの出自
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOrigin {
    /// ストア上の名前（プレフィックスなし）
    pub name:          String,
    /// テンプレートエンジンに渡された名前（プレフィックス付き）
    pub template_name: String,
}

/// テンプレートストアを参照するローダー
#[derive(Clone)]
pub struct EmailTemplateLoader {
    store:  Arc<dyn EmailTemplateRepository>,
    prefix: TemplatePrefix,
}

impl EmailTemplateLoader {
    pub fn new(store: Arc<dyn EmailTemplateRepository>, prefix: TemplatePrefix) -> Self {
        Self { store, prefix }
    }

    pub fn prefix(&self) -> &TemplatePrefix {
        &self.prefix
    }

    pub fn store(&self) -> &Arc<dyn EmailTemplateRepository> {
        &self.store
    }

    /// このローダーが扱う名前なら出自を返す
    ///
    /// プレフィックスで始まらない名前は `None`（他のローダーに任せる）。
    pub fn template_sources(&self, template_name: &str) -> Option<TemplateOrigin> {
        self.prefix.strip(template_name).map(|name| TemplateOrigin {
            name:          name.to_string(),
            template_name: template_name.to_string(),
        })
    }

    /// テンプレートソースを読み込む
    ///
    /// 戻り値は `(HTML 本文, ストア上の名前)`。
    ///
    /// # Errors
    ///
    /// - `TemplateError::TemplateDoesNotExist`: プレフィックスで始まらない、またはストアに存在しない
    /// - `TemplateError::Store`: ストアの参照に失敗した
    pub async fn load_template_source(
        &self,
        template_name: &str,
    ) -> Result<(String, String), TemplateError> {
        let not_found = || TemplateError::TemplateDoesNotExist(template_name.to_string());

        let origin = self.template_sources(template_name).ok_or_else(not_found)?;
        let content = self.contents(&origin).await?.ok_or_else(not_found)?;

        Ok((content, origin.name))
    }

    /// 出自が指すテンプレートの HTML 本文
    ///
    /// ストアに存在しなければ `None`。
    pub async fn contents(&self, origin: &TemplateOrigin) -> Result<Option<String>, TemplateError> {
        let template = self.store.find_by_name(&origin.name).await?;
        Ok(template.map(|template| template.html_content))
    }
}

#[cfg(test)]
mod tests {
    use notiflow_domain::email_template::EmailTemplate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::InMemoryEmailTemplateRepository;

    fn make_loader() -> EmailTemplateLoader {
        let store = InMemoryEmailTemplateRepository::new();
        store.add(EmailTemplate::html("template1", "<h1>Template1</h1>"));
        EmailTemplateLoader::new(Arc::new(store), TemplatePrefix::default())
    }

    #[test]
    fn test_プレフィックスのない名前は扱わない() {
        let loader = make_loader();
        assert_eq!(loader.template_sources("wrong/template1"), None);
    }

    #[test]
    fn test_プレフィックスを取り除いた名前を出自にする() {
        let loader = make_loader();
        assert_eq!(
            loader.template_sources("email-templates/template1"),
            Some(TemplateOrigin {
                name:          "template1".to_string(),
                template_name: "email-templates/template1".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_ストアのhtml本文とストア上の名前を返す() {
        let loader = make_loader();

        let (content, name) = loader
            .load_template_source("email-templates/template1")
            .await
            .unwrap();

        assert_eq!(content, "<h1>Template1</h1>");
        assert_eq!(name, "template1");
    }

    #[tokio::test]
    async fn test_存在しないテンプレートはtemplate_does_not_existになる() {
        let loader = make_loader();

        for name in ["email-templates/missing", "wrong/template1"] {
            let result = loader.load_template_source(name).await;
            assert!(
                matches!(&result, Err(TemplateError::TemplateDoesNotExist(n)) if n == name),
                "{name}: {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_contentsは存在しなければnoneを返す() {
        let loader = make_loader();
        let origin = TemplateOrigin {
            name:          "missing".to_string(),
            template_name: "email-templates/missing".to_string(),
        };

        assert_eq!(loader.contents(&origin).await.unwrap(), None);
    }
}
