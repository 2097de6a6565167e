//! # EmailTemplateRepository
//!
//! テンプレートストア。名前付きメールテンプレートの参照と登録を担当する。
//!
//! 登録（`upsert`）はテンプレート定義の同期処理から使われる。通知の送信経路は
//! 参照（`exists` / `find_by_name`）だけを使う。

use async_trait::async_trait;
use notiflow_domain::email_template::EmailTemplate;
use sqlx::PgPool;

use crate::error::InfraError;

/// テンプレートストアトレイト
#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// 指定した名前のテンプレートが存在するか
    async fn exists(&self, name: &str) -> Result<bool, InfraError>;

    /// 名前でテンプレートを取得する
    async fn find_by_name(&self, name: &str) -> Result<Option<EmailTemplate>, InfraError>;

    /// テンプレートを登録する（同名があれば置き換える）
    async fn upsert(&self, template: &EmailTemplate) -> Result<(), InfraError>;
}

#[derive(sqlx::FromRow)]
struct EmailTemplateRow {
    name:         String,
    description:  String,
    subject:      String,
    content:      String,
    html_content: String,
}

impl From<EmailTemplateRow> for EmailTemplate {
    fn from(row: EmailTemplateRow) -> Self {
        Self {
            name:         row.name,
            description:  row.description,
            subject:      row.subject,
            content:      row.content,
            html_content: row.html_content,
        }
    }
}

/// PostgreSQL 実装の EmailTemplateRepository
#[derive(Debug, Clone)]
pub struct PostgresEmailTemplateRepository {
    pool: PgPool,
}

impl PostgresEmailTemplateRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTemplateRepository for PostgresEmailTemplateRepository {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn exists(&self, name: &str) -> Result<bool, InfraError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM email_templates WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn find_by_name(&self, name: &str) -> Result<Option<EmailTemplate>, InfraError> {
        let row = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            SELECT name, description, subject, content, html_content
            FROM email_templates
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailTemplate::from))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(name = %template.name))]
    async fn upsert(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO email_templates (name, description, subject, content, html_content)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET
                description = EXCLUDED.description,
                subject = EXCLUDED.subject,
                content = EXCLUDED.content,
                html_content = EXCLUDED.html_content,
                updated_at = NOW()
            "#,
        )
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.subject)
        .bind(&template.content)
        .bind(&template.html_content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn EmailTemplateRepository>>();
    }
}
