//! # 起動処理
//!
//! 通知ディスパッチを組み込むプロセスの初期化と依存コンポーネントの組み立て。
//!
//! ```rust,ignore
//! let config = notiflow_notifier::bootstrap::init("notifier")?;
//! let service = notiflow_notifier::bootstrap::build_notification_service(&config).await?;
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use notiflow_infra::{
    MailQueue,
    TemplateRenderer,
    db,
    mail_queue::{MailComposer, NoopMailQueue, SesMailQueue, SmtpMailQueue},
    repository::{
        EmailTemplateRepository,
        PostgresEmailTemplateRepository,
        PostgresNotificationRepository,
    },
    template::EmailTemplateLoader,
};
use notiflow_shared::observability::{LogFormat, init_tracing};

use crate::{
    NotificationService,
    config::{NotificationBackend, NotificationConfig, NotifierConfig},
};

/// `.env` の読み込み、トレーシング初期化、設定読み込みを行う
pub fn init(service_name: &str) -> anyhow::Result<NotifierConfig> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(service_name, LogFormat::from_env());

    let config = NotifierConfig::from_env().context("設定の読み込みに失敗しました")?;
    tracing::info!(
        backend = %config.notification.backend,
        template_dir = %config.notification.template_dir.display(),
        "通知設定を読み込みました"
    );

    Ok(config)
}

/// 設定に応じたメールキューを作成する
pub async fn build_mail_queue(
    config: &NotificationConfig,
    composer: MailComposer,
) -> Arc<dyn MailQueue> {
    match config.backend {
        NotificationBackend::Smtp => {
            tracing::info!(
                host = %config.smtp_host,
                port = config.smtp_port,
                "SMTP メールキューを使用します"
            );
            Arc::new(SmtpMailQueue::new(
                &config.smtp_host,
                config.smtp_port,
                composer,
            ))
        }
        NotificationBackend::Ses => {
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            tracing::info!("SES メールキューを使用します");
            Arc::new(SesMailQueue::new(
                aws_sdk_sesv2::Client::new(&aws_config),
                composer,
            ))
        }
        NotificationBackend::Noop => {
            tracing::info!("Noop メールキューを使用します（メールは送信されません）");
            Arc::new(NoopMailQueue)
        }
    }
}

/// データベースに接続し、通知サービスを組み立てる
///
/// 未適用のマイグレーションがあれば適用する。
pub async fn build_notification_service(
    config: &NotifierConfig,
) -> anyhow::Result<NotificationService> {
    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let notification = &config.notification;
    let templates: Arc<dyn EmailTemplateRepository> =
        Arc::new(PostgresEmailTemplateRepository::new(pool.clone()));
    let repository = Arc::new(PostgresNotificationRepository::new(pool));

    let composer = MailComposer::new(make_renderer(notification, templates.clone())?);
    let mail_queue = build_mail_queue(notification, composer).await;
    let renderer = make_renderer(notification, templates.clone())?;

    Ok(NotificationService::new(
        repository,
        templates,
        mail_queue,
        renderer,
        notification.default_from_email.clone(),
    ))
}

fn make_renderer(
    config: &NotificationConfig,
    templates: Arc<dyn EmailTemplateRepository>,
) -> anyhow::Result<TemplateRenderer> {
    let loader = EmailTemplateLoader::new(templates, config.template_prefix.clone());
    TemplateRenderer::new(loader, config.template_dir.clone())
        .context("テンプレートレンダラーの初期化に失敗しました")
}

#[cfg(test)]
mod tests {
    use notiflow_domain::{email_template::TemplatePrefix, notification::OutgoingMail};
    use notiflow_infra::mock::InMemoryEmailTemplateRepository;

    use super::*;

    fn noop_config(template_dir: &std::path::Path) -> NotificationConfig {
        NotificationConfig {
            backend:            NotificationBackend::Noop,
            smtp_host:          "localhost".to_string(),
            smtp_port:          1025,
            default_from_email: "webmaster@localhost".to_string(),
            template_prefix:    TemplatePrefix::default(),
            template_dir:       template_dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_noopバックエンドは送信せずにハンドルを返す() {
        let dir = tempfile::tempdir().unwrap();
        let config = noop_config(dir.path());
        let composer = MailComposer::new(
            make_renderer(&config, Arc::new(InMemoryEmailTemplateRepository::new())).unwrap(),
        );

        let mail_queue = build_mail_queue(&config, composer).await;
        let handle = mail_queue
            .send(&OutgoingMail {
                recipients:    vec!["a@x.com".to_string()],
                cc:            Vec::new(),
                sender:        "webmaster@localhost".to_string(),
                template_name: String::new(),
                context:       Default::default(),
                subject:       "件名".to_string(),
                text_body:     "本文".to_string(),
                html_body:     String::new(),
            })
            .await
            .unwrap();

        assert!(handle.as_str().starts_with("noop-"));
    }
}
