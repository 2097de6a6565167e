//! # ログ初期化
//!
//! 通知ディスパッチを組み込むプロセスのトレーシングを初期化する。
//! 出力形式は `LOG_FORMAT`（`json` / `pretty`）、レベルは `RUST_LOG` で切り替える。

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 レコードの JSON（`jq` での調査向け）
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// 大文字小文字と前後の空白を無視して解釈する
    ///
    /// 解釈できない値は `Pretty` になる。subscriber の初期化前に呼ばれるため、
    /// 警告は stderr に直接書く。
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => {
                eprintln!("WARNING: LOG_FORMAT={s:?} は解釈できないため pretty を使います");
                Self::Pretty
            }
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// グローバル subscriber を登録する
///
/// `RUST_LOG` が未設定なら `info,notiflow=debug`。`ErrorLayer` を重ねるので、
/// `InfraError` は生成時点の `SpanTrace` を保持できる。
#[cfg(feature = "observability")]
pub fn init_tracing(service_name: &str, log_format: LogFormat) {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,notiflow=debug".into());

    let fmt_layer = match log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::info!(
        service = service_name,
        log_format = ?log_format,
        "トレーシングを初期化しました"
    );
}
