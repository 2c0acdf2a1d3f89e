use std::fmt;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

// 控制台输出层，日志写到 stderr，stdout 留给命令的结果输出
struct ConsoleLayer;

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.message else {
            return;
        };

        let timestamp = Local::now().format("%b %d %H:%M:%S");
        let (color_code, level_str) = level_style(event.metadata().level());
        eprintln!("\x1b[2m{}\x1b[0m {}{:>5}\x1b[0m {}", timestamp, color_code, level_str, message);
    }
}

fn level_style(level: &tracing::Level) -> (&'static str, &'static str) {
    match *level {
        tracing::Level::ERROR => ("\x1b[31m", "ERROR"), // 红色
        tracing::Level::WARN => ("\x1b[33m", " WARN"),  // 黄色
        tracing::Level::INFO => ("\x1b[32m", " INFO"),  // 绿色
        tracing::Level::DEBUG => ("\x1b[36m", "DEBUG"), // 青色
        tracing::Level::TRACE => ("\x1b[35m", "TRACE"), // 紫色
    }
}

// 用于提取日志消息的访问者
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }
}

pub fn init_logger(log_level: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(ConsoleLayer.with_filter(build_console_filter(log_level)))
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {e}"))
}

/// 构建控制台日志过滤器，压低 sqlx 与 sea-orm 自身的噪音
fn build_console_filter(base_level: &str) -> EnvFilter {
    EnvFilter::builder().parse_lossy(format!(
        "{},\
            sqlx::query=error,\
            sqlx=error,\
            sea_orm::database=error,\
            sea_orm_migration=warn",
        base_level
    ))
}
