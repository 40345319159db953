#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Error;
use anyhow::Result;
use yansi::Paint;

use crate::application::cli;
use crate::configuration::cache_dir;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::MessengerName;
use crate::domain::services::BotService;
use crate::domain::services::Conversations;
use crate::infrastructure::api::TutorApiManager;
use crate::infrastructure::messengers::MessengerManager;

fn handle_error(err: Error) {
    eprintln!(
            "{}",
            Paint::red(format!(
                "Oh no! tutorbot has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {:#}",
                env!("CARGO_PKG_VERSION"),
                env!("VERGEN_GIT_DESCRIBE"),
                err
            ))
        );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 RUST_LOG=tutorbot {args}");
        eprintln!(
            "\nDebug logs are written to {}",
            cache_dir().join("debug.log").to_string_lossy()
        );
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn start() -> Result<()> {
    let api = TutorApiManager::get();
    if let Err(err) = api.health_check().await {
        tracing::warn!(error = ?err, "AI Tutor API failed its health check");
        eprintln!(
            "{}",
            Paint::yellow(format!(
                "The AI Tutor API at {} is not reachable yet ({err}). Replies will apologize until it is.",
                Config::get(ConfigKey::ApiURL)
            ))
        );
    }

    let messenger_name = Config::get(ConfigKey::Messenger);
    let Some(name) = MessengerName::parse(messenger_name.to_string()) else {
        bail!(format!("No messenger implemented for {messenger_name}"));
    };

    let messenger = MessengerManager::get(name);
    messenger.health_check().await?;

    println!(
        "{}",
        Paint::green(format!("tutorbot is listening on {name}. Press CTRL+C to stop."))
    );

    let conversations = Arc::new(Conversations::new(api));
    let res = tokio::select!(
        res = BotService::run(Arc::new(messenger), conversations) => res,
        res = tokio::signal::ctrl_c() => res.map_err(Error::from),
    );

    tracing::info!("shutting down");
    return res;
}

#[tokio::main]
async fn main() {
    better_panic::install();

    let debug_log_dir = env::var("TUTORBOT_LOG_DIR").unwrap_or_else(|_| {
        return cache_dir().to_string_lossy().to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("tutorbot")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let ready = match cli::parse().await {
        Ok(ready) => ready,
        Err(err) => {
            handle_error(err);
            return;
        }
    };
    if !ready {
        process::exit(0);
    }

    if let Err(err) = start().await {
        handle_error(err);
    }

    process::exit(0);
}
