use anyhow::Result;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

// Config is process wide, so tests touching it take turns.
static LOCK: Lazy<Mutex<()>> = Lazy::new(|| return Mutex::new(()));

async fn write_config(dir: &tempfile::TempDir, contents: &str) -> Result<String> {
    let path = dir.path().join("config.toml");
    tokio::fs::write(&path, contents).await?;

    return Ok(path.to_string_lossy().to_string());
}

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>().unwrap();

    assert_eq!(doc["api-url"].as_str(), Some("http://localhost:8000"));
    assert_eq!(doc["api-timeout"].as_integer(), Some(30000));
    assert_eq!(doc["poll-interval"].as_integer(), Some(2000));
    assert_eq!(doc["model"].as_str(), Some("openai"));
    assert!(doc.get("config-file").is_none());
    assert!(res.contains("[possible values: openai, gemini]"));
    assert!(res.contains("[possible values: console, imessage]"));
}

#[tokio::test]
async fn it_loads_defaults() -> Result<()> {
    let _lock = LOCK.lock().await;
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.toml");

    let matches = cli::build().try_get_matches_from(vec![
        "tutorbot",
        "-c",
        missing.to_str().unwrap(),
    ])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::ApiURL), "http://localhost:8000");
    assert_eq!(Config::get_u64(ConfigKey::ApiTimeout), 30000);
    assert_eq!(Config::get_u64(ConfigKey::HealthCheckTimeout), 1000);

    return Ok(());
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let _lock = LOCK.lock().await;
    let dir = tempfile::tempdir()?;
    let config_file = write_config(
        &dir,
        "api-url = \"http://tutor.local:9000\"\napi-timeout = 5000\nmodel = \"gemini\"\n",
    )
    .await?;

    let matches = cli::build().try_get_matches_from(vec!["tutorbot", "-c", &config_file])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::ApiURL), "http://tutor.local:9000");
    assert_eq!(Config::get_u64(ConfigKey::ApiTimeout), 5000);
    assert_eq!(Config::get(ConfigKey::Model), "gemini");

    return Ok(());
}

#[tokio::test]
async fn it_prefers_flags_over_config_file() -> Result<()> {
    let _lock = LOCK.lock().await;
    let dir = tempfile::tempdir()?;
    let config_file = write_config(&dir, "api-url = \"http://tutor.local:9000\"\n").await?;

    let matches = cli::build().try_get_matches_from(vec![
        "tutorbot",
        "-c",
        &config_file,
        "--api-url",
        "http://flag.local:7000",
    ])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::ApiURL), "http://flag.local:7000");

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_invalid_possible_values() -> Result<()> {
    let _lock = LOCK.lock().await;
    let dir = tempfile::tempdir()?;
    let config_file = write_config(&dir, "model = \"claude\"\n").await?;

    let matches = cli::build().try_get_matches_from(vec!["tutorbot", "-c", &config_file])?;
    let res = Config::load(cli::build(), vec![&matches]).await;

    assert!(res.is_err());
    assert!(res
        .unwrap_err()
        .to_string()
        .contains("Possible values are: openai, gemini"));

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_invalid_durations() -> Result<()> {
    let _lock = LOCK.lock().await;
    let dir = tempfile::tempdir()?;
    let config_file = write_config(&dir, "api-timeout = \"soon\"\n").await?;

    let matches = cli::build().try_get_matches_from(vec!["tutorbot", "-c", &config_file])?;
    let res = Config::load(cli::build(), vec![&matches]).await;

    assert!(res.is_err());

    return Ok(());
}
