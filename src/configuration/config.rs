#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::MessengerName;
use crate::domain::models::ModelName;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiTimeout,
    ApiURL,
    ChatDb,
    ConfigFile,
    HealthCheckTimeout,
    Messenger,
    Model,
    PollInterval,
    RoadmapsFile,
}

impl ConfigKey {
    /// Keys holding milliseconds.
    fn is_duration(&self) -> bool {
        return matches!(
            self,
            ConfigKey::ApiTimeout | ConfigKey::HealthCheckTimeout | ConfigKey::PollInterval
        );
    }
}

pub fn cache_dir() -> path::PathBuf {
    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("tutorbot");
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    /// Numeric value of `key`, falling back to its default when unset.
    pub fn get_u64(key: ConfigKey) -> u64 {
        if let Ok(val) = Config::get(key).parse::<u64>() {
            return val;
        }

        return Config::default(key).parse::<u64>().unwrap_or_default();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let home_dir = dirs::home_dir().unwrap_or_else(env::temp_dir);

        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return home_dir.join(".config"))
            .join("tutorbot/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = home_dir.join(".config/tutorbot/config.toml");

        #[cfg(not(target_os = "macos"))]
        let default_messenger = MessengerName::Console.to_string();
        #[cfg(target_os = "macos")]
        let default_messenger = MessengerName::IMessage.to_string();

        let res = match key {
            ConfigKey::ApiTimeout => "30000".to_string(),
            ConfigKey::ApiURL => "http://localhost:8000".to_string(),
            ConfigKey::ChatDb => home_dir
                .join("Library/Messages/chat.db")
                .to_string_lossy()
                .to_string(),
            ConfigKey::ConfigFile => config_path.to_string_lossy().to_string(),
            ConfigKey::HealthCheckTimeout => "1000".to_string(),
            ConfigKey::Messenger => default_messenger,
            ConfigKey::Model => ModelName::default().to_string(),
            ConfigKey::PollInterval => "2000".to_string(),
            ConfigKey::RoadmapsFile => cache_dir()
                .join("roadmaps.yaml")
                .to_string_lossy()
                .to_string(),
        };

        return res;
    }

    fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
        let name = key.to_string();
        let Some(arg) = cmd
            .get_arguments()
            .find(|e| return e.get_long() == Some(name.as_str()))
        else {
            return vec![];
        };

        return arg
            .get_possible_values()
            .iter()
            .map(|e| return e.get_name().to_string())
            .collect::<Vec<String>>();
    }

    fn validate() -> Result<()> {
        for key in ConfigKey::iter().filter(|e| return e.is_duration()) {
            let val = Config::get(key);
            if val.parse::<u64>().is_err() {
                bail!(format!(
                    "Invalid value for '{key}': {val}\nExpected a whole number of milliseconds."
                ));
            }
        }

        return Ok(());
    }

    /// Layers defaults, the TOML config file, and finally CLI flags or
    /// environment variables.
    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(&config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(&config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                let Some(val) = doc.get(&key.to_string()) else {
                    continue;
                };

                if let Some(val_int) = val.as_integer() {
                    Config::set(key, &val_int.to_string());
                } else if let Some(val_str) = val.as_str() {
                    if val_str.is_empty() {
                        continue;
                    }

                    // Use clap value parsers to do validation.
                    let possible_values = Config::possible_values(&cmd, key);
                    if !possible_values.is_empty()
                        && !possible_values.contains(&val_str.to_string())
                    {
                        bail!(format!("{config_file} has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                    }
                    Config::set(key, val_str);
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        Config::validate()?;

        tracing::debug!(
            api_url = Config::get(ConfigKey::ApiURL),
            api_timeout = Config::get(ConfigKey::ApiTimeout),
            messenger = Config::get(ConfigKey::Messenger),
            model = Config::get(ConfigKey::Model),
            chat_db = Config::get(ConfigKey::ChatDb),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let name = key.to_string();
                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(name.as_str()))?;

                let mut description = arg
                    .get_help()?
                    .to_string()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let possible_values = Config::possible_values(&cmd, key);
                if !possible_values.is_empty() {
                    description = format!(
                        "{description} [possible values: {}]",
                        possible_values.join(", ")
                    );
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if key.is_duration() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
