#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::cache_dir;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::MessengerName;
use crate::domain::models::ModelName;
use crate::domain::models::Session;
use crate::domain::services::help_text;
use crate::domain::services::markdown_to_plaintext;
use crate::domain::services::scrub_attributed_body;
use crate::domain::services::RoadmapStore;
use crate::infrastructure::api::TutorApiManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn convert_stdin() -> Result<()> {
    let mut markdown = String::new();
    tokio::io::stdin().read_to_string(&mut markdown).await?;
    println!("{}", markdown_to_plaintext(&markdown));

    return Ok(());
}

async fn scrub_file(file: &str) -> Result<()> {
    let blob = fs::read(file).await?;
    match scrub_attributed_body(Some(blob.as_slice())) {
        Some(scrubbed) => {
            tracing::debug!(confidence = ?scrubbed.confidence, "scrubbed");
            println!("{}", scrubbed.text);
        }
        None => {
            bail!(format!("Nothing resembling text was found in {file}"));
        }
    }

    return Ok(());
}

fn roadmap_args(matches: &ArgMatches) -> (String, String) {
    let category = matches
        .get_one::<String>("category")
        .cloned()
        .unwrap_or_default();
    let name = matches
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_default();

    return (category, name);
}

async fn roadmaps(matches: &ArgMatches) -> Result<()> {
    let store = RoadmapStore::default();

    match matches.subcommand() {
        Some(("list", _)) => {
            println!("{}", store.list().await?);
        }
        Some(("show", show_matches)) => {
            let (category, name) = roadmap_args(show_matches);
            println!("{}", store.show(&category, &name).await?);
        }
        Some((action @ ("check" | "uncheck"), step_matches)) => {
            let (category, name) = roadmap_args(step_matches);
            let step = step_matches.get_one::<usize>("step").copied().unwrap_or(0);
            let res = store
                .set_step(&category, &name, step, action == "check")
                .await?;
            println!("{res}");
        }
        _ => {
            subcommand_roadmaps().print_long_help()?;
        }
    }

    return Ok(());
}

async fn progress_cards(project: &str) -> Result<()> {
    let model = ModelName::parse(&Config::get(ConfigKey::Model)).unwrap_or_default();
    let cards = TutorApiManager::get()
        .progress_cards(project, model)
        .await?;

    if cards.is_empty() {
        println!("No progress cards were generated for {project}.");
        return Ok(());
    }

    let res = cards
        .iter()
        .enumerate()
        .map(|(idx, card)| {
            return format!(
                "{n}. {title}\n   {description}",
                n = idx + 1,
                title = Paint::new(&card.title).bold(),
                description = card.description
            );
        })
        .collect::<Vec<String>>()
        .join("\n\n");
    println!("{res}");

    return Ok(());
}

async fn quiz(topic: &str) -> Result<()> {
    let res = TutorApiManager::get().quiz(topic).await?;
    println!("{}", res.format());

    return Ok(());
}

async fn test_message(phone_number: &str) -> Result<()> {
    TutorApiManager::get()
        .send_test_message(phone_number)
        .await?;
    println!("Test message sent to {phone_number}");

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for tutorbot")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running tutorbot with environment variable RUST_LOG=tutorbot")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_roadmap() -> [Arg; 2] {
    return [
        Arg::new("category")
            .long("category")
            .num_args(1)
            .required(true)
            .help("Roadmap category, such as Roles, Projects, or Skills-Tools."),
        Arg::new("name")
            .long("name")
            .num_args(1)
            .required(true)
            .help("Roadmap name, such as \"Data Scientist\"."),
    ];
}

fn arg_step() -> Arg {
    return Arg::new("step")
        .long("step")
        .num_args(1)
        .required(true)
        .value_parser(value_parser!(usize))
        .help("Step number, starting at 1.");
}

fn subcommand_roadmaps() -> Command {
    return Command::new("roadmaps")
        .about("Browse learning roadmaps and track your progress.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all roadmaps with their completion."))
        .subcommand(
            Command::new("show")
                .about("Show the steps of a roadmap.")
                .args(arg_roadmap()),
        )
        .subcommand(
            Command::new("check")
                .about("Mark a roadmap step as complete.")
                .args(arg_roadmap())
                .arg(arg_step()),
        )
        .subcommand(
            Command::new("uncheck")
                .about("Mark a roadmap step as incomplete.")
                .args(arg_roadmap())
                .arg(arg_step()),
        );
}

fn arg_api_url() -> Arg {
    return Arg::new(ConfigKey::ApiURL.to_string())
        .long(ConfigKey::ApiURL.to_string())
        .env("TUTORBOT_API_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the AI Tutor API. [default: {}]",
            Config::default(ConfigKey::ApiURL)
        ))
        .global(true);
}

fn arg_api_timeout() -> Arg {
    return Arg::new(ConfigKey::ApiTimeout.to_string())
        .long(ConfigKey::ApiTimeout.to_string())
        .env("TUTORBOT_API_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds for the AI Tutor API to answer. [default: {}]",
            Config::default(ConfigKey::ApiTimeout)
        ))
        .global(true);
}

fn arg_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::HealthCheckTimeout.to_string())
        .long(ConfigKey::HealthCheckTimeout.to_string())
        .env("TUTORBOT_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds before timing out when health checking the AI Tutor API. [default: {}]",
            Config::default(ConfigKey::HealthCheckTimeout)
        ))
        .global(true);
}

fn arg_messenger() -> Arg {
    return Arg::new(ConfigKey::Messenger.to_string())
        .long(ConfigKey::Messenger.to_string())
        .env("TUTORBOT_MESSENGER")
        .num_args(1)
        .help(format!(
            "Chat application to watch and reply through. [default: {}]",
            Config::default(ConfigKey::Messenger)
        ))
        .value_parser(PossibleValuesParser::new(MessengerName::VARIANTS))
        .global(true);
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("TUTORBOT_MODEL")
        .num_args(1)
        .help(format!(
            "Model used for requests that are not tied to a chat session. [default: {}]",
            Config::default(ConfigKey::Model)
        ))
        .value_parser(PossibleValuesParser::new(ModelName::VARIANTS))
        .global(true);
}

fn arg_chat_db() -> Arg {
    return Arg::new(ConfigKey::ChatDb.to_string())
        .long(ConfigKey::ChatDb.to_string())
        .env("TUTORBOT_CHAT_DB")
        .num_args(1)
        .help(format!(
            "Path to the Messages database when using the imessage messenger. [default: {}]",
            Config::default(ConfigKey::ChatDb)
        ))
        .global(true);
}

fn arg_poll_interval() -> Arg {
    return Arg::new(ConfigKey::PollInterval.to_string())
        .long(ConfigKey::PollInterval.to_string())
        .env("TUTORBOT_POLL_INTERVAL")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds between checks for new messages. [default: {}]",
            Config::default(ConfigKey::PollInterval)
        ))
        .global(true);
}

fn arg_roadmaps_file() -> Arg {
    return Arg::new(ConfigKey::RoadmapsFile.to_string())
        .long(ConfigKey::RoadmapsFile.to_string())
        .env("TUTORBOT_ROADMAPS_FILE")
        .num_args(1)
        .help(format!(
            "File roadmap progress is saved to. [default: {}]",
            Config::default(ConfigKey::RoadmapsFile)
        ))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text(&Session::default())
        .split('\n')
        .filter(|line| return !line.starts_with("Current "))
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.ends_with("commands:") {
                return Paint::new("CHAT COMMANDS:").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("tutorbot")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text.trim().to_string())
        .arg_required_else_help(false)
        .subcommand(Command::new("start").about("Watch the messenger and answer incoming messages. This is the default."))
        .subcommand(Command::new("convert").about("Converts markdown from stdin to the plaintext sent to chats."))
        .subcommand(
            Command::new("scrub")
                .about("Recovers message text from an attributedBody blob saved to a file.")
                .arg(Arg::new("file").required(true).help("Path to the blob.")),
        )
        .subcommand(subcommand_roadmaps())
        .subcommand(
            Command::new("progress-cards")
                .about("Generates progress cards for a project.")
                .arg(
                    Arg::new("project")
                        .short('p')
                        .long("project")
                        .required(true)
                        .help("Project name."),
                ),
        )
        .subcommand(
            Command::new("quiz")
                .about("Generates a multiple choice quiz on a topic.")
                .arg(
                    Arg::new("topic")
                        .short('t')
                        .long("topic")
                        .required(true)
                        .help("Quiz topic, such as python or javascript."),
                ),
        )
        .subcommand(
            Command::new("test-message")
                .about("Asks the AI Tutor API to send a test iMessage.")
                .arg(
                    Arg::new("phone-number")
                        .long("phone-number")
                        .required(true)
                        .help("Recipient phone number or email."),
                ),
        )
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("TUTORBOT_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ))
                .global(true),
        )
        .arg(arg_api_url())
        .arg(arg_api_timeout())
        .arg(arg_health_check_timeout())
        .arg(arg_messenger())
        .arg(arg_model())
        .arg(arg_chat_db())
        .arg(arg_poll_interval())
        .arg(arg_roadmaps_file());
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    return matches
        .get_one::<String>(name)
        .map(|e| return e.as_str())
        .unwrap_or_default();
}

/// Handles one-shot subcommands. Returns true when the bot should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = cache_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("convert", _)) => {
            convert_stdin().await?;
            return Ok(false);
        }
        Some(("scrub", subcmd_matches)) => {
            scrub_file(required(subcmd_matches, "file")).await?;
            return Ok(false);
        }
        Some(("roadmaps", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            roadmaps(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("progress-cards", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            progress_cards(required(subcmd_matches, "project")).await?;
            return Ok(false);
        }
        Some(("quiz", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            quiz(required(subcmd_matches, "topic")).await?;
            return Ok(false);
        }
        Some(("test-message", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            test_message(required(subcmd_matches, "phone-number")).await?;
            return Ok(false);
        }
        Some(("start", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
