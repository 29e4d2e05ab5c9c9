// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use syncwatch_config::ConfigManager;

mod commands;

fn principal_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("NAME")
                .help("User the changes are computed for")
                .required(true),
        )
        .arg(
            Arg::new("repository")
                .short('r')
                .long("repository")
                .value_name("NAME")
                .help("Repository the user works in")
                .default_value("default"),
        )
}

fn scope_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("PATH")
                .help("Synchronization root (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("collection")
                .long("collection")
                .value_name("DOC_ID")
                .help("Synchronized collection member (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("limit")
                .short('l')
                .long("limit")
                .value_name("N")
                .help("Maximum number of entries to scan (defaults to finder.default_limit)")
                .value_parser(clap::value_parser!(usize)),
        )
}

fn build_cli() -> Command {
    Command::new("syncwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Finds audit log changes a synchronization client has not seen yet")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the user config directory)")
                .global(true),
        )
        .subcommand(
            Command::new("init").about("Create the config file and the log database"),
        )
        .subcommand(
            Command::new("append")
                .about("Append a JSON log entry and print its id")
                .arg(
                    Arg::new("entry")
                        .required(true)
                        .value_name("JSON")
                        .help("Log entry as JSON; a positive id is kept, otherwise the store assigns one"),
                ),
        )
        .subcommand(principal_args(
            Command::new("upper-bound").about("Print the current upper bound for a user"),
        ))
        .subcommand(scope_args(principal_args(
            Command::new("changes")
                .about("List the changes logged after a cursor")
                .arg(
                    Arg::new("since")
                        .short('s')
                        .long("since")
                        .value_name("WATERMARK")
                        .help("Lower bound (exclusive); -1 reads from the start of the log")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("-1"),
                )
                .arg(
                    Arg::new("pinned-upper")
                        .long("pinned-upper")
                        .value_name("WATERMARK")
                        .help("Replay a fixed window instead of computing a new upper bound")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true),
                ),
        )))
        .subcommand(scope_args(principal_args(
            Command::new("poll")
                .about("List the changes after the stored cursor and advance it")
                .arg(
                    Arg::new("no-ack")
                        .long("no-ack")
                        .help("Leave the stored cursor where it is")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("retries")
                        .long("retries")
                        .value_name("N")
                        .help("Attempts made when the store is unavailable")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("SECONDS")
                        .help("Give up when the poll, retries included, takes longer")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                ),
        )))
}

fn config_manager(dir: Option<&String>) -> Result<ConfigManager> {
    match dir {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to locate the config directory")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(matches.get_one::<String>("config-dir"))?;

    if let Some(("init", _)) = matches.subcommand() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();
        return commands::init(&manager).await;
    }

    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();

    let context = commands::Context::open(config, manager.config_dir())
        .await
        .context("Failed to open the log store")?;

    let output = match matches.subcommand() {
        Some(("append", sub_matches)) => commands::append(&context, sub_matches).await?,
        Some(("upper-bound", sub_matches)) => commands::upper_bound(&context, sub_matches).await?,
        Some(("changes", sub_matches)) => commands::changes(&context, sub_matches).await?,
        Some(("poll", sub_matches)) => commands::poll(&context, sub_matches).await?,
        _ => {
            build_cli().print_help()?;
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
