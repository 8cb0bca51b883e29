//! # styleflow
//!
//! Maintenance CLI for the StyleFlow billing database.
//!
//! ## Usage
//! ```bash
//! styleflow migrate                    # apply pending migrations
//! styleflow allocate INV --count 3     # INV-058, INV-059, INV-060
//! styleflow sequences                  # list counters
//! styleflow health                     # database + cache checks
//!
//! styleflow --config ./billing.toml sequences
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the configured level); allocated
//! codes go to stdout, one per line.

use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use styleflow_billing::{AppState, BillingConfig};
use styleflow_core::format_code;
use styleflow_db::Database;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Migrate,
    Allocate { prefix: String, count: u32 },
    Sequences,
    Health,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    if cli.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = BillingConfig::load(cli.config)?;
    init_tracing(&config.logging.level);

    info!(
        db_path = %config.database.path.display(),
        redis = config.cache.redis_url.is_some(),
        "Configuration loaded"
    );

    match cli.command {
        Command::Migrate => {
            let db = Database::new(config.db_config().run_migrations(false)).await?;
            let before = db.migration_status().await?;
            db.run_migrations().await?;
            let after = db.migration_status().await?;
            for name in &before.pending {
                println!("applied {}", name);
            }
            println!("migrations: {}/{} applied", after.applied, after.total);
            db.close().await;
        }

        Command::Allocate { prefix, count } => {
            let state = AppState::init(config).await?;
            for _ in 0..count {
                let code = state.codes.generate(&prefix).await?;
                println!("{}", code);
            }
            state.db.close().await;
        }

        Command::Sequences => {
            let db = Database::new(config.db_config()).await?;
            let counters = db.sequences().list().await?;

            if counters.is_empty() {
                println!("no sequences allocated yet");
            }
            for counter in counters {
                let last_code = u64::try_from(counter.last_value)
                    .ok()
                    .filter(|v| *v > 0)
                    .map(|v| format_code(&counter.prefix, v))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<8} {:>8}  {:<12} {}",
                    counter.prefix,
                    counter.last_value,
                    last_code,
                    counter.updated_at.to_rfc3339()
                );
            }
            db.close().await;
        }

        Command::Health => {
            let state = AppState::init(config).await?;

            let db_ok = state.db.health_check().await;
            let migrations = state.db.migration_status().await?;
            println!("database:   {}", if db_ok { "ok" } else { "unreachable" });
            println!(
                "migrations: {}/{} applied",
                migrations.applied, migrations.total
            );
            for name in &migrations.pending {
                println!("  pending:  {}", name);
            }

            let cache_ok = match state.config.cache.redis_url {
                Some(_) => match state.cache.ping().await {
                    Ok(()) => {
                        println!("cache:      ok");
                        true
                    }
                    Err(e) => {
                        println!("cache:      {}", e);
                        false
                    }
                },
                None => {
                    println!("cache:      disabled");
                    true
                }
            };

            state.db.close().await;
            if !(db_ok && cache_ok && migrations.is_current()) {
                std::process::exit(1);
            }
        }

        Command::Help => print_usage(),
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config = None;
    let mut command = None;
    let mut positional: Vec<&str> = Vec::new();
    let mut count: u32 = 1;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args.get(i + 1).ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
                i += 1;
            }
            "--count" | "-n" => {
                let raw = args.get(i + 1).ok_or("--count needs a number")?;
                count = raw
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("invalid --count: {}", raw))?;
                i += 1;
            }
            "--help" | "-h" => command = Some(Command::Help),
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            other => positional.push(other),
        }
        i += 1;
    }

    if command.is_none() {
        command = Some(match positional.as_slice() {
            [] => Command::Help,
            ["migrate"] => Command::Migrate,
            ["sequences"] => Command::Sequences,
            ["health"] => Command::Health,
            ["allocate", prefix] => Command::Allocate {
                prefix: prefix.to_string(),
                count,
            },
            ["allocate"] => return Err("allocate needs a PREFIX".to_string()),
            [cmd, ..] => return Err(format!("unknown command: {}", cmd)),
        });
    }

    Ok(Cli {
        config,
        command: command.unwrap_or(Command::Help),
    })
}

fn print_usage() {
    println!("StyleFlow billing maintenance");
    println!();
    println!("Usage: styleflow [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  migrate                      Apply pending database migrations");
    println!("  allocate <PREFIX> [-n <N>]   Allocate N codes for PREFIX (default: 1)");
    println!("  sequences                    List sequence counters");
    println!("  health                       Check database and cache");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_allocate() {
        let cli = parse_args(&args(&["allocate", "INV", "--count", "3"])).unwrap();
        assert_eq!(
            cli.command,
            Command::Allocate {
                prefix: "INV".into(),
                count: 3
            }
        );

        let cli = parse_args(&args(&["-c", "/etc/billing.toml", "allocate", "EXP"])).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/billing.toml")));
        assert_eq!(
            cli.command,
            Command::Allocate {
                prefix: "EXP".into(),
                count: 1
            }
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_args(&args(&["migrate"])).unwrap().command, Command::Migrate);
        assert_eq!(parse_args(&args(&["sequences"])).unwrap().command, Command::Sequences);
        assert_eq!(parse_args(&args(&["health"])).unwrap().command, Command::Health);
        assert_eq!(parse_args(&args(&[])).unwrap().command, Command::Help);
        assert_eq!(parse_args(&args(&["health", "-h"])).unwrap().command, Command::Help);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["allocate"])).is_err());
        assert!(parse_args(&args(&["allocate", "INV", "--count", "0"])).is_err());
        assert!(parse_args(&args(&["allocate", "INV", "--count"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["migrate", "--verbose"])).is_err());
    }
}
