use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tessera_core::TesseraConfig;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::token::IssueArgs;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "tessera.yaml";

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Issue and verify self-signed tokens")]
struct Cli {
    /// Path to the configuration file (defaults to ./tessera.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Secret key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Token issuance and verification
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new random secret key
    Generate {
        /// Directory to write secret.key into (prints to stdout otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a signed token
    Issue {
        /// Secret key: a file path or base64 text
        #[arg(long, env = "TESSERA_SECRET_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Claim to include, as KEY=VALUE (repeatable). JSON literals keep their type.
        #[arg(long = "claim", value_name = "KEY=VALUE")]
        claims: Vec<String>,

        /// JSON file with an object of claims
        #[arg(long)]
        claims_file: Option<PathBuf>,

        /// Lifetime such as 30s, 15m, 24h, 7d, or "none" for no expiry
        #[arg(long)]
        expires: Option<String>,

        /// Write the token to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a token and print its claims
    Verify {
        /// Secret key: a file path or base64 text
        #[arg(long, env = "TESSERA_SECRET_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Token text or a file containing it
        token: String,

        /// Verify as of this Unix timestamp instead of the current time
        #[arg(long)]
        now: Option<i64>,

        /// Refuse tokens without an exp claim
        #[arg(long, default_value_t = false)]
        require_expiration: bool,
    },

    /// Decode a token without verifying it
    Inspect {
        /// Token text or a file containing it
        token: String,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<TesseraConfig> {
    let config = match path {
        Some(path) => TesseraConfig::load_with_context(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            TesseraConfig::load_with_context(DEFAULT_CONFIG_FILE)?
        }
        None => TesseraConfig::default(),
    };
    tracing::debug!(
        require_expiration = config.token.require_expiration,
        "Loaded configuration"
    );
    Ok(config)
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

/// Dispatch a parsed command line. Only commands that need a key read the config.
fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config;

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output } => commands::keys::generate(output)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Issue {
                key,
                claims,
                claims_file,
                expires,
                output,
            } => {
                let config = load_config(config_path.as_deref())?;
                commands::token::issue(
                    IssueArgs {
                        key,
                        claims,
                        claims_file,
                        expires,
                        output,
                    },
                    &config.token,
                )?
            }

            TokenCommand::Verify {
                key,
                token,
                now,
                require_expiration,
            } => {
                let config = load_config(config_path.as_deref())?;
                let accepted =
                    commands::token::verify(key, token, now, require_expiration, &config.token)?;
                if !accepted {
                    return Ok(ExitCode::FAILURE);
                }
            }

            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_issue() {
        let cli = Cli::try_parse_from([
            "tessera", "token", "issue", "--key", "a2V5", "--claim", "name=alice", "--claim",
            "admin=1", "--expires", "1m",
        ])
        .unwrap();

        match cli.cmd {
            Command::Token {
                cmd: TokenCommand::Issue { claims, expires, .. },
            } => {
                assert_eq!(claims, vec!["name=alice", "admin=1"]);
                assert_eq!(expires.as_deref(), Some("1m"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "token:\n  require_expiration: true\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.token.require_expiration);
    }

    #[test]
    fn test_keys_generate_ignores_broken_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("broken.yaml");
        std::fs::write(&config_path, "token: [not, a, map]").unwrap();
        let out_dir = dir.path().join("keys");

        let cli = Cli::try_parse_from([
            "tessera",
            "--config",
            config_path.to_str().unwrap(),
            "keys",
            "generate",
            "--output",
            out_dir.to_str().unwrap(),
        ])
        .unwrap();

        assert!(run(cli).is_ok());
        assert!(out_dir.join(commands::keys::SECRET_KEY_FILE).exists());
    }

    #[test]
    fn test_verify_reads_broken_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("broken.yaml");
        std::fs::write(&config_path, "token: [not, a, map]").unwrap();

        let cli = Cli::try_parse_from([
            "tessera",
            "--config",
            config_path.to_str().unwrap(),
            "token",
            "verify",
            "--key",
            "a2V5",
            "a.b.c",
        ])
        .unwrap();

        assert!(run(cli).is_err());
    }
}
