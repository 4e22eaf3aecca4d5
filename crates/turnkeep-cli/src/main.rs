//! turnkeep - inspect and sanitize stored chat history payloads.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;
use turnkeep_core::history::DecodedPayload;
use turnkeep_core::{
    guard_envelope, is_item_not_found_error, load_config, parse_stored_record_with,
    strip_item_ids, ConfigError, HistoryConfig, Message, StoredRecord,
};

/// Inspect and sanitize stored chat history payloads
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON config file (sdkVersion, maxPayloadBytes)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a stored record into canonical messages
    Parse {
        /// Record JSON file, or `-` for stdin
        input: PathBuf,

        /// Print which payload shape was recognized instead of the messages
        #[arg(long)]
        shape: bool,
    },
    /// Wrap a message list in an envelope if it fits the size ceiling
    Guard {
        /// Message array JSON file, or `-` for stdin
        input: PathBuf,
    },
    /// Remove stateful item ids from a message list
    Strip {
        /// Message array JSON file, or `-` for stdin
        input: PathBuf,
    },
    /// Report whether a caught error is an item-not-found failure
    Classify {
        /// Error JSON file, or `-` for stdin
        input: PathBuf,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HistoryConfig::default(),
    };

    let output = execute(&cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute(command: &Command, config: &HistoryConfig) -> Result<Value, CliError> {
    match command {
        Command::Parse { input, shape } => {
            let record: StoredRecord = serde_json::from_str(&read_input(input)?)?;
            if *shape {
                return Ok(Value::String(payload_shape(&record, config).to_string()));
            }
            let messages = parse_stored_record_with(&record, config);
            Ok(serde_json::to_value(messages)?)
        }
        Command::Guard { input } => {
            let messages: Vec<Message> = serde_json::from_str(&read_input(input)?)?;
            match guard_envelope(messages, config) {
                Some(envelope) => Ok(serde_json::to_value(envelope)?),
                None => {
                    log::info!("No envelope produced; store flat content only");
                    Ok(Value::Null)
                }
            }
        }
        Command::Strip { input } => {
            let mut messages: Vec<Message> = serde_json::from_str(&read_input(input)?)?;
            let removed = strip_item_ids(&mut messages);
            log::info!("Removed {} item id(s)", removed);
            Ok(serde_json::to_value(messages)?)
        }
        Command::Classify { input } => {
            let value: Value = serde_json::from_str(&read_input(input)?)?;
            Ok(Value::Bool(is_item_not_found_error(&value)))
        }
    }
}

fn payload_shape(record: &StoredRecord, config: &HistoryConfig) -> &'static str {
    match turnkeep_core::history::decode_payload(record.ai_payload.as_ref(), &config.sdk_version) {
        DecodedPayload::Current(_) => "current",
        DecodedPayload::Legacy(_) => "legacy",
        DecodedPayload::Fallback(reason) => {
            log::info!("Fallback for record {}: {}", record.id, reason);
            "fallback"
        }
    }
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let read_error = |source| CliError::Read {
        path: path.display().to_string(),
        source,
    };

    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map_err(read_error)?;
        return Ok(buffer);
    }

    fs::read_to_string(path).map_err(read_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_input(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["turnkeep", "-v", "parse", "--shape", "row.json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Parse { shape: true, .. }));

        let cli = Cli::try_parse_from(["turnkeep", "--config", "c.json", "strip", "-"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(cli.command, Command::Strip { ref input } if input == Path::new("-")));
    }

    #[test]
    fn parse_falls_back_for_untrusted_payload() {
        let dir = tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "row.json",
            &json!({
                "id": 1,
                "role": "user",
                "content": "hi",
                "aiPayload": { "sdkVersion": "old" }
            }),
        );
        let config = HistoryConfig::default();

        let parse = Command::Parse {
            input: input.clone(),
            shape: false,
        };
        let output = execute(&parse, &config).unwrap();
        assert_eq!(output, json!([{ "role": "user", "content": "hi" }]));

        let shape = execute(&Command::Parse { input, shape: true }, &config).unwrap();
        assert_eq!(shape, json!("fallback"));
    }

    #[test]
    fn guard_reports_null_when_too_large() {
        let dir = tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "messages.json",
            &json!([{ "role": "user", "content": "hello" }]),
        );
        let config = HistoryConfig {
            max_payload_bytes: 8,
            ..HistoryConfig::default()
        };

        let guarded = execute(&Command::Guard { input: input.clone() }, &config).unwrap();
        assert_eq!(guarded, Value::Null);

        let envelope = execute(&Command::Guard { input }, &HistoryConfig::default()).unwrap();
        assert_eq!(envelope["sdkVersion"], json!("ai@v5"));
    }

    #[test]
    fn strip_and_classify() {
        let dir = tempdir().unwrap();
        let messages = write_input(
            dir.path(),
            "messages.json",
            &json!([{ "role": "assistant", "content": [
                { "type": "text", "text": "ok",
                  "providerOptions": { "openai": { "itemId": "msg_1" } } }
            ]}]),
        );
        let error = write_input(
            dir.path(),
            "error.json",
            &json!({ "error": { "message": "Item with id 'msg_1' not found" } }),
        );

        let config = HistoryConfig::default();

        let stripped = execute(&Command::Strip { input: messages }, &config).unwrap();
        assert_eq!(
            stripped,
            json!([{ "role": "assistant", "content": [{ "type": "text", "text": "ok" }] }])
        );

        let classified = execute(&Command::Classify { input: error }, &config).unwrap();
        assert_eq!(classified, json!(true));
    }

    #[test]
    fn missing_input_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = execute(
            &Command::Classify { input: dir.path().join("missing.json") },
            &HistoryConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, CliError::Read { .. }));
    }
}
