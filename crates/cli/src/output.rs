//! Shared `--format text|json` plumbing for the query subcommands.

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json_or(format: OutputFormat, value: &serde_json::Value, text: impl FnOnce(&serde_json::Value)) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())),
        OutputFormat::Text => text(value),
    }
}
