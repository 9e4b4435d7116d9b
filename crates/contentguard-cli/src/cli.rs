use clap::{Parser, Subcommand};
use contentguard_core::{ContentType, FilterLevel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contentguard")]
#[command(author, version, about = "Moderate text, image, audio and video content")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one piece of content through the filter and print the result as JSON
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "contentguard.yaml")]
        config: PathBuf,

        /// Content type: text, image, audio or video
        #[arg(short = 't', long = "type", default_value = "text", value_parser = parse_content_type)]
        content_type: ContentType,

        /// Filter level override: low, medium, high, standard or 1-3
        #[arg(short, long, value_parser = parse_level)]
        level: Option<FilterLevel>,

        /// Provider API key override
        #[arg(long, env = "CONTENTGUARD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Exit with status 1 when the content is blocked
        #[arg(long)]
        fail_on_block: bool,

        /// Text, or the URL of the media to check; `-` reads stdin
        content: String,
    },

    /// Load a configuration file and report whether it is usable
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = "contentguard.yaml")]
        config: PathBuf,
    },
}

fn parse_content_type(s: &str) -> Result<ContentType, String> {
    s.parse().map_err(|e: contentguard_core::Error| e.to_string())
}

fn parse_level(s: &str) -> Result<FilterLevel, String> {
    if let Ok(code) = s.parse::<i64>() {
        return match code {
            1..=3 => Ok(FilterLevel::from_code(code)),
            _ => Err(format!("level code must be 1, 2 or 3, got {}", code)),
        };
    }
    match s.to_ascii_lowercase().as_str() {
        "standard" => Ok(FilterLevel::Standard),
        name => match FilterLevel::from_name(name) {
            FilterLevel::Standard => Err(format!("unknown filter level '{}'", s)),
            level => Ok(level),
        },
    }
}
