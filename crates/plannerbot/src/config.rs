//! Process configuration, read once at startup.
//!
//! Everything can come from flags or environment variables. A missing bot
//! token or an out-of-range timeout is fatal at boot -- nothing else is.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "plannerbot", version, about = "Telegram financial-planning assistant bot")]
pub struct Config {
    /// Telegram bot token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Display name used in greetings and help text.
    #[arg(long, env = "BOT_NAME", default_value = "Financial Planner Bot")]
    pub bot_name: String,

    /// Idle minutes before an active session expires.
    #[arg(
        long,
        env = "SESSION_TIMEOUT_MINUTES",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub session_timeout_minutes: i64,

    /// Seconds between background sweep passes.
    #[arg(
        long,
        env = "SWEEP_INTERVAL_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    /// Data directory for the SQLite database (default: ~/.plannerbot).
    #[arg(long, env = "PLANNERBOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
