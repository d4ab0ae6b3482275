use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use motikoc::leaderboard::{Category, Timeframe};

mod cli;

#[derive(Parser)]
#[command(name = "motikoc")]
#[command(about = "MotiKoç - study tracking with XP, levels and badges")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to .motikoc/config.toml, then ~/.motikoc/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Register a new user
    Register { username: String },

    /// Log a study session, grant its XP and award unlocked badges
    LogStudy {
        username: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        minutes: u32,

        /// Day of the session, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        topic: Option<String>,

        /// Self-assessed performance, 1-5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
    },

    /// Grant XP to a user (recorded as a bonus when a reason is given)
    Grant {
        username: String,

        /// XP to add; negative values remove XP
        #[arg(allow_negative_numbers = true)]
        amount: i64,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Grant the XP a named activity is worth (e.g. forum_answer)
    Activity {
        username: String,
        activity: String,

        #[arg(long, default_value_t = 0)]
        minutes: u32,
    },

    /// Show a user's bonus XP ledger
    Ledger { username: String },

    /// Show a user's level and XP
    Level { username: String },

    /// Show badge progress for a user
    Badges {
        username: String,

        /// Evaluate and award badges first
        #[arg(long)]
        check: bool,
    },

    /// Summarize a user's recent activity
    Progress {
        username: String,

        /// Window length in days
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Show the leaderboard
    Leaderboard {
        /// daily, weekly, monthly or all-time
        #[arg(long, default_value = "all-time")]
        timeframe: Timeframe,

        /// total_xp, study_hours or questions_answered
        #[arg(long, default_value = "total_xp")]
        category: Category,

        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = cli::Options {
        config: cli.config,
        db: cli.db,
    };

    match cli.command {
        Commands::Init { force } => cli::init::init_command(&options, force)?,
        Commands::Register { username } => cli::user::register_command(&options, &username)?,
        Commands::LogStudy {
            username,
            subject,
            minutes,
            date,
            topic,
            rating,
        } => cli::xp::log_study_command(
            &options,
            &username,
            cli::xp::StudyArgs {
                subject,
                minutes,
                date,
                topic,
                rating,
            },
        )?,
        Commands::Grant {
            username,
            amount,
            reason,
        } => cli::xp::grant_command(&options, &username, amount, reason.as_deref())?,
        Commands::Activity {
            username,
            activity,
            minutes,
        } => cli::xp::activity_command(&options, &username, &activity, minutes)?,
        Commands::Ledger { username } => cli::xp::ledger_command(&options, &username)?,
        Commands::Level { username } => cli::user::level_command(&options, &username)?,
        Commands::Badges { username, check } => {
            cli::badges::badges_command(&options, &username, check)?
        }
        Commands::Progress { username, days } => {
            cli::user::progress_command(&options, &username, days)?
        }
        Commands::Leaderboard {
            timeframe,
            category,
            limit,
            json,
        } => cli::leaderboard::leaderboard_command(&options, timeframe, category, limit, json)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_accepts_negative_amount() {
        let cli = Cli::try_parse_from(["motikoc", "grant", "ayse", "-50"]).unwrap();
        match cli.command {
            Commands::Grant {
                username,
                amount,
                ..
            } => {
                assert_eq!(username, "ayse");
                assert_eq!(amount, -50);
            }
            _ => panic!("expected grant"),
        }
    }

    #[test]
    fn test_grant_still_parses_reason_flag() {
        let cli =
            Cli::try_parse_from(["motikoc", "grant", "ayse", "-5", "--reason", "late"]).unwrap();
        match cli.command {
            Commands::Grant { amount, reason, .. } => {
                assert_eq!(amount, -5);
                assert_eq!(reason.as_deref(), Some("late"));
            }
            _ => panic!("expected grant"),
        }
    }
}
