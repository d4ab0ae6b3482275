//! Leaderboard command implementation

use anyhow::{Context, Result};

use motikoc::leaderboard::{Category, Leaderboard, Timeframe};

use super::{Options, Session};

pub fn leaderboard_command(
    options: &Options,
    timeframe: Timeframe,
    category: Category,
    limit: usize,
    json: bool,
) -> Result<()> {
    let session = Session::open(options)?;
    let board = Leaderboard::new(session.store.coordinator().clone());
    let entries = board.get_leaderboard(timeframe, category, limit)?;

    if json {
        let out =
            serde_json::to_string_pretty(&entries).context("Failed to serialize leaderboard")?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }

    println!("Leaderboard - {category} ({timeframe}):\n");
    for entry in entries {
        println!(
            "  {:>3}. {:<20} Lv {:<3} {:.1}",
            entry.rank, entry.username, entry.level, entry.value
        );
    }
    Ok(())
}
