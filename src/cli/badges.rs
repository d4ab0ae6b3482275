//! Badge command implementation

use anyhow::Result;

use super::{Options, Session};

pub fn badges_command(options: &Options, username: &str, check: bool) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;
    let manager = session.manager()?;

    if check {
        let awarded = manager.check_and_award_badges(user.id)?;
        if awarded.is_empty() {
            println!("No new badges.\n");
        }
        for badge in &awarded {
            println!("Badge earned: {} (+{} XP)", badge.badge.name, badge.badge.points);
        }
        if !awarded.is_empty() {
            println!();
        }
    }

    let progress = manager.badge_progress(user.id)?;
    let earned = progress.iter().filter(|p| p.is_earned()).count();
    println!("Badges ({earned}/{}):\n", progress.len());

    for entry in progress {
        let mark = if entry.is_earned() { "x" } else { " " };
        println!(
            "  [{mark}] {} - {:.0}% ({}/{} {})",
            entry.badge.name,
            entry.percentage,
            entry.measured,
            entry.badge.requirement_value,
            entry.badge.requirement_type
        );
        if let Some(date) = &entry.earned_date {
            println!("      earned {date}");
        }
    }
    Ok(())
}
