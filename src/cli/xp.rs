//! Commands that grant XP

use anyhow::Result;
use chrono::NaiveDate;

use motikoc::activity::NewStudySession;
use motikoc::gamification::GamificationEvent;
use motikoc::time_bucket::today;

use super::{Options, Session};

pub struct StudyArgs {
    pub subject: String,
    pub minutes: u32,
    pub date: Option<NaiveDate>,
    pub topic: Option<String>,
    pub rating: Option<u8>,
}

pub fn log_study_command(options: &Options, username: &str, args: StudyArgs) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;

    let date = args.date.unwrap_or_else(today);
    let mut study = NewStudySession::new(args.subject, args.minutes, date);
    study.topic = args.topic;
    study.performance_rating = args.rating;

    let outcome = session.manager()?.log_study_session(user.id, &study)?;
    println!("Logged session #{} for {}", outcome.log_id, user.username);

    for event in &outcome.events {
        match event {
            GamificationEvent::XpAwarded { amount, reason } => {
                println!("  +{amount} XP ({reason})")
            }
            GamificationEvent::LevelUp {
                old_level,
                new_level,
            } => println!("  Level up! {old_level} -> {new_level}"),
            GamificationEvent::BadgeEarned(awarded) => println!(
                "  Badge earned: {} (+{} XP)",
                awarded.badge.name, awarded.badge.points
            ),
        }
    }

    println!(
        "  Level {} ({}/{} XP)",
        outcome.level.level, outcome.level.current_xp, outcome.level.xp_for_next
    );
    Ok(())
}

pub fn grant_command(
    options: &Options,
    username: &str,
    amount: i64,
    reason: Option<&str>,
) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;
    let manager = session.manager()?;

    let info = match reason {
        Some(reason) => manager.award_bonus_xp(user.id, reason, amount)?,
        None => manager.grant_xp(user.id, amount)?,
    };

    if info.leveled_up {
        println!("Level up! {} -> {}", info.previous_level, info.level);
    }
    println!(
        "{} - Level {} ({}/{} XP, {} total)",
        user.username, info.level, info.current_xp, info.xp_for_next, info.total_xp
    );
    Ok(())
}

pub fn activity_command(
    options: &Options,
    username: &str,
    activity: &str,
    minutes: u32,
) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;

    let Some(info) = session
        .manager()?
        .record_named_activity(user.id, activity, minutes)?
    else {
        println!("{activity}: no XP awarded");
        return Ok(());
    };

    if info.leveled_up {
        println!("Level up! {} -> {}", info.previous_level, info.level);
    }
    println!(
        "{} - Level {} ({}/{} XP, {} total)",
        user.username, info.level, info.current_xp, info.xp_for_next, info.total_xp
    );
    Ok(())
}

pub fn ledger_command(options: &Options, username: &str) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;
    let ledger = session.recorder().xp_ledger(user.id)?;

    if ledger.is_empty() {
        println!("No bonus XP recorded for {}", user.username);
        return Ok(());
    }
    println!("Bonus XP for {}:\n", user.username);
    for entry in &ledger {
        println!("  {}  {:>+6}  {}", entry.awarded_at, entry.amount, entry.reason);
    }
    let total: i64 = ledger.iter().map(|e| e.amount).sum();
    println!("\n  Total: {total}");
    Ok(())
}
