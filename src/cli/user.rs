//! User, level and progress commands

use anyhow::Result;

use super::{Options, Session};

const RECENT_SESSIONS: u32 = 5;

pub fn register_command(options: &Options, username: &str) -> Result<()> {
    let session = Session::open(options)?;
    let user_id = session.recorder().register_user(username)?;
    println!("Registered {username} (#{user_id})");

    let awarded = session.manager()?.check_and_award_badges(user_id)?;
    for badge in awarded {
        println!("  Badge earned: {} (+{} XP)", badge.badge.name, badge.badge.points);
    }
    Ok(())
}

pub fn level_command(options: &Options, username: &str) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;
    let info = session.manager()?.level(user.id)?;

    println!("{} - Level {}", user.username, info.level);
    println!(
        "  XP: {}/{} ({:.0}%)",
        info.current_xp,
        info.xp_for_next,
        info.progress_to_next() * 100.0
    );
    println!("  Total XP: {}", info.total_xp);
    println!("  To next level: {}", info.xp_remaining());
    Ok(())
}

pub fn progress_command(options: &Options, username: &str, days: u32) -> Result<()> {
    let session = Session::open(options)?;
    let user = session.user(username)?;
    let summary = session.manager()?.activity_summary(user.id, days)?;

    println!("{} - last {} days\n", user.username, summary.days);
    println!("  Sessions:       {}", summary.sessions);
    println!("  Hours studied:  {:.1}", summary.total_hours);
    println!("  Active days:    {}", summary.active_days);
    match summary.average_rating {
        Some(rating) => println!("  Average rating: {rating:.1}"),
        None => println!("  Average rating: -"),
    }
    let status = if summary.streak_active { "" } else { " (lapsed)" };
    println!("  Current streak: {} days{status}", summary.current_streak);
    println!("  Best streak:    {} days", summary.best_streak);
    println!("  Badges earned:  {}", summary.badges_earned);

    let recent = session.recorder().study_history(user.id, RECENT_SESSIONS)?;
    if !recent.is_empty() {
        println!("\n  Recent sessions:");
        for log in &recent {
            let topic = log
                .topic
                .as_deref()
                .map(|t| format!(" / {t}"))
                .unwrap_or_default();
            println!("    {}  {}{}  {} min", log.date, log.subject, topic, log.duration);
        }
    }
    Ok(())
}
