use clap::Subcommand;
use deskrest_core::now_ms;

use super::open_session;

#[derive(Subcommand)]
pub enum BreakAction {
    /// Print the current screen-break state as JSON
    Status,
    /// Acknowledge the open screen-break prompt
    Done,
    /// Snooze the open prompt for five minutes of work time
    Snooze,
}

pub fn run(action: BreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = now_ms();
    let mut ctx = open_session(now)?;

    match action {
        BreakAction::Status => {
            ctx.tick(now);
            println!("{}", serde_json::to_string_pretty(ctx.screen_break())?);
        }
        BreakAction::Done => {
            if ctx.screen_break_done(now).is_empty() {
                eprintln!("no screen-break prompt is open");
            } else {
                println!("ok");
            }
        }
        BreakAction::Snooze => {
            if ctx.screen_break_snooze(now).is_empty() {
                eprintln!("no screen-break prompt is open");
            } else {
                println!("snoozed for 5 minutes of work time");
            }
        }
    }
    Ok(())
}
