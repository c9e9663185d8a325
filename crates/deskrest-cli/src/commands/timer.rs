use std::io::Write;

use clap::Subcommand;
use deskrest_core::{now_ms, Phase, PresetId, SessionContext};

use super::open_session;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Toggle between running and paused
    Toggle,
    /// Skip to the next phase (pause first; skip is only valid while stopped)
    Skip,
    /// Print the current timer state as JSON
    Status,
    /// Select a preset: light, standard, or focus
    Preset {
        /// Preset id
        id: String,
    },
    /// Apply session-only custom timings (minutes, at least 1 each)
    Custom {
        /// Work minutes
        #[arg(long)]
        work: u32,
        /// Rest minutes
        #[arg(long)]
        rest: u32,
    },
    /// Dismiss the end-of-cycle banner
    Dismiss,
    /// Drive the timer in the foreground until interrupted
    Watch,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = now_ms();
    let mut ctx = open_session(now)?;

    match action {
        TimerAction::Start => {
            ctx.start(now);
            print_status(&ctx, now)?;
        }
        TimerAction::Pause => {
            ctx.pause(now);
            print_status(&ctx, now)?;
        }
        TimerAction::Toggle => {
            ctx.toggle(now);
            print_status(&ctx, now)?;
        }
        TimerAction::Skip => {
            if ctx.skip(now).is_empty() {
                eprintln!("skip ignored: pause the timer first");
            }
            print_status(&ctx, now)?;
        }
        TimerAction::Status => {
            ctx.tick(now);
            print_status(&ctx, now)?;
        }
        TimerAction::Preset { id } => {
            let id: PresetId = id.parse()?;
            ctx.set_preset(id, now)?;
            print_status(&ctx, now)?;
        }
        TimerAction::Custom { work, rest } => {
            ctx.set_custom_timings(work, rest, now)?;
            print_status(&ctx, now)?;
        }
        TimerAction::Dismiss => {
            ctx.dismiss_cycle_complete(now);
            println!("ok");
        }
        TimerAction::Watch => watch(ctx)?,
    }
    Ok(())
}

fn print_status(ctx: &SessionContext, now: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&ctx.status(now))?);
    Ok(())
}

/// Foreground loop: one cooperative tick every 100ms. The loop is the only
/// scheduler; exiting it (Ctrl-C terminates the process) cancels the
/// repeating callback, and the last persisted snapshot carries the state to
/// the next invocation.
fn watch(mut ctx: SessionContext) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    loop {
        let now = now_ms();
        ctx.tick(now);
        write!(stdout, "\r\x1b[2K{}", render_line(&ctx, now))?;
        stdout.flush()?;
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
}

fn render_line(ctx: &SessionContext, now: u64) -> String {
    let remaining = ctx.remaining_at(now);
    let phase = match ctx.phase() {
        Phase::Work => "WORK",
        Phase::Rest => "REST",
    };
    let state = if ctx.is_running() { "" } else { " [paused]" };
    let mut line = format!(
        "{phase} {:02}:{:02}{state} ({})",
        remaining / 60,
        remaining % 60,
        ctx.preset().as_str(),
    );
    let sb = ctx.screen_break();
    if sb.is_open {
        line.push_str(&format!(
            "  |  screen break: {}s (break done|snooze)",
            sb.countdown_secs
        ));
    }
    if ctx.cycle_complete_pending() {
        line.push_str("  |  cycle complete (timer dismiss)");
    }
    line
}
