//! Desktop alert delivery: platform notifications and short audio cues.
//!
//! Everything here is fire-and-forget. A missing notification daemon or
//! audio player must never surface to the user or stall the timer, so all
//! results are dropped.

use deskrest_core::{AlertSink, Phase};
use notify_rust::Notification;

pub struct DesktopAlerts {
    notifications_enabled: bool,
    sound_enabled: bool,
}

impl DesktopAlerts {
    pub fn new(notifications_enabled: bool, sound_enabled: bool) -> Self {
        Self {
            notifications_enabled,
            sound_enabled,
        }
    }

    fn notify(&self, summary: &str, body: &str) {
        if !self.notifications_enabled {
            return;
        }
        let _ = Notification::new()
            .summary(summary)
            .body(body)
            .appname("deskrest")
            .show();
    }
}

impl AlertSink for DesktopAlerts {
    fn phase_completed(&self, _finished: Phase, next: Phase) {
        match next {
            Phase::Rest => self.notify("Break time", "Focus block finished. Step away for a bit."),
            Phase::Work => self.notify("Back to work", "Break finished. Next focus block is ready."),
        }
        if self.sound_enabled {
            play_chime();
        }
    }

    fn milestone(&self, _seconds_left: u32) {
        if self.sound_enabled {
            play_tick();
        }
    }

    fn screen_break_opened(&self) {
        self.notify(
            "Screen break",
            "Look at something 20 feet away for 20 seconds.",
        );
        if self.sound_enabled {
            play_chime();
        }
    }
}

fn play_chime() {
    play_first_available(&[
        ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
        ("aplay", "/usr/share/sounds/sound-icons/prompt.wav"),
        ("aplay", "/usr/share/sounds/generic.wav"),
    ]);
}

fn play_tick() {
    play_first_available(&[
        ("paplay", "/usr/share/sounds/freedesktop/stereo/message.oga"),
        ("paplay", "/usr/share/sounds/freedesktop/stereo/bell.oga"),
    ]);
}

fn play_first_available(candidates: &[(&str, &str)]) {
    for (cmd, sound_file) in candidates {
        if std::path::Path::new(sound_file).exists() {
            let _ = std::process::Command::new(cmd)
                .arg(sound_file)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn();
            break;
        }
    }
}
