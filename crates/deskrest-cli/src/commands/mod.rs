pub mod breaks;
pub mod config;
pub mod habits;
pub mod timer;

use deskrest_core::{Config, SessionContext};

use crate::alerts::DesktopAlerts;

/// Open the process-wide session: persisted snapshots are reconciled against
/// the current wall clock, and desktop alerts honor the stored settings.
pub fn open_session(now_ms: u64) -> Result<SessionContext, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let alerts = DesktopAlerts::new(
        config.alerts.notifications_enabled,
        config.alerts.sound_enabled,
    );
    SessionContext::open_default(Box::new(alerts), now_ms)
}
