//! Cooldown validation for automatic capacity changes.

use std::time::{Duration, Instant};

use gridscale_sla::{PendingReason, ScaleDirection};

/// Blocks automatic capacity changes until the configured cooldown has
/// elapsed since the last one. The scale-out and scale-in windows are
/// tracked separately; the window that applies is the one matching the
/// direction of the *last* change.
#[derive(Debug)]
pub struct CooldownValidator {
    after_scale_out: Duration,
    after_scale_in: Duration,
    last_change: Option<(Instant, ScaleDirection)>,
}

impl CooldownValidator {
    pub fn new(after_scale_out: Duration, after_scale_in: Duration) -> Self {
        Self {
            after_scale_out,
            after_scale_in,
            last_change: None,
        }
    }

    /// Record that planned capacity changed at `now`.
    pub fn record_change(&mut self, direction: ScaleDirection, now: Instant) {
        self.last_change = Some((now, direction));
    }

    /// Check whether another automatic change is currently permitted.
    pub fn validate(&self, now: Instant) -> Result<(), PendingReason> {
        let Some((changed_at, direction)) = self.last_change else {
            return Ok(());
        };

        let window = match direction {
            ScaleDirection::Up => self.after_scale_out,
            ScaleDirection::Down => self.after_scale_in,
        };

        let elapsed = now.saturating_duration_since(changed_at);
        if elapsed < window {
            return Err(PendingReason::CooldownActive {
                remaining: window - elapsed,
            });
        }
        Ok(())
    }
}
