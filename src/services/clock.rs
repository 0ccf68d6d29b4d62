//! services/clock.rs

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Fuente de "ahora" para sellar transiciones.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Hora de pared anclada al arrancar más el tiempo monotónico de tokio.
/// Nunca retrocede y sigue al tiempo pausado de tokio en tests.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor: DateTime<Utc>,
    started: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor + elapsed
    }
}
