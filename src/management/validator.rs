use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::types::{TokenRecord, TokenState};

/// Tokens are refreshed once they are this close to expiry.
pub const GRACE_WINDOW: Duration = Duration::minutes(5);

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decides whether a stored token can be handed out as is.
#[derive(Debug, Clone, Copy)]
pub struct TokenValidator {
    grace: Duration,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::new(GRACE_WINDOW)
    }
}

impl TokenValidator {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// True when `now + grace >= expires_at`.
    pub fn needs_refresh(&self, record: &TokenRecord, now: DateTime<Utc>) -> bool {
        now + self.grace >= record.expires_at
    }

    pub fn classify(&self, record: Option<&TokenRecord>, now: DateTime<Utc>) -> TokenState {
        match record {
            None => TokenState::Unconnected,
            Some(r) if now >= r.expires_at => TokenState::Expired,
            Some(r) if self.needs_refresh(r, now) => TokenState::Expiring,
            Some(_) => TokenState::Valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::store::tests::record;
    use crate::types::Provider;

    #[test]
    fn grace_window_boundaries() {
        let validator = TokenValidator::default();
        let mut token = record(Provider::Music, "admin", "a");
        let now = Utc::now();

        token.expires_at = now + Duration::minutes(10);
        assert!(!validator.needs_refresh(&token, now));
        assert_eq!(validator.classify(Some(&token), now), TokenState::Valid);

        token.expires_at = now + Duration::minutes(5);
        assert!(validator.needs_refresh(&token, now));

        token.expires_at = now + Duration::seconds(200);
        assert!(validator.needs_refresh(&token, now));
        assert_eq!(validator.classify(Some(&token), now), TokenState::Expiring);

        token.expires_at = now - Duration::seconds(1);
        assert_eq!(validator.classify(Some(&token), now), TokenState::Expired);

        assert_eq!(validator.classify(None, now), TokenState::Unconnected);
    }

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::seconds(10));
        assert_eq!(clock.now(), start + Duration::seconds(10));
    }
}
