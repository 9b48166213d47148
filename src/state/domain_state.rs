use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks access timing for one domain
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of URLs handed out for this domain in the current process
    pub request_count: u32,

    /// When the last URL for this domain was handed out
    pub last_access: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with no recorded access
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_access?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was made to this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_access = Some(now);
    }
}

/// Per-domain access clock enforcing the politeness interval
///
/// One entry exists per domain ever handed out. Callers hold the clock's lock
/// across [`DomainClock::try_acquire`], which checks and stamps in one step.
#[derive(Debug)]
pub struct DomainClock {
    interval: Duration,
    domains: HashMap<String, DomainState>,
}

impl DomainClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            domains: HashMap::new(),
        }
    }

    /// Claims an access slot for `domain` at `now`
    ///
    /// On success the domain's clock is advanced to `now`. If the domain was
    /// accessed less than one interval ago, nothing changes and the remaining
    /// wait is returned.
    pub fn try_acquire(&mut self, domain: &str, now: Instant) -> Result<(), Duration> {
        let state = self.domains.entry(domain.to_string()).or_default();

        if let Some(wait) = state.time_until_next_request(self.interval, now) {
            return Err(wait);
        }

        state.record_request(now);
        Ok(())
    }

    pub fn get(&self, domain: &str) -> Option<&DomainState> {
        self.domains.get(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(500);

    #[test]
    fn test_new_domain_state() {
        let state = DomainState::new();
        assert_eq!(state.request_count, 0);
        assert!(state.last_access.is_none());
    }

    #[test]
    fn test_time_until_next_request() {
        let mut state = DomainState::new();
        let now = Instant::now();

        assert!(state.time_until_next_request(INTERVAL, now).is_none());

        state.record_request(now);
        assert_eq!(state.time_until_next_request(INTERVAL, now), Some(INTERVAL));

        let soon = now + Duration::from_millis(200);
        assert_eq!(
            state.time_until_next_request(INTERVAL, soon),
            Some(Duration::from_millis(300))
        );

        let later = now + Duration::from_millis(500);
        assert!(state.time_until_next_request(INTERVAL, later).is_none());
    }

    #[test]
    fn test_record_request() {
        let mut state = DomainState::new();
        let now = Instant::now();

        state.record_request(now);
        assert_eq!(state.request_count, 1);
        assert_eq!(state.last_access, Some(now));

        state.record_request(now);
        assert_eq!(state.request_count, 2);
    }

    #[test]
    fn test_first_access_is_granted() {
        let mut clock = DomainClock::new(INTERVAL);
        assert!(clock.get("www.ics.uci.edu").is_none());
        assert!(clock.try_acquire("www.ics.uci.edu", Instant::now()).is_ok());
        assert_eq!(clock.get("www.ics.uci.edu").unwrap().request_count, 1);
    }

    #[test]
    fn test_second_access_too_soon_is_refused() {
        let mut clock = DomainClock::new(INTERVAL);
        let now = Instant::now();

        clock.try_acquire("www.ics.uci.edu", now).unwrap();
        let wait = clock
            .try_acquire("www.ics.uci.edu", now + Duration::from_millis(100))
            .unwrap_err();
        assert_eq!(wait, Duration::from_millis(400));

        // Refusal does not move the clock
        let state = clock.get("www.ics.uci.edu").unwrap();
        assert_eq!(state.request_count, 1);
        assert_eq!(state.last_access, Some(now));
    }

    #[test]
    fn test_access_after_interval_is_granted() {
        let mut clock = DomainClock::new(INTERVAL);
        let now = Instant::now();

        clock.try_acquire("www.ics.uci.edu", now).unwrap();
        assert!(clock.try_acquire("www.ics.uci.edu", now + INTERVAL).is_ok());
        assert_eq!(clock.get("www.ics.uci.edu").unwrap().request_count, 2);
    }

    #[test]
    fn test_domains_are_independent() {
        let mut clock = DomainClock::new(INTERVAL);
        let now = Instant::now();

        clock.try_acquire("www.ics.uci.edu", now).unwrap();
        assert!(clock.try_acquire("www.stat.uci.edu", now).is_ok());
        assert_eq!(clock.get("www.stat.uci.edu").unwrap().last_access, Some(now));
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let mut clock = DomainClock::new(Duration::ZERO);
        let now = Instant::now();

        clock.try_acquire("www.ics.uci.edu", now).unwrap();
        assert!(clock.try_acquire("www.ics.uci.edu", now).is_ok());
    }
}
