//! Combo tracking: time-windowed match streaks, session and all-time maxima, notices.

use std::time::{Duration, Instant};

/// Matches closer together than this extend the current streak.
pub const COMBO_WINDOW: Duration = Duration::from_millis(1500);
/// How long a "COMBO xN!" notice stays visible.
pub const COMBO_DISPLAY_DURATION: Duration = Duration::from_millis(1000);
/// How long a "NOT MATCH!!!" notice stays visible.
pub const NOMATCH_DISPLAY_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Combo(u32),
    NoMatch,
}

/// Transient message with an expiry instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

impl Notice {
    pub fn text(&self) -> String {
        match self.kind {
            NoticeKind::Combo(n) => format!("COMBO x{}!", n),
            NoticeKind::NoMatch => "NOT MATCH!!!".to_string(),
        }
    }

    #[inline]
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Result of a successful match as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRecord {
    pub combo: u32,
    /// Set when this match raised the all-time highest combo; the caller persists it.
    pub new_record: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ComboTracker {
    combo_count: u32,
    max_combo_count: u32,
    highest_combo: u32,
    last_match_time: Option<Instant>,
    combo_notice: Option<Notice>,
    miss_notice: Option<Notice>,
}

impl ComboTracker {
    /// New session tracker seeded with the persisted all-time best.
    pub fn new(highest_combo: u32) -> Self {
        Self {
            combo_count: 0,
            max_combo_count: 0,
            highest_combo,
            last_match_time: None,
            combo_notice: None,
            miss_notice: None,
        }
    }

    pub fn record_match(&mut self, now: Instant) -> MatchRecord {
        let in_window = self
            .last_match_time
            .is_some_and(|last| now.saturating_duration_since(last) < COMBO_WINDOW);
        self.combo_count = if in_window && self.combo_count > 0 {
            self.combo_count + 1
        } else {
            1
        };
        self.last_match_time = Some(now);

        if self.combo_count > 1 {
            self.combo_notice = Some(Notice {
                kind: NoticeKind::Combo(self.combo_count),
                expires_at: now + COMBO_DISPLAY_DURATION,
            });
        }

        self.max_combo_count = self.max_combo_count.max(self.combo_count);
        let new_record = (self.max_combo_count > self.highest_combo).then(|| {
            self.highest_combo = self.max_combo_count;
            self.highest_combo
        });
        MatchRecord {
            combo: self.combo_count,
            new_record,
        }
    }

    /// A failed attempt breaks the streak; the last match time is kept.
    pub fn record_miss(&mut self, now: Instant) {
        self.combo_count = 0;
        self.miss_notice = Some(Notice {
            kind: NoticeKind::NoMatch,
            expires_at: now + NOMATCH_DISPLAY_DURATION,
        });
    }

    pub fn combo_count(&self) -> u32 {
        self.combo_count
    }

    pub fn max_combo_count(&self) -> u32 {
        self.max_combo_count
    }

    pub fn highest_combo(&self) -> u32 {
        self.highest_combo
    }

    pub fn combo_notice(&self, now: Instant) -> Option<Notice> {
        self.combo_notice.filter(|n| n.is_live(now))
    }

    pub fn miss_notice(&self, now: Instant) -> Option<Notice> {
        self.miss_notice.filter(|n| n.is_live(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_match_starts_streak_at_one() {
        let mut t = ComboTracker::new(0);
        let rec = t.record_match(Instant::now());
        assert_eq!(rec.combo, 1);
        assert_eq!(rec.new_record, Some(1));
        assert_eq!(t.max_combo_count(), 1);
    }

    #[test]
    fn test_window_boundary() {
        let t0 = Instant::now();
        let mut inside = ComboTracker::new(0);
        inside.record_match(t0);
        assert_eq!(inside.record_match(t0 + ms(1499)).combo, 2);

        let mut outside = ComboTracker::new(0);
        outside.record_match(t0);
        assert_eq!(outside.record_match(t0 + ms(1500)).combo, 1);
    }

    #[test]
    fn test_miss_resets_streak_but_keeps_last_match_time() {
        let t0 = Instant::now();
        let mut t = ComboTracker::new(0);
        t.record_match(t0);
        t.record_match(t0 + ms(200));
        t.record_miss(t0 + ms(300));
        assert_eq!(t.combo_count(), 0);
        // Inside the window, but the streak was broken.
        assert_eq!(t.record_match(t0 + ms(400)).combo, 1);
        assert_eq!(t.max_combo_count(), 2);
    }

    #[test]
    fn test_notices_expire() {
        let t0 = Instant::now();
        let mut t = ComboTracker::new(0);
        t.record_match(t0);
        assert!(t.combo_notice(t0).is_none(), "no notice for a single match");

        t.record_match(t0 + ms(500));
        let notice = t.combo_notice(t0 + ms(600)).unwrap();
        assert_eq!(notice.text(), "COMBO x2!");
        assert!(t.combo_notice(t0 + ms(1500)).is_none());

        t.record_miss(t0 + ms(2000));
        assert_eq!(t.miss_notice(t0 + ms(2499)).unwrap().text(), "NOT MATCH!!!");
        assert!(t.miss_notice(t0 + ms(2500)).is_none());
    }

    #[test]
    fn test_records_only_beyond_loaded_high() {
        let t0 = Instant::now();
        let mut t = ComboTracker::new(3);
        let mut records = Vec::new();
        for i in 0..5 {
            if let Some(r) = t.record_match(t0 + ms(100 * i)).new_record {
                records.push(r);
            }
        }
        assert_eq!(records, vec![4, 5]);
        assert_eq!(t.highest_combo(), 5);
    }

    #[test]
    fn test_max_combo_never_decreases() {
        let t0 = Instant::now();
        let mut t = ComboTracker::new(0);
        let mut prev = 0;
        let steps = [0u64, 100, 200, 5000, 5100, 5150, 9000];
        for (i, &at) in steps.iter().enumerate() {
            if i % 3 == 2 {
                t.record_miss(t0 + ms(at));
            } else {
                t.record_match(t0 + ms(at));
            }
            assert!(t.max_combo_count() >= prev);
            prev = t.max_combo_count();
        }
    }
}
