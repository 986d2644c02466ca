use crate::model::{AttendanceEvent, AttendanceStatus};
use serde::{Deserialize, Serialize};

/// Per-student attendance counters derived from the ledger.
///
/// `absent` counts every absence, justified or not. The counters must always
/// equal a recount of the student's history; every ledger mutation goes
/// through `increment`/`decrement` to keep it that way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    #[serde(default)]
    pub present: u32,
    #[serde(default)]
    pub absent: u32,
    #[serde(default)]
    pub later: u32,
}

impl AttendanceStats {
    pub fn increment(self, status: AttendanceStatus) -> Self {
        let mut next = self;
        match status {
            AttendanceStatus::Present => next.present += 1,
            AttendanceStatus::Absent => next.absent += 1,
            AttendanceStatus::Later => next.later += 1,
        }
        next
    }

    /// Floors at zero: decrementing an empty counter is a no-op.
    pub fn decrement(self, status: AttendanceStatus) -> Self {
        let mut next = self;
        match status {
            AttendanceStatus::Present => next.present = next.present.saturating_sub(1),
            AttendanceStatus::Absent => next.absent = next.absent.saturating_sub(1),
            AttendanceStatus::Later => next.later = next.later.saturating_sub(1),
        }
        next
    }

    pub fn count(&self, status: AttendanceStatus) -> u32 {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::Absent => self.absent,
            AttendanceStatus::Later => self.later,
        }
    }

    /// `round(present / (present + absent) * 100)`, or 0 with no sittings.
    /// `later` stays out of the denominator until it is reclassified.
    pub fn percent_attendance(&self) -> u32 {
        let present = u64::from(self.present);
        let denom = present + u64::from(self.absent);
        if denom == 0 {
            return 0;
        }
        // Half rounds up, computed exactly in integers.
        ((200 * present + denom) / (2 * denom)) as u32
    }

    pub fn from_history<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceEvent>,
    {
        events
            .into_iter()
            .fold(Self::default(), |acc, ev| acc.increment(ev.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stats(present: u32, absent: u32, later: u32) -> AttendanceStats {
        AttendanceStats {
            present,
            absent,
            later,
        }
    }

    #[test]
    fn percent_excludes_later_from_denominator() {
        assert_eq!(stats(3, 2, 5).percent_attendance(), 60);
        assert_eq!(stats(0, 0, 0).percent_attendance(), 0);
        assert_eq!(stats(0, 0, 4).percent_attendance(), 0);
        assert_eq!(stats(1, 0, 0).percent_attendance(), 100);
        assert_eq!(stats(0, 3, 0).percent_attendance(), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        // 1/8 = 12.5%
        assert_eq!(stats(1, 7, 0).percent_attendance(), 13);
        // 2/3 = 66.67%
        assert_eq!(stats(2, 1, 0).percent_attendance(), 67);
        // 1/3 = 33.33%
        assert_eq!(stats(1, 2, 0).percent_attendance(), 33);
    }

    #[test]
    fn increment_touches_only_matching_counter() {
        let s = stats(1, 1, 1).increment(AttendanceStatus::Later);
        assert_eq!(s, stats(1, 1, 2));
        let s = s.increment(AttendanceStatus::Present);
        assert_eq!(s, stats(2, 1, 2));
    }

    #[test]
    fn decrement_never_goes_below_zero() {
        let s = AttendanceStats::default();
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Later,
        ] {
            assert_eq!(s.decrement(status), s);
        }
        assert_eq!(stats(0, 2, 0).decrement(AttendanceStatus::Absent), stats(0, 1, 0));
    }

    #[test]
    fn recount_matches_history() {
        let d = NaiveDate::from_ymd_opt(2024, 4, 2).expect("date");
        let events: Vec<AttendanceEvent> = [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Absent,
            AttendanceStatus::Later,
        ]
        .into_iter()
        .map(|status| AttendanceEvent {
            id: crate::model::new_id(),
            date: d,
            status,
            reason: None,
        })
        .collect();
        assert_eq!(AttendanceStats::from_history(&events), stats(1, 2, 1));
    }
}
