//! Per-student attendance ledger.
//!
//! `history` is the source of truth and `stats` is its projection. The raw
//! store operations (`append_event`, `find_last_event`, `remove_event`,
//! `update_event`) touch only the history. `record` and `retract` pair a
//! history change with the matching projection change; command paths go
//! through those.

use crate::model::{new_id, AbsenceReason, AttendanceEvent, AttendanceStatus, Student};
use crate::projection::AttendanceStats;
use chrono::NaiveDate;

impl Student {
    pub fn append_event(&mut self, date: NaiveDate, status: AttendanceStatus) -> &AttendanceEvent {
        self.history.push(AttendanceEvent {
            id: new_id(),
            date,
            status,
            reason: None,
        });
        &self.history[self.history.len() - 1]
    }

    /// Most recently appended event with `status` (and `date`, when given).
    /// Scans append order, not date order.
    pub fn find_last_event(
        &self,
        status: AttendanceStatus,
        date: Option<NaiveDate>,
    ) -> Option<&AttendanceEvent> {
        self.history
            .iter()
            .rev()
            .find(|ev| ev.status == status && date.map_or(true, |d| ev.date == d))
    }

    pub fn event(&self, event_id: &str) -> Option<&AttendanceEvent> {
        self.history.iter().find(|ev| ev.id == event_id)
    }

    /// Removes the event; `None` when no event has that id.
    pub fn remove_event(&mut self, event_id: &str) -> Option<AttendanceEvent> {
        let idx = self.history.iter().position(|ev| ev.id == event_id)?;
        Some(self.history.remove(idx))
    }

    /// In-place change that keeps the event's id and date.
    pub fn update_event(
        &mut self,
        event_id: &str,
        status: AttendanceStatus,
        reason: Option<AbsenceReason>,
    ) -> bool {
        let Some(ev) = self.history.iter_mut().find(|ev| ev.id == event_id) else {
            return false;
        };
        ev.status = status;
        ev.reason = reason;
        true
    }

    /// Appends an event and counts it. Returns the new event's id.
    pub fn record(&mut self, date: NaiveDate, status: AttendanceStatus) -> String {
        let id = self.append_event(date, status).id.clone();
        self.stats = self.stats.increment(status);
        id
    }

    /// Removes an event by id and uncounts it. No-op when the id is unknown.
    pub fn retract(&mut self, event_id: &str) -> Option<AttendanceEvent> {
        let removed = self.remove_event(event_id)?;
        self.stats = self.stats.decrement(removed.status);
        Some(removed)
    }

    /// Projection recomputed from history.
    pub fn recount(&self) -> AttendanceStats {
        AttendanceStats::from_history(&self.history)
    }

    /// Recounted projection when the stored one disagrees with the ledger.
    pub fn drift(&self) -> Option<AttendanceStats> {
        let expected = self.recount();
        (expected != self.stats).then_some(expected)
    }

    pub fn absence_dates(&self) -> Vec<(NaiveDate, Option<AbsenceReason>)> {
        let mut out: Vec<(NaiveDate, Option<AbsenceReason>)> = self
            .history
            .iter()
            .filter(|ev| ev.status == AttendanceStatus::Absent)
            .map(|ev| (ev.date, ev.reason))
            .collect();
        out.sort_by_key(|(d, _)| *d);
        out
    }
}
