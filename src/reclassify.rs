use crate::model::{AbsenceReason, AttendanceStatus, Student};
use serde::Deserialize;

/// Retroactive correction of a recorded attendance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reclassification {
    /// The absence was a late arrival.
    Later,
    /// The absence is excused. Still counted as an absence.
    Justified,
    /// The entry should never have been recorded.
    Erroneous,
}

impl Reclassification {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "later" | "tarde" => Some(Self::Later),
            "justified" | "justificada" => Some(Self::Justified),
            "erroneous" => Some(Self::Erroneous),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Later => "later",
            Self::Justified => "justified",
            Self::Erroneous => "erroneous",
        }
    }
}

/// Applies a compensating edit to one ledger entry and keeps the projection
/// in step. Returns whether anything changed: a missing entry or an entry
/// whose status does not admit the reclassification is left alone.
pub fn reclassify(student: &mut Student, event_id: &str, reason: Reclassification) -> bool {
    let Some(status) = student.event(event_id).map(|ev| ev.status) else {
        return false;
    };
    let applied = match (reason, status) {
        (Reclassification::Erroneous, _) => student.retract(event_id).is_some(),
        (Reclassification::Later, AttendanceStatus::Absent) => {
            student.update_event(event_id, AttendanceStatus::Later, None);
            student.stats = student
                .stats
                .decrement(AttendanceStatus::Absent)
                .increment(AttendanceStatus::Later);
            true
        }
        (Reclassification::Justified, AttendanceStatus::Absent) => student.update_event(
            event_id,
            AttendanceStatus::Absent,
            Some(AbsenceReason::Justified),
        ),
        _ => false,
    };
    if applied {
        tracing::info!(
            student_id = %student.id,
            event_id,
            from = status.as_str(),
            reason = reason.as_str(),
            "ledger entry reclassified"
        );
    }
    applied
}
