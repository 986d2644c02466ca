//! Roll-call sessions: one pass over a course's roster for a sitting.
//!
//! A session is never persisted. It is rebuilt from scratch whenever the
//! course's set of student ids differs from the set it was built from, which
//! drops the undo stack along with it.

use crate::error::CommandError;
use crate::model::{AttendanceStatus, Course};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Completed,
}

/// One undoable `mark`. `event_id` targets the exact ledger entry the mark
/// created, so undo never removes a different same-day event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOp {
    pub student_id: String,
    pub action: AttendanceStatus,
    pub from_index: usize,
    pub to_index: usize,
    pub event_id: String,
}

#[derive(Debug, Clone)]
pub struct RollCallSession {
    course_id: String,
    roster: BTreeSet<String>,
    order: Vec<String>,
    cursor: usize,
    undo_stack: Vec<UndoOp>,
}

impl RollCallSession {
    pub fn new(course: &Course) -> Self {
        Self {
            course_id: course.id.clone(),
            roster: course.roster_ids(),
            order: course
                .sorted_students()
                .into_iter()
                .map(|s| s.id.clone())
                .collect(),
            cursor: 0,
            undo_stack: Vec::new(),
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn is_stale(&self, course: &Course) -> bool {
        self.course_id != course.id || self.roster != course.roster_ids()
    }

    pub fn state(&self) -> SessionState {
        if self.cursor < self.order.len() {
            SessionState::Active
        } else {
            SessionState::Completed
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.order.get(self.cursor).map(String::as_str)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Records `action` for the current student and moves the queue on.
    ///
    /// `present`/`absent` advance the cursor. `later` re-queues the student at
    /// the end and leaves the cursor where it is. Returns the id of the
    /// created ledger event, or `None` once the session is completed.
    pub fn mark(
        &mut self,
        course: &mut Course,
        date: NaiveDate,
        action: AttendanceStatus,
    ) -> Result<Option<String>, CommandError> {
        let Some(student_id) = self.current().map(str::to_string) else {
            return Ok(None);
        };
        let student = course
            .students
            .get_mut(&student_id)
            .ok_or_else(|| CommandError::StudentNotFound(student_id.clone()))?;
        let event_id = student.record(date, action);
        let total = student.stats.count(action);

        let from_index = self.cursor;
        let to_index = if action == AttendanceStatus::Later {
            let moved = self.order.remove(from_index);
            self.order.push(moved);
            self.order.len() - 1
        } else {
            self.cursor = (self.cursor + 1).min(self.order.len());
            from_index
        };
        tracing::debug!(
            course_id = %self.course_id,
            student_id = %student_id,
            action = action.as_str(),
            from_index,
            to_index,
            total,
            "roll-call mark"
        );
        self.undo_stack.push(UndoOp {
            student_id,
            action,
            from_index,
            to_index,
            event_id: event_id.clone(),
        });
        Ok(Some(event_id))
    }

    /// Reverts the latest mark: retracts its ledger event and restores the
    /// queue position. `None` when there is nothing to undo.
    pub fn undo(&mut self, course: &mut Course) -> Option<UndoOp> {
        let op = self.undo_stack.pop()?;
        if let Some(student) = course.students.get_mut(&op.student_id) {
            if student.retract(&op.event_id).is_none() {
                // The event was reclassified away or deleted after the mark.
                tracing::debug!(
                    student_id = %op.student_id,
                    event_id = %op.event_id,
                    "undo target no longer in ledger"
                );
            }
        }

        if op.action == AttendanceStatus::Later {
            let at = if self.order.get(op.to_index) == Some(&op.student_id) {
                Some(op.to_index)
            } else {
                self.order.iter().position(|id| *id == op.student_id)
            };
            if let Some(at) = at {
                let moved = self.order.remove(at);
                let back_to = op.from_index.min(self.order.len());
                self.order.insert(back_to, moved);
            }
            self.cursor = op.from_index.min(self.order.len());
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
        Some(op)
    }
}

/// Live sessions keyed by course id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, RollCallSession>,
}

impl SessionRegistry {
    /// The course's session, rebuilt when missing or when the roster changed.
    pub fn session_for(&mut self, course: &Course) -> &mut RollCallSession {
        let session = self
            .sessions
            .entry(course.id.clone())
            .or_insert_with(|| RollCallSession::new(course));
        if session.is_stale(course) {
            tracing::info!(course_id = %course.id, "roster changed, restarting roll call");
            *session = RollCallSession::new(course);
        }
        session
    }

    pub fn discard(&mut self, course_id: &str) {
        self.sessions.remove(course_id);
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
