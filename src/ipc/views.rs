use serde_json::json;

use crate::grades::average;
use crate::model::{AttendanceEvent, Course, GradeEntry, Student};
use crate::session::RollCallSession;

pub fn student_row(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id,
        "name": s.name,
        "condition": s.condition,
        "stats": s.stats,
        "percent": s.stats.percent_attendance(),
        "average": average(&s.grades),
        "historyCount": s.history.len(),
        "gradeCount": s.grades.len(),
    })
}

pub fn event_row(ev: &AttendanceEvent) -> serde_json::Value {
    json!({
        "id": ev.id,
        "date": ev.date,
        "status": ev.status,
        "reason": ev.reason,
    })
}

pub fn grade_row(g: &GradeEntry) -> serde_json::Value {
    json!({
        "id": g.id,
        "label": g.label,
        "type": g.kind,
        "date": g.date,
        "value": g.value,
    })
}

pub fn course_row(c: &Course) -> serde_json::Value {
    json!({
        "id": c.id,
        "name": c.name,
        "studentCount": c.students.len(),
    })
}

pub fn session_view(session: &RollCallSession, course: &Course) -> serde_json::Value {
    let current = session.current().and_then(|id| course.students.get(id)).map(|s| {
        json!({
            "id": s.id,
            "name": s.name,
            "condition": s.condition,
        })
    });
    json!({
        "courseId": session.course_id(),
        "state": session.state(),
        "cursor": session.cursor(),
        "total": session.order().len(),
        "order": session.order(),
        "current": current,
        "canUndo": session.can_undo(),
    })
}
