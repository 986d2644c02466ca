use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_optional_date, get_required_enum, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::ipc::views::{event_row, student_row};
use crate::model::AttendanceStatus;
use crate::reclassify::{reclassify, Reclassification};
use serde_json::json;

fn ledger_history(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let student = state
        .book
        .course(&course_id)?
        .students
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    Ok(json!({
        "student": student_row(student),
        "history": student.history.iter().map(event_row).collect::<Vec<_>>(),
    }))
}

fn ledger_find_last(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let status = get_required_enum(params, "status", AttendanceStatus::parse)?;
    let date = get_optional_date(params, "date")?;
    let student = state
        .book
        .course(&course_id)?
        .students
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    Ok(json!({
        "event": student.find_last_event(status, date).map(event_row),
    }))
}

fn ledger_reclassify(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let event_id = get_required_str(params, "eventId")?;
    let reason = get_required_enum(params, "reason", Reclassification::parse)?;
    let student = state.book.student_mut(&course_id, &student_id)?;
    let applied = reclassify(student, &event_id, reason);
    let stats = student.stats;
    let event = student.event(&event_id).map(event_row);
    if applied {
        state.mark_changed();
    }
    Ok(json!({
        "applied": applied,
        "stats": stats,
        "event": event,
    }))
}

fn ledger_verify(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let repair = params
        .get("repair")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let course = state.book.course_mut(&course_id)?;
    let mut drifted = Vec::new();
    for student in course.students.values_mut() {
        let Some(expected) = student.drift() else {
            continue;
        };
        drifted.push(json!({
            "studentId": student.id,
            "stored": student.stats,
            "expected": expected,
        }));
        if repair {
            student.stats = expected;
        }
    }
    if !drifted.is_empty() {
        tracing::warn!(
            course_id = %course_id,
            drifted = drifted.len(),
            repair,
            "attendance projection drift found"
        );
        if repair {
            state.mark_changed();
        }
    }
    Ok(json!({
        "consistent": drifted.is_empty(),
        "repaired": repair && !drifted.is_empty(),
        "drifted": drifted,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "ledger.history" => ledger_history(state, &req.params),
        "ledger.findLast" => ledger_find_last(state, &req.params),
        "ledger.reclassify" => ledger_reclassify(state, &req.params),
        "ledger.verify" => ledger_verify(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
