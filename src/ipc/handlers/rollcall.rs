use crate::error::CommandError;
use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{get_required_enum, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::ipc::views::session_view;
use crate::model::AttendanceStatus;
use serde_json::json;

fn rollcall_open(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let course = state.book.course(&course_id)?;
    let session = state.sessions.session_for(course);
    Ok(json!({
        "date": state.book.selected_date,
        "session": session_view(session, course),
    }))
}

fn rollcall_mark(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let action = get_required_enum(params, "action", AttendanceStatus::parse)?;
    let date = state.book.selected_date;
    let course = state
        .book
        .courses
        .get_mut(&course_id)
        .ok_or_else(|| CommandError::CourseNotFound(course_id.clone()))?;
    let session = state.sessions.session_for(course);
    let marked_student = session.current().map(str::to_string);
    let event_id = session.mark(course, date, action)?;
    let view = session_view(session, course);

    if event_id.is_some() {
        state.mark_changed();
    }
    Ok(json!({
        "applied": event_id.is_some(),
        "eventId": event_id,
        "studentId": marked_student.filter(|_| event_id.is_some()),
        "session": view,
    }))
}

fn rollcall_undo(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let course = state
        .book
        .courses
        .get_mut(&course_id)
        .ok_or_else(|| CommandError::CourseNotFound(course_id.clone()))?;
    let session = state.sessions.session_for(course);
    let op = session.undo(course);
    let view = session_view(session, course);

    let undone = op.map(|op| {
        json!({
            "studentId": op.student_id,
            "action": op.action,
            "eventId": op.event_id,
        })
    });
    if undone.is_some() {
        state.mark_changed();
    }
    Ok(json!({
        "applied": undone.is_some(),
        "undone": undone,
        "session": view,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "rollcall.open" => rollcall_open(state, &req.params),
        "rollcall.mark" => rollcall_mark(state, &req.params),
        "rollcall.undo" => rollcall_undo(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
