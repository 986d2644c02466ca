use crate::gradebook::StudentEdit;
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::ipc::views::student_row;
use crate::model::Condition;
use serde_json::json;

fn students_list(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let course = state.book.course(&course_id)?;
    let rows: Vec<serde_json::Value> = course
        .sorted_students()
        .into_iter()
        .map(student_row)
        .collect();
    Ok(json!({ "courseId": course_id, "students": rows }))
}

fn students_create(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let name = get_required_str(params, "name")?;
    let condition = match get_optional_str(params, "condition") {
        Some(raw) => Condition::parse(&raw)
            .ok_or_else(|| HandlerErr::bad_params("condition must be enrolled or repeating"))?,
        None => Condition::default(),
    };
    let student_id = state.book.add_student(&course_id, &name, condition)?;
    state.mark_changed();
    Ok(json!({ "studentId": student_id }))
}

fn students_update(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let edit_raw = params
        .get("edit")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing edit"))?;
    let edit: StudentEdit = serde_json::from_value(edit_raw)
        .map_err(|e| HandlerErr::bad_params(format!("invalid edit: {}", e)))?;
    state.book.edit_student(&course_id, &student_id, edit)?;
    state.mark_changed();
    Ok(json!({ "ok": true }))
}

fn students_delete(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    state.book.delete_student(&course_id, &student_id)?;
    state.mark_changed();
    Ok(json!({ "ok": true }))
}

fn students_absences(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let student = state
        .book
        .course(&course_id)?
        .students
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    let absences: Vec<serde_json::Value> = student
        .absence_dates()
        .into_iter()
        .map(|(date, reason)| json!({ "date": date, "justified": reason.is_some() }))
        .collect();
    Ok(json!({ "studentId": student_id, "name": student.name, "absences": absences }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        "students.absences" => students_absences(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
