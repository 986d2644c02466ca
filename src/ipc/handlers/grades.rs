use crate::grades::{average, GradeDraft};
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_optional_date, get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::ipc::views::grade_row;
use crate::model::GradeKind;
use serde_json::json;

fn parse_draft(params: &serde_json::Value, default_date: chrono::NaiveDate) -> Result<GradeDraft, HandlerErr> {
    let label = get_optional_str(params, "label").unwrap_or_default();
    let kind = match get_optional_str(params, "type") {
        Some(raw) => GradeKind::parse(&raw).ok_or_else(|| {
            HandlerErr::bad_params("type must be written, oral, practical or conceptual")
        })?,
        None => GradeKind::default(),
    };
    let date = get_optional_date(params, "date")?.unwrap_or(default_date);
    let raw_value = params
        .get("value")
        .ok_or_else(|| HandlerErr::bad_params("missing value"))?;
    let value = GradeDraft::parse_value(raw_value)?;
    Ok(GradeDraft {
        label,
        kind,
        date,
        value,
    })
}

fn grades_list(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let student = state
        .book
        .course(&course_id)?
        .students
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    Ok(json!({
        "grades": student.grades_by_date().into_iter().map(grade_row).collect::<Vec<_>>(),
        "average": average(&student.grades),
    }))
}

fn grades_add(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let draft = parse_draft(params, state.book.selected_date)?;
    let student = state.book.student_mut(&course_id, &student_id)?;
    let grade_id = student.add_grade(draft);
    let avg = average(&student.grades);
    state.mark_changed();
    Ok(json!({ "gradeId": grade_id, "average": avg }))
}

fn grades_update(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let grade_id = get_required_str(params, "gradeId")?;
    let draft = parse_draft(params, state.book.selected_date)?;
    let student = state.book.student_mut(&course_id, &student_id)?;
    student.edit_grade(&grade_id, draft)?;
    let avg = average(&student.grades);
    state.mark_changed();
    Ok(json!({ "ok": true, "average": avg }))
}

fn grades_delete(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let student_id = get_required_str(params, "studentId")?;
    let grade_id = get_required_str(params, "gradeId")?;
    let student = state.book.student_mut(&course_id, &student_id)?;
    let applied = student.delete_grade(&grade_id);
    let avg = average(&student.grades);
    if applied {
        state.mark_changed();
    }
    Ok(json!({ "applied": applied, "average": avg }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "grades.list" => grades_list(state, &req.params),
        "grades.add" => grades_add(state, &req.params),
        "grades.update" => grades_update(state, &req.params),
        "grades.delete" => grades_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
