use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::ipc::views::course_row;
use crate::model::fold_name;
use serde_json::json;

fn courses_list(state: &AppState) -> HandlerResult {
    let mut courses: Vec<_> = state.book.courses.values().collect();
    courses.sort_by_cached_key(|c| (fold_name(&c.name), c.name.to_lowercase(), c.id.clone()));
    Ok(json!({
        "courses": courses.into_iter().map(course_row).collect::<Vec<_>>(),
        "selectedCourseId": state.book.selected_course_id,
    }))
}

fn courses_create(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let name = get_required_str(params, "name")?;
    let course_id = state.book.create_course(&name)?;
    state.mark_changed();
    tracing::info!(course_id = %course_id, "course created");
    Ok(json!({ "courseId": course_id }))
}

fn courses_rename(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let name = get_required_str(params, "name")?;
    state.book.rename_course(&course_id, &name)?;
    state.mark_changed();
    Ok(json!({ "ok": true }))
}

fn courses_delete(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let removed = state.book.delete_course(&course_id)?;
    state.sessions.discard(&course_id);
    state.mark_changed();
    tracing::info!(
        course_id = %course_id,
        students = removed.students.len(),
        "course deleted"
    );
    Ok(json!({ "ok": true, "studentsRemoved": removed.students.len() }))
}

fn courses_select(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_optional_str(params, "courseId");
    state.book.select_course(course_id.as_deref())?;
    state.mark_changed();
    Ok(json!({ "selectedCourseId": state.book.selected_course_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "courses.list" => courses_list(state),
        "courses.create" => courses_create(state, &req.params),
        "courses.rename" => courses_rename(state, &req.params),
        "courses.delete" => courses_delete(state, &req.params),
        "courses.select" => courses_select(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
