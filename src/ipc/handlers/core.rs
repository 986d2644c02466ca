use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_optional_date, get_optional_str, get_required_path};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn health(state: &AppState) -> HandlerResult {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "userId": state.user_id,
        "store": state.store.as_ref().map(|s| s.describe()),
    }))
}

fn workspace_select(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let path = PathBuf::from(get_required_path(params, "path")?);
    let user_id = get_optional_str(params, "userId").unwrap_or_else(|| state.user_id.clone());
    state
        .open_workspace(&path, &user_id)
        .map_err(|e| HandlerErr::new("store_failed", format!("{e:#}")))?;
    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "userId": user_id,
        "courseCount": state.book.courses.len(),
    }))
}

fn state_get(state: &AppState) -> HandlerResult {
    Ok(json!({
        "selectedCourseId": state.book.selected_course_id,
        "selectedDate": state.book.selected_date,
        "courseCount": state.book.courses.len(),
    }))
}

fn state_set_date(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let date = get_optional_date(params, "date")?;
    state.book.set_selected_date(date);
    state.mark_changed();
    Ok(json!({ "selectedDate": state.book.selected_date }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "health" => health(state),
        "workspace.select" => workspace_select(state, &req.params),
        "state.get" => state_get(state),
        "state.setDate" => state_set_date(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
