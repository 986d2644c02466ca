use crate::backup;
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_required_path, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn io_failed(e: anyhow::Error, path: &str) -> HandlerErr {
    HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": path }))
}

fn exchange_export_json(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let out_path = get_required_path(params, "outPath")?;
    let bytes = backup::export_gradebook_json(&state.book, &PathBuf::from(&out_path))
        .map_err(|e| io_failed(e, &out_path))?;
    Ok(json!({ "ok": true, "path": out_path, "bytes": bytes }))
}

fn exchange_import_json(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let in_path = get_required_path(params, "inPath")?;
    let book = backup::read_gradebook_json(&PathBuf::from(&in_path)).map_err(|e| {
        tracing::warn!(path = %in_path, "import rejected: {e:#}");
        HandlerErr::new("import_invalid", format!("{e:#}")).with_details(json!({ "path": in_path }))
    })?;
    let course_count = book.courses.len();
    state.book = book;
    state.sessions.clear();
    state.mark_changed();
    tracing::info!(path = %in_path, courses = course_count, "gradebook imported");
    Ok(json!({
        "ok": true,
        "courseCount": course_count,
        "selectedCourseId": state.book.selected_course_id,
        "selectedDate": state.book.selected_date,
    }))
}

fn exchange_export_workbook(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let course_id = get_required_str(params, "courseId")?;
    let out_path = get_required_path(params, "outPath")?;
    let course = state.book.course(&course_id)?;
    let summary = backup::export_course_workbook(course, &PathBuf::from(&out_path))
        .map_err(|e| io_failed(e, &out_path))?;
    let rows: serde_json::Map<String, serde_json::Value> = summary
        .rows_by_sheet
        .into_iter()
        .map(|(name, n)| (name, json!(n)))
        .collect();
    Ok(json!({
        "ok": true,
        "path": out_path,
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "rows": rows,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "exchange.exportJson" => exchange_export_json(state, &req.params),
        "exchange.importJson" => exchange_import_json(state, &req.params),
        "exchange.exportWorkbook" => exchange_export_workbook(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
