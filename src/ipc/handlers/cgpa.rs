use crate::courses::find_course;
use crate::error::SheetError;
use crate::export::{safe_file_name, write_csv};
use crate::ipc::helpers::{
    get_required_str, load_input, preview, resolve_out_dir, respond, summary_json, HandlerErr,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::Path;

fn select_course(state: &mut AppState, req: &Request) -> HandlerResult {
    let course = get_required_str(req, "course")?;
    let explicit = match req.params.get("totalSems") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(
            v.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| HandlerErr::bad_params("totalSems must be a non-negative integer"))?,
        ),
    };
    let total_sems = match (explicit, find_course(&course)) {
        (Some(n), _) => n,
        (None, Some(c)) => c.sems,
        (None, None) => return Err(SheetError::UnknownCourse(course).into()),
    };

    state.cgpa.select_course(&course, total_sems);
    state.cgpa.set_decimals(state.settings.decimals());
    Ok(json!({ "status": state.cgpa.status() }))
}

fn write_final(state: &AppState, out_dir: &Path) -> HandlerResult {
    let export = state.cgpa.final_export()?;
    let out_path = out_dir.join(safe_file_name(&export.file_name));
    let summary = write_csv(&out_path, &export.headers, &export.rows, true)
        .map_err(|e| HandlerErr::export_failed(e, &out_path))?;
    Ok(json!({
        "export": summary_json(&summary),
        "columns": export.headers,
        "preview": preview(&export.headers, &export.rows),
    }))
}

fn upload(state: &mut AppState, req: &Request) -> HandlerResult {
    let Some(semester) = req
        .params
        .get("semester")
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
    else {
        return Err(HandlerErr::bad_params("missing params.semester"));
    };
    let input = load_input(req, state.settings.max_upload_bytes())?;
    let out_dir = resolve_out_dir(req, input.path.as_deref());
    let sheet = input.into_first_sheet()?;

    let outcome = state.cgpa.upload(semester, sheet)?;
    // The upload stays committed even when the automatic export cannot be written.
    let finalized = if semester == state.cgpa.total_sems() {
        match write_final(state, &out_dir) {
            Ok(v) => v,
            Err(e) => json!({ "error": { "code": e.code, "message": e.message, "details": e.details } }),
        }
    } else {
        serde_json::Value::Null
    };

    Ok(json!({
        "upload": outcome,
        "status": state.cgpa.status(),
        "final": finalized,
    }))
}

fn status(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "status": state.cgpa.status() }))
}

fn export(state: &mut AppState, req: &Request) -> HandlerResult {
    let out_dir = resolve_out_dir(req, None);
    write_final(state, &out_dir)
}

fn reset(state: &mut AppState, _req: &Request) -> HandlerResult {
    state.cgpa.reset();
    Ok(json!({ "status": state.cgpa.status() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "cgpa.selectCourse" => Some(respond(state, req, select_course)),
        "cgpa.upload" => Some(respond(state, req, upload)),
        "cgpa.status" => Some(respond(state, req, status)),
        "cgpa.export" => Some(respond(state, req, export)),
        "cgpa.reset" => Some(respond(state, req, reset)),
        _ => None,
    }
}
