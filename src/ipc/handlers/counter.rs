use crate::counter::{CounterFile, FileKey};
use crate::error::SheetError;
use crate::ipc::helpers::{read_sheets_from_path, respond, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::Path;
use std::time::UNIX_EPOCH;

fn counter_file(path: &Path, max_bytes: u64) -> CounterFile {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    let meta = std::fs::metadata(path).ok();
    let key = FileKey {
        name,
        size: meta.as_ref().map_or(0, |m| m.len()),
        modified: meta
            .as_ref()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as i64),
    };
    let sheets = read_sheets_from_path(path, max_bytes).map_err(|e| SheetError::Parse(e.message));
    CounterFile { key, sheets }
}

fn names_json(state: &AppState, req: &Request) -> serde_json::Value {
    let include = req
        .params
        .get("includeNames")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !include {
        return serde_json::Value::Null;
    }
    json!({
        "union": state.counter.union(),
        "intersection": state.counter.intersection(),
    })
}

fn process(state: &mut AppState, req: &Request) -> HandlerResult {
    let Some(files) = req.params.get("files").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("files must be an array of paths"));
    };
    let mut paths = Vec::with_capacity(files.len());
    for f in files {
        match f.as_str() {
            Some(p) if !p.trim().is_empty() => paths.push(p.trim().to_string()),
            _ => return Err(HandlerErr::bad_params("files must be an array of paths")),
        }
    }

    let max = state.settings.max_upload_bytes();
    let batch = paths.iter().map(|p| counter_file(Path::new(p), max)).collect();
    let report = state.counter.process(batch);
    Ok(json!({
        "report": report,
        "names": names_json(state, req),
    }))
}

fn status(state: &mut AppState, req: &Request) -> HandlerResult {
    Ok(json!({
        "report": state.counter.status(),
        "names": names_json(state, req),
    }))
}

fn reset(state: &mut AppState, _req: &Request) -> HandlerResult {
    state.counter.reset();
    Ok(json!({ "report": state.counter.status() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "counter.process" => Some(respond(state, req, process)),
        "counter.status" => Some(respond(state, req, status)),
        "counter.reset" => Some(respond(state, req, reset)),
        _ => None,
    }
}
