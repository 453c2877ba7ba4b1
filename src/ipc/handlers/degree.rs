use crate::degree::{trim_for_degree_export, DEGREE_COLUMNS};
use crate::error::SheetError;
use crate::export::{safe_file_name, write_degree_zip};
use crate::ipc::helpers::{
    load_input, preview, resolve_out_dir, respond, summary_json, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn trim(state: &mut AppState, req: &Request) -> HandlerResult {
    let input = load_input(req, state.settings.max_upload_bytes())?;
    let base = safe_file_name(&input.stem());
    let out_dir = resolve_out_dir(req, input.path.as_deref());
    let sheet = input.into_first_sheet()?;
    if sheet.rows.is_empty() {
        return Err(SheetError::EmptySheet.into());
    }

    let export = trim_for_degree_export(&sheet.rows, state.settings.date_1904());
    let summary = write_degree_zip(&out_dir, &base, &export)
        .map_err(|e| HandlerErr::export_failed(e, &out_dir.join(format!("{}_trimmed.zip", base))))?;

    let columns: Vec<String> = DEGREE_COLUMNS.iter().map(|c| c.to_string()).collect();
    Ok(json!({
        "export": summary_json(&summary),
        "columns": columns,
        "preview": preview(&columns, &export.rows),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "degree.trim" => Some(respond(state, req, trim)),
        _ => None,
    }
}
