use crate::abc::validate_abc_ids;
use crate::courses::NON_CBCS_COURSES;
use crate::error::SheetError;
use crate::export::{safe_file_name, union_columns, write_csv};
use crate::ipc::helpers::{
    get_optional_str, get_required_str, load_input, preview, resolve_out_dir, respond,
    summary_json, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::nad::{transform_sheet, NadOptions};
use serde_json::json;

fn nad_options(state: &AppState) -> NadOptions {
    NadOptions {
        default_term_type: state.settings.default_term_type(),
        subject_slots: state.settings.subject_slots(),
        date_1904: state.settings.date_1904(),
    }
}

fn select_course(state: &mut AppState, req: &Request) -> HandlerResult {
    let course = get_required_str(req, "course")?;
    let listed = NON_CBCS_COURSES.contains(&course.as_str());
    state.nad_course = Some(course.clone());
    Ok(json!({ "course": course, "nonCbcs": listed }))
}

fn transform(state: &mut AppState, req: &Request) -> HandlerResult {
    let course = get_optional_str(req, "course")
        .or_else(|| state.nad_course.clone())
        .ok_or(SheetError::MissingCourseSelection)?;
    let input = load_input(req, state.settings.max_upload_bytes())?;
    let stem = input.stem();
    let out_dir = resolve_out_dir(req, input.path.as_deref());
    let sheet = input.into_first_sheet()?;

    let rows = transform_sheet(&sheet, &course, &nad_options(state))?;
    let columns = union_columns(&rows);
    let out_path = out_dir.join(format!("{}_op.csv", safe_file_name(&stem)));
    let summary =
        write_csv(&out_path, &columns, &rows, false).map_err(|e| HandlerErr::export_failed(e, &out_path))?;

    Ok(json!({
        "course": course,
        "export": summary_json(&summary),
        "columns": columns,
        "preview": preview(&columns, &rows),
    }))
}

fn validate_abc(state: &mut AppState, req: &Request) -> HandlerResult {
    let input = load_input(req, state.settings.max_upload_bytes())?;
    let sheet = input.into_first_sheet()?;
    let report = validate_abc_ids(&sheet);
    Ok(json!({
        "valid": report.is_valid(),
        "report": report,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "nad.selectCourse" => Some(respond(state, req, select_course)),
        "nad.transform" => Some(respond(state, req, transform)),
        "nad.validateAbcIds" => Some(respond(state, req, validate_abc)),
        _ => None,
    }
}
