use crate::error::SheetError;
use crate::export::{file_stem, ExportSummary};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::sheet::{read_workbook, OutRow, Sheet, SourceFormat};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const PREVIEW_ROWS: usize = 5;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn export_failed(e: anyhow::Error, out: &Path) -> Self {
        Self {
            code: "export_failed",
            message: format!("{e:#}"),
            details: Some(json!({ "path": out.to_string_lossy() })),
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<SheetError> for HandlerErr {
    fn from(e: SheetError) -> Self {
        let details = match &e {
            SheetError::FileTooLarge { size, max } => Some(json!({ "size": size, "max": max })),
            SheetError::InvalidSemester { index, total } => {
                Some(json!({ "semester": index, "totalSems": total }))
            }
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

pub type HandlerResult = Result<Value, HandlerErr>;

/// Wraps a fallible handler body into a response envelope.
pub fn respond(
    state: &mut AppState,
    req: &Request,
    f: fn(&mut AppState, &Request) -> HandlerResult,
) -> Value {
    match f(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn get_required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(HandlerErr::bad_params(format!("missing params.{}", key))),
    }
}

pub fn get_optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parsed input of a request: either a file on disk or inline rows.
pub struct Input {
    /// File name used to derive export names.
    pub name: String,
    pub path: Option<PathBuf>,
    pub sheets: Vec<Sheet>,
}

impl Input {
    pub fn stem(&self) -> String {
        file_stem(&self.name)
    }

    pub fn into_first_sheet(self) -> Result<Sheet, HandlerErr> {
        self.sheets
            .into_iter()
            .next()
            .ok_or_else(|| SheetError::EmptySheet.into())
    }
}

/// Reads a CSV/XLS/XLSX file after checking its extension and size.
pub fn read_sheets_from_path(path: &Path, max_bytes: u64) -> Result<Vec<Sheet>, HandlerErr> {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    SourceFormat::from_file_name(&name)?;
    let meta = std::fs::metadata(path).map_err(|e| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: Some(json!({ "path": path.to_string_lossy() })),
    })?;
    if meta.len() > max_bytes {
        return Err(SheetError::FileTooLarge {
            size: meta.len(),
            max: max_bytes,
        }
        .into());
    }
    let bytes = std::fs::read(path).map_err(|e| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: Some(json!({ "path": path.to_string_lossy() })),
    })?;
    Ok(read_workbook(&name, &bytes)?)
}

/// `params.path` wins over `params.rows`; inline rows take their name from `params.name`.
pub fn load_input(req: &Request, max_bytes: u64) -> Result<Input, HandlerErr> {
    if let Some(path) = get_optional_str(req, "path") {
        let path = PathBuf::from(path);
        let sheets = read_sheets_from_path(&path, max_bytes)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        return Ok(Input {
            name,
            path: Some(path),
            sheets,
        });
    }
    let Some(rows) = req.params.get("rows") else {
        return Err(HandlerErr::bad_params("missing params.path or params.rows"));
    };
    let name = get_optional_str(req, "name").unwrap_or_else(|| "rows".to_string());
    let sheet = Sheet::from_json(&name, rows)?;
    Ok(Input {
        name,
        path: None,
        sheets: vec![sheet],
    })
}

/// `params.outDir`, else the input file's directory, else the system temp dir.
pub fn resolve_out_dir(req: &Request, input: Option<&Path>) -> PathBuf {
    if let Some(dir) = get_optional_str(req, "outDir") {
        return PathBuf::from(dir);
    }
    input
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir)
}

pub fn preview(columns: &[String], rows: &[OutRow]) -> Value {
    let items: Vec<Value> = rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| {
            let obj: serde_json::Map<String, Value> = columns
                .iter()
                .map(|c| {
                    let v = row.get(c).cloned().unwrap_or_default();
                    (c.clone(), Value::String(v))
                })
                .collect();
            Value::Object(obj)
        })
        .collect();
    Value::Array(items)
}

pub fn summary_json(summary: &ExportSummary) -> Value {
    json!({
        "path": summary.path.to_string_lossy(),
        "rows": summary.rows,
        "entries": summary.entries,
    })
}
