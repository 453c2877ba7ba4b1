use crate::error::SheetError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    /// Date-formatted workbook cell: the raw serial plus its ISO rendering.
    Date { serial: f64, text: String },
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Date { text, .. } => text.trim().is_empty(),
        }
    }

    /// Text as a spreadsheet would render it (whole numbers without `.0`).
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Date { text, .. } => text.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    return None;
                }
                t.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Self::Date { serial, .. } => Some(*serial),
            _ => None,
        }
    }

    fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Text((if *b { "TRUE" } else { "FALSE" }).to_string()),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Empty),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Ordered header -> value record. Keeps source column order for export.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<V> {
    keys: Vec<String>,
    values: Vec<V>,
    index: HashMap<String, usize>,
}

pub type RawRow = Record<CellValue>;
pub type OutRow = Record<String>;

impl<V> Default for Record<V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> Record<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.values[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Replaces an existing value in place, otherwise appends the column.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            self.values[i] = value;
            return;
        }
        self.index.insert(key.clone(), self.keys.len());
        self.keys.push(key);
        self.values.push(value);
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.keys.iter().map(|k| k.as_str()).zip(self.values.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.values.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Record<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.set(k, v);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xls,
    Xlsx,
}

impl SourceFormat {
    pub fn from_file_name(name: &str) -> Result<Self, SheetError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xls" => Ok(Self::Xls),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(SheetError::UnsupportedFormat { ext }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// 1-based source row of each entry in `rows` (the header is row 1).
    pub line_numbers: Vec<usize>,
}

impl Sheet {
    /// Builds a sheet from an array-of-arrays grid whose first row is the header.
    /// Every row carries every header (absent cells are `Empty`), blank rows are dropped
    /// and repeated header names get `_1`, `_2`... suffixes.
    pub fn from_grid(name: &str, grid: Vec<Vec<CellValue>>) -> Self {
        let mut it = grid.into_iter();
        let Some(header_row) = it.next() else {
            return Self {
                name: name.to_string(),
                ..Self::default()
            };
        };

        let mut columns: Vec<(usize, String)> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (idx, cell) in header_row.iter().enumerate() {
            let h = cell.display().trim().to_string();
            if h.is_empty() {
                continue;
            }
            let n = seen.entry(h.clone()).or_insert(0);
            let unique = if *n == 0 { h.clone() } else { format!("{}_{}", h, n) };
            *n += 1;
            columns.push((idx, unique));
        }

        let mut rows: Vec<RawRow> = Vec::new();
        let mut line_numbers: Vec<usize> = Vec::new();
        for (i, raw) in it.enumerate() {
            if raw.iter().all(|c| c.is_blank()) {
                continue;
            }
            line_numbers.push(i + 2);
            let row: RawRow = columns
                .iter()
                .map(|(idx, h)| (h.clone(), raw.get(*idx).cloned().unwrap_or(CellValue::Empty)))
                .collect();
            rows.push(row);
        }

        Self {
            name: name.to_string(),
            headers: columns.into_iter().map(|(_, h)| h).collect(),
            rows,
            line_numbers,
        }
    }

    /// Accepts either an array of objects keyed by header or an array of arrays
    /// with the header as the first row.
    pub fn from_json(name: &str, value: &Value) -> Result<Self, SheetError> {
        let Some(items) = value.as_array() else {
            return Err(SheetError::Parse("rows must be an array".into()));
        };
        if items.is_empty() {
            return Ok(Self {
                name: name.to_string(),
                ..Self::default()
            });
        }

        if items.iter().all(|v| v.is_array()) {
            let grid: Vec<Vec<CellValue>> = items
                .iter()
                .map(|r| {
                    r.as_array()
                        .map(|cells| cells.iter().map(CellValue::from_json).collect())
                        .unwrap_or_default()
                })
                .collect();
            return Ok(Self::from_grid(name, grid));
        }

        let mut headers: Vec<String> = Vec::new();
        let mut known: HashSet<String> = HashSet::new();
        for item in items {
            let Some(obj) = item.as_object() else {
                return Err(SheetError::Parse(
                    "rows must be all objects or all arrays".into(),
                ));
            };
            for k in obj.keys() {
                let h = k.trim().to_string();
                if !h.is_empty() && known.insert(h.clone()) {
                    headers.push(h);
                }
            }
        }

        let mut rows: Vec<RawRow> = Vec::new();
        let mut line_numbers: Vec<usize> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let obj = item.as_object().cloned().unwrap_or_default();
            let trimmed: HashMap<String, &Value> =
                obj.iter().map(|(k, v)| (k.trim().to_string(), v)).collect();
            let row: RawRow = headers
                .iter()
                .map(|h| {
                    let v = trimmed
                        .get(h)
                        .map(|v| CellValue::from_json(v))
                        .unwrap_or(CellValue::Empty);
                    (h.clone(), v)
                })
                .collect();
            if row.iter().all(|(_, v)| v.is_blank()) {
                continue;
            }
            rows.push(row);
            line_numbers.push(i + 2);
        }

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
            line_numbers,
        })
    }
}

/// Reads every sheet of a CSV/XLS/XLSX payload.
pub fn read_workbook(file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>, SheetError> {
    match SourceFormat::from_file_name(file_name)? {
        SourceFormat::Csv => Ok(vec![read_csv(file_name, bytes)?]),
        SourceFormat::Xls | SourceFormat::Xlsx => read_excel(bytes),
    }
}

pub fn read_first_sheet(file_name: &str, bytes: &[u8]) -> Result<Sheet, SheetError> {
    read_workbook(file_name, bytes)?
        .into_iter()
        .next()
        .ok_or(SheetError::EmptySheet)
}

fn read_csv(file_name: &str, bytes: &[u8]) -> Result<Sheet, SheetError> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    let mut grid: Vec<Vec<CellValue>> = Vec::new();
    for rec in reader.records() {
        let rec = rec?;
        grid.push(
            rec.iter()
                .map(|f| {
                    if f.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }

    let stem = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    Ok(Sheet::from_grid(stem, grid))
}

fn read_excel(bytes: &[u8]) -> Result<Vec<Sheet>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets: Vec<Sheet> = Vec::new();
    for name in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&name) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping sheet '{}': {}", name, e);
                continue;
            }
        };
        let grid: Vec<Vec<CellValue>> = range
            .rows()
            .map(|r| r.iter().map(cell_from_data).collect())
            .collect();
        sheets.push(Sheet::from_grid(&name, grid));
    }
    Ok(sheets)
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text((if *b { "TRUE" } else { "FALSE" }).to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match dt.as_datetime().filter(|_| dt.is_datetime()) {
                Some(ndt) => CellValue::Date {
                    serial,
                    text: ndt.format("%Y-%m-%d").to_string(),
                },
                None => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) => {
            CellValue::Text(s.split('T').next().unwrap_or(s.as_str()).to_string())
        }
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
