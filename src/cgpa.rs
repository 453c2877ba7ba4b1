use crate::error::SheetError;
use crate::headers::{resolve_header_map, resolve_student_key, Field, HeaderMap};
use crate::sheet::{format_number, CellValue, OutRow, RawRow, Sheet};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_DECIMALS: u32 = 2;

/// Per-student totals for one semester. Credits and points include due
/// (backlog) totals; `sgpa` is computed from the base columns only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterEntry {
    pub total_credits: f64,
    pub total_credit_points: f64,
    pub sgpa: Option<f64>,
}

impl SemesterEntry {
    const ZERO: Self = Self {
        total_credits: 0.0,
        total_credit_points: 0.0,
        sgpa: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeTotals {
    pub credits: f64,
    pub credit_points: f64,
    pub cgpa: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregatorState {
    Idle,
    Accumulating,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub semester: u32,
    pub students: usize,
    pub student_key: String,
    pub header_map: HeaderMap,
    pub state: AggregatorState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterStatus {
    pub index: u32,
    pub students: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CgpaStatus {
    pub course: Option<String>,
    pub total_sems: u32,
    pub state: AggregatorState,
    pub semesters: Vec<SemesterStatus>,
    pub merged_students: usize,
}

#[derive(Debug, Clone)]
pub struct FinalExport {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<OutRow>,
}

/// Last-semester snapshot kept for the final export. Student ids are
/// already uppercased; asterisks are still in place.
#[derive(Debug, Clone)]
struct LastSemester {
    sheet: Sheet,
    student_key: String,
}

#[derive(Debug)]
pub struct CgpaAggregator {
    course: Option<String>,
    total_sems: u32,
    decimals: u32,
    semesters: BTreeMap<u32, HashMap<String, SemesterEntry>>,
    merged: BTreeMap<String, BTreeMap<u32, Option<f64>>>,
    last: Option<LastSemester>,
}

impl Default for CgpaAggregator {
    fn default() -> Self {
        Self {
            course: None,
            total_sems: 0,
            decimals: DEFAULT_DECIMALS,
            semesters: BTreeMap::new(),
            merged: BTreeMap::new(),
            last: None,
        }
    }
}

fn round_to(v: f64, decimals: u32) -> f64 {
    let f = 10f64.powi(decimals as i32);
    (v * f).round() / f
}

fn strip_asterisks(s: &str) -> String {
    s.replace('*', "").trim().to_string()
}

fn is_all_asterisks(cell: Option<&CellValue>) -> bool {
    match cell {
        Some(CellValue::Text(s)) => {
            let t = s.trim();
            !t.is_empty() && t.chars().all(|c| c == '*')
        }
        _ => false,
    }
}

fn row_has_asterisk(row: &RawRow) -> bool {
    row.iter()
        .any(|(_, v)| matches!(v, CellValue::Text(s) if s.contains('*')))
}

/// Masked when any cell carries `*`, or a resolved marks-total column is only asterisks.
pub fn should_mask(row: &RawRow, map: &HeaderMap) -> bool {
    if row_has_asterisk(row) {
        return true;
    }
    [Field::GrandTotMrks, Field::TotMrks]
        .iter()
        .filter_map(|f| map.get(*f))
        .any(|col| is_all_asterisks(row.get(col)))
}

fn numeric(row: &RawRow, col: Option<&str>) -> f64 {
    let Some(col) = col else {
        return 0.0;
    };
    match row.get(col) {
        Some(CellValue::Text(s)) => CellValue::Text(strip_asterisks(s)).as_f64().unwrap_or(0.0),
        Some(other) => other.as_f64().unwrap_or(0.0),
        None => 0.0,
    }
}

/// Totals from the first row of a student's group with a positive credit total.
fn entry_for_student(rows: &[&RawRow], map: &HeaderMap, decimals: u32) -> SemesterEntry {
    for row in rows {
        let base_credits = numeric(row, map.get(Field::TotalCredit));
        if base_credits <= 0.0 {
            continue;
        }
        let base_points = numeric(row, map.get(Field::TotalCreditPoint));
        let due_credits = numeric(row, map.get(Field::TotalDueCredits));
        let due_points = numeric(row, map.get(Field::TotalDueCreditPoints));
        return SemesterEntry {
            total_credits: base_credits + due_credits,
            total_credit_points: base_points + due_points,
            sgpa: Some(round_to(base_points / base_credits, decimals)),
        };
    }
    SemesterEntry::ZERO
}

fn uppercase_ids(sheet: &mut Sheet, key: &str) {
    for row in &mut sheet.rows {
        let Some(cell) = row.get(key) else {
            continue;
        };
        let id = cell.display().trim().to_uppercase();
        row.set(key, CellValue::Text(id));
    }
}

impl CgpaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a course and clears every recorded semester.
    pub fn select_course(&mut self, name: &str, total_sems: u32) {
        self.reset();
        self.course = Some(name.to_string());
        self.total_sems = total_sems;
    }

    pub fn reset(&mut self) {
        self.semesters.clear();
        self.merged.clear();
        self.last = None;
    }

    pub fn set_decimals(&mut self, decimals: u32) {
        self.decimals = decimals;
    }

    pub fn course(&self) -> Option<&str> {
        self.course.as_deref()
    }

    pub fn total_sems(&self) -> u32 {
        self.total_sems
    }

    pub fn state(&self) -> AggregatorState {
        if self.last.is_some() {
            AggregatorState::Complete
        } else if self.semesters.is_empty() {
            AggregatorState::Idle
        } else {
            AggregatorState::Accumulating
        }
    }

    pub fn semester(&self, index: u32) -> Option<&HashMap<String, SemesterEntry>> {
        self.semesters.get(&index)
    }

    /// Read-only SGPA projection, student -> semester -> SGPA.
    pub fn merged(&self) -> &BTreeMap<String, BTreeMap<u32, Option<f64>>> {
        &self.merged
    }

    /// Records one semester sheet. Nothing is committed unless every check passes.
    pub fn upload(&mut self, semester: u32, mut sheet: Sheet) -> Result<UploadOutcome, SheetError> {
        if self.course.is_none() {
            return Err(SheetError::MissingCourseSelection);
        }
        if semester == 0 || semester > self.total_sems {
            return Err(SheetError::InvalidSemester {
                index: semester,
                total: self.total_sems,
            });
        }
        if sheet.rows.is_empty() {
            return Err(SheetError::EmptySheet);
        }
        let student_key = resolve_student_key(&sheet.headers).ok_or(SheetError::MissingStudentKey)?;
        let map = resolve_header_map(&sheet.headers);
        if map.get(Field::TotalCredit).is_none() || map.get(Field::TotalCreditPoint).is_none() {
            return Err(SheetError::MissingTotals);
        }

        uppercase_ids(&mut sheet, &student_key);

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&RawRow>> = HashMap::new();
        for row in &sheet.rows {
            let id = row.get(&student_key).map(|c| c.display()).unwrap_or_default();
            if id.is_empty() {
                continue;
            }
            groups
                .entry(id.clone())
                .or_insert_with(|| {
                    order.push(id);
                    Vec::new()
                })
                .push(row);
        }

        let per_sem: HashMap<String, SemesterEntry> = order
            .iter()
            .map(|id| {
                let rows = groups.get(id).map(Vec::as_slice).unwrap_or(&[]);
                (id.clone(), entry_for_student(rows, &map, self.decimals))
            })
            .collect();
        let students = per_sem.len();
        drop(groups);

        self.semesters.insert(semester, per_sem);
        self.recompute_merged();
        if semester == self.total_sems {
            self.last = Some(LastSemester {
                sheet,
                student_key: student_key.clone(),
            });
        }
        log::info!(
            "semester {} recorded for {}: {} students",
            semester,
            self.course.as_deref().unwrap_or(""),
            students
        );

        Ok(UploadOutcome {
            semester,
            students,
            student_key,
            header_map: map,
            state: self.state(),
        })
    }

    fn recompute_merged(&mut self) {
        let mut merged: BTreeMap<String, BTreeMap<u32, Option<f64>>> = BTreeMap::new();
        for (sem, entries) in &self.semesters {
            for (id, entry) in entries {
                merged.entry(id.clone()).or_default().insert(*sem, entry.sgpa);
            }
        }
        self.merged = merged;
    }

    /// Credit-weighted CGPA over every recorded semester. Semesters with a zero
    /// credit or point total contribute nothing.
    pub fn cumulative(&self, student: &str) -> CumulativeTotals {
        let (credits, credit_points) = self
            .semesters
            .values()
            .filter_map(|m| m.get(student))
            .filter(|e| e.total_credits != 0.0 && e.total_credit_points != 0.0)
            .fold((0.0, 0.0), |(c, p), e| {
                (c + e.total_credits, p + e.total_credit_points)
            });
        let cgpa = (credits != 0.0).then(|| round_to(credit_points / credits, self.decimals));
        CumulativeTotals {
            credits,
            credit_points,
            cgpa,
        }
    }

    pub fn status(&self) -> CgpaStatus {
        CgpaStatus {
            course: self.course.clone(),
            total_sems: self.total_sems,
            state: self.state(),
            semesters: self
                .semesters
                .iter()
                .map(|(index, m)| SemesterStatus {
                    index: *index,
                    students: m.len(),
                })
                .collect(),
            merged_students: self.merged.len(),
        }
    }

    fn render(&self, v: f64) -> String {
        format!("{:.*}", self.decimals as usize, v)
    }

    /// Last-semester rows annotated with per-semester SGPA and cumulative totals.
    pub fn final_export(&self) -> Result<FinalExport, SheetError> {
        let Some(last) = &self.last else {
            return Err(SheetError::MissingLastSemester);
        };
        let map = resolve_header_map(&last.sheet.headers);
        let sems: Vec<u32> = self.semesters.keys().copied().collect();

        // Computed columns already in the sheet are overwritten in place.
        let mut headers = last.sheet.headers.clone();
        let computed = sems
            .iter()
            .map(|s| format!("SGPA_SEM_{}", s))
            .chain(
                ["TOTAL_CGPA_CREDITS", "TOTAL_CGPA_CREDIT_POINTS", "CGPA"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        for name in computed {
            if !headers.contains(&name) {
                headers.push(name);
            }
        }

        let rows = last
            .sheet
            .rows
            .iter()
            .map(|row| self.final_row(row, &last.student_key, &map, &sems))
            .collect();

        let course = self.course.as_deref().filter(|c| !c.is_empty()).unwrap_or("Course");
        Ok(FinalExport {
            file_name: format!("{}_CGPA_Final.csv", course),
            headers,
            rows,
        })
    }

    fn final_row(&self, row: &RawRow, key: &str, map: &HeaderMap, sems: &[u32]) -> OutRow {
        let masked = should_mask(row, map);
        let mut out: OutRow = row
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    CellValue::Text(s) => strip_asterisks(s),
                    other => other.display(),
                };
                (k, text)
            })
            .collect();

        let id = row.get(key).map(|c| c.display()).unwrap_or_default();
        if masked {
            for s in sems {
                out.set(format!("SGPA_SEM_{}", s), String::new());
            }
            out.set("TOTAL_CGPA_CREDITS", String::new());
            out.set("TOTAL_CGPA_CREDIT_POINTS", String::new());
            out.set("CGPA", String::new());
            return out;
        }

        let per_sem = self.merged.get(&id);
        for s in sems {
            let sgpa = per_sem
                .and_then(|m| m.get(s).copied().flatten())
                .map(|v| self.render(v))
                .unwrap_or_default();
            out.set(format!("SGPA_SEM_{}", s), sgpa);
        }
        let totals = self.cumulative(&id);
        let nonzero = |v: f64| if v == 0.0 { String::new() } else { format_number(v) };
        out.set("TOTAL_CGPA_CREDITS", nonzero(totals.credits));
        out.set("TOTAL_CGPA_CREDIT_POINTS", nonzero(totals.credit_points));
        out.set(
            "CGPA",
            totals.cgpa.map(|v| self.render(v)).unwrap_or_default(),
        );
        out
    }
}
