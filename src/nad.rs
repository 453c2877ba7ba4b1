use crate::dates::{merge_split_date, normalize_cell, DateStyle};
use crate::error::SheetError;
use crate::sheet::{format_number, CellValue, OutRow, RawRow, Sheet};

const DATE_FIELDS: &[&str] = &["DOB", "DOI"];

/// Split day/month/year column triples merged into a date field, in merge order.
const SPLIT_DATE_FIELDS: &[(&str, &str, &str, &str)] = &[
    ("DOB", "DD", "MM", "YYYY"),
    ("DOB", "DOB_DD", "DOB_MM", "DOB_YYYY"),
    ("DOI", "DOI_DD", "DOI_MM", "DOI_YYYY"),
];

#[derive(Debug, Clone)]
pub struct NadOptions {
    pub default_term_type: String,
    /// Highest index scanned in each subject pattern.
    pub subject_slots: u32,
    pub date_1904: bool,
}

impl Default for NadOptions {
    fn default() -> Self {
        Self {
            default_term_type: "ANNUAL".to_string(),
            subject_slots: 20,
            date_1904: false,
        }
    }
}

/// Empty for absent, blank, non-finite and literal `nan` values; trimmed text otherwise.
pub fn clean_value(cell: Option<&CellValue>) -> String {
    let Some(cell) = cell else {
        return String::new();
    };
    if let CellValue::Number(n) = cell {
        return format_number(*n);
    }
    let s = cell.display().trim().to_string();
    if s.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        s
    }
}

fn cleaned(row: &RawRow, key: &str) -> String {
    clean_value(row.get(key))
}

fn present(row: &RawRow, key: &str) -> Option<String> {
    let v = cleaned(row, key);
    (!v.is_empty()).then_some(v)
}

/// First non-empty value of an ordered list of alternative columns.
fn first_present<S: AsRef<str>>(row: &RawRow, alternatives: &[S]) -> Option<String> {
    alternatives.iter().find_map(|k| present(row, k.as_ref()))
}

const SMALL: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

fn two_digits(n: usize) -> String {
    if n < 20 {
        return SMALL[n].to_string();
    }
    let (t, r) = (n / 10, n % 10);
    if r == 0 {
        TENS[t].to_string()
    } else {
        format!("{}-{}", TENS[t], SMALL[r])
    }
}

fn three_digits(n: usize) -> String {
    if n < 100 {
        return two_digits(n);
    }
    let (h, r) = (n / 100, n % 100);
    let head = format!("{} hundred", SMALL[h]);
    if r == 0 {
        head
    } else {
        format!("{} {}", head, two_digits(r))
    }
}

/// English words for 0..=2000 (rounded), `None` outside that range.
pub fn number_to_words(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    let n = n.round();
    if !(0.0..=2000.0).contains(&n) {
        return None;
    }
    let n = n as usize;
    let words = match n {
        2000 => "two thousand".to_string(),
        1000 => "one thousand".to_string(),
        1001..=1999 => format!("one thousand {}", three_digits(n - 1000)),
        _ => three_digits(n),
    };
    Some(words)
}

fn total_marks_in_words(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| *c != ',' && *c != ' ').collect();
    match compact.parse::<f64>().ok().and_then(number_to_words) {
        Some(w) => w.to_uppercase(),
        None => raw.to_string(),
    }
}

/// Next dense `SUB{n}` prefix. Shared by all three subject patterns, in order.
#[derive(Debug)]
struct SlotCounter {
    next: u32,
}

impl SlotCounter {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn claim(&mut self) -> String {
        let prefix = format!("SUB{}", self.next);
        self.next += 1;
        prefix
    }
}

struct Slot<'a> {
    prefix: String,
    out: &'a mut OutRow,
}

impl Slot<'_> {
    fn put(&mut self, suffix: &str, value: String) {
        self.out.set(format!("{}{}", self.prefix, suffix), value);
    }

    fn put_some(&mut self, suffix: &str, value: Option<String>) {
        if let Some(v) = value {
            self.put(suffix, v);
        }
    }
}

/// Claims the next `SUB{n}` prefix when either the code or the name column is populated.
fn open_slot<'a>(
    row: &RawRow,
    out: &'a mut OutRow,
    counter: &mut SlotCounter,
    code_col: &str,
    name_col: &str,
) -> Option<Slot<'a>> {
    let code = cleaned(row, code_col);
    let name = cleaned(row, name_col);
    if code.is_empty() && name.is_empty() {
        return None;
    }
    let mut slot = Slot {
        prefix: counter.claim(),
        out,
    };
    slot.put("NM", name);
    slot.put("", code);
    Some(slot)
}

/// How a theory subject (`COD{i}`/`SUB{i}`) reports its marks.
#[derive(Debug, Clone, PartialEq)]
enum TheoryMarks {
    /// External assessment, optional internal assessment and `T{i}` total.
    Split {
        external: String,
        internal: Option<String>,
        total: Option<String>,
    },
    /// Combined `TP{i}` total with its own bounds.
    Combined(String),
    /// Bare `T{i}` total.
    TotalOnly(String),
    Unmarked,
}

fn theory_marks(row: &RawRow, i: u32) -> TheoryMarks {
    if let Some(external) = first_present(row, &[format!("EA{i}"), format!("ME{i}")]) {
        return TheoryMarks::Split {
            external,
            internal: first_present(row, &[format!("IA{i}"), format!("EI{i}"), format!("MI{i}")]),
            total: present(row, &format!("T{i}")),
        };
    }
    if let Some(v) = present(row, &format!("TP{i}")) {
        return TheoryMarks::Combined(v);
    }
    if let Some(v) = present(row, &format!("T{i}")) {
        return TheoryMarks::TotalOnly(v);
    }
    TheoryMarks::Unmarked
}

fn emit_theory(row: &RawRow, out: &mut OutRow, counter: &mut SlotCounter, i: u32) {
    let Some(mut slot) = open_slot(row, out, counter, &format!("COD{i}"), &format!("SUB{i}"))
    else {
        return;
    };
    match theory_marks(row, i) {
        TheoryMarks::Split {
            external,
            internal,
            total,
        } => {
            slot.put_some("MAX", present(row, &format!("T{i}_MAX")));
            slot.put_some("MIN", present(row, &format!("T{i}_MIN")));
            slot.put("_TH_MRKS", external);
            slot.put_some("_CE_MRKS", internal);
            slot.put_some("_TOT", total);
        }
        TheoryMarks::Combined(total) => {
            slot.put_some("MAX", present(row, &format!("TP{i}_MAX")));
            slot.put_some("MIN", present(row, &format!("TP{i}_MIN")));
            slot.put("_TOT", total);
        }
        TheoryMarks::TotalOnly(total) => {
            slot.put_some("MAX", present(row, &format!("T{i}_MAX")));
            slot.put_some("MIN", present(row, &format!("T{i}_MIN")));
            slot.put("_TOT", total);
        }
        TheoryMarks::Unmarked => {}
    }
    slot.put("_REMARKS", cleaned(row, &format!("G{i}")));
}

/// Practical subject (`CODP{i}`/`SUBP{i}`) layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PracticalLayout {
    /// `EAP`, `IAP` and `PRP` all populated.
    Dissertation,
    Simple,
}

fn practical_layout(row: &RawRow, i: u32) -> PracticalLayout {
    let all = [format!("EAP{i}"), format!("IAP{i}"), format!("PRP{i}")]
        .iter()
        .all(|k| present(row, k).is_some());
    if all {
        PracticalLayout::Dissertation
    } else {
        PracticalLayout::Simple
    }
}

fn emit_practical(row: &RawRow, out: &mut OutRow, counter: &mut SlotCounter, i: u32) {
    let Some(mut slot) = open_slot(row, out, counter, &format!("CODP{i}"), &format!("SUBP{i}"))
    else {
        return;
    };
    let col = |base: &str, suffix: &str| present(row, &format!("{base}{i}{suffix}"));

    match practical_layout(row, i) {
        PracticalLayout::Dissertation => {
            slot.put_some("_TH_MRKS", col("EAP", ""));
            slot.put_some("_CE_MRKS", col("IAP", ""));
            slot.put_some("_PR_MRKS", col("PRP", ""));
            slot.put_some("_TH_MAX", col("EAP", "_MAX"));
            slot.put_some("_TH_MIN", col("EAP", "_MIN"));
            slot.put_some("_CE_MAX", col("IAP", "_MAX"));
            slot.put_some("_CE_MIN", col("IAP", "_MIN"));
            slot.put_some("_PR_MAX", col("PRP", "_MAX"));
            slot.put_some("_PR_MIN", col("PRP", "_MIN"));
            if let Some(total) = col("TP", "") {
                slot.put("_TOT", total);
                slot.put_some("MAX", col("TP", "_MAX"));
                slot.put_some("MIN", col("TP", "_MIN"));
            }
        }
        PracticalLayout::Simple => {
            if let Some(theory) = col("EAP", "") {
                slot.put("_TH_MRKS", theory);
                slot.put_some("_CE_MRKS", col("IAP", ""));
                slot.put_some("_TH_MAX", col("EAP", "_MAX"));
                slot.put_some("_TH_MIN", col("EAP", "_MIN"));
                slot.put_some("_CE_MAX", col("IAP", "_MAX"));
                slot.put_some("_CE_MIN", col("IAP", "_MIN"));
            }
            slot.put_some("MAX", col("P", "_MAX"));
            slot.put_some("MIN", col("P", "_MIN"));
            if let Some(total) = col("TP", "") {
                slot.put("_TOT", total);
                slot.put_some("MAX", col("TP", "_MAX"));
                slot.put_some("MIN", col("TP", "_MIN"));
            } else if let Some(total) = col("P", "") {
                slot.put("_TOT", total);
            }
        }
    }
}

/// Combined theory+practical layout (`CODTP{i}`/`SUBTP{i}`). Every field is written.
fn emit_combined(row: &RawRow, out: &mut OutRow, counter: &mut SlotCounter, i: u32) {
    let Some(mut slot) = open_slot(row, out, counter, &format!("CODTP{i}"), &format!("SUBTP{i}"))
    else {
        return;
    };
    slot.put("MAX", cleaned(row, &format!("T{i}_MAX")));
    slot.put("_TH_MRKS", cleaned(row, &format!("TT{i}")));
    slot.put("_PR_MRKS", cleaned(row, &format!("P{i}")));
    slot.put("_REMARKS", cleaned(row, &format!("G{i}")));
    slot.put("_TOT", cleaned(row, &format!("T{i}")));
}

pub fn transform_row(row: &RawRow, course: &str) -> OutRow {
    transform_row_with(row, course, &NadOptions::default())
}

pub fn transform_row_with(row: &RawRow, course: &str, opts: &NadOptions) -> OutRow {
    let mut out = OutRow::new();
    let copy = |out: &mut OutRow, to: &str, from: &str| out.set(to, cleaned(row, from));
    let chain = |out: &mut OutRow, to: &str, from: &[&str]| {
        out.set(to, first_present(row, from).unwrap_or_default())
    };

    copy(&mut out, "ORG_NAME", "ORG_NAME");
    copy(&mut out, "ACADEMIC_COURSE_ID", "ACADEMIC_COURSE_ID");
    let course = course.trim();
    if course.is_empty() {
        copy(&mut out, "COURSE_NAME", "COURSE_NAME");
    } else {
        out.set("COURSE_NAME", course.to_string());
    }
    copy(&mut out, "ADMISSION_YEAR", "ADMISSION_YEAR");
    copy(&mut out, "STREAM", "STREAM");
    copy(&mut out, "BATCH", "BATCH");
    out.set("ABC_ACCOUNT_ID", String::new());
    copy(&mut out, "SESSION", "SESSION");

    chain(&mut out, "REGN_NO", &["ENO", "REGN_NO"]);
    chain(&mut out, "RROLL", &["RNO", "RROLL"]);
    chain(&mut out, "CNAME", &["NAME", "CNAME"]);
    copy(&mut out, "AADHAAR_NAME", "AADHAAR_NAME");
    copy(&mut out, "DOB", "DOB");
    chain(&mut out, "GENDER", &["SEX", "GENDER"]);
    chain(&mut out, "CASTE", &["CAST", "CASTE"]);
    copy(&mut out, "CATEGORY", "CAT");
    copy(&mut out, "FNAME", "FNAME");
    copy(&mut out, "MNAME", "MNAME");

    out.set(
        "MRKS_REC_STATUS",
        present(row, "MRKS_REC_STATUS").unwrap_or_else(|| "O".to_string()),
    );
    copy(&mut out, "YEAR", "YEAR");
    copy(&mut out, "MONTH", "MONTH");
    copy(&mut out, "RESULT", "RESULT");
    copy(&mut out, "RESULT_TH", "TRES");
    copy(&mut out, "RESULT_PR", "PRES");
    copy(&mut out, "DOI", "DOI");
    copy(&mut out, "REMARKS", "REMARKS");
    copy(&mut out, "CENTRE_NAME", "EXAM_CENTRE");
    copy(&mut out, "EXAM_TYPE", "EXAM_TYPE");

    chain(&mut out, "TOT", &["GTOT_MAX", "TOT"]);
    copy(&mut out, "TOT_MRKS", "GTOT");
    copy(&mut out, "TOT_TH_MRKS", "TTOT");
    copy(&mut out, "TOT_PR_MRKS", "PTOT");
    copy(&mut out, "GRAND_TOT_MAX", "GGTOT_MAX");
    copy(&mut out, "GRAND_TOT_MRKS", "GGTOT");
    copy(&mut out, "DIVISION", "DIV");

    let words = first_present(row, &["TOT_MRKS", "GTOT"])
        .map(|raw| total_marks_in_words(&raw))
        .unwrap_or_default();
    out.set("TOT_MRKS_WRDS", words);

    let term = first_present(row, &["TERM_TYPE", "TERM TYPE"])
        .unwrap_or_else(|| opts.default_term_type.clone());
    out.set("TERM_TYPE", term);

    let mut counter = SlotCounter::new();
    for i in 1..=opts.subject_slots {
        emit_theory(row, &mut out, &mut counter, i);
    }
    for i in 1..=opts.subject_slots {
        emit_practical(row, &mut out, &mut counter, i);
    }
    for i in 1..=opts.subject_slots {
        emit_combined(row, &mut out, &mut counter, i);
    }
    out
}

fn is_dash_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[2] == b'-'
        && b[5] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 2 || i == 5 || c.is_ascii_digit())
}

/// Merges split date columns and rewrites `DOB`/`DOI` as `DD-MM-YYYY` text.
pub fn prepare_row(row: &mut RawRow, date_1904: bool) {
    for (target, d, m, y) in SPLIT_DATE_FIELDS {
        merge_split_date(row, target, d, m, y, DateStyle::Dash);
    }
    for key in DATE_FIELDS {
        let Some(cell) = row.get(key) else {
            continue;
        };
        if let CellValue::Text(s) = cell {
            if is_dash_date(s.trim()) {
                continue;
            }
        }
        let text = normalize_cell(Some(cell), date_1904, DateStyle::Dash);
        row.set(*key, CellValue::Text(text));
    }
}

/// Prepares and transforms every row of a sheet for the selected course.
pub fn transform_sheet(
    sheet: &Sheet,
    course: &str,
    opts: &NadOptions,
) -> Result<Vec<OutRow>, SheetError> {
    if course.trim().is_empty() {
        return Err(SheetError::MissingCourseSelection);
    }
    if sheet.rows.is_empty() {
        return Err(SheetError::EmptySheet);
    }
    Ok(sheet
        .rows
        .iter()
        .map(|raw| {
            let mut working = raw.clone();
            prepare_row(&mut working, opts.date_1904);
            transform_row_with(&working, course, opts)
        })
        .collect())
}
