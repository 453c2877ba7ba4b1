use crate::error::SheetError;
use crate::sheet::Sheet;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

const NAME_HEADERS: &[&str] = &[
    "name",
    "student name",
    "full name",
    "student_name",
    "studentname",
    "cname",
    "aadhaar_name",
    "aadhar_name",
    "candidate name",
    "candidate_name",
];

/// Name-like header: a known spelling, or anything containing `" name"` or
/// starting with `"name "`. Parent-name columns (`fname`, `mname`) never match.
pub fn is_name_header(header: &str) -> bool {
    let v = header.trim().to_lowercase();
    if v.is_empty() || v == "fname" || v == "mname" {
        return false;
    }
    NAME_HEADERS.contains(&v.as_str()) || v.contains(" name") || v.starts_with("name ")
}

/// Trimmed, lowercased, whitespace runs collapsed; `None` when blank.
pub fn normalize_name(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" ").to_lowercase())
}

/// File identity used for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileKey {
    pub name: String,
    pub size: u64,
    pub modified: i64,
}

#[derive(Debug)]
pub struct CounterFile {
    pub key: FileKey,
    pub sheets: Result<Vec<Sheet>, SheetError>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub name: String,
    pub unique_names: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterReport {
    pub union: usize,
    pub intersection: usize,
    pub processed_files: usize,
    pub files: Vec<FileSummary>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Default)]
pub struct NameCounter {
    seen: HashSet<FileKey>,
    union: BTreeSet<String>,
    /// `None` until a file contributes at least one name.
    intersection: Option<BTreeSet<String>>,
    files: Vec<FileSummary>,
}

fn names_in_sheet(sheet: &Sheet, out: &mut BTreeSet<String>) -> bool {
    let Some(col) = sheet.headers.iter().find(|h| is_name_header(h)) else {
        return false;
    };
    for row in &sheet.rows {
        if let Some(name) = row.get(col).and_then(|c| normalize_name(&c.display())) {
            out.insert(name);
        }
    }
    true
}

impl NameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn union(&self) -> &BTreeSet<String> {
        &self.union
    }

    pub fn intersection(&self) -> BTreeSet<String> {
        self.intersection.clone().unwrap_or_default()
    }

    /// Best effort over the batch: unreadable files and files without a name
    /// column are skipped, the rest still update the running sets.
    pub fn process(&mut self, files: Vec<CounterFile>) -> CounterReport {
        let mut skipped = Vec::new();
        for file in files {
            if self.seen.contains(&file.key) {
                continue;
            }
            let sheets = match file.sheets {
                Ok(sheets) => sheets,
                Err(e) => {
                    log::warn!("skipping {}: {}", file.key.name, e);
                    skipped.push(file.key.name.clone());
                    continue;
                }
            };

            let mut names = BTreeSet::new();
            let mut any_column = false;
            for sheet in &sheets {
                any_column |= names_in_sheet(sheet, &mut names);
            }
            if !any_column {
                log::warn!("skipping {}: no name column", file.key.name);
                skipped.push(file.key.name.clone());
            }

            if !names.is_empty() {
                self.union.extend(names.iter().cloned());
                self.intersection = Some(match self.intersection.take() {
                    None => names.clone(),
                    Some(prev) => prev.intersection(&names).cloned().collect(),
                });
                self.files.push(FileSummary {
                    name: file.key.name.clone(),
                    unique_names: names.len(),
                });
            }
            self.seen.insert(file.key);
        }

        log::info!(
            "name counter: {} unique, {} common across {} files",
            self.union.len(),
            self.intersection().len(),
            self.seen.len()
        );
        let mut report = self.status();
        report.skipped = skipped;
        report
    }

    pub fn status(&self) -> CounterReport {
        CounterReport {
            union: self.union.len(),
            intersection: self.intersection.as_ref().map_or(0, BTreeSet::len),
            processed_files: self.seen.len(),
            files: self.files.clone(),
            skipped: Vec::new(),
        }
    }
}
