use crate::dates::{normalize_cell, DateStyle};
use crate::sheet::{OutRow, RawRow};

/// Fixed degree-certificate schema, in export order.
pub const DEGREE_COLUMNS: [&str; 18] = [
    "ORG_NAME",
    "ACADEMIC_COURSE_ID",
    "COURSE_NAME",
    "STREAM",
    "REGN_NO",
    "RROLL",
    "CNAME",
    "GENDER",
    "DOB",
    "MRKS_REC_STATUS",
    "RESULT",
    "YEAR",
    "DIVISION",
    "DOI",
    "CERT_NO",
    "CGPA",
    "REMARKS",
    "AADHAAR_NAME",
];

const DATE_COLUMNS: [&str; 2] = ["DOB", "DOI"];

#[derive(Debug, Clone, Default)]
pub struct DegreeExport {
    pub rows: Vec<OutRow>,
}

impl DegreeExport {
    /// Same rows with every non-empty date written as a text formula.
    pub fn excel_safe_rows(&self) -> Vec<OutRow> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| {
                        let v = if DATE_COLUMNS.contains(&k) {
                            excel_safe(v)
                        } else {
                            v.clone()
                        };
                        (k, v)
                    })
                    .collect::<OutRow>()
            })
            .collect()
    }
}

/// `="12/05/2001"` keeps spreadsheet apps from reinterpreting the date.
pub fn excel_safe(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("=\"{}\"", value.replace('"', "\"\""))
    }
}

/// Projects rows onto [`DEGREE_COLUMNS`]; absent columns become empty strings.
pub fn trim_for_degree_export(rows: &[RawRow], date_1904: bool) -> DegreeExport {
    let rows: Vec<OutRow> = rows
        .iter()
        .map(|raw| {
            DEGREE_COLUMNS
                .iter()
                .map(|&col| {
                    let cell = raw.get(col);
                    let value = if DATE_COLUMNS.contains(&col) {
                        normalize_cell(cell, date_1904, DateStyle::Slash)
                    } else {
                        cell.map(|c| c.display().trim().to_string())
                            .unwrap_or_default()
                    };
                    (col, value)
                })
                .collect::<OutRow>()
        })
        .collect();
    DegreeExport { rows }
}
