use crate::sheet::{CellValue, Sheet};
use serde::Serialize;

const ABC_HEADERS: &[&str] = &[
    "ABCID",
    "ABC_ID",
    "ABCACCOUNTID",
    "ABC_ACCOUNT_ID",
    "ABC ACCOUNT ID",
];

fn compact_header(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcReport {
    pub column: Option<String>,
    pub column_index: Option<usize>,
    pub checked: usize,
    pub errors: Vec<String>,
}

impl AbcReport {
    pub fn is_valid(&self) -> bool {
        self.column.is_some() && self.errors.is_empty()
    }
}

/// Expands `1.23456789012E+11` style text into plain digits.
fn expand_scientific(s: &str) -> Option<String> {
    let (mantissa, exp) = s.split_once(['e', 'E'])?;
    let exp: usize = exp.strip_prefix('+').unwrap_or(exp).parse().ok()?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() || !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits = format!("{int_part}{frac_part}");
    let pad = (exp + 1).saturating_sub(digits.len());
    Some(format!("{}{}", digits, "0".repeat(pad)))
}

fn abc_value(cell: &CellValue) -> String {
    let raw = match cell {
        CellValue::Number(n) => format!("{}", n.trunc() as i64),
        other => other.display(),
    };
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    expand_scientific(&compact).unwrap_or(compact)
}

/// Every non-blank data row must carry a 12-digit ABC account id.
pub fn validate_abc_ids(sheet: &Sheet) -> AbcReport {
    let targets: Vec<String> = ABC_HEADERS.iter().map(|h| compact_header(h)).collect();
    let Some(index) = sheet
        .headers
        .iter()
        .position(|h| targets.contains(&compact_header(h)))
    else {
        return AbcReport {
            errors: vec![
                "Required column \"ABCID\" not found. Try one of: ABCID, ABC_ACCOUNT_ID, ABC ACCOUNT ID."
                    .to_string(),
            ],
            ..AbcReport::default()
        };
    };
    let column = sheet.headers[index].clone();

    let mut errors = Vec::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        let line = sheet.line_numbers.get(i).copied().unwrap_or(i + 2);
        let cell = row.get(&column).unwrap_or(&CellValue::Empty);
        if cell.is_blank() {
            errors.push(format!("Row {line}: ABCID is missing."));
            continue;
        }
        let value = abc_value(cell);
        if value.len() != 12 || !value.chars().all(|c| c.is_ascii_digit()) {
            errors.push(format!(
                "Row {line}: ABCID must be exactly 12 digits. Found \"{value}\"."
            ));
        }
    }

    AbcReport {
        column: Some(column),
        column_index: Some(index),
        checked: sheet.rows.len(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[CellValue]]) -> Sheet {
        Sheet::from_grid("abc", rows.iter().map(|r| r.to_vec()).collect())
    }

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn scientific_notation_is_expanded() {
        assert_eq!(expand_scientific("1.23456789012E+11").as_deref(), Some("123456789012"));
        assert_eq!(expand_scientific("4E3").as_deref(), Some("4000"));
        assert_eq!(expand_scientific("12AB"), None);
    }

    #[test]
    fn reports_rows_by_sheet_position() {
        let sheet = grid(&[
            &[t("Name"), t("ABC Account ID")],
            &[t("Asha"), CellValue::Number(123456789012.0)],
            &[CellValue::Empty, CellValue::Empty],
            &[t("Ravi"), t("1234 5678 9012")],
            &[t("Mina"), t("")],
            &[t("Zed"), t("12345")],
            &[t("Kai"), t("1.23456789012E+11")],
        ]);
        let report = validate_abc_ids(&sheet);
        assert_eq!(report.column.as_deref(), Some("ABC Account ID"));
        assert_eq!(report.column_index, Some(1));
        assert_eq!(report.checked, 5);
        assert_eq!(
            report.errors,
            vec![
                "Row 5: ABCID is missing.".to_string(),
                "Row 6: ABCID must be exactly 12 digits. Found \"12345\".".to_string(),
            ]
        );
        assert!(!report.is_valid());
    }

    #[test]
    fn missing_column_is_a_single_error() {
        let sheet = grid(&[&[t("Name")], &[t("Asha")]]);
        let report = validate_abc_ids(&sheet);
        assert_eq!(report.errors.len(), 1);
        assert!(report.column.is_none());
    }
}
