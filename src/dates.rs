use crate::sheet::{CellValue, RawRow};
use chrono::{Datelike, Duration, NaiveDate};

/// Two-digit years below this pivot land in the 2000s, the rest in the 1900s.
const YEAR_PIVOT: i32 = 30;
const MIN_YEAR: i32 = 1800;
/// 9999-12-31 in the 1900 date system.
const MAX_SERIAL: f64 = 2_958_465.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `DD/MM/YYYY`, degree exports.
    Slash,
    /// `DD-MM-YYYY`, NAD transform.
    Dash,
}

impl DateStyle {
    fn separator(self) -> char {
        match self {
            Self::Slash => '/',
            Self::Dash => '-',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ymd {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Ymd {
    pub fn format(&self, style: DateStyle) -> String {
        let sep = style.separator();
        format!("{:02}{sep}{:02}{sep}{:04}", self.day, self.month, self.year)
    }

    fn checked(year: i32, month: u32, day: u32) -> Option<Self> {
        if year >= MIN_YEAR && (1..=12).contains(&month) && (1..=31).contains(&day) {
            Some(Self { year, month, day })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateInput<'a> {
    /// Text the source cell rendered, preferred over the raw value when non-blank.
    pub display_text: Option<&'a str>,
    pub raw: Option<&'a CellValue>,
    pub date_1904: bool,
}

/// Canonical text for a date cell, or the trimmed source text when nothing matches.
pub fn normalize_date(input: DateInput<'_>, style: DateStyle) -> String {
    let display = input.display_text.map(str::trim).unwrap_or("");
    let primary = if !display.is_empty() {
        display.to_string()
    } else {
        input.raw.map(|v| v.display()).unwrap_or_default().trim().to_string()
    };

    if is_numeric_like(&primary) {
        if let Ok(serial) = primary.parse::<f64>() {
            if let Some(ymd) = serial_to_ymd(serial, input.date_1904) {
                return ymd.format(style);
            }
        }
    }

    match parse_date_text(&primary) {
        Some(ymd) => ymd.format(style),
        None => primary,
    }
}

/// Convenience for a single cell: a date-typed cell contributes its rendered text.
pub fn normalize_cell(cell: Option<&CellValue>, date_1904: bool, style: DateStyle) -> String {
    let display_text = match cell {
        Some(CellValue::Date { text, .. }) => Some(text.as_str()),
        _ => None,
    };
    normalize_date(
        DateInput {
            display_text,
            raw: cell,
            date_1904,
        },
        style,
    )
}

fn is_numeric_like(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if body.is_empty() {
        return false;
    }
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    match frac_part {
        None => !int_part.is_empty() && digits(int_part),
        Some(f) => digits(int_part) && digits(f) && !(int_part.is_empty() && f.is_empty()),
    }
}

/// Decodes a spreadsheet serial day number. The 1900 system keeps the phantom
/// 1900-02-29 at serial 60; serial 0 (1900-01-00) has no calendar date.
pub fn serial_to_ymd(serial: f64, date_1904: bool) -> Option<Ymd> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;

    let date = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)? + Duration::days(days)
    } else {
        match days {
            0 => return None,
            60 => {
                return Some(Ymd {
                    year: 1900,
                    month: 2,
                    day: 29,
                })
            }
            d if d < 60 => NaiveDate::from_ymd_opt(1899, 12, 31)? + Duration::days(d),
            d => NaiveDate::from_ymd_opt(1899, 12, 30)? + Duration::days(d),
        }
    };

    Some(Ymd {
        year: date.year(),
        month: date.month(),
        day: date.day(),
    })
}

/// Inverse of [`serial_to_ymd`] for real calendar dates. Dates before the
/// epoch (1900-01-01, or 1904-01-01 in the 1904 system) have no serial.
pub fn ymd_to_serial(ymd: Ymd, date_1904: bool) -> Option<f64> {
    let date = NaiveDate::from_ymd_opt(ymd.year, ymd.month, ymd.day)?;
    let (days, first) = if date_1904 {
        ((date - NaiveDate::from_ymd_opt(1904, 1, 1)?).num_days(), 0)
    } else {
        let d = (date - NaiveDate::from_ymd_opt(1899, 12, 30)?).num_days();
        (if d <= 60 { d - 1 } else { d }, 1)
    };
    (days >= first).then_some(days as f64)
}

fn expand_year(y: i32) -> i32 {
    if y < 100 {
        y + if y >= YEAR_PIVOT { 1900 } else { 2000 }
    } else {
        y
    }
}

fn month_index(s: &str) -> Option<u32> {
    let m = match s.to_ascii_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(m)
}

fn all_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
}

/// Tries, in order: `YYYY-MM-DD`, `D-M-YYYY`, `D Mon YYYY`, `Mon D, YYYY`.
/// Separators `/`, `-` and `.` are interchangeable.
pub fn parse_date_text(s: &str) -> Option<Ymd> {
    let src = s.trim();
    if src.is_empty() {
        return None;
    }

    let parts: Vec<&str> = src.split(['/', '-', '.']).collect();
    if parts.len() == 3 {
        let (a, b, c) = (parts[0], parts[1], parts[2]);
        if all_digits(a, 4, 4) && all_digits(b, 1, 2) && all_digits(c, 1, 2) {
            if let Some(ymd) = Ymd::checked(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?) {
                return Some(ymd);
            }
        }
        if all_digits(a, 1, 2) && all_digits(b, 1, 2) && all_digits(c, 2, 4) {
            let y = expand_year(c.parse().ok()?);
            if let Some(ymd) = Ymd::checked(y, b.parse().ok()?, a.parse().ok()?) {
                return Some(ymd);
            }
        }
    }

    let words: Vec<&str> = src.split_whitespace().collect();
    if words.len() == 3 && all_digits(words[0], 1, 2) && all_digits(words[2], 2, 4) {
        if let Some(month) = month_index(words[1]) {
            let y = expand_year(words[2].parse().ok()?);
            if let Some(ymd) = Ymd::checked(y, month, words[0].parse().ok()?) {
                return Some(ymd);
            }
        }
    }

    if let Some((mon, rest)) = src.split_once(char::is_whitespace) {
        if let Some((day, year)) = rest.trim_start().split_once(',') {
            let year = year.trim_start();
            if all_digits(day, 1, 2) && all_digits(year, 2, 4) {
                if let Some(month) = month_index(mon) {
                    let y = expand_year(year.parse().ok()?);
                    return Ymd::checked(y, month, day.parse().ok()?);
                }
            }
        }
    }

    None
}

/// Leading-integer read of a cell, the way a lenient spreadsheet formula would.
fn leading_int(cell: &CellValue) -> Option<i32> {
    if let CellValue::Number(n) = cell {
        return n.is_finite().then(|| n.trunc() as i32);
    }
    let text = cell.display();
    let t = text.trim();
    let (sign, body) = match t.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, t.strip_prefix('+').unwrap_or(t)),
    };
    let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i32>().ok().map(|v| sign * v)
}

/// Pure half of the split-field merge: validated date from day/month/year cells.
pub fn merge_split_parts(day: &CellValue, month: &CellValue, year: &CellValue) -> Option<Ymd> {
    let d = leading_int(day)?;
    let m = leading_int(month)?;
    let y = expand_year(leading_int(year)?);
    if d < 1 || m < 1 {
        return None;
    }
    Ymd::checked(y, m as u32, d as u32)
}

/// Writes `target` from three split columns when all of them parse and pass range
/// checks. Leaves the row untouched otherwise.
pub fn merge_split_date(
    row: &mut RawRow,
    target: &str,
    day_field: &str,
    month_field: &str,
    year_field: &str,
    style: DateStyle,
) {
    let merged = match (row.get(day_field), row.get(month_field), row.get(year_field)) {
        (Some(d), Some(m), Some(y)) => merge_split_parts(d, m, y),
        _ => None,
    };
    if let Some(ymd) = merged {
        row.set(target, CellValue::Text(ymd.format(style)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn norm(s: &str) -> String {
        let cell = text(s);
        normalize_date(
            DateInput {
                display_text: None,
                raw: Some(&cell),
                date_1904: false,
            },
            DateStyle::Slash,
        )
    }

    #[test]
    fn free_text_patterns() {
        assert_eq!(norm("2003-06-10"), "10/06/2003");
        assert_eq!(norm("2003/6/1"), "01/06/2003");
        assert_eq!(norm("10/6/2003"), "10/06/2003");
        assert_eq!(norm("10.6.03"), "10/06/2003");
        assert_eq!(norm("10-6-45"), "10/06/1945");
        assert_eq!(norm("10 Jun 2003"), "10/06/2003");
        assert_eq!(norm("10 september 1999"), "10/09/1999");
        assert_eq!(norm("June 10, 2003"), "10/06/2003");
        assert_eq!(norm("Sept 5,1998"), "05/09/1998");
    }

    #[test]
    fn unparseable_text_is_returned_trimmed() {
        assert_eq!(norm("  not a date "), "not a date");
        assert_eq!(norm("32/01/2003"), "32/01/2003");
        assert_eq!(norm("10 Foo 2003"), "10 Foo 2003");
        assert_eq!(norm("1799-01-01"), "1799-01-01");
        assert_eq!(norm(""), "");
    }

    #[test]
    fn numeric_text_is_a_serial() {
        // 2003-06-10 is serial 37782 in the 1900 system.
        assert_eq!(norm("37782"), "10/06/2003");
        let n = CellValue::Number(37782.0);
        let dash = normalize_date(
            DateInput {
                display_text: None,
                raw: Some(&n),
                date_1904: false,
            },
            DateStyle::Dash,
        );
        assert_eq!(dash, "10-06-2003");
        let in_1904 = normalize_date(
            DateInput {
                display_text: None,
                raw: Some(&CellValue::Number(36320.0)),
                date_1904: true,
            },
            DateStyle::Dash,
        );
        assert_eq!(in_1904, "10-06-2003");
    }

    #[test]
    fn display_text_wins_over_raw_value() {
        let raw = CellValue::Number(37782.0);
        let out = normalize_date(
            DateInput {
                display_text: Some("11 Jun 2003"),
                raw: Some(&raw),
                date_1904: false,
            },
            DateStyle::Slash,
        );
        assert_eq!(out, "11/06/2003");
        let date_cell = CellValue::Date {
            serial: 37782.0,
            text: "2003-06-10".into(),
        };
        assert_eq!(
            normalize_cell(Some(&date_cell), false, DateStyle::Dash),
            "10-06-2003"
        );
    }

    #[test]
    fn serial_edge_cases() {
        assert_eq!(serial_to_ymd(0.0, false), None);
        assert_eq!(
            serial_to_ymd(1.0, false),
            Some(Ymd { year: 1900, month: 1, day: 1 })
        );
        assert_eq!(
            serial_to_ymd(60.0, false),
            Some(Ymd { year: 1900, month: 2, day: 29 })
        );
        assert_eq!(
            serial_to_ymd(61.0, false),
            Some(Ymd { year: 1900, month: 3, day: 1 })
        );
        assert_eq!(serial_to_ymd(-3.0, false), None);
        assert_eq!(
            serial_to_ymd(37782.75, false),
            Some(Ymd { year: 2003, month: 6, day: 10 })
        );
    }

    #[test]
    fn split_date_merge() {
        let mut row: RawRow = [
            ("DOB_DD", text("5")),
            ("DOB_MM", CellValue::Number(7.0)),
            ("DOB_YYYY", text("99")),
        ]
        .into_iter()
        .collect();
        merge_split_date(&mut row, "DOB", "DOB_DD", "DOB_MM", "DOB_YYYY", DateStyle::Dash);
        assert_eq!(row.get("DOB"), Some(&text("05-07-1999")));

        let mut bad: RawRow = [("DD", text("31")), ("MM", text("13")), ("YYYY", text("2001"))]
            .into_iter()
            .collect();
        merge_split_date(&mut bad, "DOB", "DD", "MM", "YYYY", DateStyle::Dash);
        assert!(!bad.contains("DOB"));

        let mut missing: RawRow = [("DD", text("1")), ("MM", text("1"))].into_iter().collect();
        merge_split_date(&mut missing, "DOB", "DD", "MM", "YYYY", DateStyle::Dash);
        assert!(!missing.contains("DOB"));

        let mut blank: RawRow = [
            ("DD", text("")),
            ("MM", text("1")),
            ("YYYY", text("2001")),
            ("DOB", text("keep")),
        ]
        .into_iter()
        .collect();
        merge_split_date(&mut blank, "DOB", "DD", "MM", "YYYY", DateStyle::Dash);
        assert_eq!(blank.get("DOB"), Some(&text("keep")));
    }

    #[test]
    fn serial_epoch_boundaries() {
        let ymd = |year, month, day| Ymd { year, month, day };
        assert_eq!(ymd_to_serial(ymd(1899, 12, 31), false), None);
        assert_eq!(ymd_to_serial(ymd(1850, 6, 1), false), None);
        assert_eq!(ymd_to_serial(ymd(1903, 12, 31), true), None);
        assert_eq!(ymd_to_serial(ymd(1904, 1, 1), true), Some(0.0));
        assert_eq!(serial_to_ymd(0.0, true), Some(ymd(1904, 1, 1)));
        for (date, serial) in [
            (ymd(1900, 1, 1), 1.0),
            (ymd(1900, 2, 28), 59.0),
            (ymd(1900, 3, 1), 61.0),
        ] {
            assert_eq!(ymd_to_serial(date, false), Some(serial));
            assert_eq!(serial_to_ymd(serial, false), Some(date));
        }
    }

    proptest! {
        // Serials cover dates from the epoch on; earlier dates only arrive as text.
        #[test]
        fn serial_round_trip(year in 1800i32..=2099, month in 1u32..=12, day in 1u32..=31, date_1904 in any::<bool>()) {
            prop_assume!(NaiveDate::from_ymd_opt(year, month, day).is_some());
            let ymd = Ymd { year, month, day };
            let epoch_year = if date_1904 { 1904 } else { 1900 };
            match ymd_to_serial(ymd, date_1904) {
                Some(serial) => {
                    prop_assert!(year >= epoch_year);
                    prop_assert_eq!(serial_to_ymd(serial, date_1904), Some(ymd));
                    let n = CellValue::Number(serial);
                    let out = normalize_date(DateInput { display_text: None, raw: Some(&n), date_1904 }, DateStyle::Slash);
                    prop_assert_eq!(out, ymd.format(DateStyle::Slash));
                }
                None => {
                    prop_assert!(year < epoch_year);
                    let iso = CellValue::Text(format!("{:04}-{:02}-{:02}", year, month, day));
                    let out = normalize_date(DateInput { display_text: None, raw: Some(&iso), date_1904 }, DateStyle::Slash);
                    prop_assert_eq!(out, ymd.format(DateStyle::Slash));
                }
            }
        }
    }
}
