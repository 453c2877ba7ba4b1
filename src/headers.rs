use serde::Serialize;

pub const STUDENT_KEY_ALIASES: &[&str] = &[
    "REGN_NO",
    "REG_NO",
    "REGISTRATION_NO",
    "ENROLLMENT_NO",
    "ENR_NO",
    "ENROLLMENT",
    "REGISTRATION",
    "RROLL",
    "ROLL_NO",
    "ROLL",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TotalCredit,
    TotalCreditPoint,
    TotalDueCredits,
    TotalDueCreditPoints,
    Sgpa,
    GrandTotMrks,
    TotMrks,
}

const HEADER_ALIASES: &[(Field, &[&str])] = &[
    (
        Field::TotalCredit,
        &["TOTAL_CREDIT", "TOTAL_CREDITS", "TOT_CREDIT", "SUM_CREDIT", "TOT_CR"],
    ),
    (
        Field::TotalCreditPoint,
        &[
            "TOTAL_CREDIT_POINT",
            "TOTAL_CREDIT_POINTS",
            "TOT_CREDIT_POINTS",
            "CREDIT_POINTS",
            "TOTAL_POINTS",
            "TOT_CP",
        ],
    ),
    (
        Field::TotalDueCredits,
        &["TOTAL_DUE_CREDITS", "TOT_DUE_CREDITS", "DUE_CREDITS", "DUE_CR"],
    ),
    (
        Field::TotalDueCreditPoints,
        &[
            "TOTAL_DUE_CREDIT_POINTS",
            "TOT_DUE_CP",
            "DUE_CREDIT_POINTS",
            "DUE_POINTS",
            "DUE_CP",
        ],
    ),
    (Field::Sgpa, &["SGPA", "SEM_SGPA", "SemSGPA"]),
    (
        Field::GrandTotMrks,
        &[
            "GRAND_TOT_MRKS",
            "GRAND_TOTAL_MARKS",
            "GRAND_TOTAL",
            "GRAND_TOT",
            "GRAND_MARKS",
        ],
    ),
    (
        Field::TotMrks,
        &["TOT_MRKS", "TOTAL_MARKS", "TOT_MARKS", "TOTAL_MRKS"],
    ),
];

/// Uppercase, whitespace runs to `_`, everything outside `[A-Z0-9_]` dropped.
pub fn normalize_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        let up = ch.to_ascii_uppercase();
        if up.is_ascii_alphanumeric() || up == '_' {
            out.push(up);
        }
    }
    out
}

/// Returns the original header of the first alias (in alias order) that matches.
pub fn resolve_alias<S: AsRef<str>>(headers: &[S], aliases: &[&str]) -> Option<String> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect();
    for alias in aliases {
        let target = normalize_header(alias);
        if let Some(i) = normalized.iter().position(|k| *k == target) {
            return Some(headers[i].as_ref().to_string());
        }
    }
    None
}

pub fn resolve_student_key<S: AsRef<str>>(headers: &[S]) -> Option<String> {
    resolve_alias(headers, STUDENT_KEY_ALIASES)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderMap {
    pub total_credit: Option<String>,
    pub total_credit_point: Option<String>,
    pub total_due_credits: Option<String>,
    pub total_due_credit_points: Option<String>,
    pub sgpa: Option<String>,
    pub grand_tot_mrks: Option<String>,
    pub tot_mrks: Option<String>,
}

impl HeaderMap {
    pub fn get(&self, field: Field) -> Option<&str> {
        let v = match field {
            Field::TotalCredit => &self.total_credit,
            Field::TotalCreditPoint => &self.total_credit_point,
            Field::TotalDueCredits => &self.total_due_credits,
            Field::TotalDueCreditPoints => &self.total_due_credit_points,
            Field::Sgpa => &self.sgpa,
            Field::GrandTotMrks => &self.grand_tot_mrks,
            Field::TotMrks => &self.tot_mrks,
        };
        v.as_deref()
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::TotalCredit => &mut self.total_credit,
            Field::TotalCreditPoint => &mut self.total_credit_point,
            Field::TotalDueCredits => &mut self.total_due_credits,
            Field::TotalDueCreditPoints => &mut self.total_due_credit_points,
            Field::Sgpa => &mut self.sgpa,
            Field::GrandTotMrks => &mut self.grand_tot_mrks,
            Field::TotMrks => &mut self.tot_mrks,
        }
    }
}

pub fn resolve_header_map<S: AsRef<str>>(headers: &[S]) -> HeaderMap {
    let mut map = HeaderMap::default();
    for (field, aliases) in HEADER_ALIASES {
        *map.slot(*field) = resolve_alias(headers, aliases);
    }
    map
}
