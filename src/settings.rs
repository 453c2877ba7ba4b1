use serde_json::{json, Map, Value};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSection {
    Limits,
    Nad,
    Cgpa,
}

impl SettingsSection {
    pub const ALL: [Self; 3] = [Self::Limits, Self::Nad, Self::Cgpa];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "limits" => Some(Self::Limits),
            "nad" => Some(Self::Nad),
            "cgpa" => Some(Self::Cgpa),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Limits => "limits",
            Self::Nad => "nad",
            Self::Cgpa => "cgpa",
        }
    }
}

fn default_section(section: SettingsSection) -> Value {
    match section {
        SettingsSection::Limits => json!({
            "maxUploadBytes": DEFAULT_MAX_UPLOAD_BYTES
        }),
        SettingsSection::Nad => json!({
            "defaultTermType": "ANNUAL",
            "subjectSlots": 20,
            "date1904": false
        }),
        SettingsSection::Cgpa => json!({
            "decimals": 2
        }),
    }
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

/// Validates every field of `patch` before any of them is applied.
fn merge_section_patch(
    section: SettingsSection,
    current: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let mut staged = current.clone();
    for (k, v) in patch {
        let value = match section {
            SettingsSection::Limits => match k.as_str() {
                "maxUploadBytes" => Value::from(parse_i64_range(v, k, 1024, 512 * 1024 * 1024)?),
                _ => return Err(format!("unknown limits field: {}", k)),
            },
            SettingsSection::Nad => match k.as_str() {
                "defaultTermType" => {
                    Value::String(parse_string_max(v, k, 32)?.to_ascii_uppercase())
                }
                "subjectSlots" => Value::from(parse_i64_range(v, k, 1, 60)?),
                "date1904" => Value::Bool(parse_bool(v, k)?),
                _ => return Err(format!("unknown nad field: {}", k)),
            },
            SettingsSection::Cgpa => match k.as_str() {
                "decimals" => Value::from(parse_i64_range(v, k, 0, 6)?),
                _ => return Err(format!("unknown cgpa field: {}", k)),
            },
        };
        staged.insert(k.clone(), value);
    }
    *current = staged;
    Ok(())
}

/// Runtime settings, one JSON object per section, always holding every default key.
#[derive(Debug, Clone)]
pub struct Settings {
    sections: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let sections = SettingsSection::ALL
            .iter()
            .map(|s| (s.key().to_string(), default_section(*s)))
            .collect();
        Self { sections }
    }
}

impl Settings {
    pub fn to_json(&self) -> Value {
        Value::Object(self.sections.clone())
    }

    pub fn update(&mut self, section: SettingsSection, patch: &Map<String, Value>) -> Result<(), String> {
        let current = self
            .sections
            .entry(section.key())
            .or_insert_with(|| default_section(section));
        let obj = current
            .as_object_mut()
            .ok_or_else(|| "settings section must be a JSON object".to_string())?;
        merge_section_patch(section, obj, patch)
    }

    fn field(&self, section: SettingsSection, key: &str) -> Option<&Value> {
        self.sections.get(section.key()).and_then(|s| s.get(key))
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.field(SettingsSection::Limits, "maxUploadBytes")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn default_term_type(&self) -> String {
        self.field(SettingsSection::Nad, "defaultTermType")
            .and_then(Value::as_str)
            .unwrap_or("ANNUAL")
            .to_string()
    }

    pub fn subject_slots(&self) -> u32 {
        self.field(SettingsSection::Nad, "subjectSlots")
            .and_then(Value::as_u64)
            .map_or(20, |n| n as u32)
    }

    pub fn date_1904(&self) -> bool {
        self.field(SettingsSection::Nad, "date1904")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn decimals(&self) -> u32 {
        self.field(SettingsSection::Cgpa, "decimals")
            .and_then(Value::as_u64)
            .map_or(2, |n| n as u32)
    }
}
