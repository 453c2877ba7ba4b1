use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unsupported file type .{ext}; upload a CSV, XLS or XLSX file")]
    UnsupportedFormat { ext: String },
    #[error("file too large ({size} bytes, max {max})")]
    FileTooLarge { size: u64, max: u64 },
    #[error("sheet is empty or unreadable")]
    EmptySheet,
    #[error("student key not found (REGN_NO/RROLL/ROLL_NO/ENROLLMENT/REG_NO...)")]
    MissingStudentKey,
    #[error("sheet must contain TOTAL_CREDIT and TOTAL_CREDIT_POINT columns")]
    MissingTotals,
    #[error("select a course first")]
    MissingCourseSelection,
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("semester {index} is outside 1..={total}")]
    InvalidSemester { index: u32, total: u32 },
    #[error("upload the last semester sheet before finalizing")]
    MissingLastSemester,
    #[error("failed to parse sheet: {0}")]
    Parse(String),
}

impl SheetError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::EmptySheet => "empty_sheet",
            Self::MissingStudentKey => "missing_student_key",
            Self::MissingTotals => "missing_totals",
            Self::MissingCourseSelection => "missing_course_selection",
            Self::UnknownCourse(_) => "unknown_course",
            Self::InvalidSemester { .. } => "invalid_semester",
            Self::MissingLastSemester => "missing_last_semester",
            Self::Parse(_) => "parse_failed",
        }
    }
}

impl From<csv::Error> for SheetError {
    fn from(e: csv::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<calamine::Error> for SheetError {
    fn from(e: calamine::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
