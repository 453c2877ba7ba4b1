use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Course {
    pub name: &'static str,
    /// Number of semesters; zero for courses without a semester structure.
    pub sems: u32,
    pub cbcs: bool,
}

impl Course {
    const fn new(name: &'static str, sems: u32, cbcs: bool) -> Self {
        Self { name, sems, cbcs }
    }

    pub fn cbcs_label(&self) -> &'static str {
        if self.cbcs {
            "CBCS"
        } else {
            "NON-CBCS"
        }
    }
}

pub const COURSES: &[Course] = &[
    Course::new("B.A.", 6, true),
    Course::new("B.A.-B.Ed.S", 8, true),
    Course::new("B.COM", 6, true),
    Course::new("B.Ed.(CD)", 4, true),
    Course::new("B.ED.(G)", 4, true),
    Course::new("B.Ed.-M.Ed.", 6, true),
    Course::new("B.Sc.-B.Ed.", 8, true),
    Course::new("BPES", 6, true),
    Course::new("M.A. ARCHEOLOGY", 4, true),
    Course::new("M.A.Education", 4, false),
    Course::new("M.Ed.", 4, true),
    Course::new("P.G. DIPLOMA IN GUIDANCE & COUNSELLING", 0, false),
    Course::new("P.G. DIPLOMA IN LABOUR WELFARE", 0, false),
    Course::new("M.Sc. COMPUTER SCIENCE", 4, true),
    Course::new("BCA", 6, true),
    Course::new("MCA", 4, true),
    Course::new("MHRM", 4, true),
    Course::new("PGDCA", 2, true),
    Course::new("B.Sc.-DATA SCIENCE", 6, true),
];

/// Course names offered by the NAD transformer's course selector.
pub const NON_CBCS_COURSES: &[&str] = &[
    "B.A.B.ED. (FOUR YEAR INTEGRATED COURSE) - YEARLY",
    "B.A.LL.B. 5 YEAR INTEGRATED COURSE",
    "B.SC.B.ED. (FOUR YEAR INTEGRATED COURSE) - YEARLY",
    "BACHELOR OF BUSINESS ADMINISTRATION",
    "B.ED.-M.ED. -INTEGRATED - YEARLY",
    "BACHELOR OF ARTS (ADDITIONAL) ENGLISH",
    "BACHELOR OF EDUCATION (CHILD DEVELOPMENT) INTEGRATED - YEARLY",
    "BACHELOR OF EDUCATION - YEARLY",
    "BACHELOR OF EDUCATION SPECIAL EDUCATION - HI",
    "BACHELOR OF EDUCATION SPECIAL EDUCATION - MR",
    "BACHELOR OF HOMOEOPATHIC MEDICINE & SURGERY",
    "BACHELOR OF LAWS",
    "BACHELOR OF LIBRARY & INFORMATION SCIENCE",
    "BACHELOR OF PHYSIOTHERAPY",
    "CERTIFICATE COURSE IN ACUPRESSURE TRAINING",
    "CERTIFICATE COURSE IN SPOKEN ENGLISH",
    "CERTIFICATE COURSE IN URDU LANGUAGE",
    "CERTIFICATE IN JYOTISH",
    "CERTIFICATE IN NITYAKARMA POOJA PADDATI & ANUSTHAN & KARMAKAND",
    "CERTIFICATE IN VASTU",
    "DIPLOMA IN ACUPRESSURE",
    "DIPLOMA IN ARCHAEOLOGY",
    "DIPLOMA IN BHARTIYA JYOTISH",
    "DIPLOMA IN CIVIL ENGINEERING",
    "DIPLOMA IN COMPUTER SCIENCE & ENGINEERING",
    "DIPLOMA IN ELECTRICAL & COMMUNICATION ENGINEERING",
    "DIPLOMA IN ELECTRICAL ENGINEERING",
    "DIPLOMA IN HOTEL MANAGEMENT",
    "DIPLOMA IN HOTEL MANAGEMENT - HOUSEKEEPING",
    "DIPLOMA IN LIBRARY AND INFORMATION SCIENCE",
    "DIPLOMA IN MECHANICAL ENGINEERING",
    "DIPLOMA IN MUSIC (SURMALHAR)",
    "DIPLOMA IN NITYAKARMA POOJA PADDATI & ANSUTHAN & KARMAKAND",
    "DIPLOMA IN NITYAKARMA POOJA PADDATI & ANUSTHAN",
    "DIPLOMA IN PHARMACY",
    "DIPLOMA IN VASTU SHASTRA",
    "FELLOWSHIP IN NEUROLOGICAL REHABILITATION",
    "FELLOWSHIP IN PALLIATION CARE & ONCOLOGY REHABILITATION",
    "FELLOWSHIP IN SPORTS REHABILITATION",
    "INTEGERATED B. COM. B. ED. (SPECIAL EDUCATION)",
    "INTEGERATED B. SCI. B.ED. (SPECIAL EDUCATION)",
    "INTEGERATED B.A. B.ED (SPECIAL EDUCATION)",
    "INTEGRATED B.ED.-M.ED. - YEARLY",
    "M.A. EDUCATION",
    "MASTER OF EDUCATION - YEARLY",
    "MASTER OF LAWS",
    "MASTER OF LIBRARY & INFORMATION SCIENCE",
    "MASTER OF PHYSIOTHERAPY",
    "P.G DIPLOMA IN CYBER LAW",
    "P.G DIPLOMA IN GUIDENCE & COUNSELLING",
    "P.G DIPLOMA IN LABOUR LAW",
    "P.G DIPLOMA IN POLICE SCIENCE",
    "P.G DIPLOMA IN YOGA EDUCATION",
    "P.G. DIPLOMA IN HUMAN RESOURCE MANAGEMENT",
    "POST GRADUATE DIPLOMA IN CRIMINAL LAWS AND FORENSIC SCIENCE",
    "POST GRADUATE DIPLOMA IN CYBER LAWS AND FORENSIC SCIENCE",
    "POST GRADUATE DIPLOMA IN G.I.S. & REMOTE SENSING",
    "POST GRADUATE DIPLOMA IN LABOUR WELFARE",
    "POST GRADUATE DIPLOMA IN MENTAL HEALTH & COUNCILING",
    "POST GRADUATE DIPLOMA IN SPORTS COACHING",
    "POST GRADUATE DIPLOMA IN POPULATION STUDIES",
];

pub fn find_course(name: &str) -> Option<&'static Course> {
    let name = name.trim();
    COURSES.iter().find(|c| c.name == name)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseSort {
    #[default]
    NameAsc,
    NameDesc,
    SemAsc,
    SemDesc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseQuery {
    pub query: Option<String>,
    pub cbcs: Option<bool>,
    pub min_sem: Option<u32>,
    pub max_sem: Option<u32>,
    pub sort: CourseSort,
}

pub fn search_courses(q: &CourseQuery) -> Vec<&'static Course> {
    let needle = q
        .query
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    let mut out: Vec<&'static Course> = COURSES
        .iter()
        .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
        .filter(|c| q.cbcs.map_or(true, |want| c.cbcs == want))
        .filter(|c| q.min_sem.map_or(true, |m| c.sems >= m))
        .filter(|c| q.max_sem.map_or(true, |m| c.sems <= m))
        .collect();

    let by_name = |a: &&Course, b: &&Course| a.name.cmp(b.name);
    match q.sort {
        CourseSort::NameAsc => out.sort_by(by_name),
        CourseSort::NameDesc => out.sort_by(|a, b| by_name(b, a)),
        CourseSort::SemAsc => out.sort_by(|a, b| a.sems.cmp(&b.sems)),
        CourseSort::SemDesc => out.sort_by(|a, b| b.sems.cmp(&a.sems)),
    }
    out
}
