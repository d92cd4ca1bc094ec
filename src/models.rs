use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const EXTRACURRICULAR_TAGS: [&str; 5] = [
    "Organizations (e.g., SWITS, BulSU MSC, etc.)",
    "Sports (e.g., CLARAA, Intramurals, etc.)",
    "Cultural Performer",
    "Student Council (e.g., Student Government, etc.)",
    "Publication (e.g., CURSOR Publication, Pacesetter, etc.)",
];

pub const SOFT_SKILL_TAGS: [&str; 12] = [
    "Verbal Communication",
    "Written Communication",
    "Critical Thinking",
    "Leadership",
    "Time Management",
    "Problem-Solving Skills",
    "Networking",
    "Collaboration",
    "Ethical Judgment",
    "Stress Management",
    "Socializing / Interpersonal Skills",
    "Adaptability and Flexibility",
];

pub const SPECIALIZATION_TRACKS: [&str; 3] = [
    "Business Analytics",
    "Web and Mobile Application Development",
    "Service Management",
];

pub const LOCATIONS: [&str; 2] = ["Inside of Bulacan", "Outside of Bulacan"];

pub const INCOME_BRACKETS: [&str; 7] = [
    "Poor (Less than 10,956)",
    "Low-Income (10,957 - 21,194)",
    "Lower-Middle Income (21,195 - 43,828)",
    "Middle Income (43,829 - 76,669)",
    "Upper-Middle Income (76,670 - 131,484)",
    "Upper-Income (131,485 - 219,140)",
    "Rich (219,141 and above)",
];

pub const HOUSING_BASIS_OPTIONS: [&str; 3] = [
    "Own/Parents/Relative",
    "Boarding/Dorm/Bedspace",
    "Rented Apartment/Condo",
];

/// Allowed grade entries: 1.00 through 3.00 in 0.25 steps, plus the 5.00
/// dropped/withdrawn sentinel. An empty string means "not yet entered".
pub const GRADE_STEPS: [&str; 10] = [
    "1.00", "1.25", "1.50", "1.75", "2.00", "2.25", "2.50", "2.75", "3.00", "5.00",
];

pub fn is_grade_step(value: &str) -> bool {
    GRADE_STEPS.contains(&value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    /// Total parse: "Yes" in any case is Yes, everything else is No.
    pub fn parse(value: &str) -> YesNo {
        if value.trim().eq_ignore_ascii_case("yes") {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Programming,
    Networking,
    Database,
    WebAndSystemDevelopment,
    HardwareAndComputingFundamentals,
    Electives,
}

impl Cluster {
    pub const ALL: [Cluster; 6] = [
        Cluster::Programming,
        Cluster::Networking,
        Cluster::Database,
        Cluster::WebAndSystemDevelopment,
        Cluster::HardwareAndComputingFundamentals,
        Cluster::Electives,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Cluster::Programming => "Programming",
            Cluster::Networking => "Networking",
            Cluster::Database => "Database",
            Cluster::WebAndSystemDevelopment => "Web and System Development",
            Cluster::HardwareAndComputingFundamentals => "Hardware and Computing Fundamentals",
            Cluster::Electives => "Electives",
        }
    }

    pub fn course_codes(self) -> &'static [&'static str] {
        match self {
            Cluster::Programming => &["IT105", "IT203", "IT207", "IT204"],
            Cluster::Networking => &["IT106", "IT210"],
            Cluster::Database => &["IT202", "IT206"],
            Cluster::WebAndSystemDevelopment => &["IT303", "IT304", "IT310"],
            Cluster::HardwareAndComputingFundamentals => &["IT102", "IT104"],
            Cluster::Electives => &["IT306", "IT307", "IT311", "IT312"],
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationCluster {
    NoParticipation,
    SingleExtracurricular,
    MultipleExtracurricular,
}

impl ParticipationCluster {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipationCluster::NoParticipation => "No Participation",
            ParticipationCluster::SingleExtracurricular => "Single Extracurricular",
            ParticipationCluster::MultipleExtracurricular => "Multiple Extracurricular",
        }
    }
}

impl fmt::Display for ParticipationCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivingArrangement {
    TemporaryHousing,
    PermanentHousing,
}

impl LivingArrangement {
    pub fn as_str(self) -> &'static str {
        match self {
            LivingArrangement::TemporaryHousing => "Temporary Housing",
            LivingArrangement::PermanentHousing => "Permanent Housing",
        }
    }
}

impl fmt::Display for LivingArrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftSkillLevel {
    Advanced,
    Developing,
    Foundational,
}

impl SoftSkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SoftSkillLevel::Advanced => "Advanced",
            SoftSkillLevel::Developing => "Developing",
            SoftSkillLevel::Foundational => "Foundational",
        }
    }
}

impl fmt::Display for SoftSkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftSkillComposite {
    pub count: usize,
    pub level: SoftSkillLevel,
}

/// Effective Latin-honors value after the grade gate has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    pub effective: YesNo,
    pub demoted: bool,
}

/// Raw student intake as entered on the form. Grades are kept as the raw
/// dropdown strings ("1.00".."3.00", "5.00", or "" when unset); derivation
/// parses and excludes whatever does not parse.
#[derive(Debug, Clone, Default)]
pub struct StudentIntake {
    pub student_no: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub age: String,
    pub gender: String,
    pub location: String,
    pub living_basis: String,
    pub awards: YesNo,
    pub specialization_track: String,
    pub latin_honors: YesNo,
    pub failed_grade: YesNo,
    pub dropped_subjects: YesNo,
    pub further_studies: YesNo,
    pub monthly_income_status: String,
    pub certification_text: String,
    pub extracurricular: Vec<String>,
    pub soft_skills: Vec<String>,
    pub it105: String,
    pub it203: String,
    pub it207: String,
    pub it204: String,
    pub it106: String,
    pub it210: String,
    pub it202: String,
    pub it206: String,
    pub it303: String,
    pub it304: String,
    pub it310: String,
    pub it102: String,
    pub it104: String,
    pub it306: String,
    pub it307: String,
    pub it311: String,
    pub it312: String,
}

impl StudentIntake {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn cluster_grades(&self, cluster: Cluster) -> Vec<&str> {
        let grades: Vec<&String> = match cluster {
            Cluster::Programming => vec![&self.it105, &self.it203, &self.it207, &self.it204],
            Cluster::Networking => vec![&self.it106, &self.it210],
            Cluster::Database => vec![&self.it202, &self.it206],
            Cluster::WebAndSystemDevelopment => vec![&self.it303, &self.it304, &self.it310],
            Cluster::HardwareAndComputingFundamentals => vec![&self.it102, &self.it104],
            Cluster::Electives => vec![&self.it306, &self.it307, &self.it311, &self.it312],
        };
        grades.into_iter().map(String::as_str).collect()
    }

    pub fn all_grades(&self) -> Vec<&str> {
        Cluster::ALL
            .iter()
            .flat_map(|cluster| self.cluster_grades(*cluster))
            .collect()
    }
}

/// Everything recomputed from a [`StudentIntake`]; never persisted.
#[derive(Debug, Clone)]
pub struct DerivedProfile {
    pub programming_avg: String,
    pub networking_avg: String,
    pub database_avg: String,
    pub web_system_avg: String,
    pub hardware_avg: String,
    pub electives_avg: String,
    pub participation: ParticipationCluster,
    pub living_arrangement: LivingArrangement,
    pub soft_skills: SoftSkillComposite,
    pub certifications: Vec<String>,
    pub certification_flag: YesNo,
    pub graduate_on_time: YesNo,
    pub latin_honors: GateOutcome,
}

impl DerivedProfile {
    pub fn cluster_average(&self, cluster: Cluster) -> &str {
        match cluster {
            Cluster::Programming => &self.programming_avg,
            Cluster::Networking => &self.networking_avg,
            Cluster::Database => &self.database_avg,
            Cluster::WebAndSystemDevelopment => &self.web_system_avg,
            Cluster::HardwareAndComputingFundamentals => &self.hardware_avg,
            Cluster::Electives => &self.electives_avg,
        }
    }
}

/// Response shape of the external prediction service. Probabilities are
/// upstream-rounded and may not sum to exactly 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction_label: String,
    pub prediction_index: i32,
    #[serde(default)]
    pub proba_json: BTreeMap<String, f64>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}
