use serde::Serialize;

use crate::derive;
use crate::models::{Cluster, DerivedProfile, StudentIntake, YesNo};

/// Body posted to the student-record endpoint. Field names match what the
/// backend stores; `graduate_on_time` is an explicit input there, never
/// derived server-side, and `latin_honors` carries the gated value.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRecordPayload {
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
    pub graduate_on_time: YesNo,
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

/// Exact feature vector the classifier endpoint expects, PascalCase names
/// included.
#[derive(Debug, Clone, Serialize)]
pub struct ModelFeatures {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "LivingArrangement")]
    pub living_arrangement: String,
    #[serde(rename = "Extracurricular")]
    pub extracurricular: String,
    #[serde(rename = "Awards")]
    pub awards: YesNo,
    #[serde(rename = "SpecializationTrack")]
    pub specialization_track: String,
    #[serde(rename = "LatinHonors")]
    pub latin_honors: YesNo,
    #[serde(rename = "GraduateOnTime")]
    pub graduate_on_time: YesNo,
    #[serde(rename = "FailedGrade")]
    pub failed_grade: YesNo,
    #[serde(rename = "SoftSkillLevel")]
    pub soft_skill_level: String,
    #[serde(rename = "MonthlyIncomeStatus")]
    pub monthly_income_status: String,
    #[serde(rename = "CurrentJob")]
    pub current_job: String,
    #[serde(rename = "FurtherStudies")]
    pub further_studies: YesNo,
    // upstream model was trained with this misspelling
    #[serde(rename = "Cerification")]
    pub certification: YesNo,
    #[serde(rename = "Programming")]
    pub programming: f64,
    #[serde(rename = "Networking")]
    pub networking: f64,
    #[serde(rename = "Database")]
    pub database: f64,
    #[serde(rename = "WebandSystemDevelopment")]
    pub web_and_system_development: f64,
    #[serde(rename = "HardwareandComputingFundamentals")]
    pub hardware_and_computing_fundamentals: f64,
    #[serde(rename = "Electives")]
    pub electives: f64,
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Cluster features fall back to the fixed values the model was calibrated
/// with when a student has no valid grades in that cluster.
fn cluster_feature(profile: &DerivedProfile, cluster: Cluster) -> f64 {
    let fallback = match cluster {
        Cluster::Programming => 1.75,
        Cluster::Networking => 1.50,
        Cluster::Database => 2.00,
        Cluster::WebAndSystemDevelopment => 1.75,
        Cluster::HardwareAndComputingFundamentals => 2.00,
        Cluster::Electives => 1.75,
    };
    profile
        .cluster_average(cluster)
        .parse::<f64>()
        .unwrap_or(fallback)
}

pub fn student_record(intake: &StudentIntake) -> StudentRecordPayload {
    let gate = derive::enforce_latin_honors_gate(intake.all_grades(), intake.latin_honors);

    StudentRecordPayload {
        student_no: intake.student_no.clone(),
        first_name: intake.first_name.clone(),
        middle_name: intake.middle_name.clone(),
        last_name: intake.last_name.clone(),
        age: intake.age.clone(),
        gender: intake.gender.clone(),
        location: or_default(&intake.location, "Inside of Bulacan"),
        living_basis: intake.living_basis.clone(),
        awards: intake.awards,
        specialization_track: intake.specialization_track.clone(),
        latin_honors: gate.effective,
        failed_grade: intake.failed_grade,
        dropped_subjects: intake.dropped_subjects,
        graduate_on_time: derive::compute_graduate_on_time(
            intake.failed_grade,
            intake.dropped_subjects,
        ),
        further_studies: intake.further_studies,
        monthly_income_status: intake.monthly_income_status.clone(),
        certification_text: intake.certification_text.clone(),
        extracurricular: intake.extracurricular.clone(),
        soft_skills: intake.soft_skills.clone(),
        it105: intake.it105.clone(),
        it203: intake.it203.clone(),
        it207: intake.it207.clone(),
        it204: intake.it204.clone(),
        it106: intake.it106.clone(),
        it210: intake.it210.clone(),
        it202: intake.it202.clone(),
        it206: intake.it206.clone(),
        it303: intake.it303.clone(),
        it304: intake.it304.clone(),
        it310: intake.it310.clone(),
        it102: intake.it102.clone(),
        it104: intake.it104.clone(),
        it306: intake.it306.clone(),
        it307: intake.it307.clone(),
        it311: intake.it311.clone(),
        it312: intake.it312.clone(),
    }
}

pub fn model_features(intake: &StudentIntake) -> ModelFeatures {
    let profile = derive::derive_profile(intake);

    ModelFeatures {
        location: or_default(&intake.location, "Inside of Bulacan"),
        living_arrangement: profile.living_arrangement.as_str().to_string(),
        extracurricular: profile.participation.as_str().to_string(),
        awards: intake.awards,
        specialization_track: or_default(
            &intake.specialization_track,
            "Web and Mobile Application Development",
        ),
        latin_honors: profile.latin_honors.effective,
        graduate_on_time: profile.graduate_on_time,
        failed_grade: intake.failed_grade,
        soft_skill_level: profile.soft_skills.level.as_str().to_string(),
        monthly_income_status: or_default(
            &intake.monthly_income_status,
            "Low-Income (10,957 - 21,194)",
        ),
        // employment status is not collected on the intake form
        current_job: "Unemployed".to_string(),
        further_studies: intake.further_studies,
        certification: profile.certification_flag,
        programming: cluster_feature(&profile, Cluster::Programming),
        networking: cluster_feature(&profile, Cluster::Networking),
        database: cluster_feature(&profile, Cluster::Database),
        web_and_system_development: cluster_feature(&profile, Cluster::WebAndSystemDevelopment),
        hardware_and_computing_fundamentals: cluster_feature(
            &profile,
            Cluster::HardwareAndComputingFundamentals,
        ),
        electives: cluster_feature(&profile, Cluster::Electives),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_intake_uses_model_defaults() {
        let features = model_features(&StudentIntake::default());
        let value = serde_json::to_value(&features).unwrap();

        assert_eq!(value["Location"], "Inside of Bulacan");
        assert_eq!(value["LivingArrangement"], "Permanent Housing");
        assert_eq!(value["Extracurricular"], "No Participation");
        assert_eq!(
            value["SpecializationTrack"],
            "Web and Mobile Application Development"
        );
        assert_eq!(value["SoftSkillLevel"], "Foundational");
        assert_eq!(value["MonthlyIncomeStatus"], "Low-Income (10,957 - 21,194)");
        assert_eq!(value["CurrentJob"], "Unemployed");
        assert_eq!(value["Cerification"], "No");
        assert_eq!(value["Programming"], 1.75);
        assert_eq!(value["Networking"], 1.5);
        assert_eq!(value["Database"], 2.0);
        assert_eq!(value["Electives"], 1.75);
    }

    #[test]
    fn grades_override_cluster_fallbacks() {
        let intake = StudentIntake {
            it105: "1.00".to_string(),
            it203: "2.00".to_string(),
            ..StudentIntake::default()
        };
        let features = model_features(&intake);
        assert_eq!(features.programming, 1.50);
        assert_eq!(features.networking, 1.50); // no grades, fallback
    }

    #[test]
    fn record_payload_computes_graduate_on_time() {
        let intake = StudentIntake {
            dropped_subjects: YesNo::Yes,
            ..StudentIntake::default()
        };
        let payload = student_record(&intake);
        assert_eq!(payload.graduate_on_time, YesNo::No);

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["graduate_on_time"], "No");
    }

    #[test]
    fn record_payload_carries_gated_honors_value() {
        let intake = StudentIntake {
            latin_honors: YesNo::Yes,
            it312: "2.75".to_string(),
            ..StudentIntake::default()
        };
        let payload = student_record(&intake);
        assert_eq!(payload.latin_honors, YesNo::No);
    }

    #[test]
    fn model_features_gate_honors_on_grades() {
        let intake = StudentIntake {
            latin_honors: YesNo::Yes,
            it105: "2.75".to_string(),
            ..StudentIntake::default()
        };
        let value = serde_json::to_value(&model_features(&intake)).unwrap();
        assert_eq!(value["LatinHonors"], "No");
    }
}
