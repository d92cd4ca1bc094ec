use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::derive;
use crate::models::{Cluster, PredictionResult, StudentIntake};

pub const RADAR_LABELS: [&str; 6] = [
    "Programming",
    "Networking",
    "Database",
    "Web & System Dev",
    "Soft Skills",
    "Extracurricular",
];

/// Six-axis radar scores derived from the assessment text lists. A mentioned
/// category scores 5; unmentioned strengths sit at 2 and unmentioned
/// weaknesses at 1 so the two polygons stay visually distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarAxes {
    pub strengths: [u8; 6],
    pub weaknesses: [u8; 6],
}

fn mentions(items: &[String], keys: &[&str]) -> bool {
    items.iter().any(|item| {
        let lowered = item.to_lowercase();
        keys.iter().any(|key| lowered.contains(key))
    })
}

pub fn radar_axes(prediction: &PredictionResult) -> RadarAxes {
    let strengths = &prediction.strengths;
    let weaknesses = &prediction.weaknesses;
    let score = |hit: bool, base: u8| if hit { 5 } else { base };

    RadarAxes {
        strengths: [
            score(mentions(strengths, &["programming"]), 2),
            score(mentions(strengths, &["networking"]), 2),
            score(mentions(strengths, &["database"]), 2),
            score(mentions(strengths, &["web/system"]), 2),
            score(
                mentions(
                    strengths,
                    &["communication", "interpersonal", "teamwork", "soft"],
                ),
                2,
            ),
            score(mentions(strengths, &["extracurricular"]), 2),
        ],
        weaknesses: [
            score(mentions(weaknesses, &["programming"]), 1),
            score(mentions(weaknesses, &["networking"]), 1),
            score(mentions(weaknesses, &["database"]), 1),
            score(mentions(weaknesses, &["web/system"]), 1),
            score(mentions(weaknesses, &["communication", "teamwork", "soft"]), 1),
            score(mentions(weaknesses, &["extracurricular"]), 1),
        ],
    }
}

/// Pools every valid grade across the cohort per cluster and averages it.
pub fn cohort_cluster_averages(students: &[StudentIntake]) -> Vec<(Cluster, String)> {
    Cluster::ALL
        .iter()
        .map(|cluster| {
            let grades: Vec<&str> = students
                .iter()
                .flat_map(|student| student.cluster_grades(*cluster))
                .collect();
            (*cluster, derive::average(grades))
        })
        .collect()
}

fn count_mix<'a, I>(labels: I) -> BTreeMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut mix: BTreeMap<&'a str, usize> = BTreeMap::new();
    for label in labels {
        *mix.entry(label).or_insert(0) += 1;
    }
    mix
}

/// Row shape of the student-list CSV export.
#[derive(Debug, Clone, Serialize)]
pub struct StudentListRow {
    pub name: String,
    pub student_no: String,
    pub age: String,
    pub gender: String,
    pub specialization_track: String,
    pub location: String,
}

pub fn student_list_rows(students: &[StudentIntake]) -> Vec<StudentListRow> {
    students
        .iter()
        .map(|student| StudentListRow {
            name: student.full_name(),
            student_no: student.student_no.clone(),
            age: student.age.clone(),
            gender: student.gender.clone(),
            specialization_track: student.specialization_track.clone(),
            location: student.location.clone(),
        })
        .collect()
}

pub fn write_students_csv(path: &Path, students: &[StudentIntake]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in student_list_rows(students) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn build_report(
    scope: Option<&str>,
    students: &[StudentIntake],
    predictions: &[(String, PredictionResult)],
) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");
    let today = Utc::now().date_naive();

    let _ = writeln!(output, "# GRASP Cohort Report");
    let _ = writeln!(
        output,
        "Generated {} for {} ({} students)",
        today,
        scope_label,
        students.len()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cluster Grade Averages");
    if students.is_empty() {
        let _ = writeln!(output, "No students in scope.");
    } else {
        for (cluster, avg) in cohort_cluster_averages(students) {
            let shown = if avg.is_empty() { "-" } else { avg.as_str() };
            let _ = writeln!(output, "- {}: {}", cluster, shown);
        }
    }

    let profiles: Vec<_> = students.iter().map(derive::derive_profile).collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Profile Mix");
    if profiles.is_empty() {
        let _ = writeln!(output, "No students in scope.");
    } else {
        let participation =
            count_mix(profiles.iter().map(|p| p.participation.as_str()));
        let _ = writeln!(output, "Extracurricular participation:");
        for (label, count) in &participation {
            let _ = writeln!(output, "- {}: {}", label, count);
        }

        let skill_levels = count_mix(profiles.iter().map(|p| p.soft_skills.level.as_str()));
        let _ = writeln!(output, "Soft-skill levels:");
        for (label, count) in &skill_levels {
            let _ = writeln!(output, "- {}: {}", label, count);
        }

        let housing = count_mix(profiles.iter().map(|p| p.living_arrangement.as_str()));
        let _ = writeln!(output, "Living arrangement:");
        for (label, count) in &housing {
            let _ = writeln!(output, "- {}: {}", label, count);
        }

        let certified = count_mix(profiles.iter().map(|p| p.certification_flag.as_str()));
        let _ = writeln!(output, "Holds a certification:");
        for (label, count) in &certified {
            let _ = writeln!(output, "- {}: {}", label, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latin Honors");
    let mut honor_lines = 0usize;
    for (student, profile) in students.iter().zip(&profiles) {
        let gate = profile.latin_honors;
        if gate.demoted {
            let _ = writeln!(
                output,
                "- {} ({}): requested Yes, demoted to No (a grade exceeds {:.2})",
                student.full_name(),
                student.student_no,
                derive::LATIN_HONORS_GRADE_CEILING
            );
            honor_lines += 1;
        } else if gate.effective.is_yes() {
            let _ = writeln!(
                output,
                "- {} ({}): eligible, Yes",
                student.full_name(),
                student.student_no
            );
            honor_lines += 1;
        }
    }
    if honor_lines == 0 {
        let _ = writeln!(output, "No Latin-honors candidates in scope.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recorded Predictions");
    if predictions.is_empty() {
        let _ = writeln!(output, "No predictions recorded for this scope.");
    } else {
        for (student_no, prediction) in predictions {
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "### {} — {} (index {})",
                student_no, prediction.prediction_label, prediction.prediction_index
            );
            for (label, probability) in &prediction.proba_json {
                let _ = writeln!(output, "- {}: {:.2}%", label, probability * 100.0);
            }
            if !prediction.strengths.is_empty() {
                let _ = writeln!(output, "Strengths: {}", prediction.strengths.join("; "));
            }
            if !prediction.weaknesses.is_empty() {
                let _ = writeln!(output, "Weaknesses: {}", prediction.weaknesses.join("; "));
            }

            let radar = radar_axes(prediction);
            let _ = writeln!(output, "Radar (strength / weakness):");
            for (i, label) in RADAR_LABELS.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "- {}: {} / {}",
                    label, radar.strengths[i], radar.weaknesses[i]
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YesNo;

    fn prediction(strengths: &[&str], weaknesses: &[&str]) -> PredictionResult {
        PredictionResult {
            prediction_label: "Employable".to_string(),
            prediction_index: 1,
            proba_json: [("Employable".to_string(), 0.82)].into_iter().collect(),
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn radar_scores_mentioned_categories_high() {
        let axes = radar_axes(&prediction(
            &["Strong Programming fundamentals", "Good communication"],
            &["Weak Database normalization"],
        ));
        assert_eq!(axes.strengths[0], 5); // programming
        assert_eq!(axes.strengths[4], 5); // soft skills via "communication"
        assert_eq!(axes.strengths[1], 2); // networking unmentioned
        assert_eq!(axes.weaknesses[2], 5); // database
        assert_eq!(axes.weaknesses[0], 1);
    }

    #[test]
    fn radar_matches_web_system_phrasing() {
        let axes = radar_axes(&prediction(&["solid web/system development work"], &[]));
        assert_eq!(axes.strengths[3], 5);
    }

    #[test]
    fn cohort_averages_pool_grades_per_cluster() {
        let a = StudentIntake {
            it105: "1.00".to_string(),
            ..StudentIntake::default()
        };
        let b = StudentIntake {
            it203: "2.00".to_string(),
            ..StudentIntake::default()
        };
        let averages = cohort_cluster_averages(&[a, b]);
        let (cluster, avg) = &averages[0];
        assert_eq!(*cluster, Cluster::Programming);
        assert_eq!(avg, "1.50");
        assert_eq!(averages[1].1, ""); // networking has no grades
    }

    #[test]
    fn export_rows_serialize_with_expected_columns() {
        let student = StudentIntake {
            student_no: "2021-00117".to_string(),
            first_name: "Maria".to_string(),
            last_name: "Cruz".to_string(),
            age: "22".to_string(),
            gender: "Female".to_string(),
            specialization_track: crate::models::SPECIALIZATION_TRACKS[1].to_string(),
            location: crate::models::LOCATIONS[0].to_string(),
            ..StudentIntake::default()
        };
        let rows = student_list_rows(&[student]);
        assert_eq!(rows[0].name, "Maria Cruz");

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &rows {
            writer.serialize(row).unwrap();
        }
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(text.starts_with("name,student_no,age,gender,specialization_track,location"));
        assert!(text.contains("Maria Cruz,2021-00117,22,Female"));
    }

    #[test]
    fn report_flags_demoted_honors_requests() {
        let student = StudentIntake {
            student_no: "2021-00999".to_string(),
            first_name: "Liza".to_string(),
            last_name: "Torres".to_string(),
            latin_honors: YesNo::Yes,
            it105: "2.75".to_string(),
            ..StudentIntake::default()
        };
        let report = build_report(None, &[student], &[]);
        assert!(report.contains("demoted to No"));
        assert!(!report.contains("eligible, Yes"));
    }

    #[test]
    fn report_lists_recorded_predictions() {
        let report = build_report(
            Some("2021-00117"),
            &[],
            &[(
                "2021-00117".to_string(),
                prediction(&["Programming"], &["Networking"]),
            )],
        );
        assert!(report.contains("Employable (index 1)"));
        assert!(report.contains("82.00%"));
        assert!(report.contains("Programming: 5 / 1"));
    }
}
