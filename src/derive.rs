use crate::models::{
    Cluster, DerivedProfile, GateOutcome, LivingArrangement, ParticipationCluster,
    SoftSkillComposite, SoftSkillLevel, StudentIntake, YesNo,
};

/// Any single course grade above this bars Latin honors.
pub const LATIN_HONORS_GRADE_CEILING: f64 = 2.50;

const TEMPORARY_HOUSING_KEYWORDS: [&str; 6] =
    ["boarding", "dorm", "bedspace", "rented", "apartment", "condo"];

fn parse_grade(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Mean of the entries that parse as finite numbers, formatted to two
/// decimals. Unparseable or empty entries are excluded from the mean, not
/// treated as zero; if nothing parses the result is the empty string.
pub fn average<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let nums: Vec<f64> = values.into_iter().filter_map(parse_grade).collect();
    if nums.is_empty() {
        return String::new();
    }
    let sum: f64 = nums.iter().sum();
    format!("{:.2}", sum / nums.len() as f64)
}

pub fn classify_extracurricular(selected: &[String]) -> ParticipationCluster {
    let count = selected
        .iter()
        .filter(|tag| !tag.trim().is_empty() && tag.as_str() != "None")
        .count();
    match count {
        0 => ParticipationCluster::NoParticipation,
        1 => ParticipationCluster::SingleExtracurricular,
        _ => ParticipationCluster::MultipleExtracurricular,
    }
}

/// Substring match against the known temporary-housing keywords; anything
/// else, including free text of unknown phrasing, defaults to permanent.
pub fn resolve_living_arrangement(basis_text: &str) -> LivingArrangement {
    let lowered = basis_text.to_lowercase();
    if TEMPORARY_HOUSING_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        LivingArrangement::TemporaryHousing
    } else {
        LivingArrangement::PermanentHousing
    }
}

pub fn classify_soft_skill_composite(selected: &[String]) -> SoftSkillComposite {
    let count = selected.len();
    let level = if count >= 9 {
        SoftSkillLevel::Advanced
    } else if count >= 5 {
        SoftSkillLevel::Developing
    } else {
        SoftSkillLevel::Foundational
    };
    SoftSkillComposite { count, level }
}

/// Comma-split, trimmed, empty tokens dropped. Order kept, no dedup.
pub fn parse_certification_list(raw_text: &str) -> Vec<String> {
    raw_text
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn compute_graduate_on_time(failed_grade: YesNo, dropped_subjects: YesNo) -> YesNo {
    if failed_grade.is_yes() || dropped_subjects.is_yes() {
        YesNo::No
    } else {
        YesNo::Yes
    }
}

pub fn latin_honors_eligible<'a, I>(all_grades: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    !all_grades
        .into_iter()
        .filter_map(parse_grade)
        .any(|grade| grade > LATIN_HONORS_GRADE_CEILING)
}

/// Returns the effective Latin-honors value: a requested "Yes" is forced to
/// "No" when any grade exceeds the ceiling, with the demotion flagged so the
/// caller can surface a warning. 2.50 itself passes. Must be recomputed on
/// every grade change; it is never persisted.
pub fn enforce_latin_honors_gate<'a, I>(all_grades: I, requested: YesNo) -> GateOutcome
where
    I: IntoIterator<Item = &'a str>,
{
    if requested.is_yes() && !latin_honors_eligible(all_grades) {
        GateOutcome {
            effective: YesNo::No,
            demoted: true,
        }
    } else {
        GateOutcome {
            effective: requested,
            demoted: false,
        }
    }
}

pub fn derive_profile(intake: &StudentIntake) -> DerivedProfile {
    let cluster_avg = |cluster: Cluster| average(intake.cluster_grades(cluster));
    let certifications = parse_certification_list(&intake.certification_text);
    let certification_flag = if certifications.is_empty() {
        YesNo::No
    } else {
        YesNo::Yes
    };

    DerivedProfile {
        programming_avg: cluster_avg(Cluster::Programming),
        networking_avg: cluster_avg(Cluster::Networking),
        database_avg: cluster_avg(Cluster::Database),
        web_system_avg: cluster_avg(Cluster::WebAndSystemDevelopment),
        hardware_avg: cluster_avg(Cluster::HardwareAndComputingFundamentals),
        electives_avg: cluster_avg(Cluster::Electives),
        participation: classify_extracurricular(&intake.extracurricular),
        living_arrangement: resolve_living_arrangement(&intake.living_basis),
        soft_skills: classify_soft_skill_composite(&intake.soft_skills),
        certifications,
        certification_flag,
        graduate_on_time: compute_graduate_on_time(intake.failed_grade, intake.dropped_subjects),
        latin_honors: enforce_latin_honors_gate(intake.all_grades(), intake.latin_honors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn average_excludes_unparseable_entries() {
        assert_eq!(average([""; 0]), "");
        assert_eq!(average(["abc"]), "");
        assert_eq!(average(["2.00", "3.00"]), "2.50");
        assert_eq!(average(["1.00", "", "3.00"]), "2.00");
    }

    #[test]
    fn average_stays_within_input_bounds() {
        let inputs = [
            vec!["1.00", "2.75", "1.25"],
            vec!["5.00", "1.00"],
            vec!["2.50", "x", "2.50"],
        ];
        for grades in inputs {
            let nums: Vec<f64> = grades.iter().filter_map(|g| g.parse().ok()).collect();
            let min = nums.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean: f64 = average(grades).parse().unwrap();
            assert!(mean >= min - 0.005 && mean <= max + 0.005);
        }
    }

    #[test]
    fn extracurricular_cluster_counts_selections() {
        assert_eq!(
            classify_extracurricular(&[]),
            ParticipationCluster::NoParticipation
        );
        assert_eq!(
            classify_extracurricular(&tags(&["Cultural Performer"])),
            ParticipationCluster::SingleExtracurricular
        );
        assert_eq!(
            classify_extracurricular(&tags(&["Cultural Performer", "Sports"])),
            ParticipationCluster::MultipleExtracurricular
        );
        // blank and "None" entries do not count as participation
        assert_eq!(
            classify_extracurricular(&tags(&["None", ""])),
            ParticipationCluster::NoParticipation
        );
    }

    #[test]
    fn housing_keywords_resolve_to_temporary() {
        assert_eq!(
            resolve_living_arrangement("Boarding/Dorm/Bedspace"),
            LivingArrangement::TemporaryHousing
        );
        assert_eq!(
            resolve_living_arrangement("Rented Apartment/Condo"),
            LivingArrangement::TemporaryHousing
        );
        assert_eq!(
            resolve_living_arrangement("Own/Parents/Relative"),
            LivingArrangement::PermanentHousing
        );
        assert_eq!(
            resolve_living_arrangement(""),
            LivingArrangement::PermanentHousing
        );
    }

    #[test]
    fn soft_skill_levels_use_exact_boundaries() {
        let pick = |n: usize| tags(&crate::models::SOFT_SKILL_TAGS[..n]);
        assert_eq!(
            classify_soft_skill_composite(&pick(9)).level,
            SoftSkillLevel::Advanced
        );
        assert_eq!(
            classify_soft_skill_composite(&pick(8)).level,
            SoftSkillLevel::Developing
        );
        assert_eq!(
            classify_soft_skill_composite(&pick(5)).level,
            SoftSkillLevel::Developing
        );
        assert_eq!(
            classify_soft_skill_composite(&pick(4)).level,
            SoftSkillLevel::Foundational
        );
        assert_eq!(classify_soft_skill_composite(&pick(5)).count, 5);
    }

    #[test]
    fn certification_list_trims_and_drops_empty_tokens() {
        assert_eq!(
            parse_certification_list("AWS CCP, NCII CSS"),
            vec!["AWS CCP", "NCII CSS"]
        );
        assert!(parse_certification_list("").is_empty());
        assert_eq!(parse_certification_list("X,,Y"), vec!["X", "Y"]);
        // duplicates are kept
        assert_eq!(parse_certification_list("AWS, AWS"), vec!["AWS", "AWS"]);
    }

    #[test]
    fn graduate_on_time_is_a_boolean_or_gate() {
        assert_eq!(compute_graduate_on_time(YesNo::Yes, YesNo::No), YesNo::No);
        assert_eq!(compute_graduate_on_time(YesNo::No, YesNo::Yes), YesNo::No);
        assert_eq!(compute_graduate_on_time(YesNo::No, YesNo::No), YesNo::Yes);
    }

    #[test]
    fn honors_gate_demotes_over_threshold_grades() {
        let outcome = enforce_latin_honors_gate(["1.00", "1.00", "2.75"], YesNo::Yes);
        assert_eq!(outcome.effective, YesNo::No);
        assert!(outcome.demoted);
    }

    #[test]
    fn honors_gate_boundary_is_inclusive() {
        let outcome = enforce_latin_honors_gate(["1.00", "2.00", "2.50"], YesNo::Yes);
        assert_eq!(outcome.effective, YesNo::Yes);
        assert!(!outcome.demoted);
    }

    #[test]
    fn honors_gate_passes_no_through_untouched() {
        let outcome = enforce_latin_honors_gate(["2.75"], YesNo::No);
        assert_eq!(outcome.effective, YesNo::No);
        assert!(!outcome.demoted);
    }

    #[test]
    fn canonical_grade_steps_parse_and_gate() {
        for step in crate::models::GRADE_STEPS {
            assert!(crate::models::is_grade_step(step));
            assert!(step.parse::<f64>().is_ok());
        }
        assert!(!crate::models::is_grade_step("4.00"));
        assert!(!crate::models::is_grade_step(""));

        // of the allowed steps, only 2.75, 3.00 and 5.00 bar honors
        let barring = crate::models::GRADE_STEPS
            .iter()
            .filter(|step| !latin_honors_eligible([**step]))
            .count();
        assert_eq!(barring, 3);
    }

    #[test]
    fn withdrawn_sentinel_counts_against_honors() {
        assert!(!latin_honors_eligible(["1.00", "5.00"]));
        assert!(latin_honors_eligible(["", "abc"]));
    }

    fn sample_intake() -> StudentIntake {
        StudentIntake {
            student_no: "2021-00123".to_string(),
            first_name: "Maria".to_string(),
            last_name: "Santos".to_string(),
            living_basis: "Boarding/Dorm/Bedspace".to_string(),
            latin_honors: YesNo::Yes,
            certification_text: "AWS CCP, NCII CSS".to_string(),
            extracurricular: tags(&["Cultural Performer", "Sports"]),
            soft_skills: tags(&crate::models::SOFT_SKILL_TAGS[..5]),
            it105: "1.25".to_string(),
            it203: "1.75".to_string(),
            it106: "2.00".to_string(),
            ..StudentIntake::default()
        }
    }

    #[test]
    fn derived_profile_composes_all_values() {
        let profile = derive_profile(&sample_intake());
        assert_eq!(profile.programming_avg, "1.50");
        assert_eq!(profile.networking_avg, "2.00");
        assert_eq!(profile.database_avg, "");
        assert_eq!(
            profile.participation,
            ParticipationCluster::MultipleExtracurricular
        );
        assert_eq!(
            profile.living_arrangement,
            LivingArrangement::TemporaryHousing
        );
        assert_eq!(profile.soft_skills.level, SoftSkillLevel::Developing);
        assert_eq!(profile.certification_flag, YesNo::Yes);
        assert_eq!(profile.graduate_on_time, YesNo::Yes);
        assert_eq!(profile.latin_honors.effective, YesNo::Yes);
    }

    #[test]
    fn derived_profile_gate_reacts_to_a_grade_edit() {
        let mut intake = sample_intake();
        assert_eq!(derive_profile(&intake).latin_honors.effective, YesNo::Yes);

        intake.it312 = "2.75".to_string();
        let profile = derive_profile(&intake);
        assert_eq!(profile.latin_honors.effective, YesNo::No);
        assert!(profile.latin_honors.demoted);
    }

    #[test]
    fn derivation_is_idempotent() {
        let intake = sample_intake();
        let first = derive_profile(&intake);
        let second = derive_profile(&intake);
        assert_eq!(first.programming_avg, second.programming_avg);
        assert_eq!(first.latin_honors, second.latin_honors);
        assert_eq!(first.soft_skills, second.soft_skills);
        assert_eq!(first.certifications, second.certifications);
    }
}
