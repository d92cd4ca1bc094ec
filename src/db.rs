use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::derive;
use crate::models::{
    PredictionResult, StudentIntake, YesNo, EXTRACURRICULAR_TAGS, HOUSING_BASIS_OPTIONS,
    INCOME_BRACKETS, LOCATIONS, SOFT_SKILL_TAGS, SPECIALIZATION_TRACKS,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn intake_from_row(row: &PgRow) -> StudentIntake {
    let text = |column: &str| row.get::<String, _>(column);
    let yes_no = |column: &str| YesNo::parse(&row.get::<String, _>(column));
    // the form backend stored the multi-selects as JSON text; unreadable
    // values degrade to an empty set rather than failing the fetch
    let tag_list = |column: &str| {
        serde_json::from_str::<Vec<String>>(&row.get::<String, _>(column)).unwrap_or_default()
    };

    StudentIntake {
        student_no: text("student_no"),
        first_name: text("first_name"),
        middle_name: text("middle_name"),
        last_name: text("last_name"),
        age: text("age"),
        gender: text("gender"),
        location: text("location"),
        living_basis: text("living_basis"),
        awards: yes_no("awards"),
        specialization_track: text("specialization_track"),
        latin_honors: yes_no("latin_honors"),
        failed_grade: yes_no("failed_grade"),
        dropped_subjects: yes_no("dropped_subjects"),
        further_studies: yes_no("further_studies"),
        monthly_income_status: text("monthly_income_status"),
        certification_text: text("certification_text"),
        extracurricular: tag_list("extracurricular_json"),
        soft_skills: tag_list("soft_skills_json"),
        it105: text("it105"),
        it203: text("it203"),
        it207: text("it207"),
        it204: text("it204"),
        it106: text("it106"),
        it210: text("it210"),
        it202: text("it202"),
        it206: text("it206"),
        it303: text("it303"),
        it304: text("it304"),
        it310: text("it310"),
        it102: text("it102"),
        it104: text("it104"),
        it306: text("it306"),
        it307: text("it307"),
        it311: text("it311"),
        it312: text("it312"),
    }
}

pub async fn upsert_student(pool: &PgPool, intake: &StudentIntake) -> anyhow::Result<Uuid> {
    let extracurricular_json = serde_json::to_string(&intake.extracurricular)?;
    let soft_skills_json = serde_json::to_string(&intake.soft_skills)?;

    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO grasp.students
        (id, student_no, first_name, middle_name, last_name, age, gender,
         location, living_basis, awards, specialization_track, latin_honors,
         failed_grade, dropped_subjects, further_studies, monthly_income_status,
         certification_text, extracurricular_json, soft_skills_json,
         it105, it203, it207, it204, it106, it210, it202, it206,
         it303, it304, it310, it102, it104, it306, it307, it311, it312,
         recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                $27, $28, $29, $30, $31, $32, $33, $34, $35, $36, $37)
        ON CONFLICT (student_no) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            middle_name = EXCLUDED.middle_name,
            last_name = EXCLUDED.last_name,
            age = EXCLUDED.age,
            gender = EXCLUDED.gender,
            location = EXCLUDED.location,
            living_basis = EXCLUDED.living_basis,
            awards = EXCLUDED.awards,
            specialization_track = EXCLUDED.specialization_track,
            latin_honors = EXCLUDED.latin_honors,
            failed_grade = EXCLUDED.failed_grade,
            dropped_subjects = EXCLUDED.dropped_subjects,
            further_studies = EXCLUDED.further_studies,
            monthly_income_status = EXCLUDED.monthly_income_status,
            certification_text = EXCLUDED.certification_text,
            extracurricular_json = EXCLUDED.extracurricular_json,
            soft_skills_json = EXCLUDED.soft_skills_json,
            it105 = EXCLUDED.it105, it203 = EXCLUDED.it203,
            it207 = EXCLUDED.it207, it204 = EXCLUDED.it204,
            it106 = EXCLUDED.it106, it210 = EXCLUDED.it210,
            it202 = EXCLUDED.it202, it206 = EXCLUDED.it206,
            it303 = EXCLUDED.it303, it304 = EXCLUDED.it304,
            it310 = EXCLUDED.it310, it102 = EXCLUDED.it102,
            it104 = EXCLUDED.it104, it306 = EXCLUDED.it306,
            it307 = EXCLUDED.it307, it311 = EXCLUDED.it311,
            it312 = EXCLUDED.it312,
            recorded_at = EXCLUDED.recorded_at
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&intake.student_no)
    .bind(&intake.first_name)
    .bind(&intake.middle_name)
    .bind(&intake.last_name)
    .bind(&intake.age)
    .bind(&intake.gender)
    .bind(&intake.location)
    .bind(&intake.living_basis)
    .bind(intake.awards.as_str())
    .bind(&intake.specialization_track)
    .bind(intake.latin_honors.as_str())
    .bind(intake.failed_grade.as_str())
    .bind(intake.dropped_subjects.as_str())
    .bind(intake.further_studies.as_str())
    .bind(&intake.monthly_income_status)
    .bind(&intake.certification_text)
    .bind(&extracurricular_json)
    .bind(&soft_skills_json)
    .bind(&intake.it105)
    .bind(&intake.it203)
    .bind(&intake.it207)
    .bind(&intake.it204)
    .bind(&intake.it106)
    .bind(&intake.it210)
    .bind(&intake.it202)
    .bind(&intake.it206)
    .bind(&intake.it303)
    .bind(&intake.it304)
    .bind(&intake.it310)
    .bind(&intake.it102)
    .bind(&intake.it104)
    .bind(&intake.it306)
    .bind(&intake.it307)
    .bind(&intake.it311)
    .bind(&intake.it312)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

pub async fn fetch_students(
    pool: &PgPool,
    track: Option<&str>,
    student_no: Option<&str>,
) -> anyhow::Result<Vec<StudentIntake>> {
    let mut query = String::from("SELECT * FROM grasp.students");

    if track.is_some() {
        query.push_str(" WHERE specialization_track = $1");
    } else if student_no.is_some() {
        query.push_str(" WHERE student_no = $1");
    }
    query.push_str(" ORDER BY last_name, first_name");

    let mut rows = sqlx::query(&query);
    if let Some(value) = track {
        rows = rows.bind(value);
    } else if let Some(value) = student_no {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(intake_from_row).collect())
}

pub async fn fetch_student(
    pool: &PgPool,
    student_no: &str,
) -> anyhow::Result<Option<StudentIntake>> {
    let row = sqlx::query("SELECT * FROM grasp.students WHERE student_no = $1")
        .bind(student_no)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(intake_from_row))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_no: String,
        first_name: String,
        #[serde(default)]
        middle_name: String,
        last_name: String,
        #[serde(default)]
        age: String,
        #[serde(default)]
        gender: String,
        #[serde(default)]
        location: String,
        #[serde(default)]
        living_basis: String,
        #[serde(default)]
        awards: String,
        #[serde(default)]
        specialization_track: String,
        #[serde(default)]
        latin_honors: String,
        #[serde(default)]
        failed_grade: String,
        #[serde(default)]
        dropped_subjects: String,
        #[serde(default)]
        further_studies: String,
        #[serde(default)]
        monthly_income_status: String,
        #[serde(default)]
        certification_text: String,
        #[serde(default)]
        extracurricular: String,
        #[serde(default)]
        soft_skills: String,
        #[serde(default)]
        it105: String,
        #[serde(default)]
        it203: String,
        #[serde(default)]
        it207: String,
        #[serde(default)]
        it204: String,
        #[serde(default)]
        it106: String,
        #[serde(default)]
        it210: String,
        #[serde(default)]
        it202: String,
        #[serde(default)]
        it206: String,
        #[serde(default)]
        it303: String,
        #[serde(default)]
        it304: String,
        #[serde(default)]
        it310: String,
        #[serde(default)]
        it102: String,
        #[serde(default)]
        it104: String,
        #[serde(default)]
        it306: String,
        #[serde(default)]
        it307: String,
        #[serde(default)]
        it311: String,
        #[serde(default)]
        it312: String,
    }

    // multi-select cells are semicolon-separated in the CSV
    fn split_tags(cell: &str) -> Vec<String> {
        cell.split(';')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let intake = StudentIntake {
            student_no: row.student_no,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            age: row.age,
            gender: row.gender,
            location: row.location,
            living_basis: row.living_basis,
            awards: YesNo::parse(&row.awards),
            specialization_track: row.specialization_track,
            latin_honors: YesNo::parse(&row.latin_honors),
            failed_grade: YesNo::parse(&row.failed_grade),
            dropped_subjects: YesNo::parse(&row.dropped_subjects),
            further_studies: YesNo::parse(&row.further_studies),
            monthly_income_status: row.monthly_income_status,
            certification_text: row.certification_text,
            extracurricular: split_tags(&row.extracurricular),
            soft_skills: split_tags(&row.soft_skills),
            it105: row.it105,
            it203: row.it203,
            it207: row.it207,
            it204: row.it204,
            it106: row.it106,
            it210: row.it210,
            it202: row.it202,
            it206: row.it206,
            it303: row.it303,
            it304: row.it304,
            it310: row.it310,
            it102: row.it102,
            it104: row.it104,
            it306: row.it306,
            it307: row.it307,
            it311: row.it311,
            it312: row.it312,
        };

        let off_step = intake
            .all_grades()
            .into_iter()
            .filter(|grade| !grade.trim().is_empty() && !crate::models::is_grade_step(grade.trim()))
            .count();
        if off_step > 0 {
            println!(
                "warning: {} has {off_step} grade value(s) outside the allowed steps; \
                 they still average if numeric",
                intake.student_no
            );
        }

        if intake.latin_honors.is_yes() && !derive::latin_honors_eligible(intake.all_grades()) {
            println!(
                "warning: {} requests Latin honors but has a grade above {:.2}; \
                 the value will read back as No",
                intake.student_no,
                derive::LATIN_HONORS_GRADE_CEILING
            );
        }

        upsert_student(pool, &intake).await?;
        imported += 1;
    }

    Ok(imported)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        StudentIntake {
            student_no: "2021-00117".to_string(),
            first_name: "Maria".to_string(),
            middle_name: "Dela".to_string(),
            last_name: "Cruz".to_string(),
            age: "22".to_string(),
            gender: "Female".to_string(),
            location: LOCATIONS[0].to_string(),
            living_basis: HOUSING_BASIS_OPTIONS[0].to_string(),
            awards: YesNo::Yes,
            specialization_track: SPECIALIZATION_TRACKS[1].to_string(),
            latin_honors: YesNo::Yes,
            monthly_income_status: INCOME_BRACKETS[2].to_string(),
            certification_text: "NCII CSS".to_string(),
            extracurricular: vec![EXTRACURRICULAR_TAGS[0].to_string()],
            soft_skills: SOFT_SKILL_TAGS[..9]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            it105: "1.25".to_string(),
            it203: "1.50".to_string(),
            it207: "1.25".to_string(),
            it204: "1.75".to_string(),
            it106: "1.50".to_string(),
            it210: "1.75".to_string(),
            it202: "1.25".to_string(),
            it206: "1.50".to_string(),
            it303: "1.50".to_string(),
            it304: "1.25".to_string(),
            it310: "1.75".to_string(),
            it102: "1.50".to_string(),
            it104: "1.25".to_string(),
            it306: "1.75".to_string(),
            it307: "1.50".to_string(),
            it311: "1.25".to_string(),
            it312: "1.50".to_string(),
            ..StudentIntake::default()
        },
        StudentIntake {
            student_no: "2021-00232".to_string(),
            first_name: "Joshua".to_string(),
            last_name: "Reyes".to_string(),
            age: "23".to_string(),
            gender: "Male".to_string(),
            location: LOCATIONS[1].to_string(),
            living_basis: HOUSING_BASIS_OPTIONS[1].to_string(),
            specialization_track: SPECIALIZATION_TRACKS[0].to_string(),
            failed_grade: YesNo::Yes,
            monthly_income_status: INCOME_BRACKETS[1].to_string(),
            extracurricular: vec![
                EXTRACURRICULAR_TAGS[1].to_string(),
                EXTRACURRICULAR_TAGS[3].to_string(),
            ],
            soft_skills: SOFT_SKILL_TAGS[..5]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            it105: "2.25".to_string(),
            it203: "2.75".to_string(),
            it207: "2.50".to_string(),
            it204: "2.25".to_string(),
            it106: "2.00".to_string(),
            it210: "2.50".to_string(),
            it202: "2.75".to_string(),
            it206: "2.25".to_string(),
            it303: "2.50".to_string(),
            it304: "2.25".to_string(),
            it310: "2.75".to_string(),
            it102: "2.00".to_string(),
            it104: "2.25".to_string(),
            it306: "2.50".to_string(),
            it307: "2.25".to_string(),
            it311: "2.00".to_string(),
            it312: "2.50".to_string(),
            ..StudentIntake::default()
        },
        StudentIntake {
            student_no: "2021-00358".to_string(),
            first_name: "Angelica".to_string(),
            last_name: "Manalo".to_string(),
            age: "21".to_string(),
            gender: "Female".to_string(),
            location: LOCATIONS[0].to_string(),
            living_basis: HOUSING_BASIS_OPTIONS[2].to_string(),
            specialization_track: SPECIALIZATION_TRACKS[2].to_string(),
            dropped_subjects: YesNo::Yes,
            further_studies: YesNo::Yes,
            monthly_income_status: INCOME_BRACKETS[3].to_string(),
            certification_text: "AWS CCP, NCII CSS".to_string(),
            soft_skills: SOFT_SKILL_TAGS[..3]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            it105: "1.75".to_string(),
            it203: "2.00".to_string(),
            it207: "1.75".to_string(),
            it204: "2.00".to_string(),
            it106: "1.75".to_string(),
            it210: "2.00".to_string(),
            it202: "1.75".to_string(),
            it206: "2.00".to_string(),
            it303: "1.75".to_string(),
            it310: "2.00".to_string(),
            it102: "1.75".to_string(),
            it104: "2.00".to_string(),
            it306: "1.75".to_string(),
            it307: "5.00".to_string(),
            ..StudentIntake::default()
        },
    ];

    for intake in &students {
        upsert_student(pool, intake).await?;
    }

    Ok(())
}

pub async fn store_prediction(
    pool: &PgPool,
    student_no: &str,
    result: &PredictionResult,
) -> anyhow::Result<()> {
    let proba_json = serde_json::to_string(&result.proba_json)?;
    let strengths_json = serde_json::to_string(&result.strengths)?;
    let weaknesses_json = serde_json::to_string(&result.weaknesses)?;

    sqlx::query(
        r#"
        INSERT INTO grasp.predictions
        (id, student_no, prediction_label, prediction_index,
         proba_json, strengths_json, weaknesses_json, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (student_no) DO UPDATE SET
            prediction_label = EXCLUDED.prediction_label,
            prediction_index = EXCLUDED.prediction_index,
            proba_json = EXCLUDED.proba_json,
            strengths_json = EXCLUDED.strengths_json,
            weaknesses_json = EXCLUDED.weaknesses_json,
            recorded_at = EXCLUDED.recorded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_no)
    .bind(&result.prediction_label)
    .bind(result.prediction_index)
    .bind(&proba_json)
    .bind(&strengths_json)
    .bind(&weaknesses_json)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

fn prediction_from_row(row: &PgRow) -> PredictionResult {
    PredictionResult {
        prediction_label: row.get("prediction_label"),
        prediction_index: row.get("prediction_index"),
        proba_json: serde_json::from_str(&row.get::<String, _>("proba_json")).unwrap_or_default(),
        strengths: serde_json::from_str(&row.get::<String, _>("strengths_json"))
            .unwrap_or_default(),
        weaknesses: serde_json::from_str(&row.get::<String, _>("weaknesses_json"))
            .unwrap_or_default(),
    }
}

pub async fn fetch_prediction(
    pool: &PgPool,
    student_no: &str,
) -> anyhow::Result<Option<PredictionResult>> {
    let row = sqlx::query("SELECT * FROM grasp.predictions WHERE student_no = $1")
        .bind(student_no)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(prediction_from_row))
}

pub async fn fetch_predictions(
    pool: &PgPool,
) -> anyhow::Result<Vec<(String, PredictionResult)>> {
    let rows = sqlx::query("SELECT * FROM grasp.predictions ORDER BY student_no")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get("student_no"), prediction_from_row(row)))
        .collect())
}
