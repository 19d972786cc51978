//! Test fixtures for creating catalog data
#![allow(clippy::needless_update)]

use chrono::{Duration, Utc};
use paperflow::catalog::retention::{self, AcademicYearInput};
use paperflow::catalog::{self, NewCourse, NewFaculty, NewSemester, NewYearLevel};
use paperflow::orm::courses::CourseType;
use paperflow::orm::notes::NoteType;
use paperflow::orm::{academic_years, courses, faculties, notes, semesters, students, year_levels};
use paperflow::storage::StorageBackend;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection};

/// One branch of the catalog, faculty down to semester.
pub struct CatalogBranch {
    pub faculty: faculties::Model,
    pub course: courses::Model,
    pub academic_year: academic_years::Model,
    pub year_level: year_levels::Model,
    pub semester: semesters::Model,
}

pub async fn create_faculty(db: &DatabaseConnection, code: &str) -> faculties::Model {
    catalog::create_faculty(
        db,
        NewFaculty {
            name: format!("Faculty of {}", code),
            code: code.to_string(),
            description: None,
        },
    )
    .await
    .expect("Failed to create faculty")
}

pub async fn create_course(
    db: &DatabaseConnection,
    faculty_id: i32,
    code: &str,
    duration_years: i32,
) -> courses::Model {
    catalog::create_course(
        db,
        NewCourse {
            faculty_id,
            name: format!("Bachelor of {}", code),
            code: code.to_string(),
            course_type: CourseType::Bachelor,
            duration_years,
        },
    )
    .await
    .expect("Failed to create course")
}

/// Save an academic year with the default retention of two years.
pub async fn create_academic_year(
    db: &DatabaseConnection,
    course_id: i32,
    year: i32,
    is_current: bool,
) -> retention::RetentionOutcome {
    retention::save_academic_year(
        db,
        AcademicYearInput {
            course_id,
            year,
            is_current,
        },
        None,
        2,
    )
    .await
    .expect("Failed to save academic year")
}

/// Year level 1 with semester 1 under an existing academic year.
pub async fn create_level_and_semester(
    db: &DatabaseConnection,
    academic_year_id: i32,
) -> (year_levels::Model, semesters::Model) {
    let year_level = catalog::create_year_level(
        db,
        NewYearLevel {
            academic_year_id,
            level: 1,
            name: None,
        },
    )
    .await
    .expect("Failed to create year level");
    let semester = catalog::create_semester(
        db,
        NewSemester {
            year_level_id: year_level.id,
            semester_number: 1,
            name: None,
        },
    )
    .await
    .expect("Failed to create semester");
    (year_level, semester)
}

/// Faculty, course (3 years), academic year, year level 1 and semester 1.
pub async fn create_branch(
    db: &DatabaseConnection,
    faculty_code: &str,
    course_code: &str,
    year: i32,
) -> CatalogBranch {
    let faculty = create_faculty(db, faculty_code).await;
    let course = create_course(db, faculty.id, course_code, 3).await;
    let academic_year = create_academic_year(db, course.id, year, true)
        .await
        .academic_year;
    let (year_level, semester) = create_level_and_semester(db, academic_year.id).await;
    CatalogBranch {
        faculty,
        course,
        academic_year,
        year_level,
        semester,
    }
}

/// Insert a note row and store its file.
pub async fn create_note(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    semester_id: i32,
    title: &str,
    is_premium: bool,
) -> notes::Model {
    let key = format!("notes/fixtures/{}/{}.pdf", semester_id, title.replace(' ', "_"));
    let data = b"%PDF-1.4 fixture".to_vec();
    let size = data.len() as i64;
    storage
        .put_object(data, &key)
        .await
        .expect("Failed to store note file");

    notes::ActiveModel {
        semester_id: Set(semester_id),
        title: Set(title.to_string()),
        description: Set(Some(format!("{} description", title))),
        file: Set(key),
        note_type: Set(NoteType::Lecture),
        uploaded_at: Set(Utc::now().naive_utc()),
        file_size: Set(Some(size)),
        preview_file: Set(None),
        has_preview: Set(true),
        preview_generated_at: Set(None),
        is_premium: Set(is_premium),
        view_count: Set(0),
        download_count: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create note")
}

pub async fn create_student(db: &DatabaseConnection, email: &str) -> students::Model {
    students::ActiveModel {
        full_name: Set("Test Student".to_string()),
        email: Set(email.to_string()),
        course: Set("BCS".to_string()),
        year: Set(1),
        is_logged_in: Set(false),
        login_token: Set(format!("token-{}", email)),
        total_spent: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create student")
}

/// A timestamp `days` days in the past.
pub fn days_ago(days: i64) -> chrono::NaiveDateTime {
    (Utc::now() - Duration::days(days)).naive_utc()
}

/// A `multipart/form-data` body. Returns the content type and the bytes.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "paperflow-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
