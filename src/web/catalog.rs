//! Catalog browsing: faculties, courses, years and year levels.

use crate::access::{AccessMode, ListingAccess};
use crate::app_config::AppConfig;
use crate::catalog::{self, tree};
use crate::error::ServiceError;
use crate::orm::notes::{self, NoteType};
use crate::storage::StorageBackend;
use crate::web::views::{
    CourseSummary, FacultyView, NoteWithAccess, SemesterSummary, Urls, YearLevelSummary,
};
use actix_web::{get, web, HttpRequest, HttpResponse};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(list_faculties)
        .service(view_faculty)
        .service(view_faculty_year)
        .service(view_course)
        .service(view_year_level_notes);
}

/// Optional `?student_id=` used by the enforced access policy.
#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub student_id: Option<i32>,
}

#[derive(Serialize)]
struct DashboardCourses {
    all: Vec<CourseSummary>,
    pairs: Vec<Vec<CourseSummary>>,
}

#[derive(Serialize)]
struct DashboardFaculty {
    id: i32,
    name: String,
    code: String,
    description: Option<String>,
    courses: DashboardCourses,
}

/// Group courses in twos for the landing page layout.
fn pairs(courses: &[CourseSummary]) -> Vec<Vec<CourseSummary>> {
    courses.chunks(2).map(|pair| pair.to_vec()).collect()
}

#[get("/api/dashboard/")]
async fn view_dashboard(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let faculties = catalog::list_faculties(db).await?;
    let mut courses =
        catalog::courses_by_faculty(db, faculties.iter().map(|f| f.id).collect()).await?;

    let dashboard: Vec<DashboardFaculty> = faculties
        .into_iter()
        .map(|faculty| {
            let all: Vec<CourseSummary> = courses
                .remove(&faculty.id)
                .unwrap_or_default()
                .iter()
                .map(CourseSummary::from)
                .collect();
            DashboardFaculty {
                id: faculty.id,
                name: faculty.name,
                code: faculty.code,
                description: faculty.description,
                courses: DashboardCourses {
                    pairs: pairs(&all),
                    all,
                },
            }
        })
        .collect();
    Ok(HttpResponse::Ok().json(dashboard))
}

#[get("/api/faculties/")]
async fn list_faculties(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ServiceError> {
    let faculties: Vec<FacultyView> = catalog::list_faculties(db.get_ref())
        .await?
        .iter()
        .map(FacultyView::from)
        .collect();
    Ok(HttpResponse::Ok().json(faculties))
}

#[derive(Serialize)]
struct FacultyDetail {
    #[serde(flatten)]
    faculty: FacultyView,
    courses: Vec<CourseSummary>,
}

#[get("/api/faculties/{code}/")]
async fn view_faculty(
    db: web::Data<DatabaseConnection>,
    code: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let faculty = catalog::find_faculty_by_code(db, &code).await?;
    let courses = catalog::list_courses(db, faculty.id)
        .await?
        .iter()
        .map(CourseSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(FacultyDetail {
        faculty: FacultyView::from(&faculty),
        courses,
    }))
}

#[derive(Serialize)]
struct CourseYearLevels {
    id: i32,
    name: String,
    code: String,
    year_levels: Vec<YearLevelSummary>,
}

#[get("/api/faculties/{code}/year/{year}/")]
async fn view_faculty_year(
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (code, year) = path.into_inner();
    let db = db.get_ref();
    let faculty = catalog::find_faculty_by_code(db, &code).await?;
    let courses = catalog::list_courses(db, faculty.id).await?;
    let mut levels =
        tree::year_levels_for_year(db, courses.iter().map(|c| c.id).collect(), year).await?;

    let courses: Vec<CourseYearLevels> = courses
        .into_iter()
        .map(|course| CourseYearLevels {
            year_levels: levels
                .remove(&course.id)
                .unwrap_or_default()
                .iter()
                .map(YearLevelSummary::from)
                .collect(),
            id: course.id,
            name: course.name,
            code: course.code,
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "faculty_name": faculty.name,
        "faculty_code": faculty.code,
        "year": year,
        "courses": courses,
    })))
}

#[derive(Serialize)]
struct SemesterWithNotes {
    id: i32,
    semester_number: i32,
    name: String,
    notes: Vec<NoteWithAccess>,
}

#[derive(Serialize)]
struct YearLevelWithSemesters {
    id: i32,
    level: i32,
    name: String,
    semesters: Vec<SemesterWithNotes>,
}

#[derive(Serialize)]
struct AcademicYearWithLevels {
    id: i32,
    year: i32,
    is_current: bool,
    year_levels: Vec<YearLevelWithSemesters>,
}

#[derive(Serialize)]
struct CourseDetail {
    #[serde(flatten)]
    course: CourseSummary,
    created_at: NaiveDateTime,
    academic_years: Vec<AcademicYearWithLevels>,
}

fn year_level_with_semesters(
    level: &tree::YearLevelTree,
    access: &ListingAccess,
    urls: &Urls,
) -> YearLevelWithSemesters {
    YearLevelWithSemesters {
        id: level.year_level.id,
        level: level.year_level.level,
        name: level.year_level.name.clone(),
        semesters: level
            .semesters
            .iter()
            .map(|s| SemesterWithNotes {
                id: s.semester.id,
                semester_number: s.semester.semester_number,
                name: s.semester.name.clone(),
                notes: s
                    .notes
                    .iter()
                    .map(|n| NoteWithAccess::new(n, access, urls))
                    .collect(),
            })
            .collect(),
    }
}

#[get("/api/faculties/{code}/courses/{course}/")]
async fn view_course(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<(String, String)>,
    query: web::Query<StudentQuery>,
) -> Result<HttpResponse, ServiceError> {
    let (faculty_code, course_code) = path.into_inner();
    let db = db.get_ref();
    let faculty = catalog::find_faculty_by_code(db, &faculty_code).await?;
    let course = catalog::find_course_by_code(db, faculty.id, &course_code).await?;
    let all_courses: Vec<_> = catalog::list_courses(db, faculty.id)
        .await?
        .into_iter()
        .map(|c| json!({ "id": c.id, "name": c.name, "code": c.code }))
        .collect();

    let course_tree = tree::load_course_tree(db, course).await?;
    let access = ListingAccess::load(
        db,
        &config.access,
        query.student_id,
        course_tree.notes().map(|n| n.id).collect(),
    )
    .await?;
    let urls = Urls::from_request(&req);

    let detail = CourseDetail {
        course: CourseSummary::from(&course_tree.course),
        created_at: course_tree.course.created_at,
        academic_years: course_tree
            .academic_years
            .iter()
            .map(|y| AcademicYearWithLevels {
                id: y.academic_year.id,
                year: y.academic_year.year,
                is_current: y.academic_year.is_current,
                year_levels: y
                    .year_levels
                    .iter()
                    .map(|l| year_level_with_semesters(l, &access, &urls))
                    .collect(),
            })
            .collect(),
    };

    Ok(HttpResponse::Ok().json(json!({
        "faculty": {
            "id": faculty.id,
            "name": faculty.name,
            "code": faculty.code,
            "description": faculty.description,
        },
        "course": detail,
        "all_courses": all_courses,
    })))
}

/// Flat note entry of the year level page.
#[derive(Serialize)]
struct YearLevelNote {
    id: i32,
    title: String,
    description: Option<String>,
    note_type: NoteType,
    uploaded_at: NaiveDateTime,
    file_size: Option<i64>,
    file_size_mb: Option<f64>,
    file_extension: Option<String>,
    has_preview: bool,
    view_count: i32,
    can_preview: bool,
    can_view: bool,
    can_download: bool,
    is_premium: bool,
    preview_url: Option<String>,
    view_url: String,
    file_url: Option<String>,
}

impl YearLevelNote {
    fn new(
        note: &notes::Model,
        access: &ListingAccess,
        urls: &Urls,
        storage: &dyn StorageBackend,
    ) -> Self {
        let flags = access.note_access(note);
        let file_url = match access.mode() {
            AccessMode::FreeTrial => None,
            AccessMode::Enforced => flags.can_download.then(|| urls.file(storage, &note.file)),
        };
        YearLevelNote {
            id: note.id,
            title: note.title.clone(),
            description: note.description.clone(),
            note_type: note.note_type,
            uploaded_at: note.uploaded_at,
            file_size: note.file_size,
            file_size_mb: note.file_size_mb(),
            file_extension: note.file_extension(),
            has_preview: note.has_preview,
            view_count: note.view_count,
            can_preview: flags.can_preview,
            can_view: flags.can_view,
            can_download: flags.can_download,
            is_premium: note.is_premium,
            preview_url: urls.note_preview(note),
            view_url: urls.note_view(note),
            file_url,
        }
    }
}

#[derive(Serialize)]
struct SemesterNotes {
    semester: SemesterSummary,
    notes: Vec<YearLevelNote>,
}

#[get("/api/faculties/{code}/courses/{course}/{year}/year/{level}/")]
async fn view_year_level_notes(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<(String, String, i32, i32)>,
    query: web::Query<StudentQuery>,
) -> Result<HttpResponse, ServiceError> {
    let (faculty_code, course_code, year, level) = path.into_inner();
    let db = db.get_ref();
    let faculty = catalog::find_faculty_by_code(db, &faculty_code).await?;
    let course = catalog::find_course_by_code(db, faculty.id, &course_code).await?;
    let academic_year = catalog::find_academic_year(db, course.id, year).await?;
    let year_level = catalog::find_year_level(db, academic_year.id, level).await?;

    let level_tree = tree::load_year_level_tree(db, year_level).await?;
    let access = ListingAccess::load(
        db,
        &config.access,
        query.student_id,
        level_tree.notes().map(|n| n.id).collect(),
    )
    .await?;
    let urls = Urls::from_request(&req);

    let semesters: Vec<SemesterNotes> = level_tree
        .semesters
        .iter()
        .map(|s| SemesterNotes {
            semester: SemesterSummary::from(&s.semester),
            notes: s
                .notes
                .iter()
                .map(|n| YearLevelNote::new(n, &access, &urls, storage.get_ref()))
                .collect(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "faculty": { "name": faculty.name, "code": faculty.code },
        "course": { "name": course.name, "code": course.code },
        "academic_year": academic_year.year,
        "year_level": {
            "id": level_tree.year_level.id,
            "level": level_tree.year_level.level,
            "name": level_tree.year_level.name,
            "semesters": semesters,
        },
    })))
}
