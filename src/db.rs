//! Database connection pool and schema bootstrap.

use crate::orm::{
    about_us, academic_years, courses, faculties, how_it_works, notes, payments, semesters,
    site_settings, student_access, students, year_levels,
};
use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema, Statement,
};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect to `database_url`, create missing tables and publish the pool.
pub async fn init_db(database_url: String) -> Result<(), DbErr> {
    let db = Database::connect(&database_url).await?;
    create_schema(&db).await?;
    if DB_POOL.set(db).is_err() {
        log::warn!("init_db called more than once; keeping the first pool");
    }
    Ok(())
}

/// Returns the pool published by [`init_db`].
///
/// # Panics
/// If [`init_db`] has not completed.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("Database pool is not initialized")
}

/// Composite and single-column unique constraints that the entity derive
/// does not express.
const UNIQUE_INDEXES: &[(&str, &str, &str)] = &[
    ("uq_faculties_code", "faculties", "code"),
    ("uq_courses_faculty_code", "courses", "faculty_id, code"),
    ("uq_academic_years_course_year", "academic_years", "course_id, year"),
    ("uq_year_levels_year_level", "year_levels", "academic_year_id, level"),
    ("uq_semesters_level_number", "semesters", "year_level_id, semester_number"),
    ("uq_how_it_works_step", "how_it_works", "step_number"),
    ("uq_students_email", "students", "email"),
    ("uq_students_login_token", "students", "login_token"),
    ("uq_payments_student_note_type", "payments", "student_id, note_id, payment_type"),
    ("uq_student_access_student_note_type", "student_access", "student_id, note_id, access_type"),
];

/// Create every table (parents before children) and the unique indexes.
/// Existing tables and indexes are left untouched.
pub async fn create_schema<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    create_table(db, faculties::Entity).await?;
    create_table(db, courses::Entity).await?;
    create_table(db, academic_years::Entity).await?;
    create_table(db, year_levels::Entity).await?;
    create_table(db, semesters::Entity).await?;
    create_table(db, notes::Entity).await?;
    create_table(db, site_settings::Entity).await?;
    create_table(db, about_us::Entity).await?;
    create_table(db, how_it_works::Entity).await?;
    create_table(db, students::Entity).await?;
    create_table(db, payments::Entity).await?;
    create_table(db, student_access::Entity).await?;

    let backend = db.get_database_backend();
    for (name, table, columns) in UNIQUE_INDEXES {
        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            name, table, columns
        );
        db.execute(Statement::from_string(backend, sql)).await?;
    }

    log::info!("Database schema ready");
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
