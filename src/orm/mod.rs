//! SeaORM entities, one module per table.

pub mod about_us;
pub mod academic_years;
pub mod courses;
pub mod faculties;
pub mod how_it_works;
pub mod notes;
pub mod payments;
pub mod semesters;
pub mod site_settings;
pub mod student_access;
pub mod students;
pub mod year_levels;
