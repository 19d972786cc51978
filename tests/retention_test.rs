//! Academic year retention and the current-year flag.

#[macro_use]
mod common;

use actix_web::test;
use common::database::TestContext;
use common::fixtures::*;
use paperflow::app_config::AppConfig;
use paperflow::orm::{academic_years, notes, semesters, year_levels};
use sea_orm::{entity::*, query::*};
use serde_json::{json, Value};

async fn years_of(ctx: &TestContext, course_id: i32) -> Vec<academic_years::Model> {
    academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.eq(course_id))
        .order_by_desc(academic_years::Column::Year)
        .all(&ctx.db)
        .await
        .unwrap()
}

#[actix_rt::test]
async fn test_third_year_prunes_oldest_with_descendants() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2023).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Old notes", false).await;

    let second = create_academic_year(&ctx.db, branch.course.id, 2024, false).await;
    assert!(second.pruned.is_empty());

    let third = create_academic_year(&ctx.db, branch.course.id, 2025, false).await;
    assert_eq!(third.pruned.academic_years, vec![branch.academic_year.id]);
    assert_eq!(third.pruned.year_levels, vec![branch.year_level.id]);
    assert_eq!(third.pruned.semesters, vec![branch.semester.id]);
    assert_eq!(third.pruned.notes, vec![note.id]);
    assert_eq!(third.pruned.files, vec![note.file.clone()]);
    assert!(!third.was_pruned());

    let years: Vec<i32> = years_of(&ctx, branch.course.id)
        .await
        .iter()
        .map(|y| y.year)
        .collect();
    assert_eq!(years, vec![2025, 2024]);

    assert!(year_levels::Entity::find_by_id(branch.year_level.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .is_none());
    assert!(semesters::Entity::find_by_id(branch.semester.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .is_none());
    assert!(notes::Entity::find_by_id(note.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .is_none());
}

#[actix_rt::test]
async fn test_retention_is_per_course() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2023).await;
    let other = create_course(&ctx.db, branch.faculty.id, "BIT", 3).await;
    create_academic_year(&ctx.db, other.id, 2022, false).await;

    create_academic_year(&ctx.db, branch.course.id, 2024, false).await;
    create_academic_year(&ctx.db, branch.course.id, 2025, false).await;

    assert_eq!(years_of(&ctx, branch.course.id).await.len(), 2);
    assert_eq!(years_of(&ctx, other.id).await.len(), 1);
}

#[actix_rt::test]
async fn test_only_one_current_year_per_course() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    assert!(branch.academic_year.is_current);

    create_academic_year(&ctx.db, branch.course.id, 2025, true).await;

    let current: Vec<i32> = years_of(&ctx, branch.course.id)
        .await
        .iter()
        .filter(|y| y.is_current)
        .map(|y| y.year)
        .collect();
    assert_eq!(current, vec![2025]);
}

#[actix_rt::test]
async fn test_admin_save_removes_pruned_files() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2023).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Week 1", false).await;
    create_academic_year(&ctx.db, branch.course.id, 2024, false).await;
    assert!(ctx.media_path(&note.file).exists());

    let app = test_app!(ctx).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": branch.course.id, "year": 2025, "is_current": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["academic_year"]["year"], 2025);
    assert_eq!(body["was_pruned"], false);
    assert_eq!(body["pruned"]["academic_years"], json!([branch.academic_year.id]));
    assert_eq!(body["pruned"]["notes"], json!([note.id]));
    assert!(!ctx.media_path(&note.file).exists());
}

#[actix_rt::test]
async fn test_zero_retention_still_keeps_newest_year() {
    let mut config = AppConfig::default();
    config.catalog.retained_academic_years = 0;
    let ctx = TestContext::with_config(config).await;
    let faculty = create_faculty(&ctx.db, "ENG").await;
    let course = create_course(&ctx.db, faculty.id, "BCS", 3).await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": course.id, "year": 2025, "is_current": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["was_pruned"], false);

    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": course.id, "year": 2024 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["was_pruned"], true);

    let years: Vec<i32> = years_of(&ctx, course.id).await.iter().map(|y| y.year).collect();
    assert_eq!(years, vec![2025]);
}

#[actix_rt::test]
async fn test_year_older_than_window_is_pruned_immediately() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    create_academic_year(&ctx.db, branch.course.id, 2025, false).await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": branch.course.id, "year": 2019 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["was_pruned"], true);
    let years: Vec<i32> = years_of(&ctx, branch.course.id)
        .await
        .iter()
        .map(|y| y.year)
        .collect();
    assert_eq!(years, vec![2025, 2024]);
}

#[actix_rt::test]
async fn test_duplicate_and_missing_course_are_rejected() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let app = test_app!(ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": branch.course.id, "year": 2024 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["non_field_errors"],
        json!(["The fields course, year must make a unique set."])
    );

    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": 9999, "year": 2024 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["course_id"], json!(["Course does not exist."]));
}

#[actix_rt::test]
async fn test_update_moves_current_flag() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let newer = create_academic_year(&ctx.db, branch.course.id, 2025, false)
        .await
        .academic_year;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/admin/academic-years/{}/", newer.id))
        .set_json(json!({ "course_id": branch.course.id, "year": 2025, "is_current": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let current: Vec<i32> = years_of(&ctx, branch.course.id)
        .await
        .iter()
        .filter(|y| y.is_current)
        .map(|y| y.id)
        .collect();
    assert_eq!(current, vec![newer.id]);
}
