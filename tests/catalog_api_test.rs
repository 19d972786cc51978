//! Catalog browsing and administration over HTTP.

#[macro_use]
mod common;

use actix_web::test;
use common::database::TestContext;
use common::fixtures::*;
use paperflow::orm::{courses, faculties, notes};
use sea_orm::{entity::*, query::*};
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_faculty_codes_resolve_case_insensitively() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "eng", "bcs", 2024).await;
    assert_eq!(branch.faculty.code, "ENG");
    assert_eq!(branch.course.code, "BCS");

    let app = test_app!(ctx).await;
    for uri in ["/api/faculties/eng/", "/api/faculties/ENG/", "/api/faculties/Eng/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "ENG");
        assert_eq!(body["courses"][0]["code"], "BCS");
    }
}

#[actix_rt::test]
async fn test_missing_levels_are_not_found() {
    let ctx = TestContext::new().await;
    create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let app = test_app!(ctx).await;

    let cases = [
        ("/api/faculties/LAW/", "Faculty not found."),
        ("/api/faculties/ENG/courses/XYZ/", "Course not found."),
        ("/api/faculties/ENG/courses/BCS/2020/year/1/", "Academic year not found."),
        ("/api/faculties/ENG/courses/BCS/2024/year/3/", "Year level not found."),
    ];
    for (uri, detail) in cases {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], detail, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/api/nothing-here/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/faculties/ENG/courses/BCS/abc/year/1/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_course_subtree_carries_free_trial_access() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Algebra", true).await;
    create_course(&ctx.db, branch.faculty.id, "BIT", 3).await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::get()
        .uri("/api/faculties/ENG/courses/BCS/")
        .insert_header(("host", "catalog.test"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["faculty"]["code"], "ENG");
    assert_eq!(body["all_courses"].as_array().unwrap().len(), 2);

    let listed = &body["course"]["academic_years"][0]["year_levels"][0]["semesters"][0]["notes"][0];
    assert_eq!(listed["id"], note.id);
    assert_eq!(listed["can_preview"], true);
    assert_eq!(listed["can_view"], true);
    assert_eq!(listed["can_download"], false);
    assert_eq!(listed["download_url"], Value::Null);
    assert_eq!(listed["access_info"]["is_free_trial"], true);
    assert_eq!(
        listed["view_url"],
        format!("http://catalog.test/api/notes/{}/view/", note.id)
    );
}

#[actix_rt::test]
async fn test_year_level_notes_and_faculty_year() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Week 1", false).await;
    create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Week 2", false).await;
    create_course(&ctx.db, branch.faculty.id, "BIT", 3).await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::get()
        .uri("/api/faculties/eng/courses/bcs/2024/year/1/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["academic_year"], 2024);
    assert_eq!(body["year_level"]["name"], "Year 1");
    let semester = &body["year_level"]["semesters"][0];
    assert_eq!(semester["semester"]["name"], "Semester 1");
    let titles: Vec<&str> = semester["notes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Week 2", "Week 1"]);
    assert_eq!(semester["notes"][0]["file_url"], Value::Null);

    let req = test::TestRequest::get()
        .uri("/api/faculties/ENG/year/2024/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 2);
    let bcs = courses.iter().find(|c| c["code"] == "BCS").unwrap();
    let bit = courses.iter().find(|c| c["code"] == "BIT").unwrap();
    assert_eq!(bcs["year_levels"][0]["level"], 1);
    assert_eq!(bit["year_levels"], json!([]));
}

#[actix_rt::test]
async fn test_dashboard_groups_courses_in_pairs() {
    let ctx = TestContext::new().await;
    let faculty = create_faculty(&ctx.db, "ENG").await;
    for code in ["BCS", "BIT", "BSE"] {
        create_course(&ctx.db, faculty.id, code, 3).await;
    }
    let science = create_faculty(&ctx.db, "SCI").await;
    create_course(&ctx.db, science.id, "BIO", 3).await;
    create_faculty(&ctx.db, "LAW").await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::get().uri("/api/dashboard/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["courses"]["all"].as_array().unwrap().len(), 3);
    let pairs = body[0]["courses"]["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1].as_array().unwrap().len(), 1);

    let by_code = |code: &str| {
        body.as_array()
            .unwrap()
            .iter()
            .find(|f| f["code"] == code)
            .cloned()
            .unwrap()
    };
    assert_eq!(by_code("SCI")["courses"]["all"][0]["code"], "BIO");
    assert_eq!(by_code("LAW")["courses"]["all"], json!([]));
    assert_eq!(by_code("LAW")["courses"]["pairs"], json!([]));
}

#[actix_rt::test]
async fn test_admin_creates_catalog_and_rejects_bad_levels() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/admin/faculties/")
        .set_json(json!({ "name": "Engineering", "code": "eng" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let faculty: Value = test::read_body_json(resp).await;
    assert_eq!(faculty["code"], "ENG");

    let req = test::TestRequest::post()
        .uri("/api/admin/faculties/")
        .set_json(json!({ "name": "Engineering again", "code": "ENG" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], json!(["Faculty with this code already exists."]));

    let req = test::TestRequest::post()
        .uri("/api/admin/courses/")
        .set_json(json!({
            "faculty_id": faculty["id"],
            "name": "Diploma in Computing",
            "code": "DCS",
            "course_type": "diploma",
            "duration_years": 2,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let course: Value = test::read_body_json(resp).await;
    let course_id = course["course"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/admin/academic-years/")
        .set_json(json!({ "course_id": course_id, "year": 2024, "is_current": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let saved: Value = test::read_body_json(resp).await;
    let academic_year_id = saved["academic_year"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/admin/year-levels/")
        .set_json(json!({ "academic_year_id": academic_year_id, "level": 3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["level"], json!(["Year 3 exceeds course duration of 2 years"]));

    let req = test::TestRequest::post()
        .uri("/api/admin/year-levels/")
        .set_json(json!({ "academic_year_id": academic_year_id, "level": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let level: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::post()
        .uri("/api/admin/semesters/")
        .set_json(json!({ "year_level_id": level["year_level"]["id"], "semester_number": 3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["semester_number"], json!(["Semester must be 1 or 2."]));

    let req = test::TestRequest::post()
        .uri("/api/admin/semesters/")
        .set_json(json!({ "year_level_id": level["year_level"]["id"], "semester_number": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let semester: Value = test::read_body_json(resp).await;
    assert_eq!(semester["semester"]["name"], "Semester 2");
}

#[actix_rt::test]
async fn test_admin_faculty_delete_reports_cascade() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Week 1", false).await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::delete()
        .uri(&format!("/api/admin/faculties/{}/", branch.faculty.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["faculties"], json!([branch.faculty.id]));
    assert_eq!(report["courses"], json!([branch.course.id]));
    assert_eq!(report["notes"], json!([note.id]));
    assert!(!ctx.media_path(&note.file).exists());

    assert_eq!(faculties::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(courses::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(notes::Entity::find().count(&ctx.db).await.unwrap(), 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/admin/faculties/{}/", branch.faculty.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
