//! Student registration, CRUD and the student dashboard.

#[macro_use]
mod common;

use actix_web::test;
use common::database::TestContext;
use common::fixtures::*;
use paperflow::constants::DASHBOARD_TRIAL_MESSAGE;
use paperflow::orm::{payments, student_access, students};
use sea_orm::{entity::*, query::*};
use serde_json::{json, Value};

fn registration(email: &str) -> Value {
    json!({
        "full_name": "Amina Nakato",
        "email": email,
        "course": "BCS",
        "year": 2,
    })
}

#[actix_rt::test]
async fn test_check_or_register() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/check_or_register/")
        .set_json(json!({ "full_name": "No Email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "detail": "Email is required." }));

    let req = test::TestRequest::post()
        .uri("/api/check_or_register/")
        .set_json(registration("amina@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "created");
    assert_eq!(created["student"]["total_spent"], 0);
    let token = created["student"]["login_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 36);

    let req = test::TestRequest::post()
        .uri("/api/check_or_register/")
        .set_json(json!({ "email": "amina@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let existing: Value = test::read_body_json(resp).await;
    assert_eq!(existing["status"], "exists");
    assert_eq!(existing["student"]["id"], created["student"]["id"]);
    assert_eq!(existing["student"]["login_token"], token);

    let req = test::TestRequest::post()
        .uri("/api/check_or_register/")
        .set_json(json!({ "email": "brian@example.com", "year": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["full_name"], json!(["This field is required."]));
    assert_eq!(body["course"], json!(["This field is required."]));
    assert_eq!(students::Entity::find().count(&ctx.db).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_student_crud() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/students/")
        .set_json(registration("amina@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let student: Value = test::read_body_json(resp).await;
    let id = student["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/students/")
        .set_json(registration("amina@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], json!(["student with this email already exists."]));

    let req = test::TestRequest::patch()
        .uri(&format!("/api/students/{}/", id))
        .set_json(json!({ "year": 3, "is_logged_in": true, "login_token": "forged", "total_spent": 99 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["year"], 3);
    assert_eq!(updated["is_logged_in"], true);
    assert_eq!(updated["login_token"], student["login_token"]);
    assert_eq!(updated["total_spent"], 0);

    let req = test::TestRequest::get().uri("/api/students/").to_request();
    let resp = test::call_service(&app, req).await;
    let all: Value = test::read_body_json(resp).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/students/{}/", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get()
        .uri(&format!("/api/students/{}/", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_delete_student_removes_access_and_payments() {
    let ctx = TestContext::enforced().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Past paper", true).await;
    let student = create_student(&ctx.db, "amina@example.com").await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/access-grants/")
        .set_json(json!({ "student_id": student.id, "note_id": note.id, "access_type": "download" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::get()
        .uri(&format!("/api/students/{}/dashboard/", student.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["trial_status"]["is_trial"], false);
    assert_eq!(body["access_summary"]["total_accessed_notes"], 1);
    assert_eq!(body["access_records"][0]["access_type"], "download");
    assert_eq!(body["payment_history"][0]["payment_method"], "admin");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/students/{}/", student.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);
    assert_eq!(student_access::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(payments::Entity::find().count(&ctx.db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_free_trial_dashboard() {
    let ctx = TestContext::new().await;
    let student = create_student(&ctx.db, "amina@example.com").await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/students/{}/dashboard/", student.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["student"]["email"], "amina@example.com");
    assert_eq!(body["recent_views"], json!([]));
    assert_eq!(body["access_summary"]["most_accessed_type"], "lecture");
    assert_eq!(body["trial_status"]["is_trial"], true);
    assert_eq!(body["trial_status"]["message"], DASHBOARD_TRIAL_MESSAGE);
    assert_eq!(body["access_records"], json!([]));
    assert_eq!(body["payment_history"], json!([]));

    let req = test::TestRequest::get()
        .uri("/api/students/4242/dashboard/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
