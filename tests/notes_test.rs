//! Note upload, delete and the free trial preview/view/download gate.

#[macro_use]
mod common;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::test;
use common::database::TestContext;
use common::fixtures::*;
use paperflow::app_config::AppConfig;
use paperflow::constants::{DOWNLOAD_DISABLED_ERROR, VIEW_TRIAL_MESSAGE};
use paperflow::orm::notes;
use sea_orm::{entity::*, query::*};
use serde_json::{json, Value};

fn upload_request(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> test::TestRequest {
    let (content_type, body) = multipart_body(fields, files);
    test::TestRequest::post()
        .uri("/api/notes/upload/")
        .insert_header((CONTENT_TYPE, content_type))
        .set_payload(body)
}

async fn note_count(ctx: &TestContext) -> usize {
    notes::Entity::find().all(&ctx.db).await.unwrap().len()
}

#[actix_rt::test]
async fn test_upload_stores_file_and_records_size() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let semester = branch.semester.id.to_string();
    let data: &[u8] = b"%PDF-1.4 lecture one";

    let app = test_app!(ctx).await;
    let req = upload_request(
        &[
            ("title", "Intro Notes"),
            ("description", "First week"),
            ("note_type", "exam"),
            ("semester", semester.as_str()),
        ],
        &[("file", "Intro Notes.pdf", data)],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Intro Notes");
    assert_eq!(body["note_type"], "exam");
    assert_eq!(body["file_size"], data.len());
    assert_eq!(body["file_extension"], ".pdf");
    assert_eq!(body["has_preview"], true);
    assert_eq!(body["is_premium"], false);
    assert_eq!(body["course_info"]["faculty_code"], "ENG");
    assert_eq!(body["course_info"]["course_code"], "BCS");
    assert_eq!(body["course_info"]["academic_year"], 2024);
    assert_eq!(body["access_info"]["is_trial"], true);

    let note = notes::Entity::find().one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(note.file, "notes/ENG/BCS/2024/Year_1/semester_1/Intro_Notes.pdf");
    assert_eq!(note.file_size, Some(data.len() as i64));
    assert!(note.preview_generated_at.is_some());
    assert_eq!(std::fs::read(ctx.media_path(&note.file)).unwrap(), data);
}

#[actix_rt::test]
async fn test_upload_name_collision_gets_suffix() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let semester = branch.semester.id.to_string();

    let app = test_app!(ctx).await;
    for title in ["First", "Second"] {
        let req = upload_request(
            &[("title", title), ("semester", semester.as_str())],
            &[("file", "notes.txt", &b"plain text"[..])],
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
    }

    let keys: Vec<String> = notes::Entity::find()
        .order_by_asc(notes::Column::Id)
        .all(&ctx.db)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.file)
        .collect();
    assert_eq!(keys[0], "notes/ENG/BCS/2024/Year_1/semester_1/notes.txt");
    assert_ne!(keys[0], keys[1]);
    assert!(keys[1].starts_with("notes/ENG/BCS/2024/Year_1/semester_1/notes_"));
    assert!(keys[1].ends_with(".txt"));
}

#[actix_rt::test]
async fn test_upload_rejects_disallowed_extension() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let semester = branch.semester.id.to_string();

    let app = test_app!(ctx).await;
    let req = upload_request(
        &[("title", "Sneaky"), ("semester", semester.as_str())],
        &[("file", "setup.exe", &b"MZ"[..])],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["file"],
        json!(["File type .exe not allowed. Allowed types: .pdf, .doc, .docx, .ppt, .pptx, .txt"])
    );
    assert_eq!(note_count(&ctx).await, 0);
}

#[actix_rt::test]
async fn test_upload_rejects_oversized_file() {
    let mut config = AppConfig::default();
    config.limits.max_upload_size_mb = 1;
    let ctx = TestContext::with_config(config).await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let semester = branch.semester.id.to_string();
    let data = vec![b'a'; 1024 * 1024 + 1];

    let app = test_app!(ctx).await;
    let req = upload_request(
        &[("title", "Huge"), ("semester", semester.as_str())],
        &[("file", "huge.pdf", data.as_slice())],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    let message = body["file"][0].as_str().unwrap();
    assert!(message.starts_with("File size cannot exceed 1MB. Current size: 1.00MB"));
    assert_eq!(note_count(&ctx).await, 0);
    assert!(!ctx
        .media_path("notes/ENG/BCS/2024/Year_1/semester_1/huge.pdf")
        .exists());
}

#[actix_rt::test]
async fn test_upload_reports_each_field() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx).await;

    let req = upload_request(&[("note_type", "poem"), ("semester", "999")], &[]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], json!(["This field is required."]));
    assert_eq!(body["file"], json!(["No file was submitted."]));
    assert_eq!(body["note_type"], json!(["\"poem\" is not a valid choice."]));
    assert_eq!(
        body["semester"],
        json!(["Invalid pk \"999\" - object does not exist."])
    );
}

#[actix_rt::test]
async fn test_delete_removes_file_and_row() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Week 1", false).await;
    assert!(ctx.media_path(&note.file).exists());

    let app = test_app!(ctx).await;
    let req = test::TestRequest::delete()
        .uri(&format!("/api/notes/{}/delete/", note.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);
    assert!(!ctx.media_path(&note.file).exists());
    assert_eq!(note_count(&ctx).await, 0);

    for action in ["view", "preview", "download", "delete"] {
        let uri = format!("/api/notes/{}/{}/", note.id, action);
        let req = if action == "delete" {
            test::TestRequest::delete().uri(&uri).to_request()
        } else {
            test::TestRequest::get().uri(&uri).to_request()
        };
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "{}", uri);
    }
}

#[actix_rt::test]
async fn test_free_trial_preview_and_view() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Past paper", true).await;

    let app = test_app!(ctx).await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/notes/{}/preview/", note.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["preview_available"], true);
    assert_eq!(body["full_access_required"], true);
    assert_eq!(body["semester"]["semester_number"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/notes/{}/view/", note.id))
        .insert_header(("host", "catalog.test"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["can_download"], false);
    assert_eq!(body["message"], VIEW_TRIAL_MESSAGE);
    assert_eq!(
        body["file_url"],
        format!("http://catalog.test/media/{}", note.file)
    );

    let stored = notes::Entity::find_by_id(note.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.view_count, 2);
}

#[actix_rt::test]
async fn test_preview_missing_is_not_found() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let note = create_note(&ctx.db, ctx.storage.as_ref(), branch.semester.id, "Handout", false).await;
    let mut model: notes::ActiveModel = note.clone().into();
    model.has_preview = Set(false);
    model.update(&ctx.db).await.unwrap();

    let app = test_app!(ctx).await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/notes/{}/preview/", note.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Preview not available for this document");
}

#[actix_rt::test]
async fn test_free_trial_download_is_locked() {
    let ctx = TestContext::new().await;
    let branch = create_branch(&ctx.db, "ENG", "BCS", 2024).await;
    let student = create_student(&ctx.db, "amina@example.com").await;

    let app = test_app!(ctx).await;
    for is_premium in [false, true] {
        let note = create_note(
            &ctx.db,
            ctx.storage.as_ref(),
            branch.semester.id,
            if is_premium { "Premium" } else { "Free" },
            is_premium,
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/notes/{}/download/?student_id={}",
                note.id, student.id
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 423);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], DOWNLOAD_DISABLED_ERROR);
        assert_eq!(body["coming_soon"], true);
        assert_eq!(body["note_title"], note.title);
    }
}
