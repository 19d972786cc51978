//! Response shapes shared by the handlers.

use crate::access::{AccessInfo, AccessMode, ListingAccess};
use crate::catalog::SemesterPath;
use crate::constants::SEARCH_TRIAL_MESSAGE;
use crate::orm::courses::CourseType;
use crate::orm::notes::NoteType;
use crate::orm::{
    about_us, courses, faculties, how_it_works, notes, payments, semesters, site_settings,
    student_access, students, year_levels,
};
use crate::search::SearchHit;
use crate::storage::StorageBackend;
use actix_web::HttpRequest;
use chrono::NaiveDateTime;
use serde::Serialize;
use url::Url;

/// Builds absolute URLs against the scheme and host of the request.
pub struct Urls {
    base: Option<Url>,
}

impl Urls {
    pub fn from_request(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        let base = Url::parse(&format!("{}://{}/", info.scheme(), info.host())).ok();
        Urls { base }
    }

    /// Absolute form of `path`. Already absolute URLs are returned as is.
    pub fn absolute(&self, path: &str) -> String {
        if let Ok(url) = Url::parse(path) {
            return url.to_string();
        }
        match &self.base {
            Some(base) => base
                .join(path)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| path.to_string()),
            None => path.to_string(),
        }
    }

    /// Absolute URL of a stored file.
    pub fn file(&self, storage: &dyn StorageBackend, key: &str) -> String {
        self.absolute(&storage.url(key))
    }

    pub fn optional_file(&self, storage: &dyn StorageBackend, key: &Option<String>) -> Option<String> {
        key.as_deref().map(|k| self.file(storage, k))
    }

    pub fn note_preview(&self, note: &notes::Model) -> Option<String> {
        note.has_preview
            .then(|| self.absolute(&format!("/api/notes/{}/preview/", note.id)))
    }

    pub fn note_view(&self, note: &notes::Model) -> String {
        self.absolute(&format!("/api/notes/{}/view/", note.id))
    }

    pub fn note_download(&self, note: &notes::Model) -> String {
        self.absolute(&format!("/api/notes/{}/download/", note.id))
    }
}

#[derive(Serialize)]
pub struct FacultyView {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<&faculties::Model> for FacultyView {
    fn from(f: &faculties::Model) -> Self {
        FacultyView {
            id: f.id,
            name: f.name.clone(),
            code: f.code.clone(),
            description: f.description.clone(),
            created_at: f.created_at,
        }
    }
}

#[derive(Clone, Serialize)]
pub struct CourseSummary {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub course_type: CourseType,
    pub duration_years: i32,
}

impl From<&courses::Model> for CourseSummary {
    fn from(c: &courses::Model) -> Self {
        CourseSummary {
            id: c.id,
            name: c.name.clone(),
            code: c.code.clone(),
            course_type: c.course_type,
            duration_years: c.duration_years,
        }
    }
}

#[derive(Serialize)]
pub struct YearLevelSummary {
    pub id: i32,
    pub level: i32,
    pub name: String,
}

impl From<&year_levels::Model> for YearLevelSummary {
    fn from(l: &year_levels::Model) -> Self {
        YearLevelSummary {
            id: l.id,
            level: l.level,
            name: l.name.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct SemesterSummary {
    pub id: i32,
    pub semester_number: i32,
    pub name: String,
}

impl From<&semesters::Model> for SemesterSummary {
    fn from(s: &semesters::Model) -> Self {
        SemesterSummary {
            id: s.id,
            semester_number: s.semester_number,
            name: s.name.clone(),
        }
    }
}

/// A note in a catalog listing, with the access policy applied.
#[derive(Serialize)]
pub struct NoteWithAccess {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub note_type: NoteType,
    pub uploaded_at: NaiveDateTime,
    pub file_size: Option<i64>,
    pub file_size_mb: Option<f64>,
    pub file_extension: Option<String>,
    pub has_preview: bool,
    pub preview_generated_at: Option<NaiveDateTime>,
    pub is_premium: bool,
    pub view_count: i32,
    pub download_count: i32,
    pub preview_url: Option<String>,
    pub view_url: String,
    pub download_url: Option<String>,
    pub can_preview: bool,
    pub can_view: bool,
    pub can_download: bool,
    pub access_info: AccessInfo,
}

impl NoteWithAccess {
    pub fn new(note: &notes::Model, access: &ListingAccess, urls: &Urls) -> Self {
        let flags = access.note_access(note);
        let download_url = match access.mode() {
            AccessMode::FreeTrial => None,
            AccessMode::Enforced => flags.can_download.then(|| urls.note_download(note)),
        };
        NoteWithAccess {
            id: note.id,
            title: note.title.clone(),
            description: note.description.clone(),
            note_type: note.note_type,
            uploaded_at: note.uploaded_at,
            file_size: note.file_size,
            file_size_mb: note.file_size_mb(),
            file_extension: note.file_extension(),
            has_preview: note.has_preview,
            preview_generated_at: note.preview_generated_at,
            is_premium: note.is_premium,
            view_count: note.view_count,
            download_count: note.download_count,
            preview_url: urls.note_preview(note),
            view_url: urls.note_view(note),
            download_url,
            can_preview: flags.can_preview,
            can_view: flags.can_view,
            can_download: flags.can_download,
            access_info: access.info(),
        }
    }
}

#[derive(Serialize)]
pub struct CourseInfo {
    pub faculty_name: String,
    pub faculty_code: String,
    pub course_name: String,
    pub course_code: String,
    pub academic_year: i32,
    pub year_level: String,
    pub semester: String,
    pub semester_number: i32,
}

impl From<&SemesterPath> for CourseInfo {
    fn from(p: &SemesterPath) -> Self {
        CourseInfo {
            faculty_name: p.faculty.name.clone(),
            faculty_code: p.faculty.code.clone(),
            course_name: p.course.name.clone(),
            course_code: p.course.code.clone(),
            academic_year: p.academic_year.year,
            year_level: p.year_level.name.clone(),
            semester: p.semester.name.clone(),
            semester_number: p.semester.semester_number,
        }
    }
}

#[derive(Serialize)]
pub struct SearchAccessInfo {
    pub can_preview: bool,
    pub can_view: bool,
    pub can_download: bool,
    pub is_trial: bool,
    pub trial_message: Option<&'static str>,
}

/// A note with its place in the catalog, as returned by search and upload.
#[derive(Serialize)]
pub struct SearchResult {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub note_type: NoteType,
    pub uploaded_at: NaiveDateTime,
    pub file_size: Option<i64>,
    pub file_size_mb: Option<f64>,
    pub file_extension: Option<String>,
    pub has_preview: bool,
    pub is_premium: bool,
    pub view_count: i32,
    pub course_info: CourseInfo,
    pub preview_url: Option<String>,
    pub view_url: String,
    pub access_info: SearchAccessInfo,
}

impl SearchResult {
    pub fn new(hit: &SearchHit, access: &ListingAccess, urls: &Urls) -> Self {
        let note = &hit.note;
        let flags = access.note_access(note);
        let is_trial = access.mode().is_free_trial();
        SearchResult {
            id: note.id,
            title: note.title.clone(),
            description: note.description.clone(),
            note_type: note.note_type,
            uploaded_at: note.uploaded_at,
            file_size: note.file_size,
            file_size_mb: note.file_size_mb(),
            file_extension: note.file_extension(),
            has_preview: note.has_preview,
            is_premium: note.is_premium,
            view_count: note.view_count,
            course_info: CourseInfo::from(&hit.path),
            preview_url: urls.note_preview(note),
            view_url: urls.note_view(note),
            access_info: SearchAccessInfo {
                can_preview: flags.can_preview,
                can_view: flags.can_view,
                can_download: flags.can_download,
                is_trial,
                trial_message: is_trial.then(|| SEARCH_TRIAL_MESSAGE),
            },
        }
    }
}

#[derive(Serialize)]
pub struct SiteSettingsView {
    pub id: i32,
    pub site_name: String,
    pub site_logo: Option<String>,
    #[serde(rename = "welcomemsg")]
    pub welcome_message: Option<String>,
    #[serde(rename = "backgroundimage")]
    pub background_image: Option<String>,
    #[serde(rename = "backgroundimage2")]
    pub background_image2: Option<String>,
    pub contact_email: String,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub telegram_url: Option<String>,
    pub whatsapp_number: String,
    pub facebook_url: Option<String>,
    pub view_price: i64,
    pub download_price: i64,
    pub enable_payments: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SiteSettingsView {
    pub fn new(s: site_settings::Model, urls: &Urls, storage: &dyn StorageBackend) -> Self {
        SiteSettingsView {
            id: s.id,
            site_logo: urls.optional_file(storage, &s.site_logo),
            background_image: urls.optional_file(storage, &s.background_image),
            background_image2: urls.optional_file(storage, &s.background_image2),
            site_name: s.site_name,
            welcome_message: s.welcome_message,
            contact_email: s.contact_email,
            instagram_url: s.instagram_url,
            twitter_url: s.twitter_url,
            linkedin_url: s.linkedin_url,
            telegram_url: s.telegram_url,
            whatsapp_number: s.whatsapp_number,
            facebook_url: s.facebook_url,
            view_price: s.view_price,
            download_price: s.download_price,
            enable_payments: s.enable_payments,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct AboutUsView {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub mission: Option<String>,
    pub vision: Option<String>,
    pub history: Option<String>,
    pub image: Option<String>,
    pub team_members: Option<String>,
    pub team_members_list: Vec<String>,
    pub website: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AboutUsView {
    pub fn new(a: about_us::Model, urls: &Urls, storage: &dyn StorageBackend) -> Self {
        AboutUsView {
            id: a.id,
            image: urls.optional_file(storage, &a.image),
            team_members_list: a.team_members_list(),
            title: a.title,
            subtitle: a.subtitle,
            description: a.description,
            mission: a.mission,
            vision: a.vision,
            history: a.history,
            team_members: a.team_members,
            website: a.website,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct HowItWorksView {
    pub id: i32,
    pub step_number: i32,
    pub step_title: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl HowItWorksView {
    pub fn new(h: how_it_works::Model, urls: &Urls, storage: &dyn StorageBackend) -> Self {
        HowItWorksView {
            id: h.id,
            image: urls.optional_file(storage, &h.image),
            step_number: h.step_number,
            step_title: h.step_title,
            description: h.description,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct StudentView {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub course: String,
    pub year: i32,
    pub is_logged_in: bool,
    pub login_token: String,
    pub total_spent: i64,
    pub created_at: NaiveDateTime,
}

impl From<students::Model> for StudentView {
    fn from(s: students::Model) -> Self {
        StudentView {
            id: s.id,
            full_name: s.full_name,
            email: s.email,
            course: s.course,
            year: s.year,
            is_logged_in: s.is_logged_in,
            login_token: s.login_token,
            total_spent: s.total_spent,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct PaymentView {
    pub id: i32,
    pub student: i32,
    pub note: i32,
    pub payment_type: payments::PaymentType,
    pub amount: i64,
    pub payment_method: payments::PaymentMethod,
    pub phone_number: Option<String>,
    pub transaction_id: Option<String>,
    pub external_ref: Option<String>,
    pub status: payments::PaymentStatus,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl From<payments::Model> for PaymentView {
    fn from(p: payments::Model) -> Self {
        PaymentView {
            id: p.id,
            student: p.student_id,
            note: p.note_id,
            payment_type: p.payment_type,
            amount: p.amount,
            payment_method: p.payment_method,
            phone_number: p.phone_number,
            transaction_id: p.transaction_id,
            external_ref: p.external_ref,
            status: p.status,
            created_at: p.created_at,
            completed_at: p.completed_at,
        }
    }
}

#[derive(Serialize)]
pub struct StudentAccessView {
    pub id: i32,
    pub student: i32,
    pub note: i32,
    pub access_type: student_access::AccessType,
    pub granted_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub last_accessed: Option<NaiveDateTime>,
    pub access_count: i32,
}

impl From<student_access::Model> for StudentAccessView {
    fn from(a: student_access::Model) -> Self {
        StudentAccessView {
            id: a.id,
            student: a.student_id,
            note: a.note_id,
            access_type: a.access_type,
            granted_at: a.granted_at,
            expires_at: a.expires_at,
            is_active: a.is_active,
            last_accessed: a.last_accessed,
            access_count: a.access_count,
        }
    }
}
