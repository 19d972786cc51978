//! Access gate for note preview, view and download.
//!
//! The catalog ships in free trial mode: everything is viewable and
//! downloads are locked. With `access.enforce_payments` set, premium notes
//! require an active [`student_access`] record instead. Payment provider
//! integration is not part of this module; grants are made by
//! administrators.

use crate::app_config::AccessConfig;
use crate::constants::TRIAL_MESSAGE;
use crate::error::ServiceError;
use crate::orm::payments::{PaymentMethod, PaymentStatus, PaymentType};
use crate::orm::student_access::AccessType;
use crate::orm::{notes, payments, site_settings, student_access, students};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which access policy is in force.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    FreeTrial,
    Enforced,
}

impl AccessMode {
    pub fn from_config(config: &AccessConfig) -> Self {
        if config.enforce_payments {
            AccessMode::Enforced
        } else {
            AccessMode::FreeTrial
        }
    }

    pub fn is_free_trial(self) -> bool {
        self == AccessMode::FreeTrial
    }
}

/// Outcome of an access check.
#[derive(Debug)]
pub enum Decision {
    /// Allowed. Carries the grant that allowed it, if one was needed.
    Granted(Option<student_access::Model>),
    /// Downloads are switched off (free trial).
    Locked,
    /// A premium note without a valid grant.
    PaymentRequired,
}

/// Current prices in whole UGX.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prices {
    pub view_price: i64,
    pub download_price: i64,
    pub payments_enabled: bool,
}

/// Prices from the site settings, falling back to the configured defaults.
pub async fn prices<C>(db: &C, config: &AccessConfig) -> Result<Prices, ServiceError>
where
    C: ConnectionTrait,
{
    let settings = site_settings::Entity::find()
        .order_by_asc(site_settings::Column::Id)
        .one(db)
        .await?;

    Ok(match settings {
        Some(s) => Prices {
            view_price: s.view_price,
            download_price: s.download_price,
            payments_enabled: s.enable_payments,
        },
        None => Prices {
            view_price: config.default_view_price,
            download_price: config.default_download_price,
            payments_enabled: false,
        },
    })
}

/// First valid grant of one of `types` held by the student for the note.
pub async fn find_valid_access<C>(
    db: &C,
    student_id: i32,
    note_id: i32,
    types: &[AccessType],
) -> Result<Option<student_access::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let grants = student_access::Entity::find()
        .filter(student_access::Column::StudentId.eq(student_id))
        .filter(student_access::Column::NoteId.eq(note_id))
        .filter(student_access::Column::AccessType.is_in(types.iter().copied()))
        .filter(student_access::Column::IsActive.eq(true))
        .all(db)
        .await?;

    Ok(grants.into_iter().find(|g| g.has_valid_access(now)))
}

/// Previews are the free sample and are always allowed.
pub fn check_preview(_mode: AccessMode, _note: &notes::Model) -> Decision {
    Decision::Granted(None)
}

pub async fn check_view<C>(
    db: &C,
    mode: AccessMode,
    note: &notes::Model,
    student_id: Option<i32>,
) -> Result<Decision, ServiceError>
where
    C: ConnectionTrait,
{
    if mode.is_free_trial() || !note.is_premium {
        return Ok(Decision::Granted(None));
    }
    let student_id = match student_id {
        Some(id) => id,
        None => return Ok(Decision::PaymentRequired),
    };

    Ok(
        match find_valid_access(db, student_id, note.id, &[AccessType::View, AccessType::Download])
            .await?
        {
            Some(grant) => Decision::Granted(Some(grant)),
            None => Decision::PaymentRequired,
        },
    )
}

pub async fn check_download<C>(
    db: &C,
    mode: AccessMode,
    note: &notes::Model,
    student_id: Option<i32>,
) -> Result<Decision, ServiceError>
where
    C: ConnectionTrait,
{
    if mode.is_free_trial() {
        return Ok(Decision::Locked);
    }
    if !note.is_premium {
        return Ok(Decision::Granted(None));
    }
    let student_id = match student_id {
        Some(id) => id,
        None => return Ok(Decision::PaymentRequired),
    };

    Ok(
        match find_valid_access(db, student_id, note.id, &[AccessType::Download]).await? {
            Some(grant) => Decision::Granted(Some(grant)),
            None => Decision::PaymentRequired,
        },
    )
}

/// Stamp a grant as used.
pub async fn record_access<C>(
    db: &C,
    grant: student_access::Model,
) -> Result<student_access::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let access_count = grant.access_count + 1;
    let mut model: student_access::ActiveModel = grant.into();
    model.last_accessed = Set(Some(Utc::now().naive_utc()));
    model.access_count = Set(access_count);
    Ok(model.update(db).await?)
}

/// Per-note flags shown in listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NoteAccess {
    pub can_preview: bool,
    pub can_view: bool,
    pub can_download: bool,
}

/// Summary of the access policy attached to every listed note.
#[derive(Clone, Debug, Serialize)]
pub struct AccessInfo {
    pub is_free_trial: bool,
    pub trial_message: Option<&'static str>,
    pub view_price: i64,
    pub download_price: i64,
    pub payments_enabled: bool,
}

/// Access decisions for a batch of notes, loaded with one query.
#[derive(Clone, Debug)]
pub struct ListingAccess {
    mode: AccessMode,
    prices: Prices,
    views: HashSet<i32>,
    downloads: HashSet<i32>,
}

impl ListingAccess {
    pub async fn load<C>(
        db: &C,
        config: &AccessConfig,
        student_id: Option<i32>,
        note_ids: Vec<i32>,
    ) -> Result<Self, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mode = AccessMode::from_config(config);
        let prices = prices(db, config).await?;
        let mut listing = ListingAccess {
            mode,
            prices,
            views: HashSet::new(),
            downloads: HashSet::new(),
        };

        if let (AccessMode::Enforced, Some(student_id)) = (mode, student_id) {
            if !note_ids.is_empty() {
                let now = Utc::now().naive_utc();
                let grants = student_access::Entity::find()
                    .filter(student_access::Column::StudentId.eq(student_id))
                    .filter(student_access::Column::NoteId.is_in(note_ids))
                    .filter(student_access::Column::IsActive.eq(true))
                    .all(db)
                    .await?;
                for grant in grants.into_iter().filter(|g| g.has_valid_access(now)) {
                    match grant.access_type {
                        AccessType::Download => {
                            listing.downloads.insert(grant.note_id);
                            listing.views.insert(grant.note_id);
                        }
                        AccessType::View => {
                            listing.views.insert(grant.note_id);
                        }
                        AccessType::Preview => {}
                    }
                }
            }
        }

        Ok(listing)
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn note_access(&self, note: &notes::Model) -> NoteAccess {
        match self.mode {
            AccessMode::FreeTrial => NoteAccess {
                can_preview: true,
                can_view: true,
                can_download: false,
            },
            AccessMode::Enforced => NoteAccess {
                can_preview: true,
                can_view: !note.is_premium || self.views.contains(&note.id),
                can_download: !note.is_premium || self.downloads.contains(&note.id),
            },
        }
    }

    pub fn info(&self) -> AccessInfo {
        AccessInfo {
            is_free_trial: self.mode.is_free_trial(),
            trial_message: self.mode.is_free_trial().then(|| TRIAL_MESSAGE),
            view_price: self.prices.view_price,
            download_price: self.prices.download_price,
            payments_enabled: self.prices.payments_enabled,
        }
    }
}

/// An administrator granting a student access to a note for free.
#[derive(Debug, Deserialize)]
pub struct AccessGrant {
    pub student_id: i32,
    pub note_id: i32,
    pub access_type: AccessType,
    /// None grants access without expiry.
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

/// Record a completed zero-amount admin payment and activate the matching
/// access record. Existing rows for the same triple are reused.
pub async fn grant_access(
    db: &DatabaseConnection,
    grant: AccessGrant,
) -> Result<(payments::Model, student_access::Model), ServiceError> {
    let payment_type = match grant.access_type {
        AccessType::View => PaymentType::View,
        AccessType::Download => PaymentType::Download,
        AccessType::Preview => {
            return Err(ServiceError::field(
                "access_type",
                "Previews are free and need no grant.",
            ))
        }
    };

    let txn = db.begin().await?;

    if students::Entity::find_by_id(grant.student_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(ServiceError::field("student_id", "Student does not exist."));
    }
    if notes::Entity::find_by_id(grant.note_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(ServiceError::field("note_id", "Note does not exist."));
    }

    let now = Utc::now().naive_utc();

    let existing_payment = payments::Entity::find()
        .filter(payments::Column::StudentId.eq(grant.student_id))
        .filter(payments::Column::NoteId.eq(grant.note_id))
        .filter(payments::Column::PaymentType.eq(payment_type))
        .one(&txn)
        .await?;
    let payment = match existing_payment {
        Some(p) => {
            let mut model: payments::ActiveModel = p.into();
            complete_admin_payment(&mut model, grant.note_id, now);
            model.update(&txn).await?
        }
        None => {
            let mut model = payments::ActiveModel {
                student_id: Set(grant.student_id),
                note_id: Set(grant.note_id),
                payment_type: Set(payment_type),
                phone_number: Set(None),
                external_ref: Set(None),
                created_at: Set(now),
                ..Default::default()
            };
            complete_admin_payment(&mut model, grant.note_id, now);
            model.insert(&txn).await?
        }
    };

    let existing_access = student_access::Entity::find()
        .filter(student_access::Column::StudentId.eq(grant.student_id))
        .filter(student_access::Column::NoteId.eq(grant.note_id))
        .filter(student_access::Column::AccessType.eq(grant.access_type))
        .one(&txn)
        .await?;
    let access = match existing_access {
        Some(a) => {
            let mut model: student_access::ActiveModel = a.into();
            model.granted_at = Set(now);
            model.expires_at = Set(grant.expires_at);
            model.is_active = Set(true);
            model.update(&txn).await?
        }
        None => {
            student_access::ActiveModel {
                student_id: Set(grant.student_id),
                note_id: Set(grant.note_id),
                access_type: Set(grant.access_type),
                granted_at: Set(now),
                expires_at: Set(grant.expires_at),
                is_active: Set(true),
                last_accessed: Set(None),
                access_count: Set(0),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    log::info!(
        "Granted {:?} access on note {} to student {}",
        access.access_type,
        access.note_id,
        access.student_id
    );
    Ok((payment, access))
}

fn complete_admin_payment(model: &mut payments::ActiveModel, note_id: i32, now: NaiveDateTime) {
    model.amount = Set(0);
    model.payment_method = Set(PaymentMethod::Admin);
    model.status = Set(PaymentStatus::Completed);
    model.transaction_id = Set(Some(format!("ADMIN_{}_{}", note_id, now.timestamp())));
    model.completed_at = Set(Some(now));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(is_premium: bool) -> notes::Model {
        notes::Model {
            id: 7,
            semester_id: 1,
            title: "Past paper".to_string(),
            description: None,
            file: "notes/a.pdf".to_string(),
            note_type: notes::NoteType::Exam,
            uploaded_at: Utc::now().naive_utc(),
            file_size: Some(10),
            preview_file: None,
            has_preview: true,
            preview_generated_at: None,
            is_premium,
            view_count: 0,
            download_count: 0,
        }
    }

    fn listing(mode: AccessMode) -> ListingAccess {
        ListingAccess {
            mode,
            prices: Prices {
                view_price: 500,
                download_price: 1000,
                payments_enabled: false,
            },
            views: HashSet::new(),
            downloads: HashSet::new(),
        }
    }

    #[test]
    fn test_mode_from_config() {
        let mut config = AccessConfig::default();
        assert_eq!(AccessMode::from_config(&config), AccessMode::FreeTrial);
        config.enforce_payments = true;
        assert_eq!(AccessMode::from_config(&config), AccessMode::Enforced);
    }

    #[test]
    fn test_free_trial_listing_flags() {
        let access = listing(AccessMode::FreeTrial).note_access(&note(true));
        assert!(access.can_preview);
        assert!(access.can_view);
        assert!(!access.can_download);
        let info = listing(AccessMode::FreeTrial).info();
        assert!(info.is_free_trial);
        assert_eq!(info.trial_message, Some(TRIAL_MESSAGE));
    }

    #[test]
    fn test_enforced_listing_flags() {
        let mut enforced = listing(AccessMode::Enforced);
        assert!(enforced.note_access(&note(false)).can_view);
        assert!(!enforced.note_access(&note(true)).can_view);
        enforced.views.insert(7);
        let access = enforced.note_access(&note(true));
        assert!(access.can_view);
        assert!(!access.can_download);
        assert_eq!(enforced.info().trial_message, None);
    }
}
