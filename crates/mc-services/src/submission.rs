//! # Listing Submission Pipeline
//!
//! Turns a filled-in post-an-ad form plus its images into a pending listing:
//! validate, upload, then write vehicle, listing and photos in one repository
//! call. Nothing is written unless validation and every upload succeeded.

use std::sync::Arc;

use chrono::Utc;
use mc_core::mapper::{map_category, map_condition, map_fuel_type, map_transmission};
use mc_core::{
    validate_listing, AppError, ImageBlob, Listing, ListingDraft, ListingRepo, ListingStatus,
    MediaStore, Photo, Result, Session, Vehicle,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::uploader::{ImageUploader, StoredImage};

pub const SUBMITTED_MESSAGE: &str =
    "Listing submitted successfully! It will be reviewed before going live.";

/// What the poster gets back after a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub listing: Listing,
    pub message: String,
}

pub struct SubmissionPipeline {
    listings: Arc<dyn ListingRepo>,
    uploader: ImageUploader,
}

impl SubmissionPipeline {
    pub fn new(listings: Arc<dyn ListingRepo>, store: Arc<dyn MediaStore>) -> Self {
        Self {
            listings,
            uploader: ImageUploader::new(store),
        }
    }

    /// Orchestrates the creation of a new listing.
    pub async fn submit(
        &self,
        session: Option<&Session>,
        draft: ListingDraft,
        images: Vec<ImageBlob>,
    ) -> Result<SubmissionReceipt> {
        // 1. Identity
        let owner_id = session.ok_or(AppError::AuthRequired)?.user_id;

        // 2. Validation: nothing leaves the process if the form is wrong
        let report = validate_listing(&draft);
        if !report.is_valid {
            return Err(AppError::Validation(report.errors));
        }

        // 3. Media
        let stored = self.uploader.upload_all(owner_id, &images).await?;

        // 4-6. Persistence: vehicle, listing and photos together
        let (vehicle, listing, photos) = build_records(owner_id, draft, &stored)?;
        let listing_id = listing.id;

        if let Err(err) = self
            .listings
            .create_listing(vehicle, listing.clone(), photos)
            .await
        {
            warn!(%owner_id, error = %err, "listing write failed, removing uploaded images");
            self.uploader.discard(&stored).await;
            return Err(AppError::backend(err));
        }

        info!(%owner_id, %listing_id, photos = stored.len(), "listing submitted for review");

        // 7. Receipt
        Ok(SubmissionReceipt {
            listing,
            message: SUBMITTED_MESSAGE.to_string(),
        })
    }
}

/// Maps the validated form into storage rows.
fn build_records(
    owner_id: Uuid,
    draft: ListingDraft,
    stored: &[StoredImage],
) -> Result<(Vehicle, Listing, Vec<Photo>)> {
    let missing = |field: &str| AppError::Internal(format!("validated draft is missing {field}"));
    let text = |value: Option<String>| value.unwrap_or_default().trim().to_string();
    let choice = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
    let now = Utc::now();

    let vehicle = Vehicle {
        id: Uuid::now_v7(),
        owner_id,
        category: map_category(&choice(&draft.vehicle_type)),
        brand: text(draft.brand),
        model: text(draft.model),
        year: draft.year.ok_or_else(|| missing("year"))?,
        mileage: draft.mileage.ok_or_else(|| missing("mileage"))?,
        price: draft.price.ok_or_else(|| missing("price"))?,
        condition: map_condition(&choice(&draft.condition)),
        fuel_type: map_fuel_type(&choice(&draft.fuel_type)),
        transmission: map_transmission(&choice(&draft.transmission)),
        color: draft
            .color
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        created_at: now,
        updated_at: now,
    };

    let listing = Listing {
        id: Uuid::now_v7(),
        owner_id,
        vehicle_id: vehicle.id,
        title: text(draft.title),
        description: text(draft.description),
        status: ListingStatus::Pending,
        location: text(draft.location),
        contact_name: text(draft.contact_name),
        contact_phone: text(draft.phone),
        contact_email: text(draft.email),
        is_negotiable: true,
        test_drive_available: true,
        view_count: 0,
        created_at: now,
        updated_at: now,
    };

    let photos = stored
        .iter()
        .enumerate()
        .map(|(position, image)| Photo {
            id: Uuid::now_v7(),
            listing_id: listing.id,
            owner_id,
            storage_path: image.path.clone(),
            url: image.url.clone(),
            position: position as i32,
        })
        .collect();

    Ok((vehicle, listing, photos))
}
