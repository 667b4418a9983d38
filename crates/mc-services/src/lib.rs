//! # mc-services
//!
//! Use cases of the marketplace, written purely against the `mc-core` ports:
//! image uploads, listing submission, public browsing, moderation and the
//! account/owner operations. Plugins are injected as `Arc<dyn Port>`.

pub mod accounts;
pub mod moderation;
pub mod query;
pub mod submission;
pub mod uploader;

pub use accounts::{AccountService, OwnerService};
pub use moderation::ModerationService;
pub use query::ListingQueryService;
pub use submission::{SubmissionPipeline, SubmissionReceipt};
pub use uploader::{ImageUploader, StoredImage};

use mc_core::{AppError, ListingRepo, ListingStatus, Result};
use uuid::Uuid;

/// Compare-and-set a listing's status, explaining a refusal.
///
/// A listing not in `from` is left as it is and reported as an invalid
/// transition from its actual status; a missing listing is `NotFound`.
pub(crate) async fn transition_listing(
    listings: &dyn ListingRepo,
    id: Uuid,
    from: ListingStatus,
    to: ListingStatus,
) -> Result<()> {
    if listings
        .transition_status(id, from, to)
        .await
        .map_err(AppError::backend)?
    {
        return Ok(());
    }

    match listings.get_listing(id).await.map_err(AppError::backend)? {
        None => Err(AppError::not_found("listing", id)),
        Some(current) => Err(AppError::listing_transition(current.listing.status, to)),
    }
}
