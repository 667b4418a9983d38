//! # Listing Query Service
//!
//! Read side of the public browse pages. Only `active` listings are ever
//! returned from here, whatever filters the caller passes.

use std::sync::Arc;

use mc_core::{
    AppError, ListingDetails, ListingFilter, ListingQuery, ListingRepo, ListingStatus, Page, Result,
    SortOrder,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ListingQueryService {
    listings: Arc<dyn ListingRepo>,
}

impl ListingQueryService {
    pub fn new(listings: Arc<dyn ListingRepo>) -> Self {
        Self { listings }
    }

    /// Active listings matching every supplied filter, newest first.
    pub async fn browse(&self, filter: &ListingFilter, page: Page) -> Result<Vec<ListingDetails>> {
        let filter = filter.normalized();
        let query = ListingQuery {
            status: Some(ListingStatus::Active),
            owner_id: None,
            filter: filter.clone(),
            order: SortOrder::NewestFirst,
            page,
        };

        let rows = self
            .listings
            .search_listings(&query)
            .await
            .map_err(AppError::backend)?;

        let total = rows.len();
        let visible: Vec<_> = rows
            .into_iter()
            .filter(|d| d.listing.status == ListingStatus::Active && filter.matches(d))
            .collect();
        if visible.len() != total {
            warn!(
                dropped = total - visible.len(),
                "backend returned rows outside the public query"
            );
        }

        debug!(count = visible.len(), "browse");
        Ok(visible)
    }

    /// One active listing. Counts a view without waiting for the write.
    pub async fn get_listing(&self, id: Uuid) -> Result<ListingDetails> {
        let details = self
            .listings
            .get_listing(id)
            .await
            .map_err(AppError::backend)?
            .filter(|d| d.listing.status == ListingStatus::Active)
            .ok_or_else(|| AppError::not_found("listing", id))?;

        let listings = Arc::clone(&self.listings);
        tokio::spawn(async move {
            if let Err(err) = listings.increment_view_count(id).await {
                warn!(listing_id = %id, error = %err, "view count not recorded");
            }
        });

        Ok(details)
    }
}
