//! # Listing and Profile Queries
//!
//! Typed read criteria handed to the repository ports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, ListingDetails, ListingStatus, Role, VehicleType};

/// Public browse filters. Every supplied key must match (AND); absent keys
/// impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub vehicle_type: Option<VehicleType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring of the vehicle brand.
    pub brand: Option<String>,
    /// Case-insensitive substring of the listing location.
    pub location: Option<String>,
}

impl ListingFilter {
    /// Blank text filters are treated as absent.
    pub fn normalized(&self) -> Self {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            vehicle_type: self.vehicle_type,
            min_price: self.min_price,
            max_price: self.max_price,
            brand: text(&self.brand),
            location: text(&self.location),
        }
    }

    /// Checks a fetched row against the filter.
    pub fn matches(&self, details: &ListingDetails) -> bool {
        let f = self.normalized();
        let vehicle = &details.vehicle;
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };

        f.vehicle_type
            .map_or(true, |t| vehicle.category == Category::from(t))
            && f.min_price.map_or(true, |p| vehicle.price >= p)
            && f.max_price.map_or(true, |p| vehicle.price <= p)
            && contains(&vehicle.brand, &f.brand)
            && contains(&details.listing.location, &f.location)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Offset pagination. `limit: None` returns everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub const fn all() -> Self {
        Self { limit: None, offset: 0 }
    }
}

/// Full criteria understood by `ListingRepo::search_listings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub status: Option<ListingStatus>,
    pub owner_id: Option<Uuid>,
    pub filter: ListingFilter,
    pub order: SortOrder,
    pub page: Page,
}

/// Criteria understood by `ProfileRepo::list_profiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileQuery {
    pub is_verified: Option<bool>,
    pub role: Option<Role>,
    pub order: SortOrder,
}
