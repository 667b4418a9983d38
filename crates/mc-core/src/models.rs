//! # Domain Models
//!
//! These structs represent the core entities of MotoCar Ads.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! Categorical fields are stored using the storage vocabulary (`bon`,
//! `essence`, `voitures`, ...). The translation from the words the
//! front-end uses lives in [`crate::mapper`].

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Implements `as_str`, `Display` and `FromStr` for a storage enum.
macro_rules! storage_enum {
    ($name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $name {
            /// The token persisted by the relational store.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    _ => Err(format!("invalid {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

/// Lifecycle of a listing. Only `pending→active`, `pending→expired` and
/// `active→sold` are legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Active,
    Expired,
    Sold,
}

storage_enum!(ListingStatus {
    Pending => "pending",
    Active => "active",
    Expired => "expired",
    Sold => "sold",
});

impl ListingStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Expired)
                | (Self::Active, Self::Sold)
        )
    }
}

/// Vehicle category as stored (`voitures` / `motos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "voitures")]
    Voitures,
    #[serde(rename = "motos")]
    Motos,
}

storage_enum!(Category {
    Voitures => "voitures",
    Motos => "motos",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "bon")]
    Bon,
    #[serde(rename = "correct")]
    Correct,
    #[serde(rename = "a-renover")]
    ARenover,
}

storage_enum!(Condition {
    Excellent => "excellent",
    Bon => "bon",
    Correct => "correct",
    ARenover => "a-renover",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    #[serde(rename = "essence")]
    Essence,
    #[serde(rename = "diesel")]
    Diesel,
    #[serde(rename = "electrique")]
    Electrique,
    #[serde(rename = "hybride")]
    Hybride,
}

storage_enum!(FuelType {
    Essence => "essence",
    Diesel => "diesel",
    Electrique => "electrique",
    Hybride => "hybride",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transmission {
    #[serde(rename = "manuelle")]
    Manuelle,
    #[serde(rename = "automatique")]
    Automatique,
    #[serde(rename = "cvt")]
    Cvt,
}

storage_enum!(Transmission {
    Manuelle => "manuelle",
    Automatique => "automatique",
    Cvt => "cvt",
});

/// Account role. Admins may moderate listings and manage users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

storage_enum!(Role {
    User => "user",
    Admin => "admin",
});

/// Vehicle type in the front-end vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Motorcycle,
}

storage_enum!(VehicleType {
    Car => "car",
    Motorcycle => "motorcycle",
});

/// A vehicle-for-sale advertisement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Every listing references exactly one vehicle, created with it.
    pub vehicle_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ListingStatus,
    pub location: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub is_negotiable: bool,
    pub test_drive_available: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The physical item a listing advertises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: Category,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i64,
    pub price: Decimal,
    pub condition: Condition,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An image attached to a listing. `position` 0 is the primary image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub owner_id: Uuid,
    /// Path inside the object store bucket.
    pub storage_path: String,
    /// Public URL issued by the object store.
    pub url: String,
    pub position: i32,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public seller information joined onto listing reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSummary {
    pub full_name: String,
    pub is_verified: bool,
}

/// A listing joined with its vehicle, seller and photos (ordered by position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    #[serde(flatten)]
    pub listing: Listing,
    pub vehicle: Vehicle,
    pub seller: Option<SellerSummary>,
    pub photos: Vec<Photo>,
}

/// An image held by the client, not yet persisted.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    /// Original file name; its extension names the stored object.
    pub file_name: String,
    pub content_type: mime::Mime,
    pub data: Bytes,
}

/// Profile fields a user may edit themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub verified_users: usize,
    pub pending_users: usize,
    pub total_listings: usize,
    pub active_listings: usize,
    pub pending_listings: usize,
    pub total_views: i64,
}
