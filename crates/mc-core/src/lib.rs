//! mc-core
//!
//! The central domain logic and interface definitions for MotoCar Ads:
//! models, the error taxonomy, the ports every plugin implements, and the
//! pure rules (enum mapping, listing validation) the services build on.

pub mod error;
pub mod filter;
pub mod mapper;
pub mod models;
pub mod session;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use filter::*;
pub use models::*;
pub use session::*;
pub use traits::*;
pub use validation::{validate_listing, validate_listing_at, ListingDraft, ValidationReport};

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    #[test]
    fn listing_status_state_machine() {
        use ListingStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Expired));
        assert!(Active.can_transition_to(Sold));
        assert!(!Active.can_transition_to(Pending));
        assert!(!Expired.can_transition_to(Active));
        assert!(!Sold.can_transition_to(Active));
        assert!(!Pending.can_transition_to(Sold));
    }

    #[test]
    fn storage_tokens_round_trip_through_from_str() {
        assert_eq!(Condition::from_str("a-renover"), Ok(Condition::ARenover));
        assert_eq!(ListingStatus::from_str("sold"), Ok(ListingStatus::Sold));
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert!(Category::from_str("cars").is_err());
    }

    #[test]
    fn details_serialize_flat_with_storage_tokens() {
        let now = Utc::now();
        let owner = Uuid::now_v7();
        let vehicle = Vehicle {
            id: Uuid::now_v7(),
            owner_id: owner,
            category: Category::Voitures,
            brand: "BMW".into(),
            model: "M3".into(),
            year: 2020,
            mileage: 25_000,
            price: Decimal::from(45_000),
            condition: Condition::Bon,
            fuel_type: FuelType::Essence,
            transmission: Transmission::Manuelle,
            color: None,
            created_at: now,
            updated_at: now,
        };
        let listing = Listing {
            id: Uuid::now_v7(),
            owner_id: owner,
            vehicle_id: vehicle.id,
            title: "My Great Car For Sale".into(),
            description: "desc".into(),
            status: ListingStatus::Active,
            location: "Austin, TX".into(),
            contact_name: "Jo".into(),
            contact_phone: "(555) 123-4567".into(),
            contact_email: "jo@example.com".into(),
            is_negotiable: true,
            test_drive_available: true,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        let details = ListingDetails { listing, vehicle, seller: None, photos: vec![] };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["vehicle"]["category"], "voitures");
        assert_eq!(json["vehicle"]["condition"], "bon");
        assert_eq!(json["vehicle"]["price"], "45000");
    }
}
