//! # Enum Mapper
//!
//! Translation between the words the front-end uses (`good`, `gasoline`,
//! `car`) and the storage schema's vocabulary (`bon`, `essence`, `voitures`).
//! Every mapping is total: unknown input falls back to a documented default.

use crate::models::{Category, Condition, FuelType, Transmission, VehicleType};

/// `excellent→excellent`, `good→bon`, `fair→correct`, `poor→a-renover`; default `bon`.
pub fn map_condition(ui: &str) -> Condition {
    match ui {
        "excellent" => Condition::Excellent,
        "good" => Condition::Bon,
        "fair" => Condition::Correct,
        "poor" => Condition::ARenover,
        _ => Condition::Bon,
    }
}

/// `gasoline→essence`, `diesel→diesel`, `electric→electrique`, `hybrid→hybride`;
/// default `essence`.
pub fn map_fuel_type(ui: &str) -> FuelType {
    match ui {
        "gasoline" => FuelType::Essence,
        "diesel" => FuelType::Diesel,
        "electric" => FuelType::Electrique,
        "hybrid" => FuelType::Hybride,
        _ => FuelType::Essence,
    }
}

/// `manual→manuelle`, `automatic→automatique`, `cvt→cvt`; default `manuelle`.
pub fn map_transmission(ui: &str) -> Transmission {
    match ui {
        "manual" => Transmission::Manuelle,
        "automatic" => Transmission::Automatique,
        "cvt" => Transmission::Cvt,
        _ => Transmission::Manuelle,
    }
}

/// `car→voitures`; anything else is filed under `motos`.
pub fn map_category(ui: &str) -> Category {
    match ui {
        "car" => Category::Voitures,
        _ => Category::Motos,
    }
}

impl From<VehicleType> for Category {
    fn from(kind: VehicleType) -> Self {
        map_category(kind.as_str())
    }
}

impl Condition {
    /// The front-end word for this condition.
    pub fn ui_token(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Bon => "good",
            Self::Correct => "fair",
            Self::ARenover => "poor",
        }
    }
}

impl FuelType {
    pub fn ui_token(&self) -> &'static str {
        match self {
            Self::Essence => "gasoline",
            Self::Diesel => "diesel",
            Self::Electrique => "electric",
            Self::Hybride => "hybrid",
        }
    }
}

impl Transmission {
    pub fn ui_token(&self) -> &'static str {
        match self {
            Self::Manuelle => "manual",
            Self::Automatique => "automatic",
            Self::Cvt => "cvt",
        }
    }
}

impl Category {
    pub fn ui_token(&self) -> &'static str {
        match self {
            Self::Voitures => "car",
            Self::Motos => "motorcycle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_maps_known_tokens() {
        assert_eq!(map_condition("excellent"), Condition::Excellent);
        assert_eq!(map_condition("good"), Condition::Bon);
        assert_eq!(map_condition("fair"), Condition::Correct);
        assert_eq!(map_condition("poor").as_str(), "a-renover");
    }

    #[test]
    fn unknown_tokens_fall_back_to_defaults() {
        assert_eq!(map_condition("mint"), Condition::Bon);
        assert_eq!(map_fuel_type(""), FuelType::Essence);
        assert_eq!(map_transmission("semi-auto"), Transmission::Manuelle);
        assert_eq!(map_category("truck"), Category::Motos);
    }

    #[test]
    fn fuel_and_transmission_tokens() {
        assert_eq!(map_fuel_type("electric").as_str(), "electrique");
        assert_eq!(map_fuel_type("hybrid").as_str(), "hybride");
        assert_eq!(map_fuel_type("diesel").as_str(), "diesel");
        assert_eq!(map_transmission("automatic").as_str(), "automatique");
        assert_eq!(map_transmission("cvt").as_str(), "cvt");
    }

    #[test]
    fn ui_tokens_map_back() {
        for ui in ["excellent", "good", "fair", "poor"] {
            assert_eq!(map_condition(ui).ui_token(), ui);
        }
        for ui in ["gasoline", "diesel", "electric", "hybrid"] {
            assert_eq!(map_fuel_type(ui).ui_token(), ui);
        }
        assert_eq!(Category::from(VehicleType::Car).ui_token(), "car");
        assert_eq!(Category::from(VehicleType::Motorcycle), Category::Motos);
    }
}
