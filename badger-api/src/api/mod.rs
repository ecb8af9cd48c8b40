//! HTTP API handlers for badger

pub mod badges;
pub mod health;

pub use badges::{
    badge_by_reference, badge_from_document, extended_badge_by_reference,
    extended_badge_from_document,
};
pub use health::health_routes;
