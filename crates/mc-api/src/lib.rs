//! # mc-api
//!
//! The JSON HTTP layer for MotoCar Ads.

pub mod error;
pub mod handlers;
pub mod middleware;

pub use error::ApiError;
pub use handlers::AppState;

use actix_web::web;
use handlers::{accounts, admin, listings};

/// Configures every route of the marketplace API.
///
/// # Developer Note
/// The binary decides the mount point, so the same routes can live under
/// `/` or `/api/v1/`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/sign-up", web::post().to(accounts::sign_up))
            .route("/sign-in", web::post().to(accounts::sign_in))
            .route("/sign-out", web::post().to(accounts::sign_out))
            .route("/me", web::get().to(accounts::me)),
    )
    .route("/profile", web::put().to(accounts::update_profile))
    .route("/me/listings", web::get().to(accounts::my_listings))
    .service(
        web::scope("/listings")
            .route("", web::get().to(listings::browse))
            .route("", web::post().to(listings::create_listing))
            .route("/{id}", web::get().to(listings::get_listing))
            .route("/{id}/sold", web::post().to(accounts::mark_sold)),
    )
    .service(
        web::scope("/admin")
            .route("/stats", web::get().to(admin::stats))
            .route("/listings", web::get().to(admin::listings))
            .route("/listings/pending", web::get().to(admin::pending_listings))
            .route("/listings/{id}/approve", web::post().to(admin::approve_listing))
            .route("/listings/{id}/reject", web::post().to(admin::reject_listing))
            .route("/listings/{id}", web::delete().to(admin::delete_listing))
            .route("/users", web::get().to(admin::users))
            .route("/users/pending", web::get().to(admin::pending_users))
            .route("/users/{id}/verify", web::post().to(admin::verify_user))
            .route("/users/{id}/suspend", web::post().to(admin::suspend_user))
            .route("/users/{id}/role", web::put().to(admin::change_role)),
    );
}
