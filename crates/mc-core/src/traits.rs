//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Storage ports report infrastructure failures through `anyhow`; the
//! service layer turns them into [`AppError`](crate::error::AppError).

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::filter::{ListingQuery, ProfileQuery};
use crate::models::{
    Listing, ListingDetails, ListingStatus, Photo, Profile, ProfileUpdate, Role, Vehicle,
};
use crate::session::{AuthSession, Session, SignUpRequest};

/// Data persistence contract for listings and their vehicles and photos.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ListingRepo: Send + Sync {
    /// Persists a vehicle, its listing and the listing's photos together.
    /// Implementations should make this all-or-nothing where the backend allows.
    async fn create_listing(
        &self,
        vehicle: Vehicle,
        listing: Listing,
        photos: Vec<Photo>,
    ) -> anyhow::Result<()>;

    /// Any listing by id, whatever its status.
    async fn get_listing(&self, id: Uuid) -> anyhow::Result<Option<ListingDetails>>;

    async fn search_listings(&self, query: &ListingQuery) -> anyhow::Result<Vec<ListingDetails>>;

    /// Compare-and-set on the status column. Returns `false` when the listing
    /// does not exist or is not currently in `from`.
    async fn transition_status(
        &self,
        id: Uuid,
        from: ListingStatus,
        to: ListingStatus,
    ) -> anyhow::Result<bool>;

    async fn increment_view_count(&self, id: Uuid) -> anyhow::Result<()>;

    /// Hard delete. Returns the removed photos, or `None` if the listing did not exist.
    async fn delete_listing(&self, id: Uuid) -> anyhow::Result<Option<Vec<Photo>>>;
}

/// Data persistence contract for user profiles.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn create_profile(&self, profile: Profile) -> anyhow::Result<()>;
    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>>;
    async fn find_profile_by_email(&self, email: &str) -> anyhow::Result<Option<Profile>>;
    async fn list_profiles(&self, query: &ProfileQuery) -> anyhow::Result<Vec<Profile>>;

    /// Compare-and-set on the verification flag. `false` when nothing changed.
    async fn set_verified(&self, id: Uuid, from: bool, to: bool) -> anyhow::Result<bool>;

    /// Returns `false` if the profile does not exist.
    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<bool>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> anyhow::Result<Option<Profile>>;
}

/// Object storage contract for listing images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `data` under `path` and returns its public URL.
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &mime::Mime,
    ) -> anyhow::Result<String>;

    /// Removes a stored object. Removing a missing object is not an error.
    async fn remove(&self, path: &str) -> anyhow::Result<()>;

    /// Returns the public URL for `path` without touching storage.
    fn public_url(&self, path: &str) -> String;
}

/// Identity contract. Owns accounts, credentials and sessions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Registers an account and creates its profile.
    async fn sign_up(&self, request: SignUpRequest) -> Result<Profile>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Resolves a bearer token. Unknown or expired tokens yield `None`.
    async fn current_user(&self, token: &str) -> Result<Option<Session>>;

    async fn sign_out(&self, token: &str) -> Result<()>;
}
