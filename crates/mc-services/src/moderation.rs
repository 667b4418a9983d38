//! # Moderation / Admin Workflow
//!
//! Review of pending listings, user verification and the dashboard counters.
//! Every operation re-reads the caller's profile and requires the `admin` role.
//!
//! Verification is a single flag: suspending a verified user puts them back
//! in the same state as a user nobody has reviewed yet.

use std::sync::Arc;

use mc_core::{
    AdminStats, AppError, ListingDetails, ListingQuery, ListingRepo, ListingStatus, MediaStore,
    Profile, ProfileQuery, ProfileRepo, Result, Role, Session, SortOrder,
};
use tracing::info;
use uuid::Uuid;

use crate::transition_listing;
use crate::uploader::ImageUploader;

pub struct ModerationService {
    listings: Arc<dyn ListingRepo>,
    profiles: Arc<dyn ProfileRepo>,
    uploader: ImageUploader,
}

impl ModerationService {
    pub fn new(
        listings: Arc<dyn ListingRepo>,
        profiles: Arc<dyn ProfileRepo>,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            listings,
            profiles,
            uploader: ImageUploader::new(store),
        }
    }

    /// Fails with `Forbidden` unless the stored profile behind `session` is an admin.
    pub async fn require_admin(&self, session: &Session) -> Result<Profile> {
        let profile = self
            .profiles
            .get_profile(session.user_id)
            .await
            .map_err(AppError::backend)?
            .ok_or_else(|| AppError::Forbidden("account no longer exists".into()))?;

        if profile.role != Role::Admin {
            return Err(AppError::Forbidden("administrator role required".into()));
        }
        Ok(profile)
    }

    // ---- Listings ---------------------------------------------------------

    /// `pending → active`.
    pub async fn approve_listing(&self, session: &Session, id: Uuid) -> Result<()> {
        self.require_admin(session).await?;
        let listings = self.listings.as_ref();
        transition_listing(listings, id, ListingStatus::Pending, ListingStatus::Active).await?;
        info!(listing_id = %id, admin_id = %session.user_id, "listing approved");
        Ok(())
    }

    /// `pending → expired`. The reason is only recorded in the log.
    pub async fn reject_listing(
        &self,
        session: &Session,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<()> {
        self.require_admin(session).await?;
        let listings = self.listings.as_ref();
        transition_listing(listings, id, ListingStatus::Pending, ListingStatus::Expired).await?;
        info!(
            listing_id = %id,
            admin_id = %session.user_id,
            reason = reason.unwrap_or(""),
            "listing rejected"
        );
        Ok(())
    }

    /// Hard delete. Stored photo files are removed afterwards, best effort.
    pub async fn delete_listing(&self, session: &Session, id: Uuid) -> Result<()> {
        self.require_admin(session).await?;
        let photos = self
            .listings
            .delete_listing(id)
            .await
            .map_err(AppError::backend)?
            .ok_or_else(|| AppError::not_found("listing", id))?;

        self.uploader
            .discard_paths(photos.iter().map(|p| p.storage_path.as_str()))
            .await;
        info!(
            listing_id = %id,
            admin_id = %session.user_id,
            photos = photos.len(),
            "listing deleted"
        );
        Ok(())
    }

    /// Review queue, oldest first.
    pub async fn pending_listings(&self, session: &Session) -> Result<Vec<ListingDetails>> {
        self.require_admin(session).await?;
        self.search(ListingQuery {
            status: Some(ListingStatus::Pending),
            order: SortOrder::OldestFirst,
            ..ListingQuery::default()
        })
        .await
    }

    /// Every listing, optionally restricted to one status, newest first.
    pub async fn all_listings(
        &self,
        session: &Session,
        status: Option<ListingStatus>,
    ) -> Result<Vec<ListingDetails>> {
        self.require_admin(session).await?;
        self.search(ListingQuery {
            status,
            ..ListingQuery::default()
        })
        .await
    }

    // ---- Users ------------------------------------------------------------

    /// `unverified → verified`.
    pub async fn verify_user(&self, session: &Session, user_id: Uuid) -> Result<()> {
        self.require_admin(session).await?;
        self.flip_verification(user_id, false, true).await?;
        info!(%user_id, admin_id = %session.user_id, "user verified");
        Ok(())
    }

    /// `verified → unverified`.
    pub async fn suspend_user(&self, session: &Session, user_id: Uuid) -> Result<()> {
        self.require_admin(session).await?;
        self.flip_verification(user_id, true, false).await?;
        info!(%user_id, admin_id = %session.user_id, "user suspended");
        Ok(())
    }

    pub async fn change_role(&self, session: &Session, user_id: Uuid, role: Role) -> Result<()> {
        self.require_admin(session).await?;
        if user_id == session.user_id && role != Role::Admin {
            return Err(AppError::Forbidden(
                "administrators cannot remove their own admin role".into(),
            ));
        }
        let changed = self
            .profiles
            .set_role(user_id, role)
            .await
            .map_err(AppError::backend)?;
        if !changed {
            return Err(AppError::not_found("profile", user_id));
        }
        info!(%user_id, %role, admin_id = %session.user_id, "role changed");
        Ok(())
    }

    /// All profiles, newest first.
    pub async fn all_users(&self, session: &Session) -> Result<Vec<Profile>> {
        self.require_admin(session).await?;
        self.profiles(ProfileQuery::default()).await
    }

    /// Profiles awaiting verification, oldest first.
    pub async fn pending_users(&self, session: &Session) -> Result<Vec<Profile>> {
        self.require_admin(session).await?;
        self.profiles(ProfileQuery {
            is_verified: Some(false),
            order: SortOrder::OldestFirst,
            ..ProfileQuery::default()
        })
        .await
    }

    // ---- Dashboard --------------------------------------------------------

    /// Recomputed from full scans on every call.
    pub async fn stats(&self, session: &Session) -> Result<AdminStats> {
        self.require_admin(session).await?;

        let profile_query = ProfileQuery::default();
        let listing_query = ListingQuery::default();
        let (users, listings) = tokio::try_join!(
            self.profiles.list_profiles(&profile_query),
            self.listings.search_listings(&listing_query),
        )
        .map_err(AppError::backend)?;

        let count_status = |status| listings.iter().filter(|d| d.listing.status == status).count();
        let verified_users = users.iter().filter(|u| u.is_verified).count();

        Ok(AdminStats {
            total_users: users.len(),
            verified_users,
            pending_users: users.len() - verified_users,
            total_listings: listings.len(),
            active_listings: count_status(ListingStatus::Active),
            pending_listings: count_status(ListingStatus::Pending),
            total_views: listings.iter().map(|d| d.listing.view_count).sum(),
        })
    }

    // ---- Helpers ----------------------------------------------------------

    async fn search(&self, query: ListingQuery) -> Result<Vec<ListingDetails>> {
        self.listings
            .search_listings(&query)
            .await
            .map_err(AppError::backend)
    }

    async fn profiles(&self, query: ProfileQuery) -> Result<Vec<Profile>> {
        self.profiles
            .list_profiles(&query)
            .await
            .map_err(AppError::backend)
    }

    async fn flip_verification(&self, user_id: Uuid, from: bool, to: bool) -> Result<()> {
        let changed = self
            .profiles
            .set_verified(user_id, from, to)
            .await
            .map_err(AppError::backend)?;
        if changed {
            return Ok(());
        }

        match self.profiles.get_profile(user_id).await.map_err(AppError::backend)? {
            None => Err(AppError::not_found("profile", user_id)),
            Some(profile) => Err(AppError::InvalidTransition {
                from: verification_label(profile.is_verified).into(),
                to: verification_label(to).into(),
            }),
        }
    }
}

fn verification_label(verified: bool) -> &'static str {
    if verified {
        "verified"
    } else {
        "unverified"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::details;
    use chrono::{Duration, Utc};
    use mc_core::{MockListingRepo, MockMediaStore, MockProfileRepo, Photo};
    use mockall::predicate::eq;

    fn profile(role: Role, verified: bool) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::now_v7(),
            full_name: "Sam Admin".into(),
            email: "sam@example.com".into(),
            phone: None,
            location: None,
            role,
            is_verified: verified,
            created_at: now,
            updated_at: now,
        }
    }

    fn session_for(profile: &Profile) -> Session {
        Session {
            user_id: profile.id,
            email: profile.email.clone(),
            role: profile.role,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    /// A profile repo that knows the caller.
    fn profiles_with(caller: Profile) -> MockProfileRepo {
        let mut profiles = MockProfileRepo::new();
        let id = caller.id;
        profiles
            .expect_get_profile()
            .with(eq(id))
            .returning(move |_| Ok(Some(caller.clone())));
        profiles
    }

    fn service(listings: MockListingRepo, profiles: MockProfileRepo) -> ModerationService {
        ModerationService::new(
            Arc::new(listings),
            Arc::new(profiles),
            Arc::new(MockMediaStore::new()),
        )
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let caller = profile(Role::User, true);
        let session = session_for(&caller);
        let mut listings = MockListingRepo::new();
        listings.expect_transition_status().never();

        let svc = service(listings, profiles_with(caller));
        let err = svc.approve_listing(&session, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn approve_moves_pending_to_active() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let listing_id = Uuid::now_v7();
        let mut listings = MockListingRepo::new();
        listings
            .expect_transition_status()
            .with(eq(listing_id), eq(ListingStatus::Pending), eq(ListingStatus::Active))
            .times(1)
            .returning(|_, _, _| Ok(true));

        let svc = service(listings, profiles_with(admin));
        svc.approve_listing(&session, listing_id).await.unwrap();
    }

    #[tokio::test]
    async fn approving_an_active_listing_is_refused() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let active = details(ListingStatus::Active);
        let id = active.listing.id;
        let mut listings = MockListingRepo::new();
        listings
            .expect_transition_status()
            .returning(|_, _, _| Ok(false));
        listings
            .expect_get_listing()
            .returning(move |_| Ok(Some(active.clone())));

        let svc = service(listings, profiles_with(admin));
        let err = svc.approve_listing(&session, id).await.unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, "active");
                assert_eq!(to, "active");
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejecting_unknown_listing_is_not_found() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let mut listings = MockListingRepo::new();
        listings
            .expect_transition_status()
            .returning(|_, _, _| Ok(false));
        listings.expect_get_listing().returning(|_| Ok(None));

        let svc = service(listings, profiles_with(admin));
        let err = svc
            .reject_listing(&session, Uuid::now_v7(), Some("blurry photos"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn suspending_an_unverified_user_is_refused() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let target = profile(Role::User, false);
        let target_id = target.id;

        let mut profiles = profiles_with(admin);
        profiles
            .expect_set_verified()
            .with(eq(target_id), eq(true), eq(false))
            .returning(|_, _, _| Ok(false));
        profiles
            .expect_get_profile()
            .with(eq(target_id))
            .returning(move |_| Ok(Some(target.clone())));

        let svc = service(MockListingRepo::new(), profiles);
        let err = svc.suspend_user(&session, target_id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition { ref from, .. } if from == "unverified"
        ));
    }

    #[tokio::test]
    async fn verify_flips_the_flag() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let target_id = Uuid::now_v7();
        let mut profiles = profiles_with(admin);
        profiles
            .expect_set_verified()
            .with(eq(target_id), eq(false), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(true));

        let svc = service(MockListingRepo::new(), profiles);
        svc.verify_user(&session, target_id).await.unwrap();
    }

    #[tokio::test]
    async fn admin_cannot_demote_themself() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let mut profiles = profiles_with(admin.clone());
        profiles.expect_set_role().never();

        let svc = service(MockListingRepo::new(), profiles);
        let err = svc.change_role(&session, admin.id, Role::User).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_removes_stored_photos() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let listing_id = Uuid::now_v7();
        let photo = Photo {
            id: Uuid::now_v7(),
            listing_id,
            owner_id: Uuid::now_v7(),
            storage_path: "owner/1_0.jpg".into(),
            url: "https://cdn.test/owner/1_0.jpg".into(),
            position: 0,
        };
        let mut listings = MockListingRepo::new();
        listings
            .expect_delete_listing()
            .with(eq(listing_id))
            .returning(move |_| Ok(Some(vec![photo.clone()])));
        let mut store = MockMediaStore::new();
        store
            .expect_remove()
            .with(eq("owner/1_0.jpg"))
            .times(1)
            .returning(|_| Ok(()));

        let svc = ModerationService::new(
            Arc::new(listings),
            Arc::new(profiles_with(admin)),
            Arc::new(store),
        );
        svc.delete_listing(&session, listing_id).await.unwrap();
    }

    #[tokio::test]
    async fn stats_count_full_scans() {
        let admin = profile(Role::Admin, true);
        let session = session_for(&admin);
        let everyone = vec![admin.clone(), profile(Role::User, false), profile(Role::User, false)];
        let mut profiles = profiles_with(admin);
        profiles
            .expect_list_profiles()
            .returning(move |_| Ok(everyone.clone()));
        let mut listings = MockListingRepo::new();
        listings.expect_search_listings().returning(|q: &ListingQuery| {
            assert_eq!(q.status, None);
            Ok(vec![
                details(ListingStatus::Active),
                details(ListingStatus::Active),
                details(ListingStatus::Pending),
                details(ListingStatus::Sold),
            ])
        });

        let svc = service(listings, profiles);
        let stats = svc.stats(&session).await.unwrap();
        assert_eq!(
            stats,
            AdminStats {
                total_users: 3,
                verified_users: 1,
                pending_users: 2,
                total_listings: 4,
                active_listings: 2,
                pending_listings: 1,
                total_views: 12,
            }
        );
    }
}
