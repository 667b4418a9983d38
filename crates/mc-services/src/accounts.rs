//! # Accounts and Owner Operations
//!
//! Thin orchestration over the auth port for sign-up/sign-in, plus the
//! operations a signed-in user performs on their own profile and listings.

use std::sync::Arc;

use mc_core::{
    AppError, AuthProvider, AuthSession, ListingDetails, ListingQuery, ListingRepo, ListingStatus,
    Profile, ProfileRepo, ProfileUpdate, Result, Session, SignUpRequest,
};
use tracing::info;
use uuid::Uuid;

use crate::transition_listing;

pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileRepo>,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { auth, profiles }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Profile> {
        if request.full_name.trim().chars().count() < 2 {
            return Err(AppError::Validation(vec!["Full name is required".into()]));
        }
        let profile = self.auth.sign_up(request).await?;
        info!(user_id = %profile.id, "account created");
        Ok(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.auth.sign_in(email.trim(), password).await
    }

    pub async fn current_user(&self, token: &str) -> Result<Option<Session>> {
        self.auth.current_user(token).await
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.auth.sign_out(token).await
    }

    /// Resolves a token or fails with `AuthRequired`.
    pub async fn require_session(&self, token: Option<&str>) -> Result<Session> {
        match token {
            Some(token) => self
                .auth
                .current_user(token)
                .await?
                .ok_or(AppError::AuthRequired),
            None => Err(AppError::AuthRequired),
        }
    }

    pub async fn profile(&self, session: &Session) -> Result<Profile> {
        self.profiles
            .get_profile(session.user_id)
            .await
            .map_err(AppError::backend)?
            .ok_or_else(|| AppError::not_found("profile", session.user_id))
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<Profile> {
        if update
            .full_name
            .as_deref()
            .is_some_and(|n| n.trim().chars().count() < 2)
        {
            return Err(AppError::Validation(vec!["Full name is required".into()]));
        }
        if update
            .phone
            .as_deref()
            .is_some_and(|p| !p.is_empty() && !mc_core::validation::is_valid_phone(p))
        {
            return Err(AppError::Validation(vec!["Please enter a valid phone number".into()]));
        }

        self.profiles
            .update_profile(session.user_id, update)
            .await
            .map_err(AppError::backend)?
            .ok_or_else(|| AppError::not_found("profile", session.user_id))
    }
}

pub struct OwnerService {
    listings: Arc<dyn ListingRepo>,
}

impl OwnerService {
    pub fn new(listings: Arc<dyn ListingRepo>) -> Self {
        Self { listings }
    }

    /// The caller's listings in every status, newest first.
    pub async fn my_listings(&self, session: &Session) -> Result<Vec<ListingDetails>> {
        let query = ListingQuery {
            owner_id: Some(session.user_id),
            ..ListingQuery::default()
        };
        self.listings
            .search_listings(&query)
            .await
            .map_err(AppError::backend)
    }

    /// `active → sold`, only for the listing's owner.
    pub async fn mark_sold(&self, session: &Session, id: Uuid) -> Result<()> {
        let details = self
            .listings
            .get_listing(id)
            .await
            .map_err(AppError::backend)?
            .ok_or_else(|| AppError::not_found("listing", id))?;

        if details.listing.owner_id != session.user_id {
            return Err(AppError::Forbidden("only the owner can mark a listing as sold".into()));
        }

        let listings = self.listings.as_ref();
        transition_listing(listings, id, ListingStatus::Active, ListingStatus::Sold).await?;
        info!(listing_id = %id, owner_id = %session.user_id, "listing sold");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::details;
    use chrono::{Duration, Utc};
    use mc_core::{MockAuthProvider, MockListingRepo, MockProfileRepo, Role};
    use mockall::predicate::eq;

    fn session(user_id: Uuid) -> Session {
        Session {
            user_id,
            email: "jo@example.com".into(),
            role: Role::User,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn missing_or_unknown_token_requires_auth() {
        let mut auth = MockAuthProvider::new();
        auth.expect_current_user().returning(|_| Ok(None));
        let svc = AccountService::new(Arc::new(auth), Arc::new(MockProfileRepo::new()));

        assert!(matches!(svc.require_session(None).await, Err(AppError::AuthRequired)));
        assert!(matches!(
            svc.require_session(Some("stale")).await,
            Err(AppError::AuthRequired)
        ));
    }

    #[tokio::test]
    async fn sign_up_requires_a_name() {
        let mut auth = MockAuthProvider::new();
        auth.expect_sign_up().never();
        let svc = AccountService::new(Arc::new(auth), Arc::new(MockProfileRepo::new()));

        let err = svc
            .sign_up(SignUpRequest {
                email: "jo@example.com".into(),
                password: "hunter22".into(),
                full_name: " ".into(),
                phone: None,
                location: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn profile_update_rejects_bad_phone() {
        let mut profiles = MockProfileRepo::new();
        profiles.expect_update_profile().never();
        let svc = AccountService::new(Arc::new(MockAuthProvider::new()), Arc::new(profiles));

        let update = ProfileUpdate {
            phone: Some("call me".into()),
            ..ProfileUpdate::default()
        };
        let err = svc
            .update_profile(&session(Uuid::now_v7()), update)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn owner_marks_active_listing_sold() {
        let listing = details(ListingStatus::Active);
        let id = listing.listing.id;
        let owner = listing.listing.owner_id;
        let mut repo = MockListingRepo::new();
        repo.expect_get_listing()
            .returning(move |_| Ok(Some(listing.clone())));
        repo.expect_transition_status()
            .with(eq(id), eq(ListingStatus::Active), eq(ListingStatus::Sold))
            .times(1)
            .returning(|_, _, _| Ok(true));

        OwnerService::new(Arc::new(repo))
            .mark_sold(&session(owner), id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stranger_cannot_mark_sold() {
        let listing = details(ListingStatus::Active);
        let id = listing.listing.id;
        let mut repo = MockListingRepo::new();
        repo.expect_get_listing()
            .returning(move |_| Ok(Some(listing.clone())));
        repo.expect_transition_status().never();

        let err = OwnerService::new(Arc::new(repo))
            .mark_sold(&session(Uuid::now_v7()), id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn my_listings_scopes_to_owner_in_any_status() {
        let owner = Uuid::now_v7();
        let mut repo = MockListingRepo::new();
        repo.expect_search_listings()
            .withf(move |q: &ListingQuery| q.owner_id == Some(owner) && q.status.is_none())
            .returning(|_| Ok(vec![details(ListingStatus::Pending)]));

        let rows = OwnerService::new(Arc::new(repo))
            .my_listings(&session(owner))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
