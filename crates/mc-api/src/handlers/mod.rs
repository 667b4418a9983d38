//! # mc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.
//! Handlers stay thin: extract, call one service operation, render JSON.

pub mod accounts;
pub mod admin;
pub mod listings;

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use mc_core::{AuthProvider, ListingRepo, MediaStore, ProfileRepo, Session};
use mc_services::{
    AccountService, ListingQueryService, ModerationService, OwnerService, SubmissionPipeline,
};

use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub accounts: AccountService,
    pub owners: OwnerService,
    pub submissions: SubmissionPipeline,
    pub queries: ListingQueryService,
    pub moderation: ModerationService,
}

impl AppState {
    /// Wires every service to the same set of plugins.
    pub fn new(
        listings: Arc<dyn ListingRepo>,
        profiles: Arc<dyn ProfileRepo>,
        store: Arc<dyn MediaStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            accounts: AccountService::new(auth, Arc::clone(&profiles)),
            owners: OwnerService::new(Arc::clone(&listings)),
            submissions: SubmissionPipeline::new(Arc::clone(&listings), Arc::clone(&store)),
            queries: ListingQueryService::new(Arc::clone(&listings)),
            moderation: ModerationService::new(listings, profiles, store),
        }
    }

    /// The caller's session, or `AuthRequired`.
    pub async fn session(&self, req: &HttpRequest) -> Result<Session, ApiError> {
        Ok(self.accounts.require_session(bearer_token(req)).await?)
    }

    /// The caller's session if a valid token was sent.
    pub async fn optional_session(&self, req: &HttpRequest) -> Result<Option<Session>, ApiError> {
        match bearer_token(req) {
            Some(token) => Ok(self.accounts.current_user(token).await?),
            None => Ok(None),
        }
    }
}

/// `Authorization: Bearer <token>`
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn extracts_bearer_tokens_only() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123"));

        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert_eq!(bearer_token(&basic), None);

        let empty = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert_eq!(bearer_token(&empty), None);

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
