//! Sign-up/sign-in, the caller's profile and the caller's own listings.

use actix_web::{web, HttpRequest, HttpResponse};
use mc_core::{ProfileUpdate, SignUpRequest};
use serde::Deserialize;
use uuid::Uuid;

use super::{bearer_token, AppState};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

pub async fn sign_up(
    data: web::Data<AppState>,
    body: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ApiError> {
    let profile = data.accounts.sign_up(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

pub async fn sign_in(
    data: web::Data<AppState>,
    body: web::Json<SignInBody>,
) -> Result<HttpResponse, ApiError> {
    let session = data.accounts.sign_in(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Always succeeds; an unknown token is already signed out.
pub async fn sign_out(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    if let Some(token) = bearer_token(&req) {
        data.accounts.sign_out(token).await?;
    }
    Ok(HttpResponse::NoContent().finish())
}

pub async fn me(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    let profile = data.accounts.profile(&session).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session": session,
        "profile": profile,
    })))
}

pub async fn update_profile(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    let profile = data.accounts.update_profile(&session, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn my_listings(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    let listings = data.owners.my_listings(&session).await?;
    Ok(HttpResponse::Ok().json(listings))
}

pub async fn mark_sold(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    data.owners.mark_sold(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
