use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use mc_core::{ListingStatus, Role};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

pub async fn stats(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    Ok(HttpResponse::Ok().json(data.moderation.stats(&session).await?))
}

/// `?status=` narrows the list; absent or `all` returns every listing.
pub async fn listings(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<StatusParams>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        .map(ListingStatus::from_str)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    Ok(HttpResponse::Ok().json(data.moderation.all_listings(&session, status).await?))
}

pub async fn pending_listings(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    Ok(HttpResponse::Ok().json(data.moderation.pending_listings(&session).await?))
}

pub async fn approve_listing(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    data.moderation.approve_listing(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The body is optional; `{"reason": "..."}` is logged with the rejection.
pub async fn reject_listing(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: Option<web::Json<RejectBody>>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    let reason = body.and_then(|b| b.into_inner().reason);
    data.moderation
        .reject_listing(&session, path.into_inner(), reason.as_deref())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_listing(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    data.moderation.delete_listing(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn users(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    Ok(HttpResponse::Ok().json(data.moderation.all_users(&session).await?))
}

pub async fn pending_users(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    Ok(HttpResponse::Ok().json(data.moderation.pending_users(&session).await?))
}

pub async fn verify_user(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    data.moderation.verify_user(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn suspend_user(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    data.moderation.suspend_user(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn change_role(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<RoleBody>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&req).await?;
    data.moderation
        .change_role(&session, path.into_inner(), body.role)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
