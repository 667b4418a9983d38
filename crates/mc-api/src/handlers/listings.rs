//! Public browsing and the post-an-ad endpoint.

use std::str::FromStr;

use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::BytesMut;
use futures_util::StreamExt;
use mc_core::{ImageBlob, ListingDraft, ListingFilter, Page, VehicleType};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;

/// Images beyond this count are refused before anything is uploaded.
pub const MAX_IMAGES: usize = 20;
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const MAX_LISTING_JSON_BYTES: usize = 64 * 1024;

/// Query string of `GET /listings`. Every value arrives as text so that the
/// browse form's empty and `all` choices simply mean "no filter".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseParams {
    pub vehicle_type: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub brand: Option<String>,
    pub location: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

impl BrowseParams {
    pub fn into_filter(self) -> Result<(ListingFilter, Page), ApiError> {
        let vehicle_type = present(&self.vehicle_type)
            .map(VehicleType::from_str)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let price = |raw: &Option<String>, name: &str| {
            present(raw)
                .map(Decimal::from_str)
                .transpose()
                .map_err(|e| ApiError::BadRequest(format!("{name}: {e}")))
        };

        let filter = ListingFilter {
            vehicle_type,
            min_price: price(&self.min_price, "minPrice")?,
            max_price: price(&self.max_price, "maxPrice")?,
            brand: self.brand,
            location: self.location,
        };
        let page = Page {
            limit: self.limit,
            offset: self.offset.unwrap_or(0),
        };
        Ok((filter, page))
    }
}

pub async fn browse(
    data: web::Data<AppState>,
    query: web::Query<BrowseParams>,
) -> Result<HttpResponse, ApiError> {
    let (filter, page) = query.into_inner().into_filter()?;
    let listings = data.queries.browse(&filter, page).await?;
    Ok(HttpResponse::Ok().json(listings))
}

pub async fn get_listing(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let details = data.queries.get_listing(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// Orchestrates the creation of a new listing.
///
/// Multipart body: one `listing` part holding the form as JSON, and any
/// number of `images` file parts in display order.
pub async fn create_listing(
    data: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    // 1. Identity, before any part of the body is read
    let session = data.session(&req).await?;

    // 2. Form and files
    let (draft, images) = read_submission(payload).await?;
    debug!(images = images.len(), "submission received");

    // 3. Pipeline
    let receipt = data.submissions.submit(Some(&session), draft, images).await?;
    Ok(HttpResponse::Created().json(receipt))
}

async fn read_submission(
    mut payload: Multipart,
) -> Result<(ListingDraft, Vec<ImageBlob>), ApiError> {
    let mut draft = None;
    let mut images = Vec::new();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let name = field.name().to_string();

        match name.as_str() {
            "listing" => {
                let raw = read_field(&mut field, MAX_LISTING_JSON_BYTES).await?;
                let parsed: ListingDraft = serde_json::from_slice(&raw)
                    .map_err(|e| ApiError::BadRequest(format!("listing: {e}")))?;
                draft = Some(parsed);
            }
            "images" => {
                if images.len() == MAX_IMAGES {
                    return Err(ApiError::BadRequest(format!(
                        "at most {MAX_IMAGES} images per listing"
                    )));
                }
                let file_name = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or("image")
                    .to_string();
                let content_type = field
                    .content_type()
                    .cloned()
                    .unwrap_or_else(|| mime_guess::from_path(&file_name).first_or_octet_stream());
                let data = read_field(&mut field, MAX_IMAGE_BYTES).await?;
                images.push(ImageBlob {
                    file_name,
                    content_type,
                    data: data.freeze(),
                });
            }
            _ => {
                // Unknown parts are drained and ignored.
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
                }
            }
        }
    }

    let draft = draft.ok_or_else(|| ApiError::BadRequest("missing `listing` part".into()))?;
    Ok((draft, images))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<BytesMut, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(ApiError::BadRequest(format!(
                "part `{}` exceeds {limit} bytes",
                field.name()
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_all_mean_no_filter() {
        let params = BrowseParams {
            vehicle_type: Some("all".into()),
            min_price: Some("".into()),
            max_price: Some(" 50000 ".into()),
            ..BrowseParams::default()
        };
        let (filter, page) = params.into_filter().unwrap();
        assert_eq!(filter.vehicle_type, None);
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.max_price, Some(Decimal::from(50_000)));
        assert_eq!(page, Page::all());
    }

    #[test]
    fn unknown_vehicle_type_is_a_bad_request() {
        let params = BrowseParams {
            vehicle_type: Some("boat".into()),
            ..BrowseParams::default()
        };
        assert!(matches!(params.into_filter(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn paging_values_pass_through() {
        let params = BrowseParams {
            vehicle_type: Some("motorcycle".into()),
            limit: Some(12),
            offset: Some(24),
            ..BrowseParams::default()
        };
        let (filter, page) = params.into_filter().unwrap();
        assert_eq!(filter.vehicle_type, Some(VehicleType::Motorcycle));
        assert_eq!(page, Page { limit: Some(12), offset: 24 });
    }
}
