//! `ListingRepo` for SQLite: listings joined with their vehicle, seller and photos.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use mc_core::{
    Category, Listing, ListingDetails, ListingQuery, ListingRepo, ListingStatus, Photo,
    SellerSummary, SortOrder, Vehicle,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::{like_pattern, parse_column, SqliteMarketplaceRepo};

const SELECT_DETAILS: &str = "SELECT \
    l.id, l.owner_id, l.vehicle_id, l.title, l.description, l.status, l.location, \
    l.contact_name, l.contact_phone, l.contact_email, l.is_negotiable, l.test_drive_available, \
    l.view_count, l.created_at, l.updated_at, \
    v.category, v.brand, v.model, v.year, v.mileage, v.price, v.condition, v.fuel_type, \
    v.transmission, v.color, \
    v.created_at AS vehicle_created_at, v.updated_at AS vehicle_updated_at, \
    p.full_name AS seller_name, p.is_verified AS seller_verified \
    FROM listings l \
    JOIN vehicles v ON v.id = l.vehicle_id \
    LEFT JOIN profiles p ON p.id = l.owner_id";

#[async_trait]
impl ListingRepo for SqliteMarketplaceRepo {
    /// Atomic operation to create a vehicle, its listing and the photos.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we never end up with a vehicle that
    /// has no listing, or a listing missing some of its photos.
    async fn create_listing(
        &self,
        vehicle: Vehicle,
        listing: Listing,
        photos: Vec<Photo>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        // 1. Insert Vehicle
        sqlx::query(
            "INSERT INTO vehicles (id, owner_id, category, brand, model, year, mileage, price, \
             condition, fuel_type, transmission, color, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(vehicle.id)
        .bind(vehicle.owner_id)
        .bind(vehicle.category.as_str())
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.mileage)
        .bind(vehicle.price.to_string())
        .bind(vehicle.condition.as_str())
        .bind(vehicle.fuel_type.as_str())
        .bind(vehicle.transmission.as_str())
        .bind(&vehicle.color)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(&mut *tx)
        .await?;

        // 2. Insert Listing
        sqlx::query(
            "INSERT INTO listings (id, owner_id, vehicle_id, title, description, status, location, \
             contact_name, contact_phone, contact_email, is_negotiable, test_drive_available, \
             view_count, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(listing.id)
        .bind(listing.owner_id)
        .bind(listing.vehicle_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.status.as_str())
        .bind(&listing.location)
        .bind(&listing.contact_name)
        .bind(&listing.contact_phone)
        .bind(&listing.contact_email)
        .bind(listing.is_negotiable)
        .bind(listing.test_drive_available)
        .bind(listing.view_count)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .execute(&mut *tx)
        .await?;

        // 3. Insert Photos
        for photo in &photos {
            sqlx::query(
                "INSERT INTO photos (id, listing_id, owner_id, storage_path, url, position) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(photo.id)
            .bind(photo.listing_id)
            .bind(photo.owner_id)
            .bind(&photo.storage_path)
            .bind(&photo.url)
            .bind(photo.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_listing(&self, id: Uuid) -> anyhow::Result<Option<ListingDetails>> {
        let row = sqlx::query(&format!("{SELECT_DETAILS} WHERE l.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut details = details_from_row(&row)?;
                details.photos = self.photos_for(&[id]).await?.remove(&id).unwrap_or_default();
                Ok(Some(details))
            }
            None => Ok(None),
        }
    }

    async fn search_listings(&self, query: &ListingQuery) -> anyhow::Result<Vec<ListingDetails>> {
        let filter = query.filter.normalized();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_DETAILS);
        qb.push(" WHERE 1 = 1");

        if let Some(status) = query.status {
            qb.push(" AND l.status = ").push_bind(status.as_str());
        }
        if let Some(owner_id) = query.owner_id {
            qb.push(" AND l.owner_id = ").push_bind(owner_id);
        }
        if let Some(kind) = filter.vehicle_type {
            qb.push(" AND v.category = ").push_bind(Category::from(kind).as_str());
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND CAST(v.price AS REAL) >= ").push_bind(as_real(min));
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND CAST(v.price AS REAL) <= ").push_bind(as_real(max));
        }
        if let Some(brand) = &filter.brand {
            qb.push(" AND LOWER(v.brand) LIKE ")
                .push_bind(like_pattern(brand))
                .push(" ESCAPE '\\'");
        }
        if let Some(location) = &filter.location {
            qb.push(" AND LOWER(l.location) LIKE ")
                .push_bind(like_pattern(location))
                .push(" ESCAPE '\\'");
        }

        qb.push(match query.order {
            SortOrder::NewestFirst => " ORDER BY l.created_at DESC, l.id DESC",
            SortOrder::OldestFirst => " ORDER BY l.created_at ASC, l.id ASC",
        });

        match query.page.limit {
            Some(limit) => {
                qb.push(" LIMIT ").push_bind(i64::from(limit));
                qb.push(" OFFSET ").push_bind(i64::from(query.page.offset));
            }
            None if query.page.offset > 0 => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(i64::from(query.page.offset));
            }
            None => {}
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut listings = rows
            .iter()
            .map(details_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let ids: Vec<Uuid> = listings.iter().map(|d| d.listing.id).collect();
        let mut photos = self.photos_for(&ids).await?;
        for details in &mut listings {
            details.photos = photos.remove(&details.listing.id).unwrap_or_default();
        }

        Ok(listings)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ListingStatus,
        to: ListingStatus,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE listings SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn increment_view_count(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE listings SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes the listing, its photo rows and its vehicle in one transaction.
    async fn delete_listing(&self, id: Uuid) -> anyhow::Result<Option<Vec<Photo>>> {
        let mut tx = self.pool.begin().await?;

        let vehicle_id: Option<Uuid> =
            sqlx::query_scalar("SELECT vehicle_id FROM listings WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(vehicle_id) = vehicle_id else {
            return Ok(None);
        };

        let photos = sqlx::query("SELECT * FROM photos WHERE listing_id = ? ORDER BY position ASC")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(photo_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(photos))
    }
}

impl SqliteMarketplaceRepo {
    /// Photos for several listings, grouped by listing and ordered by position.
    async fn photos_for(&self, listing_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Vec<Photo>>> {
        let mut grouped: HashMap<Uuid, Vec<Photo>> = HashMap::new();
        if listing_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM photos WHERE listing_id IN (");
        let mut ids = qb.separated(", ");
        for id in listing_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY listing_id, position ASC");

        for row in qb.build().fetch_all(&self.pool).await? {
            let photo = photo_from_row(&row)?;
            grouped.entry(photo.listing_id).or_default().push(photo);
        }
        Ok(grouped)
    }
}

fn as_real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::MAX)
}

fn details_from_row(row: &SqliteRow) -> anyhow::Result<ListingDetails> {
    let listing = Listing {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: parse_column(row, "status")?,
        location: row.try_get("location")?,
        contact_name: row.try_get("contact_name")?,
        contact_phone: row.try_get("contact_phone")?,
        contact_email: row.try_get("contact_email")?,
        is_negotiable: row.try_get("is_negotiable")?,
        test_drive_available: row.try_get("test_drive_available")?,
        view_count: row.try_get("view_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    let price: String = row.try_get("price")?;
    let vehicle = Vehicle {
        id: listing.vehicle_id,
        owner_id: listing.owner_id,
        category: parse_column(row, "category")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        mileage: row.try_get("mileage")?,
        price: price.parse::<Decimal>()?,
        condition: parse_column(row, "condition")?,
        fuel_type: parse_column(row, "fuel_type")?,
        transmission: parse_column(row, "transmission")?,
        color: row.try_get("color")?,
        created_at: row.try_get("vehicle_created_at")?,
        updated_at: row.try_get("vehicle_updated_at")?,
    };

    let seller_name: Option<String> = row.try_get("seller_name")?;
    let seller_verified: Option<bool> = row.try_get("seller_verified")?;
    let seller = seller_name.map(|full_name| SellerSummary {
        full_name,
        is_verified: seller_verified.unwrap_or(false),
    });

    Ok(ListingDetails {
        listing,
        vehicle,
        seller,
        photos: Vec::new(),
    })
}

fn photo_from_row(row: &SqliteRow) -> anyhow::Result<Photo> {
    Ok(Photo {
        id: row.try_get("id")?,
        listing_id: row.try_get("listing_id")?,
        owner_id: row.try_get("owner_id")?,
        storage_path: row.try_get("storage_path")?,
        url: row.try_get("url")?,
        position: row.try_get("position")?,
    })
}
