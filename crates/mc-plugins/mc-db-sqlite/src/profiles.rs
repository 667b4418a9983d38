use async_trait::async_trait;
use chrono::Utc;
use mc_core::{Profile, ProfileQuery, ProfileRepo, ProfileUpdate, Role, SortOrder};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::{parse_column, SqliteMarketplaceRepo};

#[async_trait]
impl ProfileRepo for SqliteMarketplaceRepo {
    async fn create_profile(&self, profile: Profile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO profiles \
             (id, full_name, email, phone, location, role, is_verified, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(profile.id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(profile.role.as_str())
        .bind(profile.is_verified)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_profile_by_email(&self, email: &str) -> anyhow::Result<Option<Profile>> {
        // The column is COLLATE NOCASE.
        let row = sqlx::query("SELECT * FROM profiles WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn list_profiles(&self, query: &ProfileQuery) -> anyhow::Result<Vec<Profile>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM profiles WHERE 1 = 1");
        if let Some(verified) = query.is_verified {
            qb.push(" AND is_verified = ").push_bind(verified);
        }
        if let Some(role) = query.role {
            qb.push(" AND role = ").push_bind(role.as_str());
        }
        qb.push(match query.order {
            SortOrder::NewestFirst => " ORDER BY created_at DESC, id DESC",
            SortOrder::OldestFirst => " ORDER BY created_at ASC, id ASC",
        });

        qb.build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(profile_from_row)
            .collect()
    }

    async fn set_verified(&self, id: Uuid, from: bool, to: bool) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE profiles SET is_verified = ?, updated_at = ? WHERE id = ? AND is_verified = ?",
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE profiles SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Absent fields keep their stored value.
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> anyhow::Result<Option<Profile>> {
        let result = sqlx::query(
            "UPDATE profiles SET \
             full_name = COALESCE(?, full_name), \
             phone = COALESCE(?, phone), \
             location = COALESCE(?, location), \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(update.full_name.as_deref().map(str::trim))
        .bind(update.phone.as_deref().map(str::trim))
        .bind(update.location.as_deref().map(str::trim))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_profile(id).await
    }
}

fn profile_from_row(row: &SqliteRow) -> anyhow::Result<Profile> {
    Ok(Profile {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        location: row.try_get("location")?,
        role: parse_column(row, "role")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(email: &str, verified: bool, age_days: i64) -> Profile {
        let at = Utc::now() - Duration::days(age_days);
        Profile {
            id: Uuid::now_v7(),
            full_name: "Jo Seller".into(),
            email: email.into(),
            phone: None,
            location: None,
            role: Role::User,
            is_verified: verified,
            created_at: at,
            updated_at: at,
        }
    }

    async fn repo() -> SqliteMarketplaceRepo {
        SqliteMarketplaceRepo::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let repo = repo().await;
        let jo = profile("Jo@Example.com", false, 0);
        repo.create_profile(jo.clone()).await.unwrap();

        let found = repo.find_profile_by_email("jo@example.COM").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(jo.id));
        assert!(repo.find_profile_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = repo().await;
        repo.create_profile(profile("jo@example.com", false, 0)).await.unwrap();
        assert!(repo.create_profile(profile("JO@example.com", false, 0)).await.is_err());
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let repo = repo().await;
        let old = profile("old@example.com", false, 5);
        let new = profile("new@example.com", false, 1);
        let verified = profile("ok@example.com", true, 3);
        for p in [&old, &new, &verified] {
            repo.create_profile(p.clone()).await.unwrap();
        }

        let pending = repo
            .list_profiles(&ProfileQuery {
                is_verified: Some(false),
                ..ProfileQuery::default()
            })
            .await
            .unwrap();
        let ids: Vec<Uuid> = pending.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let all = repo.list_profiles(&ProfileQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn verification_is_compare_and_set() {
        let repo = repo().await;
        let jo = profile("jo@example.com", false, 0);
        repo.create_profile(jo.clone()).await.unwrap();

        assert!(repo.set_verified(jo.id, false, true).await.unwrap());
        assert!(!repo.set_verified(jo.id, false, true).await.unwrap());
        assert!(repo.get_profile(jo.id).await.unwrap().unwrap().is_verified);
        assert!(!repo.set_verified(Uuid::now_v7(), false, true).await.unwrap());
    }

    #[tokio::test]
    async fn role_change_and_partial_update() {
        let repo = repo().await;
        let jo = profile("jo@example.com", false, 0);
        repo.create_profile(jo.clone()).await.unwrap();

        assert!(repo.set_role(jo.id, Role::Admin).await.unwrap());
        let updated = repo
            .update_profile(
                jo.id,
                ProfileUpdate {
                    phone: Some(" 555-123-4567 ".into()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.full_name, "Jo Seller");
        assert_eq!(updated.phone.as_deref(), Some("555-123-4567"));

        assert!(repo
            .update_profile(Uuid::now_v7(), ProfileUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}
