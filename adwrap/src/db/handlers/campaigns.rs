use crate::db::{
    errors::DbError,
    handlers::repository::Repository,
    models::{
        campaigns::{CampaignCreateDBRequest, CampaignDBResponse, CampaignUpdateDBRequest, StickerSize},
        from_cents, to_cents,
    },
};
use crate::errors::{Error, Result};
use crate::types::{CampaignId, UserId};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

/// Filter for listing campaigns
#[derive(Debug, Clone)]
pub struct CampaignFilter {
    pub advertiser_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

impl CampaignFilter {
    pub fn new(advertiser_id: Option<UserId>, skip: i64, limit: i64) -> Self {
        Self {
            advertiser_id,
            skip,
            limit,
        }
    }
}

// Database entity model for a campaign row, with capacity computed in-query
#[derive(Debug, Clone, FromRow)]
struct CampaignRow {
    id: Uuid,
    advertiser_id: Uuid,
    title: String,
    description: String,
    sticker_design: String,
    sticker_size: StickerSize,
    target_zip_codes: Json<Vec<String>>,
    monthly_payment_cents: i64,
    max_stickers: i64,
    is_location_based: bool,
    is_active: bool,
    remaining_capacity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CampaignRow> for CampaignDBResponse {
    fn from(row: CampaignRow) -> Self {
        Self {
            id: row.id,
            advertiser_id: row.advertiser_id,
            title: row.title,
            description: row.description,
            sticker_design: row.sticker_design,
            sticker_size: row.sticker_size,
            target_zip_codes: row.target_zip_codes.0,
            monthly_payment: from_cents(row.monthly_payment_cents),
            max_stickers: row.max_stickers,
            is_location_based: row.is_location_based,
            is_active: row.is_active,
            remaining_capacity: row.remaining_capacity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Remaining capacity counts committed slots (approved or completed
/// applications) against `max_stickers`, matching the guard in
/// `Applications::approve`. Pending applications do not hold a committed
/// slot, so the value never goes negative no matter how many are queued.
const SELECT_CAMPAIGN: &str = r#"
    SELECT c.*,
           c.max_stickers - (
               SELECT COUNT(*) FROM applications a
               WHERE a.campaign_id = c.id AND a.status IN ('approved', 'completed')
           ) AS remaining_capacity
    FROM campaigns c
"#;

pub struct Campaigns<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Campaigns<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Campaigns a driver with the given zip codes may apply to: active, with
    /// remaining capacity, and either zip-agnostic or overlapping the
    /// driver's zip set. Newest first, so the ordering is deterministic for
    /// display.
    ///
    /// An empty driver zip set still matches zip-agnostic campaigns.
    pub async fn list_available(&mut self, driver_zips: &[String]) -> Result<Vec<CampaignDBResponse>> {
        let rows = sqlx::query_as::<_, CampaignRow>(&format!(
            r#"
            {SELECT_CAMPAIGN}
            WHERE c.is_active = 1
              AND c.max_stickers > (
                  SELECT COUNT(*) FROM applications a
                  WHERE a.campaign_id = c.id AND a.status <> 'rejected'
              )
            ORDER BY c.created_at DESC
            "#
        ))
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        // Zip sets are small JSON arrays; the intersection check is done here
        // rather than in SQL.
        Ok(rows
            .into_iter()
            .map(CampaignDBResponse::from)
            .filter(|c| {
                c.target_zip_codes.is_empty()
                    || c.target_zip_codes.iter().any(|zip| driver_zips.contains(zip))
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl Repository for Campaigns<'_> {
    type CreateRequest = CampaignCreateDBRequest;
    type UpdateRequest = CampaignUpdateDBRequest;
    type Response = CampaignDBResponse;
    type Id = CampaignId;
    type Filter = CampaignFilter;

    async fn create(&mut self, request: &CampaignCreateDBRequest) -> Result<CampaignDBResponse> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, advertiser_id, title, description, sticker_design, sticker_size,
                target_zip_codes, monthly_payment_cents, max_stickers,
                is_location_based, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id)
        .bind(request.advertiser_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.sticker_design)
        .bind(request.sticker_size)
        .bind(Json(&request.target_zip_codes))
        .bind(to_cents(request.monthly_payment))
        .bind(request.max_stickers)
        .bind(request.is_location_based)
        .bind(now)
        .bind(now)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        self.get_by_id(id).await?.ok_or_else(|| {
            Error::Other(anyhow::anyhow!("campaign {id} vanished immediately after insert"))
        })
    }

    async fn get_by_id(&mut self, id: CampaignId) -> Result<Option<CampaignDBResponse>> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!("{SELECT_CAMPAIGN} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(row.map(CampaignDBResponse::from))
    }

    async fn list(&mut self, filter: &CampaignFilter) -> Result<Vec<CampaignDBResponse>> {
        let rows = sqlx::query_as::<_, CampaignRow>(&format!(
            r#"
            {SELECT_CAMPAIGN}
            WHERE (?1 IS NULL OR c.advertiser_id = ?1)
            ORDER BY c.created_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(filter.advertiser_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(CampaignDBResponse::from).collect())
    }

    async fn update(&mut self, id: CampaignId, request: &CampaignUpdateDBRequest) -> Result<CampaignDBResponse> {
        // Shrinking capacity below the live application count would leave the
        // campaign oversubscribed.
        if let Some(new_max) = request.max_stickers {
            let committed: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM applications WHERE campaign_id = ? AND status <> 'rejected'",
            )
            .bind(id)
            .fetch_one(&mut *self.db)
            .await
            .map_err(DbError::from)?;

            if new_max < committed {
                return Err(Error::Validation {
                    message: format!(
                        "max_stickers {new_max} is below the {committed} applications already committed"
                    ),
                });
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                is_active = COALESCE(?, is_active),
                max_stickers = COALESCE(?, max_stickers),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.title.as_deref())
        .bind(request.description.as_deref())
        .bind(request.is_active)
        .bind(request.max_stickers)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                resource: "Campaign".to_string(),
                id: id.to_string(),
            });
        }

        self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Campaign".to_string(),
            id: id.to_string(),
        })
    }

    async fn delete(&mut self, id: CampaignId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Applications;
    use crate::db::models::applications::ApplicationCreateDBRequest;
    use crate::test_utils::{bank_account, campaign_request, setup_test_db, test_advertiser, test_driver};

    async fn apply(pool: &sqlx::SqlitePool, driver_id: UserId, campaign_id: CampaignId) {
        let mut conn = pool.acquire().await.unwrap();
        Applications::new(&mut conn)
            .create(&ApplicationCreateDBRequest {
                driver_id,
                campaign_id,
                delivery_address: "1 Main St".to_string(),
                bank_account: bank_account(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn eligibility_requires_active_and_zip_overlap_and_capacity() {
        let (pool, _guard) = setup_test_db().await;
        let advertiser = test_advertiser(&pool).await;
        let driver = test_driver(&pool, &["10001"]).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Campaigns::new(&mut conn);

        let matching = repo
            .create(&campaign_request(advertiser.id, &["10001", "10002"]))
            .await
            .unwrap();
        let everywhere = repo.create(&campaign_request(advertiser.id, &[])).await.unwrap();
        let wrong_zip = repo
            .create(&campaign_request(advertiser.id, &["94105"]))
            .await
            .unwrap();
        let inactive = repo
            .create(&campaign_request(advertiser.id, &["10001"]))
            .await
            .unwrap();
        repo.update(
            inactive.id,
            &CampaignUpdateDBRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        drop(conn);

        let mut conn = pool.acquire().await.unwrap();
        let available = Campaigns::new(&mut conn)
            .list_available(&[driver.zip_codes[0].clone()])
            .await
            .unwrap();

        let ids: Vec<_> = available.iter().map(|c| c.id).collect();
        assert!(ids.contains(&matching.id));
        assert!(ids.contains(&everywhere.id));
        assert!(!ids.contains(&wrong_zip.id));
        assert!(!ids.contains(&inactive.id));
    }

    #[tokio::test]
    async fn empty_driver_zip_set_still_matches_zip_agnostic_campaigns() {
        let (pool, _guard) = setup_test_db().await;
        let advertiser = test_advertiser(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Campaigns::new(&mut conn);
        let everywhere = repo.create(&campaign_request(advertiser.id, &[])).await.unwrap();
        let targeted = repo
            .create(&campaign_request(advertiser.id, &["10001"]))
            .await
            .unwrap();

        let available = repo.list_available(&[]).await.unwrap();
        let ids: Vec<_> = available.iter().map(|c| c.id).collect();
        assert!(ids.contains(&everywhere.id));
        assert!(!ids.contains(&targeted.id));
    }

    #[tokio::test]
    async fn fully_consumed_campaign_is_excluded_even_while_active() {
        let (pool, _guard) = setup_test_db().await;
        let advertiser = test_advertiser(&pool).await;
        let driver = test_driver(&pool, &["10001"]).await;

        let mut request = campaign_request(advertiser.id, &[]);
        request.max_stickers = 1;
        let campaign = {
            let mut conn = pool.acquire().await.unwrap();
            Campaigns::new(&mut conn).create(&request).await.unwrap()
        };

        // A pending application consumes the only slot for eligibility, but
        // the slot is not committed until the application is approved
        apply(&pool, driver.id, campaign.id).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Campaigns::new(&mut conn);
        let available = repo.list_available(&["10001".to_string()]).await.unwrap();
        assert!(available.iter().all(|c| c.id != campaign.id));

        let fetched = repo.get_by_id(campaign.id).await.unwrap().unwrap();
        assert!(fetched.is_active);
        assert_eq!(fetched.remaining_capacity, 1);
    }

    #[tokio::test]
    async fn remaining_capacity_counts_committed_slots_and_never_goes_negative() {
        let (pool, _guard) = setup_test_db().await;
        let advertiser = test_advertiser(&pool).await;
        let driver_a = test_driver(&pool, &["10001"]).await;
        let driver_b = test_driver(&pool, &["10001"]).await;

        let mut request = campaign_request(advertiser.id, &[]);
        request.max_stickers = 1;
        let campaign = {
            let mut conn = pool.acquire().await.unwrap();
            Campaigns::new(&mut conn).create(&request).await.unwrap()
        };

        // Two drivers queue up for the single slot
        apply(&pool, driver_a.id, campaign.id).await;
        apply(&pool, driver_b.id, campaign.id).await;

        let mut conn = pool.acquire().await.unwrap();
        let first = Applications::new(&mut conn)
            .list(&crate::db::handlers::applications::ApplicationFilter {
                driver_id: Some(driver_a.id),
                campaign_id: Some(campaign.id),
                ..Default::default()
            })
            .await
            .unwrap()
            .remove(0);
        Applications::new(&mut conn).approve(first.id).await.unwrap();

        let fetched = Campaigns::new(&mut conn).get_by_id(campaign.id).await.unwrap().unwrap();
        assert_eq!(fetched.remaining_capacity, 0);
    }

    #[tokio::test]
    async fn available_campaigns_are_newest_first() {
        let (pool, _guard) = setup_test_db().await;
        let advertiser = test_advertiser(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Campaigns::new(&mut conn);
        for _ in 0..3 {
            repo.create(&campaign_request(advertiser.id, &[])).await.unwrap();
            // created_at has millisecond precision; keep insert order observable
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let available = repo.list_available(&[]).await.unwrap();
        let timestamps: Vec<_> = available.iter().map(|c| c.created_at).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(timestamps, sorted);
    }

    #[tokio::test]
    async fn capacity_cannot_shrink_below_committed_applications() {
        let (pool, _guard) = setup_test_db().await;
        let advertiser = test_advertiser(&pool).await;
        let driver_a = test_driver(&pool, &["10001"]).await;
        let driver_b = test_driver(&pool, &["10001"]).await;

        let campaign = {
            let mut conn = pool.acquire().await.unwrap();
            Campaigns::new(&mut conn)
                .create(&campaign_request(advertiser.id, &[]))
                .await
                .unwrap()
        };
        apply(&pool, driver_a.id, campaign.id).await;
        apply(&pool, driver_b.id, campaign.id).await;

        let mut conn = pool.acquire().await.unwrap();
        let err = Campaigns::new(&mut conn)
            .update(
                campaign.id,
                &CampaignUpdateDBRequest {
                    max_stickers: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
