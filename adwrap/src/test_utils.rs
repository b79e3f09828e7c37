//! Shared fixtures for unit and integration tests.

use crate::db::handlers::{Campaigns, Repository, Users};
use crate::db::models::applications::{ApplicationCreateDBRequest, BankAccountDetails};
use crate::db::models::campaigns::{CampaignCreateDBRequest, CampaignDBResponse, StickerSize};
use crate::db::models::users::{Role, UserCreateDBRequest, UserDBResponse};
use crate::types::{CampaignId, UserId};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

fn unique_suffix() -> u64 {
    NEXT_SUFFIX.fetch_add(1, Ordering::SeqCst)
}

/// Open a fresh file-backed database in a temp directory and run migrations.
///
/// File-backed rather than `:memory:` because each pool connection gets its
/// own in-memory database, which breaks any test using more than one
/// connection. The TempDir guard keeps the file alive for the test's
/// duration.
pub async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = crate::db::connect(dir.path().join("test.db"))
        .await
        .expect("open test database");
    crate::db::migrator().run(&pool).await.expect("run migrations");
    (pool, dir)
}

/// Create an advertiser account with a unique email.
pub async fn test_advertiser(pool: &SqlitePool) -> UserDBResponse {
    let n = unique_suffix();
    let mut conn = pool.acquire().await.expect("acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: format!("advertiser{n}@example.com"),
            role: Role::Advertiser {
                company_name: format!("Acme {n}"),
            },
            zip_codes: vec![],
        })
        .await
        .expect("create advertiser")
}

/// Create a driver account with the given zip codes and a unique email.
pub async fn test_driver(pool: &SqlitePool, zips: &[&str]) -> UserDBResponse {
    let n = unique_suffix();
    let mut conn = pool.acquire().await.expect("acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: format!("driver{n}@example.com"),
            role: Role::Driver {
                full_name: format!("Driver {n}"),
            },
            zip_codes: zips.iter().map(|z| z.to_string()).collect(),
        })
        .await
        .expect("create driver")
}

/// A campaign create request with the usual test shape: medium sticker,
/// $35.00/month, 10 slots. Tests tweak fields before submitting.
pub fn campaign_request(advertiser_id: UserId, zips: &[&str]) -> CampaignCreateDBRequest {
    let n = unique_suffix();
    CampaignCreateDBRequest {
        advertiser_id,
        title: format!("Campaign {n}"),
        description: "Sticker campaign for testing".to_string(),
        sticker_design: "designs/test.svg".to_string(),
        sticker_size: StickerSize::Medium,
        target_zip_codes: zips.iter().map(|z| z.to_string()).collect(),
        monthly_payment: Decimal::new(3500, 2),
        max_stickers: 10,
        is_location_based: !zips.is_empty(),
    }
}

/// Create a campaign directly.
pub async fn test_campaign(pool: &SqlitePool, advertiser_id: UserId, zips: &[&str]) -> CampaignDBResponse {
    let mut conn = pool.acquire().await.expect("acquire connection");
    Campaigns::new(&mut conn)
        .create(&campaign_request(advertiser_id, zips))
        .await
        .expect("create campaign")
}

pub fn bank_account() -> BankAccountDetails {
    BankAccountDetails {
        account_number: "000123456789".to_string(),
        routing_number: "021000021".to_string(),
        account_holder_name: "Sam Doe".to_string(),
        bank_name: "First Example Bank".to_string(),
    }
}

pub fn application_request(driver_id: UserId, campaign_id: CampaignId) -> ApplicationCreateDBRequest {
    ApplicationCreateDBRequest {
        driver_id,
        campaign_id,
        delivery_address: "1 Main St, Springfield".to_string(),
        bank_account: bank_account(),
    }
}
