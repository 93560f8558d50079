//! Integration tests for offerwatch-db against a live Postgres instance
//! (provisioned per-test by `#[sqlx::test]`), plus a few offline checks.

use chrono::{Duration, Utc};
use offerwatch_db::{offers, snapshots, NewOffer, NewSnapshot, OfferChanges, OfferFilter};
use sqlx::PgPool;
use uuid::Uuid;

fn new_offer(owner_id: Uuid, name: &str) -> NewOffer {
    NewOffer {
        owner_id,
        url: format!("https://ads.example.com/library?q={name}"),
        name: name.to_string(),
        category: "infoproduto".to_string(),
        region: "brasil".to_string(),
    }
}

fn snapshot_at(offer_id: Uuid, hours_ago: i64, campaigns: i32) -> NewSnapshot {
    NewSnapshot {
        offer_id,
        captured_at: Utc::now() - Duration::hours(hours_ago),
        campaigns_count: campaigns,
        creatives_count: campaigns,
        impressions: None,
        reach: None,
        campaign_start_date: None,
        campaign_end_date: None,
        ad_texts: None,
        page_name: None,
        scrape_status: "success".to_string(),
        error_message: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    let app_config = offerwatch_core::AppConfig {
        database_url: "postgres://example".to_string(),
        env: offerwatch_core::Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        dev_owner_id: Uuid::nil(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scraper_timeout_ms: 30_000,
        scraper_user_agent: "ua".to_string(),
        scraper_max_retries: 3,
        scraper_backoff_base_ms: 1_000,
        scraper_backoff_cap_ms: 10_000,
        scheduler_inter_offer_delay_ms: 2_000,
        scheduler_timezone: chrono_tz::America::Sao_Paulo,
    };

    let pool_config = offerwatch_db::PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_and_get_offer_is_owner_scoped(pool: PgPool) {
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let created = offers::create_offer(&pool, &new_offer(owner, "emagrecedor-x"))
        .await
        .expect("create offer");

    assert!(created.is_active);
    assert_eq!(created.category, "infoproduto");

    let found = offers::get_offer(&pool, created.id, owner)
        .await
        .expect("get offer");
    assert_eq!(found.map(|o| o.id), Some(created.id));

    // A foreign owner sees nothing, same as a missing offer.
    let foreign = offers::get_offer(&pool, created.id, stranger)
        .await
        .expect("get offer as stranger");
    assert!(foreign.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_active_offers_skips_deactivated(pool: PgPool) {
    let owner = Uuid::new_v4();
    let a = offers::create_offer(&pool, &new_offer(owner, "offer-a"))
        .await
        .expect("create a");
    let b = offers::create_offer(&pool, &new_offer(owner, "offer-b"))
        .await
        .expect("create b");

    let changes = OfferChanges {
        is_active: Some(false),
        ..OfferChanges::default()
    };
    offers::update_offer(&pool, b.id, owner, &changes)
        .await
        .expect("deactivate b");

    let active = offers::list_active_offers(&pool).await.expect("list");
    let ids: Vec<Uuid> = active.iter().map(|o| o.id).collect();
    assert!(ids.contains(&a.id));
    assert!(!ids.contains(&b.id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_offer_only_touches_provided_fields(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = offers::create_offer(&pool, &new_offer(owner, "original-name"))
        .await
        .expect("create");

    let changes = OfferChanges {
        name: Some("renamed".to_string()),
        ..OfferChanges::default()
    };
    let updated = offers::update_offer(&pool, created.id, owner, &changes)
        .await
        .expect("update")
        .expect("offer exists");

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.url, created.url);
    assert_eq!(updated.region, created.region);
    assert!(updated.is_active);
    assert!(updated.updated_at >= created.updated_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_offers_filters_and_counts(pool: PgPool) {
    let owner = Uuid::new_v4();
    offers::create_offer(&pool, &new_offer(owner, "info-1"))
        .await
        .expect("create");
    let mut nutra = new_offer(owner, "nutra-1");
    nutra.category = "nutra".to_string();
    nutra.region = "latam".to_string();
    offers::create_offer(&pool, &nutra).await.expect("create");

    let filter = OfferFilter {
        category: Some("nutra".to_string()),
        region: None,
    };
    let page = offers::list_offers(&pool, owner, &filter, 50, 0)
        .await
        .expect("list");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "nutra-1");

    let total = offers::count_offers(&pool, owner, &filter)
        .await
        .expect("count");
    assert_eq!(total, 1);

    let all = offers::count_offers(&pool, owner, &OfferFilter::default())
        .await
        .expect("count all");
    assert_eq!(all, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn snapshot_insert_and_latest(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "snap-offer"))
        .await
        .expect("create");

    assert!(snapshots::latest_snapshot(&pool, offer.id)
        .await
        .expect("latest on empty")
        .is_none());

    snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, 5, 3))
        .await
        .expect("insert old");
    let newest = snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, 1, 7))
        .await
        .expect("insert new");

    let latest = snapshots::latest_snapshot(&pool, offer.id)
        .await
        .expect("latest")
        .expect("exists");
    assert_eq!(latest.id, newest.id);
    assert_eq!(latest.campaigns_count, 7);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delta_reference_ignores_out_of_window_snapshots(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "delta-offer"))
        .await
        .expect("create");

    // T-30h with count 5 is outside the 24h window; T-1h with count 8 is the
    // only candidate reference.
    snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, 30, 5))
        .await
        .expect("insert T-30h");
    snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, 1, 8))
        .await
        .expect("insert T-1h");

    let cutoff = offerwatch_core::metrics::delta_window_start(Utc::now());
    let reference = snapshots::earliest_snapshot_since(&pool, offer.id, cutoff)
        .await
        .expect("reference query")
        .expect("in-window snapshot exists");
    assert_eq!(reference.campaigns_count, 8);

    let latest = snapshots::latest_snapshot(&pool, offer.id)
        .await
        .expect("latest")
        .expect("exists");
    let delta = offerwatch_core::metrics::delta_24h(
        &offerwatch_core::metrics::CountObservation {
            captured_at: latest.captured_at,
            campaigns_count: latest.campaigns_count,
            creatives_count: latest.creatives_count,
        },
        Some(&offerwatch_core::metrics::CountObservation {
            captured_at: reference.captured_at,
            campaigns_count: reference.campaigns_count,
            creatives_count: reference.creatives_count,
        }),
    )
    .expect("delta");
    assert_eq!(delta.campaigns_count, 0, "delta must be 0, not 3");
}

#[sqlx::test(migrations = "../../migrations")]
async fn delta_reference_is_none_outside_window(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "stale-offer"))
        .await
        .expect("create");

    snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, 30, 5))
        .await
        .expect("insert stale");

    let cutoff = offerwatch_core::metrics::delta_window_start(Utc::now());
    let reference = snapshots::earliest_snapshot_since(&pool, offer.id, cutoff)
        .await
        .expect("reference query");
    assert!(reference.is_none(), "stale snapshot must not be a reference");
}

#[sqlx::test(migrations = "../../migrations")]
async fn series_respects_cutoff_and_order(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "series-offer"))
        .await
        .expect("create");

    for (hours_ago, count) in [(24 * 8, 1), (24 * 3, 2), (2, 3)] {
        snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, hours_ago, count))
            .await
            .expect("insert");
    }

    let now = Utc::now();
    let week = snapshots::list_snapshots_since(
        &pool,
        offer.id,
        offerwatch_core::metrics::series_window_start(now, 7),
    )
    .await
    .expect("7d series");
    assert_eq!(week.len(), 2, "8-day-old snapshot excluded");
    assert!(week[0].captured_at >= week[1].captured_at, "newest first");

    let empty = snapshots::list_snapshots_since(
        &pool,
        offer.id,
        offerwatch_core::metrics::series_window_start(now, 0),
    )
    .await
    .expect("0d series");
    assert!(empty.is_empty(), "0-day series is empty, not an error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn history_pagination_returns_stable_total(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "paged-offer"))
        .await
        .expect("create");

    // 25 snapshots, newest has count 25.
    for i in 1..=25 {
        snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, i64::from(26 - i), i))
            .await
            .expect("insert");
    }

    let page = snapshots::list_snapshots_page(&pool, offer.id, 10, 10)
        .await
        .expect("page");
    let total = snapshots::count_snapshots(&pool, offer.id)
        .await
        .expect("count");

    assert_eq!(total, 25);
    assert_eq!(page.len(), 10);
    // Newest-first ordering: offset 10 skips counts 25..16, page holds 15..6.
    assert_eq!(page[0].campaigns_count, 15);
    assert_eq!(page[9].campaigns_count, 6);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_offer_cascades_to_snapshots(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "doomed-offer"))
        .await
        .expect("create");

    for i in 0..4 {
        snapshots::insert_snapshot(&pool, &snapshot_at(offer.id, i, 1))
            .await
            .expect("insert");
    }

    let deleted = offers::delete_offer(&pool, offer.id, owner)
        .await
        .expect("delete");
    assert!(deleted);

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM offer_snapshots WHERE offer_id = $1")
            .bind(offer.id)
            .fetch_one(&pool)
            .await
            .expect("count orphans");
    assert_eq!(remaining, 0, "cascade must leave no orphan snapshots");
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_snapshot_stores_zero_counts_and_message(pool: PgPool) {
    let owner = Uuid::new_v4();
    let offer = offers::create_offer(&pool, &new_offer(owner, "failing-offer"))
        .await
        .expect("create");

    let mut failed = snapshot_at(offer.id, 0, 0);
    failed.scrape_status = "failed".to_string();
    failed.error_message = Some("navigation timeout after 30000ms".to_string());

    let row = snapshots::insert_snapshot(&pool, &failed)
        .await
        .expect("insert failed snapshot");
    assert_eq!(row.scrape_status, "failed");
    assert_eq!(row.campaigns_count, 0);
    assert_eq!(
        row.error_message.as_deref(),
        Some("navigation timeout after 30000ms")
    );
}
