use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use flota_core::DispatchError;
use flota_dispatch::models::{FinishRequest, Location, NewTrip, RequestStatus, StartRequest, Trip, TripStatus};
use flota_dispatch::repository::DispatchRepository;
use flota_store::{DbClient, StoreDispatchRepository};

async fn setup() -> (TempDir, DbClient) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("flota-test.db").display());
    let db = DbClient::new(&url).await.unwrap();
    db.migrate().await.unwrap();
    (dir, db)
}

fn pending_trip(driver_id: Option<Uuid>) -> Trip {
    Trip::new(NewTrip {
        trip_number: None,
        origin: Location::new("Jalisco", "Guadalajara"),
        destination: Location::new("Nuevo Leon", "Monterrey"),
        driver_id,
        vehicle_id: None,
        scheduled_at: Utc::now(),
    })
}

/// Walks a fresh trip through request + approval so it sits en_route.
async fn trip_en_route(repo: &StoreDispatchRepository, driver_id: Uuid) -> Trip {
    let trip = pending_trip(Some(driver_id));
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver_id))
        .await
        .unwrap();
    repo.approve_start(trip.id, Uuid::new_v4()).await.unwrap();
    repo.trip_by_id(trip.id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_approve_start_moves_trip_en_route() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let trip = pending_trip(Some(driver));
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver))
        .await
        .unwrap();

    let approved = repo.approve_start(trip.id, admin).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.responder_id, Some(admin));
    assert!(approved.responded_at.is_some());

    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TripStatus::EnRoute);
    assert_eq!(stored.driver_id, Some(driver));
}

#[tokio::test]
async fn test_approve_start_claims_open_trip_for_requester() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();

    let trip = pending_trip(None);
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver))
        .await
        .unwrap();
    repo.approve_start(trip.id, Uuid::new_v4()).await.unwrap();

    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.driver_id, Some(driver));
    assert_eq!(stored.status, TripStatus::EnRoute);
}

#[tokio::test]
async fn test_approve_start_without_request_is_not_found() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());

    let missing = repo.approve_start(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(missing, Err(DispatchError::NotFound(_))));

    let trip = pending_trip(None);
    repo.insert_trip(&trip).await.unwrap();
    let no_request = repo.approve_start(trip.id, Uuid::new_v4()).await;
    assert!(matches!(no_request, Err(DispatchError::NotFound(_))));
}

#[tokio::test]
async fn test_reject_start_installs_block_and_keeps_trip_pending() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let trip = pending_trip(Some(driver));
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver))
        .await
        .unwrap();

    let denied = repo
        .reject_start(trip.id, admin, "unidad en taller", 10)
        .await
        .unwrap();
    assert_eq!(denied.status, RequestStatus::Denied);
    assert_eq!(denied.denial_reason.as_deref(), Some("unidad en taller"));
    assert_eq!(denied.block_days, Some(10));

    let expires_at = denied.block_expires_at.unwrap();
    let days_out = (expires_at - Utc::now()).num_seconds();
    assert!(days_out > 9 * 86_400 && days_out <= 10 * 86_400);

    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TripStatus::Pending);

    let latest = repo
        .latest_denied_start_request(trip.id, driver)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, denied.id);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_approvals_settle_to_one_winner() {
    let (_dir, db) = setup().await;
    let repo = Arc::new(StoreDispatchRepository::new(db.pool.clone()));
    let driver = Uuid::new_v4();

    let trip = pending_trip(Some(driver));
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver))
        .await
        .unwrap();

    let a = tokio::spawn({
        let repo = repo.clone();
        let trip_id = trip.id;
        async move { repo.approve_start(trip_id, Uuid::new_v4()).await }
    });
    let b = tokio::spawn({
        let repo = repo.clone();
        let trip_id = trip.id;
        async move { repo.approve_start(trip_id, Uuid::new_v4()).await }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one approval may win");

    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser,
        Err(DispatchError::Conflict(_)) | Err(DispatchError::NotFound(_))
    ));

    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TripStatus::EnRoute);
}

#[tokio::test]
async fn test_one_live_haul_per_driver_enforced_at_approval() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();

    trip_en_route(&repo, driver).await;

    let second = pending_trip(Some(driver));
    repo.insert_trip(&second).await.unwrap();
    repo.insert_start_request(&StartRequest::new(second.id, driver))
        .await
        .unwrap();

    let result = repo.approve_start(second.id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(DispatchError::Conflict(_))));

    let stored = repo.trip_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TripStatus::Pending, "loser trip must not move");
}

#[tokio::test]
async fn test_insert_start_request_guards_trip_state() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();

    let trip = trip_en_route(&repo, driver).await;
    let result = repo
        .insert_start_request(&StartRequest::new(trip.id, driver))
        .await;
    assert!(matches!(result, Err(DispatchError::InvalidState(_))));

    let pending = pending_trip(Some(driver));
    repo.insert_trip(&pending).await.unwrap();
    repo.insert_start_request(&StartRequest::new(pending.id, driver))
        .await
        .unwrap();
    let duplicate = repo
        .insert_start_request(&StartRequest::new(pending.id, driver))
        .await;
    assert!(matches!(duplicate, Err(DispatchError::Conflict(_))));
}

#[tokio::test]
async fn test_reject_finish_deletes_request_and_parks_reason() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let trip = trip_en_route(&repo, driver).await;
    repo.insert_finish_request(&FinishRequest::new(trip.id, driver))
        .await
        .unwrap();

    repo.reject_finish(trip.id, admin, "falta evidencia de entrega")
        .await
        .unwrap();

    assert!(repo.latest_finish_request(trip.id).await.unwrap().is_none());
    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TripStatus::EnRoute);
    assert_eq!(
        stored.finish_rejection_reason.as_deref(),
        Some("falta evidencia de entrega")
    );

    // No cooldown on this side: a fresh request goes in immediately and
    // wipes the parked reason.
    repo.insert_finish_request(&FinishRequest::new(trip.id, driver))
        .await
        .unwrap();
    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert!(stored.finish_rejection_reason.is_none());
}

#[tokio::test]
async fn test_approve_finish_completes_and_clears_reason() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let trip = trip_en_route(&repo, driver).await;
    repo.insert_finish_request(&FinishRequest::new(trip.id, driver))
        .await
        .unwrap();
    repo.reject_finish(trip.id, admin, "kilometraje sin reportar")
        .await
        .unwrap();
    repo.insert_finish_request(&FinishRequest::new(trip.id, driver))
        .await
        .unwrap();

    let approved = repo.approve_finish(trip.id, admin).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);

    let stored = repo.trip_by_id(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TripStatus::Completed);
    assert!(stored.finish_rejection_reason.is_none());

    // Nothing pending anymore, so a second decision loses.
    let again = repo.approve_finish(trip.id, admin).await;
    assert!(matches!(again, Err(DispatchError::Conflict(_))));
}

#[tokio::test]
async fn test_insert_finish_request_requires_en_route() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();

    let trip = pending_trip(Some(driver));
    repo.insert_trip(&trip).await.unwrap();

    let result = repo
        .insert_finish_request(&FinishRequest::new(trip.id, driver))
        .await;
    assert!(matches!(result, Err(DispatchError::InvalidState(_))));
}

#[tokio::test]
async fn test_cancel_trip_transitions() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());

    let trip = pending_trip(None);
    repo.insert_trip(&trip).await.unwrap();

    let cancelled = repo.cancel_trip(trip.id).await.unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);

    let again = repo.cancel_trip(trip.id).await;
    assert!(matches!(again, Err(DispatchError::InvalidState(_))));

    let missing = repo.cancel_trip(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(DispatchError::NotFound(_))));
}

#[tokio::test]
async fn test_expired_block_reads_clear() {
    let (_dir, db) = setup().await;
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let trip = pending_trip(Some(driver));
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver))
        .await
        .unwrap();
    repo.reject_start(trip.id, admin, "documentos vencidos", 1)
        .await
        .unwrap();

    // Rewind the stored expiry instead of waiting a day.
    sqlx::query("UPDATE start_requests SET block_expires_at = ? WHERE trip_id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(trip.id)
        .execute(&db.pool)
        .await
        .unwrap();

    let denied = repo
        .latest_denied_start_request(trip.id, driver)
        .await
        .unwrap();
    let state = flota_dispatch::block::evaluate(denied.as_ref(), Utc::now());
    assert_eq!(state, flota_dispatch::block::BlockState::Clear);
}
