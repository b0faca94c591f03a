use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use flota_core::DispatchError;
use flota_dispatch::models::{Location, NewTrip, StartRequest, Trip};
use flota_dispatch::repository::DispatchRepository;
use flota_gastos::models::{Expense, ExpenseCategory, ExpenseStatus, NewExpense};
use flota_gastos::repository::{ExpenseFilter, ExpenseRepository};
use flota_store::{DbClient, StoreDispatchRepository, StoreExpenseRepository};

async fn setup() -> (TempDir, DbClient) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("flota-test.db").display());
    let db = DbClient::new(&url).await.unwrap();
    db.migrate().await.unwrap();
    (dir, db)
}

async fn trip_en_route(db: &DbClient, driver_id: Uuid) -> Trip {
    let repo = StoreDispatchRepository::new(db.pool.clone());
    let trip = Trip::new(NewTrip {
        trip_number: None,
        origin: Location::new("Sonora", "Hermosillo"),
        destination: Location::new("Baja California", "Tijuana"),
        driver_id: Some(driver_id),
        vehicle_id: None,
        scheduled_at: Utc::now(),
    });
    repo.insert_trip(&trip).await.unwrap();
    repo.insert_start_request(&StartRequest::new(trip.id, driver_id))
        .await
        .unwrap();
    repo.approve_start(trip.id, Uuid::new_v4()).await.unwrap();
    repo.trip_by_id(trip.id).await.unwrap().unwrap()
}

fn fuel_expense(trip_id: Uuid, driver_id: Uuid, amount_cents: i64) -> Expense {
    Expense::new(
        NewExpense {
            trip_id,
            category: ExpenseCategory::Fuel,
            amount_cents,
            description: Some("diesel".into()),
        },
        driver_id,
    )
}

#[tokio::test]
async fn test_insert_expense_guards_trip_and_driver() {
    let (_dir, db) = setup().await;
    let repo = StoreExpenseRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();

    let missing = repo
        .insert_expense(&fuel_expense(Uuid::new_v4(), driver, 1000))
        .await;
    assert!(matches!(missing, Err(DispatchError::NotFound(_))));

    let dispatch = StoreDispatchRepository::new(db.pool.clone());
    let pending = Trip::new(NewTrip {
        trip_number: None,
        origin: Location::new("Jalisco", "Guadalajara"),
        destination: Location::new("Colima", "Manzanillo"),
        driver_id: Some(driver),
        vehicle_id: None,
        scheduled_at: Utc::now(),
    });
    dispatch.insert_trip(&pending).await.unwrap();
    let too_early = repo.insert_expense(&fuel_expense(pending.id, driver, 1000)).await;
    assert!(matches!(too_early, Err(DispatchError::InvalidState(_))));

    let trip = trip_en_route(&db, driver).await;
    let stranger = repo
        .insert_expense(&fuel_expense(trip.id, Uuid::new_v4(), 1000))
        .await;
    assert!(matches!(stranger, Err(DispatchError::Forbidden(_))));

    repo.insert_expense(&fuel_expense(trip.id, driver, 1000))
        .await
        .unwrap();

    dispatch.cancel_trip(pending.id).await.unwrap();
    let cancelled = repo.insert_expense(&fuel_expense(pending.id, driver, 1000)).await;
    assert!(matches!(cancelled, Err(DispatchError::InvalidState(_))));
}

#[tokio::test]
async fn test_expense_decisions_and_totals() {
    let (_dir, db) = setup().await;
    let repo = StoreExpenseRepository::new(db.pool.clone());
    let driver = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let trip = trip_en_route(&db, driver).await;

    let fuel = fuel_expense(trip.id, driver, 180_000);
    let tolls = Expense::new(
        NewExpense {
            trip_id: trip.id,
            category: ExpenseCategory::Tolls,
            amount_cents: 45_000,
            description: None,
        },
        driver,
    );
    let lodging = Expense::new(
        NewExpense {
            trip_id: trip.id,
            category: ExpenseCategory::Lodging,
            amount_cents: 90_000,
            description: Some("hotel en Culiacan".into()),
        },
        driver,
    );
    repo.insert_expense(&fuel).await.unwrap();
    repo.insert_expense(&tolls).await.unwrap();
    repo.insert_expense(&lodging).await.unwrap();

    let approved = repo.approve_expense(fuel.id, admin).await.unwrap();
    assert_eq!(approved.status, ExpenseStatus::Approved);
    assert_eq!(approved.responder_id, Some(admin));

    let rejected = repo
        .reject_expense(tolls.id, admin, "ticket ilegible")
        .await
        .unwrap();
    assert_eq!(rejected.status, ExpenseStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("ticket ilegible"));

    // Answered expenses cannot be re-answered.
    let again = repo.approve_expense(fuel.id, admin).await;
    assert!(matches!(again, Err(DispatchError::Conflict(_))));

    let totals = repo.totals_for_trip(trip.id).await.unwrap();
    assert_eq!(totals.count, 3);
    assert_eq!(totals.total_cents, 315_000);
    assert_eq!(totals.approved_cents, 180_000);
    assert_eq!(totals.pending_cents, 90_000);
    assert_eq!(totals.rejected_cents, 45_000);

    let only_pending = repo
        .list_expenses(&ExpenseFilter {
            trip_id: Some(trip.id),
            status: Some(ExpenseStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_pending.len(), 1);
    assert_eq!(only_pending[0].id, lodging.id);
}
