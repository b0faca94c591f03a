use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Driver, Vehicle};
use flota_core::DispatchResult;

/// Persistence contract for the driver and vehicle rosters.
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    async fn insert_driver(&self, driver: &Driver) -> DispatchResult<()>;

    async fn driver_by_id(&self, driver_id: Uuid) -> DispatchResult<Option<Driver>>;

    async fn list_drivers(&self, only_active: bool) -> DispatchResult<Vec<Driver>>;

    /// Soft removal; the roster keeps the record for history.
    async fn deactivate_driver(&self, driver_id: Uuid) -> DispatchResult<Driver>;

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> DispatchResult<()>;

    async fn vehicle_by_id(&self, vehicle_id: Uuid) -> DispatchResult<Option<Vehicle>>;

    async fn list_vehicles(&self, only_active: bool) -> DispatchResult<Vec<Vehicle>>;

    async fn deactivate_vehicle(&self, vehicle_id: Uuid) -> DispatchResult<Vehicle>;
}
