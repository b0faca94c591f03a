use std::sync::Arc;

use uuid::Uuid;

use flota_core::{CallerContext, DispatchError, DispatchResult, Masked};

use crate::models::{Driver, NewDriver, NewVehicle, Vehicle};
use crate::repository::RegistryRepository;

pub struct RegistryService {
    repo: Arc<dyn RegistryRepository>,
}

impl RegistryService {
    pub fn new(repo: Arc<dyn RegistryRepository>) -> Self {
        Self { repo }
    }

    pub async fn register_driver(
        &self,
        caller: &CallerContext,
        params: NewDriver,
    ) -> DispatchResult<Driver> {
        caller.require_admin()?;
        require_field("name", &params.name)?;
        require_field("license_number", &params.license_number)?;
        let driver = Driver::new(params);
        self.repo.insert_driver(&driver).await?;
        tracing::info!(
            driver_id = %driver.id,
            license = %Masked(&driver.license_number),
            "driver registered"
        );
        Ok(driver)
    }

    pub async fn get_driver(&self, driver_id: Uuid) -> DispatchResult<Driver> {
        self.repo
            .driver_by_id(driver_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el transportista no existe"))
    }

    pub async fn list_drivers(&self, only_active: bool) -> DispatchResult<Vec<Driver>> {
        self.repo.list_drivers(only_active).await
    }

    pub async fn deactivate_driver(
        &self,
        caller: &CallerContext,
        driver_id: Uuid,
    ) -> DispatchResult<Driver> {
        caller.require_admin()?;
        let driver = self.repo.deactivate_driver(driver_id).await?;
        tracing::info!(driver_id = %driver_id, "driver deactivated");
        Ok(driver)
    }

    pub async fn register_vehicle(
        &self,
        caller: &CallerContext,
        params: NewVehicle,
    ) -> DispatchResult<Vehicle> {
        caller.require_admin()?;
        require_field("plate", &params.plate)?;
        require_field("make", &params.make)?;
        require_field("model", &params.model)?;
        if !(1950..=2100).contains(&params.year) {
            return Err(DispatchError::InvalidInput(
                "year fuera de rango".into(),
            ));
        }
        let vehicle = Vehicle::new(params);
        self.repo.insert_vehicle(&vehicle).await?;
        tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "vehicle registered");
        Ok(vehicle)
    }

    pub async fn get_vehicle(&self, vehicle_id: Uuid) -> DispatchResult<Vehicle> {
        self.repo
            .vehicle_by_id(vehicle_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el vehiculo no existe"))
    }

    pub async fn list_vehicles(&self, only_active: bool) -> DispatchResult<Vec<Vehicle>> {
        self.repo.list_vehicles(only_active).await
    }

    pub async fn deactivate_vehicle(
        &self,
        caller: &CallerContext,
        vehicle_id: Uuid,
    ) -> DispatchResult<Vehicle> {
        caller.require_admin()?;
        let vehicle = self.repo.deactivate_vehicle(vehicle_id).await?;
        tracing::info!(vehicle_id = %vehicle_id, "vehicle deactivated");
        Ok(vehicle)
    }
}

fn require_field(field: &str, value: &str) -> DispatchResult<()> {
    if value.trim().is_empty() {
        return Err(DispatchError::InvalidInput(format!(
            "{} es obligatorio",
            field
        )));
    }
    Ok(())
}
