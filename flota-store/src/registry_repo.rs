use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use flota_core::{DispatchError, DispatchResult};
use flota_registry::models::{Driver, Vehicle};
use flota_registry::repository::RegistryRepository;

const DRIVER_COLUMNS: &str = "id, name, license_number, phone, active, created_at";
const VEHICLE_COLUMNS: &str = "id, plate, make, model, year, active, created_at";

pub struct StoreRegistryRepository {
    pool: Pool<Sqlite>,
}

impl StoreRegistryRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn unique_to_conflict(err: sqlx::Error, message: &str) -> DispatchError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DispatchError::conflict(message),
        _ => DispatchError::storage(err),
    }
}

#[async_trait]
impl RegistryRepository for StoreRegistryRepository {
    async fn insert_driver(&self, driver: &Driver) -> DispatchResult<()> {
        sqlx::query(
            "INSERT INTO drivers (id, name, license_number, phone, active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(&driver.license_number)
        .bind(driver.phone.as_deref())
        .bind(driver.active)
        .bind(driver.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "el numero de licencia ya esta registrado"))?;
        Ok(())
    }

    async fn driver_by_id(&self, driver_id: Uuid) -> DispatchResult<Option<Driver>> {
        let sql = format!("SELECT {} FROM drivers WHERE id = ?", DRIVER_COLUMNS);
        sqlx::query_as::<_, Driver>(&sql)
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn list_drivers(&self, only_active: bool) -> DispatchResult<Vec<Driver>> {
        let sql = if only_active {
            format!(
                "SELECT {} FROM drivers WHERE active = 1 ORDER BY name",
                DRIVER_COLUMNS
            )
        } else {
            format!("SELECT {} FROM drivers ORDER BY name", DRIVER_COLUMNS)
        };
        sqlx::query_as::<_, Driver>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn deactivate_driver(&self, driver_id: Uuid) -> DispatchResult<Driver> {
        let result = sqlx::query("UPDATE drivers SET active = 0 WHERE id = ?")
            .bind(driver_id)
            .execute(&self.pool)
            .await
            .map_err(DispatchError::storage)?;
        if result.rows_affected() == 0 {
            return Err(DispatchError::not_found("el transportista no existe"));
        }
        self.driver_by_id(driver_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el transportista no existe"))
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> DispatchResult<()> {
        sqlx::query(
            "INSERT INTO vehicles (id, plate, make, model, year, active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(vehicle.id)
        .bind(&vehicle.plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.active)
        .bind(vehicle.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "la placa ya esta registrada"))?;
        Ok(())
    }

    async fn vehicle_by_id(&self, vehicle_id: Uuid) -> DispatchResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles WHERE id = ?", VEHICLE_COLUMNS);
        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn list_vehicles(&self, only_active: bool) -> DispatchResult<Vec<Vehicle>> {
        let sql = if only_active {
            format!(
                "SELECT {} FROM vehicles WHERE active = 1 ORDER BY plate",
                VEHICLE_COLUMNS
            )
        } else {
            format!("SELECT {} FROM vehicles ORDER BY plate", VEHICLE_COLUMNS)
        };
        sqlx::query_as::<_, Vehicle>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn deactivate_vehicle(&self, vehicle_id: Uuid) -> DispatchResult<Vehicle> {
        let result = sqlx::query("UPDATE vehicles SET active = 0 WHERE id = ?")
            .bind(vehicle_id)
            .execute(&self.pool)
            .await
            .map_err(DispatchError::storage)?;
        if result.rows_affected() == 0 {
            return Err(DispatchError::not_found("el vehiculo no existe"));
        }
        self.vehicle_by_id(vehicle_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el vehiculo no existe"))
    }
}
