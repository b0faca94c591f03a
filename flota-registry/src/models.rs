use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A driver on the company roster. The id doubles as the identity the
/// dispatch workflow sees in its caller context.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub license_number: String,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    pub name: String,
    pub license_number: String,
    pub phone: Option<String>,
}

impl Driver {
    pub fn new(params: NewDriver) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: params.name.trim().to_string(),
            license_number: params.license_number.trim().to_uppercase(),
            phone: params.phone.map(|p| p.trim().to_string()),
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// A unit in the fleet.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub plate: String,
    pub make: String,
    pub model: String,
    pub year: i64,
}

impl Vehicle {
    pub fn new(params: NewVehicle) -> Self {
        Self {
            id: Uuid::new_v4(),
            plate: params.plate.trim().to_uppercase(),
            make: params.make.trim().to_string(),
            model: params.model.trim().to_string(),
            year: params.year,
            active: true,
            created_at: Utc::now(),
        }
    }
}
