pub mod models;
pub mod repository;
pub mod service;

pub use models::{Driver, NewDriver, NewVehicle, Vehicle};
pub use repository::RegistryRepository;
pub use service::RegistryService;
