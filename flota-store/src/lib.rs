pub mod app_config;
pub mod database;
pub mod dispatch_repo;
pub mod expense_repo;
pub mod registry_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use dispatch_repo::StoreDispatchRepository;
pub use expense_repo::StoreExpenseRepository;
pub use registry_repo::StoreRegistryRepository;
