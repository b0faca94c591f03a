use std::sync::Arc;

use flota_dispatch::DispatchService;
use flota_gastos::ExpenseService;
use flota_registry::RegistryService;
use flota_store::{DbClient, StoreDispatchRepository, StoreExpenseRepository, StoreRegistryRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub dispatch: Arc<DispatchService>,
    pub registry: Arc<RegistryService>,
    pub expenses: Arc<ExpenseService>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(db: DbClient, auth: AuthConfig, default_block_days: i64) -> Self {
        let pool = db.pool.clone();
        let dispatch_repo = Arc::new(StoreDispatchRepository::new(pool.clone()));
        let registry_repo = Arc::new(StoreRegistryRepository::new(pool.clone()));
        let expense_repo = Arc::new(StoreExpenseRepository::new(pool));

        Self {
            db: Arc::new(db),
            dispatch: Arc::new(DispatchService::new(dispatch_repo, default_block_days)),
            registry: Arc::new(RegistryService::new(registry_repo)),
            expenses: Arc::new(ExpenseService::new(expense_repo)),
            auth,
        }
    }
}
