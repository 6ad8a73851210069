pub mod categories;
pub mod clients;
pub mod common;
pub mod health;
pub mod orders;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        categories::CategoryService, clients::ClientService, dashboard::DashboardService,
        orders::OrderService, photos::PhotoStorage,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub dashboard: Arc<DashboardService>,
    pub clients: Arc<ClientService>,
    pub categories: Arc<CategoryService>,
    pub photos: Arc<PhotoStorage>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool.clone())),
            clients: Arc::new(ClientService::new(db_pool.clone())),
            categories: Arc::new(CategoryService::new(db_pool)),
            photos: Arc::new(PhotoStorage::new(config.upload_path())),
        }
    }
}
