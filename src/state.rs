use std::sync::Arc;

use crate::config::Config;
use crate::services::{CheckoutService, InventoryProxy};
use crate::store::{CatalogStore, OrderStore};

/// Everything a handler needs, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub inventory: Arc<InventoryProxy>,
    pub checkout: Arc<CheckoutService>,
}
