pub mod cache;
pub mod checkout;
pub mod inventory;
pub mod resolution;
pub mod sitemap;
pub mod stripe;
pub mod xs2;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use inventory::InventoryProxy;
pub use stripe::{PaymentProcessor, StripeClient};
pub use xs2::{InventoryApi, Xs2Client};
