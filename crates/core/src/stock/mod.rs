//! Medication stock levels and alerting.

mod stock_model;
mod stock_service;
mod stock_traits;

pub use stock_model::*;
pub use stock_service::*;
pub use stock_traits::*;
