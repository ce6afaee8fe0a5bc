// Crate root library declaration and module exports.
pub mod agenda;
pub mod binder;
pub mod config;
pub mod context;
pub mod controller;
pub mod logging;
pub mod model;
pub mod notify;
pub mod storage;
pub mod store;

pub use controller::PlannerController;
