pub mod dashboard;
pub mod domain;
pub mod donors;
pub mod inventory;
pub mod requests;
pub mod store;
