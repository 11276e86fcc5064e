pub mod bom;
pub mod production_service;
pub mod session_store;
