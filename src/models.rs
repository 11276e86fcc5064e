pub mod catalog;
pub mod production;
