pub mod ports;
pub use ports::{CatalogSource, WorkOrderStore};
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod work_order_repo;
pub use work_order_repo::WorkOrderRepository;
