// src/db/ports.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{FragranceFormula, Material, Product},
        production::{NewWorkOrder, WorkOrder},
    },
};

/// Catálogos somente leitura (produtos, essências, materiais).
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_products(&self) -> Result<Vec<Product>, AppError>;

    async fn load_fragrances(&self) -> Result<Vec<FragranceFormula>, AppError>;

    async fn load_materials(&self) -> Result<Vec<Material>, AppError>;
}

/// Gravação e leitura das ordens de produção.
///
/// A gravação é um único INSERT: não há estado parcial em caso de falha.
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    /// Próximo número da sequência usada no código legível (WO-...).
    async fn next_code_sequence(&self) -> Result<i64, AppError>;

    async fn insert_work_order(&self, order: &NewWorkOrder) -> Result<WorkOrder, AppError>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<WorkOrder>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError>;
}
