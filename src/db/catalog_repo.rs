// src/db/catalog_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::ports::CatalogSource,
    models::catalog::{FragranceFormula, Material, Product},
};

// Leitura dos catálogos. Este serviço nunca escreve nessas tabelas.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for CatalogRepository {
    async fn load_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, code, name, series_id, series_name,
                current_fragrance_id, current_fragrance_code,
                nicotine_mg, specific_materials, common_materials
            FROM products
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn load_fragrances(&self) -> Result<Vec<FragranceFormula>, AppError> {
        let fragrances = sqlx::query_as::<_, FragranceFormula>(
            r#"
            SELECT id, code, name, percentage, pg_ratio, vg_ratio, current_stock
            FROM fragrances
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(fragrances)
    }

    async fn load_materials(&self) -> Result<Vec<Material>, AppError> {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, code, name, unit, current_stock
            FROM materials
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }
}
