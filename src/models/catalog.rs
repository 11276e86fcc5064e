// src/models/catalog.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Produto (catálogo mantido pelas telas de produto) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "MNT-12-30")]
    pub code: String,
    #[schema(example = "Menta Gelada 12mg 30ml")]
    pub name: String,

    // Série à qual o produto pertence (materiais comuns vêm dela)
    pub series_id: Option<Uuid>,
    #[schema(example = "Linha Clássica")]
    pub series_name: Option<String>,

    // Referência para a fórmula de essência ATUAL.
    // O id é um ponteiro direto; o código é resolvido pelo matcher.
    pub current_fragrance_id: Option<Uuid>,
    #[schema(example = "ESS-MNT-01")]
    pub current_fragrance_code: Option<String>,

    // mg por unidade de referência (250)
    #[schema(example = 12.0)]
    pub nicotine_mg: Decimal,

    // Referências livres: podem conter nome, código ou id do material
    #[schema(example = json!(["Frasco 30ml", "TMP-GOTA"]))]
    pub specific_materials: Vec<String>,
    #[schema(example = json!(["Caixa Linha Clássica"]))]
    pub common_materials: Vec<String>,
}

// --- 2. Fórmula de Essência ---
// Percentual e proporções são gravados como percentuais inteiros (ex: 15.76)
// e devem ser usados exatamente como estão.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FragranceFormula {
    pub id: Uuid,
    #[schema(example = "ESS-MNT-01")]
    pub code: String,
    #[schema(example = "Menta")]
    pub name: String,
    #[schema(example = 15.76)]
    pub percentage: Option<Decimal>,
    #[schema(example = 44.2)]
    pub pg_ratio: Option<Decimal>,
    #[schema(example = 40.0)]
    pub vg_ratio: Option<Decimal>,
    pub current_stock: Decimal,
}

// --- 3. Material (item de estoque sem fórmula) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    #[schema(example = "FR-30")]
    pub code: String,
    #[schema(example = "Frasco 30ml")]
    pub name: String,
    #[schema(example = "un")]
    pub unit: String,
    pub current_stock: Decimal,
}
