// src/models/production.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

/// Categoria de uma linha da lista de materiais.
///
/// `priority` define a ordem de exibição e do snapshot gravado na ordem de
/// produção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BomCategory {
    #[serde(rename = "fragrance")]
    Fragrance,
    #[serde(rename = "diluent-A")]
    DiluentA,
    #[serde(rename = "diluent-B")]
    DiluentB,
    #[serde(rename = "nicotine")]
    Nicotine,
    #[serde(rename = "specific")]
    Specific,
    #[serde(rename = "common")]
    Common,
    #[serde(rename = "other")]
    Other,
}

impl BomCategory {
    pub fn priority(self) -> u8 {
        match self {
            BomCategory::Fragrance => 0,
            BomCategory::DiluentA => 1,
            BomCategory::DiluentB => 2,
            BomCategory::Nicotine => 3,
            BomCategory::Specific => 4,
            BomCategory::Common => 5,
            BomCategory::Other => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BomCategory::Fragrance => "fragrance",
            BomCategory::DiluentA => "diluent-A",
            BomCategory::DiluentB => "diluent-B",
            BomCategory::Nicotine => "nicotine",
            BomCategory::Specific => "specific",
            BomCategory::Common => "common",
            BomCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for BomCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Lista de Materiais (transitória) ---

// Recalculada do zero a cada mudança de produto ou quantidade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BomEntry {
    pub id: Uuid,
    #[schema(example = "ESS-MNT-01")]
    pub code: String,
    #[schema(example = "Menta")]
    pub name: String,
    pub category: BomCategory,
    // 0 para categorias que não são percentuais
    #[schema(example = 15.76)]
    pub ratio: Decimal,
    #[schema(example = 157.6)]
    pub required_quantity: Decimal,
    pub current_stock: Decimal,
    #[schema(example = "g")]
    pub unit: String,
    pub sufficient: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BomWarning {
    #[serde(rename_all = "camelCase")]
    UnresolvedIngredient {
        category: BomCategory,
        reference: String,
    },
    #[serde(rename_all = "camelCase")]
    InsufficientStock {
        id: Uuid,
        code: String,
        name: String,
        required: Decimal,
        stock: Decimal,
        shortfall: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BomReport {
    pub product_id: Uuid,
    #[schema(example = 1000.0)]
    pub target_quantity: Decimal,
    pub entries: Vec<BomEntry>,
    pub warnings: Vec<BomWarning>,
}

impl BomReport {
    pub fn has_shortages(&self) -> bool {
        self.entries.iter().any(|entry| !entry.sufficient)
    }
}

// --- Ordem de Produção (gravada na confirmação) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    #[schema(example = "MNT-12-30")]
    pub code: String,
    #[schema(example = "Menta Gelada 12mg 30ml")]
    pub name: String,
    pub series_name: Option<String>,
    #[schema(example = "ESS-MNT-01")]
    pub fragrance_code: String,
    #[schema(example = "Menta")]
    pub fragrance_name: String,
    #[schema(example = 12.0)]
    pub nicotine_mg: Decimal,
}

// Linha imutável do snapshot. `usedQuantity` nasce zerado; o consumo real
// é registrado por outro sistema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderLine {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub category: BomCategory,
    pub quantity: Decimal,
    pub unit: String,
    pub ratio: Decimal,
    pub used_quantity: Decimal,
}

impl From<&BomEntry> for WorkOrderLine {
    fn from(entry: &BomEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            code: entry.code.clone(),
            category: entry.category,
            quantity: entry.required_quantity,
            unit: entry.unit.clone(),
            ratio: entry.ratio,
            used_quantity: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    #[schema(example = "WO-20250314-00042")]
    pub code: String,
    pub product_id: Uuid,
    pub product_snapshot: ProductSnapshot,
    #[schema(example = 1000.0)]
    pub target_quantity: Decimal,
    pub bom: Vec<WorkOrderLine>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Dados para o INSERT (sem id/created_at, gerados pelo banco)
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkOrder {
    pub code: String,
    pub product_id: Uuid,
    pub product_snapshot: ProductSnapshot,
    pub target_quantity: Decimal,
    pub bom: Vec<WorkOrderLine>,
    pub notes: Option<String>,
}

// Resposta da criação: a ordem gravada + os avisos que o usuário confirmou
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderCreated {
    pub work_order: WorkOrder,
    pub warnings: Vec<BomWarning>,
}

// --- Sessão de criação (o "diálogo" de nova ordem) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: Uuid,
    pub status: SessionStatus,
    pub opened_at: DateTime<Utc>,
    pub products: usize,
    pub fragrances: usize,
    pub materials: usize,
    pub error: Option<String>,
}
