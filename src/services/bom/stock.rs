// src/services/bom/stock.rs

use rust_decimal::Decimal;

use crate::models::production::{BomCategory, BomEntry, BomWarning};

/// Necessidade já calculada, ainda sem a verificação de estoque.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub id: uuid::Uuid,
    pub code: String,
    pub name: String,
    pub category: BomCategory,
    pub ratio: Decimal,
    pub quantity: Decimal,
    pub current_stock: Decimal,
    pub unit: String,
}

/// Estoque igual à necessidade é suficiente.
pub fn is_sufficient(current_stock: Decimal, required: Decimal) -> bool {
    current_stock >= required
}

pub fn evaluate(requirement: Requirement) -> BomEntry {
    let sufficient = is_sufficient(requirement.current_stock, requirement.quantity);

    BomEntry {
        id: requirement.id,
        code: requirement.code,
        name: requirement.name,
        category: requirement.category,
        ratio: requirement.ratio,
        required_quantity: requirement.quantity,
        current_stock: requirement.current_stock,
        unit: requirement.unit,
        sufficient,
    }
}

/// Avisos de estoque insuficiente. Não bloqueiam a criação da ordem:
/// quem chama decide como mostrar ao usuário antes da confirmação.
pub fn shortages(entries: &[BomEntry]) -> Vec<BomWarning> {
    entries
        .iter()
        .filter(|entry| !entry.sufficient)
        .map(|entry| {
            tracing::warn!(
                code = %entry.code,
                required = %entry.required_quantity,
                stock = %entry.current_stock,
                "Estoque insuficiente"
            );
            BomWarning::InsufficientStock {
                id: entry.id,
                code: entry.code.clone(),
                name: entry.name.clone(),
                required: entry.required_quantity,
                stock: entry.current_stock,
                shortfall: entry.required_quantity - entry.current_stock,
            }
        })
        .collect()
}
