// src/services/bom.rs
//
// Motor da lista de materiais (BOM) da ordem de produção.
//
// produto -> fórmula -> matcher (por ingrediente) -> quantidade
//         -> estoque -> montagem (dedup + ordenação)
//
// Tudo aqui é síncrono e puro sobre os catálogos já carregados; a única
// etapa assíncrona é `CatalogIndex::load`.

pub mod assembler;
pub mod catalog_index;
pub mod formula;
pub mod matcher;
pub mod quantity;
pub mod stock;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    catalog::{Material, Product},
    production::{BomCategory, BomReport, BomWarning, ProductSnapshot},
};

pub use catalog_index::CatalogIndex;
use formula::ResolvedFormula;
use matcher::MATERIAL_CHAIN;
use stock::Requirement;

#[derive(Debug, Error)]
pub enum BomError {
    #[error("Produto {product_code} sem fórmula de essência válida")]
    MissingFormula { product_code: String },

    #[error("Produto {0} não encontrado no catálogo")]
    ProductNotFound(Uuid),

    #[error("Quantidade alvo inválida: {0}")]
    InvalidTargetQuantity(Decimal),

    #[error("Quantidade de {code} fora do intervalo representável")]
    QuantityOverflow { code: String },
}

/// Como localizar os materiais do líquido base no catálogo de materiais.
/// As referências passam pela mesma cadeia dos materiais genéricos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomSettings {
    pub diluent_a_ref: String,
    pub diluent_b_ref: String,
    pub nicotine_ref: String,
    // Unidade da essência (a fórmula não tem unidade própria)
    pub liquid_unit: String,
}

impl Default for BomSettings {
    fn default() -> Self {
        Self {
            diluent_a_ref: "PG".to_string(),
            diluent_b_ref: "VG".to_string(),
            nicotine_ref: "NIC-BASE".to_string(),
            liquid_unit: "g".to_string(),
        }
    }
}

/// Calcula a lista de materiais para produzir `target_quantity` do produto.
///
/// Só a fórmula ausente interrompe o cálculo. Ingredientes não resolvidos
/// são omitidos e estoque insuficiente é apenas sinalizado; ambos aparecem
/// em `warnings`.
pub fn compute_bom(
    product: &Product,
    target_quantity: Decimal,
    catalogs: &CatalogIndex,
    settings: &BomSettings,
) -> Result<BomReport, BomError> {
    if !quantity::is_valid_target(target_quantity) {
        return Err(BomError::InvalidTargetQuantity(target_quantity));
    }

    let formula = formula::resolve_formula(product, catalogs)?;

    let mut warnings = Vec::new();
    let mut requirements = core_requirements(&formula, target_quantity, catalogs, settings, &mut warnings)?;

    let packaging = [
        (BomCategory::Specific, &product.specific_materials),
        (BomCategory::Common, &product.common_materials),
    ];
    for (category, references) in packaging {
        for reference in references.iter() {
            if let Some(material) = resolve_material(catalogs, category, reference, &mut warnings) {
                requirements.push(material_requirement(material, category, Decimal::ZERO, target_quantity, Decimal::ZERO)?);
            }
        }
    }

    let entries = assembler::assemble(requirements.into_iter().map(stock::evaluate).collect());
    warnings.extend(stock::shortages(&entries));

    Ok(BomReport {
        product_id: product.id,
        target_quantity,
        entries,
        warnings,
    })
}

// Essência, diluentes e nicotina (o "líquido base").
fn core_requirements(
    formula: &ResolvedFormula<'_>,
    target: Decimal,
    catalogs: &CatalogIndex,
    settings: &BomSettings,
    warnings: &mut Vec<BomWarning>,
) -> Result<Vec<Requirement>, BomError> {
    let fragrance = formula.fragrance;
    let quantity = quantity::required_quantity(BomCategory::Fragrance, target, formula.percentage)
        .ok_or_else(|| BomError::QuantityOverflow { code: fragrance.code.clone() })?;
    let mut requirements = vec![Requirement {
        id: fragrance.id,
        code: fragrance.code.clone(),
        name: fragrance.name.clone(),
        category: BomCategory::Fragrance,
        ratio: formula.percentage,
        quantity,
        current_stock: fragrance.current_stock,
        unit: settings.liquid_unit.clone(),
    }];

    let core = [
        (BomCategory::DiluentA, &settings.diluent_a_ref, formula.diluent_a_ratio, formula.diluent_a_ratio),
        (BomCategory::DiluentB, &settings.diluent_b_ref, formula.diluent_b_ratio, formula.diluent_b_ratio),
        // nicotina não é percentual: ratio 0, fator = mg
        (BomCategory::Nicotine, &settings.nicotine_ref, Decimal::ZERO, formula.nicotine_mg),
    ];

    for (category, reference, ratio, factor) in core {
        // proporção/concentração zero: nada a consumir
        if factor <= Decimal::ZERO {
            continue;
        }
        if let Some(material) = resolve_material(catalogs, category, reference, warnings) {
            requirements.push(material_requirement(material, category, ratio, target, factor)?);
        }
    }

    Ok(requirements)
}

fn resolve_material<'c>(
    catalogs: &'c CatalogIndex,
    category: BomCategory,
    reference: &str,
    warnings: &mut Vec<BomWarning>,
) -> Option<&'c Material> {
    match matcher::resolve(catalogs.materials(), MATERIAL_CHAIN, reference) {
        Some(hit) => {
            tracing::debug!(%category, reference, code = %hit.record.code, strategy = hit.strategy, "Material resolvido");
            Some(hit.record)
        }
        None => {
            tracing::warn!(%category, reference, "Ingrediente não encontrado no catálogo; omitido da lista");
            warnings.push(BomWarning::UnresolvedIngredient {
                category,
                reference: reference.to_string(),
            });
            None
        }
    }
}

fn material_requirement(
    material: &Material,
    category: BomCategory,
    ratio: Decimal,
    target: Decimal,
    factor: Decimal,
) -> Result<Requirement, BomError> {
    let quantity = quantity::required_quantity(category, target, factor)
        .ok_or_else(|| BomError::QuantityOverflow { code: material.code.clone() })?;

    Ok(Requirement {
        id: material.id,
        code: material.code.clone(),
        name: material.name.clone(),
        category,
        ratio,
        quantity,
        current_stock: material.current_stock,
        unit: material.unit.clone(),
    })
}

/// Foto do produto no momento da criação da ordem.
pub fn product_snapshot(product: &Product, catalogs: &CatalogIndex) -> Result<ProductSnapshot, BomError> {
    let formula = formula::resolve_formula(product, catalogs)?;

    Ok(ProductSnapshot {
        product_id: product.id,
        code: product.code.clone(),
        name: product.name.clone(),
        series_name: product.series_name.clone(),
        fragrance_code: formula.fragrance.code.clone(),
        fragrance_name: formula.fragrance.name.clone(),
        nicotine_mg: product.nicotine_mg,
    })
}
