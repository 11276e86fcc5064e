// src/services/bom/quantity.rs

use rust_decimal::Decimal;

use crate::models::production::BomCategory;

/// Percentuais são gravados como inteiros (15.76 = 15,76%).
pub const PERCENT_BASE: Decimal = Decimal::ONE_HUNDRED;

/// mg de nicotina por unidade da base (referência fixa de 250 mg).
pub const NICOTINE_REFERENCE_MG: Decimal = Decimal::from_parts(250, 0, 0, false, 0);

/// Embalagens e demais materiais: uma unidade por unidade produzida.
pub const UNITS_PER_OUTPUT: Decimal = Decimal::ONE;

/// Teto (exclusivo) da quantidade alvo: `work_orders.target_quantity` é NUMERIC(18, 4).
pub const MAX_TARGET_QUANTITY: Decimal = Decimal::from_parts(276_447_232, 23_283, 0, false, 0);

/// Casas decimais aceitas na quantidade alvo (mesma escala da coluna).
pub const TARGET_MAX_SCALE: u32 = 4;

/// Quantidade alvo gravável sem arredondamento: positiva, abaixo do teto
/// e com no máximo quatro casas.
pub fn is_valid_target(target: Decimal) -> bool {
    target > Decimal::ZERO
        && target < MAX_TARGET_QUANTITY
        && target.normalize().scale() <= TARGET_MAX_SCALE
}

// Sem arredondamento: a formatação fica para a exibição.
// `None` quando o resultado não cabe em um Decimal.

pub fn percentage_of(target: Decimal, percentage: Decimal) -> Option<Decimal> {
    target.checked_mul(percentage)?.checked_div(PERCENT_BASE)
}

pub fn nicotine_base(target: Decimal, nicotine_mg: Decimal) -> Option<Decimal> {
    target.checked_mul(nicotine_mg)?.checked_div(NICOTINE_REFERENCE_MG)
}

pub fn per_output_unit(target: Decimal) -> Option<Decimal> {
    target.checked_mul(UNITS_PER_OUTPUT)
}

/// Quantidade necessária conforme a regra da categoria.
///
/// `factor` é o percentual (essência), a proporção (diluentes) ou a
/// concentração em mg (nicotina); é ignorado nas demais categorias.
pub fn required_quantity(category: BomCategory, target: Decimal, factor: Decimal) -> Option<Decimal> {
    match category {
        BomCategory::Fragrance | BomCategory::DiluentA | BomCategory::DiluentB => {
            percentage_of(target, factor)
        }
        BomCategory::Nicotine => nicotine_base(target, factor),
        BomCategory::Specific | BomCategory::Common | BomCategory::Other => per_output_unit(target),
    }
}
