// src/services/bom/formula.rs

use rust_decimal::Decimal;

use crate::models::catalog::{FragranceFormula, Product};
use crate::services::bom::{
    catalog_index::CatalogIndex,
    matcher::{self, FRAGRANCE_CHAIN},
    BomError,
};

/// Fórmula vigente do produto, com os valores exatamente como gravados.
#[derive(Debug, Clone)]
pub struct ResolvedFormula<'c> {
    pub fragrance: &'c FragranceFormula,
    pub percentage: Decimal,
    pub diluent_a_ratio: Decimal,
    pub diluent_b_ratio: Decimal,
    pub nicotine_mg: Decimal,
}

/// Segue as referências do produto até a fórmula de essência atual.
///
/// Primeiro o ponteiro direto (`current_fragrance_id`); se ele não existir
/// ou não estiver no catálogo, o código passa pela cadeia de essências.
/// Percentual ausente ou <= 0 é a única parada obrigatória do cálculo.
pub fn resolve_formula<'c>(
    product: &Product,
    catalogs: &'c CatalogIndex,
) -> Result<ResolvedFormula<'c>, BomError> {
    let missing = || BomError::MissingFormula {
        product_code: product.code.clone(),
    };

    let by_id = product
        .current_fragrance_id
        .and_then(|id| catalogs.fragrances().get(id));

    let fragrance = match by_id {
        Some(fragrance) => fragrance,
        None => {
            let code = product.current_fragrance_code.as_deref().unwrap_or_default();
            let hit = matcher::resolve(catalogs.fragrances(), FRAGRANCE_CHAIN, code).ok_or_else(missing)?;
            tracing::debug!(
                product = %product.code,
                fragrance = %hit.record.code,
                strategy = hit.strategy,
                "Essência resolvida pelo código"
            );
            hit.record
        }
    };

    let percentage = fragrance
        .percentage
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(missing)?;

    Ok(ResolvedFormula {
        fragrance,
        percentage,
        diluent_a_ratio: fragrance.pg_ratio.unwrap_or(Decimal::ZERO),
        diluent_b_ratio: fragrance.vg_ratio.unwrap_or(Decimal::ZERO),
        nicotine_mg: product.nicotine_mg.max(Decimal::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bom::test_support::{d, fragrance, product};

    #[test]
    fn direct_reference_takes_precedence_over_code() {
        let by_id = fragrance("ESS-A", "A", Some("15.76"), Some("44.2"), Some("40"), "0");
        let by_code = fragrance("ESS-B", "B", Some("10"), Some("50"), Some("40"), "0");
        let mut p = product("P-1", "ESS-B", "12");
        p.current_fragrance_id = Some(by_id.id);
        let catalogs = CatalogIndex::new(vec![], vec![by_id, by_code], vec![]);

        let formula = resolve_formula(&p, &catalogs).expect("formula");

        assert_eq!(formula.fragrance.code, "ESS-A");
        assert_eq!(formula.percentage, d("15.76"));
        assert_eq!(formula.diluent_a_ratio, d("44.2"));
        assert_eq!(formula.diluent_b_ratio, d("40"));
        assert_eq!(formula.nicotine_mg, d("12"));
    }

    #[test]
    fn dangling_id_falls_back_to_code() {
        let f = fragrance("ESS-B", "B", Some("10"), None, None, "0");
        let mut p = product("P-1", "ESS-B", "0");
        p.current_fragrance_id = Some(uuid::Uuid::new_v4());
        let catalogs = CatalogIndex::new(vec![], vec![f], vec![]);

        let formula = resolve_formula(&p, &catalogs).expect("formula");
        assert_eq!(formula.fragrance.code, "ESS-B");
        assert_eq!(formula.diluent_a_ratio, Decimal::ZERO);
    }

    #[test]
    fn missing_reference_is_fatal() {
        let mut p = product("P-1", "", "0");
        p.current_fragrance_code = None;
        let catalogs = CatalogIndex::new(vec![], vec![fragrance("ESS-B", "B", Some("10"), None, None, "0")], vec![]);

        let err = resolve_formula(&p, &catalogs).unwrap_err();
        assert!(matches!(err, BomError::MissingFormula { ref product_code } if product_code == "P-1"));
    }

    #[test]
    fn zero_or_absent_percentage_is_fatal() {
        for pct in [Some("0"), None, Some("-1")] {
            let f = fragrance("ESS-B", "B", pct, Some("50"), Some("50"), "0");
            let catalogs = CatalogIndex::new(vec![], vec![f], vec![]);

            let result = resolve_formula(&product("P-1", "ESS-B", "0"), &catalogs);
            assert!(matches!(result, Err(BomError::MissingFormula { .. })), "pct = {:?}", pct);
        }
    }

    #[test]
    fn percentage_is_used_verbatim() {
        let f = fragrance("ESS-B", "B", Some("15.7600"), Some("44.2"), Some("40"), "0");
        let catalogs = CatalogIndex::new(vec![], vec![f], vec![]);

        let formula = resolve_formula(&product("P-1", "ESS-B", "0"), &catalogs).expect("formula");
        // sem normalização pela soma (15.76 + 44.2 + 40 != 100)
        assert_eq!(formula.percentage, d("15.76"));
        assert_eq!(formula.diluent_a_ratio + formula.diluent_b_ratio, d("84.2"));
    }
}
