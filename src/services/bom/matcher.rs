// src/services/bom/matcher.rs
//
// Resolução de uma referência (código/nome/id) para um registro do catálogo.
// Cada estratégia é uma função isolada; a precedência é a ordem da cadeia.

use uuid::Uuid;

use crate::models::catalog::{FragranceFormula, Material};
use crate::services::bom::catalog_index::{CatalogRecord, RecordTable};

pub type MatchFn<T> = for<'a> fn(&'a RecordTable<T>, &str) -> Option<&'a T>;

pub struct Strategy<T> {
    pub name: &'static str,
    pub run: MatchFn<T>,
}

/// Essências: só código. Nomes de essência se repetem entre fórmulas,
/// então casar por nome escolheria a fórmula errada.
pub const FRAGRANCE_CHAIN: &[Strategy<FragranceFormula>] = &[
    Strategy { name: "exact_code", run: exact_code::<FragranceFormula> },
    Strategy { name: "code_containment", run: code_containment::<FragranceFormula> },
];

/// Materiais genéricos (embalagens etc.) são referenciados às vezes pelo
/// nome, às vezes pelo código.
pub const MATERIAL_CHAIN: &[Strategy<Material>] = &[
    Strategy { name: "name_equality", run: name_equality::<Material> },
    Strategy { name: "exact_code", run: exact_code::<Material> },
    Strategy { name: "identifier_equality", run: identifier_equality::<Material> },
];

#[derive(Debug)]
pub struct Resolution<'a, T> {
    pub record: &'a T,
    pub strategy: &'static str,
}

/// Aplica a cadeia em ordem; a primeira estratégia que casar vence.
pub fn resolve<'a, T: CatalogRecord>(
    table: &'a RecordTable<T>,
    chain: &[Strategy<T>],
    reference: &str,
) -> Option<Resolution<'a, T>> {
    if reference.trim().is_empty() {
        return None;
    }

    chain.iter().find_map(|strategy| {
        (strategy.run)(table, reference).map(|record| Resolution {
            record,
            strategy: strategy.name,
        })
    })
}

// Entre vários candidatos: código mais curto, depois código, depois id.
fn preferred<'a, T: CatalogRecord>(candidates: impl IntoIterator<Item = &'a T>) -> Option<&'a T> {
    candidates.into_iter().min_by(|a, b| {
        a.code()
            .len()
            .cmp(&b.code().len())
            .then_with(|| a.code().cmp(b.code()))
            .then_with(|| a.id().cmp(&b.id()))
    })
}

pub fn exact_code<'a, T: CatalogRecord>(table: &'a RecordTable<T>, reference: &str) -> Option<&'a T> {
    preferred(table.with_code(reference))
}

/// O código do candidato contém a referência, ou a referência contém o
/// código do candidato (sem diferença de caixa).
pub fn code_containment<'a, T: CatalogRecord>(table: &'a RecordTable<T>, reference: &str) -> Option<&'a T> {
    let wanted = reference.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    preferred(table.records().iter().filter(|record| {
        let code = record.code().trim().to_lowercase();
        !code.is_empty() && (code.contains(&wanted) || wanted.contains(&code))
    }))
}

pub fn name_equality<'a, T: CatalogRecord>(table: &'a RecordTable<T>, reference: &str) -> Option<&'a T> {
    preferred(table.with_name(reference))
}

pub fn identifier_equality<'a, T: CatalogRecord>(table: &'a RecordTable<T>, reference: &str) -> Option<&'a T> {
    Uuid::parse_str(reference.trim())
        .ok()
        .and_then(|id| table.get(id))
}
