// src/services/bom/assembler.rs

use std::collections::HashSet;

use deunicode::deunicode;

use crate::models::production::BomEntry;

// Chave alfabética: sem acento e sem diferença de caixa ("Álcool" -> "alcool").
fn alphabetical_key(name: &str) -> String {
    deunicode(name.trim()).to_lowercase()
}

/// Remove duplicados pelo id resolvido (a primeira ocorrência fica) e ordena
/// por prioridade de categoria, nome (ordem alfabética), código e id.
///
/// A ordem é contrato de exibição e do snapshot: mesma entrada, mesma lista.
pub fn assemble(entries: Vec<BomEntry>) -> Vec<BomEntry> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut unique: Vec<BomEntry> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id))
        .collect();

    unique.sort_by(|a, b| {
        a.category
            .priority()
            .cmp(&b.category.priority())
            .then_with(|| alphabetical_key(&a.name).cmp(&alphabetical_key(&b.name)))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.id.cmp(&b.id))
    });

    unique
}
