// src/services/bom/catalog_index.rs

use std::collections::HashMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogSource,
    models::catalog::{FragranceFormula, Material, Product},
};

/// Registro de catálogo que pode ser localizado por id, código ou nome.
pub trait CatalogRecord {
    fn id(&self) -> Uuid;
    fn code(&self) -> &str;
    fn name(&self) -> &str;
}

impl CatalogRecord for Product {
    fn id(&self) -> Uuid { self.id }
    fn code(&self) -> &str { &self.code }
    fn name(&self) -> &str { &self.name }
}

impl CatalogRecord for FragranceFormula {
    fn id(&self) -> Uuid { self.id }
    fn code(&self) -> &str { &self.code }
    fn name(&self) -> &str { &self.name }
}

impl CatalogRecord for Material {
    fn id(&self) -> Uuid { self.id }
    fn code(&self) -> &str { &self.code }
    fn name(&self) -> &str { &self.name }
}

// Chave de nome: sem espaços nas pontas, sem diferença de caixa.
pub(crate) fn name_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Tabela indexada de um catálogo.
///
/// Os registros são ordenados por (código, id) na construção, então a ordem
/// de chegada do banco nunca influencia o resultado das buscas.
#[derive(Debug, Clone)]
pub struct RecordTable<T> {
    records: Vec<T>,
    by_id: HashMap<Uuid, usize>,
    by_code: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl<T: CatalogRecord> RecordTable<T> {
    pub fn new(mut records: Vec<T>) -> Self {
        records.sort_by(|a, b| a.code().cmp(b.code()).then_with(|| a.id().cmp(&b.id())));

        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_code: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            by_id.entry(record.id()).or_insert(idx);
            by_code.entry(record.code().trim().to_string()).or_default().push(idx);
            by_name.entry(name_key(record.name())).or_default().push(idx);
        }

        Self { records, by_id, by_code, by_name }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.by_id.get(&id).map(|&idx| &self.records[idx])
    }

    /// Registros com código exatamente igual (após `trim`).
    pub fn with_code(&self, code: &str) -> Vec<&T> {
        self.lookup(&self.by_code, code.trim())
    }

    /// Registros com o mesmo nome, ignorando caixa.
    pub fn with_name(&self, name: &str) -> Vec<&T> {
        self.lookup(&self.by_name, &name_key(name))
    }

    fn lookup(&self, map: &HashMap<String, Vec<usize>>, key: &str) -> Vec<&T> {
        map.get(key)
            .map(|indexes| indexes.iter().map(|&idx| &self.records[idx]).collect())
            .unwrap_or_default()
    }
}

/// Os três catálogos em memória, carregados uma vez por sessão.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    products: RecordTable<Product>,
    fragrances: RecordTable<FragranceFormula>,
    materials: RecordTable<Material>,
}

impl CatalogIndex {
    pub fn new(
        products: Vec<Product>,
        fragrances: Vec<FragranceFormula>,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            products: RecordTable::new(products),
            fragrances: RecordTable::new(fragrances),
            materials: RecordTable::new(materials),
        }
    }

    /// Carrega os catálogos em paralelo.
    ///
    /// Retorna `CatalogLoadCancelled` se o token for cancelado antes do fim
    /// (ex: a sessão foi fechada) e `CatalogLoadTimeout` se o prazo estourar.
    pub async fn load(
        source: &dyn CatalogSource,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let load_all = async {
            tokio::try_join!(
                source.load_products(),
                source.load_fragrances(),
                source.load_materials(),
            )
        };

        let (products, fragrances, materials) = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(AppError::CatalogLoadCancelled),
            result = tokio::time::timeout(timeout, load_all) => match result {
                Ok(loaded) => loaded?,
                Err(_) => return Err(AppError::CatalogLoadTimeout),
            },
        };

        tracing::info!(
            products = products.len(),
            fragrances = fragrances.len(),
            materials = materials.len(),
            "Catálogos carregados"
        );

        let index = Self::new(products, fragrances, materials);
        if index.products.is_empty() || index.fragrances.is_empty() || index.materials.is_empty() {
            tracing::warn!("Catálogo vazio: nenhuma lista de materiais poderá ser montada por completo");
        }

        Ok(index)
    }

    pub fn products(&self) -> &RecordTable<Product> {
        &self.products
    }

    pub fn fragrances(&self) -> &RecordTable<FragranceFormula> {
        &self.fragrances
    }

    pub fn materials(&self) -> &RecordTable<Material> {
        &self.materials
    }

    pub fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.get(id)
    }
}
