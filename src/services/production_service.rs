// src/services/production_service.rs

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogSource, WorkOrderStore},
    models::{
        catalog::Product,
        production::{BomReport, NewWorkOrder, SessionInfo, WorkOrder, WorkOrderCreated, WorkOrderLine},
    },
    services::{
        bom::{self, BomError, BomSettings},
        session_store::SessionStore,
    },
};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 500;

/// Código legível da ordem: `WO-AAAAMMDD-NNNNN` (data em UTC).
pub fn format_work_order_code(date: NaiveDate, sequence: i64) -> String {
    format!("WO-{}-{:05}", date.format("%Y%m%d"), sequence)
}

#[derive(Clone)]
pub struct ProductionService {
    catalog_source: Arc<dyn CatalogSource>,
    store: Arc<dyn WorkOrderStore>,
    sessions: SessionStore,
    settings: BomSettings,
}

impl ProductionService {
    pub fn new(
        catalog_source: Arc<dyn CatalogSource>,
        store: Arc<dyn WorkOrderStore>,
        sessions: SessionStore,
        settings: BomSettings,
    ) -> Self {
        Self {
            catalog_source,
            store,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // --- Sessões ---

    pub async fn open_session(&self) -> SessionInfo {
        self.sessions.open(Arc::clone(&self.catalog_source)).await
    }

    pub async fn session_info(&self, session_id: Uuid) -> Result<SessionInfo, AppError> {
        self.sessions.info(session_id).await
    }

    pub async fn close_session(&self, session_id: Uuid) -> Result<(), AppError> {
        self.sessions.close(session_id).await
    }

    /// Produtos selecionáveis na sessão, na ordem do catálogo (por código).
    pub async fn list_products(&self, session_id: Uuid) -> Result<Vec<Product>, AppError> {
        let catalogs = self.sessions.catalogs(session_id).await?;
        Ok(catalogs.products().records().to_vec())
    }

    // --- Lista de materiais ---

    /// Recalcula a lista do zero (troca de produto ou de quantidade).
    pub async fn preview_bom(
        &self,
        session_id: Uuid,
        product_id: Uuid,
        target_quantity: Decimal,
    ) -> Result<BomReport, AppError> {
        let catalogs = self.sessions.catalogs(session_id).await?;
        let product = catalogs
            .product(product_id)
            .ok_or(BomError::ProductNotFound(product_id))?;

        let report = bom::compute_bom(product, target_quantity, &catalogs, &self.settings)?;
        Ok(report)
    }

    /// Confirma a ordem: recalcula, fotografa o produto e grava.
    ///
    /// Estoque insuficiente não impede a gravação; os avisos voltam junto
    /// com a ordem criada.
    pub async fn create_work_order(
        &self,
        session_id: Uuid,
        product_id: Uuid,
        target_quantity: Decimal,
        notes: Option<String>,
    ) -> Result<WorkOrderCreated, AppError> {
        let catalogs = self.sessions.catalogs(session_id).await?;
        let product = catalogs
            .product(product_id)
            .ok_or(BomError::ProductNotFound(product_id))?;

        let report = bom::compute_bom(product, target_quantity, &catalogs, &self.settings)?;
        let snapshot = bom::product_snapshot(product, &catalogs)?;

        let sequence = self.store.next_code_sequence().await?;
        let code = format_work_order_code(today_utc(), sequence);

        let new_order = NewWorkOrder {
            code,
            product_id,
            product_snapshot: snapshot,
            target_quantity,
            bom: report.entries.iter().map(WorkOrderLine::from).collect(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        };

        let work_order = self.store.insert_work_order(&new_order).await?;

        if report.has_shortages() {
            tracing::warn!(code = %work_order.code, "Ordem criada com estoque insuficiente");
        }

        tracing::info!(
            code = %work_order.code,
            product = %product.code,
            target = %target_quantity,
            lines = work_order.bom.len(),
            warnings = report.warnings.len(),
            "Ordem de produção criada"
        );

        Ok(WorkOrderCreated {
            work_order,
            warnings: report.warnings,
        })
    }

    // --- Consulta ---

    pub async fn list_work_orders(&self, limit: Option<i64>) -> Result<Vec<WorkOrder>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.store.list_recent(limit).await
    }

    pub async fn get_work_order(&self, id: Uuid) -> Result<WorkOrder, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::WorkOrderNotFound(id))
    }
}

fn today_utc() -> NaiveDate {
    let now: DateTime<Utc> = Utc::now();
    now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::production::{BomCategory, BomWarning, SessionStatus};
    use crate::services::bom::test_support::{d, StaticCatalog};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Banco de ordens em memória.
    #[derive(Default)]
    struct MemoryStore {
        sequence: Mutex<i64>,
        orders: Mutex<Vec<WorkOrder>>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl WorkOrderStore for MemoryStore {
        async fn next_code_sequence(&self) -> Result<i64, AppError> {
            let mut seq = self.sequence.lock().await;
            *seq += 1;
            Ok(*seq)
        }

        async fn insert_work_order(&self, order: &NewWorkOrder) -> Result<WorkOrder, AppError> {
            if self.fail_inserts {
                return Err(AppError::Persistence("disco cheio".into()));
            }
            let stored = WorkOrder {
                id: Uuid::new_v4(),
                code: order.code.clone(),
                product_id: order.product_id,
                product_snapshot: order.product_snapshot.clone(),
                target_quantity: order.target_quantity,
                bom: order.bom.clone(),
                notes: order.notes.clone(),
                created_at: Utc::now(),
            };
            self.orders.lock().await.push(stored.clone());
            Ok(stored)
        }

        async fn list_recent(&self, limit: i64) -> Result<Vec<WorkOrder>, AppError> {
            let orders = self.orders.lock().await;
            Ok(orders.iter().rev().take(limit as usize).cloned().collect())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
            Ok(self.orders.lock().await.iter().find(|o| o.id == id).cloned())
        }
    }

    struct Fixture {
        service: ProductionService,
        store: Arc<MemoryStore>,
        catalog: StaticCatalog,
    }

    fn fixture(store: MemoryStore) -> Fixture {
        let catalog = StaticCatalog::sample();
        let store = Arc::new(store);
        let service = ProductionService::new(
            Arc::new(catalog.clone()),
            store.clone(),
            SessionStore::new(Duration::from_secs(5), Duration::from_secs(60)),
            BomSettings::default(),
        );
        Fixture { service, store, catalog }
    }

    async fn ready_session(service: &ProductionService) -> Uuid {
        let id = service.open_session().await.id;
        for _ in 0..200 {
            if service.session_info(id).await.expect("session").status == SessionStatus::Ready {
                return id;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("sessão não ficou pronta");
    }

    #[test]
    fn work_order_code_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).expect("date");
        assert_eq!(format_work_order_code(date, 42), "WO-20250314-00042");
        assert_eq!(format_work_order_code(date, 123456), "WO-20250314-123456");
    }

    #[tokio::test]
    async fn create_work_order_persists_snapshot_and_lines() {
        let fx = fixture(MemoryStore::default());
        let session = ready_session(&fx.service).await;
        let product = &fx.catalog.products[0];

        let created = fx
            .service
            .create_work_order(session, product.id, d("1000"), Some("Lote piloto".into()))
            .await
            .expect("work order");

        let order = &created.work_order;
        assert!(order.code.starts_with("WO-"));
        assert!(order.code.ends_with("-00001"));
        assert_eq!(order.product_snapshot.code, "MNT-12-30");
        assert_eq!(order.product_snapshot.fragrance_name, "Menta");
        assert_eq!(order.notes.as_deref(), Some("Lote piloto"));
        assert_eq!(order.bom.len(), 7);
        assert!(order.bom.iter().all(|line| line.used_quantity == Decimal::ZERO));

        let essence = order.bom.iter().find(|l| l.category == BomCategory::Fragrance).expect("essência");
        assert_eq!(essence.quantity, d("157.6"));

        // Nicotina curta: ordem criada mesmo assim, com o aviso
        assert!(created
            .warnings
            .iter()
            .any(|w| matches!(w, BomWarning::InsufficientStock { code, .. } if code == "NIC-BASE")));

        assert_eq!(fx.store.orders.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn preview_matches_persisted_bom() {
        let fx = fixture(MemoryStore::default());
        let session = ready_session(&fx.service).await;
        let product_id = fx.catalog.products[0].id;

        let preview = fx.service.preview_bom(session, product_id, d("250")).await.expect("preview");
        let created = fx
            .service
            .create_work_order(session, product_id, d("250"), None)
            .await
            .expect("work order");

        let lines: Vec<WorkOrderLine> = preview.entries.iter().map(WorkOrderLine::from).collect();
        assert_eq!(lines, created.work_order.bom);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let fx = fixture(MemoryStore::default());
        let session = ready_session(&fx.service).await;

        let err = fx.service.preview_bom(session, Uuid::new_v4(), d("10")).await.unwrap_err();
        assert!(matches!(err, AppError::Bom(BomError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn missing_formula_writes_nothing() {
        let mut fx = fixture(MemoryStore::default());
        fx.catalog.fragrances[0].percentage = None;
        fx.service = ProductionService::new(
            Arc::new(fx.catalog.clone()),
            fx.store.clone(),
            SessionStore::new(Duration::from_secs(5), Duration::from_secs(60)),
            BomSettings::default(),
        );
        let session = ready_session(&fx.service).await;

        let err = fx
            .service
            .create_work_order(session, fx.catalog.products[0].id, d("10"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Bom(BomError::MissingFormula { .. })));
        assert!(fx.store.orders.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_insert_is_a_persistence_error() {
        let fx = fixture(MemoryStore { fail_inserts: true, ..Default::default() });
        let session = ready_session(&fx.service).await;

        let err = fx
            .service
            .create_work_order(session, fx.catalog.products[0].id, d("10"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn work_orders_listed_newest_first_and_fetched_by_id() {
        let fx = fixture(MemoryStore::default());
        let session = ready_session(&fx.service).await;
        let product_id = fx.catalog.products[0].id;

        let first = fx.service.create_work_order(session, product_id, d("10"), None).await.expect("1");
        let second = fx.service.create_work_order(session, product_id, d("20"), None).await.expect("2");

        let listed = fx.service.list_work_orders(None).await.expect("list");
        assert_eq!(listed[0].id, second.work_order.id);
        assert_eq!(listed[1].id, first.work_order.id);

        let limited = fx.service.list_work_orders(Some(0)).await.expect("list");
        assert_eq!(limited.len(), 1);

        let fetched = fx.service.get_work_order(first.work_order.id).await.expect("get");
        assert_eq!(fetched.target_quantity, d("10"));

        let missing = fx.service.get_work_order(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(missing, AppError::WorkOrderNotFound(_)));
    }

    #[tokio::test]
    async fn blank_notes_are_dropped() {
        let fx = fixture(MemoryStore::default());
        let session = ready_session(&fx.service).await;

        let created = fx
            .service
            .create_work_order(session, fx.catalog.products[0].id, d("10"), Some("   ".into()))
            .await
            .expect("work order");

        assert_eq!(created.work_order.notes, None);
    }

    #[tokio::test]
    async fn closed_session_rejects_requests() {
        let fx = fixture(MemoryStore::default());
        let session = ready_session(&fx.service).await;
        fx.service.close_session(session).await.expect("close");

        let err = fx.service.list_products(session).await.unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(_)));
    }
}
