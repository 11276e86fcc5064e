// src/services/session_store.rs
//
// Sessões de criação de ordem: cada uma carrega os catálogos uma vez e
// reaproveita o índice em memória a cada recálculo da lista de materiais.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogSource,
    models::production::{SessionInfo, SessionStatus},
    services::bom::CatalogIndex,
};

#[derive(Debug, Clone)]
enum SessionState {
    Loading,
    Ready(Arc<CatalogIndex>),
    Failed(String),
}

#[derive(Debug)]
struct SessionEntry {
    state: SessionState,
    cancel: CancellationToken,
    opened_at: DateTime<Utc>,
    last_used: Instant,
}

impl SessionEntry {
    fn info(&self, id: Uuid) -> SessionInfo {
        let (status, counts, error) = match &self.state {
            SessionState::Loading => (SessionStatus::Loading, (0, 0, 0), None),
            SessionState::Ready(index) => (
                SessionStatus::Ready,
                (index.products().len(), index.fragrances().len(), index.materials().len()),
                None,
            ),
            SessionState::Failed(message) => (SessionStatus::Failed, (0, 0, 0), Some(message.clone())),
        };

        SessionInfo {
            id,
            status,
            opened_at: self.opened_at,
            products: counts.0,
            fragrances: counts.1,
            materials: counts.2,
            error,
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    load_timeout: Duration,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(load_timeout: Duration, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            load_timeout,
            ttl,
        }
    }

    /// Abre uma sessão e dispara o carregamento dos catálogos em segundo plano.
    pub async fn open(&self, source: Arc<dyn CatalogSource>) -> SessionInfo {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let entry = SessionEntry {
            state: SessionState::Loading,
            cancel: cancel.clone(),
            opened_at: Utc::now(),
            last_used: Instant::now(),
        };
        let info = entry.info(id);

        self.sessions.write().await.insert(id, entry);
        tracing::info!(session = %id, "Sessão de ordem de produção aberta");

        let sessions = Arc::clone(&self.sessions);
        let timeout = self.load_timeout;
        tokio::spawn(async move {
            let result = CatalogIndex::load(source.as_ref(), &cancel, timeout).await;

            let mut sessions = sessions.write().await;
            match sessions.get_mut(&id) {
                // Sessão fechada ou expirada durante a carga: resultado descartado
                Some(entry) if !cancel.is_cancelled() => {
                    entry.state = match result {
                        Ok(index) => SessionState::Ready(Arc::new(index)),
                        Err(e) => {
                            tracing::error!(session = %id, error = %e, "Falha ao carregar catálogos");
                            SessionState::Failed(e.to_string())
                        }
                    };
                }
                _ => tracing::debug!(session = %id, "Carga de catálogos descartada"),
            }
        });

        info
    }

    pub async fn info(&self, id: Uuid) -> Result<SessionInfo, AppError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|entry| entry.info(id))
            .ok_or(AppError::SessionNotFound(id))
    }

    /// Índice pronto da sessão (renova o prazo de expiração).
    pub async fn catalogs(&self, id: Uuid) -> Result<Arc<CatalogIndex>, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        entry.last_used = Instant::now();

        match &entry.state {
            SessionState::Ready(index) => Ok(Arc::clone(index)),
            SessionState::Loading => Err(AppError::SessionNotReady(id)),
            SessionState::Failed(message) => Err(AppError::CatalogLoadFailed(message.clone())),
        }
    }

    /// Fecha a sessão. Uma carga ainda em andamento é cancelada.
    pub async fn close(&self, id: Uuid) -> Result<(), AppError> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(AppError::SessionNotFound(id))?;

        entry.cancel.cancel();
        tracing::info!(session = %id, "Sessão encerrada");
        Ok(())
    }

    /// Remove sessões ociosas há mais que o TTL.
    pub async fn evict_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, entry| {
            let expired = entry.last_used.elapsed() >= self.ttl;
            if expired {
                entry.cancel.cancel();
                tracing::info!(session = %id, "Sessão expirada");
            }
            !expired
        });

        before - sessions.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Varredura periódica das sessões expiradas até o `shutdown`.
    pub fn start_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            tracing::info!(?interval, "Varredura de sessões iniciada");
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = store.evict_expired().await;
                        if evicted > 0 {
                            tracing::info!(evicted, "Sessões expiradas removidas");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        tracing::info!("Varredura de sessões encerrada");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{FragranceFormula, Material, Product};
    use crate::services::bom::test_support::StaticCatalog;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Fonte que nunca responde; avisa quando a carga é abandonada.
    struct HangingCatalog {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CatalogSource for HangingCatalog {
        async fn load_products(&self) -> Result<Vec<Product>, AppError> {
            let _flag = DropFlag(Arc::clone(&self.dropped));
            std::future::pending::<()>().await;
            Ok(vec![])
        }

        async fn load_fragrances(&self) -> Result<Vec<FragranceFormula>, AppError> {
            std::future::pending::<()>().await;
            Ok(vec![])
        }

        async fn load_materials(&self) -> Result<Vec<Material>, AppError> {
            std::future::pending::<()>().await;
            Ok(vec![])
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl CatalogSource for FailingCatalog {
        async fn load_products(&self) -> Result<Vec<Product>, AppError> {
            Err(AppError::CatalogLoadFailed("conexão recusada".into()))
        }

        async fn load_fragrances(&self) -> Result<Vec<FragranceFormula>, AppError> {
            Ok(vec![])
        }

        async fn load_materials(&self) -> Result<Vec<Material>, AppError> {
            Ok(vec![])
        }
    }

    async fn wait_for_status(store: &SessionStore, id: Uuid, status: SessionStatus) -> SessionInfo {
        for _ in 0..200 {
            let info = store.info(id).await.expect("session");
            if info.status == status {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("sessão {} não chegou em {:?}", id, status);
    }

    #[tokio::test]
    async fn session_becomes_ready_with_catalog_counts() {
        let store = SessionStore::new(Duration::from_secs(5), Duration::from_secs(60));
        let opened = store.open(Arc::new(StaticCatalog::sample())).await;
        assert_eq!(opened.status, SessionStatus::Loading);

        let info = wait_for_status(&store, opened.id, SessionStatus::Ready).await;
        assert_eq!(info.products, 1);
        assert_eq!(info.fragrances, 2);
        assert_eq!(info.materials, 6);

        let index = store.catalogs(opened.id).await.expect("catalogs");
        assert_eq!(index.materials().len(), 6);
    }

    #[tokio::test]
    async fn loading_session_is_not_ready() {
        let store = SessionStore::new(Duration::from_secs(5), Duration::from_secs(60));
        let source = HangingCatalog { dropped: Arc::new(AtomicBool::new(false)) };
        let opened = store.open(Arc::new(source)).await;

        let err = store.catalogs(opened.id).await.unwrap_err();
        assert!(matches!(err, AppError::SessionNotReady(id) if id == opened.id));
    }

    #[tokio::test]
    async fn closing_cancels_in_flight_load() {
        let store = SessionStore::new(Duration::from_secs(60), Duration::from_secs(60));
        let dropped = Arc::new(AtomicBool::new(false));
        let opened = store.open(Arc::new(HangingCatalog { dropped: Arc::clone(&dropped) })).await;

        // deixa a tarefa de carga começar
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.close(opened.id).await.expect("close");

        for _ in 0..200 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(dropped.load(Ordering::SeqCst), "carga não foi abandonada");
        assert!(matches!(store.info(opened.id).await, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn load_timeout_marks_session_failed() {
        let store = SessionStore::new(Duration::from_millis(20), Duration::from_secs(60));
        let source = HangingCatalog { dropped: Arc::new(AtomicBool::new(false)) };
        let opened = store.open(Arc::new(source)).await;

        let info = wait_for_status(&store, opened.id, SessionStatus::Failed).await;
        assert!(info.error.is_some());
        assert!(matches!(store.catalogs(opened.id).await, Err(AppError::CatalogLoadFailed(_))));
    }

    #[tokio::test]
    async fn source_error_marks_session_failed() {
        let store = SessionStore::new(Duration::from_secs(5), Duration::from_secs(60));
        let opened = store.open(Arc::new(FailingCatalog)).await;

        let info = wait_for_status(&store, opened.id, SessionStatus::Failed).await;
        assert!(info.error.expect("error").contains("conexão recusada"));
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(5), Duration::ZERO);
        let opened = store.open(Arc::new(StaticCatalog::sample())).await;

        assert_eq!(store.evict_expired().await, 1);
        assert_eq!(store.len().await, 0);
        assert!(matches!(store.close(opened.id).await, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn sweeper_stops_on_shutdown() {
        let store = SessionStore::new(Duration::from_secs(5), Duration::from_secs(60));
        let shutdown = CancellationToken::new();
        let handle = store.start_sweeper(Duration::from_millis(5), shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper parou")
            .expect("join");
    }
}
