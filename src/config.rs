// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CatalogRepository, WorkOrderRepository},
    services::{bom::BomSettings, production_service::ProductionService, session_store::SessionStore},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub catalog_load_timeout: Duration,
    pub session_ttl: Duration,
    pub bom: BomSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de consulta (o ambiente,
    /// ou um mapa nos testes).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let defaults = BomSettings::default();
        let bom = BomSettings {
            diluent_a_ref: var("BOM_DILUENT_A_REF").unwrap_or(defaults.diluent_a_ref),
            diluent_b_ref: var("BOM_DILUENT_B_REF").unwrap_or(defaults.diluent_b_ref),
            nicotine_ref: var("BOM_NICOTINE_REF").unwrap_or(defaults.nicotine_ref),
            liquid_unit: var("BOM_LIQUID_UNIT").unwrap_or(defaults.liquid_unit),
        };

        Ok(Self {
            database_url,
            bind_addr: parse_or(var("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR.parse()?)?,
            db_max_connections: parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            catalog_load_timeout: Duration::from_secs(parse_or(
                var("CATALOG_LOAD_TIMEOUT_SECS"),
                "CATALOG_LOAD_TIMEOUT_SECS",
                DEFAULT_LOAD_TIMEOUT_SECS,
            )?),
            session_ttl: Duration::from_secs(parse_or(
                var("SESSION_TTL_SECS"),
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
            bom,
        })
    }

    /// Intervalo da varredura de sessões: um quarto do TTL, entre 1s e 60s.
    pub fn sweep_interval(&self) -> Duration {
        (self.session_ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Valor inválido para {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub production_service: ProductionService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let work_order_repo = WorkOrderRepository::new(db_pool.clone());
        let sessions = SessionStore::new(config.catalog_load_timeout, config.session_ttl);

        let production_service = ProductionService::new(
            Arc::new(catalog_repo),
            Arc::new(work_order_repo),
            sessions,
            config.bom.clone(),
        );

        Ok(Self {
            db_pool,
            production_service,
        })
    }
}
