// src/db/work_order_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ports::WorkOrderStore,
    models::production::{BomCategory, NewWorkOrder, ProductSnapshot, WorkOrder, WorkOrderLine},
};

// Formato gravado nos JSONB. Decimais vão como texto para não passar por
// f64 (a API continua respondendo números).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    product_id: Uuid,
    code: String,
    name: String,
    series_name: Option<String>,
    fragrance_code: String,
    fragrance_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    nicotine_mg: Decimal,
}

impl From<&ProductSnapshot> for StoredSnapshot {
    fn from(s: &ProductSnapshot) -> Self {
        Self {
            product_id: s.product_id,
            code: s.code.clone(),
            name: s.name.clone(),
            series_name: s.series_name.clone(),
            fragrance_code: s.fragrance_code.clone(),
            fragrance_name: s.fragrance_name.clone(),
            nicotine_mg: s.nicotine_mg,
        }
    }
}

impl From<StoredSnapshot> for ProductSnapshot {
    fn from(s: StoredSnapshot) -> Self {
        Self {
            product_id: s.product_id,
            code: s.code,
            name: s.name,
            series_name: s.series_name,
            fragrance_code: s.fragrance_code,
            fragrance_name: s.fragrance_name,
            nicotine_mg: s.nicotine_mg,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    id: Uuid,
    name: String,
    code: String,
    category: BomCategory,
    #[serde(with = "rust_decimal::serde::str")]
    quantity: Decimal,
    unit: String,
    #[serde(with = "rust_decimal::serde::str")]
    ratio: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    used_quantity: Decimal,
}

impl From<&WorkOrderLine> for StoredLine {
    fn from(l: &WorkOrderLine) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            code: l.code.clone(),
            category: l.category,
            quantity: l.quantity,
            unit: l.unit.clone(),
            ratio: l.ratio,
            used_quantity: l.used_quantity,
        }
    }
}

impl From<StoredLine> for WorkOrderLine {
    fn from(l: StoredLine) -> Self {
        Self {
            id: l.id,
            name: l.name,
            code: l.code,
            category: l.category,
            quantity: l.quantity,
            unit: l.unit,
            ratio: l.ratio,
            used_quantity: l.used_quantity,
        }
    }
}

// Linha crua da tabela (snapshots em JSONB)
#[derive(Debug, FromRow)]
struct WorkOrderRow {
    id: Uuid,
    code: String,
    product_id: Uuid,
    product_snapshot: Json<StoredSnapshot>,
    target_quantity: Decimal,
    bom: Json<Vec<StoredLine>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<WorkOrderRow> for WorkOrder {
    fn from(row: WorkOrderRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            product_id: row.product_id,
            product_snapshot: row.product_snapshot.0.into(),
            target_quantity: row.target_quantity,
            bom: row.bom.0.into_iter().map(WorkOrderLine::from).collect(),
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const WORK_ORDER_COLUMNS: &str =
    "id, code, product_id, product_snapshot, target_quantity, bom, notes, created_at";

#[derive(Clone)]
pub struct WorkOrderRepository {
    pool: PgPool,
}

impl WorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkOrderStore for WorkOrderRepository {
    async fn next_code_sequence(&self) -> Result<i64, AppError> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('work_order_code_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(seq)
    }

    async fn insert_work_order(&self, order: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        let sql = format!(
            r#"
            INSERT INTO work_orders (code, product_id, product_snapshot, target_quantity, bom, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            WORK_ORDER_COLUMNS
        );

        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(&order.code)
            .bind(order.product_id)
            .bind(Json(StoredSnapshot::from(&order.product_snapshot)))
            .bind(order.target_quantity)
            .bind(Json(order.bom.iter().map(StoredLine::from).collect::<Vec<_>>()))
            .bind(order.notes.as_deref())
            .fetch_one(&self.pool)
            .await
            // Qualquer falha aqui é erro de gravação para o usuário
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        Ok(row.into())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<WorkOrder>, AppError> {
        let sql = format!(
            "SELECT {} FROM work_orders ORDER BY created_at DESC, code DESC LIMIT $1",
            WORK_ORDER_COLUMNS
        );

        let rows = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(WorkOrder::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let sql = format!("SELECT {} FROM work_orders WHERE id = $1", WORK_ORDER_COLUMNS);

        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(WorkOrder::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: &str) -> WorkOrderLine {
        WorkOrderLine {
            id: Uuid::new_v4(),
            name: "Base de nicotina".into(),
            code: "NIC-BASE".into(),
            category: BomCategory::Nicotine,
            quantity: quantity.parse().expect("decimal"),
            unit: "g".into(),
            ratio: Decimal::ZERO,
            used_quantity: Decimal::ZERO,
        }
    }

    #[test]
    fn stored_line_keeps_every_decimal_digit() {
        let original = line("1234567890123.456789012345");
        let json = serde_json::to_value(StoredLine::from(&original)).expect("json");

        assert_eq!(json["quantity"], "1234567890123.456789012345");
        assert_eq!(json["category"], "nicotine");

        let back: WorkOrderLine = serde_json::from_value::<StoredLine>(json).expect("line").into();
        assert_eq!(back, original);
    }

    #[test]
    fn stored_snapshot_round_trips_nicotine_exactly() {
        let snapshot = ProductSnapshot {
            product_id: Uuid::new_v4(),
            code: "MNT-12-30".into(),
            name: "Menta Gelada 12mg 30ml".into(),
            series_name: None,
            fragrance_code: "ESS-MNT-01".into(),
            fragrance_name: "Menta".into(),
            nicotine_mg: "12.000000000000000001".parse().expect("decimal"),
        };

        let json = serde_json::to_string(&StoredSnapshot::from(&snapshot)).expect("json");
        let back: ProductSnapshot = serde_json::from_str::<StoredSnapshot>(&json).expect("snapshot").into();

        assert_eq!(back, snapshot);
    }
}
