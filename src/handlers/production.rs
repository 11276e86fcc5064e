// src/handlers/production.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        catalog::Product,
        production::{BomReport, SessionInfo, WorkOrder, WorkOrderCreated},
    },
    services::bom::quantity,
};

// Quantidade alvo: precisa caber em `work_orders.target_quantity` sem
// arredondar. Zero, negativa ou fora da coluna é erro de entrada.
fn validate_target_quantity(val: &Decimal) -> Result<(), ValidationError> {
    if quantity::is_valid_target(*val) {
        return Ok(());
    }

    let mut err = ValidationError::new("range");
    if *val <= Decimal::ZERO {
        err.add_param("exclusiveMin".into(), &0.0);
        err.message = Some("A quantidade alvo deve ser maior que zero.".into());
    } else if *val >= quantity::MAX_TARGET_QUANTITY {
        err.add_param("exclusiveMax".into(), &quantity::MAX_TARGET_QUANTITY.to_string());
        err.message = Some("A quantidade alvo deve ser menor que 100000000000000.".into());
    } else {
        err.add_param("maxScale".into(), &quantity::TARGET_MAX_SCALE);
        err.message = Some("A quantidade alvo aceita no máximo 4 casas decimais.".into());
    }
    Err(err)
}

// =============================================================================
//  1. SESSÕES (diálogo de nova ordem)
// =============================================================================

// POST /api/production/sessions
#[utoipa::path(
    post,
    path = "/api/production/sessions",
    tag = "Production",
    responses(
        (status = 202, description = "Sessão aberta; catálogos carregando em segundo plano", body = SessionInfo)
    )
)]
pub async fn open_session(State(app_state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let session = app_state.production_service.open_session().await;

    Ok((StatusCode::ACCEPTED, Json(session)))
}

// GET /api/production/sessions/{id}
#[utoipa::path(
    get,
    path = "/api/production/sessions/{session_id}",
    tag = "Production",
    responses(
        (status = 200, description = "Estado da sessão e contagem dos catálogos", body = SessionInfo),
        (status = 404, description = "Sessão não encontrada ou expirada")
    ),
    params(
        ("session_id" = Uuid, Path, description = "ID da Sessão")
    )
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .production_service
        .session_info(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(session)))
}

// DELETE /api/production/sessions/{id}
#[utoipa::path(
    delete,
    path = "/api/production/sessions/{session_id}",
    tag = "Production",
    responses(
        (status = 204, description = "Sessão encerrada (carga em andamento é cancelada)"),
        (status = 404, description = "Sessão não encontrada ou expirada")
    ),
    params(
        ("session_id" = Uuid, Path, description = "ID da Sessão")
    )
)]
pub async fn close_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .production_service
        .close_session(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/production/sessions/{id}/products
#[utoipa::path(
    get,
    path = "/api/production/sessions/{session_id}/products",
    tag = "Production",
    responses(
        (status = 200, description = "Produtos selecionáveis", body = Vec<Product>),
        (status = 409, description = "Catálogos ainda carregando")
    ),
    params(
        ("session_id" = Uuid, Path, description = "ID da Sessão")
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .production_service
        .list_products(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(products)))
}

// =============================================================================
//  2. LISTA DE MATERIAIS E ORDEM
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BomRequestPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_target_quantity"))]
    #[schema(example = 1000.0)]
    pub target_quantity: Decimal,
}

// POST /api/production/sessions/{id}/bom
#[utoipa::path(
    post,
    path = "/api/production/sessions/{session_id}/bom",
    tag = "Production",
    request_body = BomRequestPayload,
    responses(
        (status = 200, description = "Lista de materiais calculada (com avisos)", body = BomReport),
        (status = 400, description = "Quantidade alvo inválida"),
        (status = 404, description = "Sessão ou produto não encontrado"),
        (status = 422, description = "Produto sem fórmula de essência válida")
    ),
    params(
        ("session_id" = Uuid, Path, description = "ID da Sessão")
    )
)]
pub async fn compute_bom(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<BomRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let report = app_state
        .production_service
        .preview_bom(session_id, payload.product_id, payload.target_quantity)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_target_quantity"))]
    #[schema(example = 1000.0)]
    pub target_quantity: Decimal,

    #[validate(length(max = 2000, message = "Observações muito longas."))]
    #[schema(example = "Lote piloto")]
    pub notes: Option<String>,
}

// POST /api/production/sessions/{id}/work-orders
#[utoipa::path(
    post,
    path = "/api/production/sessions/{session_id}/work-orders",
    tag = "Production",
    request_body = CreateWorkOrderPayload,
    responses(
        (status = 201, description = "Ordem de produção criada (estoque não é baixado)", body = WorkOrderCreated),
        (status = 400, description = "Quantidade alvo inválida"),
        (status = 422, description = "Produto sem fórmula de essência válida"),
        (status = 500, description = "Falha ao gravar; nada foi salvo")
    ),
    params(
        ("session_id" = Uuid, Path, description = "ID da Sessão")
    )
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<CreateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let created = app_state
        .production_service
        .create_work_order(session_id, payload.product_id, payload.target_quantity, payload.notes)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
//  3. CONSULTA DE ORDENS
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListWorkOrdersQuery {
    /// Máximo de ordens (padrão 50, teto 500)
    pub limit: Option<i64>,
}

// GET /api/production/work-orders
#[utoipa::path(
    get,
    path = "/api/production/work-orders",
    tag = "Production",
    params(ListWorkOrdersQuery),
    responses(
        (status = 200, description = "Ordens mais recentes primeiro", body = Vec<WorkOrder>)
    )
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListWorkOrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .production_service
        .list_work_orders(query.limit)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/production/work-orders/{id}
#[utoipa::path(
    get,
    path = "/api/production/work-orders/{work_order_id}",
    tag = "Production",
    responses(
        (status = 200, description = "Ordem de produção", body = WorkOrder),
        (status = 404, description = "Ordem não encontrada")
    ),
    params(
        ("work_order_id" = Uuid, Path, description = "ID da Ordem")
    )
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(work_order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .production_service
        .get_work_order(work_order_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_quantity_must_be_positive() {
        let payload = BomRequestPayload {
            product_id: Uuid::new_v4(),
            target_quantity: Decimal::ZERO,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("target_quantity"));

        let ok = BomRequestPayload {
            product_id: Uuid::new_v4(),
            target_quantity: Decimal::new(5, 1),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn target_quantity_must_fit_the_stored_column() {
        let messages = |q: &str| {
            let payload = BomRequestPayload {
                product_id: Uuid::new_v4(),
                target_quantity: q.parse().expect("decimal"),
            };
            let errors = payload.validate().unwrap_err();
            errors.field_errors()["target_quantity"][0]
                .message
                .as_ref()
                .map(|m| m.to_string())
                .expect("message")
        };

        assert!(messages("1000.12345").contains("4 casas"));
        assert!(messages("0.00001").contains("4 casas"));
        assert!(messages("100000000000000").contains("menor que"));
        assert!(messages("10000000000000000000000000000").contains("menor que"));

        let ok = BomRequestPayload {
            product_id: Uuid::new_v4(),
            target_quantity: "99999999999999.9999".parse().expect("decimal"),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn payload_reads_camel_case_and_decimal_numbers() {
        let json = r#"{"productId":"6f1c1f7e-3d1a-4c55-9a57-2f0f5f0b6a11","targetQuantity":1000.5,"notes":"Lote"}"#;
        let payload: CreateWorkOrderPayload = serde_json::from_str(json).expect("payload");

        assert_eq!(payload.target_quantity, Decimal::new(10005, 1));
        assert_eq!(payload.notes.as_deref(), Some("Lote"));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn negative_quantity_fails_validation_with_message() {
        let payload = CreateWorkOrderPayload {
            product_id: Uuid::new_v4(),
            target_quantity: Decimal::NEGATIVE_ONE,
            notes: None,
        };
        let api = AppError::ValidationError(payload.validate().unwrap_err()).to_api_error(&Locale::default());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["target_quantity"][0], "A quantidade alvo deve ser maior que zero.");
    }
}
