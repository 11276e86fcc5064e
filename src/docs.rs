// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-liquid Production API",
        description = "Lista de materiais e ordens de produção de e-liquids"
    ),
    paths(
        // --- Sessões ---
        handlers::production::open_session,
        handlers::production::get_session,
        handlers::production::close_session,
        handlers::production::list_products,

        // --- BOM / Ordens ---
        handlers::production::compute_bom,
        handlers::production::create_work_order,
        handlers::production::list_work_orders,
        handlers::production::get_work_order,
    ),
    components(
        schemas(
            // --- Catálogos ---
            models::catalog::Product,
            models::catalog::FragranceFormula,
            models::catalog::Material,

            // --- Produção ---
            models::production::BomCategory,
            models::production::BomEntry,
            models::production::BomWarning,
            models::production::BomReport,
            models::production::ProductSnapshot,
            models::production::WorkOrderLine,
            models::production::WorkOrder,
            models::production::WorkOrderCreated,
            models::production::SessionStatus,
            models::production::SessionInfo,

            // --- Payloads ---
            handlers::production::BomRequestPayload,
            handlers::production::CreateWorkOrderPayload,
        )
    ),
    tags(
        (name = "Production", description = "Sessões, lista de materiais e ordens de produção")
    )
)]
pub struct ApiDoc;
