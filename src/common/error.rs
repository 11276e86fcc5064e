use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::i18n::Locale;
use crate::services::bom::BomError;

// Erros da aplicação. Os handlers convertem para `ApiError` já traduzido.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Bom(#[from] BomError),

    #[error("Sessão {0} não encontrada")]
    SessionNotFound(uuid::Uuid),

    #[error("Sessão {0} ainda carregando catálogos")]
    SessionNotReady(uuid::Uuid),

    #[error("Carregamento de catálogos cancelado")]
    CatalogLoadCancelled,

    #[error("Tempo esgotado ao carregar catálogos")]
    CatalogLoadTimeout,

    #[error("Falha ao carregar catálogos: {0}")]
    CatalogLoadFailed(String),

    #[error("Ordem de produção {0} não encontrada")]
    WorkOrderNotFound(uuid::Uuid),

    #[error("Falha ao gravar a ordem de produção: {0}")]
    Persistence(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// Resposta HTTP final (status + mensagem no idioma do cliente)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Bom(BomError::InvalidTargetQuantity(_)) => StatusCode::BAD_REQUEST,
            AppError::Bom(BomError::ProductNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Bom(BomError::MissingFormula { .. })
            | AppError::Bom(BomError::QuantityOverflow { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SessionNotFound(_) | AppError::WorkOrderNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SessionNotReady(_) | AppError::CatalogLoadCancelled => StatusCode::CONFLICT,
            AppError::CatalogLoadTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::CatalogLoadFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem para o usuário. Só `pt` e `en` por enquanto; qualquer outro
    /// idioma cai no inglês.
    pub fn message(&self, lang: &str) -> String {
        let pt = lang == "pt";
        match self {
            AppError::ValidationError(_) => {
                if pt { "Um ou mais campos são inválidos.".into() } else { "One or more fields are invalid.".into() }
            }
            AppError::Bom(BomError::MissingFormula { product_code }) => {
                if pt {
                    format!("O produto {} não tem fórmula de essência válida (percentual ausente ou zero).", product_code)
                } else {
                    format!("Product {} has no valid fragrance formula (percentage missing or zero).", product_code)
                }
            }
            AppError::Bom(BomError::ProductNotFound(id)) => {
                if pt { format!("Produto {} não encontrado.", id) } else { format!("Product {} not found.", id) }
            }
            AppError::Bom(BomError::InvalidTargetQuantity(q)) => {
                if pt {
                    format!("A quantidade alvo deve ser maior que zero, menor que 10^14 e ter no máximo 4 casas decimais (recebido {}).", q)
                } else {
                    format!("Target quantity must be greater than zero, below 10^14 and have at most 4 decimal places (got {}).", q)
                }
            }
            AppError::Bom(BomError::QuantityOverflow { code }) => {
                if pt {
                    format!("A quantidade calculada para {} excede o limite numérico. Revise a fórmula ou a quantidade alvo.", code)
                } else {
                    format!("The computed quantity for {} exceeds the numeric limit. Check the formula or the target quantity.", code)
                }
            }
            AppError::SessionNotFound(_) => {
                if pt { "Sessão não encontrada ou expirada.".into() } else { "Session not found or expired.".into() }
            }
            AppError::SessionNotReady(_) => {
                if pt { "Os catálogos ainda estão sendo carregados.".into() } else { "Catalogs are still loading.".into() }
            }
            AppError::CatalogLoadCancelled => {
                if pt { "O carregamento dos catálogos foi cancelado.".into() } else { "Catalog loading was cancelled.".into() }
            }
            AppError::CatalogLoadTimeout => {
                if pt { "Tempo esgotado ao carregar os catálogos.".into() } else { "Timed out loading catalogs.".into() }
            }
            AppError::CatalogLoadFailed(_) => {
                if pt { "Não foi possível carregar os catálogos.".into() } else { "Could not load catalogs.".into() }
            }
            AppError::WorkOrderNotFound(_) => {
                if pt { "Ordem de produção não encontrada.".into() } else { "Work order not found.".into() }
            }
            AppError::Persistence(_) => {
                if pt {
                    "Não foi possível gravar a ordem de produção. Nada foi salvo.".into()
                } else {
                    "Could not save the work order. Nothing was stored.".into()
                }
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                if pt { "Ocorreu um erro inesperado.".into() } else { "An unexpected error occurred.".into() }
            }
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();
        if status.is_server_error() {
            // O `tracing` loga a mensagem detalhada que o `thiserror` montou.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(serde_json::Value::Object(details))
            }
            _ => None,
        };

        ApiError {
            status,
            message: self.message(&locale.0),
            details,
        }
    }
}

// Sem extrator de idioma (ex: tarefas internas) a resposta sai em inglês.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}
