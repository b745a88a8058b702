use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::types::Provider;

/// 网关对外暴露的错误分类
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 所选服务商缺少必要配置（如 API key）
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidInput(String),

    /// 上游返回了非成功状态码，`status` 已按服务商策略映射
    #[error("{message}")]
    Upstream {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("{} request timed out after {} ms", .provider.display_name(), .timeout.as_millis())]
    Timeout {
        provider: Provider,
        timeout: Duration,
    },

    #[error("{} is unreachable: {message}", .provider.display_name())]
    Unreachable { provider: Provider, message: String },
}

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => "configuration_error",
            GatewayError::InvalidInput(_) => "invalid_input",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::Timeout { .. } => "timeout",
            GatewayError::Unreachable { .. } => "upstream_unreachable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "statusCode": status.as_u16(),
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
