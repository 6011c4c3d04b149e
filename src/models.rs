use crate::config::RuntimeMode;
use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct ApiError {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            error: None,
        }
    }

    pub fn with_error(mut self, error: ApiError) -> Self {
        self.error = Some(error);
        self
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmptyApiResponse {
    pub success: bool,
    pub data: Option<()>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessagesPayload {
    pub locale: Locale,
    #[schema(value_type = Object)]
    pub messages: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesApiResponse {
    pub success: bool,
    pub data: Option<MessagesPayload>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TranslateQuery {
    pub locale: Option<String>,
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranslateResult {
    pub locale: Locale,
    pub key: String,
    pub value: String,
    pub found: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevalidateRequest {
    pub tag: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevalidateResult {
    pub tag: String,
    pub invalidated: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: String,
    pub mode: RuntimeMode,
}
