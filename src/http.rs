use crate::error::{ErrorEnvelope, GatewayError};
use crate::export::EXPORT_ROUTE;
use crate::gateway::{Gateway, OperationOutput};
use crate::operation::{Arguments, Operation};
use crate::upstream::Credentials;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, warn};

pub type AppState = Arc<Gateway>;

const AUTH_CHALLENGE: &str = "Basic realm=\"powergate\"";

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    meters: usize,
}

/// Error body and status for a failed request.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    envelope: ErrorEnvelope,
}

impl ApiError {
    fn missing_credentials() -> Self {
        GatewayError::AuthenticationFailed.into()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::MissingArgument { .. } | GatewayError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            GatewayError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            GatewayError::NotImplemented { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            warn!("Request rejected: {}", err);
        }

        Self {
            status,
            envelope: err.error_code().envelope(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.envelope)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_CHALLENGE));
        }
        response
    }
}

pub fn router(gateway: AppState) -> Router {
    let export_dir = gateway.exports().dir().to_path_buf();

    Router::new()
        .route("/health", get(health_check))
        .route("/:operation", get(handle_operation))
        .nest_service(EXPORT_ROUTE, ServeDir::new(export_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(gateway)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        meters: state.directory().len(),
    })
}

async fn handle_operation(
    Path(name): Path<String>,
    Query(args): Query<Arguments>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<OperationOutput>, ApiError> {
    // Every route is challenged before its name is looked at
    let credentials = basic_credentials(&headers).ok_or_else(ApiError::missing_credentials)?;
    let operation = Operation::parse(&name, &args)?;
    let output = state.execute(&operation, &credentials).await?;

    Ok(Json(output))
}

/// Decodes an `Authorization: Basic ..` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some(Credentials::new(user, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_basic_credentials() {
        let encoded = STANDARD.encode("admin:s3cr:et");
        let credentials = basic_credentials(&headers(&format!("Basic {}", encoded))).unwrap();
        assert_eq!(credentials, Credentials::new("admin", "s3cr:et"));

        let empty_password = STANDARD.encode("admin:");
        let credentials = basic_credentials(&headers(&format!("basic {}", empty_password))).unwrap();
        assert_eq!(credentials.password, "");
    }

    #[test]
    fn test_rejects_malformed_authorization() {
        assert!(basic_credentials(&HeaderMap::new()).is_none());
        assert!(basic_credentials(&headers("Bearer abc")).is_none());
        assert!(basic_credentials(&headers("Basic not-base64!")).is_none());
        assert!(basic_credentials(&headers(&format!("Basic {}", STANDARD.encode("nocolon")))).is_none());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GatewayError::missing("date"), StatusCode::BAD_REQUEST, "0003"),
            (GatewayError::invalid("interval", "45"), StatusCode::BAD_REQUEST, "0006"),
            (GatewayError::AuthenticationFailed, StatusCode::UNAUTHORIZED, "0005"),
            (
                GatewayError::NotImplemented {
                    operation: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
                "0004",
            ),
            (
                GatewayError::UpstreamUnavailable("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "0001",
            ),
        ];

        for (err, status, code) in cases {
            let api_error = ApiError::from(err);
            assert_eq!(api_error.status, status);
            assert_eq!(api_error.envelope.error_code, code);
        }
    }
}
