//! CORS configuration

use axum::http::{header, HeaderValue, Method};
use pdfsum_common::config::CorsConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer. A `*` entry allows any origin without credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT];

    let layer = CorsLayer::new().allow_methods(methods).allow_headers(headers);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
