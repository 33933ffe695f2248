//! Origin allow-listing for browser callers.

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    middleware::Next,
    web, Error, HttpResponse,
};

use crate::config::CorsConfig;

const ALLOWED_METHODS: &str = "POST, OPTIONS, GET";

/// Immutable origin policy built once from configuration.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allow_any_origin: bool,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig) -> Self {
        let allow_headers = HeaderValue::from_str(&format!("Content-Type, {}", config.app_key_header))
            .unwrap_or_else(|_| HeaderValue::from_static("Content-Type"));
        Self {
            allowed_origins: config.allowed_origins.clone(),
            allow_any_origin: config.allow_any_origin,
            allow_headers,
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allow_any_origin || self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    /// Value for `Access-Control-Allow-Origin`, if this origin may read the response.
    pub fn allow_origin_value(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        if self.allow_any_origin {
            return Some(HeaderValue::from_static("*"));
        }
        let origin = origin?;
        let origin_str = origin.to_str().ok()?;
        self.is_allowed(origin_str).then(|| origin.clone())
    }

    fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(value) = self.allow_origin_value(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}

/// Decorates every response with the origin policy and answers preflight
/// requests on any path with `204 No Content`.
pub async fn cors_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let policy = req.app_data::<web::Data<CorsPolicy>>().cloned();
    let Some(policy) = policy else {
        return Ok(next.call(req).await?.map_into_boxed_body());
    };
    let origin = req.headers().get(header::ORIGIN).cloned();

    if *req.method() == Method::OPTIONS {
        let mut res = req.into_response(HttpResponse::NoContent().finish());
        policy.apply(origin.as_ref(), res.headers_mut());
        return Ok(res);
    }

    let mut res = next.call(req).await?.map_into_boxed_body();
    policy.apply(origin.as_ref(), res.headers_mut());
    Ok(res)
}
