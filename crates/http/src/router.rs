//! Router builder for the Folio HTTP server

use axum::{
    extract::Request,
    http::{
        header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN},
        HeaderName, HeaderValue, Method,
    },
    routing::get,
    Router,
};
use std::time::Duration;
use tower::{service_fn, ServiceExt};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::{Timestamp, Uuid};

use crate::error::AppError;
use crate::links::mount_path;

/// Response headers browsers may read on cross-origin requests.
const EXPOSED_HEADERS: [&str; 4] = ["x-wp-total", "x-wp-totalpages", "location", "x-request-id"];

/// Builder for constructing the main HTTP router.
///
/// Middleware is applied in [`RouterBuilder::build`] so it wraps every
/// route, including module routers mounted after the `with_*` calls.
pub struct RouterBuilder {
    router: Router,
    api_root: String,
    tracing: bool,
    cors: bool,
    request_id: bool,
    timeout: Option<Duration>,
}

impl RouterBuilder {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            router: Router::new(),
            api_root: api_root.into(),
            tracing: false,
            cors: false,
            request_id: false,
            timeout: None,
        }
    }

    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/{api_root}/{namespace}`
    pub fn mount_module(mut self, namespace: &str, module_router: Router) -> Self {
        let path = mount_path(&self.api_root, namespace);
        tracing::info!(namespace, %path, "mounting module routes");
        self.router = self.router.nest(&path, module_router);
        self
    }

    pub fn with_tracing(mut self) -> Self {
        self.tracing = true;
        self
    }

    pub fn with_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    pub fn with_request_id(mut self) -> Self {
        self.request_id = true;
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(timeout_ms));
        self
    }

    /// Serve the merged OpenAPI document and a Swagger UI for it.
    pub fn with_openapi(mut self, document: serde_json::Value) -> Self {
        let openapi = match serde_json::from_value::<utoipa::openapi::OpenApi>(document.clone()) {
            Ok(openapi) => openapi,
            Err(err) => {
                tracing::warn!(error = %err, "OpenAPI document is not typed-compatible; Swagger UI gets a stub");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title("Folio API")
                            .version("1.0.0")
                            .build(),
                    )
                    .build()
            }
        };

        self.router = self
            .router
            .merge(utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .route(
                "/docs/openapi.json",
                get(move || async move { axum::Json(document) }),
            );
        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        let mut router = self
            .router
            .fallback(no_route)
            .method_not_allowed_fallback(no_route);

        if let Some(timeout) = self.timeout {
            router = router.layer(TimeoutLayer::new(timeout));
        }
        if self.cors {
            let exposed = EXPOSED_HEADERS.map(HeaderName::from_static);
            router = preflight_cors(
                router,
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .expose_headers(exposed),
            );
        }
        if self.tracing {
            router = router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                    .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
            );
        }
        if self.request_id {
            // Outermost, so the trace span already sees the id.
            router = router
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        }

        router
    }
}

/// Error for requests no route and method pair matches.
pub async fn no_route() -> AppError {
    AppError::no_route()
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request.headers().contains_key(ORIGIN)
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Wrap `router` in `cors`, except for OPTIONS requests that are not CORS
/// preflights. `CorsLayer` answers every OPTIONS request itself, which would
/// hide route-level OPTIONS handlers.
fn preflight_cors(router: Router, cors: CorsLayer) -> Router {
    let with_cors = router.clone().layer(cors);
    Router::new().fallback_service(service_fn(move |request: Request| {
        let target = if request.method() == Method::OPTIONS && !is_preflight(&request) {
            router.clone()
        } else {
            with_cors.clone()
        };
        async move { target.oneshot(request).await }
    }))
}

/// Time-ordered request ids.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
