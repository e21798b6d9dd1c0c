//! Per-request authentication context and the middleware that attaches it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use poem::http::Uri;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response, Result};
use tracing::debug;
use uuid::Uuid;

use super::view::RequestView;

/// State attached to a request for the lifetime of its processing.
///
/// Lives in the request extensions. The URL is captured when the context is
/// created, before nested routes strip their prefixes. The synthesized
/// [`RequestView`] is only present while an attempt sequence is running.
#[derive(Debug, Clone)]
pub struct AuthenticationContext {
    request_id: Uuid,
    started_at: DateTime<Utc>,
    url: String,
    view: Option<Arc<RequestView>>,
}

impl AuthenticationContext {
    pub fn new(req: &Request) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            url: request_url(req),
            view: None,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Full URL of the request as it reached the outermost endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// View of the request, while strategies are being tried.
    pub fn view(&self) -> Option<&Arc<RequestView>> {
        self.view.as_ref()
    }

    pub(crate) fn attach_view(&mut self, view: Arc<RequestView>) {
        self.view = Some(view);
    }

    pub(crate) fn detach_view(&mut self) -> Option<Arc<RequestView>> {
        self.view.take()
    }
}

/// Full URL of `req`.
///
/// `original_uri` is only filled in by poem's server; requests built
/// elsewhere leave it at `/`, so the routed URI is used instead.
pub(crate) fn request_url(req: &Request) -> String {
    if *req.original_uri() != Uri::default() {
        req.original_uri().to_string()
    } else {
        req.uri().to_string()
    }
}

/// Middleware attaching a fresh [`AuthenticationContext`] to every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Initialize;

impl Initialize {
    pub fn new() -> Self {
        Self
    }
}

impl<E: Endpoint> Middleware<E> for Initialize {
    type Output = InitializeEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        InitializeEndpoint { inner: ep }
    }
}

/// Endpoint produced by [`Initialize`].
pub struct InitializeEndpoint<E> {
    inner: E,
}

impl<E: Endpoint> Endpoint for InitializeEndpoint<E> {
    type Output = Response;

    async fn call(&self, mut req: Request) -> Result<Self::Output> {
        let ctx = AuthenticationContext::new(&req);
        debug!(
            "Initialized authentication context {} for {} {}",
            ctx.request_id(),
            req.method(),
            ctx.url()
        );
        req.extensions_mut().insert(ctx);

        let resp = self.inner.call(req).await?;
        Ok(resp.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use poem::{EndpointExt, Error, Route, get, handler};

    #[handler]
    fn context_id(req: &Request) -> String {
        req.extensions()
            .get::<AuthenticationContext>()
            .map(|ctx| ctx.request_id().to_string())
            .unwrap_or_else(|| "missing".to_string())
    }

    #[handler]
    fn context_url(req: &Request) -> String {
        req.extensions()
            .get::<AuthenticationContext>()
            .map(|ctx| ctx.url().to_string())
            .unwrap_or_else(|| "missing".to_string())
    }

    #[handler]
    fn failing() -> Result<String> {
        Err(Error::from_status(StatusCode::SERVICE_UNAVAILABLE))
    }

    #[tokio::test]
    async fn test_context_attached_per_request() {
        let app = Route::new().at("/", get(context_id)).with(Initialize::new());
        let cli = TestClient::new(app);

        let first = cli.get("/").send().await.0.into_body().into_string().await.unwrap();
        let second = cli.get("/").send().await.0.into_body().into_string().await.unwrap();

        assert!(Uuid::parse_str(&first).is_ok());
        assert!(Uuid::parse_str(&second).is_ok());
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_without_initialize_no_context() {
        let app = Route::new().at("/", get(context_id));
        let cli = TestClient::new(app);
        cli.get("/").send().await.assert_text("missing").await;
    }

    #[tokio::test]
    async fn test_inner_error_short_circuits() {
        let app = Route::new().at("/", get(failing)).with(Initialize::new());
        let cli = TestClient::new(app);
        cli.get("/")
            .send()
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    mod url {
        use super::*;

        #[test]
        fn test_built_request_uses_routed_uri() {
            let req = Request::builder()
                .uri(Uri::from_static("/login?next=%2Fhome"))
                .finish();
            assert_eq!(request_url(&req), "/login?next=%2Fhome");
            assert_eq!(AuthenticationContext::new(&req).url(), "/login?next=%2Fhome");
        }

        #[tokio::test]
        async fn test_captured_before_nest_strips_prefix() {
            let app = Route::new()
                .nest("/api", Route::new().at("/me", get(context_url)))
                .with(Initialize::new());
            let cli = TestClient::new(app);

            cli.get("/api/me?verbose=1")
                .send()
                .await
                .assert_text("/api/me?verbose=1")
                .await;
        }

        #[tokio::test]
        async fn test_captured_on_direct_route() {
            let app = Route::new().at("/me", get(context_url)).with(Initialize::new());
            let cli = TestClient::new(app);
            cli.get("/me").send().await.assert_text("/me").await;
        }
    }

    #[test]
    fn test_view_attach_and_detach() {
        let req = Request::builder().finish();
        let mut ctx = AuthenticationContext::new(&req);
        assert!(ctx.view().is_none());

        let view = Arc::new(RequestView {
            headers: Default::default(),
            query: Default::default(),
            body: serde_json::Value::Null,
            method: "GET".into(),
            url: ctx.url().to_string(),
            request_id: ctx.request_id(),
        });
        ctx.attach_view(view);
        assert_eq!(ctx.view().unwrap().request_id, ctx.request_id());

        assert!(ctx.detach_view().is_some());
        assert!(ctx.view().is_none());
    }

    #[test]
    fn test_context_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthenticationContext>();
    }
}
