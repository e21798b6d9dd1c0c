#![deny(clippy::unwrap_used)]

use async_trait::async_trait;
use dotenv::dotenv;
use poem::web::{Data, Json};
use poem::{
    EndpointExt, IntoResponse, Request, Route, Server, get, handler, listener::TcpListener,
    middleware::Tracing, post,
};
use serde_json::json;
use tracing::info;

use poem_passport::passport::config::resolve_port;
use poem_passport::passport::{
    AttemptOptions, AuthSchemes, AuthenticatedUser, Credentials, OutcomeDelegate, Passport,
    PassportConfig, PassportError, PassportScheme, RequestView, Strategy, StrategyRegistry,
    Verdict,
};

/// Trusts the user name set by an authenticating reverse proxy.
struct ForwardedUser;

#[async_trait]
impl Strategy for ForwardedUser {
    async fn authenticate(
        &self,
        request: &RequestView,
        _options: &AttemptOptions,
        delegate: OutcomeDelegate,
    ) {
        match request.header("x-forwarded-user") {
            Some(name) if !name.trim().is_empty() => {
                delegate.success(json!({ "name": name }), None)
            }
            _ => delegate.fail(Some("Proxy".into()), Some(401)),
        }
    }

    fn name(&self) -> &str {
        "forwarded-user"
    }
}

#[handler]
fn me(req: &Request) -> Json<Option<AuthenticatedUser>> {
    Json(req.extensions().get::<AuthenticatedUser>().cloned())
}

#[handler]
fn credentials(req: &Request) -> Json<Option<Credentials>> {
    Json(req.extensions().get::<Credentials>().cloned())
}

#[handler]
fn strategies(passport: Data<&Passport>) -> Json<Vec<String>> {
    Json(passport.registry().names())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Initialize logging with proper tracing default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let passport = Passport::new(
        StrategyRegistry::new().with(ForwardedUser),
        PassportConfig::from_env(),
    );
    let schemes = AuthSchemes::new();
    passport.register_scheme(&schemes);

    let check = passport.authenticate("forwarded-user").with_callback(
        |result: Result<Verdict, PassportError>, _req: Request| async move {
            Ok::<_, poem::Error>(match result {
                Ok(verdict) => Json(verdict).into_response(),
                Err(err) => Json(json!({ "error": err.to_string() })).into_response(),
            })
        },
    );

    let app = Route::new()
        .at("/login", post(passport.authenticate("forwarded-user")))
        .at(
            "/me",
            get(me).with(passport.authenticate(["forwarded-user"])),
        )
        .at("/check", get(check))
        .at(
            "/credentials",
            get(credentials).with(schemes.require(PassportScheme::NAME)),
        )
        .at("/strategies", get(strategies));
    let app = passport.register(app).with(Tracing);

    let addr = format!("0.0.0.0:{}", resolve_port(None));
    info!("Starting passport demo server on {}", addr);

    Server::new(TcpListener::bind(addr))
        .name("Passport Demo Server")
        .run(app)
        .await?;

    Ok(())
}
