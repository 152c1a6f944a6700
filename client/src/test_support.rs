//! Fixtures shared by the client tests: profiles, unsigned tokens, and an
//! in-process mock of the realty API that records every call.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use models::claims::{Header, encode_segment};
use models::{AdminLevel, AdminProfile, AgentProfile, Claims, MemberProfile, Profile, Role};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

pub fn member(updated_at: OffsetDateTime) -> Profile {
    Profile::User(MemberProfile {
        id: Uuid::nil(),
        name: "Ada Obi".to_owned(),
        email: "ada@example.com".to_owned(),
        phone: None,
        avatar_url: None,
        updated_at,
    })
}

pub fn agent(updated_at: OffsetDateTime) -> Profile {
    Profile::Agent(AgentProfile {
        id: Uuid::nil(),
        name: "Tunde Agent".to_owned(),
        email: "tunde@agency.example".to_owned(),
        phone: Some("+2348000000000".to_owned()),
        avatar_url: None,
        agency: Some("Lekki Homes".to_owned()),
        verified: true,
        updated_at,
    })
}

pub fn admin(updated_at: OffsetDateTime) -> Profile {
    Profile::Admin(AdminProfile {
        id: Uuid::nil(),
        name: "Root".to_owned(),
        email: "root@realty.example".to_owned(),
        level: AdminLevel::Super,
        updated_at,
    })
}

/// Structurally valid HS256 token with a dummy signature. Client code never
/// verifies signatures, so this is all it can see.
pub fn token(role: Role, exp: i64) -> String {
    let header = encode_segment(&Header::hs256()).unwrap();
    let claims = encode_segment(&Claims { sub: Uuid::nil(), role, iat: exp - 86_400, exp }).unwrap();
    format!("{header}.{claims}.c2ln")
}

pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

/// Mock API bound to an ephemeral local port. Unrouted calls are recorded
/// too and answered 404.
pub struct MockApi {
    pub base: Url,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockApi {
    pub async fn start(router: Router) -> Self {
        let calls: Arc<Mutex<Vec<Call>>> = Arc::default();
        let recorder = calls.clone();
        let app = router.fallback(|| async { StatusCode::NOT_FOUND }).layer(middleware::from_fn(move |req: Request, next: Next| {
            let recorder = recorder.clone();
            async move { record(recorder, req, next).await }
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base: Url::parse(&format!("http://{addr}")).unwrap(), calls }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }
}

async fn record(calls: Arc<Mutex<Vec<Call>>>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    calls.lock().unwrap().push(Call {
        method: parts.method.to_string(),
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(str::to_owned),
        authorization: parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
