use axum::{
    async_trait,
    middleware::Next,
    http::{Request, StatusCode},
    response::Response,
    body::Body,
    extract::FromRequest,
};

use crate::Response::ServerResponse;

/// Display name of the acting identity, resolved by the upstream identity
/// provider and forwarded as a header. Audit comments fall back to
/// "Customer Service Rep" and user comments to "Anonymous" when absent.
#[derive(Clone)]
pub struct ActorDescription {
    pub display_name: Option<String>,
}

impl ActorDescription {
    pub fn audit_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Customer Service Rep")
    }

    pub fn commenter_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Anonymous")
    }
}

#[async_trait]
impl<S, B> FromRequest<S, B> for ActorDescription
where
    B: Send + 'static,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request(req: Request<B>, _: &S) -> Result<Self, Self::Rejection> {
        if let Some(req) = req.extensions().get::<ActorDescription>() {
            Ok(req.clone())
        } else {
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[tracing::instrument(skip(req, next))]
pub async fn middleware(mut req: Request<Body>, next: Next<Body>) -> Result<Response, ServerResponse> {
    let display_name = req
        .headers()
        .get("x-actor-name")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty() && name.len() <= 64)
        .map(str::to_owned);
    req.extensions_mut().insert(ActorDescription { display_name });
    let response = next.run(req).await;
    Ok(response)
}
