//! Bearer token authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{error::ApiError, state::AppState};

/// The bearer token a request was authenticated with
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

/// Resolve the bearer token to a user and attach it to the request
///
/// Handlers behind this layer read the caller from `Extension<User>` and the
/// presented token from `Extension<AccessToken>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(authorization) =
        bearer.ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;
    let token = authorization.token();

    let user = state.authenticator.resolve(token).await?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(AccessToken(token.to_string()));

    Ok(next.run(req).await)
}
