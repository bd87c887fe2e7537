use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::{auth::jwt::Identity, errors::AppError, state::AppState};

/// Per-request gate: extracts the bearer access token, validates it and
/// attaches the decoded identity. Absent header, malformed header, invalid
/// token and anonymous (empty) results all collapse to the same 401.
///
/// `active == false` is a soft flag on the account: token validity alone
/// decides authentication here, and only activation-gated flows consult the
/// account state.
#[derive(Debug, Clone)]
pub struct AuthIdentity(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        match state.sessions.validate_access(bearer.token()) {
            Ok(Some(identity)) => Ok(Self(identity)),
            _ => Err(AppError::Unauthorized),
        }
    }
}
