//! Resolution of the calling principal from the `Authorization` header.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use folio_authz::{Principal, PrincipalDirectory};

use crate::error::AppError;

/// The principal a request is made on behalf of.
///
/// Requests without credentials are anonymous; unknown or malformed bearer
/// tokens are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    Arc<PrincipalDirectory>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(Principal::anonymous()));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::unauthorized("Malformed authorization header.")
                    .with_code("rest_invalid_token")
            })?;

        let directory = Arc::<PrincipalDirectory>::from_ref(state);
        directory
            .resolve(token)
            .cloned()
            .map(Self)
            .ok_or_else(|| {
                AppError::unauthorized("Invalid bearer token.").with_code("rest_invalid_token")
            })
    }
}
