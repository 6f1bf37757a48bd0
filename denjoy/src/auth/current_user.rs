use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    api::envelope::{ApiError, RequestId},
    auth::session,
    db::models::profiles::Profile,
    errors::Error,
    types::{UserId, abbrev_uuid},
};

/// The authenticated caller.
///
/// `profile` is `None` for users who signed up but never finished onboarding; endpoints that only
/// need an identity (consume, withdrawal) accept them, role-gated endpoints do not.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
    pub profile: Option<Profile>,
}

impl CurrentUser {
    /// Best known email: the profile's, else the token's
    pub fn email(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .map(|p| p.email.as_str())
            .or(self.email.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .or(self.email())
            .unwrap_or("A DenJOY user")
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, Error> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(Error::Unauthenticated { message: None })?;

    let value = header.to_str().map_err(|_| Error::Unauthenticated {
        message: Some("Invalid Authorization header".to_string()),
    })?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(Error::Unauthenticated {
            message: Some("Expected a Bearer token".to_string()),
        })
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, Error> {
    let token = bearer_token(parts)?;
    let claims = session::verify_access_token(token, &state.config.auth)?;
    let profile = state.store.get_profile(claims.sub).await?;

    trace!(user_id = %abbrev_uuid(&claims.sub), has_profile = profile.is_some(), "Authenticated caller");

    Ok(CurrentUser {
        id: claims.sub,
        email: claims.email,
        profile,
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await
            .map_err(|e| RequestId::from_headers(&parts.headers).error(e))
    }
}
