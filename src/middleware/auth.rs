use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{AccountStatus, Actor, Role};
use crate::AppState;

/// Session claims issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university_id: Option<Uuid>,
}

impl Claims {
    pub fn for_actor(actor: &Actor, exp: usize) -> Self {
        Self {
            sub: actor.user_id.to_string(),
            exp,
            role: actor.role.to_string(),
            status: Some(actor.status.to_string()),
            company_id: actor.company_id,
            university_id: actor.university_id,
        }
    }

    pub fn into_actor(self) -> Result<Actor> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".to_string()))?;
        let role: Role = self.role.parse().map_err(Error::Unauthorized)?;
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse().map_err(Error::Unauthorized)?,
            None => AccountStatus::default(),
        };
        Ok(Actor {
            user_id,
            role,
            status,
            company_id: self.company_id,
            university_id: self.university_id,
        })
    }
}

pub fn issue_token(secret: &str, claims: &Claims) -> Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Resolves the bearer token into an [`Actor`] request extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data.claims,
        Err(_) => return unauthorized("invalid_token"),
    };

    match claims.into_actor() {
        Ok(actor) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "rejected token claims");
            unauthorized("invalid_claims")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_resolve_to_actor() {
        let company = Uuid::new_v4();
        let actor = Actor::company(Uuid::new_v4(), Role::CompanyRecruiter, company);
        let resolved = Claims::for_actor(&actor, usize::MAX).into_actor().unwrap();
        assert_eq!(resolved, actor);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: usize::MAX,
            role: "janitor".into(),
            status: None,
            company_id: None,
            university_id: None,
        };
        assert_eq!(claims.into_actor().unwrap_err().kind(), "unauthorized");
    }
}
