use crate::error::AuthError;
use crate::models::AuthContext;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, AUTHORIZATION},
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (caller identity)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}

/// Bearer token gate for the analysis routes
///
/// Validates an HS256 token and places an [`AuthContext`] in the request
/// extensions. Rejected requests never reach the handlers.
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
        }
    }

    pub fn authenticate(&self, header: Option<&HeaderValue>) -> Result<AuthContext, AuthError> {
        let header = header
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidScheme)?;

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    tracing::debug!("JWT validation failed: {}", e);
                    AuthError::InvalidToken
                }
            })?;

        let subject = token_data.claims.sub.trim();
        if subject.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthContext::new(subject))
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthService {
            service: Rc::new(service),
            auth: self.clone(),
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    auth: JwtAuth,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.auth.authenticate(req.headers().get(AUTHORIZATION)) {
            Ok(context) => {
                req.extensions_mut().insert(context);
                let service = self.service.clone();
                Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(err) => {
                tracing::warn!(path = %req.path(), reason = err.reason(), "Rejected unauthenticated request");
                let response = err.error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

/// FromRequest implementation for AuthContext
impl actix_web::FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthContext>() {
            Some(context) => ready(Ok(context.clone())),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn token(sub: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let auth = JwtAuth::new(SECRET);
        let context = auth.authenticate(Some(&bearer(&token("seller-42", 3600)))).unwrap();
        assert_eq!(context.subject(), "seller-42");
    }

    #[test]
    fn test_missing_header() {
        let auth = JwtAuth::new(SECRET);
        assert_eq!(auth.authenticate(None), Err(AuthError::MissingCredentials));
    }

    #[test]
    fn test_wrong_scheme() {
        let auth = JwtAuth::new(SECRET);
        let header = HeaderValue::from_static("Basic dXNlcjpwYXNz");
        assert_eq!(auth.authenticate(Some(&header)), Err(AuthError::InvalidScheme));
    }

    #[test]
    fn test_expired_token() {
        let auth = JwtAuth::new(SECRET);
        let result = auth.authenticate(Some(&bearer(&token("seller-42", -3600))));
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn test_token_signed_with_other_secret() {
        let auth = JwtAuth::new("a-completely-different-secret-of-32-bytes");
        let result = auth.authenticate(Some(&bearer(&token("seller-42", 3600))));
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let auth = JwtAuth::new(SECRET);
        let result = auth.authenticate(Some(&bearer(&token("  ", 3600))));
        assert_eq!(result, Err(AuthError::InvalidToken));
    }
}
