//! Endpoint authorization.
//!
//! Every saga and proxy endpoint has its own static secret. The `Authorization`
//! header must equal that secret exactly; comparison is constant-time. The
//! [`Authorized`] extractor is parameterised by a scope marker naming which
//! secret applies:
//!
//! ```ignore
//! async fn refund(_auth: Authorized<scope::Refund>, body: String) -> ... { }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::config::EndpointSecrets;
use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

/// An endpoint secret.
pub trait EndpointScope: Send + Sync + 'static {
    /// Scope name, for logs.
    const NAME: &'static str;

    /// The secret this scope checks against.
    fn secret(secrets: &EndpointSecrets) -> &str;
}

/// Proof that the request carried the secret of scope `S`.
#[derive(Debug)]
pub struct Authorized<S>(PhantomData<S>);

#[async_trait]
impl<S: EndpointScope> FromRequestParts<Arc<AppState>> for Authorized<S> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let expected = S::secret(&state.config.endpoint_secrets);
        if expected.is_empty() {
            tracing::warn!(scope = S::NAME, "Endpoint secret not configured - rejecting");
            return Err(ApiError::Unauthorized);
        }

        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        if !constant_time_eq(provided, expected) {
            tracing::debug!(scope = S::NAME, "Endpoint secret mismatch");
            return Err(ApiError::Unauthorized);
        }

        Ok(Self(PhantomData))
    }
}

macro_rules! endpoint_scopes {
    ($($(#[$meta:meta])* $name:ident => $field:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub struct $name;

            impl EndpointScope for $name {
                const NAME: &'static str = stringify!($field);

                fn secret(secrets: &EndpointSecrets) -> &str {
                    &secrets.$field
                }
            }
        )*
    };
}

/// Scope markers, one per secret.
pub mod scope {
    use super::{EndpointScope, EndpointSecrets};

    endpoint_scopes! {
        /// `POST /notifications`.
        Relay => relay,
        /// `POST /payments/success`.
        PaymentSuccess => payment_success,
        /// `POST /payments/refund`.
        Refund => refund,
        /// `POST /subscriptions/initial-purchase`.
        InitialPurchase => initial_purchase,
        /// `POST /subscriptions/renewal`.
        Renewal => renewal,
        /// `POST /subscriptions/expiration`.
        Expiration => expiration,
        /// `POST /payments/intents`.
        PaymentIntent => payment_intent,
        /// `POST /identity/verification-sessions`.
        IdentitySession => identity_session,
    }
}
