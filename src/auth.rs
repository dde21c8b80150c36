// Authorization gate for the request pipeline.
//
// Purpose
// - Decide, before a handler runs, whether a request may proceed. A denial
//   is a normal outcome carried as a value, not an error: the pipeline
//   short-circuits on it without ever touching the store.
//
// Boundaries
// - No token validation algorithm lives here. The gate either allows
//   everything or delegates to an injected checker; what that checker does
//   with the credentials is the caller's business.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;

/// The request metadata a checker may inspect.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

impl RequestContext {
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            authorization: request
                .headers()
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// The injected pass/fail check. May await once (e.g. a token lookup) but
/// must not mutate anything.
#[async_trait]
pub trait ApiAuthorizer: Send + Sync {
    async fn authorize(&self, context: &RequestContext) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny,
}

#[derive(Clone)]
pub enum AuthorizationGate {
    /// Always allow. Internal and test wiring.
    NoAuthorization,
    /// Delegate to an injected checker.
    Api(Arc<dyn ApiAuthorizer>),
}

impl AuthorizationGate {
    pub fn no_authorization() -> Self {
        Self::NoAuthorization
    }

    pub fn api(checker: impl ApiAuthorizer + 'static) -> Self {
        Self::Api(Arc::new(checker))
    }

    pub async fn evaluate(&self, context: &RequestContext) -> AuthDecision {
        match self {
            Self::NoAuthorization => AuthDecision::Allow,
            Self::Api(checker) => {
                if checker.authorize(context).await {
                    AuthDecision::Allow
                } else {
                    AuthDecision::Deny
                }
            }
        }
    }
}

#[cfg(test)]
mod authorization_gate_tests {
    use super::*;
    use rstest::rstest;

    struct HeaderPresent;

    #[async_trait]
    impl ApiAuthorizer for HeaderPresent {
        async fn authorize(&self, context: &RequestContext) -> bool {
            context.authorization.is_some()
        }
    }

    fn context(authorization: Option<&str>) -> RequestContext {
        RequestContext {
            method: "POST".into(),
            path: "/events".into(),
            authorization: authorization.map(str::to_string),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_always_allow_without_authorization() {
        let gate = AuthorizationGate::no_authorization();
        assert_eq!(gate.evaluate(&context(None)).await, AuthDecision::Allow);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_delegate_to_the_injected_checker() {
        let gate = AuthorizationGate::api(HeaderPresent);
        assert_eq!(
            gate.evaluate(&context(Some("Bearer t"))).await,
            AuthDecision::Allow
        );
        assert_eq!(gate.evaluate(&context(None)).await, AuthDecision::Deny);
    }
}
