//! Call-site watchers for outgoing client calls and health checks

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::TargetKind;
use tracing::{debug, warn};

use crate::engine_impl::ChaosEngine;
use crate::error::ChaosResult;

/// Status codes a substituted outgoing response may carry
pub const ERROR_STATUS_CODES: [u16; 5] = [500, 400, 403, 401, 404];
pub const ERROR_STATUS_TEXT: &str = "This error is generated by Chaos Monkey";
pub const ERROR_BODY_MESSAGE: &str = "This is a Chaos Monkey generated failure";

/// Synthetic response returned in place of a real outgoing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub status_text: String,
    pub body: serde_json::Value,
}

impl ErrorResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            status_text: ERROR_STATUS_TEXT.to_string(),
            body: json!({ "error": ERROR_BODY_MESSAGE }),
        }
    }

    /// Response with a status drawn from `ERROR_STATUS_CODES`
    pub fn random() -> Self {
        let status = ERROR_STATUS_CODES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(500);
        Self::with_status(status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchedResponse<T> {
    /// The real response, untouched
    Passed(T),
    /// The injected fault fired and replaced the response
    Substituted(ErrorResponse),
}

impl<T> WatchedResponse<T> {
    pub fn is_substituted(&self) -> bool {
        matches!(self, WatchedResponse::Substituted(_))
    }
}

/// Wraps outgoing client calls with `REST_CLIENT_CALL` evaluation
#[derive(Clone)]
pub struct OutgoingCallWatcher {
    engine: Arc<ChaosEngine>,
}

impl OutgoingCallWatcher {
    pub fn new(engine: Arc<ChaosEngine>) -> Self {
        Self { engine }
    }

    /// Run `call`, then evaluate chaos for it
    ///
    /// An injected fault turns into a synthetic error response; any other engine error is
    /// returned as is.
    pub async fn watch<T, F, Fut>(&self, signature: &str, call: F) -> ChaosResult<WatchedResponse<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let response = call().await;

        match self.engine.evaluate(TargetKind::RestClientCall, signature).await {
            Ok(_) => Ok(WatchedResponse::Passed(response)),
            Err(e) if e.is_injected() => {
                let substitute = ErrorResponse::random();
                debug!(signature, status = substitute.status, "Outgoing response replaced: {}", e);
                Ok(WatchedResponse::Substituted(substitute))
            }
            Err(e) => Err(e),
        }
    }
}

/// Reported health of a watched check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum Health {
    Up,
    Down { reason: String },
}

impl Health {
    pub fn down(reason: impl Display) -> Self {
        Health::Down {
            reason: reason.to_string(),
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Health::Up)
    }
}

/// Wraps health checks with `ACTUATOR_HEALTH` evaluation; never propagates errors
#[derive(Clone)]
pub struct HealthWatcher {
    engine: Arc<ChaosEngine>,
}

impl HealthWatcher {
    pub fn new(engine: Arc<ChaosEngine>) -> Self {
        Self { engine }
    }

    pub async fn check<F, Fut, E>(&self, signature: &str, check: F) -> Health
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Health, E>>,
        E: Display,
    {
        let health = match check().await {
            Ok(health) => health,
            Err(e) => {
                warn!(signature, "⚠️ Health check failed: {}", e);
                return Health::down(e);
            }
        };

        match self.engine.evaluate(TargetKind::ActuatorHealth, signature).await {
            Ok(_) => health,
            Err(e) => {
                debug!(signature, "Health reported down by chaos: {}", e);
                Health::down(e)
            }
        }
    }
}
