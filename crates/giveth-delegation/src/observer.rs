use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DelegationError;
use crate::plan::DelegationPlan;

/// Progress callbacks for one delegation action.
///
/// `on_created` fires once the transaction hash is known and the ledger has
/// been updated, `on_success` once it is mined. `on_error` can fire for a
/// ledger failure and again for a chain failure; `on_cancel` fires alone.
#[async_trait]
pub trait DelegationObserver: Send + Sync {
    /// Last chance to back out; returning `false` cancels the action.
    async fn confirm_submission(&self, _plan: &DelegationPlan) -> bool {
        true
    }

    async fn on_created(&self, _tx_link: &str) {}

    async fn on_success(&self, _tx_link: &str) {}

    async fn on_error(&self, _error: &DelegationError) {}

    async fn on_cancel(&self) {}
}

pub struct NoOpObserver;

#[async_trait]
impl DelegationObserver for NoOpObserver {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "detail")]
pub enum ObserverEvent {
    Created(String),
    Success(String),
    Error(String),
    Cancelled,
}

/// Records every callback; optionally declines submission.
#[derive(Debug)]
pub struct RecordingObserver {
    confirm: bool,
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self {
            confirm: true,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            confirm: false,
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ObserverEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DelegationObserver for RecordingObserver {
    async fn confirm_submission(&self, _plan: &DelegationPlan) -> bool {
        self.confirm
    }

    async fn on_created(&self, tx_link: &str) {
        self.record(ObserverEvent::Created(tx_link.to_string()));
    }

    async fn on_success(&self, tx_link: &str) {
        self.record(ObserverEvent::Success(tx_link.to_string()));
    }

    async fn on_error(&self, error: &DelegationError) {
        self.record(ObserverEvent::Error(error.to_string()));
    }

    async fn on_cancel(&self) {
        self.record(ObserverEvent::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_created("link").await;
        observer.on_error(&DelegationError::NothingToDelegate).await;
        observer.on_success("link").await;

        assert_eq!(
            observer.events(),
            vec![
                ObserverEvent::Created("link".into()),
                ObserverEvent::Error("nothing to delegate".into()),
                ObserverEvent::Success("link".into()),
            ]
        );
        assert_eq!(observer.errors(), vec!["nothing to delegate"]);
    }

    #[tokio::test]
    async fn noop_observer_confirms() {
        use giveth_chain::{SubmittedCall, WithdrawCall};
        use giveth_types::{Amount, PledgeId};

        let plan = DelegationPlan {
            action: crate::plan::DelegationAction::Refund,
            call: SubmittedCall::Withdraw(WithdrawCall {
                from: "0x1111111111111111111111111111111111111111".parse().unwrap(),
                pledge_id: PledgeId(1),
                amount: Amount::from(1u64),
            }),
            amount: Amount::from(1u64),
            shortfall: Amount::zero(),
            donations: vec![],
            comment: None,
        };
        assert!(NoOpObserver.confirm_submission(&plan).await);
        assert!(!RecordingObserver::declining().confirm_submission(&plan).await);
    }
}
