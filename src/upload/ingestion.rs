//! Bounded polling of a created element's ingestion state

use crate::api::queries::{self, INGESTION_ERROR_MESSAGE_TRAIT, INGESTION_STATE_TRAIT};
use crate::api::Transport;
use crate::config::IngestionPolicy;
use crate::error::IngestionError;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionStatus {
    Succeeded,
    Failed { message: Option<String> },
}

/// What one poll of an element reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Done(IngestionStatus),
    /// No `ingestionState` on the element
    Unreadable,
}

/// States seen in practice: `transferring`, `processing`, `complete_success`,
/// `complete_failure`.
pub fn read_state(element: &Value) -> PollState {
    let Some(state) = element.get("ingestionState").and_then(Value::as_str) else {
        return PollState::Unreadable;
    };

    if state.contains("success") {
        PollState::Done(IngestionStatus::Succeeded)
    } else if state.contains("failure") {
        let message = element
            .get("traits")
            .and_then(|t| t.get(INGESTION_STATE_TRAIT))
            .and_then(|s| s.get(INGESTION_ERROR_MESSAGE_TRAIT))
            .and_then(Value::as_str)
            .map(str::to_string);
        PollState::Done(IngestionStatus::Failed { message })
    } else {
        PollState::Pending
    }
}

/// Poll until the element reaches a terminal state or `policy.timeout` elapses
pub async fn await_ingestion(
    transport: &dyn Transport,
    workspace_id: &str,
    element_id: &str,
    policy: &IngestionPolicy,
) -> Result<IngestionStatus, IngestionError> {
    tokio::time::timeout(
        policy.timeout,
        poll_until_terminal(transport, workspace_id, element_id, policy.poll_interval),
    )
    .await
    .map_err(|_| IngestionError::Timeout {
        element_id: element_id.to_string(),
        waited: policy.timeout,
    })?
}

async fn poll_until_terminal(
    transport: &dyn Transport,
    workspace_id: &str,
    element_id: &str,
    interval: Duration,
) -> Result<IngestionStatus, IngestionError> {
    loop {
        let data = transport
            .run_query(queries::ingestion_status(workspace_id, element_id))
            .await?;

        let element = data
            .get("elements")
            .and_then(|e| e.get(0))
            .ok_or_else(|| IngestionError::MissingStatus(element_id.to_string()))?;

        match read_state(element) {
            PollState::Done(status) => return Ok(status),
            PollState::Unreadable => {
                return Err(IngestionError::MissingStatus(element_id.to_string()))
            }
            PollState::Pending => {
                tracing::debug!(element_id, "Ingestion still in progress");
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> IngestionPolicy {
        IngestionPolicy {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_failure_message_from_traits() {
        let element = json!({
            "ingestionState": "complete_failure",
            "traits": {
                "http://bluescape.dev/zygote/v1/ingestionState": {
                    "http://bluescape.dev/zygote/v1/ingestionState/errorCode": "ASSET_PROCESSING_UNSUPPORTED_SIZE",
                    "http://bluescape.dev/zygote/v1/ingestionState/errorMessage": "Video size greater than maximum"
                }
            }
        });
        assert_eq!(
            read_state(&element),
            PollState::Done(IngestionStatus::Failed {
                message: Some("Video size greater than maximum".to_string())
            })
        );
        assert_eq!(read_state(&json!({ "ingestionState": "processing" })), PollState::Pending);
        assert_eq!(read_state(&json!({})), PollState::Unreadable);
    }

    #[tokio::test]
    async fn test_polls_until_success() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let transport = MockTransport::new().on("getElementIngestionStatus", move |_| {
            let state = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => "transferring",
                1 => "processing",
                _ => "complete_success",
            };
            Ok(json!({ "elements": [{ "ingestionState": state, "traits": {} }] }))
        });

        let status = await_ingestion(&transport, "ws-1", "el-1", &fast_policy())
            .await
            .unwrap();
        assert_eq!(status, IngestionStatus::Succeeded);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(
            transport.requests()[0].variables["elementId"],
            "el-1"
        );
    }

    #[tokio::test]
    async fn test_times_out_when_never_terminal() {
        let transport = MockTransport::new().on("getElementIngestionStatus", |_| {
            Ok(json!({ "elements": [{ "ingestionState": "processing" }] }))
        });
        let policy = IngestionPolicy {
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(40),
        };

        let result = await_ingestion(&transport, "ws-1", "el-1", &policy).await;
        assert!(matches!(result, Err(IngestionError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_missing_element_is_an_error() {
        let transport = MockTransport::new()
            .on("getElementIngestionStatus", |_| Ok(json!({ "elements": [] })));
        let result = await_ingestion(&transport, "ws-1", "el-1", &fast_policy()).await;
        assert!(matches!(result, Err(IngestionError::MissingStatus(_))));
    }
}
