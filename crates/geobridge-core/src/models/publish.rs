use serde::{Deserialize, Serialize};

/// Message recorded when an identical asset already exists
pub const DUPLICATE_MESSAGE: &str = "duplicate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Failed,
    Succeeded,
}

/// Terminal value of one orchestrator or adapter run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub status: PublishStatus,
    pub destination_item_reference: Option<String>,
    pub destination_url: String,
    pub message: String,
}

impl PublishResult {
    pub fn succeeded(
        item_reference: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: PublishStatus::Succeeded,
            destination_item_reference: Some(item_reference.into()),
            destination_url: url.into(),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: PublishStatus::Failed,
            destination_item_reference: None,
            destination_url: String::new(),
            message: message.into(),
        }
    }

    pub fn duplicate() -> Self {
        Self::failed(DUPLICATE_MESSAGE)
    }

    pub fn is_duplicate(&self) -> bool {
        self.status == PublishStatus::Failed && self.message == DUPLICATE_MESSAGE
    }

    /// Terminal state this result corresponds to
    pub fn outcome(&self) -> RunOutcome {
        match self.status {
            PublishStatus::Succeeded => RunOutcome::Published,
            PublishStatus::Failed if self.is_duplicate() => RunOutcome::RejectedDuplicate,
            PublishStatus::Failed => RunOutcome::Failed,
        }
    }
}

/// Terminal states of a publish run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Published,
    RejectedDuplicate,
    Failed,
}

/// What a polling client sees for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    InProgress,
    Succeeded,
    Failed,
}

/// Poll response: status plus the progress transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: StatusState,
    pub result: Option<PublishResult>,
    pub logs: Vec<String>,
}

impl SessionStatus {
    pub fn in_progress(logs: Vec<String>) -> Self {
        Self { state: StatusState::InProgress, result: None, logs }
    }

    pub fn finished(result: PublishResult, logs: Vec<String>) -> Self {
        let state = match result.status {
            PublishStatus::Succeeded => StatusState::Succeeded,
            PublishStatus::Failed => StatusState::Failed,
        };
        Self { state, result: Some(result), logs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes() {
        assert_eq!(
            PublishResult::succeeded("item1", "https://host/item1", "ok").outcome(),
            RunOutcome::Published
        );
        assert_eq!(PublishResult::duplicate().outcome(), RunOutcome::RejectedDuplicate);
        assert_eq!(PublishResult::failed("boom").outcome(), RunOutcome::Failed);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PublishResult::duplicate()).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"message\":\"duplicate\""));
    }

    #[test]
    fn test_in_progress_is_distinct() {
        let status = SessionStatus::in_progress(vec![]);
        assert_eq!(status.state, StatusState::InProgress);
        assert!(status.result.is_none());

        let done = SessionStatus::finished(PublishResult::failed("x"), vec![]);
        assert_eq!(done.state, StatusState::Failed);
    }
}
