use tellina_client::ApiError;
use tellina_core::error::CoreError;
use tellina_core::view::NoticeKind;

/// Failure of a widget operation.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// Rejected locally before or after talking to the backend.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The backend request failed.
    #[error(transparent)]
    Backend(#[from] ApiError),
}

impl WidgetError {
    /// How the failure is surfaced to the user.
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::Core(CoreError::Internal(_)) => NoticeKind::Server,
            Self::Core(_) => NoticeKind::Alert,
            Self::Backend(e) if e.is_transport() => NoticeKind::Transport,
            Self::Backend(_) => NoticeKind::Server,
        }
    }

    /// Text shown in the notice. Validation messages are shown verbatim.
    pub fn notice_message(&self) -> String {
        match self {
            Self::Core(CoreError::Validation(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellina_core::update::REJECTION_COMMENT_TOO_SHORT;

    #[test]
    fn test_validation_notice_is_verbatim_alert() {
        let err = WidgetError::from(CoreError::Validation(REJECTION_COMMENT_TOO_SHORT.to_string()));
        assert_eq!(err.notice_kind(), NoticeKind::Alert);
        assert_eq!(err.notice_message(), REJECTION_COMMENT_TOO_SHORT);
    }

    #[test]
    fn test_aborted_operation_is_server_notice() {
        let err = WidgetError::from(CoreError::Internal("Widget operation aborted".to_string()));
        assert_eq!(err.notice_kind(), NoticeKind::Server);
    }

    #[test]
    fn test_backend_failures_are_server_notices() {
        let err = WidgetError::from(ApiError::ApiError {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.notice_kind(), NoticeKind::Server);
        assert!(err.notice_message().contains("500"));

        let err = WidgetError::from(ApiError::UnexpectedStatus {
            endpoint: "accept_update",
            expected: "ACCEPT_UPDATE_SUCCESS",
            actual: None,
        });
        assert_eq!(err.notice_kind(), NoticeKind::Server);
    }
}
