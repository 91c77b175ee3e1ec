//! Notification rendering and delivery.

use crate::error::AppError;
use crate::models::Transition;
use serde::Serialize;

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Transition {
    /// Render this transition as a notification.
    pub fn notification(&self) -> Notification {
        match self {
            Self::PipelineChanged {
                title, new_status, ..
            } => Notification {
                title: format!("Pipeline {}", new_status.display_name()),
                body: title.clone(),
            },
            Self::NewApproval {
                title,
                approver_name,
                ..
            } => Notification {
                title: "MR Approved".to_string(),
                body: format!("{} approved: {}", approver_name, title),
            },
        }
    }
}

/// Somewhere notifications can be delivered.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), AppError>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        log::info!(
            "[notify] {}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Deliver one notification per transition, in order.
///
/// A delivery failure is logged and does not stop the rest of the batch.
/// Returns the number delivered.
pub fn dispatch<S>(sink: &S, transitions: &[Transition]) -> usize
where
    S: NotificationSink + ?Sized,
{
    transitions
        .iter()
        .map(Transition::notification)
        .filter(|notification| match sink.notify(notification) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[notify] Failed to deliver '{}': {}", notification.title, e);
                false
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PipelineStatus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<Notification>>,
        fail_titles: Vec<String>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: &Notification) -> Result<(), AppError> {
            if self.fail_titles.contains(&notification.title) {
                return Err(AppError::internal("notification center unavailable"));
            }
            self.delivered.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn pipeline_passed() -> Transition {
        Transition::PipelineChanged {
            mr_id: 1,
            title: "Fix login".to_string(),
            old_status: PipelineStatus::Running,
            new_status: PipelineStatus::Success,
        }
    }

    fn approved_by_jane() -> Transition {
        Transition::NewApproval {
            mr_id: 1,
            title: "Fix login".to_string(),
            approver_name: "Jane".to_string(),
        }
    }

    #[test]
    fn test_pipeline_notification() {
        assert_eq!(
            pipeline_passed().notification(),
            Notification {
                title: "Pipeline Passed".to_string(),
                body: "Fix login".to_string(),
            }
        );
    }

    #[test]
    fn test_approval_notification() {
        assert_eq!(
            approved_by_jane().notification(),
            Notification {
                title: "MR Approved".to_string(),
                body: "Jane approved: Fix login".to_string(),
            }
        );
    }

    #[test]
    fn test_dispatch_delivers_in_order() {
        let sink = RecordingSink::default();
        let delivered = dispatch(&sink, &[pipeline_passed(), approved_by_jane()]);

        assert_eq!(delivered, 2);
        let titles: Vec<String> = sink
            .delivered
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.title.clone())
            .collect();
        assert_eq!(titles, vec!["Pipeline Passed", "MR Approved"]);
    }

    #[test]
    fn test_dispatch_continues_after_failure() {
        let sink = RecordingSink {
            fail_titles: vec!["Pipeline Passed".to_string()],
            ..Default::default()
        };
        let delivered = dispatch(&sink, &[pipeline_passed(), approved_by_jane()]);

        assert_eq!(delivered, 1);
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_log_notifier_never_fails() {
        assert_eq!(dispatch(&LogNotifier, &[approved_by_jane()]), 1);
    }
}
