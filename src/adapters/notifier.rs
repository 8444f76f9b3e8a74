//! Notification sinks
//!
//! Log-only, webhook, and fan-out implementations of [`Notifier`].

use reqwest::Client;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::flow::{Notification, NotificationKind, Notifier};

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(
                title = %notification.title,
                link = ?notification.link,
                "{}",
                notification.message
            ),
            NotificationKind::Failure => warn!(
                title = %notification.title,
                code = notification.error.as_ref().map(|e| e.code()),
                "{}",
                notification.message
            ),
        }
    }
}

/// Posts notifications as JSON to a webhook.
///
/// Deliveries run in the background; call [`WebhookNotifier::flush`] before
/// the runtime shuts down or they are cancelled.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl WebhookNotifier {
    /// Create a new webhook notifier with explicit URL
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Create from `SWAPFLOW_WEBHOOK_URL` if set
    pub fn from_env() -> Option<Self> {
        std::env::var("SWAPFLOW_WEBHOOK_URL").ok().map(|url| {
            info!("Webhook notifications enabled");
            Self::new(url)
        })
    }

    /// Deliveries started but not yet joined
    pub fn in_flight(&self) -> usize {
        self.tasks().len()
    }

    /// Wait up to `limit` for background deliveries.
    ///
    /// Returns how many were still pending when the limit ran out; those are
    /// aborted.
    pub async fn flush(&self, limit: Duration) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks());
        if tasks.is_empty() {
            return 0;
        }

        let drained = tokio::time::timeout(limit, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                pending = tasks.len(),
                "Webhook deliveries still pending at shutdown"
            );
        }
        let pending = tasks.len();
        tasks.abort_all();
        pending
    }

    fn tasks(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a notification and wait for the response
    pub async fn send(&self, notification: &Notification) -> Result<(), String> {
        match self
            .client
            .post(&self.webhook_url)
            .json(notification)
            .send()
            .await
        {
            Ok(resp) => {
                if resp.status().is_success() {
                    debug!("Webhook notification sent successfully");
                    Ok(())
                } else {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    error!("Webhook notification failed: {} - {}", status, body);
                    Err(format!("HTTP {}: {}", status, body))
                }
            }
            Err(e) => {
                error!("Webhook request failed: {}", e);
                Err(e.to_string())
            }
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, notification: Notification) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available, dropping webhook notification");
            return;
        };
        let this = self.clone();
        let mut tasks = self.tasks();
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(
            async move {
                let _ = this.send(&notification).await;
            },
            &runtime,
        );
    }
}

/// Delivers every notification to each inner sink
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, notification: Notification) {
        for sink in &self.sinks {
            sink.notify(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveSide, ErrorKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let fanout = FanoutNotifier::new()
            .with(first.clone())
            .with(second.clone())
            .with(Arc::new(TracingNotifier));
        assert_eq!(fanout.len(), 3);

        fanout.notify(Notification::failure(CurveSide::LeftCurve, ErrorKind::WouldRevert));

        assert_eq!(first.0.lock().unwrap().len(), 1);
        assert_eq!(
            second.0.lock().unwrap()[0].error,
            Some(ErrorKind::WouldRevert)
        );
    }

    #[test]
    fn test_webhook_without_runtime_drops_quietly() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        notifier.notify(Notification::success(CurveSide::RightCurve, "ok"));
        assert_eq!(notifier.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_flush_waits_for_background_delivery() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        notifier.notify(Notification::success(CurveSide::LeftCurve, "ok"));
        assert_eq!(notifier.in_flight(), 1);

        // Nothing listens on the discard port, so delivery fails fast
        let pending = notifier.flush(Duration::from_secs(10)).await;

        assert_eq!(pending, 0);
        assert_eq!(notifier.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_gives_up_after_limit() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        notifier.tasks().spawn(std::future::pending::<()>());

        let pending = notifier.flush(Duration::from_millis(50)).await;

        assert_eq!(pending, 1);
        assert_eq!(notifier.in_flight(), 0);
    }
}
