//! Wires host-process events into the recorder.
//!
//! The host publishes [`HostEvent`]s on a [`HostEvents`] channel; an attached
//! [`AnalyticsProvider`] turns navigations into page views and errors into
//! error events until its [`Subscription`] is dropped or unsubscribed.

use nexus_core::CustomParameters;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::recorder::{Analytics, ErrorReport};

const DEFAULT_CAPACITY: usize = 256;

/// Something that happened in the host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Navigated {
        url: String,
    },
    Error {
        message: String,
        filename: Option<String>,
        lineno: Option<u32>,
        colno: Option<u32>,
    },
    UnhandledRejection {
        reason: String,
    },
}

/// Broadcast channel of host events.
#[derive(Debug, Clone)]
pub struct HostEvents {
    tx: broadcast::Sender<HostEvent>,
}

impl HostEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: HostEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for HostEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Handle to an attached provider. Detaches on drop.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop listening for host events.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Analytics provider detached");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

pub struct AnalyticsProvider;

impl AnalyticsProvider {
    /// Start recording host events. Must be called from within a Tokio
    /// runtime.
    pub fn attach(analytics: Arc<Analytics>, events: &HostEvents) -> Subscription {
        let mut rx = events.subscribe();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => Self::handle(&analytics, event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Analytics provider lagged, host events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription { task: Some(task) }
    }

    fn handle(analytics: &Analytics, event: HostEvent) {
        match event {
            HostEvent::Navigated { url } => analytics.navigate(url),
            HostEvent::Error {
                message,
                filename,
                lineno,
                colno,
            } => {
                let mut context = CustomParameters::new();
                context.insert("filename".into(), filename.map_or(Value::Null, Value::from));
                context.insert("lineno".into(), lineno.map_or(Value::Null, Value::from));
                context.insert("colno".into(), colno.map_or(Value::Null, Value::from));
                context.insert("type".into(), Value::from("unhandled_error"));
                analytics.track_error(&ErrorReport::new("Error", message), Some(context));
            }
            HostEvent::UnhandledRejection { reason } => {
                let mut context = CustomParameters::new();
                context.insert("type".into(), Value::from("unhandled_rejection"));
                analytics.track_error(&ErrorReport::new("Error", reason), Some(context));
            }
        }
    }
}

/// Publish every panic as a [`HostEvent::Error`], then run the previously
/// installed hook.
pub fn forward_panics(events: HostEvents) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        let location = info.location();

        events.publish(HostEvent::Error {
            message,
            filename: location.map(|l| l.file().to_string()),
            lineno: location.map(|l| l.line()),
            colno: location.map(|l| l.column()),
        });

        previous(info);
    }));
}
