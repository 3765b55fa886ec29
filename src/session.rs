//! Completed work sessions
//!
//! The engine knows nothing about storage. A [`SessionSink`] subscribed with
//! [`record_sessions`] receives one [`TimerSession`] per completed work phase
//! and persists it however it likes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    notify::{EventKind, NotificationEvent, NotificationHub, Subscription},
    state::Phase,
};

/// A finished work phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub message: String,
    pub completed_at_utc: DateTime<Utc>,
    #[serde(default)]
    pub work_notes: Option<String>,
}

impl TimerSession {
    pub fn new(message: impl Into<String>, completed_at_utc: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            completed_at_utc,
            work_notes: None,
        }
    }

    /// Session for a completed work phase; `None` for any other event
    pub fn from_event(event: &NotificationEvent) -> Option<Self> {
        if event.kind != EventKind::PhaseCompleted || event.phase != Phase::Work {
            return None;
        }
        Some(Self::new(event.phase.as_str(), event.at_utc))
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.work_notes = Some(notes.into());
        self
    }

    pub fn completed_at_local(&self) -> DateTime<Local> {
        self.completed_at_utc.with_timezone(&Local)
    }
}

/// Destination for completed sessions
#[async_trait]
pub trait SessionSink: Send + Sync + 'static {
    async fn record(&self, session: TimerSession) -> anyhow::Result<()>;
}

/// Forward every completed work phase published on `hub` to `sink`
pub fn record_sessions(hub: &NotificationHub, sink: Arc<dyn SessionSink>) -> Subscription {
    hub.subscribe(move |event| {
        let sink = Arc::clone(&sink);
        async move {
            if let Some(session) = TimerSession::from_event(&event) {
                debug!("Recording session completed at {}", session.completed_at_utc);
                sink.record(session).await?;
            }
            anyhow::Ok(())
        }
    })
}

/// In-memory session log
#[derive(Debug, Clone, Default)]
pub struct MemorySessionLog {
    sessions: Arc<Mutex<Vec<TimerSession>>>,
}

impl MemorySessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<TimerSession> {
        self.sessions
            .lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionSink for MemorySessionLog {
    async fn record(&self, session: TimerSession) -> anyhow::Result<()> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock session log: {}", e))?
            .push(session);
        Ok(())
    }
}
