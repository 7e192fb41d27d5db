//! Per-chat conversation context.
//!
//! Each chat identity owns one [`Session`]: the stage of whichever form it is
//! filling in, and the batch it last worked on. Sessions live in memory only
//! and are lost on restart. A turn holds the session's lock for its whole
//! duration, so events from one chat are handled strictly in order.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::ChatId;
use crate::station::Station;

/// A batch carried through a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRef {
    pub id: i64,
    pub number: String,
}

/// The material line picked during a station recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    pub id: i64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingStep {
    SelectingBatch,
    SelectingColor { batch: BatchRef },
    AwaitingEquipment { batch: BatchRef, line: LineRef },
    AwaitingCount { batch: BatchRef, line: LineRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStep {
    SelectingBatch,
    SelectingEntry {
        batch: BatchRef,
    },
    AwaitingCount {
        batch: BatchRef,
        line: LineRef,
        station: Station,
        previous: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAdminStep {
    ChoosingAction,
    SelectingTarget,
    Confirming { user_id: i64, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchAdminStep {
    ChoosingAction,
    SelectingTarget,
    Confirming { number: String, line_count: usize },
}

/// Which input the chat is expected to send next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    AwaitingName,
    AwaitingRole {
        name: String,
    },
    AwaitingBatchNumber,
    AwaitingDesign {
        number: String,
    },
    AwaitingColor {
        batch: BatchRef,
    },
    AwaitingUnitCount {
        batch: BatchRef,
        color: String,
    },
    RenamingColor {
        line: LineRef,
        batch_id: i64,
    },
    ConfirmingMaterialDelete {
        line: LineRef,
        batch_id: i64,
    },
    Recording {
        station: Station,
        step: RecordingStep,
    },
    ChangingEquipment,
    Editing(EditStep),
    ManagingUsers(UserAdminStep),
    ManagingBatches(BatchAdminStep),
}

impl Stage {
    /// Stages that consume the next free-text message as input.
    pub fn expects_text(&self) -> bool {
        matches!(
            self,
            Stage::AwaitingName
                | Stage::AwaitingBatchNumber
                | Stage::AwaitingDesign { .. }
                | Stage::AwaitingColor { .. }
                | Stage::AwaitingUnitCount { .. }
                | Stage::RenamingColor { .. }
                | Stage::ChangingEquipment
                | Stage::Recording {
                    step: RecordingStep::AwaitingEquipment { .. } | RecordingStep::AwaitingCount { .. },
                    ..
                }
                | Stage::Editing(EditStep::AwaitingCount { .. })
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Stage::Idle)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub stage: Stage,
    /// Batch number the chat last opened or recorded against.
    pub current_batch: Option<String>,
    touched: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            current_batch: None,
            touched: Instant::now(),
        }
    }
}

impl Session {
    pub fn touch(&mut self) {
        self.touched = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.touched.elapsed()
    }

    /// Back to idle, keeping the current batch.
    pub fn clear(&mut self) {
        self.stage = Stage::Idle;
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.current_batch = None;
    }
}

/// All live sessions, keyed by chat identity
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<ChatId, Arc<Mutex<Session>>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Lock the session for `chat`, creating it on first contact.
    pub async fn lock(&self, chat: ChatId) -> OwnedMutexGuard<Session> {
        let cell = self
            .sessions
            .entry(chat)
            .or_insert_with(|| Arc::new(Mutex::new(Session::default())))
            .clone();
        let mut session = cell.lock_owned().await;
        session.touch();
        session
    }

    /// Snapshot of a session's stage, for diagnostics and tests.
    pub async fn stage(&self, chat: ChatId) -> Stage {
        let cell = self.sessions.get(&chat).map(|entry| entry.value().clone());
        match cell {
            Some(cell) => cell.lock().await.stage.clone(),
            None => Stage::Idle,
        }
    }

    /// Drop sessions idle for longer than the configured TTL. Sessions in the
    /// middle of a turn are never evicted.
    pub fn evict_idle(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions.retain(|_, cell| match cell.try_lock() {
            Ok(session) => session.idle_for() < ttl,
            Err(_) => true,
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::debug!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
