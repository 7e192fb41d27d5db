//! Domain records: users, batches and the material lines inside them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::role::{Role, is_cutter};
use crate::station::Station;

/// Pieces produced per declared cutting line.
pub const PIECES_PER_LINE: i64 = 5;

/// Stored counts fit a 32-bit integer column.
pub const MAX_COUNT: i64 = i32::MAX as i64;
pub const MIN_COUNT: i64 = i32::MIN as i64;

/// Largest unit count whose derived piece count still fits [`MAX_COUNT`].
pub const MAX_UNIT_COUNT: i64 = MAX_COUNT / PIECES_PER_LINE;

pub const MAX_BATCH_NUMBER_LEN: usize = 50;
pub const MAX_COLOR_LEN: usize = 100;

/// Chat account identity as delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub chat_id: ChatId,
    pub name: String,
    /// Stored role label. Usually canonical, but legacy or unknown values are
    /// kept verbatim.
    pub role: String,
    /// Machine label, only meaningful for four-needle operators.
    pub equipment: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn is_cutter(&self) -> bool {
        is_cutter(&self.role)
    }

    pub fn station(&self) -> Option<Station> {
        self.role().and_then(Role::station)
    }

    pub fn role_display(&self) -> String {
        match self.role() {
            Some(role) => role.display_name().to_string(),
            None => self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub chat_id: ChatId,
    pub name: String,
    pub role: String,
    pub equipment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    /// Human assigned, unique, not necessarily numeric.
    pub number: String,
    pub design: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Progress recorded by one station on one material line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Display name snapshot taken when the slot was written.
    pub worker: Option<String>,
    /// Row id of the worker who wrote the slot.
    pub worker_id: Option<i64>,
    pub quantity: Option<i64>,
}

impl Slot {
    /// A slot counts as done once both a worker and a non-zero quantity are set.
    pub fn is_done(&self) -> bool {
        let has_worker = self.worker.as_deref().is_some_and(|w| !w.trim().is_empty());
        has_worker && self.quantity.is_some_and(|q| q != 0)
    }

    /// Whether this slot was written by `user`: same identity, or the same
    /// display name ignoring case for rows written before identities were
    /// tracked.
    pub fn belongs_to(&self, user: &User) -> bool {
        if let Some(worker_id) = self.worker_id {
            return worker_id == user.id;
        }
        self.worker
            .as_deref()
            .is_some_and(|w| w.to_lowercase() == user.name.to_lowercase())
    }
}

/// What gets written into a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub worker: String,
    pub worker_id: Option<i64>,
    pub quantity: i64,
}

impl SlotEntry {
    pub fn by(user: &User, quantity: i64) -> Self {
        Self {
            worker: user.name.clone(),
            worker_id: Some(user.id),
            quantity,
        }
    }
}

/// One color within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub id: i64,
    pub batch_id: i64,
    pub color: String,
    pub unit_count: i64,
    pub piece_count: i64,
    pub slots: BTreeMap<Station, Slot>,
    pub created_at: DateTime<Utc>,
}

impl MaterialLine {
    pub fn slot(&self, station: Station) -> Slot {
        self.slots.get(&station).cloned().unwrap_or_default()
    }

    /// Sum of every recorded slot quantity on this line.
    pub fn completed_total(&self) -> i64 {
        saturating_sum(self.slots.values().filter_map(|s| s.quantity))
    }
}

/// Sum that clamps instead of overflowing.
pub fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0, i64::saturating_add)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMaterial {
    pub batch_id: i64,
    pub color: String,
    pub unit_count: i64,
    pub piece_count: i64,
}

impl NewMaterial {
    /// Derive the piece count from the declared unit count.
    pub fn new(batch_id: i64, color: impl Into<String>, unit_count: i64) -> Self {
        Self {
            batch_id,
            color: color.into(),
            unit_count,
            piece_count: unit_count.saturating_mul(PIECES_PER_LINE),
        }
    }
}
