//! Reservation system.
//!
//! An advisory lock table of forward-looking holds on one resource,
//! consulted before a found window is committed:
//!
//! | Kind | Purpose | Storage |
//! |------|---------|---------|
//! | Block reservation | Activity tentatively placed, needs this resource later | [`IntervalIndex`] |
//! | Span reservation | Max-delay enforcement hold | [`IntervalIndex`] (only when enabled) |
//! | Move reservation | In-flight drag/drop target | Single slot |
//!
//! Holds carry activity identifiers only, never references. Committing an
//! activity removes its holds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::attention::AttentionLoad;
use crate::models::Tick;
use crate::search::ReasonCode;

/// Handle of a block or span reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub u64);

/// A hold on `[start, end)` of the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub activity_id: String,
    pub requirement_index: usize,
    pub start: Tick,
    pub end: Tick,
    /// Attention the hold claims on a multitasking resource.
    pub attention_percent: u32,
}

impl Hold {
    pub fn new(activity_id: impl Into<String>, requirement_index: usize, start: Tick, end: Tick) -> Self {
        Self {
            activity_id: activity_id.into(),
            requirement_index,
            start,
            end,
            attention_percent: 100,
        }
    }

    pub fn with_attention(mut self, percent: u32) -> Self {
        self.attention_percent = percent;
        self
    }

    pub fn overlaps(&self, start: Tick, end: Tick) -> bool {
        self.start < end && start < self.end
    }

    fn load(&self) -> AttentionLoad {
        AttentionLoad::new(self.start, self.end, self.attention_percent)
    }
}

/// Kind of hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldKind {
    Block,
    Span,
    Move,
}

impl HoldKind {
    /// Reason code reported when a window intersects this kind of hold.
    pub fn reason(self) -> ReasonCode {
        match self {
            HoldKind::Block => ReasonCode::IntersectsBlockReservation,
            HoldKind::Span => ReasonCode::ReservedForResReq,
            HoldKind::Move => ReasonCode::IntersectsReservedMoveDate,
        }
    }
}

/// A hold conflicting with a proposed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: HoldKind,
    pub activity_id: String,
    /// End of the conflicting hold; the caller's retry hint.
    pub end: Tick,
}

/// Ordered interval map with O(log n + k) intersection queries.
///
/// Entries are keyed by `(start, id)`. The longest stored interval bounds
/// how far before a query's start an intersecting entry can begin.
#[derive(Debug, Clone)]
pub struct IntervalIndex<T> {
    map: BTreeMap<(Tick, u64), (Tick, T)>,
    starts: BTreeMap<u64, Tick>,
    max_len: Tick,
}

impl<T> Default for IntervalIndex<T> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
            starts: BTreeMap::new(),
            max_len: 0,
        }
    }
}

impl<T> IntervalIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` over `[start, end)` under `id`, replacing any entry with the same id.
    pub fn insert(&mut self, id: u64, start: Tick, end: Tick, value: T) {
        self.remove(id);
        self.max_len = self.max_len.max(end - start);
        self.starts.insert(id, start);
        self.map.insert((start, id), (end, value));
    }

    /// Removes the entry stored under `id`.
    pub fn remove(&mut self, id: u64) -> Option<(Tick, Tick, T)> {
        let start = self.starts.remove(&id)?;
        self.map.remove(&(start, id)).map(|(end, v)| (start, end, v))
    }

    /// Entries intersecting `[start, end)`, by ascending start.
    pub fn intersecting(&self, start: Tick, end: Tick) -> impl Iterator<Item = (u64, Tick, Tick, &T)> + '_ {
        let lo = start.saturating_sub(self.max_len);
        let range = (start < end && lo < end).then(|| self.map.range((lo, 0)..(end, 0)));
        range
            .into_iter()
            .flatten()
            .filter(move |(_, (e, _))| *e > start)
            .map(|(&(s, id), (e, v))| (id, s, *e, v))
    }

    /// Drops every entry for which `keep` returns false.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let starts = &mut self.starts;
        self.map.retain(|&(_, id), (_, v)| {
            let kept = keep(v);
            if !kept {
                starts.remove(&id);
            }
            kept
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, Tick, Tick, &T)> + '_ {
        self.map.iter().map(|(&(s, id), (e, v))| (id, s, *e, v))
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.starts.clear();
        self.max_len = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// All holds on one resource.
#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
    blocks: IntervalIndex<Hold>,
    spans: IntervalIndex<Hold>,
    moved: Option<Hold>,
    next_id: u64,
    max_delay_enforcement: bool,
}

impl ReservationTable {
    /// Creates an empty table; span reservations are kept only when
    /// `max_delay_enforcement` is set.
    pub fn new(max_delay_enforcement: bool) -> Self {
        Self {
            max_delay_enforcement,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> ReservationId {
        self.next_id += 1;
        ReservationId(self.next_id)
    }

    /// Adds a block reservation.
    pub fn add_block_reservation(&mut self, hold: Hold) -> ReservationId {
        let id = self.next_id();
        debug!(activity = %hold.activity_id, start = hold.start, end = hold.end, "block reservation added");
        self.blocks.insert(id.0, hold.start, hold.end, hold);
        id
    }

    pub fn remove_block_reservation(&mut self, id: ReservationId) -> Option<Hold> {
        self.blocks.remove(id.0).map(|(_, _, h)| h)
    }

    /// Adds a max-delay span reservation; `None` when enforcement is off.
    pub fn add_span_reservation(&mut self, hold: Hold) -> Option<ReservationId> {
        if !self.max_delay_enforcement {
            return None;
        }
        let id = self.next_id();
        self.spans.insert(id.0, hold.start, hold.end, hold);
        Some(id)
    }

    pub fn remove_span_reservation(&mut self, id: ReservationId) -> Option<Hold> {
        self.spans.remove(id.0).map(|(_, _, h)| h)
    }

    /// Sets the move reservation, returning the one it replaces.
    pub fn set_move_reservation(&mut self, hold: Hold) -> Option<Hold> {
        self.moved.replace(hold)
    }

    pub fn clear_move_reservation(&mut self) -> Option<Hold> {
        self.moved.take()
    }

    pub fn move_reservation(&self) -> Option<&Hold> {
        self.moved.as_ref()
    }

    /// Removes every block and span reservation of `activity_id`.
    pub fn release_activity(&mut self, activity_id: &str) {
        self.blocks.retain(|h| h.activity_id != activity_id);
        self.spans.retain(|h| h.activity_id != activity_id);
    }

    /// First hold of another activity intersecting `[start, end)`.
    ///
    /// Block reservations are checked first, then spans, then the move slot.
    pub fn intersects(&self, activity_id: &str, start: Tick, end: Tick) -> Option<Conflict> {
        let others = |index: &IntervalIndex<Hold>, kind: HoldKind| {
            index
                .intersecting(start, end)
                .find(|(_, _, _, h)| h.activity_id != activity_id)
                .map(|(_, _, e, h)| Conflict {
                    kind,
                    activity_id: h.activity_id.clone(),
                    end: e,
                })
        };
        others(&self.blocks, HoldKind::Block)
            .or_else(|| others(&self.spans, HoldKind::Span))
            .or_else(|| {
                self.moved
                    .as_ref()
                    .filter(|h| h.activity_id != activity_id && h.overlaps(start, end))
                    .map(|h| Conflict {
                        kind: HoldKind::Move,
                        activity_id: h.activity_id.clone(),
                        end: h.end,
                    })
            })
    }

    /// Attention claimed by other activities' block and span holds over `[start, end)`.
    pub fn attention_loads(&self, activity_id: &str, start: Tick, end: Tick) -> Vec<AttentionLoad> {
        self.blocks
            .intersecting(start, end)
            .chain(self.spans.intersecting(start, end))
            .filter(|(_, _, _, h)| h.activity_id != activity_id)
            .map(|(_, _, _, h)| h.load())
            .collect()
    }

    /// Removes every hold.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.spans.clear();
        self.moved = None;
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }
}
