//! # Audit Trail — Append-Only Store and Ordered Queries
//!
//! The trail assigns sequence numbers and timestamps at append time and
//! exposes queries ordered by (timestamp, sequence) ascending. Queries
//! are restartable: a caller that consumed up to sequence `n` resumes
//! with `after_sequence = n` and misses nothing, because events are
//! never reordered, updated, or deleted.

use serde_json::Value;

use grc_core::{ActorId, EventId, Timestamp};

use crate::event::{AuditAction, AuditEvent, EntityKind, EventDraft};

/// The seam write paths record through.
///
/// The engine hands every domain mutation's draft event to a sink within
/// the same exclusive borrow as the mutation itself; an implementation
/// backed by durable storage joins the same transaction, so a mutation
/// whose audit append fails is itself failed.
pub trait AuditSink {
    /// Append a draft event, returning the recorded event.
    fn record(&mut self, draft: EventDraft) -> AuditEvent;
}

/// Filter for audit queries. All fields are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Restrict to one entity kind.
    pub entity_kind: Option<EntityKind>,
    /// Restrict to one entity (display-form identifier).
    pub entity_id: Option<String>,
    /// Restrict to one actor.
    pub actor: Option<ActorId>,
    /// Restrict to one action.
    pub action: Option<AuditAction>,
    /// Events at or after this instant.
    pub since: Option<Timestamp>,
    /// Events strictly before this instant.
    pub until: Option<Timestamp>,
    /// Resume marker: only events with a larger sequence number.
    pub after_sequence: Option<u64>,
    /// Maximum number of events to return.
    pub limit: Option<usize>,
}

/// The append-only audit trail.
///
/// The event vector is private; the public surface is append and query.
/// Events are stored in append order, which is (timestamp, sequence)
/// ascending because sequence numbers are assigned monotonically and
/// timestamps are taken from the same clock at append time.
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
    next_sequence: u64,
}

impl AuditTrail {
    /// Create an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Query events matching `filter`, ordered by (timestamp, sequence)
    /// ascending. The iterator borrows the trail; it is finite per query
    /// window and bounded by `filter.limit` when set.
    pub fn query<'a>(&'a self, filter: &'a AuditFilter) -> impl Iterator<Item = &'a AuditEvent> {
        self.events
            .iter()
            .filter(move |e| filter_matches(filter, e))
            .take(filter.limit.unwrap_or(usize::MAX))
    }

    /// The most recently recorded event, if any.
    pub fn last(&self) -> Option<&AuditEvent> {
        self.events.last()
    }
}

impl AuditSink for AuditTrail {
    fn record(&mut self, draft: EventDraft) -> AuditEvent {
        let event = AuditEvent {
            id: EventId::new(),
            sequence: self.next_sequence,
            actor: draft.actor,
            entity_kind: draft.entity_kind,
            entity_id: draft.entity_id,
            action: draft.action,
            before: draft.before,
            after: draft.after,
            timestamp: Timestamp::now(),
        };
        self.next_sequence += 1;
        self.events.push(event.clone());
        event
    }
}

fn filter_matches(filter: &AuditFilter, event: &AuditEvent) -> bool {
    if let Some(kind) = filter.entity_kind {
        if event.entity_kind != kind {
            return false;
        }
    }
    if let Some(id) = &filter.entity_id {
        if &event.entity_id != id {
            return false;
        }
    }
    if let Some(actor) = &filter.actor {
        if &event.actor != actor {
            return false;
        }
    }
    if let Some(action) = filter.action {
        if event.action != action {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if event.timestamp < since {
            return false;
        }
    }
    if let Some(until) = filter.until {
        if event.timestamp >= until {
            return false;
        }
    }
    if let Some(after) = filter.after_sequence {
        if event.sequence <= after {
            return false;
        }
    }
    true
}

/// Build a draft for a creation event (no before-state).
pub fn creation_draft(
    actor: &ActorId,
    entity_kind: EntityKind,
    entity_id: String,
    action: AuditAction,
    after: Value,
) -> EventDraft {
    EventDraft {
        actor: actor.clone(),
        entity_kind,
        entity_id,
        action,
        before: None,
        after,
    }
}

/// Build a draft for a mutation event with before/after state.
pub fn mutation_draft(
    actor: &ActorId,
    entity_kind: EntityKind,
    entity_id: String,
    action: AuditAction,
    before: Value,
    after: Value,
) -> EventDraft {
    EventDraft {
        actor: actor.clone(),
        entity_kind,
        entity_id,
        action,
        before: Some(before),
        after,
    }
}
