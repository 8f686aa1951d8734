//! The single source of truth for meeting-room state.
//!
//! The store wraps a `watch` channel whose current value is the snapshot.
//! Every mutation runs inside one `send_if_modified` closure, so a guard on
//! the active meeting id and the write it protects happen as one step, and
//! subscribers only ever observe whole snapshots.
//!
//! Message fetches are ordered by a [`FetchTicket`] taken when the request is
//! issued. A result is only written if its ticket is newer than the last one
//! applied, so two overlapping fetches for the same meeting can never leave
//! the older list on screen.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

use crate::models::{Agent, Connectivity, Meeting, MeetingStatus, Message};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub meetings: Vec<Meeting>,
    pub active_meeting: Option<Meeting>,
    /// Always the messages of `active_meeting`, or empty when none is active.
    pub messages: Vec<Message>,
    pub agents: Vec<Agent>,
    pub connectivity: Connectivity,
    pub discussion_pending: bool,
}

impl SessionSnapshot {
    pub fn active_meeting_id(&self) -> Option<&str> {
        self.active_meeting.as_ref().map(|m| m.id.as_str())
    }

    pub fn find_meeting(&self, meeting_id: &str) -> Option<&Meeting> {
        self.meetings.iter().find(|m| m.id == meeting_id)
    }
}

/// Identifies one message fetch, in the order the fetches were issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    meeting_id: String,
    seq: u64,
}

impl FetchTicket {
    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
    issued_seq: AtomicU64,
    // Only read and written inside `send_if_modified`, which serializes it.
    applied_seq: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            tx,
            issued_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn active_meeting_id(&self) -> Option<String> {
        self.tx.borrow().active_meeting_id().map(str::to_string)
    }

    pub fn active_meeting(&self) -> Option<Meeting> {
        self.tx.borrow().active_meeting.clone()
    }

    /// Replaces the meeting list wholesale. The active meeting is left alone.
    pub fn set_meetings(&self, meetings: Vec<Meeting>) {
        self.tx.send_if_modified(|s| {
            if s.meetings == meetings {
                return false;
            }
            s.meetings = meetings;
            true
        });
    }

    pub fn set_agents(&self, agents: Vec<Agent>) {
        self.tx.send_if_modified(|s| {
            if s.agents == agents {
                return false;
            }
            s.agents = agents;
            true
        });
    }

    pub fn set_connectivity(&self, connectivity: Connectivity) {
        self.tx.send_if_modified(|s| {
            if s.connectivity == connectivity {
                return false;
            }
            s.connectivity = connectivity;
            true
        });
    }

    pub fn set_discussion_pending(&self, pending: bool) {
        self.tx.send_if_modified(|s| {
            if s.discussion_pending == pending {
                return false;
            }
            s.discussion_pending = pending;
            true
        });
    }

    /// Inserts `meeting` into the list, or merges it into the existing entry
    /// with the same id.
    pub fn upsert_meeting(&self, meeting: &Meeting) {
        self.tx.send_if_modified(|s| upsert(&mut s.meetings, meeting));
    }

    /// Makes `meeting` active and clears the message list in the same step.
    /// Returns false when it was already active, in which case nothing changes.
    pub fn select_meeting(&self, meeting: Meeting) -> bool {
        self.tx.send_if_modified(|s| {
            if s.active_meeting_id() == Some(meeting.id.as_str()) {
                return false;
            }
            s.active_meeting = Some(meeting);
            s.messages.clear();
            true
        })
    }

    /// Applies an updated copy of a meeting to the list, and to the active
    /// meeting only while it is still the active one. Returns whether the
    /// active meeting was updated.
    pub fn apply_meeting_update(&self, meeting: &Meeting) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|s| {
            let mut changed = upsert(&mut s.meetings, meeting);
            match s.active_meeting.as_mut() {
                Some(active) if active.id == meeting.id => {
                    let before = active.clone();
                    active.merge_from(meeting);
                    changed |= *active != before;
                    applied = true;
                }
                Some(active) => {
                    debug!(
                        meeting_id = %meeting.id,
                        active_id = %active.id,
                        "Discarding meeting update for inactive meeting"
                    );
                }
                None => {}
            }
            changed
        });
        applied
    }

    /// Marks a meeting ended in the list. Never touches the active meeting.
    pub fn mark_ended(&self, meeting_id: &str) {
        self.tx.send_if_modified(|s| {
            match s.meetings.iter_mut().find(|m| m.id == meeting_id) {
                Some(m) if m.status != MeetingStatus::Ended => {
                    m.status = MeetingStatus::Ended;
                    true
                }
                _ => false,
            }
        });
    }

    /// Takes a ticket for a message fetch. Call this before the request is
    /// sent and hand the ticket back to [`replace_messages`](Self::replace_messages).
    pub fn begin_fetch(&self, meeting_id: &str) -> FetchTicket {
        FetchTicket {
            meeting_id: meeting_id.to_string(),
            seq: self.issued_seq.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Replaces the message list with the result of the fetch `ticket`.
    ///
    /// The write only happens if the ticket's meeting is still the active
    /// meeting and no fetch issued after it has been applied yet. Accepted
    /// messages are stamped with the meeting id; messages tagged with a
    /// different meeting are dropped.
    pub fn replace_messages(&self, ticket: &FetchTicket, messages: Vec<Message>) -> bool {
        let meeting_id = ticket.meeting_id.as_str();
        let mut applied = false;
        self.tx.send_if_modified(|s| {
            match s.active_meeting_id() {
                Some(active) if active == meeting_id => {}
                active => {
                    debug!(
                        meeting_id = %meeting_id,
                        active_id = active.unwrap_or("none"),
                        "Discarding stale message list"
                    );
                    return false;
                }
            }

            let newest = self.applied_seq.load(Ordering::SeqCst);
            if ticket.seq < newest {
                debug!(
                    meeting_id = %meeting_id,
                    seq = ticket.seq,
                    applied_seq = newest,
                    "Discarding message list older than the one shown"
                );
                return false;
            }
            self.applied_seq.store(ticket.seq, Ordering::SeqCst);

            let messages: Vec<Message> = messages
                .into_iter()
                .filter(|m| m.belongs_to(meeting_id))
                .map(|mut m| {
                    m.meeting_id = Some(meeting_id.to_string());
                    m
                })
                .collect();

            applied = true;
            if s.messages == messages {
                return false;
            }
            s.messages = messages;
            true
        });
        applied
    }

    /// Clears the active meeting and its messages together.
    pub fn clear_active(&self) {
        self.tx.send_if_modified(|s| {
            if s.active_meeting.is_none() && s.messages.is_empty() {
                return false;
            }
            s.active_meeting = None;
            s.messages.clear();
            true
        });
    }

    /// Clears the active meeting only if it is still `meeting_id`.
    pub fn clear_active_if(&self, meeting_id: &str) -> bool {
        let mut cleared = false;
        self.tx.send_if_modified(|s| {
            if s.active_meeting_id() != Some(meeting_id) {
                return false;
            }
            s.active_meeting = None;
            s.messages.clear();
            cleared = true;
            true
        });
        cleared
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert(meetings: &mut Vec<Meeting>, meeting: &Meeting) -> bool {
    match meetings.iter_mut().find(|m| m.id == meeting.id) {
        Some(existing) => {
            let before = existing.clone();
            existing.merge_from(meeting);
            *existing != before
        }
        None => {
            meetings.push(meeting.clone());
            true
        }
    }
}
