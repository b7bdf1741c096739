//! Call sessions keyed by provider call id.
//!
//! The provider round-trips its call id on every callback; this registry
//! ties the callbacks of one call back to the numbers and language chosen
//! when it was placed. A session is settled at most once: later deliveries
//! of the same digit callback are reported as duplicates.
//!
//! Entries are bounded. Settled sessions are kept for `settled_ttl` so
//! redelivered callbacks still deduplicate, open sessions are dropped after
//! `open_ttl`, and the map never holds more than `capacity` entries.

use dialtone_types::{CallOutcome, CallSession, CallState};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// How long a settled session is remembered for deduplication.
pub const DEFAULT_SETTLED_TTL: Duration = Duration::from_secs(10 * 60);

/// How long an unsettled session may wait for its callbacks.
pub const DEFAULT_OPEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

pub const DEFAULT_CAPACITY: usize = 10_000;

/// Result of claiming the terminal transition for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitClaim {
    /// This delivery settled the session; side effects should run.
    Fresh,
    /// The session was already settled with this outcome.
    Duplicate(CallOutcome),
}

#[derive(Debug, Clone)]
struct Entry {
    session: CallSession,
    /// Last insert or state change.
    touched: Instant,
}

/// Uses `std::sync::RwLock`: every acquisition is a short map operation
/// that never spans an `.await`.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    settled_ttl: Duration,
    open_ttl: Duration,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SETTLED_TTL, DEFAULT_OPEN_TTL, DEFAULT_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(settled_ttl: Duration, open_ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            settled_ttl,
            open_ttl,
            capacity: capacity.max(1),
        }
    }

    /// Registers a session, replacing any previous one with the same id.
    pub fn insert(&self, session: CallSession) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        self.evict(&mut sessions, now);
        sessions.insert(
            session.call_sid.clone(),
            Entry {
                session,
                touched: now,
            },
        );
    }

    pub fn get(&self, call_sid: &str) -> Option<CallSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(call_sid).map(|entry| entry.session.clone())
    }

    /// Records that the provider fetched the prompt and is now collecting a
    /// digit. Returns `false` if the session is unknown or already settled.
    pub fn mark_awaiting_digit(&self, call_sid: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(call_sid) {
            Some(entry) => {
                if entry.session.advance(CallState::AwaitingDigit) {
                    entry.touched = Instant::now();
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Claims the terminal transition for `session` with `outcome`.
    ///
    /// A known, unsettled session is moved to its terminal state. An unknown
    /// session (for example after a restart) is recorded as settled. A
    /// session settled earlier is left alone and reported as a duplicate.
    pub fn settle(&self, session: &CallSession, outcome: CallOutcome) -> DigitClaim {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if !sessions.contains_key(&session.call_sid) {
            self.evict(&mut sessions, now);
        }
        let entry = sessions
            .entry(session.call_sid.clone())
            .or_insert_with(|| Entry {
                session: session.clone(),
                touched: now,
            });

        if let Some(previous) = entry.session.state.outcome() {
            return DigitClaim::Duplicate(previous);
        }
        force_terminal(&mut entry.session, outcome);
        entry.touched = now;
        DigitClaim::Fresh
    }

    /// Closes a call that ended without a digit callback: an unsettled
    /// session moves to `NoResponse`. Returns `false` for unknown or
    /// already settled sessions.
    pub fn expire(&self, call_sid: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(call_sid) {
            Some(entry) if !entry.session.state.is_terminal() => {
                force_terminal(&mut entry.session, CallOutcome::NoResponse);
                entry.touched = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Drops entries past their TTL as of `now`.
    pub fn prune_at(&self, now: Instant) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        self.evict(&mut sessions, now);
    }

    /// Removes expired entries, then, if a new entry would overflow the
    /// capacity, the least recently touched ones (settled sessions first).
    fn evict(&self, sessions: &mut HashMap<String, Entry>, now: Instant) {
        sessions.retain(|_, entry| {
            let ttl = if entry.session.state.is_terminal() {
                self.settled_ttl
            } else {
                self.open_ttl
            };
            now.saturating_duration_since(entry.touched) < ttl
        });

        if sessions.len() < self.capacity {
            return;
        }
        let mut by_age: Vec<(bool, Instant, String)> = sessions
            .iter()
            .map(|(sid, entry)| (!entry.session.state.is_terminal(), entry.touched, sid.clone()))
            .collect();
        by_age.sort();
        let excess = sessions.len() + 1 - self.capacity;
        for (_, _, sid) in by_age.into_iter().take(excess) {
            sessions.remove(&sid);
        }
        tracing::warn!(evicted = excess, "session registry at capacity");
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Moves to the terminal state even from states that cannot reach it
/// directly (a reconstructed `CallRequested` session).
fn force_terminal(session: &mut CallSession, outcome: CallOutcome) {
    if !session.advance(outcome.terminal_state()) {
        session.state = outcome.terminal_state();
    }
}
