//! Slot board — caller-side guard for suggestion requests that target a UI slot.
//!
//! A slot is one place in a form that can receive suggestions (e.g. experience
//! entry #2). The board enforces two rules:
//! - at most one request in flight per slot (`begin` fails with `SlotBusy`)
//! - a result is stale when the form's selection moved to another slot while
//!   the request was running; the caller must discard it
//!
//! The in-flight mark lives in a `SlotTicket` and is released on drop, so
//! every exit path (success, error, panic unwind) frees the slot.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selections untouched for this long are forgotten.
const SELECTION_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Identifies one open form (e.g. "resume-42/experience").
    pub form: String,
    /// The entry within the form (e.g. "2").
    pub slot: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("A suggestion request for slot '{slot}' in '{form}' is already in progress")]
pub struct SlotBusy {
    pub form: String,
    pub slot: String,
}

#[derive(Debug)]
struct Selection {
    slot: String,
    touched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BoardState {
    in_flight: HashSet<SlotRef>,
    selections: HashMap<String, Selection>,
}

#[derive(Debug, Default)]
pub struct SlotBoard {
    state: Mutex<BoardState>,
}

impl SlotBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        // State stays consistent across a panicking holder: every mutation is a
        // single insert/remove.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `slot` as the form's current selection.
    pub fn select(&self, slot: &SlotRef) {
        let now = Utc::now();
        let mut state = self.lock();
        prune_idle(&mut state, now);
        state.selections.insert(
            slot.form.clone(),
            Selection {
                slot: slot.slot.clone(),
                touched_at: now,
            },
        );
    }

    /// Starts a request for `slot`: refuses if one is already running, and
    /// moves the form's selection to this slot.
    pub fn begin(self: &Arc<Self>, slot: SlotRef) -> Result<SlotTicket, SlotBusy> {
        let now = Utc::now();
        let mut state = self.lock();
        prune_idle(&mut state, now);

        if state.in_flight.contains(&slot) {
            return Err(SlotBusy {
                form: slot.form,
                slot: slot.slot,
            });
        }
        state.in_flight.insert(slot.clone());
        state.selections.insert(
            slot.form.clone(),
            Selection {
                slot: slot.slot.clone(),
                touched_at: now,
            },
        );
        drop(state);

        Ok(SlotTicket {
            board: Arc::clone(self),
            slot,
        })
    }

    pub fn is_in_flight(&self, slot: &SlotRef) -> bool {
        self.lock().in_flight.contains(slot)
    }

    fn is_selected(&self, slot: &SlotRef) -> bool {
        self.lock()
            .selections
            .get(&slot.form)
            .is_some_and(|s| s.slot == slot.slot)
    }

    fn finish(&self, slot: &SlotRef) {
        self.lock().in_flight.remove(slot);
    }
}

fn prune_idle(state: &mut BoardState, now: DateTime<Utc>) {
    let cutoff = now - Duration::minutes(SELECTION_TTL_MINUTES);
    let BoardState {
        in_flight,
        selections,
    } = state;
    selections.retain(|form, selection| {
        selection.touched_at >= cutoff || in_flight.iter().any(|s| &s.form == form)
    });
}

/// Proof that a request owns its slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct SlotTicket {
    board: Arc<SlotBoard>,
    slot: SlotRef,
}

impl SlotTicket {
    pub fn slot(&self) -> &SlotRef {
        &self.slot
    }

    /// True when the form still has this ticket's slot selected.
    pub fn is_current(&self) -> bool {
        self.board.is_selected(&self.slot)
    }
}

impl Drop for SlotTicket {
    fn drop(&mut self) {
        self.board.finish(&self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(form: &str, slot: &str) -> SlotRef {
        SlotRef {
            form: form.to_string(),
            slot: slot.to_string(),
        }
    }

    #[test]
    fn test_second_request_for_same_slot_is_refused() {
        let board = SlotBoard::new();
        let _first = board.begin(slot("resume-1/experience", "0")).unwrap();
        let err = board.begin(slot("resume-1/experience", "0")).unwrap_err();
        assert_eq!(err.slot, "0");
        assert!(err.to_string().contains("already in progress"));
    }

    #[test]
    fn test_dropping_ticket_frees_slot() {
        let board = SlotBoard::new();
        let target = slot("resume-1/experience", "0");
        {
            let _ticket = board.begin(target.clone()).unwrap();
            assert!(board.is_in_flight(&target));
        }
        assert!(!board.is_in_flight(&target));
        assert!(board.begin(target).is_ok());
    }

    #[test]
    fn test_different_slots_run_independently() {
        let board = SlotBoard::new();
        let first = board.begin(slot("f", "0")).unwrap();
        let second = board.begin(slot("f", "1")).unwrap();
        // The later request took the selection; the earlier result is stale.
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn test_selection_change_marks_result_stale() {
        let board = SlotBoard::new();
        let ticket = board.begin(slot("f", "2")).unwrap();
        assert!(ticket.is_current());
        board.select(&slot("f", "3"));
        assert!(!ticket.is_current());
        board.select(&slot("f", "2"));
        assert!(ticket.is_current());
    }

    #[test]
    fn test_forms_do_not_interfere() {
        let board = SlotBoard::new();
        let ticket = board.begin(slot("resume-1/education", "0")).unwrap();
        board.select(&slot("resume-2/education", "5"));
        assert!(ticket.is_current());
    }

    #[test]
    fn test_idle_selections_are_pruned() {
        let board = SlotBoard::new();
        board.select(&slot("old-form", "0"));
        {
            let mut state = board.lock();
            let later = Utc::now() + Duration::minutes(SELECTION_TTL_MINUTES + 1);
            prune_idle(&mut state, later);
            assert!(state.selections.is_empty());
        }
    }

    #[test]
    fn test_select_prunes_idle_forms() {
        let board = SlotBoard::new();
        let stale_at = Utc::now() - Duration::minutes(SELECTION_TTL_MINUTES + 1);
        for form in ["closed-1", "closed-2"] {
            board.lock().selections.insert(
                form.to_string(),
                Selection {
                    slot: "0".to_string(),
                    touched_at: stale_at,
                },
            );
        }

        board.select(&slot("open-form", "1"));

        let state = board.lock();
        assert_eq!(state.selections.len(), 1);
        assert!(state.selections.contains_key("open-form"));
    }

    #[test]
    fn test_selection_with_request_in_flight_is_kept() {
        let board = SlotBoard::new();
        let _ticket = board.begin(slot("busy-form", "0")).unwrap();
        let mut state = board.lock();
        let later = Utc::now() + Duration::minutes(SELECTION_TTL_MINUTES + 1);
        prune_idle(&mut state, later);
        assert!(state.selections.contains_key("busy-form"));
    }
}
