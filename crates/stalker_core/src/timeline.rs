//! Timed action sequences.
//!
//! Multi-step behaviours (attack choreographies, the jump manoeuvre, death
//! cleanup) are data: a list of cues, each an authored offset plus an
//! action. Playing a timeline schedules every cue at once, scaled by a
//! playback rate. When a cue fires, its performer first checks that the
//! sequence is still live and only then acts, which is the only form of
//! cancellation the scheduler offers.

use serde::{Deserialize, Serialize};

use crate::time::{scaled_delay, TimeMs};

/// One step of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue<A> {
    /// Offset from the start of the sequence at rate 1.0.
    pub at_ms: TimeMs,
    /// What happens.
    pub action: A,
}

/// An ordered list of cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline<A> {
    cues: Vec<Cue<A>>,
}

impl<A: Clone> Timeline<A> {
    /// Build a timeline; cues are stably sorted by offset.
    #[must_use]
    pub fn new(cues: impl IntoIterator<Item = (TimeMs, A)>) -> Self {
        let mut cues: Vec<Cue<A>> = cues
            .into_iter()
            .map(|(at_ms, action)| Cue { at_ms, action })
            .collect();
        cues.sort_by_key(|c| c.at_ms);
        Self { cues }
    }

    /// Cues in order.
    #[must_use]
    pub fn cues(&self) -> &[Cue<A>] {
        &self.cues
    }

    /// Real delays for each cue at `rate`.
    pub fn delays(&self, rate: f64) -> impl Iterator<Item = (TimeMs, &A)> + '_ {
        self.cues
            .iter()
            .map(move |c| (scaled_delay(c.at_ms, rate), &c.action))
    }

    /// Hand every cue to `schedule` with its scaled delay.
    pub fn play(&self, rate: f64, mut schedule: impl FnMut(TimeMs, A)) {
        for (delay, action) in self.delays(rate) {
            schedule(delay, action.clone());
        }
    }
}

/// Executes the actions of a timeline against some state.
pub trait Performer<A, C: ?Sized> {
    /// Whether the sequence `action` belongs to is still live.
    fn is_live(&self, action: &A) -> bool;

    /// Carry out one action.
    fn perform(&mut self, action: A, ctx: &mut C);
}

/// Fire one cue: re-validate, then perform. Returns whether it ran.
pub fn fire<A, C: ?Sized, P: Performer<A, C>>(performer: &mut P, action: A, ctx: &mut C) -> bool {
    if !performer.is_live(&action) {
        return false;
    }
    performer.perform(action, ctx);
    true
}
