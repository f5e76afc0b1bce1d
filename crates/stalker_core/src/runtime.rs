//! Single-agent runtime.
//!
//! [`AgentRuntime`] plays the host's delayed-callback facility for one
//! agent: it owns the clock, the event queue and the outbox. Hosts feed
//! external replies in through [`AgentRuntime::post`] or
//! [`AgentRuntime::deliver`], advance time with
//! [`AgentRuntime::advance_to`] and collect collaborator signals with
//! [`AgentRuntime::drain_outputs`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::agent::{Agent, AgentEvent, Ctx};
use crate::collaborators::Outbound;
use crate::scheduler::Scheduler;
use crate::targeting::PlayerSnapshot;
use crate::time::TimeMs;

/// An agent plus its clock, queue and outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRuntime {
    agent: Agent,
    scheduler: Scheduler<AgentEvent>,
    now: TimeMs,
    outbox: Vec<Outbound>,
}

impl AgentRuntime {
    /// Wrap an agent. Time starts at zero.
    #[must_use]
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            scheduler: Scheduler::new(),
            now: 0,
            outbox: Vec::new(),
        }
    }

    /// Run Init_End, which starts the tick loop.
    pub fn start(&mut self) {
        let mut ctx = Ctx::new(self.now, &mut self.scheduler, &mut self.outbox, &[]);
        self.agent.init_end(&mut ctx);
    }

    /// Current time.
    #[must_use]
    pub const fn now(&self) -> TimeMs {
        self.now
    }

    /// The agent.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Due time of the next pending event.
    #[must_use]
    pub fn next_due(&self) -> Option<TimeMs> {
        self.scheduler.next_due()
    }

    /// Queue an event `delay` ms from now.
    pub fn post(&mut self, delay: TimeMs, event: AgentEvent) {
        self.scheduler.schedule(self.now, delay, event);
    }

    /// Handle an event immediately.
    pub fn deliver(&mut self, event: AgentEvent, players: &[PlayerSnapshot]) {
        let mut ctx = Ctx::new(self.now, &mut self.scheduler, &mut self.outbox, players);
        self.agent.handle(event, &mut ctx);
    }

    /// Run every event due at or before `until`, in order, then set the
    /// clock to `until`. Returns how many events ran.
    pub fn advance_to(&mut self, until: TimeMs, players: &[PlayerSnapshot]) -> usize {
        let mut handled = 0;
        while let Some(scheduled) = self.scheduler.pop_due(until) {
            self.now = self.now.max(scheduled.due);
            trace!(at = self.now, event = ?scheduled.event, "Dispatch");
            let mut ctx = Ctx::new(self.now, &mut self.scheduler, &mut self.outbox, players);
            self.agent.handle(scheduled.event, &mut ctx);
            #[cfg(feature = "debug-validation")]
            self.validate();
            handled += 1;
        }
        self.now = self.now.max(until);
        handled
    }

    /// Panic if the agent broke one of its invariants.
    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        let agent = &self.agent;
        assert!(
            agent.hit_points() <= agent.health().max(),
            "hit points above maximum"
        );
        assert!(
            !agent.is_dead() || agent.state() == crate::combat::CombatState::Scene,
            "dead agent left the scene state"
        );
        assert!(
            !agent.is_dead() || !agent.is_thrusting(),
            "dead agent still thrusting"
        );
        assert!(agent.speed() >= 0.0 && agent.speed() <= agent.config().max_speed);
    }

    /// Take every signal emitted since the last drain.
    pub fn drain_outputs(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Hash of the agent, the clock and the queue.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.now.hash(&mut hasher);
        self.scheduler.len().hash(&mut hasher);
        self.agent.state_hash().hash(&mut hasher);
        hasher.finish()
    }
}
