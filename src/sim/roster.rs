//! Population roster: live agents with their controllers and fitness
//!
//! The three sequences are index-aligned. Removal only ever happens through
//! [`Roster::compact`], which drops the same indices from all of them in one
//! pass after every removal decision for the tick has been made.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::agent::Agent;

/// What a controller sees each tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Agent vertical position
    pub y: f32,
    /// |y - bottom edge of the reference obstacle's top barrier|
    pub gap_top_distance: f32,
    /// |y - top edge of the reference obstacle's bottom barrier|
    pub gap_bottom_distance: f32,
}

impl Observation {
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.y, self.gap_top_distance, self.gap_bottom_distance]
    }
}

/// Maps an observation to an action; values above the jump threshold flap
pub trait Controller {
    fn activate(&mut self, observation: &Observation) -> f32;
}

impl<F> Controller for F
where
    F: FnMut(&Observation) -> f32,
{
    fn activate(&mut self, observation: &Observation) -> f32 {
        self(observation)
    }
}

/// Externally owned score the episode adds to in place
pub trait FitnessAccumulator {
    fn credit(&mut self, delta: f32);
    fn fitness(&self) -> f32;
}

impl FitnessAccumulator for f32 {
    #[inline]
    fn credit(&mut self, delta: f32) {
        *self += delta;
    }

    #[inline]
    fn fitness(&self) -> f32 {
        *self
    }
}

impl<A: FitnessAccumulator + ?Sized> FitnessAccumulator for &mut A {
    #[inline]
    fn credit(&mut self, delta: f32) {
        (**self).credit(delta);
    }

    #[inline]
    fn fitness(&self) -> f32 {
        (**self).fitness()
    }
}

impl FitnessAccumulator for Rc<Cell<f32>> {
    #[inline]
    fn credit(&mut self, delta: f32) {
        self.set(self.get() + delta);
    }

    #[inline]
    fn fitness(&self) -> f32 {
        self.get()
    }
}

/// An entry removed from the roster
#[derive(Debug)]
pub struct RosterEntry<C, F> {
    pub agent: Agent,
    pub controller: C,
    pub fitness: F,
}

/// Index-aligned agents, controllers and fitness accumulators
#[derive(Debug)]
pub struct Roster<C, F> {
    agents: Vec<Agent>,
    controllers: Vec<C>,
    fitness: Vec<F>,
}

impl<C, F> Default for Roster<C, F> {
    fn default() -> Self {
        Self {
            agents: Vec::new(),
            controllers: Vec::new(),
            fitness: Vec::new(),
        }
    }
}

impl<C, F> Roster<C, F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
            controllers: Vec::with_capacity(capacity),
            fitness: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, agent: Agent, controller: C, fitness: F) {
        self.agents.push(agent);
        self.controllers.push(controller);
        self.fitness.push(fitness);
        self.debug_check();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.debug_check();
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[inline]
    pub fn controllers(&self) -> &[C] {
        &self.controllers
    }

    #[inline]
    pub fn fitness(&self) -> &[F] {
        &self.fitness
    }

    /// Mutable access to the agents only; the roster's shape cannot change
    #[inline]
    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    #[inline]
    pub(crate) fn fitness_mut(&mut self) -> &mut [F] {
        &mut self.fitness
    }

    /// Aligned triples in roster order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&mut Agent, &mut C, &mut F)> {
        self.debug_check();
        self.agents
            .iter_mut()
            .zip(self.controllers.iter_mut())
            .zip(self.fitness.iter_mut())
            .map(|((a, c), f)| (a, c, f))
    }

    /// Remove every index marked in `doomed` from all three sequences at once,
    /// keeping the survivors in order. Returns the removed entries in roster
    /// order. Indices past the end of `doomed` survive.
    pub fn compact(&mut self, doomed: &[bool]) -> Vec<RosterEntry<C, F>> {
        self.debug_check();
        debug_assert_eq!(doomed.len(), self.agents.len(), "removal mask length");

        if !doomed.iter().any(|&d| d) {
            return Vec::new();
        }

        let agents = std::mem::take(&mut self.agents);
        let controllers = std::mem::take(&mut self.controllers);
        let fitness = std::mem::take(&mut self.fitness);

        let mut removed = Vec::new();
        for (i, ((agent, controller), fitness)) in
            agents.into_iter().zip(controllers).zip(fitness).enumerate()
        {
            if doomed.get(i).copied().unwrap_or(false) {
                removed.push(RosterEntry {
                    agent,
                    controller,
                    fitness,
                });
            } else {
                self.agents.push(agent);
                self.controllers.push(controller);
                self.fitness.push(fitness);
            }
        }

        self.debug_check();
        removed
    }

    /// Empty the roster, returning every entry in order
    pub fn drain(&mut self) -> Vec<RosterEntry<C, F>> {
        let doomed = vec![true; self.agents.len()];
        self.compact(&doomed)
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(
            self.agents.len() == self.controllers.len() && self.agents.len() == self.fitness.len(),
            "roster misaligned: {} agents, {} controllers, {} fitness",
            self.agents.len(),
            self.controllers.len(),
            self.fitness.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Controller and fitness tagged with the agent id so alignment is checkable
    fn roster(n: u32) -> Roster<u32, f32> {
        let mut roster = Roster::with_capacity(n as usize);
        for id in 0..n {
            roster.push(Agent::new(id, 0.0, 0.0), id, id as f32);
        }
        roster
    }

    fn assert_aligned(roster: &Roster<u32, f32>) {
        assert_eq!(roster.agents().len(), roster.controllers().len());
        assert_eq!(roster.agents().len(), roster.fitness().len());
        for ((agent, &c), &f) in roster
            .agents()
            .iter()
            .zip(roster.controllers())
            .zip(roster.fitness())
        {
            assert_eq!(agent.id, c);
            assert_eq!(agent.id as f32, f);
        }
    }

    #[test]
    fn test_compact_removes_same_index_everywhere() {
        let mut r = roster(5);
        let removed = r.compact(&[false, true, false, true, false]);

        assert_eq!(r.len(), 3);
        assert_aligned(&r);
        let ids: Vec<u32> = r.agents().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 2, 4]);

        let removed_ids: Vec<u32> = removed.iter().map(|e| e.controller).collect();
        assert_eq!(removed_ids, vec![1, 3]);
        assert!(removed.iter().all(|e| e.agent.id == e.controller));
    }

    #[test]
    fn test_compact_nothing_marked() {
        let mut r = roster(3);
        assert!(r.compact(&[false; 3]).is_empty());
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_drain() {
        let mut r = roster(4);
        let all = r.drain();
        assert!(r.is_empty());
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_fitness_accumulators() {
        let mut owned = 1.0_f32;
        owned.credit(0.5);
        assert_eq!(owned.fitness(), 1.5);

        fn credit_two<A: FitnessAccumulator>(mut acc: A) {
            acc.credit(2.0);
        }
        let mut target = 0.0_f32;
        credit_two(&mut target);
        assert_eq!(target, 2.0);

        let shared = Rc::new(Cell::new(0.0_f32));
        let mut handle = Rc::clone(&shared);
        handle.credit(-1.0);
        assert_eq!(shared.get(), -1.0);
    }

    #[test]
    fn test_closure_controller() {
        let mut calls = 0;
        let mut controller = |obs: &Observation| -> f32 {
            calls += 1;
            if obs.y > 100.0 { 1.0 } else { 0.0 }
        };
        let obs = Observation {
            y: 150.0,
            ..Default::default()
        };
        assert_eq!(controller.activate(&obs), 1.0);
        assert_eq!(calls, 1);
    }

    proptest! {
        #[test]
        fn prop_compact_preserves_alignment_and_order(
            doomed in proptest::collection::vec(any::<bool>(), 0..64)
        ) {
            let mut r = roster(doomed.len() as u32);
            let removed = r.compact(&doomed);

            let survivors = doomed.iter().filter(|&&d| !d).count();
            prop_assert_eq!(r.len(), survivors);
            prop_assert_eq!(removed.len(), doomed.len() - survivors);
            assert_aligned(&r);

            let ids: Vec<u32> = r.agents().iter().map(|a| a.id).collect();
            let expected: Vec<u32> = (0..doomed.len() as u32)
                .filter(|&i| !doomed[i as usize])
                .collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
