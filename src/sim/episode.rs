//! One simulated episode: fixed-timestep orchestration of agents,
//! obstacles, ground and scoring.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::ground::Ground;
use super::obstacle::Obstacle;
use super::roster::{Controller, FitnessAccumulator, Observation, Roster, RosterEntry};
use super::snapshot::{AgentView, EpisodeSnapshot, GroundView, ObstacleView};
use super::sprites::SpriteSheet;
use crate::config::SimConfig;
use crate::error::EpisodeError;

/// Episode lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// Agents remain and no stop was requested
    Active,
    /// Roster exhausted or stopped externally; further steps do nothing
    Terminated,
}

/// Why an agent left the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetireCause {
    /// Hit a barrier (takes precedence when both happen on one tick)
    Collision,
    /// Touched the ground or left the top of the playfield
    OutOfBounds,
}

/// Something that happened during a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EpisodeEvent {
    AgentRetired { id: u32, cause: RetireCause },
    ObstaclePassed { id: u32 },
    ObstacleSpawned { id: u32, gap_top: f32 },
    ObstacleRetired { id: u32 },
    Terminated,
}

/// Outcome of a single step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub events: Vec<EpisodeEvent>,
}

impl StepReport {
    /// Agents retired this step
    pub fn retired(&self) -> impl Iterator<Item = (u32, RetireCause)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            EpisodeEvent::AgentRetired { id, cause } => Some((id, cause)),
            _ => None,
        })
    }

    pub fn scored(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, EpisodeEvent::ObstacleSpawned { .. }))
    }

    pub fn terminated(&self) -> bool {
        self.events.contains(&EpisodeEvent::Terminated)
    }
}

/// Observation for `agent` against the reference obstacle (if any)
fn observe(agent: &Agent, obstacle: Option<&Obstacle>) -> Observation {
    let y = agent.y();
    match obstacle {
        Some(o) => Observation {
            y,
            gap_top_distance: (y - o.gap_top()).abs(),
            gap_bottom_distance: (y - o.gap_bottom()).abs(),
        },
        None => Observation {
            y,
            ..Default::default()
        },
    }
}

/// A full simulated run for one population of controllers
#[derive(Debug)]
pub struct Episode<C, F, R = Pcg32> {
    config: SimConfig,
    sprites: Arc<SpriteSheet>,
    rng: R,
    roster: Roster<C, F>,
    /// Entries removed so far, in retirement order
    retired: Vec<RosterEntry<C, F>>,
    /// Active obstacles, oldest first
    obstacles: Vec<Obstacle>,
    ground: Ground,
    score: u32,
    tick: u64,
    phase: EpisodePhase,
    next_id: u32,
}

impl<C, F> Episode<C, F, Pcg32>
where
    F: FitnessAccumulator,
{
    /// Episode with a PCG generator seeded from `seed`
    pub fn seeded<I>(population: I, config: SimConfig, sprites: Arc<SpriteSheet>, seed: u64) -> Self
    where
        I: IntoIterator<Item = (C, F)>,
    {
        Self::new(population, config, sprites, Pcg32::seed_from_u64(seed))
    }
}

impl<C, F, R> Episode<C, F, R>
where
    F: FitnessAccumulator,
    R: Rng,
{
    /// Start an episode: one agent per (controller, fitness) pair, in order,
    /// all at the configured start position, and the first obstacle.
    pub fn new<I>(population: I, config: SimConfig, sprites: Arc<SpriteSheet>, rng: R) -> Self
    where
        I: IntoIterator<Item = (C, F)>,
    {
        let population = population.into_iter();
        let mut episode = Self {
            ground: Ground::new(&config),
            roster: Roster::with_capacity(population.size_hint().0),
            retired: Vec::new(),
            obstacles: Vec::new(),
            score: 0,
            tick: 0,
            phase: EpisodePhase::Active,
            next_id: 1,
            config,
            sprites,
            rng,
        };

        let start = episode.config.agent_start;
        for (controller, fitness) in population {
            let id = episode.next_entity_id();
            episode
                .roster
                .push(Agent::new(id, start.x, start.y), controller, fitness);
        }

        let id = episode.next_entity_id();
        let first = Obstacle::new(
            id,
            episode.config.first_obstacle_x,
            &episode.config,
            &episode.sprites,
            &mut episode.rng,
        );
        episode.obstacles.push(first);

        log::debug!(
            "Episode started: {} agents, first gap at {}",
            episode.roster.len(),
            episode.obstacles[0].gap_top()
        );
        episode
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.phase == EpisodePhase::Terminated
    }

    /// Obstacles passed so far
    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Ticks simulated so far
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn roster(&self) -> &Roster<C, F> {
        &self.roster
    }

    #[inline]
    pub fn retired(&self) -> &[RosterEntry<C, F>] {
        &self.retired
    }

    #[inline]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[inline]
    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn sprites(&self) -> &SpriteSheet {
        &self.sprites
    }

    /// Index of the obstacle agents should steer for: the second one once the
    /// lead agent is past the first one's trailing edge.
    pub fn reference_obstacle_index(&self) -> usize {
        match (self.roster.agents().first(), self.obstacles.first()) {
            (Some(lead), Some(first))
                if self.obstacles.len() > 1 && lead.x() > first.trailing_edge() =>
            {
                1
            }
            _ => 0,
        }
    }

    pub fn reference_obstacle(&self) -> Option<&Obstacle> {
        self.obstacles.get(self.reference_obstacle_index())
    }

    /// What the agent at `index` would currently observe
    pub fn observe(&self, index: usize) -> Option<Observation> {
        let agent = self.roster.agents().get(index)?;
        Some(observe(agent, self.reference_obstacle()))
    }

    /// External stop: the episode ends now and never advances again
    pub fn terminate(&mut self) {
        if self.phase != EpisodePhase::Terminated {
            log::info!(
                "Episode stopped externally at tick {} (score {}, {} agents alive)",
                self.tick,
                self.score,
                self.roster.len()
            );
            self.phase = EpisodePhase::Terminated;
        }
    }

    /// Advance one tick using each agent's own controller
    pub fn step(&mut self) -> StepReport
    where
        C: Controller,
    {
        self.advance(|_, controller, observation| controller.activate(observation))
    }

    /// Advance one tick with externally computed actions, one per live agent
    /// in roster order.
    pub fn step_with_actions(&mut self, actions: &[f32]) -> Result<StepReport, EpisodeError> {
        if self.is_terminated() {
            return Ok(StepReport::default());
        }
        let expected = self.roster.len();
        if actions.len() != expected {
            return Err(EpisodeError::ActionCountMismatch {
                expected,
                actual: actions.len(),
            });
        }
        Ok(self.advance(|index, _, _| actions[index]))
    }

    fn advance<A>(&mut self, mut decide: A) -> StepReport
    where
        A: FnMut(usize, &mut C, &Observation) -> f32,
    {
        let mut report = StepReport::default();
        if self.phase == EpisodePhase::Terminated {
            return report;
        }
        if self.roster.is_empty() {
            self.phase = EpisodePhase::Terminated;
            report.events.push(EpisodeEvent::Terminated);
            return report;
        }

        self.tick += 1;
        let reference = self.reference_obstacle_index();

        let Self {
            config,
            sprites,
            rng,
            roster,
            retired,
            obstacles,
            ground,
            score,
            next_id,
            ..
        } = self;
        let sprites: &SpriteSheet = sprites;

        // Survival reward, physics, then the controller's decision on the
        // post-move state
        let reference_obstacle = obstacles.get(reference);
        for (index, (agent, controller, fitness)) in roster.iter_mut().enumerate() {
            fitness.credit(config.survival_reward);
            agent.advance_one_tick(config);
            let observation = observe(agent, reference_obstacle);
            if decide(index, controller, &observation) > config.jump_threshold {
                agent.jump(config);
            }
        }

        // Collisions and pass-through. Removal is deferred to one compaction.
        let mut causes: Vec<Option<RetireCause>> = vec![None; roster.len()];
        let mut spawn = false;
        let mut off_screen = Vec::new();
        for obstacle in obstacles.iter_mut() {
            for (index, (agent, _, fitness)) in roster.iter_mut().enumerate() {
                if causes[index].is_some() {
                    continue;
                }
                if obstacle.overlaps(agent, sprites) {
                    fitness.credit(-config.collision_penalty);
                    causes[index] = Some(RetireCause::Collision);
                }
                if !obstacle.passed()
                    && obstacle.horizontal_edge() < agent.x()
                    && obstacle.mark_passed()
                {
                    spawn = true;
                    report
                        .events
                        .push(EpisodeEvent::ObstaclePassed { id: obstacle.id });
                }
            }

            if obstacle.is_off_screen() {
                off_screen.push(obstacle.id);
            }
            obstacle.advance_one_tick(config);
        }

        if spawn {
            *score += 1;
            for (fitness, cause) in roster.fitness_mut().iter_mut().zip(&causes) {
                if cause.is_none() {
                    fitness.credit(config.pass_bonus);
                }
            }

            let id = *next_id;
            *next_id += 1;
            let obstacle = Obstacle::new(id, config.spawn_obstacle_x, config, sprites, rng);
            log::debug!(
                "Tick {}: score {}, spawned obstacle {} with gap at {}",
                self.tick,
                score,
                id,
                obstacle.gap_top()
            );
            report.events.push(EpisodeEvent::ObstacleSpawned {
                id,
                gap_top: obstacle.gap_top(),
            });
            obstacles.push(obstacle);
        }

        if !off_screen.is_empty() {
            obstacles.retain(|o| !off_screen.contains(&o.id));
            report.events.extend(
                off_screen
                    .into_iter()
                    .map(|id| EpisodeEvent::ObstacleRetired { id }),
            );
        }

        let ground_y = ground.y();
        for (agent, cause) in roster.agents().iter().zip(causes.iter_mut()) {
            if cause.is_none() && agent.is_out_of_bounds(ground_y, sprites) {
                *cause = Some(RetireCause::OutOfBounds);
            }
        }

        let doomed: Vec<bool> = causes.iter().map(Option::is_some).collect();
        let removed = roster.compact(&doomed);
        for (entry, cause) in removed.iter().zip(causes.into_iter().flatten()) {
            log::trace!("Agent {} retired: {:?}", entry.agent.id, cause);
            report.events.push(EpisodeEvent::AgentRetired {
                id: entry.agent.id,
                cause,
            });
        }
        retired.extend(removed);

        ground.advance_one_tick(config);

        for agent in roster.agents_mut() {
            agent.advance_animation();
        }

        if roster.is_empty() {
            self.phase = EpisodePhase::Terminated;
            report.events.push(EpisodeEvent::Terminated);
            log::debug!(
                "Episode over after {} ticks with score {}",
                self.tick,
                self.score
            );
        }

        report
    }

    /// Read-only view for presentation
    pub fn snapshot(&self) -> EpisodeSnapshot {
        EpisodeSnapshot {
            tick: self.tick,
            score: self.score,
            phase: self.phase,
            agents: self.roster.agents().iter().map(AgentView::from).collect(),
            obstacles: self.obstacles.iter().map(ObstacleView::from).collect(),
            ground: GroundView::from(&self.ground),
        }
    }

    /// Consume the episode, handing back every controller and fitness
    /// accumulator in the order the population was supplied.
    pub fn finish(mut self) -> Vec<RosterEntry<C, F>> {
        let mut entries = std::mem::take(&mut self.retired);
        entries.extend(self.roster.drain());
        entries.sort_by_key(|e| e.agent.id);
        entries
    }
}
