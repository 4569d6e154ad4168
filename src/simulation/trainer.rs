//! Generational training loop.
//!
//! A [`Trainer`] owns one population of sensor-equipped cars plus the obstacle
//! traffic they race against. Each [`Trainer::step`] drives every live car
//! through sense → think → move, rescores it, and tracks the best car. Once
//! the whole population is damaged, the best network is cloned into a fresh
//! population and every clone except the first is mutated.

use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::brain::{CONTROL_OUTPUTS, Network};
use super::car::{Autopilot, Car, OvertakePolicy, Surroundings};
use super::params::{ConfigError, Params, TrainingParams};
use super::road::Road;
use super::traffic::Traffic;

/// Run statistics carried from one generation to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingContext {
    /// Current generation, starting at 1.
    pub generation: u32,
    /// Highest generation-best fitness seen so far.
    pub best_ever_fitness: f32,
    /// Longest generation-best distance seen so far.
    pub best_ever_distance: f32,
    /// Network the next population is seeded from; `None` means random start.
    ///
    /// Persisted separately through the network store.
    #[serde(skip)]
    pub best_network: Option<Network>,
}

impl Default for TrainingContext {
    fn default() -> Self {
        Self {
            generation: 1,
            best_ever_fitness: 0.0,
            best_ever_distance: 0.0,
            best_network: None,
        }
    }
}

/// Result of a finished generation.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// Generation that just finished.
    pub generation: u32,
    /// Ticks the generation ran for.
    pub ticks: u64,
    /// Fitness of its best car.
    pub best_fitness: f32,
    /// Distance covered by its best car.
    pub best_distance: f32,
    /// Network of its best car.
    pub network: Option<Network>,
}

/// What a single [`Trainer::step`] observed.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Some cars are still driving.
    Running {
        /// Cars not yet damaged.
        alive: usize,
    },
    /// Every car is damaged and automatic advancing is off.
    Exhausted,
    /// Every car was damaged and the next generation has been seeded.
    Advanced(GenerationSummary),
}

/// Scores a live car: distance from the start line, plus a reward per unit
/// of speed and per obstacle behind it.
///
/// Zero at spawn. Not clamped, so a car that backed up behind the start line
/// still gains on every forward tick.
pub fn fitness(car: &Car, traffic: &Traffic, training: &TrainingParams) -> f32 {
    let overtaken = traffic.overtaken_by(car.kinematics.y) as f32;
    car.distance()
        + training.speed_reward * car.kinematics.speed
        + training.overtake_reward * overtaken
}

/// Index of the fittest car; the first one wins ties. `0` for an empty slice.
pub fn best_index(cars: &[Car]) -> usize {
    let mut best = 0;
    for (i, car) in cars.iter().enumerate().skip(1) {
        if car.fitness > cars[best].fitness {
            best = i;
        }
    }
    best
}

/// Population trainer.
pub struct Trainer {
    params: Params,
    road: Road,
    policy: OvertakePolicy,
    cars: Vec<Car>,
    traffic: Traffic,
    best: usize,
    context: TrainingContext,
    rng: SmallRng,
    tick: u64,
}

impl Trainer {
    /// Creates a trainer, seeding its RNG from `params.training.seed` or the OS.
    pub fn new(params: Params, context: TrainingContext) -> Self {
        let rng = match params.training.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::with_rng(params, context, rng)
    }

    /// Creates a trainer with an explicit random source.
    ///
    /// A carried network that does not fit the sensor layout is dropped and
    /// the population starts from random networks instead.
    pub fn with_rng(params: Params, mut context: TrainingContext, rng: SmallRng) -> Self {
        debug_assert!(params.validate().is_ok(), "invalid params reached the trainer");

        if let Some(network) = &context.best_network {
            if let Err(err) = network.check_io(params.sensor.input_size(), CONTROL_OUTPUTS) {
                warn!(%err, "carried network does not fit the sensor layout, starting fresh");
                context.best_network = None;
            }
        }

        let mut trainer = Self {
            road: Road::from_params(&params.road),
            policy: OvertakePolicy::from(&params.policy),
            params,
            cars: Vec::new(),
            traffic: Traffic::default(),
            best: 0,
            context,
            rng,
            tick: 0,
        };
        trainer.reset_population();
        trainer
    }

    /// Builds a fresh population and traffic from the carried network.
    fn reset_population(&mut self) {
        let training = &self.params.training;
        let max_speed = self.params.car_max_speed();
        let mut cars = Vec::with_capacity(training.population_size);

        for id in 0..training.population_size {
            let lane = self.rng.random_range(0..self.road.lane_count);
            let brain = match &self.context.best_network {
                Some(seed) => {
                    let mut brain = seed.clone();
                    if id != 0 {
                        brain.mutate(
                            training.mutation_rate,
                            training.mutation_magnitude,
                            &mut self.rng,
                        );
                    }
                    brain
                }
                None => Network::for_controls(
                    self.params.sensor.input_size(),
                    training.hidden_size,
                    &mut self.rng,
                ),
            };
            cars.push(Car::trainee(
                id,
                self.road.lane_center(lane),
                self.params.road.start_y,
                &self.params.vehicle,
                &self.params.sensor,
                max_speed,
                brain,
            ));
        }

        self.cars = cars;
        self.traffic = Traffic::generate(&self.road, &self.params, &mut self.rng);
        self.best = 0;
        self.tick = 0;
    }

    /// Advances the simulation by one tick.
    ///
    /// Traffic moves first; every live car then senses the same traffic
    /// snapshot, decides and moves. Cars still alive after moving are
    /// rescored; a crash freezes the score from the tick before.
    pub fn step(&mut self) -> TickOutcome {
        self.tick += 1;
        self.traffic.step(&self.road, &self.params, &mut self.rng);

        let vehicle = &self.params.vehicle;
        let reach = self.params.sensor.ray_length + vehicle.width.hypot(vehicle.height);
        let index = self.traffic.index();
        let mut pilot = Autopilot::new(&self.policy);

        for car in self.cars.iter_mut().filter(|c| c.is_alive()) {
            let surroundings = Surroundings {
                borders: &self.road.borders,
                obstacles: index.near(car.center(), reach),
            };
            car.drive(&mut pilot, vehicle, &surroundings);
            if car.is_alive() {
                car.fitness = fitness(car, &self.traffic, &self.params.training);
            }
        }

        self.best = best_index(&self.cars);

        let alive = self.alive_count();
        if alive > 0 {
            TickOutcome::Running { alive }
        } else if self.params.training.auto_advance {
            TickOutcome::Advanced(self.next_generation())
        } else {
            TickOutcome::Exhausted
        }
    }

    /// Ends the current generation, promoting its best network.
    ///
    /// Can be called before every car is damaged to force the transition.
    pub fn next_generation(&mut self) -> GenerationSummary {
        let best = self.cars.get(self.best);
        let summary = GenerationSummary {
            generation: self.context.generation,
            ticks: self.tick,
            best_fitness: best.map_or(0.0, |car| car.fitness),
            best_distance: best.map_or(0.0, Car::distance),
            network: best.and_then(|car| car.brain.clone()),
        };

        self.context.best_ever_fitness = self.context.best_ever_fitness.max(summary.best_fitness);
        self.context.best_ever_distance =
            self.context.best_ever_distance.max(summary.best_distance);
        if let Some(network) = &summary.network {
            self.context.best_network = Some(network.clone());
        }
        self.context.generation += 1;

        info!(
            generation = summary.generation,
            ticks = summary.ticks,
            best_fitness = summary.best_fitness,
            best_distance = summary.best_distance,
            "generation finished"
        );

        self.reset_population();
        summary
    }

    /// Reruns the current generation from the carried network.
    pub fn restart_generation(&mut self) {
        info!(generation = self.context.generation, "restarting generation");
        self.reset_population();
    }

    /// Changes the mutation rate used for the next population; clamped to `[0, 1]`.
    pub fn set_mutation_rate(&mut self, rate: f32) {
        self.params.training.mutation_rate = if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, 1.0)
        };
    }

    /// Overrides the base max speed of every training car, now and in later generations.
    ///
    /// Rejects values that [`Params::validate`] would reject and leaves the
    /// cars unchanged.
    pub fn set_max_speed(&mut self, max_speed: f32) -> Result<(), ConfigError> {
        if !(max_speed.is_finite() && max_speed > 0.0) {
            return Err(ConfigError::MaxSpeed(max_speed));
        }
        self.params.training.max_speed_override = Some(max_speed);
        for car in &mut self.cars {
            car.base_max_speed = max_speed;
            car.kinematics.max_speed = max_speed;
        }
        Ok(())
    }

    /// Training cars of the current generation.
    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    /// Mutable access for hosts that adjust cars between ticks.
    pub fn cars_mut(&mut self) -> &mut [Car] {
        &mut self.cars
    }

    /// Current obstacle traffic.
    pub fn traffic(&self) -> &Traffic {
        &self.traffic
    }

    /// Road the population drives on.
    pub fn road(&self) -> &Road {
        &self.road
    }

    /// Index of the current best car.
    pub fn best_index(&self) -> usize {
        self.best
    }

    /// Current best car.
    pub fn best_car(&self) -> Option<&Car> {
        self.cars.get(self.best)
    }

    /// Network of the current best car.
    pub fn best_network(&self) -> Option<&Network> {
        self.best_car().and_then(|car| car.brain.as_ref())
    }

    /// Cars not yet damaged.
    pub fn alive_count(&self) -> usize {
        self.cars.iter().filter(|c| c.is_alive()).count()
    }

    /// Run statistics and the carried network.
    pub fn context(&self) -> &TrainingContext {
        &self.context
    }

    /// Current generation number.
    pub fn generation(&self) -> u32 {
        self.context.generation
    }

    /// Ticks since the current generation started.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Active parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }
}
