//! A headless side-scrolling pipe course. Birds fall under gravity, flap on their agent's
//! say-so and die on touching a pipe or the ground.

use crate::{config::CourseConfig, population::Population, scenario::Environment};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub x: f64,
    pub gap_top: f64,
    pub gap_bottom: f64,
    pub passed: bool,
}

impl Pipe {
    fn new<R: Rng + ?Sized>(config: &CourseConfig, rng: &mut R) -> Self {
        let lowest = config.floor() - config.pipe_gap - config.pipe_margin;
        // whole pixels
        let gap_top = rng
            .random_range(config.pipe_margin..=lowest)
            .round()
            .clamp(config.pipe_margin, lowest);
        Self {
            x: config.screen_width,
            gap_top,
            gap_bottom: gap_top + config.pipe_gap,
            passed: false,
        }
    }

    fn right(&self, config: &CourseConfig) -> f64 {
        self.x + config.pipe_width
    }

    fn collides_with(&self, bird: &Bird, config: &CourseConfig) -> bool {
        let r = config.bird_radius;
        let overlaps = config.bird_x + r > self.x && config.bird_x - r < self.right(config);
        overlaps && (bird.y - r < self.gap_top || bird.y + r > self.gap_bottom)
    }
}

/// The physical state the course keeps per agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bird {
    pub y: f64,
    pub velocity: f64,
}

impl Bird {
    fn start(config: &CourseConfig) -> Self {
        Self {
            y: config.screen_height / 2.,
            velocity: 0.,
        }
    }
}

pub const OBSERVATION_SIZE: usize = 4;

pub struct Course<R: Rng> {
    config: CourseConfig,
    pipes: Vec<Pipe>,
    birds: Vec<Bird>,
    spawn_timer: u32,
    ticks: u64,
    rng: R,
}

impl<R: Rng> Course<R> {
    /// `rng` only lays out pipes; it is independent of the evolution's randomness.
    pub fn new(config: CourseConfig, rng: R) -> Self {
        let mut course = Self {
            config,
            pipes: Vec::new(),
            birds: Vec::new(),
            spawn_timer: 0,
            ticks: 0,
            rng,
        };
        course.reset();
        course
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The first pipe whose right edge is still ahead of the birds
    fn next_pipe(&self) -> Option<&Pipe> {
        self.pipes
            .iter()
            .find(|p| p.right(&self.config) > self.config.bird_x)
    }

    /// Normalized inputs for `bird`, or None while no pipe is ahead.
    pub fn observe(&self, bird: &Bird) -> Option<[f64; OBSERVATION_SIZE]> {
        let h = self.config.screen_height;
        self.next_pipe().map(|pipe| {
            [
                bird.y / h,
                pipe.gap_top / h,
                pipe.gap_bottom / h,
                (bird.velocity + 10.) / 20.,
            ]
        })
    }

    fn advance_pipes(&mut self) {
        let speed = self.config.pipe_speed;
        for pipe in self.pipes.iter_mut() {
            pipe.x -= speed;
        }
        let config = &self.config;
        self.pipes.retain(|p| p.right(config) >= 0.);

        self.spawn_timer += 1;
        if self.spawn_timer >= self.config.pipe_spawn_rate {
            self.pipes.push(Pipe::new(&self.config, &mut self.rng));
            self.spawn_timer = 0;
        }
    }
}

impl<R: Rng> Environment for Course<R> {
    fn observation_size(&self) -> usize {
        OBSERVATION_SIZE
    }

    fn reset(&mut self) {
        self.pipes.clear();
        self.birds.clear();
        self.spawn_timer = self
            .config
            .pipe_spawn_rate
            .saturating_sub(self.config.first_pipe_delay);
        self.ticks = 0;
    }

    fn step(&mut self, population: &mut Population) {
        if self.birds.len() != population.len() {
            self.birds = vec![Bird::start(&self.config); population.len()];
        }

        // think
        for (idx, agent) in population.agents().iter().enumerate() {
            if !agent.is_alive() {
                continue;
            }
            if let Some(obs) = self.observe(&self.birds[idx]) {
                if agent.decide(&obs) {
                    self.birds[idx].velocity = self.config.flap_strength;
                }
            }
        }

        // fall
        let config = &self.config;
        for (agent, bird) in population.agents_mut().iter_mut().zip(&mut self.birds) {
            if !agent.is_alive() {
                continue;
            }
            bird.velocity += config.gravity;
            bird.y += bird.velocity;
            agent.accrue_fitness(config.tick_reward);

            if bird.y - config.bird_radius <= 0. {
                bird.y = config.bird_radius;
                bird.velocity = 0.;
            }
            if bird.y + config.bird_radius >= config.floor() {
                bird.y = config.floor() - config.bird_radius;
                agent.die();
            }
        }

        self.advance_pipes();

        let config = &self.config;
        for (agent, bird) in population.agents_mut().iter_mut().zip(&self.birds) {
            if agent.is_alive() && self.pipes.iter().any(|p| p.collides_with(bird, config)) {
                agent.die();
            }
        }

        // every bird shares one x, so a pipe is passed by all survivors at once
        if population.alive_count() > 0 {
            for pipe in self.pipes.iter_mut() {
                if !pipe.passed && config.bird_x > pipe.right(config) {
                    pipe.passed = true;
                    for agent in population.agents_mut() {
                        agent.mark_passed_obstacle(config.obstacle_bonus);
                    }
                }
            }
        }

        self.ticks += 1;
        if self.ticks >= self.config.max_ticks {
            for agent in population.agents_mut() {
                agent.die();
            }
        }
    }
}
