//! Reaction game
//!
//! A green pad lights up at a random position; press it before the next one
//! appears. Every hit raises the spawn rate. Missing a pad ends the game.

use anyhow::{Context, Result};
use colored::*;
use launchpad_s::{Color, Event, EventKind, Grid, Launchpad, NoteState};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::DemoConfig;

/// Linear congruential generator (a = 1664525, c = 1013904223, m = 2^31)
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const A: u32 = 1_664_525;
    const C: u32 = 1_013_904_223;
    const M: u32 = 1 << 31;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = Self::A.wrapping_mul(self.state).wrapping_add(Self::C) % Self::M;
        self.state
    }
}

/// Result of advancing the game clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running,
    /// A pad was due while the previous one was still lit
    Lost,
}

/// Game state, independent of the device
#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    rng: Lcg,
    score: u32,
    spawn_rate: f64,
    spawn_rate_step: f64,
    since_spawn: f64,
    /// The last spawned pad has been hit
    cleared: bool,
}

impl Game {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            grid: Grid::new(),
            rng: Lcg::new(config.seed),
            score: 0,
            spawn_rate: config.spawn_rate,
            spawn_rate_step: config.spawn_rate_step,
            since_spawn: 0.0,
            cleared: true,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn spawn_rate(&self) -> f64 {
        self.spawn_rate
    }

    /// Handle a button event. Returns `true` on a hit.
    pub fn press(&mut self, event: &Event) -> bool {
        if event.kind != EventKind::Pressed {
            return false;
        }
        // Side column and Automap presses fall outside the grid
        if !self.grid.is_lit(event.y, event.x) {
            return false;
        }

        self.grid.turn_off(event.y, event.x);
        self.cleared = true;
        self.score += 1;
        self.spawn_rate += self.spawn_rate_step;
        true
    }

    /// Advance the spawn clock by `elapsed` seconds
    pub fn advance(&mut self, elapsed: f64) -> Tick {
        self.since_spawn += elapsed;
        if self.since_spawn <= 1.0 / self.spawn_rate {
            return Tick::Running;
        }
        if !self.cleared {
            return Tick::Lost;
        }

        self.cleared = false;
        self.since_spawn = 0.0;

        let random = self.rng.next_u32();
        let row = (random % 8) as u8;
        let col = ((random / 8) % 8) as u8;
        self.grid.light(row, col, Color::GREEN_FULL);
        debug!("Spawned pad at row {} col {}", row, col);
        Tick::Running
    }
}

/// Why the game loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Lost,
    Quit,
}

/// Hit feedback: a log line and the terminal bell
fn on_hit(game: &Game) {
    info!(
        "Hit! Score: {} ({:.1} pads/s)",
        game.score(),
        game.spawn_rate()
    );
    print!("\x07");
    let _ = std::io::stdout().flush();
}

/// Play until the game is lost or `shutdown` resolves, then show the final
/// screen and reset the device. Returns the score.
pub async fn play(
    lp: &mut Launchpad,
    config: &DemoConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<u32> {
    let mut game = Game::new(config);

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / config.fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;

                while let Some(event) = lp.poll_event().context("Failed to read Launchpad input")? {
                    if game.press(&event) {
                        on_hit(&game);
                    }
                }

                lp.swap_buffers().context("Failed to swap buffers")?;

                if game.advance(elapsed) == Tick::Lost {
                    break Outcome::Lost;
                }

                lp.set_grid(game.grid()).context("Failed to update grid")?;
            }

            _ = &mut shutdown => {
                break Outcome::Quit;
            }
        }
    };

    match outcome {
        Outcome::Lost => println!("{}", "You lost!".red().bold()),
        Outcome::Quit => println!("{}", "Game stopped".yellow()),
    }
    println!("Your score: {}", game.score().to_string().green().bold());

    if let Err(e) = game_over(lp).await {
        warn!("Failed to show final screen: {:#}", e);
    }

    Ok(game.score())
}

/// Paint the grid red, flash it, then clear the device
async fn game_over(lp: &mut Launchpad) -> Result<()> {
    lp.set_grid(&Grid::filled(NoteState::On, Color::RED_FULL))?;

    lp.enable_flashing()?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    lp.disable_flashing()?;
    lp.swap_buffers()?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    lp.reset()?;
    Ok(())
}
