//! Event monitor for debugging
//!
//! Prints every button event with a timestamp and echoes grid presses on the
//! pads themselves.

use anyhow::{Context, Result};
use colored::*;
use launchpad_s::{Color, Event, EventKind, GridKey, Launchpad, Note};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

/// Polling period for non-blocking sessions
const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn kind_label(kind: EventKind) -> ColoredString {
    match kind {
        EventKind::Pressed => "DOWN".green(),
        EventKind::Released => "UP  ".red(),
        EventKind::AutomapPressed => "DOWN".bright_green(),
        EventKind::AutomapReleased => "UP  ".bright_red(),
    }
}

fn print_event(start: Instant, event: &Event) {
    let timestamp = format!("{:08}", start.elapsed().as_millis());
    let area = if event.kind.is_automap() {
        "automap".yellow()
    } else if event.x == 8 {
        "side   ".cyan()
    } else {
        "grid   ".white()
    };

    println!(
        "[{}ms] {} {} | {}",
        timestamp.dimmed(),
        kind_label(event.kind),
        area,
        event.to_string().bright_blue()
    );
}

/// Light a pad while it is held. Automap LEDs are not addressable by note.
fn echo(lp: &mut Launchpad, event: &Event) -> Result<()> {
    if event.kind.is_automap() {
        return Ok(());
    }

    let key = GridKey::encode(event.y, event.x);
    let note = if event.kind.is_press() {
        Note::on(key, Color::YELLOW_FULL)
    } else {
        Note::off(key)
    };
    lp.set_note(note).context("Failed to echo event")
}

fn handle(lp: &mut Launchpad, start: Instant, event: &Event) {
    print_event(start, event);
    if let Err(e) = echo(lp, event) {
        warn!("{:#}", e);
    }
}

/// Read events on the calling thread until the session fails
fn read_blocking(mut lp: Launchpad, start: Instant) {
    loop {
        match lp.poll_event() {
            Ok(Some(event)) => handle(&mut lp, start, &event),
            Ok(None) => {}
            Err(e) => {
                warn!("Monitor stopped: {}", e);
                break;
            }
        }
    }
}

/// Print events until `shutdown` resolves.
///
/// A non-blocking session is polled here and reset and closed at shutdown.
///
/// A blocking read only returns once input arrives, so a blocking session is
/// moved to a reader thread that prints and echoes on its own. That thread
/// cannot be interrupted: at shutdown it is left behind, and the session is
/// neither reset nor closed.
pub async fn run(mut lp: Launchpad, shutdown: impl Future<Output = ()>) -> Result<()> {
    println!("{}", "=== Launchpad Monitor ===".bold().cyan());
    println!("Press Ctrl+C to exit");
    println!("{}", "Format: [timestamp] STATE AREA | EVENT".dimmed());
    println!("{}\n", "─".repeat(60).dimmed());

    let start = Instant::now();
    tokio::pin!(shutdown);

    if lp.is_nonblocking() {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    while let Some(event) = lp.poll_event().context("Failed to read Launchpad input")? {
                        handle(&mut lp, start, &event);
                    }
                }
                _ = &mut shutdown => break,
            }
        }
        lp.reset().context("Failed to reset Launchpad")?;
        lp.close().context("Failed to close Launchpad")?;
    } else {
        std::thread::spawn(move || read_blocking(lp, start));
        shutdown.await;
        warn!("Blocking session left open; pads held at exit stay lit");
    }

    println!("\n{}", "Monitor stopped".yellow());
    Ok(())
}
