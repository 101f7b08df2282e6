//! Tests for the Launchpad session

use super::*;
use crate::protocol::{Color, EventKind, GridKey, NoteState};
use crate::transport::memory::{Faults, MemoryTransport};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn open(transport: &MemoryTransport, nonblocking: bool) -> Launchpad {
    Launchpad::open_with(transport, "hw:1,0,0", nonblocking).unwrap()
}

fn green_grid() -> Grid {
    Grid::filled(NoteState::On, Color::GREEN_FULL)
}

#[test]
fn test_open_failure() {
    let transport = MemoryTransport::new();
    transport.set_faults(Faults {
        open: true,
        ..Faults::default()
    });

    let err = Launchpad::open_with(&transport, "hw:9,0,0", false).unwrap_err();
    assert!(matches!(err, Error::OpeningFailed { ref address, .. } if address == "hw:9,0,0"));
    assert_eq!(err.code(), -2);
}

#[test]
fn test_set_note_message() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    lp.set_note(Note::on(GridKey::encode(0, 0), Color::RED_FULL))
        .unwrap();
    lp.set_note(Note::off(GridKey::encode(0, 0))).unwrap();

    assert_eq!(
        transport.messages(),
        vec![[0x90, 0x00, 0x03], [0x80, 0x00, 0x00]]
    );
}

/// Log output captured from a scoped subscriber
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

#[test]
fn test_each_message_is_traced_once() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let transport = MemoryTransport::new();
    tracing::subscriber::with_default(subscriber, || {
        let mut lp = open(&transport, true);
        lp.set_note(Note::on(GridKey::encode(0, 0), Color::RED_FULL))
            .unwrap();
        lp.swap_buffers().unwrap();
    });

    let text = logs.text();
    assert_eq!(text.matches("Sent:").count(), 2, "{}", text);
    assert_eq!(text.matches("Sent: 90 00 03").count(), 1);
}

#[test]
fn test_set_grid_is_one_message() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    lp.set_grid(&green_grid()).unwrap();

    let written = transport.written();
    assert_eq!(written.len(), 192);
    assert_eq!(written, green_grid().encode());
}

#[test]
fn test_set_notes_checks_length() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    let err = lp.set_notes(&[]).unwrap_err();
    assert!(matches!(err, Error::ArgumentNull));

    let grid = green_grid();
    let err = lp.set_notes(&grid.as_slice()[..10]).unwrap_err();
    assert!(matches!(
        err,
        Error::GridLength {
            expected: 64,
            actual: 10
        }
    ));
    assert!(transport.written().is_empty());

    lp.set_notes(grid.as_slice()).unwrap();
    assert_eq!(transport.written(), grid.encode());
}

#[test]
fn test_reset_message() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    lp.reset().unwrap();
    assert_eq!(transport.messages(), vec![[0xB0, 0x00, 0x00]]);
}

#[test]
fn test_reset_does_not_change_encoding() {
    let fresh = MemoryTransport::new();
    let mut lp = open(&fresh, true);
    lp.set_note(Note::on(GridKey::encode(3, 4), Color::YELLOW_MEDIUM))
        .unwrap();
    lp.set_grid(&green_grid()).unwrap();

    let after_reset = MemoryTransport::new();
    let mut lp = open(&after_reset, true);
    lp.reset().unwrap();
    after_reset.take_written();
    lp.set_note(Note::on(GridKey::encode(3, 4), Color::YELLOW_MEDIUM))
        .unwrap();
    lp.set_grid(&green_grid()).unwrap();

    assert_eq!(fresh.written(), after_reset.written());
}

#[test]
fn test_flashing_messages() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    lp.enable_flashing().unwrap();
    lp.disable_flashing().unwrap();

    assert_eq!(
        transport.messages(),
        vec![[0xB0, 0x00, 0x28], [0xB0, 0x00, 0x21]]
    );
    assert_eq!(lp.current_buffer(), Buffer::Zero);
}

#[test]
fn test_set_buffering_flags_keeps_current_buffer() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    let flags = BufferingFlags::new(Buffer::One, Buffer::Zero).with_copy();
    lp.set_buffering_flags(flags).unwrap();

    assert_eq!(transport.messages(), vec![[0xB0, 0x00, 0x31]]);
    assert_eq!(lp.current_buffer(), Buffer::Zero);
}

#[test]
fn test_swap_buffers_toggles() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    assert_eq!(lp.current_buffer(), Buffer::Zero);

    lp.swap_buffers().unwrap();
    assert_eq!(lp.current_buffer(), Buffer::One);

    lp.swap_buffers().unwrap();
    assert_eq!(lp.current_buffer(), Buffer::Zero);

    // Display 1 / update 0 / copy, then display 0 / update 1 / copy
    assert_eq!(
        transport.messages(),
        vec![[0xB0, 0x00, 0x31], [0xB0, 0x00, 0x34]]
    );
}

#[test]
fn test_every_swap_sets_copy() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    let mut previous = lp.current_buffer();
    for _ in 0..6 {
        lp.swap_buffers().unwrap();
        assert_ne!(lp.current_buffer(), previous);
        previous = lp.current_buffer();
    }

    for [status, control, value] in transport.messages() {
        assert_eq!((status, control), (0xB0, 0x00));
        let flags = BufferingFlags::from_bits(value - 0x20).unwrap();
        assert!(flags.copy());
        assert_ne!(flags.display(), flags.update());
    }
}

#[test]
fn test_failed_swap_keeps_buffer() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    transport.set_faults(Faults {
        write_limit: Some(1),
        ..Faults::default()
    });
    let err = lp.swap_buffers().unwrap_err();
    assert!(matches!(
        err,
        Error::WriteFailed {
            expected: 3,
            written: 1,
            ..
        }
    ));
    assert_eq!(lp.current_buffer(), Buffer::Zero);

    transport.set_faults(Faults {
        drain: true,
        ..Faults::default()
    });
    let err = lp.swap_buffers().unwrap_err();
    assert!(matches!(err, Error::DrainFailed(_)));
    assert_eq!(lp.current_buffer(), Buffer::Zero);

    transport.set_faults(Faults::default());
    lp.swap_buffers().unwrap();
    assert_eq!(lp.current_buffer(), Buffer::One);
}

#[test]
fn test_short_grid_write() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    lp.swap_buffers().unwrap();

    transport.set_faults(Faults {
        write_limit: Some(96),
        ..Faults::default()
    });
    let err = lp.set_grid(&green_grid()).unwrap_err();
    assert!(matches!(
        err,
        Error::WriteFailed {
            expected: 192,
            written: 96,
            ..
        }
    ));
    assert_eq!(err.code(), -4);
    assert_eq!(lp.current_buffer(), Buffer::One);
}

#[test]
fn test_drain_failure() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    transport.set_faults(Faults {
        drain: true,
        ..Faults::default()
    });

    let err = lp
        .set_note(Note::on(GridKey::encode(1, 1), Color::RED_LOW))
        .unwrap_err();
    assert!(matches!(err, Error::DrainFailed(_)));
}

#[test]
fn test_poll_nonblocking_empty() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    for _ in 0..5 {
        assert_eq!(lp.poll_event().unwrap(), None);
    }
}

#[test]
fn test_poll_decodes_events() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    transport.push_input(&[0x90, 0x23, 0x7F]);
    transport.push_input(&[0x90, 0x23, 0x00]);
    transport.push_input(&[0xB0, 0x6A, 0x7F]);

    let event = lp.poll_event().unwrap().unwrap();
    assert_eq!(event, Event::new(EventKind::Pressed, 3, 2));
    let event = lp.poll_event().unwrap().unwrap();
    assert_eq!(event, Event::new(EventKind::Released, 3, 2));
    let event = lp.poll_event().unwrap().unwrap();
    assert_eq!(event, Event::new(EventKind::AutomapPressed, 2, 0));
    assert_eq!(lp.poll_event().unwrap(), None);
}

#[test]
fn test_poll_short_read_is_no_event() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    transport.push_input(&[0x90, 0x23]);
    assert_eq!(lp.poll_event().unwrap(), None);
}

#[test]
fn test_poll_unclassified_is_no_event() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    transport.push_input(&[0x80, 0x23, 0x40]);
    assert_eq!(lp.poll_event().unwrap(), None);
}

#[test]
fn test_poll_read_failure() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    transport.set_faults(Faults {
        read: true,
        ..Faults::default()
    });

    let err = lp.poll_event().unwrap_err();
    assert!(matches!(err, Error::ReadFailed(_)));
    assert_eq!(err.code(), -8);
}

#[test]
fn test_poll_blocking_waits_for_input() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, false);
    assert!(!lp.is_nonblocking());

    let feeder = transport.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        feeder.push_input(&[0x90, 0x77, 0x7F]);
    });

    let event = lp.poll_event().unwrap();
    assert_eq!(event, Some(Event::new(EventKind::Pressed, 7, 7)));
    handle.join().unwrap();
}

#[test]
fn test_close_is_idempotent() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    assert!(lp.is_open());
    assert_eq!(transport.open_handles(), 2);

    lp.close().unwrap();
    assert!(!lp.is_open());
    assert_eq!(transport.open_handles(), 0);

    lp.close().unwrap();
}

#[test]
fn test_closed_session_is_uninitialized() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    lp.close().unwrap();

    assert!(matches!(lp.reset(), Err(Error::Uninitialized)));
    assert!(matches!(
        lp.set_note(Note::off(GridKey::encode(0, 0))),
        Err(Error::Uninitialized)
    ));
    assert!(matches!(lp.set_grid(&Grid::new()), Err(Error::Uninitialized)));
    assert!(matches!(lp.set_notes(&[]), Err(Error::Uninitialized)));
    assert!(matches!(lp.swap_buffers(), Err(Error::Uninitialized)));
    assert!(matches!(lp.enable_flashing(), Err(Error::Uninitialized)));
    assert!(matches!(lp.disable_flashing(), Err(Error::Uninitialized)));
    assert!(matches!(lp.poll_event(), Err(Error::Uninitialized)));
    assert_eq!(lp.current_buffer(), Buffer::Zero);
    assert!(transport.written().is_empty());
}

#[test]
fn test_close_failure_still_releases() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);
    transport.set_faults(Faults {
        close: true,
        ..Faults::default()
    });

    let err = lp.close().unwrap_err();
    assert!(matches!(err, Error::CloseFailed(_)));
    assert_eq!(transport.open_handles(), 0);
    assert!(!lp.is_open());

    // Nothing left to close
    lp.close().unwrap();
}

#[test]
fn test_drop_closes_channels() {
    let transport = MemoryTransport::new();
    {
        let _lp = open(&transport, true);
        assert_eq!(transport.open_handles(), 2);
    }
    assert_eq!(transport.open_handles(), 0);
}

#[test]
fn test_require_session() {
    let transport = MemoryTransport::new();
    let mut lp = open(&transport, true);

    assert!(Launchpad::require(Some(&mut lp)).is_ok());
    let err = Launchpad::require(None).unwrap_err();
    assert!(matches!(err, Error::NullSession));
    assert_eq!(err.code(), -1);
}
