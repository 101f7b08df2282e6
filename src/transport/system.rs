//! System MIDI backend
//!
//! Connects to a device through the platform MIDI API (ALSA, CoreMIDI, WinMM)
//! using `midir`. The device address is matched case-insensitively against
//! port names, so `"Launchpad S"` finds `"Launchpad S:Launchpad S MIDI 1 20:0"`.

use std::collections::VecDeque;
use std::io;

use crossbeam::channel::{self, Receiver, TryRecvError};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use super::{Channels, RawInput, RawOutput, ReadMode, Transport};
use crate::protocol::MESSAGE_LEN;

/// Port-name patterns that usually belong to a Launchpad S
const DEVICE_PATTERNS: &[&str] = &["Launchpad S", "Launchpad"];

/// Opens devices through `midir`
#[derive(Debug, Clone)]
pub struct MidiTransport {
    client_name: String,
}

impl MidiTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    /// Find an input port by substring match
    fn find_input_port(
        midi_in: &MidiInput,
        pattern: &str,
    ) -> Option<(midir::MidiInputPort, String)> {
        let pattern = pattern.to_lowercase();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                if name.to_lowercase().contains(&pattern) {
                    debug!("Found input port '{}' matching '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    /// Find an output port by substring match
    fn find_output_port(
        midi_out: &MidiOutput,
        pattern: &str,
    ) -> Option<(midir::MidiOutputPort, String)> {
        let pattern = pattern.to_lowercase();
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                if name.to_lowercase().contains(&pattern) {
                    debug!("Found output port '{}' matching '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }
}

impl Default for MidiTransport {
    fn default() -> Self {
        Self::new("launchpad-s")
    }
}

impl Transport for MidiTransport {
    fn open(&self, address: &str, mode: ReadMode) -> io::Result<Channels> {
        let midi_in = MidiInput::new(&format!("{}-in", self.client_name))
            .map_err(|e| io::Error::other(e.to_string()))?;
        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, in_name) = Self::find_input_port(&midi_in, address).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("input port '{}' not found", address),
            )
        })?;

        let midi_out = MidiOutput::new(&format!("{}-out", self.client_name))
            .map_err(|e| io::Error::other(e.to_string()))?;
        debug!("Found {} MIDI output ports", midi_out.port_count());

        let (out_port, out_name) =
            Self::find_output_port(&midi_out, address).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("output port '{}' not found", address),
                )
            })?;

        // Inbound messages are queued by the midir thread and drained by `read`.
        let (tx, rx) = channel::unbounded();
        let input = midi_in
            .connect(
                &in_port,
                &self.client_name,
                move |_timestamp, data, _| {
                    let _ = tx.send(data.to_vec());
                },
                (),
            )
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string()))?;

        let output = midi_out
            .connect(&out_port, &self.client_name)
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string()))?;

        info!("Connected to '{}' / '{}' ({:?})", in_name, out_name, mode);

        Ok(Channels {
            input: Box::new(MidiInputChannel {
                connection: Some(input),
                rx,
                pending: VecDeque::new(),
                mode,
            }),
            output: Box::new(MidiOutputChannel {
                connection: Some(output),
            }),
        })
    }
}

/// Write half backed by a midir output connection
struct MidiOutputChannel {
    connection: Option<MidiOutputConnection>,
}

impl RawOutput for MidiOutputChannel {
    /// Sends one 3-byte message at a time. A failure after the first message
    /// reports the bytes already sent as a short write.
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;

        let mut written = 0;
        for message in data.chunks(MESSAGE_LEN) {
            match conn.send(message) {
                Ok(()) => written += message.len(),
                Err(e) if written == 0 => return Err(io::Error::other(e.to_string())),
                Err(e) => {
                    debug!("Send failed after {} bytes: {}", written, e);
                    break;
                }
            }
        }

        Ok(written)
    }

    /// midir hands each message to the OS synchronously
    fn drain(&mut self) -> io::Result<()> {
        if self.connection.is_some() {
            Ok(())
        } else {
            Err(io::Error::from(io::ErrorKind::NotConnected))
        }
    }

    fn close(mut self: Box<Self>) -> io::Result<()> {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
        Ok(())
    }
}

/// Read half backed by a midir input connection
struct MidiInputChannel {
    connection: Option<MidiInputConnection<()>>,
    rx: Receiver<Vec<u8>>,
    /// Bytes of a message that did not fit in the caller's buffer
    pending: VecDeque<u8>,
    mode: ReadMode,
}

impl MidiInputChannel {
    fn fill_pending(&mut self) -> io::Result<()> {
        let message = match self.mode {
            ReadMode::Blocking => self
                .rx
                .recv()
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?,
            ReadMode::NonBlocking => match self.rx.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => {
                    return Err(io::Error::from(io::ErrorKind::WouldBlock))
                }
                Err(TryRecvError::Disconnected) => {
                    return Err(io::Error::from(io::ErrorKind::BrokenPipe))
                }
            },
        };
        self.pending.extend(message);
        Ok(())
    }
}

impl RawInput for MidiInputChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.connection.is_none() {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }
        while self.pending.is_empty() {
            self.fill_pending()?;
        }

        let count = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn close(mut self: Box<Self>) -> io::Result<()> {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
        Ok(())
    }
}

/// Port discovery utilities
pub mod discovery {
    use super::*;

    /// Information about a MIDI port
    #[derive(Debug, Clone)]
    pub struct PortInfo {
        pub index: usize,
        pub name: String,
        pub is_launchpad: bool,
    }

    fn is_launchpad(name: &str) -> bool {
        let name = name.to_lowercase();
        DEVICE_PATTERNS
            .iter()
            .any(|pattern| name.contains(&pattern.to_lowercase()))
    }

    /// Discover input ports
    pub fn discover_input_ports() -> io::Result<Vec<PortInfo>> {
        let midi_in =
            MidiInput::new("launchpad-s-discovery").map_err(|e| io::Error::other(e.to_string()))?;

        let mut port_infos = Vec::new();
        for (index, port) in midi_in.ports().iter().enumerate() {
            if let Ok(name) = midi_in.port_name(port) {
                port_infos.push(PortInfo {
                    index,
                    is_launchpad: is_launchpad(&name),
                    name,
                });
            }
        }

        Ok(port_infos)
    }

    /// Discover output ports
    pub fn discover_output_ports() -> io::Result<Vec<PortInfo>> {
        let midi_out = MidiOutput::new("launchpad-s-discovery")
            .map_err(|e| io::Error::other(e.to_string()))?;

        let mut port_infos = Vec::new();
        for (index, port) in midi_out.ports().iter().enumerate() {
            if let Ok(name) = midi_out.port_name(port) {
                port_infos.push(PortInfo {
                    index,
                    is_launchpad: is_launchpad(&name),
                    name,
                });
            }
        }

        Ok(port_infos)
    }

    /// Name of the first input port that looks like a Launchpad and also has
    /// an output port of the same name
    pub fn find_launchpad() -> Option<String> {
        let inputs = discover_input_ports().ok()?;
        let outputs = discover_output_ports().ok()?;

        inputs
            .into_iter()
            .filter(|port| port.is_launchpad)
            .find(|port| outputs.iter().any(|out| out.name == port.name))
            .map(|port| port.name)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_is_launchpad() {
            assert!(is_launchpad("Launchpad S:Launchpad S MIDI 1 20:0"));
            assert!(is_launchpad("LAUNCHPAD S"));
            assert!(!is_launchpad("X-Touch INT"));
        }
    }
}
