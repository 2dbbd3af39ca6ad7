// src/serial.rs
use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use serialport::SerialPort;

use crate::drivers::{DatalogError, SampleSource};

const READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Serial device yielding one value per text line.
///
/// The device writes `<float>[,...]`-shaped lines; only the first field is
/// used. Lines that fail to parse are dropped silently, which keeps a noisy
/// or mid-boot device from killing the acquisition loop.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialSource {
    pub fn connect(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port {port_name}"))?;
        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }
}

impl SampleSource for SerialSource {
    fn poll_value(&mut self) -> Result<Option<f64>, DatalogError> {
        if self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }

        let mut chunk = [0u8; 256];
        let n = self.port.read(&mut chunk)?;
        self.pending.extend_from_slice(&chunk[..n]);

        let Some(pos) = self.pending.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let line: Vec<u8> = self.pending.drain(..=pos).collect();
        Ok(parse_line(&String::from_utf8_lossy(&line)))
    }
}

/// First comma-delimited field of a device line, or None when malformed.
fn parse_line(line: &str) -> Option<f64> {
    line.trim().split(',').next()?.trim().parse().ok()
}

/// Known serial ports, falling back to a platform guess when enumeration is
/// unavailable (the picker should never be empty on a machine that plausibly
/// has a device attached).
pub fn list_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) if !ports.is_empty() => ports.into_iter().map(|p| p.port_name).collect(),
        _ => fallback_ports(),
    }
}

fn fallback_ports() -> Vec<String> {
    if cfg!(windows) {
        (1..=10).map(|i| format!("COM{i}")).collect()
    } else {
        vec!["/dev/ttyUSB0".to_owned(), "/dev/ttyACM0".to_owned()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_field_of_a_line_is_the_value() {
        assert_eq!(parse_line("42.5,extra,fields"), Some(42.5));
        assert_eq!(parse_line("  17\r\n"), Some(17.0));
        assert_eq!(parse_line("-3.25"), Some(-3.25));
    }

    #[test]
    fn malformed_lines_yield_nothing() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("garbage"), None);
        assert_eq!(parse_line(",42.5"), None);
    }

    #[test]
    fn fallback_port_list_is_never_empty() {
        assert!(!fallback_ports().is_empty());
    }
}
