/// Edge notifications from the pigpio daemon's pipe interface
use log::{debug, error, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use crate::air_quality::{EdgeEvent, Level};
use crate::error::{MonitorError, Result};

// gpioReport_t layout: seqno u16, flags u16, tick u32, level u32
const REPORT_SIZE: usize = 12;
const NOTIFY_FLAGS_WDOG: u16 = 1 << 5;
const NOTIFY_FLAGS_ALIVE: u16 = 1 << 6;
const NOTIFY_FLAGS_EVENT: u16 = 1 << 7;
const NOTIFY_FLAGS_BIT_MASK: u16 = 0x1F;

/// Command channel to pigpiod (`<dir>/pigpio` in, `<dir>/pigout` out)
#[derive(Debug, Clone)]
pub struct PigpioPipe {
    dir: PathBuf,
}

impl PigpioPipe {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Send one command and return the daemon's integer reply
    pub fn command(&self, cmd: &str) -> Result<u32> {
        let mut input = OpenOptions::new()
            .write(true)
            .open(self.dir.join("pigpio"))?;
        writeln!(input, "{}", cmd)?;

        let mut reply = String::new();
        BufReader::new(File::open(self.dir.join("pigout"))?).read_line(&mut reply)?;

        parse_reply(cmd, &reply)
    }

    fn notification_path(&self, handle: u32) -> PathBuf {
        self.dir.join(format!("pigpio{}", handle))
    }
}

fn parse_reply(cmd: &str, reply: &str) -> Result<u32> {
    let code: i64 = reply.trim().parse().map_err(|_| MonitorError::Parse {
        what: "pigpio reply",
        value: reply.to_string(),
    })?;

    // Bank reads are raw bit masks and may print as negative
    if cmd.starts_with("br") {
        return Ok(code as u32);
    }
    if code < 0 {
        return Err(MonitorError::Gpio(format!(
            "`{}` failed with code {}",
            cmd, code
        )));
    }
    Ok(code as u32)
}

/// Turns raw notification reports into edge events for one pin
#[derive(Debug)]
pub struct EdgeDecoder {
    gpio: u8,
    last_levels: u32,
}

impl EdgeDecoder {
    pub fn new(gpio: u8, initial_levels: u32) -> Self {
        Self {
            gpio,
            last_levels: initial_levels,
        }
    }

    pub fn decode(&mut self, report: &[u8; REPORT_SIZE]) -> Option<EdgeEvent> {
        let flags = u16::from_le_bytes([report[2], report[3]]);
        let tick = u32::from_le_bytes([report[4], report[5], report[6], report[7]]);
        let levels = u32::from_le_bytes([report[8], report[9], report[10], report[11]]);

        if flags & NOTIFY_FLAGS_WDOG != 0 {
            if (flags & NOTIFY_FLAGS_BIT_MASK) == u16::from(self.gpio) {
                return Some(EdgeEvent {
                    level: Level::Timeout,
                    tick,
                });
            }
            return None;
        }

        if flags & (NOTIFY_FLAGS_ALIVE | NOTIFY_FLAGS_EVENT) != 0 {
            return None;
        }

        let bit = 1u32 << self.gpio;
        let changed = (levels ^ self.last_levels) & bit != 0;
        self.last_levels = levels;

        if !changed {
            return None;
        }

        Some(EdgeEvent {
            level: Level::from_raw((levels >> self.gpio) & 1),
            tick,
        })
    }
}

/// Open notification stream for one input pin.
///
/// Events are delivered to the handler on a dedicated reader thread. The
/// stream is closed when the notifier is dropped.
pub struct EdgeNotifier {
    pipe: PigpioPipe,
    handle: u32,
}

impl EdgeNotifier {
    pub fn start<F>(pipe: PigpioPipe, gpio: u8, mut on_edge: F) -> Result<Self>
    where
        F: FnMut(EdgeEvent) + Send + 'static,
    {
        pipe.command(&format!("m {} r", gpio))?;
        let levels = pipe.command("br1")?;
        let handle = pipe.command("no")?;

        let mut stream = match File::open(pipe.notification_path(handle)) {
            Ok(file) => BufReader::new(file),
            Err(e) => {
                let _ = pipe.command(&format!("nc {}", handle));
                return Err(e.into());
            }
        };
        // Construct before starting so a failure below still closes the handle
        let notifier = EdgeNotifier { pipe, handle };
        notifier
            .pipe
            .command(&format!("nb {} {}", handle, 1u32 << gpio))?;

        thread::Builder::new()
            .name(format!("gpio{}-edges", gpio))
            .spawn(move || {
                let mut decoder = EdgeDecoder::new(gpio, levels);
                let mut report = [0u8; REPORT_SIZE];
                loop {
                    match stream.read_exact(&mut report) {
                        Ok(()) => {
                            if let Some(event) = decoder.decode(&report) {
                                on_edge(event);
                            }
                        }
                        Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                        Err(e) => {
                            error!("Notification read error on GPIO {}: {}", gpio, e);
                            break;
                        }
                    }
                }
                debug!("Edge reader for GPIO {} stopped", gpio);
            })?;

        debug!("Opened notification handle {} for GPIO {}", handle, gpio);
        Ok(notifier)
    }
}

impl Drop for EdgeNotifier {
    fn drop(&mut self) {
        // Closing the handle ends the reader thread with EOF
        if let Err(e) = self.pipe.command(&format!("nc {}", self.handle)) {
            warn!("Failed to close notification handle {}: {}", self.handle, e);
        }
    }
}
