/// Low-pulse occupancy accumulation for duty-cycle dust sensors
use std::sync::{Arc, Mutex, MutexGuard};

use crate::air_quality::concentration::estimate_concentration;

/// Pin level reported with an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
    /// Watchdog fired without a level change
    Timeout,
}

impl Level {
    /// Map a driver level value (0, 1, anything else = timeout)
    pub fn from_raw(level: u32) -> Self {
        match level {
            0 => Level::Low,
            1 => Level::High,
            _ => Level::Timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub level: Level,
    /// Driver tick in microseconds, wraps at u32::MAX
    pub tick: u32,
}

/// Result of one accumulation period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseReading {
    /// Low pulse occupancy in percent
    pub ratio: f64,
    /// Particles per 0.01 ft³
    pub concentration: f64,
}

#[derive(Debug, Default)]
struct PulseWindow {
    low_ticks: u64,
    high_ticks: u64,
    /// `None` until the first edge after a reset
    last_tick: Option<u32>,
}

/// Accumulates pulse widths from edge events.
///
/// Clones share the same window: the driver thread calls [`on_edge`] while
/// the sampling loop calls [`read`], both under one lock.
///
/// [`on_edge`]: PulseAccumulator::on_edge
/// [`read`]: PulseAccumulator::read
#[derive(Debug, Clone, Default)]
pub struct PulseAccumulator {
    window: Arc<Mutex<PulseWindow>>,
}

impl PulseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PulseWindow> {
        // A panicking edge handler leaves plain counters behind, still usable
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn on_edge(&self, event: EdgeEvent) {
        let mut window = self.lock();

        let last = match window.last_tick {
            Some(last) => last,
            None => {
                // First edge only marks the start, no pulse width yet
                window.last_tick = Some(event.tick);
                return;
            }
        };

        let ticks = u64::from(event.tick.wrapping_sub(last));
        window.last_tick = Some(event.tick);

        match event.level {
            // Falling edge closes the bucket the sensor calibration calls "high"
            Level::Low => window.high_ticks += ticks,
            // Rising edge closes a low pulse
            Level::High => window.low_ticks += ticks,
            Level::Timeout => {}
        }
    }

    /// Current (low_ticks, high_ticks) without resetting
    pub fn ticks(&self) -> (u64, u64) {
        let window = self.lock();
        (window.low_ticks, window.high_ticks)
    }

    /// Compute occupancy and concentration since the last read, then reset
    pub fn read(&self) -> PulseReading {
        let mut window = self.lock();
        let interval = window.low_ticks + window.high_ticks;

        let ratio = if interval > 0 {
            window.low_ticks as f64 / interval as f64 * 100.0
        } else {
            0.0
        };

        *window = PulseWindow::default();

        PulseReading {
            ratio,
            concentration: estimate_concentration(ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(level: u32, tick: u32) -> EdgeEvent {
        EdgeEvent {
            level: Level::from_raw(level),
            tick,
        }
    }

    #[test]
    fn test_single_edge_yields_zero() {
        let acc = PulseAccumulator::new();
        acc.on_edge(edge(1, 500));
        assert_eq!(acc.ticks(), (0, 0));

        let reading = acc.read();
        assert_eq!(reading.ratio, 0.0);
        assert_eq!(reading.concentration, 0.0);
    }

    #[test]
    fn test_bucket_assignment() {
        let acc = PulseAccumulator::new();
        acc.on_edge(edge(1, 0));
        acc.on_edge(edge(0, 10));
        acc.on_edge(edge(1, 30));

        // level 0 closes into high_ticks, level 1 into low_ticks
        assert_eq!(acc.ticks(), (20, 10));
    }

    #[test]
    fn test_timeout_edges_are_ignored() {
        let acc = PulseAccumulator::new();
        acc.on_edge(edge(0, 0));
        acc.on_edge(edge(2, 40));
        assert_eq!(acc.ticks(), (0, 0));

        // the timeout still advances the last seen tick
        acc.on_edge(edge(1, 50));
        assert_eq!(acc.ticks(), (10, 0));
    }

    #[test]
    fn test_tick_wraparound() {
        let acc = PulseAccumulator::new();
        acc.on_edge(edge(0, u32::MAX - 4));
        acc.on_edge(edge(1, 5));
        assert_eq!(acc.ticks(), (10, 0));
    }

    #[test]
    fn test_read_computes_ratio_and_resets() {
        let acc = PulseAccumulator::new();
        acc.on_edge(edge(0, 0));
        acc.on_edge(edge(1, 30));
        acc.on_edge(edge(0, 100));
        assert_eq!(acc.ticks(), (30, 70));

        let reading = acc.read();
        assert!((reading.ratio - 30.0).abs() < 1e-9);
        assert!((reading.concentration - 41880.62).abs() < 1e-6);

        assert_eq!(acc.ticks(), (0, 0));
        // after a reset the next edge is a start marker again
        acc.on_edge(edge(1, 1_000));
        assert_eq!(acc.ticks(), (0, 0));
        assert_eq!(acc.read().ratio, 0.0);
    }

    #[test]
    fn test_clones_share_window() {
        let acc = PulseAccumulator::new();
        let driver_side = acc.clone();

        let handle = std::thread::spawn(move || {
            driver_side.on_edge(edge(0, 0));
            driver_side.on_edge(edge(1, 25));
            driver_side.on_edge(edge(0, 100));
        });
        handle.join().unwrap();

        assert_eq!(acc.ticks(), (25, 75));
        assert!((acc.read().ratio - 25.0).abs() < 1e-9);
    }
}
