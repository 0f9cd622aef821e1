/// Barometric pressure from the BME280 reader command
use log::error;
use tokio::time::Duration;

use crate::error::{MonitorError, Result};
use crate::utils::run_command;

// Reader prints e.g. "1017.40 hPa"
const UNIT_SUFFIX_LEN: usize = 4;

/// Parse the reader's output line, dropping the unit suffix
pub fn parse_pressure(output: &str) -> Result<f64> {
    let line = output.trim();
    let parse_error = || MonitorError::Parse {
        what: "pressure",
        value: line.to_string(),
    };

    let cut = line
        .char_indices()
        .rev()
        .nth(UNIT_SUFFIX_LEN - 1)
        .map(|(i, _)| i)
        .ok_or_else(parse_error)?;

    line[..cut].trim().parse().map_err(|_| parse_error())
}

/// Read pressure in hPa; failures are logged and give `None`
pub async fn read_pressure(command: &[String], limit: Duration) -> Option<f64> {
    let result = match run_command(command, None, limit, "pressure command").await {
        Ok(output) => parse_pressure(&output),
        Err(e) => Err(e),
    };

    match result {
        Ok(pressure) => Some(pressure),
        Err(e) => {
            error!("Unable to read pressure: {}", e);
            None
        }
    }
}
