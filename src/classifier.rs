/// Bridge to the external day profile classifier
use log::debug;
use tokio::time::Duration;

use crate::error::Result;
use crate::models::{ClassificationInput, DayProfiles};
use crate::utils::run_command;

/// Runs the classifier as a child process.
///
/// The two feature vectors go to stdin as one JSON object and the labels are
/// read back as `{"profile_1": "...", "profile_2": "..."}` on stdout.
pub struct CommandClassifier {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub async fn classify(&self, input: &ClassificationInput) -> Result<DayProfiles> {
        let request = serde_json::to_vec(input)?;
        let output = run_command(&self.command, Some(&request), self.timeout, "classifier").await?;
        debug!("Classifier output: {}", output.trim());
        parse_profiles(&output)
    }
}

pub fn parse_profiles(output: &str) -> Result<DayProfiles> {
    let profiles: DayProfiles = serde_json::from_str(output.trim())?;
    Ok(DayProfiles {
        profile_1: normalize_label(&profiles.profile_1),
        profile_2: normalize_label(&profiles.profile_2),
    })
}

// Training labels carry a dangling " - " separator on some rows
fn normalize_label(label: &str) -> String {
    label.trim_end_matches(" - ").trim().to_string()
}
