mod air_quality;
mod classifier;
mod config;
mod database;
mod error;
mod models;
mod recommendations;
mod sampling;
mod sensors;
mod utils;
mod weather;

use log::{error, info, warn};
use time::OffsetDateTime;

use air_quality::AqiCategory;
use classifier::CommandClassifier;
use config::StationConfig;
use database::{store_recommendations, store_window_summary};
use error::Result;
use models::{ClassificationInput, DayProfiles, PollenLevel, WindowAverages, WindowSummary};
use recommendations::recommendations;
use sampling::Station;
use utils::format_datetime;

async fn classify_window(
    classifier: Option<&CommandClassifier>,
    averages: &WindowAverages,
    now: OffsetDateTime,
) -> Option<DayProfiles> {
    let classifier = classifier?;

    let input = match ClassificationInput::from_averages(averages, u8::from(now.month())) {
        Some(input) => input,
        None => {
            warn!("Window is missing classifier inputs, skipping day profiles");
            return None;
        }
    };

    match classifier.classify(&input).await {
        Ok(profiles) => Some(profiles),
        Err(e) => {
            error!("Classification failed: {}", e);
            None
        }
    }
}

async fn main_loop(config: StationConfig) -> Result<()> {
    info!("Starting climate data collection service");

    let classifier = config
        .classifier_command
        .clone()
        .map(|command| CommandClassifier::new(command, config.command_timeout));
    let station = Station::new(config)?;

    loop {
        let start_time = OffsetDateTime::now_utc();
        info!(
            "Starting collection interval at: {}",
            format_datetime(&start_time)
        );

        let averages = station.run_window().await;

        let end_time = OffsetDateTime::now_utc();
        info!(
            "Collection interval complete at: {}",
            format_datetime(&end_time)
        );

        let profiles = classify_window(classifier.as_ref(), &averages, end_time).await;
        let advice: Vec<String> = profiles
            .as_ref()
            .map(|p| recommendations(p).into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        let summary = WindowSummary {
            time: end_time,
            location: station.config().location.clone(),
            air_quality_category: averages
                .air_quality
                .map(|aqi| AqiCategory::from_aqi(aqi).label().to_string()),
            pollen: averages.pollen.as_ref().map(PollenLevel::from_reading),
            profiles,
            recommendations: advice,
            averages,
        };

        let database_url = &station.config().database_url;
        if let Err(e) = store_window_summary(&summary, database_url).await {
            error!("Failed to store window summary: {}", e);
        } else {
            info!("Successfully stored window summary");
        }

        match store_recommendations(&summary, database_url).await {
            Ok(rows) => info!("Stored {} recommendations", rows),
            Err(e) => error!("Failed to store recommendations: {}", e),
        }

        // Print summary
        let avg = &summary.averages;
        info!("Summary for {}:", summary.location);
        info!("  Average temperature: {:?}°C", avg.temperature);
        info!("  Average humidity: {:?}%", avg.humidity);
        info!("  Average wind speed: {:?} km/h", avg.wind_speed);
        info!("  Average UV index: {:?}", avg.uv_index);
        info!("  Average pressure: {:?} hPa", avg.pressure);
        info!(
            "  Average AQI: {:?} ({})",
            avg.air_quality,
            summary.air_quality_category.as_deref().unwrap_or("unknown")
        );
        info!(
            "  Pollen: {}",
            summary.pollen.map(|p| p.as_str()).unwrap_or("unknown")
        );
        if let Some(p) = &summary.profiles {
            info!("  Day profiles: {} / {}", p.profile_1, p.profile_2);
        }
        for r in &summary.recommendations {
            info!("  - {}", r);
        }
        info!("  Based on {} samples", avg.samples);
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match StationConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the loop is not cancelled
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
