/// Database operations for window summaries and recommendations
///
/// Expected schema:
///
/// ```sql
/// CREATE TABLE climate_data (
///     time timestamptz NOT NULL, location text NOT NULL,
///     temperature float8, humidity float8, windspeed float8, pressure float8,
///     uv float8, air_quality float8, air_quality_category text, pollen text,
///     day_profile_1 text, day_profile_2 text, samples int4 NOT NULL
/// );
/// CREATE TABLE recommendations (
///     time timestamptz NOT NULL, location text NOT NULL, recommendation text NOT NULL
/// );
/// ```
use crate::database::connection::execute_with_retry;
use crate::error::Result;
use crate::models::WindowSummary;
use crate::utils::round_to;

/// Store the averaged values of one window as a single climate_data row
pub async fn store_window_summary(summary: &WindowSummary, database_url: &str) -> Result<()> {
    // Clone data for move into async closure
    let summary = summary.clone();

    execute_with_retry(database_url, move |client| {
        let s = summary.clone();
        async move {
            let avg = &s.averages;
            let rounded = |v: Option<f64>| v.map(|v| round_to(v, 2));
            let pollen = s.pollen.map(|p| p.as_str().to_string());
            let (profile_1, profile_2) = match &s.profiles {
                Some(p) => (Some(p.profile_1.clone()), Some(p.profile_2.clone())),
                None => (None, None),
            };

            client.execute(
                "INSERT INTO climate_data(time, location, temperature, humidity, windspeed, pressure,
                                          uv, air_quality, air_quality_category, pollen,
                                          day_profile_1, day_profile_2, samples)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                &[
                    &s.time,
                    &s.location,
                    &rounded(avg.temperature),
                    &rounded(avg.humidity),
                    &rounded(avg.wind_speed),
                    &rounded(avg.pressure),
                    &rounded(avg.uv_index),
                    &rounded(avg.air_quality),
                    &s.air_quality_category,
                    &pollen,
                    &profile_1,
                    &profile_2,
                    &(avg.samples as i32),
                ],
            ).await
        }
    })
    .await
    .map(|_| ())
}

/// Store each recommendation of a window as its own row
pub async fn store_recommendations(summary: &WindowSummary, database_url: &str) -> Result<u64> {
    if summary.recommendations.is_empty() {
        return Ok(0);
    }

    let time = summary.time;
    let location = summary.location.clone();
    let recommendations = summary.recommendations.clone();

    execute_with_retry(database_url, move |client| {
        let location = location.clone();
        let recommendations = recommendations.clone();
        async move {
            let mut rows = 0;
            for recommendation in &recommendations {
                rows += client
                    .execute(
                        "INSERT INTO recommendations(time, location, recommendation)
                         VALUES ($1, $2, $3)",
                        &[&time, &location, recommendation],
                    )
                    .await?;
            }
            Ok::<u64, tokio_postgres::Error>(rows)
        }
    })
    .await
}
