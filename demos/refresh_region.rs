//! Refreshes stations and observations around Helsinki and prints a summary.

use aviwx::{GridConfig, HeatField, WeatherError, WeatherRegion, WeatherService};
use chrono::Utc;

#[tokio::main]
async fn main() -> Result<(), WeatherError> {
    let service = WeatherService::new().await?;
    service
        .set_region(&WeatherRegion::new(60.17, 24.94, 200.0))
        .await?;

    let stations = service.refresh_stations().await?;
    println!("{} stations in region", stations.len());

    let observations = service.refresh_observations().await?;
    println!(
        "{} metars and {} tafs cached",
        observations.metars.len(),
        observations.tafs.len()
    );

    for metar in observations.latest_metars(Utc::now()) {
        println!("{:>5}  {}", metar.identifier, metar.raw);
    }

    if let Some((station, distance_km)) = service.nearest_station(60.32, 24.96, 50.0).await {
        println!("Nearest station: {} ({:.1} km)", station.identifier, distance_km);
    }

    let grid = service
        .heat_map(HeatField::Ceiling, GridConfig::new(128, 128, 24), Utc::now())
        .await?;
    println!(
        "Ceiling heat map: {} of {} cells filled",
        grid.filled(),
        grid.width() * grid.height()
    );

    Ok(())
}
