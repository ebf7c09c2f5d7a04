use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use futures::stream::{self, StreamExt};
use geotime::{
    Config, DayNameStyle, FixedGeolocation, GeoError, GeoTimeClient, LocationRecord,
    LocationRegistry, PlaceId, RegistryEvent,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{Instrument, error, info, span, warn};
use tracing_subscriber::EnvFilter;

/// Maximum number of searches from one input line resolved at the same time
const MAX_CONCURRENT_SEARCHES: usize = 3;

/// Reads commands from stdin until the user sends `exit`.
///
/// Any other line is treated as one or more `;`-separated search queries; the
/// top match for each is added to the registry once its local time is known.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let mut client = GeoTimeClient::new(&config);
    if let Some(position) = config.device_position {
        client = client.with_geolocation(Arc::new(FixedGeolocation::new(position)));
    }
    let client = Arc::new(client);
    let registry = Arc::new(LocationRegistry::new(client.clone()));

    tokio::spawn(
        watch_registry(registry.clone()).instrument(span!(tracing::Level::INFO, "registry")),
    );

    info!("Commands: <query>[; <query>...], here, list, recent, rm <place id>, exit");

    let mut buffer = String::new();
    while next_command(&mut io::stdin().lock(), &mut buffer)? {
        let line = buffer.trim_start_matches('>').trim();

        match line {
            "" => {}
            "list" => {
                let records = registry.list();
                if records.is_empty() {
                    info!("No locations yet");
                }
                for record in &records {
                    info!("{}", describe(record));
                }
            }
            "recent" => match registry.most_recent() {
                Some(record) => info!("{}", describe(&record)),
                None => info!("No locations yet"),
            },
            "here" => {
                match client
                    .resolve_current_location()
                    .instrument(span!(tracing::Level::INFO, "here"))
                    .await
                {
                    Ok(place) => {
                        registry.add_place(place);
                    }
                    Err(e) => report(&e),
                }
            }
            _ if line.starts_with("rm ") => {
                let place_id = PlaceId::from(line["rm ".len()..].trim());
                if !registry.remove(&place_id) {
                    warn!("No location with place id {}", place_id);
                }
            }
            _ => {
                let queries: Vec<&str> = line
                    .split(';')
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .collect();

                let results = stream::iter(queries)
                    .map(|query| {
                        let client = client.clone();
                        async move { (query, client.resolve_first_match(query).await) }
                            .instrument(span!(tracing::Level::INFO, "search", query))
                    })
                    .buffer_unordered(MAX_CONCURRENT_SEARCHES)
                    .collect::<Vec<_>>()
                    .await;

                for (query, result) in results {
                    match result {
                        Ok(place) => {
                            info!("{:?} matched {}", query, place.address);
                            registry.add_place(place);
                        }
                        Err(e) => report(&e),
                    }
                }
            }
        }
    }

    Ok(())
}

/// Prompts for and reads the next input line into `buffer`.
///
/// Returns `false` once the user sends `exit` or input reaches end of file.
fn next_command(input: &mut impl BufRead, buffer: &mut String) -> io::Result<bool> {
    print!("> ");
    io::stdout().flush()?;

    buffer.clear();
    if input.read_line(buffer)? == 0 {
        return Ok(false);
    }
    Ok(buffer.trim() != "exit")
}

/// Logs registry mutations as they happen.
async fn watch_registry(registry: Arc<LocationRegistry>) {
    let mut events = registry.subscribe();
    loop {
        match events.recv().await {
            Ok(RegistryEvent::Added(record)) => info!("Added {}", describe(&record)),
            Ok(RegistryEvent::Replaced(record)) => info!("Updated {}", describe(&record)),
            Ok(RegistryEvent::Removed(place_id)) => info!("Removed {}", place_id),
            Err(RecvError::Lagged(skipped)) => warn!("Missed {} registry events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

fn report(e: &GeoError) {
    if e.is_user_recoverable() {
        warn!("{} (try again)", e);
    } else {
        error!("{}", e);
    }
}

fn describe(record: &LocationRecord) -> String {
    let time = &record.time_data;
    format!(
        "[{}] {} {} - {} {} ({})",
        record.place_id,
        record.address,
        record.position,
        time.day_name(DayNameStyle::Short).unwrap_or("?"),
        time.formatted_time().unwrap_or_default(),
        time.time_zone_name,
    )
}
