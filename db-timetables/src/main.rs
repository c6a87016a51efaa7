use std::time::Duration;

use db_timetables::api::{TimetablesClient, TimetablesConfig};
use db_timetables::domain::{EvaNumber, EventKind, TimetableStop};
use db_timetables::loader::TimetableLoader;
use tracing_subscriber::EnvFilter;

/// How often to refresh the board (the change feeds update every ~30s).
const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Get credentials from environment
    let client_id = std::env::var("DB_CLIENT_ID").unwrap_or_else(|_| {
        eprintln!("Warning: DB_CLIENT_ID not set. API calls will fail.");
        String::new()
    });
    let api_key = std::env::var("DB_API_KEY").unwrap_or_else(|_| {
        eprintln!("Warning: DB_API_KEY not set. API calls will fail.");
        String::new()
    });

    let mut args = std::env::args().skip(1);
    let station = args
        .next()
        .unwrap_or_else(|| usage("missing EVA number"));
    let station = EvaNumber::parse(&station).unwrap_or_else(|e| usage(&e.to_string()));

    let mut count = 10usize;
    let mut json = false;
    for arg in args {
        if arg == "--json" {
            json = true;
        } else {
            count = arg.parse().unwrap_or_else(|_| usage("invalid stop count"));
        }
    }

    let config = TimetablesConfig::new(&client_id, &api_key);
    let client = TimetablesClient::new(config).expect("Failed to create Timetables client");
    let mut loader = TimetableLoader::new(client, station, EventKind::Departure, count);

    println!(
        "Departure board for station {}, polling every {}s. Ctrl-C to stop.",
        loader.station(),
        POLL_INTERVAL.as_secs()
    );

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
        interval.tick().await;
        match loader.get_stops().await {
            Ok(stops) => {
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&stops).expect("stops serialize to JSON")
                    );
                } else {
                    print_board(&stops);
                }
            }
            Err(e) => eprintln!("Update failed: {e}"),
        }
    }
}

fn usage(reason: &str) -> ! {
    eprintln!("Error: {reason}");
    eprintln!("Usage: db-timetables <eva-number> [count] [--json]");
    eprintln!("Example: db-timetables 8000105 15");
    std::process::exit(2);
}

fn print_board(stops: &[TimetableStop]) {
    println!();
    println!("{:<7} {:<5} {:<10} {:<30}", "Time", "Plat", "Train", "To");

    for stop in stops {
        let Some(departure) = &stop.departure else {
            continue;
        };

        let time = match departure.best_time() {
            Some(t) => t.format("%H:%M").to_string(),
            None => "--:--".to_string(),
        };
        let delayed = departure.changed_time.is_some();
        let platform = departure.best_platform().unwrap_or("-");

        let train = match &stop.label {
            Some(label) => format!(
                "{} {}",
                label.category.as_deref().unwrap_or(""),
                label.number.as_deref().unwrap_or("")
            ),
            None => String::new(),
        };

        let destination = departure
            .changed_path
            .as_ref()
            .or(departure.planned_path.as_ref())
            .and_then(|path| path.last())
            .map(String::as_str)
            .unwrap_or("");

        println!(
            "{:<7} {:<5} {:<10} {:<30}",
            if delayed { format!("{time}*") } else { time },
            platform,
            train.trim(),
            destination,
        );
    }
}
