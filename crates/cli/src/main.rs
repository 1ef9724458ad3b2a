mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use dispatch::GeminiBackend;
use storage::{Event, EventKind, EventStore, SessionLog};
use travel::{ForecastClient, Location, MapsClient, PlanRequest, Planner, PlannerMode, TripPlan};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "dragoman.toml";

#[derive(Parser)]
#[command(name = "dragoman")]
#[command(about = "An AI travel planning assistant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a trip to a destination
    Plan {
        /// Where to go, e.g. "Rome"
        destination: String,
        /// Trip length in days
        #[arg(short, long, default_value = "3")]
        days: u32,
        /// Number of hotels to show
        #[arg(long, default_value = "5")]
        hotels: usize,
        /// Number of attractions to show
        #[arg(long, default_value = "5")]
        attractions: usize,
        /// Use the multi-agent coordinator instead of direct tool calls
        #[arg(long)]
        coordinated: bool,
        /// Do not record the session to the event log
        #[arg(long)]
        no_log: bool,
    },
    /// List recorded planning sessions
    Sessions {
        /// Show only the last N sessions
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show event logs for a session
    Logs {
        /// Session ID (prefix match supported)
        #[arg(short, long)]
        session: String,
        /// Filter by event kind (prompt, model_reply, tool_call, ...)
        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            destination,
            days,
            hotels,
            attractions,
            coordinated,
            no_log,
        } => {
            cmd_plan(&destination, days, hotels, attractions, coordinated, no_log).await
        }
        Commands::Sessions { limit } => cmd_sessions(limit),
        Commands::Logs { session, kind } => cmd_logs(&session, kind.as_deref()),
    }
}

async fn cmd_plan(
    destination: &str,
    days: u32,
    hotels: usize,
    attractions: usize,
    coordinated: bool,
    no_log: bool,
) -> Result<()> {
    println!("dragoman v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(CONFIG_FILE)?;
    println!(
        "Config: {}",
        if std::path::Path::new(CONFIG_FILE).exists() {
            CONFIG_FILE
        } else {
            "default"
        }
    );

    let model = GeminiBackend::builder(config.gemini_key()?)
        .model(config.backend.model.clone())
        .build();
    println!("Model: {}", config.backend.model);

    let maps = Arc::new(MapsClient::new(config.maps_key()?));
    let forecast = Arc::new(ForecastClient::new());

    let mode = if coordinated {
        PlannerMode::Coordinated
    } else {
        PlannerMode::Direct
    };
    let planner = Planner::new(model, maps.clone(), forecast).with_mode(mode);
    let request = PlanRequest {
        days,
        hotel_limit: hotels,
        attraction_limit: attractions,
    };

    let log = if no_log {
        None
    } else {
        let data_dir = dirs_data_dir().unwrap_or_else(|| ".dragoman".into());
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("events.db");
        let store = EventStore::open(&db_path)?;
        let log = SessionLog::begin(store)?;
        println!("Session stored at: {}", db_path.display());
        println!("Session ID: {}", log.id());
        Some(log)
    };

    println!("\nPlanning a {days}-day trip to {destination}...");
    let plan = planner.plan(destination, &request, log.as_ref()).await?;

    print_plan(&plan, &maps).await?;

    if let Some(log) = log {
        log.end()?;
    }
    Ok(())
}

async fn print_plan(plan: &TripPlan, maps: &MapsClient) -> Result<()> {
    println!("\n=== Itinerary: {} ===\n", plan.destination);
    println!("{}", plan.itinerary);

    println!("\nHotels nearby:");
    for hotel in &plan.hotels {
        println!("  - {} (rating {})", hotel.name, rating_label(hotel.rating));
        println!("    https://www.google.com/maps?q={},{}", hotel.lat, hotel.lng);
    }
    if let Some(first) = plan.hotels.first() {
        let origin = Location {
            lat: first.lat,
            lng: first.lng,
        };
        if let Some(walk) = maps.walking_route(origin, plan.location).await? {
            println!(
                "    ({} on foot from {} to the center, about {})",
                walk.distance, first.name, walk.duration
            );
        }
    }

    println!("\nAttractions nearby:");
    for attraction in &plan.attractions {
        println!(
            "  - {} (rating {})",
            attraction.name,
            rating_label(attraction.rating)
        );
        println!(
            "    https://www.google.com/maps?q={},{}",
            attraction.lat, attraction.lng
        );
    }

    println!("\nWeather forecast:");
    println!("  {:<8}  {:>8}  {:>8}  {:>6}", "DAY", "MAX °C", "MIN °C", "RAIN");
    for day in &plan.forecast {
        println!(
            "  {:<8}  {:>8}  {:>8}  {:>6}",
            day.day, day.max_temp, day.min_temp, day.rain
        );
    }

    Ok(())
}

fn rating_label(rating: Option<f64>) -> String {
    rating
        .map(|r| r.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn cmd_sessions(limit: usize) -> Result<()> {
    let store = open_store()?;
    let sessions = store.list_sessions()?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<8}  STATUS",
        "SESSION ID", "STARTED", "MSGS"
    );
    println!("{}", "-".repeat(80));

    for summary in sessions.into_iter().take(limit) {
        let started = Local
            .from_utc_datetime(&summary.started_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        let status = if summary.ended_at.is_some() {
            "ended"
        } else {
            "active"
        };
        println!(
            "{:<36}  {:<20}  {:<8}  {status}",
            summary.id, started, summary.message_count
        );
    }

    Ok(())
}

fn cmd_logs(session_prefix: &str, kind_filter: Option<&str>) -> Result<()> {
    let store = open_store()?;

    // Find session by prefix
    let sessions = store.list_sessions()?;
    let matching: Vec<_> = sessions
        .iter()
        .filter(|s| s.id.to_string().starts_with(session_prefix))
        .collect();

    let session_id = match matching.len() {
        0 => {
            return Err(Error::SessionNotFound {
                prefix: session_prefix.to_string(),
            });
        }
        1 => matching[0].id,
        _ => {
            return Err(Error::AmbiguousSession {
                prefix: session_prefix.to_string(),
                matches: matching.iter().map(|s| s.id.to_string()).collect(),
            });
        }
    };

    let events = store.load_events(session_id, kind_filter)?;

    if events.is_empty() {
        println!("No events found for session {session_id}");
        return Ok(());
    }

    println!("Session: {session_id}\n");

    for event in events {
        print_event(&event);
    }

    Ok(())
}

fn print_event(event: &Event) {
    let time = Local
        .from_utc_datetime(&event.timestamp.naive_utc())
        .format("%H:%M:%S");

    match &event.kind {
        EventKind::SessionStart => {
            println!("[{time}] === Session started ===");
        }
        EventKind::SessionEnd => {
            println!("[{time}] === Session ended ===");
        }
        EventKind::Prompt { content } => {
            println!("[{time}] PROMPT: {}", truncated(content));
        }
        EventKind::ModelReply { content } => {
            println!("[{time}] MODEL: {}", truncated(content));
        }
        EventKind::Geocoded { place, lat, lng } => {
            println!("[{time}] GEOCODED: {place} -> {lat}, {lng}");
        }
        EventKind::ToolCall { name, args } => {
            println!("[{time}] TOOL CALL: {name} {args}");
        }
        EventKind::ToolResult { name, output } => {
            println!("[{time}] TOOL RESULT: {name} {}", truncated(&output.to_string()));
        }
        EventKind::PlanOutcome { outcome } => {
            println!("[{time}] OUTCOME: {outcome}");
        }
    }
}

/// Truncate long content for display, respecting char boundaries.
fn truncated(content: &str) -> String {
    const MAX: usize = 200;
    if content.chars().count() > MAX {
        let cut: String = content.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

fn open_store() -> Result<EventStore> {
    let data_dir = dirs_data_dir().unwrap_or_else(|| ".dragoman".into());
    let db_path = data_dir.join("events.db");

    if !db_path.exists() {
        return Err(Error::DatabaseNotFound { path: db_path });
    }

    Ok(EventStore::open(&db_path)?)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/dragoman"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("dragoman"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("dragoman"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}
