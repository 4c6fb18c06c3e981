use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use roomslot::command::{parse_command, Command, CommandError, Payload, Reply};
use roomslot::config::{self, Config};
use roomslot::engine::{local_now, Scheduler};
use roomslot::model::ReservationEvent;
use roomslot::view::{day_window, pan, reference_date, SortDirection};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries replies; logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = Config::from_env();
    let mut date = config.date.unwrap_or_else(|| local_now().date());
    let seed = match &config.seed_path {
        Some(path) => config::load_seed(path)?,
        None => config::default_seed(local_now().date()),
    };

    let scheduler = Arc::new(Scheduler::in_memory(seed)?);
    info!("roomslot ready");
    info!("  viewer: {}", config.viewer);
    info!("  date: {date}");
    info!(
        "  seed: {}",
        config
            .seed_path
            .as_ref()
            .map_or("built-in".to_string(), |p| p.display().to_string())
    );

    let mut events = scheduler.notify().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ReservationEvent::Created { reservation } => {
                    tracing::debug!(id = %reservation.id, "views invalidated by booking");
                }
                ReservationEvent::Removed { id } => {
                    tracing::debug!(%id, "views invalidated by cancellation");
                }
            }
        }
    });

    let mut direction = SortDirection::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match parse_command(&line) {
            Err(e) => Reply::invalid_command(&e),
            Ok(Command::Book(mut request)) => {
                request.created_by.get_or_insert(config.viewer);
                Reply::outcome(scheduler.book(&request, local_now()).await.map(Payload::Booked))
            }
            Ok(Command::Cancel { id }) => {
                Reply::outcome(scheduler.cancel(id).await.map(Payload::Cancelled))
            }
            Ok(Command::Day { date: next }) => {
                date = next;
                Reply::outcome(scheduler.day_view(date, direction, config.viewer).await.map(Payload::Day))
            }
            Ok(Command::Sort) => {
                direction = direction.toggle();
                Reply::outcome(scheduler.day_view(date, direction, config.viewer).await.map(Payload::Day))
            }
            Ok(Command::Pan { percentage }) => match pan(&day_window(date), percentage) {
                Some(window) => {
                    date = reference_date(&window);
                    Reply::outcome(
                        scheduler.day_view(date, direction, config.viewer).await.map(Payload::Day),
                    )
                }
                None => Reply::invalid_command(&CommandError::Invalid(format!(
                    "pan {percentage} leaves the calendar"
                ))),
            },
            Ok(Command::List) => Reply::outcome(scheduler.reservations().await.map(Payload::Reservations)),
        };

        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("roomslot stopped");
    Ok(())
}
