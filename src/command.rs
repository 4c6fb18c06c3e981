use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::AdmissionError;
use crate::model::*;
use crate::view::DayView;

/// One line of demo-binary input.
#[derive(Debug, PartialEq)]
pub enum Command {
    Book(ReservationRequest),
    Cancel { id: ReservationId },
    Day { date: NaiveDate },
    Sort,
    Pan { percentage: f64 },
    List,
}

#[derive(Debug, PartialEq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    Invalid(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd}"),
            CommandError::MissingArgument(cmd) => write!(f, "{cmd}: missing argument"),
            CommandError::Invalid(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Empty);
    }
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    match verb.to_lowercase().as_str() {
        "book" => {
            let rest = require(rest, "book")?;
            let request: ReservationRequest =
                serde_json::from_str(rest).map_err(|e| CommandError::Invalid(e.to_string()))?;
            Ok(Command::Book(request))
        }
        "cancel" => {
            let rest = require(rest, "cancel")?;
            let id = rest
                .parse()
                .map_err(|_| CommandError::Invalid(format!("reservation id: {rest}")))?;
            Ok(Command::Cancel {
                id: ReservationId(id),
            })
        }
        "day" => {
            let rest = require(rest, "day")?;
            let date = NaiveDate::parse_from_str(rest, "%Y-%m-%d")
                .map_err(|_| CommandError::Invalid(format!("date: {rest}")))?;
            Ok(Command::Day { date })
        }
        "pan" => {
            let rest = require(rest, "pan")?;
            let percentage: f64 = rest
                .parse()
                .map_err(|_| CommandError::Invalid(format!("percentage: {rest}")))?;
            if !percentage.is_finite() {
                return Err(CommandError::Invalid(format!("percentage: {rest}")));
            }
            Ok(Command::Pan { percentage })
        }
        "sort" => Ok(Command::Sort),
        "list" => Ok(Command::List),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn require<'a>(rest: &'a str, cmd: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(cmd))
    } else {
        Ok(rest)
    }
}

/// Machine-readable reply, one JSON object per line.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Ok(Payload),
    Error {
        error: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reservation_id: Option<ReservationId>,
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Booked(Reservation),
    Cancelled(ReservationId),
    Day(DayView),
    Reservations(Vec<Reservation>),
}

impl Reply {
    pub fn rejected(e: &AdmissionError) -> Self {
        let reservation_id = match e {
            AdmissionError::Conflict(id) | AdmissionError::NotFound(id) => Some(*id),
            _ => None,
        };
        Reply::Error {
            error: e.kind(),
            reservation_id,
            message: e.to_string(),
        }
    }

    pub fn outcome(result: Result<Payload, AdmissionError>) -> Self {
        match result {
            Ok(payload) => Reply::Ok(payload),
            Err(e) => Reply::rejected(&e),
        }
    }

    pub fn invalid_command(e: &CommandError) -> Self {
        Reply::Error {
            error: "invalid_command",
            reservation_id: None,
            message: e.to_string(),
        }
    }
}
