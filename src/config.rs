use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use tracing::warn;

use crate::model::*;

pub const VIEWER_ID_VAR: &str = "ROOMSLOT_VIEWER_ID";
pub const SEED_VAR: &str = "ROOMSLOT_SEED";
pub const DATE_VAR: &str = "ROOMSLOT_DATE";

const DEFAULT_VIEWER: OwnerId = OwnerId(1234);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Identity used for "my reservation" styling and as the default owner.
    pub viewer: OwnerId,
    /// JSON array of reservation records; built-in seed when absent.
    pub seed_path: Option<PathBuf>,
    /// Initial reference date; today when absent.
    pub date: Option<NaiveDate>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let viewer = match lookup(VIEWER_ID_VAR) {
            Some(raw) => raw.trim().parse().map(OwnerId).unwrap_or_else(|_| {
                warn!("ignoring invalid {VIEWER_ID_VAR}={raw}");
                DEFAULT_VIEWER
            }),
            None => DEFAULT_VIEWER,
        };
        let seed_path = lookup(SEED_VAR)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let date = lookup(DATE_VAR).and_then(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .inspect_err(|_| warn!("ignoring invalid {DATE_VAR}={raw}"))
                .ok()
        });
        Self {
            viewer,
            seed_path,
            date,
        }
    }
}

#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Io(e) => write!(f, "cannot read seed file: {e}"),
            SeedError::Parse(e) => write!(f, "invalid seed file: {e}"),
        }
    }
}

impl std::error::Error for SeedError {}

pub fn load_seed(path: &Path) -> Result<Vec<Reservation>, SeedError> {
    let raw = std::fs::read_to_string(path).map_err(SeedError::Io)?;
    serde_json::from_str(&raw).map_err(SeedError::Parse)
}

/// Two reservations on `today`: 09:00-10:00 and 11:00-12:30.
pub fn default_seed(today: NaiveDate) -> Vec<Reservation> {
    let at = |h: u32, m: u32| {
        today.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN))
    };
    vec![
        Reservation {
            id: ReservationId(1),
            name: "Arenales, Ingrid Lorena".into(),
            span: Span::new(at(9, 0), at(10, 0)),
            created_by: OwnerId(1334),
        },
        Reservation {
            id: ReservationId(2),
            name: "Buitrago Lozano, Daniel Esteban".into(),
            span: Span::new(at(11, 0), at(12, 30)),
            created_by: OwnerId(1225),
        },
    ]
}
