use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::NOT_AVAILABLE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repertoire {
    pub title: String,
    pub genres: String,
    pub play_length: Option<u32>,
    pub original_language: Option<String>,
    pub play_details: Vec<PlayDetails>,
}

impl Display for Repertoire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {}", self.title)?;
        writeln!(f, "│  Genres:   {}", self.genres)?;
        match self.play_length {
            Some(minutes) => writeln!(f, "│  Length:   {} min", minutes)?,
            None => writeln!(f, "│  Length:   {}", NOT_AVAILABLE)?,
        }
        writeln!(
            f,
            "│  Language: {}",
            self.original_language.as_deref().unwrap_or(NOT_AVAILABLE)
        )?;
        write!(f, "└─ {} screening group(s)", self.play_details.len())?;
        for details in &self.play_details {
            write!(f, "\n   {}", details)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayDetails {
    pub format: String,
    pub play_language: String,
    pub play_times: Vec<String>,
}

impl PlayDetails {
    /// Whether the listing carries clock times or day labels. Far-future
    /// dates list the days a film plays instead of its hours.
    pub fn schedule_kind(&self) -> ScheduleKind {
        let clock = self.play_times.iter().filter(|t| is_clock_time(t)).count();
        match clock {
            0 if self.play_times.is_empty() => ScheduleKind::Empty,
            0 => ScheduleKind::Days,
            n if n == self.play_times.len() => ScheduleKind::Times,
            _ => ScheduleKind::Mixed,
        }
    }
}

impl Display for PlayDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "▸ {} · {} · {}",
            self.format,
            self.play_language,
            self.play_times.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    Times,
    Days,
    Mixed,
    Empty,
}

fn is_clock_time(text: &str) -> bool {
    let Some((hours, minutes)) = text.split_once(':') else {
        return false;
    };
    matches!(hours.parse::<u32>(), Ok(h) if h < 24 && hours.len() <= 2)
        && matches!(minutes.parse::<u32>(), Ok(m) if m < 60 && minutes.len() == 2)
}
