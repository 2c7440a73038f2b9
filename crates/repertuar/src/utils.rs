use chrono::{Days, Local, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Date '{0}' is not in a supported format: YYYY-MM-DD | today | tomorrow | dziś | jutro")]
pub struct DateInputError(String);

pub fn parse_date_input(input: &str) -> Result<NaiveDate, DateInputError> {
    parse_date_input_from(input, Local::now().date_naive())
}

pub fn parse_date_input_from(input: &str, today: NaiveDate) -> Result<NaiveDate, DateInputError> {
    let normalized = input.trim().to_lowercase();
    match normalized.as_str() {
        "today" | "dziś" | "dzis" | "dzisiaj" => Ok(today),
        "tomorrow" | "jutro" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| DateInputError(input.to_string())),
        _ => NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
            .map_err(|_| DateInputError(input.to_string())),
    }
}

/// SQLite only folds case for ASCII, so every non-ASCII character becomes the
/// single-character wildcard; ASCII punctuation is dropped.
pub fn venue_search_pattern(input: &str) -> String {
    let words: Vec<String> = input
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(|c| {
                    if c.is_ascii_alphanumeric() {
                        Some(c)
                    } else if c.is_ascii() {
                        None
                    } else {
                        Some('_')
                    }
                })
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    format!("%{}%", words.join("%")).replace("%%", "%")
}
