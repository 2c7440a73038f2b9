mod parser;
pub mod scraper;
pub mod types;

pub use scraper::CinemaCity;

pub(crate) const URL_DATE_FORMAT: &str = "%Y-%m-%d";
