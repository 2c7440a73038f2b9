pub mod cinema;
pub mod cinema_city;
pub mod ratings;
pub mod render;
pub mod settings;
pub mod template;
pub mod types;
pub mod utils;
pub mod venues;

pub use cinema::{Cinema, ScraperError};
pub use settings::Settings;
pub use venues::VenueStore;

pub const NOT_AVAILABLE: &str = "N/A";
