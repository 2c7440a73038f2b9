use chrono::NaiveDate;

use crate::cinema_city::CinemaCity;
use crate::cinema_city::types::Repertoire;
use crate::render::RenderError;
use crate::settings::Settings;
use crate::template::TemplateError;
use crate::types::{CinemaChain, Venue};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("{0} is not supported yet")]
    Unsupported(CinemaChain),
}

#[derive(Debug, Clone)]
pub enum Cinema {
    CinemaCity(CinemaCity),
    Helios,
    Multikino,
}

impl Cinema {
    pub fn from_settings(chain: CinemaChain, settings: &Settings) -> Self {
        match chain {
            CinemaChain::CinemaCity => {
                Cinema::CinemaCity(CinemaCity::new(&settings.cinema_city, &settings.render))
            }
            CinemaChain::Helios => Cinema::Helios,
            CinemaChain::Multikino => Cinema::Multikino,
        }
    }

    pub fn chain(&self) -> CinemaChain {
        match self {
            Cinema::CinemaCity(_) => CinemaChain::CinemaCity,
            Cinema::Helios => CinemaChain::Helios,
            Cinema::Multikino => CinemaChain::Multikino,
        }
    }

    pub async fn fetch_repertoire(
        &self,
        date: NaiveDate,
        venue: &Venue,
    ) -> Result<Vec<Repertoire>, ScraperError> {
        match self {
            Cinema::CinemaCity(scraper) => scraper.fetch_repertoire(date, venue).await,
            other => Err(ScraperError::Unsupported(other.chain())),
        }
    }

    pub async fn fetch_venues(&self) -> Result<Vec<Venue>, ScraperError> {
        match self {
            Cinema::CinemaCity(scraper) => scraper.fetch_venues().await,
            other => Err(ScraperError::Unsupported(other.chain())),
        }
    }
}
