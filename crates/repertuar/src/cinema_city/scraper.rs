use chrono::NaiveDate;

use super::URL_DATE_FORMAT;
use super::parser::{parse_repertoire, parse_venues};
use super::types::Repertoire;
use crate::cinema::ScraperError;
use crate::render::{HeadlessRenderer, PageRenderer};
use crate::settings::{ChainSettings, RenderSettings};
use crate::template::fill_template;
use crate::types::Venue;

#[derive(Debug, Clone)]
pub struct CinemaCity<R: PageRenderer = HeadlessRenderer> {
    repertoire_url: String,
    venues_list_url: String,
    renderer: R,
}

impl CinemaCity {
    pub fn new(chain: &ChainSettings, render: &RenderSettings) -> Self {
        Self::with_renderer(chain, HeadlessRenderer::new(render))
    }
}

impl<R: PageRenderer> CinemaCity<R> {
    pub fn with_renderer(chain: &ChainSettings, renderer: R) -> Self {
        Self {
            repertoire_url: chain.repertoire_url.clone(),
            venues_list_url: chain.venues_list_url.clone(),
            renderer,
        }
    }

    pub async fn fetch_repertoire(
        &self,
        date: NaiveDate,
        venue: &Venue,
    ) -> Result<Vec<Repertoire>, ScraperError> {
        let date = date.format(URL_DATE_FORMAT).to_string();
        let url = fill_template(
            &self.repertoire_url,
            &[
                ("cinema_venue_id", venue.id.as_str()),
                ("repertoire_date", date.as_str()),
            ],
        )?;

        log::info!("Fetching repertoire of {} for {}...", venue.name, date);
        let html = self.renderer.render(&url).await?;
        let repertoire = parse_repertoire(&html);
        log::debug!("Parsed {} film(s) from {}", repertoire.len(), url);
        Ok(repertoire)
    }

    pub async fn fetch_venues(&self) -> Result<Vec<Venue>, ScraperError> {
        let url = fill_template(&self.venues_list_url, &[])?;
        log::info!("Fetching venue list: {}", url);
        let html = self.renderer.render(&url).await?;
        Ok(parse_venues(&html))
    }
}
