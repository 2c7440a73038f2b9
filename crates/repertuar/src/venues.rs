use std::path::Path;

use rusqlite::{Connection, params};

use crate::types::{CinemaChain, Venue};
use crate::utils::venue_search_pattern;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
    #[error("No {chain} venue matches '{query}'. Run `venues update` or refine the name")]
    VenueNotFound { chain: CinemaChain, query: String },
    #[error("Found {count} {chain} venues matching '{query}': {}. Please be more specific", .matches.join(", "))]
    AmbiguousVenue {
        chain: CinemaChain,
        query: String,
        count: usize,
        matches: Vec<String>,
    },
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS venues (
    chain       TEXT NOT NULL,
    venue_name  TEXT NOT NULL,
    venue_id    TEXT NOT NULL,
    PRIMARY KEY (chain, venue_name)
);
CREATE INDEX IF NOT EXISTS idx_venues_chain ON venues(chain);
";

pub struct VenueStore {
    conn: Connection,
}

impl VenueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        log::debug!("Opening venue database at {}", path.display());
        let conn = Connection::open(path)
            .inspect_err(|e| log::error!("Unable to connect with the database: {e:?}"))?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn list_venues(&self, chain: CinemaChain) -> Result<Vec<Venue>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT venue_id, venue_name FROM venues WHERE chain = ?1 ORDER BY venue_name",
        )?;
        let venues = stmt
            .query_map(params![chain.slug()], |row| {
                Ok(Venue::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(venues)
    }

    pub fn replace_venues(
        &mut self,
        chain: CinemaChain,
        venues: &[Venue],
    ) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM venues WHERE chain = ?1", params![chain.slug()])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO venues (chain, venue_name, venue_id) VALUES (?1, ?2, ?3)",
            )?;
            for venue in venues {
                stmt.execute(params![chain.slug(), venue.name, venue.id])?;
            }
        }
        tx.commit()?;

        log::info!("Stored {} {} venues", venues.len(), chain);
        Ok(venues.len())
    }

    pub fn search_venues(&self, chain: CinemaChain, query: &str) -> Result<Vec<Venue>, StoreError> {
        let pattern = venue_search_pattern(query);
        let mut stmt = self.conn.prepare(
            "SELECT venue_id, venue_name FROM venues
             WHERE chain = ?1 AND venue_name LIKE ?2
             ORDER BY venue_name",
        )?;
        let venues = stmt
            .query_map(params![chain.slug(), pattern], |row| {
                Ok(Venue::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(venues)
    }

    pub fn find_venue(&self, chain: CinemaChain, query: &str) -> Result<Venue, StoreError> {
        let mut matches = self.search_venues(chain, query)?;
        match matches.len() {
            0 => Err(StoreError::VenueNotFound {
                chain,
                query: query.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(StoreError::AmbiguousVenue {
                chain,
                query: query.to_string(),
                count,
                matches: matches.into_iter().map(|v| v.name).collect(),
            }),
        }
    }
}
