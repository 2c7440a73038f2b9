use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::CinemaChain;
use crate::utils::parse_date_input;

pub const CONFIG_ENV: &str = "REPERTUAR_CONFIG";
pub const TMDB_TOKEN_ENV: &str = "TMDB_ACCESS_TOKEN";
pub const DB_PATH_ENV: &str = "REPERTUAR_DB_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid url template for {field}: {url}")]
    InvalidUrl { field: String, url: String },
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_preferences: UserPreferences,
    pub cinema_city: ChainSettings,
    pub helios: ChainSettings,
    pub multikino: ChainSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub default_cinema: CinemaChain,
    pub default_venue: String,
    pub default_day: String,
    pub db_file_path: PathBuf,
    pub tmdb_access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub repertoire_url: String,
    pub venues_list_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub timeout_secs: u64,
    pub settle_millis: u64,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_preferences: UserPreferences::default(),
            cinema_city: ChainSettings {
                repertoire_url: "https://www.cinema-city.pl/#/buy-tickets-by-cinema?in-cinema={cinema_venue_id}&at={repertoire_date}".to_string(),
                venues_list_url: "https://www.cinema-city.pl/#/buy-tickets-by-cinema".to_string(),
            },
            helios: ChainSettings {
                repertoire_url: "https://www.helios.pl/{cinema_venue_id}/Repertuar/index/{repertoire_date}".to_string(),
                venues_list_url: "https://www.helios.pl/".to_string(),
            },
            multikino: ChainSettings {
                repertoire_url: "https://www.multikino.pl/repertuar/{cinema_venue_id}/teraz-gramy?data={repertoire_date}".to_string(),
                venues_list_url: "https://www.multikino.pl/".to_string(),
            },
            render: RenderSettings::default(),
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_cinema: CinemaChain::CinemaCity,
            default_venue: "Wroclavia".to_string(),
            default_day: "today".to_string(),
            db_file_path: PathBuf::from("db.sqlite"),
            tmdb_access_token: None,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            settle_millis: 1500,
            chrome_executable: None,
        }
    }
}

impl Settings {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut settings = match path {
            Some(path) => {
                log::debug!("Loading settings from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                log::debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TMDB_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.user_preferences.tmdb_access_token = Some(token);
        }
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.user_preferences.db_file_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for chain in CinemaChain::ALL {
            let chain_settings = self.chain(chain);
            validate_url(
                &format!("{}.repertoire_url", chain.slug()),
                &chain_settings.repertoire_url,
            )?;
            validate_url(
                &format!("{}.venues_list_url", chain.slug()),
                &chain_settings.venues_list_url,
            )?;
        }

        if let Err(e) = parse_date_input(&self.user_preferences.default_day) {
            return Err(SettingsError::InvalidValue {
                field: "user_preferences.default_day".to_string(),
                reason: e.to_string(),
            });
        }

        if self.render.timeout_secs == 0 {
            return Err(SettingsError::InvalidValue {
                field: "render.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn chain(&self, chain: CinemaChain) -> &ChainSettings {
        match chain {
            CinemaChain::CinemaCity => &self.cinema_city,
            CinemaChain::Helios => &self.helios,
            CinemaChain::Multikino => &self.multikino,
        }
    }

    pub fn tmdb_access_token(&self) -> Option<&str> {
        self.user_preferences
            .tmdb_access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), SettingsError> {
    let invalid = || SettingsError::InvalidUrl {
        field: field.to_string(),
        url: url.to_string(),
    };
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(contents.as_bytes())
            .expect("Failed to write temp file");
        file
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.render.timeout_secs, 30);
        assert_eq!(
            settings.user_preferences.default_cinema,
            CinemaChain::CinemaCity
        );
    }

    #[test]
    fn test_from_file_reads_partial_config() {
        let file = write_config(
            r#"
[user_preferences]
default_cinema = "cinema-city"
default_venue = "Manufaktura"
default_day = "tomorrow"
db_file_path = "data/venues.sqlite"

[cinema_city]
repertoire_url = "https://example.com/{cinema_venue_id}/{repertoire_date}"
venues_list_url = "https://example.com/venues"

[render]
timeout_secs = 10
"#,
        );

        let settings = Settings::from_file(file.path()).expect("Failed to load settings");
        assert_eq!(settings.user_preferences.default_venue, "Manufaktura");
        assert_eq!(settings.user_preferences.default_day, "tomorrow");
        assert_eq!(
            settings.user_preferences.db_file_path,
            PathBuf::from("data/venues.sqlite")
        );
        assert_eq!(
            settings.cinema_city.repertoire_url,
            "https://example.com/{cinema_venue_id}/{repertoire_date}"
        );
        assert_eq!(settings.render.timeout_secs, 10);
        assert_eq!(settings.render.settle_millis, 1500);
        assert_eq!(settings.helios, Settings::default().helios);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let settings = Settings::from_file(Path::new("../../config.example.toml"))
            .expect("Failed to load example config");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let file = write_config(
            r#"
[user_preferences]
default_venue = "Janki"
"#,
        );
        let settings = Settings::load(Some(file.path())).expect("Failed to load settings");
        assert_eq!(settings.user_preferences.default_venue, "Janki");
    }

    #[test]
    fn test_from_file_missing_file() {
        let err = Settings::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_from_file_rejects_unknown_chain() {
        let file = write_config(
            r#"
[user_preferences]
default_cinema = "kino-moskwa"
"#,
        );
        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Toml { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (TMDB_TOKEN_ENV, "secret-token"),
            (DB_PATH_ENV, "/tmp/venues.sqlite"),
        ]);
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.tmdb_access_token(), Some("secret-token"));
        assert_eq!(
            settings.user_preferences.db_file_path,
            PathBuf::from("/tmp/venues.sqlite")
        );
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let mut settings = Settings::default();
        settings.user_preferences.tmdb_access_token = Some("   ".to_string());
        assert_eq!(settings.tmdb_access_token(), None);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut settings = Settings::default();
        settings.multikino.venues_list_url = "not a url".to_string();
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid url template for multikino.venues_list_url: not a url"
        );

        settings.multikino.venues_list_url = "ftp://multikino.pl".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_default_day() {
        let mut settings = Settings::default();
        settings.user_preferences.default_day = "someday".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut settings = Settings::default();
        settings.render.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }
}
