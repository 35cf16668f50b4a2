use std::fs;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::CatalogSettings;
use crate::http::is_remote;

use super::model::{Catalog, Catalogs, Mode, Track};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{} catalog request to {locator} failed: {source}", .mode.label())]
    Request {
        mode: Mode,
        locator: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("{} catalog at {locator} could not be read: {source}", .mode.label())]
    Io {
        mode: Mode,
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{} catalog at {locator} is not a valid track list: {source}", .mode.label())]
    Parse {
        mode: Mode,
        locator: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} catalog fetch thread panicked", .0.label())]
    Panicked(Mode),
}

pub type CatalogResult = Result<Catalogs, CatalogError>;

/// Parse a JSON array of track objects.
pub fn parse_tracks(mode: Mode, locator: &str, body: &str) -> Result<Vec<Track>, CatalogError> {
    serde_json::from_str(body).map_err(|source| CatalogError::Parse {
        mode,
        locator: locator.to_string(),
        source,
    })
}

fn fetch_body(agent: &ureq::Agent, mode: Mode, locator: &str) -> Result<String, CatalogError> {
    let io_err = |source| CatalogError::Io {
        mode,
        locator: locator.to_string(),
        source,
    };

    if is_remote(locator) {
        let response = agent.get(locator).call().map_err(|e| CatalogError::Request {
            mode,
            locator: locator.to_string(),
            source: Box::new(e),
        })?;
        response.into_string().map_err(io_err)
    } else {
        fs::read_to_string(locator).map_err(io_err)
    }
}

/// Fetch and parse a single catalog from `locator`.
pub fn fetch_catalog(agent: &ureq::Agent, mode: Mode, locator: &str) -> Result<Catalog, CatalogError> {
    debug!("fetching {} catalog from {locator}", mode.label());
    let body = fetch_body(agent, mode, locator)?;
    let tracks = parse_tracks(mode, locator, &body)?;
    info!("{} catalog loaded: {} tracks", mode.label(), tracks.len());
    Ok(Catalog::new(tracks))
}

/// Fetch both catalogs concurrently; succeeds only when both do.
pub fn load_catalogs(agent: &ureq::Agent, settings: &CatalogSettings) -> CatalogResult {
    thread::scope(|s| {
        let primary = s.spawn(|| fetch_catalog(agent, Mode::Primary, &settings.primary));
        let alternate = s.spawn(|| fetch_catalog(agent, Mode::Alternate, &settings.alternate));

        let primary = primary
            .join()
            .map_err(|_| CatalogError::Panicked(Mode::Primary))??;
        let alternate = alternate
            .join()
            .map_err(|_| CatalogError::Panicked(Mode::Alternate))??;

        Ok(Catalogs::new(primary, alternate))
    })
}

/// Run `load_catalogs` on a background thread and deliver the outcome once.
pub fn spawn_catalog_load(agent: ureq::Agent, settings: CatalogSettings) -> Receiver<CatalogResult> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = load_catalogs(&agent, &settings);
        if let Err(e) = &result {
            warn!("catalog load failed: {e}");
        }
        let _ = tx.send(result);
    });
    rx
}
