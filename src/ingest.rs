//! Batch ingestion pipeline
//!
//! One `Ingestor` is constructed per batch invocation and carries the run
//! context every step needs: the store handle, the page client and its
//! politeness delay, and the portrait placeholder. Per-page failures skip
//! that page and continue the batch; only configuration and storage
//! failures abort the run.

use crate::data::scrapers::profile::{self, ProfilePage};
use crate::data::scrapers::PageClient;
use crate::data::Database;
use crate::{Config, Result, RingsideError};

/// How processing one page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Ingested,
    AlreadyKnown,
    Skipped,
}

/// Tallies for one batch run
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub pages: usize,
    pub ingested: usize,
    pub already_known: usize,
    pub skipped: usize,
    pub bouts: usize,
}

pub struct Ingestor<'a> {
    db: &'a Database,
    client: PageClient,
    default_portrait: String,
}

impl<'a> Ingestor<'a> {
    pub fn new(db: &'a Database, config: &Config) -> Result<Self> {
        Ok(Ingestor {
            db,
            client: PageClient::new(&config.scrape)?,
            default_portrait: config.scrape.default_portrait.clone(),
        })
    }

    /// Ingest every URL in a newline-delimited list, blank lines ignored
    pub fn run_batch(&self, urls_path: &str) -> Result<IngestReport> {
        let content = std::fs::read_to_string(urls_path).map_err(|e| {
            RingsideError::Config(format!("Failed to read URL list {}: {}", urls_path, e))
        })?;
        let urls: Vec<&str> = content.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if urls.is_empty() {
            return Err(RingsideError::Config(format!("No URLs in {}", urls_path)));
        }

        let mut report = IngestReport::default();
        let total = urls.len();

        for (i, url) in urls.iter().enumerate() {
            log::info!("[{}/{}] Processing {}", i + 1, total, url);
            report.pages += 1;

            match self.ingest_url(url) {
                Ok((PageOutcome::Ingested, bouts)) => {
                    report.ingested += 1;
                    report.bouts += bouts;
                }
                Ok((PageOutcome::AlreadyKnown, _)) => report.already_known += 1,
                Ok((PageOutcome::Skipped, _)) => report.skipped += 1,
                // Storage failures are fatal to the run; everything
                // page-local was already downgraded inside ingest_url
                Err(e) => return Err(e),
            }

            if i + 1 < total {
                self.client.pause();
            }
        }

        log::info!(
            "Batch complete: {} ingested, {} already known, {} skipped, {} bouts",
            report.ingested,
            report.already_known,
            report.skipped,
            report.bouts,
        );
        Ok(report)
    }

    /// Fetch and ingest one profile page
    ///
    /// Returns the page outcome and the number of bout rows inserted.
    /// Fetch and extraction problems resolve to `Skipped`; only storage
    /// errors propagate.
    pub fn ingest_url(&self, url: &str) -> Result<(PageOutcome, usize)> {
        let html = match self.client.fetch(url) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Error fetching {}: {}", url, e);
                return Ok((PageOutcome::Skipped, 0));
            }
        };

        // Cheap title check so known athletes skip the full parse
        let name = match profile::page_title(&html) {
            Some(name) => name,
            None => {
                log::warn!("Unable to extract a name from {}, skipping", url);
                return Ok((PageOutcome::Skipped, 0));
            }
        };
        if self.db.find_athlete_id(&name)?.is_some() {
            log::info!("'{}' already exists in DB, skipping", name);
            return Ok((PageOutcome::AlreadyKnown, 0));
        }

        let page = match profile::parse_profile(&html, &self.default_portrait) {
            Ok(page) => page,
            Err(RingsideError::NoProfile) => {
                log::warn!("No profile container on {}, skipping", url);
                return Ok((PageOutcome::Skipped, 0));
            }
            Err(e) => return Err(e),
        };

        self.ingest_page(page)
    }

    /// Persist an already-extracted page (also used for offline fixtures)
    pub fn ingest_page(&self, page: ProfilePage) -> Result<(PageOutcome, usize)> {
        let name = page.athlete.name.clone();
        let id = match self.db.insert_athlete(&page.athlete)? {
            Some(id) => id,
            None => return Ok((PageOutcome::AlreadyKnown, 0)),
        };

        let bouts = if page.bouts.is_empty() {
            0
        } else {
            self.db.insert_bouts(id, &name, &page.bouts)?
        };

        Ok((PageOutcome::Ingested, bouts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::scrapers::profile::parse_profile;

    const PROFILE: &str = r#"<html><body>
        <h1><span class="mw-page-title-main">Sam Granite (boxer)</span></h1>
        <table class="infobox"><tbody>
          <tr><th class="infobox-label">Height</th><td class="infobox-data">185 cm</td></tr>
        </tbody></table>
        <table class="wikitable"><tbody>
          <tr><th>Result</th><th>Opponent</th><th>Type</th><th>Date</th></tr>
          <tr><td>Win</td><td>Ivan Oak</td><td>KO</td><td>13 Nov 2004</td></tr>
        </tbody></table>
    </body></html>"#;

    fn ingestor(db: &Database) -> Ingestor<'_> {
        Ingestor::new(db, &Config::default()).unwrap()
    }

    #[test]
    fn test_ingest_page_inserts_athlete_and_bouts() {
        let db = Database::in_memory().unwrap();
        let page = parse_profile(PROFILE, "default.png").unwrap();

        let (outcome, bouts) = ingestor(&db).ingest_page(page).unwrap();
        assert_eq!(outcome, PageOutcome::Ingested);
        assert_eq!(bouts, 1);

        let stats = db.stats().unwrap();
        assert_eq!(stats.athlete_count, 1);
        assert_eq!(stats.bout_count, 1);
    }

    #[test]
    fn test_reingest_page_is_noop() {
        let db = Database::in_memory().unwrap();
        let ingestor = ingestor(&db);

        let page = parse_profile(PROFILE, "default.png").unwrap();
        ingestor.ingest_page(page).unwrap();

        let page = parse_profile(PROFILE, "default.png").unwrap();
        let (outcome, bouts) = ingestor.ingest_page(page).unwrap();
        assert_eq!(outcome, PageOutcome::AlreadyKnown);
        assert_eq!(bouts, 0);
        assert_eq!(db.stats().unwrap().athlete_count, 1);
        assert_eq!(db.stats().unwrap().bout_count, 1);
    }
}
