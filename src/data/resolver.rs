//! Deferred cross-reference resolver
//!
//! On the first ingestion pass many opponents have not been ingested yet,
//! so bout rows carry name strings with NULL identity references. This pass
//! walks every such row, retries the name lookups, and fills in the
//! references that can now be resolved. Names that still cannot be found
//! are appended to plain-text side-channel logs for later visibility.
//!
//! Repeated runs strictly shrink the unresolved set and never reassign a
//! reference that was already set, so the pass is idempotent and
//! convergent. Commits happen every `batch_size` rows so a crash loses at
//! most one batch of progress. Single resolver instance at a time; safety
//! under concurrent runs is not provided.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Database;
use crate::Result;

/// Outcome summary of one resolver pass
#[derive(Debug, Clone, Default)]
pub struct ResolveReport {
    pub examined: usize,
    pub opponents_resolved: usize,
    pub winners_resolved: usize,
    pub opponents_unresolved: usize,
    pub winners_unresolved: usize,
}

pub struct Resolver {
    batch_size: usize,
    opponent_log: PathBuf,
    winner_log: PathBuf,
}

impl Resolver {
    pub fn new<P: AsRef<Path>>(batch_size: usize, opponent_log: P, winner_log: P) -> Self {
        Resolver {
            batch_size: batch_size.max(1),
            opponent_log: opponent_log.as_ref().to_path_buf(),
            winner_log: winner_log.as_ref().to_path_buf(),
        }
    }

    /// Run one resolution pass over all bouts with missing references
    pub fn run(&self, db: &Database) -> Result<ResolveReport> {
        let bouts = db.unresolved_bouts()?;
        let mut report = ResolveReport {
            examined: bouts.len(),
            ..Default::default()
        };

        let mut opponent_log = append_log(&self.opponent_log)?;
        let mut winner_log = append_log(&self.winner_log)?;

        db.begin()?;
        for (i, bout) in bouts.iter().enumerate() {
            if bout.athlete_b.is_none() {
                match db.find_athlete_id(&bout.opponent_name)? {
                    Some(opponent) => {
                        db.set_bout_opponent(bout.id, opponent)?;
                        report.opponents_resolved += 1;
                    }
                    None => {
                        writeln!(opponent_log, "{}", bout.opponent_name)?;
                        report.opponents_unresolved += 1;
                    }
                }
            }

            if bout.winner.is_none() {
                if let Some(winner_name) = &bout.winner_name {
                    match db.find_athlete_id(winner_name)? {
                        Some(winner) => {
                            db.set_bout_winner(bout.id, winner)?;
                            report.winners_resolved += 1;
                        }
                        None => {
                            writeln!(winner_log, "{}", winner_name)?;
                            report.winners_unresolved += 1;
                        }
                    }
                }
            }

            // Bound transaction size and keep the pass resumable
            if (i + 1) % self.batch_size == 0 {
                db.commit()?;
                log::info!("Committed {} resolved bouts...", i + 1);
                db.begin()?;
            }
        }
        db.commit()?;

        log::info!(
            "Resolver pass: {} examined, {} opponents and {} winners resolved, {} + {} still unresolved",
            report.examined,
            report.opponents_resolved,
            report.winners_resolved,
            report.opponents_unresolved,
            report.winners_unresolved,
        );
        Ok(report)
    }
}

fn append_log(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::tests::{candidate, raw_bout};

    fn test_resolver(dir: &Path) -> Resolver {
        Resolver::new(
            2,
            dir.join("opponents.log"),
            dir.join("winners.log"),
        )
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ringside-resolver-{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolver_convergence() {
        let db = Database::in_memory().unwrap();
        let dir = temp_dir("convergence");
        let resolver = test_resolver(&dir);

        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();
        let rows = vec![
            raw_bout("Ivan Oak", "Loss", "13 Nov 2004"),
            raw_bout("Pete Slate", "Loss", "2 Feb 1994"),
            raw_bout("Rocky Shale", "Loss", "9 Jun 1985"),
        ];
        db.insert_bouts(owner, "Sam Granite", &rows).unwrap();
        assert_eq!(db.stats().unwrap().unresolved_count, 3);

        // Nothing resolvable yet: the opponents are not ingested
        let report = resolver.run(&db).unwrap();
        assert_eq!(report.examined, 3);
        assert_eq!(report.opponents_resolved, 0);
        assert_eq!(report.opponents_unresolved, 3);

        // Ingest two opponents in a "later batch", then re-run
        db.insert_athlete(&candidate("Ivan Oak")).unwrap();
        db.insert_athlete(&candidate("Pete Slate")).unwrap();

        let report = resolver.run(&db).unwrap();
        assert_eq!(report.opponents_resolved, 2);
        assert_eq!(report.winners_resolved, 2);
        assert_eq!(db.stats().unwrap().unresolved_count, 1);

        // Final opponent arrives; the unresolved set shrinks to empty
        db.insert_athlete(&candidate("Rocky Shale")).unwrap();
        let report = resolver.run(&db).unwrap();
        assert_eq!(report.opponents_resolved, 1);
        assert_eq!(db.stats().unwrap().unresolved_count, 0);
    }

    #[test]
    fn test_resolver_idempotent_when_converged() {
        let db = Database::in_memory().unwrap();
        let dir = temp_dir("idempotent");
        let resolver = test_resolver(&dir);

        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();
        db.insert_athlete(&candidate("Ivan Oak")).unwrap();
        db.insert_bouts(owner, "Sam Granite", &[raw_bout("Ivan Oak", "Win", "13 Nov 2004")])
            .unwrap();

        resolver.run(&db).unwrap();
        assert_eq!(db.stats().unwrap().unresolved_count, 0);

        // A pass with no new data changes nothing
        let report = resolver.run(&db).unwrap();
        assert_eq!(report.examined, 0);
        assert_eq!(report.opponents_resolved, 0);
        assert_eq!(report.winners_resolved, 0);
    }

    #[test]
    fn test_unresolved_names_logged() {
        let db = Database::in_memory().unwrap();
        let dir = temp_dir("logged");
        let opponent_log = dir.join("opponents.log");
        let _ = std::fs::remove_file(&opponent_log);
        let resolver = Resolver::new(500, opponent_log.clone(), dir.join("winners.log"));

        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();
        db.insert_bouts(owner, "Sam Granite", &[raw_bout("Ghost Gale", "Loss", "1 Jan 2000")])
            .unwrap();

        resolver.run(&db).unwrap();
        let logged = std::fs::read_to_string(&opponent_log).unwrap();
        assert!(logged.contains("Ghost Gale"));

        // Appended across runs, not truncated
        resolver.run(&db).unwrap();
        let logged = std::fs::read_to_string(&opponent_log).unwrap();
        assert_eq!(logged.matches("Ghost Gale").count(), 2);
    }
}
