//! SQLite persistence for athlete, bout and ranking data
//!
//! The upsert adapter here is the sole writer of athletes and ranking
//! metrics; the resolver is the sole subsequent mutator of bout identity
//! references. Single-writer access is assumed for the duration of a pass.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::data::scrapers::profile::{CandidateAthlete, RawBout};
use crate::normalize::{canonicalize_method, parse_loose_date, ratios};
use crate::{
    Athlete, AthleteId, BoutId, BoutRecord, MethodCode, RankingMetrics, Result, RingsideError,
    Stance,
};

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS athletes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                alias TEXT,
                portrait TEXT NOT NULL,
                stance TEXT,
                height_cm INTEGER,
                reach_cm INTEGER,
                birth_date TEXT,
                active_from TEXT,
                active_to TEXT,
                eras TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS bouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                athlete_a_id INTEGER NOT NULL REFERENCES athletes(id),
                athlete_b_id INTEGER REFERENCES athletes(id),
                winner_id INTEGER REFERENCES athletes(id),
                opponent_name TEXT NOT NULL,
                winner_name TEXT,
                date TEXT,
                round_time TEXT,
                location TEXT,
                title_bout INTEGER NOT NULL DEFAULT 0,
                method TEXT NOT NULL DEFAULT 'unknown'
            );

            CREATE TABLE IF NOT EXISTS ranking_metrics (
                athlete_id INTEGER PRIMARY KEY REFERENCES athletes(id),
                fights INTEGER NOT NULL DEFAULT 0,
                wins INTEGER NOT NULL DEFAULT 0,
                losses INTEGER NOT NULL DEFAULT 0,
                wins_by_ko INTEGER NOT NULL DEFAULT 0,
                wins_by_decision INTEGER NOT NULL DEFAULT 0,
                wins_by_dq INTEGER NOT NULL DEFAULT 0,
                losses_by_ko INTEGER NOT NULL DEFAULT 0,
                losses_by_decision INTEGER NOT NULL DEFAULT 0,
                losses_by_dq INTEGER NOT NULL DEFAULT 0,
                win_ratio REAL NOT NULL DEFAULT 0.0,
                ko_ratio REAL NOT NULL DEFAULT 0.0
            );

            CREATE INDEX IF NOT EXISTS idx_bouts_owner ON bouts(athlete_a_id, date);
            CREATE INDEX IF NOT EXISTS idx_bouts_unresolved
                ON bouts(id) WHERE athlete_b_id IS NULL OR winner_id IS NULL;
            "#,
        )?;
        Ok(())
    }

    // ==================== Athlete Operations ====================

    /// Find an athlete's ID by display name, case-insensitively
    pub fn find_athlete_id(&self, name: &str) -> Result<Option<AthleteId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM athletes WHERE LOWER(name) = LOWER(?1)",
                params![name],
                |row| row.get(0).map(AthleteId),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert an athlete and its ranking metrics atomically
    ///
    /// A no-op when an athlete with the same name already exists:
    /// re-ingestion never updates, it skips. Returns the new ID, or None on
    /// the duplicate no-op.
    pub fn insert_athlete(&self, candidate: &CandidateAthlete) -> Result<Option<AthleteId>> {
        if let Some(existing) = self.find_athlete_id(&candidate.name)? {
            log::info!("'{}' already in DB as {}", candidate.name, existing);
            return Ok(None);
        }

        let record = &candidate.record;
        let (win_ratio, ko_ratio) = ratios(record.fights, record.wins, record.wins_by_ko);
        let eras_json = serde_json::to_string(&candidate.eras)
            .map_err(|e| RingsideError::Parse(e.to_string()))?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO athletes
                (name, alias, portrait, stance, height_cm, reach_cm,
                 birth_date, active_from, active_to, eras)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                candidate.name,
                candidate.alias,
                candidate.portrait,
                candidate.stance.map(|s| s.as_str()),
                candidate.height_cm,
                candidate.reach_cm,
                candidate.birth_date.map(|d| d.to_string()),
                candidate.active_from.map(|d| d.to_string()),
                candidate.active_to.map(|d| d.to_string()),
                eras_json,
            ],
        )?;
        let id = AthleteId(tx.last_insert_rowid());

        tx.execute(
            "INSERT INTO ranking_metrics
                (athlete_id, fights, wins, losses,
                 wins_by_ko, wins_by_decision, wins_by_dq,
                 losses_by_ko, losses_by_decision, losses_by_dq,
                 win_ratio, ko_ratio)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id.0,
                record.fights,
                record.wins,
                record.losses,
                record.wins_by_ko,
                record.wins_by_decision,
                record.wins_by_dq,
                record.losses_by_ko,
                record.losses_by_decision,
                record.losses_by_dq,
                win_ratio,
                ko_ratio,
            ],
        )?;
        tx.commit()?;

        log::info!("Inserted '{}' as {}", candidate.name, id);
        Ok(Some(id))
    }

    /// Get an athlete by ID
    pub fn get_athlete(&self, id: AthleteId) -> Result<Athlete> {
        self.conn
            .query_row(
                "SELECT id, name, alias, portrait, stance, height_cm, reach_cm,
                        birth_date, active_from, active_to, eras
                 FROM athletes WHERE id = ?1",
                params![id.0],
                athlete_from_row,
            )
            .map_err(|_| RingsideError::AthleteNotFound(id))
    }

    /// Get all athletes, ordered by name
    pub fn get_all_athletes(&self) -> Result<Vec<Athlete>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, alias, portrait, stance, height_cm, reach_cm,
                    birth_date, active_from, active_to, eras
             FROM athletes ORDER BY name",
        )?;
        let athletes = stmt
            .query_map([], athlete_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(athletes)
    }

    /// Get ranking metrics for an athlete, if any were recorded
    pub fn get_metrics(&self, id: AthleteId) -> Result<Option<RankingMetrics>> {
        let metrics = self
            .conn
            .query_row(
                "SELECT fights, wins, losses,
                        wins_by_ko, wins_by_decision, wins_by_dq,
                        losses_by_ko, losses_by_decision, losses_by_dq,
                        win_ratio, ko_ratio
                 FROM ranking_metrics WHERE athlete_id = ?1",
                params![id.0],
                |row| {
                    Ok(RankingMetrics {
                        fights: row.get(0)?,
                        wins: row.get(1)?,
                        losses: row.get(2)?,
                        wins_by_ko: row.get(3)?,
                        wins_by_decision: row.get(4)?,
                        wins_by_dq: row.get(5)?,
                        losses_by_ko: row.get(6)?,
                        losses_by_decision: row.get(7)?,
                        losses_by_dq: row.get(8)?,
                        win_ratio: row.get(9)?,
                        ko_ratio: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(metrics)
    }

    // ==================== Bout Operations ====================

    /// Insert the raw bout rows for a just-ingested profile owner
    ///
    /// Opponent and winner identity references are filled from name lookups
    /// where possible and left NULL otherwise; the resolver repairs them in
    /// a later pass. Rows whose natural key (date, owner, opponent name)
    /// already exists are skipped. Returns the number of rows inserted.
    pub fn insert_bouts(
        &self,
        owner: AthleteId,
        owner_name: &str,
        rows: &[RawBout],
    ) -> Result<usize> {
        let mut inserted = 0;

        for row in rows {
            if row.opponent.is_empty() {
                log::warn!("Bout row with no opponent name for '{}', skipping", owner_name);
                continue;
            }

            let winner_name = if row.result == "Win" {
                owner_name.to_string()
            } else {
                row.opponent.clone()
            };

            let date = parse_loose_date(&row.date);
            if self.bout_exists(owner, &row.opponent, date)? {
                log::info!(
                    "Skipping duplicate bout vs {} on {:?}",
                    row.opponent,
                    row.date
                );
                continue;
            }

            let opponent_id = self.find_athlete_id(&row.opponent)?;
            let winner_id = self.find_athlete_id(&winner_name)?;
            if opponent_id.is_none() || winner_id.is_none() {
                log::warn!(
                    "Unresolved references for bout vs {} (winner {})",
                    row.opponent,
                    winner_name
                );
            }

            let method = canonicalize_method(&row.method);
            let title_bout = row.notes.as_deref().map(|n| !n.trim().is_empty()).unwrap_or(false);

            self.conn.execute(
                "INSERT INTO bouts
                    (athlete_a_id, athlete_b_id, winner_id, opponent_name, winner_name,
                     date, round_time, location, title_bout, method)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    owner.0,
                    opponent_id.map(|id| id.0),
                    winner_id.map(|id| id.0),
                    row.opponent,
                    winner_name,
                    date.map(|d| d.to_string()),
                    row.round_time,
                    row.location,
                    title_bout,
                    method.as_str(),
                ],
            )?;
            inserted += 1;
        }

        log::info!("Inserted {} bouts for '{}'", inserted, owner_name);
        Ok(inserted)
    }

    /// Check the natural key (date, owner, opponent name)
    fn bout_exists(
        &self,
        owner: AthleteId,
        opponent_name: &str,
        date: Option<NaiveDate>,
    ) -> Result<bool> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM bouts
                 WHERE athlete_a_id = ?1 AND opponent_name = ?2 AND date IS ?3",
                params![owner.0, opponent_name, date.map(|d| d.to_string())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(existing.is_some())
    }

    /// All bouts involving an athlete, on either side
    pub fn bouts_for(&self, id: AthleteId) -> Result<Vec<BoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, athlete_a_id, athlete_b_id, winner_id, opponent_name, winner_name,
                    date, round_time, location, title_bout, method
             FROM bouts WHERE athlete_a_id = ?1 OR athlete_b_id = ?1
             ORDER BY date",
        )?;
        let bouts = stmt
            .query_map(params![id.0], bout_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bouts)
    }

    /// Bouts with at least one missing identity reference
    pub fn unresolved_bouts(&self) -> Result<Vec<BoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, athlete_a_id, athlete_b_id, winner_id, opponent_name, winner_name,
                    date, round_time, location, title_bout, method
             FROM bouts WHERE athlete_b_id IS NULL OR winner_id IS NULL
             ORDER BY id",
        )?;
        let bouts = stmt
            .query_map([], bout_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bouts)
    }

    /// Set the opponent reference; never overwrites a resolved one
    pub fn set_bout_opponent(&self, bout: BoutId, opponent: AthleteId) -> Result<()> {
        self.conn.execute(
            "UPDATE bouts SET athlete_b_id = ?1 WHERE id = ?2 AND athlete_b_id IS NULL",
            params![opponent.0, bout.0],
        )?;
        Ok(())
    }

    /// Set the winner reference; never overwrites a resolved one
    pub fn set_bout_winner(&self, bout: BoutId, winner: AthleteId) -> Result<()> {
        self.conn.execute(
            "UPDATE bouts SET winner_id = ?1 WHERE id = ?2 AND winner_id IS NULL",
            params![winner.0, bout.0],
        )?;
        Ok(())
    }

    // ==================== Transactions & Stats ====================

    /// Begin an explicit transaction (resolver batching)
    pub fn begin(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commit the current explicit transaction
    pub fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Row counts for the status command
    pub fn stats(&self) -> Result<DatabaseStats> {
        let athlete_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM athletes", [], |row| row.get(0))?;
        let bout_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM bouts", [], |row| row.get(0))?;
        let unresolved_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bouts WHERE athlete_b_id IS NULL OR winner_id IS NULL",
            [],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            athlete_count: athlete_count as usize,
            bout_count: bout_count as usize,
            unresolved_count: unresolved_count as usize,
        })
    }
}

fn parse_stored_date(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn athlete_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Athlete> {
    let stance: Option<String> = row.get(4)?;
    let eras_json: String = row.get(10)?;
    Ok(Athlete {
        id: AthleteId(row.get(0)?),
        name: row.get(1)?,
        alias: row.get(2)?,
        portrait: row.get(3)?,
        stance: stance.as_deref().and_then(Stance::parse),
        height_cm: row.get(5)?,
        reach_cm: row.get(6)?,
        birth_date: parse_stored_date(row.get(7)?),
        active_from: parse_stored_date(row.get(8)?),
        active_to: parse_stored_date(row.get(9)?),
        eras: serde_json::from_str(&eras_json).unwrap_or_default(),
    })
}

fn bout_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BoutRecord> {
    let method: String = row.get(10)?;
    Ok(BoutRecord {
        id: BoutId(row.get(0)?),
        athlete_a: AthleteId(row.get(1)?),
        athlete_b: row.get::<_, Option<i64>>(2)?.map(AthleteId),
        winner: row.get::<_, Option<i64>>(3)?.map(AthleteId),
        opponent_name: row.get(4)?,
        winner_name: row.get(5)?,
        date: parse_stored_date(row.get(6)?),
        round_time: row.get(7)?,
        location: row.get(8)?,
        title_bout: row.get(9)?,
        method: MethodCode::from_code(&method).unwrap_or(MethodCode::Unknown),
    })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub athlete_count: usize,
    pub bout_count: usize,
    pub unresolved_count: usize,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::scrapers::profile::RecordSummary;

    pub(crate) fn candidate(name: &str) -> CandidateAthlete {
        CandidateAthlete {
            name: name.to_string(),
            alias: None,
            portrait: "default.png".to_string(),
            stance: Some(Stance::Orthodox),
            height_cm: Some(185),
            reach_cm: None,
            birth_date: None,
            active_from: NaiveDate::from_ymd_opt(1985, 6, 9),
            active_to: NaiveDate::from_ymd_opt(2004, 11, 13),
            eras: vec!["80s".to_string(), "90s".to_string(), "00s".to_string()],
            record: RecordSummary {
                fights: 50,
                wins: 40,
                losses: 10,
                wins_by_ko: 30,
                wins_by_decision: 10,
                ..Default::default()
            },
        }
    }

    pub(crate) fn raw_bout(opponent: &str, result: &str, date: &str) -> RawBout {
        RawBout {
            result: result.to_string(),
            opponent: opponent.to_string(),
            date: date.to_string(),
            method: "UD".to_string(),
            round_time: Some("12".to_string()),
            location: Some("Las Vegas, US".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_insert_athlete_idempotent() {
        let db = Database::in_memory().unwrap();

        let first = db.insert_athlete(&candidate("Sam Granite")).unwrap();
        assert!(first.is_some());

        // Re-ingestion is a no-op, not an update
        let second = db.insert_athlete(&candidate("Sam Granite")).unwrap();
        assert!(second.is_none());
        assert_eq!(db.stats().unwrap().athlete_count, 1);

        // Case-insensitive duplicate detection
        let third = db.insert_athlete(&candidate("sam granite")).unwrap();
        assert!(third.is_none());
    }

    #[test]
    fn test_metrics_created_with_athlete() {
        let db = Database::in_memory().unwrap();
        let id = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();

        let metrics = db.get_metrics(id).unwrap().unwrap();
        assert_eq!(metrics.fights, 50);
        assert_eq!(metrics.wins, 40);
        assert_eq!(metrics.win_ratio, 0.8);
        assert_eq!(metrics.ko_ratio, 0.75);
    }

    #[test]
    fn test_athlete_roundtrip() {
        let db = Database::in_memory().unwrap();
        let id = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();

        let athlete = db.get_athlete(id).unwrap();
        assert_eq!(athlete.name, "Sam Granite");
        assert_eq!(athlete.stance, Some(Stance::Orthodox));
        assert_eq!(athlete.height_cm, Some(185));
        assert_eq!(athlete.eras, vec!["80s", "90s", "00s"]);
        assert_eq!(athlete.active_from, NaiveDate::from_ymd_opt(1985, 6, 9));

        assert!(matches!(
            db.get_athlete(AthleteId(999)),
            Err(RingsideError::AthleteNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_bout_suppression() {
        let db = Database::in_memory().unwrap();
        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();

        let rows = vec![
            raw_bout("Ivan Oak", "Win", "13 Nov 2004"),
            raw_bout("Ivan Oak", "Win", "13 Nov 2004"),
        ];
        let inserted = db.insert_bouts(owner, "Sam Granite", &rows).unwrap();
        assert_eq!(inserted, 1);

        // Same natural key in a later pass is also suppressed
        let again = db
            .insert_bouts(owner, "Sam Granite", &[raw_bout("Ivan Oak", "Win", "13 Nov 2004")])
            .unwrap();
        assert_eq!(again, 0);
        assert_eq!(db.stats().unwrap().bout_count, 1);
    }

    #[test]
    fn test_winner_naming_and_references() {
        let db = Database::in_memory().unwrap();
        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();

        let rows = vec![
            raw_bout("Ivan Oak", "Win", "13 Nov 2004"),
            raw_bout("Pete Slate", "Loss", "2 Feb 1994"),
        ];
        db.insert_bouts(owner, "Sam Granite", &rows).unwrap();

        let bouts = db.bouts_for(owner).unwrap();
        assert_eq!(bouts.len(), 2);

        let loss = &bouts[0]; // ordered by date
        assert_eq!(loss.opponent_name, "Pete Slate");
        assert_eq!(loss.winner_name.as_deref(), Some("Pete Slate"));
        assert!(loss.athlete_b.is_none());
        assert!(loss.winner.is_none());

        let win = &bouts[1];
        assert_eq!(win.winner_name.as_deref(), Some("Sam Granite"));
        // Owner is already in the DB, so the winner reference resolves now
        assert_eq!(win.winner, Some(owner));
        assert!(win.athlete_b.is_none());
    }

    #[test]
    fn test_unknown_method_still_inserted() {
        let db = Database::in_memory().unwrap();
        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();

        let mut row = raw_bout("Ivan Oak", "Win", "13 Nov 2004");
        row.method = "EXH".to_string();
        db.insert_bouts(owner, "Sam Granite", &[row]).unwrap();

        let bouts = db.bouts_for(owner).unwrap();
        assert_eq!(bouts[0].method, MethodCode::Unknown);
    }

    #[test]
    fn test_reference_updates_are_monotone() {
        let db = Database::in_memory().unwrap();
        let owner = db.insert_athlete(&candidate("Sam Granite")).unwrap().unwrap();
        db.insert_bouts(owner, "Sam Granite", &[raw_bout("Ivan Oak", "Loss", "13 Nov 2004")])
            .unwrap();

        let bout = db.unresolved_bouts().unwrap()[0].id;
        let oak = db.insert_athlete(&candidate("Ivan Oak")).unwrap().unwrap();
        db.set_bout_opponent(bout, oak).unwrap();

        // A second set against a resolved reference must not change it
        let other = db.insert_athlete(&candidate("Pete Slate")).unwrap().unwrap();
        db.set_bout_opponent(bout, other).unwrap();

        let bouts = db.bouts_for(owner).unwrap();
        assert_eq!(bouts[0].athlete_b, Some(oak));
    }
}
