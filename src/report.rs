//! Structured documents for the presentation layer
//!
//! The query interface returns one JSON-serializable document per athlete
//! with bio fields, ranking metrics (nulls when absent) and every bout the
//! athlete appears in. The prediction interface wraps the rating engine's
//! forecast with presentation-ready figures.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::Database;
use crate::predict;
use crate::{AthleteId, BoutId, RankingMetrics, Result};

/// Bio, metrics and bout history for one athlete
#[derive(Debug, Clone, Serialize)]
pub struct AthleteDocument {
    pub id: AthleteId,
    pub name: String,
    pub alias: Option<String>,
    pub portrait: String,
    pub stance: Option<String>,
    pub height_cm: Option<u32>,
    pub reach_cm: Option<u32>,
    pub birth_date: Option<NaiveDate>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub eras: Vec<String>,
    pub ranking: Option<RankingMetrics>,
    pub bouts: Vec<BoutDocument>,
}

/// One bout as exposed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct BoutDocument {
    pub id: BoutId,
    pub athlete_a_id: AthleteId,
    pub athlete_b_id: Option<AthleteId>,
    pub winner_id: Option<AthleteId>,
    pub date: Option<NaiveDate>,
    pub round_time: Option<String>,
    pub method: String,
    pub location: Option<String>,
    pub title_bout: bool,
}

/// Matchup forecast as exposed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct PredictionDocument {
    pub winner_id: AthleteId,
    pub winner_name: String,
    /// 0-100, one decimal place
    pub win_probability: f64,
    pub outcome: predict::OutcomeType,
    pub rating_differential: String,
    pub ko_likelihood: f64,
}

/// Build the athlete document the front-end renders
pub fn athlete_document(db: &Database, id: AthleteId) -> Result<AthleteDocument> {
    let athlete = db.get_athlete(id)?;
    let ranking = db.get_metrics(id)?;
    let bouts = db
        .bouts_for(id)?
        .into_iter()
        .map(|bout| BoutDocument {
            id: bout.id,
            athlete_a_id: bout.athlete_a,
            athlete_b_id: bout.athlete_b,
            winner_id: bout.winner,
            date: bout.date,
            round_time: bout.round_time,
            method: bout.method.as_str().to_string(),
            location: bout.location,
            title_bout: bout.title_bout,
        })
        .collect();

    Ok(AthleteDocument {
        id: athlete.id,
        name: athlete.name,
        alias: athlete.alias,
        portrait: athlete.portrait,
        stance: athlete.stance.map(|s| s.as_str().to_string()),
        height_cm: athlete.height_cm,
        reach_cm: athlete.reach_cm,
        birth_date: athlete.birth_date,
        active_from: athlete.active_from,
        active_to: athlete.active_to,
        eras: athlete.eras,
        ranking,
        bouts,
    })
}

/// Forecast a matchup between two persisted athletes
pub fn prediction_document(
    db: &Database,
    athlete_a: AthleteId,
    athlete_b: AthleteId,
) -> Result<PredictionDocument> {
    // Both athletes must exist; missing metrics rows just default to zeros
    let a = db.get_athlete(athlete_a)?;
    let b = db.get_athlete(athlete_b)?;
    let metrics_a = db.get_metrics(athlete_a)?;
    let metrics_b = db.get_metrics(athlete_b)?;

    let forecast = predict::predict(
        athlete_a,
        metrics_a.as_ref(),
        athlete_b,
        metrics_b.as_ref(),
    );

    let winner_name = if forecast.winner == athlete_a {
        a.name
    } else {
        b.name
    };

    Ok(PredictionDocument {
        winner_id: forecast.winner,
        winner_name,
        win_probability: forecast.win_percent(),
        outcome: forecast.outcome,
        rating_differential: forecast.differential,
        ko_likelihood: forecast.ko_likelihood,
    })
}
