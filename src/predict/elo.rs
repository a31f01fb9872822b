//! Elo-style matchup forecasting
//!
//! A stateless pure function over two athletes' aggregate statistics. Safe
//! to call concurrently; performs no storage mutation.

use serde::Serialize;
use std::fmt;

use crate::{AthleteId, RankingMetrics};

/// Baseline rating before any metric contributions
const BASE_RATING: f64 = 1500.0;
/// Elo logistic base
const ELO_C: f64 = 10.0;
/// Elo scale divisor
const ELO_D: f64 = 400.0;
/// Rating gap beyond which a knockout becomes the likely outcome
const KO_GAP: f64 = 100.0;
/// Heuristic knockout likelihood for a large rating gap
const KO_LIKELIHOOD_HIGH: f64 = 0.7;
/// Heuristic knockout likelihood for a small rating gap
const KO_LIKELIHOOD_LOW: f64 = 0.3;

/// Predicted way the bout ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeType {
    #[serde(rename = "K.O.")]
    Knockout,
    Decision,
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeType::Knockout => write!(f, "K.O."),
            OutcomeType::Decision => write!(f, "Decision"),
        }
    }
}

/// Forecast for a hypothetical matchup
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub winner: AthleteId,
    /// Winner's win probability, 0..1
    pub win_probability: f64,
    pub outcome: OutcomeType,
    /// Human-readable rating differential, two decimal places
    pub differential: String,
    pub ko_likelihood: f64,
}

impl Forecast {
    /// Win probability as a 0-100 percentage, one decimal place
    pub fn win_percent(&self) -> f64 {
        (self.win_probability * 1000.0).round() / 10.0
    }
}

/// Synthetic rating from aggregate statistics
///
/// Weighted contributions on top of the 1500 baseline; an athlete without a
/// metrics row rates at exactly the baseline.
pub fn rating(metrics: Option<&RankingMetrics>) -> f64 {
    let (win_ratio, ko_ratio, wins, losses) = match metrics {
        Some(m) => (m.win_ratio, m.ko_ratio, m.wins as f64, m.losses as f64),
        None => (0.0, 0.0, 0.0, 0.0),
    };
    BASE_RATING + 500.0 * win_ratio + 250.0 * ko_ratio + 5.0 * (wins - losses)
}

/// Predict the outcome of a hypothetical matchup between A and B
///
/// Ties deliberately favor side A: `P(A) >= 0.5` selects A, so identical
/// inputs always predict whichever athlete was passed first. The outcome
/// type is a static heuristic on the winner-loser rating gap, with the gap
/// of exactly 100 still a decision (strictly greater required for a K.O.).
pub fn predict(
    athlete_a: AthleteId,
    metrics_a: Option<&RankingMetrics>,
    athlete_b: AthleteId,
    metrics_b: Option<&RankingMetrics>,
) -> Forecast {
    let rating_a = rating(metrics_a);
    let rating_b = rating(metrics_b);

    let prob_a = 1.0 / (1.0 + ELO_C.powf((rating_b - rating_a) / ELO_D));
    let prob_b = 1.0 - prob_a;

    let differential = format!("Elo rating disparity = {:.2}", rating_a - rating_b);

    let (winner, win_probability, gap) = if prob_a >= 0.5 {
        (athlete_a, prob_a, rating_a - rating_b)
    } else {
        (athlete_b, prob_b, rating_b - rating_a)
    };

    let (outcome, ko_likelihood) = if gap > KO_GAP {
        (OutcomeType::Knockout, KO_LIKELIHOOD_HIGH)
    } else {
        (OutcomeType::Decision, KO_LIKELIHOOD_LOW)
    };

    Forecast {
        winner,
        win_probability,
        outcome,
        differential,
        ko_likelihood,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(win_ratio: f64, ko_ratio: f64, wins: u32, losses: u32) -> RankingMetrics {
        RankingMetrics {
            fights: wins + losses,
            wins,
            losses,
            win_ratio,
            ko_ratio,
            ..Default::default()
        }
    }

    #[test]
    fn test_rating_baseline_without_metrics() {
        assert_eq!(rating(None), 1500.0);
        assert_eq!(rating(Some(&RankingMetrics::default())), 1500.0);
    }

    #[test]
    fn test_rating_contributions() {
        let m = metrics(0.8, 0.5, 40, 10);
        // 1500 + 500*0.8 + 250*0.5 + 5*30
        assert_eq!(rating(Some(&m)), 2175.0);
    }

    #[test]
    fn test_identical_inputs_tie_break_favors_a() {
        let m = metrics(0.5, 0.5, 10, 10);
        let forecast = predict(AthleteId(1), Some(&m), AthleteId(2), Some(&m));

        assert_eq!(forecast.winner, AthleteId(1));
        assert_eq!(forecast.win_probability, 0.5);
        assert_eq!(forecast.outcome, OutcomeType::Decision);
        assert_eq!(forecast.ko_likelihood, 0.3);
        assert_eq!(forecast.differential, "Elo rating disparity = 0.00");
    }

    #[test]
    fn test_gap_of_exactly_100_is_still_decision() {
        // 5*(wins - losses) = 100 with ratios zeroed
        let strong = metrics(0.0, 0.0, 20, 0);
        let forecast = predict(AthleteId(1), Some(&strong), AthleteId(2), None);

        assert_eq!(forecast.winner, AthleteId(1));
        assert_eq!(forecast.outcome, OutcomeType::Decision);
        assert_eq!(forecast.ko_likelihood, 0.3);
        assert_eq!(forecast.differential, "Elo rating disparity = 100.00");
    }

    #[test]
    fn test_large_gap_predicts_knockout() {
        let strong = metrics(0.9, 0.8, 45, 5);
        let forecast = predict(AthleteId(1), Some(&strong), AthleteId(2), None);

        assert_eq!(forecast.winner, AthleteId(1));
        assert_eq!(forecast.outcome, OutcomeType::Knockout);
        assert_eq!(forecast.ko_likelihood, 0.7);
        assert!(forecast.win_probability > 0.9);
    }

    #[test]
    fn test_b_side_victory_reports_b_probability() {
        let strong = metrics(0.9, 0.8, 45, 5);
        let forecast = predict(AthleteId(1), None, AthleteId(2), Some(&strong));

        assert_eq!(forecast.winner, AthleteId(2));
        assert!(forecast.win_probability > 0.5);
        // Differential text is always rendered A minus B
        assert!(forecast.differential.starts_with("Elo rating disparity = -"));
    }

    #[test]
    fn test_win_percent_rounding() {
        let forecast = Forecast {
            winner: AthleteId(1),
            win_probability: 0.87654,
            outcome: OutcomeType::Decision,
            differential: String::new(),
            ko_likelihood: 0.3,
        };
        assert_eq!(forecast.win_percent(), 87.7);
    }

    #[test]
    fn test_missing_metrics_never_fault() {
        let forecast = predict(AthleteId(1), None, AthleteId(2), None);
        assert_eq!(forecast.winner, AthleteId(1));
        assert_eq!(forecast.win_probability, 0.5);
    }
}
