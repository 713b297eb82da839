//! Derived statistics views.
//!
//! Everything here is recomputed per request and never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MatchResult;
use crate::calculate::win_rate_percent;

/// Win/loss/draw counts for one group (month, year, note type, opponent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownStat {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Percentage, one decimal
    pub win_rate: f64,
}

impl BreakdownStat {
    /// Count one result. Practice-only and undecided results count toward
    /// the total only.
    pub fn add(&mut self, result: MatchResult) {
        self.total += 1;
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::PracticeOnly | MatchResult::Undecided => {}
        }
        self.win_rate = win_rate_percent(self.wins, self.total);
    }
}

/// Headline numbers shared by the user overview and the opponent detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchTotals {
    pub total_matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
    /// Positive for a win run, negative for a loss run
    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub longest_lose_streak: u32,
}

/// Overview of all of a user's results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(flatten)]
    pub totals: MatchTotals,
    /// Keyed by `YYYY-MM`
    pub monthly_stats: BTreeMap<String, BreakdownStat>,
    /// Keyed by `YYYY`
    pub yearly_stats: BTreeMap<String, BreakdownStat>,
    /// Keyed by note type label
    pub type_stats: BTreeMap<String, BreakdownStat>,
    /// Keyed by opponent name
    pub opponent_stats: BTreeMap<String, BreakdownStat>,
}

/// Per-opponent summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentSummary {
    pub name: String,
    pub total_matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
    /// Minutes, rounded; 0 when no durations were logged
    pub average_duration: u32,
    /// One decimal; 0 when no set counts were logged
    pub average_sets: f64,
    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub longest_lose_streak: u32,
    /// `"<won>-<lost>"` set score → number of matches
    pub score_patterns: BTreeMap<String, u32>,
    pub first_match_at: DateTime<Utc>,
    pub last_match_at: DateTime<Utc>,
}

/// Summary across all opponents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentListSummary {
    pub total_opponents: u32,
    pub average_win_rate: f64,
    pub best_win_streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentList {
    pub opponents: Vec<OpponentSummary>,
    pub summary: OpponentListSummary,
}

/// Practice vs official split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitStat {
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// Wins and losses decided in a given number of sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetDecisionStat {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub practice: SplitStat,
    pub official: SplitStat,
    pub two_set_matches: SetDecisionStat,
    pub three_set_matches: SetDecisionStat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub win_rate: f64,
}

/// Win-rate trends, ascending by period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub monthly_stats: Vec<TrendPoint>,
    pub yearly_stats: Vec<TrendPoint>,
}

/// Head-to-head detail against one opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentDetail {
    pub opponent: String,
    pub stats: MatchTotals,
    pub match_analysis: MatchAnalysis,
    pub tactics: Vec<String>,
    pub trends: Trends,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_add() {
        let mut stat = BreakdownStat::default();
        stat.add(MatchResult::Win);
        stat.add(MatchResult::Loss);
        stat.add(MatchResult::Win);
        stat.add(MatchResult::Undecided);

        assert_eq!(stat.total, 4);
        assert_eq!(stat.wins, 2);
        assert_eq!(stat.losses, 1);
        assert_eq!(stat.draws, 0);
        assert_eq!(stat.win_rate, 50.0);
    }

    #[test]
    fn test_breakdown_rate_rounds_to_one_decimal() {
        let mut stat = BreakdownStat::default();
        stat.add(MatchResult::Win);
        stat.add(MatchResult::Loss);
        stat.add(MatchResult::Draw);
        assert_eq!(stat.win_rate, 33.3);
    }

    #[test]
    fn test_overview_serializes_flat_totals() {
        let overview = Overview::default();
        let json = serde_json::to_value(&overview).unwrap();

        assert_eq!(json["total_matches"], 0);
        assert_eq!(json["current_streak"], 0);
        assert!(json["monthly_stats"].as_object().unwrap().is_empty());
        assert!(json.get("totals").is_none());
    }
}
