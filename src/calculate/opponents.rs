//! Opponent summaries and head-to-head detail.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::models::{
    BreakdownStat, MatchAnalysis, MatchResult, OpponentDetail, OpponentList, OpponentListSummary,
    OpponentSummary, RecordView, SetDecisionStat, SplitStat, TrendPoint, Trends,
};

use super::{
    breakdown_by, match_totals, mean, month_key, round1, streaks, win_rate_percent, year_key,
};

/// Default number of opponents returned by a listing.
pub const DEFAULT_OPPONENT_LIMIT: usize = 50;

/// Suggestion emitted when there is no win against an opponent yet.
pub const NO_WIN_SUGGESTION: &str =
    "No wins yet against this opponent. Review the lost sets and try a different game plan.";

/// Filters for an opponent listing.
#[derive(Debug, Clone)]
pub struct OpponentQuery {
    /// Case-insensitive substring of the opponent name
    pub search: Option<String>,
    pub limit: usize,
}

impl Default for OpponentQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: DEFAULT_OPPONENT_LIMIT,
        }
    }
}

/// Collation used for opponent names: case-insensitive first, then by code
/// point so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

struct Accumulator<'a> {
    /// This opponent's records, still newest first
    records: Vec<&'a RecordView>,
    counts: BreakdownStat,
    score_patterns: BTreeMap<String, u32>,
    durations: Vec<u32>,
    set_counts: Vec<u32>,
    first: DateTime<Utc>,
    last: DateTime<Utc>,
}

impl<'a> Accumulator<'a> {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            records: Vec::new(),
            counts: BreakdownStat::default(),
            score_patterns: BTreeMap::new(),
            durations: Vec::new(),
            set_counts: Vec::new(),
            first: at,
            last: at,
        }
    }

    fn add(&mut self, record: &'a RecordView) {
        self.records.push(record);
        self.counts.add(record.result);

        if !record.score_sets.is_empty() {
            let pattern = format!("{}-{}", record.sets_won(), record.sets_lost());
            *self.score_patterns.entry(pattern).or_insert(0) += 1;
        }
        if let Some(minutes) = record.match_duration {
            self.durations.push(minutes);
        }
        if let Some(sets) = record.set_count() {
            self.set_counts.push(sets);
        }

        let at = record.created_at;
        self.first = self.first.min(at);
        self.last = self.last.max(at);
    }

    fn finish(self, name: String) -> OpponentSummary {
        let streaks = streaks(self.records.iter().copied());
        let durations: Vec<f64> = self.durations.iter().map(|d| *d as f64).collect();
        let set_counts: Vec<f64> = self.set_counts.iter().map(|s| *s as f64).collect();

        OpponentSummary {
            name,
            total_matches: self.counts.total,
            wins: self.counts.wins,
            losses: self.counts.losses,
            draws: self.counts.draws,
            win_rate: self.counts.win_rate,
            average_duration: mean(&durations).round() as u32,
            average_sets: round1(mean(&set_counts)),
            current_streak: streaks.current,
            longest_win_streak: streaks.longest_win,
            longest_lose_streak: streaks.longest_lose,
            score_patterns: self.score_patterns,
            first_match_at: self.first,
            last_match_at: self.last,
        }
    }
}

/// One summary per opponent name, sorted by name.
///
/// A record linked to two opponents counts once for each of them.
pub fn opponent_summaries(records: &[RecordView]) -> Vec<OpponentSummary> {
    let mut by_name: HashMap<&str, Accumulator<'_>> = HashMap::new();
    for record in records {
        for name in &record.opponents {
            by_name
                .entry(name.as_str())
                .or_insert_with(|| Accumulator::new(record.created_at))
                .add(record);
        }
    }

    let mut summaries: Vec<OpponentSummary> = by_name
        .into_iter()
        .map(|(name, acc)| acc.finish(name.to_string()))
        .collect();
    summaries.sort_by(|a, b| compare_names(&a.name, &b.name));
    summaries
}

/// Aggregate figures across every opponent.
pub fn summarize_opponents(summaries: &[OpponentSummary]) -> OpponentListSummary {
    let rates: Vec<f64> = summaries.iter().map(|s| s.win_rate).collect();
    OpponentListSummary {
        total_opponents: summaries.len() as u32,
        average_win_rate: round1(mean(&rates)),
        best_win_streak: summaries
            .iter()
            .map(|s| s.longest_win_streak)
            .max()
            .unwrap_or(0),
    }
}

/// Sorted, filtered and truncated opponent listing. The summary block always
/// covers every opponent.
pub fn list_opponents(records: &[RecordView], query: &OpponentQuery) -> OpponentList {
    let all = opponent_summaries(records);
    let summary = summarize_opponents(&all);

    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let opponents = all
        .into_iter()
        .filter(|s| match &needle {
            Some(n) => s.name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .take(query.limit)
        .collect();

    OpponentList { opponents, summary }
}

fn split_stat<'a>(records: impl Iterator<Item = &'a RecordView>) -> SplitStat {
    let mut stat = SplitStat::default();
    for record in records {
        stat.matches += 1;
        match record.result {
            MatchResult::Win => stat.wins += 1,
            MatchResult::Loss => stat.losses += 1,
            _ => {}
        }
    }
    stat.win_rate = win_rate_percent(stat.wins, stat.matches);
    stat
}

/// Practice/official split and set-count analysis.
pub fn match_analysis(records: &[RecordView]) -> MatchAnalysis {
    let mut two_set = SetDecisionStat::default();
    let mut three_set = SetDecisionStat::default();

    for record in records {
        let played = record.score_sets.len();
        let won = record.sets_won();

        if played >= 2 {
            match record.result {
                MatchResult::Win if won == 2 => two_set.wins += 1,
                MatchResult::Loss if won == 0 => two_set.losses += 1,
                _ => {}
            }
        }
        if played >= 3 {
            match record.result {
                MatchResult::Win if won == 2 => three_set.wins += 1,
                MatchResult::Loss if won == 1 => three_set.losses += 1,
                _ => {}
            }
        }
    }

    MatchAnalysis {
        practice: split_stat(records.iter().filter(|r| !r.note_type.is_official())),
        official: split_stat(records.iter().filter(|r| r.note_type.is_official())),
        two_set_matches: two_set,
        three_set_matches: three_set,
    }
}

fn trend_points(groups: BTreeMap<String, BreakdownStat>) -> Vec<TrendPoint> {
    groups
        .into_iter()
        .map(|(period, stat)| TrendPoint {
            period,
            win_rate: stat.win_rate,
        })
        .collect()
}

/// Head-to-head detail from the records played against `opponent`,
/// newest first. `None` when there are no such records.
pub fn opponent_detail(opponent: &str, records: &[RecordView]) -> Option<OpponentDetail> {
    if records.is_empty() {
        return None;
    }

    let stats = match_totals(records);
    let tactics = if stats.wins == 0 {
        vec![NO_WIN_SUGGESTION.to_string()]
    } else {
        Vec::new()
    };

    Some(OpponentDetail {
        opponent: opponent.to_string(),
        match_analysis: match_analysis(records),
        tactics,
        trends: Trends {
            monthly_stats: trend_points(breakdown_by(records, month_key)),
            yearly_stats: trend_points(breakdown_by(records, year_key)),
        },
        stats,
    })
}
