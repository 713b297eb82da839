//! User-level overview: totals, streaks and grouped breakdowns.

use std::collections::BTreeMap;

use crate::models::{BreakdownStat, MatchResult, MatchTotals, Overview, RecordView};

use super::{streaks, win_rate_percent};

/// Totals, win rate and streaks for records ordered newest first.
pub fn match_totals(records: &[RecordView]) -> MatchTotals {
    let mut totals = MatchTotals {
        total_matches: records.len() as u32,
        ..Default::default()
    };

    for record in records {
        match record.result {
            MatchResult::Win => totals.wins += 1,
            MatchResult::Loss => totals.losses += 1,
            MatchResult::Draw => totals.draws += 1,
            MatchResult::PracticeOnly | MatchResult::Undecided => {}
        }
    }

    totals.win_rate = win_rate_percent(totals.wins, totals.total_matches);

    let streaks = streaks(records);
    totals.current_streak = streaks.current;
    totals.longest_win_streak = streaks.longest_win;
    totals.longest_lose_streak = streaks.longest_lose;

    totals
}

/// Month key (`YYYY-MM`) of a record's creation time, in UTC.
pub fn month_key(record: &RecordView) -> String {
    record.created_at.format("%Y-%m").to_string()
}

/// Year key (`YYYY`) of a record's creation time, in UTC.
pub fn year_key(record: &RecordView) -> String {
    record.created_at.format("%Y").to_string()
}

/// Group records by a key and count results per group.
pub fn breakdown_by<F>(records: &[RecordView], key: F) -> BTreeMap<String, BreakdownStat>
where
    F: Fn(&RecordView) -> String,
{
    let mut groups: BTreeMap<String, BreakdownStat> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record.result);
    }
    groups
}

/// Full overview for a user's records ordered newest first.
pub fn overview(records: &[RecordView]) -> Overview {
    let mut opponent_stats: BTreeMap<String, BreakdownStat> = BTreeMap::new();
    for record in records {
        for name in &record.opponents {
            opponent_stats.entry(name.clone()).or_default().add(record.result);
        }
    }

    Overview {
        totals: match_totals(records),
        monthly_stats: breakdown_by(records, month_key),
        yearly_stats: breakdown_by(records, year_key),
        type_stats: breakdown_by(records, |r| r.note_type.label().to_string()),
        opponent_stats,
    }
}
