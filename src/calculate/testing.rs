//! Record view fixtures for tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Category, MatchResult, NoteType, RecordId, RecordView, ScoreSet};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// A singles official match with the given result and set scores.
pub fn view(
    result: MatchResult,
    opponents: &[&str],
    scores: &[(u32, u32)],
    created_at: DateTime<Utc>,
) -> RecordView {
    RecordView {
        id: RecordId::random(),
        note_type: NoteType::OfficialMatch,
        result,
        category: Some(if opponents.len() > 1 {
            Category::Doubles
        } else {
            Category::Singles
        }),
        opponents: opponents.iter().map(|s| s.to_string()).collect(),
        score_sets: scores
            .iter()
            .enumerate()
            .map(|(i, &(my_score, opponent_score))| ScoreSet {
                set_number: i as u32 + 1,
                my_score,
                opponent_score,
            })
            .collect(),
        total_sets: None,
        match_duration: None,
        created_at,
    }
}

/// Views with only a result, one day apart, newest first.
pub fn results(results: &[MatchResult]) -> Vec<RecordView> {
    let newest = at(2025, 6, 30);
    results
        .iter()
        .enumerate()
        .map(|(i, r)| view(*r, &[], &[], newest - chrono::Duration::days(i as i64)))
        .collect()
}
