//! Win/loss streaks.

use crate::models::{MatchResult, RecordView};

/// Current and longest runs over a result sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub current: i32,
    pub longest_win: u32,
    pub longest_lose: u32,
}

/// Signed run length starting at the most recent result.
///
/// Positive for consecutive wins, negative for consecutive losses. The walk
/// stops at the first result that is not a win or loss, or that flips the
/// sign; whatever accumulated so far is returned.
pub fn current_streak<I>(newest_first: I) -> i32
where
    I: IntoIterator<Item = MatchResult>,
{
    let mut streak = 0i32;
    for result in newest_first {
        match result {
            MatchResult::Win if streak >= 0 => streak += 1,
            MatchResult::Loss if streak <= 0 => streak -= 1,
            _ => break,
        }
    }
    streak
}

/// Longest consecutive wins and longest consecutive losses, in that order.
pub fn longest_streaks<I>(results: I) -> (u32, u32)
where
    I: IntoIterator<Item = MatchResult>,
{
    let (mut win_run, mut lose_run) = (0u32, 0u32);
    let (mut longest_win, mut longest_lose) = (0u32, 0u32);

    for result in results {
        if result == MatchResult::Win {
            win_run += 1;
            longest_win = longest_win.max(win_run);
        } else {
            win_run = 0;
        }

        if result == MatchResult::Loss {
            lose_run += 1;
            longest_lose = longest_lose.max(lose_run);
        } else {
            lose_run = 0;
        }
    }

    (longest_win, longest_lose)
}

/// All streak figures for records ordered newest first.
pub fn streaks<'a, I>(records: I) -> Streaks
where
    I: IntoIterator<Item = &'a RecordView>,
    I::IntoIter: Clone,
{
    let iter = records.into_iter();
    let current = current_streak(iter.clone().map(|r| r.result));
    let (longest_win, longest_lose) = longest_streaks(iter.map(|r| r.result));
    Streaks {
        current,
        longest_win,
        longest_lose,
    }
}
