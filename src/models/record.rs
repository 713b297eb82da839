//! Practice and match record model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OpponentId, RecordId, UserId};

/// Outcome of a logged session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    #[serde(alias = "勝ち")]
    Win,
    #[serde(alias = "負け")]
    Loss,
    #[serde(alias = "引き分け")]
    Draw,
    #[serde(alias = "練習のみ")]
    PracticeOnly,
    #[serde(alias = "未定")]
    Undecided,
}

impl MatchResult {
    pub const ALL: [MatchResult; 5] = [
        MatchResult::Win,
        MatchResult::Loss,
        MatchResult::Draw,
        MatchResult::PracticeOnly,
        MatchResult::Undecided,
    ];

    /// Display label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            MatchResult::Win => "勝ち",
            MatchResult::Loss => "負け",
            MatchResult::Draw => "引き分け",
            MatchResult::PracticeOnly => "練習のみ",
            MatchResult::Undecided => "未定",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Loss => "loss",
            MatchResult::Draw => "draw",
            MatchResult::PracticeOnly => "practice_only",
            MatchResult::Undecided => "undecided",
        }
    }
}

/// Kind of note, from the note-type master table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[serde(alias = "練習")]
    Practice,
    #[serde(alias = "ゲーム練習")]
    GamePractice,
    #[serde(alias = "公式戦")]
    OfficialMatch,
}

impl NoteType {
    pub const ALL: [NoteType; 3] = [
        NoteType::Practice,
        NoteType::GamePractice,
        NoteType::OfficialMatch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NoteType::Practice => "練習",
            NoteType::GamePractice => "ゲーム練習",
            NoteType::OfficialMatch => "公式戦",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            NoteType::Practice => "practice",
            NoteType::GamePractice => "game_practice",
            NoteType::OfficialMatch => "official_match",
        }
    }

    /// Game practice and official matches are expected to carry a category,
    /// opponents and set scores.
    pub fn is_match(&self) -> bool {
        matches!(self, NoteType::GamePractice | NoteType::OfficialMatch)
    }

    pub fn is_official(&self) -> bool {
        matches!(self, NoteType::OfficialMatch)
    }
}

/// Singles or doubles format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "シングルス")]
    Singles,
    #[serde(alias = "ダブルス")]
    Doubles,
    #[serde(alias = "ミックスダブルス")]
    MixedDoubles,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Singles, Category::Doubles, Category::MixedDoubles];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Singles => "シングルス",
            Category::Doubles => "ダブルス",
            Category::MixedDoubles => "ミックスダブルス",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Category::Singles => "singles",
            Category::Doubles => "doubles",
            Category::MixedDoubles => "mixed_doubles",
        }
    }
}

/// Error for labels outside the known enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! labelled_enum {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownLabel;

            /// Accepts the display label or the snake_case code.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s || v.code().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownLabel {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

labelled_enum!(MatchResult, "result");
labelled_enum!(NoteType, "note type");
labelled_enum!(Category, "category");

/// One scored game within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSet {
    /// 1-based, sequential within a record
    pub set_number: u32,
    pub my_score: u32,
    pub opponent_score: u32,
}

impl ScoreSet {
    pub fn is_won(&self) -> bool {
        self.my_score > self.opponent_score
    }
}

/// A logged practice session or match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub user_id: UserId,
    pub note_type: NoteType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub memo: Option<String>,
    pub condition: Option<String>,
    pub result: Option<MatchResult>,
    pub category: Option<Category>,

    /// Linked opponents, in the order they were entered
    #[serde(default)]
    pub opponent_ids: Vec<OpponentId>,

    /// Set scores ordered by set number
    #[serde(default)]
    pub score_sets: Vec<ScoreSet>,

    pub total_sets: Option<u32>,
    pub won_sets: Option<u32>,

    /// Match duration in minutes
    pub match_duration: Option<u32>,

    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(user_id: UserId, note_type: NoteType) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::random(),
            user_id,
            note_type,
            title: None,
            content: None,
            memo: None,
            condition: None,
            result: None,
            category: None,
            opponent_ids: Vec::new(),
            score_sets: Vec::new(),
            total_sets: None,
            won_sets: None,
            match_duration: None,
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_result(mut self, result: MatchResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_opponent(mut self, opponent_id: OpponentId) -> Self {
        self.opponent_ids.push(opponent_id);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Replace the score sets from `(my, opponent)` pairs, numbering them
    /// from 1. Total and won set counts are derived unless already present.
    pub fn with_scores(mut self, scores: &[(u32, u32)]) -> Self {
        self.set_scores(scores);
        self
    }

    pub fn set_scores(&mut self, scores: &[(u32, u32)]) {
        self.score_sets = scores
            .iter()
            .enumerate()
            .map(|(i, &(my_score, opponent_score))| ScoreSet {
                set_number: i as u32 + 1,
                my_score,
                opponent_score,
            })
            .collect();

        if !self.score_sets.is_empty() {
            let won = self.score_sets.iter().filter(|s| s.is_won()).count() as u32;
            self.total_sets.get_or_insert(self.score_sets.len() as u32);
            self.won_sets.get_or_insert(won);
        }
    }

    /// Fields a game-practice or official-match note is expected to carry
    /// but doesn't. Empty for plain practice.
    pub fn missing_match_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.note_type.is_match() {
            return missing;
        }
        if self.category.is_none() {
            missing.push("category");
        }
        if self.opponent_ids.is_empty() {
            missing.push("opponents");
        }
        if self.score_sets.is_empty() {
            missing.push("score_sets");
        }
        missing
    }
}

/// The read model every aggregator consumes: a record with a result and its
/// opponent links resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordView {
    pub id: RecordId,
    pub note_type: NoteType,
    pub result: MatchResult,
    pub category: Option<Category>,
    pub opponents: Vec<String>,
    pub score_sets: Vec<ScoreSet>,
    pub total_sets: Option<u32>,
    pub match_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl RecordView {
    /// Build a view from a stored record. Returns `None` for records without
    /// a result; links to unknown opponents are dropped.
    pub fn from_record(
        record: &Record,
        opponent_names: &HashMap<OpponentId, String>,
    ) -> Option<Self> {
        let result = record.result?;
        let opponents = record
            .opponent_ids
            .iter()
            .filter_map(|id| opponent_names.get(id).cloned())
            .collect();

        Some(Self {
            id: record.id.clone(),
            note_type: record.note_type,
            result,
            category: record.category,
            opponents,
            score_sets: record.score_sets.clone(),
            total_sets: record.total_sets,
            match_duration: record.match_duration,
            created_at: record.created_at,
        })
    }

    pub fn sets_won(&self) -> usize {
        self.score_sets.iter().filter(|s| s.is_won()).count()
    }

    pub fn sets_lost(&self) -> usize {
        self.score_sets.len() - self.sets_won()
    }

    /// Number of sets played: the stored total, else the number of set scores.
    pub fn set_count(&self) -> Option<u32> {
        match self.total_sets {
            Some(n) => Some(n),
            None if !self.score_sets.is_empty() => Some(self.score_sets.len() as u32),
            None => None,
        }
    }

    pub fn involves(&self, opponent: &str) -> bool {
        self.opponents.iter().any(|name| name == opponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::parse("alice").unwrap()
    }

    #[test]
    fn test_result_from_label_and_code() {
        assert_eq!("勝ち".parse::<MatchResult>().unwrap(), MatchResult::Win);
        assert_eq!("loss".parse::<MatchResult>().unwrap(), MatchResult::Loss);
        assert_eq!("Practice_Only".parse::<MatchResult>().unwrap(), MatchResult::PracticeOnly);
        assert_eq!(" 未定 ".parse::<MatchResult>().unwrap(), MatchResult::Undecided);

        let err = "勝".parse::<MatchResult>().unwrap_err();
        assert_eq!(err.kind, "result");
    }

    #[test]
    fn test_enum_serde_accepts_labels() {
        let nt: NoteType = serde_json::from_str("\"公式戦\"").unwrap();
        assert_eq!(nt, NoteType::OfficialMatch);
        let cat: Category = serde_json::from_str("\"mixed_doubles\"").unwrap();
        assert_eq!(cat, Category::MixedDoubles);
        assert_eq!(serde_json::to_string(&MatchResult::Draw).unwrap(), "\"draw\"");
        assert!(serde_json::from_str::<MatchResult>("\"victory\"").is_err());
    }

    #[test]
    fn test_note_type_classification() {
        assert!(!NoteType::Practice.is_match());
        assert!(NoteType::GamePractice.is_match());
        assert!(NoteType::OfficialMatch.is_official());
        assert!(!NoteType::GamePractice.is_official());
    }

    #[test]
    fn test_set_scores_numbers_and_derives_totals() {
        let record = Record::new(user(), NoteType::OfficialMatch)
            .with_scores(&[(21, 15), (18, 21), (21, 19)]);

        let numbers: Vec<u32> = record.score_sets.iter().map(|s| s.set_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(record.total_sets, Some(3));
        assert_eq!(record.won_sets, Some(2));
    }

    #[test]
    fn test_set_scores_keeps_explicit_totals() {
        let mut record = Record::new(user(), NoteType::GamePractice);
        record.total_sets = Some(5);
        record.set_scores(&[(21, 10)]);
        assert_eq!(record.total_sets, Some(5));
        assert_eq!(record.won_sets, Some(1));
    }

    #[test]
    fn test_missing_match_fields() {
        let practice = Record::new(user(), NoteType::Practice);
        assert!(practice.missing_match_fields().is_empty());

        let bare = Record::new(user(), NoteType::OfficialMatch);
        assert_eq!(bare.missing_match_fields(), vec!["category", "opponents", "score_sets"]);

        let full = Record::new(user(), NoteType::OfficialMatch)
            .with_category(Category::Singles)
            .with_opponent("opp".into())
            .with_scores(&[(21, 3)]);
        assert!(full.missing_match_fields().is_empty());
    }

    #[test]
    fn test_view_requires_result_and_resolves_names() {
        let mut names = HashMap::new();
        names.insert(OpponentId::from("o1"), "Yamada".to_string());

        let pending = Record::new(user(), NoteType::GamePractice).with_opponent("o1".into());
        assert!(RecordView::from_record(&pending, &names).is_none());

        let done = pending
            .with_result(MatchResult::Win)
            .with_opponent("missing".into())
            .with_scores(&[(21, 15), (21, 18)]);
        let view = RecordView::from_record(&done, &names).unwrap();
        assert_eq!(view.opponents, vec!["Yamada".to_string()]);
        assert_eq!(view.sets_won(), 2);
        assert_eq!(view.sets_lost(), 0);
        assert_eq!(view.set_count(), Some(2));
        assert!(view.involves("Yamada"));
        assert!(!view.involves("yamada"));
    }
}
