//! Heuristic answer-quality rubric.
//!
//! Four 25-point components (length, specificity, certainty, relevance)
//! computed from literal string matches. No model is involved.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Answers shorter than this (after trimming) score zero.
pub const MIN_ANSWER_CHARS: usize = 10;

const SPECIFICITY_WORDS: &[&str] = &[
    "예시", "구체적으로", "예를 들어", "첫째", "둘째", "셋째", "또한", "그러나", "따라서",
    "for example", "for instance", "specifically", "first", "second", "third", "however",
    "therefore",
];

const HEDGE_WORDS: &[&str] = &[
    "모르겠습니다", "확실하지 않습니다", "추측", "아마도", "어쩌면",
    "i don't know", "not sure", "i guess", "probably", "perhaps",
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Good,
    Medium,
    Bad,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            QualityLevel::Good
        } else if score >= 60.0 {
            QualityLevel::Medium
        } else {
            QualityLevel::Bad
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    TooShort,
    LacksExamples,
    Uncertain,
    OffTopic,
}

impl QualityIssue {
    pub fn message(self) -> &'static str {
        match self {
            QualityIssue::TooShort => "답변이 너무 짧습니다",
            QualityIssue::LacksExamples => "구체적인 예시가 부족합니다",
            QualityIssue::Uncertain => "불확실한 표현이 많습니다",
            QualityIssue::OffTopic => "질문과 관련성이 낮습니다",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: f64,
    pub level: QualityLevel,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    fn rejected() -> Self {
        Self {
            score: 0.0,
            level: QualityLevel::Bad,
            issues: vec![QualityIssue::TooShort],
        }
    }
}

fn words(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_RE.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

fn count_present(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|w| haystack.contains(*w)).count()
}

/// Score `answer` against `question` on the 0–100 rubric.
pub fn analyze_answer_quality(answer: &str, question: &str) -> QualityReport {
    if answer.trim().chars().count() < MIN_ANSWER_CHARS {
        return QualityReport::rejected();
    }

    let lower = answer.to_lowercase();

    let length_score = (answer.chars().count() as f64 / 100.0).min(25.0);
    let specificity_score = (count_present(&lower, SPECIFICITY_WORDS) as f64 * 5.0).min(25.0);
    let certainty_score = (25.0 - count_present(&lower, HEDGE_WORDS) as f64 * 5.0).max(0.0);
    let overlap = words(question).intersection(&words(answer)).count();
    let relevance_score = (overlap as f64 * 3.0).min(25.0);

    let mut issues = Vec::new();
    if length_score < 10.0 {
        issues.push(QualityIssue::TooShort);
    }
    if specificity_score < 10.0 {
        issues.push(QualityIssue::LacksExamples);
    }
    if certainty_score < 15.0 {
        issues.push(QualityIssue::Uncertain);
    }
    if relevance_score < 10.0 {
        issues.push(QualityIssue::OffTopic);
    }

    let raw = length_score + specificity_score + certainty_score + relevance_score;
    let score = (raw * 10.0).round() / 10.0;

    QualityReport {
        score,
        level: QualityLevel::from_score(score),
        issues,
    }
}

/// Instruction appended to the improvement prompt for a weak answer.
pub fn improvement_directions(report: &QualityReport) -> String {
    let mut directions = Vec::new();
    if report.score < 60.0 {
        directions.push("더 구체적이고 상세한 답변을 제공하세요");
    }
    if report.issues.contains(&QualityIssue::LacksExamples) {
        directions.push("구체적인 예시를 포함하세요");
    }
    if report.issues.contains(&QualityIssue::Uncertain) {
        directions.push("확실하고 명확한 표현을 사용하세요");
    }

    if directions.is_empty() {
        "답변을 더 정확하고 유용하게 개선하세요".to_string()
    } else {
        directions.join(" ")
    }
}
