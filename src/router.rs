//! Keyword-driven model routing.

use serde::Serialize;

use crate::models::ModelId;

const COMPLEX_KEYWORDS: &[&str] = &[
    "분석", "비교", "평가", "전략", "방안", "해결책", "대안", "장단점", "왜", "어떻게", "어떤",
    "가장", "최적", "효율", "효과", "영향", "관계", "연관", "차이", "유사", "특징", "장점",
    "단점",
];

const SIMPLE_KEYWORDS: &[&str] = &[
    "정의", "설명", "뭐", "무엇", "어디", "언제", "누구", "개념", "의미", "용어", "기본",
    "간단", "요약", "정리",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityKind {
    Basic,
    Medium,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complexity {
    pub score: i32,
    pub kind: ComplexityKind,
    pub complex_keywords: Vec<&'static str>,
    pub simple_keywords: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSelection {
    pub model: ModelId,
    pub reason: &'static str,
    pub complexity: Complexity,
    pub context_length: usize,
}

/// Score a question by keyword hits and length.
pub fn analyze_question_complexity(question: &str) -> Complexity {
    let lower = question.to_lowercase();
    let complex_keywords: Vec<&'static str> = COMPLEX_KEYWORDS
        .iter()
        .copied()
        .filter(|w| lower.contains(w))
        .collect();
    let simple_keywords: Vec<&'static str> = SIMPLE_KEYWORDS
        .iter()
        .copied()
        .filter(|w| lower.contains(w))
        .collect();

    let mut score = 2 * complex_keywords.len() as i32 - simple_keywords.len() as i32;

    let len = question.chars().count();
    if len > 50 {
        score += 1;
    }
    if len > 100 {
        score += 2;
    }

    let kind = if score >= 4 {
        ComplexityKind::Complex
    } else if score >= 2 {
        ComplexityKind::Medium
    } else {
        ComplexityKind::Basic
    };

    Complexity {
        score,
        kind,
        complex_keywords,
        simple_keywords,
    }
}

/// Choose a model for `question` given the size of the retrieved context.
///
/// `prefer_local` swaps the hosted tiers for the locally served GPT-OSS ones.
pub fn select_model(question: &str, context_length: usize, prefer_local: bool) -> ModelSelection {
    let mut complexity = analyze_question_complexity(question);

    if context_length > 5000 {
        complexity.score += 3;
    } else if context_length > 2000 {
        complexity.score += 1;
    }

    let (model, reason) = match (complexity.score, prefer_local) {
        (s, true) if s >= 5 => (ModelId::GptOss120b, "복잡한 분석/전략 질문 - 고성능 로컬 모델"),
        (s, false) if s >= 5 => (ModelId::Gpt4o, "복잡한 분석/전략 질문으로 판단됨"),
        (s, true) if s >= 2 => (ModelId::GptOss20b, "중간 복잡도 질문 - 로컬 모델"),
        (s, false) if s >= 2 => (ModelId::Gpt4oMini, "중간 복잡도 질문으로 판단됨"),
        (_, true) => (ModelId::GptOss20b, "기본 질문 - 로컬 모델"),
        (_, false) => (ModelId::Gpt35Turbo, "기본 질문으로 판단됨"),
    };

    ModelSelection {
        model,
        reason,
        complexity,
        context_length,
    }
}
