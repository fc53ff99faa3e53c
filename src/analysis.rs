//! Lightweight text helpers used around answers and uploaded documents.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const STOP_WORDS: &[&str] = &[
    "이", "그", "저", "것", "수", "등", "때", "곳", "말", "일", "뿐", "뒤", "앞", "밖", "안",
    "속", "사이", "중", "위", "아래", "왼쪽", "오른쪽", "가운데", "옆", "반대", "같은", "다른",
    "모든", "어떤", "무슨", "어느", "몇", "얼마", "언제", "어디", "어떻게", "왜", "무엇", "누구",
    "the", "and", "for", "are", "was", "with", "that", "this", "from", "have", "has", "not",
];

const POSITIVE_WORDS: &[&str] = &["좋은", "훌륭한", "멋진", "유용한", "효과적인", "성공적인"];
const NEGATIVE_WORDS: &[&str] = &["나쁜", "문제", "실패", "어려운", "복잡한", "불편한"];

const TOPICS: &[(&str, &[&str])] = &[
    ("기술", &["프로그래밍", "코드", "알고리즘", "데이터베이스", "api", "개발"]),
    ("비즈니스", &["경영", "전략", "마케팅", "수익", "고객", "서비스"]),
    ("교육", &["학습", "교육", "강의", "과정", "지식", "이해"]),
    ("의료", &["진단", "치료", "증상", "의학", "건강", "병원"]),
    ("법률", &["법률", "계약", "소송", "권리", "의무", "규정"]),
];

pub const GENERAL_TOPIC: &str = "일반";

static MATH_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\\frac\{([^}]+)\}\{([^}]+)\}", "분수($1/$2)"),
        (r"\\sqrt\{([^}]+)\}", "제곱근($1)"),
        (r"\\sum_\{([^}]+)\}", "합계($1)"),
        (r"\\int_\{([^}]+)\}", "적분($1)"),
        (r"\\alpha", "알파"),
        (r"\\beta", "베타"),
        (r"\\gamma", "감마"),
        (r"\\delta", "델타"),
        (r"\\epsilon", "엡실론"),
        (r"\\theta", "세타"),
        (r"\\lambda", "람다"),
        (r"\\mu", "뮤"),
        (r"\\pi", "파이"),
        (r"\\sigma", "시그마"),
        (r"\\phi", "파이"),
        (r"\\omega", "오메가"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("static regex"), replacement))
    .collect()
});

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static regex"));

/// Replace common LaTeX fragments with readable words.
pub fn improve_math_readability(text: &str) -> String {
    MATH_RULES
        .iter()
        .fold(text.to_string(), |acc, (re, rep)| re.replace_all(&acc, *rep).into_owned())
}

/// Most frequent words of `text`, stop words and single characters removed.
/// Ties keep first-appearance order.
pub fn keyword_frequencies(text: &str, top_n: usize) -> Vec<(String, usize)> {
    let cleaned = NON_WORD.replace_all(text, " ");
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, word) in cleaned.split_whitespace().enumerate() {
        if word.chars().count() <= 1 || STOP_WORDS.contains(&word.to_lowercase().as_str()) {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(word, (count, _))| (word.to_string(), count))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToneReport {
    pub sentiment: Sentiment,
    pub tone: &'static str,
    pub positive_score: usize,
    pub negative_score: usize,
}

pub fn sentiment_and_tone(text: &str) -> ToneReport {
    let positive_score = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count();
    let negative_score = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count();

    let (sentiment, tone) = match positive_score.cmp(&negative_score) {
        std::cmp::Ordering::Greater => (Sentiment::Positive, "친근하고 격려적"),
        std::cmp::Ordering::Less => (Sentiment::Negative, "우려스럽고 경계적"),
        std::cmp::Ordering::Equal => (Sentiment::Neutral, "객관적이고 균형잡힌"),
    };

    ToneReport {
        sentiment,
        tone,
        positive_score,
        negative_score,
    }
}

/// Bucket `text` into a coarse topic, or [`GENERAL_TOPIC`] when nothing matches.
pub fn classify_topic(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let mut best = (GENERAL_TOPIC, 0usize);
    for &(topic, keywords) in TOPICS {
        let score = keywords.iter().filter(|k| lower.contains(*k)).count();
        if score > best.1 {
            best = (topic, score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latex_becomes_words() {
        assert_eq!(improve_math_readability(r"\frac{a}{b} + \sqrt{x}"), "분수(a/b) + 제곱근(x)");
        assert_eq!(improve_math_readability(r"\alpha and \theta"), "알파 and 세타");
        assert_eq!(improve_math_readability("no math here"), "no math here");
    }

    #[test]
    fn keywords_rank_by_count_then_position() {
        let top = keyword_frequencies("rust, rust! tokio axum tokio rust a the", 3);
        assert_eq!(
            top,
            vec![
                ("rust".to_string(), 3),
                ("tokio".to_string(), 2),
                ("axum".to_string(), 1)
            ]
        );
    }

    #[test]
    fn keywords_skip_korean_stop_words() {
        let top = keyword_frequencies("그 문서 그 문서 어떻게 분석", 5);
        assert_eq!(top, vec![("문서".to_string(), 2), ("분석".to_string(), 1)]);
    }

    #[test]
    fn sentiment_compares_counts() {
        assert_eq!(sentiment_and_tone("훌륭한 결과와 유용한 정보").sentiment, Sentiment::Positive);
        assert_eq!(sentiment_and_tone("문제와 실패").sentiment, Sentiment::Negative);
        assert_eq!(sentiment_and_tone("plain").sentiment, Sentiment::Neutral);
    }

    #[test]
    fn topic_picks_best_bucket() {
        assert_eq!(classify_topic("고객 서비스 전략을 알려줘"), "비즈니스");
        assert_eq!(classify_topic("API 코드 예시"), "기술");
        assert_eq!(classify_topic("오늘 날씨"), GENERAL_TOPIC);
    }
}
