use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which upstream API serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    Local,
}

impl Provider {
    pub fn label(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Google => "Google",
            Provider::Local => "Local",
        }
    }
}

/// Every model the assistant can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "claude-3-5-sonnet")]
    Claude35Sonnet,
    #[serde(rename = "gemini-pro")]
    GeminiPro,
    #[serde(rename = "gpt-oss-20b")]
    GptOss20b,
    #[serde(rename = "gpt-oss-120b")]
    GptOss120b,
}

impl ModelId {
    pub const ALL: [ModelId; 7] = [
        ModelId::Gpt35Turbo,
        ModelId::Gpt4oMini,
        ModelId::Gpt4o,
        ModelId::Claude35Sonnet,
        ModelId::GeminiPro,
        ModelId::GptOss20b,
        ModelId::GptOss120b,
    ];

    pub fn as_str(self) -> &'static str {
        self.descriptor().id
    }

    pub fn provider(self) -> Provider {
        self.descriptor().provider
    }

    pub fn descriptor(self) -> &'static ModelDescriptor {
        MODELS
            .iter()
            .find(|d| d.model == self)
            .unwrap_or(&MODELS[0])
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model identifier: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MODELS
            .iter()
            .find(|d| d.id.eq_ignore_ascii_case(wanted))
            .map(|d| d.model)
            .ok_or_else(|| UnknownModel(wanted.to_string()))
    }
}

/// Static description of a model, shown in the model picker.
#[derive(Debug, Serialize)]
pub struct ModelDescriptor {
    pub model: ModelId,
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub best_for: &'static [&'static str],
    pub provider: Provider,
    /// Model name sent on the wire.
    pub upstream: &'static str,
    pub local: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_required: Option<&'static str>,
}

pub static MODELS: [ModelDescriptor; 7] = [
    ModelDescriptor {
        model: ModelId::Gpt35Turbo,
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        description: "빠르고 경제적인 기본 모델",
        best_for: &["간단한 설명", "정의", "기본 질문"],
        provider: Provider::OpenAi,
        upstream: "gpt-3.5-turbo",
        local: false,
        hardware_required: None,
    },
    ModelDescriptor {
        model: ModelId::Gpt4oMini,
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        description: "균형잡힌 성능과 비용",
        best_for: &["요약", "분석", "중간 복잡도 질문"],
        provider: Provider::OpenAi,
        upstream: "gpt-4o-mini",
        local: false,
        hardware_required: None,
    },
    ModelDescriptor {
        model: ModelId::Gpt4o,
        id: "gpt-4o",
        name: "GPT-4o",
        description: "최고 품질의 고급 모델",
        best_for: &["복잡한 분석", "전략", "창의적 작업"],
        provider: Provider::OpenAi,
        upstream: "gpt-4o",
        local: false,
        hardware_required: None,
    },
    ModelDescriptor {
        model: ModelId::Claude35Sonnet,
        id: "claude-3-5-sonnet",
        name: "Claude 3.5 Sonnet",
        description: "Anthropic의 최신 모델",
        best_for: &["창의적 글쓰기", "코드 생성", "상세한 분석"],
        provider: Provider::Anthropic,
        upstream: "claude-3-5-sonnet-20241022",
        local: false,
        hardware_required: None,
    },
    ModelDescriptor {
        model: ModelId::GeminiPro,
        id: "gemini-pro",
        name: "Gemini Pro",
        description: "Google의 고성능 모델",
        best_for: &["다양한 작업", "멀티모달", "실시간 정보"],
        provider: Provider::Google,
        upstream: "gemini-pro",
        local: false,
        hardware_required: None,
    },
    ModelDescriptor {
        model: ModelId::GptOss20b,
        id: "gpt-oss-20b",
        name: "GPT-OSS-20B (로컬)",
        description: "o3-mini 수준 성능, 무료 로컬 실행",
        best_for: &["일반 분석", "에지 디바이스", "빠른 반복"],
        provider: Provider::Local,
        upstream: "gpt-oss-20b",
        local: true,
        hardware_required: Some("16GB RAM"),
    },
    ModelDescriptor {
        model: ModelId::GptOss120b,
        id: "gpt-oss-120b",
        name: "GPT-OSS-120B (로컬)",
        description: "o4-mini 수준 성능, 무료 로컬 실행",
        best_for: &["복잡한 추론", "도구 사용", "고품질 분석"],
        provider: Provider::Local,
        upstream: "gpt-oss-120b",
        local: true,
        hardware_required: Some("80GB GPU"),
    },
];
