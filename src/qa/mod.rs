pub mod prompts;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{classify_topic, improve_math_readability, sentiment_and_tone, ToneReport};
use crate::docs::context::select_context;
use crate::llm::{LlmClient, LlmError, Sampling};
use crate::models::ModelId;
use crate::quality::{analyze_answer_quality, improvement_directions, QualityReport};
use crate::router::{select_model, ModelSelection};
use crate::session::{HistoryEntry, Role, Session};

/// First and second stage of hierarchical answering.
pub const BASIC_MODEL: ModelId = ModelId::Gpt35Turbo;
pub const PREMIUM_MODEL: ModelId = ModelId::Gpt4o;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QaError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("upload a PDF first or enable general mode")]
    NoDocument,
    #[error("no models selected")]
    NoModels,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// One model chosen by question complexity.
    #[default]
    Auto,
    /// Every model in [`AskRequest::models`].
    Manual,
    /// Basic tier then premium tier.
    Hierarchical,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub mode: AnswerMode,
    #[serde(default)]
    pub models: Vec<ModelId>,
}

impl AskRequest {
    pub fn auto(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            mode: AnswerMode::Auto,
            models: Vec::new(),
        }
    }
}

/// One model's answer with its quality report.
///
/// Failed calls are kept: `text` then holds the rendered error and the
/// answer is scored like any other.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredAnswer {
    pub model: ModelId,
    pub text: String,
    /// `text` with LaTeX turned into readable words.
    pub display_text: String,
    pub ok: bool,
    pub error: Option<String>,
    pub quality: QualityReport,
    pub tone: ToneReport,
}

impl ScoredAnswer {
    pub fn new(model: ModelId, result: Result<String, LlmError>, question: &str) -> Self {
        let (text, error) = match result {
            Ok(text) => (text, None),
            Err(e) => {
                let rendered = e.render();
                (rendered.clone(), Some(rendered))
            }
        };

        Self {
            model,
            display_text: improve_math_readability(&text),
            ok: error.is_none(),
            error,
            quality: analyze_answer_quality(&text, question),
            tone: sentiment_and_tone(&text),
            text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QaResponse {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub final_answer: ScoredAnswer,
}

pub struct QaEngine {
    llm: Arc<LlmClient>,
}

impl QaEngine {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn ask(&self, session: &mut Session, request: AskRequest) -> Result<QaResponse, QaError> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(QaError::EmptyQuestion);
        }

        let config = session.config.clone();
        let active = session.documents.active();
        if active.is_none() && config.rag_enabled && !config.general_mode {
            return Err(QaError::NoDocument);
        }

        let pdf_context = match active {
            Some(doc) if config.rag_enabled => select_context(&question, &doc.chunks),
            _ => String::new(),
        };
        let conversation = session.conversation_context();
        let context = prompts::combined_context(&conversation, &pdf_context, config.general_mode);

        let context_chars = context.chars().count();
        let (models, selection) = match request.mode {
            AnswerMode::Auto => {
                let selection = select_model(&question, context_chars, config.prefer_local);
                info!(
                    model = %selection.model,
                    score = selection.complexity.score,
                    reason = selection.reason,
                    "model routed"
                );
                (vec![selection.model], Some(selection))
            }
            AnswerMode::Manual if request.models.is_empty() => return Err(QaError::NoModels),
            AnswerMode::Manual => (request.models.clone(), None),
            AnswerMode::Hierarchical => (vec![BASIC_MODEL, PREMIUM_MODEL], None),
        };

        let prompt = prompts::answer_prompt(&question, &context);
        debug!(context_chars, prompt_len = prompt.len(), models = models.len(), "answering");

        let mut answers = Vec::with_capacity(models.len());
        for model in models {
            let answer = ScoredAnswer::new(model, self.llm.complete(model, &prompt).await, &question);
            if let Some(error) = &answer.error {
                warn!(model = %model, "model call failed: {error}");
            }
            answers.push(answer);
        }

        let improved = if config.auto_improve {
            self.improve(&question, &context, &answers, config.quality_threshold, config.improvement_model)
                .await
        } else {
            None
        };

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            topic: classify_topic(&question),
            question: question.clone(),
            answers,
            improved,
            selection,
            context,
            timestamp: Utc::now(),
        };
        let Some(final_answer) = entry.final_answer().cloned() else {
            return Err(QaError::NoModels);
        };

        info!(
            session = %session.id,
            model = %final_answer.model,
            score = final_answer.quality.score,
            improved = entry.improved.is_some(),
            "question answered"
        );

        session.remember(Role::User, question);
        session.remember(Role::Assistant, final_answer.text.clone());
        session.history.push(entry.clone());

        Ok(QaResponse { entry, final_answer })
    }

    /// Rewrite the best answer with `model` when it scored under `threshold`.
    async fn improve(
        &self,
        question: &str,
        context: &str,
        answers: &[ScoredAnswer],
        threshold: f64,
        model: ModelId,
    ) -> Option<ScoredAnswer> {
        let best = answers
            .iter()
            .max_by(|a, b| a.quality.score.total_cmp(&b.quality.score))?;
        if best.quality.score >= threshold {
            return None;
        }

        let directions = improvement_directions(&best.quality);
        info!(from = %best.model, to = %model, score = best.quality.score, threshold, "improving answer");
        let prompt = prompts::improvement_prompt(question, context, &best.text, &directions);
        let improved = self.llm.complete_with(model, &prompt, Sampling::IMPROVE).await;
        Some(ScoredAnswer::new(model, improved, question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::docs::types::{Chunk, PdfDocument};
    use crate::state::PipelineConfig;

    fn engine() -> QaEngine {
        QaEngine::new(Arc::new(LlmClient::new(&Settings::default()).unwrap()))
    }

    fn session(config: PipelineConfig) -> Session {
        Session::new("test".into(), config)
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let mut s = session(PipelineConfig::default());
        let err = engine().ask(&mut s, AskRequest::auto("   ")).await.unwrap_err();
        assert_eq!(err, QaError::EmptyQuestion);
    }

    #[tokio::test]
    async fn document_required_unless_general_mode() {
        let mut s = session(PipelineConfig::default());
        let err = engine().ask(&mut s, AskRequest::auto("무엇인가요?")).await.unwrap_err();
        assert_eq!(err, QaError::NoDocument);
        assert!(s.history.is_empty());
    }

    #[tokio::test]
    async fn manual_mode_needs_models() {
        let mut s = session(PipelineConfig {
            general_mode: true,
            ..PipelineConfig::default()
        });
        let request = AskRequest {
            question: "hi".into(),
            mode: AnswerMode::Manual,
            models: vec![],
        };
        assert_eq!(engine().ask(&mut s, request).await.unwrap_err(), QaError::NoModels);
    }

    #[tokio::test]
    async fn missing_keys_become_inline_errors() {
        let mut s = session(PipelineConfig {
            general_mode: true,
            auto_improve: false,
            ..PipelineConfig::default()
        });
        let request = AskRequest {
            question: "정의를 설명해주세요".into(),
            mode: AnswerMode::Hierarchical,
            models: vec![],
        };
        let response = engine().ask(&mut s, request).await.unwrap();

        assert_eq!(response.entry.answers.len(), 2);
        assert_eq!(response.entry.answers[0].model, BASIC_MODEL);
        assert_eq!(response.entry.answers[1].model, PREMIUM_MODEL);
        assert!(response.entry.answers.iter().all(|a| !a.ok && a.text.starts_with("⚠️ Error")));
        assert!(response.entry.improved.is_none());
        assert!(response.entry.selection.is_none());

        assert_eq!(s.history.len(), 1);
        assert_eq!(s.conversation.len(), 2);
        assert_eq!(s.conversation[0].message, "정의를 설명해주세요");
    }

    #[tokio::test]
    async fn weak_answer_triggers_improvement() {
        let mut s = session(PipelineConfig {
            general_mode: true,
            ..PipelineConfig::default()
        });
        let response = engine().ask(&mut s, AskRequest::auto("정의를 설명해주세요")).await.unwrap();

        let selection = response.entry.selection.as_ref().unwrap();
        assert_eq!(selection.model, ModelId::Gpt35Turbo);
        let improved = response.entry.improved.as_ref().unwrap();
        assert_eq!(improved.model, ModelId::Gpt4o);
        assert_eq!(response.final_answer.model, ModelId::Gpt4o);
        assert_eq!(s.stats().improved_count, 1);
    }

    #[tokio::test]
    async fn active_document_feeds_context() {
        let mut s = session(PipelineConfig {
            auto_improve: false,
            ..PipelineConfig::default()
        });
        s.documents.add(PdfDocument {
            id: "d".into(),
            name: "d.pdf".into(),
            size: 1,
            text: "rust ownership rules".into(),
            chunks: vec![Chunk {
                index: 0,
                text: "rust ownership rules".into(),
                embedding: vec![],
            }],
            top_keywords: vec![],
            ingested_at: 0,
        });

        let response = engine().ask(&mut s, AskRequest::auto("what is ownership")).await.unwrap();
        assert_eq!(response.entry.context, "rust ownership rules");

        // second question sees the first exchange
        let response = engine().ask(&mut s, AskRequest::auto("and borrowing")).await.unwrap();
        assert!(response.entry.context.starts_with("이전 대화:\n사용자: what is ownership"));
        assert!(response.entry.context.ends_with("PDF 내용:\nrust ownership rules"));
    }
}
