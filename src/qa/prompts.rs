/// Prompt for a first answer. Without context the question is sent as is.
pub fn answer_prompt(question: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return question.to_string();
    }
    format!(
        "다음 정보를 참고하여 질문에 답변하세요.\n\n참고 정보:\n{context}\n\n질문: {question}\n\n답변:"
    )
}

/// Prompt asking a stronger model to rewrite a weak answer.
pub fn improvement_prompt(question: &str, context: &str, answer: &str, directions: &str) -> String {
    format!(
        "다음 답변을 개선해주세요. 개선 방향: {directions}\n\n원본 질문: {question}\n컨텍스트: {context}\n현재 답변: {answer}\n\n개선된 답변:"
    )
}

/// Join conversation memory and document context into one block.
pub fn combined_context(conversation: &str, pdf: &str, general_mode: bool) -> String {
    if general_mode {
        return conversation.to_string();
    }
    if conversation.is_empty() {
        pdf.to_string()
    } else {
        format!("이전 대화:\n{conversation}\n\nPDF 내용:\n{pdf}")
    }
}
