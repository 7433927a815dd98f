//! Fixed persona and prompt templates for the tutoring assistant

/// System persona: an after-school care teacher for elementary students
pub const TUTOR_PERSONA: &str = "너는 초등학생 돌봄선생님이야. 주어진 참고 자료를 바탕으로 정확하고 친근하게 답변해줘. 참고 자료에 없는 내용은 일반적인 지식으로 답변하되, 참고 자료가 있으면 그것을 우선적으로 활용해줘.";

/// Context used when retrieval found nothing ("no reference material")
pub const NO_REFERENCE_SENTINEL: &str = "참고 자료가 없습니다.";

/// Leading marker of every generation-failure reply
pub const APOLOGY_MARKER: &str = "죄송합니다.";

/// User turn combining the reference block and the question
#[must_use]
pub fn build_grounded_prompt(question: &str, context: &str) -> String {
    format!("참고 자료:\n{context}\n\n질문: {question}")
}

/// Reply used when generation fails
#[must_use]
pub fn build_apology(error: &str) -> String {
    format!("{APOLOGY_MARKER} 응답 생성 중 오류가 발생했습니다: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_prompt_layout() {
        assert_eq!(
            build_grounded_prompt("질문이에요", "1. 자료"),
            "참고 자료:\n1. 자료\n\n질문: 질문이에요"
        );
    }

    #[test]
    fn test_apology_embeds_error() {
        let apology = build_apology("timeout");
        assert!(apology.starts_with(APOLOGY_MARKER));
        assert!(apology.ends_with("timeout"));
    }
}
