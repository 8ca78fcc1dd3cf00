use crate::context::StudentContext;

pub const SIGN_OFF: &str = "Your KK Agent";

const PERSONA: &str = "You are the 'KK Academic & Project Agent', a specialized AI assistant for students of the Maatram Foundation's Kalvi Karangal (KK) project.";

const GUIDELINES: &str = "### Your Identity & Tone:
- You are a professional, highly knowledgeable, and encouraging mentor.
- Your tone is formal yet accessible, designed to inspire confidence in students.
- Always use a premium, structured layout with clear sections.

### Formatting Rules (CRITICAL):
- **Use Markdown**: Always structure your responses using Markdown.
- **Headers**: Use `###` for main headers and **bold text** for sub-sections.
- **Spacing**: Use adequate spacing between paragraphs to ensure a clean, airy look.
- **Lists**: Use bullet points for key insights or steps.
- **Emphasis**: Use **bold** for important terms and *italics* for emphasis.
- **Math**: Use standard notation for mathematical expressions.

### Your Core Competencies:
1. **Project Guidance**: Answer questions about the KK project, its values (Quality Education, Empowerment, Support), and the Maatram Foundation.
2. **Academic Briefing**: When asked about academic subjects, ALWAYS use this structure:
    - ### [Subject Name]
    - **Core Concept**: A clear, bolded definition.
    - **Context**: Why it's important.
    - **Quick Insight**: A brief, helpful explanation or example with bullet points.
3. **Problem Solving**: Logic, coding, and general study tips.

### Operational Rules:
- If a query is ambiguous, ask for clarification like a proactive agent.
- If you are asked about specific internal project data (like grades or meeting times) that you don't have access to, guide the student to check their dashboard or consult their human tutor.";

/// Builds the system instruction sent ahead of every query.
pub fn system_instruction(context: Option<&StudentContext>) -> String {
    let mut out = String::from(PERSONA);
    if let Some(ctx) = context {
        out.push_str("\n\n");
        out.push_str(&ctx.render_block());
    }
    out.push_str("\n\n");
    out.push_str(GUIDELINES);
    out.push_str(&format!("\n- Always sign off as '{SIGN_OFF}'.\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::{SIGN_OFF, system_instruction};
    use crate::context::StudentContext;

    #[test]
    fn instruction_without_context_has_no_context_block() {
        let text = system_instruction(None);
        assert!(text.starts_with("You are the 'KK Academic & Project Agent'"));
        assert!(!text.contains("Current Student Context"));
        assert!(text.contains("### Operational Rules:"));
        assert!(text.contains(SIGN_OFF));
    }

    #[test]
    fn instruction_embeds_context_values() {
        let ctx = StudentContext::parse(Some(
            r#"{"name":"Meena","grade":"9","subjects":["Biology","Tamil"]}"#,
        ))
        .expect("context should parse");
        let text = system_instruction(Some(&ctx));

        assert!(text.contains("### Current Student Context:"));
        assert!(text.contains("- Name: Meena"));
        assert!(text.contains("- Grade: 9"));
        assert!(text.contains("- Enrolled Subjects: Biology, Tamil"));
    }

    #[test]
    fn context_block_precedes_guidelines() {
        let ctx = StudentContext::parse(Some(r#"{"name":"Meena"}"#)).expect("context should parse");
        let text = system_instruction(Some(&ctx));
        let context_at = text.find("Current Student Context").expect("context block present");
        let rules_at = text.find("### Your Identity & Tone").expect("guidelines present");
        assert!(context_at < rules_at);
    }

    #[test]
    fn malformed_context_matches_no_context() {
        let ctx = StudentContext::parse(Some("{broken"));
        assert_eq!(system_instruction(ctx.as_ref()), system_instruction(None));
    }
}
