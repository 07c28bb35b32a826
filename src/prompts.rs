//! Instruction templates for the four clause-analysis steps.
//!
//! Placeholders: `{clause_text}` everywhere, `{clause_type}` in the steps
//! that run after classification.

pub const CLASSIFY: &str = r#"Classify the following contract text into a legal clause type (for example Liability, Payment Terms, Indemnification, Governing Law, Scope, Confidentiality, Dispute Resolution, Force Majeure, Intellectual Property, Warranty).
If it does not fit a specific type, answer 'General'.
Answer with the clause type only.

Text: "{clause_text}"
Clause type:"#;

pub const SUMMARIZE: &str = r#"You are a legal assistant. Write a concise bullet-point summary of the following {clause_type} clause, focusing on its main legal implications.

Clause: "{clause_text}"
Summary:"#;

pub const RISK_QUESTIONS: &str = r#"You are a senior legal analyst reviewing a contract. Analyze the following {clause_type} clause for risks, ambiguities and missing details.
Then write three concise, specific questions a lawyer should ask the other party to clarify or negotiate it.

Clause: "{clause_text}"
Questions:"#;

pub const IMPROVEMENTS: &str = r#"You are a senior legal associate. Suggest an improved version of the following {clause_type} clause that is more favorable to a standard commercial client and removes ambiguity. Briefly explain each change.

Clause: "{clause_text}"
Suggested improvements:"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::render_template;
    use std::collections::BTreeMap;

    #[test]
    fn test_templates_render_with_analysis_vars() {
        let mut vars = BTreeMap::new();
        vars.insert("clause_text", "Fees are due monthly.".to_string());
        vars.insert("clause_type", "Payment Terms".to_string());
        for template in [CLASSIFY, SUMMARIZE, RISK_QUESTIONS, IMPROVEMENTS] {
            let out = render_template(template, &vars).unwrap();
            assert!(out.contains("Fees are due monthly."));
            assert!(!out.contains("{clause_"));
        }
    }
}
