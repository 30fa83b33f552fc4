//! Prompt text for the customer-health narrative.

use serde_json::Value as JsonValue;

/// System prompt: fixes the section numbering the document composer relies on.
pub const SYSTEM_PROMPT: &str = "\
You are an expert on a contract management platform. Analyze the customer usage data you are given \
with a precise interpretation of each feature, and answer in numbered sections exactly as follows.

0. Overview
- A short paragraph summarising key metrics, risks and trends, in a positive tone.
- Always start the paragraph with the customer name.

1. Document Management & Compliance
- Master record coverage: master records are the executed, authoritative version of a contract.
- Percentage of reviewed contracts with a master record; flag gaps as compliance risks.
- AI contract summary enablement and AI extract usage.

2. Ownership & Accountability
- Share of live contracts with an internal owner and the impact of unowned contracts.

3. Task Management & Events
- Completion rate, average completion time, overdue events and their impact.

4. Feature Adoption with focus on E-Signatures
- If DocuSign is Disabled but native eSigns are used, the customer prefers the native solution; this is not a negative.
- If DocuSign is Enabled, compare usage across both channels and total them.
- Smart forms, RBAC, saved custom views and auto build adoption.

5. Risk Assessment
- Specific risks: missing master records, unowned contracts, overdue events, low adoption.

6. Actionable Recommendations
- A prioritised list of actions covering compliance, process efficiency, feature adoption, \
user adoption and e-signature strategy.

Use the actual metrics and their business impact. Be consistent: the same data must produce the same analysis. \
Always reply in a friendly, positive way.";

/// User message carrying the record as pretty-printed JSON.
pub fn user_message(payload: &JsonValue) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(payload)?;
    Ok(format!(
        "Analyze this customer's usage data focusing on key metrics and risks:\n{data}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_numbers_every_section() {
        for n in 0..=6 {
            assert!(SYSTEM_PROMPT.contains(&format!("\n{n}. ")), "missing section {n}");
        }
    }

    #[test]
    fn user_message_embeds_pretty_json() {
        let msg = user_message(&serde_json::json!({"customer": "acme", "value": "12.50"})).unwrap();
        assert!(msg.starts_with("Analyze this customer's usage data"));
        assert!(msg.contains("\"value\": \"12.50\""));
    }
}
