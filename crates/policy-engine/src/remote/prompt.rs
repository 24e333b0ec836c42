//! Analysis prompt sent to the model
//!
//! The policy text is cut to the configured number of characters and
//! appended to the instructions.

use crate::patterns::truncate_chars;

const INSTRUCTIONS: &str = r#"You are a privacy law expert. Analyze the following privacy policy text and identify potential privacy concerns.

Return a JSON response with this exact structure (ensure valid JSON format):

{
  "issues": [
    {
      "id": "unique_id",
      "severity": "high|medium|low",
      "category": "Data Sharing|Data Retention|Tracking|Security|User Rights|Policy Changes",
      "title": "Brief title",
      "description": "What the issue is",
      "legalSuggestion": "What users should know or do",
      "matchedText": "The relevant text from the policy, quoted exactly",
      "context": "Surrounding context"
    }
  ],
  "summary": "Brief summary of the analysis",
  "recommendations": ["List of recommendations for users"]
}

Focus on identifying:
- Data sharing with third parties
- Indefinite data retention
- Extensive tracking and monitoring
- Vague security measures
- Limited user rights
- Unilateral policy changes

Privacy policy text to analyze:
"#;

/// Prompt for one analysis, with the policy text cut to `max_input_chars`
pub fn build_prompt(text: &str, max_input_chars: usize) -> String {
    let body = truncate_chars(text, max_input_chars);
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + body.len());
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(body);
    prompt
}
