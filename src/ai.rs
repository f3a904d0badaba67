use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use tracing::info;

/// Instruction sent with every cleaning request. The model rewrites raw PDF
/// text into the tagged format the importer consumes.
pub const CLEANING_INSTRUCTION: &str = "\
You are preparing the raw text of a statute for structured import. \
Reproduce the statute faithfully, but annotate its structure with directive \
lines, each on its own line: '@PART <heading>' before each part, \
'@CHAPTER <heading>' before each chapter, '@SECTION <number>' before each \
section, '@TITLE <title>' immediately after a section/schedule/appendix \
directive when it has a title, '@SCHEDULE <number>' before each schedule, \
and '@APPENDIX <number>' before each appendix. Keep body text verbatim. \
Remove page headers, footers, and page numbers. Output only the tagged text.";

/// External text-cleaning collaborator: given a system instruction and raw
/// text, return cleaned tagged text.
pub trait TextCleaner {
    fn clean(&self, system_instruction: &str, raw_text: &str) -> Result<String>;
}

/// Gemini-backed cleaner using the blocking `generateContent` endpoint.
pub struct GeminiCleaner {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl GeminiCleaner {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model,
        }
    }
}

impl TextCleaner for GeminiCleaner {
    fn clean(&self, system_instruction: &str, raw_text: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = request_body(system_instruction, raw_text);

        info!(model = %self.model, chars = raw_text.len(), "requesting AI text cleaning");
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .context("AI cleaning request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("AI service returned {status}: {body}");
        }

        let payload: Value = response
            .json()
            .context("failed to parse AI cleaning response")?;
        extract_candidate_text(&payload)
    }
}

fn request_body(system_instruction: &str, raw_text: &str) -> Value {
    json!({
        "system_instruction": { "parts": [{ "text": system_instruction }] },
        "contents": [{ "parts": [{ "text": raw_text }] }],
    })
}

fn extract_candidate_text(payload: &Value) -> Result<String> {
    payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(ToOwned::to_owned)
        .context("AI cleaning response contained no candidate text")
}
