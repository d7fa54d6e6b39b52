//! Prompt library: reusable system prompts stored as JSON files.
//!
//! Each `*.json` file in the library directory holds one [`PromptDefinition`].
//! Files are loaded in file-name order; files that cannot be read or parsed
//! are skipped with a warning.
//!
//! ```json
//! {
//!   "prompt_id": "code_review",
//!   "name": "Code review",
//!   "role": "You are a senior reviewer.",
//!   "context": "The user pastes a diff.",
//!   "structure": {
//!     "output_format": "Markdown report",
//!     "components": [{ "name": "Summary", "description": "one paragraph" }]
//!   },
//!   "format": { "length": "Under 400 words", "requirements": ["Cite line numbers"] },
//!   "test_input": "fn main() { let x = 1; }"
//! }
//! ```

use std::path::{Path, PathBuf};

use pipeline::{CatalogError, Completion, CompletionRequest, LlmError, LlmProvider, Message, PromptId};
use serde::Deserialize;

/// Temperature used when the operator's value is out of range.
pub const DEFAULT_PROMPT_TEMPERATURE: f32 = 0.7;

/// Completion cap used when the operator gives none.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

const MARKDOWN_INSTRUCTION: &str = "\nIMPORTANT: Answer as readable text formatted with Markdown \
(headings #, ##, lists -, **bold text**). Do NOT answer in JSON format!";

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// One section the answer must contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptComponent {
    pub name: String,
    pub description: String,
}

/// Shape of the expected answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptStructure {
    pub output_format: Option<String>,
    pub components: Vec<PromptComponent>,
}

/// Formatting requirements, rendered as a bullet list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptFormat {
    pub structure: Option<String>,
    pub length: Option<String>,
    pub style: Option<String>,
    pub requirements: Vec<String>,
}

/// A prompt definition as stored on disk. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptDefinition {
    pub prompt_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub role: Option<String>,
    pub context: Option<String>,
    pub structure: Option<PromptStructure>,
    pub format: Option<PromptFormat>,
    pub test_input: Option<String>,
}

impl PromptDefinition {
    /// Display name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled")
    }

    /// Builds the system message sent ahead of the operator's question.
    pub fn system_message(&self) -> String {
        let mut parts = Vec::new();

        if let Some(role) = &self.role {
            parts.push(role.clone());
        }
        if let Some(context) = &self.context {
            parts.push(format!("\nCONTEXT: {context}"));
        }
        if let Some(structure) = &self.structure {
            parts.push("\nRESPONSE FORMAT:".to_string());
            if let Some(output_format) = &structure.output_format {
                parts.push(format!("Format: {output_format}"));
            }
            if !structure.components.is_empty() {
                parts.push("\nThe answer must contain the following sections:".to_string());
                parts.extend(
                    structure
                        .components
                        .iter()
                        .map(|c| format!("- {}: {}", c.name, c.description)),
                );
            }
        }
        if let Some(format) = &self.format {
            parts.push("\nREQUIREMENTS:".to_string());
            let singles = [&format.structure, &format.length, &format.style];
            parts.extend(singles.into_iter().flatten().map(|item| format!("- {item}")));
            parts.extend(format.requirements.iter().map(|item| format!("- {item}")));
        }
        parts.push(MARKDOWN_INSTRUCTION.to_string());

        parts.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// A definition together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedPrompt {
    /// `prompt_id`, or the file stem when the file has none.
    pub id: PromptId,
    /// Source file.
    pub path: PathBuf,
    pub definition: PromptDefinition,
}

/// A file that was skipped during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The prompts found in one directory, in file-name order.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
    prompts: Vec<LoadedPrompt>,
    skipped: Vec<SkippedFile>,
}

impl PromptLibrary {
    /// Loads every `*.json` file in `dir`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DirectoryUnreadable`] when `dir` cannot be listed.
    /// - [`CatalogError::Empty`] when no file yields a definition.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let unreadable = |source| CatalogError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut prompts = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();
        for path in files {
            match read_definition(&path) {
                Ok(definition) => {
                    let id = definition
                        .prompt_id
                        .as_deref()
                        .and_then(PromptId::new)
                        .or_else(|| {
                            path.file_stem()
                                .and_then(|stem| PromptId::new(stem.to_string_lossy()))
                        })
                        .unwrap_or(PromptId::from_static("prompt"));
                    prompts.push(LoadedPrompt {
                        id,
                        path,
                        definition,
                    });
                }
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "skipping prompt file");
                    skipped.push(SkippedFile { path, reason });
                }
            }
        }

        if prompts.is_empty() {
            return Err(CatalogError::Empty {
                path: dir.to_path_buf(),
            });
        }
        tracing::info!(count = prompts.len(), skipped = skipped.len(), "prompt library loaded");

        Ok(Self {
            dir: dir.to_path_buf(),
            prompts,
            skipped,
        })
    }

    /// Directory the library was loaded from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loaded prompts, in file-name order.
    pub fn prompts(&self) -> &[LoadedPrompt] {
        &self.prompts
    }

    /// Files that could not be loaded.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Selects a prompt by 1-based position or by `prompt_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownPrompt`] when nothing matches.
    pub fn select(&self, selector: &str) -> Result<&LoadedPrompt, CatalogError> {
        let selector = selector.trim();
        let by_index = selector
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.prompts.get(index));

        by_index
            .or_else(|| self.prompts.iter().find(|p| p.id.as_str() == selector))
            .ok_or_else(|| CatalogError::UnknownPrompt {
                selector: selector.to_string(),
            })
    }
}

impl LoadedPrompt {
    /// The definition's test question.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingTestInput`] when the definition has none.
    pub fn test_input(&self) -> Result<&str, CatalogError> {
        self.definition
            .test_input
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CatalogError::MissingTestInput {
                prompt: self.id.clone(),
            })
    }
}

fn read_definition(path: &Path) -> Result<PromptDefinition, String> {
    let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&text).map_err(|err| err.to_string())
}

// ---------------------------------------------------------------------------
// Asking
// ---------------------------------------------------------------------------

/// Returns `requested` when it lies in `0.0..=1.0`, otherwise the default.
pub fn sanitize_temperature(requested: f32) -> f32 {
    if (0.0..=1.0).contains(&requested) {
        requested
    } else {
        tracing::warn!(requested, "temperature out of range; using default");
        DEFAULT_PROMPT_TEMPERATURE
    }
}

/// Sends `question` to the model under `prompt`'s system message.
///
/// # Errors
///
/// Propagates the provider's [`LlmError`].
#[tracing::instrument(skip_all, fields(prompt = %prompt.id, max_tokens = max_tokens))]
pub async fn ask(
    provider: &dyn LlmProvider,
    prompt: &LoadedPrompt,
    question: &str,
    temperature: f32,
    max_tokens: u32,
) -> Result<Completion, LlmError> {
    let request = CompletionRequest {
        messages: vec![
            Message::system(prompt.definition.system_message()),
            Message::user(question),
        ],
        temperature: sanitize_temperature(temperature),
        max_tokens: Some(max_tokens),
    };
    let completion = provider.complete(request).await?;
    tracing::info!(
        model = %completion.model,
        finish_reason = completion.finish_reason.as_deref().unwrap_or("unknown"),
        "prompt answered"
    );
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(json: &str) -> PromptDefinition {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn system_message_lists_every_section_in_order() {
        let prompt = definition(
            r#"{
                "role": "You are a reviewer.",
                "context": "Rust diffs.",
                "structure": {
                    "output_format": "Report",
                    "components": [{"name": "Summary", "description": "short"}]
                },
                "format": {"length": "Brief", "requirements": ["Cite lines"]}
            }"#,
        );
        let expected = "You are a reviewer.\n\
\nCONTEXT: Rust diffs.\n\
\nRESPONSE FORMAT:\n\
Format: Report\n\
\nThe answer must contain the following sections:\n\
- Summary: short\n\
\nREQUIREMENTS:\n\
- Brief\n\
- Cite lines\n"
            .to_string()
            + MARKDOWN_INSTRUCTION;
        assert_eq!(prompt.system_message(), expected);
    }

    #[test]
    fn empty_definition_only_carries_the_markdown_instruction() {
        let prompt = definition("{}");
        assert_eq!(prompt.system_message(), MARKDOWN_INSTRUCTION);
        assert_eq!(prompt.display_name(), "Untitled");
    }

    #[test]
    fn out_of_range_temperature_falls_back() {
        assert_eq!(sanitize_temperature(0.2), 0.2);
        assert_eq!(sanitize_temperature(1.0), 1.0);
        assert_eq!(sanitize_temperature(1.5), DEFAULT_PROMPT_TEMPERATURE);
        assert_eq!(sanitize_temperature(-0.1), DEFAULT_PROMPT_TEMPERATURE);
    }
}
