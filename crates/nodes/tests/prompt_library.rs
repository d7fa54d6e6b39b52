mod common;

use std::fs;

use common::ScriptedProvider;
use nodes::{ask, PromptLibrary, DEFAULT_PROMPT_TEMPERATURE};
use pipeline::{CatalogError, Role};

fn library_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("02_review.json"),
        r#"{"prompt_id": "code_review", "name": "Code review", "role": "You are a reviewer.",
            "test_input": "fn main() {}"}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("01_summary.json"),
        r#"{"name": "Summary", "role": "You summarise text."}"#,
    )
    .unwrap();
    fs::write(dir.path().join("03_broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    dir
}

#[test]
fn loads_in_file_name_order_and_skips_bad_files() {
    let dir = library_dir();
    let library = PromptLibrary::load(dir.path()).unwrap();

    let ids: Vec<_> = library.prompts().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["01_summary", "code_review"]);
    assert_eq!(library.skipped().len(), 1);
    assert!(library.skipped()[0].path.ends_with("03_broken.json"));
}

#[test]
fn selects_by_index_or_id() {
    let dir = library_dir();
    let library = PromptLibrary::load(dir.path()).unwrap();

    assert_eq!(library.select("2").unwrap().id.as_str(), "code_review");
    assert_eq!(library.select("code_review").unwrap().definition.display_name(), "Code review");
    assert!(matches!(library.select("0"), Err(CatalogError::UnknownPrompt { .. })));
    assert!(matches!(library.select("9"), Err(CatalogError::UnknownPrompt { .. })));
}

#[test]
fn test_input_is_required_when_requested() {
    let dir = library_dir();
    let library = PromptLibrary::load(dir.path()).unwrap();

    assert_eq!(library.select("2").unwrap().test_input().unwrap(), "fn main() {}");
    assert!(matches!(
        library.select("1").unwrap().test_input(),
        Err(CatalogError::MissingTestInput { .. })
    ));
}

#[test]
fn empty_or_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(PromptLibrary::load(dir.path()), Err(CatalogError::Empty { .. })));
    assert!(matches!(
        PromptLibrary::load(&dir.path().join("missing")),
        Err(CatalogError::DirectoryUnreadable { .. })
    ));
}

#[tokio::test]
async fn ask_sends_system_and_user_messages() {
    let dir = library_dir();
    let library = PromptLibrary::load(dir.path()).unwrap();
    let prompt = library.select("code_review").unwrap();
    let provider = ScriptedProvider::replying(["# Review\nLooks good."]);

    let completion = ask(&provider, prompt, "fn main() {}", 3.0, 500).await.unwrap();

    assert_eq!(completion.text, "# Review\nLooks good.");
    let request = &provider.requests()[0];
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.starts_with("You are a reviewer."));
    assert_eq!(request.messages[1].content, "fn main() {}");
    assert_eq!(request.temperature, DEFAULT_PROMPT_TEMPERATURE);
    assert_eq!(request.max_tokens, Some(500));
}
