//! Recovery of artifact text from fenced model output.
//!
//! Models asked for "only code" still tend to wrap it in a Markdown fence.
//! [`unwrap_artifact`] strips the first fence pair it finds and is otherwise a
//! trim. It is a heuristic: when the output holds several fenced blocks only
//! the first pair is honoured and everything after its closing delimiter is
//! discarded.

/// The Markdown code-fence delimiter.
pub const FENCE: &str = "```";

/// Extracts the artifact text from `raw`.
///
/// 1. A fence opened by `` ```<language> `` (the tag ending its line) yields
///    the text up to the next delimiter.
/// 2. Otherwise the first untagged fence is used the same way. A single info
///    word on the opening line (e.g. `` ```py ``) is treated as part of the
///    delimiter.
/// 3. Otherwise `raw` is returned trimmed.
///
/// The line break after the opening delimiter and the one before the closing
/// delimiter belong to the fence. A fence without a closing delimiter runs to
/// the end of the text.
pub fn unwrap_artifact(raw: &str, language: Option<&str>) -> String {
    let tagged = language
        .filter(|lang| !lang.is_empty())
        .and_then(|lang| tagged_opening(raw, lang));

    match tagged.or_else(|| generic_opening(raw)) {
        Some(opening) => fenced_body(raw, opening).to_string(),
        None => raw.trim().to_string(),
    }
}

/// Wraps `text` in a fence tagged with `language` (untagged when `None`).
///
/// `unwrap_artifact(&fence(t, lang), lang) == t` for any `t` that does not
/// itself contain [`FENCE`].
pub fn fence(text: &str, language: Option<&str>) -> String {
    format!("{FENCE}{}\n{text}\n{FENCE}", language.unwrap_or_default())
}

/// Where the fenced content starts and how its lines end.
#[derive(Debug, Clone, Copy)]
struct Opening {
    content_start: usize,
    crlf: bool,
}

fn tagged_opening(raw: &str, language: &str) -> Option<Opening> {
    let delimiter = format!("{FENCE}{language}");
    raw.match_indices(&delimiter).find_map(|(idx, _)| {
        let after = idx + delimiter.len();
        let (rest, next_line) = rest_of_line(raw, after);
        rest.trim().is_empty().then(|| Opening {
            content_start: next_line,
            crlf: rest.ends_with('\r'),
        })
    })
}

fn generic_opening(raw: &str) -> Option<Opening> {
    let idx = raw.find(FENCE)?;
    let after = idx + FENCE.len();
    let (rest, next_line) = rest_of_line(raw, after);
    let info = rest.trim();
    let has_line_break = raw[after..].contains('\n');
    let is_info_word = !info.contains(char::is_whitespace) && !info.contains('`');

    if has_line_break && is_info_word {
        Some(Opening {
            content_start: next_line,
            crlf: rest.ends_with('\r'),
        })
    } else {
        // Inline fence (```code```): content begins right after the delimiter.
        Some(Opening {
            content_start: after,
            crlf: false,
        })
    }
}

/// Returns the remainder of the line starting at `from` (without its `\n`) and
/// the index where the next line begins.
fn rest_of_line(raw: &str, from: usize) -> (&str, usize) {
    match raw[from..].find('\n') {
        Some(offset) => (&raw[from..from + offset], from + offset + 1),
        None => (&raw[from..], raw.len()),
    }
}

fn fenced_body(raw: &str, opening: Opening) -> &str {
    let tail = &raw[opening.content_start..];
    let body = match tail.find(FENCE) {
        Some(end) => &tail[..end],
        None => tail,
    };
    let line_break = if opening.crlf { "\r\n" } else { "\n" };
    body.strip_suffix(line_break).unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_fence_yields_inner_text() {
        let raw = "Here is the bot:\n```python\nprint('pong')\n```\nEnjoy!";
        assert_eq!(unwrap_artifact(raw, Some("python")), "print('pong')");
    }

    #[test]
    fn tagged_fence_is_preferred_over_an_earlier_generic_one() {
        let raw = "```\nnotes\n```\n```python\ncode()\n```";
        assert_eq!(unwrap_artifact(raw, Some("python")), "code()");
    }

    #[test]
    fn generic_fence_is_used_when_tag_is_absent() {
        let raw = "```\nconsole.log(1)\n```";
        assert_eq!(unwrap_artifact(raw, Some("python")), "console.log(1)");
    }

    #[test]
    fn info_word_of_other_language_is_dropped() {
        let raw = "```py\nimport os\n```";
        assert_eq!(unwrap_artifact(raw, Some("python")), "import os");
    }

    #[test]
    fn longer_tag_is_not_mistaken_for_language() {
        let raw = "```python3\nx = 1\n```";
        assert_eq!(unwrap_artifact(raw, Some("python")), "x = 1");
    }

    #[test]
    fn unfenced_text_is_trimmed() {
        assert_eq!(unwrap_artifact("\n  plain text  \n", Some("python")), "plain text");
        assert_eq!(unwrap_artifact("  post body ", None), "post body");
    }

    #[test]
    fn only_first_fence_pair_is_honoured() {
        let raw = "```python\nfirst\n```\ntext\n```python\nsecond\n```";
        assert_eq!(unwrap_artifact(raw, Some("python")), "first");
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let raw = "```python\nprint(1)\n";
        assert_eq!(unwrap_artifact(raw, Some("python")), "print(1)");
    }

    #[test]
    fn inline_fence_keeps_everything_between_delimiters() {
        assert_eq!(unwrap_artifact("```x = 1```", None), "x = 1");
    }

    #[test]
    fn crlf_fences_are_stripped() {
        let raw = "```python\r\nprint(1)\r\n```\r\n";
        assert_eq!(unwrap_artifact(raw, Some("python")), "print(1)");
    }

    #[test]
    fn fence_round_trips_exactly() {
        let samples = [
            "",
            "print('pong')",
            "  leading and trailing  ",
            "\nblank first line\n\n",
            "ends with carriage return\r",
            "unicode ✅ текст",
            "single ` and double `` backticks",
        ];
        for text in samples {
            for language in [Some("python"), None] {
                let wrapped = fence(text, language);
                assert_eq!(unwrap_artifact(&wrapped, language), text, "wrapped: {wrapped:?}");
            }
        }
    }
}
