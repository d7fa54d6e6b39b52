//! Telegram bot generator: brief → aiogram 3.x Python source.

use pipeline::{
    ArtifactPath, Decode, FencePolicy, FieldDefault, HeaderStyle, Highlight, OutputSpec,
    PipelineDefinition, PipelineName, ReviewSpec, StageId, StageSchema, StageSpec, VerdictSchema,
};

// ---------------------------------------------------------------------------
// Stage 1: analysis
// ---------------------------------------------------------------------------

const ANALYSIS_TEMPLATE: &str = r#"You are a business analyst and an expert in Telegram bots.

Analyse the following requirements for a Telegram bot:
{description}

Perform a detailed analysis and determine:
1. The main purpose of the bot (its primary goal)
2. The key features the bot must implement
3. The kinds of user interaction (commands, buttons, text, media)
4. The implementation complexity (simple - a basic bot with commands, medium - a bot with logic and states, complex - complex logic with a database and APIs)
5. Special requirements (performance, security, integrations and so on)

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "bot_purpose": "...",
  "key_features": "...",
  "user_interactions": "...",
  "complexity_level": "simple|medium|complex",
  "special_requirements": "..."
}}"#;

const ANALYSIS_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("bot_purpose", "Basic functionality"),
    FieldDefault::new("key_features", "Command handling"),
    FieldDefault::new("user_interactions", "Commands"),
    FieldDefault::new("complexity_level", "simple"),
    FieldDefault::new("special_requirements", "None"),
];

const ANALYSIS_HIGHLIGHTS: &[Highlight] = &[
    Highlight::new("Purpose", "bot_purpose"),
    Highlight::new("Complexity", "complexity_level"),
    Highlight::new("Key features", "key_features").truncate(100),
];

// ---------------------------------------------------------------------------
// Stage 2: tools selection
// ---------------------------------------------------------------------------

const TOOLS_TEMPLATE: &str = r#"You are a solutions architect for Telegram bots.

Original requirements: {description}

Analysis results:
- Purpose: {bot_purpose}
- Key features: {key_features}
- Interactions: {user_interactions}
- Complexity: {complexity_level|simple}
- Requirements: {special_requirements}

Based on the analysis, choose the optimal toolset:
1. aiogram version (3.x is current, use it)
2. Database (sqlite for simple bots, postgresql for complex ones, none if not needed)
3. Additional libraries (requests for APIs, pillow for images and so on)
4. Required API integrations (if external services are involved)
5. Middleware components (logging, analytics, anti-spam and so on)
6. State management (FSM for dialogues, memory for simple storage, none if not needed)

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "framework_version": "...",
  "database": "sqlite|postgresql|none",
  "additional_libraries": "...",
  "api_integrations": "...",
  "middleware_needs": "...",
  "state_management": "FSM|memory|none"
}}"#;

const TOOLS_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("framework_version", "aiogram 3.x"),
    FieldDefault::new("database", "none"),
    FieldDefault::new("additional_libraries", ""),
    FieldDefault::new("api_integrations", ""),
    FieldDefault::new("middleware_needs", "logging"),
    FieldDefault::new("state_management", "none"),
];

const TOOLS_HIGHLIGHTS: &[Highlight] = &[
    Highlight::new("Framework", "framework_version"),
    Highlight::new("Database", "database"),
    Highlight::new("State management", "state_management"),
    Highlight::new("Extra libraries", "additional_libraries").optional(),
];

// ---------------------------------------------------------------------------
// Stage 3: code structure
// ---------------------------------------------------------------------------

const STRUCTURE_TEMPLATE: &str = r#"You are a senior Python developer specialising in Telegram bot architecture.

Original requirements: {description}

Analysis:
- Purpose: {bot_purpose}
- Features: {key_features}
- Complexity: {complexity_level|simple}

Tools:
- Framework: {framework_version|aiogram 3.x}
- Database: {database|none}
- Libraries: {additional_libraries}
- State management: {state_management|none}

Design a detailed code structure:
1. Commands - every bot command (/start, /help and so on)
2. Handlers - the handlers (command_handler, message_handler, callback_handler and so on)
3. States - FSM states if dialogue logic is used
4. Keyboards - which keyboards are needed (reply for regular ones, inline for buttons under messages)
5. Modules - the file layout (handlers.py, keyboards.py, database.py and so on)
6. Data models - data models (classes for users, records and so on)
7. Helper functions - helpers (validation, formatting and so on)

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "commands": "...",
  "handlers": "...",
  "states": "...",
  "keyboards": "...",
  "modules": "...",
  "data_models": "...",
  "helper_functions": "..."
}}"#;

const STRUCTURE_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("commands", "/start, /help"),
    FieldDefault::new("handlers", "command_handler, message_handler"),
    FieldDefault::new("states", ""),
    FieldDefault::new("keyboards", ""),
    FieldDefault::new("modules", "main"),
    FieldDefault::new("data_models", ""),
    FieldDefault::new("helper_functions", ""),
];

const STRUCTURE_HIGHLIGHTS: &[Highlight] = &[
    Highlight::new("Commands", "commands"),
    Highlight::new("Handlers", "handlers"),
    Highlight::new("Keyboards", "keyboards").optional(),
];

// ---------------------------------------------------------------------------
// Stage 4: code
// ---------------------------------------------------------------------------

const CODE_TEMPLATE: &str = r#"You are an expert Python developer specialising in Telegram bots built with aiogram 3.x.

Original requirements: {description}

ANALYSIS:
- Purpose: {bot_purpose}
- Features: {key_features}
- Complexity: {complexity_level|simple}

TOOLS:
- Framework: {framework_version|aiogram 3.x}
- Database: {database|none}
- Libraries: {additional_libraries}
- State management: {state_management|none}

CODE STRUCTURE:
- Commands: {commands}
- Handlers: {handlers}
- FSM states: {states}
- Keyboards: {keyboards}
- Modules: {modules}
- Data models: {data_models}
- Helper functions: {helper_functions}

Generate the COMPLETE working source of the Telegram bot in Python.

CRITICAL requirements:
1. Use ONLY aiogram 3.x (not 2.x!)
2. Every handler MUST be async def
3. The bot token is read with os.getenv("BOT_TOKEN")
4. Use the modern API: Router, Dispatcher
5. Imports: from aiogram import Bot, Dispatcher, Router, F
6. Start with: await dp.start_polling(bot)
7. Add logging (import logging, logging.basicConfig)
8. Handle errors with try/except where needed
9. If states are needed, use FSM from aiogram.fsm
10. If keyboards are needed, use ReplyKeyboardMarkup or InlineKeyboardMarkup
11. The code is FULLY ready to run, WITHOUT stubs, TODOs or "add your code here" comments
12. Every function is FULLY implemented

Return ONLY the Python code, without explanations and without markdown formatting."#;

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

const REVIEW_TEMPLATE: &str = r#"You are an experienced reviewer of Python code.

Review the following Telegram bot source:

```python
{code}
```

Check:
1. Syntax errors
2. Correctness of the bot start-up sequence
3. Correct imports (aiogram 3.x)
4. Presence of error handling
5. Overall code quality

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "is_valid": "yes|no",
  "syntax_errors": "...",
  "structure_issues": "...",
  "import_issues": "...",
  "recommendations": "..."
}}"#;

const REVIEW_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("is_valid", "yes"),
    FieldDefault::new("syntax_errors", "none"),
    FieldDefault::new("structure_issues", "none"),
    FieldDefault::new("import_issues", "none"),
    FieldDefault::new("recommendations", "The code is ready to use"),
];

const REVIEW_FINDINGS: &[Highlight] = &[
    Highlight::new("Syntax errors", "syntax_errors"),
    Highlight::new("Structure issues", "structure_issues"),
    Highlight::new("Import issues", "import_issues"),
];

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

const STAGES: &[StageSpec] = &[
    StageSpec {
        id: StageId::from_static("analysis"),
        title: "Analysing the bot requirements",
        template: ANALYSIS_TEMPLATE,
        decode: Decode::Structured(StageSchema::new(ANALYSIS_FIELDS)),
        highlights: ANALYSIS_HIGHLIGHTS,
    },
    StageSpec {
        id: StageId::from_static("tools_selection"),
        title: "Selecting tools",
        template: TOOLS_TEMPLATE,
        decode: Decode::Structured(StageSchema::new(TOOLS_FIELDS)),
        highlights: TOOLS_HIGHLIGHTS,
    },
    StageSpec {
        id: StageId::from_static("structure"),
        title: "Designing the code structure",
        template: STRUCTURE_TEMPLATE,
        decode: Decode::Structured(StageSchema::new(STRUCTURE_FIELDS)),
        highlights: STRUCTURE_HIGHLIGHTS,
    },
    StageSpec {
        id: StageId::from_static("code"),
        title: "Implementing the bot",
        template: CODE_TEMPLATE,
        decode: Decode::Artifact {
            output_key: "code",
            fence: FencePolicy::Strip { language: "python" },
        },
        highlights: &[],
    },
];

/// Generates a single-file aiogram 3.x bot from a free-text description.
pub static BOT_PIPELINE: PipelineDefinition = PipelineDefinition {
    name: PipelineName::from_static("bot"),
    title: "TELEGRAM BOT GENERATOR",
    brief_key: "description",
    stages: STAGES,
    review: ReviewSpec {
        stage: StageSpec {
            id: StageId::from_static("review"),
            title: "Validating the code",
            template: REVIEW_TEMPLATE,
            decode: Decode::Structured(StageSchema::new(REVIEW_FIELDS)),
            highlights: &[],
        },
        verdict: VerdictSchema {
            verdict_field: "is_valid",
            finding_fields: REVIEW_FINDINGS,
            recommendations_field: "recommendations",
        },
    },
    output: OutputSpec {
        file: ArtifactPath::from_static("generated_bot.py"),
        header: HeaderStyle::Bare,
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{render, PipelineContext};
    use serde_json::{json, Value};

    fn context(value: Value) -> PipelineContext {
        let mut context = PipelineContext::default();
        if let Value::Object(map) = value {
            context.merge(map);
        }
        context
    }

    #[test]
    fn tools_defaults_match_the_documented_fallback() {
        let defaults = StageSchema::new(TOOLS_FIELDS).defaults();
        assert_eq!(
            Value::Object(defaults),
            json!({
                "framework_version": "aiogram 3.x",
                "database": "none",
                "additional_libraries": "",
                "api_integrations": "",
                "middleware_needs": "logging",
                "state_management": "none"
            })
        );
    }

    #[test]
    fn structure_prompt_falls_back_for_missing_tool_choices() {
        let prompt = render(
            STRUCTURE_TEMPLATE,
            &context(json!({"description": "ping bot", "bot_purpose": "reply pong"})),
        );
        assert!(prompt.contains("Original requirements: ping bot"));
        assert!(prompt.contains("- Framework: aiogram 3.x"));
        assert!(prompt.contains("- Database: none"));
        assert!(prompt.contains("- Complexity: simple"));
    }

    #[test]
    fn review_prompt_embeds_code_in_a_python_fence() {
        let prompt = render(REVIEW_TEMPLATE, &context(json!({"code": "print('pong')"})));
        assert!(prompt.contains("```python\nprint('pong')\n```"));
        assert!(prompt.contains("{\n  \"is_valid\": \"yes|no\","));
    }
}
