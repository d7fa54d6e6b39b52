//! Text post generator: topic (+ optional source material) → publishable post.

use pipeline::{
    ArtifactPath, Decode, FencePolicy, FieldDefault, HeaderStyle, Highlight, OutputSpec,
    PipelineDefinition, PipelineName, ReviewSpec, StageId, StageSchema, StageSpec, VerdictSchema,
};

const ANALYSIS_TEMPLATE: &str = r#"You are a content analyst and an expert in engaging content.

Post topic: {topic}
Source material: {source_text|Not provided}

Perform a detailed analysis and determine:
1. The main goal of the post (inform, attract attention, educate, entertain)
2. The target audience (who will read the post)
3. The key messages (what must come across)
4. Tone and style (formal, friendly, professional, emotional)
5. The desired length (short - up to 500 characters, medium - 500-1500, long - 1500+)

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "post_goal": "...",
  "target_audience": "...",
  "key_messages": "...",
  "tone_style": "...",
  "desired_length": "short|medium|long"
}}"#;

const ANALYSIS_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("post_goal", "Inform"),
    FieldDefault::new("target_audience", "General audience"),
    FieldDefault::new("key_messages", "Key information on the topic"),
    FieldDefault::new("tone_style", "Neutral"),
    FieldDefault::new("desired_length", "medium"),
];

const STYLE_TEMPLATE: &str = r#"You are a copywriter and content marketing specialist.

Post topic: {topic}

Analysis results:
- Goal: {post_goal}
- Audience: {target_audience}
- Key messages: {key_messages}
- Tone: {tone_style}
- Length: {desired_length|medium}

Choose the optimal format and style:
1. Post structure (headings, lists, paragraphs and so on)
2. Emoji usage (yes/no and which ones)
3. Call to action (CTA) - whether one is needed and which
4. Hashtags (whether needed, how many, which topics)
5. Formatting (bold, italics, subheadings)

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "structure": "...",
  "use_emoji": "yes|no",
  "emoji_style": "...",
  "cta": "...",
  "hashtags": "...",
  "formatting": "..."
}}"#;

const STYLE_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("structure", "Headline, main text, conclusion"),
    FieldDefault::new("use_emoji", "no"),
    FieldDefault::new("emoji_style", ""),
    FieldDefault::new("cta", "None"),
    FieldDefault::new("hashtags", "None"),
    FieldDefault::new("formatting", "Paragraphs"),
];

const STRUCTURE_TEMPLATE: &str = r#"You are an editor and content structure analyst.

Post topic: {topic}

Analysis:
- Goal: {post_goal}
- Audience: {target_audience}
- Tone: {tone_style}

Style:
- Structure: {structure}
- Emoji: {use_emoji|no}
- CTA: {cta}
- Hashtags: {hashtags}

Create a detailed content structure:
1. Headline (catchy and informative)
2. Introduction (a hook that grabs attention)
3. Main blocks (2-5 blocks of meaning)
4. Conclusion (a summary)
5. Call to action (if needed)

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "headline": "...",
  "intro": "...",
  "main_blocks": "...",
  "conclusion": "...",
  "cta_text": "..."
}}"#;

const STRUCTURE_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("headline", "Headline"),
    FieldDefault::new("intro", "Introduction"),
    FieldDefault::new("main_blocks", "Main content"),
    FieldDefault::new("conclusion", "Conclusion"),
    FieldDefault::new("cta_text", ""),
];

const CONTENT_TEMPLATE: &str = r#"You are a professional copywriter and creator of engaging content.

Post topic: {topic}
Source material: {source_text|Not provided}

ANALYSIS:
- Goal: {post_goal}
- Audience: {target_audience}
- Tone: {tone_style}
- Length: {desired_length|medium}

STYLE:
- Structure: {structure}
- Emoji: {use_emoji|no}
- Formatting: {formatting}

CONTENT STRUCTURE:
- Headline: {headline}
- Introduction: {intro}
- Main blocks: {main_blocks}
- Conclusion: {conclusion}
- CTA: {cta_text}

Generate the COMPLETE, finished post.

CRITICAL requirements:
1. The post must be COMPLETE and ready to publish
2. Follow the given tone and style
3. Use the structure from the plan
4. Add emoji if requested
5. Formatting: use **bold**, *italics* and headings where appropriate
6. The post must be informative and engaging
7. No placeholders, [brackets], TODOs or "add text here" comments
8. All content is FULLY written

Return ONLY the text of the post, without explanations."#;

const REVIEW_TEMPLATE: &str = r#"You are an editor and an expert in content quality.

Review the following post:

{post_content}

Assess:
1. Completeness (the post is fully ready to publish)
2. Structure (logical structure, readability)
3. Engagement (is it interesting to read, does it hold attention)
4. Grammar (no obvious mistakes)
5. Relevance to the topic

IMPORTANT: Answer strictly in JSON with the following fields:
{{
  "is_ready": "yes|no",
  "completeness": "...",
  "structure_quality": "...",
  "engagement": "...",
  "recommendations": "..."
}}"#;

const REVIEW_FIELDS: &[FieldDefault] = &[
    FieldDefault::new("is_ready", "yes"),
    FieldDefault::new("completeness", "The post is complete"),
    FieldDefault::new("structure_quality", "Good structure"),
    FieldDefault::new("engagement", "Engaging enough"),
    FieldDefault::new("recommendations", "The post is ready to publish"),
];

const STAGES: &[StageSpec] = &[
    StageSpec {
        id: StageId::from_static("analysis"),
        title: "Analysing the topic and material",
        template: ANALYSIS_TEMPLATE,
        decode: Decode::Structured(StageSchema::new(ANALYSIS_FIELDS)),
        highlights: &[
            Highlight::new("Goal", "post_goal"),
            Highlight::new("Audience", "target_audience"),
            Highlight::new("Tone", "tone_style"),
        ],
    },
    StageSpec {
        id: StageId::from_static("style_selection"),
        title: "Choosing style and format",
        template: STYLE_TEMPLATE,
        decode: Decode::Structured(StageSchema::new(STYLE_FIELDS)),
        highlights: &[
            Highlight::new("Structure", "structure").truncate(50),
            Highlight::new("Emoji", "use_emoji"),
            Highlight::new("CTA", "cta").truncate(50),
        ],
    },
    StageSpec {
        id: StageId::from_static("structure"),
        title: "Outlining the content",
        template: STRUCTURE_TEMPLATE,
        decode: Decode::Structured(StageSchema::new(STRUCTURE_FIELDS)),
        highlights: &[Highlight::new("Headline", "headline").truncate(60)],
    },
    StageSpec {
        id: StageId::from_static("content"),
        title: "Writing the post",
        template: CONTENT_TEMPLATE,
        decode: Decode::Artifact {
            output_key: "post_content",
            fence: FencePolicy::Keep,
        },
        highlights: &[],
    },
];

/// Generates a social-media post from a topic and optional source material.
pub static POST_PIPELINE: PipelineDefinition = PipelineDefinition {
    name: PipelineName::from_static("post"),
    title: "TEXT POST GENERATOR",
    brief_key: "topic",
    stages: STAGES,
    review: ReviewSpec {
        stage: StageSpec {
            id: StageId::from_static("review"),
            title: "Validating the content",
            template: REVIEW_TEMPLATE,
            decode: Decode::Structured(StageSchema::new(REVIEW_FIELDS)),
            highlights: &[],
        },
        verdict: VerdictSchema {
            verdict_field: "is_ready",
            finding_fields: &[
                Highlight::new("Structure quality", "structure_quality").truncate(50),
                Highlight::new("Completeness", "completeness"),
                Highlight::new("Engagement", "engagement"),
            ],
            recommendations_field: "recommendations",
        },
    },
    output: OutputSpec {
        file: ArtifactPath::from_static("generated_post.txt"),
        header: HeaderStyle::Banner { label: "TOPIC" },
    },
};
