//! Prompt and response schema for level generation.

use rabt_core::{GROUP_SIZE, LevelId, MAX_LEVEL_INDEX, Tier};
use serde_json::{Value, json};
use tracing::instrument;

/// System prompt shared by every level request.
pub fn system_prompt() -> &'static str {
    "You generate content for 'Rabt', an Arabic word sorting game. \
     Players find groups of four words that share a hidden category. \
     Reply with JSON only, no commentary and no code fences."
}

fn theme(tier: Tier) -> &'static str {
    match tier {
        Tier::Beginner => "concrete nouns such as animals, food, colors and tools",
        Tier::Intermediate => "abstract nouns, verbs, synonyms and semantic groups",
        Tier::Expert => "literary roots, morphological patterns (awzan), rare words and historical figures",
    }
}

/// User prompt asking for one level.
#[instrument]
pub fn level_prompt(level: LevelId) -> String {
    let categories = level.category_count();
    let words = level.word_count();
    format!(
        "Generate game data for the Arabic word sorting game 'Rabt'.\n\
         Stage: {tier}.\n\
         Level Index: {index} of {max}.\n\
         Rules:\n\
         - Create {categories} unique categories of {GROUP_SIZE} words each (Total {words} words).\n\
         - Logic should follow Modern Standard Arabic (MSA).\n\
         - Each category MUST have a unique, highly relevant emoji and a distinct, vibrant HEX color that fits the theme.\n\
         - Theme for this stage: {theme}.\n\
         - Ensure strict orthographic accuracy for 'Hamza' and 'Ta Marbuta'.\n\
         - Words should be challenging but related by a clear, logical thread.\n\
         - No word may appear in more than one category.\n\
         - Output must be JSON of the form {{\"categories\": [{{\"id\", \"title\", \"icon\", \"color\", \"description\", \"words\"}}]}}.",
        tier = level.tier(),
        index = level.index(),
        max = MAX_LEVEL_INDEX,
        theme = theme(level.tier()),
    )
}

/// Response schema in the OpenAPI subset Gemini accepts.
#[instrument]
pub fn level_schema(level: LevelId) -> Value {
    let categories = level.category_count();
    json!({
        "type": "OBJECT",
        "properties": {
            "categories": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "icon": {
                            "type": "STRING",
                            "description": "A unique and highly relevant emoji representing the category"
                        },
                        "color": {
                            "type": "STRING",
                            "description": "A distinct, vibrant CSS hex color code (e.g. #FF5733) that visually differentiates the category"
                        },
                        "description": { "type": "STRING" },
                        "words": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "minItems": GROUP_SIZE,
                            "maxItems": GROUP_SIZE
                        }
                    },
                    "required": ["id", "title", "icon", "color", "description", "words"]
                },
                "minItems": categories,
                "maxItems": categories
            }
        },
        "required": ["categories"]
    })
}
