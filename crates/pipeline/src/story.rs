//! Backstory generation. Failures never fail the caller.

use pixsynth_core::character::{Character, Story};
use pixsynth_core::prompts::story_prompt;

use crate::context::GenerationContext;

/// Ask the text provider for a backstory and attach it to `character`.
///
/// Returns `None` (and leaves `character.story` unchanged) when the
/// provider fails or answers with nothing. Does not save.
pub async fn generate_story(ctx: &GenerationContext, character: &mut Character) -> Option<Story> {
    let form = &character.input_params;
    let prompt = story_prompt(
        &character.name,
        form.character_class.as_deref(),
        form.personality.as_deref(),
        form.appearance.as_deref(),
    );

    match ctx
        .text
        .generate_text(&prompt, ctx.config.story_max_tokens, ctx.config.story_temperature)
        .await
    {
        Ok(content) if !content.trim().is_empty() => {
            let story = Story {
                content: content.trim().to_string(),
                prompt,
                generated_at: chrono::Utc::now(),
            };
            character.story = Some(story.clone());
            character.touch();
            Some(story)
        }
        Ok(_) => {
            tracing::warn!(character_id = %character.id, "Story provider returned empty text");
            None
        }
        Err(e) => {
            tracing::warn!(character_id = %character.id, error = %e, "Story generation failed");
            None
        }
    }
}
