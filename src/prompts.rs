//! Prompt construction for every LLM call, keyed by target language.
//!
//! Wording is a content concern of each stage; what matters here is that
//! every prompt pins the reply shape (a single JSON object or array) so
//! the extraction procedure can do its job, and that the target language
//! is stated explicitly.

use crate::artifacts::{Analysis, DocumentInput, Framework, Language, Outline, Pyramid};

fn language_instruction(language: &Language) -> String {
    match language {
        Language::Ko => "모든 텍스트는 한국어로 작성하세요.".to_string(),
        Language::En => "Write all text in English.".to_string(),
        Language::Other(tag) => format!("Write all text in the language tagged '{tag}'."),
    }
}

/// Strategist step 1: structured document analysis.
pub fn analysis(input: &DocumentInput) -> String {
    format!(
        "You are a strategy consultant. Analyze the following business document \
         and return ONLY a JSON object with the fields: \
         key_message (one sentence), data_points (array of quantitative claims as strings), \
         audience, purpose, industry, context (short classification tags).\n\
         Target audience: {audience}\nStated purpose: {purpose}\n{lang}\n\n\
         Document:\n{document}",
        audience = input.target_audience,
        purpose = input.purpose,
        lang = language_instruction(&input.language),
        document = input.document,
    )
}

/// Strategist step 3: one supporting argument per framework category.
pub fn pyramid(analysis: &Analysis, framework: &Framework, language: &Language) -> String {
    format!(
        "Build a pyramid-principle structure for this analysis.\n\
         Key message: {key}\nFramework: {name} — {description}\n\
         Categories: {categories}\n\n\
         Return ONLY a JSON object:\n\
         {{\"top_message\": \"action-oriented restatement of the key message\",\n\
          \"supporting_arguments\": [{{\"category\": \"...\", \"argument\": \"...\", \
         \"evidence\": [\"claim with a number\", \"...\"]}}]}}\n\n\
         Rules: exactly one argument per category, category names copied verbatim, \
         2 to 4 evidence entries each. {lang}",
        key = analysis.key_message,
        name = framework.name,
        description = framework.description,
        categories = framework.categories.join(", "),
        lang = language_instruction(language),
    )
}

/// Strategist step 4: the slide outline.
pub fn outline(
    pyramid: &Pyramid,
    framework: &Framework,
    num_slides: usize,
    language: &Language,
) -> String {
    format!(
        "Plan a {num_slides}-slide deck for this pyramid.\n\
         Top message: {top}\nMECE segments: {categories}\n\n\
         Return ONLY a JSON array of exactly {num_slides} slide objects:\n\
         {{\"number\": 1, \"slide_type\": \"title|executive_summary|content|next_steps\", \
         \"title\": \"...\", \"headline\": \"so-what action statement\", \
         \"content_type\": \"text|bullets|comparison|matrix|chart|summary\", \
         \"layout_type\": \"title_slide|title_and_content|three_column|matrix|split_text_chart\", \
         \"key_points\": [\"...\"], \"mece_segment\": \"category or null\"}}\n\n\
         Slide 1 is the title, slide 2 the executive summary, the final slide \
         next steps; every MECE segment gets at least one content slide. {lang}",
        top = pyramid.top_message,
        categories = framework.categories.join(", "),
        lang = language_instruction(language),
    )
}

/// Analyst: extract quantitative data points from the document.
pub fn data_extraction(document: &str, language: &Language) -> String {
    format!(
        "Extract every quantitative claim from the document below.\n\
         Return ONLY a JSON array of objects: \
         {{\"metric\": \"...\", \"value\": 123.4, \"unit\": \"%|억원|M|...\", \
         \"period\": \"...\", \
         \"comparison\": {{\"previous\": null, \"growth_rate\": null, \"benchmark\": null}}, \
         \"drivers\": {{\"name\": percent_share}}, \"context\": \"...\"}}\n\
         Omit comparison fields you cannot source from the text. {lang}\n\n\
         Document:\n{document}",
        lang = language_instruction(language),
    )
}

/// Storyteller: SCR classification of the outline.
pub fn scr(outline: &Outline, pyramid: &Pyramid, language: &Language) -> String {
    let listing: Vec<String> = outline
        .iter()
        .map(|s| format!("{}. {}", s.number, s.title))
        .collect();
    format!(
        "Classify these {count} slides into a Situation / Complication / Resolution arc.\n\
         Core message: {top}\nSlides:\n{listing}\n\n\
         Return ONLY a JSON object: {{\"situation_slides\": [..], \
         \"complication_slides\": [..], \"resolution_slides\": [..], \
         \"story_arc\": \"2-3 sentence arc summary\"}}\n\
         Every slide number from 1 to {count} appears exactly once. {lang}",
        count = outline.len(),
        top = pyramid.top_message,
        listing = listing.join("\n"),
        lang = language_instruction(language),
    )
}

/// Storyteller: all transitions in one batched call.
pub fn transitions_batch(outline: &Outline, language: &Language) -> String {
    let listing: Vec<String> = outline
        .iter()
        .map(|s| format!("{}. {} — {}", s.number, s.title, s.headline))
        .collect();
    format!(
        "Write connecting phrases for this deck. Return ONLY a JSON array of \
         exactly {count} strings: the first is the opening sentence for slide 1, \
         each following entry bridges consecutive slides.\n{lang}\n\nSlides:\n{listing}",
        count = outline.len().saturating_sub(1),
        lang = language_instruction(language),
        listing = listing.join("\n"),
    )
}

/// Storyteller: one transition between a single pair of slides.
pub fn transition_pair(from_title: &str, to_title: &str, language: &Language) -> String {
    format!(
        "Write one connecting sentence that bridges the slide \"{from_title}\" \
         to the slide \"{to_title}\". Return ONLY a JSON object: \
         {{\"transition\": \"...\"}}. {lang}",
        lang = language_instruction(language),
    )
}

/// Storyteller: all speaker notes in one batched call.
pub fn speaker_notes_batch(outline: &Outline, language: &Language) -> String {
    let listing: Vec<String> = outline
        .iter()
        .map(|s| format!("{}. {} — {}", s.number, s.title, s.headline))
        .collect();
    format!(
        "Write speaker notes for each slide. Return ONLY a JSON array of \
         exactly {count} objects: {{\"talking_points\": [\"...\"], \
         \"emphasis\": \"the one point to land\", \
         \"anticipated_questions\": [\"...\"]}}.\n{lang}\n\nSlides:\n{listing}",
        count = outline.len(),
        lang = language_instruction(language),
        listing = listing.join("\n"),
    )
}

/// Storyteller: notes for one slide, used to repair a short batch reply.
pub fn speaker_note_single(title: &str, headline: &str, language: &Language) -> String {
    format!(
        "Write speaker notes for the slide \"{title}\" (headline: \"{headline}\"). \
         Return ONLY a JSON object: {{\"talking_points\": [\"...\"], \
         \"emphasis\": \"...\", \"anticipated_questions\": [\"...\"]}}. {lang}",
        lang = language_instruction(language),
    )
}
