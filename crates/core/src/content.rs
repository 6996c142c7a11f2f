//! Note content helpers: markup stripping, derived titles and excerpts,
//! and content validation.
//!
//! Note content is stored as a rich-text markup string. Everything the
//! system derives from it (titles, excerpts, search text) works on the
//! plain-text rendering produced by [`plain_text`].

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Title returned for empty or whitespace-only content.
pub const UNTITLED: &str = "Untitled Note";

/// Maximum length of a derived title in characters.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Maximum length of a derived excerpt in characters (including ellipsis).
pub const MAX_EXCERPT_LENGTH: usize = 200;

/// Maximum length of note content in characters.
pub const MAX_NOTE_CONTENT_LENGTH: usize = 100_000;

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// Strip markup tags (`<...>`) from a content string and trim whitespace.
///
/// A single-pass scan: everything between `<` and the next `>` is dropped.
/// An unterminated `<` drops the remainder of the string, which matches
/// how browsers treat a dangling open bracket.
pub fn plain_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;

    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.trim().to_string()
}

// ---------------------------------------------------------------------------
// Derived metadata
// ---------------------------------------------------------------------------

/// Derive a title from note content.
///
/// Takes the first sentence (up to `.`, `!`, or `?`) of the plain text.
/// Sentences longer than 50 characters are cut to 47 characters plus
/// `"..."`. Empty or whitespace-only content yields [`UNTITLED`].
pub fn generate_title(content: &str) -> String {
    let text = plain_text(content);
    if text.is_empty() {
        return UNTITLED.to_string();
    }

    let first_sentence = text
        .split(['.', '!', '?'])
        .next()
        .unwrap_or(&text)
        .trim()
        .to_string();

    if first_sentence.chars().count() > MAX_TITLE_LENGTH {
        let cut: String = first_sentence.chars().take(MAX_TITLE_LENGTH - 3).collect();
        format!("{cut}...")
    } else {
        first_sentence
    }
}

/// Derive an excerpt from note content.
///
/// Plain text bounded at 200 characters: longer text is cut to 197
/// characters plus `"..."`, shorter text is returned verbatim. Empty
/// content yields an empty string.
pub fn generate_excerpt(content: &str) -> String {
    let text = plain_text(content);
    if text.chars().count() > MAX_EXCERPT_LENGTH {
        let cut: String = text.chars().take(MAX_EXCERPT_LENGTH - 3).collect();
        format!("{cut}...")
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate note content: must be non-empty and within the length limit.
pub fn validate_note_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Note content cannot be empty".to_string());
    }
    if content.len() > MAX_NOTE_CONTENT_LENGTH {
        return Err(format!(
            "Note content exceeds maximum length of {MAX_NOTE_CONTENT_LENGTH} characters"
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- plain_text ----------------------------------------------------------

    #[test]
    fn strips_simple_tags() {
        assert_eq!(plain_text("<p>Hello world</p>"), "Hello world");
    }

    #[test]
    fn strips_nested_and_attributed_tags() {
        assert_eq!(
            plain_text("<div class=\"x\"><b>bold</b> and <i>italic</i></div>"),
            "bold and italic"
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(plain_text("  <p> padded </p>  "), "padded");
    }

    #[test]
    fn plain_input_passes_through() {
        assert_eq!(plain_text("no markup here"), "no markup here");
    }

    #[test]
    fn unterminated_tag_drops_remainder() {
        assert_eq!(plain_text("before <p unterminated"), "before");
    }

    // -- generate_title ------------------------------------------------------

    #[test]
    fn title_from_first_sentence() {
        assert_eq!(
            generate_title("<p>Hello world. Second sentence.</p>"),
            "Hello world"
        );
    }

    #[test]
    fn title_splits_on_exclamation_and_question() {
        assert_eq!(generate_title("What a day! More text."), "What a day");
        assert_eq!(generate_title("Really? Yes."), "Really");
    }

    #[test]
    fn empty_content_is_untitled() {
        assert_eq!(generate_title(""), UNTITLED);
        assert_eq!(generate_title("   "), UNTITLED);
        assert_eq!(generate_title("<p></p>"), UNTITLED);
    }

    #[test]
    fn long_sentence_truncated_to_47_plus_ellipsis() {
        let content = "a".repeat(80);
        let title = generate_title(&content);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..47], &content[..47]);
    }

    #[test]
    fn sentence_at_limit_not_truncated() {
        let content = "b".repeat(50);
        assert_eq!(generate_title(&content), content);
    }

    #[test]
    fn title_truncation_is_char_based() {
        // Multibyte characters must not be split mid-codepoint.
        let content = "é".repeat(80);
        let title = generate_title(&content);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
    }

    // -- generate_excerpt ----------------------------------------------------

    #[test]
    fn short_content_verbatim() {
        assert_eq!(generate_excerpt("<p>Hello world</p>"), "Hello world");
    }

    #[test]
    fn empty_content_empty_excerpt() {
        assert_eq!(generate_excerpt(""), "");
        assert_eq!(generate_excerpt("<p></p>"), "");
    }

    #[test]
    fn long_content_bounded_at_200() {
        let content = "x".repeat(500);
        let excerpt = generate_excerpt(&content);
        assert_eq!(excerpt.chars().count(), 200);
        assert!(excerpt.ends_with("..."));
        assert_eq!(&excerpt[..197], &content[..197]);
    }

    #[test]
    fn content_at_limit_not_truncated() {
        let content = "y".repeat(200);
        assert_eq!(generate_excerpt(&content), content);
    }

    #[test]
    fn excerpt_is_idempotent() {
        let long = format!("<p>{}</p>", "z".repeat(400));
        let once = generate_excerpt(&long);
        let twice = generate_excerpt(&once);
        assert_eq!(once, twice);

        let short = "<p>short note</p>";
        let once = generate_excerpt(short);
        assert_eq!(generate_excerpt(&once), once);
    }

    // -- validate_note_content -----------------------------------------------

    #[test]
    fn valid_content_accepted() {
        assert!(validate_note_content("<p>Hello</p>").is_ok());
    }

    #[test]
    fn empty_content_rejected() {
        let result = validate_note_content("   ");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("cannot be empty"));
    }

    #[test]
    fn oversized_content_rejected() {
        let content = "a".repeat(MAX_NOTE_CONTENT_LENGTH + 1);
        let result = validate_note_content(&content);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("exceeds maximum length"));
    }
}
