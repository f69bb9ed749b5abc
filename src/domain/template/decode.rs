use html_escape::decode_html_entities;

pub const DEFAULT_MAX_DECODE_PASSES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub text: String,
    /// Number of decode passes that changed or inspected the text.
    pub passes: u32,
    /// `false` when the pass limit was reached while entities were still decoding.
    pub converged: bool,
}

/// Decode HTML entities until a fixpoint, the text has no `&` left, or
/// `max_passes` passes have run. Rich editors may encode a template several
/// times over, so one pass is not enough.
pub fn decode_entities(input: &str, max_passes: u32) -> DecodeOutcome {
    let mut text = input.to_string();
    let mut passes = 0;

    while text.contains('&') {
        if passes >= max_passes {
            let converged = *decode_html_entities(&text) == *text;
            return DecodeOutcome {
                text,
                passes,
                converged,
            };
        }

        let decoded = decode_html_entities(&text).into_owned();
        passes += 1;
        if decoded == text {
            break;
        }
        text = decoded;
    }

    DecodeOutcome {
        text,
        passes,
        converged: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_amp(levels: usize) -> String {
        format!("&{}lt;", "amp;".repeat(levels))
    }

    #[test]
    fn plain_text_needs_no_pass() {
        let outcome = decode_entities("Name: {name}", DEFAULT_MAX_DECODE_PASSES);
        assert_eq!(outcome.text, "Name: {name}");
        assert_eq!(outcome.passes, 0);
        assert!(outcome.converged);
    }

    #[test]
    fn decodes_multiply_encoded_markers() {
        let outcome = decode_entities("&amp;lt;b&amp;gt; &#123;name&#125;", 10);
        assert_eq!(outcome.text, "<b> {name}");
        assert!(outcome.converged);
    }

    #[test]
    fn decoded_text_is_a_fixpoint() {
        let once = decode_entities("&amp;amp;quot;hi&amp;amp;quot; & more", 10);
        let twice = decode_entities(&once.text, 10);
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn stray_ampersand_stops_after_one_unchanged_pass() {
        let outcome = decode_entities("Tom & Jerry", 10);
        assert_eq!(outcome.text, "Tom & Jerry");
        assert_eq!(outcome.passes, 1);
        assert!(outcome.converged);
    }

    #[test]
    fn pass_limit_bounds_deep_nesting() {
        let outcome = decode_entities(&nested_amp(15), 10);
        assert_eq!(outcome.passes, 10);
        assert!(!outcome.converged);
        assert_eq!(outcome.text, nested_amp(5));
    }

    #[test]
    fn reaching_the_limit_exactly_still_converges() {
        let outcome = decode_entities(&nested_amp(2), 3);
        assert_eq!(outcome.text, "<");
        assert_eq!(outcome.passes, 3);
        assert!(outcome.converged);
    }
}
