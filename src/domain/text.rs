use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Strips markup tags, turns `&nbsp;` into a space and collapses whitespace.
/// A `<` that never closes is dropped on its own; the text after it is kept.
pub fn normalize(input: &str) -> String {
    let without_tags = tag_regex().replace_all(input, "").replace('<', "");
    let decoded = without_tags.replace("&nbsp;", " ");

    whitespace_regex()
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

/// Same as [`normalize`] for a JSON value. Anything but a string is empty.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(s) => normalize(s),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{normalize, normalize_value};

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            normalize("<p>Hello&nbsp;<b>world</b></p>"),
            "Hello world".to_string()
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  a \n\t b   c  "), "a b c");
    }

    #[test]
    fn stray_angle_bracket_pairs_are_removed() {
        let result = normalize("1 < 2 and 3 > 2 <br/> end");
        assert!(!result.contains('<'));
        assert_eq!(result, "1 2 end");
    }

    #[test]
    fn unclosed_angle_bracket_keeps_following_text() {
        assert_eq!(
            normalize("Revenue <1M ARR. Email ceo@acme.io or 555-123-4567"),
            "Revenue 1M ARR. Email ceo@acme.io or 555-123-4567"
        );
        assert_eq!(normalize("a <b>bold</b> <"), "a bold");
    }

    #[test]
    fn normalized_output_never_has_markup_or_padding() {
        let inputs = [
            "",
            "   ",
            "&nbsp;&nbsp;x&nbsp;&nbsp;",
            "<div>\n  <span>Founder</span>\n</div>",
            "plain",
            "<<a>>b",
            "x < y",
            "<unclosed tag",
        ];

        for input in inputs {
            let result = normalize(input);
            assert!(!result.contains('<'), "{:?}", result);
            assert!(!result.contains("&nbsp;"), "{:?}", result);
            assert!(!result.contains("  "), "{:?}", result);
            assert_eq!(result.trim(), result);
        }
    }

    #[test]
    fn non_strings_normalize_to_empty() {
        assert_eq!(normalize_value(&json!(42)), "");
        assert_eq!(normalize_value(&json!(null)), "");
        assert_eq!(normalize_value(&json!(["a"])), "");
        assert_eq!(normalize_value(&json!(" <i>a</i> ")), "a");
    }
}
