//! Schema source text pre-pass
//!
//! Schema files in the wild carry raw control characters (tabs, newlines)
//! inside string literals, which strict JSON rejects. They are rewritten to
//! their escaped form before the text reaches the JSON parser.

use std::borrow::Cow;

/// Escape raw U+0000..U+001F characters found inside string literals
pub fn relax_control_chars(text: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if (c as u32) < 0x20 {
                let buf = out.get_or_insert_with(|| text[..i].to_string());
                push_escape(buf, c);
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }

        if let Some(buf) = out.as_mut() {
            buf.push(c);
        }
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(text),
    }
}

fn push_escape(buf: &mut String, c: char) {
    match c {
        '\n' => buf.push_str("\\n"),
        '\t' => buf.push_str("\\t"),
        '\r' => buf.push_str("\\r"),
        '\u{08}' => buf.push_str("\\b"),
        '\u{0c}' => buf.push_str("\\f"),
        other => buf.push_str(&format!("\\u{:04x}", other as u32)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_borrowed() {
        let text = "{\"type\":\n\t\"record\"}";
        assert!(matches!(relax_control_chars(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_control_chars_in_strings_are_escaped() {
        let text = "{\"doc\": \"a\x1f b\n\t\", \"x\":\n1}";
        assert_eq!(relax_control_chars(text), "{\"doc\": \"a\\u001f b\\n\\t\", \"x\":\n1}");
    }

    #[test]
    fn test_escaped_quote_keeps_string_open() {
        let text = "{\"doc\": \"say \\\"hi\\\"\n\"}";
        assert_eq!(relax_control_chars(text), "{\"doc\": \"say \\\"hi\\\"\\n\"}");
    }

    #[test]
    fn test_escaped_backslash_closes_string() {
        let text = "[\"a\\\\\", \n\"b\"]";
        assert!(matches!(relax_control_chars(text), Cow::Borrowed(_)));
    }
}
