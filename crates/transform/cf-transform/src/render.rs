//! Rendering transform output as text lines.

use serde_json::Value;
use std::borrow::Cow;

/// A record that can be written as a single line of output.
///
/// The rendered text must not contain a newline.
pub trait RenderLine {
    fn render_line(&self) -> Cow<'_, str>;
}

impl RenderLine for String {
    fn render_line(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl RenderLine for u64 {
    fn render_line(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// Compact JSON; string contents are escaped, so no raw newlines appear.
impl RenderLine for Value {
    fn render_line(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render() {
        assert_eq!("abc".to_string().render_line(), "abc");
        assert_eq!(42u64.render_line(), "42");
        assert_eq!(json!({"k": "a\nb"}).render_line(), r#"{"k":"a\nb"}"#);
    }
}
