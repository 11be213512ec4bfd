//! Terminal control sequence removal.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid CSI pattern"));

/// Remove ANSI CSI sequences (colors, cursor movement) from `text`.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    CSI.replace_all(text, "")
}
