//! Markdown list auto-continuation for the note editor.
//!
//! # Invariants
//! - Continuations keep the current line's indentation and marker.
//! - Checkbox items always continue unchecked; numbered items increment.
//! - Pressing Enter on an empty item ends the list by removing its marker.

use once_cell::sync::Lazy;
use regex::Regex;

static CHECKBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<marker>[-*+•])[ \t]+\[[ xX]\](?:[ \t]+(?P<body>.*)|[ \t]*)$")
        .expect("valid checkbox regex")
});
static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<marker>[-*+•])[ \t]+(?P<body>.*)$")
        .expect("valid bullet regex")
});
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<number>\d{1,9})(?P<delim>[.)])[ \t]+(?P<body>.*)$")
        .expect("valid numbered regex")
});

/// What pressing Enter at the end of a line should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListContinuation {
    /// Not a list line; insert a plain newline.
    None,
    /// Start the next line with `prefix`.
    Continue { prefix: String },
    /// Empty item: replace the current line with `replacement` and stop.
    EndList { replacement: String },
}

/// Decides how the list on `line` continues.
pub fn continue_list(line: &str) -> ListContinuation {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(caps) = CHECKBOX_RE.captures(line) {
        let indent = &caps["indent"];
        let body = caps.name("body").map_or("", |body| body.as_str());
        return continuation(indent, body, || {
            format!("{indent}{} [ ] ", &caps["marker"])
        });
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        let indent = &caps["indent"];
        return continuation(indent, &caps["body"], || {
            let next = caps["number"].parse::<u32>().map_or(1, |value| value + 1);
            format!("{indent}{next}{} ", &caps["delim"])
        });
    }

    if let Some(caps) = BULLET_RE.captures(line) {
        let indent = &caps["indent"];
        return continuation(indent, &caps["body"], || {
            format!("{indent}{} ", &caps["marker"])
        });
    }

    ListContinuation::None
}

fn continuation(indent: &str, body: &str, prefix: impl FnOnce() -> String) -> ListContinuation {
    if body.trim().is_empty() {
        ListContinuation::EndList {
            replacement: indent.to_string(),
        }
    } else {
        ListContinuation::Continue { prefix: prefix() }
    }
}

/// Buffer state after handling Enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterEdit {
    pub text: String,
    /// Byte offset of the cursor in `text`.
    pub cursor: usize,
}

/// Applies Enter at byte offset `cursor` in `text`.
///
/// Only the part of the current line before the cursor decides the
/// continuation. Offsets past the end clamp to the end; offsets inside a
/// UTF-8 sequence move back to the previous boundary.
pub fn apply_enter(text: &str, cursor: usize) -> EnterEdit {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }

    let line_start = text[..cursor].rfind('\n').map_or(0, |index| index + 1);
    let (before, after) = (&text[..line_start], &text[cursor..]);
    let line = &text[line_start..cursor];

    match continue_list(line) {
        ListContinuation::None => EnterEdit {
            text: format!("{before}{line}\n{after}"),
            cursor: cursor + 1,
        },
        ListContinuation::Continue { prefix } => {
            let new_text = format!("{before}{line}\n{prefix}{after}");
            EnterEdit {
                cursor: cursor + 1 + prefix.len(),
                text: new_text,
            }
        }
        ListContinuation::EndList { replacement } => {
            let new_text = format!("{before}{replacement}{after}");
            EnterEdit {
                cursor: line_start + replacement.len(),
                text: new_text,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_enter, continue_list, ListContinuation};

    fn prefix(line: &str) -> String {
        match continue_list(line) {
            ListContinuation::Continue { prefix } => prefix,
            other => panic!("expected continuation for `{line}`, got {other:?}"),
        }
    }

    #[test]
    fn bullets_continue_with_same_marker_and_indent() {
        assert_eq!(prefix("- milk"), "- ");
        assert_eq!(prefix("  * eggs"), "  * ");
        assert_eq!(prefix("+ flour"), "+ ");
        assert_eq!(prefix("• sugar"), "• ");
    }

    #[test]
    fn checkboxes_continue_unchecked() {
        assert_eq!(prefix("- [x] done thing"), "- [ ] ");
        assert_eq!(prefix("\t- [ ] todo"), "\t- [ ] ");
    }

    #[test]
    fn numbered_items_increment() {
        assert_eq!(prefix("1. first"), "2. ");
        assert_eq!(prefix("   9) ninth"), "   10) ");
    }

    #[test]
    fn empty_items_end_the_list() {
        assert_eq!(
            continue_list("  - "),
            ListContinuation::EndList {
                replacement: "  ".to_string()
            }
        );
        assert_eq!(
            continue_list("- [ ]"),
            ListContinuation::EndList {
                replacement: String::new()
            }
        );
        assert_eq!(
            continue_list("3. "),
            ListContinuation::EndList {
                replacement: String::new()
            }
        );
    }

    #[test]
    fn plain_lines_are_not_lists() {
        assert_eq!(continue_list("hello"), ListContinuation::None);
        assert_eq!(continue_list("-dash"), ListContinuation::None);
        assert_eq!(continue_list("2024.05 report"), ListContinuation::None);
    }

    #[test]
    fn apply_enter_inserts_prefix_and_moves_cursor() {
        let text = "# list\n- one";
        let edit = apply_enter(text, text.len());
        assert_eq!(edit.text, "# list\n- one\n- ");
        assert_eq!(edit.cursor, edit.text.len());
    }

    #[test]
    fn apply_enter_on_empty_item_removes_marker() {
        let text = "- one\n- ";
        let edit = apply_enter(text, text.len());
        assert_eq!(edit.text, "- one\n");
        assert_eq!(edit.cursor, edit.text.len());
    }

    #[test]
    fn apply_enter_splits_plain_line_at_cursor() {
        let edit = apply_enter("ab", 1);
        assert_eq!(edit.text, "a\nb");
        assert_eq!(edit.cursor, 2);
    }
}
