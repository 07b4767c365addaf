//! Mapping of diagnostics onto template source locations.

const NEWLINES: [&str; 3] = ["\r\n", "\r", "\n"];

/// A diagnostic resolved against the template source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Line, starting at 1.
    pub line: usize,

    /// Column.
    pub column: usize,

    /// The message, prefixed with the located fragment when one was found.
    pub message: String,
}

/// Locates `offending_input` in `source` and computes the line and column of a diagnostic.
///
/// The fragment is searched verbatim first, and then by its last whitespace-delimited run. Lines are counted using
/// whichever newline convention yields the most lines before the match. Columns on the first line are the character
/// index of the match, and on other lines the distance from the last newline, plus `column_offset` when the two differ.
///
/// When the fragment is empty or cannot be found, the offsets are returned unchanged along with the plain message.
pub fn locate(source: &str, offending_input: &str, line_offset: usize, column_offset: usize, message: &str) -> Location {
    let unresolved = || Location {
        line: line_offset,
        column: column_offset,
        message: message.to_string(),
    };

    if offending_input.is_empty() {
        return unresolved();
    }

    let fragment = if source.contains(offending_input) {
        offending_input
    } else {
        match offending_input.trim_end().rsplit(char::is_whitespace).next() {
            Some(run) if !run.is_empty() => run,
            _ => return unresolved(),
        }
    };

    let Some(index) = source.find(fragment) else {
        return unresolved();
    };

    let before = &source[..index];
    let mut line = line_offset;
    let mut last_newline = 0;
    for newline in NEWLINES {
        let lines = before.matches(newline).count();
        if lines + line_offset > line {
            line = lines + line_offset;
            if let Some(position) = before.rfind(newline) {
                if position > 0 {
                    last_newline = position + newline.len() - 1;
                }
            }
        }
    }

    let mut column = before[last_newline..].chars().count();
    if column != column_offset {
        column += column_offset;
    }

    Location {
        line,
        column,
        message: format!("{}: {}", fragment, message),
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn same_location_for_every_newline_convention() {
        for newline in NEWLINES {
            let source = format!("<div>{}  <span>${{a +}}</span>{}</div>", newline, newline);
            let location = locate(&source, "${a +}", 1, 0, "boom");
            assert_eq!(location.line, 2, "newline {:?}", newline);
            assert_eq!(location.column, 9, "newline {:?}", newline);
            assert_eq!(location.message, "${a +}: boom");
        }
    }

    #[test]
    fn first_line_uses_character_index() {
        let location = locate("<p>${x @ foo}</p>", "${x @ foo}", 1, 0, "Unknown option 'foo'.");
        assert_eq!(location.line, 1);
        assert_eq!(location.column, 3);
        assert_eq!(location.message, "${x @ foo}: Unknown option 'foo'.");
    }

    #[test]
    fn falls_back_to_trailing_run() {
        let source = "<div>\n<p data-sly-foo=\"x\">";
        let location = locate(source, "<p  data-sly-foo=\"x\">", 1, 0, "boom");
        assert_eq!(location.line, 2);
        assert_eq!(location.message, "data-sly-foo=\"x\">: boom");
    }

    #[test]
    fn unresolved_keeps_offsets() {
        assert_eq!(
            locate("<p></p>", "", 3, 4, "boom"),
            Location {
                line: 3,
                column: 4,
                message: "boom".to_string(),
            }
        );
        assert_eq!(locate("<p></p>", "${missing}", 1, 0, "boom").message, "boom");
    }
}
