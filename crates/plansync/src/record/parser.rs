//! Quote-aware cell splitting for export text.

/// Number of quote characters in `text`.
///
/// Escaped quotes inside a quoted field are doubled (`""`), so they add two
/// and leave the parity unchanged: an odd total always means an unterminated
/// quoted field.
pub fn quote_count(text: &str) -> usize {
    text.chars().filter(|&c| c == '"').count()
}

/// Whether `text` forms a complete logical line on its own.
///
/// A line with an odd number of quotes has an open quoted field and needs
/// more physical lines appended (joined with a newline) before it can be
/// split into cells.
pub fn is_complete_line(text: &str) -> bool {
    quote_count(text) % 2 == 0
}

/// Split one logical line into cell values, honoring quoting rules.
///
/// A field wrapped in quotes may contain the separator or embedded newlines;
/// a doubled quote inside a quoted field is an escaped literal quote.
pub fn split_line(line: &str, separator: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == separator {
            cells.push(std::mem::take(&mut cell));
        } else {
            cell.push(c);
        }
    }
    cells.push(cell);
    cells
}

/// Number of cells `line` would split into.
pub fn column_count(line: &str, separator: char) -> usize {
    split_line(line, separator).len()
}

/// Group physical lines into logical lines by quote parity.
///
/// Returns the logical lines of `text` in order. The final element may be an
/// incomplete row when the text ends mid-line or mid-quoted-field; callers
/// that see chunk boundaries decide what to do with it. CRLF line endings are
/// normalized away.
pub fn logical_lines(text: &str) -> Vec<String> {
    // `split('\n')` yields one empty segment for "", which would turn into a
    // phantom empty logical line.
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut buf = String::new();

    let mut segments: Vec<&str> = text.split('\n').collect();
    // A trailing newline produces one empty trailing segment, not a row.
    if text.ends_with('\n') {
        segments.pop();
    }

    for segment in segments {
        let segment = segment.strip_suffix('\r').unwrap_or(segment);
        if !buf.is_empty() {
            buf.push('\n');
        }
        buf.push_str(segment);
        if is_complete_line(&buf) {
            lines.push(std::mem::take(&mut buf));
        }
    }
    // Open quoted field at end of text: keep as incomplete trailing line.
    if !buf.is_empty() {
        lines.push(buf);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_line() {
        assert_eq!(split_line("a,b,c", ','), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_preserves_empty_cells() {
        assert_eq!(split_line("a,,c,", ','), vec!["a", "", "c", ""]);
    }

    #[test]
    fn test_split_quoted_separator() {
        assert_eq!(
            split_line("a,\"b,with,commas\",c", ','),
            vec!["a", "b,with,commas", "c"]
        );
    }

    #[test]
    fn test_split_escaped_quote() {
        assert_eq!(
            split_line("a,\"say \"\"hi\"\"\",c", ','),
            vec!["a", "say \"hi\"", "c"]
        );
    }

    #[test]
    fn test_split_quoted_newline() {
        assert_eq!(
            split_line("a,\"line1\nline2\",c", ','),
            vec!["a", "line1\nline2", "c"]
        );
    }

    #[test]
    fn test_split_alternate_separator() {
        assert_eq!(split_line("a;b;c", ';'), vec!["a", "b", "c"]);
        // Commas are plain data with a semicolon separator.
        assert_eq!(split_line("a,b;c", ';'), vec!["a,b", "c"]);
    }

    #[test]
    fn test_quote_parity() {
        assert!(is_complete_line("a,b,c"));
        assert!(is_complete_line("a,\"b\",c"));
        assert!(!is_complete_line("a,\"open"));
        // Escaped quotes do not change parity.
        assert!(!is_complete_line("a,\"he said \"\"no"));
    }

    #[test]
    fn test_logical_lines_plain() {
        assert_eq!(logical_lines("a,b\nc,d\n"), vec!["a,b", "c,d"]);
    }

    #[test]
    fn test_logical_lines_joins_quoted_newline() {
        let text = "a,\"multi\nline\",b\nnext,row,here\n";
        assert_eq!(
            logical_lines(text),
            vec!["a,\"multi\nline\",b", "next,row,here"]
        );
    }

    #[test]
    fn test_logical_lines_keeps_incomplete_tail() {
        let text = "a,b,c\nd,\"open";
        assert_eq!(logical_lines(text), vec!["a,b,c", "d,\"open"]);
    }

    #[test]
    fn test_logical_lines_empty_input() {
        assert!(logical_lines("").is_empty());
    }

    #[test]
    fn test_logical_lines_crlf() {
        assert_eq!(logical_lines("a,b\r\nc,d\r\n"), vec!["a,b", "c,d"]);
    }
}
