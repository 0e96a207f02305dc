#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Diagnostic, ErrorTip};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod semantic;

extern crate regex;

/// A byte offset into a named source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    /// Returns a span covering `self` through the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }

    /// Zero-width span sitting at the end of `self`.
    pub fn end_point(&self) -> Span {
        Span {
            start: self.end.clone(),
            end: self.end.clone(),
        }
    }
}

/// Finds the 1-based line number, the line text and the column of `position` in `source`.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    if pos > source.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((line_number, line.to_string(), pos - start));
        }

        start = end;
        line_number += 1;
    }

    // Offsets pointing at the very end of the source belong to the last line.
    let last = source.lines().last().unwrap_or("");
    Some((line_number.max(2) - 1, last.to_string(), last.len()))
}

/// Renders a diagnostic as a caret excerpt:
///
/// ```text
/// error[2002]: UnresolvedName (Name `y` could not be resolved)
/// -> main.lang
///    |
/// 20 | let a = y;
///    | --------^
/// ```
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &str) -> String {
    let position = diagnostic.get_position();
    let mut rendered = String::new();

    let header = if let ErrorTip::None = diagnostic.get_tip() {
        format!(
            "{}[{}]: {}",
            diagnostic.severity(),
            diagnostic.code().number(),
            diagnostic.get_error_name()
        )
    } else {
        format!(
            "{}[{}]: {} ({})",
            diagnostic.severity(),
            diagnostic.code().number(),
            diagnostic.get_error_name(),
            diagnostic.get_tip()
        )
    };
    rendered.push_str(&header);
    rendered.push('\n');
    rendered.push_str(&format!("-> {}\n", position.1));

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.0) else {
        return rendered;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    rendered.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    rendered.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    rendered.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    rendered
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string.chars().take_while(|c| *c == ' ').count();
    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        errors::errors::{Diagnostic, ErrorImpl},
        Position, Span,
    };

    #[test]
    fn test_get_line_at_position() {
        let source = "Hello, world!\nsecond\nthird\nTesting { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(source, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(source, 35).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_get_line_past_end() {
        assert!(super::get_line_at_position("abc", 10).is_none());
    }

    #[test]
    fn test_render_diagnostic_points_at_column() {
        let file = Rc::new("main.lang".to_string());
        let source = "let a = 1;\nlet b = y;\n";
        let diagnostic = Diagnostic::new(
            ErrorImpl::UnresolvedName {
                name: "y".to_string(),
            },
            Span {
                start: Position(19, Rc::clone(&file)),
                end: Position(20, file),
            },
        );

        let rendered = super::render_diagnostic(&diagnostic, source);
        assert!(rendered.starts_with("error[2002]: UnresolvedName"));
        assert!(rendered.contains("2 | let b = y;"));
        assert!(rendered.contains("|"));
        assert!(rendered.trim_end().ends_with("--------^"));
    }
}
