#![allow(clippy::module_inception)]

use std::{fmt::Display, rc::Rc};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod inference;
pub mod macros;
pub mod symbols;

pub use compiler::compiler::generate;

/// A byte offset into a named source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.1, self.0)
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
}

/// Finds the line containing `position`.
///
/// Returns the 1-based line number, the line text and the offset of the
/// position within that line.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    if pos >= source.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    None
}

/// Renders an error with its file, line, column and a source excerpt.
pub fn format_error(error: &Error, source: &str) -> String {
    /*
        Error: message
        -> main.tav:20:9
           |
        20 | let a = #;
           | --------^
    */

    let position = error.get_position();
    let mut report = if let ErrorTip::None = error.get_tip() {
        format!("Error: {}\n", error.get_error_name())
    } else {
        format!("Error: {} ({})\n", error.get_error_name(), error.get_tip())
    };

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.0) else {
        report.push_str(&format!("-> {}\n", position.1));
        return report;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    report.push_str(&format!("-> {}:{}:{}\n", position.1, line, line_pos + 1));
    report.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    report.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    report.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    report
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        errors::errors::{Error, ErrorImpl},
        Position,
    };

    const SOURCE: &str = "Hello, world!\nfn main() -> i32 {\n    return x;\n}\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 44).unwrap();
        assert_eq!(line_number, 3);
        assert_eq!(line, "    return x;\n");
        assert_eq!(line_pos, 11);

        assert!(super::get_line_at_position(SOURCE, 500).is_none());
    }

    #[test]
    fn test_format_error_points_at_column() {
        let error = Error::new(
            ErrorImpl::SymbolNotFound {
                identifier: "x".to_string(),
            },
            Position(44, Rc::new("main.tav".to_string())),
        );

        let report = super::format_error(&error, SOURCE);
        let lines: Vec<&str> = report.lines().collect();

        assert!(lines[0].starts_with("Error: SymbolNotFound"));
        assert_eq!(lines[1], "-> main.tav:3:12");
        assert_eq!(lines[3], "3 | return x;");
        assert_eq!(lines[4], "  | -------^");
    }

    #[test]
    fn test_format_error_without_excerpt() {
        let error = Error::new(ErrorImpl::BreakOutsideLoop, Position::null());
        let report = super::format_error(&error, "");

        assert!(report.contains("BreakOutsideLoop"));
        assert!(report.contains("-> <null>"));
    }
}
