//! Parsing of cell text into an assignment expression.
//!
//! A cell is either a literal or `<anything> := <assignment>`. Keywords and
//! function names are matched case-insensitively; `select` queries keep their
//! original spelling.

use thiserror::Error;

/// Separates a cell's label from its assignment expression.
pub const ASSIGNMENT_MARKER: &str = ":=";

/// Longest string `randomchars` may produce; the text limit of one xlsx cell.
pub const MAX_RANDOM_CHARS: usize = 32_767;

/// Parsed content of one text cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellExpr {
    /// Blank text; contributes nothing.
    Empty,
    Literal(String),
    /// Query whose first column of the first row becomes the value.
    Select(String),
    Random(RandomCall),
    /// The `ignored` keyword; contributes nothing.
    Ignored,
    /// Anything else, passed to the statement builder as raw SQL.
    Opaque(String),
}

/// Built-in random generator invocation with its validated arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomCall {
    Bool,
    Chars(usize),
    Int { low: f64, high: f64 },
    Decimal { low: f64, high: f64, scale: usize },
}

/// Failure to parse a cell, before any cell context is attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("insert and update are not allowed in assignments: {0}")]
    UnsupportedAssignment(String),

    #[error("invalid custom function: {0}")]
    InvalidFunction(String),
}

/// Parses the raw text of a cell.
pub fn parse_cell(text: &str) -> Result<CellExpr, ExpressionError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(CellExpr::Empty);
    }
    match text.split_once(ASSIGNMENT_MARKER) {
        Some((_, assignment)) if !assignment.trim().is_empty() => {
            parse_assignment(assignment.trim())
        }
        _ => Ok(CellExpr::Literal(text.to_string())),
    }
}

/// Parses the right-hand side of `:=`.
pub fn parse_assignment(assignment: &str) -> Result<CellExpr, ExpressionError> {
    let command = assignment.to_lowercase();

    if command.starts_with("insert ") || command.starts_with("update ") {
        return Err(ExpressionError::UnsupportedAssignment(
            assignment.to_string(),
        ));
    }
    if command.starts_with("select ") {
        return Ok(CellExpr::Select(assignment.to_string()));
    }
    if let Some(call) = parse_random(&command)
        .ok_or_else(|| ExpressionError::InvalidFunction(assignment.to_string()))?
    {
        return Ok(CellExpr::Random(call));
    }
    if command == "ignored" {
        return Ok(CellExpr::Ignored);
    }
    Ok(CellExpr::Opaque(assignment.to_string()))
}

/// `Some(None)` when `command` is not a random function, `None` when it is
/// one but malformed.
fn parse_random(command: &str) -> Option<Option<RandomCall>> {
    if command.starts_with("randombool") {
        return Some(Some(RandomCall::Bool));
    }
    if command.starts_with("randomchars") {
        let args = call_args(command, "randomchars", 1)?;
        if args[0] <= 0.0 || args[0].ceil() > MAX_RANDOM_CHARS as f64 {
            return None;
        }
        return Some(Some(RandomCall::Chars(args[0].ceil() as usize)));
    }
    if command.starts_with("randomint") {
        let args = call_args(command, "randomint", 2)?;
        return Some(Some(RandomCall::Int {
            low: args[0],
            high: args[1],
        }));
    }
    let decimal = ["randomdecimal", "randomfloat"]
        .into_iter()
        .find(|name| command.starts_with(name));
    if let Some(name) = decimal {
        let args = call_args(command, name, 3)?;
        if !(args[1] - args[0]).is_finite() {
            return None;
        }
        let scale = args[2].round();
        if !(0.0..=100.0).contains(&scale) {
            return None;
        }
        return Some(Some(RandomCall::Decimal {
            low: args[0],
            high: args[1],
            scale: scale as usize,
        }));
    }
    Some(None)
}

/// Numeric arguments of `name(a,b,...)` when `command` is exactly such a call
/// with `arity` arguments.
fn call_args(command: &str, name: &str, arity: usize) -> Option<Vec<f64>> {
    let open = command.find('(')?;
    let close = open + command[open..].find(')')?;
    let inner = &command[open + 1..close];
    if inner.is_empty() || &command[..open] != name || close + 1 != command.len() {
        return None;
    }
    let args = inner
        .split(',')
        .map(|arg| arg.trim().parse::<f64>().ok().filter(|value| value.is_finite()))
        .collect::<Option<Vec<_>>>()?;
    (args.len() == arity).then_some(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(text: &str) -> ExpressionError {
        ExpressionError::InvalidFunction(text.to_string())
    }

    #[test]
    fn blank_and_plain_text() {
        assert_eq!(parse_cell("   "), Ok(CellExpr::Empty));
        assert_eq!(parse_cell("  Ann "), Ok(CellExpr::Literal("Ann".into())));
        assert_eq!(parse_cell("ratio:="), Ok(CellExpr::Literal("ratio:=".into())));
    }

    #[test]
    fn splits_on_first_marker_only() {
        assert_eq!(
            parse_cell("id := nvl(x, 1) := 2"),
            Ok(CellExpr::Opaque("nvl(x, 1) := 2".into()))
        );
    }

    #[test]
    fn rejects_side_effects_case_insensitively() {
        assert_eq!(
            parse_cell(":= INSERT into t values (1)"),
            Err(ExpressionError::UnsupportedAssignment(
                "INSERT into t values (1)".into()
            ))
        );
        assert!(matches!(
            parse_cell("x:=Update t set a=1"),
            Err(ExpressionError::UnsupportedAssignment(_))
        ));
    }

    #[test]
    fn select_keeps_original_spelling() {
        assert_eq!(
            parse_cell("team := SELECT id FROM teams WHERE title = 'Core'"),
            Ok(CellExpr::Select("SELECT id FROM teams WHERE title = 'Core'".into()))
        );
    }

    #[test]
    fn random_functions() {
        assert_eq!(parse_cell(":=randombool()"), Ok(CellExpr::Random(RandomCall::Bool)));
        assert_eq!(parse_cell(":=RandomChars(5)"), Ok(CellExpr::Random(RandomCall::Chars(5))));
        assert_eq!(parse_cell(":=randomchars(2.5)"), Ok(CellExpr::Random(RandomCall::Chars(3))));
        assert_eq!(
            parse_cell(":=randomint(10, 1)"),
            Ok(CellExpr::Random(RandomCall::Int { low: 10.0, high: 1.0 }))
        );
        assert_eq!(
            parse_cell(":=randomfloat(1,2,1.6)"),
            Ok(CellExpr::Random(RandomCall::Decimal {
                low: 1.0,
                high: 2.0,
                scale: 2
            }))
        );
    }

    #[test]
    fn malformed_random_functions() {
        assert_eq!(parse_cell(":=randomint(1)"), Err(invalid("randomint(1)")));
        assert_eq!(parse_cell(":=randomint(1,2)x"), Err(invalid("randomint(1,2)x")));
        assert_eq!(parse_cell(":=randomint(a,2)"), Err(invalid("randomint(a,2)")));
        assert_eq!(parse_cell(":=randomint()"), Err(invalid("randomint()")));
        assert_eq!(parse_cell(":=randomints(1,2)"), Err(invalid("randomints(1,2)")));
        assert_eq!(parse_cell(":=randomchars(0)"), Err(invalid("randomchars(0)")));
        assert_eq!(
            parse_cell(":=randomdecimal(1,2,-1)"),
            Err(invalid("randomdecimal(1,2,-1)"))
        );
    }

    #[test]
    fn randomchars_length_is_capped_at_cell_limit() {
        assert_eq!(
            parse_cell(":=randomchars(32767)"),
            Ok(CellExpr::Random(RandomCall::Chars(MAX_RANDOM_CHARS)))
        );
        assert_eq!(
            parse_cell(":=randomchars(32766.5)"),
            Ok(CellExpr::Random(RandomCall::Chars(32_767)))
        );
        assert_eq!(parse_cell(":=randomchars(32768)"), Err(invalid("randomchars(32768)")));
        assert_eq!(parse_cell(":=randomchars(1e15)"), Err(invalid("randomchars(1e15)")));
    }

    #[test]
    fn randomdecimal_range_width_must_be_finite() {
        assert_eq!(
            parse_cell(":=randomdecimal(-1e308,1e308,2)"),
            Err(invalid("randomdecimal(-1e308,1e308,2)"))
        );
        assert!(matches!(
            parse_cell(":=randomdecimal(-1e300,1e300,2)"),
            Ok(CellExpr::Random(RandomCall::Decimal { .. }))
        ));
    }

    #[test]
    fn ignored_and_opaque_fragments() {
        assert_eq!(parse_cell("id := Ignored"), Ok(CellExpr::Ignored));
        assert_eq!(
            parse_cell("created := sysdate"),
            Ok(CellExpr::Opaque("sysdate".into()))
        );
    }
}
