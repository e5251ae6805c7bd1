use crate::filter::LogicalOp;
use crate::operator::FilterOperator;

/// Parse error for filter strings.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParseError(pub String);

impl std::fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter parse error: {}", self.0)
    }
}

impl std::error::Error for FilterParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseValue {
    Quoted(String),
    Null,
}

/// `column~operator~value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: ClauseValue,
}

impl Condition {
    pub fn quoted(column: &str, operator: FilterOperator, value: &str) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: ClauseValue::Quoted(value.to_string()),
        }
    }
}

/// One top-level clause of a filter string.
///
/// A parenthesized clause is a `Group`: two rules of a composite field
/// filter, or the `or` union of a distinct-value selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Simple(Condition),
    Group {
        logical: LogicalOp,
        conditions: Vec<Condition>,
    },
}

/// Parse a `filter` parameter back into its clauses.
///
/// Grammar:
/// - `filter := clause ("~and~" clause)*`, empty string for no clauses
/// - `clause := condition | "(" condition (("~and~" | "~or~") condition)* ")"`
/// - `condition := column "~" token "~" ("'" text "'" | "null")`
///
/// Values are not escaped on the wire, so a quote only closes a value when
/// it is followed by `~`, `)` or the end of input.
pub fn parse_filter(input: &str) -> Result<Vec<Clause>, FilterParseError> {
    let mut parser = Parser { src: input, pos: 0 };
    let mut clauses = Vec::new();

    if input.is_empty() {
        return Ok(clauses);
    }

    loop {
        clauses.push(parser.clause()?);
        if parser.at_end() {
            break;
        }
        if !parser.eat("~and~") {
            return Err(parser.error("expected ~and~ between clauses"));
        }
    }

    Ok(clauses)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: &str) -> FilterParseError {
        FilterParseError(format!("{msg} at offset {}", self.pos))
    }

    fn clause(&mut self) -> Result<Clause, FilterParseError> {
        if !self.eat("(") {
            return Ok(Clause::Simple(self.condition()?));
        }

        let mut conditions = vec![self.condition()?];
        let mut logical = None;
        while !self.eat(")") {
            let op = if self.eat("~and~") {
                LogicalOp::And
            } else if self.eat("~or~") {
                LogicalOp::Or
            } else {
                return Err(self.error("expected ~and~, ~or~ or )"));
            };
            match logical {
                Some(prev) if prev != op => {
                    return Err(self.error("mixed logical operators in one group"));
                }
                _ => logical = Some(op),
            }
            conditions.push(self.condition()?);
        }

        if conditions.len() == 1 {
            return Ok(Clause::Simple(conditions.remove(0)));
        }
        Ok(Clause::Group {
            logical: logical.unwrap_or(LogicalOp::Or),
            conditions,
        })
    }

    fn condition(&mut self) -> Result<Condition, FilterParseError> {
        let column = self.segment()?;
        let token = self.segment()?;
        let operator = FilterOperator::from_token(token)
            .ok_or_else(|| self.error(&format!("unknown operator token: {token}")))?;

        let value = if self.eat("null") {
            ClauseValue::Null
        } else if self.eat("'") {
            ClauseValue::Quoted(self.quoted()?)
        } else {
            return Err(self.error("expected quoted value or null"));
        };

        Ok(Condition {
            column: column.to_string(),
            operator,
            value,
        })
    }

    /// Text up to the next `~`, consuming the separator.
    fn segment(&mut self) -> Result<&'a str, FilterParseError> {
        let rest = self.rest();
        let end = rest
            .find('~')
            .ok_or_else(|| self.error("unterminated condition"))?;
        if end == 0 {
            return Err(self.error("empty column or operator"));
        }
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    fn quoted(&mut self) -> Result<String, FilterParseError> {
        let rest = self.rest();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                continue;
            }
            let closes = match chars.peek() {
                None => true,
                Some((_, next)) => *next == '~' || *next == ')',
            };
            if closes {
                self.pos += i + 1;
                return Ok(rest[..i].to_string());
            }
        }
        Err(self.error("unterminated quoted value"))
    }
}
