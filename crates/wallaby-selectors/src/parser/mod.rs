//! Recursive-descent selector parser.
//!
//! Grammar per [§ 4 Selector syntax](https://www.w3.org/TR/selectors-3/#w3cselgrammar),
//! precedence high to low: identifier-or-string, simple selector sequence
//! (type selector plus a run of id/class/attribute/pseudo qualifiers,
//! folded by intersection), selector (sequences joined by combinators),
//! selector group (selectors joined by `,`).
//!
//! The parser is a single forward-moving cursor over an immutable string
//! slice. The grammar is LL(1) with bounded lookahead, so there is no
//! backtracking: every production either fully consumes its grammar unit
//! or fails, and the first failure aborts the whole parse. Errors carry
//! the unconsumed remainder of the input at the point of failure.

use std::sync::Arc;

use wallaby_dom::Tag;

use crate::error::SelectorError;
use crate::selector::{
    AttributeOp, AttributeSelector, BinaryOp, NthSelector, Selector, SelectorTree, TextOp,
    TextSelector, UnaryOp,
};

/// Parse a selector string into a matcher tree.
///
/// The whole input must be consumed; trailing non-whitespace input is an
/// error. When `retain_source` is set, the original string is kept on the
/// resulting [`SelectorTree`] for caller-side diagnostics.
///
/// # Errors
///
/// Returns [`SelectorError::Syntax`] for any grammar violation, with the
/// unconsumed remainder of the input attached, or
/// [`SelectorError::Construction`] if a production yields a structurally
/// invalid node payload (e.g. an empty attribute value).
pub fn parse_selector(input: &str, retain_source: bool) -> Result<SelectorTree, SelectorError> {
    let mut parser = Parser::new(input);
    let root = parser.parse_selector_group()?;
    if !parser.at_end() {
        return Err(parser.fail("unexpected trailing input"));
    }
    let source = retain_source.then(|| input.to_string());
    Ok(SelectorTree::new(Arc::new(root), source))
}

/// Check if a character can start an identifier.
const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Characters that terminate a backslash escape inside an identifier.
const fn is_escape_terminator(c: char) -> bool {
    c.is_ascii_whitespace() || c.is_ascii_punctuation()
}

/// The parser: an input slice and a monotonically advancing byte offset.
/// No state beyond the cursor and the recursive call stack.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Parser<'a> {
        Parser { input, pos: 0 }
    }

    /// The unconsumed remainder of the input.
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume and return the next character.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            let _ = self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.fail(format!("expected {expected:?}")))
        }
    }

    /// Skip ASCII whitespace; report whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            let _ = self.bump();
        }
        self.pos != start
    }

    /// Build a syntax error at the current cursor position.
    fn fail(&self, message: impl Into<String>) -> SelectorError {
        SelectorError::Syntax {
            message: message.into(),
            remaining: self.rest().to_string(),
        }
    }

    /// selector-group: selectors joined by `,`, folded into a union chain.
    fn parse_selector_group(&mut self) -> Result<Selector, SelectorError> {
        let mut result = self.parse_complex_selector()?;
        while self.eat(',') {
            let right = self.parse_complex_selector()?;
            result = Selector::binary(BinaryOp::Union, Arc::new(result), Arc::new(right));
        }
        Ok(result)
    }

    /// selector: simple selector sequences joined by combinators.
    ///
    /// Plain whitespace between sequences is the descendant combinator;
    /// `>`, `+` and `~` are child, adjacent-sibling and general-sibling.
    /// A symbol combinator with whitespace on exactly one side is
    /// rejected.
    fn parse_complex_selector(&mut self) -> Result<Selector, SelectorError> {
        let _ = self.skip_whitespace();
        let mut result = self.parse_simple_selector_sequence()?;
        loop {
            let space_before = self.skip_whitespace();
            let Some(c) = self.peek() else {
                break;
            };
            if c == ',' || c == ')' {
                break;
            }
            let symbol_op = match c {
                '>' => Some(BinaryOp::Child),
                '+' => Some(BinaryOp::Adjacent),
                '~' => Some(BinaryOp::Sibling),
                _ => None,
            };
            if let Some(op) = symbol_op {
                let _ = self.bump();
                let space_after = self.skip_whitespace();
                if self.at_end() {
                    return Err(self.fail("expected selector after combinator"));
                }
                if space_before != space_after {
                    return Err(self.fail(
                        "combinator must have whitespace on both sides or on neither",
                    ));
                }
                let right = self.parse_simple_selector_sequence()?;
                result = Selector::binary(op, Arc::new(result), Arc::new(right));
            } else if space_before {
                let right = self.parse_simple_selector_sequence()?;
                result = Selector::binary(BinaryOp::Descendant, Arc::new(result), Arc::new(right));
            } else {
                // Not a character this production owns; the caller (or the
                // top level's full-consumption check) deals with it.
                break;
            }
        }
        Ok(result)
    }

    /// simple-selector-sequence: an optional type selector followed by a
    /// run of `#id`, `.class`, `[attr]` and `:pseudo` qualifiers, folded
    /// with intersection.
    ///
    /// A leading `*` is a standalone universal selector and terminates
    /// the sequence immediately. A pseudo-class with no preceding
    /// qualifier is wrapped as `Intersection(Dummy, pseudo)` so that
    /// candidate pre-filtering by tag or attribute still has a usable
    /// left-hand operand.
    fn parse_simple_selector_sequence(&mut self) -> Result<Selector, SelectorError> {
        let Some(first) = self.peek() else {
            return Err(self.fail("expected selector, found end of input"));
        };

        if first == '*' {
            let _ = self.bump();
            return Ok(Selector::Dummy);
        }

        let mut result: Option<Selector> = None;
        if is_ident_start(first) || first == '\\' || first == '&' {
            let name = self.parse_identifier()?;
            result = Some(Selector::Tag(Tag::from_name(&name)));
        }

        loop {
            match self.peek() {
                Some('#') => {
                    let _ = self.bump();
                    let id = self.parse_identifier()?;
                    let sel = Selector::Attribute(AttributeSelector::new(
                        AttributeOp::Equals,
                        "id",
                        Some(id),
                    )?);
                    result = Some(intersect(result, sel));
                }
                Some('.') => {
                    let _ = self.bump();
                    let class = self.parse_identifier()?;
                    let sel = Selector::Attribute(AttributeSelector::new(
                        AttributeOp::Includes,
                        "class",
                        Some(class),
                    )?);
                    result = Some(intersect(result, sel));
                }
                Some('[') => {
                    let _ = self.bump();
                    let sel = self.parse_attribute_selector()?;
                    result = Some(intersect(result, sel));
                }
                Some(':') => {
                    let _ = self.bump();
                    let sel = self.parse_pseudo_class()?;
                    // An unqualified pseudo-class still needs an indexable
                    // left-hand operand.
                    let wrapped = match result.take() {
                        None => Selector::binary(
                            BinaryOp::Intersection,
                            Arc::new(Selector::Dummy),
                            Arc::new(sel),
                        ),
                        Some(prev) => intersect(Some(prev), sel),
                    };
                    result = Some(wrapped);
                }
                _ => break,
            }
        }

        result.ok_or_else(|| self.fail("expected selector"))
    }

    /// Attribute selector, after the opening `[` has been consumed.
    fn parse_attribute_selector(&mut self) -> Result<Selector, SelectorError> {
        if self.peek() == Some('^') {
            // Deliberately unsupported: prefix matching on the attribute
            // *name* would complicate the grammar for little gain.
            return Err(self.fail("prefix attribute-name matching ([^...]) is not supported"));
        }
        let name = self.parse_identifier()?;

        let op = match self.peek() {
            Some(']') => {
                let _ = self.bump();
                return Ok(Selector::Attribute(AttributeSelector::new(
                    AttributeOp::Exists,
                    name,
                    None,
                )?));
            }
            Some('=') => {
                let _ = self.bump();
                AttributeOp::Equals
            }
            Some('~') => {
                let _ = self.bump();
                self.expect('=')?;
                AttributeOp::Includes
            }
            Some('|') => {
                let _ = self.bump();
                self.expect('=')?;
                AttributeOp::DashMatch
            }
            Some('^') => {
                let _ = self.bump();
                self.expect('=')?;
                AttributeOp::PrefixMatch
            }
            Some('$') => {
                let _ = self.bump();
                self.expect('=')?;
                AttributeOp::SuffixMatch
            }
            Some('*') => {
                let _ = self.bump();
                self.expect('=')?;
                AttributeOp::SubstringMatch
            }
            _ => return Err(self.fail("expected attribute operator or ']'")),
        };

        let value = match self.peek() {
            Some('\'' | '"') => self.parse_string()?,
            _ => self.parse_identifier()?,
        };
        if !self.eat(']') {
            return Err(self.fail("unterminated attribute selector, expected ']'"));
        }
        Ok(Selector::Attribute(AttributeSelector::new(
            op,
            name,
            Some(value),
        )?))
    }

    /// Pseudo-class, after the `:` has been consumed. Names are
    /// lowercase-normalized before dispatch; unknown names are hard
    /// errors.
    fn parse_pseudo_class(&mut self) -> Result<Selector, SelectorError> {
        let name = self.parse_identifier()?.to_ascii_lowercase();
        match name.as_str() {
            "not" | "has" | "haschild" => {
                let op = match name.as_str() {
                    "not" => UnaryOp::Not,
                    "has" => UnaryOp::HasDescendant,
                    _ => UnaryOp::HasChild,
                };
                self.expect('(')?;
                let inner = self.parse_selector_group()?;
                self.expect(')')?;
                Ok(Selector::unary(op, Arc::new(inner)))
            }
            "contains" | "containsown" | "matches" | "matchesown" => {
                let op = match name.as_str() {
                    "contains" => TextOp::Contains,
                    "containsown" => TextOp::ContainsOwn,
                    "matches" => TextOp::Matches,
                    _ => TextOp::MatchesOwn,
                };
                self.expect('(')?;
                let _ = self.skip_whitespace();
                let value = match self.peek() {
                    Some('\'' | '"') => self.parse_string()?,
                    _ => self.parse_identifier()?,
                };
                let _ = self.skip_whitespace();
                self.expect(')')?;
                Ok(Selector::Text(TextSelector::new(op, value)?))
            }
            "nth-child" => self.parse_nth(false, false),
            "nth-last-child" => self.parse_nth(true, false),
            "nth-of-type" => self.parse_nth(false, true),
            "nth-last-of-type" => self.parse_nth(true, true),
            "first-child" => Ok(nth_exact(1, false, false)),
            "last-child" => Ok(nth_exact(1, true, false)),
            "first-of-type" => Ok(nth_exact(1, false, true)),
            "last-of-type" => Ok(nth_exact(1, true, true)),
            "only-child" => Ok(Selector::Only { of_type: false }),
            "only-of-type" => Ok(Selector::Only { of_type: true }),
            "empty" => Ok(Selector::Empty),
            _ => Err(self.fail(format!("unknown pseudo-class {name:?}"))),
        }
    }

    /// `nth-*` pseudo-class argument: a parenthesized `An+B` expression.
    fn parse_nth(&mut self, from_last: bool, of_type: bool) -> Result<Selector, SelectorError> {
        self.expect('(')?;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != ')') {
            let _ = self.bump();
        }
        if !self.eat(')') {
            return Err(self.fail("unterminated nth expression, expected ')'"));
        }
        // The argument sits between `start` and the consumed `)`.
        let raw: String = self.input[start..self.pos - 1]
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let (step, offset) = self.parse_nth_argument(&raw)?;
        Ok(Selector::Nth(NthSelector {
            step,
            offset,
            from_last,
            of_type,
        }))
    }

    /// The five textual forms of `An+B`: `odd`, `even`, a bare integer,
    /// `n` with an optional signed offset, and the full `<int>n<sign><int>`.
    ///
    /// A bare `-` or `+` coefficient means a step of -1 or +1.
    fn parse_nth_argument(&self, arg: &str) -> Result<(i32, i32), SelectorError> {
        match arg {
            "" => Err(self.fail("empty nth expression")),
            "odd" => Ok((2, 1)),
            "even" => Ok((2, 0)),
            _ => match arg.find('n') {
                None => Ok((0, self.parse_signed_int(arg)?)),
                Some(split) => {
                    let (lhs, rhs) = (&arg[..split], &arg[split + 1..]);
                    let step = match lhs {
                        "" | "+" => 1,
                        "-" => -1,
                        _ => self.parse_signed_int(lhs)?,
                    };
                    let offset = if rhs.is_empty() {
                        0
                    } else {
                        if !rhs.starts_with(['+', '-']) {
                            return Err(
                                self.fail(format!("malformed nth expression offset {rhs:?}"))
                            );
                        }
                        self.parse_signed_int(rhs)?
                    };
                    Ok((step, offset))
                }
            },
        }
    }

    /// An optionally signed run of ASCII digits, nothing else.
    fn parse_signed_int(&self, s: &str) -> Result<i32, SelectorError> {
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s.strip_prefix('+').unwrap_or(s)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.fail(format!("malformed integer {s:?} in nth expression")));
        }
        digits
            .parse::<i32>()
            .map(|value| sign * value)
            .map_err(|_| self.fail(format!("integer {s:?} out of range in nth expression")))
    }

    /// A string literal wrapped in matching `'` or `"` quotes.
    ///
    /// The scan stops at the first occurrence of the quote character not
    /// immediately preceded by `\`. No unescaping is performed: an
    /// escaped quote keeps its backslash in the extracted value.
    fn parse_string(&mut self) -> Result<String, SelectorError> {
        let Some(quote) = self.bump() else {
            return Err(self.fail("expected string, found end of input"));
        };
        let rest = self.rest();
        let mut end = None;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            if c == quote && !escaped {
                end = Some(i);
                break;
            }
            escaped = c == '\\';
        }
        let Some(end) = end else {
            return Err(self.fail(format!("unterminated string, expected closing {quote:?}")));
        };
        if end == 0 {
            return Err(self.fail("empty string"));
        }
        let value = rest[..end].to_string();
        self.pos += end + quote.len_utf8();
        Ok(value)
    }

    /// An identifier: ASCII alphabetic or `_` start, then alphanumeric,
    /// `-` or `_` continuation. Two escape mechanisms are tolerated
    /// inline and copied through verbatim: HTML-style character
    /// references (`&...;`, through the closing `;`) and backslash
    /// escapes (through the next delimiter or whitespace character).
    fn parse_identifier(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(c)
                    if (out.is_empty() && is_ident_start(c))
                        || (!out.is_empty() && is_ident_char(c)) =>
                {
                    out.push(c);
                    let _ = self.bump();
                }
                Some('&') => {
                    out.push('&');
                    let _ = self.bump();
                    loop {
                        match self.bump() {
                            Some(c) => {
                                out.push(c);
                                if c == ';' {
                                    break;
                                }
                            }
                            None => {
                                return Err(
                                    self.fail("unterminated character reference in identifier")
                                );
                            }
                        }
                    }
                }
                Some('\\') => {
                    out.push('\\');
                    let _ = self.bump();
                    while let Some(c) = self.bump() {
                        out.push(c);
                        if is_escape_terminator(c) {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        if out.is_empty() {
            Err(self.fail("expected identifier"))
        } else {
            Ok(out)
        }
    }
}

/// Fold a qualifier into the sequence accumulated so far.
fn intersect(result: Option<Selector>, sel: Selector) -> Selector {
    match result {
        None => sel,
        Some(prev) => Selector::binary(BinaryOp::Intersection, Arc::new(prev), Arc::new(sel)),
    }
}

/// Degenerate structural form: exact position, `step = 0`.
const fn nth_exact(offset: i32, from_last: bool, of_type: bool) -> Selector {
    Selector::Nth(NthSelector {
        step: 0,
        offset,
        from_last,
        of_type,
    })
}
