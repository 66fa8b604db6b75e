//! A small hand-rolled reader/writer for the plant and specification text formats (§6).
//!
//! The grammar is a deliberately small protobuf-text-like notation: `ident { field: value ... }`
//! with `[...]` for repeated fields. It is parsed by a simple tokenizer plus recursive-descent
//! parser rather than pulling in a protobuf toolchain, mirroring the way `strix`'s `options.rs`
//! hand-rolls a `FromStr` parser for `OnTheFlyLimit` instead of reaching for a parser-combinator
//! crate on such a small grammar.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::ops::Bound;

use crate::clock::{ClockConstraint, ClockValue, ComparisonOp};
use crate::error::Error;
use crate::mtl::{Interval, MtlFormula};
use crate::plant::TimedAutomaton;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Num(i64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1 }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, Error> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.chars.next();
                }
                '\n' => {
                    self.chars.next();
                    self.line += 1;
                }
                '#' => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                '{' => {
                    tokens.push((Token::LBrace, self.line));
                    self.chars.next();
                }
                '}' => {
                    tokens.push((Token::RBrace, self.line));
                    self.chars.next();
                }
                '[' => {
                    tokens.push((Token::LBracket, self.line));
                    self.chars.next();
                }
                ']' => {
                    tokens.push((Token::RBracket, self.line));
                    self.chars.next();
                }
                ':' => {
                    tokens.push((Token::Colon, self.line));
                    self.chars.next();
                }
                ',' => {
                    tokens.push((Token::Comma, self.line));
                    self.chars.next();
                }
                '"' => {
                    let line = self.line;
                    self.chars.next();
                    let mut s = String::new();
                    loop {
                        match self.chars.next() {
                            Some('"') => break,
                            Some('\n') => {
                                return Err(Error::Parse {
                                    message: "unterminated string literal".to_string(),
                                    line,
                                })
                            }
                            Some(c) => s.push(c),
                            None => {
                                return Err(Error::Parse {
                                    message: "unterminated string literal".to_string(),
                                    line,
                                })
                            }
                        }
                    }
                    tokens.push((Token::Str(s), line));
                }
                c if c.is_ascii_digit() || c == '-' => {
                    let line = self.line;
                    let mut s = String::new();
                    s.push(c);
                    self.chars.next();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_ascii_digit() {
                            s.push(c);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    let n: i64 = s.parse().map_err(|_| Error::Parse {
                        message: format!("invalid integer literal '{}'", s),
                        line,
                    })?;
                    tokens.push((Token::Num(n), line));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let line = self.line;
                    let mut s = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            s.push(c);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    tokens.push((Token::Ident(s), line));
                }
                other => {
                    return Err(Error::Parse {
                        message: format!("unexpected character '{}'", other),
                        line: self.line,
                    })
                }
            }
        }
        Ok(tokens)
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, usize)>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn line(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, l)| *l).unwrap_or_else(|| {
            self.tokens.last().map(|(_, l)| *l).unwrap_or(1)
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        t
    }

    fn expect(&mut self, expected: &Token) -> Result<(), Error> {
        let line = self.line();
        match self.advance() {
            Some(t) if &t == expected => Ok(()),
            Some(t) => Err(Error::Parse {
                message: format!("expected {:?}, found {:?}", expected, t),
                line,
            }),
            None => Err(Error::Parse {
                message: format!("expected {:?}, found end of input", expected),
                line,
            }),
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let line = self.line();
        match self.advance() {
            Some(Token::Ident(s)) => Ok(s),
            other => Err(Error::Parse {
                message: format!("expected identifier, found {:?}", other),
                line,
            }),
        }
    }

    fn expect_str(&mut self) -> Result<String, Error> {
        let line = self.line();
        match self.advance() {
            Some(Token::Str(s)) => Ok(s),
            other => Err(Error::Parse {
                message: format!("expected string literal, found {:?}", other),
                line,
            }),
        }
    }

    fn expect_num(&mut self) -> Result<i64, Error> {
        let line = self.line();
        match self.advance() {
            Some(Token::Num(n)) => Ok(n),
            other => Err(Error::Parse {
                message: format!("expected number, found {:?}", other),
                line,
            }),
        }
    }

    /// Parse a `field_name:` prefix, returning the field name.
    fn field_name(&mut self) -> Result<String, Error> {
        let name = self.expect_ident()?;
        self.expect(&Token::Colon)?;
        Ok(name)
    }

    /// Parse a `[elem, elem, ...]` repeated string list.
    fn string_list(&mut self) -> Result<Vec<String>, Error> {
        self.expect(&Token::LBracket)?;
        let mut out = Vec::new();
        if self.peek() != Some(&Token::RBracket) {
            loop {
                out.push(self.expect_str()?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RBracket)?;
        Ok(out)
    }
}

fn parse_bound(parser: &mut Parser) -> Result<Bound<ClockValue>, Error> {
    parser.expect(&Token::LBrace)?;
    let mut value: Option<i64> = None;
    let mut strict = false;
    while parser.peek() != Some(&Token::RBrace) {
        match parser.field_name()?.as_str() {
            "value" => value = Some(parser.expect_num()?),
            "bound_type" => {
                let kind = parser.expect_ident()?;
                strict = match kind.as_str() {
                    "STRICT" => true,
                    "WEAK" => false,
                    other => {
                        return Err(Error::Parse {
                            message: format!("unknown bound_type '{}'", other),
                            line: parser.line(),
                        })
                    }
                };
            }
            other => {
                return Err(Error::Parse {
                    message: format!("unknown interval endpoint field '{}'", other),
                    line: parser.line(),
                })
            }
        }
        if parser.peek() == Some(&Token::Comma) {
            parser.advance();
        }
    }
    parser.expect(&Token::RBrace)?;
    let value = value.ok_or_else(|| Error::Parse {
        message: "interval endpoint missing 'value' field".to_string(),
        line: parser.line(),
    })?;
    let v = ClockValue::from_integer(value);
    Ok(if strict { Bound::Excluded(v) } else { Bound::Included(v) })
}

fn parse_interval(parser: &mut Parser) -> Result<Interval, Error> {
    parser.expect(&Token::LBrace)?;
    let mut lower = Bound::Included(ClockValue::from_integer(0));
    let mut upper = Bound::Unbounded;
    while parser.peek() != Some(&Token::RBrace) {
        match parser.field_name()?.as_str() {
            "lower" => lower = parse_bound(parser)?,
            "upper" => upper = parse_bound(parser)?,
            other => {
                return Err(Error::Parse {
                    message: format!("unknown interval field '{}'", other),
                    line: parser.line(),
                })
            }
        }
        if parser.peek() == Some(&Token::Comma) {
            parser.advance();
        }
    }
    parser.expect(&Token::RBrace)?;
    Ok(Interval::new(lower, upper))
}

fn parse_formula(parser: &mut Parser) -> Result<MtlFormula<String>, Error> {
    let line = parser.line();
    let kind = parser.expect_ident()?;
    parser.expect(&Token::LBrace)?;
    let formula = match kind.as_str() {
        "constant" => {
            let name = parser.field_name()?;
            if name != "value" {
                return Err(Error::Parse { message: format!("expected 'value', found '{}'", name), line });
            }
            let value = parser.expect_ident()?;
            match value.as_str() {
                "TRUE" => MtlFormula::True,
                "FALSE" => MtlFormula::False,
                other => {
                    return Err(Error::Parse {
                        message: format!("constant value must be TRUE or FALSE, found '{}'", other),
                        line,
                    })
                }
            }
        }
        "atomic" => {
            let name = parser.field_name()?;
            if name != "symbol" {
                return Err(Error::Parse { message: format!("expected 'symbol', found '{}'", name), line });
            }
            MtlFormula::Atom(parser.expect_str()?)
        }
        "negation" => {
            let name = parser.field_name()?;
            if name != "formula" {
                return Err(Error::Parse { message: format!("expected 'formula', found '{}'", name), line });
            }
            MtlFormula::Neg(Box::new(parse_formula(parser)?))
        }
        "conjunction" => {
            let name = parser.field_name()?;
            if name != "conjuncts" {
                return Err(Error::Parse { message: format!("expected 'conjuncts', found '{}'", name), line });
            }
            let conjuncts = parse_formula_list(parser)?;
            fold_binary(conjuncts, MtlFormula::True, |l, r| MtlFormula::And(Box::new(l), Box::new(r)))
        }
        "disjunction" => {
            let name = parser.field_name()?;
            if name != "disjuncts" {
                return Err(Error::Parse { message: format!("expected 'disjuncts', found '{}'", name), line });
            }
            let disjuncts = parse_formula_list(parser)?;
            fold_binary(disjuncts, MtlFormula::False, |l, r| MtlFormula::Or(Box::new(l), Box::new(r)))
        }
        "until" | "dual_until" => {
            let mut front = None;
            let mut back = None;
            let mut interval = None;
            while parser.peek() != Some(&Token::RBrace) {
                match parser.field_name()?.as_str() {
                    "front" => front = Some(parse_formula(parser)?),
                    "back" => back = Some(parse_formula(parser)?),
                    "interval" => interval = Some(parse_interval(parser)?),
                    other => {
                        return Err(Error::Parse {
                            message: format!("unknown {} field '{}'", kind, other),
                            line: parser.line(),
                        })
                    }
                }
                if parser.peek() == Some(&Token::Comma) {
                    parser.advance();
                }
            }
            let front = front.ok_or_else(|| missing_field(&kind, "front", parser.line()))?;
            let back = back.ok_or_else(|| missing_field(&kind, "back", parser.line()))?;
            let interval = interval.unwrap_or_else(Interval::unbounded);
            if kind == "until" {
                MtlFormula::Until(Box::new(front), interval, Box::new(back))
            } else {
                MtlFormula::DualUntil(Box::new(front), interval, Box::new(back))
            }
        }
        "finally" | "globally" => {
            let mut inner = None;
            let mut interval = None;
            while parser.peek() != Some(&Token::RBrace) {
                match parser.field_name()?.as_str() {
                    "formula" => inner = Some(parse_formula(parser)?),
                    "interval" => interval = Some(parse_interval(parser)?),
                    other => {
                        return Err(Error::Parse {
                            message: format!("unknown {} field '{}'", kind, other),
                            line: parser.line(),
                        })
                    }
                }
                if parser.peek() == Some(&Token::Comma) {
                    parser.advance();
                }
            }
            let inner = inner.ok_or_else(|| missing_field(&kind, "formula", parser.line()))?;
            let interval = interval.unwrap_or_else(Interval::unbounded);
            if kind == "finally" {
                MtlFormula::finally(interval, inner)
            } else {
                MtlFormula::globally(interval, inner)
            }
        }
        other => {
            return Err(Error::Parse {
                message: format!("unknown formula kind '{}'", other),
                line,
            })
        }
    };
    // allow a trailing comma inside the already-consumed field list
    while parser.peek() == Some(&Token::Comma) {
        parser.advance();
    }
    parser.expect(&Token::RBrace)?;
    Ok(formula)
}

fn missing_field(kind: &str, field: &str, line: usize) -> Error {
    Error::Parse { message: format!("{} missing '{}' field", kind, field), line }
}

fn fold_binary<T>(items: Vec<T>, identity: T, combine: impl Fn(T, T) -> T) -> T {
    let mut iter = items.into_iter();
    match iter.next() {
        None => identity,
        Some(first) => iter.fold(first, combine),
    }
}

fn parse_formula_list(parser: &mut Parser) -> Result<Vec<MtlFormula<String>>, Error> {
    parser.expect(&Token::LBracket)?;
    let mut out = Vec::new();
    if parser.peek() != Some(&Token::RBracket) {
        loop {
            out.push(parse_formula(parser)?);
            if parser.peek() == Some(&Token::Comma) {
                parser.advance();
            } else {
                break;
            }
        }
    }
    parser.expect(&Token::RBracket)?;
    Ok(out)
}

fn parse_clock_constraint(parser: &mut Parser) -> Result<(String, ClockConstraint), Error> {
    parser.expect(&Token::LBrace)?;
    let mut clock = None;
    let mut comparator = None;
    let mut value = None;
    while parser.peek() != Some(&Token::RBrace) {
        match parser.field_name()?.as_str() {
            "clock" => clock = Some(parser.expect_str()?),
            "comparator" => comparator = Some(parser.expect_str()?),
            "value" => value = Some(parser.expect_num()?),
            other => {
                return Err(Error::Parse {
                    message: format!("unknown clock_constraint field '{}'", other),
                    line: parser.line(),
                })
            }
        }
        if parser.peek() == Some(&Token::Comma) {
            parser.advance();
        }
    }
    parser.expect(&Token::RBrace)?;
    let line = parser.line();
    let clock = clock.ok_or_else(|| missing_field("clock_constraint", "clock", line))?;
    let comparator = comparator.ok_or_else(|| missing_field("clock_constraint", "comparator", line))?;
    let value = value.ok_or_else(|| missing_field("clock_constraint", "value", line))?;
    Ok((clock, ClockConstraint::new(ComparisonOp::parse(&comparator)?, value)))
}

fn parse_transition(parser: &mut Parser) -> Result<(String, String, Vec<(String, ClockConstraint)>, BTreeSet<String>, String), Error> {
    parser.expect(&Token::LBrace)?;
    let mut source = None;
    let mut symbol = None;
    let mut target = None;
    let mut guard = Vec::new();
    let mut resets = BTreeSet::new();
    while parser.peek() != Some(&Token::RBrace) {
        match parser.field_name()?.as_str() {
            "source" => source = Some(parser.expect_str()?),
            "symbol" => symbol = Some(parser.expect_str()?),
            "target" => target = Some(parser.expect_str()?),
            "clock_constraints" => {
                parser.expect(&Token::LBracket)?;
                if parser.peek() != Some(&Token::RBracket) {
                    loop {
                        guard.push(parse_clock_constraint(parser)?);
                        if parser.peek() == Some(&Token::Comma) {
                            parser.advance();
                        } else {
                            break;
                        }
                    }
                }
                parser.expect(&Token::RBracket)?;
            }
            "clock_resets" => resets = parser.string_list()?.into_iter().collect(),
            other => {
                return Err(Error::Parse {
                    message: format!("unknown transition field '{}'", other),
                    line: parser.line(),
                })
            }
        }
        if parser.peek() == Some(&Token::Comma) {
            parser.advance();
        }
    }
    parser.expect(&Token::RBrace)?;
    let line = parser.line();
    let source = source.ok_or_else(|| missing_field("transition", "source", line))?;
    let symbol = symbol.ok_or_else(|| missing_field("transition", "symbol", line))?;
    let target = target.ok_or_else(|| missing_field("transition", "target", line))?;
    Ok((source, symbol, guard, resets, target))
}

fn parse_plant_body(parser: &mut Parser) -> Result<TimedAutomaton<String, String>, Error> {
    parser.expect(&Token::LBrace)?;
    let mut locations = BTreeSet::new();
    let mut clocks = BTreeSet::new();
    let mut alphabet = BTreeSet::new();
    let mut initial_location = None;
    let mut final_locations = BTreeSet::new();
    let mut transitions = Vec::new();
    while parser.peek() != Some(&Token::RBrace) {
        match parser.field_name()?.as_str() {
            "locations" => locations = parser.string_list()?.into_iter().collect(),
            "clocks" => clocks = parser.string_list()?.into_iter().collect(),
            "alphabet" => alphabet = parser.string_list()?.into_iter().collect(),
            "initial_location" => initial_location = Some(parser.expect_str()?),
            "final_locations" => final_locations = parser.string_list()?.into_iter().collect(),
            "transitions" => {
                parser.expect(&Token::LBracket)?;
                if parser.peek() != Some(&Token::RBracket) {
                    loop {
                        let (source, symbol, guard, resets, target) = parse_transition(parser)?;
                        transitions.push(TimedAutomaton::make_transition(source, symbol, guard, resets, target));
                        if parser.peek() == Some(&Token::Comma) {
                            parser.advance();
                        } else {
                            break;
                        }
                    }
                }
                parser.expect(&Token::RBracket)?;
            }
            other => {
                return Err(Error::Parse {
                    message: format!("unknown plant field '{}'", other),
                    line: parser.line(),
                })
            }
        }
        if parser.peek() == Some(&Token::Comma) {
            parser.advance();
        }
    }
    parser.expect(&Token::RBrace)?;
    let initial_location =
        initial_location.ok_or_else(|| missing_field("plant", "initial_location", parser.line()))?;
    TimedAutomaton::new(locations, clocks, alphabet, initial_location, final_locations, transitions)
}

/// Parse a single timed automaton from its text-format representation.
pub fn parse_plant(input: &str) -> Result<TimedAutomaton<String, String>, Error> {
    let tokens = Tokenizer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    let line = parser.line();
    let kind = parser.expect_ident()?;
    if kind != "plant" {
        return Err(Error::Parse { message: format!("expected 'plant', found '{}'", kind), line });
    }
    parse_plant_body(&mut parser)
}

/// Parse a product-plant document: several automata plus the set of synchronized actions.
pub fn parse_product_plant(input: &str) -> Result<(Vec<TimedAutomaton<String, String>>, BTreeSet<String>), Error> {
    let tokens = Tokenizer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    let line = parser.line();
    let kind = parser.expect_ident()?;
    if kind != "product" {
        return Err(Error::Parse { message: format!("expected 'product', found '{}'", kind), line });
    }
    parser.expect(&Token::LBrace)?;
    let mut synchronized_actions = BTreeSet::new();
    let mut automata = Vec::new();
    while parser.peek() != Some(&Token::RBrace) {
        match parser.field_name()?.as_str() {
            "synchronized_actions" => synchronized_actions = parser.string_list()?.into_iter().collect(),
            "automata" => {
                parser.expect(&Token::LBracket)?;
                if parser.peek() != Some(&Token::RBracket) {
                    loop {
                        let inner_kind = parser.expect_ident()?;
                        if inner_kind != "plant" {
                            return Err(Error::Parse {
                                message: format!("expected 'plant', found '{}'", inner_kind),
                                line: parser.line(),
                            });
                        }
                        automata.push(parse_plant_body(&mut parser)?);
                        if parser.peek() == Some(&Token::Comma) {
                            parser.advance();
                        } else {
                            break;
                        }
                    }
                }
                parser.expect(&Token::RBracket)?;
            }
            other => {
                return Err(Error::Parse {
                    message: format!("unknown product field '{}'", other),
                    line: parser.line(),
                })
            }
        }
        if parser.peek() == Some(&Token::Comma) {
            parser.advance();
        }
    }
    parser.expect(&Token::RBrace)?;
    Ok((automata, synchronized_actions))
}

/// Parse an MTL specification from its text-format representation.
pub fn parse_specification(input: &str) -> Result<MtlFormula<String>, Error> {
    let tokens = Tokenizer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    parse_formula(&mut parser)
}

/// Check that every atomic proposition `formula` refers to is a declared action of
/// `plant_alphabet`, so a misspelled specification atom is rejected at load time instead of
/// being silently treated as always-false by the translator.
pub fn validate_specification_alphabet(
    formula: &MtlFormula<String>,
    plant_alphabet: &BTreeSet<String>,
) -> Result<(), Error> {
    for atom in formula.get_alphabet() {
        if !plant_alphabet.contains(&atom) {
            return Err(Error::UnknownAction(atom));
        }
    }
    Ok(())
}

fn write_string_list(out: &mut String, indent: &str, name: &str, items: impl Iterator<Item = impl std::fmt::Display>) {
    let _ = write!(out, "{}{}: [", indent, name);
    let mut first = true;
    for item in items {
        if !first {
            let _ = write!(out, ", ");
        }
        first = false;
        let _ = write!(out, "\"{}\"", item);
    }
    let _ = writeln!(out, "]");
}

/// Render a timed automaton back into the text format (used by `--visualize-*` and round-trip
/// tests).
pub fn write_plant(plant: &TimedAutomaton<String, String>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "plant {{");
    write_string_list(&mut out, "  ", "locations", plant.locations().iter());
    write_string_list(&mut out, "  ", "clocks", plant.clocks().iter());
    write_string_list(&mut out, "  ", "alphabet", plant.alphabet().iter());
    let _ = writeln!(out, "  initial_location: \"{}\"", plant.initial_location());
    write_string_list(&mut out, "  ", "final_locations", plant.final_locations().iter());
    let _ = writeln!(out, "  transitions: [");
    for t in plant.transitions() {
        let _ = writeln!(out, "    {{");
        let _ = writeln!(out, "      source: \"{}\"", t.source());
        let _ = writeln!(out, "      symbol: \"{}\"", t.action());
        let _ = writeln!(out, "      target: \"{}\"", t.target());
        let _ = writeln!(out, "      clock_constraints: [");
        for (clock, constraint) in t.guard() {
            let _ = writeln!(
                out,
                "        {{ clock: \"{}\" comparator: \"{}\" value: {} }}",
                clock,
                constraint.op(),
                constraint.value()
            );
        }
        let _ = writeln!(out, "      ]");
        write_string_list(&mut out, "      ", "clock_resets", t.resets().iter());
        let _ = writeln!(out, "    }}");
    }
    let _ = writeln!(out, "  ]");
    let _ = writeln!(out, "}}");
    out
}

fn write_interval(out: &mut String, indent: &str, interval: &Interval) {
    let _ = writeln!(out, "{}interval: {{", indent);
    match interval.lower() {
        Bound::Included(v) => {
            let _ = writeln!(out, "{}  lower: {{ value: {} bound_type: WEAK }}", indent, v);
        }
        Bound::Excluded(v) => {
            let _ = writeln!(out, "{}  lower: {{ value: {} bound_type: STRICT }}", indent, v);
        }
        Bound::Unbounded => {}
    }
    match interval.upper() {
        Bound::Included(v) => {
            let _ = writeln!(out, "{}  upper: {{ value: {} bound_type: WEAK }}", indent, v);
        }
        Bound::Excluded(v) => {
            let _ = writeln!(out, "{}  upper: {{ value: {} bound_type: STRICT }}", indent, v);
        }
        Bound::Unbounded => {}
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn write_formula(out: &mut String, indent: &str, formula: &MtlFormula<String>) {
    match formula {
        MtlFormula::True => {
            let _ = writeln!(out, "{}constant {{ value: TRUE }}", indent);
        }
        MtlFormula::False => {
            let _ = writeln!(out, "{}constant {{ value: FALSE }}", indent);
        }
        MtlFormula::Atom(a) => {
            let _ = writeln!(out, "{}atomic {{ symbol: \"{}\" }}", indent, a);
        }
        MtlFormula::Neg(phi) => {
            let _ = writeln!(out, "{}negation {{", indent);
            let _ = write!(out, "{}  formula: ", indent);
            write_formula(out, "", phi);
            let _ = writeln!(out, "{}}}", indent);
        }
        MtlFormula::And(l, r) => {
            let _ = writeln!(out, "{}conjunction {{ conjuncts: [", indent);
            write_formula(out, &format!("{}  ", indent), l);
            write_formula(out, &format!("{}  ", indent), r);
            let _ = writeln!(out, "{}] }}", indent);
        }
        MtlFormula::Or(l, r) => {
            let _ = writeln!(out, "{}disjunction {{ disjuncts: [", indent);
            write_formula(out, &format!("{}  ", indent), l);
            write_formula(out, &format!("{}  ", indent), r);
            let _ = writeln!(out, "{}] }}", indent);
        }
        MtlFormula::Until(front, interval, back) => {
            let _ = writeln!(out, "{}until {{", indent);
            let _ = write!(out, "{}  front: ", indent);
            write_formula(out, "", front);
            let _ = write!(out, "{}  back: ", indent);
            write_formula(out, "", back);
            write_interval(out, &format!("{}  ", indent), interval);
            let _ = writeln!(out, "{}}}", indent);
        }
        MtlFormula::DualUntil(front, interval, back) => {
            let _ = writeln!(out, "{}dual_until {{", indent);
            let _ = write!(out, "{}  front: ", indent);
            write_formula(out, "", front);
            let _ = write!(out, "{}  back: ", indent);
            write_formula(out, "", back);
            write_interval(out, &format!("{}  ", indent), interval);
            let _ = writeln!(out, "{}}}", indent);
        }
    }
}

/// Render an MTL formula back into the text format.
pub fn write_specification(formula: &MtlFormula<String>) -> String {
    let mut out = String::new();
    write_formula(&mut out, "", formula);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_plant() {
        let source = r#"
            plant {
              locations: ["s0", "s1"]
              clocks: ["x"]
              alphabet: ["a"]
              initial_location: "s0"
              final_locations: ["s1"]
              transitions: [
                {
                  source: "s0"
                  symbol: "a"
                  target: "s1"
                  clock_constraints: [ { clock: "x" comparator: ">=" value: 2 } ]
                  clock_resets: ["x"]
                }
              ]
            }
        "#;
        let plant = parse_plant(source).unwrap();
        assert_eq!(plant.locations().len(), 2);
        assert_eq!(plant.transitions().len(), 1);
        let rendered = write_plant(&plant);
        let reparsed = parse_plant(&rendered).unwrap();
        assert_eq!(reparsed.locations(), plant.locations());
        assert_eq!(reparsed.transitions().len(), plant.transitions().len());
    }

    #[test]
    fn parses_nested_until_specification() {
        let source = r#"
            until {
              front: atomic { symbol: "a" }
              back: atomic { symbol: "b" }
              interval: { lower: { value: 0 bound_type: WEAK } upper: { value: 5 bound_type: STRICT } }
            }
        "#;
        let formula = parse_specification(source).unwrap();
        match formula {
            MtlFormula::Until(front, interval, back) => {
                assert_eq!(*front, MtlFormula::Atom("a".to_string()));
                assert_eq!(*back, MtlFormula::Atom("b".to_string()));
                assert_eq!(interval.largest_constant(), 5);
            }
            other => panic!("expected Until, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_comparator() {
        let source = r#"
            plant {
              locations: ["s0"]
              clocks: ["x"]
              alphabet: ["a"]
              initial_location: "s0"
              final_locations: []
              transitions: [
                { source: "s0" symbol: "a" target: "s0"
                  clock_constraints: [ { clock: "x" comparator: "~=" value: 0 } ]
                  clock_resets: [] }
              ]
            }
        "#;
        let err = parse_plant(source).unwrap_err();
        assert!(matches!(err, Error::InvalidClockComparator(_)));
    }

    #[test]
    fn rejects_specification_atom_not_in_plant_alphabet() {
        let formula = MtlFormula::Atom("typo".to_string());
        let plant_alphabet: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let err = validate_specification_alphabet(&formula, &plant_alphabet).unwrap_err();
        assert!(matches!(err, Error::UnknownAction(ref a) if a == "typo"));
    }

    #[test]
    fn accepts_specification_atom_in_plant_alphabet() {
        let formula = MtlFormula::Atom("a".to_string());
        let plant_alphabet: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert!(validate_specification_alphabet(&formula, &plant_alphabet).is_ok());
    }

    #[test]
    fn reports_line_number_on_malformed_input() {
        let source = "plant {\n  locations: [\"s0\"\n";
        let err = parse_plant(source).unwrap_err();
        match err {
            Error::Parse { line, .. } => assert!(line >= 2),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }
}
