//! The statement assembler and the recovering element parser.
//!
//! Statements are the middle layer of the format: `NAME[INDEX][=VALUE]`
//! terminated by `,` (more statements in the same element) or `;` (element
//! ends). The element parser consumes statements, builds typed element
//! records, and recovers from malformed input by discarding the offending
//! element and resynchronizing to the next terminator.

use tracing::{debug, instrument, warn};

use crate::element::{self, Component, Element, Group, Tag, Text, TextKind, MAX_DEPTH};
use crate::primitives::{
    angle_valid, dist_valid, size_valid, Angle, Dist, Layer, Point,
};
use crate::source::{FileSource, Origin, Source, StringSource};
use crate::token::{Token, TokenKind, Tokenizer};
use crate::{ErrorKind, PcbError};

/// A decoded statement value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A bare word: a boolean or an enumerated keyword.
    Word(String),
    /// An integer.
    Int(i32),
    /// A `|`-delimited string.
    Str(String),
    /// Two integers joined by `/`.
    Pair(i32, i32),
}

/// One `NAME[INDEX][=VALUE]` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    /// The statement name, compared case-insensitively.
    pub name: String,
    /// The integer appended directly to the name (`P0`, `CON3`).
    pub index: Option<i32>,
    /// The value following `=`, if any.
    pub value: Option<Value>,
    /// Position of the first character of the name.
    pub origin: Origin,
    /// Whether this is the first statement of an element.
    pub first: bool,
}

impl Statement {
    /// Whether the statement name matches `name`, case-insensitively.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The value, or a syntax error naming the statement.
    pub fn value(&self) -> Result<&Value, PcbError> {
        self.value.as_ref().ok_or_else(|| {
            PcbError::at(
                ErrorKind::Syntax,
                self.origin,
                format!("statement {} has no value", self.name),
            )
        })
    }

    /// Decodes the value as a boolean keyword.
    pub fn bool_value(&self) -> Result<bool, PcbError> {
        match self.value()? {
            Value::Word(word) if word.eq_ignore_ascii_case("true") => Ok(true),
            Value::Word(word) if word.eq_ignore_ascii_case("false") => Ok(false),
            Value::Word(word) => Err(self.format_error(format!("not a boolean: {word}"))),
            Value::Int(_) | Value::Str(_) | Value::Pair(..) => {
                Err(self.format_error("expected a boolean"))
            }
        }
    }

    /// Decodes the value as a plain integer.
    pub fn int_value(&self) -> Result<i32, PcbError> {
        match self.value()? {
            Value::Int(val) => Ok(*val),
            Value::Word(_) | Value::Str(_) | Value::Pair(..) => {
                Err(self.format_error("expected a number"))
            }
        }
    }

    /// Decodes the value as an integer within `min..=max`.
    pub fn int_value_in(&self, min: i32, max: i32) -> Result<i32, PcbError> {
        let val = self.int_value()?;
        if (min..=max).contains(&val) {
            Ok(val)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                self.origin,
                format!("{} out of range: {val} not in {min}..={max}", self.name),
            ))
        }
    }

    /// Decodes the value as a distance.
    pub fn dist_value(&self) -> Result<Dist, PcbError> {
        let val = self.int_value()?;
        if dist_valid(val) {
            Ok(val)
        } else {
            Err(self.range_error(format!("distance out of range: {val}")))
        }
    }

    /// Decodes the value as a non-negative distance.
    pub fn size_value(&self) -> Result<Dist, PcbError> {
        let val = self.int_value()?;
        if size_valid(val) {
            Ok(val)
        } else {
            Err(self.range_error(format!("size out of range: {val}")))
        }
    }

    /// Decodes the value as an angle within one full turn.
    pub fn angle_value(&self) -> Result<Angle, PcbError> {
        let val = self.int_value()?;
        if angle_valid(val) {
            Ok(val)
        } else {
            Err(self.range_error(format!("angle out of range: {val}")))
        }
    }

    /// Decodes the value as a point, both distances in range.
    pub fn point_value(&self) -> Result<Point, PcbError> {
        match self.value()? {
            Value::Pair(x, y) => {
                let point = Point::new(*x, *y);
                if point.valid() {
                    Ok(point)
                } else {
                    Err(self.range_error(format!("point out of range: {x}/{y}")))
                }
            }
            Value::Word(_) | Value::Int(_) | Value::Str(_) => {
                Err(self.format_error("expected a point"))
            }
        }
    }

    /// Decodes the value as a string.
    pub fn str_value(&self) -> Result<String, PcbError> {
        match self.value()? {
            Value::Str(text) => Ok(text.clone()),
            Value::Word(_) | Value::Int(_) | Value::Pair(..) => {
                Err(self.format_error("expected a string"))
            }
        }
    }

    /// Decodes the value as a layer, from its index or its short code.
    pub fn layer_value(&self) -> Result<Layer, PcbError> {
        match self.value()? {
            Value::Int(index) => Layer::try_from(*index)
                .map_err(|_| self.range_error(format!("layer out of range: {index}"))),
            Value::Word(code) => Layer::from_code(code)
                .ok_or_else(|| self.format_error(format!("unknown layer: {code}"))),
            Value::Str(_) | Value::Pair(..) => Err(self.format_error("expected a layer")),
        }
    }

    fn format_error(&self, context: impl Into<String>) -> PcbError {
        let context = context.into();
        PcbError::at(
            ErrorKind::ArgumentFormat,
            self.origin,
            format!("{}: {context}", self.name),
        )
    }

    fn range_error(&self, context: impl Into<String>) -> PcbError {
        let context = context.into();
        PcbError::at(
            ErrorKind::ArgumentRange,
            self.origin,
            format!("{}: {context}", self.name),
        )
    }
}

/// Whether the element parser can recover from an error of this kind by
/// discarding the offending element and resynchronizing.
fn recoverable(kind: ErrorKind) -> bool {
    match kind {
        ErrorKind::Syntax
        | ErrorKind::Underflow
        | ErrorKind::Overflow
        | ErrorKind::EndOfStatement
        | ErrorKind::EndOfElement
        | ErrorKind::ArgumentRange
        | ErrorKind::ArgumentFormat
        | ErrorKind::ArgumentIncomplete => true,
        ErrorKind::Internal
        | ErrorKind::Assertion
        | ErrorKind::Recursion
        | ErrorKind::Io
        | ErrorKind::Eof
        | ErrorKind::Truncated
        | ErrorKind::InvalidState
        | ErrorKind::InputMissing
        | ErrorKind::InputSyntax
        | ErrorKind::FlagsMissing
        | ErrorKind::FlagsSyntax => false,
    }
}

/// What one pass over an input produced.
#[derive(Debug, Default)]
pub struct Parsed {
    /// The successfully parsed top-level elements, in input order.
    pub elements: Vec<Element>,
    /// Whether malformed elements were discarded along the way.
    pub salvaged: bool,
}

/// Parses a whole in-memory document.
pub fn parse_str(input: &str) -> Result<Parsed, PcbError> {
    Parser::from_str(input).run()
}

/// Parses a whole file.
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Parsed, PcbError> {
    Parser::from_file(path)?.run()
}

/// The recursive-descent element parser.
///
/// [`next_element`](Parser::next_element) blocks until one element has been
/// consumed (possibly discarding malformed ones along the way) or the input
/// ends. The [`salvaged`](Parser::salvaged) flag records whether anything
/// was discarded.
#[derive(Debug)]
pub struct Parser<S: Source> {
    tokenizer: Tokenizer<S>,
    text: String,
    /// True at the start of the input and after every consumed `;`.
    element_ended: bool,
    /// Set when an error left the token stream mid-statement.
    needs_sync: bool,
    salvaged: bool,
}

enum Item {
    Element(Element),
    Closing(Tag, Origin),
    End,
}

impl Parser<StringSource> {
    /// Creates a parser over an in-memory string.
    pub fn from_str(input: impl Into<String>) -> Parser<StringSource> {
        Parser::new(Tokenizer::from_str(input))
    }
}

impl Parser<FileSource> {
    /// Creates a parser over a file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Parser<FileSource>, PcbError> {
        Ok(Parser::new(Tokenizer::from_file(path)?))
    }
}

impl<S: Source> Parser<S> {
    /// Creates a parser over an existing tokenizer.
    pub fn new(tokenizer: Tokenizer<S>) -> Parser<S> {
        Parser {
            tokenizer,
            text: String::new(),
            element_ended: true,
            needs_sync: false,
            salvaged: false,
        }
    }

    /// Whether any malformed element has been discarded so far.
    pub fn salvaged(&self) -> bool {
        self.salvaged
    }

    /// The diagnostic name of the underlying source.
    pub fn source_name(&self) -> Option<&str> {
        self.tokenizer.source_name()
    }

    /// Parses the remaining input to completion.
    pub fn run(mut self) -> Result<Parsed, PcbError> {
        let mut elements = Vec::new();
        while let Some(element) = self.next_element()? {
            elements.push(element);
        }
        Ok(Parsed {
            elements,
            salvaged: self.salvaged,
        })
    }

    /// Reads the next token, or `None` at a clean end of input.
    fn token(&mut self) -> Result<Option<Token>, PcbError> {
        match self.tokenizer.next(&mut self.text) {
            Ok(token) => Ok(Some(token)),
            Err(err) if err.kind() == ErrorKind::Eof => Ok(None),
            Err(err) => Err(err.in_source(self.tokenizer.source_name())),
        }
    }

    /// Reads the next token, treating end of input as a truncated statement.
    fn must_token(&mut self) -> Result<Token, PcbError> {
        self.token()?.ok_or_else(|| {
            PcbError::new(ErrorKind::Truncated, "input ended inside a statement")
                .in_source(self.tokenizer.source_name())
        })
    }

    /// Discards tokens up to and including the next terminator.
    fn resync(&mut self) -> Result<(), PcbError> {
        while let Some(token) = self.token()? {
            if token.kind == TokenKind::StmtTerm {
                break;
            }
        }
        self.element_ended = true;
        self.needs_sync = false;
        Ok(())
    }

    /// Flags a syntax error at an unexpected token. Keeps the resync flag
    /// accurate: a terminator already puts the stream back at an element
    /// boundary.
    fn unexpected(&mut self, token: Token, expected: &str) -> PcbError {
        if token.kind == TokenKind::StmtTerm {
            self.element_ended = true;
            self.needs_sync = false;
        } else {
            self.needs_sync = true;
        }
        PcbError::at(
            ErrorKind::Syntax,
            token.origin,
            format!("expected {expected}, found {}", token.kind.as_str()),
        )
    }

    fn int_of(&mut self, token: Token) -> Result<i32, PcbError> {
        token.to_int(&self.text).map_err(|err| {
            self.needs_sync = true;
            err
        })
    }

    /// Reads a statement value plus the token following it.
    fn read_value(&mut self) -> Result<(Value, Token), PcbError> {
        let token = self.must_token()?;
        match token.kind {
            TokenKind::Word => {
                let value = Value::Word(self.text.clone());
                Ok((value, self.must_token()?))
            }
            TokenKind::Str => {
                let value = Value::Str(self.text.clone());
                Ok((value, self.must_token()?))
            }
            TokenKind::Number => {
                let x = self.int_of(token)?;
                let next = self.must_token()?;
                if next.kind != TokenKind::TupleSep {
                    return Ok((Value::Int(x), next));
                }
                let second = self.must_token()?;
                if second.kind != TokenKind::Number {
                    return Err(self.unexpected(second, "the second half of a pair"));
                }
                let y = self.int_of(second)?;
                Ok((Value::Pair(x, y), self.must_token()?))
            }
            TokenKind::StmtSep => {
                self.needs_sync = true;
                Err(PcbError::at(
                    ErrorKind::EndOfStatement,
                    token.origin,
                    "statement ended where a value was expected",
                ))
            }
            TokenKind::StmtTerm => {
                self.element_ended = true;
                self.needs_sync = false;
                Err(PcbError::at(
                    ErrorKind::EndOfElement,
                    token.origin,
                    "element ended where a value was expected",
                ))
            }
            TokenKind::None
            | TokenKind::Invalid
            | TokenKind::ValueSep
            | TokenKind::TupleSep => Err(self.unexpected(token, "a value")),
        }
    }

    /// Reads the next statement.
    ///
    /// With `sync` set, a stream left mid-statement by a previous error is
    /// first discarded up to the next terminator. Returns `None` at a clean
    /// end of input.
    pub fn next_statement(&mut self, sync: bool) -> Result<Option<Statement>, PcbError> {
        if self.needs_sync {
            if !sync {
                return Err(PcbError::new(
                    ErrorKind::InvalidState,
                    "parser left mid-statement by a previous error",
                ));
            }
            self.resync()?;
        }

        let first = self.element_ended;
        let name_token = match self.token()? {
            Some(token) => token,
            None if self.element_ended => return Ok(None),
            None => {
                return Err(PcbError::new(
                    ErrorKind::Truncated,
                    "input ended inside an element",
                )
                .in_source(self.tokenizer.source_name()))
            }
        };
        if name_token.kind != TokenKind::Word {
            return Err(self.unexpected(name_token, "a statement name"));
        }
        let name = self.text.clone();
        let origin = name_token.origin;
        self.element_ended = false;

        let mut index = None;
        let mut token = self.must_token()?;
        if token.kind == TokenKind::Number {
            index = Some(self.int_of(token)?);
            token = self.must_token()?;
        }

        let mut value = None;
        if token.kind == TokenKind::ValueSep {
            let (read, next) = self.read_value()?;
            value = Some(read);
            token = next;
        }

        match token.kind {
            TokenKind::StmtSep => self.element_ended = false,
            TokenKind::StmtTerm => self.element_ended = true,
            TokenKind::None
            | TokenKind::Invalid
            | TokenKind::Word
            | TokenKind::Number
            | TokenKind::Str
            | TokenKind::ValueSep
            | TokenKind::TupleSep => {
                return Err(self.unexpected(token, "a separator or terminator"))
            }
        }

        Ok(Some(Statement {
            name,
            index,
            value,
            origin,
            first,
        }))
    }

    /// Collects the statements of one element, first one tagged `first`.
    fn collect_statements(&mut self) -> Result<Option<Vec<Statement>>, PcbError> {
        let Some(head) = self.next_statement(true)? else {
            return Ok(None);
        };
        let mut stmts = vec![head];
        while !self.element_ended {
            match self.next_statement(false)? {
                Some(stmt) => stmts.push(stmt),
                // next_statement reports mid-element EOF as truncated
                None => {
                    return Err(PcbError::new(
                        ErrorKind::Truncated,
                        "input ended inside an element",
                    ))
                }
            }
        }
        Ok(Some(stmts))
    }

    fn salvage(&mut self, err: &PcbError) {
        warn!(
            "discarding malformed element: {}",
            err.clone().in_source(self.tokenizer.source_name())
        );
        self.salvaged = true;
    }

    /// Reads the next top-level element, or `None` at the end of the input.
    ///
    /// Malformed elements are logged, discarded and counted through
    /// [`salvaged`](Parser::salvaged); only truncated input, I/O failures
    /// and a blown recursion cap abort the parse.
    #[instrument(level = "debug", skip(self))]
    pub fn next_element(&mut self) -> Result<Option<Element>, PcbError> {
        loop {
            match self.parse_item(0)? {
                Item::Element(element) => return Ok(Some(element)),
                Item::End => return Ok(None),
                Item::Closing(_, origin) => {
                    self.salvage(&PcbError::at(
                        ErrorKind::Syntax,
                        origin,
                        "closing tag without an open component or group",
                    ));
                }
            }
        }
    }

    fn parse_item(&mut self, depth: usize) -> Result<Item, PcbError> {
        loop {
            let stmts = match self.collect_statements() {
                Ok(None) => return Ok(Item::End),
                Ok(Some(stmts)) => stmts,
                Err(err) if recoverable(err.kind()) => {
                    self.salvage(&err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let head = &stmts[0];
            let origin = head.origin;

            let Some(tag) = Tag::lookup(&head.name) else {
                self.salvage(&PcbError::at(
                    ErrorKind::Syntax,
                    origin,
                    format!("unknown element tag: {}", head.name),
                ));
                continue;
            };

            let built = match tag {
                Tag::Track => {
                    element::Track::from_statements(origin, &stmts[1..]).map(Element::Track)
                }
                Tag::PadTht => {
                    element::PadTht::from_statements(origin, &stmts[1..]).map(Element::PadTht)
                }
                Tag::PadSmt => {
                    element::PadSmt::from_statements(origin, &stmts[1..]).map(Element::PadSmt)
                }
                Tag::Zone => {
                    element::Zone::from_statements(origin, &stmts[1..]).map(Element::Zone)
                }
                Tag::Text(kind) => {
                    Text::from_statements(kind, origin, &stmts[1..]).map(Element::Text)
                }
                Tag::Circle => {
                    element::Circle::from_statements(origin, &stmts[1..]).map(Element::Circle)
                }
                Tag::BeginComponent => {
                    return self
                        .parse_component(origin, &stmts[1..], depth)
                        .map(Item::Element)
                }
                Tag::BeginGroup => {
                    return self.parse_group(origin, &stmts[1..], depth).map(Item::Element)
                }
                Tag::EndComponent | Tag::EndGroup => return Ok(Item::Closing(tag, origin)),
            };

            match built {
                Ok(element) => return Ok(Item::Element(element)),
                Err(err) if recoverable(err.kind()) => {
                    self.salvage(&err);
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Consumes child elements up to the matching closing tag.
    fn parse_children(
        &mut self,
        origin: Origin,
        closing: Tag,
        depth: usize,
    ) -> Result<Vec<Element>, PcbError> {
        if depth >= MAX_DEPTH {
            return Err(PcbError::at(
                ErrorKind::Recursion,
                origin,
                format!("element nesting deeper than {MAX_DEPTH}"),
            ));
        }
        let mut children = Vec::new();
        loop {
            match self.parse_item(depth + 1)? {
                Item::Element(element) => children.push(element),
                Item::Closing(tag, _) if tag == closing => return Ok(children),
                Item::Closing(_, at) => {
                    self.salvage(&PcbError::at(
                        ErrorKind::Syntax,
                        at,
                        "mismatched closing tag",
                    ));
                }
                Item::End => {
                    return Err(PcbError::at(
                        ErrorKind::Truncated,
                        origin,
                        "input ended before the closing tag",
                    ))
                }
            }
        }
    }

    fn parse_group(
        &mut self,
        origin: Origin,
        extra: &[Statement],
        depth: usize,
    ) -> Result<Element, PcbError> {
        for stmt in extra {
            warn!("unknown group statement skipped: {}", stmt.name);
        }
        let children = self.parse_children(origin, Tag::EndGroup, depth)?;
        debug!("parsed group with {} children", children.len());
        Ok(Element::Group(Group::new(children)))
    }

    fn parse_component(
        &mut self,
        origin: Origin,
        extra: &[Statement],
        depth: usize,
    ) -> Result<Element, PcbError> {
        let mut comment = None;
        let mut use_pickplace = false;
        let mut package = None;
        let mut rotation = 0;
        for stmt in extra {
            let applied = if stmt.is("COMMENT") {
                stmt.str_value().map(|text| comment = Some(text))
            } else if stmt.is("USE_PICKPLACE") {
                stmt.bool_value().map(|flag| use_pickplace = flag)
            } else if stmt.is("PACKAGE") {
                stmt.str_value().map(|text| package = Some(text))
            } else if stmt.is("ROTATION") {
                stmt.angle_value().map(|angle| rotation = angle)
            } else {
                warn!("unknown component statement skipped: {}", stmt.name);
                Ok(())
            };
            // a bad head field keeps its default; the children are still
            // structurally required, so the component itself survives
            if let Err(err) = applied {
                self.salvage(&err);
            }
        }

        let children = self.parse_children(origin, Tag::EndComponent, depth)?;

        let mut text_id = None;
        let mut text_value = None;
        let mut elements = Vec::with_capacity(children.len());
        for child in children {
            if let Element::Text(text) = child {
                match text.kind {
                    TextKind::Id if text_id.is_none() => text_id = Some(text),
                    TextKind::Value if text_value.is_none() => text_value = Some(text),
                    TextKind::Id | TextKind::Value => {
                        self.salvage(&PcbError::at(
                            ErrorKind::Syntax,
                            origin,
                            "duplicate id/value text in component discarded",
                        ));
                    }
                    TextKind::Regular => elements.push(Element::Text(text)),
                }
            } else {
                elements.push(child);
            }
        }
        let text_id = text_id.unwrap_or_else(|| {
            self.salvage(&PcbError::at(
                ErrorKind::Syntax,
                origin,
                "component without an id text, slot defaulted",
            ));
            Text::placeholder(TextKind::Id)
        });
        let text_value = text_value.unwrap_or_else(|| {
            self.salvage(&PcbError::at(
                ErrorKind::Syntax,
                origin,
                "component without a value text, slot defaulted",
            ));
            Text::placeholder(TextKind::Value)
        });

        let component = Component {
            text_id,
            text_value,
            elements,
            comment,
            use_pickplace,
            package,
            rotation,
        };
        Ok(Element::Component(component))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::element::{PadForm, TextStyle};
    use crate::testing::{assert_round_trip, parse_all, parse_one};

    #[test]
    fn statement_shapes() {
        let mut parser = Parser::from_str("TRACK,LAYER=3,P0=100/200,TEXT=|hi|,FLAG;");
        let stmt = parser.next_statement(true).unwrap().unwrap();
        assert_eq!(stmt.name, "TRACK");
        assert!(stmt.first);
        assert_eq!(stmt.index, None);
        assert_eq!(stmt.value, None);

        let stmt = parser.next_statement(false).unwrap().unwrap();
        assert!(stmt.is("layer"));
        assert!(!stmt.first);
        assert_eq!(stmt.value, Some(Value::Int(3)));

        let stmt = parser.next_statement(false).unwrap().unwrap();
        assert_eq!(stmt.name, "P");
        assert_eq!(stmt.index, Some(0));
        assert_eq!(stmt.value, Some(Value::Pair(100, 200)));

        let stmt = parser.next_statement(false).unwrap().unwrap();
        assert_eq!(stmt.value, Some(Value::Str("hi".to_owned())));

        let stmt = parser.next_statement(false).unwrap().unwrap();
        assert_eq!(stmt.name, "FLAG");
        assert_eq!(stmt.value, None);

        assert!(parser.next_statement(true).unwrap().is_none());
    }

    #[test]
    fn statement_missing_value() {
        let mut parser = Parser::from_str("A=,B=1;");
        let err = parser.next_statement(true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndOfStatement);

        let mut parser = Parser::from_str("A=;");
        let err = parser.next_statement(true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndOfElement);
    }

    #[test]
    fn statement_sync_skips_to_terminator() {
        let mut parser = Parser::from_str("A=!,junk=more;B=1;");
        assert!(parser.next_statement(true).is_err());
        // the rest of the broken element is discarded on the next sync
        let stmt = parser.next_statement(true).unwrap().unwrap();
        assert_eq!(stmt.name, "B");
        assert!(stmt.first);
    }

    #[test]
    fn track_with_points() {
        // layer index 3 is bottom copper
        let element = parse_one("TRACK,LAYER=3,WIDTH=2000,P0=100/200,P1=300/400;");
        let Element::Track(track) = element else {
            panic!("expected a track");
        };
        assert_eq!(track.layer, Layer::CopperBottom);
        assert_eq!(track.width, 2000);
        assert_eq!(
            track.points,
            vec![Point::new(100, 200), Point::new(300, 400)]
        );
        assert_eq!(track.clear, 4000);
        assert!(!track.cutout);
        assert!(!track.soldermask);
        assert!(!track.flat_start);
        assert!(!track.flat_end);
    }

    #[test]
    fn text_with_options() {
        let element =
            parse_one("TEXT,LAYER=1,POS=0/0,HEIGHT=1000,TEXT=|hello|,CLEAR=8000,STYLE=NARROW;");
        let Element::Text(text) = element else {
            panic!("expected a text");
        };
        assert_eq!(text.kind, TextKind::Regular);
        assert_eq!(text.layer, Layer::CopperTop);
        assert_eq!(text.position, Point::new(0, 0));
        assert_eq!(text.height, 1000);
        assert_eq!(text.text, "hello");
        assert_eq!(text.clear, 8000);
        assert_eq!(text.style, TextStyle::Narrow);
    }

    #[test]
    fn zone_with_trailing_comment() {
        let parsed = parse_all(
            "ZONE,LAYER=7,WIDTH=100,P0=0/0,P1=0/1000,P2=1000/1000,P3=1000/0; # outline\n",
        );
        assert!(!parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
        let Element::Zone(zone) = &parsed.elements[0] else {
            panic!("expected a zone");
        };
        assert_eq!(zone.layer, Layer::Mechanical);
        assert_eq!(zone.points.len(), 4);
    }

    #[test]
    fn recovery_layer_out_of_range() {
        let parsed = parse_all("TRACK,LAYER=99,WIDTH=2000;TRACK,LAYER=1,WIDTH=2000,P0=0/0,P1=10/0;");
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
        let Element::Track(track) = &parsed.elements[0] else {
            panic!("expected a track");
        };
        assert_eq!(track.layer, Layer::CopperTop);
    }

    #[test]
    fn recovery_bad_number() {
        let parsed = parse_all("TRACK,WIDTH=not_a_number;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;");
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn recovery_missing_required_field() {
        let parsed = parse_all("PAD,LAYER=1,POS=0/0;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;");
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn recovery_unknown_tag() {
        let parsed = parse_all("SPIRAL,LAYER=1;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;");
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn unknown_field_is_skipped_without_salvage() {
        let parsed = parse_all("TRACK,LAYER=1,WIDTH=100,GLITTER=true,P0=0/0,P1=1/1;");
        assert!(!parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn non_contiguous_point_index_salvages() {
        let parsed = parse_all("TRACK,LAYER=1,WIDTH=100,P0=0/0,P2=1/1;");
        assert!(parsed.salvaged);
        assert!(parsed.elements.is_empty());
    }

    #[test]
    fn stray_closing_tag_salvages() {
        let parsed = parse_all("END_GROUP;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;");
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn case_insensitive_tags_and_fields() {
        let upper = parse_one("TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;");
        let lower = parse_one("track,layer=1,width=100,p0=0/0,p1=1/1;");
        let mixed = parse_one("Track,Layer=1,Width=100,P0=0/0,p1=1/1;");
        assert_eq!(upper, lower);
        assert_eq!(upper, mixed);
    }

    #[test]
    fn layer_code_keywords() {
        let element = parse_one("TRACK,LAYER=C2,WIDTH=100;");
        let Element::Track(track) = element else {
            panic!("expected a track");
        };
        assert_eq!(track.layer, Layer::CopperBottom);
    }

    #[test]
    fn comments_and_whitespace_are_insignificant() {
        let plain = parse_one("TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;");
        let spaced = parse_one(
            "TRACK , # tag\n  LAYER = 1 ,\n\tWIDTH = 100 , P0 = 0 / 0 , P1 = 1 / 1 ;",
        );
        assert_eq!(plain, spaced);
    }

    #[test]
    fn group_with_child() {
        let element = parse_one("GROUP;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;END_GROUP;");
        let Element::Group(group) = &element else {
            panic!("expected a group");
        };
        assert_eq!(group.elements.len(), 1);
        assert_round_trip(&[element]);
    }

    #[test]
    fn component_with_slots_and_pad() {
        let element = parse_one(
            "BEGIN_COMPONENT;\
             ID_TEXT,LAYER=2,POS=0/0,HEIGHT=1000,TEXT=|U1|;\
             VALUE_TEXT,LAYER=2,POS=0/100,HEIGHT=1000,TEXT=|MCU|;\
             PAD,LAYER=1,POS=0/0,SIZE=2000,DRILL=800,FORM=2;\
             END_COMPONENT;",
        );
        let Element::Component(component) = &element else {
            panic!("expected a component");
        };
        assert_eq!(component.text_id.text, "U1");
        assert_eq!(component.text_id.kind, TextKind::Id);
        assert_eq!(component.text_value.text, "MCU");
        assert_eq!(component.elements.len(), 1);
        let Element::PadTht(pad) = &component.elements[0] else {
            panic!("expected a THT pad child");
        };
        assert_eq!(pad.form, PadForm::Octagon);
        assert_round_trip(&[element]);
    }

    #[test]
    fn component_head_fields() {
        let element = parse_one(
            "BEGIN_COMPONENT,COMMENT=|main cpu|,USE_PICKPLACE=true,ROTATION=90000;\
             ID_TEXT,LAYER=2,POS=0/0,HEIGHT=1000,TEXT=|U1|;\
             VALUE_TEXT,LAYER=2,POS=0/100,HEIGHT=1000,TEXT=|MCU|;\
             END_COMPONENT;",
        );
        let Element::Component(component) = &element else {
            panic!("expected a component");
        };
        assert_eq!(component.comment.as_deref(), Some("main cpu"));
        assert!(component.use_pickplace);
        assert_eq!(component.rotation, 90_000);
        assert_round_trip(&[element]);
    }

    #[test]
    fn component_missing_slots_is_salvaged() {
        let parsed = parse_all(
            "BEGIN_COMPONENT;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;END_COMPONENT;",
        );
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
        let Element::Component(component) = &parsed.elements[0] else {
            panic!("expected a component");
        };
        assert_eq!(component.text_id.kind, TextKind::Id);
        assert_eq!(component.text_id.text, "");
        assert_eq!(component.text_value.kind, TextKind::Value);
        assert_eq!(component.elements.len(), 1);
    }

    #[test]
    fn free_standing_id_text_keeps_subtype() {
        let element = parse_one("ID_TEXT,LAYER=2,POS=0/0,HEIGHT=1000,TEXT=|U1|;");
        let Element::Text(text) = &element else {
            panic!("expected a text");
        };
        assert_eq!(text.kind, TextKind::Id);
    }

    fn nested_groups(depth: usize) -> String {
        let mut input = String::new();
        for _ in 0..depth {
            input.push_str("GROUP;");
        }
        for _ in 0..depth {
            input.push_str("END_GROUP;");
        }
        input
    }

    #[test]
    fn recursion_cap_allows_the_limit() {
        let parsed = parse_all(&nested_groups(MAX_DEPTH));
        assert!(!parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn recursion_cap_rejects_one_past_the_limit() {
        let err = parse_str(&nested_groups(MAX_DEPTH + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Recursion);
    }

    #[test]
    fn unterminated_element_is_truncated() {
        let err = parse_str("TRACK,LAYER=1,WIDTH=100").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);

        let err = parse_str("GROUP;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn angle_outside_one_turn_salvages() {
        let parsed = parse_all(
            "PAD,LAYER=1,POS=0/0,SIZE=2000,DRILL=800,FORM=1,ROTATION=400000;\
             PAD,LAYER=1,POS=0/0,SIZE=2000,DRILL=800,FORM=1,ROTATION=-360000;",
        );
        assert!(parsed.salvaged);
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_elements() {
        let parsed = parse_all("");
        assert!(parsed.elements.is_empty());
        assert!(!parsed.salvaged);

        let parsed = parse_all("  \n# only a comment\n");
        assert!(parsed.elements.is_empty());
        assert!(!parsed.salvaged);
    }
}
