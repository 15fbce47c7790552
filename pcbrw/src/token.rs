//! The streaming tokenizer: a character-class state machine turning bytes
//! into typed tokens with exact input positions.

use crate::source::{Origin, Position, Source};
use crate::{ErrorKind, PcbError};

/// The statement separator, between statements of one element.
pub const STATEMENT_SEPARATOR: char = ',';
/// The statement terminator, ending an element.
pub const STATEMENT_TERMINATOR: char = ';';
/// Separates a statement name from its value.
pub const VALUE_SEPARATOR: char = '=';
/// Separates the two halves of a point value.
pub const TUPLE_SEPARATOR: char = '/';
/// Delimits string values; the format has no escape for it.
pub const STRING_DELIMITER: char = '|';
/// Starts a comment running to the end of the line.
pub const COMMENT_PREFIX: char = '#';

/// The tokenizer state after consuming a character.
///
/// The machine is a closed set of twelve states; [`State::next`] is the
/// transition function, [`State::recorded`] says whether the current
/// character belongs to the token text, and [`State::completes`] whether a
/// transition finishes the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Between tokens, consuming whitespace.
    Scanning,
    /// On a character no other state accepts.
    Invalid,
    /// Inside a `#` comment.
    Comment,
    /// Inside a word (letters and underscores).
    Word,
    /// Inside a number (digits, or a leading minus).
    Number,
    /// On the opening string delimiter.
    StringStart,
    /// Inside a string body.
    StringBody,
    /// On the closing string delimiter or the line break cutting it short.
    StringEnd,
    /// On `=`.
    ValueSep,
    /// On `/`.
    TupleSep,
    /// On `,`.
    StmtSep,
    /// On `;`.
    StmtTerm,
}

impl State {
    /// The state for the first character of the input.
    pub fn first(chr: u8) -> State {
        State::Scanning.next(chr)
    }

    /// The state after consuming `chr` in `self`.
    pub fn next(self, chr: u8) -> State {
        // Strings swallow everything up to the delimiter or end of line.
        if self == State::StringStart || self == State::StringBody {
            return if chr == b'|' || chr == b'\n' || chr == b'\r' {
                State::StringEnd
            } else {
                State::StringBody
            };
        }

        // Comments run to the end of the line.
        if (self == State::Comment && chr != b'\n' && chr != b'\r') || chr == b'#' {
            return State::Comment;
        }

        match chr {
            b' ' | b'\t' | b'\n' | b'\r' => State::Scanning,
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => State::Word,
            b'0'..=b'9' => State::Number,
            b'-' if self != State::Number && self != State::Word => State::Number,
            b'|' => State::StringStart,
            b'=' => State::ValueSep,
            b'/' => State::TupleSep,
            b',' => State::StmtSep,
            b';' => State::StmtTerm,
            _ => State::Invalid,
        }
    }

    /// Whether the current character is appended to the token text.
    pub fn recorded(self) -> bool {
        match self {
            State::Invalid
            | State::Word
            | State::Number
            | State::StringBody
            | State::ValueSep
            | State::TupleSep
            | State::StmtSep
            | State::StmtTerm => true,
            State::Scanning | State::Comment | State::StringStart | State::StringEnd => false,
        }
    }

    /// Whether moving from `self` to `next` completes the token.
    pub fn completes(self, next: State) -> bool {
        match self {
            State::Scanning | State::Comment | State::StringStart | State::StringBody => false,
            State::Word | State::Number | State::StringEnd => self != next,
            State::Invalid
            | State::ValueSep
            | State::TupleSep
            | State::StmtSep
            | State::StmtTerm => true,
        }
    }

    /// The kind of token this state yields on completion.
    pub fn token_kind(self) -> TokenKind {
        match self {
            State::Scanning | State::Comment => TokenKind::None,
            State::Invalid => TokenKind::Invalid,
            State::Word => TokenKind::Word,
            State::Number => TokenKind::Number,
            State::StringStart | State::StringBody | State::StringEnd => TokenKind::Str,
            State::ValueSep => TokenKind::ValueSep,
            State::TupleSep => TokenKind::TupleSep,
            State::StmtSep => TokenKind::StmtSep,
            State::StmtTerm => TokenKind::StmtTerm,
        }
    }
}

/// The type of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// No token; only produced at the end of input.
    None,
    /// A character outside the grammar.
    Invalid,
    /// A word: letters and underscores.
    Word,
    /// An integer number.
    Number,
    /// A `|`-delimited string.
    Str,
    /// The `=` value separator.
    ValueSep,
    /// The `/` tuple separator.
    TupleSep,
    /// The `,` statement separator.
    StmtSep,
    /// The `;` statement terminator.
    StmtTerm,
}

impl TokenKind {
    /// Short name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::None => "none",
            TokenKind::Invalid => "invalid",
            TokenKind::Word => "word",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::ValueSep => "value separator",
            TokenKind::TupleSep => "tuple separator",
            TokenKind::StmtSep => "statement separator",
            TokenKind::StmtTerm => "terminator",
        }
    }
}

/// One token, tagged with the origin of its first recorded character.
///
/// The token text itself lives in the caller-owned buffer passed to
/// [`Tokenizer::next`], reused across tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    /// What was recognized.
    pub kind: TokenKind,
    /// Position of the first character of the token text.
    pub origin: Origin,
}

impl Token {
    /// Reads the token as a word, returning the identifier text.
    pub fn word(&self, text: &str) -> Result<String, PcbError> {
        if self.kind != TokenKind::Word {
            return Err(PcbError::at(
                ErrorKind::ArgumentFormat,
                self.origin,
                format!("expected a word, found {}", self.kind.as_str()),
            ));
        }
        if text.is_empty() {
            return Err(PcbError::at(
                ErrorKind::ArgumentIncomplete,
                self.origin,
                "empty word",
            ));
        }
        Ok(text.to_owned())
    }

    /// Reads the token as a boolean keyword, case-insensitively.
    pub fn to_bool(&self, text: &str) -> Result<bool, PcbError> {
        if self.kind != TokenKind::Word {
            return Err(PcbError::at(
                ErrorKind::ArgumentFormat,
                self.origin,
                format!("expected a boolean, found {}", self.kind.as_str()),
            ));
        }
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentFormat,
                self.origin,
                format!("not a boolean: {text}"),
            ))
        }
    }

    /// Reads the token as a base-10 integer, consuming the whole text.
    pub fn to_int(&self, text: &str) -> Result<i32, PcbError> {
        if self.kind != TokenKind::Number {
            return Err(PcbError::at(
                ErrorKind::ArgumentFormat,
                self.origin,
                format!("expected a number, found {}", self.kind.as_str()),
            ));
        }
        text.parse::<i32>().map_err(|err| {
            PcbError::at(
                ErrorKind::ArgumentFormat,
                self.origin,
                format!("not a number: {text} ({err})"),
            )
        })
    }

    /// Reads the token as a string, returning its unescaped contents.
    pub fn string(&self, text: &str) -> Result<String, PcbError> {
        if self.kind != TokenKind::Str {
            return Err(PcbError::at(
                ErrorKind::ArgumentFormat,
                self.origin,
                format!("expected a string, found {}", self.kind.as_str()),
            ));
        }
        Ok(text.to_owned())
    }
}

/// The streaming tokenizer over a [`Source`].
#[derive(Debug)]
pub struct Tokenizer<S: Source> {
    source: S,
    position: Position,
    /// The next character to process and the state it put the machine in.
    pending: u8,
    pending_origin: Origin,
    state: State,
    preloaded: bool,
    eof: bool,
}

impl Tokenizer<crate::source::StringSource> {
    /// Creates a tokenizer over an in-memory string.
    pub fn from_str(text: impl Into<String>) -> Self {
        Tokenizer::new(crate::source::StringSource::new(text))
    }
}

impl Tokenizer<crate::source::FileSource> {
    /// Creates a tokenizer over a file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, PcbError> {
        Ok(Tokenizer::new(crate::source::FileSource::open(path)?))
    }
}

impl<S: Source> Tokenizer<S> {
    /// Creates a tokenizer over an arbitrary source.
    pub fn new(source: S) -> Tokenizer<S> {
        Tokenizer {
            source,
            position: Position::default(),
            pending: b'\n',
            pending_origin: Origin::default(),
            state: State::Scanning,
            preloaded: false,
            eof: false,
        }
    }

    /// The diagnostic name of the underlying source.
    pub fn source_name(&self) -> Option<&str> {
        self.source.name()
    }

    /// Reads the next character into `pending`. At the end of the input a
    /// single `\n` is synthesized so that a token cut off by EOF still
    /// completes before the EOF itself surfaces.
    fn read(&mut self) -> Result<bool, PcbError> {
        if self.eof {
            return Ok(false);
        }
        match self.source.read_next()? {
            Some(byte) => {
                self.position.advance(byte);
                self.pending = byte;
                self.pending_origin = self.position.origin();
                Ok(true)
            }
            None => {
                self.pending = b'\n';
                self.eof = true;
                Ok(false)
            }
        }
    }

    /// Reads the next token, filling `text` with its recorded characters.
    ///
    /// At the end of the input this returns an [`ErrorKind::Eof`] error, or
    /// [`ErrorKind::Truncated`] if the input stopped inside a token.
    pub fn next(&mut self, text: &mut String) -> Result<Token, PcbError> {
        text.clear();
        let mut token = Token {
            kind: TokenKind::None,
            origin: self.pending_origin,
        };

        if !self.preloaded {
            self.preloaded = true;
            if self.read()? {
                self.state = State::first(self.pending);
            }
        }

        let mut scanning = true;
        while !self.eof {
            let chr = self.pending;
            let state = self.state;

            // The origin of the token is the first non-idle character.
            if scanning && state.token_kind() != TokenKind::None {
                token.origin = self.pending_origin;
                scanning = false;
            }

            self.read()?;
            self.state = state.next(self.pending);

            if state.recorded() {
                text.push(char::from(chr));
            }

            if !state.completes(self.state) {
                continue;
            }

            token.kind = state.token_kind();
            return Ok(token);
        }

        if scanning {
            Err(PcbError::at(ErrorKind::Eof, token.origin, "end of input"))
        } else {
            Err(PcbError::at(
                ErrorKind::Truncated,
                token.origin,
                "input ended inside a token",
            ))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(input: &str) -> Vec<(TokenKind, String, Origin)> {
        let mut tokenizer = Tokenizer::from_str(input);
        let mut text = String::new();
        let mut out = Vec::new();
        loop {
            match tokenizer.next(&mut text) {
                Ok(token) => out.push((token.kind, text.clone(), token.origin)),
                Err(err) => {
                    assert_eq!(err.kind(), ErrorKind::Eof, "unexpected error: {err}");
                    return out;
                }
            }
        }
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokens(input).into_iter().map(|(kind, _, _)| kind).collect()
    }

    #[test]
    fn transitions_from_scanning() {
        assert_eq!(State::first(b' '), State::Scanning);
        assert_eq!(State::first(b'a'), State::Word);
        assert_eq!(State::first(b'_'), State::Word);
        assert_eq!(State::first(b'7'), State::Number);
        assert_eq!(State::first(b'-'), State::Number);
        assert_eq!(State::first(b'|'), State::StringStart);
        assert_eq!(State::first(b'#'), State::Comment);
        assert_eq!(State::first(b'='), State::ValueSep);
        assert_eq!(State::first(b'/'), State::TupleSep);
        assert_eq!(State::first(b','), State::StmtSep);
        assert_eq!(State::first(b';'), State::StmtTerm);
        assert_eq!(State::first(b'!'), State::Invalid);
    }

    #[test]
    fn transition_table() {
        // a digit continues a word token as a number
        assert_eq!(State::Word.next(b'0'), State::Number);
        // a minus does not continue a word or number
        assert_eq!(State::Word.next(b'-'), State::Invalid);
        assert_eq!(State::Number.next(b'-'), State::Invalid);
        // strings swallow separators
        assert_eq!(State::StringBody.next(b','), State::StringBody);
        assert_eq!(State::StringBody.next(b'#'), State::StringBody);
        assert_eq!(State::StringStart.next(b'|'), State::StringEnd);
        assert_eq!(State::StringBody.next(b'\n'), State::StringEnd);
        // comments swallow everything but line breaks
        assert_eq!(State::Comment.next(b';'), State::Comment);
        assert_eq!(State::Comment.next(b'\n'), State::Scanning);
    }

    #[test]
    fn single_statement() {
        assert_eq!(
            kinds("WIDTH=2000,"),
            vec![
                TokenKind::Word,
                TokenKind::ValueSep,
                TokenKind::Number,
                TokenKind::StmtSep,
            ]
        );
    }

    #[test]
    fn indexed_name_splits_into_word_and_number() {
        let tokens = tokens("P0=1/2;");
        assert_eq!(tokens[0].0, TokenKind::Word);
        assert_eq!(tokens[0].1, "P");
        assert_eq!(tokens[1].0, TokenKind::Number);
        assert_eq!(tokens[1].1, "0");
        assert_eq!(tokens[2].0, TokenKind::ValueSep);
        assert_eq!(tokens[3].1, "1");
        assert_eq!(tokens[4].0, TokenKind::TupleSep);
        assert_eq!(tokens[5].1, "2");
        assert_eq!(tokens[6].0, TokenKind::StmtTerm);
    }

    #[test]
    fn string_token() {
        let tokens = tokens("TEXT=|hello world|;");
        assert_eq!(tokens[2].0, TokenKind::Str);
        assert_eq!(tokens[2].1, "hello world");
    }

    #[test]
    fn empty_string_token() {
        let tokens = tokens("TEXT=||;");
        assert_eq!(tokens[2].0, TokenKind::Str);
        assert_eq!(tokens[2].1, "");
    }

    #[test]
    fn comment_is_discarded() {
        assert_eq!(
            kinds("A # comment, with; punctuation\nB"),
            vec![TokenKind::Word, TokenKind::Word]
        );
    }

    #[test]
    fn negative_number() {
        let tokens = tokens("-42;");
        assert_eq!(tokens[0].0, TokenKind::Number);
        assert_eq!(tokens[0].1, "-42");
    }

    #[test]
    fn word_completed_by_eof() {
        // the synthesized newline finishes the pending word
        let tokens = tokens("TRACK");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].0, TokenKind::Word);
        assert_eq!(tokens[0].1, "TRACK");
    }

    #[test]
    fn eof_inside_string_is_truncated() {
        let mut tokenizer = Tokenizer::from_str("|open");
        let mut text = String::new();
        let err = tokenizer.next(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn origin_points_at_first_character() {
        let tokens = tokens("AB CD\nEF");
        assert_eq!(tokens[0].2, Origin::new(1, 1));
        assert_eq!(tokens[1].2, Origin::new(1, 4));
        assert_eq!(tokens[2].2, Origin::new(2, 1));
    }

    #[test]
    fn origin_counts_all_line_break_styles() {
        let tokens = tokens("A\nB\rC\r\nD");
        assert_eq!(tokens[1].2, Origin::new(2, 1));
        assert_eq!(tokens[2].2, Origin::new(3, 1));
        assert_eq!(tokens[3].2, Origin::new(4, 1));
    }

    #[test]
    fn invalid_character_token() {
        let tokens = tokens("A ! B");
        assert_eq!(tokens[1].0, TokenKind::Invalid);
        assert_eq!(tokens[1].1, "!");
    }

    #[test]
    fn int_helper() {
        let tokens = tokens("123 99999999999 ABC");
        let (kind, text, origin) = &tokens[0];
        let token = Token {
            kind: *kind,
            origin: *origin,
        };
        assert_eq!(token.to_int(text).unwrap(), 123);

        // overflow is rejected, not wrapped
        let (kind, text, origin) = &tokens[1];
        let token = Token {
            kind: *kind,
            origin: *origin,
        };
        assert_eq!(
            token.to_int(text).unwrap_err().kind(),
            ErrorKind::ArgumentFormat
        );

        let (kind, text, origin) = &tokens[2];
        let token = Token {
            kind: *kind,
            origin: *origin,
        };
        assert_eq!(
            token.to_int(text).unwrap_err().kind(),
            ErrorKind::ArgumentFormat
        );
    }

    #[test]
    fn bool_helper() {
        let mut tokenizer = Tokenizer::from_str("TRUE False maybe");
        let mut text = String::new();
        let token = tokenizer.next(&mut text).unwrap();
        assert_eq!(token.to_bool(&text), Ok(true));
        let token = tokenizer.next(&mut text).unwrap();
        assert_eq!(token.to_bool(&text), Ok(false));
        let token = tokenizer.next(&mut text).unwrap();
        assert_eq!(
            token.to_bool(&text).unwrap_err().kind(),
            ErrorKind::ArgumentFormat
        );
    }
}
