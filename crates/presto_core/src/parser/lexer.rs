//! Lexer for the presto scripting dialect.
//!
//! See [`TokenIterator`] for the main entry point.  The iterator exposes the
//! current token (kind + value) and the last captured doc-comment; callers
//! drive it with [`TokenIterator::skip`] / [`TokenIterator::match_token`].

use std::rc::Rc;

use crate::error::{ErrorPosition, PrestoError, PrestoResult};
use crate::value::Value;

// ─────────────────────────────────────────────────────────────────────────────
// CodeLocation
// ─────────────────────────────────────────────────────────────────────────────

/// A position in a named source buffer.
///
/// Holds a shared reference to the complete program text plus the external
/// file name (empty for top-level source) and a byte offset.  Copied by value
/// into every AST node, so locations never borrow from the lexer.
#[derive(Debug, Clone)]
pub struct CodeLocation {
    program: Rc<str>,
    external_file: Rc<str>,
    /// Byte offset of the position within `program`.
    pub offset: usize,
}

impl CodeLocation {
    /// Creates a location pointing at the start of `program`.
    pub fn new(program: Rc<str>, external_file: Rc<str>) -> Self {
        Self {
            program,
            external_file,
            offset: 0,
        }
    }

    /// The complete program text this location points into.
    pub fn source(&self) -> &str {
        &self.program
    }

    /// The external file name, or empty for top-level source.
    pub fn file_name(&self) -> &str {
        &self.external_file
    }

    /// Derive the 1-based line and column of [`CodeLocation::offset`].
    pub fn line_and_column(&self) -> (u32, u32) {
        let upto = &self.program[..self.offset.min(self.program.len())];
        let line = upto.matches('\n').count() as u32 + 1;
        let column = match upto.rfind('\n') {
            Some(nl) => upto[nl + 1..].chars().count() as u32 + 1,
            None => upto.chars().count() as u32 + 1,
        };
        (line, column)
    }

    /// The [`ErrorPosition`] for this location.
    pub fn position(&self) -> ErrorPosition {
        let (line, column) = self.line_and_column();
        ErrorPosition {
            file: self.external_file.to_string(),
            line,
            column,
        }
    }

    /// Builds a located lexer error.
    pub fn error_lex(&self, msg: impl Into<String>) -> PrestoError {
        PrestoError::Lex(self.position(), msg.into())
    }

    /// Builds a located parse error.
    pub fn error_parse(&self, msg: impl Into<String>) -> PrestoError {
        PrestoError::Parse(self.position(), msg.into())
    }

    /// Builds a located symbol error.
    pub fn error_symbol(&self, msg: impl Into<String>) -> PrestoError {
        PrestoError::Symbol(self.position(), msg.into())
    }

    /// Builds a located arity error.
    pub fn error_arity(&self, msg: impl Into<String>) -> PrestoError {
        PrestoError::Arity(self.position(), msg.into())
    }

    /// Builds a located include error.
    pub fn error_include(&self, msg: impl Into<String>) -> PrestoError {
        PrestoError::Include(self.position(), msg.into())
    }

    /// Builds a located const-declaration error.
    pub fn error_const(&self, msg: impl Into<String>) -> PrestoError {
        PrestoError::Const(self.position(), msg.into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic category of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier that is not a reserved word.
    Identifier,
    /// A numeric or string literal.
    Literal,
    /// End of input.
    Eof,

    // ── Reserved words ────────────────────────────────────────────────────
    /// `break`
    Break,
    /// `case`
    Case,
    /// `const`
    Const,
    /// `continue`
    Continue,
    /// `default`
    Default,
    /// `do`
    Do,
    /// `else`
    Else,
    /// `extern`
    Extern,
    /// `false`
    False,
    /// `for`
    For,
    /// `function`
    Function,
    /// `global`
    Global,
    /// `if`
    If,
    /// `in`
    In,
    /// `include`
    Include,
    /// `inline`
    Inline,
    /// `local`
    Local,
    /// `namespace`
    Namespace,
    /// `new`
    New,
    /// `null`
    Null,
    /// `register_var`
    RegisterVar,
    /// `return`
    Return,
    /// `rLock`
    RLock,
    /// `static`
    Static,
    /// `switch`
    Switch,
    /// `this`
    This,
    /// `true`
    True,
    /// `typeof`
    Typeof,
    /// `undefined`
    Undefined,
    /// `var`
    Var,
    /// `void`
    Void,
    /// `while`
    While,
    /// `wLock`
    WLock,

    // ── Punctuators ───────────────────────────────────────────────────────
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `=`
    Assign,

    // ── Operators ─────────────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Times,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `===`
    TypeEquals,
    /// `!==`
    TypeNotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `!`
    LogicalNot,
    /// `&`
    BitwiseAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `>>>`
    RightShiftUnsigned,
    /// `+=`
    PlusEquals,
    /// `-=`
    MinusEquals,
    /// `<<=`
    LeftShiftEquals,
    /// `>>=`
    RightShiftEquals,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
}

impl TokenKind {
    /// Human-readable token name used in "Found X when expecting Y" messages.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Literal => "literal",
            TokenKind::Eof => "end of input",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Default => "default",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Extern => "extern",
            TokenKind::False => "false",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::Global => "global",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::Include => "include",
            TokenKind::Inline => "inline",
            TokenKind::Local => "local",
            TokenKind::Namespace => "namespace",
            TokenKind::New => "new",
            TokenKind::Null => "null",
            TokenKind::RegisterVar => "register_var",
            TokenKind::Return => "return",
            TokenKind::RLock => "rLock",
            TokenKind::Static => "static",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::True => "true",
            TokenKind::Typeof => "typeof",
            TokenKind::Undefined => "undefined",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::WLock => "wLock",
            TokenKind::OpenBrace => "'{'",
            TokenKind::CloseBrace => "'}'",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::OpenBracket => "'['",
            TokenKind::CloseBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Times => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::Modulo => "'%'",
            TokenKind::Equals => "'=='",
            TokenKind::NotEquals => "'!='",
            TokenKind::TypeEquals => "'==='",
            TokenKind::TypeNotEquals => "'!=='",
            TokenKind::LessThan => "'<'",
            TokenKind::LessThanOrEqual => "'<='",
            TokenKind::GreaterThan => "'>'",
            TokenKind::GreaterThanOrEqual => "'>='",
            TokenKind::LogicalAnd => "'&&'",
            TokenKind::LogicalOr => "'||'",
            TokenKind::LogicalNot => "'!'",
            TokenKind::BitwiseAnd => "'&'",
            TokenKind::BitwiseOr => "'|'",
            TokenKind::BitwiseXor => "'^'",
            TokenKind::LeftShift => "'<<'",
            TokenKind::RightShift => "'>>'",
            TokenKind::RightShiftUnsigned => "'>>>'",
            TokenKind::PlusEquals => "'+='",
            TokenKind::MinusEquals => "'-='",
            TokenKind::LeftShiftEquals => "'<<='",
            TokenKind::RightShiftEquals => "'>>='",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
        }
    }
}

/// Map an identifier span to its reserved-word kind, or `None` for plain
/// identifiers.
fn keyword_kind(s: &str) -> Option<TokenKind> {
    match s {
        "break" => Some(TokenKind::Break),
        "case" => Some(TokenKind::Case),
        "const" => Some(TokenKind::Const),
        "continue" => Some(TokenKind::Continue),
        "default" => Some(TokenKind::Default),
        "do" => Some(TokenKind::Do),
        "else" => Some(TokenKind::Else),
        "extern" => Some(TokenKind::Extern),
        "false" => Some(TokenKind::False),
        "for" => Some(TokenKind::For),
        "function" => Some(TokenKind::Function),
        "global" => Some(TokenKind::Global),
        "if" => Some(TokenKind::If),
        "in" => Some(TokenKind::In),
        "include" => Some(TokenKind::Include),
        "inline" => Some(TokenKind::Inline),
        "local" => Some(TokenKind::Local),
        "namespace" => Some(TokenKind::Namespace),
        "new" => Some(TokenKind::New),
        "null" => Some(TokenKind::Null),
        "register_var" => Some(TokenKind::RegisterVar),
        "return" => Some(TokenKind::Return),
        "rLock" => Some(TokenKind::RLock),
        "static" => Some(TokenKind::Static),
        "switch" => Some(TokenKind::Switch),
        "this" => Some(TokenKind::This),
        "true" => Some(TokenKind::True),
        "typeof" => Some(TokenKind::Typeof),
        "undefined" => Some(TokenKind::Undefined),
        "var" => Some(TokenKind::Var),
        "void" => Some(TokenKind::Void),
        "while" => Some(TokenKind::While),
        "wLock" => Some(TokenKind::WLock),
        _ => None,
    }
}

/// Operator / punctuator table, longest spellings first so that a plain
/// prefix scan implements longest-match.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::TypeEquals),
    ("!==", TokenKind::TypeNotEquals),
    (">>>", TokenKind::RightShiftUnsigned),
    ("<<=", TokenKind::LeftShiftEquals),
    (">>=", TokenKind::RightShiftEquals),
    ("==", TokenKind::Equals),
    ("!=", TokenKind::NotEquals),
    ("<=", TokenKind::LessThanOrEqual),
    (">=", TokenKind::GreaterThanOrEqual),
    ("&&", TokenKind::LogicalAnd),
    ("||", TokenKind::LogicalOr),
    ("<<", TokenKind::LeftShift),
    (">>", TokenKind::RightShift),
    ("+=", TokenKind::PlusEquals),
    ("-=", TokenKind::MinusEquals),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("{", TokenKind::OpenBrace),
    ("}", TokenKind::CloseBrace),
    ("(", TokenKind::OpenParen),
    (")", TokenKind::CloseParen),
    ("[", TokenKind::OpenBracket),
    ("]", TokenKind::CloseBracket),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    (":", TokenKind::Colon),
    ("?", TokenKind::Question),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Times),
    ("/", TokenKind::Divide),
    ("%", TokenKind::Modulo),
    ("<", TokenKind::LessThan),
    (">", TokenKind::GreaterThan),
    ("!", TokenKind::LogicalNot),
    ("&", TokenKind::BitwiseAnd),
    ("|", TokenKind::BitwiseOr),
    ("^", TokenKind::BitwiseXor),
];

// ─────────────────────────────────────────────────────────────────────────────
// Character classification
// ─────────────────────────────────────────────────────────────────────────────

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_body(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenIterator
// ─────────────────────────────────────────────────────────────────────────────

/// Streams typed tokens from a source string.
///
/// The iterator always holds one token of lookahead: `current_type` and
/// `current_value` describe the token at [`TokenIterator::location`], and
/// [`TokenIterator::skip`] advances past it.
///
/// # Example
///
/// ```
/// use presto_core::parser::lexer::{TokenIterator, TokenKind};
///
/// let mut it = TokenIterator::new("var x = 42;", "").unwrap();
/// assert_eq!(it.current_type, TokenKind::Var);
/// it.skip().unwrap();
/// assert_eq!(it.current_type, TokenKind::Identifier);
/// ```
#[derive(Debug)]
pub struct TokenIterator {
    /// Location of the current token.
    pub location: CodeLocation,
    /// Kind of the current token.
    pub current_type: TokenKind,
    /// Value of the current token (identifiers and literals; `Undefined`
    /// otherwise).
    pub current_value: Value,
    last_comment: String,
    pos: usize,
}

impl TokenIterator {
    /// Creates an iterator over `code` and positions it on the first token.
    pub fn new(code: &str, external_file: &str) -> PrestoResult<Self> {
        let mut it = Self {
            location: CodeLocation::new(Rc::from(code), Rc::from(external_file)),
            current_type: TokenKind::Eof,
            current_value: Value::Undefined,
            last_comment: String::new(),
            pos: 0,
        };
        it.skip()?;
        Ok(it)
    }

    /// Advances past the current token.
    pub fn skip(&mut self) -> PrestoResult<()> {
        self.skip_whitespace_and_comments()?;
        self.location.offset = self.pos;
        self.current_type = self.match_next_token()?;
        Ok(())
    }

    /// Consumes the current token if it is `expected`, otherwise fails with a
    /// located parse error.
    pub fn match_token(&mut self, expected: TokenKind) -> PrestoResult<()> {
        if self.current_type != expected {
            return Err(self.location.error_parse(format!(
                "Found {} when expecting {}",
                self.current_type.name(),
                expected.name()
            )));
        }
        self.skip()
    }

    /// Consumes the current token if it is `expected`; returns whether it did.
    pub fn match_if(&mut self, expected: TokenKind) -> PrestoResult<bool> {
        if self.current_type == expected {
            self.skip()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Returns `true` if the current token is any of `kinds`.
    pub fn matches_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_type)
    }

    /// The current token value rendered as a string (identifier name, string
    /// literal contents, or the printed form of a numeric literal).
    pub fn current_string(&self) -> String {
        self.current_value.to_string()
    }

    /// The most recent doc-comment, or empty if none is pending.
    pub fn last_comment(&self) -> &str {
        &self.last_comment
    }

    /// Takes the pending doc-comment, leaving it empty.
    pub fn take_last_comment(&mut self) -> String {
        std::mem::take(&mut self.last_comment)
    }

    /// Discards any pending doc-comment.
    pub fn clear_last_comment(&mut self) {
        self.last_comment.clear();
    }

    /// A verbatim slice of the program text (used for `extern "C"` bodies and
    /// anonymous-function source capture).
    pub fn source_slice(&self, start: usize, end: usize) -> &str {
        &self.location.source()[start..end]
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn rest(&self) -> &str {
        &self.location.source()[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    fn skip_whitespace_and_comments(&mut self) -> PrestoResult<()> {
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.advance_char();
            }
            if !self.rest().starts_with('/') {
                return Ok(());
            }
            if self.rest().starts_with("//") {
                match self.rest().find('\n') {
                    Some(nl) => self.pos += nl + 1,
                    None => self.pos = self.location.source().len(),
                }
                continue;
            }
            if self.rest().starts_with("/*") {
                self.location.offset = self.pos;
                let interior_start = self.pos + 2;
                let source_len = self.location.source().len();
                let close = self.location.source()[interior_start.min(source_len)..]
                    .find("*/")
                    .ok_or_else(|| self.location.error_lex("Unterminated '/*' comment"))?;
                let interior = &self.location.source()[interior_start..interior_start + close];
                // A third '*' marks a doc-comment; plain block comments clear
                // any pending one.
                self.last_comment = match interior.strip_prefix('*') {
                    Some(doc) => doc.trim().to_owned(),
                    None => String::new(),
                };
                self.pos = interior_start + close + 2;
                continue;
            }
            return Ok(());
        }
    }

    // ── Token recognition ───────────────────────────────────────────────────

    fn match_next_token(&mut self) -> PrestoResult<TokenKind> {
        let Some(c) = self.peek_char() else {
            return Ok(TokenKind::Eof);
        };

        if is_identifier_start(c) {
            let start = self.pos;
            while matches!(self.peek_char(), Some(c) if is_identifier_body(c)) {
                self.advance_char();
            }
            let span = &self.location.source()[start..self.pos];
            if let Some(kind) = keyword_kind(span) {
                return Ok(kind);
            }
            self.current_value = Value::Str(span.to_owned());
            return Ok(TokenKind::Identifier);
        }

        if c.is_ascii_digit() {
            if let Some(v) = self.try_hex_literal() {
                self.current_value = v;
                return Ok(TokenKind::Literal);
            }
            if let Some(v) = self.try_float_literal() {
                self.current_value = v;
                return Ok(TokenKind::Literal);
            }
            if let Some(v) = self.try_octal_literal()? {
                self.current_value = v;
                return Ok(TokenKind::Literal);
            }
            self.current_value = self.scan_decimal_literal();
            return Ok(TokenKind::Literal);
        }

        if c == '"' || c == '\'' {
            self.current_value = self.scan_string_literal(c)?;
            return Ok(TokenKind::Literal);
        }

        if c == '.' {
            if let Some(v) = self.try_float_literal() {
                self.current_value = v;
                return Ok(TokenKind::Literal);
            }
        }

        for &(text, kind) in OPERATORS {
            if self.rest().starts_with(text) {
                self.pos += text.len();
                return Ok(kind);
            }
        }

        Err(self
            .location
            .error_lex(format!("Unexpected character '{c}' in source")))
    }

    // ── Numeric literals ────────────────────────────────────────────────────

    /// `0x` / `0X` followed by at least one hex digit.
    fn try_hex_literal(&mut self) -> Option<Value> {
        let rest = self.rest();
        if !(rest.starts_with("0x") || rest.starts_with("0X")) {
            return None;
        }
        let digits: &str = &rest[2..];
        let len = digits
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_hexdigit())
            .count();
        if len == 0 {
            return None;
        }
        let mut v: i64 = 0;
        for c in digits[..len].chars() {
            v = v
                .wrapping_mul(16)
                .wrapping_add(c.to_digit(16).expect("hex digit was just classified") as i64);
        }
        self.pos += 2 + len;
        Some(Value::Int(v))
    }

    /// Digits with a decimal point and/or an exponent.  Plain integer runs do
    /// not qualify.
    fn try_float_literal(&mut self) -> Option<Value> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut t = 0usize;
        let mut num_digits = 0usize;

        while t < bytes.len() && bytes[t].is_ascii_digit() {
            t += 1;
            num_digits += 1;
        }

        let has_point = t < bytes.len() && bytes[t] == b'.';
        if has_point {
            t += 1;
            while t < bytes.len() && bytes[t].is_ascii_digit() {
                t += 1;
                num_digits += 1;
            }
        }

        if num_digits == 0 {
            return None;
        }

        let has_exponent = t < bytes.len() && (bytes[t] == b'e' || bytes[t] == b'E');
        if has_exponent {
            t += 1;
            if t < bytes.len() && (bytes[t] == b'+' || bytes[t] == b'-') {
                t += 1;
            }
            if !(t < bytes.len() && bytes[t].is_ascii_digit()) {
                return None;
            }
            while t < bytes.len() && bytes[t].is_ascii_digit() {
                t += 1;
            }
        }

        if !(has_point || has_exponent) {
            return None;
        }

        let value: f64 = rest[..t].parse().ok()?;
        self.pos += t;
        Some(Value::Double(value))
    }

    /// A leading `0` followed by octal digits.  A decimal digit ≥ 8 after the
    /// leading zero is a hard error.
    fn try_octal_literal(&mut self) -> PrestoResult<Option<Value>> {
        let bytes = self.rest().as_bytes();
        if bytes.first() != Some(&b'0') {
            return Ok(None);
        }
        let mut v: i64 = 0;
        let mut t = 1usize;
        while t < bytes.len() && bytes[t].is_ascii_digit() {
            let digit = (bytes[t] - b'0') as i64;
            if digit >= 8 {
                return Err(self.location.error_lex("Decimal digit in octal constant"));
            }
            v = v.wrapping_mul(8).wrapping_add(digit);
            t += 1;
        }
        self.pos += t;
        Ok(Some(Value::Int(v)))
    }

    /// One or more base-10 digits.
    fn scan_decimal_literal(&mut self) -> Value {
        let mut v: i64 = 0;
        while let Some(c) = self.peek_char() {
            let Some(digit) = c.to_digit(10) else { break };
            v = v.wrapping_mul(10).wrapping_add(digit as i64);
            self.advance_char();
        }
        Value::Int(v)
    }

    // ── String literals ─────────────────────────────────────────────────────

    fn scan_string_literal(&mut self, quote: char) -> PrestoResult<Value> {
        self.advance_char(); // opening quote
        let mut out = String::new();
        loop {
            let Some(c) = self.advance_char() else {
                return Err(self.location.error_lex("Unterminated string literal"));
            };
            if c == quote {
                return Ok(Value::Str(out));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some(esc) = self.advance_char() else {
                return Err(self.location.error_lex("Unterminated string literal"));
            };
            match esc {
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'u' => out.push(self.scan_unicode_escape()?),
                // `\"`, `\'`, `\\`, `\/`, and any other escaped character
                // stand for themselves.
                other => out.push(other),
            }
        }
    }

    /// Four hex digits after `\u`; surrogate pairs are combined.
    fn scan_unicode_escape(&mut self) -> PrestoResult<char> {
        let high = self.scan_four_hex_digits()?;
        if (0xD800..0xDC00).contains(&high) {
            if self.rest().starts_with("\\u") {
                self.advance_char();
                self.advance_char();
                let low = self.scan_four_hex_digits()?;
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(c) = char::from_u32(combined) {
                        return Ok(c);
                    }
                }
            }
            return Err(self.location.error_lex("Invalid unicode escape sequence"));
        }
        char::from_u32(high)
            .ok_or_else(|| self.location.error_lex("Invalid unicode escape sequence"))
    }

    fn scan_four_hex_digits(&mut self) -> PrestoResult<u32> {
        let mut v: u32 = 0;
        for _ in 0..4 {
            let digit = self
                .peek_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.location.error_lex("Invalid unicode escape sequence"))?;
            v = v * 16 + digit;
            self.advance_char();
        }
        Ok(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
