//! Reader: tokenizer and recursive parser
//!
//! The reader consumes characters from an input port and returns one Cell
//! per `read` call. It is stateful: one put-back slot for tokens plus
//! scratch buffers for the most recently lexed string, number and character
//! literal. While a list parse is in progress its head is bound to a
//! reserved symbol in the reader's environment, so a collector running at a
//! safe point between top-level reads never sees an unrooted partial list.

use std::cell::RefCell;
use std::rc::Rc;

use regex::RegexBuilder;

use crate::cell::{cons, list, set_cdr, Cell, EOF_CHAR};
use crate::environment::Env;
use crate::error::{Error, Result, StreamCondition};
use crate::interner::Symbol;
use crate::numeric::Number;
use crate::port::Port;

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    None,
    Comment,
    Eof,
    Error,
    True,
    False,
    Char,
    String,
    Regex,
    Symbol,
    Number,
    Vector,
    OBrace,
    CBrace,
    Dot,
    Quote,
    QuasiQuote,
    Unquote,
    UnquoteSplice,
}

// ============================================================================
// Character classes
// ============================================================================

/// Special characters start a new expression, string or comment and always
/// terminate the token being accumulated.
fn is_special(c: char) -> bool {
    matches!(c, '(' | ')' | '"' | '\'' | '`' | ',' | ';')
}

fn is_print(c: char) -> bool {
    !c.is_control()
}

/// Allowed as the first character of a symbol: graphic, not a digit, not
/// special.
fn is_symbol_start(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && !c.is_numeric() && !is_special(c)
}

/// Predicate: could the first n characters of `s` begin a number? Checks
/// for digits, sign, decimal point, exponent and imaginary-unit characters.
fn is_digit_prefix(s: &str, n: usize) -> bool {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return false;
    }
    let has_sign = matches!(chars[0], '+' | '-');
    let mut has_digit = chars[0].is_ascii_digit();
    let mut has_imag = false;

    if chars.len() == 1 && !has_digit {
        return false;
    }
    let n = if n == 0 { chars.len() } else { n.min(chars.len()) };
    for &c in &chars[..n] {
        if !has_digit {
            has_digit = c.is_ascii_digit();
        }
        if !has_imag {
            has_imag = matches!(c, 'i' | 'I');
        }
        if !c.is_ascii_digit() && !matches!(c, '+' | '-' | '.' | 'i' | 'I' | 'e' | 'E') {
            return false;
        }
    }
    has_digit || (chars.len() <= 2 && (has_sign || has_imag))
}

// ============================================================================
// Number lexer
// ============================================================================

/// Lex an integer, floating point or complex number. A bare `+i`/`-i`
/// stands for the imaginary unit. A non-exponent interior sign, or a
/// trailing `i`/`I`, makes the token complex; the token splits at the
/// interior sign into real and imaginary Float parts.
fn lex_number(s: &str) -> Option<Number> {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return None;
    }
    if chars.len() == 2 && matches!(chars[0], '+' | '-') && matches!(chars[1], 'i' | 'I') {
        return Some(Number::complex(0.0, if chars[0] == '-' { -1.0 } else { 1.0 }));
    }

    let mut idx = 0;
    let mut is_flo = false;
    if matches!(chars[0], '+' | '-' | '.') {
        is_flo = chars[0] == '.';
        idx = 1;
    }
    if idx >= chars.len() || !chars[idx].is_ascii_digit() {
        return None;
    }

    let mut split: Option<usize> = None;
    let mut has_imag = false;
    for k in idx + 1..chars.len() {
        match chars[k] {
            c if c.is_ascii_digit() => {}
            '.' | 'e' | 'E' => is_flo = true,
            '+' | '-' => {
                if !matches!(chars[k - 1], 'e' | 'E') && split.is_none() {
                    split = Some(k);
                }
            }
            'i' | 'I' if k == chars.len() - 1 => has_imag = true,
            _ => return None,
        }
    }

    if has_imag || split.is_some() {
        // number tokens are ASCII, so char indices are byte indices
        let end = if has_imag { s.len() - 1 } else { s.len() };
        if let Some(k) = split {
            let re: f64 = s[..k].parse().ok()?;
            let im_text = &s[k..end];
            let im = match im_text {
                "+" => 1.0,
                "-" => -1.0,
                _ => im_text.parse().ok()?,
            };
            return Some(Number::complex(re, im));
        }
        let im: f64 = s[..end].parse().ok()?;
        return Some(Number::complex(0.0, im));
    }

    if is_flo {
        return s.parse::<f64>().ok().map(Number::Float);
    }
    match s.parse::<i64>() {
        Ok(n) => Some(Number::Int(n)),
        Err(_) => s.parse::<f64>().ok().map(Number::Float),
    }
}

// ============================================================================
// Symbol lexer
// ============================================================================

/// Accept if the first character is a graphic non-digit non-special
/// character and every remaining character is alphabetic or numeric. This
/// is stricter than canonical Scheme: `-`, `?`, `!` and friends are not
/// accepted inside a name.
fn lex_symbol(s: &str) -> Token {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_symbol_start(c) => {}
        _ => return Token::Error,
    }
    if chars.all(|c| c.is_alphabetic() || c.is_numeric()) {
        Token::Symbol
    } else {
        Token::Error
    }
}

// ============================================================================
// Character names
// ============================================================================

#[rustfmt::skip]
static CHAR_NAMES: &[(&str, char)] = &[
    ("eof",       EOF_CHAR),
    ("alarm",     '\u{7}'),
    ("backspace", '\u{8}'),
    ("delete",    '\u{7f}'),
    ("escape",    '\u{1b}'),
    ("newline",   '\n'),
    ("null",      '\0'),
    ("return",    '\r'),
    ("space",     ' '),
    ("tab",       '\t'),
    ("ae", 'ä'), ("AE", 'Ä'),
    ("ue", 'ü'), ("UE", 'Ü'),
    ("oe", 'ö'), ("OE", 'Ö'),
    ("ss", 'ß'),
    ("_0", '₀'), ("^0", '⁰'),
    ("_1", '₁'), ("^1", '¹'),
    ("_2", '₂'), ("^2", '²'),
    ("_3", '₃'), ("^3", '³'),
    ("_4", '₄'), ("^4", '⁴'),
    ("_5", '₅'), ("^5", '⁵'),
    ("_6", '₆'), ("^6", '⁶'),
    ("_7", '₇'), ("^7", '⁷'),
    ("_8", '₈'), ("^8", '⁸'),
    ("_9", '₉'), ("^9", '⁹'),
    ("alpha",   'α'),
    ("beta",    'β'),
    ("gamma",   'γ'), ("Gamma", 'Γ'),
    ("delta",   'δ'), ("Delta", 'Δ'),
    ("epsilon", 'ε'),
    ("zeta",    'ζ'),
    ("eta",     'η'),
    ("theta",   'θ'),
    ("iota",    'ι'),
    ("kappa",   'κ'),
    ("lambda",  'λ'),
    ("mu",      'μ'),
    ("nu",      'ν'),
    ("xi",      'ξ'), ("Xi", 'Ξ'),
    ("omicron", 'ο'),
    ("pi",      'π'), ("Pi", 'Π'),
    ("rho",     'ρ'),
    ("tau",     'τ'),
    ("sigma",   'σ'), ("Sigma", 'Σ'),
    ("upsilon", 'υ'),
    ("phi",     'φ'), ("Phi", 'Φ'),
    ("chi",     'χ'),
    ("psi",     'ψ'), ("Psi", 'Ψ'),
    ("omega",   'ω'), ("Omega", 'Ω'),
    ("le",       '≤'),
    ("ge",       '≥'),
    ("sim",      '∼'),
    ("simeq",    '≃'),
    ("approx",   '≈'),
    ("nabla",    '∇'),
    ("sum",      '∑'),
    ("prod",     '∏'),
    ("int",      '∫'),
    ("oint",     '∮'),
    ("pm",       '±'),
    ("div",      '÷'),
    ("cdot",     '·'),
    ("star",     '⋆'),
    ("circ",     '∘'),
    ("bullet",   '•'),
    ("diamond",  '◇'),
    ("lhd",      '◁'),
    ("rhd",      '▷'),
    ("trup",     '△'),
    ("trdown",   '▽'),
    ("times",    '×'),
    ("otimes",   '⊗'),
    ("in",       '∈'),
    ("notin",    '∉'),
    ("subset",   '⊂'),
    ("subseteq", '⊆'),
    ("infty",    '∞'),
];

/// Exact table match first, lowercase fallback second, so the capitalized
/// entries stay reachable while `#\NEWLINE` still reads.
fn char_from_name(name: &str) -> Option<char> {
    for (n, c) in CHAR_NAMES {
        if *n == name {
            return Some(*c);
        }
    }
    let lower = name.to_lowercase();
    for (n, c) in CHAR_NAMES {
        if *n == lower {
            return Some(*c);
        }
    }
    None
}

// ============================================================================
// Stream helpers
// ============================================================================

// A failed (non-EOF) stream state surfaces as the reader's own parse error.
fn fetch(port: &mut Port) -> Result<Option<char>> {
    match port.get() {
        Err(Error::InputPort(StreamCondition::Failed)) => {
            Err(Error::Parse("invalid token".into()))
        }
        other => other,
    }
}

fn peek(port: &mut Port) -> Result<Option<char>> {
    match port.peek() {
        Err(Error::InputPort(StreamCondition::Failed)) => {
            Err(Error::Parse("invalid token".into()))
        }
        other => other,
    }
}

// ============================================================================
// Parser
// ============================================================================

pub struct Parser {
    put_back: Token,
    strtok: String,
    numtok: Number,
    chrtok: char,
    env: Env,
    s_quote: Symbol,
    s_quasiquote: Symbol,
    s_unquote: Symbol,
    s_unquotesplice: Symbol,
    s_expr: Symbol,
}

impl Parser {
    /// Create a reader rooted at the argument environment.
    pub fn new(env: Env) -> Self {
        Parser {
            put_back: Token::None,
            strtok: String::new(),
            numtok: Number::Int(0),
            chrtok: '\0',
            env,
            s_quote: Symbol::new("quote"),
            s_quasiquote: Symbol::new("quasiquote"),
            s_unquote: Symbol::new("unquote"),
            s_unquotesplice: Symbol::new("unquote-splicing"),
            s_expr: Symbol::fresh(),
        }
    }

    /// Read the next scheme expression from the argument input port.
    /// End-of-file reads as the EOF character.
    pub fn read(&mut self, port: &mut Port) -> Result<Cell> {
        port.clear();
        loop {
            match self.get_token(port)? {
                Token::Comment => continue,
                Token::True => return Ok(Cell::Bool(true)),
                Token::False => return Ok(Cell::Bool(false)),
                Token::Char => return Ok(Cell::Char(self.chrtok)),
                Token::Number => return Ok(Cell::Number(self.numtok)),
                Token::String => return Ok(Cell::Str(Rc::new(self.strtok.clone()))),
                Token::Regex => return self.compile_regex(),
                Token::Symbol => return Ok(Cell::Symbol(Symbol::new(&self.strtok))),
                Token::Quote => return self.tagged(self.s_quote, port),
                Token::QuasiQuote => return self.tagged(self.s_quasiquote, port),
                Token::Unquote => return self.tagged(self.s_unquote, port),
                Token::UnquoteSplice => return self.tagged(self.s_unquotesplice, port),
                Token::Vector => return self.parse_vector(port),
                Token::OBrace => return self.parse_list(port),
                Token::Eof => return Ok(Cell::Char(EOF_CHAR)),
                Token::Error | Token::None | Token::CBrace | Token::Dot => {
                    return Err(Error::Parse("invalid token".into()))
                }
            }
        }
    }

    /// Rewrite a quote-family token into a two-element list.
    fn tagged(&mut self, sym: Symbol, port: &mut Port) -> Result<Cell> {
        let expr = self.read(port)?;
        Ok(list(vec![Cell::Symbol(sym), expr]))
    }

    // ------------------------------------------------------------------
    // Tokenizer
    // ------------------------------------------------------------------

    fn get_token(&mut self, port: &mut Port) -> Result<Token> {
        if self.put_back != Token::None {
            let tok = self.put_back;
            self.put_back = Token::None;
            return Ok(tok);
        }

        // skip leading whitespace
        let first = loop {
            match fetch(port)? {
                None => return Ok(Token::Eof),
                Some(c) if !c.is_whitespace() => break c,
                Some(_) => {}
            }
        };

        self.strtok.clear();
        self.strtok.push(first);

        // accumulate until whitespace, a special character or EOF; the
        // terminator goes back to the stream
        if !is_special(first) {
            loop {
                match fetch(port)? {
                    None => break,
                    Some(c) if c.is_whitespace() || is_special(c) => {
                        port.putback(c);
                        break;
                    }
                    Some(c) => self.strtok.push(c),
                }
            }
        }

        match first {
            '(' => Ok(Token::OBrace),
            ')' => Ok(Token::CBrace),
            '\'' => Ok(Token::Quote),
            '`' => Ok(Token::QuasiQuote),
            ',' => self.lex_unquote(port),
            ';' => self.skip_comment(port),
            '#' => self.lex_special(port),
            '"' => self.lex_string(port),
            '.' if self.strtok.len() == 1 => Ok(Token::Dot),
            _ => {
                if is_digit_prefix(&self.strtok, 2) {
                    match lex_number(&self.strtok) {
                        Some(num) => {
                            self.numtok = num;
                            Ok(Token::Number)
                        }
                        None => Ok(Token::Error),
                    }
                } else {
                    Ok(lex_symbol(&self.strtok))
                }
            }
        }
    }

    /// `,` or `,@`.
    fn lex_unquote(&mut self, port: &mut Port) -> Result<Token> {
        if self.strtok.len() != 1 {
            return Ok(Token::Error);
        }
        if peek(port)? == Some('@') {
            let _ = fetch(port)?;
            return Ok(Token::UnquoteSplice);
        }
        Ok(Token::Unquote)
    }

    /// Discard characters up to and including end-of-line.
    fn skip_comment(&mut self, port: &mut Port) -> Result<Token> {
        loop {
            match fetch(port)? {
                None | Some('\n') => return Ok(Token::Comment),
                Some(_) => {}
            }
        }
    }

    /// Tokens introduced by `#`: booleans, characters, vectors, exactness
    /// prefixes and regex literals.
    fn lex_special(&mut self, port: &mut Port) -> Result<Token> {
        if self.strtok == "#" {
            return Ok(Token::Vector);
        }
        if self.strtok == "#t" || self.strtok == "#true" {
            return Ok(Token::True);
        }
        if self.strtok == "#f" || self.strtok == "#false" {
            return Ok(Token::False);
        }
        let second = match self.strtok.chars().nth(1) {
            Some(c) => c,
            None => return Ok(Token::Error),
        };
        match second {
            '\\' => self.lex_char(port),
            'e' => match lex_number(&self.strtok[2..]) {
                Some(num) => {
                    self.numtok = num.trunc();
                    Ok(Token::Number)
                }
                None => Ok(Token::Error),
            },
            'i' => match lex_number(&self.strtok[2..]) {
                Some(num) => {
                    self.numtok = num.inexact();
                    Ok(Token::Number)
                }
                None => Ok(Token::Error),
            },
            'r' => self.lex_regex(port),
            _ => Ok(Token::Error),
        }
    }

    /// Character literal: a single character or special, `#\xNN` hex code
    /// point, or a name from the table.
    fn lex_char(&mut self, port: &mut Port) -> Result<Token> {
        let chars: Vec<char> = self.strtok.chars().collect();

        if chars.len() == 2 {
            // `#\` followed by whitespace or a special character denotes
            // that character itself
            if let Some(c) = peek(port)? {
                if c.is_whitespace() || is_special(c) {
                    let _ = fetch(port)?;
                    self.chrtok = c;
                    return Ok(Token::Char);
                }
            }
            return Ok(Token::Error);
        }
        if chars.len() == 3 {
            self.chrtok = chars[2];
            return Ok(Token::Char);
        }
        if chars.len() > 3 && chars[2] == 'x' {
            let hex: String = chars[3..].iter().collect();
            if let Ok(code) = u32::from_str_radix(&hex, 16) {
                if let Some(c) = char::from_u32(code) {
                    self.chrtok = c;
                    return Ok(Token::Char);
                }
            }
            // fall through: names like `xi` start with x too
        }
        match char_from_name(&self.strtok[2..]) {
            Some(c) => {
                self.chrtok = c;
                Ok(Token::Char)
            }
            None => Ok(Token::Error),
        }
    }

    /// String literal. A backslash is retained literally together with the
    /// following character; escape interpretation belongs to `display`.
    fn lex_string(&mut self, port: &mut Port) -> Result<Token> {
        self.strtok.clear();
        loop {
            match fetch(port)? {
                None => return Ok(Token::Error),
                Some('"') => return Ok(Token::String),
                Some('\\') => {
                    self.strtok.push('\\');
                    match fetch(port)? {
                        Some(c) if is_print(c) => self.strtok.push(c),
                        _ => return Ok(Token::Error),
                    }
                }
                Some(c) if is_print(c) => self.strtok.push(c),
                Some(_) => return Ok(Token::Error),
            }
        }
    }

    /// Regex literal `#r"<pattern>"`.
    fn lex_regex(&mut self, port: &mut Port) -> Result<Token> {
        if self.strtok != "#r" {
            return Ok(Token::Error);
        }
        if fetch(port)? != Some('"') {
            return Ok(Token::Error);
        }
        match self.lex_string(port)? {
            Token::String => Ok(Token::Regex),
            _ => Ok(Token::Error),
        }
    }

    fn compile_regex(&self) -> Result<Cell> {
        let re = RegexBuilder::new(&self.strtok)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Parse(format!("invalid regex: {e}")))?;
        Ok(Cell::Regex(Rc::new(re)))
    }

    // ------------------------------------------------------------------
    // Compound forms
    // ------------------------------------------------------------------

    /// Vector literal: `#` was consumed, expect `(`, then elements until `)`.
    fn parse_vector(&mut self, port: &mut Port) -> Result<Cell> {
        let mut elements: Vec<Cell> = Vec::new();

        if self.get_token(port)? == Token::OBrace {
            loop {
                match self.get_token(port)? {
                    Token::Comment => continue,
                    Token::CBrace => {
                        return Ok(Cell::Vector(Rc::new(RefCell::new(elements))));
                    }
                    Token::Eof | Token::Error => break,
                    tok => {
                        self.put_back = tok;
                        elements.push(self.read(port)?);
                    }
                }
            }
        }
        Err(Error::Parse("error while reading vector".into()))
    }

    /// List body, accumulating by tail pointer. A `Dot` token takes exactly
    /// one more expression and a closing brace.
    fn parse_list(&mut self, port: &mut Port) -> Result<Cell> {
        let result = self.parse_list_body(port);
        // the in-progress head is rooted only while the parse runs
        self.env.remove(self.s_expr);
        result
    }

    fn parse_list_body(&mut self, port: &mut Port) -> Result<Cell> {
        let mut head = Cell::Nil;
        let mut tail = Cell::Nil;

        loop {
            match self.get_token(port)? {
                Token::Comment => continue,
                Token::CBrace => return Ok(head),
                Token::Dot => {
                    let cell = self.read(port)?;
                    if self.get_token(port)? == Token::CBrace {
                        set_cdr(&tail, cell)?;
                        return Ok(head);
                    }
                    return Err(Error::Parse("error while reading list".into()));
                }
                Token::Eof | Token::Error => {
                    return Err(Error::Parse("error while reading list".into()));
                }
                tok => {
                    self.put_back = tok;
                    let cell = self.read(port)?;
                    if tail.is_pair() {
                        set_cdr(&tail, cons(cell, Cell::Nil))?;
                        tail = crate::cell::cdr(&tail)?;
                    } else {
                        head = cons(cell, Cell::Nil);
                        tail = head.clone();
                        self.env.add(self.s_expr, head.clone());
                    }
                }
            }
        }
    }
}
