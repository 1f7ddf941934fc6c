use crate::{SyntaxKind, TextRange};

/// A lexed token. Text is not stored; slice the source with [`Token::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: SyntaxKind, range: TextRange) -> Self {
        Token { kind, range }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.as_usize()]
    }
}

/// Lex the whole input, trivia included. The last token is always `Eof`.
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Java tokenizer over a UTF-8 buffer.
///
/// The lexer can be restarted at any character boundary with [`Lexer::starting_at`];
/// produced ranges are always absolute offsets into the full buffer.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::starting_at(input, 0)
    }

    /// Resume lexing at `offset`. Offsets past the end, or inside a multi-byte
    /// character, are moved back to the nearest preceding boundary.
    pub fn starting_at(input: &'a str, offset: usize) -> Self {
        let mut pos = offset.min(input.len());
        while !input.is_char_boundary(pos) {
            pos -= 1;
        }
        Lexer {
            input,
            pos,
            finished: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.bump_char();
        }
    }

    pub fn next_token(&mut self) -> Token {
        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            self.finished = true;
            return Token::new(SyntaxKind::Eof, TextRange::empty(start));
        };

        let kind = if ch.is_whitespace() {
            self.eat_while(char::is_whitespace);
            SyntaxKind::Whitespace
        } else if self.remaining().starts_with("//") {
            self.eat_while(|c| c != '\n');
            SyntaxKind::LineComment
        } else if self.remaining().starts_with("/*") {
            self.lex_block_comment()
        } else if is_ident_start(ch) {
            self.lex_identifier_or_keyword()
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.peek_nth_char(1).is_some_and(|c| c.is_ascii_digit()))
        {
            self.lex_number()
        } else if self.remaining().starts_with("\"\"\"") {
            self.lex_text_block()
        } else if ch == '"' {
            self.lex_quoted('"', SyntaxKind::StringLiteral)
        } else if ch == '\'' {
            self.lex_quoted('\'', SyntaxKind::CharLiteral)
        } else {
            self.lex_punctuation()
        };

        Token::new(kind, TextRange::new(start, self.pos))
    }

    fn lex_block_comment(&mut self) -> SyntaxKind {
        let rest = self.remaining();
        let kind = if rest.starts_with("/**") && !rest.starts_with("/**/") {
            SyntaxKind::DocComment
        } else {
            SyntaxKind::BlockComment
        };
        self.pos += 2;
        match self.remaining().find("*/") {
            Some(idx) => self.pos += idx + 2,
            // Unterminated comments run to the end of input.
            None => self.pos = self.input.len(),
        }
        kind
    }

    fn lex_identifier_or_keyword(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.bump_char();
        self.eat_while(is_ident_continue);
        let text = &self.input[start..self.pos];

        if text == "non" {
            let rest = self.remaining();
            if let Some(after) = rest.strip_prefix("-sealed") {
                if !after.chars().next().is_some_and(is_ident_continue) {
                    self.pos += "-sealed".len();
                    return SyntaxKind::NonSealedKw;
                }
            }
        }

        SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::Identifier)
    }

    fn lex_number(&mut self) -> SyntaxKind {
        let rest = self.remaining();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            let mut is_float = false;
            if self.peek_char() == Some('.') {
                is_float = true;
                self.bump_char();
                self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            }
            if matches!(self.peek_char(), Some('p' | 'P')) {
                is_float = true;
                self.bump_char();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.bump_char();
                }
                self.eat_while(|c| c.is_ascii_digit() || c == '_');
            }
            return self.number_suffix(is_float);
        }
        if rest.starts_with("0b") || rest.starts_with("0B") {
            self.pos += 2;
            self.eat_while(|c| c == '0' || c == '1' || c == '_');
            return self.number_suffix(false);
        }

        let mut is_float = false;
        self.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek_char() == Some('.') && self.peek_nth_char(1).map_or(true, |c| c != '.') {
            is_float = true;
            self.bump_char();
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_nth_char(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.bump_char();
                if signed {
                    self.bump_char();
                }
                self.eat_while(|c| c.is_ascii_digit() || c == '_');
            }
        }
        self.number_suffix(is_float)
    }

    fn number_suffix(&mut self, is_float: bool) -> SyntaxKind {
        match self.peek_char() {
            Some('l' | 'L') if !is_float => {
                self.bump_char();
                SyntaxKind::LongLiteral
            }
            Some('f' | 'F') => {
                self.bump_char();
                SyntaxKind::FloatLiteral
            }
            Some('d' | 'D') => {
                self.bump_char();
                SyntaxKind::DoubleLiteral
            }
            _ if is_float => SyntaxKind::DoubleLiteral,
            _ => SyntaxKind::IntLiteral,
        }
    }

    /// String or char literal. Unterminated literals stop at the end of the line.
    fn lex_quoted(&mut self, quote: char, kind: SyntaxKind) -> SyntaxKind {
        self.bump_char();
        while let Some(c) = self.peek_char() {
            match c {
                '\n' => return SyntaxKind::Error,
                '\\' => {
                    self.bump_char();
                    if self.peek_char().is_some_and(|c| c != '\n') {
                        self.bump_char();
                    }
                }
                c if c == quote => {
                    self.bump_char();
                    return kind;
                }
                _ => {
                    self.bump_char();
                }
            }
        }
        SyntaxKind::Error
    }

    fn lex_text_block(&mut self) -> SyntaxKind {
        self.pos += 3;
        loop {
            let rest = self.remaining();
            if rest.is_empty() {
                return SyntaxKind::Error;
            }
            if rest.starts_with("\\") {
                self.bump_char();
                self.bump_char();
                continue;
            }
            if rest.starts_with("\"\"\"") {
                self.pos += 3;
                return SyntaxKind::TextBlock;
            }
            self.bump_char();
        }
    }

    fn lex_punctuation(&mut self) -> SyntaxKind {
        // Longest match first.
        const TABLE: &[(&str, SyntaxKind)] = &[
            ("<<=", SyntaxKind::LeftShiftEq),
            ("...", SyntaxKind::Ellipsis),
            ("::", SyntaxKind::DoubleColon),
            ("->", SyntaxKind::Arrow),
            ("++", SyntaxKind::PlusPlus),
            ("--", SyntaxKind::MinusMinus),
            ("+=", SyntaxKind::PlusEq),
            ("-=", SyntaxKind::MinusEq),
            ("*=", SyntaxKind::StarEq),
            ("/=", SyntaxKind::SlashEq),
            ("%=", SyntaxKind::PercentEq),
            ("==", SyntaxKind::EqEq),
            ("!=", SyntaxKind::BangEq),
            ("<=", SyntaxKind::LessEq),
            (">=", SyntaxKind::GreaterEq),
            ("<<", SyntaxKind::LeftShift),
            ("&&", SyntaxKind::AmpAmp),
            ("&=", SyntaxKind::AmpEq),
            ("||", SyntaxKind::PipePipe),
            ("|=", SyntaxKind::PipeEq),
            ("^=", SyntaxKind::CaretEq),
            ("(", SyntaxKind::LParen),
            (")", SyntaxKind::RParen),
            ("{", SyntaxKind::LBrace),
            ("}", SyntaxKind::RBrace),
            ("[", SyntaxKind::LBracket),
            ("]", SyntaxKind::RBracket),
            (";", SyntaxKind::Semicolon),
            (",", SyntaxKind::Comma),
            (".", SyntaxKind::Dot),
            ("@", SyntaxKind::At),
            ("?", SyntaxKind::Question),
            (":", SyntaxKind::Colon),
            ("+", SyntaxKind::Plus),
            ("-", SyntaxKind::Minus),
            ("*", SyntaxKind::Star),
            ("/", SyntaxKind::Slash),
            ("%", SyntaxKind::Percent),
            ("~", SyntaxKind::Tilde),
            ("!", SyntaxKind::Bang),
            ("=", SyntaxKind::Eq),
            ("<", SyntaxKind::Less),
            (">", SyntaxKind::Greater),
            ("&", SyntaxKind::Amp),
            ("|", SyntaxKind::Pipe),
            ("^", SyntaxKind::Caret),
        ];

        let rest = self.remaining();
        for (text, kind) in TABLE {
            if rest.starts_with(text) {
                self.pos += text.len();
                return *kind;
            }
        }
        self.bump_char();
        SyntaxKind::Error
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}
