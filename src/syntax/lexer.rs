//! Go tokenizer with automatic semicolon insertion.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident(String),

    /// String literal, already unquoted.
    Str(String),

    /// Number or rune literal, verbatim.
    Lit(String),

    /// Operator or delimiter.
    Punct(&'static str),

    /// Explicit `;` or one inserted at a line break.
    Semi,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier {name}"),
            TokenKind::Str(_) => f.write_str("string literal"),
            TokenKind::Lit(text) => write!(f, "literal {text}"),
            TokenKind::Punct(p) => write!(f, "'{p}'"),
            TokenKind::Semi => f.write_str("newline or ';'"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Lexing failure with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

// Longest first so that prefix operators don't shadow longer ones.
const PUNCTS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/",
    "%", "&", "|", "^", "<", ">", "=", "!", "~", "(", ")", "[", "]", "{", "}", ",", ".",
    ":",
];

pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> LexError {
        LexError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Whether a line break after the last token ends a statement.
    fn needs_semi(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            Some(TokenKind::Ident(word)) => {
                !is_keyword(word)
                    || matches!(word.as_str(), "break" | "continue" | "fallthrough" | "return")
            }
            Some(TokenKind::Str(_)) | Some(TokenKind::Lit(_)) => true,
            Some(TokenKind::Punct(p)) => matches!(*p, "++" | "--" | ")" | "]" | "}"),
            _ => false,
        }
    }

    fn push(&mut self, kind: TokenKind, line: usize, column: usize) {
        self.tokens.push(Token { kind, line, column });
    }

    fn newline(&mut self, line: usize, column: usize) {
        if self.needs_semi() {
            self.push(TokenKind::Semi, line, column);
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                '\n' => {
                    self.newline(line, column);
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    let mut spans_lines = false;
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some('\n') => spans_lines = true,
                            Some(_) => {}
                            None => return Err(self.error(line, column, "comment not terminated")),
                        }
                    }
                    if spans_lines {
                        self.newline(line, column);
                    }
                }
                '"' => {
                    let value = self.interpreted_string(line, column)?;
                    self.push(TokenKind::Str(value), line, column);
                }
                '`' => {
                    self.bump();
                    let mut value = String::new();
                    loop {
                        match self.bump() {
                            Some('`') => break,
                            Some('\r') => {}
                            Some(c) => value.push(c),
                            None => {
                                return Err(self.error(line, column, "raw string literal not terminated"))
                            }
                        }
                    }
                    self.push(TokenKind::Str(value), line, column);
                }
                '\'' => {
                    let start = self.pos;
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('\\') => {
                                self.bump();
                            }
                            Some('\'') => break,
                            Some('\n') | None => {
                                return Err(self.error(line, column, "rune literal not terminated"))
                            }
                            Some(_) => {}
                        }
                    }
                    let text = self.src[start..self.pos].to_string();
                    self.push(TokenKind::Lit(text), line, column);
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    let text = self.number();
                    self.push(TokenKind::Lit(text), line, column);
                }
                c if c == '_' || c.is_alphabetic() => {
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == '_' || c.is_alphanumeric() {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    let word = self.src[start..self.pos].to_string();
                    self.push(TokenKind::Ident(word), line, column);
                }
                ';' => {
                    self.bump();
                    self.push(TokenKind::Semi, line, column);
                }
                _ => {
                    let rest = &self.src[self.pos..];
                    let Some(punct) = PUNCTS.iter().find(|p| rest.starts_with(**p)) else {
                        return Err(self.error(line, column, format!("unexpected character {c:?}")));
                    };
                    for _ in 0..punct.len() {
                        self.bump();
                    }
                    self.push(TokenKind::Punct(*punct), line, column);
                }
            }
        }
        let (line, column) = (self.line, self.column);
        self.newline(line, column);
        self.push(TokenKind::Eof, line, column);
        Ok(self.tokens)
    }

    fn number(&mut self) -> String {
        let start = self.pos;
        let hex = self.src[self.pos..].starts_with("0x") || self.src[self.pos..].starts_with("0X");
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && if hex {
                    matches!(prev, 'p' | 'P')
                } else {
                    matches!(prev, 'e' | 'E')
                };
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                prev = c;
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn interpreted_string(&mut self, line: usize, column: usize) -> Result<String, LexError> {
        self.bump();
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    raw.push('\\');
                    match self.bump() {
                        Some('\n') | None => {
                            return Err(self.error(line, column, "string literal not terminated"))
                        }
                        Some(c) => raw.push(c),
                    }
                }
                Some('\n') | None => return Err(self.error(line, column, "string literal not terminated")),
                Some(c) => raw.push(c),
            }
        }
        unescape(&raw).map_err(|message| self.error(line, column, message))
    }
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "chan"
            | "const"
            | "continue"
            | "default"
            | "defer"
            | "else"
            | "fallthrough"
            | "for"
            | "func"
            | "go"
            | "goto"
            | "if"
            | "import"
            | "interface"
            | "map"
            | "package"
            | "range"
            | "return"
            | "select"
            | "struct"
            | "switch"
            | "type"
            | "var"
    )
}

/// Decode the escape sequences of a Go interpreted string body.
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut bytes: Vec<u8> = Vec::new();

    // Octal and \x escapes produce bytes which may combine into UTF-8.
    let flush = |bytes: &mut Vec<u8>, out: &mut String| -> Result<(), String> {
        if !bytes.is_empty() {
            let text = String::from_utf8(std::mem::take(bytes))
                .map_err(|_| "byte escapes do not form valid UTF-8".to_string())?;
            out.push_str(&text);
        }
        Ok(())
    };

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush(&mut bytes, &mut out)?;
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err("trailing backslash".into());
        };
        match esc {
            'x' => {
                let digits: String = chars.by_ref().take(2).collect();
                let value = u8::from_str_radix(&digits, 16)
                    .map_err(|_| format!("invalid \\x escape {digits:?}"))?;
                bytes.push(value);
                continue;
            }
            '0'..='7' => {
                let mut digits = String::from(esc);
                digits.extend(chars.by_ref().take(2));
                let value = u8::from_str_radix(&digits, 8)
                    .map_err(|_| format!("invalid octal escape {digits:?}"))?;
                bytes.push(value);
                continue;
            }
            _ => {}
        }
        flush(&mut bytes, &mut out)?;
        match esc {
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'u' | 'U' => {
                let width = if esc == 'u' { 4 } else { 8 };
                let digits: String = chars.by_ref().take(width).collect();
                let ch = u32::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|_| digits.len() == width)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid \\{esc} escape {digits:?}"))?;
                out.push(ch);
            }
            other => return Err(format!("unknown escape sequence \\{other}")),
        }
    }
    flush(&mut bytes, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    #[test]
    fn inserts_semicolons_at_line_ends() {
        assert_eq!(
            kinds("package foo\nimport \"time\"\n"),
            vec![
                ident("package"),
                ident("foo"),
                TokenKind::Semi,
                ident("import"),
                TokenKind::Str("time".into()),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_open_brace_or_keyword() {
        assert_eq!(
            kinds("struct {\n}"),
            vec![
                ident("struct"),
                TokenKind::Punct("{"),
                TokenKind::Punct("}"),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn raw_string_keeps_backslashes() {
        assert_eq!(
            kinds(r#"`default:"jen.Id(\"lol\")"`"#)[0],
            TokenKind::Str(r#"default:"jen.Id(\"lol\")""#.into())
        );
    }

    #[test]
    fn interpreted_string_is_unescaped() {
        assert_eq!(kinds(r#""a\tb\"c\x41é""#)[0], TokenKind::Str("a\tb\"cAé".into()));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a // trailing\n/* block\n */ b"),
            vec![ident("a"), TokenKind::Semi, ident("b"), TokenKind::Semi, TokenKind::Eof]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("<-chan ..."),
            vec![
                TokenKind::Punct("<-"),
                ident("chan"),
                TokenKind::Punct("..."),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_with_exponents() {
        assert_eq!(kinds("1e-3")[0], TokenKind::Lit("1e-3".into()));
        assert_eq!(kinds("0x1F")[0], TokenKind::Lit("0x1F".into()));
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = tokenize("x := \"abc\n").unwrap_err();
        assert_eq!((err.line, err.column), (1, 6));
    }
}
