//! Declaration-level Go parser.
//!
//! Parses the package clause, imports and `type` declarations. Struct types
//! are parsed into fields; every other top-level declaration is skipped by
//! scanning to the next semicolon outside any brackets.

use super::ast::{ChanDir, FieldDecl, ImportSpec, SourceFile, StructDecl, TypeExpr};
use super::lexer::{tokenize, Token, TokenKind};
use std::path::Path;

/// Parse failure with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

type PResult<T> = Result<T, ParseError>;

/// Parse one Go source file.
pub fn parse_file(path: &Path, src: &str) -> PResult<SourceFile> {
    let tokens = tokenize(src).map_err(|e| ParseError {
        line: e.line,
        column: e.column,
        message: e.message,
    })?;
    Parser::new(tokens).source_file(path)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn token(&self) -> &Token {
        // The lexer always terminates the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.token().kind
    }

    fn kind_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.kind().clone();
        if !matches!(kind, TokenKind::Eof) {
            self.pos += 1;
        }
        kind
    }

    fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
        let token = self.token();
        Err(ParseError {
            line: token.line,
            column: token.column,
            message: message.into(),
        })
    }

    fn unexpected<T>(&self, expected: &str) -> PResult<T> {
        self.error(format!("expected {expected}, found {}", self.kind()))
    }

    fn at_punct(&self, p: &str) -> bool {
        matches!(self.kind(), TokenKind::Punct(q) if *q == p)
    }

    fn at_keyword(&self, word: &str) -> bool {
        matches!(self.kind(), TokenKind::Ident(w) if w == word)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.at_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> PResult<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            self.unexpected(&format!("'{p}'"))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match self.kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => self.unexpected("identifier"),
        }
    }

    /// A semicolon, or nothing before a closing `)` or `}`.
    fn expect_semi(&mut self) -> PResult<()> {
        match self.kind() {
            TokenKind::Semi => {
                self.pos += 1;
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            TokenKind::Punct(")") | TokenKind::Punct("}") => Ok(()),
            _ => self.unexpected("newline or ';'"),
        }
    }

    fn skip_semis(&mut self) {
        while matches!(self.kind(), TokenKind::Semi) {
            self.pos += 1;
        }
    }

    /// Skip tokens up to the next semicolon at bracket depth zero. Stops
    /// without consuming at an unbalanced closing bracket, which belongs to
    /// an enclosing group.
    fn skip_to_semi(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof => {
                    if depth > 0 {
                        return self.error("unbalanced brackets at end of file");
                    }
                    return Ok(());
                }
                TokenKind::Semi if depth == 0 => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Skip a bracketed group starting at the current opening bracket.
    fn skip_group(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => return self.error("unbalanced brackets at end of file"),
                _ => {}
            }
        }
    }

    fn source_file(mut self, path: &Path) -> PResult<SourceFile> {
        self.skip_semis();
        if !self.at_keyword("package") {
            return self.unexpected("package clause");
        }
        self.pos += 1;
        let package = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        let mut structs = Vec::new();

        loop {
            self.skip_semis();
            if !self.at_keyword("import") {
                break;
            }
            self.pos += 1;
            if self.eat_punct("(") {
                loop {
                    self.skip_semis();
                    if self.eat_punct(")") {
                        break;
                    }
                    imports.push(self.import_spec()?);
                    self.expect_semi()?;
                }
            } else {
                imports.push(self.import_spec()?);
            }
            self.expect_semi()?;
        }

        loop {
            self.skip_semis();
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::Ident(w) if w == "type" => {
                    self.pos += 1;
                    if self.eat_punct("(") {
                        loop {
                            self.skip_semis();
                            if self.eat_punct(")") {
                                break;
                            }
                            if let Some(decl) = self.type_spec()? {
                                structs.push(decl);
                            }
                        }
                        self.expect_semi()?;
                    } else if let Some(decl) = self.type_spec()? {
                        structs.push(decl);
                    }
                }
                TokenKind::Ident(w) if w == "import" => {
                    return self.error("imports must appear before other declarations");
                }
                _ => {
                    self.skip_to_semi()?;
                    if matches!(self.kind(), TokenKind::Punct(")" | "]" | "}")) {
                        return self.error(format!("unexpected {}", self.kind()));
                    }
                }
            }
        }

        Ok(SourceFile {
            path: path.to_path_buf(),
            package,
            imports,
            structs,
        })
    }

    fn import_spec(&mut self) -> PResult<ImportSpec> {
        let alias = match self.kind().clone() {
            TokenKind::Ident(name) => {
                self.pos += 1;
                Some(name)
            }
            TokenKind::Punct(".") => {
                self.pos += 1;
                Some(".".to_string())
            }
            _ => None,
        };
        match self.kind().clone() {
            TokenKind::Str(path) => {
                self.pos += 1;
                Ok(ImportSpec { alias, path })
            }
            _ => self.unexpected("import path"),
        }
    }

    /// Parse one type spec. Returns the declaration when it is a non-generic
    /// struct type; aliases, generic types and other kinds are skipped.
    fn type_spec(&mut self) -> PResult<Option<StructDecl>> {
        let name = self.expect_ident()?;

        if self.at_punct("[") || self.at_punct("=") || !self.at_keyword("struct") {
            self.skip_to_semi()?;
            return Ok(None);
        }

        self.pos += 1;
        let fields = self.struct_body()?;
        self.expect_semi()?;
        Ok(Some(StructDecl { name, fields }))
    }

    fn struct_body(&mut self) -> PResult<Vec<FieldDecl>> {
        self.expect_punct("{")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.eat_punct("}") {
                return Ok(fields);
            }
            fields.push(self.field_decl()?);
            self.expect_semi()?;
        }
    }

    fn field_decl(&mut self) -> PResult<FieldDecl> {
        let embedded = match (self.kind(), self.kind_at(1)) {
            (TokenKind::Punct("*"), _) => true,
            (TokenKind::Ident(_), TokenKind::Punct(".")) => true,
            (TokenKind::Ident(_), TokenKind::Str(_) | TokenKind::Semi) => true,
            (TokenKind::Ident(_), TokenKind::Punct("}")) => true,
            (TokenKind::Ident(_), _) => false,
            _ => return self.unexpected("field name or embedded type"),
        };

        let (names, ty) = if embedded {
            let ty = self.type_expr()?;
            match &ty {
                TypeExpr::Ident(_) | TypeExpr::Qualified { .. } => {}
                TypeExpr::Pointer(inner)
                    if matches!(**inner, TypeExpr::Ident(_) | TypeExpr::Qualified { .. }) => {}
                _ => return self.error("embedded field must be a type name or pointer to one"),
            }
            (Vec::new(), ty)
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat_punct(",") {
                names.push(self.expect_ident()?);
            }
            (names, self.type_expr()?)
        };

        let tag = match self.kind().clone() {
            TokenKind::Str(tag) => {
                self.pos += 1;
                Some(tag)
            }
            _ => None,
        };

        Ok(FieldDecl { names, ty, tag })
    }

    fn type_expr(&mut self) -> PResult<TypeExpr> {
        match self.kind().clone() {
            TokenKind::Punct("*") => {
                self.pos += 1;
                Ok(TypeExpr::Pointer(Box::new(self.type_expr()?)))
            }
            TokenKind::Punct("(") => {
                self.pos += 1;
                let inner = self.type_expr()?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            TokenKind::Punct("[") => {
                self.pos += 1;
                if self.eat_punct("]") {
                    return Ok(TypeExpr::Slice(Box::new(self.type_expr()?)));
                }
                let mut len = String::new();
                loop {
                    match self.kind().clone() {
                        TokenKind::Punct("]") => {
                            self.pos += 1;
                            break;
                        }
                        TokenKind::Ident(text) | TokenKind::Lit(text) => len.push_str(&text),
                        TokenKind::Punct(p) => len.push_str(p),
                        _ => return self.unexpected("array length"),
                    }
                    self.pos += 1;
                }
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.type_expr()?),
                })
            }
            TokenKind::Punct("<-") => {
                self.pos += 1;
                if !self.at_keyword("chan") {
                    return self.unexpected("'chan'");
                }
                self.pos += 1;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.type_expr()?),
                })
            }
            TokenKind::Ident(word) => match word.as_str() {
                "map" => {
                    self.pos += 1;
                    self.expect_punct("[")?;
                    let key = self.type_expr()?;
                    self.expect_punct("]")?;
                    let value = self.type_expr()?;
                    Ok(TypeExpr::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                }
                "chan" => {
                    self.pos += 1;
                    let dir = if self.eat_punct("<-") {
                        ChanDir::Send
                    } else {
                        ChanDir::Both
                    };
                    Ok(TypeExpr::Chan {
                        dir,
                        elem: Box::new(self.type_expr()?),
                    })
                }
                "interface" => {
                    self.pos += 1;
                    let open = self.pos;
                    self.expect_punct("{")?;
                    self.skip_semis();
                    if self.eat_punct("}") {
                        return Ok(TypeExpr::EmptyInterface);
                    }
                    self.pos = open;
                    self.skip_group()?;
                    Ok(TypeExpr::Unsupported("interface type with methods".into()))
                }
                "struct" => {
                    self.pos += 1;
                    self.struct_body()?;
                    Ok(TypeExpr::Unsupported("struct type".into()))
                }
                "func" => {
                    self.pos += 1;
                    self.func_signature()?;
                    Ok(TypeExpr::Unsupported("func type".into()))
                }
                _ => {
                    self.pos += 1;
                    let (ty, text) = if self.eat_punct(".") {
                        let name = self.expect_ident()?;
                        let text = format!("{word}.{name}");
                        (TypeExpr::Qualified { package: word, name }, text)
                    } else {
                        (TypeExpr::Ident(word.clone()), word)
                    };
                    if self.at_punct("[") {
                        self.skip_group()?;
                        return Ok(TypeExpr::Unsupported(format!(
                            "generic instantiation {text}[...]"
                        )));
                    }
                    Ok(ty)
                }
            },
            _ => self.unexpected("type"),
        }
    }

    /// Skip `(params) result` of a func type.
    fn func_signature(&mut self) -> PResult<()> {
        if !self.at_punct("(") {
            return self.unexpected("'('");
        }
        self.skip_group()?;
        match self.kind() {
            TokenKind::Punct("(") => self.skip_group(),
            TokenKind::Punct("*" | "[" | "<-") | TokenKind::Ident(_) => self.type_expr().map(|_| ()),
            _ => Ok(()),
        }
    }
}
