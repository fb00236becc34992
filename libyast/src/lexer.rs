//! Lexer
//!
//! The lexer converts a source buffer into a token stream. It tracks
//! block indentation using a stack and flow nesting using a depth counter,
//! and emits:
//! - Structure indicators: `---`, `...`, `-`, `?`, `:`, `[`, `]`, `{`, `}`, `,`
//! - Node properties: anchors, aliases and tags
//! - Scalars, already decoded: escapes processed and lines folded
//!
//! Comments are trivia. They never reach the main token stream and are kept
//! in a side channel for formatting tools.
//!
//! Grammar errors are left to the parser. The lexer only fails on malformed
//! low-level constructs such as an unterminated quoted scalar.

use crate::error::{Result, SyntaxError};
use crate::options::ParseOptions;
use crate::position::Position;
use crate::scanner::{count_indent, is_blank, is_blank_or_end, is_flow_indicator, Scanner};
use crate::token::{Chomping, Token, TokenKind, TokenStream};

/// Tokenize a source buffer with default options.
pub fn tokenize(input: &[u8]) -> Result<TokenStream> {
    tokenize_with_options(input, &ParseOptions::default())
}

/// Tokenize a source buffer.
pub fn tokenize_with_options(input: &[u8], options: &ParseOptions) -> Result<TokenStream> {
    let scanner = Scanner::new(input)
        .map_err(|e| e.with_filename(options.filename.as_deref()))?;
    let lexer = Lexer {
        scanner,
        tokens: Vec::new(),
        comments: Vec::new(),
        retain_comments: options.retain_comments,
        indents: Vec::new(),
        flow_depth: 0,
        at_line_start: true,
    };
    let stream = lexer
        .run()
        .map_err(|e| e.with_filename(options.filename.as_deref()))?;
    tracing::debug!(
        bytes = input.len(),
        tokens = stream.tokens.len(),
        comments = stream.comments.len(),
        "tokenized"
    );
    Ok(stream)
}

struct Lexer<'a> {
    scanner: Scanner<'a>,
    tokens: Vec<Token>,
    comments: Vec<Token>,
    retain_comments: bool,
    /// Columns of the open block collections, innermost last.
    indents: Vec<usize>,
    flow_depth: usize,
    /// Nothing but whitespace has been consumed since the last line break.
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<TokenStream> {
        loop {
            self.skip_trivia()?;
            if self.scanner.is_eof() {
                let pos = self.scanner.position();
                self.tokens
                    .push(Token::new(TokenKind::EndOfStream, "", "", pos, pos));
                break;
            }
            if self.at_line_start {
                self.at_line_start = false;
                if self.flow_depth == 0 {
                    self.unwind_indents(self.scanner.column());
                }
            }
            self.scan_token()?;
        }
        Ok(TokenStream {
            tokens: self.tokens,
            comments: self.comments,
        })
    }

    // ========================================================================
    // Indentation
    // ========================================================================

    /// Close every block collection deeper than `column`.
    fn unwind_indents(&mut self, column: usize) {
        while self.indents.last().is_some_and(|&top| top > column) {
            self.indents.pop();
        }
    }

    /// Open a block collection at `column` unless one is already open there.
    fn push_indent(&mut self, column: usize) {
        match self.indents.last() {
            Some(&top) if top >= column => {}
            _ => self.indents.push(column),
        }
    }

    /// Indentation of the block collection owning the next node, or -1 at
    /// the document root.
    fn owner_indent(&self) -> isize {
        self.indents.last().map(|&c| c as isize).unwrap_or(-1)
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Skip whitespace, line breaks and comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            if self.scanner.column() == 0 {
                self.check_indentation_tabs()?;
            }
            self.scanner.skip_blanks();
            match self.scanner.peek() {
                Some('#') if self.at_comment_boundary() => self.scan_comment(),
                Some('\n') | Some('\r') => {
                    self.scanner.skip_break();
                    self.at_line_start = true;
                }
                _ => return Ok(()),
            }
        }
    }

    /// A `#` opens a comment only at line start or after whitespace.
    fn at_comment_boundary(&self) -> bool {
        self.scanner.column() == 0
            || self
                .scanner
                .prev_char()
                .map_or(true, |c| is_blank(c) || c == '\n' || c == '\r')
    }

    /// Tabs may separate tokens but never indent block content.
    fn check_indentation_tabs(&self) -> Result<()> {
        if self.flow_depth > 0 {
            return Ok(());
        }
        let line = self.scanner.rest_of_line();
        let spaces = count_indent(line);
        let after = &line[spaces..];
        if after.starts_with('\t') {
            let content = after.trim_start_matches([' ', '\t']);
            if !content.is_empty() && !content.starts_with('#') {
                let mut pos = self.scanner.position();
                pos.offset += spaces;
                pos.column += spaces;
                return Err(SyntaxError::lexical(
                    "tab character used for indentation",
                    pos,
                ));
            }
        }
        Ok(())
    }

    fn scan_comment(&mut self) {
        let start = self.scanner.position();
        self.scanner.skip_to_break();
        if self.retain_comments {
            let origin = self.scanner.slice_from(start.offset);
            let text = origin[1..].trim_end();
            self.comments.push(Token::new(
                TokenKind::Comment,
                text,
                origin,
                start,
                self.scanner.position(),
            ));
        }
    }

    // ========================================================================
    // Token Dispatch
    // ========================================================================

    fn scan_token(&mut self) -> Result<()> {
        let column = self.scanner.column();
        let rest = self.scanner.rest();

        if column == 0 {
            if is_document_marker(rest, "---") {
                self.reset_document_state();
                return self.emit_fixed(TokenKind::DocumentStart, 3);
            }
            if is_document_marker(rest, "...") {
                self.reset_document_state();
                return self.emit_fixed(TokenKind::DocumentEnd, 3);
            }
            if rest.starts_with('%') && self.flow_depth == 0 {
                self.scan_directive();
                return Ok(());
            }
        }

        let Some(ch) = self.scanner.peek() else {
            return Ok(());
        };
        let next = self.scanner.peek_at(1);
        match ch {
            '[' => {
                self.flow_depth += 1;
                self.emit_fixed(TokenKind::SequenceStart, 1)
            }
            '{' => {
                self.flow_depth += 1;
                self.emit_fixed(TokenKind::MappingStart, 1)
            }
            ']' => {
                self.flow_depth = self.flow_depth.saturating_sub(1);
                self.emit_fixed(TokenKind::SequenceEnd, 1)
            }
            '}' => {
                self.flow_depth = self.flow_depth.saturating_sub(1);
                self.emit_fixed(TokenKind::MappingEnd, 1)
            }
            ',' => self.emit_fixed(TokenKind::CollectEntry, 1),
            '-' if is_blank_or_end(next) => {
                if self.flow_depth == 0 {
                    self.push_indent(column);
                }
                self.emit_fixed(TokenKind::SequenceEntry, 1)
            }
            '?' if is_blank_or_end(next) || (self.flow_depth > 0 && next.is_some_and(is_flow_indicator)) => {
                if self.flow_depth == 0 {
                    self.push_indent(column);
                }
                self.emit_fixed(TokenKind::MappingKey, 1)
            }
            ':' if self.is_value_indicator() => {
                if self.flow_depth == 0 {
                    let key_column = self.key_column();
                    self.push_indent(key_column);
                }
                self.emit_fixed(TokenKind::MappingValue, 1)
            }
            '&' => self.scan_anchor_or_alias(TokenKind::Anchor),
            '*' => self.scan_anchor_or_alias(TokenKind::Alias),
            '!' => self.scan_tag(),
            '|' | '>' => {
                if self.flow_depth > 0 {
                    return Err(SyntaxError::lexical(
                        "block scalar is not allowed inside a flow collection",
                        self.scanner.position(),
                    ));
                }
                self.scan_block_scalar(ch == '|')
            }
            '\'' => self.scan_quoted(true),
            '"' => self.scan_quoted(false),
            '#' => Err(SyntaxError::lexical(
                "comment must be separated from other tokens by whitespace",
                self.scanner.position(),
            )),
            '@' | '`' => Err(SyntaxError::lexical(
                format!("reserved indicator '{}' cannot start a plain scalar", ch),
                self.scanner.position(),
            )),
            _ => self.scan_plain(),
        }
    }

    fn reset_document_state(&mut self) {
        self.indents.clear();
        self.flow_depth = 0;
    }

    /// Emit a token made of the next `len` characters.
    fn emit_fixed(&mut self, kind: TokenKind, len: usize) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.bump_n(len);
        let text = self.scanner.slice_from(start.offset);
        self.tokens
            .push(Token::new(kind, text, text, start, self.scanner.position()));
        Ok(())
    }

    /// Whether the `:` at the cursor is a mapping value indicator.
    fn is_value_indicator(&self) -> bool {
        let next = self.scanner.peek_at(1);
        if is_blank_or_end(next) {
            return true;
        }
        if self.flow_depth == 0 {
            return false;
        }
        if next.is_some_and(is_flow_indicator) {
            return true;
        }
        // JSON-like keys may be followed directly by ':' in flow context.
        self.tokens.last().is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::SingleQuoted
                    | TokenKind::DoubleQuoted
                    | TokenKind::SequenceEnd
                    | TokenKind::MappingEnd
            ) && t.end.offset == self.scanner.offset()
        })
    }

    /// Column where the implicit key before a `:` starts, including node
    /// properties written on the same line. A flow collection key starts at
    /// its opening bracket.
    fn key_column(&self) -> usize {
        let colon = self.scanner.position();
        let tokens = &self.tokens;
        let Some(last) = tokens.len().checked_sub(1) else {
            return colon.indent();
        };
        if tokens[last].end.line != colon.line {
            return colon.indent();
        }
        let first = match tokens[last].kind {
            TokenKind::SequenceEnd | TokenKind::MappingEnd => {
                match matching_opener(tokens, last) {
                    Some(i) => i,
                    None => return colon.indent(),
                }
            }
            TokenKind::Alias | TokenKind::MergeKey => last,
            k if k.is_scalar() => last,
            _ => return colon.indent(),
        };
        let mut column = tokens[first].start.indent();
        let line = tokens[first].start.line;
        for prop in tokens[..first].iter().rev() {
            if !prop.kind.is_property() || prop.end.line != line {
                break;
            }
            column = prop.start.indent();
        }
        column
    }

    // ========================================================================
    // Directives and Node Properties
    // ========================================================================

    fn scan_directive(&mut self) {
        let start = self.scanner.position();
        let line = self.scanner.rest_of_line();
        let body = strip_trailing_comment(line);
        self.scanner.bump_n(body.chars().count());
        let end = self.scanner.position();
        let value = body.trim_end();
        self.tokens
            .push(Token::new(TokenKind::Directive, value, body, start, end));
    }

    fn scan_anchor_or_alias(&mut self, kind: TokenKind) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.bump();
        let name_start = self.scanner.offset();
        while let Some(ch) = self.scanner.peek() {
            if is_blank_or_end(Some(ch)) || is_flow_indicator(ch) {
                break;
            }
            self.scanner.bump();
        }
        let name = self.scanner.slice_from(name_start);
        if name.is_empty() {
            let what = if kind == TokenKind::Anchor {
                "anchor"
            } else {
                "alias"
            };
            return Err(SyntaxError::lexical(
                format!("{} name must not be empty", what),
                start,
            ));
        }
        let origin = self.scanner.slice_from(start.offset);
        self.tokens.push(Token::new(
            kind,
            name,
            origin,
            start,
            self.scanner.position(),
        ));
        Ok(())
    }

    fn scan_tag(&mut self) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.bump();
        if self.scanner.peek() == Some('<') {
            // Verbatim tag: !<tag:yaml.org,2002:str>
            loop {
                match self.scanner.bump() {
                    Some('>') => break,
                    Some('\n') | Some('\r') | None => {
                        return Err(SyntaxError::lexical("unterminated verbatim tag", start));
                    }
                    Some(_) => {}
                }
            }
        } else {
            while let Some(ch) = self.scanner.peek() {
                if is_blank_or_end(Some(ch)) || (self.flow_depth > 0 && is_flow_indicator(ch)) {
                    break;
                }
                self.scanner.bump();
            }
        }
        let origin = self.scanner.slice_from(start.offset);
        self.tokens.push(Token::new(
            TokenKind::Tag,
            origin,
            origin,
            start,
            self.scanner.position(),
        ));
        Ok(())
    }

    // ========================================================================
    // Plain Scalars
    // ========================================================================

    fn scan_plain(&mut self) -> Result<()> {
        let start = self.scanner.position();
        let owner = self.owner_indent();
        let in_flow = self.flow_depth > 0;
        let mut value = String::new();
        let mut end = start;

        loop {
            // One line of content.
            let mut prev_blank = false;
            let mut line = String::new();
            let mut trimmed_len = 0;
            while let Some(ch) = self.scanner.peek() {
                if ch == '\n' || ch == '\r' {
                    break;
                }
                if ch == ':' && self.plain_stops_at_colon(in_flow) {
                    break;
                }
                if ch == '#' && prev_blank {
                    break;
                }
                if in_flow && is_flow_indicator(ch) {
                    break;
                }
                self.scanner.bump();
                line.push(ch);
                prev_blank = is_blank(ch);
                if !prev_blank {
                    trimmed_len = line.len();
                    end = self.scanner.position();
                }
            }
            line.truncate(trimmed_len);
            value.push_str(&line);

            if !self.scanner.at_break_or_eof() {
                break;
            }
            match self.plain_continuation(owner, in_flow) {
                Some(blank_lines) => {
                    if blank_lines == 0 {
                        value.push(' ');
                    } else {
                        value.push_str(&"\n".repeat(blank_lines));
                    }
                }
                None => break,
            }
        }

        if end == start {
            return Err(SyntaxError::lexical(
                format!("unexpected character {:?}", self.scanner.peek().unwrap_or(' ')),
                start,
            ));
        }
        // Leave trailing whitespace for the trivia skipper.
        self.scanner.reset(end);
        let origin = self.scanner.slice_from(start.offset);
        let kind = if value == "<<" {
            TokenKind::MergeKey
        } else {
            TokenKind::PlainScalar
        };
        self.tokens.push(Token::new(kind, value, origin, start, end));
        Ok(())
    }

    fn plain_stops_at_colon(&self, in_flow: bool) -> bool {
        let next = self.scanner.peek_at(1);
        is_blank_or_end(next) || (in_flow && next.is_some_and(is_flow_indicator))
    }

    /// At a line break inside a plain scalar, decide whether the scalar
    /// continues on the next non-blank line. On success the cursor is left
    /// at the first character of that line's content and the number of
    /// blank lines skipped is returned. Otherwise the cursor is unchanged.
    fn plain_continuation(&mut self, owner: isize, in_flow: bool) -> Option<usize> {
        let saved = self.scanner.position();
        let mut blank_lines = 0;
        if !self.scanner.skip_break() {
            return None;
        }
        loop {
            let line = self.scanner.rest_of_line();
            if !line.trim_matches([' ', '\t']).is_empty() {
                break;
            }
            if self.scanner.is_eof() {
                self.scanner.reset(saved);
                return None;
            }
            self.scanner.skip_to_break();
            if !self.scanner.skip_break() {
                self.scanner.reset(saved);
                return None;
            }
            blank_lines += 1;
        }

        let line = self.scanner.rest_of_line();
        let indent = count_indent(line);
        let content = line.trim_start_matches([' ', '\t']);
        let continues = !content.starts_with('#')
            && !(indent == 0
                && (is_document_marker(content, "---") || is_document_marker(content, "...")))
            && !line_has_value_indicator(content, in_flow)
            && if in_flow {
                !content.starts_with(is_flow_indicator)
            } else {
                indent as isize > owner && !(indent == 0 && content.starts_with('%'))
            };
        if !continues {
            self.scanner.reset(saved);
            return None;
        }
        self.scanner.skip_blanks();
        Some(blank_lines)
    }

    // ========================================================================
    // Quoted Scalars
    // ========================================================================

    fn scan_quoted(&mut self, single: bool) -> Result<()> {
        let start = self.scanner.position();
        let kind = if single {
            TokenKind::SingleQuoted
        } else {
            TokenKind::DoubleQuoted
        };
        let style = if single {
            "single-quoted"
        } else {
            "double-quoted"
        };
        self.scanner.bump();

        let mut value = String::new();
        // Blanks are held back until we know they are not trailing a line.
        let mut pending = String::new();
        loop {
            let Some(ch) = self.scanner.peek() else {
                return Err(SyntaxError::lexical(
                    format!("unterminated {} scalar", style),
                    start,
                ));
            };
            match ch {
                '\'' if single => {
                    value.push_str(&pending);
                    pending.clear();
                    if self.scanner.peek_at(1) == Some('\'') {
                        value.push('\'');
                        self.scanner.bump_n(2);
                    } else {
                        self.scanner.bump();
                        break;
                    }
                }
                '"' if !single => {
                    value.push_str(&pending);
                    self.scanner.bump();
                    break;
                }
                '\\' if !single => {
                    value.push_str(&pending);
                    pending.clear();
                    if matches!(self.scanner.peek_at(1), Some('\n') | Some('\r')) {
                        self.scanner.bump();
                        self.fold_quoted_break(start, style, &mut value, true)?;
                    } else {
                        let escaped = self.scan_escape()?;
                        value.push(escaped);
                    }
                }
                ' ' | '\t' => {
                    pending.push(ch);
                    self.scanner.bump();
                }
                '\n' | '\r' => {
                    pending.clear();
                    self.fold_quoted_break(start, style, &mut value, false)?;
                }
                _ => {
                    value.push_str(&pending);
                    pending.clear();
                    value.push(ch);
                    self.scanner.bump();
                }
            }
        }

        let origin = self.scanner.slice_from(start.offset);
        self.tokens.push(Token::new(
            kind,
            value,
            origin,
            start,
            self.scanner.position(),
        ));
        Ok(())
    }

    /// Fold a line break inside a quoted scalar: one break becomes a space,
    /// each following blank line a newline. An escaped break adds nothing.
    fn fold_quoted_break(
        &mut self,
        start: Position,
        style: &str,
        value: &mut String,
        escaped: bool,
    ) -> Result<()> {
        self.scanner.skip_break();
        let mut blank_lines = 0;
        loop {
            self.scanner.skip_blanks();
            if self.scanner.is_eof() {
                return Err(SyntaxError::lexical(
                    format!("unterminated {} scalar", style),
                    start,
                ));
            }
            if !self.scanner.skip_break() {
                break;
            }
            blank_lines += 1;
        }
        let line_start = self.scanner.rest_of_line();
        if self.scanner.column() == 0
            && (is_document_marker(line_start, "---") || is_document_marker(line_start, "..."))
        {
            return Err(SyntaxError::lexical(
                format!("document marker inside {} scalar", style),
                self.scanner.position(),
            ));
        }
        if blank_lines > 0 {
            value.push_str(&"\n".repeat(blank_lines));
        } else if !escaped {
            value.push(' ');
        }
        Ok(())
    }

    /// Decode one backslash escape of a double-quoted scalar.
    fn scan_escape(&mut self) -> Result<char> {
        let at = self.scanner.position();
        self.scanner.bump();
        let Some(esc) = self.scanner.bump() else {
            return Err(SyntaxError::lexical("unterminated escape sequence", at));
        };
        let ch = match esc {
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            't' | '\t' => '\t',
            'n' => '\n',
            'v' => '\x0B',
            'f' => '\x0C',
            'r' => '\r',
            'e' => '\x1B',
            ' ' => ' ',
            '"' => '"',
            '/' => '/',
            '\\' => '\\',
            'N' => '\u{85}',
            '_' => '\u{A0}',
            'L' => '\u{2028}',
            'P' => '\u{2029}',
            'x' => self.scan_hex_escape(at, 2)?,
            'u' => self.scan_hex_escape(at, 4)?,
            'U' => self.scan_hex_escape(at, 8)?,
            other => {
                return Err(SyntaxError::lexical(
                    format!("invalid escape sequence \\{}", other),
                    at,
                ));
            }
        };
        Ok(ch)
    }

    fn scan_hex_escape(&mut self, at: Position, digits: usize) -> Result<char> {
        let mut code: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .scanner
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| {
                    SyntaxError::lexical(
                        format!("escape sequence needs {} hexadecimal digits", digits),
                        at,
                    )
                })?;
            self.scanner.bump();
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| {
            SyntaxError::lexical(format!("invalid code point U+{:04X} in escape", code), at)
        })
    }

    // ========================================================================
    // Block Scalars
    // ========================================================================

    fn scan_block_scalar(&mut self, literal: bool) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.bump();

        // Header: indentation indicator and chomping indicator in either order.
        let mut chomping: Option<Chomping> = None;
        let mut indicator: Option<usize> = None;
        for _ in 0..2 {
            match self.scanner.peek() {
                Some('+') if chomping.is_none() => chomping = Some(Chomping::Keep),
                Some('-') if chomping.is_none() => chomping = Some(Chomping::Strip),
                Some('0') => {
                    return Err(SyntaxError::lexical(
                        "block scalar indentation indicator must be between 1 and 9",
                        self.scanner.position(),
                    ));
                }
                Some(d @ '1'..='9') if indicator.is_none() => {
                    indicator = d.to_digit(10).map(|d| d as usize);
                }
                _ => break,
            }
            self.scanner.bump();
        }
        let header_end = self.scanner.position();
        self.scanner.skip_blanks();
        if self.scanner.peek() == Some('#') && self.at_comment_boundary() {
            self.scan_comment();
        }
        if !self.scanner.at_break_or_eof() {
            return Err(SyntaxError::lexical(
                "invalid block scalar header",
                self.scanner.position(),
            ));
        }

        let owner = self.owner_indent();
        let mut content_indent = indicator.map(|d| if owner < 0 { d } else { owner as usize + d });
        let mut lines: Vec<String> = Vec::new();
        let mut end = header_end;

        while self.scanner.skip_break() {
            if self.scanner.is_eof() {
                break;
            }
            let line = self.scanner.rest_of_line();
            let spaces = count_indent(line);
            let is_empty = line.trim_matches([' ', '\t']).is_empty();
            if spaces == 0
                && (is_document_marker(line, "---") || is_document_marker(line, "..."))
            {
                break;
            }
            let indent = match content_indent {
                Some(ci) => ci,
                None if is_empty => {
                    lines.push(String::new());
                    self.scanner.skip_to_break();
                    continue;
                }
                None => {
                    if spaces as isize <= owner {
                        break;
                    }
                    content_indent = Some(spaces);
                    spaces
                }
            };
            if is_empty {
                lines.push(if spaces > indent {
                    line[indent..].to_string()
                } else {
                    String::new()
                });
            } else if spaces < indent {
                break;
            } else {
                lines.push(line[indent..].to_string());
            }
            self.scanner.skip_to_break();
            if !is_empty {
                end = self.scanner.position();
            }
        }
        // The cursor now sits at the start of the first line that is not
        // part of the scalar, or at the end of input.
        self.at_line_start = true;

        let chomping_mode = chomping.unwrap_or_default();
        let value = build_block_value(&lines, literal, chomping_mode);
        let origin = self.scanner.slice_from(start.offset);
        let mut token = Token::new(
            if literal {
                TokenKind::Literal
            } else {
                TokenKind::Folded
            },
            value,
            origin.trim_end_matches(['\n', '\r', ' ']),
            start,
            end,
        );
        token.chomping = Some(chomping_mode);
        token.indent_indicator = indicator;
        self.tokens.push(token);
        Ok(())
    }
}

/// Index of the `[` or `{` that the closer at `close` balances.
fn matching_opener(tokens: &[Token], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        match tokens[i].kind {
            TokenKind::SequenceEnd | TokenKind::MappingEnd => depth += 1,
            TokenKind::SequenceStart | TokenKind::MappingStart => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether `text` begins with a document marker followed by whitespace or
/// the end of input.
fn is_document_marker(text: &str, marker: &str) -> bool {
    text.starts_with(marker) && is_blank_or_end(text[marker.len()..].chars().next())
}

/// Cut a trailing ` # comment` from a line.
fn strip_trailing_comment(line: &str) -> &str {
    let mut prev_blank = false;
    for (i, ch) in line.char_indices() {
        if ch == '#' && prev_blank {
            return &line[..i];
        }
        prev_blank = is_blank(ch);
    }
    line
}

/// Whether a line contains a mapping value indicator before any comment
/// (and, in flow context, before the end of the current entry).
fn line_has_value_indicator(line: &str, in_flow: bool) -> bool {
    let mut chars = line.chars().peekable();
    let mut prev_blank = true;
    while let Some(ch) = chars.next() {
        match ch {
            '#' if prev_blank => return false,
            ':' => {
                let next = chars.peek().copied();
                if is_blank_or_end(next) || (in_flow && next.is_some_and(is_flow_indicator)) {
                    return true;
                }
            }
            ',' | ']' | '}' if in_flow => return false,
            _ => {}
        }
        prev_blank = is_blank(ch);
    }
    false
}

/// Assemble block scalar content from lines with the content indentation
/// already removed. Empty strings are empty lines.
fn build_block_value(lines: &[String], literal: bool, chomping: Chomping) -> String {
    let last_content = lines.iter().rposition(|l| !l.is_empty());
    let (body, trailing) = match last_content {
        Some(i) => (&lines[..=i], lines.len() - i - 1),
        None => (&lines[..0], lines.len()),
    };

    let mut out = if literal {
        body.join("\n")
    } else {
        fold_block_lines(body)
    };
    match chomping {
        Chomping::Strip => {}
        Chomping::Clip => {
            if !body.is_empty() {
                out.push('\n');
            }
        }
        Chomping::Keep => {
            if !body.is_empty() {
                out.push('\n');
            }
            out.push_str(&"\n".repeat(trailing));
        }
    }
    out
}

/// Folded scalar line joining: adjacent normal lines are joined with a
/// space, empty lines become newlines, and more-indented lines keep the
/// breaks around them.
fn fold_block_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut prev_more: Option<bool> = None;
    let mut empties = 0;
    for line in lines {
        if line.is_empty() {
            empties += 1;
            continue;
        }
        let more = line.starts_with(' ') || line.starts_with('\t');
        match prev_more {
            None => out.push_str(&"\n".repeat(empties)),
            Some(false) if !more => {
                if empties == 0 {
                    out.push(' ');
                } else {
                    out.push_str(&"\n".repeat(empties));
                }
            }
            Some(_) => out.push_str(&"\n".repeat(empties + 1)),
        }
        out.push_str(line);
        prev_more = Some(more);
        empties = 0;
    }
    out
}
