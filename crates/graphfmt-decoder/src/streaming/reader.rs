//! Element-level reader over an in-memory document
//!
//! [`ElementReader`] scans markup with `memchr` and only surfaces the
//! elements a caller asks for, each with its attributes and immediate
//! child text pre-collected. Nothing is unescaped or copied until a
//! value is actually looked up.

use std::borrow::Cow;
use std::collections::HashMap;

use memchr::{memchr, memchr2, memchr3, memmem};

use crate::error::DecodeError;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Markup token produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Start {
        name: &'a [u8],
        attributes: &'a [u8],
        empty: bool,
    },
    End {
        name: &'a [u8],
    },
    Text(&'a [u8]),
    CData(&'a [u8]),
}

/// A run of character data inside a child element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a [u8]),
    CData(&'a [u8]),
}

/// Character data of one child element, resolved on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText<'a> {
    pieces: Vec<Piece<'a>>,
    position: usize,
}

impl<'a> RawText<'a> {
    /// Unescaped text, borrowed from the input when it holds no entities.
    pub fn resolve(&self) -> Result<Cow<'a, str>, DecodeError> {
        match self.pieces.as_slice() {
            [] => Ok(Cow::Borrowed("")),
            [piece] => resolve_piece(*piece, self.position),
            pieces => {
                let mut text = String::new();
                for piece in pieces {
                    text.push_str(&resolve_piece(*piece, self.position)?);
                }
                Ok(Cow::Owned(text))
            }
        }
    }
}

fn resolve_piece(piece: Piece<'_>, position: usize) -> Result<Cow<'_, str>, DecodeError> {
    match piece {
        Piece::Text(raw) => unescape(raw, position),
        Piece::CData(raw) => utf8(raw, position).map(Cow::Borrowed),
    }
}

fn utf8(raw: &[u8], position: usize) -> Result<&str, DecodeError> {
    std::str::from_utf8(raw).map_err(|e| DecodeError::syntax(position as u64, e.to_string()))
}

fn unescape(raw: &[u8], position: usize) -> Result<Cow<'_, str>, DecodeError> {
    let text = utf8(raw, position)?;
    quick_xml::escape::unescape(text).map_err(|e| DecodeError::syntax(position as u64, e.to_string()))
}

/// An element whose name the caller asked for.
#[derive(Debug, Clone)]
pub struct MatchedElement<'a> {
    name: &'a [u8],
    position: usize,
    attributes: Vec<(&'a [u8], &'a [u8])>,
    children: HashMap<&'a [u8], RawText<'a>>,
}

impl<'a> MatchedElement<'a> {
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Unescaped value of the named attribute.
    pub fn attribute(&self, name: &[u8]) -> Option<Result<Cow<'a, str>, DecodeError>> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|&(_, value)| unescape(value, self.position))
    }

    /// Text of the last immediate child with this name.
    pub fn child_text(&self, name: &[u8]) -> Option<Result<Cow<'a, str>, DecodeError>> {
        self.children.get(name).map(RawText::resolve)
    }
}

/// Forward-only reader yielding selected depth-1 elements.
#[derive(Debug)]
pub struct ElementReader<'a> {
    input: &'a [u8],
    pos: usize,
    open: Vec<&'a [u8]>,
    saw_root: bool,
}

impl<'a> ElementReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let pos = if input.starts_with(BOM) { BOM.len() } else { 0 };
        Self {
            input,
            pos,
            open: Vec::new(),
            saw_root: false,
        }
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Whether any top-level element has been seen.
    pub fn saw_root(&self) -> bool {
        self.saw_root
    }

    /// Advance to the next direct child of the root whose name is in
    /// `names`, consuming its whole subtree.
    ///
    /// Returns `Ok(None)` once the document is exhausted.
    pub fn next_element(&mut self, names: &[&[u8]]) -> Result<Option<MatchedElement<'a>>, DecodeError> {
        loop {
            let position = self.pos;
            let Some(token) = self.next_token()? else {
                if !self.open.is_empty() {
                    return Err(DecodeError::TruncatedStream { depth: self.depth() });
                }
                return Ok(None);
            };

            match token {
                Token::Start {
                    name,
                    attributes,
                    empty,
                } => {
                    if self.open.is_empty() {
                        self.saw_root = true;
                    }
                    if self.depth() == 1 && names.contains(&name) {
                        let mut element = MatchedElement {
                            name,
                            position,
                            attributes: parse_attributes(attributes, position)?,
                            children: HashMap::new(),
                        };
                        if !empty {
                            self.open.push(name);
                            self.read_children(&mut element)?;
                        }
                        return Ok(Some(element));
                    }
                    if !empty {
                        self.open.push(name);
                    }
                }
                Token::End { name } => self.close(name, position)?,
                Token::Text(_) | Token::CData(_) => {}
            }
        }
    }

    /// Collect the immediate children of the element just opened.
    fn read_children(&mut self, element: &mut MatchedElement<'a>) -> Result<(), DecodeError> {
        let base = self.depth();
        let mut child: Option<(&'a [u8], RawText<'a>)> = None;

        loop {
            let position = self.pos;
            let Some(token) = self.next_token()? else {
                return Err(DecodeError::TruncatedStream { depth: self.depth() });
            };

            match token {
                Token::Start { name, empty, .. } => {
                    if self.depth() == base {
                        let text = RawText {
                            pieces: Vec::new(),
                            position,
                        };
                        if empty {
                            element.children.insert(name, text);
                            continue;
                        }
                        child = Some((name, text));
                    }
                    if !empty {
                        self.open.push(name);
                    }
                }
                Token::End { name } => {
                    self.close(name, position)?;
                    let depth = self.depth();
                    if depth == base {
                        if let Some((name, text)) = child.take() {
                            element.children.insert(name, text);
                        }
                    } else if depth < base {
                        return Ok(());
                    }
                }
                Token::Text(raw) => {
                    if let (Some((_, text)), true) = (child.as_mut(), self.depth() == base + 1) {
                        text.pieces.push(Piece::Text(raw));
                    }
                }
                Token::CData(raw) => {
                    if let (Some((_, text)), true) = (child.as_mut(), self.depth() == base + 1) {
                        text.pieces.push(Piece::CData(raw));
                    }
                }
            }
        }
    }

    fn close(&mut self, name: &[u8], position: usize) -> Result<(), DecodeError> {
        match self.open.pop() {
            Some(open) if open == name => Ok(()),
            Some(open) => Err(DecodeError::syntax(
                position as u64,
                format!(
                    "expected </{}>, found </{}>",
                    String::from_utf8_lossy(open),
                    String::from_utf8_lossy(name)
                ),
            )),
            None => Err(DecodeError::syntax(
                position as u64,
                format!("unmatched </{}>", String::from_utf8_lossy(name)),
            )),
        }
    }

    /// Next start, end, text or CDATA token. Comments, processing
    /// instructions and doctype declarations are skipped.
    fn next_token(&mut self) -> Result<Option<Token<'a>>, DecodeError> {
        loop {
            let input = self.input;
            let rest = &input[self.pos..];
            if rest.is_empty() {
                return Ok(None);
            }

            if rest[0] != b'<' {
                let len = memchr(b'<', rest).unwrap_or(rest.len());
                self.pos += len;
                return Ok(Some(Token::Text(&rest[..len])));
            }

            match rest.get(1) {
                Some(b'/') => {
                    let end = memchr(b'>', rest).ok_or_else(|| self.truncated())?;
                    self.pos += end + 1;
                    return Ok(Some(Token::End {
                        name: rest[2..end].trim_ascii_end(),
                    }));
                }
                Some(b'!') => {
                    if rest.starts_with(b"<!--") {
                        let end = memmem::find(&rest[4..], b"-->").ok_or_else(|| self.truncated())?;
                        self.pos += 4 + end + 3;
                    } else if rest.starts_with(b"<![CDATA[") {
                        let end = memmem::find(&rest[9..], b"]]>").ok_or_else(|| self.truncated())?;
                        self.pos += 9 + end + 3;
                        return Ok(Some(Token::CData(&rest[9..9 + end])));
                    } else if rest.len() >= 9 && rest[2..9].eq_ignore_ascii_case(b"DOCTYPE") {
                        let end = doctype_end(rest).ok_or_else(|| self.truncated())?;
                        self.pos += end + 1;
                    } else {
                        return Err(DecodeError::syntax(self.pos as u64, "invalid markup after `<!`"));
                    }
                }
                Some(b'?') => {
                    let end = memmem::find(&rest[2..], b"?>").ok_or_else(|| self.truncated())?;
                    self.pos += 2 + end + 2;
                }
                Some(_) => {
                    let end = tag_end(rest).ok_or_else(|| self.truncated())?;
                    self.pos += end + 1;
                    let mut body = &rest[1..end];
                    let empty = body.last() == Some(&b'/');
                    if empty {
                        body = &body[..body.len() - 1];
                    }
                    let name_len = body
                        .iter()
                        .position(|b| b.is_ascii_whitespace())
                        .unwrap_or(body.len());
                    return Ok(Some(Token::Start {
                        name: &body[..name_len],
                        attributes: &body[name_len..],
                        empty,
                    }));
                }
                None => return Err(self.truncated()),
            }
        }
    }

    fn truncated(&self) -> DecodeError {
        DecodeError::TruncatedStream {
            depth: self.depth(),
        }
    }
}

/// Offset of the `>` closing a start tag, skipping quoted attribute values.
fn tag_end(tag: &[u8]) -> Option<usize> {
    let mut pos = 1;
    loop {
        let found = pos + memchr3(b'>', b'"', b'\'', &tag[pos..])?;
        match tag[found] {
            b'>' => return Some(found),
            quote => pos = found + 1 + memchr(quote, &tag[found + 1..])? + 1,
        }
    }
}

/// Offset of the `>` closing a doctype declaration, allowing an internal subset.
fn doctype_end(decl: &[u8]) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = 2;
    loop {
        let found = pos + memchr2(b'<', b'>', &decl[pos..])?;
        if decl[found] == b'<' {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(found);
            }
        }
        pos = found + 1;
    }
}

/// Split an attribute list into `(name, raw value)` pairs.
fn parse_attributes(mut raw: &[u8], position: usize) -> Result<Vec<(&[u8], &[u8])>, DecodeError> {
    let error = |message: String| DecodeError::syntax(position as u64, message);
    let mut attributes: Vec<(&[u8], &[u8])> = Vec::new();

    loop {
        raw = raw.trim_ascii_start();
        if raw.is_empty() {
            return Ok(attributes);
        }

        let key_len = raw
            .iter()
            .position(|&b| b == b'=' || b.is_ascii_whitespace())
            .unwrap_or(raw.len());
        let key = &raw[..key_len];
        let lossy_key = || String::from_utf8_lossy(key).into_owned();

        raw = raw[key_len..].trim_ascii_start();
        raw = raw
            .strip_prefix(b"=")
            .ok_or_else(|| error(format!("attribute `{}` has no value", lossy_key())))?
            .trim_ascii_start();

        let quote = match raw.first() {
            Some(&q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(error(format!("value of attribute `{}` is not quoted", lossy_key()))),
            None => return Err(error(format!("attribute `{}` has no value", lossy_key()))),
        };
        let len = memchr(quote, &raw[1..])
            .ok_or_else(|| error(format!("value of attribute `{}` is not closed", lossy_key())))?;
        let value = &raw[1..1 + len];
        raw = &raw[len + 2..];

        if attributes.iter().any(|(existing, _)| *existing == key) {
            return Err(error(format!("duplicate attribute `{}`", lossy_key())));
        }
        attributes.push((key, value));
    }
}
