/*!
# Message dump lexer

Byte-level tokenizer for the restricted XML dialect used by message dump
files. The lexer turns a stream of bytes into a stream of structural
[`Token`]s: element heads (with their attributes), element feet and
character data.

The dialect is deliberately small:

* No DTD, no CDATA sections, no custom entities.
* Processing instructions (including the XML declaration) and comments are
  consumed and discarded without producing tokens.
* Character data and attribute values are delivered **verbatim**: no entity
  expansion and no line-ending normalization takes place. Consumers which
  re-serialize content rely on this round-trip property.
* Names are ASCII (see [`crate::strings`]).

The lexer is resumable: [`Lexer::lex_bytes`] consumes from a byte slice and
returns a [`std::io::ErrorKind::WouldBlock`] I/O error when the slice is
exhausted before a token is complete. All lexer state, including partially
accumulated tokens and partial UTF-8 sequences, is kept across calls.
*/
use std::fmt;
use std::io;
use std::mem;

use smartstring::alias::String as SmartString;

use crate::error::*;
use crate::strings::{is_name_byte, is_name_start_byte, validate_cdata, CData, Name};

pub const ERR_SOURCE_EMPTY: &'static str = "byte source exhausted before end of token";

/// Attributes of an element head, as `(name, value)` pairs in document
/// order.
///
/// Order is preserved because consumers re-serialize attributes exactly as
/// they appeared.
pub type AttrList = Vec<(Name, CData)>;

/**
A single token of the restricted dump dialect

Tokens are emitted by the lexer after processing bits of the document. In
contrast to a full XML tokenizer, attributes do not form separate tokens;
they are aggregated into the element head, which is the shape the record
extractor consumes.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	/// An element head, e.g. `<foo bar="baz">`.
	///
	/// For a self-closing head (`<foo/>`), this token is followed
	/// immediately by the corresponding [`Token::Close`].
	Open(Name, AttrList),

	/// An element foot, e.g. `</foo>`, or the implied foot of a
	/// self-closing head.
	Close(Name),

	/// A piece of character data between tags, verbatim.
	///
	/// There is no guarantee as to the segmentation of text tokens. It is
	/// possible that for a single consecutive piece of character data,
	/// multiple tokens are emitted, for instance when the token length
	/// limit is exceeded.
	Text(CData),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementState {
	/// Within the element name
	Name,
	/// Whitespace between name, attributes and the closing symbol
	Blank,
	/// Within an attribute name
	AttrName,
	/// Behind an attribute name, expecting `=`
	Eq,
	/// Behind `=`, expecting the opening quote
	AttrValueBegin,
	/// Within a quoted attribute value; the byte is the delimiter
	AttrValue(u8),
	/// Encountered `/` in an element head
	MaybeHeadClose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementKind {
	/// standard element head e.g. `<foo>`
	Header,
	/// standard element foot e.g. `</foo>`
	Footer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SkipKind {
	/// processing instruction, terminated by `?>`
	Pi,
	/// comment, terminated by `-->`
	Comment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MaybeElementState {
	/// Just behind the `<`
	Initial,
	/// Behind `<!`; number of correct comment start dashes seen
	CommentStart(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
	/// Character data up to the next `<`
	Content,
	/// Encountered `<`
	MaybeElement(MaybeElementState),
	/// Within an element head or foot
	Element {
		kind: ElementKind,
		state: ElementState,
	},
	/// Within a non-token construct which is consumed and discarded;
	/// `matched` counts the bytes of the terminator seen so far
	Skip { kind: SkipKind, matched: usize },
	Eof,
}

/// Hold options to configure a [`Lexer`].
///
/// See also [`Lexer::with_options()`].
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct LexerOptions {
	/// Maximum number of bytes which can form a token.
	///
	/// This exists to limit the memory use of the Lexer for tokens where
	/// the data needs to be buffered in memory.
	///
	/// If token data exceeds this limit, it depends on the token type
	/// whether a partial token is emitted or the lexing fails with
	/// [`SyntaxError::RestrictedDialect`]: text tokens are split and
	/// emitted in parts (and lexing continues), all other tokens exceeding
	/// this limit will cause an error.
	pub max_token_length: usize,
}

impl LexerOptions {
	/// Set the [`LexerOptions::max_token_length`] value.
	pub fn max_token_length(mut self, v: usize) -> LexerOptions {
		self.max_token_length = v;
		self
	}
}

impl Default for LexerOptions {
	/// Constructs default lexer options.
	///
	/// The defaults are implementation-defined and should not be relied
	/// upon.
	fn default() -> LexerOptions {
		LexerOptions {
			max_token_length: 65535,
		}
	}
}

fn is_spacing_byte(b: u8) -> bool {
	b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

/// Decode a scratchpad into validated character data.
fn decode_cdata(buf: Vec<u8>, ctx: &'static str) -> Result<CData> {
	let s = String::from_utf8(buf).map_err(|e| {
		let at = e.utf8_error().valid_up_to();
		Error::InvalidUtf8Byte(e.as_bytes()[at])
	})?;
	validate_cdata(&s).map_err(|e| match e {
		SyntaxError::InvalidChar(_, cp) => SyntaxError::InvalidChar(ctx, cp),
		other => other,
	})?;
	// SAFETY: validated above
	Ok(unsafe { CData::from_string_unchecked(s) })
}

/**
# Restricted dump dialect lexer

The lexer is the token source of this crate: it converts bytes into
[`Token`]s which are then consumed by the
[`Extractor`](crate::parser::Extractor).

Except for I/O errors, all errors are fatal: after returning one, the lexer
will return the same error on any further call without consuming more data.
*/
pub struct Lexer {
	state: State,
	opts: LexerOptions,
	/// Character data not yet emitted; may end in a partial UTF-8 sequence
	textbuf: Vec<u8>,
	namebuf: SmartString,
	attrnamebuf: SmartString,
	attrvalbuf: Vec<u8>,
	attrs: AttrList,
	/// Implied foot of a self-closing head, emitted on the next call
	pending: Option<Token>,
	err: Option<Box<Error>>,
}

impl Lexer {
	/// Create a new Lexer with default options.
	pub fn new() -> Self {
		Self::with_options(LexerOptions::default())
	}

	/// Create a new Lexer with the given options.
	pub fn with_options(opts: LexerOptions) -> Self {
		Self {
			state: State::Content,
			opts,
			textbuf: Vec::new(),
			namebuf: SmartString::new(),
			attrnamebuf: SmartString::new(),
			attrvalbuf: Vec::new(),
			attrs: Vec::new(),
			pending: None,
			err: None,
		}
	}

	fn poison(&mut self, e: Error) {
		self.err = Some(Box::new(e))
	}

	fn check_poison(&self) -> Result<()> {
		if let Some(e) = self.err.as_ref() {
			Err((**e).clone())
		} else {
			Ok(())
		}
	}

	/// Flush accumulated character data, if any.
	fn take_text(&mut self) -> Result<Option<Token>> {
		if self.textbuf.is_empty() {
			return Ok(None);
		}
		let buf = mem::take(&mut self.textbuf);
		Ok(Some(Token::Text(decode_cdata(buf, ERRCTX_TEXT)?)))
	}

	/// Flush the longest valid UTF-8 prefix of the text scratchpad,
	/// keeping a trailing partial sequence for the next call.
	fn split_text(&mut self) -> Result<Option<Token>> {
		let cut = match std::str::from_utf8(&self.textbuf) {
			Ok(_) => self.textbuf.len(),
			Err(e) if e.error_len().is_none() => e.valid_up_to(),
			Err(e) => return Err(Error::InvalidUtf8Byte(self.textbuf[e.valid_up_to()])),
		};
		if cut == 0 {
			// only a partial sequence buffered; cannot split yet
			return Ok(None);
		}
		let tail = self.textbuf.split_off(cut);
		let head = mem::replace(&mut self.textbuf, tail);
		Ok(Some(Token::Text(decode_cdata(head, ERRCTX_TEXT)?)))
	}

	/// Finish the attribute whose name and value scratchpads are filled.
	fn finish_attribute(&mut self) -> Result<()> {
		// SAFETY: only name bytes were admitted into the scratchpad
		let name = unsafe { Name::from_smartstring_unchecked(mem::take(&mut self.attrnamebuf)) };
		let value = decode_cdata(mem::take(&mut self.attrvalbuf), ERRCTX_ATTVAL)?;
		self.attrs.push((name, value));
		Ok(())
	}

	/// Finish an element head or foot at its `>`.
	fn finish_element(&mut self, kind: ElementKind, self_closing: bool) -> Result<Option<Token>> {
		if self.namebuf.is_empty() {
			return Err(SyntaxError::EmptyName.into());
		}
		// SAFETY: only name bytes were admitted into the scratchpad
		let name = unsafe { Name::from_smartstring_unchecked(mem::take(&mut self.namebuf)) };
		self.state = State::Content;
		match kind {
			ElementKind::Header => {
				let attrs = mem::take(&mut self.attrs);
				if self_closing {
					self.pending = Some(Token::Close(name.clone()));
				}
				Ok(Some(Token::Open(name, attrs)))
			}
			ElementKind::Footer => Ok(Some(Token::Close(name))),
		}
	}

	fn lex_element_byte(
		&mut self,
		kind: ElementKind,
		state: ElementState,
		b: u8,
	) -> Result<Option<Token>> {
		match state {
			ElementState::Name => {
				if is_name_byte(b) && !self.namebuf.is_empty()
					|| is_name_start_byte(b) && self.namebuf.is_empty()
				{
					if self.namebuf.len() >= self.opts.max_token_length {
						return Err(SyntaxError::RestrictedDialect("name too long").into());
					}
					self.namebuf.push(b as char);
					return Ok(None);
				}
				match b {
					b if is_spacing_byte(b) && !self.namebuf.is_empty() => {
						self.state = State::Element {
							kind,
							state: ElementState::Blank,
						};
						Ok(None)
					}
					b'>' => self.finish_element(kind, false),
					b'/' if kind == ElementKind::Header && !self.namebuf.is_empty() => {
						self.state = State::Element {
							kind,
							state: ElementState::MaybeHeadClose,
						};
						Ok(None)
					}
					b => Err(SyntaxError::UnexpectedByte(ERRCTX_NAME, b, Some(&["name"])).into()),
				}
			}
			ElementState::Blank => match b {
				b if is_spacing_byte(b) => Ok(None),
				b'>' => self.finish_element(kind, false),
				b'/' if kind == ElementKind::Header => {
					self.state = State::Element {
						kind,
						state: ElementState::MaybeHeadClose,
					};
					Ok(None)
				}
				b if kind == ElementKind::Header && is_name_start_byte(b) => {
					self.attrnamebuf.clear();
					self.attrnamebuf.push(b as char);
					self.state = State::Element {
						kind,
						state: ElementState::AttrName,
					};
					Ok(None)
				}
				b => Err(SyntaxError::UnexpectedByte(
					ERRCTX_ELEMENT,
					b,
					match kind {
						ElementKind::Header => Some(&["attribute name", "'>'", "'/'"]),
						ElementKind::Footer => Some(&["'>'"]),
					},
				)
				.into()),
			},
			ElementState::AttrName => {
				if is_name_byte(b) {
					if self.attrnamebuf.len() >= self.opts.max_token_length {
						return Err(SyntaxError::RestrictedDialect("name too long").into());
					}
					self.attrnamebuf.push(b as char);
					return Ok(None);
				}
				match b {
					b if is_spacing_byte(b) => {
						self.state = State::Element {
							kind,
							state: ElementState::Eq,
						};
						Ok(None)
					}
					b'=' => {
						self.state = State::Element {
							kind,
							state: ElementState::AttrValueBegin,
						};
						Ok(None)
					}
					b => Err(SyntaxError::UnexpectedByte(ERRCTX_NAME, b, Some(&["'='"])).into()),
				}
			}
			ElementState::Eq => match b {
				b if is_spacing_byte(b) => Ok(None),
				b'=' => {
					self.state = State::Element {
						kind,
						state: ElementState::AttrValueBegin,
					};
					Ok(None)
				}
				b => Err(SyntaxError::UnexpectedByte(ERRCTX_ELEMENT, b, Some(&["'='"])).into()),
			},
			ElementState::AttrValueBegin => match b {
				b if is_spacing_byte(b) => Ok(None),
				b'"' | b'\'' => {
					self.attrvalbuf.clear();
					self.state = State::Element {
						kind,
						state: ElementState::AttrValue(b),
					};
					Ok(None)
				}
				b => Err(SyntaxError::UnexpectedByte(
					ERRCTX_ATTVAL,
					b,
					Some(&["'\"'", "'\\''"]),
				)
				.into()),
			},
			ElementState::AttrValue(delim) => {
				if b == delim {
					self.finish_attribute()?;
					self.state = State::Element {
						kind,
						state: ElementState::Blank,
					};
					return Ok(None);
				}
				// anything but the delimiter passes through verbatim
				if self.attrvalbuf.len() >= self.opts.max_token_length {
					return Err(
						SyntaxError::RestrictedDialect("attribute value too long").into(),
					);
				}
				self.attrvalbuf.push(b);
				Ok(None)
			}
			ElementState::MaybeHeadClose => match b {
				b'>' => self.finish_element(kind, true),
				b => Err(SyntaxError::UnexpectedByte(ERRCTX_ELEMENT, b, Some(&["'>'"])).into()),
			},
		}
	}

	fn lex_byte(&mut self, b: u8) -> Result<Option<Token>> {
		match self.state {
			State::Content => match b {
				b'<' => {
					self.state = State::MaybeElement(MaybeElementState::Initial);
					self.take_text()
				}
				b => {
					self.textbuf.push(b);
					if self.textbuf.len() >= self.opts.max_token_length {
						self.split_text()
					} else {
						Ok(None)
					}
				}
			},
			State::MaybeElement(MaybeElementState::Initial) => match b {
				b'/' => {
					self.namebuf.clear();
					self.state = State::Element {
						kind: ElementKind::Footer,
						state: ElementState::Name,
					};
					Ok(None)
				}
				b'?' => {
					self.state = State::Skip {
						kind: SkipKind::Pi,
						matched: 0,
					};
					Ok(None)
				}
				b'!' => {
					self.state = State::MaybeElement(MaybeElementState::CommentStart(0));
					Ok(None)
				}
				b if is_name_start_byte(b) => {
					self.namebuf.clear();
					self.namebuf.push(b as char);
					self.attrs.clear();
					self.state = State::Element {
						kind: ElementKind::Header,
						state: ElementState::Name,
					};
					Ok(None)
				}
				b => Err(SyntaxError::UnexpectedByte(
					ERRCTX_ELEMENT,
					b,
					Some(&["name", "'/'", "'?'", "'!--'"]),
				)
				.into()),
			},
			State::MaybeElement(MaybeElementState::CommentStart(nread)) => match b {
				// no DOCTYPE, no CDATA sections: `<!` must open a comment
				b'-' => {
					if nread + 1 == 2 {
						self.state = State::Skip {
							kind: SkipKind::Comment,
							matched: 0,
						};
					} else {
						self.state =
							State::MaybeElement(MaybeElementState::CommentStart(nread + 1));
					}
					Ok(None)
				}
				b => {
					Err(SyntaxError::UnexpectedByte(ERRCTX_COMMENT, b, Some(&["'--'"])).into())
				}
			},
			State::Skip { kind, matched } => {
				self.state = match (kind, b) {
					(SkipKind::Pi, b'?') => State::Skip { kind, matched: 1 },
					(SkipKind::Pi, b'>') if matched == 1 => State::Content,
					(SkipKind::Pi, _) => State::Skip { kind, matched: 0 },
					(SkipKind::Comment, b'-') => State::Skip {
						kind,
						matched: (matched + 1).min(2),
					},
					(SkipKind::Comment, b'>') if matched >= 2 => State::Content,
					(SkipKind::Comment, _) => State::Skip { kind, matched: 0 },
				};
				Ok(None)
			}
			State::Element { kind, state } => self.lex_element_byte(kind, state, b),
			State::Eof => Ok(None),
		}
	}

	fn lex_eof(&mut self) -> Result<Option<Token>> {
		match self.state {
			State::Content => match self.take_text()? {
				Some(tok) => Ok(Some(tok)),
				None => {
					self.state = State::Eof;
					Ok(None)
				}
			},
			State::Element {
				state: ElementState::AttrValue(..),
				..
			} => Err(Error::eof(ERRCTX_ATTVAL)),
			State::MaybeElement(..) | State::Element { .. } => Err(Error::eof(ERRCTX_ELEMENT)),
			State::Skip {
				kind: SkipKind::Pi, ..
			} => Err(Error::eof(ERRCTX_PI)),
			State::Skip {
				kind: SkipKind::Comment,
				..
			} => Err(Error::eof(ERRCTX_COMMENT)),
			State::Eof => Ok(None),
		}
	}

	fn lex_bytes_inner(&mut self, r: &mut &[u8], at_eof: bool) -> Result<Option<Token>> {
		loop {
			if let State::Eof = self.state {
				return Ok(None);
			}
			let b = match r.split_first() {
				Some((b, rest)) => {
					let b = *b;
					*r = rest;
					b
				}
				None => {
					if !at_eof {
						return Err(Error::io(io::Error::new(
							io::ErrorKind::WouldBlock,
							ERR_SOURCE_EMPTY,
						)));
					}
					return self.lex_eof();
				}
			};
			if let Some(tok) = self.lex_byte(b)? {
				return Ok(Some(tok));
			}
		}
	}

	/// Lex a single token from a byte slice, consuming the bytes used.
	///
	/// If the slice is exhausted before a token is complete and `at_eof` is
	/// false, an I/O error of kind [`std::io::ErrorKind::WouldBlock`] is
	/// returned; all accumulated state is kept and lexing resumes on the
	/// next call. With `at_eof` set, an exhausted slice either terminates
	/// the token stream (`Ok(None)`) or is an error, depending on the
	/// lexer state.
	pub fn lex_bytes(&mut self, r: &mut &[u8], at_eof: bool) -> Result<Option<Token>> {
		self.check_poison()?;
		if let Some(tok) = self.pending.take() {
			return Ok(Some(tok));
		}
		match self.lex_bytes_inner(r, at_eof) {
			// pass through I/O errors without poisoning the lexer
			Err(Error::IO(e)) => Err(Error::IO(e)),
			Err(other) => {
				self.poison(other.clone());
				Err(other)
			}
			ok => ok,
		}
	}

	/// Lex a single token from a [`io::BufRead`].
	///
	/// I/O errors from the source are forwarded; a
	/// [`std::io::ErrorKind::WouldBlock`] error from the source means that
	/// not enough data is buffered to finish a token.
	pub fn lex<R: io::BufRead>(&mut self, r: &mut R) -> Result<Option<Token>> {
		loop {
			let (result, consumed) = {
				let mut buf = match r.fill_buf() {
					Ok(b) => b,
					Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
					Err(e) => return Err(Error::io(e)),
				};
				let at_eof = buf.is_empty();
				let orig = buf.len();
				let result = self.lex_bytes(&mut buf, at_eof);
				(result, orig - buf.len())
			};
			r.consume(consumed);
			match result {
				// the buffered bytes ran out mid-token: get more
				Err(Error::IO(ref e)) if e.kind() == io::ErrorKind::WouldBlock => continue,
				other => return other,
			}
		}
	}

	/// Release all temporary buffers
	///
	/// This is sensible to call when it is expected that no more data will
	/// be processed by the lexer for a while and the memory is better used
	/// elsewhere.
	pub fn release_temporaries(&mut self) {
		self.textbuf.shrink_to_fit();
		self.attrvalbuf.shrink_to_fit();
		self.attrs.shrink_to_fit();
	}
}

impl fmt::Debug for Lexer {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Lexer").field("state", &self.state).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::convert::TryInto;
	use std::io;

	fn name(s: &str) -> Name {
		s.try_into().unwrap()
	}

	fn cdata(s: &str) -> CData {
		s.try_into().unwrap()
	}

	fn lex_all_with(lexer: &mut Lexer, data: &[u8]) -> (Vec<Token>, Result<()>) {
		let mut buf = data;
		let mut out = Vec::new();
		loop {
			match lexer.lex_bytes(&mut buf, true) {
				Ok(Some(tok)) => out.push(tok),
				Ok(None) => return (out, Ok(())),
				Err(e) => return (out, Err(e)),
			}
		}
	}

	fn lex_all(data: &[u8]) -> (Vec<Token>, Result<()>) {
		let mut lexer = Lexer::new();
		lex_all_with(&mut lexer, data)
	}

	#[test]
	fn lexer_lexes_simple_document() {
		let (toks, r) = lex_all(b"<FileDump><Message><From>joe@example.com</From></Message></FileDump>");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(name("FileDump"), vec![]),
				Token::Open(name("Message"), vec![]),
				Token::Open(name("From"), vec![]),
				Token::Text(cdata("joe@example.com")),
				Token::Close(name("From")),
				Token::Close(name("Message")),
				Token::Close(name("FileDump")),
			]
		);
	}

	#[test]
	fn lexer_lexes_attributes_in_document_order() {
		let (toks, r) = lex_all(b"<a href=\"x\" id='y'/>");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(
					name("a"),
					vec![(name("href"), cdata("x")), (name("id"), cdata("y"))]
				),
				Token::Close(name("a")),
			]
		);
	}

	#[test]
	fn lexer_allows_whitespace_inside_tags() {
		let (toks, r) = lex_all(b"<a  href = \"x\" ></a >");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(name("a"), vec![(name("href"), cdata("x"))]),
				Token::Close(name("a")),
			]
		);
	}

	#[test]
	fn lexer_emits_open_then_close_for_self_closing_head() {
		let (toks, r) = lex_all(b"<x/><y />");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(name("x"), vec![]),
				Token::Close(name("x")),
				Token::Open(name("y"), vec![]),
				Token::Close(name("y")),
			]
		);
	}

	#[test]
	fn lexer_passes_text_through_verbatim() {
		// no entity expansion: pre-escaped input must survive untouched
		let (toks, r) = lex_all(b"<m>&lt;script&gt; &amp; friends\r\n</m>");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(name("m"), vec![]),
				Token::Text(cdata("&lt;script&gt; &amp; friends\r\n")),
				Token::Close(name("m")),
			]
		);
	}

	#[test]
	fn lexer_preserves_quotes_inside_attribute_values() {
		let (toks, r) = lex_all(b"<a title='say \"hi\"'></a>");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(name("a"), vec![(name("title"), cdata("say \"hi\""))]),
				Token::Close(name("a")),
			]
		);
	}

	#[test]
	fn lexer_skips_xml_declaration_and_pis() {
		let (toks, r) = lex_all(b"<?xml version='1.0'?><root><?php echo ?></root>");
		r.unwrap();
		assert_eq!(
			toks,
			vec![Token::Open(name("root"), vec![]), Token::Close(name("root"))]
		);
	}

	#[test]
	fn lexer_skips_comments() {
		let (toks, r) = lex_all(b"<root><!-- a comment - with > dashes ---></root>");
		r.unwrap();
		assert_eq!(
			toks,
			vec![Token::Open(name("root"), vec![]), Token::Close(name("root"))]
		);
	}

	#[test]
	fn lexer_rejects_doctype() {
		let (_, r) = lex_all(b"<!DOCTYPE html><root/>");
		match r {
			Err(Error::Syntax(SyntaxError::UnexpectedByte(ERRCTX_COMMENT, b'D', _))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_invalid_name_start() {
		let (_, r) = lex_all(b"<1tag/>");
		match r {
			Err(Error::Syntax(SyntaxError::UnexpectedByte(ERRCTX_ELEMENT, b'1', _))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_empty_footer_name() {
		let (_, r) = lex_all(b"<a></>");
		match r {
			Err(Error::Syntax(SyntaxError::EmptyName)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_eof_inside_element() {
		let (_, r) = lex_all(b"<root attr=\"val");
		match r {
			Err(Error::Syntax(SyntaxError::InvalidEof(ERRCTX_ATTVAL))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_eof_inside_comment() {
		let (_, r) = lex_all(b"<root/><!-- unterminated");
		match r {
			Err(Error::Syntax(SyntaxError::InvalidEof(ERRCTX_COMMENT))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_control_chars_in_text() {
		let (_, r) = lex_all(b"<m>\x01</m>");
		match r {
			Err(Error::Syntax(SyntaxError::InvalidChar(ERRCTX_TEXT, 0x1))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_invalid_utf8_in_text() {
		let (_, r) = lex_all(b"<m>a\xffb</m>");
		match r {
			Err(Error::InvalidUtf8Byte(0xff)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_rejects_truncated_utf8_sequence_at_tag_boundary() {
		let (_, r) = lex_all(b"<m>caf\xc3</m>");
		match r {
			Err(Error::InvalidUtf8Byte(0xc3)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_resumes_across_chunk_boundaries() {
		let doc: &[u8] = b"<Message from='a'>Hi <b>there</b></Message>";
		let mut lexer = Lexer::new();
		let mut out = Vec::new();
		for i in 0..doc.len() {
			let mut chunk = &doc[i..i + 1];
			loop {
				match lexer.lex_bytes(&mut chunk, false) {
					Ok(Some(tok)) => out.push(tok),
					Ok(None) => panic!("unexpected eof"),
					Err(Error::IO(e)) if e.kind() == io::ErrorKind::WouldBlock => break,
					Err(other) => panic!("unexpected error: {:?}", other),
				}
			}
		}
		let mut tail: &[u8] = &[];
		match lexer.lex_bytes(&mut tail, true) {
			Ok(None) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(
			out,
			vec![
				Token::Open(name("Message"), vec![(name("from"), cdata("a"))]),
				Token::Text(cdata("Hi ")),
				Token::Open(name("b"), vec![]),
				Token::Text(cdata("there")),
				Token::Close(name("b")),
				Token::Close(name("Message")),
			]
		);
	}

	#[test]
	fn lexer_splits_overlong_text_at_char_boundaries() {
		let mut lexer = Lexer::with_options(LexerOptions::default().max_token_length(4));
		// 'ä' is two bytes; the limit must never cut through it
		let (toks, r) = lex_all_with(&mut lexer, "<m>aaaääbb</m>".as_bytes());
		r.unwrap();
		let mut text = String::new();
		let mut n_text = 0;
		for tok in toks {
			if let Token::Text(t) = tok {
				assert!(t.len() <= 5);
				text.push_str(&t);
				n_text += 1;
			}
		}
		assert_eq!(text, "aaaääbb");
		assert!(n_text > 1);
	}

	#[test]
	fn lexer_rejects_overlong_names() {
		let mut lexer = Lexer::with_options(LexerOptions::default().max_token_length(4));
		let (_, r) = lex_all_with(&mut lexer, b"<toolong/>");
		match r {
			Err(Error::Syntax(SyntaxError::RestrictedDialect(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn lexer_returns_the_same_error_forever() {
		let mut lexer = Lexer::new();
		let mut buf: &[u8] = b"<m>\x01</m>";
		let e1 = loop {
			match lexer.lex_bytes(&mut buf, true) {
				Ok(Some(_)) => continue,
				Ok(None) => panic!("lexer accepted invalid input"),
				Err(e) => break e,
			}
		};
		let mut rest: &[u8] = b"<more/>";
		let e2 = lexer.lex_bytes(&mut rest, true).err().unwrap();
		assert_eq!(e1, e2);
		// poisoned: no bytes may be consumed anymore
		assert_eq!(rest, b"<more/>");
	}

	#[test]
	fn lexer_eof_in_content_is_clean() {
		let (toks, r) = lex_all(b"<a/> trailing");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				Token::Open(name("a"), vec![]),
				Token::Close(name("a")),
				Token::Text(cdata(" trailing")),
			]
		);
	}
}
