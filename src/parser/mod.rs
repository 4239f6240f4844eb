/*!
# Message record extraction

This module implements the heart of the crate: the state machine which
consumes [`Token`]s from a token source and produces one [`Record`] per
`Message` element of a dump document.

## Document structure

A message dump consists of a single `FileDump` wrapper element containing
zero or more `Message` elements. Each `Message` element carries a `From`
field and a `Message` body field (the body reuses the tag name of its
parent; this is a quirk of the dump dialect which is preserved here):

```text
<FileDump>
  <Message>
    <From>Joe.doe@gmail.com</From>
    <Message>Hi Jane</Message>
  </Message>
  ...
</FileDump>
```

## Sanitization

Only the field tags are structural. Any markup appearing *inside* a field
value is foreign: it is not interpreted, but it is not discarded either.
Foreign tags are re-serialized into the field value as entity-escaped text
(`<` as `&lt;`, `>` as `&gt;`, attributes reproduced in document order), so
the original nested markup remains recoverable from the stored value. The
extractor tracks the nesting depth at which a field was entered (the
sanitize boundary) to know when foreign markup has closed back out to the
field level.
*/
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::mem;

use crate::error::*;
use crate::lexer::{AttrList, Lexer, Token};
use crate::strings::{CData, Name, NameStr};

/// Tag name of the document root wrapper.
pub const TAG_FILE_DUMP: &'static NameStr = unsafe { mem::transmute("FileDump") };
/// Tag name of a message element; also the tag name of the body field.
pub const TAG_MESSAGE: &'static NameStr = unsafe { mem::transmute("Message") };
/// Tag name of the sender field.
pub const TAG_FROM: &'static NameStr = unsafe { mem::transmute("From") };

/// A single extracted message.
///
/// Keys are exactly the field tag names which appeared as direct children
/// of the `Message` element; in a conforming document these are
/// [`TAG_FROM`] and [`TAG_MESSAGE`]. Values hold the field's character
/// data with any foreign nested markup escaped.
pub type Record = HashMap<Name, CData>;

/**
# Read individual tokens from a source

Analogously to [`std::io::Read`] and intended as a wrapper around
[`crate::Lexer`], this trait provides individual tokens.
*/
pub trait TokenRead {
	/// Return a single token from the source.
	///
	/// If the EOF has been reached without errors, None is returned.
	///
	/// Lexer errors and I/O errors from the underlying data source are
	/// passed through.
	fn read(&mut self) -> Result<Option<Token>>;
}

/// Wrapper around [`Lexer`](crate::Lexer) and [`std::io::BufRead`] to
/// provide a [`TokenRead`].
pub struct LexerAdapter<R: io::BufRead> {
	lexer: Lexer,
	src: R,
}

impl<R: io::BufRead> LexerAdapter<R> {
	/// Wraps a lexer and a byte source
	pub fn new(lexer: Lexer, src: R) -> Self {
		Self { lexer, src }
	}

	/// Consume self and return the wrapped lexer and byte source.
	pub fn into_inner(self) -> (Lexer, R) {
		(self.lexer, self.src)
	}

	/// Return a reference to the byte source
	pub fn get_ref(&self) -> &R {
		&self.src
	}

	/// Return a mutable reference to the byte source
	pub fn get_mut(&mut self) -> &mut R {
		&mut self.src
	}

	/// Return a reference to the lexer
	pub fn get_lexer(&self) -> &Lexer {
		&self.lexer
	}

	/// Return a mutable reference to the lexer
	pub fn get_lexer_mut(&mut self) -> &mut Lexer {
		&mut self.lexer
	}
}

impl<R: io::BufRead> TokenRead for LexerAdapter<R> {
	fn read(&mut self) -> Result<Option<Token>> {
		self.lexer.lex(&mut self.src)
	}
}

/**
Trait for parser-like structs.
*/
pub trait Parse {
	type Output;

	/// Parse a single output item using tokens from `r`.
	///
	/// If the end of file has been reached after a document accepted by
	/// the parser, `None` is returned. Otherwise, if the document is still
	/// acceptable the next item is returned.
	///
	/// If the document violates the schema or the dialect's syntax, the
	/// corresponding error is returned.
	///
	/// Errors from the token source (such as I/O errors) are forwarded.
	fn parse<R: TokenRead>(&mut self, r: &mut R) -> Result<Option<Self::Output>>;

	/// Release all temporary buffers or other ephemeral allocations
	///
	/// This is sensible to call when it is expected that no more data will
	/// be processed by the parser for a while and the memory is better
	/// used elsewhere.
	fn release_temporaries(&mut self);
}

/**
# Diagnostic sink for the extractor

A caller-supplied sink which observes the extractor's state transitions
and accumulator snapshots. Tracing is pure observability: the methods are
infallible, nothing is fed back into the extractor, and a traced run must
produce exactly the same outcome as an untraced one.

See [`Extractor::with_trace`].
*/
pub trait Trace {
	/// Called after each processed token with the state left and the
	/// state entered (which may be equal), along with the tag name which
	/// caused the transition, if any.
	fn transition(&mut self, from: &'static str, to: &'static str, tag: Option<&NameStr>);

	/// Called with the current accumulator contents whenever the
	/// accumulator changed or is about to be committed.
	fn accumulator(&mut self, text: &str);
}

/// [`Trace`] implementation forwarding to the [`log`] crate at debug
/// level.
pub struct LogTrace;

impl Trace for LogTrace {
	fn transition(&mut self, from: &'static str, to: &'static str, tag: Option<&NameStr>) {
		match tag {
			Some(tag) => log::debug!("state: {} -> {} (tag: {:?})", from, to, tag.as_str()),
			None => log::debug!("state: {} -> {}", from, to),
		}
	}

	fn accumulator(&mut self, text: &str) {
		log::debug!("accumulator: {:?}", text);
	}
}

#[derive(Debug, Clone, PartialEq)]
enum State {
	/// Outside any message; only the wrapper and `Message` elements live
	/// here.
	Zero,
	/// Inside a `Message` element, between fields.
	Message,
	/// Inside the named field, accumulating plain text.
	Field(Name),
	/// Inside the named field and additionally inside foreign markup;
	/// everything is escaped into the accumulator.
	Sanitize(Name),
	/// The document has been fully accepted.
	Eof,
}

impl State {
	fn name(&self) -> &'static str {
		match self {
			State::Zero => "ZERO",
			State::Message => "MESSAGE",
			State::Field(..) => "MESSAGE_FIELD",
			State::Sanitize(..) => "MESSAGE_SANITIZE",
			State::Eof => "EOF",
		}
	}
}

/// Append a foreign element head to the accumulator, escaped.
///
/// Attribute values are reproduced verbatim between double quotes; quotes
/// inside values are intentionally *not* escaped. This mirrors the dump
/// dialect's historical serialization and is kept for compatibility with
/// downstream consumers of stored field values.
fn push_escaped_open(buf: &mut String, name: &NameStr, attrs: &AttrList) {
	buf.push_str("&lt;");
	buf.push_str(name.as_str());
	for (k, v) in attrs {
		buf.push(' ');
		buf.push_str(k.as_str());
		buf.push_str("=\"");
		buf.push_str(v.as_str());
		buf.push('"');
	}
	buf.push_str("&gt;");
}

/// Append a foreign element foot to the accumulator, escaped.
fn push_escaped_close(buf: &mut String, name: &NameStr) {
	buf.push_str("&lt;/");
	buf.push_str(name.as_str());
	buf.push_str("&gt;");
}

/**
# Message record extractor

The [`Extractor`] converts [`Token`]s into [`Record`]s, one per `Message`
element of the dump document. It is a low-level interface which expects to
be driven from a [`TokenRead`] source; the crate-level frontends
([`FeedExtractor`], [`PullExtractor`], [`AsyncExtractor`]) do exactly
that.

The extractor is strict about the envelope: the root element must be
`FileDump`, its children must be `Message` elements, and the first field
of every message must be `From`. Any other shape terminates the run with
[`Error::InvalidFormat`], after which the extractor is poisoned and
returns that error indefinitely; successful completion and the structural
error are mutually exclusive. Content *inside* fields, in contrast, is
never a schema violation: foreign tags there are escaped into the field
value (see the module documentation).

   [`FeedExtractor`]: crate::FeedExtractor
   [`PullExtractor`]: crate::PullExtractor
   [`AsyncExtractor`]: crate::AsyncExtractor
*/
pub struct Extractor {
	state: State,
	/// Element nesting depth; counts every open tag regardless of state.
	depth: usize,
	/// Depth at which the current field's own close tag will appear.
	sanitize_end: usize,
	seen_root: bool,
	fields: Record,
	text: String,
	trace: Option<Box<dyn Trace>>,
	err: Option<Box<Error>>,
}

impl Extractor {
	/// Create a new extractor.
	pub fn new() -> Self {
		Self {
			state: State::Zero,
			depth: 0,
			sanitize_end: 0,
			seen_root: false,
			fields: Record::new(),
			text: String::new(),
			trace: None,
			err: None,
		}
	}

	/// Create a new extractor which reports each state transition and
	/// each accumulator snapshot to the given diagnostic sink.
	///
	/// Tracing has no effect on extraction outcomes.
	pub fn with_trace<T: Trace + 'static>(trace: T) -> Self {
		let mut this = Self::new();
		this.trace = Some(Box::new(trace));
		this
	}

	/// Poison the extractor, making it return the same error for all
	/// eternity.
	fn poison(&mut self, e: Error) {
		self.err = Some(Box::new(e))
	}

	/// Check if the extractor is poisoned and return the corresponding
	/// error.
	fn check_poison(&self) -> Result<()> {
		if let Some(e) = self.err.as_ref() {
			Err((**e).clone())
		} else {
			Ok(())
		}
	}

	fn trace_transition(&mut self, from: &'static str, tag: Option<&NameStr>) {
		if let Some(trace) = self.trace.as_mut() {
			trace.transition(from, self.state.name(), tag);
		}
	}

	fn trace_accumulator(&mut self) {
		if let Some(trace) = self.trace.as_mut() {
			trace.accumulator(&self.text);
		}
	}

	fn handle_open(&mut self, name: Name, attrs: AttrList) -> Result<()> {
		let state = mem::replace(&mut self.state, State::Zero);
		let from = state.name();
		let next = match state {
			State::Zero if self.depth == 0 => {
				if self.seen_root || name != *TAG_FILE_DUMP {
					return Err(Error::InvalidFormat);
				}
				self.seen_root = true;
				State::Zero
			}
			State::Zero if self.depth == 1 && name == *TAG_MESSAGE => State::Message,
			State::Zero => return Err(Error::InvalidFormat),
			State::Message => {
				let recognized = name == *TAG_FROM || name == *TAG_MESSAGE;
				// the first field of every record must be the sender
				if !recognized || (self.fields.is_empty() && name != *TAG_FROM) {
					return Err(Error::InvalidFormat);
				}
				self.sanitize_end = self.depth + 1;
				State::Field(name.clone())
			}
			State::Field(field) | State::Sanitize(field) => {
				push_escaped_open(&mut self.text, &name, &attrs);
				State::Sanitize(field)
			}
			// a token source handing out tokens past its end of stream is
			// lying; treat that as a structural violation
			State::Eof => return Err(Error::InvalidFormat),
		};
		self.depth += 1;
		self.state = next;
		self.trace_transition(from, Some(&name));
		if let State::Sanitize(..) = self.state {
			self.trace_accumulator();
		}
		Ok(())
	}

	fn handle_close(&mut self, name: Name) -> Result<Option<Record>> {
		if self.depth == 0 {
			// more closes than opens; never decrement below zero
			return Err(Error::InvalidFormat);
		}
		self.depth -= 1;
		let state = mem::replace(&mut self.state, State::Zero);
		let from = state.name();
		let (next, result) = match state {
			State::Zero => {
				if name != *TAG_FILE_DUMP {
					return Err(Error::InvalidFormat);
				}
				(State::Zero, None)
			}
			State::Message => {
				if name != *TAG_MESSAGE {
					return Err(Error::InvalidFormat);
				}
				let record = mem::take(&mut self.fields);
				(State::Zero, Some(record))
			}
			State::Field(field) => {
				if name != field {
					return Err(Error::InvalidFormat);
				}
				self.trace_accumulator();
				// SAFETY: the accumulator only ever receives lexed CData
				// and ASCII escape sequences
				let value = unsafe { CData::from_string_unchecked(mem::take(&mut self.text)) };
				self.fields.insert(field, value);
				(State::Message, None)
			}
			State::Sanitize(field) => {
				push_escaped_close(&mut self.text, &name);
				let next = if self.depth == self.sanitize_end {
					State::Field(field)
				} else {
					State::Sanitize(field)
				};
				(next, None)
			}
			State::Eof => return Err(Error::InvalidFormat),
		};
		self.state = next;
		self.trace_transition(from, Some(&name));
		if let State::Sanitize(..) | State::Field(..) = self.state {
			self.trace_accumulator();
		}
		Ok(result)
	}

	fn handle_text(&mut self, text: CData) {
		match self.state {
			State::Field(..) | State::Sanitize(..) => {
				self.text.push_str(text.as_str());
				self.trace_accumulator();
			}
			// text between structural tags (typically indentation) carries
			// no meaning
			_ => (),
		}
	}

	fn handle_eof(&mut self) -> Result<()> {
		if self.depth != 0 || self.state != State::Zero || !self.seen_root {
			// truncated document: the wrapper (or a field) never closed,
			// or there was no document at all
			return Err(Error::InvalidFormat);
		}
		let from = self.state.name();
		self.state = State::Eof;
		self.trace_transition(from, None);
		Ok(())
	}
}

impl Default for Extractor {
	fn default() -> Self {
		Self::new()
	}
}

impl Parse for Extractor {
	type Output = Record;

	fn parse<R: TokenRead>(&mut self, r: &mut R) -> Result<Option<Record>> {
		self.check_poison()?;
		loop {
			if let State::Eof = self.state {
				return Ok(None);
			}
			let tok = match r.read() {
				Ok(tok) => tok,
				// pass through I/O errors without poisoning the extractor
				Err(Error::IO(e)) => return Err(Error::IO(e)),
				// poison for everything else: the token source is broken
				// beyond recovery and no further record may be emitted
				Err(other) => {
					self.poison(other.clone());
					return Err(other);
				}
			};
			let result = match tok {
				Some(Token::Open(name, attrs)) => self.handle_open(name, attrs).map(|()| None),
				Some(Token::Close(name)) => self.handle_close(name),
				Some(Token::Text(text)) => {
					self.handle_text(text);
					Ok(None)
				}
				None => self.handle_eof().map(|()| None),
			};
			match result {
				Ok(Some(record)) => return Ok(Some(record)),
				Ok(None) => (),
				Err(e) => {
					self.poison(e.clone());
					return Err(e);
				}
			}
		}
	}

	fn release_temporaries(&mut self) {
		self.text.shrink_to_fit();
		self.fields.shrink_to_fit();
	}
}

impl fmt::Debug for Extractor {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Extractor")
			.field("state", &self.state)
			.field("depth", &self.depth)
			.finish()
	}
}
