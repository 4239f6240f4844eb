/*!
Wrappers around lexers and extractors to drive them.

For high-level extraction, [`FeedExtractor`] and [`PullExtractor`] are the
things to look at. More information and examples can also be found in the
[`msgdump`] top-level documentation.

   [`msgdump`]: crate
*/

use std::io;

use bytes::Bytes;

use crate::bufq::BufferQueue;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, LexerOptions};
use crate::parser::{Extractor, LexerAdapter, Parse};

/**
# Source for individual records

This trait is implemented by the different extractor frontends. It is
analogous to the [`std::io::Read`] trait, but for extracted [`Record`]s
instead of bytes.

   [`Record`]: crate::Record
*/
pub trait RecordRead {
	type Output;

	/// Read a single record from the extractor.
	///
	/// If the EOF has been reached with a valid document, `None` is
	/// returned.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	fn read(&mut self) -> Result<Option<Self::Output>>;

	/// Read all records which can be produced from the data source (at
	/// this point in time).
	///
	/// The given `cb` is invoked for each record.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	fn read_all<F>(&mut self, mut cb: F) -> Result<()>
	where
		F: FnMut(Self::Output) -> (),
	{
		loop {
			match self.read()? {
				None => return Ok(()),
				Some(rec) => cb(rec),
			}
		}
	}

	/// Read all records which can be produced from the data source (at
	/// this point in time).
	///
	/// The given `cb` is invoked for each record.
	///
	/// If the data source indicates that it needs to block to read further
	/// data, `false` is returned. If the EOF is reached successfully,
	/// `true` is returned.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	fn read_all_eof<F>(&mut self, cb: F) -> Result<bool>
	where
		F: FnMut(Self::Output) -> (),
	{
		as_eof_flag(self.read_all(cb))
	}
}

/// Convert end-of-file-ness of a result to a boolean flag.
///
/// If the result is ok, return true (EOF). If the result is not ok, but
/// the error is an I/O error indicating that the data source would have to
/// block to read further data, return false ("Ok, but not at eof yet").
///
/// All other errors are passed through.
pub fn as_eof_flag(r: Result<()>) -> Result<bool> {
	match r {
		Err(Error::IO(ioerr)) if ioerr.kind() == io::ErrorKind::WouldBlock => Ok(false),
		Err(e) => Err(e),
		Ok(()) => Ok(true),
	}
}

/**
# Non-blocking driver for extractors

This is a generic non-blocking push-based driver for objects implementing
the [`Parse`] trait.

In general, it is advised to use the [`FeedExtractor`] alias which
specializes this struct for use with the default [`Extractor`].
*/
pub struct PushDriver<P: Parse> {
	token_source: LexerAdapter<BufferQueue>,
	parser: P,
}

impl<P: Parse + Default> Default for PushDriver<P> {
	/// Create a new push driver using the defaults for its parser and
	/// lexer.
	fn default() -> Self {
		Self::wrap(Lexer::new(), P::default())
	}
}

impl<P: Parse + Default> PushDriver<P> {
	/// Create a new push driver with default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a new push driver while configuring the lexer with the
	/// given options.
	pub fn with_options(options: LexerOptions) -> Self {
		Self::wrap(Lexer::with_options(options), P::default())
	}
}

impl<P: Parse> PushDriver<P> {
	/// Compose a new PushDriver from parts
	pub fn wrap(lexer: Lexer, parser: P) -> Self {
		Self {
			token_source: LexerAdapter::new(lexer, BufferQueue::new()),
			parser,
		}
	}

	/// Feed a chunk of data to the extractor.
	///
	/// This enqueues the data for processing, but does not process it
	/// right away.
	///
	/// To process data, call [`read()`] or [`read_all()`].
	///
	/// # Panics
	///
	/// If [`feed_eof()`] has been called before.
	///
	///    [`read()`]: RecordRead::read
	///    [`read_all()`]: RecordRead::read_all
	///    [`feed_eof()`]: Self::feed_eof()
	pub fn feed<T: Into<Bytes>>(&mut self, data: T) {
		self.token_source.get_mut().push(data);
	}

	/// Feed the eof marker to the extractor.
	///
	/// This is a prerequisite for extraction to terminate with an eof
	/// signal (returning `true`). Otherwise, `false` will be returned
	/// indefinitely without emitting any records.
	///
	/// After the eof marker has been fed to the extractor, no further data
	/// can be fed.
	pub fn feed_eof(&mut self) {
		self.token_source.get_mut().push_eof();
	}

	/// Return the amount of bytes which have not been read from the
	/// buffer yet.
	pub fn buffered(&self) -> usize {
		self.token_source.get_ref().len()
	}

	/// Return a mutable reference to the internal BufferQueue
	///
	/// This can be used to force dropping of all memory in case of error
	/// conditions.
	pub fn get_buffer_mut(&mut self) -> &mut BufferQueue {
		self.token_source.get_mut()
	}

	/// Access the lexer
	pub fn get_lexer(&self) -> &Lexer {
		self.token_source.get_lexer()
	}

	/// Access the lexer, mutably
	pub fn get_lexer_mut(&mut self) -> &mut Lexer {
		self.token_source.get_lexer_mut()
	}

	/// Access the parser
	pub fn get_parser(&self) -> &P {
		&self.parser
	}

	/// Access the parser, mutably
	pub fn get_parser_mut(&mut self) -> &mut P {
		&mut self.parser
	}

	/// Release all temporary buffers
	///
	/// This is sensible to call when it is expected that no more data
	/// will be processed for a while and the memory is better used
	/// elsewhere.
	pub fn release_temporaries(&mut self) {
		self.token_source.get_lexer_mut().release_temporaries();
		self.parser.release_temporaries();
	}
}

impl<P: Parse> RecordRead for PushDriver<P> {
	type Output = P::Output;

	/// Read a single record from the extractor.
	///
	/// If the EOF has been reached with a valid document, `None` is
	/// returned.
	///
	/// If the buffered data is not sufficient to produce a record, an I/O
	/// error of [`std::io::ErrorKind::WouldBlock`] is returned.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	fn read(&mut self) -> Result<Option<Self::Output>> {
		self.parser.parse(&mut self.token_source)
	}
}

/**
# Blocking driver for extractors

This is a generic blocking pull-based driver for objects implementing the
[`Parse`] trait.

In general, it is advised to use the [`PullExtractor`] alias which
specializes this struct for use with the default [`Extractor`].
*/
pub struct PullDriver<T: io::BufRead, P: Parse> {
	parser: P,
	token_source: LexerAdapter<T>,
}

impl<T: io::BufRead, P: Parse + Default> PullDriver<T, P> {
	/// Create a new driver with default options, wrapping the given
	/// reader.
	pub fn new(inner: T) -> Self {
		Self::with_options(inner, LexerOptions::default())
	}

	/// Create a new driver while configuring the lexer with the given
	/// options.
	pub fn with_options(inner: T, options: LexerOptions) -> Self {
		Self::wrap(inner, Lexer::with_options(options), P::default())
	}
}

impl<T: io::BufRead, P: Parse> PullDriver<T, P> {
	/// Create a fully customized driver from a lexer and a parser
	/// component.
	pub fn wrap(inner: T, lexer: Lexer, parser: P) -> Self {
		Self {
			token_source: LexerAdapter::new(lexer, inner),
			parser,
		}
	}

	/// Access the inner BufRead
	pub fn get_inner(&self) -> &T {
		self.token_source.get_ref()
	}

	/// Access the inner BufRead, mutably
	pub fn get_inner_mut(&mut self) -> &mut T {
		self.token_source.get_mut()
	}

	/// Access the lexer
	pub fn get_lexer(&self) -> &Lexer {
		self.token_source.get_lexer()
	}

	/// Access the lexer, mutably
	pub fn get_lexer_mut(&mut self) -> &mut Lexer {
		self.token_source.get_lexer_mut()
	}

	/// Access the parser
	pub fn get_parser(&self) -> &P {
		&self.parser
	}

	/// Access the parser, mutably
	pub fn get_parser_mut(&mut self) -> &mut P {
		&mut self.parser
	}
}

impl<T: io::BufRead, P: Parse> RecordRead for PullDriver<T, P> {
	type Output = P::Output;

	/// Read a single record from the extractor.
	///
	/// If the EOF has been reached with a valid document, `None` is
	/// returned.
	///
	/// All I/O errors from the source are passed on without modification.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	fn read(&mut self) -> Result<Option<Self::Output>> {
		self.parser.parse(&mut self.token_source)
	}
}

/**
# Non-blocking extraction

The [`FeedExtractor`] allows extracting records from a message dump as its
bytes arrive in the application, giving back control to the caller
immediately when not enough data is available for processing. This is
especially useful when streaming data from sockets.

This is a type alias around a [`PushDriver`] and documentation for the API
is found there.

To read records from the `FeedExtractor` after feeding data, use its
[`RecordRead`] trait.

## Example

```
use msgdump::{FeedExtractor, Error, RecordRead, TAG_FROM};
use std::io;
let doc = b"<FileDump><Message><From>joe@example.com</From><Message>Hi Jane</Message></Message></FileDump>";
let mut fx = FeedExtractor::new();
fx.feed(&doc[..10]);
// We expect a WouldBlock, because the first message is not complete yet
let rec = fx.read();
assert!(matches!(
	rec.err().unwrap(),
	Error::IO(e) if e.kind() == io::ErrorKind::WouldBlock
));

fx.feed(&doc[10..]);
// Now the first message is complete
let rec = fx.read().unwrap().unwrap();
assert_eq!(rec.get(TAG_FROM).unwrap(), "joe@example.com");
```
*/
pub type FeedExtractor = PushDriver<Extractor>;

/**
# Blocking extraction

The [`PullExtractor`] allows extracting records from a [`io::BufRead`],
blockingly. The extractor will block until the backing [`io::BufRead`] has
enough data available (or returns an error).

This is a type alias around a [`PullDriver`] and documentation for the API
is found there.

Interaction with a `PullExtractor` should happen exclusively via the
[`RecordRead`] trait.

In general, for networked operations, it is recommended to use the
[`FeedExtractor`] or [`AsyncExtractor`] instead of the `PullExtractor`.

## Example

```
use msgdump::{PullExtractor, RecordRead, TAG_MESSAGE};
let mut doc = &b"<FileDump><Message><From>joe@example.com</From><Message>Hi Jane</Message></Message></FileDump>"[..];
// any io::BufRead works; a byte slice is one
let mut px = PullExtractor::new(&mut doc);
let rec = px.read().unwrap().unwrap();
assert_eq!(rec.get(TAG_MESSAGE).unwrap(), "Hi Jane");
assert!(px.read().unwrap().is_none());
```

   [`AsyncExtractor`]: crate::AsyncExtractor
*/
pub type PullExtractor<T> = PullDriver<T, Extractor>;
