/*!
Asynchronous extraction on top of [`tokio`].

The entry point is the [`AsyncExtractor`] alias; interaction happens
through the [`AsyncRecordReadExt`] helper trait. With the `stream` feature
enabled, [`AsyncDriver`] also implements
[`futures_core::stream::Stream`], yielding one `Result<Record>` per
message — the lazy-sequence view of an extraction run.

   [`Record`]: crate::Record
*/
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::AsyncBufRead;

#[cfg(feature = "stream")]
use futures_core::stream::Stream;

use crate::error::{Error, Result};
use crate::lexer::{Lexer, LexerOptions, Token};
use crate::parser::{Extractor, Parse, TokenRead};

use pin_project_lite::pin_project;

/// [`TokenRead`] over a borrowed byte slice; the async driver's bridge
/// between `poll_fill_buf` and the synchronous lexer.
struct SliceTokenSource<'x, 'y> {
	lexer: &'x mut Lexer,
	buf: &'x mut &'y [u8],
	at_eof: bool,
}

impl<'x, 'y> TokenRead for SliceTokenSource<'x, 'y> {
	fn read(&mut self) -> Result<Option<Token>> {
		self.lexer.lex_bytes(self.buf, self.at_eof)
	}
}

pin_project! {
	pub struct ReadRecord<T: ?Sized>{
		#[pin]
		inner: T,
	}
}

impl<T: AsyncRecordRead + Unpin> Future for ReadRecord<T> {
	type Output = Result<Option<T::Output>>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		self.project().inner.poll_read(cx)
	}
}

pin_project! {
	pub struct ReadAll<T: ?Sized, F> {
		cb: F,
		#[pin]
		inner: T,
	}
}

impl<T: AsyncRecordRead + Unpin, F: FnMut(T::Output) -> () + Send> Future for ReadAll<T, F> {
	type Output = Result<()>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
		let mut this = self.project();
		loop {
			match this.inner.as_mut().poll_read(cx) {
				Poll::Ready(Ok(Some(rec))) => {
					(this.cb)(rec);
				}
				Poll::Ready(Ok(None)) => return Poll::Ready(Ok(())),
				Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

/**
Asynchronous source of individual records

This trait is implemented by the asynchronous extractor frontends. It is
analogous to the [`tokio::io::AsyncRead`] trait, but for extracted
[`Record`]s instead of bytes.

Usually, one interacts with this trait through the helpers available in
[`AsyncRecordReadExt`].

   [`Record`]: crate::Record
*/
pub trait AsyncRecordRead {
	type Output;

	/// Poll for a single record from the extractor.
	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Option<Self::Output>>>;
}

impl<T: AsyncRecordRead + Unpin + ?Sized> AsyncRecordRead for &mut T {
	type Output = T::Output;

	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Option<Self::Output>>> {
		let this: &mut &mut T = Pin::into_inner(self);
		let this: &mut T = *this;
		let this = Pin::new(this);
		this.poll_read(cx)
	}
}

/**
Helper trait for asynchronous sources of individual records

This helper trait is automatically implemented for all
[`AsyncRecordRead`].
*/
pub trait AsyncRecordReadExt: AsyncRecordRead {
	/// Read a single record from the extractor.
	///
	/// If the EOF has been reached with a valid document, `None` is
	/// returned.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	///
	/// Equivalent to:
	///
	/// ```ignore
	/// async fn read(&mut self) -> Result<Option<Record>>;
	/// ```
	fn read(&mut self) -> ReadRecord<&mut Self> {
		ReadRecord { inner: self }
	}

	/// Read all records which can be produced from the data source.
	///
	/// The given `cb` is invoked for each record.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the extractor on the next invocation without
	/// reading further data from the source).
	///
	/// Equivalent to:
	///
	/// ```ignore
	/// async fn read_all<F>(&mut self, mut cb: F) -> Result<()>
	///        where F: FnMut(Record) -> () + Send
	/// ```
	fn read_all<F>(&mut self, cb: F) -> ReadAll<&mut Self, F> {
		ReadAll { inner: self, cb }
	}
}

impl<T: AsyncRecordRead> AsyncRecordReadExt for T {}

pin_project! {
	/**
	# Asynchronous driver for extractors

	This is a generic asynchronous driver for objects implementing the
	[`Parse`] trait.

	In general, it is advised to use the [`AsyncExtractor`] alias which
	specializes this struct for use with the default [`Extractor`].
	*/
	#[project = AsyncDriverProj]
	pub struct AsyncDriver<T, P: Parse>{
		#[pin]
		inner: T,
		lexer: Lexer,
		parser: P,
	}
}

impl<T: AsyncBufRead, P: Parse + Default> AsyncDriver<T, P> {
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

impl<T: AsyncBufRead, P: Parse> AsyncDriver<T, P> {
	/// Create a fully customized driver from a lexer and a parser
	/// component.
	pub fn wrap(inner: T, lexer: Lexer, parser: P) -> Self {
		Self {
			inner,
			lexer,
			parser,
		}
	}

	/// Decompose the AsyncDriver into its parts
	pub fn into_inner(self) -> (T, Lexer, P) {
		(self.inner, self.lexer, self.parser)
	}

	/// Access the inner AsyncBufRead
	pub fn get_inner(&self) -> &T {
		&self.inner
	}

	/// Access the inner AsyncBufRead, mutably
	pub fn get_inner_mut(&mut self) -> &mut T {
		&mut self.inner
	}

	/// Access the lexer
	pub fn get_lexer(&self) -> &Lexer {
		&self.lexer
	}

	/// Access the lexer, mutably
	pub fn get_lexer_mut(&mut self) -> &mut Lexer {
		&mut self.lexer
	}

	/// Access the parser
	pub fn get_parser(&self) -> &P {
		&self.parser
	}

	/// Access the parser, mutably
	pub fn get_parser_mut(&mut self) -> &mut P {
		&mut self.parser
	}

	/// Release temporary buffers and other ephemeral allocations.
	///
	/// This is sensible to call when it is expected that no more data
	/// will be processed by the extractor for a while and the memory is
	/// better used elsewhere.
	#[inline(always)]
	pub fn release_temporaries(&mut self) {
		self.lexer.release_temporaries();
		self.parser.release_temporaries();
	}
}

impl<T, P: Parse> AsyncDriver<T, P> {
	fn parse_step(
		lexer: &mut Lexer,
		parser: &mut P,
		buf: &mut &[u8],
		may_eof: bool,
	) -> (usize, Poll<Result<Option<P::Output>>>) {
		let old_len = buf.len();
		// we only know that we are actually at eof by the fact that we
		// see an empty buffer from a successful fill
		let at_eof = may_eof && old_len == 0;
		let result = parser.parse(&mut SliceTokenSource {
			lexer,
			buf,
			at_eof,
		});
		let new_len = buf.len();
		debug_assert!(new_len <= old_len);
		let read = old_len - new_len;
		match result {
			Ok(v) => (read, Poll::Ready(Ok(v))),
			Err(Error::IO(ioerr)) if ioerr.kind() == io::ErrorKind::WouldBlock => {
				(read, Poll::Pending)
			}
			Err(e) => (read, Poll::Ready(Err(e))),
		}
	}
}

impl<T: AsyncBufRead, P: Parse> AsyncRecordRead for AsyncDriver<T, P> {
	type Output = P::Output;

	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Option<P::Output>>> {
		let mut this = self.project();
		loop {
			let mut buf = match this.inner.as_mut().poll_fill_buf(cx) {
				Poll::Pending => {
					// always try an empty read here, so that tokens the
					// lexer has fully buffered (and records the extractor
					// can complete from them) are emitted without waiting
					// on the source
					return Self::parse_step(this.lexer, this.parser, &mut &[][..], false).1;
				}
				Poll::Ready(Ok(buf)) => buf,
				Poll::Ready(Err(e)) => return Poll::Ready(Err(e.into())),
			};
			let (consumed, result) = Self::parse_step(this.lexer, this.parser, &mut buf, true);
			this.inner.as_mut().consume(consumed);
			match result {
				// if we get a pending here, we need to ask the source for
				// more data!
				Poll::Pending => continue,
				Poll::Ready(v) => return Poll::Ready(v),
			}
		}
	}
}

#[cfg(feature = "stream")]
impl<T: AsyncBufRead, P: Parse> Stream for AsyncDriver<T, P> {
	type Item = Result<P::Output>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		match self.poll_read(cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(Ok(Some(v))) => Poll::Ready(Some(Ok(v))),
			Poll::Ready(Ok(None)) => Poll::Ready(None),
			Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
		}
	}
}

/**
Tokio-compatible asynchronous extractor

The [`AsyncExtractor`] allows extracting records from a
[`tokio::io::AsyncBufRead`], asynchronously. It operates similarly to the
[`PullExtractor`], but instead of blocking the task, it will yield control
to other tasks if the backend is not able to supply data immediately.

This is a type alias around a [`AsyncDriver`] and documentation for the
API is found there.

Interaction with an `AsyncExtractor` should happen exclusively via the
[`AsyncRecordReadExt`] trait.

## Example

The example is a bit pointless because it does not really demonstrate the
asynchronicity.

```
use msgdump::{AsyncExtractor, AsyncRecordReadExt, TAG_FROM};
# tokio_test::block_on(async {
let mut doc = &b"<FileDump><Message><From>joe@example.com</From><Message>Hi Jane</Message></Message></FileDump>"[..];
// this converts the doc into a tokio::io::AsyncBufRead
let mut ax = AsyncExtractor::new(&mut doc);
let rec = ax.read().await.unwrap().unwrap();
assert_eq!(rec.get(TAG_FROM).unwrap(), "joe@example.com");
assert!(ax.read().await.unwrap().is_none());
# })
```

   [`PullExtractor`]: crate::PullExtractor
*/
pub type AsyncExtractor<T> = AsyncDriver<T, Extractor>;
