/*!
# Streaming message dump extraction

This crate extracts structured message records from "file dump" documents:
a restricted XML dialect consisting of a single `FileDump` wrapper element
which contains any number of `Message` elements, each carrying a `From`
field and a `Message` body field.

## Features (some call them restrictions)

* No DTD, no CDATA sections, no custom entities, no namespaces
* Processing instructions and comments are skipped, not reported
* UTF-8 input only
* Character data is taken verbatim (no entity expansion), so markup nested
  inside a field survives, escaped, inside the extracted value
* Streamed extraction (one [`Record`] per `Message` element, in document
  order)
* Can be driven push- and pull-based
* Tokio-based asynchronicity supported via the `async` feature and
  [`AsyncExtractor`]

## Example

```
use msgdump::{FeedExtractor, RecordRead, TAG_FROM, TAG_MESSAGE};
let doc = b"<FileDump><Message><From>Joe.doe@gmail.com</From><Message>Hi Jane</Message></Message></FileDump>";
let mut fx = FeedExtractor::new();
fx.feed(&doc[..]);
fx.feed_eof();
let mut records = Vec::new();
let result = fx.read_all_eof(|rec| {
	records.push(rec);
});
// true indicates eof
assert_eq!(result.unwrap(), true);
assert_eq!(records.len(), 1);
assert_eq!(records[0].get(TAG_FROM).unwrap(), "Joe.doe@gmail.com");
assert_eq!(records[0].get(TAG_MESSAGE).unwrap(), "Hi Jane");
```

## High-level usage

### Push-based usage

The [`FeedExtractor`] allows to push bits of a dump document into the
extractor as they arrive in the application and process the resulting
[`Record`]s as they happen.

### Pull-based usage

If the extractor should block while waiting for more data to arrive, a
[`PullExtractor`] can be used instead. The `PullExtractor` requires a
source which implements [`std::io::BufRead`].

### Usage with Tokio

Tokio is supported with the `async` feature. It offers the
[`AsyncExtractor`] and the [`AsyncRecordReadExt`] trait, which work
similar to the `PullExtractor`. Instead of blocking, however, the async
extractor will yield control to other tasks. With the additional `stream`
feature, the extracted records are also available as a
`futures_core::stream::Stream`.

## Diagnostics

The extractor optionally reports every state transition and accumulator
snapshot to a caller-supplied [`Trace`] sink (see
[`Extractor::with_trace`]); [`LogTrace`] forwards them to the [`log`]
facade. Tracing is pure observability and never changes extraction
outcomes.
*/

pub mod bufq;
pub mod driver;
pub mod error;
#[cfg(feature = "async")]
pub mod future;
pub mod lexer;
pub mod parser;
pub mod strings;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use bufq::BufferQueue;
#[doc(inline)]
pub use driver::{
	as_eof_flag, FeedExtractor, PullDriver, PullExtractor, PushDriver, RecordRead,
};
#[doc(inline)]
pub use error::{Error, Result, SyntaxError};
#[cfg(feature = "async")]
#[doc(inline)]
pub use future::{AsyncDriver, AsyncExtractor, AsyncRecordRead, AsyncRecordReadExt};
#[doc(inline)]
pub use lexer::{AttrList, Lexer, LexerOptions, Token};
#[doc(inline)]
pub use parser::{
	Extractor, LexerAdapter, LogTrace, Parse, Record, TokenRead, Trace, TAG_FILE_DUMP, TAG_FROM,
	TAG_MESSAGE,
};
pub use strings::{CData, CDataStr, Name, NameStr};

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
