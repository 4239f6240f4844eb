use super::*;

use std::io;

// fixture pieces shared between documents and expected values; the
// escaping must be byte-exact, so both sides are assembled from the same
// constants
const LOREM_HEAD: &'static str =
	"Great to hear. Neque porro quisquam est qui dolorem ipsum quia dolor sit amet,";
const LOREM_JS: &'static str = "console.error(String.fromCharCode(72, 65, 67, 75, 69, 68))";
const LOREM_TAIL: &'static str = "consectetur, adipisci velit...";

static DOC_SIMPLE: &'static [u8] = b"<?xml version='1.0'?>\n<FileDump>\n\t<Message>\n\t\t<From>Joe.doe@gmail.com</From>\n\t\t<Message>Hi Jane</Message>\n\t</Message>\n</FileDump>\n";

static DOC_TWO_MESSAGES: &'static [u8] = b"<FileDump><Message><From>a@example.com</From><Message>first</Message></Message><Message><From>b@example.com</From><Message>second</Message></Message></FileDump>";

static DOC_INVALID: &'static [u8] =
	b"<FileDump><Message><Subject>hello</Subject></Message></FileDump>";

fn nested_body_doc() -> String {
	format!(
		"<FileDump>\n\t<Message>\n\t\t<From>JANE.DOE@gmail.com</From>\n\t\t<Message><Message><From>JANE.DOE@gmail.com</From><Message>{h}<script>{js}</script>{t}</Message></Message>{h}<script>{js}</script>{t}</Message>\n\t</Message>\n</FileDump>\n",
		h = LOREM_HEAD,
		js = LOREM_JS,
		t = LOREM_TAIL
	)
}

fn nested_body_expected() -> String {
	format!(
		"&lt;Message&gt;&lt;From&gt;JANE.DOE@gmail.com&lt;/From&gt;&lt;Message&gt;{h}&lt;script&gt;{js}&lt;/script&gt;{t}&lt;/Message&gt;&lt;/Message&gt;{h}&lt;script&gt;{js}&lt;/script&gt;{t}",
		h = LOREM_HEAD,
		js = LOREM_JS,
		t = LOREM_TAIL
	)
}

fn nested_from_doc() -> String {
	format!(
		"<FileDump><Message><From>JANE.DOE@gmail.com<From>blah.DOE@gmail.com</From></From><Message><Message>ABC</Message>{h}<script>{js}</script>{t}</Message></Message></FileDump>",
		h = LOREM_HEAD,
		js = LOREM_JS,
		t = LOREM_TAIL
	)
}

fn nested_from_expected_message() -> String {
	format!(
		"&lt;Message&gt;ABC&lt;/Message&gt;{h}&lt;script&gt;{js}&lt;/script&gt;{t}",
		h = LOREM_HEAD,
		js = LOREM_JS,
		t = LOREM_TAIL
	)
}

// note that this is just a smoketest... the components of the
// FeedExtractor are tested extensively in the modules.
#[test]
fn feedextractor_can_extract_simple_dump() {
	let mut fx = FeedExtractor::new();
	let mut out = Vec::<Record>::new();
	fx.feed(&DOC_SIMPLE[..]);
	let result = fx.read_all_eof(|rec| {
		out.push(rec);
	});
	assert_eq!(result.unwrap(), false);

	assert_eq!(out.len(), 1);
	assert_eq!(out[0].get(TAG_FROM).unwrap(), "Joe.doe@gmail.com");
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "Hi Jane");

	fx.feed_eof();
	let result = fx.read_all_eof(|rec| panic!("unexpected record: {:?}", rec));
	assert_eq!(result.unwrap(), true);
}

#[test]
fn feedextractor_can_handle_chunked_input() {
	let mut fx = FeedExtractor::new();
	let mut out = Vec::<Record>::new();
	for chunk in DOC_TWO_MESSAGES.chunks(7) {
		fx.feed(chunk.to_vec());
		loop {
			match fx.read() {
				Err(Error::IO(ioerr)) if ioerr.kind() == io::ErrorKind::WouldBlock => break,
				Err(other) => panic!("unexpected error: {:?}", other),
				Ok(Some(rec)) => out.push(rec),
				Ok(None) => break,
			}
		}
	}
	fx.feed_eof();
	let result = fx.read_all_eof(|rec| out.push(rec));
	assert_eq!(result.unwrap(), true);

	assert_eq!(out.len(), 2);
	assert_eq!(out[0].get(TAG_FROM).unwrap(), "a@example.com");
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "first");
	assert_eq!(out[1].get(TAG_FROM).unwrap(), "b@example.com");
	assert_eq!(out[1].get(TAG_MESSAGE).unwrap(), "second");
}

#[test]
fn feedextractor_sanitizes_nested_markup_in_body() {
	let mut fx = FeedExtractor::new();
	fx.feed(nested_body_doc().into_bytes());
	fx.feed_eof();
	let mut out = Vec::<Record>::new();
	let result = fx.read_all_eof(|rec| out.push(rec));
	assert_eq!(result.unwrap(), true);

	assert_eq!(out.len(), 1);
	assert_eq!(out[0].get(TAG_FROM).unwrap(), "JANE.DOE@gmail.com");
	assert_eq!(
		out[0].get(TAG_MESSAGE).unwrap().as_str(),
		nested_body_expected()
	);
}

#[test]
fn feedextractor_sanitizes_markup_in_from_field() {
	let mut fx = FeedExtractor::new();
	fx.feed(nested_from_doc().into_bytes());
	fx.feed_eof();
	let mut out = Vec::<Record>::new();
	let result = fx.read_all_eof(|rec| out.push(rec));
	assert_eq!(result.unwrap(), true);

	assert_eq!(out.len(), 1);
	assert_eq!(
		out[0].get(TAG_FROM).unwrap(),
		"JANE.DOE@gmail.com&lt;From&gt;blah.DOE@gmail.com&lt;/From&gt;"
	);
	assert_eq!(
		out[0].get(TAG_MESSAGE).unwrap().as_str(),
		nested_from_expected_message()
	);
}

#[test]
fn feedextractor_reports_exactly_one_structural_error() {
	let mut fx = FeedExtractor::new();
	fx.feed(&DOC_INVALID[..]);
	fx.feed_eof();
	let mut out = Vec::<Record>::new();
	let e1 = loop {
		match fx.read() {
			Ok(Some(rec)) => out.push(rec),
			Ok(None) => panic!("extractor accepted an invalid document"),
			Err(e) => break e,
		}
	};
	assert_eq!(e1, Error::InvalidFormat);
	assert_eq!(format!("{}", e1), "invalid message dump format");
	assert_eq!(out.len(), 0);
	// the error is terminal: no completion may be signalled afterwards
	for _ in 0..3 {
		assert_eq!(fx.read().err().unwrap(), Error::InvalidFormat);
	}
}

#[test]
fn feedextractor_reports_truncated_documents() {
	let mut fx = FeedExtractor::new();
	// wrapper close tag is missing
	fx.feed(&b"<FileDump><Message><From>a@x</From><Message>hi</Message></Message>"[..]);
	fx.feed_eof();
	let mut out = Vec::<Record>::new();
	let result = fx.read_all_eof(|rec| out.push(rec));
	assert_eq!(result.err().unwrap(), Error::InvalidFormat);
	assert_eq!(out.len(), 1);
}

// note that this is just a smoketest... the components of the
// PullExtractor are tested extensively in the modules.
#[test]
fn pullextractor_can_extract_simple_dump() {
	let mut doc = &DOC_SIMPLE[..];
	let mut px = PullExtractor::new(&mut doc);
	let mut out = Vec::<Record>::new();
	let result = px.read_all(|rec| {
		out.push(rec);
	});
	assert_eq!(result.unwrap(), ());

	assert_eq!(out.len(), 1);
	assert_eq!(out[0].get(TAG_FROM).unwrap(), "Joe.doe@gmail.com");
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "Hi Jane");
}

#[test]
fn pullextractor_extracts_records_in_document_order() {
	let mut doc = &DOC_TWO_MESSAGES[..];
	let mut px = PullExtractor::new(&mut doc);
	let mut out = Vec::<Record>::new();
	px.read_all(|rec| out.push(rec)).unwrap();
	assert_eq!(out.len(), 2);
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "first");
	assert_eq!(out[1].get(TAG_MESSAGE).unwrap(), "second");
}

#[test]
fn pullextractor_forwards_syntax_errors_verbatim() {
	let mut doc = &b"<FileDump><!DOCTYPE nope></FileDump>"[..];
	let mut px = PullExtractor::new(&mut doc);
	match px.read() {
		Err(Error::Syntax(SyntaxError::UnexpectedByte(..))) => (),
		other => panic!("unexpected result: {:?}", other),
	}
}

#[cfg(feature = "async")]
#[tokio::test]
async fn asyncextractor_can_extract_simple_dump() {
	let mut doc = &DOC_SIMPLE[..];
	let mut ax = AsyncExtractor::new(&mut doc);
	let mut out = Vec::<Record>::new();
	let result = ax
		.read_all(|rec| {
			out.push(rec);
		})
		.await;
	result.unwrap();

	assert_eq!(out.len(), 1);
	assert_eq!(out[0].get(TAG_FROM).unwrap(), "Joe.doe@gmail.com");
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "Hi Jane");
}

#[cfg(feature = "async")]
#[tokio::test]
async fn asyncextractor_can_handle_chunked_input() {
	let mut doc = &DOC_TWO_MESSAGES[..];
	let mut r = tokio::io::BufReader::with_capacity(4, &mut doc);
	let mut ax = AsyncExtractor::new(&mut r);
	let mut out = Vec::<Record>::new();
	let result = ax
		.read_all(|rec| {
			out.push(rec);
		})
		.await;
	result.unwrap();

	assert_eq!(out.len(), 2);
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "first");
	assert_eq!(out[1].get(TAG_MESSAGE).unwrap(), "second");
}

#[cfg(feature = "async")]
#[tokio::test]
async fn asyncextractor_reports_structural_errors() {
	let mut doc = &DOC_INVALID[..];
	let mut ax = AsyncExtractor::new(&mut doc);
	let result = ax.read_all(|rec| panic!("unexpected record: {:?}", rec)).await;
	assert_eq!(result.err().unwrap(), Error::InvalidFormat);
}

#[cfg(all(feature = "async", feature = "stream"))]
#[tokio::test]
async fn asyncextractor_yields_records_as_a_stream() {
	use futures_core::stream::Stream;
	use std::pin::Pin;

	let mut doc = &DOC_TWO_MESSAGES[..];
	let mut ax = AsyncExtractor::new(&mut doc);
	let mut out = Vec::<Record>::new();
	loop {
		match std::future::poll_fn(|cx| Pin::new(&mut ax).poll_next(cx)).await {
			Some(Ok(rec)) => out.push(rec),
			Some(Err(e)) => panic!("unexpected error: {:?}", e),
			None => break,
		}
	}
	assert_eq!(out.len(), 2);
	assert_eq!(out[0].get(TAG_MESSAGE).unwrap(), "first");
	assert_eq!(out[1].get(TAG_MESSAGE).unwrap(), "second");
}
