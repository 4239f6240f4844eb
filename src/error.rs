/*!
# Error types

This module holds the error types returned by the various functions of this
crate.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

/// Error context: character data between tags
pub const ERRCTX_TEXT: &'static str = "in text";
/// Error context: element head or foot
pub const ERRCTX_ELEMENT: &'static str = "in element";
/// Error context: element or attribute name
pub const ERRCTX_NAME: &'static str = "in name";
/// Error context: attribute value
pub const ERRCTX_ATTVAL: &'static str = "in attribute value";
/// Error context: processing instruction
pub const ERRCTX_PI: &'static str = "in processing instruction";
/// Error context: comment
pub const ERRCTX_COMMENT: &'static str = "in comment";

/// Violation of the restricted dump dialect's syntax.
///
/// These errors originate in the token source (the lexer). They are never
/// reinterpreted by the record extractor; a syntax error observed while
/// lexing is surfaced to the caller exactly as the lexer produced it.
#[derive(Debug, Clone, PartialEq, Copy)]
pub enum SyntaxError {
	/// End-of-file encountered during a construct where more data was
	/// expected.
	///
	/// The contents are implementation details.
	InvalidEof(&'static str),

	/// Byte which was not expected at that point in the grammar.
	///
	/// The contents are implementation details.
	UnexpectedByte(&'static str, u8, Option<&'static [&'static str]>),

	/// Unicode codepoint which is not allowed in dump character data.
	///
	/// The contents are implementation details.
	InvalidChar(&'static str, u32),

	/// Element or attribute name without any characters.
	EmptyName,

	/// A construct which exists in full XML but is not part of the
	/// restricted dump dialect, or a limit of the dialect was exceeded.
	///
	/// The contents are implementation details.
	RestrictedDialect(&'static str),
}

impl error::Error for SyntaxError {}

impl fmt::Display for SyntaxError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			SyntaxError::InvalidEof(ctx) => write!(f, "invalid eof {}", ctx),
			SyntaxError::UnexpectedByte(ctx, b, Some(opts)) if opts.len() > 0 => {
				write!(f, "0x{:x} not allowed {} (expected ", *b, ctx)?;
				if opts.len() == 1 {
					f.write_str(opts[0])?;
					f.write_str(")")
				} else {
					f.write_str("one of: ")?;
					for (i, opt) in opts.iter().enumerate() {
						if i > 0 {
							f.write_str(", ")?;
						}
						f.write_str(*opt)?;
					}
					f.write_str(")")
				}
			}
			SyntaxError::UnexpectedByte(ctx, b, _) => write!(f, "0x{:x} not allowed {}", *b, ctx),
			SyntaxError::InvalidChar(ctx, cp) => {
				write!(f, "invalid codepoint U+{:x} {}", cp, ctx)
			}
			SyntaxError::EmptyName => f.write_str("name must have at least one character"),
			SyntaxError::RestrictedDialect(msg) => write!(f, "restricted dialect: {}", msg),
		}
	}
}

/// [`std::sync::Arc`]-based wrapper around [`std::io::Error`] to allow
/// cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl AsRef<io::Error> for IOErrorWrapper {
	fn as_ref(&self) -> &io::Error {
		&*self.0
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

impl std::borrow::Borrow<io::Error> for IOErrorWrapper {
	fn borrow(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from the extractor or lexer.
///
/// With the exception of [`Error::IO`], all errors are fatal and will be
/// returned indefinitely from the extractor or lexer after the first
/// encounter.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// An I/O error was encountered during lexing.
	///
	/// I/O errors are not fatal and may be retried. This is especially
	/// important for (but not limited to)
	/// [`std::io::ErrorKind::WouldBlock`] errors, which the non-blocking
	/// frontends use to signal that more data needs to be fed.
	IO(IOErrorWrapper),

	/// An invalid UTF-8 byte was encountered during decoding.
	InvalidUtf8Byte(u8),

	/// A violation of the restricted dump dialect's syntax was encountered
	/// in the token source.
	Syntax(SyntaxError),

	/// The token sequence violates the message dump schema.
	///
	/// This is the single structural error: an unexpected element at the
	/// top level, an unrecognized field inside a `Message` element, a
	/// mismatched close tag at a schema boundary, or a premature end of
	/// input. It is raised at most once per extraction run and is mutually
	/// exclusive with successful completion.
	InvalidFormat,
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	pub(crate) fn eof(ctx: &'static str) -> Error {
		Error::Syntax(SyntaxError::InvalidEof(ctx))
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<SyntaxError> for Error {
	fn from(e: SyntaxError) -> Error {
		Error::Syntax(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::Syntax(e) => write!(f, "malformed dump: {}", e),
			// the fixed message distinguishing schema violations from
			// token-source-level errors; callers match on it
			Error::InvalidFormat => f.write_str("invalid message dump format"),
			Error::InvalidUtf8Byte(b) => write!(f, "invalid utf-8 byte: \\x{:02x}", b),
			Error::IO(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::Syntax(e) => Some(e),
			Error::InvalidFormat | Error::InvalidUtf8Byte(_) => None,
		}
	}
}
