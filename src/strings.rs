/*!
# Strongly-typed strings for use with message dump documents

This module defines string- and str-like types which represent pieces of
text as they may occur in a restricted XML message dump. The types are
checked to contain only text which conforms to the respective production of
the dialect.

This allows to carry information about the checking which already took
place in the lexer to the application, avoiding the need to execute checks
multiple times.

## Type Overview

- [`Name`] and [`NameStr`] represent element and attribute names. Names in
  the dump dialect are ASCII: the first character must match
  `[A-Za-z_:]`, all further characters must match `[A-Za-z0-9._:-]`.
- [`CData`] and [`CDataStr`] represent character data as it appears in
  text nodes and attribute values. Any UTF-8 text is allowed, except
  control characters other than tab, line feed and carriage return, and
  the codepoints U+FFFE and U+FFFF.

## Construction

Owned values are constructed using the [`std::convert::TryInto`]
mechanism, from `&str`, [`String`] or [`smartstring::alias::String`]. The
`*Str` slice types are obtained by dereferencing the owned types or via
`TryFrom<&str>`.
*/

use std::borrow::{Borrow, ToOwned};
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use smartstring::alias::String as SmartString;

use crate::error::{Error, SyntaxError, ERRCTX_NAME, ERRCTX_TEXT};

/// Check whether a byte may start a name in the dump dialect.
pub(crate) fn is_name_start_byte(b: u8) -> bool {
	b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

/// Check whether a byte may continue a name in the dump dialect.
pub(crate) fn is_name_byte(b: u8) -> bool {
	is_name_start_byte(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

/// Check whether a char is allowed in dump character data.
pub(crate) fn is_cdata_char(c: char) -> bool {
	match c {
		'\t' | '\n' | '\r' => true,
		c if (c as u32) < 0x20 => false,
		'\u{fffe}' | '\u{ffff}' => false,
		_ => true,
	}
}

/// Validate a string against the dialect's name production.
pub fn validate_name(s: &str) -> Result<(), SyntaxError> {
	let mut bytes = s.bytes();
	match bytes.next() {
		None => return Err(SyntaxError::EmptyName),
		Some(b) if !is_name_start_byte(b) => {
			return Err(SyntaxError::InvalidChar(ERRCTX_NAME, b as u32))
		}
		Some(_) => (),
	}
	for b in bytes {
		if !is_name_byte(b) {
			return Err(SyntaxError::InvalidChar(ERRCTX_NAME, b as u32));
		}
	}
	Ok(())
}

/// Validate a string against the dialect's character data production.
pub fn validate_cdata(s: &str) -> Result<(), SyntaxError> {
	for c in s.chars() {
		if !is_cdata_char(c) {
			return Err(SyntaxError::InvalidChar(ERRCTX_TEXT, c as u32));
		}
	}
	Ok(())
}

macro_rules! restricted_string_pair {
	(
		$(#[$ownedmeta:meta])*
		pub struct $owned:ident use $validate:ident => $borrowed:ident;
		$(#[$borrowedmeta:meta])*
		pub str $_borrowed:ident;
	) => {
		$(#[$ownedmeta])*
		#[derive(Debug, Clone, PartialEq, Eq)]
		#[repr(transparent)]
		pub struct $owned(SmartString);

		impl $owned {
			/// Extract the inner string and return it.
			pub fn into_inner(self) -> SmartString {
				self.0
			}

			/// Obtain a reference to the inner string slice.
			pub fn as_str(&self) -> &str {
				self.0.as_str()
			}

			/// Construct without enforcing the production.
			///
			/// # Safety
			///
			/// The caller is responsible for ensuring that the passed string
			/// is in fact valid.
			pub unsafe fn from_str_unchecked<T: AsRef<str>>(s: T) -> Self {
				Self(s.as_ref().into())
			}

			/// Construct without enforcing the production.
			///
			/// # Safety
			///
			/// The caller is responsible for ensuring that the passed string
			/// is in fact valid.
			pub unsafe fn from_string_unchecked<T: Into<String>>(s: T) -> Self {
				Self(s.into().into())
			}

			/// Construct without enforcing the production.
			///
			/// # Safety
			///
			/// The caller is responsible for ensuring that the passed string
			/// is in fact valid.
			pub unsafe fn from_smartstring_unchecked<T: Into<SmartString>>(s: T) -> Self {
				Self(s.into())
			}
		}

		impl Deref for $owned {
			type Target = $borrowed;

			fn deref(&self) -> &$borrowed {
				// SAFETY: the same production was checked at construction
				unsafe { $borrowed::from_str_unchecked(self.0.as_str()) }
			}
		}

		impl Hash for $owned {
			fn hash<H: Hasher>(&self, state: &mut H) {
				// must match the Hash of the str slice type for Borrow-based
				// map lookups
				self.as_str().hash(state)
			}
		}

		impl Borrow<str> for $owned {
			fn borrow(&self) -> &str {
				self.0.as_str()
			}
		}

		impl Borrow<$borrowed> for $owned {
			fn borrow(&self) -> &$borrowed {
				self.deref()
			}
		}

		impl AsRef<str> for $owned {
			fn as_ref(&self) -> &str {
				self.0.as_str()
			}
		}

		impl AsRef<$borrowed> for $owned {
			fn as_ref(&self) -> &$borrowed {
				self.deref()
			}
		}

		impl PartialEq<str> for $owned {
			fn eq(&self, other: &str) -> bool {
				self.as_str() == other
			}
		}

		impl PartialEq<$owned> for str {
			fn eq(&self, other: &$owned) -> bool {
				self == other.as_str()
			}
		}

		impl PartialEq<&str> for $owned {
			fn eq(&self, other: &&str) -> bool {
				self.as_str() == *other
			}
		}

		impl PartialEq<$owned> for &str {
			fn eq(&self, other: &$owned) -> bool {
				*self == other.as_str()
			}
		}

		impl PartialEq<$borrowed> for $owned {
			fn eq(&self, other: &$borrowed) -> bool {
				self.as_str() == other.as_str()
			}
		}

		impl PartialEq<$owned> for $borrowed {
			fn eq(&self, other: &$owned) -> bool {
				self.as_str() == other.as_str()
			}
		}

		impl PartialEq<&$borrowed> for $owned {
			fn eq(&self, other: &&$borrowed) -> bool {
				self.as_str() == other.as_str()
			}
		}

		impl PartialEq<$owned> for &$borrowed {
			fn eq(&self, other: &$owned) -> bool {
				self.as_str() == other.as_str()
			}
		}

		impl fmt::Display for $owned {
			fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl TryFrom<&str> for $owned {
			type Error = Error;

			fn try_from(other: &str) -> Result<Self, Self::Error> {
				$validate(other)?;
				Ok(Self(other.into()))
			}
		}

		impl TryFrom<String> for $owned {
			type Error = Error;

			fn try_from(other: String) -> Result<Self, Self::Error> {
				$validate(&other)?;
				Ok(Self(other.into()))
			}
		}

		impl TryFrom<SmartString> for $owned {
			type Error = Error;

			fn try_from(other: SmartString) -> Result<Self, Self::Error> {
				$validate(&other)?;
				Ok(Self(other))
			}
		}

		$(#[$borrowedmeta])*
		#[derive(Debug, PartialEq, Eq)]
		#[repr(transparent)]
		pub struct $borrowed(str);

		impl $borrowed {
			/// Wrap a str without enforcing the production.
			///
			/// # Safety
			///
			/// The caller is responsible for ensuring that the passed string
			/// is in fact valid.
			pub unsafe fn from_str_unchecked<'a>(s: &'a str) -> &'a $borrowed {
				std::mem::transmute(s)
			}

			/// Obtain a reference to the inner string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl Deref for $borrowed {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}

		impl Hash for $borrowed {
			fn hash<H: Hasher>(&self, state: &mut H) {
				self.0.hash(state)
			}
		}

		impl ToOwned for $borrowed {
			type Owned = $owned;

			fn to_owned(&self) -> $owned {
				// SAFETY: the productions of the pair are identical
				unsafe { $owned::from_str_unchecked(&self.0) }
			}
		}

		impl PartialEq<str> for $borrowed {
			fn eq(&self, other: &str) -> bool {
				&self.0 == other
			}
		}

		impl PartialEq<$borrowed> for str {
			fn eq(&self, other: &$borrowed) -> bool {
				self == &other.0
			}
		}

		impl fmt::Display for $borrowed {
			fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl<'a> TryFrom<&'a str> for &'a $borrowed {
			type Error = Error;

			fn try_from(other: &'a str) -> Result<Self, Self::Error> {
				$validate(other)?;
				// SAFETY: checked above
				Ok(unsafe { $borrowed::from_str_unchecked(other) })
			}
		}
	};
}

restricted_string_pair! {
	/// String which conforms to the name production of the dump dialect.
	///
	/// Used for element and attribute names; also the key type of
	/// [`Record`](crate::parser::Record).
	pub struct Name use validate_name => NameStr;
	/// str which conforms to the name production of the dump dialect.
	pub str NameStr;
}

restricted_string_pair! {
	/// String of dump character data.
	///
	/// Used for text nodes, attribute values and committed field values.
	/// Note that no entity expansion takes place in this dialect; a `CData`
	/// contains the bytes exactly as they appeared between the tags.
	pub struct CData use validate_cdata => CDataStr;
	/// str of dump character data.
	pub str CDataStr;
}
