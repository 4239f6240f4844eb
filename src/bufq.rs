/*!
# Chunked byte buffer queue

[`BufferQueue`] is the byte source backing the push-based frontends: the
application [`push`es](BufferQueue::push) chunks as they arrive (from a
socket, a file reader, a test fixture) and the lexer drains them through
the [`std::io::BufRead`] interface. When the queue runs dry before
[`push_eof`](BufferQueue::push_eof) has been called, reads fail with
[`std::io::ErrorKind::WouldBlock`], which the lexer and extractor use as
their "feed me more data" signal.
*/
use std::collections::VecDeque;
use std::io;

use bytes::{Buf, Bytes};

pub const ERR_NODATA: &'static str = "no data in buffer";

/// Queue of byte chunks with an explicit end-of-file marker.
///
/// Chunks are held as [`bytes::Bytes`], so feeding static fixtures or
/// shared buffers does not copy.
pub struct BufferQueue {
	q: VecDeque<Bytes>,
	len: usize,
	eof: bool,
}

impl BufferQueue {
	pub fn new() -> BufferQueue {
		BufferQueue {
			q: VecDeque::new(),
			len: 0,
			eof: false,
		}
	}

	/// Enqueue a chunk of bytes.
	///
	/// Empty chunks are discarded; they carry no data and must not be
	/// mistaken for the end of the stream.
	///
	/// # Panics
	///
	/// If [`BufferQueue::push_eof`] has been called before, or if the
	/// total buffered length would overflow.
	pub fn push<T: Into<Bytes>>(&mut self, new: T) {
		let new = new.into();
		if self.eof {
			panic!("cannot push behind eof");
		}
		if new.is_empty() {
			return;
		}
		let new_len = match self.len.checked_add(new.len()) {
			None => panic!("length overflow"),
			Some(v) => v,
		};
		self.q.push_back(new);
		self.len = new_len;
	}

	/// Number of bytes which have not been read yet.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Mark the end of the stream.
	///
	/// After the eof marker, reads beyond the buffered data return
	/// `Ok(0)` instead of [`std::io::ErrorKind::WouldBlock`].
	pub fn push_eof(&mut self) {
		self.eof = true;
	}

	/// Whether the eof marker has been pushed.
	pub fn eof_pushed(&self) -> bool {
		self.eof
	}
}

impl io::Read for BufferQueue {
	fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
		let front = match self.q.front_mut() {
			None => {
				if self.eof {
					return Ok(0);
				} else {
					return Err(io::Error::new(io::ErrorKind::WouldBlock, ERR_NODATA));
				}
			}
			Some(v) => v,
		};
		let to_read = std::cmp::min(dst.len(), front.len());
		dst[..to_read].copy_from_slice(&front[..to_read]);
		front.advance(to_read);
		if front.is_empty() {
			self.q.pop_front();
		}
		self.len -= to_read;
		Ok(to_read)
	}
}

impl io::BufRead for BufferQueue {
	fn fill_buf(&mut self) -> io::Result<&[u8]> {
		match self.q.front() {
			None => {
				if self.eof {
					Ok(&[])
				} else {
					Err(io::Error::new(io::ErrorKind::WouldBlock, ERR_NODATA))
				}
			}
			Some(v) => Ok(&v[..]),
		}
	}

	fn consume(&mut self, amt: usize) {
		if amt == 0 {
			return;
		}
		let front = match self.q.front_mut() {
			None => panic!("attempt to consume beyond end of buffer"),
			Some(v) => v,
		};
		if amt > front.len() {
			panic!("attempt to consume beyond end of buffer");
		}
		front.advance(amt);
		if front.is_empty() {
			self.q.pop_front();
		}
		self.len -= amt;
	}
}
