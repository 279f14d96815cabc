//! Plumbing messages and their wire format.
//!
//! A message is a small header of newline-terminated text lines followed
//! by a raw payload whose length is declared up front:
//!
//! ```text
//! src
//! dst
//! wdir
//! type
//! name=value        (zero or more, one attribute per line)
//!                   (blank line closes the attribute block)
//! 5
//! hello
//! ```

pub mod codec;

use crate::error::{PlumbError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A routable unit written by a sender and consumed once by the daemon.
///
/// Header fields must not contain a line terminator; the codec does not
/// check this, it is the writer's contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
	/// Application or service that generated the message.
	pub src: String,

	/// Destination port for the message.
	pub dst: String,

	/// Working directory, used when the data names a file.
	pub wdir: String,

	/// Form of the data, e.g. `text`.
	pub kind: String,

	/// Free-form attributes.
	pub attr: BTreeMap<String, String>,

	/// The payload itself.
	pub data: Vec<u8>,
}

impl Message {
	/// Check the writer's side of the wire contract: no header field or
	/// attribute may contain a line break, and attribute names may not
	/// contain `=`.
	pub fn check_header(&self) -> Result<()> {
		let fields = [
			("src", &self.src),
			("dst", &self.dst),
			("wdir", &self.wdir),
			("type", &self.kind),
		];
		for (field, value) in fields {
			if value.contains(['\n', '\r']) {
				return Err(PlumbError::InvalidHeader { field });
			}
		}
		for (name, value) in &self.attr {
			if name.is_empty()
				|| name.contains(['=', '\n', '\r'])
				|| value.contains(['\n', '\r'])
			{
				return Err(PlumbError::InvalidHeader { field: "attr" });
			}
		}
		Ok(())
	}

	/// Payload as text, replacing invalid UTF-8 sequences.
	pub fn data_lossy(&self) -> String {
		String::from_utf8_lossy(&self.data).into_owned()
	}
}

impl fmt::Display for Message {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"src={:?} dst={:?} wdir={:?} type={:?}",
			self.src, self.dst, self.wdir, self.kind
		)?;
		for (name, value) in &self.attr {
			write!(f, " {}={:?}", name, value)?;
		}
		write!(f, " ndata={}", self.data.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_check_header_accepts_plain_fields() {
		let mut msg = Message {
			src: "plumb".to_string(),
			kind: "text".to_string(),
			data: b"multi\nline\npayload".to_vec(),
			..Default::default()
		};
		msg.attr.insert("addr".to_string(), "a=b".to_string());
		assert!(msg.check_header().is_ok());
	}

	#[test]
	fn test_check_header_rejects_line_breaks() {
		let msg = Message {
			dst: "edit\nweb".to_string(),
			..Default::default()
		};
		assert!(matches!(
			msg.check_header(),
			Err(PlumbError::InvalidHeader { field: "dst" })
		));

		let mut msg = Message::default();
		msg.attr.insert("a=b".to_string(), "c".to_string());
		assert!(matches!(
			msg.check_header(),
			Err(PlumbError::InvalidHeader { field: "attr" })
		));
	}
}
