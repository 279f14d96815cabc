use super::Message;
use crate::error::{PlumbError, Result};
use std::collections::BTreeMap;
use std::io::{BufRead, ErrorKind, Read, Write};

impl Message {
	/// Serialize the message to its wire layout.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(self.data.len() + 64);
		for field in [&self.src, &self.dst, &self.wdir, &self.kind] {
			buf.extend_from_slice(field.as_bytes());
			buf.push(b'\n');
		}
		for (name, value) in &self.attr {
			buf.extend_from_slice(name.as_bytes());
			buf.push(b'=');
			buf.extend_from_slice(value.as_bytes());
			buf.push(b'\n');
		}
		// Closes the attribute block; also the lone empty attribute line
		// of a message without attributes.
		buf.push(b'\n');
		buf.extend_from_slice(self.data.len().to_string().as_bytes());
		buf.push(b'\n');
		buf.extend_from_slice(&self.data);
		buf
	}

	/// Write the encoded message with a single write call.
	pub fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
		writer
			.write_all(&self.to_bytes())
			.and_then(|()| writer.flush())
			.map_err(|source| PlumbError::MessageWrite { source })
	}

	/// Parse one message from the reader, consuming exactly its bytes.
	pub fn decode<R: BufRead>(reader: &mut R) -> Result<Message> {
		let src = read_line(reader, "src")?;
		let dst = read_line(reader, "dst")?;
		let wdir = read_line(reader, "wdir")?;
		let kind = read_line(reader, "type")?;

		let mut attr = BTreeMap::new();
		loop {
			let line = read_line(reader, "attribute block terminator")?;
			if line.is_empty() {
				break;
			}
			let (name, value) = line.split_once('=').unwrap_or((line.as_str(), ""));
			attr.insert(name.to_string(), value.to_string());
		}

		let count = read_line(reader, "payload length")?;
		let len: u64 = count
			.parse()
			.map_err(|source| PlumbError::InvalidLength {
				value: count.clone(),
				source,
			})?;

		let mut data = Vec::new();
		reader
			.take(len)
			.read_to_end(&mut data)
			.map_err(|source| PlumbError::MessageRead { source })?;
		if (data.len() as u64) < len {
			return Err(PlumbError::MessageTruncated { field: "payload" });
		}

		Ok(Message {
			src,
			dst,
			wdir,
			kind,
			attr,
			data,
		})
	}
}

/// Read one `\n`-terminated line, stripping the terminator.
///
/// End of input before a terminator means the message was cut short.
fn read_line<R: BufRead>(reader: &mut R, field: &'static str) -> Result<String> {
	let mut buf = Vec::new();
	let n = reader.read_until(b'\n', &mut buf).map_err(|source| {
		if source.kind() == ErrorKind::UnexpectedEof {
			PlumbError::MessageTruncated { field }
		} else {
			PlumbError::MessageRead { source }
		}
	})?;
	if n == 0 || buf.last() != Some(&b'\n') {
		return Err(PlumbError::MessageTruncated { field });
	}
	buf.pop();
	Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Message {
		Message {
			src: "plumb".to_string(),
			dst: "edit".to_string(),
			wdir: "/home/glenda".to_string(),
			kind: "text".to_string(),
			attr: BTreeMap::new(),
			data: b"lib.rs:12".to_vec(),
		}
	}

	#[test]
	fn test_encode_layout() {
		let bytes = sample().to_bytes();
		assert_eq!(bytes, b"plumb\nedit\n/home/glenda\ntext\n\n9\nlib.rs:12".to_vec());
	}

	#[test]
	fn test_round_trip_without_attributes() {
		let msg = sample();
		let bytes = msg.to_bytes();
		let decoded = Message::decode(&mut bytes.as_slice()).unwrap();
		assert_eq!(decoded, msg);
	}

	#[test]
	fn test_round_trip_with_attributes() {
		let mut msg = sample();
		msg.attr.insert("action".to_string(), "showfile".to_string());
		msg.attr.insert("addr".to_string(), "a=b".to_string());
		let bytes = msg.to_bytes();

		let decoded = Message::decode(&mut bytes.as_slice()).unwrap();
		assert_eq!(decoded.attr.get("addr").unwrap(), "a=b");
		assert_eq!(decoded, msg);
	}

	#[test]
	fn test_round_trip_binary_payload() {
		let mut msg = sample();
		msg.data = vec![0, 10, 255, 10, 10];
		let bytes = msg.to_bytes();
		assert_eq!(Message::decode(&mut bytes.as_slice()).unwrap(), msg);
	}

	#[test]
	fn test_attribute_without_equals_has_empty_value() {
		let input = b"s\nd\n/\ntext\nflag\n\n0\n";
		let msg = Message::decode(&mut input.as_slice()).unwrap();
		assert_eq!(msg.attr.get("flag").unwrap(), "");
		assert!(msg.data.is_empty());
	}

	#[test]
	fn test_decode_missing_header_line() {
		let input = b"src\ndst\n";
		let err = Message::decode(&mut input.as_slice()).unwrap_err();
		match err {
			PlumbError::MessageTruncated { field } => assert_eq!(field, "wdir"),
			other => panic!("Expected MessageTruncated, got {other:?}"),
		}
	}

	#[test]
	fn test_decode_unterminated_line() {
		let input = b"src\ndst\nwdir\ntext";
		assert!(matches!(
			Message::decode(&mut input.as_slice()),
			Err(PlumbError::MessageTruncated { field: "type" })
		));
	}

	#[test]
	fn test_decode_invalid_length() {
		let input = b"s\nd\n/\ntext\n\n-3\nabc";
		match Message::decode(&mut input.as_slice()).unwrap_err() {
			PlumbError::InvalidLength { value, .. } => assert_eq!(value, "-3"),
			other => panic!("Expected InvalidLength, got {other:?}"),
		}
	}

	#[test]
	fn test_decode_short_payload() {
		let input = b"s\nd\n/\ntext\n\n10\nabc";
		assert!(matches!(
			Message::decode(&mut input.as_slice()),
			Err(PlumbError::MessageTruncated { field: "payload" })
		));
	}

	#[test]
	fn test_decode_consumes_exactly_one_message() {
		let first = sample();
		let mut second = sample();
		second.dst = "web".to_string();

		let mut bytes = first.to_bytes();
		bytes.extend(second.to_bytes());

		let mut cursor = bytes.as_slice();
		assert_eq!(Message::decode(&mut cursor).unwrap(), first);
		assert_eq!(Message::decode(&mut cursor).unwrap(), second);
		assert!(cursor.is_empty());
	}

	#[test]
	fn test_display_summary() {
		let mut msg = sample();
		msg.attr.insert("action".to_string(), "showfile".to_string());
		let line = msg.to_string();
		assert!(line.contains("dst=\"edit\""));
		assert!(line.contains("action=\"showfile\""));
		assert!(line.ends_with("ndata=9"));
	}
}
