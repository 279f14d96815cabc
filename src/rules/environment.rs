use crate::error::{PlumbError, Result};
use crate::message::Message;
use std::collections::HashMap;

/// Variable bindings scoped to one message's dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
	vars: HashMap<String, String>,
}

impl Environment {
	/// An environment with no bindings.
	pub fn new() -> Self {
		Self::default()
	}

	/// The base bindings every rule group starts from.
	pub fn from_message(msg: &Message) -> Self {
		let mut env = Self::new();
		env.bind("data", msg.data_lossy());
		env.bind("dst", msg.dst.clone());
		env.bind("src", msg.src.clone());
		env.bind("type", msg.kind.clone());
		env.bind("wdir", msg.wdir.clone());
		env.bind("file", String::new());
		env.bind("dir", String::new());
		env
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.vars.get(name).map(String::as_str)
	}

	pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.vars.insert(name.into(), value.into());
	}

	/// Replace every numeric binding (`0`, `1`, ...) with the given captures.
	pub fn bind_captures<I>(&mut self, captures: I)
	where
		I: IntoIterator<Item = String>,
	{
		self.vars
			.retain(|name, _| name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()));
		for (i, capture) in captures.into_iter().enumerate() {
			self.vars.insert(i.to_string(), capture);
		}
	}

	/// Substitute `$name` and `${name}` references in rule text.
	///
	/// Single quotes suppress substitution and are removed. A backslash
	/// outside quotes makes the next character literal. Substituted values
	/// are inserted as-is and never re-scanned.
	pub fn expand(&self, input: &str) -> Result<String> {
		let mut out = String::with_capacity(input.len());
		let mut quoted = false;
		let mut escaped = false;
		let mut chars = input.chars().peekable();

		while let Some(ch) = chars.next() {
			if escaped {
				out.push(ch);
				escaped = false;
				continue;
			}
			match ch {
				'\'' => quoted = !quoted,
				'\\' if !quoted => escaped = true,
				'$' if !quoted => {
					let braced = chars.next_if_eq(&'{').is_some();
					let mut name = String::new();
					while let Some(c) = chars.next_if(|c| c.is_alphanumeric()) {
						name.push(c);
					}
					if braced && chars.next_if_eq(&'}').is_none() {
						return Err(PlumbError::UnterminatedBrace {
							input: input.to_string(),
						});
					}
					let value = self
						.get(&name)
						.ok_or(PlumbError::UnknownVariable { name })?;
					out.push_str(value);
				}
				_ => out.push(ch),
			}
		}

		if quoted {
			return Err(PlumbError::UnterminatedQuote {
				input: input.to_string(),
			});
		}
		Ok(out)
	}
}
