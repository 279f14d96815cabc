use crate::error::{PlumbError, Result};
use std::fmt;
use std::str::FromStr;

/// Field a pattern inspects or, for `plumb`, the action target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
	Arg,
	Data,
	Dst,
	Plumb,
	Src,
	Type,
	Wdir,
}

impl Object {
	pub fn as_str(&self) -> &'static str {
		match self {
			Object::Arg => "arg",
			Object::Data => "data",
			Object::Dst => "dst",
			Object::Plumb => "plumb",
			Object::Src => "src",
			Object::Type => "type",
			Object::Wdir => "wdir",
		}
	}
}

impl FromStr for Object {
	type Err = PlumbError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"arg" => Ok(Object::Arg),
			"data" => Ok(Object::Data),
			"dst" => Ok(Object::Dst),
			"plumb" => Ok(Object::Plumb),
			"src" => Ok(Object::Src),
			"type" => Ok(Object::Type),
			"wdir" => Ok(Object::Wdir),
			_ => Err(PlumbError::InvalidObject {
				object: s.to_string(),
			}),
		}
	}
}

impl fmt::Display for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// How a pattern compares its object with its argument, or which action
/// it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
	Is,
	IsNot,
	IsDir,
	IsFile,
	Matches,
	Set,
	Start,
	To,
}

impl Verb {
	pub fn as_str(&self) -> &'static str {
		match self {
			Verb::Is => "is",
			Verb::IsNot => "isn't",
			Verb::IsDir => "isdir",
			Verb::IsFile => "isfile",
			Verb::Matches => "matches",
			Verb::Set => "set",
			Verb::Start => "start",
			Verb::To => "to",
		}
	}
}

impl FromStr for Verb {
	type Err = PlumbError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"is" => Ok(Verb::Is),
			"isn't" => Ok(Verb::IsNot),
			"isdir" => Ok(Verb::IsDir),
			"isfile" => Ok(Verb::IsFile),
			"matches" => Ok(Verb::Matches),
			"set" => Ok(Verb::Set),
			"start" => Ok(Verb::Start),
			"to" => Ok(Verb::To),
			_ => Err(PlumbError::InvalidVerb {
				verb: s.to_string(),
			}),
		}
	}
}

impl fmt::Display for Verb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One `object verb argument...` line of a rule group.
///
/// The object stays raw text until evaluation, so an unknown object only
/// fails when its group is actually reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
	pub object: String,
	pub verb: Verb,
	/// Unexpanded argument text.
	pub arg: String,
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} {}", self.object, self.verb, self.arg)
	}
}

/// Classification of a single rule-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
	/// Group boundary.
	Blank,
	Comment,
	/// `name = value`, value still unexpanded.
	Assignment { name: String, value: String },
	Pattern(Pattern),
	/// A pattern missing its object or argument; skipped with a warning.
	Dropped { reason: &'static str },
}

/// Classify one line of a rule file.
///
/// Only an empty line separates groups. Any other line that is not a
/// comment or an assignment must be a pattern, so a whitespace-only line
/// fails like any line with fewer than two fields. An unknown verb fails too.
pub fn parse_line(line: &str) -> Result<Line> {
	if line.is_empty() {
		return Ok(Line::Blank);
	}
	if line.starts_with('#') {
		return Ok(Line::Comment);
	}
	if let Some((name, value)) = line.split_once('=') {
		return Ok(Line::Assignment {
			name: name.trim_matches([' ', '\t']).to_string(),
			value: value.trim_matches([' ', '\t']).to_string(),
		});
	}

	let fields: Vec<&str> = line.split_whitespace().collect();
	if fields.len() < 2 {
		return Err(PlumbError::MalformedRule {
			line: line.to_string(),
		});
	}
	let verb: Verb = fields[1].parse()?;
	let object = fields[0].to_string();
	let arg = fields[2..].join(" ");

	if object.is_empty() {
		return Ok(Line::Dropped {
			reason: "missing object",
		});
	}
	if arg.is_empty() {
		return Ok(Line::Dropped {
			reason: "missing argument",
		});
	}

	Ok(Line::Pattern(Pattern { object, verb, arg }))
}
