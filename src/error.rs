use std::path::PathBuf;

/// Library-level structured errors for plumber.
///
/// A pattern that simply does not hold is not an error; see
/// [`crate::rules::Outcome`]. Every variant here aborts whatever dispatch
/// produced it. The binaries wrap these with `anyhow` for context chains.
#[derive(Debug, thiserror::Error)]
pub enum PlumbError {
	#[error("Message truncated: missing {field}")]
	MessageTruncated { field: &'static str },

	#[error("Invalid payload length: {value:?}")]
	InvalidLength {
		value: String,
		#[source]
		source: std::num::ParseIntError,
	},

	#[error("Failed to read message")]
	MessageRead {
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write message")]
	MessageWrite {
		#[source]
		source: std::io::Error,
	},

	#[error("Header field {field} contains a line break")]
	InvalidHeader { field: &'static str },

	#[error("Rule file line {line}")]
	RuleLine {
		line: usize,
		#[source]
		source: Box<PlumbError>,
	},

	#[error("Unknown variable: {name:?}")]
	UnknownVariable { name: String },

	#[error("Expected closing quote: {input:?}")]
	UnterminatedQuote { input: String },

	#[error("Expected closing brace: {input:?}")]
	UnterminatedBrace { input: String },

	#[error("Malformed rule: {line:?}")]
	MalformedRule { line: String },

	#[error("Invalid verb: {verb:?}")]
	InvalidVerb { verb: String },

	#[error("Invalid object: {object:?}")]
	InvalidObject { object: String },

	#[error("Unexpected {verb} verb for {object}")]
	UnexpectedVerb { object: String, verb: String },

	#[error("Missing data: no value bound to `arg`")]
	MissingArg,

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to stat: {path}")]
	Stat {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Command launch failed: {command}")]
	CommandFailed {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to ignore SIGCHLD")]
	ChildReaping {
		#[source]
		source: nix::Error,
	},

	#[error("Failed to append to: {path}")]
	AppendFailed {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read rules file: {path}")]
	RulesReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to scan rules")]
	RulesScan {
		#[source]
		source: std::io::Error,
	},

	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid config file: {path}: {reason}")]
	InvalidConfig { path: PathBuf, reason: String },

	#[error("Failed to create channel: {path}")]
	ChannelCreate {
		path: PathBuf,
		#[source]
		source: nix::Error,
	},

	#[error("Failed to open channel: {path}")]
	ChannelOpen {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Result type alias using PlumbError.
pub type Result<T> = std::result::Result<T, PlumbError>;

/// Render an error and its chain of sources on one line, for logs.
pub fn report(err: &dyn std::error::Error) -> String {
	let mut out = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		out.push_str(": ");
		out.push_str(&cause.to_string());
		source = cause.source();
	}
	out
}
