use crate::error::{PlumbError, Result};
use crate::exec::Launcher;
use crate::rules::environment::Environment;
use crate::rules::parser::{Object, Pattern, Verb};
use regex::Regex;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Component, Path, PathBuf};

/// Result of evaluating a pattern or a group.
///
/// `NoMatch` is ordinary control flow: the group is rejected and the next
/// one is tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Match,
	NoMatch,
}

impl From<bool> for Outcome {
	fn from(holds: bool) -> Self {
		if holds { Outcome::Match } else { Outcome::NoMatch }
	}
}

impl Pattern {
	/// Expand the argument against `env` and test or perform this pattern.
	pub fn evaluate(&self, env: &mut Environment, launcher: &dyn Launcher) -> Result<Outcome> {
		let object: Object = self.object.parse()?;
		let arg = env.expand(&self.arg)?;

		if object == Object::Plumb {
			return match self.verb {
				Verb::Start => {
					launcher.start(&arg, env.get("wdir").unwrap_or(""))?;
					Ok(Outcome::Match)
				}
				Verb::To => {
					append_arg(Path::new(&arg), env)?;
					Ok(Outcome::Match)
				}
				verb => Err(unexpected(object, verb)),
			};
		}

		match self.verb {
			Verb::Is => Ok((env.get(object.as_str()).unwrap_or("") == arg).into()),
			Verb::IsNot => Ok((env.get(object.as_str()).unwrap_or("") != arg).into()),
			Verb::IsDir | Verb::IsFile => check_path(self.verb, &arg, env),
			Verb::Matches => match_regex(object, &arg, env),
			Verb::Set => {
				env.bind(object.as_str(), arg);
				Ok(Outcome::Match)
			}
			verb @ (Verb::Start | Verb::To) => Err(unexpected(object, verb)),
		}
	}
}

fn unexpected(object: Object, verb: Verb) -> PlumbError {
	PlumbError::UnexpectedVerb {
		object: object.to_string(),
		verb: verb.to_string(),
	}
}

/// Append the value bound to `arg` to the file at `path`.
fn append_arg(path: &Path, env: &Environment) -> Result<()> {
	let data = env.get("arg").ok_or(PlumbError::MissingArg)?;
	let append_failed = |source| PlumbError::AppendFailed {
		path: path.to_path_buf(),
		source,
	};
	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.mode(0o644)
		.open(path)
		.map_err(append_failed)?;
	file.write_all(data.as_bytes()).map_err(append_failed)?;
	tracing::debug!(path = %path.display(), bytes = data.len(), "appended");
	Ok(())
}

/// `isdir` / `isfile`: stat the argument, resolved against `wdir`.
///
/// A stat failure is a hard error; an existing path of the wrong kind is
/// a plain no-match.
fn check_path(verb: Verb, arg: &str, env: &mut Environment) -> Result<Outcome> {
	let path = Path::new(arg);
	let path = if path.is_absolute() {
		clean_path(path)
	} else {
		let Some(wdir) = env.get("wdir") else {
			tracing::warn!(arg, "missing working directory");
			return Ok(Outcome::NoMatch);
		};
		clean_path(&Path::new(wdir).join(path))
	};

	let meta = std::fs::metadata(&path).map_err(|source| PlumbError::Stat {
		path: path.clone(),
		source,
	})?;

	let (holds, name) = match verb {
		Verb::IsDir => (meta.is_dir(), "dir"),
		_ => (meta.is_file(), "file"),
	};
	if holds {
		env.bind(name, path.to_string_lossy().into_owned());
	}
	Ok(holds.into())
}

/// `matches`: test the object's value against a freshly compiled regex and
/// bind the capture groups.
fn match_regex(object: Object, pattern: &str, env: &mut Environment) -> Result<Outcome> {
	let re = Regex::new(pattern).map_err(|source| PlumbError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})?;
	let subject = env.get(object.as_str()).unwrap_or("").to_string();

	let Some(caps) = re.captures(&subject) else {
		return Ok(Outcome::NoMatch);
	};
	let captures: Vec<String> = caps
		.iter()
		.map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
		.collect();
	env.bind_captures(captures);
	Ok(Outcome::Match)
}

/// Lexically normalise a path: drop `.`, fold `..` and repeated separators.
pub fn clean_path(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => match out.components().next_back() {
				Some(Component::Normal(_)) => {
					out.pop();
				}
				Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
				_ => out.push(".."),
			},
			other => out.push(other),
		}
	}
	if out.as_os_str().is_empty() {
		out.push(".");
	}
	out
}
