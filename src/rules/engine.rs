use crate::error::{PlumbError, Result};
use crate::exec::Launcher;
use crate::rules::environment::Environment;
use crate::rules::evaluator::Outcome;
use crate::rules::parser::{Line, Pattern, parse_line};
use std::io::BufRead;
use tracing::{debug, warn};

/// Terminal result of running one message through a rule file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
	/// A group matched; `line` is the rule-file line that closed it.
	Matched { line: usize },
	NoMatchingRule,
}

/// Evaluate a group's patterns in order, stopping at the first that does
/// not hold.
pub fn evaluate_group(
	patterns: &[Pattern],
	env: &mut Environment,
	launcher: &dyn Launcher,
) -> Result<Outcome> {
	for pattern in patterns {
		if pattern.evaluate(env, launcher)? == Outcome::NoMatch {
			debug!(%pattern, "no match");
			return Ok(Outcome::NoMatch);
		}
	}
	Ok(Outcome::Match)
}

/// Scan a rule file and run each blank-line separated group against a
/// copy of `base` until one matches.
///
/// A rejected group's assignments and bindings are discarded before the
/// next group starts. Parse, expansion and action errors abort the scan.
pub fn evaluate_rules<R: BufRead>(
	reader: R,
	base: &Environment,
	launcher: &dyn Launcher,
) -> Result<Dispatched> {
	let mut env = base.clone();
	let mut group: Vec<Pattern> = Vec::new();
	let mut lineno = 0;

	for line in reader.lines() {
		let line = line.map_err(|source| PlumbError::RulesScan { source })?;
		lineno += 1;

		match parse_line(&line)? {
			Line::Blank => {
				if group.is_empty() {
					continue;
				}
				if evaluate_group(&group, &mut env, launcher)? == Outcome::Match {
					return Ok(Dispatched::Matched { line: lineno });
				}
				group.clear();
				env = base.clone();
			}
			Line::Comment => {}
			Line::Assignment { name, value } => {
				let value = env.expand(&value)?;
				debug!(%name, %value, "assign");
				env.bind(name, value);
			}
			Line::Pattern(pattern) => group.push(pattern),
			Line::Dropped { reason } => warn!(line = %line, reason, "invalid rule"),
		}
	}

	// The last group need not be followed by a blank line.
	if !group.is_empty() && evaluate_group(&group, &mut env, launcher)? == Outcome::Match {
		return Ok(Dispatched::Matched { line: lineno });
	}
	Ok(Dispatched::NoMatchingRule)
}

/// Parse a whole rule file without evaluating anything.
///
/// Returns the number of rule groups. Errors carry the offending line.
pub fn check_rules<R: BufRead>(reader: R) -> Result<usize> {
	let mut groups = 0;
	let mut pending = false;

	for (index, line) in reader.lines().enumerate() {
		let line = line.map_err(|source| PlumbError::RulesScan { source })?;
		let parsed = parse_line(&line).map_err(|e| PlumbError::RuleLine {
			line: index + 1,
			source: Box::new(e),
		})?;
		match parsed {
			Line::Blank if pending => {
				groups += 1;
				pending = false;
			}
			Line::Pattern(_) => pending = true,
			Line::Dropped { reason } => warn!(line = index + 1, reason, "invalid rule"),
			_ => {}
		}
	}
	if pending {
		groups += 1;
	}
	Ok(groups)
}
