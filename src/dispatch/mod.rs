//! The daemon's receive loop and per-message dispatch.
//!
//! This module handles:
//! - Creating and reading the named channel
//! - Splitting read bursts into messages
//! - Handing each message to a [`Scheduler`] as an independent [`Dispatch`]

pub mod channel;

use crate::error::{PlumbError, Result, report};
use crate::exec::Launcher;
use crate::message::Message;
use crate::rules::{Dispatched, Environment, evaluate_rules};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{Instrument, error, info, info_span};

/// One message's run through the rule file.
pub struct Dispatch {
	pub id: u64,
	pub message: Message,
	pub rules: PathBuf,
	pub launcher: Arc<dyn Launcher>,
}

impl Dispatch {
	/// Evaluate the rule file against this message.
	///
	/// Blocking: reads the rule file, stats paths and appends to files.
	pub fn run(&self) -> Result<Dispatched> {
		let file = File::open(&self.rules).map_err(|source| PlumbError::RulesReadError {
			path: self.rules.clone(),
			source,
		})?;
		let base = Environment::from_message(&self.message);
		evaluate_rules(BufReader::new(file), &base, self.launcher.as_ref())
	}

	/// Run and log the terminal outcome.
	pub fn run_logged(&self) -> Option<Dispatched> {
		let _span = info_span!("dispatch", id = self.id).entered();
		match self.run() {
			Ok(outcome @ Dispatched::Matched { line }) => {
				info!(line, "matched rule");
				Some(outcome)
			}
			Ok(outcome @ Dispatched::NoMatchingRule) => {
				info!("no matching rule");
				Some(outcome)
			}
			Err(e) => {
				error!(error = %report(&e), "dispatch failed");
				None
			}
		}
	}
}

/// Decides where and when a [`Dispatch`] runs.
pub trait Scheduler: Send + Sync {
	fn submit(&self, job: Dispatch);
}

/// Every dispatch gets its own blocking task; no limit is applied here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Scheduler for Unbounded {
	fn submit(&self, job: Dispatch) {
		tokio::task::spawn_blocking(move || {
			job.run_logged();
		});
	}
}

/// Reads messages from the channel and fans them out to dispatches.
pub struct Dispatcher<S: Scheduler = Unbounded> {
	rules: PathBuf,
	launcher: Arc<dyn Launcher>,
	scheduler: S,
	backoff: Duration,
	next_id: AtomicU64,
}

impl<S: Scheduler> Dispatcher<S> {
	pub fn new(rules: PathBuf, launcher: Arc<dyn Launcher>, scheduler: S, backoff: Duration) -> Self {
		Self {
			rules,
			launcher,
			scheduler,
			backoff,
			next_id: AtomicU64::new(1),
		}
	}

	/// Read the channel forever.
	///
	/// Each read drains the channel until its writers close. An empty read
	/// means nobody is writing right now: wait and read again.
	pub async fn serve<R: AsyncRead + Unpin>(&self, mut channel: R) {
		let mut buf = Vec::new();
		loop {
			buf.clear();
			match channel.read_to_end(&mut buf).await {
				Ok(0) => tokio::time::sleep(self.backoff).await,
				Ok(_) => {
					self.route(&buf);
				}
				Err(e) => {
					error!(error = %e, "channel read failed");
					tokio::time::sleep(self.backoff).await;
				}
			}
		}
	}

	/// Decode every message in one read burst and submit each.
	///
	/// Returns the number submitted. A framing error drops the rest of the
	/// burst.
	pub fn route(&self, mut burst: &[u8]) -> usize {
		let mut submitted = 0;
		while !burst.iter().all(|&b| b == b'\n') {
			let message = match Message::decode(&mut burst) {
				Ok(message) => message,
				Err(e) => {
					error!(error = %e, bytes = burst.len(), "decode failed");
					break;
				}
			};
			let id = self.next_id.fetch_add(1, Ordering::Relaxed);
			info!(id, %message, "received");
			self.scheduler.submit(Dispatch {
				id,
				message,
				rules: self.rules.clone(),
				launcher: Arc::clone(&self.launcher),
			});
			submitted += 1;
		}
		submitted
	}

	/// Create the channel if needed, open it and serve it.
	pub async fn run(&self, path: &std::path::Path) -> Result<()> {
		let reader = channel::open(path).await?;
		info!(channel = %path.display(), rules = %self.rules.display(), "listening");
		self.serve(reader).instrument(info_span!("serve")).await;
		Ok(())
	}
}
