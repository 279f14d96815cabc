use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use plumber::config::{Overrides, plumb_dir, resolve_settings};
use plumber::message::Message;

#[derive(Parser)]
#[command(name = "plumb")]
#[command(author, version, about = "Send a message to the plumber")]
struct Cli {
	/// Channel to write to [default: $PLUMBERD/send]
	#[arg(short = 'p', long = "plumb", value_name = "FILE")]
	channel: Option<PathBuf>,

	/// Settings file [default: $PLUMBERD/plumber.toml]
	#[arg(short = 'c', long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Destination port
	#[arg(short, long, default_value = "")]
	dst: String,

	/// Source of the message
	#[arg(short, long, default_value = "plumb")]
	src: String,

	/// Type of the data
	#[arg(short = 't', long = "type", default_value = "text")]
	kind: String,

	/// Working directory [default: current directory]
	#[arg(short, long)]
	wdir: Option<String>,

	/// Attribute to attach, may be repeated
	#[arg(short = 'a', long = "attr", value_name = "NAME=VALUE", value_parser = parse_attr)]
	attrs: Vec<(String, String)>,

	/// Read the data from standard input instead of the arguments
	#[arg(short = 'i', long)]
	stdin: bool,

	/// Data to send, joined with spaces
	#[arg(trailing_var_arg = true, allow_hyphen_values = true)]
	data: Vec<String>,
}

fn parse_attr(s: &str) -> Result<(String, String), String> {
	match s.split_once('=') {
		Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
		_ => Err(format!("expected NAME=VALUE, got {s:?}")),
	}
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	let data = if cli.stdin {
		let mut buf = Vec::new();
		std::io::stdin()
			.read_to_end(&mut buf)
			.context("Failed to read standard input")?;
		if buf.is_empty() {
			anyhow::bail!("no input provided");
		}
		buf.push(b'\n');
		buf
	} else {
		cli.data.join(" ").into_bytes()
	};

	let wdir = match cli.wdir {
		Some(wdir) => wdir,
		None => std::env::current_dir()
			.context("Failed to get current directory")?
			.to_string_lossy()
			.into_owned(),
	};

	let msg = Message {
		src: cli.src,
		dst: cli.dst,
		wdir,
		kind: cli.kind,
		attr: cli.attrs.into_iter().collect::<BTreeMap<_, _>>(),
		data,
	};
	msg.check_header().context("Refusing to send message")?;

	let overrides = Overrides {
		config: cli.config,
		channel: cli.channel,
		..Default::default()
	};
	let channel = resolve_settings(&plumb_dir(), &overrides)
		.context("Failed to load configuration")?
		.channel;

	let mut file = OpenOptions::new()
		.write(true)
		.open(&channel)
		.with_context(|| format!("Failed to open {}", channel.display()))?;
	msg.encode(&mut file)
		.with_context(|| format!("Failed to write to {}", channel.display()))?;

	Ok(ExitCode::SUCCESS)
}
