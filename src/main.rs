use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use plumber::config::{Overrides, Settings, plumb_dir, resolve_settings};
use plumber::dispatch::{Dispatcher, Unbounded};
use plumber::exec::{ShellLauncher, reap_children};
use plumber::logging;
use plumber::rules::check_rules;

#[derive(Parser)]
#[command(name = "plumber")]
#[command(
	author,
	version,
	about = "Message-routing daemon driven by a plumbing rule file"
)]
struct Cli {
	/// Log file [default: $PLUMBERD/log]
	#[arg(short = 'l', long, value_name = "FILE")]
	log: Option<PathBuf>,

	/// Channel senders write messages to [default: $PLUMBERD/send]
	#[arg(short = 'p', long = "plumb", value_name = "FILE")]
	channel: Option<PathBuf>,

	/// Rules file [default: $PLUMBERD/rules]
	#[arg(short = 'r', long, value_name = "FILE")]
	rules: Option<PathBuf>,

	/// Settings file [default: $PLUMBERD/plumber.toml]
	#[arg(short = 'c', long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Parse the rules file, report problems and exit
	#[arg(long)]
	check: bool,
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

	let overrides = Overrides {
		config: cli.config,
		channel: cli.channel,
		rules: cli.rules,
		log: cli.log,
	};
	let settings =
		resolve_settings(&plumb_dir(), &overrides).context("Failed to load configuration")?;

	if cli.check {
		return handle_check(&settings);
	}

	let _guard = logging::init(&settings.log);
	let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
	runtime.block_on(serve(settings))
}

fn handle_check(settings: &Settings) -> Result<ExitCode> {
	let file = File::open(&settings.rules)
		.with_context(|| format!("Failed to open {}", settings.rules.display()))?;
	let groups = check_rules(BufReader::new(file))
		.with_context(|| format!("Invalid rules file: {}", settings.rules.display()))?;
	println!("{}: {} rule groups", settings.rules.display(), groups);
	Ok(ExitCode::SUCCESS)
}

async fn serve(settings: Settings) -> Result<ExitCode> {
	reap_children()?;
	let launcher = Arc::new(ShellLauncher::new(settings.shell.clone()));
	let dispatcher = Dispatcher::new(settings.rules.clone(), launcher, Unbounded, settings.backoff);

	dispatcher
		.run(&settings.channel)
		.await
		.with_context(|| format!("Failed to serve {}", settings.channel.display()))?;

	Ok(ExitCode::SUCCESS)
}
