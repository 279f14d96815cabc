//! Plumber - a message-routing daemon driven by a declarative rule file.
//!
//! Senders write small structured messages into a named pipe. The daemon
//! decodes each one, runs it through the rule file and performs the action
//! of the first rule group whose patterns all hold.
//!
//! This library provides:
//! - The message wire format
//! - Variable expansion, rule parsing and pattern evaluation
//! - The receive loop and per-message dispatch
//! - Startup configuration and log setup
//!
//! # Example
//!
//! ```no_run
//! use plumber::exec::ShellLauncher;
//! use plumber::message::Message;
//! use plumber::rules::{Environment, evaluate_rules};
//!
//! let msg = Message {
//!     src: "plumb".to_string(),
//!     dst: "web".to_string(),
//!     wdir: "/tmp".to_string(),
//!     kind: "text".to_string(),
//!     data: b"https://example.com".to_vec(),
//!     ..Default::default()
//! };
//!
//! let rules = "\
//! data matches 'https?://.*'
//! plumb start xdg-open $0
//! ";
//! let outcome = evaluate_rules(
//!     rules.as_bytes(),
//!     &Environment::from_message(&msg),
//!     &ShellLauncher::default(),
//! )
//! .unwrap();
//! println!("{outcome:?}");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod logging;
pub mod message;
pub mod rules;

pub use error::{PlumbError, Result};
