//! The plumbing rule engine.
//!
//! This module handles:
//! - Variable environments and `$name` expansion
//! - Classifying rule-file lines into patterns and assignments
//! - Evaluating patterns and performing `plumb` actions
//! - Grouping patterns and falling through to the next group on no-match

pub mod engine;
pub mod environment;
pub mod evaluator;
pub mod parser;

pub use engine::{Dispatched, check_rules, evaluate_group, evaluate_rules};
pub use environment::Environment;
pub use evaluator::{Outcome, clean_path};
pub use parser::{Line, Object, Pattern, Verb, parse_line};
