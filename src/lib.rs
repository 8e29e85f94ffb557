//! `optline` turns a command line - a flat sequence of string tokens - into a
//! populated, strongly typed configuration, and renders a matching usage
//! screen from the same declarations.
//!
//! Unlike parsers that own the whole declaration story, `optline` deliberately
//! stops at a neutral boundary. A program describes its parameters as
//! [`ParameterSpec`] values collected into a [`CommandModel`]; parsed values
//! flow back through a [`Sink`] the program implements over its own
//! configuration type. Any declaration mechanism - a builder, a table, code
//! generation - can feed the same core.
//!
//! The core handles the grammar most command lines have grown: long and short
//! names with any prefix character, clustered short flags (`-rvf`), attached
//! values (`-ovalue`, `--out=value`, custom separators), variable arities
//! with greedy-but-polite consumption, boolean options that take a value only
//! when one is clearly offered, a `--` terminator, and one positional
//! parameter. The help renderer lays the same declarations out as an aligned
//! 80-column screen with per-column overflow policies.
//!
//! # Usage
//! ```
//! use optline::{CommandLine, CommandModel, ParameterSpec, Sink, Value, ValueType};
//!
//! #[derive(Default)]
//! struct Config {
//!     verbose: bool,
//!     count: i32,
//!     files: Vec<String>,
//! }
//!
//! struct ConfigSink<'a>(&'a mut Config);
//!
//! impl Sink for ConfigSink<'_> {
//!     fn set(&mut self, spec: &ParameterSpec, value: Value) {
//!         match spec.field() {
//!             "verbose" => self.0.verbose = *value.downcast::<bool>().unwrap(),
//!             "count" => self.0.count = *value.downcast::<i32>().unwrap(),
//!             other => unreachable!("unknown field {other}"),
//!         }
//!     }
//!
//!     fn push(&mut self, spec: &ParameterSpec, value: Value) {
//!         match spec.field() {
//!             "files" => self.0.files.push(*value.downcast::<String>().unwrap()),
//!             other => unreachable!("unknown field {other}"),
//!         }
//!     }
//! }
//!
//! let model = CommandModel::builder("demo")
//!     .add(ParameterSpec::option("verbose", &["-v", "--verbose"], ValueType::scalar::<bool>()))
//!     .add(ParameterSpec::option("count", &["-c", "--count"], ValueType::scalar::<i32>()))
//!     .add(ParameterSpec::positional("files", ValueType::list::<String>()))
//!     .build()
//!     .unwrap();
//! let command_line = CommandLine::new(model);
//!
//! let mut config = Config::default();
//! let outcome = command_line
//!     .parse(&["-v", "--count=3", "a.txt", "b.txt"], &mut ConfigSink(&mut config))
//!     .unwrap();
//!
//! assert!(!outcome.help_requested);
//! assert!(config.verbose);
//! assert_eq!(config.count, 3);
//! assert_eq!(config.files, vec!["a.txt".to_string(), "b.txt".to_string()]);
//! ```
//!
//! # Errors
//! Nothing here panics on user input. Declaration mistakes surface as
//! [`ConfigError`] when the model is built, parse failures as [`ParseError`]
//! from the parse entry points, and layout mistakes as [`LayoutError`] from
//! the help renderer. Conversion failures keep the offending token and the
//! option's name in the message, so the program can show them to its user
//! verbatim.
//!
//! # Features
//! * `debug`: trace the parser's token classification via `tracing`.
#![deny(missing_docs)]
mod api;
mod command;
mod constant;
mod convert;
mod help;
mod model;
mod parser;
mod sink;

pub use api::{parse, usage, CommandLine, UsageError};
pub use command::{CommandBuilder, CommandModel, ConfigError};
pub use convert::{ConvertFailure, ConverterRegistry};
pub use help::{Column, Help, LayoutError, OptionSort, Overflow, RowStyle, TextTable};
pub use model::{ArityError, ArityRange, ParamKind, ParameterSpec, Ty, ValueShape, ValueType};
pub use parser::{ParseError, ParseOutcome};
pub use sink::{Sink, Value};

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[cfg(test)]
pub(crate) mod test {
    macro_rules! assert_contains {
        ($base:expr, $sub:expr) => {
            assert!(
                $base.contains($sub),
                "'{b}' does not contain '{s}'",
                b = $base,
                s = $sub,
            );
        };
    }

    pub(crate) use assert_contains;
}
