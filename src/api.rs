use std::fmt;

use thiserror::Error;

use crate::command::{CommandModel, ConfigError};
use crate::help::{Help, LayoutError};
use crate::parser::{ParseError, ParseOutcome, Parser};
use crate::sink::Sink;

/// A failure while emitting the usage screen.
#[derive(Debug, Error)]
pub enum UsageError {
    /// The option rows do not fit the configured table.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The character sink refused the text.
    #[error("Could not write the usage text.")]
    Write(#[from] fmt::Error),
}

/// A reusable parser over one [`CommandModel`].
///
/// ### Example
/// ```
/// use optline::{CommandLine, CommandModel, ParameterSpec, ValueType};
///
/// let model = CommandModel::builder("program")
///     .add(ParameterSpec::option("verbose", &["-v"], ValueType::scalar::<bool>()))
///     .build()
///     .unwrap();
///
/// let mut command_line = CommandLine::new(model);
/// assert_eq!(command_line.separator(), "=");
/// command_line.set_separator(":").unwrap();
/// assert_eq!(command_line.separator(), ":");
/// ```
pub struct CommandLine {
    model: CommandModel,
}

impl CommandLine {
    /// Wrap a built model.
    pub fn new(model: CommandModel) -> Self {
        Self { model }
    }

    /// The underlying model.
    pub fn model(&self) -> &CommandModel {
        &self.model
    }

    /// Replace the option/value separator. The separator must be non-empty.
    pub fn set_separator(&mut self, separator: impl Into<String>) -> Result<(), ConfigError> {
        let separator = separator.into();

        if separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }

        self.model.replace_separator(separator);
        Ok(())
    }

    /// The effective option/value separator (`=` unless configured).
    pub fn separator(&self) -> &str {
        self.model.separator()
    }

    /// Parse the token sequence, writing values through `sink`.
    pub fn parse(&self, tokens: &[&str], sink: &mut dyn Sink) -> Result<ParseOutcome, ParseError> {
        Parser::new(&self.model).consume(tokens, sink)
    }

    /// Render the usage screen into a character sink.
    pub fn usage(&self, out: &mut dyn fmt::Write) -> Result<(), UsageError> {
        let text = Help::new(&self.model).render()?;
        out.write_str(&text)?;
        Ok(())
    }

    /// The usage screen as a string.
    pub fn usage_string(&self) -> Result<String, LayoutError> {
        Help::new(&self.model).render()
    }

    /// Print the usage screen to standard output, sized to the terminal
    /// when one is attached.
    pub fn print_usage(&self) {
        let help = match terminal_size::terminal_size() {
            Some((terminal_size::Width(width), _)) => {
                Help::new(&self.model).sized(width as usize)
            }
            None => Help::new(&self.model),
        };

        match help.render() {
            Ok(text) => print!("{text}"),
            Err(error) => eprintln!("{error}"),
        }
    }
}

/// One-shot parse of `tokens` against `model`, writing through `sink`.
pub fn parse(
    model: &CommandModel,
    tokens: &[&str],
    sink: &mut dyn Sink,
) -> Result<ParseOutcome, ParseError> {
    Parser::new(model).consume(tokens, sink)
}

/// One-shot usage render for `model` into a character sink.
pub fn usage(model: &CommandModel, out: &mut dyn fmt::Write) -> Result<(), UsageError> {
    let text = Help::new(model).render()?;
    out.write_str(&text)?;
    Ok(())
}
