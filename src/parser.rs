use std::collections::{HashSet, VecDeque};

use thiserror::Error;

#[cfg(feature = "debug")]
use tracing::debug;

use crate::command::CommandModel;
use crate::convert::{parse_bool, ConvertFailure};
use crate::model::{ParamKind, ParameterSpec};
use crate::sink::{Sink, Value};

/// What a successful parse reports back.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Whether a help-flag parameter was matched.
    pub help_requested: bool,
}

/// A failure while parsing a token sequence. Fatal to the parse; no partial
/// result is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A parameter with a minimum of one value received none.
    #[error("Missing required parameter for field '{0}'")]
    MissingParameter(String),

    /// A parameter received fewer values than its minimum arity.
    #[error("Field '{field}' requires at least {expected} parameters, but only {provided} were specified.")]
    TooFewParameters {
        /// The field of the undersupplied parameter.
        field: String,
        /// The arity minimum.
        expected: usize,
        /// How many values were supplied.
        provided: usize,
    },

    /// A required option was never matched.
    #[error("Missing required option '{0}'")]
    MissingRequiredOption(String),

    /// A token does not have the shape its target type requires.
    #[error("'{token}' is not {expected} for option '{name}'")]
    InvalidFormat {
        /// The offending token.
        token: String,
        /// The shape the type required, e.g. `a boolean`.
        expected: &'static str,
        /// The parameter's primary name.
        name: String,
    },

    /// A token could not be converted to the target type.
    #[error("Could not convert '{token}' to {type_name} for option '{name}'{}", element_suffix(.element))]
    Unconvertible {
        /// The offending token.
        token: String,
        /// The display name of the target type.
        type_name: String,
        /// The parameter's primary name.
        name: String,
        /// For aggregates, the index of the offending element.
        element: Option<usize>,
    },

    /// The parameter's element type has no registered converter.
    #[error("No TypeConverter registered for {type_name} of option '{name}'")]
    MissingTypeConverter {
        /// The display name of the unregistered type.
        type_name: String,
        /// The parameter's primary name.
        name: String,
    },
}

fn element_suffix(element: &Option<usize>) -> String {
    match element {
        Some(index) => format!(" parameter[{index}]"),
        None => String::default(),
    }
}

// How a token resolved against the option names of the model.
#[derive(Debug, PartialEq, Eq)]
enum TokenMatch {
    // The token is exactly an option name.
    Exact(usize),
    // `name<separator>value`; an empty value is legitimate (`--owner=`).
    Attached { index: usize, value: String },
    // Starts with a two-character option name; the rest follows cluster rules.
    Cluster,
}

pub(crate) struct Parser<'m> {
    model: &'m CommandModel,
}

impl<'m> Parser<'m> {
    pub(crate) fn new(model: &'m CommandModel) -> Self {
        Self { model }
    }

    pub(crate) fn consume(
        &self,
        tokens: &[&str],
        sink: &mut dyn Sink,
    ) -> Result<ParseOutcome, ParseError> {
        let run = Run {
            model: self.model,
            sink,
            pending: tokens.iter().map(|token| token.to_string()).collect(),
            matched: HashSet::default(),
            help: false,
            positional_mode: false,
            positional_count: 0,
        };
        run.finish()
    }
}

struct Run<'m, 's> {
    model: &'m CommandModel,
    sink: &'s mut dyn Sink,
    pending: VecDeque<String>,
    matched: HashSet<usize>,
    // The help latch lives on the run, so it trivially resets between parses.
    help: bool,
    positional_mode: bool,
    positional_count: usize,
}

impl<'m, 's> Run<'m, 's> {
    fn finish(mut self) -> Result<ParseOutcome, ParseError> {
        while let Some(token) = self.pending.pop_front() {
            // The exact two-character terminator never reaches a sink.
            if token == "--" {
                self.positional_mode = true;
                continue;
            }

            if self.positional_mode {
                self.positional(&token)?;
                continue;
            }

            match self.classify(&token) {
                Some(TokenMatch::Exact(index)) => {
                    #[cfg(feature = "debug")]
                    debug!("token '{token}' matched option by name");

                    self.apply_option(index, None)?;
                }
                Some(TokenMatch::Attached { index, value }) => {
                    self.apply_option(index, Some(Attachment::separated(value)))?;
                }
                Some(TokenMatch::Cluster) => {
                    self.apply_cluster(&token)?;
                }
                None => {
                    #[cfg(feature = "debug")]
                    debug!("token '{token}' starts the positionals");

                    // Everything from the first positional onward is positional.
                    self.positional_mode = true;
                    self.positional(&token)?;
                }
            }
        }

        if !self.help {
            if let Some(spec) = self.model.positional() {
                let minimum = spec.capacity().min();
                if self.positional_count < minimum {
                    return Err(undersupplied(spec, minimum, self.positional_count));
                }
            }

            for spec in self.model.specs() {
                if matches!(spec.kind, ParamKind::NamedOption)
                    && spec.required
                    && !self.matched.contains(&spec.order)
                {
                    return Err(ParseError::MissingRequiredOption(spec.field.clone()));
                }
            }
        }

        Ok(ParseOutcome {
            help_requested: self.help,
        })
    }

    // Pure classification; also the stop-early predicate during value
    // consumption. Exact names win, then separator-attached, then clusters.
    fn classify(&self, token: &str) -> Option<TokenMatch> {
        if let Some(index) = self.model.option_index(token) {
            return Some(TokenMatch::Exact(index));
        }

        let separator = self.model.separator();
        let mut best: Option<(usize, usize)> = None;

        for (name, index) in self.model.names() {
            if token.len() > name.len()
                && token.starts_with(name.as_str())
                && token[name.len()..].starts_with(separator)
            {
                // The longest registered name wins.
                match best {
                    Some((length, _)) if length >= name.len() => {}
                    _ => best = Some((name.len(), index)),
                }
            }
        }

        if let Some((length, index)) = best {
            return Some(TokenMatch::Attached {
                index,
                value: token[length + separator.len()..].to_string(),
            });
        }

        let head: String = token.chars().take(2).collect();
        if token.chars().count() > 2 && self.model.option_index(&head).is_some() {
            return Some(TokenMatch::Cluster);
        }

        None
    }

    // Walk `-abc..`: flags continue the cluster, the first value-taking
    // option ends it by absorbing the remainder, and an unrecognized
    // character pushes the remainder back into the token stream.
    fn apply_cluster(&mut self, token: &str) -> Result<(), ParseError> {
        let prefix = token
            .chars()
            .next()
            .expect("internal error - a cluster token cannot be empty");
        let separator = self.model.separator().to_string();

        let mut position = 1;
        let indices: Vec<(usize, char)> = token.char_indices().collect();

        while position < indices.len() {
            let (byte, single) = indices[position];
            let name: String = [prefix, single].iter().collect();

            match self.model.option_index(&name) {
                Some(index) if self.model.spec(index).capacity().max() == 0 => {
                    self.apply_option(index, None)?;
                    position += 1;
                }
                Some(index) => {
                    let rest_at = byte + single.len_utf8();
                    if rest_at >= token.len() {
                        return self.apply_option(index, None);
                    }

                    let rest = &token[rest_at..];
                    let attachment = match rest.strip_prefix(separator.as_str()) {
                        Some(value) => Attachment::separated(value.to_string()),
                        None => Attachment::joined(rest.to_string()),
                    };
                    return self.apply_option(index, Some(attachment));
                }
                None => {
                    if position == 1 {
                        unreachable!(
                            "internal error - classify() vouched for the leading short name"
                        );
                    }

                    // Not an option character; hand the tail back to the
                    // stream as its own token.
                    self.pending.push_front(token[byte..].to_string());
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    fn apply_option(
        &mut self,
        index: usize,
        attachment: Option<Attachment>,
    ) -> Result<(), ParseError> {
        let model = self.model;
        let spec = model.spec(index);

        self.matched.insert(spec.order);
        if spec.help_flag {
            self.help = true;
        }

        let arity = spec.capacity();
        let boolean = spec.value.is_boolean();
        let mut provided = 0;

        if let Some(Attachment { raw, separated }) = attachment {
            let value = strip_quotes(&raw);

            if arity.max() == 0 {
                // A pure flag given `name=value`: the value must read as a
                // boolean.
                let flag = parse_bool(value).ok_or_else(|| ParseError::InvalidFormat {
                    token: value.to_string(),
                    expected: "a boolean",
                    name: spec.primary_name(),
                })?;
                if boolean {
                    self.store(spec, Box::new(flag));
                }
                return Ok(());
            }

            if boolean && arity.min() == 0 {
                match parse_bool(value) {
                    Some(flag) => {
                        self.store(spec, Box::new(flag));
                        provided = 1;
                    }
                    None if separated => {
                        return Err(ParseError::InvalidFormat {
                            token: value.to_string(),
                            expected: "a boolean",
                            name: spec.primary_name(),
                        });
                    }
                    None => {
                        // `-rv234`: the option stays a plain flag and the
                        // remainder re-enters the token stream.
                        self.store(spec, Box::new(true));
                        self.pending.push_front(raw);
                        return Ok(());
                    }
                }
            } else {
                self.convert_and_store(spec, value, provided)?;
                provided = 1;
            }
        }

        loop {
            if provided >= arity.max() {
                break;
            }

            let stop = match self.pending.front() {
                None => true,
                Some(next) if next == "--" => true,
                Some(next) if provided >= arity.min() => {
                    // Beyond the minimum, stop at anything option-shaped; a
                    // boolean also insists the token reads as a boolean.
                    self.classify(next).is_some()
                        || (boolean && parse_bool(strip_quotes(next)).is_none())
                }
                Some(_) => false,
            };

            if stop {
                break;
            }

            let token = self
                .pending
                .pop_front()
                .expect("internal error - the stop check vouched for a token");
            self.convert_and_store(spec, strip_quotes(&token), provided)?;
            provided += 1;
        }

        if provided < arity.min() {
            return Err(undersupplied(spec, arity.min(), provided));
        }

        if provided == 0 && boolean && !spec.value.is_aggregate() {
            // Presence means true.
            self.store(spec, Box::new(true));
        }

        Ok(())
    }

    fn positional(&mut self, token: &str) -> Result<(), ParseError> {
        let Some(spec) = self.model.positional() else {
            // No positional parameter: extra positionals are discarded.
            return Ok(());
        };

        if self.positional_count >= spec.capacity().max() {
            return Ok(());
        }

        let position = self.positional_count;
        self.convert_and_store(spec, strip_quotes(token), position)?;
        self.positional_count += 1;
        Ok(())
    }

    fn convert_and_store(
        &mut self,
        spec: &ParameterSpec,
        raw: &str,
        position: usize,
    ) -> Result<(), ParseError> {
        let conversion = self
            .model
            .converters()
            .convert(spec.value.element(), raw)
            .ok_or_else(|| ParseError::MissingTypeConverter {
                type_name: spec.value.display_name(),
                name: spec.primary_name(),
            })?;

        let value = conversion.map_err(|failure| match failure {
            ConvertFailure::NotA(expected) => ParseError::InvalidFormat {
                token: raw.to_string(),
                expected,
                name: spec.primary_name(),
            },
            ConvertFailure::Unconvertible => ParseError::Unconvertible {
                token: raw.to_string(),
                type_name: spec.value.display_name(),
                name: spec.primary_name(),
                element: spec.value.is_aggregate().then_some(position),
            },
        })?;

        self.store(spec, value);
        Ok(())
    }

    fn store(&mut self, spec: &ParameterSpec, value: Value) {
        if spec.value.is_aggregate() {
            self.sink.push(spec, value);
        } else {
            self.sink.set(spec, value);
        }
    }
}

struct Attachment {
    raw: String,
    separated: bool,
}

impl Attachment {
    fn separated(raw: String) -> Self {
        Self {
            raw,
            separated: true,
        }
    }

    fn joined(raw: String) -> Self {
        Self {
            raw,
            separated: false,
        }
    }
}

fn undersupplied(spec: &ParameterSpec, expected: usize, provided: usize) -> ParseError {
    if expected == 1 {
        ParseError::MissingParameter(spec.field.clone())
    } else {
        ParseError::TooFewParameters {
            field: spec.field.clone(),
            expected,
            provided,
        }
    }
}

// One layer of surrounding double quotes comes off each value token. Quoting
// also shields a token from option classification.
fn strip_quotes(token: &str) -> &str {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        &token[1..token.len() - 1]
    } else {
        token
    }
}
