use std::collections::HashMap;

use thiserror::Error;

use crate::constant::*;
use crate::convert::ConverterRegistry;
use crate::model::{ParamKind, ParameterSpec};

/// A declaration-time configuration mistake.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Two parameters registered the same option name.
    #[error("Parameter name '{name}' is used in both {first} and {second}")]
    DuplicateParameterName {
        /// The colliding name.
        name: String,
        /// The field that registered the name first.
        first: String,
        /// The field that tried to register it again.
        second: String,
    },

    /// A command supports at most one positional parameter.
    #[error("Cannot declare a second positional parameter ('{first}' and '{second}').")]
    DuplicatePositional {
        /// The field of the positional declared first.
        first: String,
        /// The field of the positional declared second.
        second: String,
    },

    /// A named option declared no names.
    #[error("Option '{0}' must declare at least one name.")]
    MissingName(String),

    /// A named option declared an empty name.
    #[error("Option '{0}' declares an empty name.")]
    EmptyName(String),

    /// The option/value separator must be a non-empty string.
    #[error("The separator must not be empty.")]
    EmptySeparator,

    /// A help-flag parameter must be a plain boolean flag.
    #[error("Help parameter '{0}' must be a boolean flag.")]
    InvalidHelpFlag(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) separator: Option<String>,
    pub(crate) program_name: String,
    pub(crate) summary: Vec<String>,
    pub(crate) footer: Vec<String>,
    pub(crate) detailed_usage: bool,
    pub(crate) case_insensitive_enums: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            separator: None,
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            summary: Vec::default(),
            footer: Vec::default(),
            detailed_usage: false,
            case_insensitive_enums: false,
        }
    }
}

/// The full description of one program's parameters, indexed for parsing.
///
/// Built once via [`CommandModel::builder`] and immutable during parsing, so
/// it may be shared for concurrent parses (each with its own `Sink`) and for
/// help rendering.
pub struct CommandModel {
    specs: Vec<ParameterSpec>,
    by_name: HashMap<String, usize>,
    positional: Option<usize>,
    settings: Settings,
    converters: ConverterRegistry,
}

impl std::fmt::Debug for CommandModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandModel")
            .field("program", &self.settings.program_name)
            .field("specs", &self.specs.len())
            .finish()
    }
}

impl CommandModel {
    /// Start describing a command for the given program name.
    pub fn builder(program: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            settings: Settings {
                program_name: program.into(),
                ..Settings::default()
            },
            specs: Vec::default(),
            converter_hooks: Vec::default(),
        }
    }

    /// Every parameter, in declaration order.
    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    /// The positional parameter, if one was declared.
    pub fn positional(&self) -> Option<&ParameterSpec> {
        self.positional.map(|index| &self.specs[index])
    }

    /// The program name used in the usage line.
    pub fn program_name(&self) -> &str {
        &self.settings.program_name
    }

    /// The separator used to attach a value to an option name.
    pub fn separator(&self) -> &str {
        self.settings
            .separator
            .as_deref()
            .unwrap_or(DEFAULT_SEPARATOR)
    }

    // Help output shows a space between name and label unless a separator
    // was explicitly configured.
    pub(crate) fn label_separator(&self) -> &str {
        self.settings
            .separator
            .as_deref()
            .unwrap_or(LABEL_SEPARATOR)
    }

    pub(crate) fn spec(&self, index: usize) -> &ParameterSpec {
        &self.specs[index]
    }

    pub(crate) fn option_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = (&String, usize)> {
        self.by_name.iter().map(|(name, index)| (name, *index))
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub(crate) fn replace_separator(&mut self, separator: String) {
        self.settings.separator.replace(separator);
    }
}

/// Collects parameters and program settings, then produces a [`CommandModel`].
pub struct CommandBuilder {
    settings: Settings,
    specs: Vec<ParameterSpec>,
    converter_hooks: Vec<Box<dyn FnOnce(&mut ConverterRegistry)>>,
}

impl CommandBuilder {
    /// Append a summary line, emitted verbatim above the usage line.
    pub fn summary(mut self, line: impl Into<String>) -> Self {
        self.settings.summary.push(line.into());
        self
    }

    /// Append a footer line, emitted verbatim at the end of the help screen.
    pub fn footer(mut self, line: impl Into<String>) -> Self {
        self.settings.footer.push(line.into());
        self
    }

    /// Configure the option/value separator (default `=`).
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.settings.separator.replace(separator.into());
        self
    }

    /// Enumerate every option in the usage line instead of `[OPTIONS]`.
    pub fn detailed_usage(mut self, detailed: bool) -> Self {
        self.settings.detailed_usage = detailed;
        self
    }

    /// Match enum names case-insensitively.
    pub fn case_insensitive_enums(mut self, fold: bool) -> Self {
        self.settings.case_insensitive_enums = fold;
        self
    }

    /// Add a parameter to the command.
    pub fn add(mut self, spec: ParameterSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Register additional type converters on top of the built-ins.
    pub fn converters(mut self, hook: impl FnOnce(&mut ConverterRegistry) + 'static) -> Self {
        self.converter_hooks.push(Box::new(hook));
        self
    }

    /// Finalize the configuration, checking it for errors.
    pub fn build(self) -> Result<CommandModel, ConfigError> {
        let CommandBuilder {
            settings,
            mut specs,
            converter_hooks,
        } = self;

        if matches!(&settings.separator, Some(separator) if separator.is_empty()) {
            return Err(ConfigError::EmptySeparator);
        }

        for (index, spec) in specs.iter_mut().enumerate() {
            spec.order = index;
        }

        let mut by_name: HashMap<String, usize> = HashMap::default();
        let mut positional: Option<usize> = None;

        for (index, spec) in specs.iter().enumerate() {
            match spec.kind {
                ParamKind::NamedOption => {
                    if spec.names.is_empty() {
                        return Err(ConfigError::MissingName(spec.field.clone()));
                    }

                    for name in &spec.names {
                        if name.is_empty() {
                            return Err(ConfigError::EmptyName(spec.field.clone()));
                        }

                        if let Some(&previous) = by_name.get(name) {
                            // The map only ever holds indices of earlier specs.
                            return Err(ConfigError::DuplicateParameterName {
                                name: name.clone(),
                                first: index_field(&specs, previous),
                                second: spec.field.clone(),
                            });
                        }

                        by_name.insert(name.clone(), index);
                    }

                    if spec.help_flag
                        && !(spec.value.is_boolean() && spec.capacity().max() == 0)
                    {
                        return Err(ConfigError::InvalidHelpFlag(spec.field.clone()));
                    }
                }
                ParamKind::Positional => {
                    if let Some(previous) = positional {
                        return Err(ConfigError::DuplicatePositional {
                            first: index_field(&specs, previous),
                            second: spec.field.clone(),
                        });
                    }

                    positional = Some(index);
                }
            }
        }

        let mut converters = ConverterRegistry::with_builtins();
        converters.set_case_insensitive_enums(settings.case_insensitive_enums);

        for hook in converter_hooks {
            hook(&mut converters);
        }

        Ok(CommandModel {
            specs,
            by_name,
            positional,
            settings,
            converters,
        })
    }
}

fn index_field(specs: &[ParameterSpec], index: usize) -> String {
    specs[index].field.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueType;
    use rstest::rstest;

    #[test]
    fn empty_build() {
        // Setup
        let builder = CommandModel::builder("program");

        // Execute
        let model = builder.build().unwrap();

        // Verify
        assert_eq!(model.program_name(), "program");
        assert_eq!(model.separator(), "=");
        assert_eq!(model.label_separator(), " ");
        assert!(model.specs().is_empty());
        assert!(model.positional().is_none());
    }

    #[test]
    fn build_indexes_names() {
        // Setup
        let builder = CommandModel::builder("program")
            .add(ParameterSpec::option(
                "verbose",
                &["-v", "--verbose"],
                ValueType::scalar::<bool>(),
            ))
            .add(ParameterSpec::positional(
                "files",
                ValueType::list::<String>(),
            ));

        // Execute
        let model = builder.build().unwrap();

        // Verify
        assert_eq!(model.option_index("-v"), Some(0));
        assert_eq!(model.option_index("--verbose"), Some(0));
        assert_eq!(model.option_index("--moot"), None);
        assert_eq!(model.positional().unwrap().field(), "files");
        assert_eq!(model.specs()[1].order, 1);
    }

    #[test]
    fn configured_separator() {
        let model = CommandModel::builder("program")
            .separator(":")
            .build()
            .unwrap();

        assert_eq!(model.separator(), ":");
        assert_eq!(model.label_separator(), ":");
    }

    #[test]
    fn empty_separator() {
        let result = CommandModel::builder("program").separator("").build();
        assert_matches!(result, Err(ConfigError::EmptySeparator));
    }

    #[rstest]
    #[case(&["-p"], &["-p"])]
    #[case(&["-p", "--path"], &["--path", "-q"])]
    fn duplicate_name(#[case] first: &[&str], #[case] second: &[&str]) {
        // Setup
        let builder = CommandModel::builder("program")
            .add(ParameterSpec::option(
                "path",
                first,
                ValueType::scalar::<String>(),
            ))
            .add(ParameterSpec::option(
                "text",
                second,
                ValueType::scalar::<String>(),
            ));

        // Execute
        let result = builder.build();

        // Verify
        assert_matches!(result, Err(ConfigError::DuplicateParameterName { first, second, .. }) => {
            assert_eq!(first, "path");
            assert_eq!(second, "text");
        });
    }

    #[test]
    fn duplicate_name_message() {
        let error = CommandModel::builder("program")
            .add(ParameterSpec::option(
                "path",
                &["-p"],
                ValueType::scalar::<String>(),
            ))
            .add(ParameterSpec::option(
                "text",
                &["-p"],
                ValueType::scalar::<String>(),
            ))
            .build()
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Parameter name '-p' is used in both path and text"
        );
    }

    #[test]
    fn duplicate_positional() {
        let result = CommandModel::builder("program")
            .add(ParameterSpec::positional("a", ValueType::list::<String>()))
            .add(ParameterSpec::positional("b", ValueType::list::<String>()))
            .build();

        assert_matches!(result, Err(ConfigError::DuplicatePositional { .. }));
    }

    #[rstest]
    #[case(&[])]
    fn missing_name(#[case] names: &[&str]) {
        let result = CommandModel::builder("program")
            .add(ParameterSpec::option(
                "value",
                names,
                ValueType::scalar::<u32>(),
            ))
            .build();

        assert_matches!(result, Err(ConfigError::MissingName(field)) => {
            assert_eq!(field, "value");
        });
    }

    #[test]
    fn empty_name() {
        let result = CommandModel::builder("program")
            .add(ParameterSpec::option(
                "value",
                &["-v", ""],
                ValueType::scalar::<u32>(),
            ))
            .build();

        assert_matches!(result, Err(ConfigError::EmptyName(_)));
    }

    #[rstest]
    #[case(ValueType::scalar::<bool>(), true)]
    #[case(ValueType::scalar::<u32>(), false)]
    #[case(ValueType::list::<bool>(), false)]
    fn help_flag_shape(#[case] value: ValueType, #[case] expected_ok: bool) {
        // Setup
        let builder = CommandModel::builder("program").add(
            ParameterSpec::option("help", &["-h", "--help"], value).help(),
        );

        // Execute
        let result = builder.build();

        // Verify
        if expected_ok {
            result.unwrap();
        } else {
            assert_matches!(result, Err(ConfigError::InvalidHelpFlag(_)));
        }
    }

    #[test]
    fn model_is_shareable() {
        fn assert_sync<T: Sync + Send>() {}

        // A built model may be shared across threads for reads; each parse
        // brings its own sink.
        assert_sync::<CommandModel>();
    }

    #[test]
    fn converter_hook_applies() {
        #[derive(Clone)]
        struct Custom(#[allow(dead_code)] String);

        let model = CommandModel::builder("program")
            .converters(|registry| {
                registry.register::<Custom>(|raw| Ok(Custom(raw.to_string())));
            })
            .build()
            .unwrap();

        assert!(model
            .converters()
            .contains(crate::model::Ty::of::<Custom>()));
    }
}
