use std::cmp::Ordering;

use crate::command::CommandModel;
use crate::help::table::{LayoutError, TextTable};
use crate::model::{ParamKind, ParameterSpec};

/// How the options section is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionSort {
    /// By shortest option name: length, then case-insensitively, with
    /// lowercase before uppercase on ties.
    #[default]
    ShortestName,
    /// By arity maximum, then minimum, then shortest option name.
    ArityAndName,
    /// In declaration order.
    Declaration,
}

/// The shape of an option's row in the details table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStyle {
    /// `-c, --create <file>   description` over four columns.
    #[default]
    Default,
    /// `--create <file>   description` over two columns, using the first
    /// declared name.
    Minimal,
}

/// Renders the help screen for a [`CommandModel`]: summary lines, the
/// synthesized usage line, the option rows, and the footer.
///
/// Rendering is a pure function of the model.
#[derive(Debug)]
pub struct Help<'m> {
    model: &'m CommandModel,
    sort: OptionSort,
    style: RowStyle,
    table_width: Option<usize>,
}

impl<'m> Help<'m> {
    /// A renderer over `model` with the default sort and row style.
    pub fn new(model: &'m CommandModel) -> Self {
        Self {
            model,
            sort: OptionSort::default(),
            style: RowStyle::default(),
            table_width: None,
        }
    }

    /// Choose the options section sort.
    pub fn sort(mut self, sort: OptionSort) -> Self {
        self.sort = sort;
        self
    }

    /// Choose the option row style.
    pub fn style(mut self, style: RowStyle) -> Self {
        self.style = style;
        self
    }

    /// Stretch or shrink the details table to a total width (the
    /// description column absorbs the difference).
    pub fn sized(mut self, total: usize) -> Self {
        self.table_width.replace(total);
        self
    }

    /// The full help screen.
    pub fn render(&self) -> Result<String, LayoutError> {
        let settings = self.model.settings();
        let mut out = String::default();

        for line in &settings.summary {
            out.push_str(line);
            out.push('\n');
        }

        out.push_str(&self.usage_line());
        out.push('\n');
        out.push_str(&self.options_table()?.render());

        for line in &settings.footer {
            out.push_str(line);
            out.push('\n');
        }

        Ok(out)
    }

    /// The synthesized `Usage:` line.
    pub fn usage_line(&self) -> String {
        let settings = self.model.settings();
        let mut parts: Vec<String> = Vec::default();

        if settings.detailed_usage {
            parts.extend(self.detailed_options());
        } else {
            parts.push("[OPTIONS]".to_string());
        }

        if let Some(positional) = self.model.positional() {
            if !positional.hidden {
                parts.push(positional_shape(positional));
            }
        }

        let mut line = format!("Usage: {}", settings.program_name);
        for part in parts {
            line.push(' ');
            line.push_str(&part);
        }

        line
    }

    // Detailed mode: required boolean flags cluster unbracketed, optional
    // ones cluster bracketed, and everything else renders its value
    // template in declaration order.
    fn detailed_options(&self) -> Vec<String> {
        let mut required_cluster: Vec<char> = Vec::default();
        let mut optional_cluster: Vec<char> = Vec::default();
        let mut prefix = '-';
        let mut rest: Vec<String> = Vec::default();

        for spec in self.options() {
            let flag = spec.value_type().is_boolean() && spec.capacity().max() == 0;
            let short = shortest_short_name(spec);

            match (flag, short) {
                (true, Some(name)) => {
                    let mut characters = name.chars();
                    prefix = characters
                        .next()
                        .expect("internal error - a short name has two characters");
                    let single = characters
                        .next()
                        .expect("internal error - a short name has two characters");

                    if spec.required {
                        required_cluster.push(single);
                    } else {
                        optional_cluster.push(single);
                    }
                }
                (true, None) => {
                    let name = shortest_name(spec);
                    rest.push(if spec.required {
                        name.to_string()
                    } else {
                        format!("[{name}]")
                    });
                }
                (false, _) => {
                    rest.push(self.value_template(spec));
                }
            }
        }

        required_cluster.sort_unstable();
        optional_cluster.sort_unstable();

        let mut parts = Vec::default();
        if !required_cluster.is_empty() {
            let cluster: String = required_cluster.into_iter().collect();
            parts.push(format!("{prefix}{cluster}"));
        }
        if !optional_cluster.is_empty() {
            let cluster: String = optional_cluster.into_iter().collect();
            parts.push(format!("[{prefix}{cluster}]"));
        }
        parts.extend(rest);
        parts
    }

    // `-c <count>`, `-c=<count>`, `[-c[=<count>...]]` and friends, shaped by
    // the declared arity and whether a separator was configured.
    fn value_template(&self, spec: &ParameterSpec) -> String {
        let name = shortest_name(spec);
        let label = spec.display_label();
        let separator = self.model.label_separator();
        let configured = self.model.settings().separator.is_some();
        let arity = spec.arity_or_default();

        // With no configured separator the space stays outside the optional
        // value's brackets: `-c [<count>]` rather than `-c[ <count>]`.
        let optional_value = |inner: &str| {
            if configured {
                format!("{name}[{separator}{inner}]")
            } else {
                format!("{name}{separator}[{inner}]")
            }
        };

        let core = if arity.max() == 0 {
            name.to_string()
        } else if arity.min() == 0 && arity.max() == 1 {
            optional_value(&label)
        } else if arity.min() == 0 {
            optional_value(&format!("{label}..."))
        } else if arity.max() == 1 {
            format!("{name}{separator}{label}")
        } else {
            format!("{name}{separator}{label} [{label}...]")
        };

        if spec.required {
            core
        } else {
            format!("[{core}]")
        }
    }

    fn options_table(&self) -> Result<TextTable, LayoutError> {
        let mut specs: Vec<&ParameterSpec> = self.options().collect();

        match self.sort {
            OptionSort::ShortestName => specs.sort_by(|a, b| compare_shortest_names(a, b)),
            OptionSort::ArityAndName => specs.sort_by(|a, b| compare_arity_and_names(a, b)),
            OptionSort::Declaration => {}
        }

        let mut table = match (self.style, self.table_width) {
            (RowStyle::Default, None) => TextTable::option_details(),
            (RowStyle::Default, Some(total)) => TextTable::option_details_sized(total),
            (RowStyle::Minimal, _) => TextTable::minimal_details(),
        };

        for spec in specs {
            let row = self.row(spec);
            let cells: Vec<&str> = row.iter().map(|cell| cell.as_str()).collect();
            table.add_row(&cells)?;
        }

        Ok(table)
    }

    fn row(&self, spec: &ParameterSpec) -> Vec<String> {
        let description = spec.description.clone().unwrap_or_default();
        // Inside the details table a space precedes the label.
        let label = if spec.arity_or_default().max() > 0 {
            format!(" {}", spec.display_label())
        } else {
            String::default()
        };

        match self.style {
            RowStyle::Default => {
                let sorted = shortest_first(&spec.names);
                let (short, others) = match sorted.first() {
                    Some(name) if name.chars().count() == 2 => {
                        (Some(name.as_str()), &sorted[1..])
                    }
                    _ => (None, &sorted[..]),
                };

                let joined = others
                    .iter()
                    .map(|name| name.as_str())
                    .collect::<Vec<&str>>()
                    .join(", ");
                let comma = if short.is_some() && !joined.is_empty() {
                    ","
                } else {
                    ""
                };

                vec![
                    short.unwrap_or_default().to_string(),
                    comma.to_string(),
                    format!("{joined}{label}"),
                    description,
                ]
            }
            RowStyle::Minimal => {
                vec![format!("{}{label}", spec.primary_name()), description]
            }
        }
    }

    fn options(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.model
            .specs()
            .iter()
            .filter(|spec| matches!(spec.kind, ParamKind::NamedOption) && !spec.hidden)
    }
}

fn positional_shape(spec: &ParameterSpec) -> String {
    let label = spec.display_label();
    let arity = spec.arity_or_default();

    if arity.min() == 0 && arity.max() <= 1 {
        format!("[{label}]")
    } else if arity.min() == 0 {
        format!("[{label}...]")
    } else if arity.max() == 1 {
        label
    } else {
        format!("{label} [{label}...]")
    }
}

// Length ascending, declaration order on ties (not alphabetic).
fn shortest_first(names: &[String]) -> Vec<String> {
    let mut sorted = names.to_vec();
    sorted.sort_by_key(|name| name.chars().count());
    sorted
}

fn shortest_name(spec: &ParameterSpec) -> String {
    shortest_first(&spec.names)
        .into_iter()
        .next()
        .unwrap_or_else(|| spec.field.clone())
}

fn shortest_short_name(spec: &ParameterSpec) -> Option<String> {
    shortest_first(&spec.names)
        .into_iter()
        .next()
        .filter(|name| name.chars().count() == 2)
}

// Length, then case-insensitive, then lowercase before uppercase.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
        .then_with(|| b.cmp(a))
}

pub(crate) fn compare_shortest_names(a: &ParameterSpec, b: &ParameterSpec) -> Ordering {
    compare_names(&shortest_name(a), &shortest_name(b))
}

pub(crate) fn compare_arity_and_names(a: &ParameterSpec, b: &ParameterSpec) -> Ordering {
    a.arity_or_default()
        .max()
        .cmp(&b.arity_or_default().max())
        .then_with(|| a.arity_or_default().min().cmp(&b.arity_or_default().min()))
        .then_with(|| compare_shortest_names(a, b))
}
