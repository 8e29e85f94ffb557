use std::any::TypeId;
use std::str::FromStr;

use thiserror::Error;

/// The number of value tokens a parameter consumes.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArityRange {
    min: usize,
    max: usize,
    variable: bool,
}

/// An arity spelling that cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid arity specification '{0}'.")]
pub struct ArityError(pub(crate) String);

impl ArityRange {
    /// Precisely `n` values.
    pub fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: n,
            variable: false,
        }
    }

    /// At least `min` values, unbounded above (the `min..*` spelling).
    pub fn at_least(min: usize) -> Self {
        Self {
            min,
            max: usize::MAX,
            variable: true,
        }
    }

    /// Between `min` and `max` values (inclusive).
    pub fn between(min: usize, max: usize) -> Result<Self, ArityError> {
        if min > max {
            return Err(ArityError(format!("{min}..{max}")));
        }

        Ok(Self {
            min,
            max,
            variable: false,
        })
    }

    /// The minimum number of values.
    pub fn min(&self) -> usize {
        self.min
    }

    /// The maximum number of values (`usize::MAX` when unbounded).
    pub fn max(&self) -> usize {
        self.max
    }

    /// Whether the declaration used the unbounded sentinel (`1..*`, `*`).
    pub fn is_variable(&self) -> bool {
        self.variable
    }

    /// Whether there is no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.max == usize::MAX
    }
}

impl std::fmt::Display for ArityRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unbounded() {
            write!(f, "{}..*", self.min)
        } else if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

impl FromStr for ArityRange {
    type Err = ArityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let spelling = value.trim();

        if spelling == "*" {
            return Ok(ArityRange::at_least(0));
        }

        match spelling.split_once("..") {
            Some((lower, "*")) => Ok(ArityRange::at_least(clamped(lower, spelling)?)),
            Some((lower, upper)) => {
                let min = clamped(lower, spelling)?;
                let max = clamped(upper, spelling)?;
                ArityRange::between(min, max).map_err(|_| ArityError(spelling.to_string()))
            }
            None => Ok(ArityRange::exactly(clamped(spelling, spelling)?)),
        }
    }
}

// Negative bounds clamp to zero rather than failing.
fn clamped(bound: &str, spelling: &str) -> Result<usize, ArityError> {
    bound
        .trim()
        .parse::<i64>()
        .map(|n| n.max(0) as usize)
        .map_err(|_| ArityError(spelling.to_string()))
}

// Arbitrary arities for the tests: widening a random minimum by a random
// amount keeps the bounds ordered by construction.
#[cfg(test)]
impl rand::distributions::Distribution<ArityRange> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> ArityRange {
        let min = rng.gen::<u8>() as usize;

        if rng.gen::<bool>() {
            ArityRange::at_least(min)
        } else {
            ArityRange::between(min, min + rng.gen::<u8>() as usize)
                .expect("internal error - a widened maximum cannot undercut the minimum")
        }
    }
}

/// Identifies a conversion target type: a `TypeId` plus a short display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ty {
    id: TypeId,
    name: &'static str,
}

impl Ty {
    /// The identifier for the type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_name::<T>(),
        }
    }

    pub(crate) fn id(&self) -> TypeId {
        self.id
    }

    /// The unqualified type name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn short_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Whether a parameter stores one value or aggregates many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A single value; repeated assignments overwrite.
    Scalar,
    /// A fixed-shape aggregate; elements append.
    Array,
    /// A growable aggregate; elements append.
    List,
}

/// The target type of a parameter: its shape plus the per-element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    shape: ValueShape,
    element: Ty,
}

impl ValueType {
    /// A single value of type `T`.
    pub fn scalar<T: 'static>() -> Self {
        Self {
            shape: ValueShape::Scalar,
            element: Ty::of::<T>(),
        }
    }

    /// An array aggregate with elements of type `T`.
    pub fn array<T: 'static>() -> Self {
        Self {
            shape: ValueShape::Array,
            element: Ty::of::<T>(),
        }
    }

    /// A list aggregate with elements of type `T`.
    pub fn list<T: 'static>() -> Self {
        Self {
            shape: ValueShape::List,
            element: Ty::of::<T>(),
        }
    }

    /// The aggregation shape.
    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    /// The per-element target type.
    pub fn element(&self) -> Ty {
        self.element
    }

    /// Whether elements append instead of overwrite.
    pub fn is_aggregate(&self) -> bool {
        !matches!(self.shape, ValueShape::Scalar)
    }

    pub(crate) fn is_boolean(&self) -> bool {
        self.element.id() == TypeId::of::<bool>()
    }

    // Arrays display their element type with a `[]` suffix in diagnostics.
    pub(crate) fn display_name(&self) -> String {
        match self.shape {
            ValueShape::Array => format!("{}[]", self.element.name()),
            _ => self.element.name().to_string(),
        }
    }
}

/// Whether a parameter is matched by name or by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Matched by one of its declared names.
    NamedOption,
    /// Consumes the tokens no option claims.
    Positional,
}

/// The neutral description of one option or positional parameter.
///
/// A `ParameterSpec` carries everything the parser and the help renderer need
/// to know about a parameter; how the host program produces these (a builder,
/// a table, code generation) is not this crate's concern.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub(crate) kind: ParamKind,
    pub(crate) field: String,
    pub(crate) names: Vec<String>,
    pub(crate) value: ValueType,
    pub(crate) arity: Option<ArityRange>,
    pub(crate) required: bool,
    pub(crate) label: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) help_flag: bool,
    pub(crate) description: Option<String>,
    pub(crate) order: usize,
}

impl ParameterSpec {
    /// Describe a named option over the host field `field`.
    ///
    /// Names carry their own prefix characters; the library fixes none.
    pub fn option(field: impl Into<String>, names: &[&str], value: ValueType) -> Self {
        Self {
            kind: ParamKind::NamedOption,
            field: field.into(),
            names: names.iter().map(|n| n.to_string()).collect(),
            value,
            arity: None,
            required: false,
            label: None,
            hidden: false,
            help_flag: false,
            description: None,
            order: 0,
        }
    }

    /// Describe the positional parameter over the host field `field`.
    pub fn positional(field: impl Into<String>, value: ValueType) -> Self {
        Self {
            kind: ParamKind::Positional,
            field: field.into(),
            names: Vec::default(),
            value,
            arity: None,
            required: false,
            label: None,
            hidden: false,
            help_flag: false,
            description: None,
            order: 0,
        }
    }

    /// Override the default arity.
    pub fn arity(mut self, arity: ArityRange) -> Self {
        self.arity.replace(arity);
        self
    }

    /// Require this parameter to be matched at least once per parse.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display label for the value (for example `"FILE"`).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label.replace(label.into());
        self
    }

    /// Omit this parameter from help output. It still parses.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Mark this parameter as a help request; matching it suppresses the
    /// missing-required-parameter checks at the end of the parse.
    pub fn help(mut self) -> Self {
        self.help_flag = true;
        self
    }

    /// Document this parameter for the help screen.
    /// If repeated, only the final text applies.
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.description.replace(description.into());
        self
    }

    /// The host field this parameter populates.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The declared names, in declaration order. Empty for positionals.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Named or positional.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// The target type of this parameter.
    pub fn value_type(&self) -> ValueType {
        self.value
    }

    /// Whether this parameter must be matched.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this parameter is omitted from help output.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether matching this parameter counts as a help request.
    pub fn is_help_flag(&self) -> bool {
        self.help_flag
    }

    /// The declared arity, or the default for the target type: `0` for a
    /// boolean scalar (presence means true), `1` for any other scalar, and
    /// `0..*` for aggregates.
    pub fn arity_or_default(&self) -> ArityRange {
        match self.arity {
            Some(arity) => arity,
            None => {
                if self.value.is_aggregate() {
                    ArityRange::at_least(0)
                } else if self.value.is_boolean() {
                    ArityRange::exactly(0)
                } else {
                    ArityRange::exactly(1)
                }
            }
        }
    }

    /// The label shown for the value: the declared label, or the field name
    /// in angle brackets.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("<{}>", self.field),
        }
    }

    // The arity the parser actually honors. A scalar can store only one
    // value, so its declared arity clamps to at most one token.
    pub(crate) fn capacity(&self) -> ArityRange {
        let declared = self.arity_or_default();

        if self.value.is_aggregate() {
            return declared;
        }

        let max = declared.max().min(1);
        let min = declared.min().min(max);

        if min == declared.min() && max == declared.max() {
            declared
        } else {
            ArityRange::between(min, max).expect("internal error - clamped bounds must be ordered")
        }
    }

    pub(crate) fn primary_name(&self) -> String {
        self.names
            .first()
            .cloned()
            .unwrap_or_else(|| self.field.clone())
    }
}
