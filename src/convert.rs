use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use url::Url;
use uuid::Uuid;

use crate::model::Ty;
use crate::sink::Value;

/// Why a converter rejected a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertFailure {
    /// The token does not have the shape the target type requires; the
    /// payload completes the phrase `'<token>' is not <payload>`.
    NotA(&'static str),
    /// Any other failure; reported as `Could not convert '<token>' to <T>`.
    Unconvertible,
}

type ConvertFn = Box<dyn Fn(&str) -> Result<Value, ConvertFailure> + Send + Sync>;

/// The mapping from target type to its `string -> value` conversion.
///
/// Built-ins are installed by the [`CommandModel`](crate::CommandModel)
/// builder; additional types are registered through [`ConverterRegistry::register`]
/// and [`ConverterRegistry::register_enum`].
pub struct ConverterRegistry {
    table: HashMap<TypeId, ConvertFn>,
    case_insensitive_enums: bool,
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.table.len())
            .finish()
    }
}

impl ConverterRegistry {
    pub(crate) fn with_builtins() -> Self {
        let mut registry = Self {
            table: HashMap::default(),
            case_insensitive_enums: false,
        };

        integers(&mut registry);
        registry.put::<f32>(|raw| raw.parse().map_err(|_| ConvertFailure::Unconvertible));
        registry.put::<f64>(|raw| raw.parse().map_err(|_| ConvertFailure::Unconvertible));
        registry.put::<bool>(|raw| parse_bool(raw).ok_or(ConvertFailure::NotA("a boolean")));
        registry.put::<char>(|raw| {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ConvertFailure::NotA("a single character")),
            }
        });
        registry.put::<String>(|raw| Ok(raw.to_string()));
        registry.put::<PathBuf>(|raw| Ok(PathBuf::from(raw)));
        registry.put::<Url>(|raw| Url::parse(raw).map_err(|_| ConvertFailure::Unconvertible));
        registry.put::<IpAddr>(|raw| raw.parse().map_err(|_| ConvertFailure::Unconvertible));
        registry.put::<Regex>(|raw| Regex::new(raw).map_err(|_| ConvertFailure::Unconvertible));
        registry
            .put::<Uuid>(|raw| Uuid::parse_str(raw).map_err(|_| ConvertFailure::Unconvertible));
        registry.put::<NaiveDate>(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ConvertFailure::NotA("a yyyy-MM-dd date"))
        });
        registry.put::<NaiveTime>(|raw| {
            // Accepted in priority order; any other shape is rejected.
            for format in ["%H:%M", "%H:%M:%S", "%H:%M:%S%.3f", "%H:%M:%S,%3f"] {
                if let Ok(time) = NaiveTime::parse_from_str(raw, format) {
                    return Ok(time);
                }
            }
            Err(ConvertFailure::NotA("a HH:mm[:ss[.SSS]] time"))
        });

        registry
    }

    pub(crate) fn set_case_insensitive_enums(&mut self, fold: bool) {
        self.case_insensitive_enums = fold;
    }

    fn put<T: Any>(
        &mut self,
        convert: impl Fn(&str) -> Result<T, ConvertFailure> + Send + Sync + 'static,
    ) {
        self.table.insert(
            TypeId::of::<T>(),
            Box::new(move |raw| convert(raw).map(|value| Box::new(value) as Value)),
        );
    }

    /// Register a conversion for the type `T`, replacing any previous one.
    pub fn register<T: Any>(
        &mut self,
        convert: impl Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    ) {
        self.put::<T>(move |raw| convert(raw).map_err(|_| ConvertFailure::Unconvertible));
    }

    /// Register an enum type by its `(name, value)` pairs. Names match
    /// exactly, or case-insensitively when the command model says so.
    pub fn register_enum<T: Any + Clone + Send + Sync>(&mut self, variants: &[(&'static str, T)]) {
        let table: Vec<(&'static str, T)> = variants.to_vec();
        let fold = self.case_insensitive_enums;

        self.put::<T>(move |raw| {
            for (name, value) in &table {
                let hit = if fold {
                    name.eq_ignore_ascii_case(raw)
                } else {
                    *name == raw
                };

                if hit {
                    return Ok(value.clone());
                }
            }

            Err(ConvertFailure::Unconvertible)
        });
    }

    pub(crate) fn contains(&self, ty: Ty) -> bool {
        self.table.contains_key(&ty.id())
    }

    pub(crate) fn convert(&self, ty: Ty, raw: &str) -> Option<Result<Value, ConvertFailure>> {
        self.table.get(&ty.id()).map(|convert| convert(raw))
    }
}

/// Case-insensitive `true`/`false`; anything else is not a boolean.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// Decimal, hex (0x/0X prefix) and octal (leading zero), with optional sign.
fn decode_integer(raw: &str) -> Option<i128> {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() {
        return None;
    }

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

macro_rules! integer_converter {
    ($registry:expr, $($t:ty),*) => {$(
        $registry.put::<$t>(|raw| {
            decode_integer(raw)
                .and_then(|wide| <$t>::try_from(wide).ok())
                .ok_or(ConvertFailure::Unconvertible)
        });
    )*};
}

fn integers(registry: &mut ConverterRegistry) {
    integer_converter!(registry, i8, i16, i32, i64, i128, u8, u16, u32, u64, usize, isize);
}
