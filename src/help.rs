//! The help renderer: a column-oriented text layout engine plus the usage
//! synthesizer that drives it from a [`CommandModel`](crate::CommandModel).
mod render;
mod table;

pub use render::{Help, OptionSort, RowStyle};
pub use table::{Column, LayoutError, Overflow, TextTable};
