pub(crate) const DEFAULT_SEPARATOR: &str = "=";
pub(crate) const DEFAULT_PROGRAM_NAME: &str = "<main class>";
pub(crate) const LABEL_SEPARATOR: &str = " ";

// The option-details table is 80 columns wide overall.
pub(crate) const TABLE_WIDTH: usize = 80;
pub(crate) const DEFAULT_WRAP_INDENT: usize = 2;
