pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{diagnostic, error, header, section, success, summary_row, warn};
pub use table::{BindingRow, TableBuilder, binding_rows, bindings_table, diagnostics_table};
pub use theme::{theme, Theme};
