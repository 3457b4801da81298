//! Table rendering on top of comfy-table

use comfy_table::{ContentArrangement, Table as ComfyTable, presets::UTF8_FULL};
use std::fmt;

/// A rendered table
pub struct Table {
    inner: ComfyTable,
}

impl Table {
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// Two-column key/value table.
    pub fn key_value<K, V, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: fmt::Display,
        V: fmt::Display,
    {
        let mut builder = TableBuilder::new().header(["Field", "Value"]);
        for (key, value) in rows {
            builder = builder.row([key.to_string(), value.to_string()]);
        }
        builder.build()
    }

    pub fn print(&self) {
        println!("{}", self.inner);
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Builder for [`Table`]
pub struct TableBuilder {
    inner: ComfyTable,
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut inner = ComfyTable::new();
        inner
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { inner }
    }

    pub fn header<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .set_header(columns.into_iter().map(Into::into).collect::<Vec<String>>());
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .add_row(cells.into_iter().map(Into::into).collect::<Vec<String>>());
        self
    }

    pub fn build(self) -> Table {
        Table { inner: self.inner }
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
