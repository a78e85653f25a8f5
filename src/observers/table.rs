//! Table observer for pretty-printing accumulators.
//!
//! This module provides [`TableObserver`], which renders a collection of
//! [`Observable`] accumulators as a formatted ASCII table using the
//! `tabled` crate.
//!
//! # Feature flag
//!
//! Requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Examples
//!
//! Standard format (one row per metric):
//!
//! ```rust,ignore
//! use sommatori::adders::long_adder::LongAdder;
//! use sommatori::adders::Observable;
//! use sommatori::observers::table::{TableObserver, TableStyle};
//!
//! let requests = LongAdder::new().with_name("requests");
//! let errors = LongAdder::new().with_name("errors");
//!
//! requests.add(1000);
//! errors.add(5);
//!
//! let counters: Vec<&dyn Observable> = vec![&requests, &errors];
//!
//! let observer = TableObserver::new().with_style(TableStyle::Rounded);
//! println!("{}", observer.render(counters.into_iter()));
//! // ╭──────────┬────────┬───────╮
//! // │ Name     │ Labels │ Value │
//! // ├──────────┼────────┼───────┤
//! // │ requests │        │ 1000  │
//! // │ errors   │        │ 5     │
//! // ╰──────────┴────────┴───────╯
//! ```
//!
//! Compact format (multi-column grid of `name: value` cells):
//!
//! ```rust,ignore
//! use sommatori::observers::table::TableObserver;
//!
//! let observer = TableObserver::new().compact(true).columns(3);
//! println!("{}", observer.render(counters.into_iter()));
//! ```

use crate::adders::Observable;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// Extended ASCII characters
    Extended,
    /// GitHub-flavored Markdown table
    Markdown,
    /// ReStructuredText table
    ReStructuredText,
    /// Dots for borders
    Dots,
    /// No borders, just spacing
    Blank,
}

/// Separator between name and value in compact mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompactSeparator {
    /// Colon separator: "name: value"
    #[default]
    Colon,
    /// Equals separator: "name = value"
    Equals,
    /// Pipe separator: "name | value"
    Pipe,
    /// No separator, just space: "name value"
    Space,
}

impl CompactSeparator {
    /// Returns the separator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompactSeparator::Colon => ": ",
            CompactSeparator::Equals => " = ",
            CompactSeparator::Pipe => " | ",
            CompactSeparator::Space => " ",
        }
    }
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row (only in non-compact mode).
    pub show_header: bool,
    /// Optional title printed above the table.
    pub title: Option<String>,
    /// Whether to use compact format (name: value cells in a grid).
    pub compact: bool,
    /// Number of columns in compact mode (default: 1).
    pub columns: usize,
    /// Separator between name and value in compact mode.
    pub separator: CompactSeparator,
    /// Placeholder for empty cells in compact mode.
    pub empty_cell: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
            compact: false,
            columns: 1,
            separator: CompactSeparator::default(),
            empty_cell: String::new(),
        }
    }
}

/// Internal row representation for tabled (standard mode).
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Labels")]
    labels: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// An observer that renders accumulators as a formatted ASCII table.
///
/// Supports two rendering modes:
///
/// 1. **Standard mode**: one row per metric with Name, Labels and Value
///    columns
/// 2. **Compact mode**: multi-column grid of `name: value` cells
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    ///
    /// Default style is [`TableStyle::Rounded`] in standard (non-compact)
    /// mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row (standard mode only).
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets an optional title for the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// Enables or disables compact mode.
    pub fn compact(mut self, enabled: bool) -> Self {
        self.config.compact = enabled;
        self
    }

    /// Sets the number of columns in compact mode.
    ///
    /// Default is 1. Values less than 1 are treated as 1.
    pub fn columns(mut self, count: usize) -> Self {
        self.config.columns = count.max(1);
        self
    }

    /// Sets the separator between name and value in compact mode.
    pub fn separator(mut self, sep: CompactSeparator) -> Self {
        self.config.separator = sep;
        self
    }

    /// Sets the placeholder text for empty cells in compact mode.
    pub fn empty_cell(mut self, placeholder: impl Into<String>) -> Self {
        self.config.empty_cell = placeholder.into();
        self
    }

    /// Applies the configured style to a table.
    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Extended => {
                table.with(Style::extended());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::ReStructuredText => {
                table.with(Style::re_structured_text());
            }
            TableStyle::Dots => {
                table.with(Style::dots());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    /// Renders accumulators in compact mode (grid layout).
    fn render_compact<'a>(&self, counters: impl Iterator<Item = &'a dyn Observable>) -> String {
        let cells: Vec<String> = counters
            .flat_map(|c| c.expand())
            .map(|entry| {
                let name = if entry.name.is_empty() {
                    "(unnamed)".to_string()
                } else {
                    match entry.label {
                        None => entry.name.to_string(),
                        Some((k, v)) => format!("{}{{{}={}}}", entry.name, k, v),
                    }
                };
                format!("{}{}{}", name, self.config.separator.as_str(), entry.value)
            })
            .collect();

        if cells.is_empty() {
            return String::new();
        }

        let cols = self.config.columns;
        let mut builder = Builder::default();

        for chunk in cells.chunks(cols) {
            let mut row: Vec<String> = chunk.to_vec();
            // Pad the last row with empty cells.
            while row.len() < cols {
                row.push(self.config.empty_cell.clone());
            }
            builder.push_record(row);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);

        if let Some(ref title) = self.config.title {
            format!("{}\n{}", title, table)
        } else {
            table.to_string()
        }
    }

    /// Renders accumulators in standard mode (three-column table).
    fn render_standard<'a>(&self, counters: impl Iterator<Item = &'a dyn Observable>) -> String {
        let rows: Vec<MetricRow> = counters
            .flat_map(|c| c.expand())
            .map(|entry| MetricRow {
                name: if entry.name.is_empty() {
                    "(unnamed)".to_string()
                } else {
                    entry.name.to_string()
                },
                labels: match entry.label {
                    None => String::new(),
                    Some((k, v)) => format!("{}={}", k, v),
                },
                value: entry.value.to_string(),
            })
            .collect();

        let mut table = Table::new(&rows);
        self.apply_style(&mut table);

        if !self.config.show_header {
            table.with(tabled::settings::Remove::row(
                tabled::settings::object::Rows::first(),
            ));
        }

        if let Some(ref title) = self.config.title {
            format!("{}\n{}", title, table)
        } else {
            table.to_string()
        }
    }

    /// Renders the accumulators as a formatted table string.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use sommatori::adders::long_adder::LongAdder;
    /// use sommatori::adders::Observable;
    /// use sommatori::observers::table::TableObserver;
    ///
    /// let requests = LongAdder::new().with_name("requests");
    /// requests.add(100);
    ///
    /// let counters: Vec<&dyn Observable> = vec![&requests];
    /// let table = TableObserver::new().render(counters.into_iter());
    /// ```
    pub fn render<'a>(&self, counters: impl Iterator<Item = &'a dyn Observable>) -> String {
        if self.config.compact {
            self.render_compact(counters)
        } else {
            self.render_standard(counters)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Labeled;
    use crate::adders::double_adder::DoubleAdder;
    use crate::adders::long_accumulator::LongAccumulator;
    use crate::adders::long_adder::LongAdder;

    #[test]
    fn test_render_empty() {
        let observer = TableObserver::new();
        let counters: Vec<&dyn Observable> = vec![];
        let output = observer.render(counters.into_iter());
        assert!(!output.is_empty());
    }

    #[test]
    fn test_render_empty_compact() {
        let observer = TableObserver::new().compact(true).columns(3);
        let counters: Vec<&dyn Observable> = vec![];
        let output = observer.render(counters.into_iter());
        assert!(output.is_empty());
    }

    #[test]
    fn test_render_single_counter() {
        let counter = LongAdder::new().with_name("test_counter");
        counter.add(42);

        let observer = TableObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter());

        assert!(output.contains("test_counter"));
        assert!(output.contains("42"));
    }

    #[test]
    fn test_render_compact_single() {
        let counter = LongAdder::new().with_name("requests");
        counter.add(100);

        let observer = TableObserver::new().compact(true);
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter());

        assert!(output.contains("requests: 100"));
    }

    #[test]
    fn test_render_compact_separators() {
        let counter = LongAdder::new().with_name("test");
        counter.add(42);
        let counters: Vec<&dyn Observable> = vec![&counter];

        let observer = TableObserver::new()
            .compact(true)
            .separator(CompactSeparator::Equals);
        assert!(observer.render(counters.iter().copied()).contains("test = 42"));

        let observer = TableObserver::new()
            .compact(true)
            .separator(CompactSeparator::Pipe);
        assert!(observer.render(counters.iter().copied()).contains("test | 42"));
    }

    #[test]
    fn test_render_mixed_flavors() {
        let requests = LongAdder::new().with_name("requests");
        let seconds = DoubleAdder::new().with_name("busy_seconds");
        let peak = LongAccumulator::new(i64::max, i64::MIN).with_name("peak");

        requests.add(1000);
        seconds.add(1.5);
        peak.accumulate(77);

        let observer = TableObserver::new();
        let counters: Vec<&dyn Observable> = vec![&requests, &seconds, &peak];
        let output = observer.render(counters.into_iter());

        assert!(output.contains("requests"));
        assert!(output.contains("1000"));
        assert!(output.contains("busy_seconds"));
        assert!(output.contains("1.5"));
        assert!(output.contains("peak"));
        assert!(output.contains("77"));
    }

    #[test]
    fn test_render_labeled() {
        let counter =
            Labeled::new(LongAdder::new().with_name("reqs")).with_label("method", "GET");
        counter.add(5);

        let observer = TableObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter());

        assert!(output.contains("method=GET"));
    }

    #[test]
    fn test_render_with_styles() {
        let counter = LongAdder::new().with_name("test");
        counter.add(1);
        let counters: Vec<&dyn Observable> = vec![&counter];

        let styles = [
            TableStyle::Ascii,
            TableStyle::Rounded,
            TableStyle::Sharp,
            TableStyle::Modern,
            TableStyle::Markdown,
            TableStyle::Blank,
        ];

        for style in styles {
            let observer = TableObserver::new().with_style(style);
            let output = observer.render(counters.iter().copied());
            assert!(!output.is_empty());
        }
    }

    #[test]
    fn test_render_with_title() {
        let counter = LongAdder::new().with_name("metric");
        counter.add(123);

        let observer = TableObserver::new().with_title("My Metrics");
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter());

        assert!(output.starts_with("My Metrics"));
        assert!(output.contains("123"));
    }

    #[test]
    fn test_render_unnamed() {
        let counter = LongAdder::new();
        counter.add(99);

        let observer = TableObserver::new();
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter());

        assert!(output.contains("(unnamed)"));
        assert!(output.contains("99"));
    }

    #[test]
    fn test_render_without_header() {
        let counter = LongAdder::new().with_name("test");
        counter.add(42);

        let observer = TableObserver::new().with_header(false);
        let counters: Vec<&dyn Observable> = vec![&counter];
        let output = observer.render(counters.into_iter());

        assert!(!output.contains("Name"));
        assert!(!output.contains("Value"));
        assert!(output.contains("test"));
    }

    #[test]
    fn test_compact_empty_cell_placeholder() {
        let c1 = LongAdder::new().with_name("a");
        let c2 = LongAdder::new().with_name("b");
        c1.add(1);
        c2.add(2);

        let observer = TableObserver::new().compact(true).columns(3).empty_cell("-");
        let counters: Vec<&dyn Observable> = vec![&c1, &c2];
        let output = observer.render(counters.into_iter());

        assert!(output.contains("a: 1"));
        assert!(output.contains("b: 2"));
        assert!(output.contains('-'));
    }

    #[test]
    fn test_columns_min_value() {
        let observer = TableObserver::new().columns(0);
        assert_eq!(observer.config.columns, 1);
    }
}
