//! Results table scraping.
//!
//! The portal's result page is not an API: layouts drift, cells go missing and
//! there are two table variants (a desktop-only table and the main table).
//! Everything here degrades to "fewer records" instead of failing.

use std::sync::LazyLock;

use portal_logging::{portal_debug, portal_warn};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::ResultRecord;

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("row pattern compiles"));
static CELL_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<td\b[^>]*>").expect("cell pattern compiles"));
static PDF_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']*pdf[^"']*)["']"#).expect("pdf link pattern compiles")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[^;]+;").expect("entity pattern compiles"));
static TABLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)table\b[^>]*>").expect("table pattern compiles"));
static HEADER_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<th\b").expect("header cell pattern compiles"));
static ALL_TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector parses"));

/// Meaning of a data cell, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    /// Cell holding the PDF link; its text is discarded.
    Link,
    Order,
    License,
    Transmitted,
}

/// Column order of a result row. The portal's markup is the only contract, so
/// a layout change upstream is fixed here and nowhere else.
pub const ROW_LAYOUT: [RowField; 4] = [
    RowField::Link,
    RowField::Order,
    RowField::License,
    RowField::Transmitted,
];

/// One way of finding the results table in a page.
pub trait TableLocator: Send + Sync {
    fn name(&self) -> &str;
    /// Markup of the table as it appears in `source`, if this strategy finds
    /// one. `document` is `source` already parsed.
    fn locate(&self, document: &Html, source: &str) -> Option<String>;
}

/// Finds the first table matching a CSS selector that holds data cells.
///
/// The selector is evaluated on the parsed document, but the returned markup
/// is cut from the source text so entities reach `clean_cell` undecoded.
#[derive(Debug)]
pub struct SelectorLocator {
    name: String,
    selector: Option<Selector>,
}

impl SelectorLocator {
    pub fn new(name: impl Into<String>, css: &str) -> Self {
        Self {
            name: name.into(),
            selector: Selector::parse(css).ok(),
        }
    }

    /// The desktop layout wraps results in a "large-only" table.
    pub fn desktop() -> Self {
        Self::new("desktop", "table.large-only, .large-only table")
    }

    pub fn main_table() -> Self {
        Self::new("main", "table")
    }
}

impl TableLocator for SelectorLocator {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, document: &Html, source: &str) -> Option<String> {
        let selector = self.selector.as_ref()?;
        let matched: Vec<_> = document.select(selector).map(|element| element.id()).collect();
        if matched.is_empty() {
            return None;
        }
        document
            .select(&ALL_TABLES)
            .enumerate()
            .filter(|(_, table)| matched.contains(&table.id()))
            .filter_map(|(index, _)| source_table(source, index))
            .find(|markup| CELL_START_RE.is_match(markup))
            .map(str::to_string)
    }
}

/// The `index`-th table of `source` in document order, nested tables included.
/// An unclosed table runs to the end of the source.
fn source_table(source: &str, index: usize) -> Option<&str> {
    let mut opened = 0;
    let mut start = None;
    let mut depth = 0usize;
    for tag in TABLE_TAG_RE.captures_iter(source) {
        let whole = tag.get(0)?;
        let closing = tag.get(1).is_some_and(|m| !m.as_str().is_empty());
        match (start, closing) {
            (None, false) => {
                if opened == index {
                    start = Some(whole.start());
                    depth = 1;
                }
                opened += 1;
            }
            (None, true) => {}
            (Some(_), false) => depth += 1,
            (Some(begin), true) => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[begin..whole.end()]);
                }
            }
        }
    }
    start.map(|begin| &source[begin..])
}

/// Diagnostics for one parse; never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Name of the locator that found the table, `None` when no table matched.
    pub table: Option<String>,
    pub rows_seen: usize,
    pub rows_skipped: usize,
    pub records: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResults {
    pub records: Vec<ResultRecord>,
    pub report: ParseReport,
}

pub struct ResultParser {
    base_url: String,
    locators: Vec<Box<dyn TableLocator>>,
}

impl ResultParser {
    /// Parser with the default chain: desktop table, then main table.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_locators(
            base_url,
            vec![
                Box::new(SelectorLocator::desktop()),
                Box::new(SelectorLocator::main_table()),
            ],
        )
    }

    /// Locators are tried in order; the first one that finds a table wins.
    pub fn with_locators(base_url: impl Into<String>, locators: Vec<Box<dyn TableLocator>>) -> Self {
        Self {
            base_url: base_url.into(),
            locators,
        }
    }

    pub fn parse(&self, html: &str) -> ParsedResults {
        let document = Html::parse_document(html);
        let mut report = ParseReport::default();

        let Some((name, table)) = self
            .locators
            .iter()
            .find_map(|locator| locator.locate(&document, html).map(|t| (locator.name(), t)))
        else {
            portal_warn!("No results table found in page ({} bytes)", html.len());
            return ParsedResults {
                records: Vec::new(),
                report,
            };
        };
        portal_debug!("Results table found by '{}' locator", name);
        report.table = Some(name.to_string());

        let mut records = Vec::new();
        for caps in ROW_RE.captures_iter(&table) {
            report.rows_seen += 1;
            let row = caps.get(1).map_or("", |m| m.as_str());
            match parse_row(row, &self.base_url) {
                Some(record) => records.push(record),
                None => report.rows_skipped += 1,
            }
        }

        report.records = records.len();
        portal_debug!(
            "Parsed {} records from {} rows ({} skipped)",
            report.records,
            report.rows_seen,
            report.rows_skipped
        );
        ParsedResults { records, report }
    }
}

/// Records from a results page using the default locator chain.
pub fn parse_results(base_url: &str, html: &str) -> Vec<ResultRecord> {
    ResultParser::new(base_url).parse(html).records
}

fn parse_row(row: &str, base_url: &str) -> Option<ResultRecord> {
    if HEADER_CELL_RE.is_match(row) || !CELL_START_RE.is_match(row) {
        return None;
    }

    let href = PDF_LINK_RE.captures(row)?.get(1)?.as_str();

    let cells: Vec<&str> = CELL_START_RE.split(row).skip(1).collect();
    if cells.len() < ROW_LAYOUT.len() {
        portal_debug!("Skipping row with {} cells", cells.len());
        return None;
    }

    let mut record = ResultRecord {
        order: String::new(),
        license: String::new(),
        transmitted: String::new(),
        pdf_url: resolve_link(base_url, href),
    };
    for (field, cell) in ROW_LAYOUT.iter().zip(&cells) {
        match field {
            RowField::Link => {}
            RowField::Order => record.order = clean_cell(cell),
            RowField::License => record.license = clean_cell(cell),
            RowField::Transmitted => record.transmitted = clean_cell(cell),
        }
    }

    let complete = !record.order.is_empty()
        && !record.license.is_empty()
        && !record.transmitted.is_empty()
        && !record.pdf_url.is_empty();
    complete.then_some(record)
}

/// Visible text of a cell: tags and character entities removed, trimmed.
pub fn clean_cell(cell: &str) -> String {
    let without_tags = TAG_RE.replace_all(cell, "");
    ENTITY_RE.replace_all(&without_tags, "").trim().to_string()
}

fn resolve_link(base_url: &str, href: &str) -> String {
    let href = href.trim().replace("&amp;", "&");
    if href.is_empty() {
        return String::new();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(&href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("{base_url}{href}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cell_strips_tags_and_entities() {
        assert_eq!(clean_cell("<b>LAB&nbsp;01</b></td>\n"), "LAB01");
        assert_eq!(clean_cell("  &nbsp; </td>"), "");
    }

    #[test]
    fn resolve_link_prefixes_portal_origin() {
        assert_eq!(
            resolve_link("https://portal.example", "/pdf/abc.pdf"),
            "https://portal.example/pdf/abc.pdf"
        );
        assert_eq!(
            resolve_link("https://portal.example", "/pdf?id=1&amp;t=2"),
            "https://portal.example/pdf?id=1&t=2"
        );
    }

    #[test]
    fn source_table_follows_nesting() {
        let source = "<p><table id=a><tr><td><TABLE id=b></TABLE></td></tr></table><table id=c></table>";
        assert_eq!(
            source_table(source, 0),
            Some("<table id=a><tr><td><TABLE id=b></TABLE></td></tr></table>")
        );
        assert_eq!(source_table(source, 1), Some("<TABLE id=b></TABLE>"));
        assert_eq!(source_table(source, 2), Some("<table id=c></table>"));
        assert_eq!(source_table(source, 3), None);
    }

    #[test]
    fn row_needs_every_layout_cell() {
        let row = r#"<td><a href="/pdf/a.pdf">PDF</a></td><td>1</td><td>LAB</td>"#;
        assert_eq!(parse_row(row, "https://portal.example"), None);
    }
}
