//! Line-item table parser.
//!
//! Turns an HTML `<table>` into rows of semantically tagged fields. Column
//! identification is heuristic: every header cell is upper-cased and
//! checked against [`HEADER_RULES`] in order; the first rule with a keyword
//! contained in the header decides the column's [`ColumnRole`]. Headers
//! that match no rule are ignored.
//!
//! The parser never fails. Short rows are padded with empty strings, extra
//! cells are dropped, and rows without any `<td>` are skipped.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Semantic meaning of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Description or item name.
    Product,
    Quantity,
    Unit,
    UnitPrice,
    /// Line subtotal.
    Importe,
}

/// Ordered `(role, keywords)` rules. Order matters: `PRECIO UNITARIO`
/// must resolve to [`ColumnRole::UnitPrice`] before `UNIT` can claim it
/// as a unit column, and an `IMPORTE` column stays a subtotal even when
/// its header also mentions a price.
pub const HEADER_RULES: &[(ColumnRole, &[&str])] = &[
    (ColumnRole::Importe, &["IMPORTE", "SUBTOTAL", "IMP"]),
    (ColumnRole::Quantity, &["CANT"]),
    (ColumnRole::UnitPrice, &["P.V.", "PVU", "PRECIO", "UNITARIO"]),
    (ColumnRole::Unit, &["UNID", "UNIT"]),
    (ColumnRole::Product, &["PRODUCT", "DESCRIP", "ITEM"]),
];

/// Classify one header cell.
pub fn classify_header(header: &str) -> Option<ColumnRole> {
    let upper = header.to_uppercase();
    HEADER_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| upper.contains(k)))
        .map(|(role, _)| *role)
}

/// One data row. A field is `None` when the table has no column with that
/// role, and `Some("")` when the column exists but the row has no cell
/// for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItemRow {
    pub product: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<String>,
    pub importe: Option<String>,
}

impl LineItemRow {
    fn set(&mut self, role: ColumnRole, value: String) {
        let slot = match role {
            ColumnRole::Product => &mut self.product,
            ColumnRole::Quantity => &mut self.quantity,
            ColumnRole::Unit => &mut self.unit,
            ColumnRole::UnitPrice => &mut self.unit_price,
            ColumnRole::Importe => &mut self.importe,
        };
        *slot = Some(value);
    }
}

/// A parsed table: the role of each header column plus its data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItemTable {
    pub roles: Vec<Option<ColumnRole>>,
    pub rows: Vec<LineItemRow>,
}

impl LineItemTable {
    /// Does any header column carry `role`?
    pub fn has_role(&self, role: ColumnRole) -> bool {
        self.roles.contains(&Some(role))
    }
}

/// Parse every `<table>` of a document, in document order.
pub fn parse_tables(doc: &Html) -> Vec<LineItemTable> {
    let table_sel = Selector::parse("table").expect("static selector");
    doc.select(&table_sel).map(parse_table).collect()
}

/// Parse a single table element.
///
/// Headers are the table's `<th>` cells. A table without any `<th>` uses
/// the cells of its first row as headers instead, and that row is not
/// treated as data.
pub fn parse_table(table: ElementRef<'_>) -> LineItemTable {
    let tr_sel = Selector::parse("tr").expect("static selector");
    let th_sel = Selector::parse("th").expect("static selector");
    let td_sel = Selector::parse("td").expect("static selector");

    let mut headers: Vec<String> = table.select(&th_sel).map(cell_text).collect();
    let mut rows_iter = table.select(&tr_sel);

    if headers.is_empty() {
        if let Some(first) = rows_iter.next() {
            headers = first.select(&td_sel).map(cell_text).collect();
        }
    }

    let roles: Vec<Option<ColumnRole>> = headers.iter().map(|h| classify_header(h)).collect();

    let mut rows = Vec::new();
    for tr in rows_iter {
        let cells: Vec<String> = tr.select(&td_sel).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }
        let mut row = LineItemRow::default();
        for (i, role) in roles.iter().enumerate() {
            if let Some(role) = role {
                row.set(*role, cells.get(i).cloned().unwrap_or_default());
            }
        }
        rows.push(row);
    }

    debug!(
        "Parsed table: {} header columns, {} data rows",
        headers.len(),
        rows.len()
    );
    LineItemTable { roles, rows }
}

/// Visible text of a cell, whitespace-normalised.
pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
