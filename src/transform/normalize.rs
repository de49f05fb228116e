//! Column name normalization.

use std::collections::HashSet;

use tracing::warn;

use crate::types::Table;

/// Rewrite a column name into canonical form.
///
/// Lower-cases, turns whitespace runs into `_`, drops every character outside
/// `[a-z0-9_]`, collapses repeated underscores and trims underscores from both ends.
/// Normalizing an already-normalized name returns it unchanged.
///
/// ```rust
/// use tabular_transform::transform::normalize_name;
///
/// assert_eq!(normalize_name("Unit Price ($)"), "unit_price");
/// assert_eq!(normalize_name("  Order   ID "), "order_id");
/// assert_eq!(normalize_name("order_id"), "order_id");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for ch in out.chars() {
        if ch == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(ch);
    }
    collapsed.trim_matches('_').to_string()
}

/// Normalize every column name of `table`.
///
/// Names that normalize to nothing become `column_<position>` (1-based). When two columns
/// end up with the same name, later ones get `_2`, `_3`, ... appended in column order.
/// Rows and values are untouched.
pub fn normalize_columns(table: Table) -> Table {
    let mut seen: HashSet<String> = HashSet::with_capacity(table.column_count());
    let columns = table
        .into_columns()
        .into_iter()
        .enumerate()
        .map(|(idx, mut column)| {
            let mut base = normalize_name(&column.name);
            if base.is_empty() {
                base = format!("column_{}", idx + 1);
            }
            let name = unique_name(&base, &seen);
            if name != base {
                warn!(original = %column.name, normalized = %base, renamed = %name, "column name collision after normalization");
            }
            seen.insert(name.clone());
            column.name = name;
            column
        })
        .collect();
    Table::from_columns_unchecked(columns)
}

/// `base` if unused, otherwise the first free `base_<n>` with `n >= 2`.
pub(crate) fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
