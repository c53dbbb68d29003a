//! Dynamic WHERE-clause builder for list queries.

use rusqlite::types::Value as SqlValue;
use toolreg_core::store::DEFAULT_LIST_LIMIT;

use crate::encode::select_columns;

/// Accumulates conditions and their positional parameters.
#[derive(Debug, Default)]
pub struct Filter {
  conds:  Vec<String>,
  params: Vec<SqlValue>,
}

impl Filter {
  fn bind(&mut self, value: SqlValue) -> usize {
    self.params.push(value);
    self.params.len()
  }

  /// `column = value`.
  pub fn eq(&mut self, column: &str, value: impl Into<SqlValue>) {
    let n = self.bind(value.into());
    self.conds.push(format!("{column} = ?{n}"));
  }

  /// The JSON `tags` array of `table` contains `tag`.
  pub fn has_tag(&mut self, table: &str, tag: &str) {
    let n = self.bind(tag.to_owned().into());
    self.conds.push(format!(
      "EXISTS (SELECT 1 FROM json_each({table}.tags) WHERE json_each.value = ?{n})"
    ));
  }

  /// Finish into a `SELECT` over `table`, ordered by id, with paging.
  pub fn into_select(
    mut self,
    table: &str,
    fields: &[&str],
    limit: Option<usize>,
    offset: Option<usize>,
  ) -> (String, Vec<SqlValue>) {
    let where_clause = if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    };
    let limit_n = self.bind(to_i64(limit.unwrap_or(DEFAULT_LIST_LIMIT)).into());
    let offset_n = self.bind(to_i64(offset.unwrap_or(0)).into());

    let sql = format!(
      "SELECT {} FROM {table} {where_clause} ORDER BY id LIMIT ?{limit_n} OFFSET ?{offset_n}",
      select_columns(fields)
    );
    (sql, self.params)
  }
}

fn to_i64(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_filter_only_pages() {
    let (sql, params) = Filter::default().into_select("tools", &["name"], None, None);
    assert_eq!(sql, "SELECT id, name FROM tools  ORDER BY id LIMIT ?1 OFFSET ?2");
    assert_eq!(params, vec![SqlValue::Integer(100), SqlValue::Integer(0)]);
  }

  #[test]
  fn conditions_are_numbered_in_order() {
    let mut f = Filter::default();
    f.eq("category", "search".to_owned());
    f.has_tag("tools", "web");
    let (sql, params) = f.into_select("tools", &["name"], Some(5), Some(10));

    assert!(sql.contains("WHERE category = ?1 AND EXISTS"));
    assert!(sql.contains("json_each.value = ?2"));
    assert!(sql.ends_with("LIMIT ?3 OFFSET ?4"));
    assert_eq!(params.len(), 4);
    assert_eq!(params[2], SqlValue::Integer(5));
  }
}
