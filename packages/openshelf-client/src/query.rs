//! Declarative request builder for the PostgREST-style table interface.
//!
//! A [`PostgrestRequest`] is a pure description of one call: method, table
//! (or procedure) path, query-string predicates, `Prefer` directives and an
//! optional JSON body. Building one performs no I/O, which keeps the
//! filter-to-predicate translation testable without a live service.

use reqwest::Method;
use serde_json::Value;

/// One declarative request against the table interface.
#[derive(Debug, Clone)]
pub struct PostgrestRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) prefer: Vec<&'static str>,
    pub(crate) single: bool,
    pub(crate) body: Option<Value>,
}

impl PostgrestRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            prefer: Vec::new(),
            single: false,
            body: None,
        }
    }

    /// Read rows from a table.
    pub fn get(table: &str) -> Self {
        Self::new(Method::GET, table)
    }

    /// Insert a row.
    pub fn insert(table: &str, body: Value) -> Self {
        let mut req = Self::new(Method::POST, table);
        req.body = Some(body);
        req
    }

    /// Insert-or-update keyed by a unique constraint (see [`Self::on_conflict`]).
    pub fn upsert(table: &str, body: Value) -> Self {
        let mut req = Self::new(Method::POST, table);
        req.body = Some(body);
        req.prefer.push("resolution=merge-duplicates");
        req
    }

    /// Patch rows matched by the request's predicates.
    pub fn update(table: &str, body: Value) -> Self {
        let mut req = Self::new(Method::PATCH, table);
        req.body = Some(body);
        req
    }

    /// Delete rows matched by the request's predicates. Matching zero rows
    /// is a successful delete, not an error.
    pub fn delete(table: &str) -> Self {
        Self::new(Method::DELETE, table)
    }

    /// Invoke a named server-side procedure.
    pub fn rpc(function: &str, args: Value) -> Self {
        let mut req = Self::new(Method::POST, format!("rpc/{function}"));
        req.body = Some(args);
        req
    }

    /// Column projection, including foreign-key expansions such as
    /// `*,category:categories(id,name,color,icon)`.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    /// Equality predicate.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params
            .push((column.into(), format!("eq.{}", value.to_string())));
        self
    }

    /// Case-insensitive substring match over several columns, combined
    /// with OR. The term is wrapped in wildcards and quoted so reserved
    /// characters in user input cannot alter the predicate tree.
    pub fn or_ilike(mut self, columns: &[&str], term: &str) -> Self {
        let pattern = quote_logic_value(&format!("*{term}*"));
        let group = columns
            .iter()
            .map(|col| format!("{col}.ilike.{pattern}"))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push(("or".into(), format!("({group})")));
        self
    }

    /// Ascending order directive.
    pub fn order_asc(mut self, column: &str) -> Self {
        self.params.push(("order".into(), format!("{column}.asc")));
        self
    }

    /// Descending order directive.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.params.push(("order".into(), format!("{column}.desc")));
        self
    }

    /// Name the unique columns an upsert merges on.
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params.push(("on_conflict".into(), columns.into()));
        self
    }

    /// Expect exactly one row; zero rows surfaces as `NotFound`.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Ask the service to return the affected rows.
    pub fn returning(mut self) -> Self {
        self.prefer.push("return=representation");
        self
    }

    /// Query-string pairs in the order they were added.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The value of the `Prefer` header, if any directive is set.
    pub(crate) fn prefer_header(&self) -> Option<String> {
        if self.prefer.is_empty() {
            None
        } else {
            Some(self.prefer.join(","))
        }
    }
}

/// Quote a value for use inside a logic tree (`or=(...)`).
///
/// PostgREST splits logic trees on commas and parentheses, so any value
/// containing a reserved character must be double-quoted, with embedded
/// quotes and backslashes escaped.
fn quote_logic_value(value: &str) -> String {
    let reserved = value
        .chars()
        .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\'))
        || value.starts_with(' ')
        || value.ends_with(' ');
    if !reserved {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(req: &'a PostgrestRequest, key: &str) -> Option<&'a str> {
        req.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn get_with_predicates_renders_pairs_in_order() {
        let req = PostgrestRequest::get("categories")
            .select("*")
            .order_asc("name");
        assert_eq!(
            req.params(),
            &[
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "name.asc".to_string()),
            ]
        );
        assert_eq!(req.method, Method::GET);
    }

    #[test]
    fn eq_accepts_non_string_values() {
        let req = PostgrestRequest::get("resources")
            .eq("is_published", true)
            .eq("views_count", 10);
        assert_eq!(param(&req, "is_published"), Some("eq.true"));
        assert_eq!(param(&req, "views_count"), Some("eq.10"));
    }

    #[test]
    fn or_ilike_builds_one_group_over_all_columns() {
        let req =
            PostgrestRequest::get("resources").or_ilike(&["title", "description", "author"], "rust");
        assert_eq!(
            param(&req, "or"),
            Some("(title.ilike.*rust*,description.ilike.*rust*,author.ilike.*rust*)")
        );
    }

    #[test]
    fn or_ilike_quotes_reserved_characters() {
        let req = PostgrestRequest::get("resources").or_ilike(&["title"], "c, (not) \"plain\"");
        assert_eq!(
            param(&req, "or"),
            Some("(title.ilike.\"*c, (not) \\\"plain\\\"*\")")
        );
    }

    #[test]
    fn upsert_carries_merge_resolution_and_conflict_target() {
        let req = PostgrestRequest::upsert("user_progress", serde_json::json!({"a": 1}))
            .on_conflict("user_id,resource_id")
            .returning();
        assert_eq!(
            req.prefer_header().as_deref(),
            Some("resolution=merge-duplicates,return=representation")
        );
        assert_eq!(param(&req, "on_conflict"), Some("user_id,resource_id"));
    }

    #[test]
    fn rpc_targets_the_procedure_path() {
        let req = PostgrestRequest::rpc("increment_views", serde_json::json!({"resource_id": "x"}));
        assert_eq!(req.path, "rpc/increment_views");
        assert_eq!(req.method, Method::POST);
    }
}
