use super::types::SqlParam;
use crate::policy::BranchScope;

/// Accumulates AND-ed predicates with `$n` placeholders.
///
/// Column names are `&'static str` so only identifiers written in the source can
/// reach the SQL text; every caller-supplied value is bound as a parameter.
#[derive(Debug, Clone, Default)]
pub struct FilterWhere {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a value and return its placeholder
    pub fn param(&mut self, value: impl Into<SqlParam>) -> String {
        self.params.push(value.into());
        format!("${}", self.params.len())
    }

    pub fn eq(&mut self, column: &'static str, value: impl Into<SqlParam>) -> &mut Self {
        let placeholder = self.param(value);
        self.conditions.push(format!("{} = {}", column, placeholder));
        self
    }

    pub fn eq_opt<T: Into<SqlParam>>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.eq(column, value);
        }
        self
    }

    /// Restricts to one branch unless the scope is global
    pub fn scope(&mut self, column: &'static str, scope: &BranchScope) -> &mut Self {
        self.eq_opt(column, scope.branch_id())
    }

    /// Case-insensitive substring match against any of `columns`
    pub fn contains_any(&mut self, columns: &[&'static str], needle: Option<&str>) -> &mut Self {
        let needle = match needle.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => return self,
        };
        let placeholder = self.param(format!("%{}%", escape_like(needle)));
        let alternatives: Vec<String> = columns
            .iter()
            .map(|column| format!("{} ILIKE {}", column, placeholder))
            .collect();
        self.conditions.push(if alternatives.len() == 1 {
            alternatives.join("")
        } else {
            format!("({})", alternatives.join(" OR "))
        });
        self
    }

    /// Inclusive range
    pub fn between(&mut self, column: &'static str, from: impl Into<SqlParam>, to: impl Into<SqlParam>) -> &mut Self {
        let low = self.param(from);
        let high = self.param(to);
        self.conditions.push(format!("{} BETWEEN {} AND {}", column, low, high));
        self
    }

    /// A fixed predicate with no parameters
    pub fn condition(&mut self, sql: &'static str) -> &mut Self {
        self.conditions.push(sql.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// `WHERE ...`, or an empty string when there are no predicates
    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where() {
        let filter = FilterWhere::new();
        assert_eq!(filter.to_sql(), "");
        assert!(filter.params().is_empty());
    }

    #[test]
    fn numbers_placeholders_in_order() {
        let mut filter = FilterWhere::new();
        filter
            .scope("s.branch_id", &BranchScope::Branch(3))
            .eq_opt::<i64>("e.class_id", None)
            .contains_any(&["s.first_name", "s.last_name"], Some(" ann "))
            .eq("s.is_active", true);

        assert_eq!(
            filter.to_sql(),
            "WHERE s.branch_id = $1 AND (s.first_name ILIKE $2 OR s.last_name ILIKE $2) AND s.is_active = $3"
        );
        assert_eq!(
            filter.params(),
            &[SqlParam::Int(3), SqlParam::Text("%ann%".to_string()), SqlParam::Bool(true)]
        );
    }

    #[test]
    fn global_scope_adds_nothing() {
        let mut filter = FilterWhere::new();
        filter.scope("p.branch_id", &BranchScope::All);
        assert!(filter.is_empty());
    }

    #[test]
    fn like_wildcards_in_input_are_literal() {
        let mut filter = FilterWhere::new();
        filter.contains_any(&["c.room_number"], Some("10%_a"));
        assert_eq!(filter.to_sql(), "WHERE c.room_number ILIKE $1");
        assert_eq!(filter.params(), &[SqlParam::Text("%10\\%\\_a%".to_string())]);
    }

    #[test]
    fn blank_needle_is_ignored() {
        let mut filter = FilterWhere::new();
        filter.contains_any(&["s.first_name"], Some("   "));
        assert!(filter.is_empty());
    }
}
