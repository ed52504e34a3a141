use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Pagination, SqlResult};
use crate::config::PaginationConfig;

/// Requested page window, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// Defaults to page 1 at the configured limit; limits above the maximum are capped
    pub fn from_query(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Result<Self, FilterError> {
        let page = match page.map(str::trim).filter(|s| !s.is_empty()) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(p) if p >= 1 => p,
                _ => return Err(FilterError::InvalidPage("page must be a positive integer".to_string())),
            },
        };

        let limit = match limit.map(str::trim).filter(|s| !s.is_empty()) {
            None => config.default_limit,
            Some(raw) => match raw.parse::<i64>() {
                Ok(l) if l >= 1 => l,
                _ => return Err(FilterError::InvalidLimit("limit must be a positive integer".to_string())),
            },
        };

        let limit = if limit > config.max_limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", limit, config.max_limit);
            config.max_limit
        } else {
            limit
        };

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn summarize(&self, total_records: i64) -> Pagination {
        Pagination {
            current_page: self.page,
            total_pages: (total_records + self.limit - 1) / self.limit,
            total_records,
            limit: self.limit,
        }
    }
}

/// A read query over fixed select/from text plus optional predicates and order
#[derive(Debug, Clone)]
pub struct Filter {
    select: &'static str,
    from: &'static str,
    conditions: FilterWhere,
    group_by: Option<&'static str>,
    order: Option<FilterOrder>,
}

impl Filter {
    pub fn new(select: &'static str, from: &'static str) -> Self {
        Self {
            select,
            from,
            conditions: FilterWhere::new(),
            group_by: None,
            order: None,
        }
    }

    pub fn conditions(&mut self) -> &mut FilterWhere {
        &mut self.conditions
    }

    pub fn order(mut self, order: FilterOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Aggregate queries only; the count query ignores grouping
    pub fn group_by(mut self, columns: &'static str) -> Self {
        self.group_by = Some(columns);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut query = format!("{} {}", self.select, self.from);
        push_clause(&mut query, &self.conditions.to_sql());
        if let Some(columns) = self.group_by {
            push_clause(&mut query, &format!("GROUP BY {}", columns));
        }
        if let Some(order) = &self.order {
            push_clause(&mut query, &order.to_sql());
        }
        SqlResult { query, params: self.conditions.params().to_vec() }
    }

    /// Same query restricted to one page; limit and offset are bound after the filter params
    pub fn to_page_sql(&self, page: &Page) -> SqlResult {
        let mut result = self.to_sql();
        let next = result.params.len();
        result.query.push_str(&format!(" LIMIT ${} OFFSET ${}", next + 1, next + 2));
        result.params.push(page.limit.into());
        result.params.push(page.offset().into());
        result
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let mut query = format!("SELECT COUNT(*) AS count {}", self.from);
        push_clause(&mut query, &self.conditions.to_sql());
        SqlResult { query, params: self.conditions.params().to_vec() }
    }
}

fn push_clause(query: &mut String, clause: &str) {
    if !clause.is_empty() {
        query.push(' ');
        query.push_str(clause);
    }
}
