use super::types::SortDirection;

/// ORDER BY over source-declared columns, with a unique tiebreaker so pages are stable
#[derive(Debug, Clone)]
pub struct FilterOrder {
    keys: Vec<(&'static str, SortDirection)>,
}

impl FilterOrder {
    pub fn by(column: &'static str, direction: SortDirection) -> Self {
        Self { keys: vec![(column, direction)] }
    }

    pub fn desc(column: &'static str) -> Self {
        Self::by(column, SortDirection::Desc)
    }

    pub fn asc(column: &'static str) -> Self {
        Self::by(column, SortDirection::Asc)
    }

    pub fn then(mut self, column: &'static str, direction: SortDirection) -> Self {
        self.keys.push((column, direction));
        self
    }

    pub fn to_sql(&self) -> String {
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|(column, direction)| format!("{} {}", column, direction.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
