use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderField {
    CreatedAt,
}

impl OrderField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Ordering requested from a live query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOrder {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl FeedOrder {
    pub fn newest_first() -> Self {
        Self {
            field: OrderField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }

    pub fn order_by_clause(&self) -> String {
        format!(
            "ORDER BY {col} {dir}, id {dir}",
            col = self.field.column(),
            dir = self.direction.keyword()
        )
    }
}

impl Default for FeedOrder {
    fn default() -> Self {
        Self::newest_first()
    }
}
