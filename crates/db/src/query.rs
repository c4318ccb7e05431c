use serde::Serialize;

/// Sort key for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    Date,
    Id,
    Title,
    Slug,
}

impl OrderBy {
    pub const ALL: [OrderBy; 4] = [OrderBy::Date, OrderBy::Id, OrderBy::Title, OrderBy::Slug];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::Date => "date",
            OrderBy::Id => "id",
            OrderBy::Title => "title",
            OrderBy::Slug => "slug",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Order::Asc),
            "desc" => Some(Order::Desc),
            _ => None,
        }
    }
}

/// Filter, ordering and window for a collection query.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub entity_type: String,
    pub search: Option<String>,
    pub order_by: OrderBy,
    pub order: Order,
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
}

impl EntityQuery {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            search: None,
            order_by: OrderBy::default(),
            order: Order::default(),
            page: 1,
            per_page: 10,
        }
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    pub fn order_by(mut self, order_by: OrderBy, order: Order) -> Self {
        self.order_by = order_by;
        self.order = order;
        self
    }

    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        self.page = page.max(1);
        self.per_page = per_page;
        self
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

/// A page of results with the size of the full match set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            total_pages,
        }
    }
}
