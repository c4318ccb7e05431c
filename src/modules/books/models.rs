use folio_db::{EntityId, Order, OrderBy, Status, UserId};
use serde::{Deserialize, Serialize};

/// A book as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct BookData {
    pub id: EntityId,
    /// Creation time, UTC.
    pub date: String,
    pub slug: String,
    pub status: Status,
    /// Display title.
    pub title: String,
    /// Content after the output filter chain.
    pub content: String,
    pub author: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub href: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub embeddable: bool,
}

impl Link {
    pub fn new(href: String) -> Self {
        Self {
            href,
            embeddable: false,
        }
    }

    pub fn embeddable(href: String) -> Self {
        Self {
            href,
            embeddable: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookLinks {
    #[serde(rename = "self")]
    pub self_link: Vec<Link>,
    pub collection: Vec<Link>,
    pub author: Vec<Link>,
}

/// Single-item response: the book plus its link relations.
#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub data: BookData,
    #[serde(rename = "_links")]
    pub links: BookLinks,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedBook {
    pub deleted: bool,
    pub previous: BookData,
}

/// Validated collection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListArgs {
    pub page: u64,
    pub per_page: u64,
    #[serde(default)]
    pub search: Option<String>,
    pub orderby: String,
    pub order: String,
}

impl ListArgs {
    pub fn order_by(&self) -> OrderBy {
        OrderBy::parse(&self.orderby).unwrap_or_default()
    }

    pub fn order(&self) -> Order {
        Order::parse(&self.order).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateArgs {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArgs {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteArgs {
    pub force: bool,
}
