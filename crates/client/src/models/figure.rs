//! Catalog types: figures, filters and pagination.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tetranoma_core::{FigureId, Price, SortOrder, UserId};

/// A collectible figure listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Figure {
    #[serde(alias = "_id")]
    pub id: FigureId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Ids of users who favorited this figure. Never contains duplicates
    /// after a local toggle.
    #[serde(default)]
    pub favorites: Vec<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Figure {
    #[must_use]
    pub fn is_favorited_by(&self, user_id: &UserId) -> bool {
        self.favorites.contains(user_id)
    }

    /// Apply a confirmed favorite toggle for `user_id`.
    ///
    /// `is_favorite` is the server's answer, not a local guess. Adding is
    /// idempotent and removing drops every occurrence.
    pub fn apply_favorite(&mut self, user_id: &UserId, is_favorite: bool) {
        if is_favorite {
            if !self.is_favorited_by(user_id) {
                self.favorites.push(user_id.clone());
            }
        } else {
            self.favorites.retain(|id| id != user_id);
        }
    }
}

/// Paging cursor of the current listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Pagination before anything has been fetched.
    #[must_use]
    pub const fn first_page(items_per_page: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            total_items: 0,
            items_per_page,
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first_page(12)
    }
}

/// Active catalog filters. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureFilters {
    pub category: Option<String>,
    pub title: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub min_rating: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl FigureFilters {
    /// Query parameters for the set filters, in a stable order.
    #[must_use]
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(title) = &self.title {
            params.push(("title", title.clone()));
        }
        if let Some(min_price) = self.min_price {
            params.push(("minPrice", min_price.amount().to_string()));
        }
        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.amount().to_string()));
        }
        if let Some(min_rating) = self.min_rating {
            params.push(("minRating", min_rating.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            params.push(("sortBy", sort_by.clone()));
        }
        if let Some(sort_order) = self.sort_order {
            params.push(("sortOrder", sort_order.as_str().to_string()));
        }
        params
    }
}

/// A filter key, for clearing one filter through a [`FilterPatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Category,
    Title,
    MinPrice,
    MaxPrice,
    MinRating,
    SortBy,
    SortOrder,
}

/// Partial filter update, merged key by key.
///
/// Per field: `None` keeps the current value, `Some(None)` clears it and
/// `Some(Some(v))` overwrites it.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(clippy::option_option)]
pub struct FilterPatch {
    pub category: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub min_price: Option<Option<Price>>,
    pub max_price: Option<Option<Price>>,
    pub min_rating: Option<Option<f64>>,
    pub sort_by: Option<Option<String>>,
    pub sort_order: Option<Option<SortOrder>>,
}

impl FilterPatch {
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Some(category.into()));
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    /// Set both price bounds; a `None` bound is cleared.
    #[must_use]
    pub const fn price_range(mut self, min: Option<Price>, max: Option<Price>) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    #[must_use]
    pub const fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(Some(rating));
        self
    }

    #[must_use]
    pub fn sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(Some(sort_by.into()));
        self.sort_order = Some(Some(order));
        self
    }

    /// Unset one filter, keeping the others.
    #[must_use]
    pub fn clear(mut self, key: FilterKey) -> Self {
        match key {
            FilterKey::Category => self.category = Some(None),
            FilterKey::Title => self.title = Some(None),
            FilterKey::MinPrice => self.min_price = Some(None),
            FilterKey::MaxPrice => self.max_price = Some(None),
            FilterKey::MinRating => self.min_rating = Some(None),
            FilterKey::SortBy => self.sort_by = Some(None),
            FilterKey::SortOrder => self.sort_order = Some(None),
        }
        self
    }

    /// Shallow per-key merge into `filters`.
    #[must_use]
    pub fn merge_into(self, filters: &FigureFilters) -> FigureFilters {
        FigureFilters {
            category: self.category.unwrap_or_else(|| filters.category.clone()),
            title: self.title.unwrap_or_else(|| filters.title.clone()),
            min_price: self.min_price.unwrap_or(filters.min_price),
            max_price: self.max_price.unwrap_or(filters.max_price),
            min_rating: self.min_rating.unwrap_or(filters.min_rating),
            sort_by: self.sort_by.unwrap_or_else(|| filters.sort_by.clone()),
            sort_order: self.sort_order.unwrap_or(filters.sort_order),
        }
    }
}

/// Create/update payload. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// `{figures, pagination}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FigurePage {
    #[serde(default)]
    pub figures: Vec<Figure>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `{figure}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct FigureEnvelope {
    pub figure: Figure,
}

/// `{isFavorite, userId}` response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub is_favorite: bool,
    pub user_id: UserId,
}
