//! Pagination, sorting and post-window filtering for post listings.
//!
//! A listing is resolved into a [`ListingPlan`]: a scope (whose posts), a sort
//! order, a page window and a filter. The store returns the window of the
//! sorted scope; the filter then runs over that window only, so a filtered
//! page can come back short and is never topped up from neighbouring pages.

use std::cmp::Ordering;

use serde::Deserialize;
use uuid::Uuid;

use crate::config::PageConfig;
use crate::posts::repo_types::Post;
use crate::store::{PostStore, StoreError};

/// Raw query string parameters. Everything stays a string so that garbage
/// input falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Option<String>,
    pub level: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// `createdAt` descending.
    #[default]
    Newest,
    /// `createdAt` ascending.
    Oldest,
    /// `numOfLikes` descending.
    MostLiked,
    /// `numOfLikes` ascending.
    LeastLiked,
}

impl SortOrder {
    /// Exact token match; anything unrecognised is the default.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("oldest") => SortOrder::Oldest,
            Some("mostLiked") => SortOrder::MostLiked,
            Some("leastLiked") => SortOrder::LeastLiked,
            _ => SortOrder::Newest,
        }
    }

    /// Total order including tie-breaks. Must agree with [`Self::order_by_sql`].
    pub fn compare(self, a: &Post, b: &Post) -> Ordering {
        let newest_first = b.created_at.cmp(&a.created_at);
        let primary = match self {
            SortOrder::Newest => newest_first,
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::MostLiked => b.num_of_likes.cmp(&a.num_of_likes).then(newest_first),
            SortOrder::LeastLiked => a.num_of_likes.cmp(&b.num_of_likes).then(newest_first),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    pub fn order_by_sql(self) -> &'static str {
        match self {
            SortOrder::Newest => "created_at DESC, id ASC",
            SortOrder::Oldest => "created_at ASC, id ASC",
            SortOrder::MostLiked => "num_of_likes DESC, created_at DESC, id ASC",
            SortOrder::LeastLiked => "num_of_likes ASC, created_at DESC, id ASC",
        }
    }
}

/// 1-based page of `size` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub size: u64,
}

impl PageWindow {
    pub fn resolve(page: Option<&str>, size: Option<&str>, cfg: &PageConfig) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let size = parse_positive(size)
            .unwrap_or(cfg.default_size)
            .min(cfg.max_size);
        Self { page, size }
    }

    pub fn start_index(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn end_index(&self) -> u64 {
        self.start_index().saturating_add(self.size)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u64)
}

/// Post-window filter. Level is an exact match, location a case-insensitive
/// substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub level: Option<String>,
    pub location: Option<String>,
}

impl PostFilter {
    pub fn new(level: Option<&str>, location: Option<&str>) -> Self {
        Self {
            level: level.filter(|s| !s.is_empty()).map(str::to_string),
            location: location
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(level) = &self.level {
            if post.level.as_str() != level {
                return false;
            }
        }
        if let Some(needle) = &self.location {
            if !post.location.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        posts.into_iter().filter(|p| self.matches(p)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    CreatedBy(Uuid),
    FavoritedBy(Uuid),
}

/// What the store is asked for: the sorted window of one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: PostScope,
    pub sort: SortOrder,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct ListingPlan {
    pub scope: PostScope,
    pub sort: SortOrder,
    pub window: PageWindow,
    pub filter: PostFilter,
}

impl ListingPlan {
    pub fn new(scope: PostScope, params: &ListingParams, cfg: &PageConfig) -> Self {
        Self {
            scope,
            sort: SortOrder::from_token(params.sort.as_deref()),
            window: PageWindow::resolve(params.page.as_deref(), params.size.as_deref(), cfg),
            filter: PostFilter::new(params.level.as_deref(), params.location.as_deref()),
        }
    }

    pub fn query(&self) -> PostQuery {
        PostQuery {
            scope: self.scope,
            sort: self.sort,
            skip: self.window.start_index(),
            limit: self.window.size,
        }
    }

    pub async fn execute(&self, store: &dyn PostStore) -> Result<Vec<Post>, StoreError> {
        let window = store.find_posts(&self.query()).await?;
        Ok(self.filter.apply(window))
    }
}
