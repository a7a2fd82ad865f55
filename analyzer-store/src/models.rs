use chrono::{DateTime, Utc};

/// A stored site, keyed by its normalized `scheme://host` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One recorded fetch of a [`Url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCheck {
    pub id: i64,
    pub url_id: i64,
    pub status_code: Option<u16>,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing row: a URL with its most recent check, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSummary {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub last_status_code: Option<u16>,
}

/// Fields of a check about to be appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCheck {
    pub status_code: Option<u16>,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub description: Option<String>,
}
