use analyzer_store::{Url, UrlCheck, UrlSummary};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::flash::Flash;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub flashes: Vec<Flash>,
    /// Echo of the rejected input, empty on a fresh form.
    pub url: String,
    pub url_error: Option<String>,
}

#[derive(Template)]
#[template(path = "urls.html")]
pub struct UrlsPage {
    pub flashes: Vec<Flash>,
    pub urls: Vec<UrlSummary>,
}

#[derive(Template)]
#[template(path = "url.html")]
pub struct UrlPage {
    pub flashes: Vec<Flash>,
    pub url: Url,
    pub checks: Vec<UrlCheck>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub flashes: Vec<Flash>,
}

pub fn render<T: Template>(page: T) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(error=%err, "view.render_failed");
            internal_error()
        }
    }
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
