use analyzer_common::AnalyzerError;
use axum::{
    Form,
    extract::{Path, State, rejection::PathRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    AppState,
    flash::{self, Flash, Level},
    service::{self, Submission},
    views::{IndexPage, NotFoundPage, UrlPage, UrlsPage, internal_error, render},
};

#[derive(Debug, Deserialize)]
pub struct UrlForm {
    #[serde(default)]
    pub url: String,
}

pub async fn index(jar: SignedCookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = IndexPage {
        flashes,
        url: String::new(),
        url_error: None,
    };
    (jar, render(page)).into_response()
}

pub async fn list_urls(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let urls = match state.repo.list_urls_with_last_check().await {
        Ok(urls) => urls,
        Err(err) => {
            error!(error=%err, "handler.list_urls.failed");
            return internal_error();
        }
    };
    let (jar, flashes) = flash::take(jar);
    (jar, render(UrlsPage { flashes, urls })).into_response()
}

pub async fn create_url(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<UrlForm>,
) -> Response {
    match service::submit_url(&state.repo, &form.url).await {
        Ok(Submission::Created(id)) => {
            info!(url_id = id, "handler.create_url.created");
            let jar = flash::push(jar, Level::Success, "Page successfully added");
            (jar, found(&url_path(id))).into_response()
        }
        Ok(Submission::Existing(id)) => {
            let jar = flash::push(jar, Level::Info, "Page already exists");
            (jar, found(&url_path(id))).into_response()
        }
        Err(AnalyzerError::Validation(message)) => {
            info!(input=%form.url, reason=%message, "handler.create_url.invalid");
            let (jar, mut flashes) = flash::take(jar);
            flashes.push(Flash::new(Level::Danger, "Invalid URL"));
            let page = IndexPage {
                flashes,
                url: form.url,
                url_error: Some(message),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, jar, render(page)).into_response()
        }
        Err(err) => {
            error!(error=%err, "handler.create_url.failed");
            let jar = flash::push(jar, Level::Danger, "Could not add the page");
            (jar, found("/urls")).into_response()
        }
    }
}

pub async fn show_url(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        return not_found_response();
    };
    let url = match state.repo.find_url_by_id(id).await {
        Ok(Some(url)) => url,
        Ok(None) => return not_found_response(),
        Err(err) => {
            error!(url_id = id, error=%err, "handler.show_url.failed");
            return internal_error();
        }
    };
    let checks = match state.repo.list_checks_for_url(id).await {
        Ok(checks) => checks,
        Err(err) => {
            error!(url_id = id, error=%err, "handler.show_url.checks_failed");
            return internal_error();
        }
    };
    let (jar, flashes) = flash::take(jar);
    (jar, render(UrlPage { flashes, url, checks })).into_response()
}

pub async fn create_check(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        return not_found_response();
    };
    let jar = match service::run_check(&state.repo, &state.http, id).await {
        Ok(_) => flash::push(jar, Level::Success, "Page successfully checked"),
        Err(err) => {
            if err.is_not_found() {
                info!(url_id = id, "handler.create_check.unknown_url");
            } else {
                warn!(url_id = id, error=%err, "handler.create_check.failed");
            }
            flash::push(jar, Level::Danger, "An error occurred during the check")
        }
    };
    (jar, found(&url_path(id))).into_response()
}

/// Fallback for routes that match nothing.
pub async fn not_found() -> Response {
    not_found_response()
}

fn not_found_response() -> Response {
    let page = NotFoundPage {
        flashes: Vec::new(),
    };
    (StatusCode::NOT_FOUND, render(page)).into_response()
}

// `Redirect::to` answers 303; form posts here redirect with 302.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn url_path(id: i64) -> String {
    format!("/urls/{id}")
}
