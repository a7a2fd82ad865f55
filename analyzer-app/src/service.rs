//! The two write paths behind the forms: submitting a site and checking it.
use analyzer_common::{AnalyzerError, Result};
use analyzer_http::{HttpClient, RequestOpts};
use analyzer_store::{NewCheck, Repository, StoreError};
use analyzer_web::{URL_FIELD, extract, normalize, validate};
use tracing::{info, warn};

/// Outcome of a submission. Both carry the id of the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Created(i64),
    Existing(i64),
}

/// Validate `raw`, reduce it to `scheme://host`, and store it unless a row
/// with that name already exists.
///
/// Fails with [`AnalyzerError::Validation`] carrying the message for the
/// url field.
pub async fn submit_url(repo: &Repository, raw: &str) -> Result<Submission> {
    let errors = validate(raw);
    if let Some(message) = errors.get(URL_FIELD) {
        return Err(AnalyzerError::Validation(message.clone()));
    }
    let name = normalize(raw)?;

    if let Some(existing) = repo.find_url_by_name(&name).await? {
        info!(url_id = existing.id, name=%name, "service.submit_url.existing");
        return Ok(Submission::Existing(existing.id));
    }

    match repo.save_url(&name).await {
        Ok(id) => Ok(Submission::Created(id)),
        // Lost a race with a concurrent submission of the same name.
        Err(StoreError::Duplicate(_)) => repo
            .find_url_by_name(&name)
            .await?
            .map(|u| Submission::Existing(u.id))
            .ok_or_else(|| AnalyzerError::Store(format!("{name} vanished after insert conflict"))),
        Err(err) => Err(err.into()),
    }
}

/// Fetch the stored URL once, extract its SEO fields and append a check.
///
/// Nothing is written unless the fetch succeeds with a 2xx response. Any
/// body other than declared media is parsed; missing fields stay `None`.
pub async fn run_check(repo: &Repository, http: &HttpClient, url_id: i64) -> Result<i64> {
    let url = repo
        .find_url_by_id(url_id)
        .await?
        .ok_or(AnalyzerError::UrlNotFound(url_id))?;

    let page = http.get_page(&url.name, RequestOpts::default()).await?;
    if page.is_media() {
        warn!(
            url_id,
            content_type = page.content_type.as_deref().unwrap_or(""),
            "service.run_check.media_body"
        );
        return Err(AnalyzerError::Parse(format!(
            "not a document: {}",
            page.content_type.as_deref().unwrap_or("unknown")
        )));
    }

    let meta = extract(&page.body);
    let check_id = repo
        .save_check(
            url.id,
            NewCheck {
                status_code: Some(page.status.as_u16()),
                title: meta.title,
                h1: meta.h1,
                description: meta.description,
            },
        )
        .await?;
    info!(url_id, check_id, status = page.status.as_u16(), "service.run_check.saved");
    Ok(check_id)
}
