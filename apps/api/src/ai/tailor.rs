//! Whole-CV tailoring for a job posting.
//!
//! The photo never leaves the server: it is taken out before the document is sent to
//! the model and put back on the answer. The answer goes through the same validation
//! as a JSON backup import, so a partial or malformed rewrite is rejected as a whole.

use tracing::{info, warn};

use crate::ai::generator::ContentGenerator;
use crate::cv::models::CvDocument;
use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::persistence;

pub async fn tailor_document(
    generator: &dyn ContentGenerator,
    job_title: &str,
    job_description: &str,
    document: &CvDocument,
) -> Result<CvDocument, AppError> {
    let mut outgoing = document.clone();
    let photo = outgoing.basic_info.photo.take();
    let cv_json = persistence::export_json(&outgoing)?;

    let answer = generator
        .tailor(job_title, job_description, &cv_json)
        .await?;

    let mut tailored = persistence::import_json(&answer).map_err(|e| {
        warn!(error = %e, "tailored CV rejected");
        AppError::Llm(LlmError::InvalidOutput(e.to_string()))
    })?;
    tailored.basic_info.photo = photo;
    info!(job_title, "CV tailored");
    Ok(tailored)
}
