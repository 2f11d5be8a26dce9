use crate::llm_client::prompts::ATS_STYLE_INSTRUCTION;

pub const GENERATE_SYSTEM: &str = crate::llm_client::prompts::PLAIN_OUTPUT_SYSTEM;

/// System prompt for CV tailoring. The answer is parsed as a whole document.
pub const TAILOR_SYSTEM: &str = "You are a professional CV tailor who optimizes CVs for \
    specific job applications. \
    Do not invent experiences, employers, dates or qualifications; only rework existing \
    content to match the job description. \
    You MUST respond with a single valid JSON object with exactly the structure of the \
    input CV, keeping every id, and no text outside it.";

/// Whole-CV tailoring prompt. `cv_json` is the document without its photo.
pub fn build_tailor_prompt(job_title: &str, job_description: &str, cv_json: &str) -> String {
    format!(
        "I'm applying for a \"{job_title}\" position. Here's the job description:\n\n\
         {job_description}\n\n\
         Here's my current CV in JSON format:\n\n{cv_json}\n\n\
         Tailor the CV for this job:\n\
         1. Highlight the skills and experiences that match the job description.\n\
         2. Use the job description's industry keywords.\n\
         3. Quantify achievements where the CV supports it.\n\
         4. Keep standard section headings and a concise, professional tone.\n\n\
         {ATS_STYLE_INSTRUCTION}\n\n\
         Return the result as a JSON object with the same structure as my CV."
    )
}

/// Prompt for a job-description block: 4-6 achievement bullets for the given role.
pub fn build_generate_prompt(job_title: &str, company: Option<&str>, custom: Option<&str>) -> String {
    let mut prompt = format!(
        "Write 4 to 6 achievement bullets for the position \"{job_title}\""
    );
    if let Some(company) = company {
        prompt.push_str(&format!(" at {company}"));
    }
    prompt.push_str(".\n\n");
    prompt.push_str(ATS_STYLE_INSTRUCTION);
    prompt.push_str("\n\nOne bullet per line, each starting with \"- \".");
    if let Some(custom) = custom {
        prompt.push_str(&format!("\n\nAdditional instructions from the user:\n{custom}"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_optional_parts() {
        let prompt = build_generate_prompt("Data Engineer", Some("Acme"), Some("Mention Spark"));
        assert!(prompt.contains("\"Data Engineer\" at Acme."));
        assert!(prompt.contains("Mention Spark"));
    }

    #[test]
    fn test_tailor_prompt_embeds_job_and_cv() {
        let prompt = build_tailor_prompt("Data Engineer", "Spark and Airflow", "{\"summary\":{}}");
        assert!(prompt.contains("\"Data Engineer\" position"));
        assert!(prompt.contains("Spark and Airflow"));
        assert!(prompt.contains("{\"summary\":{}}"));
    }

    #[test]
    fn test_prompt_without_company() {
        let prompt = build_generate_prompt("Designer", None, None);
        assert!(prompt.contains("\"Designer\"."));
        assert!(!prompt.contains("Additional instructions"));
    }
}
