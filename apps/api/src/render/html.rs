//! Standalone HTML serialization of a rendered CV, used for preview and export.
//!
//! Every piece of user text goes through `escape_html`; achievements go through the
//! rich-text serializer, which only ever emits the sanitized subset.

use chrono::NaiveDate;

use crate::cv::models::BasicInfo;
use crate::cv::rich_text::escape_html;
use crate::render::{Block, BlockBody, Header, PhotoLayout, RenderedCv};

/// Formats `YYYY-MM-DD` or `YYYY-MM` as `Mon YYYY`. Anything else is shown as entered.
pub fn format_month(date: &str) -> String {
    let date = date.trim();
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{date}-01"), "%Y-%m-%d"));
    match parsed {
        Ok(d) => d.format("%b %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// `start - end`, with `Present` for ongoing entries.
pub fn date_range(start: &str, end: &str, current: bool) -> String {
    let end = if current {
        "Present".to_string()
    } else {
        format_month(end)
    };
    match (start.trim().is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (true, false) => end,
        (false, true) => format_month(start),
        (false, false) => format!("{} - {}", format_month(start), end),
    }
}

pub fn to_html(cv: &RenderedCv<'_>) -> String {
    let accent = cv.theme.accent();
    let mut out = String::with_capacity(4096);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>{}</title>\n",
        escape_html(&cv.header.info.name)
    ));
    out.push_str(&format!(
        "<style>\
         body{{font-family:Helvetica,Arial,sans-serif;color:#1f2937;max-width:800px;margin:0 auto;padding:32px}}\
         h1{{margin:0;color:{accent}}}\
         h2{{color:{accent};border-bottom:2px solid {accent};padding-bottom:4px;margin-top:24px}}\
         .role{{font-size:1.1em;color:#4b5563}}\
         .contacts{{font-size:.9em;color:#4b5563}}\
         .dates{{float:right;color:#6b7280;font-size:.9em}}\
         .photo{{width:96px;height:96px;border-radius:50%;object-fit:cover}}\
         .header-left{{display:flex;gap:16px;align-items:center}}\
         .header-right{{display:flex;gap:16px;align-items:center;flex-direction:row-reverse;justify-content:space-between}}\
         .header-top,.header-center{{text-align:center}}\
         @media print{{body{{padding:0}}}}\
         </style>\n"
    ));
    out.push_str(&format!(
        "</head>\n<body class=\"theme-{}\">\n",
        cv.theme.display_name().to_lowercase()
    ));

    write_header(&mut out, &cv.header);
    for block in &cv.blocks {
        write_block(&mut out, block);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_header(out: &mut String, header: &Header<'_>) {
    let info = header.info;
    let class = match header.layout {
        PhotoLayout::Left => "header-left",
        PhotoLayout::Right => "header-right",
        PhotoLayout::Top => "header-top",
        PhotoLayout::Center => "header-center",
        PhotoLayout::Standard => "header-standard",
    };
    out.push_str(&format!("<header class=\"{class}\">\n"));

    if header.layout != PhotoLayout::Standard {
        if let Some(photo) = info.photo.as_deref().filter(|p| p.starts_with("data:image/")) {
            out.push_str(&format!(
                "<img class=\"photo\" src=\"{}\" alt=\"\">\n",
                escape_html(photo)
            ));
        }
    }

    out.push_str("<div>\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&info.name)));
    if !info.role.is_empty() {
        out.push_str(&format!(
            "<div class=\"role\">{}</div>\n",
            escape_html(&info.role)
        ));
    }
    let contacts = contact_items(info);
    if !contacts.is_empty() {
        out.push_str(&format!(
            "<div class=\"contacts\">{}</div>\n",
            contacts.join(" | ")
        ));
    }
    out.push_str("</div>\n</header>\n");
}

fn contact_items(info: &BasicInfo) -> Vec<String> {
    [
        Some(info.email.as_str()),
        info.phone.as_deref(),
        Some(info.location.as_str()),
        info.website.as_deref(),
        info.github.as_deref(),
        info.linkedin.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|v| !v.trim().is_empty())
    .map(escape_html)
    .collect()
}

fn write_block(out: &mut String, block: &Block<'_>) {
    out.push_str(&format!(
        "<section data-section=\"{}\">\n<h2>{}</h2>\n",
        escape_html(block.key.as_str()),
        escape_html(&block.title)
    ));

    match &block.body {
        BlockBody::Summary(content) => {
            out.push_str(&format!("<p>{}</p>\n", escape_html(content)));
        }
        BlockBody::Experiences(items) => {
            for exp in *items {
                out.push_str("<div class=\"entry\">\n");
                out.push_str(&format!(
                    "<span class=\"dates\">{}</span>\n",
                    escape_html(&date_range(&exp.start_date, &exp.end_date, exp.current))
                ));
                out.push_str(&format!(
                    "<h3>{}</h3>\n<div>{}</div>\n",
                    escape_html(&exp.role),
                    escape_html(&exp.company)
                ));
                let bullets: Vec<String> = exp
                    .achievements
                    .iter()
                    .filter(|a| !a.is_empty())
                    .map(|a| format!("<li>{}</li>", a.to_markup()))
                    .collect();
                if !bullets.is_empty() {
                    out.push_str(&format!("<ul>{}</ul>\n", bullets.join("")));
                }
                out.push_str("</div>\n");
            }
        }
        BlockBody::Education(items) => {
            for edu in *items {
                out.push_str("<div class=\"entry\">\n");
                out.push_str(&format!(
                    "<span class=\"dates\">{}</span>\n",
                    escape_html(&date_range(&edu.start_date, &edu.end_date, edu.current))
                ));
                out.push_str(&format!(
                    "<h3>{}</h3>\n<div>{}</div>\n",
                    escape_html(&edu.degree),
                    escape_html(&edu.institute)
                ));
                if !edu.location.is_empty() {
                    out.push_str(&format!("<div>{}</div>\n", escape_html(&edu.location)));
                }
                out.push_str("</div>\n");
            }
        }
        BlockBody::Skills(items) | BlockBody::Items(items) => {
            for item in *items {
                out.push_str(&format!(
                    "<div class=\"entry\"><strong>{}</strong>: {}</div>\n",
                    escape_html(&item.title),
                    escape_html(&item.details)
                ));
            }
        }
        BlockBody::Projects(items) => {
            for project in *items {
                out.push_str("<div class=\"entry\">\n");
                out.push_str(&format!("<h3>{}</h3>\n", escape_html(&project.name)));
                if !project.company.is_empty() {
                    out.push_str(&format!("<div>{}</div>\n", escape_html(&project.company)));
                }
                let details: Vec<String> = project
                    .details
                    .iter()
                    .filter(|d| !d.trim().is_empty())
                    .map(|d| format!("<li>{}</li>", escape_html(d)))
                    .collect();
                if !details.is_empty() {
                    out.push_str(&format!("<ul>{}</ul>\n", details.join("")));
                }
                out.push_str("</div>\n");
            }
        }
    }

    out.push_str("</section>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::defaults::sample_document;
    use crate::cv::rich_text::RichText;
    use crate::render::render_document;

    #[test]
    fn test_format_month() {
        assert_eq!(format_month("2020-03-01"), "Mar 2020");
        assert_eq!(format_month("2017-07"), "Jul 2017");
        assert_eq!(format_month("sometime"), "sometime");
    }

    #[test]
    fn test_date_range_current_is_present() {
        assert_eq!(date_range("2020-03-01", "", true), "Mar 2020 - Present");
        assert_eq!(date_range("2020-03-01", "2023-06-01", false), "Mar 2020 - Jun 2023");
        assert_eq!(date_range("", "", false), "");
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut doc = sample_document();
        doc.basic_info.name = "<script>alert(1)</script>".to_string();
        doc.skills[0].details = "C++ & \"Rust\"".to_string();
        let html = to_html(&render_document(&doc));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("C++ &amp; &quot;Rust&quot;"));
    }

    #[test]
    fn test_achievements_keep_safe_markup() {
        let mut doc = sample_document();
        doc.experiences[0].achievements =
            vec![RichText::parse("<b>Led</b> <img src=x onerror=alert(1)>team")];
        let html = to_html(&render_document(&doc));
        assert!(html.contains("<li><b>Led</b> team</li>"));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn test_sections_appear_in_order_with_titles() {
        let mut doc = sample_document();
        doc.rename_title(
            &crate::cv::sections::SectionKey::parse("experiences").unwrap(),
            "Work History",
        )
        .unwrap();
        let html = to_html(&render_document(&doc));
        let summary = html.find("data-section=\"summary\"").unwrap();
        let experience = html.find("<h2>Work History</h2>").unwrap();
        let projects = html.find("data-section=\"projects\"").unwrap();
        assert!(summary < experience && experience < projects);
    }
}
