use crate::cv::models::{
    new_entry_id, BasicInfo, CvDocument, EducationEntry, ExperienceEntry, GenericItem,
    ProjectEntry, Summary,
};
use crate::cv::rich_text::RichText;
use crate::render::themes::Theme;

fn experience(
    role: &str,
    company: &str,
    start_date: &str,
    end_date: &str,
    achievements: &[&str],
) -> ExperienceEntry {
    ExperienceEntry {
        id: new_entry_id(),
        role: role.to_string(),
        company: company.to_string(),
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        current: false,
        achievements: achievements.iter().map(|a| RichText::plain(a)).collect(),
    }
}

fn education(
    degree: &str,
    institute: &str,
    location: &str,
    start_date: &str,
    end_date: &str,
) -> EducationEntry {
    EducationEntry {
        id: new_entry_id(),
        degree: degree.to_string(),
        institute: institute.to_string(),
        location: location.to_string(),
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        current: false,
    }
}

fn skill(title: &str, details: &str) -> GenericItem {
    GenericItem {
        id: new_entry_id(),
        title: title.to_string(),
        details: details.to_string(),
    }
}

fn project(name: &str, company: &str, details: &[&str]) -> ProjectEntry {
    ProjectEntry {
        id: new_entry_id(),
        name: name.to_string(),
        company: company.to_string(),
        details: details.iter().map(|d| d.to_string()).collect(),
    }
}

/// The sample CV shown to first-time users. Entry ids are fresh on every call.
pub fn sample_document() -> CvDocument {
    let mut doc = CvDocument::blank();

    doc.basic_info = BasicInfo {
        name: "Jane Smith".to_string(),
        role: "Senior Frontend Developer".to_string(),
        location: "San Francisco, CA".to_string(),
        email: "jane.smith@example.com".to_string(),
        website: Some("www.janesmith.dev".to_string()),
        phone: Some("+1 (555) 123-4567".to_string()),
        github: Some("github.com/janesmith".to_string()),
        linkedin: Some("linkedin.com/in/janesmith".to_string()),
        photo: None,
    };

    doc.summary = Summary {
        content: "Innovative Frontend Developer with 8+ years of experience crafting engaging \
                  user interfaces and seamless digital experiences. Passionate about clean code, \
                  performance optimization, and accessibility. Skilled in React, TypeScript, and \
                  modern frontend frameworks."
            .to_string(),
    };

    doc.experiences = vec![
        experience(
            "Senior Frontend Developer",
            "TechVision Inc.",
            "2020-03-01",
            "2023-06-01",
            &[
                "Led a team of 5 developers to rebuild the company's flagship product using React and TypeScript, resulting in a 40% improvement in performance.",
                "Implemented responsive design principles, ensuring optimal user experience across all devices and increasing mobile conversion rates by 25%.",
                "Architected and built a component library used across multiple products, reducing development time for new features by 30%.",
            ],
        ),
        experience(
            "Frontend Developer",
            "WebSolutions Co.",
            "2017-07-01",
            "2020-02-01",
            &[
                "Developed interactive data visualization dashboards using D3.js, providing clients with real-time analytics.",
                "Optimized website loading times by 60% through code splitting, lazy loading, and asset optimization.",
                "Collaborated with UX designers to implement user-centric designs, improving user satisfaction ratings by 35%.",
            ],
        ),
    ];

    doc.education = vec![
        education(
            "Master of Computer Science",
            "University of Technology",
            "San Francisco, CA",
            "2015-09-01",
            "2017-05-01",
        ),
        education(
            "Bachelor of Science in Web Development",
            "Digital Arts College",
            "Portland, OR",
            "2011-09-01",
            "2015-05-01",
        ),
    ];

    doc.skills = vec![
        skill(
            "Frontend Development",
            "React, Vue.js, Angular, TypeScript, JavaScript ES6+, HTML5, CSS3, SASS/SCSS, Tailwind CSS",
        ),
        skill(
            "UI/UX Design",
            "Figma, Adobe XD, Responsive Design, Wireframing, Prototyping, User Research",
        ),
        skill(
            "Performance Optimization",
            "Code Splitting, Lazy Loading, Bundle Analysis, Core Web Vitals, Lighthouse Auditing",
        ),
    ];

    doc.projects = vec![
        project(
            "E-commerce Platform Redesign",
            "RetailGiant",
            &[
                "Led complete frontend redesign of a major e-commerce platform serving 2M+ monthly users",
                "Implemented a micro-frontend architecture to enable independent team deployments",
                "Reduced cart abandonment by 18% through streamlined checkout process",
            ],
        ),
        project(
            "Healthcare Dashboard",
            "MediTech Solutions",
            &[
                "Developed an interactive dashboard for healthcare professionals to monitor patient data",
                "Implemented real-time data visualization with WebSockets and D3.js",
                "Ensured HIPAA compliance through secure data handling practices",
            ],
        ),
    ];

    doc.active_theme = Theme::Nordic;
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_document_is_consistent() {
        let doc = sample_document();
        assert_eq!(doc.basic_info.name, "Jane Smith");
        assert_eq!(doc.active_theme, Theme::Nordic);
        assert_eq!(doc.experiences.len(), 2);
        assert_eq!(doc.projects[0].details.len(), 3);
        assert!(doc.validate_sections().is_ok());
    }

    #[test]
    fn test_sample_ids_are_unique() {
        let doc = sample_document();
        let mut ids: Vec<&str> = doc
            .experiences
            .iter()
            .map(|e| e.id.as_str())
            .chain(doc.education.iter().map(|e| e.id.as_str()))
            .chain(doc.skills.iter().map(|e| e.id.as_str()))
            .chain(doc.projects.iter().map(|e| e.id.as_str()))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
