use serde::{Deserialize, Serialize};

use crate::render::PhotoLayout;

/// The visual themes a CV can be rendered with. Serialized as the lowercase name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Basic,
    Casual,
    Professional,
    Creative,
    Modern,
    Business,
    Minimal,
    Elegant,
    Technical,
    Vibrant,
    Academic,
    Corporate,
    Artistic,
    Classic,
    Digital,
    Futuristic,
    Nordic,
    Blueprint,
    Gradient,
    Retro,
}

impl Theme {
    pub const ALL: [Theme; 20] = [
        Theme::Basic,
        Theme::Casual,
        Theme::Professional,
        Theme::Creative,
        Theme::Modern,
        Theme::Business,
        Theme::Minimal,
        Theme::Elegant,
        Theme::Technical,
        Theme::Vibrant,
        Theme::Academic,
        Theme::Corporate,
        Theme::Artistic,
        Theme::Classic,
        Theme::Digital,
        Theme::Futuristic,
        Theme::Nordic,
        Theme::Blueprint,
        Theme::Gradient,
        Theme::Retro,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Theme::Basic => "Basic",
            Theme::Casual => "Casual",
            Theme::Professional => "Professional",
            Theme::Creative => "Creative",
            Theme::Modern => "Modern",
            Theme::Business => "Business",
            Theme::Minimal => "Minimal",
            Theme::Elegant => "Elegant",
            Theme::Technical => "Technical",
            Theme::Vibrant => "Vibrant",
            Theme::Academic => "Academic",
            Theme::Corporate => "Corporate",
            Theme::Artistic => "Artistic",
            Theme::Classic => "Classic",
            Theme::Digital => "Digital",
            Theme::Futuristic => "Futuristic",
            Theme::Nordic => "Nordic",
            Theme::Blueprint => "Blueprint",
            Theme::Gradient => "Gradient",
            Theme::Retro => "Retro",
        }
    }

    /// Where the photo goes when the CV has one. Themes without a preference use the
    /// left-aligned header.
    pub fn photo_layout(self) -> PhotoLayout {
        match self {
            Theme::Creative | Theme::Modern | Theme::Artistic | Theme::Vibrant => PhotoLayout::Right,
            Theme::Academic | Theme::Classic | Theme::Elegant => PhotoLayout::Top,
            Theme::Minimal | Theme::Nordic | Theme::Futuristic | Theme::Gradient => {
                PhotoLayout::Center
            }
            _ => PhotoLayout::Left,
        }
    }

    /// The second half of the catalogue needs an active premium unlock to select.
    pub fn is_premium(self) -> bool {
        matches!(
            self,
            Theme::Academic
                | Theme::Corporate
                | Theme::Artistic
                | Theme::Classic
                | Theme::Digital
                | Theme::Futuristic
                | Theme::Nordic
                | Theme::Blueprint
                | Theme::Gradient
                | Theme::Retro
        )
    }

    /// CSS colour for headings and rules.
    pub fn accent(self) -> &'static str {
        match self {
            Theme::Basic => "#1f2937",
            Theme::Casual => "#0d9488",
            Theme::Professional => "#1e3a8a",
            Theme::Creative => "#db2777",
            Theme::Modern => "#4f46e5",
            Theme::Business => "#334155",
            Theme::Minimal => "#111827",
            Theme::Elegant => "#7c2d12",
            Theme::Technical => "#0f766e",
            Theme::Vibrant => "#ea580c",
            Theme::Academic => "#14532d",
            Theme::Corporate => "#1d4ed8",
            Theme::Artistic => "#9333ea",
            Theme::Classic => "#44403c",
            Theme::Digital => "#0891b2",
            Theme::Futuristic => "#7c3aed",
            Theme::Nordic => "#475569",
            Theme::Blueprint => "#1e40af",
            Theme::Gradient => "#c026d3",
            Theme::Retro => "#b45309",
        }
    }
}
