//! Audience niche classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content niche a video is scored against.
///
/// The closed catalogue covers the niches the scoring rules know about;
/// anything else is carried verbatim in [`Niche::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Niche {
    Fitness,
    Beauty,
    Gaming,
    Food,
    Travel,
    Education,
    Tech,
    Comedy,
    Music,
    Fashion,
    Finance,
    Lifestyle,
    /// Generic fallback used when classification is unavailable
    General,
    /// Open-ended label outside the catalogue
    Other(String),
}

impl Niche {
    /// Labels the classifier is asked to choose from.
    pub const CATALOGUE: [&'static str; 12] = [
        "fitness",
        "beauty",
        "gaming",
        "food",
        "travel",
        "education",
        "tech",
        "comedy",
        "music",
        "fashion",
        "finance",
        "lifestyle",
    ];

    pub fn label(&self) -> &str {
        match self {
            Niche::Fitness => "fitness",
            Niche::Beauty => "beauty",
            Niche::Gaming => "gaming",
            Niche::Food => "food",
            Niche::Travel => "travel",
            Niche::Education => "education",
            Niche::Tech => "tech",
            Niche::Comedy => "comedy",
            Niche::Music => "music",
            Niche::Fashion => "fashion",
            Niche::Finance => "finance",
            Niche::Lifestyle => "lifestyle",
            Niche::General => "general",
            Niche::Other(label) => label,
        }
    }

    /// Parse a caller-supplied niche. Unknown values are kept as `Other`.
    pub fn from_label(raw: &str) -> Self {
        let normalized = normalize(raw);
        match normalized.as_str() {
            "" | "general" => Niche::General,
            "fitness" => Niche::Fitness,
            "beauty" => Niche::Beauty,
            "gaming" => Niche::Gaming,
            "food" => Niche::Food,
            "travel" => Niche::Travel,
            "education" => Niche::Education,
            "tech" => Niche::Tech,
            "comedy" => Niche::Comedy,
            "music" => Niche::Music,
            "fashion" => Niche::Fashion,
            "finance" => Niche::Finance,
            "lifestyle" => Niche::Lifestyle,
            _ => Niche::Other(normalized),
        }
    }

    /// Interpret free-form classifier output.
    ///
    /// Accepts `other:<label>` for the open-ended category and otherwise
    /// takes the first catalogue label mentioned in the text.
    pub fn from_classifier_output(text: &str) -> Self {
        let normalized = normalize(text);
        if let Some(rest) = normalized.strip_prefix("other:") {
            let rest = rest.trim();
            return if rest.is_empty() {
                Niche::General
            } else {
                Niche::Other(rest.to_string())
            };
        }

        let exact = Niche::from_label(&normalized);
        if !matches!(exact, Niche::Other(_)) {
            return exact;
        }

        Niche::CATALOGUE
            .iter()
            .filter_map(|label| normalized.find(label).map(|pos| (pos, *label)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, label)| Niche::from_label(label))
            .unwrap_or(Niche::General)
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Niche::General)
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .trim()
        .to_lowercase()
}

impl Default for Niche {
    fn default() -> Self {
        Niche::General
    }
}

impl fmt::Display for Niche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<String> for Niche {
    fn from(s: String) -> Self {
        Niche::from_label(&s)
    }
}

impl From<Niche> for String {
    fn from(n: Niche) -> Self {
        n.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_catalogue() {
        assert_eq!(Niche::from_label("Fitness"), Niche::Fitness);
        assert_eq!(Niche::from_label("  gaming "), Niche::Gaming);
        assert_eq!(Niche::from_label(""), Niche::General);
    }

    #[test]
    fn test_from_label_other() {
        assert_eq!(
            Niche::from_label("Woodworking"),
            Niche::Other("woodworking".to_string())
        );
    }

    #[test]
    fn test_classifier_output_variants() {
        assert_eq!(Niche::from_classifier_output("\"beauty\""), Niche::Beauty);
        assert_eq!(
            Niche::from_classifier_output("other: pottery"),
            Niche::Other("pottery".to_string())
        );
        assert_eq!(
            Niche::from_classifier_output("This is clearly a food video, not travel."),
            Niche::Food
        );
        assert_eq!(Niche::from_classifier_output("no idea"), Niche::General);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Niche::Tech).unwrap();
        assert_eq!(json, "\"tech\"");
        let back: Niche = serde_json::from_str("\"knitting\"").unwrap();
        assert_eq!(back, Niche::Other("knitting".to_string()));
    }
}
