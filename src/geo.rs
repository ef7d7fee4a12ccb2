//! # Geo Relevance
//!
//! Keyword gate deciding whether a piece of text concerns the target country.
//!
//! - Exclusion list (foreign countries) wins over everything else.
//! - Any domestic keyword (country, regions, cities, institutions) accepts.
//! - No positive evidence rejects, whatever the length of the text.
//!
//! Matching is case-insensitive substring containment. Pure, no I/O.

use once_cell::sync::Lazy;

/// Foreign-country tokens. A single hit rejects the text.
pub const EXCLUDED_COUNTRIES: &[&str] = &[
    "états-unis",
    "usa",
    "amérique",
    "syrie",
    "syria",
    "irak",
    "iran",
    "israël",
    "palestine",
    "ukraine",
    "russie",
    "chine",
    "france",
    "espagne",
    "italie",
    "allemagne",
    "royaume-uni",
    "canada",
    "brésil",
    "argentine",
    "mexique",
    "japon",
    "corée",
    "inde",
    "pakistan",
    "égypte",
    "libye",
    "tunisie",
    "maroc",
    "algérie",
    "nigeria",
    "ghana",
    "kenya",
    "afrique du sud",
    "congo",
    "mali",
    "niger",
    "burkina",
    "guinée",
    "côte d'ivoire",
    "bénin",
    "togo",
    "cameroun",
];

/// Domestic tokens: country name, regions, cities, neighbourhoods, institutions.
pub const DOMESTIC_KEYWORDS: &[&str] = &[
    "sénégal",
    "senegal",
    "dakar",
    "pikine",
    "guédiawaye",
    "thiès",
    "mbour",
    "ucad",
    "université",
    "sacre coeur",
    "sacré-coeur",
    "campus",
    "touba",
    "kaolack",
    "saint-louis",
    "ziguinchor",
    "louga",
    "tambacounda",
    "kolda",
    "sédhiou",
    "matam",
    "kaffrine",
    "kédougou",
    "diourbel",
    "rufisque",
    "parcelles",
    "médina",
    "plateau",
    "yoff",
    "ouakam",
    "ngor",
    "grand yoff",
    "colobane",
    "sandaga",
    "ouest africain",
    "afrique de l'ouest",
    "cedeao",
    "uemoa",
];

/// Texts shorter than this with no keyword are rejected outright.
pub const SHORT_TEXT_CHARS: usize = 100;

/// Keyword/exclusion classifier. Lists are stored lowercased.
#[derive(Debug, Clone)]
pub struct GeoClassifier {
    exclusions: Vec<String>,
    keywords: Vec<String>,
}

static DEFAULT_CLASSIFIER: Lazy<GeoClassifier> =
    Lazy::new(|| GeoClassifier::new(EXCLUDED_COUNTRIES, DOMESTIC_KEYWORDS));

impl GeoClassifier {
    pub fn new<S: AsRef<str>>(exclusions: &[S], keywords: &[S]) -> Self {
        let lower = |v: &[S]| {
            v.iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };
        Self {
            exclusions: lower(exclusions),
            keywords: lower(keywords),
        }
    }

    /// Shared classifier built from the built-in lists.
    pub fn default_country() -> &'static GeoClassifier {
        &DEFAULT_CLASSIFIER
    }

    /// Does `text` concern the target country?
    pub fn is_related(&self, text: &str) -> bool {
        let lower = text.to_lowercase();

        // 1) Exclusion has absolute precedence.
        if self.exclusions.iter().any(|c| lower.contains(c.as_str())) {
            return false;
        }

        // 2) Any domestic keyword accepts.
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            return true;
        }

        // 3) Short text without evidence.
        if lower.chars().count() < SHORT_TEXT_CHARS {
            return false;
        }

        // 4) Long text without evidence: still rejected.
        false
    }
}

/// Convenience wrapper over the built-in classifier.
pub fn is_country_related(text: &str) -> bool {
    GeoClassifier::default_country().is_related(text)
}
