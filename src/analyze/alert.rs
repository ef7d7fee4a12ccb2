//! Alert model and the narrowing of untyped oracle output into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Incident category. Anything the oracle invents maps to [`AlertType::Tension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    Manifestation,
    Violence,
    Greve,
    Tension,
    Blocage,
    Accident,
}

impl AlertType {
    pub const ALL: [AlertType; 6] = [
        AlertType::Manifestation,
        AlertType::Violence,
        AlertType::Greve,
        AlertType::Tension,
        AlertType::Blocage,
        AlertType::Accident,
    ];

    /// Generic category used for unknown or missing values.
    pub const GENERIC: AlertType = AlertType::Tension;

    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::Manifestation => "MANIFESTATION",
            AlertType::Violence => "VIOLENCE",
            AlertType::Greve => "GREVE",
            AlertType::Tension => "TENSION",
            AlertType::Blocage => "BLOCAGE",
            AlertType::Accident => "ACCIDENT",
        }
    }

    /// Lenient parse: case, accents and surrounding noise are ignored.
    pub fn normalize(raw: &str) -> AlertType {
        let key = fold_accents(raw.trim()).to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .unwrap_or(Self::GENERIC)
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Faible,
    Moyen,
    Eleve,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Faible => "FAIBLE",
            Severity::Moyen => "MOYEN",
            Severity::Eleve => "ELEVE",
        }
    }

    /// `ÉLEVÉ`, `ELEVÉ`, `eleve` → `Eleve`; anything unknown → `Moyen`.
    pub fn normalize(raw: &str) -> Severity {
        match fold_accents(raw.trim()).to_ascii_uppercase().as_str() {
            "FAIBLE" => Severity::Faible,
            "ELEVE" => Severity::Eleve,
            _ => Severity::Moyen,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geolocatable incident extracted from the news digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub place: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub info: String,
    pub severity: Severity,
}

impl Alert {
    pub fn new(place: &str, kind: AlertType, info: &str, severity: Severity) -> Self {
        Self {
            place: place.to_string(),
            kind,
            info: info.to_string(),
            severity,
        }
    }

    /// Stable identity: the same alert coming back yields the same id.
    pub fn fingerprint(&self) -> String {
        format!("{}|{}|{}|{}", self.place, self.kind, self.info, self.severity)
    }

    /// Narrow one untyped candidate. `None` when it is not an object or has no place.
    pub fn from_value(v: &Value) -> Option<Alert> {
        let obj = v.as_object()?;
        let text = |key: &str| -> Option<String> {
            match obj.get(key)? {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            }
        };

        let place = text("place").filter(|p| !p.is_empty())?;
        let kind = text("type")
            .map(|t| AlertType::normalize(&t))
            .unwrap_or(AlertType::GENERIC);
        let info = text("info")
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| "Incident".to_string());
        let severity = text("severity")
            .map(|s| Severity::normalize(&s))
            .unwrap_or(Severity::Moyen);

        Some(Alert {
            place,
            kind,
            info,
            severity,
        })
    }
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'à' | 'â' => 'a',
            'À' | 'Â' => 'A',
            'ç' => 'c',
            'Ç' => 'C',
            'î' | 'ï' => 'i',
            'Î' | 'Ï' => 'I',
            'ô' => 'o',
            'Ô' => 'O',
            'û' | 'ù' => 'u',
            'Û' | 'Ù' => 'U',
            other => other,
        })
        .collect()
}
