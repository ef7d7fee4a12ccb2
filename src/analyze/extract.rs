//! Alert extraction: news digest → oracle → validated alerts.
//!
//! The oracle's answer is untrusted. It is parsed into an untyped JSON value,
//! narrowed field by field into [`Alert`], and each survivor is re-checked with
//! the geo classifier so hallucinated foreign places are dropped.

use std::collections::HashSet;
use std::fmt::Write as _;

use metrics::counter;
use serde_json::Value;

use crate::analyze::ai_adapter::Oracle;
use crate::analyze::alert::Alert;
use crate::error::OracleError;
use crate::geo::GeoClassifier;
use crate::ingest::truncate_chars;
use crate::ingest::types::NewsItem;
use crate::locations::LocationRegistry;

pub const MAX_ALERTS: usize = 12;
pub const DIGEST_SUMMARY_CHARS: usize = 150;
pub const PROMPT_PLACE_HINTS: usize = 30;
pub const RAW_LOG_PREFIX_CHARS: usize = 600;

const SYSTEM_PROMPT: &str = "Tu es un expert en sécurité au Sénégal.\n\n\
MISSION CRITIQUE:\n\
- Analyser UNIQUEMENT les incidents au SÉNÉGAL\n\
- IGNORER toute actualité internationale (USA, Syrie, etc.)\n\
- Extraire UNIQUEMENT les lieux sénégalais\n\n\
RÈGLES ABSOLUES:\n\
1. Si un lieu n'est PAS au Sénégal → IGNORER l'alerte\n\
2. Répondre en JSON strict sans commentaire\n\
3. Utiliser UNIQUEMENT les lieux mentionnés dans les titres\n\
4. Maximum 12 alertes\n\
5. type ∈ MANIFESTATION|VIOLENCE|GREVE|TENSION|BLOCAGE|ACCIDENT, severity ∈ FAIBLE|MOYEN|ELEVE";

/// Builds prompts, calls the oracle once, validates the answer.
pub struct AlertExtractor<'a> {
    classifier: &'a GeoClassifier,
    registry: &'a LocationRegistry,
}

impl<'a> AlertExtractor<'a> {
    pub fn new(classifier: &'a GeoClassifier, registry: &'a LocationRegistry) -> Self {
        Self {
            classifier,
            registry,
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// Numbered digest of titles with truncated summaries.
    pub fn digest(news: &[NewsItem]) -> String {
        let mut out = String::new();
        for (i, n) in news.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, n.title);
            if !n.summary.is_empty() {
                let _ = writeln!(out, "   Résumé: {}", truncate_chars(&n.summary, DIGEST_SUMMARY_CHARS));
            }
            out.push('\n');
        }
        out
    }

    pub fn user_prompt(&self, news: &[NewsItem]) -> String {
        let places = self.registry.sample_names(PROMPT_PLACE_HINTS).join(", ");
        format!(
            r#"Analyse ces actualités SÉNÉGALAISES et extrais les alertes:

{digest}
LIEUX VALIDES SÉNÉGAL (utilise ces noms exacts si possible):
{places}

FORMAT OBLIGATOIRE:
{{
  "alerts": [
    {{
      "place": "Nom lieu sénégalais UNIQUEMENT",
      "type": "MANIFESTATION|VIOLENCE|GREVE|TENSION|BLOCAGE|ACCIDENT",
      "info": "Résumé 8 mots max",
      "severity": "FAIBLE|MOYEN|ELEVE"
    }}
  ]
}}

CRITÈRES SÉVÉRITÉ:
- ELEVE: Mort, blessés graves, violence armée
- MOYEN: Affrontements, tensions vives, blocages importants
- FAIBLE: Manifestations pacifiques, tensions mineures

ATTENTION: REJETTE tout lieu hors Sénégal (USA, Syrie, etc.)

JSON uniquement:"#,
            digest = Self::digest(news),
        )
    }

    /// Strict variant: oracle and parse failures are returned to the caller.
    pub async fn try_extract(
        &self,
        oracle: &dyn Oracle,
        news: &[NewsItem],
    ) -> Result<Vec<Alert>, OracleError> {
        if news.is_empty() {
            return Ok(Vec::new());
        }

        let raw = oracle
            .invoke(self.system_prompt(), &self.user_prompt(news))
            .await?;
        let candidates = parse_alert_candidates(&raw)?;
        Ok(self.validate(&candidates))
    }

    /// Degrading variant used by the pipeline: any failure becomes an empty list.
    pub async fn extract(&self, oracle: &dyn Oracle, news: &[NewsItem]) -> Vec<Alert> {
        match self.try_extract(oracle, news).await {
            Ok(alerts) => {
                tracing::info!(
                    target: "extract",
                    oracle = oracle.name(),
                    news = news.len(),
                    alerts = alerts.len(),
                    "alerts extracted"
                );
                alerts
            }
            Err(OracleError::Parse { reason, raw_prefix }) => {
                counter!("radar_oracle_errors_total").increment(1);
                tracing::error!(target: "extract", %reason, "oracle answer is not usable JSON");
                tracing::debug!(target: "extract", raw = %raw_prefix, "oracle raw answer (prefix)");
                Vec::new()
            }
            Err(e) => {
                counter!("radar_oracle_errors_total").increment(1);
                tracing::error!(target: "extract", error = %e, "oracle call failed");
                Vec::new()
            }
        }
    }

    /// Narrow, geo-recheck, dedup, cap.
    fn validate(&self, candidates: &[Value]) -> Vec<Alert> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for v in candidates {
            let Some(alert) = Alert::from_value(v) else {
                continue;
            };
            if !self
                .classifier
                .is_related(&format!("{} {}", alert.place, alert.info))
            {
                tracing::debug!(target: "extract", place = %alert.place, "dropping non-domestic alert");
                continue;
            }
            if !seen.insert(alert.fingerprint()) {
                continue;
            }
            out.push(alert);
            if out.len() >= MAX_ALERTS {
                break;
            }
        }
        out
    }
}

/// Oracle text → list of untyped alert candidates.
pub fn parse_alert_candidates(raw: &str) -> Result<Vec<Value>, OracleError> {
    let parse_err = |reason: String| OracleError::Parse {
        reason,
        raw_prefix: truncate_chars(raw, RAW_LOG_PREFIX_CHARS),
    };

    let cleaned = strip_code_fences(raw);
    let json = first_json_object(cleaned)
        .ok_or_else(|| parse_err("no JSON object found".to_string()))?;
    let value: Value = serde_json::from_str(json).map_err(|e| parse_err(e.to_string()))?;

    match value.get("alerts") {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(parse_err("`alerts` is not an array".to_string())),
    }
}

/// Drop a surrounding ```json fence if present.
pub fn strip_code_fences(response: &str) -> &str {
    let t = response.trim();
    let t = match t.get(..3) {
        Some("```") => {
            let rest = &t[3..];
            let rest = rest
                .strip_prefix("json")
                .or_else(|| rest.strip_prefix("JSON"))
                .unwrap_or(rest);
            rest.trim_start()
        }
        _ => t,
    };
    t.strip_suffix("```").unwrap_or(t).trim()
}

/// First brace-balanced `{...}` substring, honoring JSON string literals.
pub fn first_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;

    for (off, c) in s[start..].char_indices() {
        if in_str {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + off + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::StaticOracle;
    use crate::analyze::alert::{AlertType, Severity};

    fn item(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            summary: String::new(),
            date: "Récent".into(),
            link: "https://a.sn".into(),
            source: "https://a.sn".into(),
        }
    }

    fn extractor() -> AlertExtractor<'static> {
        static REGISTRY: LocationRegistry = LocationRegistry::builtin();
        AlertExtractor::new(GeoClassifier::default_country(), &REGISTRY)
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn finds_first_balanced_object() {
        let s = r#"Voici: {"a": {"b": "}"}} puis {"c": 1}"#;
        assert_eq!(first_json_object(s), Some(r#"{"a": {"b": "}"}}"#));
        assert_eq!(first_json_object("pas de json"), None);
        assert_eq!(first_json_object("{ non fermé"), None);
    }

    #[test]
    fn digest_numbers_and_truncates() {
        let mut a = item("Grève à Thiès");
        a.summary = "x".repeat(300);
        let d = AlertExtractor::digest(&[a, item("Marche à Dakar")]);
        assert!(d.starts_with("1. Grève à Thiès\n   Résumé: "));
        assert!(d.contains("2. Marche à Dakar\n"));
        assert!(!d.contains(&"x".repeat(DIGEST_SUMMARY_CHARS + 1)));
    }

    #[test]
    fn user_prompt_embeds_digest_and_place_hints() {
        let p = extractor().user_prompt(&[item("Manifestation à l'UCAD")]);
        assert!(p.contains("1. Manifestation à l'UCAD"));
        assert!(p.contains("UCAD, Université Cheikh Anta Diop, Campus Social"));
    }

    #[tokio::test]
    async fn empty_news_never_calls_oracle() {
        let oracle = StaticOracle::replying(r#"{"alerts":[{"place":"Dakar"}]}"#);
        let out = extractor().extract(&oracle, &[]).await;
        assert!(out.is_empty());
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn non_json_answer_degrades_to_empty() {
        let oracle = StaticOracle::replying("Désolé, je ne peux pas répondre.");
        let news = [item("Manifestation à l'UCAD")];
        assert!(extractor().extract(&oracle, &news).await.is_empty());
        assert!(matches!(
            extractor().try_extract(&oracle, &news).await,
            Err(OracleError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn oracle_failure_degrades_to_empty() {
        let oracle = StaticOracle::failing();
        let out = extractor().extract(&oracle, &[item("Grève à Thiès")]).await;
        assert!(out.is_empty());
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn validates_normalizes_and_rechecks_geography() {
        let raw = r#"```json
{"alerts": [
  {"place": "UCAD", "type": "MANIFESTATION", "info": "un blessé", "severity": "MOYEN"},
  {"place": "Paris, France", "type": "VIOLENCE", "info": "émeute", "severity": "ÉLEVÉ"},
  {"place": "Pikine", "type": "PILLAGE", "info": "magasins visés", "severity": "ÉLEVÉ"},
  {"place": "UCAD", "type": "MANIFESTATION", "info": "un blessé", "severity": "MOYEN"},
  {"place": "Lieu inconnu", "type": "GREVE", "info": "rien", "severity": "FAIBLE"}
]}
```"#;
        let oracle = StaticOracle::replying(raw);
        let out = extractor().extract(&oracle, &[item("x")]).await;
        assert_eq!(
            out,
            vec![
                Alert::new("UCAD", AlertType::Manifestation, "un blessé", Severity::Moyen),
                Alert::new("Pikine", AlertType::Tension, "magasins visés", Severity::Eleve),
            ]
        );
    }

    #[tokio::test]
    async fn caps_at_twelve() {
        let items: Vec<String> = (0..20)
            .map(|i| format!(r#"{{"place":"Dakar","type":"TENSION","info":"incident {i}","severity":"FAIBLE"}}"#))
            .collect();
        let raw = format!(r#"{{"alerts":[{}]}}"#, items.join(","));
        let oracle = StaticOracle::replying(raw);
        let out = extractor().extract(&oracle, &[item("x")]).await;
        assert_eq!(out.len(), MAX_ALERTS);
    }

    #[test]
    fn missing_alerts_key_is_empty_but_wrong_shape_is_error() {
        assert!(parse_alert_candidates(r#"{"other": 1}"#).unwrap().is_empty());
        assert!(parse_alert_candidates(r#"{"alerts": "none"}"#).is_err());
    }
}
