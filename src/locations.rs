//! Static place-name → coordinate table.
//!
//! Iteration order is the declaration order below and is part of the contract:
//! geocoding is first-match-wins over this order (e.g. "Dakar" precedes "Plateau").

use serde::Serialize;

/// One named place with its WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationEntry {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

const fn loc(name: &'static str, lat: f64, lon: f64) -> LocationEntry {
    LocationEntry { name, lat, lon }
}

/// Capital, used when nothing matches.
pub const CAPITAL: LocationEntry = loc("Dakar", 14.7167, -17.4677);

static SENEGAL_LOCATIONS: &[LocationEntry] = &[
    // Dakar and its neighbourhoods
    loc("UCAD", 14.6928, -17.4616),
    loc("Université Cheikh Anta Diop", 14.6928, -17.4616),
    loc("Campus Social", 14.6928, -17.4616),
    loc("Dakar", 14.7167, -17.4677),
    loc("Plateau", 14.6708, -17.4381),
    loc("Médina", 14.6830, -17.4550),
    loc("Colobane", 14.6960, -17.4500),
    loc("Sandaga", 14.6728, -17.4431),
    loc("Parcelles Assainies", 14.7640, -17.4229),
    loc("Grand Yoff", 14.7532, -17.4650),
    loc("Ouakam", 14.7160, -17.4850),
    loc("Ngor", 14.7450, -17.5100),
    loc("Yoff", 14.7470, -17.4920),
    loc("Mermoz", 14.7080, -17.4580),
    loc("Sacré-Coeur", 14.7120, -17.4620),
    loc("Point E", 14.7050, -17.4510),
    loc("Liberté 6", 14.7100, -17.4600),
    loc("HLM", 14.7200, -17.4400),
    loc("Sicap", 14.7300, -17.4500),
    loc("Fann", 14.6900, -17.4650),
    loc("Dieuppeul", 14.7340, -17.4690),
    loc("Gueule Tapée", 14.6850, -17.4480),
    loc("Fass", 14.6900, -17.4450),
    // Suburbs
    loc("Pikine", 14.7554, -17.3946),
    loc("Guédiawaye", 14.7734, -17.3891),
    loc("Thiaroye", 14.7667, -17.3333),
    loc("Keur Massar", 14.7828, -17.3117),
    loc("Malika", 14.7800, -17.3800),
    loc("Yeumbeul", 14.7900, -17.3700),
    loc("Diamaguène", 14.7600, -17.4000),
    loc("Cambérène", 14.7850, -17.4100),
    // Regional cities
    loc("Rufisque", 14.7167, -17.2667),
    loc("Thiès", 14.7910, -16.9359),
    loc("Mbour", 14.4220, -16.9638),
    loc("Kaolack", 14.1519, -16.0755),
    loc("Saint-Louis", 16.0333, -16.5000),
    loc("Ziguinchor", 12.5833, -16.2667),
    loc("Touba", 14.8500, -15.8833),
    loc("Louga", 15.6167, -16.2333),
    loc("Tambacounda", 13.7667, -13.6667),
    loc("Kolda", 12.8833, -14.9500),
    loc("Sédhiou", 12.7080, -15.5569),
    loc("Matam", 15.6556, -13.2553),
    loc("Kaffrine", 14.1064, -15.5503),
    loc("Kédougou", 12.5569, -12.1742),
    loc("Diourbel", 14.6525, -16.2358),
];

/// Ordered, immutable registry of known places.
#[derive(Debug, Clone, Copy)]
pub struct LocationRegistry {
    entries: &'static [LocationEntry],
    fallback: LocationEntry,
}

impl LocationRegistry {
    pub const fn new(entries: &'static [LocationEntry], fallback: LocationEntry) -> Self {
        Self { entries, fallback }
    }

    /// Built-in registry for the target country.
    pub const fn builtin() -> Self {
        Self::new(SENEGAL_LOCATIONS, CAPITAL)
    }

    pub fn entries(&self) -> &'static [LocationEntry] {
        self.entries
    }

    pub fn fallback(&self) -> LocationEntry {
        self.fallback
    }

    /// First `n` names in registry order (used as prompt hints).
    pub fn sample_names(&self, n: usize) -> Vec<&'static str> {
        self.entries.iter().take(n).map(|e| e.name).collect()
    }

    /// First entry whose name contains `place` or is contained in it (case-insensitive).
    pub fn find_first(&self, place: &str) -> Option<&'static LocationEntry> {
        let p = place.trim().to_lowercase();
        if p.is_empty() {
            return None;
        }
        self.entries.iter().find(|e| {
            let name = e.name.to_lowercase();
            p.contains(&name) || name.contains(&p)
        })
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
