use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::CoreError;

/// A single ad provider entry. Identity is `provider`; `score` drives ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sdk {
    pub provider: String,
    pub score: f64,
}

impl Sdk {
    pub fn new(provider: impl Into<String>, score: f64) -> Self {
        Self {
            provider: provider.into(),
            score,
        }
    }
}

/// The three ad slot types every network carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Banner,
    Interstitial,
    Video,
}

impl SlotKind {
    pub const ALL: [SlotKind; 3] = [SlotKind::Banner, SlotKind::Interstitial, SlotKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Banner => "banner",
            SlotKind::Interstitial => "interstitial",
            SlotKind::Video => "video",
        }
    }
}

/// One country's ranked provider lists, split per ad type.
/// `country` is the cache key; one record per country.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdNetwork {
    #[serde(default)]
    pub banner: Vec<Sdk>,
    #[serde(default)]
    pub interstitial: Vec<Sdk>,
    #[serde(default)]
    pub video: Vec<Sdk>,
    pub country: String,
}

impl AdNetwork {
    pub fn slot(&self, kind: SlotKind) -> &[Sdk] {
        match kind {
            SlotKind::Banner => &self.banner,
            SlotKind::Interstitial => &self.interstitial,
            SlotKind::Video => &self.video,
        }
    }

    /// True iff every name in `providers` appears in the named slot.
    /// An empty `providers` list is vacuously true.
    pub fn contains_all_providers(&self, kind: SlotKind, providers: &[String]) -> bool {
        providers
            .iter()
            .all(|name| self.slot(kind).iter().any(|sdk| &sdk.provider == name))
    }

    /// The subsequence of `providers` present in the named slot, in the
    /// order of `providers` (not slot order). The first element of the
    /// result is the highest-priority provider present.
    pub fn contains_any_providers(&self, kind: SlotKind, providers: &[String]) -> Vec<String> {
        providers_present(self.slot(kind), providers)
    }

    /// True if any of the three slots has no SDKs left.
    pub fn has_empty_slot(&self) -> bool {
        self.banner.is_empty() || self.interstitial.is_empty() || self.video.is_empty()
    }
}

/// The subsequence of `providers` present in `slot`, preserving the order
/// of `providers`.
pub fn providers_present(slot: &[Sdk], providers: &[String]) -> Vec<String> {
    providers
        .iter()
        .filter(|name| slot.iter().any(|sdk| sdk.provider == **name))
        .cloned()
        .collect()
}

/// Removes every SDK whose provider is named in `providers`. Survivors keep
/// their relative order. Takes the slot by value so concurrent per-slot
/// tasks never share mutable state.
pub fn strip_providers(slot: Vec<Sdk>, providers: &[String]) -> Vec<Sdk> {
    slot.into_iter()
        .filter(|sdk| !providers.contains(&sdk.provider))
        .collect()
}

/// Sorts a slot by descending score. Stable, so ties keep their original
/// relative order; `total_cmp` keeps the comparison panic-free.
pub fn sort_by_score(slot: &mut [Sdk]) {
    slot.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Re-keys a batch of networks by country code. Two records sharing a
/// country code abort the whole batch before any map is handed out.
pub fn to_country_map(networks: Vec<AdNetwork>) -> Result<HashMap<String, AdNetwork>, CoreError> {
    let mut map = HashMap::with_capacity(networks.len());
    for network in networks {
        if map.contains_key(&network.country) {
            return Err(CoreError::DuplicateCountry(network.country));
        }
        map.insert(network.country.clone(), network);
    }
    Ok(map)
}

/// Wire shape of the ingestion feed: `{ "data": [AdNetwork, ...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkFeed {
    pub data: Vec<AdNetwork>,
}
