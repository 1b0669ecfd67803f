use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use admix_core::models::{providers_present, sort_by_score, strip_providers, Sdk};
use admix_core::{AdNetwork, AdRequest};

use crate::rules::{PostfilterRules, PrefilterRule};

/// Applies the configured rule set to networks. Rules are loaded once and
/// read-only for the process lifetime; the engine is shared behind `Arc`.
pub struct FilterEngine {
    prefilter: Vec<PrefilterRule>,
    postfilter: PostfilterRules,
}

impl FilterEngine {
    pub fn new(prefilter: Vec<PrefilterRule>, postfilter: PostfilterRules) -> Self {
        Self {
            prefilter,
            postfilter,
        }
    }

    /// Runs every pre-filter rule over one network in declaration order,
    /// then rank-sorts all three slots.
    pub async fn prefilter_one(&self, mut network: AdNetwork) -> AdNetwork {
        for rule in &self.prefilter {
            match rule {
                PrefilterRule::ExcludeCountry(map) => {
                    if let Some(providers) = map.get(&network.country) {
                        network = exclude(network, providers).await;
                    }
                }
                PrefilterRule::MutualPriority(groups) => {
                    for group in groups.values() {
                        network = resolve_mutual_priority(network, group).await;
                    }
                }
            }
        }

        sort_by_score(&mut network.banner);
        sort_by_score(&mut network.interstitial);
        sort_by_score(&mut network.video);
        network
    }

    /// Pre-filters a batch, one spawned task per network. The channel is
    /// sized to the input so no producer can block; channel closure is the
    /// join barrier. Output order is unspecified — callers re-key by
    /// country downstream.
    pub async fn prefilter_all(self: Arc<Self>, networks: Vec<AdNetwork>) -> Vec<AdNetwork> {
        let total = networks.len();
        let (tx, mut rx) = mpsc::channel(total.max(1));

        for network in networks {
            let engine = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                let filtered = engine.prefilter_one(network).await;
                let _ = tx.send(filtered).await;
            });
        }
        drop(tx);

        let mut out = Vec::with_capacity(total);
        while let Some(network) = rx.recv().await {
            out.push(network);
        }
        debug!(total, "prefiltered batch");
        out
    }

    /// Applies the request-time rules to one network: OS/version first,
    /// then device. Within each kind only the first matching entry applies.
    pub async fn postfilter(&self, mut network: AdNetwork, request: &AdRequest) -> AdNetwork {
        if let Some(args) = self
            .postfilter
            .os_version
            .args
            .iter()
            .find(|args| args.os.eq_ignore_ascii_case(&request.platform))
        {
            if args.versions.contains(&request.os_version) {
                network = exclude(network, &args.exclude).await;
            }
        }

        if let Some(args) = self
            .postfilter
            .device
            .args
            .iter()
            .find(|args| args.kind.eq_ignore_ascii_case(&request.device))
        {
            network = exclude(network, &args.exclude).await;
        }

        network
    }
}

/// Strips `providers` from all three slots concurrently. Each slot moves
/// into its own future by value, so the three tasks share no state.
async fn exclude(mut network: AdNetwork, providers: &[String]) -> AdNetwork {
    let banner = std::mem::take(&mut network.banner);
    let interstitial = std::mem::take(&mut network.interstitial);
    let video = std::mem::take(&mut network.video);

    let (banner, interstitial, video) = tokio::join!(
        async { strip_providers(banner, providers) },
        async { strip_providers(interstitial, providers) },
        async { strip_providers(video, providers) },
    );

    network.banner = banner;
    network.interstitial = interstitial;
    network.video = video;
    network
}

/// Per slot: if more than one provider of a priority-ordered group is
/// present, keep the first and drop the rest. Independent per slot — a
/// provider may win in banner and lose in video.
async fn resolve_mutual_priority(mut network: AdNetwork, group: &[String]) -> AdNetwork {
    let banner = std::mem::take(&mut network.banner);
    let interstitial = std::mem::take(&mut network.interstitial);
    let video = std::mem::take(&mut network.video);

    let (banner, interstitial, video) = tokio::join!(
        async { resolve_slot(banner, group) },
        async { resolve_slot(interstitial, group) },
        async { resolve_slot(video, group) },
    );

    network.banner = banner;
    network.interstitial = interstitial;
    network.video = video;
    network
}

fn resolve_slot(slot: Vec<Sdk>, group: &[String]) -> Vec<Sdk> {
    let present = providers_present(&slot, group);
    if present.len() > 1 {
        strip_providers(slot, &present[1..])
    } else {
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn group_map(name: &str, providers: &[&str]) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), names(providers));
        map
    }

    fn cn_network() -> AdNetwork {
        let slot = vec![Sdk::new("AdMob-OptOut", 10.0), Sdk::new("HuaweiAds", 8.0)];
        AdNetwork {
            banner: slot.clone(),
            interstitial: slot.clone(),
            video: slot,
            country: "CN".to_string(),
        }
    }

    #[tokio::test]
    async fn exclude_country_strips_all_slots() {
        let mut map = BTreeMap::new();
        map.insert("CN".to_string(), names(&["HuaweiAds"]));
        let engine = FilterEngine::new(
            vec![PrefilterRule::ExcludeCountry(map)],
            PostfilterRules::default(),
        );

        let out = engine.prefilter_one(cn_network()).await;
        assert_eq!(out.banner, vec![Sdk::new("AdMob-OptOut", 10.0)]);
        assert_eq!(out.interstitial, vec![Sdk::new("AdMob-OptOut", 10.0)]);
        assert_eq!(out.video, vec![Sdk::new("AdMob-OptOut", 10.0)]);
    }

    #[tokio::test]
    async fn exclude_country_skips_other_countries() {
        let mut map = BTreeMap::new();
        map.insert("CN".to_string(), names(&["HuaweiAds"]));
        let engine = FilterEngine::new(
            vec![PrefilterRule::ExcludeCountry(map)],
            PostfilterRules::default(),
        );

        let mut network = cn_network();
        network.country = "DE".to_string();
        let out = engine.prefilter_one(network).await;
        assert_eq!(out.banner.len(), 2);
    }

    #[tokio::test]
    async fn mutual_priority_keeps_highest_priority_present() {
        let engine = FilterEngine::new(
            vec![PrefilterRule::MutualPriority(group_map(
                "social",
                &["Facebook", "Twitter", "Instagram"],
            ))],
            PostfilterRules::default(),
        );

        let slot = vec![
            Sdk::new("Facebook", 4.0),
            Sdk::new("AdMob", 9.0),
            Sdk::new("Twitter", 6.0),
        ];
        let network = AdNetwork {
            banner: slot.clone(),
            interstitial: slot.clone(),
            video: slot,
            country: "SI".to_string(),
        };

        let out = engine.prefilter_one(network).await;
        let providers: Vec<&str> = out.banner.iter().map(|s| s.provider.as_str()).collect();
        assert!(providers.contains(&"Facebook"));
        assert!(providers.contains(&"AdMob"));
        assert!(!providers.contains(&"Twitter"));
    }

    #[tokio::test]
    async fn mutual_priority_resolves_per_slot() {
        let engine = FilterEngine::new(
            vec![PrefilterRule::MutualPriority(group_map(
                "social",
                &["Facebook", "Twitter"],
            ))],
            PostfilterRules::default(),
        );

        // Facebook only appears in banner, so video keeps Twitter.
        let network = AdNetwork {
            banner: vec![Sdk::new("Facebook", 4.0), Sdk::new("Twitter", 6.0)],
            interstitial: vec![Sdk::new("AdMob", 9.0)],
            video: vec![Sdk::new("Twitter", 6.0)],
            country: "SI".to_string(),
        };

        let out = engine.prefilter_one(network).await;
        assert_eq!(out.banner.len(), 1);
        assert_eq!(out.banner[0].provider, "Facebook");
        assert_eq!(out.video.len(), 1);
        assert_eq!(out.video[0].provider, "Twitter");
    }

    #[tokio::test]
    async fn prefilter_sorts_slots_descending() {
        let engine = Arc::new(FilterEngine::new(vec![], PostfilterRules::default()));
        let network = AdNetwork {
            banner: vec![
                Sdk::new("Low", 1.0),
                Sdk::new("High", 9.0),
                Sdk::new("Mid", 5.0),
            ],
            interstitial: vec![Sdk::new("Only", 2.0)],
            video: vec![Sdk::new("Only", 2.0)],
            country: "SI".to_string(),
        };

        let out = engine.prefilter_all(vec![network]).await;
        let providers: Vec<&str> = out[0].banner.iter().map(|s| s.provider.as_str()).collect();
        assert_eq!(providers, vec!["High", "Mid", "Low"]);
    }

    #[tokio::test]
    async fn prefilter_all_returns_every_network() {
        let engine = Arc::new(FilterEngine::new(vec![], PostfilterRules::default()));
        let networks: Vec<AdNetwork> = (0..25)
            .map(|i| AdNetwork {
                banner: vec![Sdk::new("AdMob", 1.0)],
                interstitial: vec![Sdk::new("AdMob", 1.0)],
                video: vec![Sdk::new("AdMob", 1.0)],
                country: format!("C{i}"),
            })
            .collect();

        let mut out = engine.prefilter_all(networks).await;
        assert_eq!(out.len(), 25);
        out.sort_by(|a, b| a.country.cmp(&b.country));
        out.dedup_by(|a, b| a.country == b.country);
        assert_eq!(out.len(), 25);
    }

    fn postfilter_rules() -> PostfilterRules {
        serde_json::from_str(
            r#"{
                "osVersion": {
                    "args": [
                        { "os": "ios", "versions": ["9.0", "9.1"], "exclude": ["Facebook"] },
                        { "os": "ios", "versions": ["9.0"], "exclude": ["AdMob"] },
                        { "os": "android", "versions": ["4.4"], "exclude": ["UnityAds"] }
                    ]
                },
                "device": {
                    "args": [ { "type": "tablet", "exclude": ["Vungle"] } ]
                }
            }"#,
        )
        .unwrap()
    }

    fn request(platform: &str, os_version: &str, device: &str) -> AdRequest {
        AdRequest::new("SI", platform, os_version, device)
    }

    fn mixed_network() -> AdNetwork {
        let slot = vec![
            Sdk::new("Facebook", 4.0),
            Sdk::new("AdMob", 9.0),
            Sdk::new("UnityAds", 5.0),
            Sdk::new("Vungle", 3.0),
        ];
        AdNetwork {
            banner: slot.clone(),
            interstitial: slot.clone(),
            video: slot,
            country: "SI".to_string(),
        }
    }

    #[tokio::test]
    async fn postfilter_matches_platform_case_insensitively() {
        let engine = FilterEngine::new(vec![], postfilter_rules());
        let out = engine
            .postfilter(mixed_network(), &request("iOS", "9.0", "phone"))
            .await;
        assert!(out.banner.iter().all(|s| s.provider != "Facebook"));
        // first matching os entry wins; the second ios entry never applies
        assert!(out.banner.iter().any(|s| s.provider == "AdMob"));
    }

    #[tokio::test]
    async fn postfilter_ignores_unlisted_versions() {
        let engine = FilterEngine::new(vec![], postfilter_rules());
        let out = engine
            .postfilter(mixed_network(), &request("ios", "12.0", "phone"))
            .await;
        assert!(out.banner.iter().any(|s| s.provider == "Facebook"));
    }

    #[tokio::test]
    async fn postfilter_applies_device_rule() {
        let engine = FilterEngine::new(vec![], postfilter_rules());
        let out = engine
            .postfilter(mixed_network(), &request("android", "9.0", "Tablet"))
            .await;
        assert!(out.video.iter().all(|s| s.provider != "Vungle"));
        assert!(out.video.iter().any(|s| s.provider == "UnityAds"));
    }

    #[tokio::test]
    async fn postfilter_applies_both_kinds() {
        let engine = FilterEngine::new(vec![], postfilter_rules());
        let out = engine
            .postfilter(mixed_network(), &request("android", "4.4", "tablet"))
            .await;
        assert!(out.banner.iter().all(|s| s.provider != "UnityAds"));
        assert!(out.banner.iter().all(|s| s.provider != "Vungle"));
        assert_eq!(out.banner.len(), 2);
    }
}
