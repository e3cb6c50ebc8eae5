//! Cache key definitions.
//!
//! Keys render as `{TIER}-{uuid}` with TIER one of `MIN`, `LIST`, `EMB`.

use std::fmt;

use uuid::Uuid;

use crate::application::serializers::Tier;

/// Tiers that have a cache slot, richest first.
pub const CACHED_TIERS: [Tier; 3] = [Tier::Embed, Tier::List, Tier::Min];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tier: Tier,
    uuid: Uuid,
}

impl CacheKey {
    /// `None` for tiers that are never cached.
    pub fn new(tier: Tier, uuid: Uuid) -> Option<Self> {
        tier.cache_prefix().map(|_| Self { tier, uuid })
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Every key an entity can occupy.
    pub fn all_for(uuid: Uuid) -> impl Iterator<Item = CacheKey> {
        CACHED_TIERS
            .into_iter()
            .filter_map(move |tier| CacheKey::new(tier, uuid))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.tier.cache_prefix().unwrap_or("FULL");
        write!(f, "{prefix}-{}", self.uuid.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_prefix_and_lowercase_uuid() {
        let uuid = Uuid::parse_str("A1A2A3A4-B1B2-C1C2-D1D2-D3D4D5D6D7D8").expect("uuid");
        let key = CacheKey::new(Tier::Embed, uuid).expect("embed is cached");
        assert_eq!(key.to_string(), "EMB-a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8");

        let min = CacheKey::new(Tier::Min, uuid).expect("min is cached");
        assert!(min.to_string().starts_with("MIN-"));
    }

    #[test]
    fn full_tier_has_no_key() {
        assert!(CacheKey::new(Tier::Full, Uuid::nil()).is_none());
    }

    #[test]
    fn all_for_covers_three_tiers() {
        let keys: Vec<String> = CacheKey::all_for(Uuid::nil())
            .map(|key| key.to_string())
            .collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().any(|key| key.starts_with("LIST-")));
    }
}
