//! Tiered representations of catalogue records.
//!
//! Every entity offers some of four tiers: MIN (a reference), LIST (sortable
//! metadata), EMBED (one level of nested children) and FULL (everything).
//! MIN, LIST and EMBED are cached under `{TIER}-{uuid}`; FULL is recomputed per
//! request.

mod attachment;
mod collection;
mod composer;
pub mod fields;
mod movement;
mod piece;
mod representation;
mod taxonomy;
mod tier;
mod tiered;
mod user;

pub use representation::{Representation, array};
pub use tier::{ParseTierError, Tier};
pub use tiered::{SerializeError, Serializable, SiteLinks, TieredSerializer, Viewer};
