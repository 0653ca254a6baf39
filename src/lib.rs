#![doc = "Wardmap public API"]
mod alias;
mod boundary;
mod geojson;
mod interact;
mod markers;
mod select;
mod types;

#[doc(inline)]
pub use types::{BoundaryFeature, DistrictKey, MapTheme, MarkerPlacement, OfficeStatus, RegionRecord};

#[doc(inline)]
pub use alias::AliasTable;

#[doc(inline)]
pub use boundary::{
    BoundaryDataset, BoundaryResolver, BoundaryStore, CachedBoundary, FALLBACK_CENTER,
    FileDataset, FileStore, HttpLookup, MemoryStore, RemoteLookup, ResolverConfig,
    boundary_center,
};

#[doc(inline)]
pub use select::select_primary;

#[doc(inline)]
pub use markers::{COLLISION_OFFSET_DEG, Geocoder, HttpGeocoder, place_markers};

#[doc(inline)]
pub use interact::{InteractionState, MapEvent, MapInteraction, NAV_DELAY};
