mod district;
mod feature;
mod record;
mod theme;

pub use district::DistrictKey;
pub(crate) use district::normalize;
pub use feature::{BoundaryFeature, MarkerPlacement};
pub use record::{OfficeStatus, RegionRecord};
pub use theme::MapTheme;
