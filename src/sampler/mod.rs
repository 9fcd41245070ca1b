pub mod multi_ellipsoid;

pub use multi_ellipsoid::{ConstrainedSamplerConfig, MultiEllipsoidSampler};
