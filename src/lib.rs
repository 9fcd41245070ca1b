//! Bayesian evidence estimation via nested sampling with a multi-ellipsoidal
//! constrained prior sampler (MultiNest-style).
//!
//! The live-point population is evolved one replacement at a time: the
//! worst point is retired into the posterior sample, its prior-mass shell
//! folded into the evidence accumulator in log space, and a replacement is
//! drawn uniformly from the prior restricted to the current likelihood
//! threshold via rejection sampling over a union of bounding ellipsoids
//! built from a k-means clustering of the live set.
//!
//! [`NestedSampler`] is the entry point; [`RunConfig`] configures a run,
//! and [`ResultsExtractor`]/[`write_outputs`] turn the resulting posterior
//! sample into summary statistics and the documented output files.

pub mod clusterer;
pub mod config;
pub mod ellipsoid;
pub mod error;
pub mod evidence;
pub mod likelihoods;
pub mod linalg;
pub mod live;
pub mod metric;
pub mod prior;
pub mod reducer;
pub mod results;
pub mod sampler;

mod nested_sampler;

pub use config::RunConfig;
pub use error::{Result, SamplerError};
pub use nested_sampler::{NestedSampler, PartialRunError, RunReport, SamplerOutcome};
pub use reducer::LivePointReducer;
pub use results::{write_outputs, ParameterSummary, ResultsExtractor};
