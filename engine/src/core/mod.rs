//! Decision logic shared by the request and runtime paths

pub mod probability;
pub mod registry;
pub mod toggles;

pub use probability::ProbabilitySelector;
pub use registry::AssaultRegistry;
pub use toggles::{PrefixToggleNameMapper, ToggleEvaluator};
