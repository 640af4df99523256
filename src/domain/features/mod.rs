//! Feature domain - engineered signals shared by the analytical models

mod extractor;

pub use extractor::{FeatureExtractor, FeatureSeries, PriceFeatures};
