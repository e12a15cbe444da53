//! Implements the FeatureSet feature (ID `0x0001`) that every device supports
//! by default.
//!
//! Only the feature ID is needed here. Resolving it through
//! [`crate::feature::root::RootFeature::get_feature_index`] doubles as a
//! liveness probe during device discovery, since every HID++2.0 device
//! carries this feature in its table.

/// The protocol ID of the FeatureSet feature.
pub const FEATURE_ID: u16 = 0x0001;
