//! Capability profiles.
//!
//! Profiles form one linear chain; each node adds a set of features to
//! everything before it. A feature's minimum profile is the first node
//! whose cumulative set contains it.

use derive_more::Display;
use serde::Deserialize;
use std::{collections::BTreeSet, str::FromStr};
use thiserror::Error as ThisError;

///
/// Profile
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Profile {
    #[display("cassandra_2_1")]
    #[serde(rename = "cassandra_2_1")]
    Cassandra21,

    #[display("cassandra_2_2")]
    #[serde(rename = "cassandra_2_2")]
    Cassandra22,

    #[default]
    #[display("cassandra_3_0")]
    #[serde(rename = "cassandra_3_0")]
    Cassandra30,

    #[display("cassandra_3_6")]
    #[serde(rename = "cassandra_3_6")]
    Cassandra36,

    #[display("cassandra_3_7")]
    #[serde(rename = "cassandra_3_7")]
    Cassandra37,

    #[display("dse_5_1")]
    #[serde(rename = "dse_5_1")]
    Dse51,
}

impl FromStr for Profile {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PROFILE_CHAIN
            .iter()
            .map(|delta| delta.profile)
            .find(|profile| profile.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CapabilityError::UnknownProfile {
                name: s.to_string(),
            })
    }
}

///
/// Feature
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Feature {
    #[display("lightweight transactions")]
    LightweightTransactions,
    #[display("static columns")]
    StaticColumns,
    #[display("collection index")]
    CollectionIndex,
    #[display("map key index")]
    MapKeyIndex,
    #[display("JSON statements")]
    JsonStatements,
    #[display("JSON relations")]
    JsonRelations,
    #[display("user functions")]
    UserFunctions,
    #[display("full collection index")]
    FullCollectionIndex,
    #[display("materialized views")]
    MaterializedViews,
    #[display("map entry index")]
    MapEntryIndex,
    #[display("clustering range delete")]
    ClusteringRangeDelete,
    #[display("per partition limit")]
    PerPartitionLimit,
    #[display("non-frozen user type")]
    NonFrozenUdt,
    #[display("SASI index")]
    SasiIndex,
    #[display("DSE search index")]
    DseSearch,
}

///
/// ProfileDelta
///

#[derive(Clone, Copy, Debug)]
pub struct ProfileDelta {
    pub profile: Profile,
    pub adds: &'static [Feature],
}

pub const PROFILE_CHAIN: &[ProfileDelta] = &[
    ProfileDelta {
        profile: Profile::Cassandra21,
        adds: &[
            Feature::LightweightTransactions,
            Feature::StaticColumns,
            Feature::CollectionIndex,
            Feature::MapKeyIndex,
        ],
    },
    ProfileDelta {
        profile: Profile::Cassandra22,
        adds: &[
            Feature::JsonStatements,
            Feature::JsonRelations,
            Feature::UserFunctions,
            Feature::FullCollectionIndex,
        ],
    },
    ProfileDelta {
        profile: Profile::Cassandra30,
        adds: &[
            Feature::MaterializedViews,
            Feature::MapEntryIndex,
            Feature::ClusteringRangeDelete,
        ],
    },
    ProfileDelta {
        profile: Profile::Cassandra36,
        adds: &[Feature::PerPartitionLimit, Feature::NonFrozenUdt],
    },
    ProfileDelta {
        profile: Profile::Cassandra37,
        adds: &[Feature::SasiIndex],
    },
    ProfileDelta {
        profile: Profile::Dse51,
        adds: &[Feature::DseSearch],
    },
];

///
/// CapabilityError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CapabilityError {
    #[error("{feature} requires profile {minimum} or later, selected profile is {selected}")]
    FeatureUnavailable {
        feature: Feature,
        selected: Profile,
        minimum: Profile,
    },

    #[error("unknown profile '{name}'")]
    UnknownProfile { name: String },
}

///
/// Capabilities
/// The folded feature set of one profile.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Capabilities {
    profile: Profile,
    features: BTreeSet<Feature>,
}

impl Capabilities {
    #[must_use]
    pub fn for_profile(profile: Profile) -> Self {
        let mut features = BTreeSet::new();
        for delta in PROFILE_CHAIN {
            features.extend(delta.adds.iter().copied());
            if delta.profile == profile {
                break;
            }
        }

        Self { profile, features }
    }

    #[must_use]
    pub const fn profile(&self) -> Profile {
        self.profile
    }

    #[must_use]
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn require(&self, feature: Feature) -> Result<(), CapabilityError> {
        if self.has(feature) {
            return Ok(());
        }

        Err(CapabilityError::FeatureUnavailable {
            feature,
            selected: self.profile,
            minimum: minimum_profile(feature),
        })
    }
}

/// First profile of the chain whose cumulative set contains `feature`.
#[must_use]
pub fn minimum_profile(feature: Feature) -> Profile {
    PROFILE_CHAIN
        .iter()
        .find(|delta| delta.adds.contains(&feature))
        .map_or(Profile::Dse51, |delta| delta.profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_accumulate_along_the_chain() {
        let c21 = Capabilities::for_profile(Profile::Cassandra21);
        assert!(c21.has(Feature::StaticColumns));
        assert!(!c21.has(Feature::JsonStatements));

        let c37 = Capabilities::for_profile(Profile::Cassandra37);
        assert!(c37.has(Feature::LightweightTransactions));
        assert!(c37.has(Feature::MaterializedViews));
        assert!(c37.has(Feature::SasiIndex));
        assert!(!c37.has(Feature::DseSearch));

        let dse = Capabilities::for_profile(Profile::Dse51);
        assert!(PROFILE_CHAIN
            .iter()
            .flat_map(|delta| delta.adds)
            .all(|feature| dse.has(*feature)));
    }

    #[test]
    fn missing_features_name_the_minimum_profile() {
        let err = Capabilities::for_profile(Profile::Cassandra22)
            .require(Feature::MaterializedViews)
            .unwrap_err();

        assert_eq!(
            err,
            CapabilityError::FeatureUnavailable {
                feature: Feature::MaterializedViews,
                selected: Profile::Cassandra22,
                minimum: Profile::Cassandra30,
            }
        );
        assert_eq!(
            err.to_string(),
            "materialized views requires profile cassandra_3_0 or later, selected profile is cassandra_2_2"
        );
    }

    #[test]
    fn profiles_parse_by_name() {
        assert_eq!("dse_5_1".parse::<Profile>(), Ok(Profile::Dse51));
        assert_eq!(" CASSANDRA_3_6 ".parse::<Profile>(), Ok(Profile::Cassandra36));
        assert!(matches!(
            "cassandra_4_0".parse::<Profile>(),
            Err(CapabilityError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn every_feature_has_exactly_one_minimum() {
        let mut seen = BTreeSet::new();
        for delta in PROFILE_CHAIN {
            for feature in delta.adds {
                assert!(seen.insert(*feature), "{feature} added twice");
                assert_eq!(minimum_profile(*feature), delta.profile);
            }
        }
    }
}
