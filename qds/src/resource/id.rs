//! Cluster identifiers used by the QDS API.

use serde::de::Unexpected;
use serde::{self, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::*;

/// A cluster identifier: either the numeric cluster id or one of the
/// cluster's labels. The API accepts both in the same path position, so we
/// don't distinguish them client-side.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterIdLabel {
    /// The id or label of the cluster.
    id_label: String,
}

impl ClusterIdLabel {
    /// Get this identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.id_label
    }
}

impl FromStr for ClusterIdLabel {
    type Err = Error;

    fn from_str(id_label: &str) -> Result<Self> {
        if id_label.is_empty() {
            Err(Error::EmptyClusterIdLabel {})
        } else {
            Ok(ClusterIdLabel {
                id_label: id_label.to_owned(),
            })
        }
    }
}

impl fmt::Debug for ClusterIdLabel {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", &self.id_label)
    }
}

impl fmt::Display for ClusterIdLabel {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", &self.id_label)
    }
}

impl<'de> Deserialize<'de> for ClusterIdLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id_label: String = String::deserialize(deserializer)?;
        if id_label.is_empty() {
            let unexpected = Unexpected::Str(&id_label);
            Err(<D::Error as serde::de::Error>::invalid_value(
                unexpected,
                &"a non-empty cluster id or label",
            ))
        } else {
            Ok(ClusterIdLabel { id_label })
        }
    }
}

impl Serialize for ClusterIdLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.id_label.serialize(serializer)
    }
}

#[test]
fn accepts_ids_and_labels() {
    assert_eq!(ClusterIdLabel::from_str("1234").unwrap().as_str(), "1234");
    assert_eq!(
        ClusterIdLabel::from_str("analytics").unwrap().as_str(),
        "analytics"
    );
}

#[test]
fn rejects_the_empty_string() {
    assert!(ClusterIdLabel::from_str("").is_err());
}
