//! `key=value` tags applied to cluster instances.

use anyhow::{format_err, Error, Result};
use std::str::FromStr;

/// A tag applied to every EC2 instance in the cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ec2Tag {
    /// The tag key.
    pub key: String,

    /// The tag value.
    pub value: String,
}

/// Declare a `FromStr` implementation for `Ec2Tag` so that `structopt` can
/// parse command-line arguments directly into `Ec2Tag` values.
impl FromStr for Ec2Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let split = s.splitn(2, '=').collect::<Vec<&str>>();
        if split.len() != 2 {
            return Err(format_err!("tag {:?} must have form \"key=value\"", s));
        }
        Ok(Ec2Tag {
            key: split[0].to_owned(),
            value: split[1].to_owned(),
        })
    }
}

#[test]
fn parses_key_value_pairs() {
    let tag = "team=data".parse::<Ec2Tag>().unwrap();
    assert_eq!(tag.key, "team");
    assert_eq!(tag.value, "data");
}

#[test]
fn values_may_contain_equals_signs() {
    let tag = "note=a=b".parse::<Ec2Tag>().unwrap();
    assert_eq!(tag.key, "note");
    assert_eq!(tag.value, "a=b");
}

#[test]
fn rejects_bare_keys() {
    assert!("team".parse::<Ec2Tag>().is_err());
}
