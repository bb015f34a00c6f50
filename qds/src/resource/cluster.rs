//! <https://docs.qubole.com/en/latest/rest-api/cluster_api/>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::id::ClusterIdLabel;
use crate::errors::*;

/// A remote, on-demand compute cluster managed by QDS.
///
/// The service owns this schema, and it changes out from under clients, so we
/// only model the handful of fields callers routinely look at. Everything
/// else lands in `extra` untouched.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct Cluster {
    /// The numeric id the service assigned to this cluster.
    pub id: Option<u64>,

    /// The labels addressing this cluster.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label: Vec<String>,

    /// The current lifecycle state, as reported by the service.
    pub state: Option<String>,

    /// Any descriptor fields we don't model, passed through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The show endpoint wraps the descriptor in a one-key envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ClusterEnvelope {
    pub(crate) cluster: Cluster,
}

/// Arguments used to create a cluster.
///
/// Every field is tri-state: `None` is left out of the serialized request
/// entirely, so the service falls back to its account-level default, while
/// an explicit `false` or `0` is sent verbatim. A sub-document with no
/// supplied fields must be left as `None`, never attached empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClusterRequest {
    /// Labels addressing the new cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Vec<String>>,

    /// Presto version, mandatory for Presto clusters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presto_version: Option<String>,

    /// Spark version, mandatory for Spark clusters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spark_version: Option<String>,

    /// Prevent auto-termination of the cluster after a prolonged period of
    /// disuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallow_cluster_termination: Option<bool>,

    /// Enable Ganglia monitoring for the cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ganglia_monitoring: Option<bool>,

    /// A file executed on every node of the cluster at boot time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_bootstrap_file: Option<String>,

    /// Terminate the cluster after this many idle hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_cluster_timeout: Option<i64>,

    /// Compute-provider settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec2_settings: Option<Ec2Settings>,

    /// Node and autoscaling configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_configuration: Option<NodeConfiguration>,

    /// Big-data-engine settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hadoop_settings: Option<HadoopSettings>,

    /// Security settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_settings: Option<SecuritySettings>,
}

/// Compute-provider settings for a cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ec2Settings {
    /// EC2 access key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_access_key: Option<String>,

    /// EC2 secret key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_secret_key: Option<String>,

    /// AWS region in which the cluster is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    /// Preferred availability zone, or "Any".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_preferred_availability_zone: Option<String>,

    /// Id of the VPC in which the cluster is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    /// Id of the subnet in which the cluster is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,

    /// Bastion host public DNS name, for clusters in a private subnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bastion_node_public_dns: Option<String>,

    /// Port of the bastion node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bastion_node_port: Option<u16>,

    /// User on the bastion node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bastion_node_user: Option<String>,

    /// Use the account's compute credentials for all clusters of the
    /// account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_account_compute_creds: Option<bool>,
}

impl Ec2Settings {
    /// True if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self == &Ec2Settings::default()
    }
}

/// Node and autoscaling configuration for a cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NodeConfiguration {
    /// Instance type of the cluster's master node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_instance_type: Option<String>,

    /// Instance type of the cluster's slave nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slave_instance_type: Option<String>,

    /// Number of nodes to start the cluster with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_nodes: Option<i64>,

    /// Maximum number of nodes up to which the cluster can be auto-scaled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<i64>,

    /// Bidding policy for stable spot instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable_spot_instance_settings: Option<StableSpotInstanceSettings>,

    /// Request type for the autoscaled slave instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slave_request_type: Option<SlaveRequestType>,

    /// Fall back to on-demand nodes if spot nodes could not be obtained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_to_ondemand: Option<bool>,

    /// EBS volume type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_volume_type: Option<EbsVolumeType>,

    /// EBS volume size, in gigabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_volume_size: Option<i64>,

    /// Number of EBS volumes to attach to each cluster instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_volume_count: Option<i64>,

    /// Additional tags applied to cluster nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_ec2_tags: Option<BTreeMap<String, String>>,
}

impl NodeConfiguration {
    /// True if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self == &NodeConfiguration::default()
    }
}

/// Bidding policy for stable spot instances.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StableSpotInstanceSettings {
    /// Maximum bid for spot instances, as a percentage of the on-demand
    /// price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_bid_price_percentage: Option<i64>,
}

/// How autoscaled slave instances are purchased.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaveRequestType {
    /// Regular on-demand instances.
    OnDemand,
    /// Spot instances.
    Spot,
}

impl FromStr for SlaveRequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ondemand" => Ok(SlaveRequestType::OnDemand),
            "spot" => Ok(SlaveRequestType::Spot),
            _ => Err(Error::InvalidChoice {
                expected: "ondemand|spot",
                found: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SlaveRequestType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaveRequestType::OnDemand => write!(fmt, "ondemand"),
            SlaveRequestType::Spot => write!(fmt, "spot"),
        }
    }
}

/// The type of an EBS volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EbsVolumeType {
    /// Magnetic storage.
    Standard,
    /// General-purpose SSD storage (older accounts).
    Ssd,
    /// General-purpose SSD storage.
    Gp2,
    /// Throughput-optimized HDD storage.
    St1,
    /// Cold HDD storage.
    Sc1,
}

impl FromStr for EbsVolumeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(EbsVolumeType::Standard),
            "ssd" => Ok(EbsVolumeType::Ssd),
            "gp2" => Ok(EbsVolumeType::Gp2),
            "st1" => Ok(EbsVolumeType::St1),
            "sc1" => Ok(EbsVolumeType::Sc1),
            _ => Err(Error::InvalidChoice {
                expected: "standard|ssd|gp2|st1|sc1",
                found: s.to_owned(),
            }),
        }
    }
}

/// Big-data-engine settings for a cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HadoopSettings {
    /// Start Hadoop 2 daemons on the cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_hadoop2: Option<bool>,

    /// Run Spark on the cluster. Mandatory for a Spark cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_spark: Option<bool>,

    /// Use the Qubole block placement policy for clusters with spot nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_qubole_placement_policy: Option<bool>,
}

impl HadoopSettings {
    /// True if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self == &HadoopSettings::default()
    }
}

/// Security settings for a cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SecuritySettings {
    /// Encrypt the ephemeral drives on the instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_ephemerals: Option<bool>,

    /// SSH public key to install on the instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,

    /// Overrides the account-level security group settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_security_group: Option<String>,
}

impl SecuritySettings {
    /// True if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self == &SecuritySettings::default()
    }
}

/// A single cluster lifecycle operation, carrying exactly the inputs that
/// operation needs. A command without a cluster id cannot be constructed for
/// the four operations that require one.
#[derive(Clone, Debug)]
pub enum ClusterCommand {
    /// Create a cluster from a request document.
    Setup(ClusterRequest),

    /// Fetch a cluster descriptor.
    Get(ClusterIdLabel),

    /// Start a stopped cluster.
    Start(ClusterIdLabel),

    /// Terminate a running cluster.
    Stop(ClusterIdLabel),

    /// Delete a cluster.
    Delete(ClusterIdLabel),
}

impl ClusterCommand {
    /// Does a successful run of this command mutate remote state?
    pub fn changes_remote_state(&self) -> bool {
        !matches!(self, ClusterCommand::Get(_))
    }
}

/// What a dispatched command produced.
#[derive(Debug, Serialize)]
pub struct Outcome {
    /// True if the operation mutated remote state.
    pub changed: bool,

    /// The payload the service returned: a cluster descriptor for
    /// `Setup`/`Get`, an operation acknowledgement otherwise.
    pub cluster: Value,
}

#[test]
fn empty_request_serializes_to_an_empty_document() {
    use serde_json::json;
    let request = ClusterRequest::default();
    assert_eq!(json!(request), json!({}));
}

#[test]
fn groups_keep_exactly_the_supplied_fields() {
    use serde_json::json;
    let request = ClusterRequest {
        label: Some(vec!["a".to_owned()]),
        node_configuration: Some(NodeConfiguration {
            initial_nodes: Some(2),
            max_nodes: Some(4),
            slave_request_type: Some(SlaveRequestType::Spot),
            ..NodeConfiguration::default()
        }),
        ..ClusterRequest::default()
    };
    assert_eq!(
        json!(request),
        json!({
            "label": ["a"],
            "node_configuration": {
                "initial_nodes": 2,
                "max_nodes": 4,
                "slave_request_type": "spot",
            },
        })
    );
}

#[test]
fn explicit_false_values_are_sent_not_dropped() {
    use serde_json::json;
    let request = ClusterRequest {
        hadoop_settings: Some(HadoopSettings {
            use_hadoop2: Some(false),
            use_spark: Some(false),
            ..HadoopSettings::default()
        }),
        ..ClusterRequest::default()
    };
    assert_eq!(
        json!(request),
        json!({
            "hadoop_settings": {
                "use_hadoop2": false,
                "use_spark": false,
            },
        })
    );
}

#[test]
fn spot_bid_nests_under_stable_spot_instance_settings() {
    use serde_json::json;
    let node = NodeConfiguration {
        stable_spot_instance_settings: Some(StableSpotInstanceSettings {
            maximum_bid_price_percentage: Some(80),
        }),
        ..NodeConfiguration::default()
    };
    assert_eq!(
        json!(node),
        json!({
            "stable_spot_instance_settings": {
                "maximum_bid_price_percentage": 80,
            },
        })
    );
}

#[test]
fn only_get_leaves_remote_state_alone() {
    let id = ClusterIdLabel::from_str("1234").unwrap();
    assert!(ClusterCommand::Setup(ClusterRequest::default()).changes_remote_state());
    assert!(!ClusterCommand::Get(id.clone()).changes_remote_state());
    assert!(ClusterCommand::Start(id.clone()).changes_remote_state());
    assert!(ClusterCommand::Stop(id.clone()).changes_remote_state());
    assert!(ClusterCommand::Delete(id).changes_remote_state());
}

#[test]
fn cluster_descriptor_keeps_unmodeled_fields() {
    let json = r#"{
        "id": 1234,
        "label": ["analytics"],
        "state": "DOWN",
        "node_configuration": {"master_instance_type": "m1.large"},
        "presto_version": "0.193"
    }"#;
    let cluster: Cluster = serde_json::from_str(json).unwrap();
    assert_eq!(cluster.id, Some(1234));
    assert_eq!(cluster.label, vec!["analytics".to_owned()]);
    assert_eq!(cluster.state.as_deref(), Some("DOWN"));
    assert!(cluster.extra.contains_key("node_configuration"));
    assert!(cluster.extra.contains_key("presto_version"));
}

#[test]
fn choice_sets_are_closed() {
    assert_eq!(
        "spot".parse::<SlaveRequestType>().unwrap(),
        SlaveRequestType::Spot
    );
    assert!("preemptible".parse::<SlaveRequestType>().is_err());
    assert_eq!("gp2".parse::<EbsVolumeType>().unwrap(), EbsVolumeType::Gp2);
    assert!("io1".parse::<EbsVolumeType>().is_err());
}
