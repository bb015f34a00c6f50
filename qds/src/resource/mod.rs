//! Resource types manipulated by the QDS cluster API.

// We re-export the main names from our submodules. For anything else, use a
// fully-qualified name.
pub use self::cluster::{
    Cluster, ClusterCommand, ClusterRequest, EbsVolumeType, Ec2Settings,
    HadoopSettings, NodeConfiguration, Outcome, SecuritySettings,
    SlaveRequestType, StableSpotInstanceSettings,
};
pub use self::id::ClusterIdLabel;

pub mod cluster;
mod id;
