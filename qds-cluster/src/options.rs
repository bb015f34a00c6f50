//! Command-line options for `qds-cluster`.

use qds::resource::{
    ClusterCommand, ClusterIdLabel, ClusterRequest, EbsVolumeType, Ec2Settings,
    HadoopSettings, NodeConfiguration, SecuritySettings, SlaveRequestType,
    StableSpotInstanceSettings,
};
use qds::Client;
use structopt::StructOpt;

use crate::ec2_tag::Ec2Tag;

/// Manage Qubole clusters.
#[derive(Debug, StructOpt)]
#[structopt(name = "qds-cluster", about = "Manage Qubole clusters")]
pub struct Opt {
    /// QDS API token.
    #[structopt(long = "api-token", env = "QDS_API_TOKEN", hide_env_values(true))]
    pub api_token: String,

    /// Base URL of the QDS API, for accounts hosted outside the default
    /// environment.
    #[structopt(long = "api-url", env = "QDS_API_URL")]
    pub api_url: Option<String>,

    /// The lifecycle operation to run.
    #[structopt(subcommand)]
    pub command: Command,
}

impl Opt {
    /// Build the connection context for this invocation.
    pub fn client(&self) -> qds::Result<Client> {
        match &self.api_url {
            Some(api_url) => Client::new_with_endpoint(api_url, self.api_token.as_str()),
            None => Client::new(self.api_token.as_str()),
        }
    }
}

/// One subcommand per cluster lifecycle operation. Everything except `setup`
/// takes the cluster id or label as a required positional, so a missing
/// identifier is rejected before any connection is made.
#[derive(Debug, StructOpt)]
pub enum Command {
    /// Create a new cluster from the supplied configuration.
    #[structopt(name = "setup")]
    Setup(SetupOpt),

    /// Fetch a cluster descriptor without changing anything.
    #[structopt(name = "get")]
    Get {
        /// Cluster id or label.
        #[structopt(name = "CLUSTER")]
        cluster: ClusterIdLabel,
    },

    /// Start a stopped cluster.
    #[structopt(name = "start")]
    Start {
        /// Cluster id or label.
        #[structopt(name = "CLUSTER")]
        cluster: ClusterIdLabel,
    },

    /// Terminate a running cluster.
    #[structopt(name = "stop")]
    Stop {
        /// Cluster id or label.
        #[structopt(name = "CLUSTER")]
        cluster: ClusterIdLabel,
    },

    /// Delete a cluster.
    #[structopt(name = "delete")]
    Delete {
        /// Cluster id or label.
        #[structopt(name = "CLUSTER")]
        cluster: ClusterIdLabel,
    },
}

impl Command {
    /// Convert parsed arguments into the operation to dispatch.
    pub fn into_cluster_command(self) -> ClusterCommand {
        match self {
            Command::Setup(mut setup) => {
                setup.apply_defaults();
                ClusterCommand::Setup(setup.into_cluster_request())
            }
            Command::Get { cluster } => ClusterCommand::Get(cluster),
            Command::Start { cluster } => ClusterCommand::Start(cluster),
            Command::Stop { cluster } => ClusterCommand::Stop(cluster),
            Command::Delete { cluster } => ClusterCommand::Delete(cluster),
        }
    }
}

/// The flat cluster configuration for `setup`, grouped into the nested
/// request document before dispatch.
#[derive(Clone, Debug, Default, StructOpt)]
pub struct SetupOpt {
    /// Label addressing the new cluster (may be repeated).
    #[structopt(long = "label")]
    pub label: Vec<String>,

    /// Presto version, mandatory for Presto clusters.
    #[structopt(long = "presto-version")]
    pub presto_version: Option<String>,

    /// Spark version, mandatory for Spark clusters.
    #[structopt(long = "spark-version")]
    pub spark_version: Option<String>,

    /// Prevent auto-termination of the cluster after a prolonged period of
    /// disuse.
    #[structopt(long = "disallow-cluster-termination")]
    pub disallow_cluster_termination: Option<bool>,

    /// Enable Ganglia monitoring for the cluster.
    #[structopt(long = "enable-ganglia-monitoring")]
    pub enable_ganglia_monitoring: Option<bool>,

    /// A file executed on every node of the cluster at boot time.
    #[structopt(long = "node-bootstrap-file")]
    pub node_bootstrap_file: Option<String>,

    /// Terminate the cluster if idle for this many hours [default: 2].
    #[structopt(long = "idle-cluster-timeout")]
    pub idle_cluster_timeout: Option<i64>,

    /// Use the account's compute credentials for all clusters of the
    /// account.
    #[structopt(long = "use-account-compute-creds")]
    pub use_account_compute_creds: Option<bool>,

    /// EC2 access key.
    #[structopt(long = "compute-access-key")]
    pub compute_access_key: Option<String>,

    /// EC2 secret key.
    #[structopt(long = "compute-secret-key")]
    pub compute_secret_key: Option<String>,

    /// AWS region in which the cluster is created.
    #[structopt(long = "aws-region")]
    pub aws_region: Option<String>,

    /// Preferred availability zone [default: Any].
    #[structopt(long = "aws-preferred-availability-zone")]
    pub aws_preferred_availability_zone: Option<String>,

    /// Id of the VPC in which the cluster is created.
    #[structopt(long = "vpc-id")]
    pub vpc_id: Option<String>,

    /// Id of the subnet in which the cluster is created.
    #[structopt(long = "subnet-id")]
    pub subnet_id: Option<String>,

    /// Bastion host public DNS name, for clusters in a private subnet.
    #[structopt(long = "bastion-node-public-dns")]
    pub bastion_node_public_dns: Option<String>,

    /// Port of the bastion node [default: 22].
    #[structopt(long = "bastion-node-port")]
    pub bastion_node_port: Option<u16>,

    /// User on the bastion node [default: ec2-user].
    #[structopt(long = "bastion-node-user")]
    pub bastion_node_user: Option<String>,

    /// Instance type of the cluster master node.
    #[structopt(long = "master-instance-type")]
    pub master_instance_type: Option<String>,

    /// Instance type of the cluster slave nodes.
    #[structopt(long = "slave-instance-type")]
    pub slave_instance_type: Option<String>,

    /// Number of nodes to start the cluster with.
    #[structopt(long = "initial-nodes")]
    pub initial_nodes: Option<i64>,

    /// Maximum number of nodes up to which the cluster can be auto-scaled.
    #[structopt(long = "max-nodes")]
    pub max_nodes: Option<i64>,

    /// Maximum bid for spot instances, as a percentage of the on-demand
    /// price.
    #[structopt(long = "maximum-bid-price-percentage")]
    pub maximum_bid_price_percentage: Option<i64>,

    /// Request type for the autoscaled slave instances.
    #[structopt(
        long = "slave-request-type",
        possible_values = &["ondemand", "spot"]
    )]
    pub slave_request_type: Option<SlaveRequestType>,

    /// Fall back to on-demand nodes if spot nodes could not be obtained.
    #[structopt(long = "fallback-to-ondemand")]
    pub fallback_to_ondemand: Option<bool>,

    /// EBS volume type.
    #[structopt(
        long = "ebs-volume-type",
        possible_values = &["standard", "ssd", "gp2", "st1", "sc1"]
    )]
    pub ebs_volume_type: Option<EbsVolumeType>,

    /// EBS volume size, in gigabytes.
    #[structopt(long = "ebs-volume-size")]
    pub ebs_volume_size: Option<i64>,

    /// Number of EBS volumes to attach to each cluster instance.
    #[structopt(long = "ebs-volume-count")]
    pub ebs_volume_count: Option<i64>,

    /// Additional `key=value` tag applied to cluster nodes (may be
    /// repeated).
    #[structopt(long = "custom-ec2-tag")]
    pub custom_ec2_tags: Vec<Ec2Tag>,

    /// Start Hadoop 2 daemons on the cluster.
    #[structopt(long = "use-hadoop2")]
    pub use_hadoop2: Option<bool>,

    /// Run Spark on the cluster. Mandatory for a Spark cluster.
    #[structopt(long = "use-spark")]
    pub use_spark: Option<bool>,

    /// Use the Qubole block placement policy for clusters with spot nodes.
    #[structopt(long = "use-qubole-placement-policy")]
    pub use_qubole_placement_policy: Option<bool>,

    /// Encrypt the ephemeral drives on the instances.
    #[structopt(long = "encrypted-ephemerals")]
    pub encrypted_ephemerals: Option<bool>,

    /// SSH public key to use to log in to the instances.
    #[structopt(long = "customer-ssh-key")]
    pub customer_ssh_key: Option<String>,

    /// Overrides the account-level security group settings.
    #[structopt(long = "persistent-security-group")]
    pub persistent_security_group: Option<String>,
}

impl SetupOpt {
    /// Inject the documented service defaults. This runs in the argument
    /// layer, not in `into_cluster_request`, so the mapping itself stays a
    /// pure function of what was supplied.
    pub fn apply_defaults(&mut self) {
        self.idle_cluster_timeout.get_or_insert(2);
        self.aws_preferred_availability_zone
            .get_or_insert_with(|| "Any".to_owned());
        self.bastion_node_port.get_or_insert(22);
        self.bastion_node_user
            .get_or_insert_with(|| "ec2-user".to_owned());
    }

    /// Group the flat options into the nested request document. A field
    /// appears in the output iff it was supplied, and a sub-document whose
    /// options were all left unset is dropped entirely.
    pub fn into_cluster_request(self) -> ClusterRequest {
        let mut request = ClusterRequest {
            presto_version: self.presto_version,
            spark_version: self.spark_version,
            disallow_cluster_termination: self.disallow_cluster_termination,
            enable_ganglia_monitoring: self.enable_ganglia_monitoring,
            node_bootstrap_file: self.node_bootstrap_file,
            idle_cluster_timeout: self.idle_cluster_timeout,
            ..ClusterRequest::default()
        };
        if !self.label.is_empty() {
            request.label = Some(self.label);
        }

        let ec2 = Ec2Settings {
            compute_access_key: self.compute_access_key,
            compute_secret_key: self.compute_secret_key,
            aws_region: self.aws_region,
            aws_preferred_availability_zone: self.aws_preferred_availability_zone,
            vpc_id: self.vpc_id,
            subnet_id: self.subnet_id,
            bastion_node_public_dns: self.bastion_node_public_dns,
            bastion_node_port: self.bastion_node_port,
            bastion_node_user: self.bastion_node_user,
            use_account_compute_creds: self.use_account_compute_creds,
        };
        if !ec2.is_empty() {
            request.ec2_settings = Some(ec2);
        }

        let node = NodeConfiguration {
            master_instance_type: self.master_instance_type,
            slave_instance_type: self.slave_instance_type,
            initial_nodes: self.initial_nodes,
            max_nodes: self.max_nodes,
            stable_spot_instance_settings: self.maximum_bid_price_percentage.map(
                |percentage| StableSpotInstanceSettings {
                    maximum_bid_price_percentage: Some(percentage),
                },
            ),
            slave_request_type: self.slave_request_type,
            fallback_to_ondemand: self.fallback_to_ondemand,
            ebs_volume_type: self.ebs_volume_type,
            ebs_volume_size: self.ebs_volume_size,
            ebs_volume_count: self.ebs_volume_count,
            custom_ec2_tags: if self.custom_ec2_tags.is_empty() {
                None
            } else {
                Some(
                    self.custom_ec2_tags
                        .into_iter()
                        .map(|tag| (tag.key, tag.value))
                        .collect(),
                )
            },
        };
        if !node.is_empty() {
            request.node_configuration = Some(node);
        }

        let hadoop = HadoopSettings {
            use_hadoop2: self.use_hadoop2,
            use_spark: self.use_spark,
            use_qubole_placement_policy: self.use_qubole_placement_policy,
        };
        if !hadoop.is_empty() {
            request.hadoop_settings = Some(hadoop);
        }

        let security = SecuritySettings {
            encrypted_ephemerals: self.encrypted_ephemerals,
            ssh_public_key: self.customer_ssh_key,
            persistent_security_group: self.persistent_security_group,
        };
        if !security.is_empty() {
            request.security_settings = Some(security);
        }

        request
    }
}

#[test]
fn builder_groups_only_the_supplied_fields() {
    use serde_json::json;
    let setup = SetupOpt {
        label: vec!["a".to_owned()],
        initial_nodes: Some(2),
        max_nodes: Some(4),
        slave_request_type: Some(SlaveRequestType::Spot),
        ..SetupOpt::default()
    };
    assert_eq!(
        json!(setup.into_cluster_request()),
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
fn builder_with_no_options_produces_an_empty_document() {
    use serde_json::json;
    let request = SetupOpt::default().into_cluster_request();
    assert_eq!(request.hadoop_settings, None);
    assert_eq!(json!(request), json!({}));
}

#[test]
fn builder_is_a_pure_function() {
    let setup = SetupOpt {
        spark_version: Some("2.2".to_owned()),
        use_spark: Some(true),
        ..SetupOpt::default()
    };
    assert_eq!(
        setup.clone().into_cluster_request(),
        setup.into_cluster_request()
    );
}

#[test]
fn tags_collect_into_the_node_configuration() {
    let setup = SetupOpt {
        custom_ec2_tags: vec![
            "team=data".parse().unwrap(),
            "env=prod".parse().unwrap(),
        ],
        ..SetupOpt::default()
    };
    let node = setup.into_cluster_request().node_configuration.unwrap();
    let tags = node.custom_ec2_tags.unwrap();
    assert_eq!(tags["team"], "data");
    assert_eq!(tags["env"], "prod");
}

#[test]
fn defaults_mirror_the_service_documentation() {
    let mut setup = SetupOpt::default();
    setup.apply_defaults();
    assert_eq!(setup.idle_cluster_timeout, Some(2));
    assert_eq!(setup.bastion_node_port, Some(22));
    assert_eq!(setup.bastion_node_user.as_deref(), Some("ec2-user"));
    assert_eq!(setup.aws_preferred_availability_zone.as_deref(), Some("Any"));

    // Explicit settings win over defaults.
    let mut setup = SetupOpt {
        bastion_node_port: Some(2222),
        ..SetupOpt::default()
    };
    setup.apply_defaults();
    assert_eq!(setup.bastion_node_port, Some(2222));
}

#[test]
fn setup_needs_no_identifier_but_the_other_operations_do() {
    assert!(Opt::from_iter_safe(vec!["qds-cluster", "--api-token", "x", "setup"]).is_ok());
    for &operation in &["get", "start", "stop", "delete"] {
        assert!(
            Opt::from_iter_safe(vec!["qds-cluster", "--api-token", "x", operation]).is_err(),
            "{} should require a cluster id or label",
            operation
        );
        assert!(Opt::from_iter_safe(vec![
            "qds-cluster",
            "--api-token",
            "x",
            operation,
            "1234"
        ])
        .is_ok());
    }
}

#[test]
fn subcommands_map_onto_the_closed_command_enum() {
    let opt = Opt::from_iter_safe(vec![
        "qds-cluster",
        "--api-token",
        "x",
        "get",
        "analytics",
    ])
    .unwrap();
    match opt.command.into_cluster_command() {
        ClusterCommand::Get(cluster) => assert_eq!(cluster.as_str(), "analytics"),
        other => panic!("expected get, got {:?}", other),
    }

    let opt = Opt::from_iter_safe(vec![
        "qds-cluster",
        "--api-token",
        "x",
        "setup",
        "--label",
        "a",
        "--use-spark",
        "true",
    ])
    .unwrap();
    match opt.command.into_cluster_command() {
        ClusterCommand::Setup(request) => {
            assert_eq!(request.label, Some(vec!["a".to_owned()]));
            assert_eq!(request.hadoop_settings.unwrap().use_spark, Some(true));
            // The argument layer's defaults ride along, as they always have.
            assert_eq!(request.idle_cluster_timeout, Some(2));
        }
        other => panic!("expected setup, got {:?}", other),
    }
}

#[test]
fn changed_flag_follows_the_operation() {
    let commands = vec![
        ("setup", true),
        ("get", false),
        ("start", true),
        ("stop", true),
        ("delete", true),
    ];
    for (operation, changed) in commands {
        let mut args = vec!["qds-cluster", "--api-token", "x", operation];
        if operation != "setup" {
            args.push("1234");
        }
        let opt = Opt::from_iter_safe(args).unwrap();
        assert_eq!(
            opt.command.into_cluster_command().changes_remote_state(),
            changed,
            "wrong changed flag for {}",
            operation
        );
    }
}
