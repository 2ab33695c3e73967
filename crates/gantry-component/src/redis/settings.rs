//! Fixed Redis assembly constants
//!
//! Names, resource quantities, and probe timings are part of the component's
//! contract rather than user options. They live in an explicit settings value
//! so tests can override them without touching process-wide state.

/// Redis server listen port
pub const REDIS_PORT: i32 = 6379;

/// Default Redis image offered as the `REDIS_IMAGE` template default
pub const DEFAULT_REDIS_IMAGE: &str = "registry.access.redhat.com/rhscl/redis-32-rhel7:3.2";

/// Default application label offered as the `APP_LABEL` template default
pub const DEFAULT_APP_LABEL: &str = "3scale-api-management";

/// Redis configuration shipped in the shared ConfigMap
pub const REDIS_CONF: &str = r#"protected-mode no

port 6379

timeout 0
tcp-keepalive 300

daemonize no
supervised no

loglevel notice

databases 16

save 900 1
save 300 10
save 60 10000

stop-writes-on-bgsave-error yes

rdbcompression yes
rdbchecksum yes

dbfilename dump.rdb

slave-serve-stale-data yes
slave-read-only yes

repl-diskless-sync no
repl-disable-tcp-nodelay no

appendonly yes
appendfilename "appendonly.aof"
appendfsync everysec
no-appendfsync-on-rewrite no
auto-aof-rewrite-percentage 100
auto-aof-rewrite-min-size 64mb
aof-load-truncated yes

lua-time-limit 5000

activerehashing no

aof-rewrite-incremental-fsync yes
dir /var/lib/redis/data
"#;

/// Probe timing in seconds; `None` leaves the Kubernetes default
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeTiming {
    /// Seconds after container start before the first probe
    pub initial_delay_seconds: i32,
    /// Seconds between probes
    pub period_seconds: i32,
    /// Probe timeout
    pub timeout_seconds: Option<i32>,
}

/// CPU and memory limits/requests as Kubernetes quantity strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSettings {
    /// CPU limit
    pub limits_cpu: String,
    /// Memory limit
    pub limits_memory: String,
    /// CPU request
    pub requests_cpu: String,
    /// Memory request
    pub requests_memory: String,
}

impl ResourceSettings {
    fn new(limits_cpu: &str, limits_memory: &str, requests_cpu: &str, requests_memory: &str) -> Self {
        Self {
            limits_cpu: limits_cpu.to_string(),
            limits_memory: limits_memory.to_string(),
            requests_cpu: requests_cpu.to_string(),
            requests_memory: requests_memory.to_string(),
        }
    }
}

/// Settings for one independently-scaled Redis deployment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisVariantSettings {
    /// Deployment, container, and selector name
    pub name: String,
    /// Value of the component label (backend, system)
    pub component: String,
    /// Name of the data PVC and its pod volume
    pub storage_volume_name: String,
    /// Container resources
    pub resources: ResourceSettings,
    /// Exec readiness probe timing
    pub readiness: ProbeTiming,
    /// TCP liveness probe timing
    pub liveness: ProbeTiming,
    /// Container termination message path, if set explicitly
    pub termination_message_path: Option<String>,
}

/// All constants consumed by the Redis assembler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisSettings {
    /// Backend (listener/worker queue) Redis
    pub backend: RedisVariantSettings,
    /// System (portal/sidekiq) Redis
    pub system: RedisVariantSettings,
    /// Name of the shared configuration ConfigMap and its pod volume
    pub config_volume_name: String,
    /// Key of the configuration file in the ConfigMap
    pub config_key: String,
    /// Component label on the ConfigMap
    pub config_component: String,
    /// Mount path of the configuration volume
    pub config_mount_path: String,
    /// Mount path of the data volume
    pub data_mount_path: String,
    /// Server binary
    pub command: String,
    /// Server arguments
    pub args: Vec<String>,
    /// Readiness probe command
    pub readiness_command: Vec<String>,
    /// Requested size of each data PVC
    pub storage_request: String,
    /// Access mode of each data PVC
    pub storage_access_mode: String,
    /// Contents of `redis.conf`
    pub redis_conf: String,
    /// Name of the PrometheusRule emitted when monitoring is enabled
    pub rules_name: String,
    /// Rule group holding the Redis alerts
    pub rules_group: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            backend: RedisVariantSettings {
                name: "backend-redis".to_string(),
                component: "backend".to_string(),
                storage_volume_name: "backend-redis-storage".to_string(),
                resources: ResourceSettings::new("2000m", "32Gi", "1000m", "1024Mi"),
                readiness: ProbeTiming {
                    initial_delay_seconds: 10,
                    period_seconds: 30,
                    timeout_seconds: Some(1),
                },
                liveness: ProbeTiming {
                    initial_delay_seconds: 10,
                    period_seconds: 10,
                    timeout_seconds: None,
                },
                termination_message_path: None,
            },
            system: RedisVariantSettings {
                name: "system-redis".to_string(),
                component: "system".to_string(),
                storage_volume_name: "system-redis-storage".to_string(),
                resources: ResourceSettings::new("500m", "32Gi", "150m", "256Mi"),
                readiness: ProbeTiming {
                    initial_delay_seconds: 30,
                    period_seconds: 10,
                    timeout_seconds: Some(5),
                },
                liveness: ProbeTiming {
                    initial_delay_seconds: 10,
                    period_seconds: 5,
                    timeout_seconds: None,
                },
                termination_message_path: Some("/dev/termination-log".to_string()),
            },
            config_volume_name: "redis-config".to_string(),
            config_key: "redis.conf".to_string(),
            config_component: "system".to_string(),
            config_mount_path: "/etc/redis.d/".to_string(),
            data_mount_path: "/var/lib/redis/data".to_string(),
            command: "/opt/rh/rh-redis32/root/usr/bin/redis-server".to_string(),
            args: vec![
                "/etc/redis.d/redis.conf".to_string(),
                "--daemonize".to_string(),
                "no".to_string(),
            ],
            readiness_command: vec![
                "container-entrypoint".to_string(),
                "bash".to_string(),
                "-c".to_string(),
                "redis-cli set liveness-probe \"`date`\" | grep OK".to_string(),
            ],
            storage_request: "1Gi".to_string(),
            storage_access_mode: "ReadWriteOnce".to_string(),
            redis_conf: REDIS_CONF.to_string(),
            rules_name: "redis".to_string(),
            rules_group: "redis.rules".to_string(),
        }
    }
}
