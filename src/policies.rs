//! Creation and update policies attached to scalable groups.

use serde::Serialize;

/// Holds resource creation until the expected success signals arrive, or
/// fails after the ISO-8601 timeout.
#[derive(Debug, Clone, Serialize)]
pub struct CreationPolicy {
    #[serde(rename = "ResourceSignal")]
    resource_signal: ResourceSignal,
}

impl CreationPolicy {
    pub fn resource_signal(timeout: &str) -> Self {
        Self {
            resource_signal: ResourceSignal {
                timeout: timeout.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResourceSignal {
    #[serde(rename = "Timeout")]
    timeout: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePolicy {
    #[serde(rename = "AutoScalingRollingUpdate")]
    auto_scaling_rolling_update: AutoScalingRollingUpdate,
}

impl UpdatePolicy {
    pub fn rolling_update(update: AutoScalingRollingUpdate) -> Self {
        Self {
            auto_scaling_rolling_update: update,
        }
    }
}

/// Rolling-update parameters; counts and durations ride along as the string
/// forms the deploying platform expects.
#[derive(Debug, Clone, Serialize)]
pub struct AutoScalingRollingUpdate {
    #[serde(rename = "MaxBatchSize")]
    max_batch_size: String,

    #[serde(rename = "MinInstancesInService")]
    min_instances_in_service: String,

    #[serde(rename = "PauseTime")]
    pause_time: String,

    #[serde(rename = "WaitOnResourceSignals")]
    wait_on_resource_signals: bool,
}

impl AutoScalingRollingUpdate {
    pub fn new(min_instances_in_service: &str, max_batch_size: &str, pause_time: &str) -> Self {
        Self {
            max_batch_size: max_batch_size.to_string(),
            min_instances_in_service: min_instances_in_service.to_string(),
            pause_time: pause_time.to_string(),
            wait_on_resource_signals: true,
        }
    }
}
