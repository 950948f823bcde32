use serde::{Deserialize, Serialize};

use crate::backend::LeaseResourceType;
use crate::error::{LeaseError, Result};
use crate::naming::derive_resource_name;

/// Where a lock lives and the timing its election controller runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockConfiguration {
    /// Namespace holding the lease records
    pub namespace: String,
    /// Shared record name (ConfigMap) or name prefix (Lease)
    pub resource_name: String,
    pub lease_resource_type: LeaseResourceType,
    /// Identity this process claims leadership under
    pub identity: String,
    pub lease_duration_millis: u64,
    pub renew_deadline_millis: u64,
    pub retry_period_millis: u64,
    pub jitter_factor: f64,
}

impl Default for LockConfiguration {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            resource_name: "leaders".to_string(),
            lease_resource_type: LeaseResourceType::default(),
            identity: nanoid::nanoid!(),
            lease_duration_millis: 15_000,
            renew_deadline_millis: 10_000,
            retry_period_millis: 2_000,
            jitter_factor: 1.2,
        }
    }
}

impl LockConfiguration {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(LeaseError::InvalidConfig("namespace is required".to_string()));
        }
        if self.resource_name.is_empty() {
            return Err(LeaseError::InvalidConfig("resourceName is required".to_string()));
        }
        if self.identity.is_empty() {
            return Err(LeaseError::InvalidConfig("identity is required".to_string()));
        }
        if self.jitter_factor.is_nan() || self.jitter_factor < 1.0 {
            return Err(LeaseError::InvalidConfig(format!(
                "jitterFactor must be >= 1.0, got {}",
                self.jitter_factor
            )));
        }
        if self.lease_duration_millis <= self.renew_deadline_millis {
            return Err(LeaseError::InvalidConfig(format!(
                "leaseDurationMillis ({}) must be greater than renewDeadlineMillis ({})",
                self.lease_duration_millis, self.renew_deadline_millis
            )));
        }
        let jittered_retry = self.jitter_factor * self.retry_period_millis as f64;
        if self.renew_deadline_millis as f64 <= jittered_retry {
            return Err(LeaseError::InvalidConfig(format!(
                "renewDeadlineMillis ({}) must be greater than jitterFactor * retryPeriodMillis ({})",
                self.renew_deadline_millis, jittered_retry
            )));
        }
        Ok(())
    }

    /// Name of the record holding `group`'s lease.
    ///
    /// ConfigMap leases share one record across groups; Lease records get one
    /// derived name per group.
    pub fn resource_name_for(&self, group: &str) -> String {
        match self.lease_resource_type {
            LeaseResourceType::ConfigMap => self.resource_name.clone(),
            LeaseResourceType::Lease => derive_resource_name(&self.resource_name, group),
        }
    }

    /// Lease duration in whole seconds, rounded up, at least 1.
    pub fn lease_duration_seconds(&self) -> i32 {
        let seconds = self.lease_duration_millis.div_ceil(1000).max(1);
        i32::try_from(seconds).unwrap_or(i32::MAX)
    }

    /// Minimum spacing between two renew-time writes.
    pub fn min_update_interval_seconds(&self) -> u64 {
        self.retry_period_millis / 1000
    }
}
