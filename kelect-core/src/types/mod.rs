mod leader;
mod resource;

pub use leader::LeaderInfo;
pub use resource::{ConfigMap, Lease, LeaseRecord, LeaseSpec, ObjectMeta, ResourceKind};
