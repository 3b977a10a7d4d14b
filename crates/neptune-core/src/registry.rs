// ── Accessory registration planning ──
//
// Hosts that persist accessories between runs identify them by a stable
// UUID. The UUID is derived from `{serial}-{name}-{id}`, so renaming a
// device in configuration makes it a new accessory.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::descriptor::DeviceDescriptor;

/// A configured device paired with its stable accessory identity.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub key: String,
    pub uuid: Uuid,
    pub descriptor: Arc<DeviceDescriptor>,
}

impl Registration {
    pub fn new(serial_number: &str, descriptor: Arc<DeviceDescriptor>) -> Self {
        let key = accessory_key(serial_number, &descriptor);
        Self {
            uuid: accessory_uuid(&key),
            key,
            descriptor,
        }
    }
}

/// Which configured devices the host already knows and which it must add.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationPlan {
    /// Previously registered; reattach to the host's cached accessory.
    pub restored: Vec<Registration>,
    /// Not seen before; register with the host.
    pub added: Vec<Registration>,
}

impl RegistrationPlan {
    /// Split `descriptors` by whether their UUID is in `known`.
    pub fn build(
        serial_number: &str,
        descriptors: &[Arc<DeviceDescriptor>],
        known: &HashSet<Uuid>,
    ) -> Self {
        let mut plan = Self::default();
        for descriptor in descriptors {
            let registration = Registration::new(serial_number, Arc::clone(descriptor));
            if known.contains(&registration.uuid) {
                plan.restored.push(registration);
            } else {
                plan.added.push(registration);
            }
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.restored.len() + self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn accessory_key(serial_number: &str, descriptor: &DeviceDescriptor) -> String {
    format!("{serial_number}-{}-{}", descriptor.name(), descriptor.id())
}

pub fn accessory_uuid(key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

#[cfg(test)]
mod tests {
    use neptune_api::{OutletCommand, ProbeType};
    use pretty_assertions::assert_eq;

    use super::*;

    fn devices() -> Vec<Arc<DeviceDescriptor>> {
        vec![
            Arc::new(DeviceDescriptor::probe("Tmp", "Tmp", ProbeType::Temperature, true)),
            Arc::new(DeviceDescriptor::outlet("1_1", "Pump1", false, OutletCommand::On)),
        ]
    }

    #[test]
    fn key_combines_serial_name_and_id() {
        let pump = DeviceDescriptor::outlet("1_1", "Pump1", false, OutletCommand::On);
        assert_eq!(accessory_key("AC5:12345", &pump), "AC5:12345-Pump1-1_1");
    }

    #[test]
    fn uuid_is_stable_and_distinct() {
        assert_eq!(accessory_uuid("a-b-c"), accessory_uuid("a-b-c"));
        assert_ne!(accessory_uuid("a-b-c"), accessory_uuid("a-b-d"));
    }

    #[test]
    fn only_unknown_devices_are_added() {
        let devices = devices();
        let known: HashSet<Uuid> = [Registration::new("SN", Arc::clone(&devices[0])).uuid]
            .into_iter()
            .collect();

        let plan = RegistrationPlan::build("SN", &devices, &known);

        let restored: Vec<_> = plan.restored.iter().map(|r| r.key.as_str()).collect();
        let added: Vec<_> = plan.added.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(restored, vec!["SN-Tmp-Tmp"]);
        assert_eq!(added, vec!["SN-Pump1-1_1"]);
    }

    #[test]
    fn first_run_adds_everything() {
        let plan = RegistrationPlan::build("SN", &devices(), &HashSet::new());
        assert!(plan.restored.is_empty());
        assert_eq!(plan.added.len(), 2);
        assert_eq!(plan.len(), 2);
    }
}
