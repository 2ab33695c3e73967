//! Service mutator

use k8s_openapi::api::core::v1::{Service, ServicePort};

use gantry_common::object::KIND_SERVICE;
use gantry_common::KubeObject;

use super::{merge_labels, merge_map_keys, mismatch, set_if_differs, Mutator};
use crate::error::ReconcileError;

/// Reconciles Services. Cluster IPs, service type and node ports are foreign.
#[derive(Clone, Debug, Default)]
pub struct ServiceMutator;

impl ServiceMutator {
    /// Fields owned on a Service. Ports are matched by port number.
    pub const MANAGED_FIELDS: &'static [&'static str] = &[
        "metadata.labels[desired keys]",
        "spec (when absent)",
        "spec.selector[desired keys]",
        "spec.ports[port].name",
        "spec.ports[port].protocol",
        "spec.ports[port].targetPort",
        "spec.ports[+missing]",
    ];
}

impl Mutator for ServiceMutator {
    fn kind(&self) -> &str {
        KIND_SERVICE
    }

    fn managed_fields(&self) -> &'static [&'static str] {
        Self::MANAGED_FIELDS
    }

    fn mutate(
        &self,
        existing: &mut KubeObject,
        desired: &KubeObject,
    ) -> Result<bool, ReconcileError> {
        match (existing, desired) {
            (KubeObject::Service(current), KubeObject::Service(want)) => {
                Ok(reconcile(current, want))
            }
            (existing, desired) => Err(mismatch(KIND_SERVICE, existing, desired)),
        }
    }
}

fn reconcile(current: &mut Service, desired: &Service) -> bool {
    let mut changed = merge_labels(&mut current.metadata, &desired.metadata);

    let Some(want) = desired.spec.as_ref() else {
        return changed;
    };
    let Some(have) = current.spec.as_mut() else {
        current.spec = Some(want.clone());
        return true;
    };

    changed |= merge_map_keys(&mut have.selector, want.selector.as_ref());

    if let Some(want_ports) = want.ports.as_ref() {
        let have_ports = have.ports.get_or_insert_with(Vec::new);
        for port in want_ports {
            changed |= upsert_port(have_ports, port);
        }
    }

    changed
}

fn upsert_port(ports: &mut Vec<ServicePort>, desired: &ServicePort) -> bool {
    match ports.iter_mut().find(|p| p.port == desired.port) {
        Some(have) => {
            let mut changed = set_if_differs(&mut have.name, &desired.name);
            changed |= set_if_differs(&mut have.protocol, &desired.protocol);
            changed |= set_if_differs(&mut have.target_port, &desired.target_port);
            changed
        }
        None => {
            ports.push(desired.clone());
            true
        }
    }
}
