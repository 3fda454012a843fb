//! Capability sets against `process.capabilities`.

use super::{CheckError, CheckFailure, OsQuery};
use crate::config::spec::{Capabilities, Spec};
use crate::kernel::capabilities::{CapabilityNumber, CapabilitySet};
use crate::kernel::SystemState;

fn declared(caps: &Capabilities, set: CapabilitySet) -> &[String] {
    match set {
        CapabilitySet::Bounding => &caps.bounding,
        CapabilitySet::Effective => &caps.effective,
        CapabilitySet::Inheritable => &caps.inheritable,
        CapabilitySet::Permitted => &caps.permitted,
        CapabilitySet::Ambient => &caps.ambient,
    }
}

/// Each live capability bit must equal its declared presence.
///
/// A process without a `capabilities` object declares every set empty.
pub fn validate_capabilities(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let process = match spec.process.as_ref() {
        Some(process) => process,
        None => return Ok(()),
    };
    let empty = Capabilities::default();
    let caps = process.capabilities.as_ref().unwrap_or(&empty);

    let snapshot = state.capabilities().query("capability sets")?;
    let mut failure = CheckFailure::new();

    for set in CapabilitySet::ALL {
        let names = declared(caps, set);
        for cap in CapabilityNumber::up_to(snapshot.last_cap) {
            let expected = names.iter().any(|n| n == cap.name());
            let actual = snapshot.has(set, cap);
            if expected == actual {
                continue;
            }
            let message = if expected {
                format!(
                    "expected capability {} in {} set but it is missing",
                    cap.name(),
                    set.name()
                )
            } else {
                format!(
                    "unexpected capability {} present in {} set",
                    cap.name(),
                    set.name()
                )
            };
            failure.push(CheckError::violation(message));
        }
    }

    failure.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::Process;
    use crate::testing::FakeSystem;

    fn spec_with(caps: Option<Capabilities>) -> Spec {
        Spec {
            process: Some(Process {
                args: vec!["sh".into()],
                capabilities: caps,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn chown_everywhere() -> Capabilities {
        let set = vec!["CAP_CHOWN".to_string()];
        Capabilities {
            bounding: set.clone(),
            effective: set.clone(),
            inheritable: Vec::new(),
            permitted: set,
            ambient: Vec::new(),
        }
    }

    #[test]
    fn absent_capabilities_declare_empty_sets() {
        let spec = spec_with(None);
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_capabilities(&spec, &state).is_ok());

        let kill = CapabilityNumber::from_name("CAP_KILL").unwrap();
        let chown = CapabilityNumber::from_name("CAP_CHOWN").unwrap();
        state.capabilities.set(CapabilitySet::Effective, kill, true);
        state.capabilities.set(CapabilitySet::Bounding, chown, true);

        let err = validate_capabilities(&spec, &state).unwrap_err();
        let messages: Vec<String> = err.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "unexpected capability CAP_CHOWN present in bounding set",
                "unexpected capability CAP_KILL present in effective set",
            ]
        );
    }

    #[test]
    fn exact_sets_pass() {
        let spec = spec_with(Some(chown_everywhere()));
        let state = FakeSystem::conforming_to(&spec);
        assert!(validate_capabilities(&spec, &state).is_ok());
    }

    #[test]
    fn missing_and_extra_bits_are_distinguished() {
        let spec = spec_with(Some(chown_everywhere()));
        let mut state = FakeSystem::conforming_to(&spec);
        let chown = CapabilityNumber::from_name("CAP_CHOWN").unwrap();
        let kill = CapabilityNumber::from_name("CAP_KILL").unwrap();
        state.capabilities.set(CapabilitySet::Effective, chown, false);
        state.capabilities.set(CapabilitySet::Ambient, kill, true);

        let err = validate_capabilities(&spec, &state).unwrap_err();
        let messages: Vec<String> = err.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "expected capability CAP_CHOWN in effective set but it is missing",
                "unexpected capability CAP_KILL present in ambient set",
            ]
        );
    }

    #[test]
    fn mismatch_reported_for_every_differing_pair() {
        let spec = spec_with(Some(Capabilities::default()));
        let mut state = FakeSystem::default();
        state.capabilities = state
            .capabilities
            .with_mask(CapabilitySet::Bounding, 0b111)
            .with_mask(CapabilitySet::Permitted, 0b1);

        let err = validate_capabilities(&spec, &state).unwrap_err();
        assert_eq!(err.errors.len(), 4);
    }

    #[test]
    fn bits_above_last_cap_are_ignored() {
        let spec = spec_with(Some(Capabilities::default()));
        let mut state = FakeSystem::default();
        state.capabilities.last_cap = 3;
        state.capabilities = state
            .capabilities
            .with_mask(CapabilitySet::Bounding, 1 << 10);
        assert!(validate_capabilities(&spec, &state).is_ok());
    }
}
