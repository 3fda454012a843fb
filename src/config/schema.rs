//! Mandatory-field schema for the configuration document.
//!
//! Each type declares which of its fields are required; the walk recurses
//! through nested blocks and collects every missing field path instead of
//! stopping at the first one.

use crate::config::spec::{Device, Linux, Mount, Process, Root, Spec};

/// Implemented by every configuration block that has required fields.
pub trait Mandatory {
    /// Push the dotted path of each missing required field under `parent`.
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>);
}

/// Every missing mandatory field of `spec`, in document order.
pub fn check_mandatory(spec: &Spec) -> Vec<String> {
    let mut missing = Vec::new();
    spec.collect_missing("", &mut missing);
    missing
}

fn field(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn require<T: Mandatory>(
    block: Option<&T>,
    parent: &str,
    name: &str,
    missing: &mut Vec<String>,
) {
    let path = field(parent, name);
    match block {
        Some(block) => block.collect_missing(&path, missing),
        None => missing.push(path),
    }
}

fn require_each<T: Mandatory>(items: &[T], parent: &str, name: &str, missing: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        item.collect_missing(&format!("{}[{}]", field(parent, name), i), missing);
    }
}

impl Mandatory for Spec {
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>) {
        require(self.root.as_ref(), parent, "root", missing);
        require(self.process.as_ref(), parent, "process", missing);
        require_each(&self.mounts, parent, "mounts", missing);
        if let Some(linux) = self.linux.as_ref() {
            linux.collect_missing(&field(parent, "linux"), missing);
        }
    }
}

impl Mandatory for Root {
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>) {
        if self.path.is_empty() {
            missing.push(field(parent, "path"));
        }
    }
}

impl Mandatory for Process {
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>) {
        if self.args.is_empty() {
            missing.push(field(parent, "args"));
        }
    }
}

impl Mandatory for Mount {
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>) {
        if self.destination.is_empty() {
            missing.push(field(parent, "destination"));
        }
    }
}

impl Mandatory for Linux {
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>) {
        require_each(&self.devices, parent, "devices", missing);
    }
}

impl Mandatory for Device {
    fn collect_missing(&self, parent: &str, missing: &mut Vec<String>) {
        if self.path.is_empty() {
            missing.push(field(parent, "path"));
        }
        if self.kind.is_empty() {
            missing.push(field(parent, "type"));
        }
    }
}
