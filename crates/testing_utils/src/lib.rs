use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mac_address::MacAddress;
use models::{HostRecord, HostRole, NetworkInterface};
use prop::collection::{hash_map, vec};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

// This magic library called `ctor` somehow runs before any other step in the test binary
// we use it to install color_eyre for prettier panic messages (we can't do this in each test
// because they run in parallel)
#[ctor::ctor]
fn init() {
    let _ = color_eyre::install();
}

/// A bootstrap ignition document the way the installer writes it, holding `files`.
pub fn ignition_document(files: Vec<Value>) -> Value {
    json!({
        "ignition": {
            "config": {},
            "security": {"tls": {}},
            "timeouts": {},
            "version": "3.2.0"
        },
        "passwd": {
            "users": [{"name": "core", "sshAuthorizedKeys": ["ssh-ed25519 AAAA test"]}]
        },
        "storage": {"files": files},
        "systemd": {"units": [{"enabled": true, "name": "bootkube.service"}]}
    })
}

/// Non-BMH file entry with `text` as a base64 data URL.
pub fn plain_entry(path: &str, text: &str) -> Value {
    json!({
        "overwrite": true,
        "path": path,
        "user": {"name": "root"},
        "contents": {"source": format!("data:text/plain;charset=utf-8;base64,{}", STANDARD.encode(text))},
        "mode": 420
    })
}

/// Target path of the `index`th BMH manifest.
pub fn bmh_path(index: usize) -> String {
    format!("/opt/openshift/openshift/99_openshift-cluster-api_hosts-{index}.yaml")
}

/// BMH file entry embedding `yaml`, keyed the way the installer emits them.
pub fn bmh_entry(index: usize, yaml: &str) -> Value {
    json!({
        "path": bmh_path(index),
        "user": {"name": "root"},
        "contents": {"source": format!("data:text/plain;charset=utf-8;base64,{}", STANDARD.encode(yaml))},
        "mode": 384,
        "overwrite": true
    })
}

/// Installer-style BareMetalHost manifest with a placeholder-able boot MAC.
pub fn bmh_manifest_yaml(name: &str, mac: &str) -> String {
    format!(
        "apiVersion: metal3.io/v1alpha1
kind: BareMetalHost
metadata:
  creationTimestamp: null
  name: {name}
  namespace: openshift-machine-api
spec:
  bmc:
    address: ipmi://192.168.111.1:6230
    credentialsName: {name}-bmc-secret
  bootMACAddress: {mac}
  hardwareProfile: unknown
  online: true
status:
  hardware: null
"
    )
}

/// Minimal host record booting from `mac`.
pub fn host(id: &str, mac: &str) -> HostRecord {
    let mac = MacAddress::from_str(mac).expect("test MAC should parse");
    HostRecord::with_mac(id, mac)
}

/// Generates a random [`mac_address::MacAddress`] for property testing.
pub fn mac_address_strategy() -> impl Strategy<Value = mac_address::MacAddress> {
    (any::<u64>()).prop_map(|value| {
        let bytes = value.to_be_bytes();
        mac_address::MacAddress::new([bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]])
    })
}

/// Generates a [`HostRecord`] with one to three interfaces and no BMC details.
pub fn host_record_strategy() -> impl Strategy<Value = HostRecord> {
    (
        "[0-9a-f]{8}",
        proptest::option::of("(master|worker)-[0-9]"),
        vec(mac_address_strategy(), 1..=3),
    )
        .prop_map(|(id, hostname, macs)| {
            let role = hostname.as_deref().map(|name| {
                if name.starts_with("master") {
                    HostRole::Master
                } else {
                    HostRole::Worker
                }
            });
            HostRecord {
                id,
                hostname,
                role,
                interfaces: macs
                    .into_iter()
                    .enumerate()
                    .map(|(i, mac_address)| NetworkInterface {
                        name: format!("eth{i}"),
                        mac_address,
                        ipv4_addresses: Vec::new(),
                    })
                    .collect(),
                bmc: None,
            }
        })
}

/// Generates a random arbitrary [`serde_json::Value`] for property testing.
pub fn arb_json_value() -> impl Strategy<Value = Value> {
    // define a base "leaf" strategy: null, bool, number, or string.
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        // generate strings without escape sequences (workaround)
        "[^\\x00-\\x1F\\\\]*".prop_map(Value::String)
    ];
    // use `prop_recursive` to allow for arrays and objects that can nest JSON values.
    leaf.prop_recursive(3, 12, 5, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..10).prop_map(Value::Array),
            hash_map("[^\\x00-\\x1F\\\\]*", inner, 0..10).prop_map(
                |map: HashMap<String, Value>| {
                    Value::Object(map.into_iter().collect::<Map<String, Value>>())
                }
            )
        ]
    })
}
