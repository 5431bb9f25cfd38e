use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::error::ContentError;

pub const BMH_KIND: &str = "BareMetalHost";

/// Annotation naming the inventory host a manifest belongs to, used by keyed correlation.
pub const HOST_ID_ANNOTATION: &str = "bmh.openshift.io/host-id";

pub(crate) const BOOT_MAC_ADDRESS: &str = "bootMACAddress";
pub(crate) const ONLINE: &str = "online";
pub(crate) const BMC: &str = "bmc";
pub(crate) const BMC_ADDRESS: &str = "address";
pub(crate) const BMC_CREDENTIALS_NAME: &str = "credentialsName";
pub(crate) const BMC_DISABLE_CERT_VERIFICATION: &str = "disableCertificateVerification";

/// A decoded BareMetalHost custom resource.
///
/// The manifest is held as an ordered YAML mapping so that fields this crate
/// does not know about survive a decode/encode cycle in place.
#[derive(Debug, Clone, PartialEq)]
pub struct BmhManifest {
    doc: Mapping,
}

impl BmhManifest {
    pub fn parse(text: &str) -> Result<Self, ContentError> {
        let value: Value = serde_yaml::from_str(text)?;
        let Value::Mapping(doc) = value else {
            return Err(ContentError::InvalidManifest(
                "document is not a mapping".to_owned(),
            ));
        };

        match doc.get("kind").and_then(Value::as_str) {
            Some(BMH_KIND) => {}
            Some(other) => {
                return Err(ContentError::InvalidManifest(format!(
                    "kind is `{other}`"
                )))
            }
            None => {
                return Err(ContentError::InvalidManifest(
                    "missing `kind`".to_owned(),
                ))
            }
        }

        if let Some(spec) = doc.get("spec") {
            if !spec.is_mapping() && !spec.is_null() {
                return Err(ContentError::InvalidManifest(
                    "`spec` is not a mapping".to_owned(),
                ));
            }
        }

        Ok(Self { doc })
    }

    #[cfg(test)]
    pub(crate) fn as_mapping(&self) -> &Mapping {
        &self.doc
    }

    /// Serializes the manifest so that YAML 1.1 readers (Kubernetes) see the
    /// same scalars this crate does.
    ///
    /// The emitter follows YAML 1.2 and leaves strings such as `yes`, `off`
    /// or `0755` plain, which a 1.1 parser resolves to booleans and integers.
    /// Those strings are swapped for unique plain placeholders before
    /// emitting and written back single-quoted afterwards.
    pub fn to_yaml(&self) -> Result<String, ContentError> {
        let plain = serde_yaml::to_string(&self.doc)?;

        let mut prefix = String::from("__bmh_scalar_");
        while plain.contains(&prefix) {
            prefix.push('_');
        }

        let mut quoted = Vec::new();
        let masked = mask_yaml11_scalars(&Value::Mapping(self.doc.clone()), &prefix, &mut quoted);
        if quoted.is_empty() {
            return Ok(plain);
        }

        let mut text = serde_yaml::to_string(&masked)?;
        for (index, original) in quoted.iter().enumerate() {
            text = text.replace(&placeholder(&prefix, index), &format!("'{original}'"));
        }
        Ok(text)
    }

    fn metadata(&self) -> Option<&Mapping> {
        self.doc.get("metadata").and_then(Value::as_mapping)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata()?.get("name")?.as_str()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata()?.get("namespace")?.as_str()
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata()?
            .get("annotations")?
            .as_mapping()?
            .get(key)?
            .as_str()
    }

    pub fn spec(&self) -> Option<&Mapping> {
        self.doc.get("spec").and_then(Value::as_mapping)
    }

    pub fn boot_mac_address(&self) -> Option<&str> {
        self.spec()?.get(BOOT_MAC_ADDRESS)?.as_str()
    }

    pub fn online(&self) -> Option<bool> {
        self.spec()?.get(ONLINE)?.as_bool()
    }

    pub fn bmc_address(&self) -> Option<&str> {
        self.spec()?.get(BMC)?.get(BMC_ADDRESS)?.as_str()
    }

    pub fn bmc_credentials_name(&self) -> Option<&str> {
        self.spec()?.get(BMC)?.get(BMC_CREDENTIALS_NAME)?.as_str()
    }

    /// The key keyed correlation matches hosts against: the host-id
    /// annotation if present, otherwise the resource name.
    pub fn correlation_key(&self) -> Option<&str> {
        self.annotation(HOST_ID_ANNOTATION).or_else(|| self.name())
    }

    /// Runs `edit` on `spec`, which is created empty at the end of the
    /// document if absent.
    pub(crate) fn edit_spec<R>(&mut self, edit: impl FnOnce(&mut Mapping) -> R) -> R {
        // `parse` only lets a null `spec` through, which gets replaced here
        edit_mapping(&mut self.doc, "spec", edit)
    }
}

/// Sets `key` in `map`, keeping its position if it already exists.
pub(crate) fn set_field(map: &mut Mapping, key: &str, value: impl Into<Value>) {
    map.insert(Value::from(key), value.into());
}

/// Runs `edit` on the nested mapping under `key`.
///
/// The child keeps its position in `map`; if absent or not a mapping it is
/// replaced by an empty one (appended when absent).
pub(crate) fn edit_mapping<R>(
    map: &mut Mapping,
    key: &str,
    edit: impl FnOnce(&mut Mapping) -> R,
) -> R {
    let mut child = map
        .get_mut(key)
        .and_then(Value::as_mapping_mut)
        .map(std::mem::take)
        .unwrap_or_default();
    let result = edit(&mut child);
    map.insert(Value::from(key), Value::Mapping(child));
    result
}

const YAML11_BOOLS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "true", "True", "TRUE", "false",
    "False", "FALSE", "on", "On", "ON", "off", "Off", "OFF",
];

/// Strings a YAML 1.1 parser resolves to a bool or an int when left plain.
fn is_yaml11_ambiguous(s: &str) -> bool {
    if YAML11_BOOLS.contains(&s) {
        return true;
    }
    // leading-zero octals and `_` separated ints
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    digits.bytes().any(|b| b.is_ascii_digit())
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'_')
}

fn placeholder(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}__")
}

fn mask_yaml11_scalars(value: &Value, prefix: &str, quoted: &mut Vec<String>) -> Value {
    match value {
        Value::String(s) if is_yaml11_ambiguous(s) => {
            quoted.push(s.clone());
            Value::String(placeholder(prefix, quoted.len() - 1))
        }
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(k, v)| {
                    (
                        mask_yaml11_scalars(k, prefix, quoted),
                        mask_yaml11_scalars(v, prefix, quoted),
                    )
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| mask_yaml11_scalars(item, prefix, quoted))
                .collect(),
        ),
        Value::Tagged(tagged) => Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: mask_yaml11_scalars(&tagged.value, prefix, quoted),
        })),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testing_utils::bmh_manifest_yaml;

    #[test]
    fn reads_fields() {
        let manifest =
            BmhManifest::parse(&bmh_manifest_yaml("openshift-master-0", "00:00:00:00:00:00"))
                .unwrap();

        assert_eq!(manifest.name(), Some("openshift-master-0"));
        assert_eq!(manifest.namespace(), Some("openshift-machine-api"));
        assert_eq!(manifest.boot_mac_address(), Some("00:00:00:00:00:00"));
        assert_eq!(manifest.online(), Some(true));
        assert_eq!(manifest.bmc_address(), Some("ipmi://192.168.111.1:6230"));
        assert_eq!(
            manifest.bmc_credentials_name(),
            Some("openshift-master-0-bmc-secret")
        );
        assert_eq!(manifest.correlation_key(), Some("openshift-master-0"));
    }

    #[test]
    fn annotation_takes_precedence_for_correlation() {
        let manifest = BmhManifest::parse(
            "apiVersion: metal3.io/v1alpha1\nkind: BareMetalHost\nmetadata:\n  name: m0\n  annotations:\n    bmh.openshift.io/host-id: host-7\n",
        )
        .unwrap();
        assert_eq!(manifest.correlation_key(), Some("host-7"));
        assert_eq!(manifest.spec(), None);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let text = "apiVersion: metal3.io/v1alpha1\nkind: BareMetalHost\nmetadata:\n  name: m0\n  labels:\n    zone: a\nspec:\n  hardwareProfile: unknown\n  bootMode: UEFI\n";
        let manifest = BmhManifest::parse(text).unwrap();
        assert_eq!(manifest.to_yaml().unwrap(), text);
    }

    #[test]
    fn rejects_other_kinds() {
        for text in [
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n",
            "metadata:\n  name: s\n",
            "- a\n- b\n",
            "kind: BareMetalHost\nspec: [1, 2]\n",
        ] {
            let err = BmhManifest::parse(text).unwrap_err();
            assert!(matches!(err, ContentError::InvalidManifest(_)), "{text}: {err}");
        }
        assert!(matches!(
            BmhManifest::parse("kind: [unclosed"),
            Err(ContentError::Yaml(_))
        ));
    }

    #[test]
    fn spec_is_created_when_missing() {
        let mut manifest =
            BmhManifest::parse("kind: BareMetalHost\nmetadata:\n  name: m0\n").unwrap();
        manifest.edit_spec(|spec| set_field(spec, BOOT_MAC_ADDRESS, "52:54:00:aa:bb:cc"));
        assert_eq!(manifest.boot_mac_address(), Some("52:54:00:aa:bb:cc"));

        let reparsed = BmhManifest::parse(&manifest.to_yaml().unwrap()).unwrap();
        let keys: Vec<_> = reparsed.doc.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["kind", "metadata", "spec"]);
        assert_eq!(reparsed.boot_mac_address(), Some("52:54:00:aa:bb:cc"));
    }

    #[test]
    fn yaml11_booleans_and_octals_stay_quoted() {
        let text = "kind: BareMetalHost\nmetadata:\n  name: m0\n  labels:\n    rack-shared: \"yes\"\n    power: \"off\"\n    mode: \"0755\"\n    plain: value\nspec:\n  online: true\n";
        let manifest = BmhManifest::parse(text).unwrap();
        let yaml = manifest.to_yaml().unwrap();

        assert!(yaml.contains("rack-shared: 'yes'\n"), "{yaml}");
        assert!(yaml.contains("power: 'off'\n"), "{yaml}");
        assert!(yaml.contains("mode: '0755'\n"), "{yaml}");
        assert!(yaml.contains("plain: value\n"), "{yaml}");
        assert!(yaml.contains("online: true\n"), "{yaml}");
        assert!(!yaml.contains("__bmh_scalar_"), "{yaml}");
        assert_eq!(BmhManifest::parse(&yaml).unwrap(), manifest);
    }

    #[test]
    fn ambiguous_scalars() {
        for s in ["yes", "No", "OFF", "y", "0755", "-1_000", "42"] {
            assert!(is_yaml11_ambiguous(s), "{s}");
        }
        for s in ["yess", "value", "52:54:00:aa:bb:cc", "1.5", "", "_", "+"] {
            assert!(!is_yaml11_ambiguous(s), "{s}");
        }
    }

    #[test]
    fn edit_mapping_keeps_position_and_replaces_scalars() {
        let mut map: Mapping = serde_yaml::from_str("a: 1\nbmc: null\nz: 2\n").unwrap();
        edit_mapping(&mut map, "bmc", |bmc| set_field(bmc, BMC_ADDRESS, "ipmi://x"));
        edit_mapping(&mut map, "new", |child| set_field(child, "k", "v"));

        let keys: Vec<_> = map.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["a", "bmc", "z", "new"]);
        assert_eq!(
            map.get("bmc").and_then(|b| b.get(BMC_ADDRESS)).and_then(Value::as_str),
            Some("ipmi://x")
        );
    }
}
