//! Resource and claim naming.
//!
//! Plurals are the lower-cased kind plus `s`; there is no irregular
//! pluralization. With claims enabled the kind is split into an exposed
//! composite kind carrying the `X` prefix and an unprefixed claim kind. Any
//! kind starting with `X` counts as prefixed.

/// Prefix conventionally carried by composite resource kinds.
pub const COMPOSITE_PREFIX: char = 'X';

/// Kind and plural for `spec.names` or `spec.claimNames`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindNames {
    pub kind: String,
    pub plural: String,
}

impl KindNames {
    fn new(kind: String, plural: Option<&str>) -> Self {
        let plural = plural.map_or_else(|| plural_of(&kind), str::to_string);
        Self { kind, plural }
    }
}

/// Every name a definition needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub kind: String,
    pub plural: String,
    pub claim: Option<KindNames>,
}

impl ResourceNames {
    /// `<plural>.<group>`, the definition's object name.
    pub fn definition_name(&self, group: &str) -> String {
        format!("{}.{}", self.plural, group)
    }
}

/// Lower-cased kind plus `s`.
pub fn plural_of(kind: &str) -> String {
    format!("{}s", kind.to_lowercase())
}

/// True when `kind` already carries the composite prefix.
pub fn has_composite_prefix(kind: &str) -> bool {
    kind.starts_with(COMPOSITE_PREFIX)
}

/// Split a kind into `(exposed, claim)`.
///
/// The exposed member maps back to the same pair, as does the claim
/// member unless it itself starts with `X`.
pub fn claim_pair(kind: &str) -> (String, String) {
    if has_composite_prefix(kind) {
        (kind.to_string(), kind[COMPOSITE_PREFIX.len_utf8()..].to_string())
    } else {
        (format!("{COMPOSITE_PREFIX}{kind}"), kind.to_string())
    }
}

/// Names for a definition without claims. The kind is used as given.
pub fn without_claims(kind: &str) -> ResourceNames {
    ResourceNames {
        kind: kind.to_string(),
        plural: plural_of(kind),
        claim: None,
    }
}

/// Names for a definition offering claims.
pub fn with_claims(
    kind: &str,
    claim_kind: Option<&str>,
    claim_plural: Option<&str>,
) -> ResourceNames {
    let (exposed, derived_claim) = claim_pair(kind);
    let claim_kind = claim_kind.map_or(derived_claim, str::to_string);
    ResourceNames {
        plural: plural_of(&exposed),
        kind: exposed,
        claim: Some(KindNames::new(claim_kind, claim_plural)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_is_lowercase_plus_s() {
        assert_eq!(plural_of("XBucket"), "xbuckets");
        assert_eq!(plural_of("Policy"), "policys");
    }

    #[test]
    fn prefixed_and_unprefixed_kinds_agree() {
        assert_eq!(
            claim_pair("Bucket"),
            ("XBucket".to_string(), "Bucket".to_string())
        );
        assert_eq!(
            claim_pair("XBucket"),
            ("XBucket".to_string(), "Bucket".to_string())
        );
    }

    #[test]
    fn any_leading_x_is_stripped_for_the_claim() {
        assert!(has_composite_prefix("Xylophone"));
        assert_eq!(
            claim_pair("Xylophone"),
            ("Xylophone".to_string(), "ylophone".to_string())
        );

        let names = with_claims("Xylophone", None, None);
        assert_eq!(names.kind, "Xylophone");
        assert_eq!(names.claim.unwrap().kind, "ylophone");
    }

    #[test]
    fn with_claims_derives_claim_names() {
        let names = with_claims("Bucket", None, None);
        assert_eq!(names.kind, "XBucket");
        assert_eq!(names.plural, "xbuckets");
        let claim = names.claim.unwrap();
        assert_eq!(claim.kind, "Bucket");
        assert_eq!(claim.plural, "buckets");
    }

    #[test]
    fn claim_overrides() {
        let names = with_claims("XBucket", Some("Store"), Some("stores-v1"));
        let claim = names.claim.unwrap();
        assert_eq!(claim.kind, "Store");
        assert_eq!(claim.plural, "stores-v1");
    }

    #[test]
    fn definition_name_joins_plural_and_group() {
        let names = without_claims("XBucket");
        assert_eq!(names.definition_name("example.org"), "xbuckets.example.org");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn claim_pair_is_idempotent(kind in "[A-Z][A-Za-z0-9]{0,12}") {
                let (exposed, claim) = claim_pair(&kind);
                prop_assert_eq!(claim_pair(&exposed), (exposed.clone(), claim.clone()));
                prop_assert!(has_composite_prefix(&exposed));
                if !has_composite_prefix(&claim) {
                    prop_assert_eq!(claim_pair(&claim), (exposed.clone(), claim.clone()));
                }
            }

            #[test]
            fn plural_is_lowercase(kind in "[A-Za-z]{1,16}") {
                let plural = plural_of(&kind);
                prop_assert!(plural.ends_with('s'));
                prop_assert_eq!(plural.to_lowercase(), plural);
            }
        }
    }
}
