use std::collections::HashMap;

use proptest::prelude::*;
use tracebench_core::collectors::{self, COLLECTORS, CollectorId};
use tracebench_core::{CollectSpec, artifacts};

#[test]
fn collector_tags_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, CollectorId> = HashMap::new();

    for info in COLLECTORS {
        assert_eq!(
            collectors::from_str(info.tag),
            Some(info.id),
            "collector tag not resolvable: {}",
            info.tag
        );
        if let Some(prev) = seen.insert(info.tag, info.id) {
            panic!("duplicate collector tag {:?}: {:?} and {:?}", info.tag, prev, info.id);
        }
    }

    assert_eq!(seen.len(), CollectorId::ALL.len());
}

#[test]
fn collector_artifacts_are_distinct() {
    let mut seen = HashMap::new();
    for info in COLLECTORS {
        if let Some(artifact) = info.artifact {
            if let Some(prev) = seen.insert(artifact, info.id) {
                panic!("artifact {:?} claimed by {:?} and {:?}", artifact, prev, info.id);
            }
        }
    }
    assert!(!seen.contains_key(artifacts::PLATFORM_JSON));
}

/// No tag may contain another one, otherwise substring matching would select collectors by accident.
#[test]
fn collector_tags_do_not_overlap() {
    for a in COLLECTORS {
        for b in COLLECTORS {
            if a.id != b.id {
                assert!(
                    !a.tag.contains(b.tag),
                    "tag {:?} contains tag {:?}",
                    a.tag,
                    b.tag
                );
            }
        }
    }
}

fn arb_spec() -> impl Strategy<Value = CollectSpec> {
    (
        proptest::collection::vec(proptest::sample::select(CollectorId::ALL.to_vec()), 0..5),
        proptest::option::of(0u64..100_000),
    )
        .prop_map(|(ids, time)| {
            let mut spec = ids.into_iter().fold(CollectSpec::new(), CollectSpec::with);
            if let Some(secs) = time {
                spec = spec.with_systrace_time(secs);
            }
            spec
        })
}

proptest! {
    /// Property: the canonical rendering parses back to the same spec.
    #[test]
    fn canonical_form_is_stable(spec in arb_spec()) {
        let rendered = spec.to_string();
        prop_assert_eq!(CollectSpec::parse(&rendered), spec);
    }

    /// Property: any `systrace_<n>` embedded in surrounding text yields `n`.
    #[test]
    fn systrace_time_found_in_any_context(prefix in "[a-z ,]{0,12}", n in 0u64..1_000_000, suffix in "[a-z ,]{0,12}") {
        let spec = CollectSpec::parse(&format!("{prefix}systrace_{n}{suffix}"));
        prop_assert!(spec.contains(CollectorId::Systrace));
        prop_assert_eq!(spec.systrace_time(), Some(n));
    }
}
