use std::collections::HashSet;

use versionkit_rs::{Identifier, Version, VersionError};

fn v(version: &str) -> Version {
    Version::parse(version).unwrap()
}

#[test]
fn parse_components() {
    let version = v("1.2.0-alpha1.0+20130313144700");
    assert_eq!(version.number_component(), [1, 2, 0]);
    assert_eq!(
        version.pre_release_component(),
        &[
            Identifier::Alphanumeric("alpha1".to_string()),
            Identifier::Numeric(0)
        ]
    );
    assert_eq!(
        version.build_component(),
        &[Identifier::Numeric(20130313144700)]
    );
    assert_eq!(version.major(), 1);
    assert_eq!(version.minor(), 2);
    assert_eq!(version.patch(), 0);
}

#[test]
fn parse_rejects_malformed() {
    assert_eq!(
        Version::parse("v1").unwrap_err(),
        VersionError::Malformed("v1".to_string())
    );

    for malformed in [
        "v0.0.1",
        "0.0.1alpha",
        "0.0 .1",
        "0.1+.1",
        "1",
        "0.1",
        "0.1.0.3",
        "0.1-alpha",
        "1.0.0-",
        "1.0.0-alpha..1",
        "1.0.0+a+b",
        "1.0.0-al_pha",
        "",
    ] {
        assert!(!Version::is_valid(malformed), "{malformed} should be rejected");
    }
}

#[test]
fn parse_accepts_valid() {
    for valid in [
        "1.9.0",
        "1.20.145",
        "1.0.0-alpha",
        "1.0.0-alpha.1",
        "1.0.0-0.3.7",
        "1.0.0-x.7.z.92",
        "1.0.0-rc1",
        "1.0.0-alpha+001",
        "1.0.0+20130313144700",
        "1.0.0-beta+exp.sha.5114f85",
        "1.2.3+0000.build",
    ] {
        assert!(Version::is_valid(valid), "{valid} should be accepted");
    }
}

#[test]
fn normalize_pads_short_versions() {
    assert_eq!(Version::normalize("1"), "1.0.0");
    assert_eq!(Version::normalize("1.0"), "1.0.0");
    assert_eq!(Version::normalize(" 1.2.3 "), "1.2.3");
    assert_eq!(Version::normalize("v1"), "v1");
    assert_eq!(Version::lenient_parse("1").unwrap().to_string(), "1.0.0");
    assert_eq!(Version::lenient_parse("1.0").unwrap(), v("1.0.0"));
}

#[test]
fn display_round_trip() {
    for s in [
        "1.2.3",
        "0.0.0",
        "1.0.0-alpha.1",
        "1.0.0-x-y.7+build.5",
        "1.2.3+20130313144700",
    ] {
        let version = v(s);
        assert_eq!(version.to_string(), s);
        assert_eq!(v(&version.to_string()), version);
    }

    // Numeric identifiers are stored as numbers
    assert_eq!(v("1.2.3+2014.01.01").to_string(), "1.2.3+2014.1.1");
}

#[test]
fn numeric_components_compare_numerically() {
    assert!(v("1.0.0") < v("2.0.0"));
    assert!(v("2.0.0") < v("2.1.0"));
    assert!(v("2.1.0") < v("2.1.1"));
    assert!(v("1.9.0") < v("1.10.0"));
}

#[test]
fn pre_release_ordering() {
    let ordered = [
        "1.0.0-alpha",
        "1.0.0-alpha.1",
        "1.0.0-alpha.beta",
        "1.0.0-beta",
        "1.0.0-beta.2",
        "1.0.0-beta.11",
        "1.0.0-rc.1",
        "1.0.0",
    ]
    .map(v);

    for window in ordered.windows(2) {
        assert!(window[0] < window[1], "{} < {}", window[0], window[1]);
        assert!(window[1] > window[0], "{} > {}", window[1], window[0]);
    }

    // Transitivity over the whole chain
    for (i, a) in ordered.iter().enumerate() {
        for b in &ordered[i + 1..] {
            assert!(a < b, "{a} < {b}");
        }
    }

    let mut shuffled = ordered.to_vec();
    shuffled.reverse();
    shuffled.sort();
    assert_eq!(shuffled, ordered.to_vec());
}

#[test]
fn build_metadata_is_ignored() {
    let with_build = v("1.0.0-alpha+20130707");
    let without_build = v("1.0.0-alpha");
    assert_eq!(with_build.cmp(&without_build), std::cmp::Ordering::Equal);
    assert_eq!(with_build, without_build);

    let set: HashSet<_> = [with_build, without_build].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn release_version() {
    assert_eq!(v("1.9.4").release_version().to_string(), "1.9.4");
    assert_eq!(v("1.9.4-rc0").release_version().to_string(), "1.9.4");
    assert!(v("1.0.0-x.7.z.92").is_pre_release());
    assert!(!v("1.0.0").is_pre_release());
}

#[test]
fn optimistic_recommendation() {
    assert_eq!(v("1.9.4").optimistic_recommendation().to_string(), "~> 1.9");
    assert_eq!(
        v("0.9.4").optimistic_recommendation().to_string(),
        "~> 0.9.4"
    );
    assert_eq!(
        v("0.9.4-rc0").optimistic_recommendation().to_string(),
        "~> 0.9.4"
    );
}

#[test]
fn next_versions() {
    let version = v("1.2.3-rc.1");
    assert_eq!(version.next_major().unwrap().to_string(), "2.0.0");
    assert_eq!(version.next_minor().unwrap().to_string(), "1.3.0");
    assert_eq!(version.next_patch().unwrap().to_string(), "1.2.4");
    assert_eq!(version.optimistic_bump().unwrap().to_string(), "1.3.0");

    let next = version
        .next_versions()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(next, ["2.0.0", "1.3.0", "1.2.4", "1.2.3-rc.2"]);

    assert!(version.is_valid_next_version(&v("1.3.0")));
    assert!(!version.is_valid_next_version(&v("1.3.3")));
}

#[test]
fn next_pre_release() {
    let next = |s: &str| v(s).next_pre_release().map(|v| v.to_string());
    assert_eq!(next("1.2.3-rc.1").as_deref(), Some("1.2.3-rc.2"));
    assert_eq!(next("1.2.3-rc1").as_deref(), Some("1.2.3-rc2"));
    assert_eq!(next("1.2.3-rc1ver").as_deref(), Some("1.2.3-rc2ver"));
    assert_eq!(next("1.2.3-rc1ver2").as_deref(), Some("1.2.3-rc2ver2"));
    assert_eq!(next("1.2.3-rc.1.alpha").as_deref(), Some("1.2.3-rc.2"));
    assert_eq!(next("1.2.3-1").as_deref(), Some("1.2.3-2"));
    assert_eq!(next("1.2.3-alpha"), None);
    assert_eq!(next("1.2.3"), None);
}

#[test]
fn bump_by_index() {
    let version = v("1.2.3-rc.1");
    assert_eq!(version.bump(0).unwrap().to_string(), "2.0.0");
    assert_eq!(version.bump(1).unwrap().to_string(), "1.3.0");
    assert_eq!(version.bump(2).unwrap().to_string(), "1.2.4");
    assert_eq!(
        version.bump(3).unwrap_err().to_string(),
        "Unsupported index `3`"
    );
}

#[test]
fn next_versions_at_the_numeric_limit() {
    let max = u64::MAX;
    let version = v(&format!("{max}.{max}.{max}"));
    assert_eq!(version.next_major(), None);
    assert_eq!(version.next_minor(), None);
    assert_eq!(version.next_patch(), None);
    assert!(version.next_versions().is_empty());
    assert_eq!(
        version.bump(1).unwrap_err(),
        VersionError::Overflow {
            version: version.to_string(),
            index: 1,
        }
    );

    let version = v(&format!("1.{max}.0-rc.1"));
    assert_eq!(version.next_major().unwrap().to_string(), "2.0.0");
    assert_eq!(version.next_minor(), None);
    assert_eq!(
        version
            .next_versions()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        ["2.0.0", "1.18446744073709551615.1", "1.18446744073709551615.0-rc.2"]
    );
}

#[test]
fn oversized_numeric_identifiers_are_malformed() {
    assert!(Version::is_valid("1.0.0-rc.18446744073709551615"));
    assert!(!Version::is_valid("1.0.0-rc.18446744073709551616"));
    assert!(!Version::is_valid("1.0.0+18446744073709551616"));
    assert!(!Version::is_valid("18446744073709551616.0.0"));
}
