//! End-to-end availability: publish, authenticate, reconstruct.

use jam_core::availability::{segment_package, AvailabilityError, AvailabilityTracker};
use jam_core::config::EC_DATA_SEGMENTS;
use jam_core::{WorkItem, WorkPackage, WorkReport};

fn sample_package() -> WorkPackage {
    WorkPackage {
        auth_token: vec![0x5a; 64],
        auth_service: 9,
        auth_code_hash: [1; 32],
        items: vec![WorkItem {
            service: 65_536,
            payload: (0u32..20_000).map(|i| (i % 251) as u8).collect(),
            gas_limit: 1_000_000,
            output_limit: 4096,
            storage_limit: 1 << 20,
        }],
        ..WorkPackage::default()
    }
}

fn publish(package: &WorkPackage) -> (AvailabilityTracker, jam_core::availability::SegmentedPackage) {
    let segmented = segment_package(package, 3).expect("package fits the bundle capacity");
    let report = WorkReport {
        package_hash: segmented.package_hash,
        core: 3,
        segments_root: segmented.segments_root,
        bundle_len: segmented.bundle_len,
        results: vec![],
    };
    let tracker = AvailabilityTracker::new();
    tracker.register_report(&report);
    (tracker, segmented)
}

#[test]
fn k_segments_make_the_package_reconstructable() {
    let package = sample_package();
    let (tracker, segmented) = publish(&package);

    for segment in &segmented.segments[..EC_DATA_SEGMENTS - 1] {
        assert!(!tracker.add_segment(segment).unwrap());
    }
    assert!(!tracker.is_available(&segmented.package_hash));
    assert!(tracker.reconstruct(&segmented.package_hash).unwrap().is_none());

    // The K-th segment tips the package over.
    assert!(tracker
        .add_segment(&segmented.segments[EC_DATA_SEGMENTS - 1])
        .unwrap());
    assert!(tracker.is_available(&segmented.package_hash));
    let restored = tracker
        .reconstruct(&segmented.package_hash)
        .unwrap()
        .expect("complete");
    assert_eq!(restored, package);
    assert_eq!(restored.encode(), package.encode());
}

#[test]
fn parity_only_subset_reconstructs_the_same_bytes() {
    let package = sample_package();
    let (tracker, segmented) = publish(&package);

    for segment in &segmented.segments[EC_DATA_SEGMENTS..2 * EC_DATA_SEGMENTS] {
        tracker.add_segment(segment).unwrap();
    }
    assert!(tracker.is_available(&segmented.package_hash));
    let restored = tracker
        .reconstruct(&segmented.package_hash)
        .unwrap()
        .expect("complete");
    assert_eq!(restored, package);
}

#[test]
fn duplicate_segments_do_not_count_toward_availability() {
    let package = sample_package();
    let (tracker, segmented) = publish(&package);

    tracker.add_segment(&segmented.segments[0]).unwrap();
    assert!(matches!(
        tracker.add_segment(&segmented.segments[0]),
        Err(AvailabilityError::DuplicateSegment(0))
    ));
    assert!(!tracker.is_available(&segmented.package_hash));
}

#[test]
fn tampered_segment_fails_authentication() {
    let package = sample_package();
    let (tracker, segmented) = publish(&package);

    let mut tampered = segmented.segments[5].clone();
    tampered.data[100] ^= 0xff;
    assert!(matches!(
        tracker.add_segment(&tampered),
        Err(AvailabilityError::BadProof(5))
    ));

    // A valid segment claimed at the wrong index is also refused.
    let mut misplaced = segmented.segments[6].clone();
    misplaced.index = 7;
    assert!(matches!(
        tracker.add_segment(&misplaced),
        Err(AvailabilityError::BadProof(7))
    ));
}

#[test]
fn removed_packages_forget_their_segments() {
    let package = sample_package();
    let (tracker, segmented) = publish(&package);
    for segment in &segmented.segments[..EC_DATA_SEGMENTS] {
        tracker.add_segment(segment).unwrap();
    }
    assert!(tracker.is_available(&segmented.package_hash));

    tracker.remove(&segmented.package_hash);
    assert!(!tracker.is_available(&segmented.package_hash));
    assert!(matches!(
        tracker.reconstruct(&segmented.package_hash),
        Err(AvailabilityError::UnknownPackage)
    ));
}
