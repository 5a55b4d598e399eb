// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Upload, update, resynchronize and delete against an in-memory session.

use std::sync::Arc;

use roibridge_region::Region;
use roibridge_shape::{BoundaryType, PlaneCoordinate, RemoteShape, RoiId, ShapeGeometry, ShapeId};
use roibridge_tree::{
    BridgeError, BridgeOptions, ImageId, InMemorySession, RoiBridge, RoiCollection,
    SessionErrorKind, SessionStack, SyncReport,
};

const IMAGE: ImageId = ImageId(1);

fn bridge() -> (Arc<InMemorySession>, RoiBridge<InMemorySession, &'static str>) {
    let session = Arc::new(InMemorySession::new());
    let bridge = RoiBridge::new(Arc::clone(&session));
    (session, bridge)
}

fn square(x: f64) -> Region {
    Region::rect(x, 0.0, 4.0, 4.0, BoundaryType::Closed)
}

fn point(x: f64) -> RemoteShape {
    RemoteShape::new(ShapeGeometry::Point { x, y: 1.0 }).with_text("ij-bt:[C]")
}

#[test]
fn first_upload_creates_roi_with_ids() {
    let (session, mut bridge) = bridge();
    let saved = bridge
        .upload_region(IMAGE, "a", &square(0.0).or(square(10.0)))
        .unwrap();
    let id = saved.id.unwrap();
    assert_eq!(saved.version, Some(1));
    assert_eq!(saved.shape_count(), 2);
    assert!(saved.shapes().all(RemoteShape::is_persisted));
    assert_eq!(session.calls().save_new, 1);
    assert_eq!(bridge.cache().latest(id), Some(&saved));
    assert_eq!(bridge.cache().saved(&"a"), Some(&saved));
}

#[test]
fn reupload_updates_same_objects() {
    let (session, mut bridge) = bridge();
    let first = bridge.upload_region(IMAGE, "a", &square(0.0)).unwrap();
    let second = bridge.upload_region(IMAGE, "a", &square(2.0)).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.version, Some(2));
    let first_shape = first.shapes().next().unwrap().id;
    let second_shape = second.shapes().next().unwrap();
    assert_eq!(first_shape, second_shape.id, "shape id is reused");
    assert!(matches!(second_shape.geometry, ShapeGeometry::Rectangle { x, .. } if x == 2.0));
    assert_eq!(session.roi_count(), 1);
    assert_eq!(session.calls().save_new, 1);
    assert_eq!(session.calls().save_existing, 1);
}

#[test]
fn distinct_keys_create_distinct_rois() {
    let (session, mut bridge) = bridge();
    let a = bridge.upload_region(IMAGE, "a", &square(0.0)).unwrap();
    let b = bridge.upload_region(IMAGE, "b", &square(0.0)).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(session.roi_count(), 2);
}

#[test]
fn version_map_avoids_stale_updates() {
    let (_session, mut bridge) = bridge();
    let saved = bridge.upload_region(IMAGE, "a", &square(0.0)).unwrap();
    let id = saved.id.unwrap();

    // Bump the version through another workflow; the identity map still
    // holds version 1.
    let report = bridge.resynchronize(id, &[point(3.0)]).unwrap();
    assert!(report.has_changes());
    assert_eq!(bridge.cache().saved(&"a").unwrap().version, Some(1));
    assert_eq!(bridge.cache().latest(id).unwrap().version, Some(2));

    let again = bridge.upload_region(IMAGE, "a", &square(5.0)).unwrap();
    assert_eq!(again.version, Some(3));
}

#[test]
fn stale_version_surfaces_without_version_map() {
    let session = Arc::new(InMemorySession::new());
    let options = BridgeOptions {
        fetch_when_uncached: false,
        ..BridgeOptions::default()
    };
    let mut bridge = RoiBridge::with_options(Arc::clone(&session), options);
    let saved = bridge.upload_region(IMAGE, 1_u32, &square(0.0)).unwrap();
    let id = saved.id.unwrap();

    session.touch(id);
    bridge.cache_mut().forget_latest(id);
    let err = bridge.upload_region(IMAGE, 1_u32, &square(1.0)).unwrap_err();
    assert!(err.is_stale(), "unexpected error: {err}");
}

#[test]
fn uncached_version_is_fetched() {
    let (session, mut bridge) = bridge();
    let saved = bridge.upload_region(IMAGE, "a", &square(0.0)).unwrap();
    let id = saved.id.unwrap();

    session.touch(id);
    bridge.cache_mut().forget_latest(id);
    let again = bridge.upload_region(IMAGE, "a", &square(1.0)).unwrap();
    assert_eq!(again.version, Some(3));
}

#[test]
fn unconvertible_region_is_rejected_before_saving() {
    let (session, mut bridge) = bridge();
    let err = bridge
        .upload_region(IMAGE, "a", &square(0.0).and(square(1.0)))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Conversion(_)));
    assert_eq!(session.calls().save_new, 0);
}

#[test]
fn download_records_versions() {
    let (session, mut bridge) = bridge();
    let stored = session.insert_roi(
        IMAGE,
        roibridge_shape::RemoteRoi::from_shapes([point(0.0), point(1.0)]),
    );
    let tree = bridge.download_rois(IMAGE).unwrap();
    assert_eq!(tree.len(), 1);
    let id = stored.id.unwrap();
    assert_eq!(bridge.cache().latest(id), Some(&stored));
    assert_eq!(tree.get(id).unwrap().len(), 2);
}

#[test]
fn resynchronize_reports_each_change() {
    let (session, mut bridge) = bridge();
    let stored = session.insert_roi(
        IMAGE,
        roibridge_shape::RemoteRoi::from_shapes([point(0.0), point(1.0), point(2.0)]),
    );
    let id = stored.id.unwrap();
    let ids: Vec<ShapeId> = stored.shapes().filter_map(|s| s.id).collect();

    let desired = [
        // Same as stored.
        point(0.0).with_id(ids[0]),
        // Moved.
        point(9.0).with_id(ids[1]),
        // New, without an id.
        point(5.0),
    ];
    let report = bridge.resynchronize(id, &desired).unwrap();
    assert_eq!(
        report,
        SyncReport {
            added: 1,
            updated: 1,
            deleted: 1,
            unchanged: 1,
        }
    );
    assert_eq!(session.calls().save_existing, 1);

    let remote = session.peek(id).unwrap();
    assert_eq!(remote.shape_count(), 3);
    assert!(remote.find_by_id(ids[2]).is_none());
    assert!(remote.find_by_id(ids[1]).is_some());
}

#[test]
fn resynchronize_matches_by_equivalence() {
    let (session, mut bridge) = bridge();
    let stored = session.insert_roi(
        IMAGE,
        roibridge_shape::RemoteRoi::from_shapes([point(0.0), point(1.0)]),
    );
    let id = stored.id.unwrap();
    let report = bridge
        .resynchronize(id, &[point(1.0), point(0.0)])
        .unwrap();
    assert_eq!(report.unchanged, 2);
    assert!(!report.has_changes());
    assert_eq!(session.calls().save_existing, 0, "nothing to save");
}

#[test]
fn resynchronize_replaces_kind_changes() {
    let (session, mut bridge) = bridge();
    let stored = session.insert_roi(
        IMAGE,
        roibridge_shape::RemoteRoi::from_shapes([point(0.0)]),
    );
    let id = stored.id.unwrap();
    let old = stored.shapes().next().unwrap().id.unwrap();
    let replacement = RemoteShape::new(ShapeGeometry::Rectangle {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    })
    .with_id(old);

    let report = bridge.resynchronize(id, &[replacement]).unwrap();
    assert_eq!((report.added, report.deleted), (1, 1));
    let remote = session.peek(id).unwrap();
    assert!(remote.find_by_id(old).is_none());
    assert_eq!(remote.shape_count(), 1);
}

#[test]
fn save_collection_adopts_server_ids() {
    let (session, mut bridge) = bridge();
    let mut collection = RoiCollection::new("cells");
    let plane = PlaneCoordinate::new(2, 0, 0).unwrap();
    let element = collection.add(square(0.0).on_plane(plane)).unwrap();
    assert!(collection.is_pending(element));

    let saved = bridge.save_collection(IMAGE, &mut collection).unwrap();
    assert_eq!(collection.id(), saved.id);
    assert!(!collection.is_pending(element));
    let shape = collection.element_shape(element).unwrap();
    assert!(shape.is_persisted());
    assert_eq!(shape.plane, plane);

    // Editing a backed element and saving again updates in place.
    collection
        .with_element_mut(element, |r| r.translate(kurbo::Vec2::new(1.0, 0.0)))
        .unwrap();
    let updated = bridge.save_collection(IMAGE, &mut collection).unwrap();
    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.version, Some(2));
    assert_eq!(session.roi_count(), 1);
}

#[test]
fn delete_roi_purges_cache() {
    let (session, mut bridge) = bridge();
    let saved = bridge.upload_region(IMAGE, "a", &square(0.0)).unwrap();
    let id = saved.id.unwrap();
    bridge.delete_roi(id).unwrap();
    assert!(bridge.cache().latest(id).is_none());
    assert!(bridge.cache().saved(&"a").is_none());
    assert_eq!(session.roi_count(), 0);

    // The next upload for the same key creates a new ROI.
    let fresh = bridge.upload_region(IMAGE, "a", &square(0.0)).unwrap();
    assert_ne!(fresh.id, Some(id));
}

#[test]
fn delete_shape_checks_membership() {
    let (session, mut bridge) = bridge();
    let saved = bridge
        .upload_region(IMAGE, "a", &square(0.0).or(square(8.0)))
        .unwrap();
    let id = saved.id.unwrap();
    let err = bridge.delete_shape(id, ShapeId(999)).unwrap_err();
    assert!(matches!(err, BridgeError::ShapeNotInRoi { .. }));
    assert_eq!(session.calls().delete, 0);

    let victim = saved.shapes().next().unwrap().id.unwrap();
    bridge.delete_shape(id, victim).unwrap();
    assert!(bridge.cache().latest(id).is_none());
    assert_eq!(session.peek(id).unwrap().shape_count(), 1);
}

#[test]
fn reupload_after_shape_delete_updates_same_roi() {
    let (session, mut bridge) = bridge();
    let region = square(0.0).or(square(10.0));
    let first = bridge.upload_region(IMAGE, "a", &region).unwrap();
    let id = first.id.unwrap();
    let victim = first.shapes().next().unwrap().id.unwrap();
    bridge.delete_shape(id, victim).unwrap();
    assert_eq!(bridge.cache().saved(&"a").unwrap().shape_count(), 1);

    let again = bridge.upload_region(IMAGE, "a", &region).unwrap();
    assert_eq!(again.id, Some(id));
    assert_eq!(again.shape_count(), 2);
    assert_eq!(session.roi_count(), 1);
    assert_eq!(session.calls().save_new, 1);
    assert_eq!(session.peek(id).unwrap().version, again.version);
}

#[test]
fn session_errors_propagate() {
    let (session, mut bridge) = bridge();
    session.set_offline(true);
    let err = bridge.download_roi(RoiId(1)).unwrap_err();
    let BridgeError::Session(inner) = err else {
        panic!("expected a session error, got {err:?}");
    };
    assert_eq!(inner.kind, SessionErrorKind::Communication);
}

#[test]
fn lazy_loaders_share_the_session() {
    let (session, bridge) = bridge();
    session.insert_roi(IMAGE, roibridge_shape::RemoteRoi::with_name("x"));
    session.add_table(IMAGE, "measurements");
    let rois = bridge.lazy_rois(IMAGE);
    let tables = bridge.lazy_tables(IMAGE);
    assert_eq!(rois.children().len(), 1);
    assert_eq!(tables.tables()[0].name, "measurements");
    assert_eq!(session.calls().fetch_rois, 1);
}

#[test]
fn bridge_binds_innermost_scoped_session() {
    let stack = SessionStack::new();
    let none = RoiBridge::<InMemorySession, u64>::from_current(&stack, BridgeOptions::default());
    assert!(none.is_none());

    let outer = Arc::new(InMemorySession::new());
    let inner = Arc::new(InMemorySession::new());
    let _outer_scope = stack.enter(Arc::clone(&outer));
    {
        let _inner_scope = stack.enter(Arc::clone(&inner));
        let mut bridge =
            RoiBridge::<_, u64>::from_current(&stack, BridgeOptions::default()).unwrap();
        bridge.upload_region(IMAGE, 1, &square(0.0)).unwrap();
    }
    assert_eq!(inner.roi_count(), 1);
    assert_eq!(outer.roi_count(), 0);

    let mut bridge = RoiBridge::<_, u64>::from_current(&stack, BridgeOptions::default()).unwrap();
    bridge.upload_region(IMAGE, 1, &square(0.0)).unwrap();
    assert_eq!(outer.roi_count(), 1);
}
