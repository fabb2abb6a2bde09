//! Transform sync
//!
//! Writes each linked body's pose into its render object's model matrix after
//! every step. Links are weak: an id past the end of the live collection is
//! skipped for that frame and tried again on the next one.

use planar_math::{mat4, Vec2};
use rapier2d::prelude::RigidBodySet;
use slotmap::SlotMap;

use crate::body::{BodyKey, BodyRecord};
use crate::host::RenderTargets;

/// Copy body poses into linked render objects; returns how many were written
pub(crate) fn sync_transforms(
    records: &mut SlotMap<BodyKey, BodyRecord>,
    bodies: &RigidBodySet,
    targets: &mut dyn RenderTargets,
) -> usize {
    let count = targets.object_count();
    let mut written = 0;

    for record in records.values_mut() {
        let Some(link) = record.link.as_mut() else {
            continue;
        };
        if link.object_id >= count {
            log::trace!(
                "Body '{}' links to render object {} but only {} exist",
                record.name,
                link.object_id,
                count
            );
            continue;
        }
        let Some(body) = bodies.get(record.handle) else {
            continue;
        };
        let Some(model) = targets.model_matrix_mut(link.object_id) else {
            continue;
        };

        let position = body.translation();
        // The renderer's Z rotation runs opposite to the physics angle
        mat4::write_planar_pose(model, Vec2::new(position.x, position.y), -body.rotation().angle());
        written += 1;

        if !link.resolved {
            link.resolved = true;
            log::debug!("Body '{}' now drives render object {}", record.name, link.object_id);
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RenderLink;
    use planar_math::mat4::{planar_angle, planar_translation, IDENTITY};
    use rapier2d::prelude::{vector, RigidBodyBuilder};

    fn linked_body(bodies: &mut RigidBodySet, records: &mut SlotMap<BodyKey, BodyRecord>, object_id: usize) -> BodyKey {
        let handle = bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(vector![2.0, -1.0])
                .rotation(0.5)
                .build(),
        );
        let mut record = BodyRecord::new("body0", handle);
        record.link = Some(RenderLink::new(object_id));
        records.insert(record)
    }

    #[test]
    fn test_writes_negated_angle() {
        let mut bodies = RigidBodySet::new();
        let mut records = SlotMap::with_key();
        let key = linked_body(&mut bodies, &mut records, 1);
        let mut targets = vec![IDENTITY, IDENTITY];

        assert_eq!(sync_transforms(&mut records, &bodies, &mut targets), 1);
        assert_eq!(targets[0], IDENTITY);
        assert_eq!(planar_translation(&targets[1]), Vec2::new(2.0, -1.0));
        assert!((planar_angle(&targets[1]) + 0.5).abs() < 1e-5);
        assert!(records[key].link.unwrap().resolved);
    }

    #[test]
    fn test_out_of_range_link_is_inert() {
        let mut bodies = RigidBodySet::new();
        let mut records = SlotMap::with_key();
        let key = linked_body(&mut bodies, &mut records, 3);
        let mut targets = vec![IDENTITY];

        assert_eq!(sync_transforms(&mut records, &bodies, &mut targets), 0);
        assert_eq!(targets[0], IDENTITY);
        // The link survives so the body picks the object up again later
        assert_eq!(records[key].link.unwrap().object_id, 3);
        assert!(!records[key].link.unwrap().resolved);

        targets.resize(4, IDENTITY);
        assert_eq!(sync_transforms(&mut records, &bodies, &mut targets), 1);
    }

    #[test]
    fn test_keeps_z_components() {
        let mut bodies = RigidBodySet::new();
        let mut records = SlotMap::with_key();
        linked_body(&mut bodies, &mut records, 0);
        let mut model = IDENTITY;
        model[3][2] = -5.0;
        let mut targets = vec![model];

        sync_transforms(&mut records, &bodies, &mut targets);
        assert_eq!(targets[0][3][2], -5.0);
        assert_eq!(targets[0][2][2], 1.0);
    }
}
