//! Joints between bodies

use rapier2d::prelude::*;

use crate::foundation::math::Vec2;
use crate::physics::PhysicsError;

/// Handle to a joint in a [`SimulationWorld`](crate::physics::SimulationWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub(crate) ImpulseJointHandle);

/// Joint kinds
///
/// Anchors are given in the local space of each body.
#[derive(Debug, Clone, PartialEq)]
pub enum JointSpec {
    /// Shared pivot, free rotation
    Revolute {
        /// Pivot on the first body
        anchor_a: Vec2,
        /// Pivot on the second body
        anchor_b: Vec2,
        /// Optional angle limits in radians
        limits: Option<[f32; 2]>,
    },
    /// Rigid weld
    Fixed {
        /// Attachment on the first body
        anchor_a: Vec2,
        /// Attachment on the second body
        anchor_b: Vec2,
    },
    /// Slide along an axis
    Prismatic {
        /// Slide axis in the first body's space
        axis: Vec2,
        /// Attachment on the first body
        anchor_a: Vec2,
        /// Attachment on the second body
        anchor_b: Vec2,
        /// Optional translation limits
        limits: Option<[f32; 2]>,
    },
}

impl JointSpec {
    /// Revolute joint with the given pivots
    pub fn revolute(anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self::Revolute { anchor_a, anchor_b, limits: None }
    }

    /// Fixed joint with the given attachment points
    pub fn fixed(anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self::Fixed { anchor_a, anchor_b }
    }

    /// Prismatic joint along `axis`
    pub fn prismatic(axis: Vec2, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self::Prismatic { axis, anchor_a, anchor_b, limits: None }
    }

    /// Restrict the joint's free coordinate to `[min, max]`
    ///
    /// Has no effect on fixed joints.
    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        match &mut self {
            Self::Revolute { limits, .. } | Self::Prismatic { limits, .. } => *limits = Some([min, max]),
            Self::Fixed { .. } => {}
        }
        self
    }

    pub(crate) fn to_generic_joint(&self) -> Result<GenericJoint, PhysicsError> {
        let check_limits = |limits: &Option<[f32; 2]>| match limits {
            Some([min, max]) if !(min.is_finite() && max.is_finite() && min <= max) => {
                Err(PhysicsError::InvalidJoint(format!("Joint limits [{min}, {max}] are invalid")))
            }
            _ => Ok(()),
        };

        let joint: GenericJoint = match self {
            Self::Revolute { anchor_a, anchor_b, limits } => {
                check_limits(limits)?;
                let mut builder = RevoluteJointBuilder::new()
                    .local_anchor1(point![anchor_a.x, anchor_a.y])
                    .local_anchor2(point![anchor_b.x, anchor_b.y])
                    .contacts_enabled(false);
                if let Some(limits) = limits {
                    builder = builder.limits(*limits);
                }
                builder.build().into()
            }
            Self::Fixed { anchor_a, anchor_b } => FixedJointBuilder::new()
                .local_anchor1(point![anchor_a.x, anchor_a.y])
                .local_anchor2(point![anchor_b.x, anchor_b.y])
                .contacts_enabled(false)
                .build()
                .into(),
            Self::Prismatic { axis, anchor_a, anchor_b, limits } => {
                check_limits(limits)?;
                let axis = UnitVector::try_new(vector![axis.x, axis.y], 1.0e-6).ok_or_else(|| {
                    PhysicsError::InvalidJoint("Prismatic axis must be non-zero".to_string())
                })?;
                let mut builder = PrismaticJointBuilder::new(axis)
                    .local_anchor1(point![anchor_a.x, anchor_a.y])
                    .local_anchor2(point![anchor_b.x, anchor_b.y])
                    .contacts_enabled(false);
                if let Some(limits) = limits {
                    builder = builder.limits(*limits);
                }
                builder.build().into()
            }
        };

        Ok(joint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_only_apply_to_free_joints() {
        let revolute = JointSpec::revolute(Vec2::zeros(), Vec2::new(0.0, 1.0)).with_limits(-1.0, 1.0);
        assert_eq!(
            revolute,
            JointSpec::Revolute { anchor_a: Vec2::zeros(), anchor_b: Vec2::new(0.0, 1.0), limits: Some([-1.0, 1.0]) }
        );

        let fixed = JointSpec::fixed(Vec2::zeros(), Vec2::zeros()).with_limits(-1.0, 1.0);
        assert_eq!(fixed, JointSpec::fixed(Vec2::zeros(), Vec2::zeros()));
    }

    #[test]
    fn test_invalid_joints_are_rejected() {
        let zero_axis = JointSpec::prismatic(Vec2::zeros(), Vec2::zeros(), Vec2::zeros());
        assert!(matches!(zero_axis.to_generic_joint(), Err(PhysicsError::InvalidJoint(_))));

        let inverted = JointSpec::revolute(Vec2::zeros(), Vec2::zeros()).with_limits(1.0, -1.0);
        assert!(inverted.to_generic_joint().is_err());

        let good = JointSpec::prismatic(Vec2::x(), Vec2::zeros(), Vec2::zeros()).with_limits(0.0, 2.0);
        assert!(good.to_generic_joint().is_ok());
    }
}
