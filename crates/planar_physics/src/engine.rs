//! Simulation engine instance
//!
//! Bundles the rapier sets and pipeline that make up one simulation. The World
//! owns exactly one [`Engine`] and drops it last on teardown.

use std::num::NonZeroUsize;

use planar_math::Vec2;
use rapier2d::prelude::{
    vector, CCDSolver, DefaultBroadPhase, EventHandler, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsHooks, PhysicsPipeline, QueryPipeline,
    RigidBodyHandle, RigidBodySet, ColliderSet, Vector,
};

use crate::error::{PhysicsError, PhysicsResult};

pub(crate) struct Engine {
    gravity: Vector<f32>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

/// Convert solver iteration counts, rejecting zero velocity iterations
pub(crate) fn solver_iterations(velocity: u32, position: u32) -> PhysicsResult<(NonZeroUsize, usize)> {
    let velocity = NonZeroUsize::new(velocity as usize).ok_or_else(|| {
        PhysicsError::validation("velocity iterations must be at least 1")
    })?;
    Ok((velocity, position as usize))
}

impl Engine {
    pub fn new(gravity: Vec2, velocity_iterations: u32, position_iterations: u32) -> PhysicsResult<Self> {
        if !gravity.is_finite() {
            return Err(PhysicsError::ResourceCreation(format!(
                "gravity must be finite, got ({}, {})",
                gravity.x, gravity.y
            )));
        }
        let (velocity, position) = solver_iterations(velocity_iterations, position_iterations)
            .map_err(|e| PhysicsError::ResourceCreation(e.to_string()))?;

        let mut params = IntegrationParameters::default();
        params.num_solver_iterations = velocity;
        params.num_internal_pgs_iterations = position;

        Ok(Self {
            gravity: vector![gravity.x, gravity.y],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        })
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
    }

    pub fn iterations(&self) -> (u32, u32) {
        (
            self.params.num_solver_iterations.get() as u32,
            self.params.num_internal_pgs_iterations as u32,
        )
    }

    pub fn set_iterations(&mut self, velocity: NonZeroUsize, position: usize) {
        self.params.num_solver_iterations = velocity;
        self.params.num_internal_pgs_iterations = position;
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32, hooks: &dyn PhysicsHooks, events: &dyn EventHandler) {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None::<&mut QueryPipeline>,
            hooks,
            events,
        );
    }

    /// Remove a body with its colliders and joints
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Clear forces and torques accumulated for the last step
    pub fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }
}
