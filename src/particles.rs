//! Smile-reactive particle fountain.
//!
//! Particles live in the emitter's local frame: the local origin is the
//! between-eyes point of the anchor face and the local axes follow that face's
//! basis frame. Each tick applies gravity, moves every particle, and relaunches
//! any particle that fell through the floor from the local origin with a
//! velocity scaled by the current smile factor.

use crate::{config::ParticleConfig, Error, Result};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// One particle of the pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
}

/// Per-tick input taken from the anchor face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterUpdate {
    /// Between-eyes point in scene space
    pub origin: Option<Point3<f32>>,
    /// Face basis as matrix columns; `None` keeps the previous orientation
    pub orientation: Option<Matrix3<f32>>,
    /// Launch intensity from the smile response curve
    pub smile_factor: f32,
}

/// Fixed-size particle pool with its emitter transform
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    config: ParticleConfig,
    origin: Point3<f32>,
    orientation: Matrix3<f32>,
    rng: StdRng,
}

impl ParticleSystem {
    /// Allocate the pool at the local origin with randomized launch velocities.
    ///
    /// Uses `config.seed` when set so runs are reproducible.
    ///
    /// # Errors
    ///
    /// Returns an error if the particle count is zero or a velocity range is inverted
    pub fn new(config: &ParticleConfig) -> Result<Self> {
        if config.count == 0 {
            return Err(Error::InvalidInput("Particle count must be at least 1".to_string()));
        }
        if config.spawn_depth.0 > config.spawn_depth.1 || config.lift.0 > config.lift.1 {
            return Err(Error::InvalidInput("Particle velocity ranges must be ordered".to_string()));
        }
        log::info!("Creating particle system with {} particles", config.count);

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let lateral = config.spawn_lateral * config.speed;
        let depth = (config.spawn_depth.0 * config.speed, config.spawn_depth.1 * config.speed);
        let particles = (0..config.count)
            .map(|_| Particle {
                position: Point3::origin(),
                velocity: Vector3::new(
                    uniform(&mut rng, -lateral, lateral),
                    uniform(&mut rng, -lateral, lateral),
                    uniform(&mut rng, depth.0, depth.1),
                ),
            })
            .collect();

        Ok(Self {
            particles,
            config: config.clone(),
            origin: Point3::origin(),
            orientation: Matrix3::identity(),
            rng,
        })
    }

    /// Particles in emitter-local coordinates
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to individual particles; the pool size is fixed
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Emitter origin in scene space
    #[must_use]
    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// Emitter orientation (basis columns)
    #[must_use]
    pub fn orientation(&self) -> &Matrix3<f32> {
        &self.orientation
    }

    /// Local-to-scene transform handed to the renderer
    #[must_use]
    pub fn transform(&self) -> Matrix4<f32> {
        self.orientation
            .to_homogeneous()
            .append_translation(&self.origin.coords)
    }

    /// Scene-space position of particle `i`
    #[must_use]
    pub fn world_position(&self, i: usize) -> Option<Point3<f32>> {
        self.particles
            .get(i)
            .map(|p| self.origin + self.orientation * p.position.coords)
    }

    /// Take the anchor face's geometry for this tick, then integrate.
    ///
    /// Returns the number of particles relaunched.
    pub fn update(&mut self, update: &EmitterUpdate) -> usize {
        if let Some(origin) = update.origin {
            self.origin = origin;
        }
        if let Some(orientation) = update.orientation {
            self.orientation = orientation;
        }
        self.integrate(update.smile_factor)
    }

    /// Apply gravity and velocity to every particle, relaunching those below
    /// the floor. Returns the number of particles relaunched.
    pub fn integrate(&mut self, smile_factor: f32) -> usize {
        let factor = if smile_factor.is_finite() { smile_factor.max(0.0) } else { 0.0 };
        let mut relaunched = 0;

        for i in 0..self.particles.len() {
            let particle = &mut self.particles[i];
            particle.velocity.y -= self.config.gravity;
            particle.position += particle.velocity;

            if particle.position.y < self.config.floor {
                let velocity = self.relaunch_velocity(factor);
                let particle = &mut self.particles[i];
                particle.position = Point3::origin();
                particle.velocity = velocity;
                relaunched += 1;
            }
        }

        relaunched
    }

    fn relaunch_velocity(&mut self, factor: f32) -> Vector3<f32> {
        let speed = self.config.speed;
        let lateral = self.config.spawn_lateral;
        let lift = factor.max(self.config.min_smile_factor);

        Vector3::new(
            factor * speed * uniform(&mut self.rng, -lateral, lateral),
            lift * speed * uniform(&mut self.rng, self.config.lift.0, self.config.lift.1),
            factor * speed * uniform(&mut self.rng, self.config.spawn_depth.0, self.config.spawn_depth.1),
        )
    }
}

fn uniform(rng: &mut StdRng, low: f32, high: f32) -> f32 {
    if low < high {
        rng.gen_range(low..high)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ParticleConfig {
        ParticleConfig {
            seed: Some(7),
            ..ParticleConfig::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let config = config();
        let system = ParticleSystem::new(&config).unwrap();
        assert_eq!(system.particles().len(), config.count);

        for p in system.particles() {
            assert_eq!(p.position, Point3::origin());
            assert!(p.velocity.x.abs() <= 5.0 && p.velocity.y.abs() <= 5.0);
            assert!((5.0..=15.0).contains(&p.velocity.z));
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        let empty = ParticleConfig { count: 0, ..config() };
        assert!(ParticleSystem::new(&empty).is_err());

        let inverted = ParticleConfig { lift: (10.0, 2.0), ..config() };
        assert!(ParticleSystem::new(&inverted).is_err());
    }

    #[test]
    fn test_gravity_and_motion() {
        let mut system = ParticleSystem::new(&config()).unwrap();
        system.particles_mut()[0] = Particle {
            position: Point3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(1.0, 1.0, 1.0),
        };

        system.integrate(0.0);
        let p = system.particles()[0];
        assert!((p.velocity.y - (1.0 - config().gravity)).abs() < 1e-6);
        assert!((p.position.x - 2.0).abs() < 1e-6);
        assert!((p.position.y - (3.0 - config().gravity)).abs() < 1e-6);
    }

    #[test]
    fn test_particle_below_floor_relaunches_upwards() {
        for factor in [0.0, 0.5, 4.0] {
            let mut system = ParticleSystem::new(&config()).unwrap();
            system.particles_mut()[3] = Particle {
                position: Point3::new(12.0, -301.0, 4.0),
                velocity: Vector3::zeros(),
            };

            let relaunched = system.integrate(factor);
            let p = system.particles()[3];
            assert!(relaunched >= 1);
            assert_eq!(p.position, Point3::origin());
            assert!(p.velocity.y > 0.0, "factor {factor} gave vy {}", p.velocity.y);
        }
    }

    #[test]
    fn test_relaunch_lands_on_emitter_origin() {
        let mut system = ParticleSystem::new(&config()).unwrap();
        system.particles_mut()[0].position.y = -400.0;

        let origin = Point3::new(-20.0, 35.0, 1.0);
        system.update(&EmitterUpdate {
            origin: Some(origin),
            orientation: None,
            smile_factor: 1.0,
        });

        assert_eq!(system.world_position(0).unwrap(), origin);
    }

    #[test]
    fn test_missing_orientation_keeps_previous() {
        let mut system = ParticleSystem::new(&config()).unwrap();
        let flipped = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));

        system.update(&EmitterUpdate {
            origin: None,
            orientation: Some(flipped),
            smile_factor: 0.0,
        });
        system.update(&EmitterUpdate {
            origin: None,
            orientation: None,
            smile_factor: 0.0,
        });

        assert_eq!(*system.orientation(), flipped);
    }

    #[test]
    fn test_transform_places_local_origin() {
        let mut system = ParticleSystem::new(&config()).unwrap();
        system.update(&EmitterUpdate {
            origin: Some(Point3::new(5.0, 6.0, 7.0)),
            orientation: Some(Matrix3::identity()),
            smile_factor: 0.0,
        });

        let moved = system.transform().transform_point(&Point3::origin());
        assert_eq!(moved, Point3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn test_pool_size_fixed_and_nan_safe() {
        let mut system = ParticleSystem::new(&config()).unwrap();
        for _ in 0..2000 {
            system.integrate(f32::NAN);
        }
        assert_eq!(system.particles().len(), config().count);
        assert!(system
            .particles()
            .iter()
            .all(|p| p.position.coords.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_seeded_runs_match() {
        let mut a = ParticleSystem::new(&config()).unwrap();
        let mut b = ParticleSystem::new(&config()).unwrap();
        for _ in 0..300 {
            a.integrate(2.0);
            b.integrate(2.0);
        }
        assert_eq!(a.particles(), b.particles());
    }
}
