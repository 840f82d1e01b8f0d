use rand::Rng;

use super::job::{DeliveryManifest, JobBoard, JobCompletion, JobManifest};
use super::EconomyError;
use crate::config::EconomyConfig;
use crate::ensure;
use crate::math::distance_squared;
use crate::math::units::world;
use crate::objects::{GameObject, ObjectId, ObjectType};
use crate::world::World;

/// Posts random jobs on a timer for the endless game mode.
#[derive(Clone, Debug)]
pub struct JobGenerator {
    pub time_until_next_job: f64,
    config: EconomyConfig,
}

impl JobGenerator {
    pub fn new(config: &EconomyConfig) -> Self {
        Self {
            time_until_next_job: config.initial_time_until_next_job,
            config: config.clone(),
        }
    }

    /// Posts a job straight away when the board is empty, and another
    /// whenever the timer runs out.
    pub fn tick<R>(&mut self, dt: f64, jobs: &mut JobBoard, world: &mut World, rng: &mut R) -> Result<(), EconomyError>
    where
        R: Rng + ?Sized,
    {
        if jobs.is_empty() {
            self.post_job(jobs, world, rng)?;
        }

        self.time_until_next_job -= dt;
        if self.time_until_next_job < 0.0 {
            self.post_job(jobs, world, rng)?;
        }

        Ok(())
    }

    fn post_job<R>(&mut self, jobs: &mut JobBoard, world: &mut World, rng: &mut R) -> Result<(), EconomyError>
    where
        R: Rng + ?Sized,
    {
        self.time_until_next_job = random_delay(rng, self.config.min_time_between_jobs, self.config.max_time_between_jobs);

        let manifest = self.create_manifest(world, rng)?;
        jobs.post(manifest, JobCompletion::Remove, world, rng)?;
        Ok(())
    }

    pub fn create_manifest<R>(&self, world: &World, rng: &mut R) -> Result<JobManifest, EconomyError>
    where
        R: Rng + ?Sized,
    {
        let source = self.choose_source(world, rng)?;
        let destinations = choose_destinations(world);
        ensure!(!destinations.is_empty(), EconomyError::NoDeliveryZones);

        let deliveries = self.create_deliveries(source, &destinations, rng);
        let score = score_deliveries(deliveries.iter().filter_map(|delivery| {
            let spawner = world.get(delivery.spawner_id)?;
            let destination = world.get(delivery.destination_id)?;
            Some((spawner.body.position, destination.body.position))
        }));

        Ok(JobManifest {
            deliveries,
            description: self.config.job_description.clone(),
            time_add: self.config.job_time_bonus,
            score,
        })
    }

    /// A random package spawn, limited to the few closest to the player's car
    /// (or its ghost) when there is one.
    fn choose_source<R>(&self, world: &World, rng: &mut R) -> Result<ObjectId, EconomyError>
    where
        R: Rng + ?Sized,
    {
        let mut sources: Vec<&GameObject> = world.objects_of_type(ObjectType::PackageSpawn).collect();
        ensure!(!sources.is_empty(), EconomyError::NoPackageSpawns);

        let vehicle = world
            .objects_of_type(ObjectType::Car)
            .next()
            .or_else(|| world.objects_of_type(ObjectType::GhostCar).next());

        if let Some(vehicle) = vehicle {
            let origin = vehicle.body.position;
            sources.sort_by(|a, b| {
                distance_squared(a.body.position, origin).total_cmp(&distance_squared(b.body.position, origin))
            });
            sources.truncate(self.config.closest_spawners.max(1));
        }

        let index = random_between(rng, 0, sources.len());
        sources
            .get(index)
            .map(|source| source.id())
            .ok_or(EconomyError::NoPackageSpawns)
    }

    fn create_deliveries<R>(&self, source: ObjectId, destinations: &[ObjectId], rng: &mut R) -> Vec<DeliveryManifest>
    where
        R: Rng + ?Sized,
    {
        let count = random_between(rng, self.config.min_deliveries_per_job, self.config.max_deliveries_per_job);

        let mut deliveries = Vec::with_capacity(count);
        for _ in 0..count {
            let index = random_between(rng, 0, destinations.len());
            if let Some(destination) = destinations.get(index) {
                deliveries.push(DeliveryManifest {
                    spawner_id: source,
                    destination_id: *destination,
                });
            }
        }
        deliveries
    }
}

/// Every delivery zone is a candidate destination.
fn choose_destinations(world: &World) -> Vec<ObjectId> {
    world
        .objects_of_type(ObjectType::DeliveryZone)
        .map(|zone| zone.id())
        .collect()
}

/// Sum of squared spawner-to-destination distances, floored to two decimals.
pub fn score_deliveries(deliveries: impl IntoIterator<Item = (world::Point2D, world::Point2D)>) -> f64 {
    let sum: f64 = deliveries
        .into_iter()
        .map(|(spawner, destination)| distance_squared(destination, spawner))
        .sum();

    (sum * 100.0).floor() / 100.0
}

/// Uniform in `[min, max)`, or `min` when the range is empty.
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}

/// Whole milliseconds in `[min, max)`, or `min` when the range is empty.
fn random_delay<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    min + rng.gen_range(0.0..max - min).floor()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::test_support::{grid_document, object, world_from};

    fn spawners_world() -> World {
        world_from(
            grid_document(&["rrrrrrrrrrrrrrrr"; 4], 4),
            &[
                object(1, "PackageSpawn", 0.5, 0.5),
                object(2, "PackageSpawn", 15.5, 3.5),
                object(3, "PackageSpawn", 14.5, 3.5),
                object(4, "PackageSpawn", 13.5, 3.5),
                object(5, "PackageSpawn", 1.5, 0.5),
                object(6, "DeliveryZone", 7.0, 0.0).sized(2.0, 2.0),
                object(7, "DeliveryZone", 9.0, 2.0).sized(2.0, 2.0),
                object(8, "Car", 15.0, 2.0),
            ],
        )
    }

    #[test]
    fn test_random_between_is_exclusive() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(random_between(&mut rng, 1, 2), 1);
            assert!(random_between(&mut rng, 0, 3) < 3);
        }
        assert_eq!(random_between(&mut rng, 4, 4), 4);
        assert_eq!(random_between(&mut rng, 0, 0), 0);
    }

    #[test]
    fn test_one_delivery_when_max_is_two() {
        let world = spawners_world();
        let config = EconomyConfig {
            min_deliveries_per_job: 1,
            max_deliveries_per_job: 2,
            ..EconomyConfig::default()
        };
        let generator = JobGenerator::new(&config);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            let manifest = generator.create_manifest(&world, &mut rng).unwrap();
            assert_eq!(manifest.deliveries.len(), 1);
            assert_eq!(manifest.description, "do a job");
            assert_eq!(manifest.time_add, 30_000.0);
        }
    }

    #[test]
    fn test_sources_are_closest_to_car() {
        let world = spawners_world();
        let generator = JobGenerator::new(&EconomyConfig::default());
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..100 {
            let manifest = generator.create_manifest(&world, &mut rng).unwrap();
            for delivery in &manifest.deliveries {
                assert!([ObjectId(2), ObjectId(3), ObjectId(4)].contains(&delivery.spawner_id));
                assert!([ObjectId(6), ObjectId(7)].contains(&delivery.destination_id));
            }
            assert!((1..3).contains(&manifest.deliveries.len()));
        }
    }

    #[test]
    fn test_sources_without_car_are_unrestricted() {
        let world = world_from(
            grid_document(&["rrrr"; 4], 4),
            &[
                object(1, "PackageSpawn", 0.5, 0.5),
                object(2, "PackageSpawn", 1.5, 0.5),
                object(3, "PackageSpawn", 2.5, 0.5),
                object(4, "PackageSpawn", 3.5, 0.5),
                object(6, "DeliveryZone", 1.0, 2.0).sized(1.0, 1.0),
            ],
        );
        let generator = JobGenerator::new(&EconomyConfig::default());
        let mut rng = StdRng::seed_from_u64(2);

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let manifest = generator.create_manifest(&world, &mut rng).unwrap();
            seen.insert(manifest.deliveries[0].spawner_id);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_missing_spawns_or_zones() {
        let generator = JobGenerator::new(&EconomyConfig::default());
        let mut rng = StdRng::seed_from_u64(1);

        let world = world_from(
            grid_document(&["rrrr"; 4], 4),
            &[object(6, "DeliveryZone", 1.0, 2.0).sized(1.0, 1.0)],
        );
        assert!(matches!(
            generator.create_manifest(&world, &mut rng),
            Err(EconomyError::NoPackageSpawns)
        ));

        let world = world_from(grid_document(&["rrrr"; 4], 4), &[object(1, "PackageSpawn", 0.5, 0.5)]);
        assert!(matches!(
            generator.create_manifest(&world, &mut rng),
            Err(EconomyError::NoDeliveryZones)
        ));
    }

    #[test]
    fn test_score_ignores_delivery_order() {
        let a = (world::Point2D::new(0.5, 0.5), world::Point2D::new(3.0, 4.5));
        let b = (world::Point2D::new(2.0, 1.0), world::Point2D::new(7.25, 0.0));
        let c = (world::Point2D::new(1.0, 1.0), world::Point2D::new(1.0, 2.5));

        let forward = score_deliveries([a, b, c]);
        assert_eq!(forward, score_deliveries([c, a, b]));
        assert_eq!(forward, score_deliveries([b, c, a]));
        // 53.0625 before flooring
        assert_eq!(forward, 53.06);
    }

    #[test]
    fn test_score_floors_to_two_decimals() {
        let delivery = (world::Point2D::new(0.0, 0.0), world::Point2D::new(0.1, 0.0));
        assert_eq!(score_deliveries([delivery]), 0.01);

        let delivery = (world::Point2D::new(0.0, 0.0), world::Point2D::new(1.0 / 3.0, 0.0));
        assert_eq!(score_deliveries([delivery]), 0.11);
        assert_eq!(score_deliveries(Vec::<(world::Point2D, world::Point2D)>::new()), 0.0);
    }

    #[test]
    fn test_tick_posts_when_board_empty_and_on_timer() {
        let mut world = spawners_world();
        let mut jobs = JobBoard::new();
        let mut generator = JobGenerator::new(&EconomyConfig::default());
        let mut rng = StdRng::seed_from_u64(4);

        generator.tick(16.0, &mut jobs, &mut world, &mut rng).unwrap();
        assert_eq!(jobs.len(), 1);
        assert!((5_000.0..30_000.0).contains(&(generator.time_until_next_job + 16.0)));

        generator.tick(16.0, &mut jobs, &mut world, &mut rng).unwrap();
        assert_eq!(jobs.len(), 1);

        generator.time_until_next_job = 10.0;
        generator.tick(16.0, &mut jobs, &mut world, &mut rng).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(generator.time_until_next_job >= 5_000.0);
    }
}
