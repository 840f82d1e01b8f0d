use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::EconomyError;
use crate::ensure;
use crate::objects::{package, ObjectId, ObjectKind, ObjectType, Package, Shape};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryManifest {
    pub spawner_id: ObjectId,
    pub destination_id: ObjectId,
}

/// A batch of deliveries, as generated or as written in a scenario script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobManifest {
    pub deliveries: Vec<DeliveryManifest>,
    #[serde(default)]
    pub description: String,
    /// Milliseconds added to the session clock on completion
    #[serde(default)]
    pub time_add: f64,
    #[serde(default)]
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happens once every package of a job has been delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobCompletion {
    /// Just drop the job
    Remove,
    /// Start the named scenario event group
    RunTutorial(String),
}

#[derive(Clone, Debug)]
pub struct Job {
    pub id: JobId,
    pub manifest: JobManifest,
    pub completion: JobCompletion,
    outstanding: BTreeSet<ObjectId>,
}

impl Job {
    /// Packages spawned for this job that haven't been delivered yet.
    pub fn outstanding(&self) -> &BTreeSet<ObjectId> {
        &self.outstanding
    }
}

/// The jobs currently in progress.
#[derive(Debug, Default)]
pub struct JobBoard {
    jobs: Vec<Job>,
    next_id: u32,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Spawns a package at each delivery's spawner and starts tracking the job.
    ///
    /// Every referenced object is checked before anything is spawned.
    pub fn post<R>(
        &mut self,
        manifest: JobManifest,
        completion: JobCompletion,
        world: &mut World,
        rng: &mut R,
    ) -> Result<JobId, EconomyError>
    where
        R: Rng + ?Sized,
    {
        let mut origins = Vec::with_capacity(manifest.deliveries.len());
        for delivery in &manifest.deliveries {
            let spawner = world
                .get(delivery.spawner_id)
                .filter(|object| object.object_type() == ObjectType::PackageSpawn)
                .ok_or(EconomyError::MissingSpawner(delivery.spawner_id))?;
            let zone = world.get(delivery.destination_id);
            ensure!(
                zone.is_some_and(|zone| zone.object_type() == ObjectType::DeliveryZone),
                EconomyError::MissingDestination(delivery.destination_id)
            );

            origins.push((spawner.body.position, delivery.destination_id));
        }

        let id = JobId(self.next_id);
        self.next_id += 1;

        let mut outstanding = BTreeSet::new();
        for (position, zone) in origins {
            let package = world.spawn(
                position,
                Shape::Circle {
                    radius: package::RADIUS,
                },
                ObjectKind::Package(Package::new(zone, Some(id), rng)),
            );
            outstanding.insert(package);
        }

        log::debug!(
            "job {id} posted: {} deliveries worth {}, {:?}",
            outstanding.len(),
            manifest.score,
            manifest.description
        );

        self.jobs.push(Job {
            id,
            manifest,
            completion,
            outstanding,
        });

        Ok(id)
    }

    /// Marks a package delivered. Returns the job, now off the board, when
    /// that was its last package.
    pub fn package_delivered(&mut self, job: JobId, package: ObjectId) -> Option<Job> {
        let index = self.jobs.iter().position(|other| other.id == job)?;
        let entry = &mut self.jobs[index];
        entry.outstanding.remove(&package);

        entry.outstanding.is_empty().then(|| self.jobs.remove(index))
    }
}
