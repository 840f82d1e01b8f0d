//! Score, clock and jobs for a play session.

pub mod generator;
pub mod job;
pub mod tutorial;

pub use generator::JobGenerator;
pub use job::{DeliveryManifest, Job, JobBoard, JobCompletion, JobId, JobManifest};
pub use tutorial::{TutorialAction, TutorialEvent, TutorialRunner, TutorialScript};

use rand::Rng;
use thiserror::Error;

use crate::config::EconomyConfig;
use crate::objects::{GameObject, ObjectId, ObjectType};
use crate::services::{AudioService, Cue, MessageSink};
use crate::world::World;

pub const JOB_COMPLETE_MESSAGE: &str = "Job complete!";

/// Offset into the endless mode music, in seconds
const TRUCKIN_START: f64 = 2.097;
const INTRO_START: f64 = 13.640;
const INTRO_LOOP_START: f64 = 25.633;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("no package spawns to create a job from")]
    NoPackageSpawns,
    #[error("no delivery zones to deliver to")]
    NoDeliveryZones,
    #[error("object {0} is not a package spawn")]
    MissingSpawner(ObjectId),
    #[error("object {0} is not a delivery zone")]
    MissingDestination(ObjectId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    /// The clock ran out
    Over,
    /// The scenario ran out of event groups
    TutorialFinished,
}

#[derive(Debug)]
pub enum Mode {
    Dynamic(JobGenerator),
    Static(TutorialRunner),
}

#[derive(Debug)]
pub struct Economy {
    held_packages: u32,
    score: f64,
    /// Milliseconds left in the session
    time_remaining: f64,
    jobs: JobBoard,
    mode: Mode,
}

impl Economy {
    /// Endless mode: random jobs against the clock.
    pub fn dynamic(config: &EconomyConfig) -> Self {
        Self {
            held_packages: 0,
            score: 0.0,
            time_remaining: config.time_remaining,
            jobs: JobBoard::new(),
            mode: Mode::Dynamic(JobGenerator::new(config)),
        }
    }

    /// Scripted mode with no clock. The first event group starts after `delay` ms.
    pub fn tutorial(script: TutorialScript, delay: f64, debug: bool) -> Self {
        Self {
            held_packages: 0,
            score: 0.0,
            time_remaining: f64::INFINITY,
            jobs: JobBoard::new(),
            mode: Mode::Static(TutorialRunner::new(script, delay, debug)),
        }
    }

    pub fn start(&mut self, audio: &mut dyn AudioService) {
        if let Mode::Dynamic(_) = self.mode {
            audio.play_music(Cue::Truckin.as_ref(), TRUCKIN_START, None);
        }
    }

    pub fn tick<R>(
        &mut self,
        dt: f64,
        world: &mut World,
        hud: &mut dyn MessageSink,
        audio: &mut dyn AudioService,
        rng: &mut R,
    ) -> Result<GameStatus, EconomyError>
    where
        R: Rng + ?Sized,
    {
        match &mut self.mode {
            Mode::Dynamic(generator) => {
                generator.tick(dt, &mut self.jobs, world, rng)?;

                self.time_remaining -= dt;
                if self.time_remaining <= 0.0 {
                    return Ok(GameStatus::Over);
                }
            }
            Mode::Static(runner) => {
                for action in runner.tick(dt) {
                    match action {
                        TutorialAction::ShowMessage(text) => hud.set_message(&text),
                        TutorialAction::CreateJob { manifest, on_complete } => {
                            self.jobs
                                .post(manifest, JobCompletion::RunTutorial(on_complete), world, rng)?;
                        }
                        TutorialAction::PlayMusic => {
                            audio.play_music(Cue::Intro.as_ref(), INTRO_START, Some(INTRO_LOOP_START))
                        }
                    }
                }

                if runner.is_finished() {
                    return Ok(GameStatus::TutorialFinished);
                }
            }
        }

        Ok(GameStatus::Running)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn jobs(&self) -> &JobBoard {
        &self.jobs
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    /// Packages currently trailing behind cars.
    pub fn held_packages(&self) -> u32 {
        self.held_packages
    }

    pub fn increment_packages(&mut self) {
        self.held_packages += 1;
    }

    /// The car sank and took its packages with it.
    pub fn fall_in_water(&mut self) {
        self.held_packages = 0;
    }

    /// Takes a package out of the world and credits its job.
    pub fn deliver_package(&mut self, id: ObjectId, world: &mut World, hud: &mut dyn MessageSink) {
        let Some(package) = world.get(id).and_then(GameObject::as_package) else {
            log::error!("tried to deliver object {id}, which is not a package");
            return;
        };
        let job = package.job;

        hud.set_message(&format!("You delivered package number {id}!"));
        world.remove(id);
        self.held_packages = self.held_packages.saturating_sub(1);

        if let Some(done) = job.and_then(|job| self.jobs.package_delivered(job, id)) {
            self.complete_job(done);
        }

        if world.objects_of_type(ObjectType::Package).next().is_none() {
            hud.set_message(JOB_COMPLETE_MESSAGE);
        }
    }

    fn complete_job(&mut self, job: Job) {
        log::info!("job {} complete, worth {}", job.id, job.manifest.score);
        self.score += job.manifest.score;

        match (&mut self.mode, &job.completion) {
            (Mode::Dynamic(_), _) => self.time_remaining += job.manifest.time_add,
            (Mode::Static(runner), JobCompletion::RunTutorial(group)) => runner.run_group(group),
            (Mode::Static(_), JobCompletion::Remove) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AudioCommand, WELCOME_MESSAGE};
    use crate::test_support::{grid_document, object, Harness};
    use crate::world::document::ObjectDocument;

    fn depot() -> Vec<ObjectDocument> {
        vec![
            object(1, "PackageSpawn", 0.5, 0.5),
            object(2, "DeliveryZone", 3.0, 3.0).sized(1.0, 1.0),
        ]
    }

    fn harness(economy: Economy) -> Harness {
        let mut harness = Harness::new(grid_document(&["rrrr"; 4], 2), &depot());
        harness.economy = economy;
        harness
    }

    fn tick(harness: &mut Harness, dt: f64) -> Result<GameStatus, EconomyError> {
        harness.economy.tick(
            dt,
            &mut harness.world,
            &mut harness.messages,
            &mut harness.audio,
            &mut harness.rng,
        )
    }

    fn packages(harness: &Harness) -> Vec<ObjectId> {
        harness.world.objects_of_type(ObjectType::Package).map(GameObject::id).collect()
    }

    #[test]
    fn test_job_completion_adds_score_and_time() {
        let config = EconomyConfig {
            min_deliveries_per_job: 2,
            max_deliveries_per_job: 3,
            ..EconomyConfig::default()
        };
        let mut harness = harness(Economy::dynamic(&config));

        assert_eq!(tick(&mut harness, 16.0).unwrap(), GameStatus::Running);
        assert_eq!(harness.economy.jobs().len(), 1);
        let worth = harness.economy.jobs().iter().next().unwrap().manifest.score;
        // two packages, each 2.5 tiles across and down from the zone
        assert_eq!(worth, 25.0);

        let packages = packages(&harness);
        assert_eq!(packages.len(), 2);
        harness.economy.increment_packages();
        harness.economy.increment_packages();
        let time_before = harness.economy.time_remaining();

        harness
            .economy
            .deliver_package(packages[0], &mut harness.world, &mut harness.messages);
        assert_eq!(
            harness.messages.message(),
            format!("You delivered package number {}!", packages[0])
        );
        assert_eq!(harness.economy.held_packages(), 1);
        assert_eq!(harness.economy.score(), 0.0);
        assert!(!harness.world.contains(packages[0]));

        harness
            .economy
            .deliver_package(packages[1], &mut harness.world, &mut harness.messages);
        assert_eq!(harness.messages.message(), JOB_COMPLETE_MESSAGE);
        assert_eq!(harness.economy.held_packages(), 0);
        assert_eq!(harness.economy.score(), 25.0);
        assert_eq!(harness.economy.time_remaining(), time_before + 30_000.0);
        assert!(harness.economy.jobs().is_empty());
    }

    #[test]
    fn test_job_complete_waits_for_every_package() {
        let mut harness = harness(Economy::dynamic(&EconomyConfig::default()));
        let first = harness.spawn_package(1.0, 1.0, ObjectId(2));
        harness.spawn_package(2.0, 1.0, ObjectId(2));

        harness.economy.deliver_package(first, &mut harness.world, &mut harness.messages);
        assert_eq!(
            harness.messages.message(),
            format!("You delivered package number {first}!")
        );
    }

    #[test]
    fn test_delivering_a_non_package_is_ignored() {
        let mut harness = harness(Economy::dynamic(&EconomyConfig::default()));
        harness.economy.increment_packages();

        harness
            .economy
            .deliver_package(ObjectId(2), &mut harness.world, &mut harness.messages);
        harness
            .economy
            .deliver_package(ObjectId(99), &mut harness.world, &mut harness.messages);

        assert!(harness.world.contains(ObjectId(2)));
        assert_eq!(harness.messages.message(), WELCOME_MESSAGE);
        assert_eq!(harness.economy.held_packages(), 1);
    }

    #[test]
    fn test_fall_in_water_drops_everything() {
        let mut economy = Economy::dynamic(&EconomyConfig::default());
        for _ in 0..3 {
            economy.increment_packages();
        }
        economy.fall_in_water();
        assert_eq!(economy.held_packages(), 0);
    }

    #[test]
    fn test_clock_ends_session() {
        let config = EconomyConfig {
            time_remaining: 100.0,
            ..EconomyConfig::default()
        };
        let mut harness = harness(Economy::dynamic(&config));

        assert_eq!(tick(&mut harness, 60.0).unwrap(), GameStatus::Running);
        assert_eq!(tick(&mut harness, 40.0).unwrap(), GameStatus::Over);
    }

    #[test]
    fn test_dynamic_start_plays_music() {
        let mut harness = harness(Economy::dynamic(&EconomyConfig::default()));
        harness.economy.start(&mut harness.audio);

        assert_eq!(
            harness.audio.commands(),
            &[AudioCommand::PlayMusic {
                name: "truckin".into(),
                start_offset: 2.097,
                loop_start: None
            }]
        );
    }

    #[test]
    fn test_tutorial_runs_until_out_of_groups() {
        let script: TutorialScript = serde_json::from_value(serde_json::json!({
            "init": [
                { "type": "sendMessage", "delay": 0, "messageText": "Hello there." },
                {
                    "type": "createJob", "delay": 500, "messageText": "Fetch!",
                    "jobManifest": {
                        "deliveries": [{ "spawnerId": 1, "destinationId": 2 }],
                        "description": "tutorial", "timeAdd": 0, "score": 4
                    },
                    "onComplete": "done"
                }
            ]
        }))
        .unwrap();
        let mut harness = harness(Economy::tutorial(script, 0.0, false));
        harness.economy.start(&mut harness.audio);
        assert!(harness.audio.commands().is_empty());

        assert_eq!(tick(&mut harness, 16.0).unwrap(), GameStatus::Running);
        assert_eq!(harness.messages.message(), "Hello there.");
        assert!(packages(&harness).is_empty());

        assert_eq!(tick(&mut harness, 500.0).unwrap(), GameStatus::Running);
        assert_eq!(harness.messages.message(), "Fetch!");
        let packages = packages(&harness);
        assert_eq!(packages.len(), 1);

        assert_eq!(tick(&mut harness, 500.0).unwrap(), GameStatus::Running);
        assert!(matches!(
            harness.audio.commands(),
            [AudioCommand::PlayMusic { name, loop_start: Some(_), .. }] if name == "intro"
        ));
        assert_eq!(harness.economy.time_remaining(), f64::INFINITY);

        harness.economy.increment_packages();
        harness
            .economy
            .deliver_package(packages[0], &mut harness.world, &mut harness.messages);
        assert_eq!(harness.economy.score(), 4.0);
        assert_eq!(harness.economy.time_remaining(), f64::INFINITY);

        assert_eq!(tick(&mut harness, 16.0).unwrap(), GameStatus::TutorialFinished);
    }

    #[test]
    fn test_tutorial_job_with_bad_spawner_is_fatal() {
        let script: TutorialScript = serde_json::from_value(serde_json::json!({
            "init": [{
                "type": "createJob", "delay": 0, "messageText": "Fetch!",
                "jobManifest": { "deliveries": [{ "spawnerId": 2, "destinationId": 2 }] },
                "onComplete": "done"
            }]
        }))
        .unwrap();
        let mut harness = harness(Economy::tutorial(script, 0.0, false));

        assert!(matches!(
            tick(&mut harness, 16.0),
            Err(EconomyError::MissingSpawner(ObjectId(2)))
        ));
    }
}
