//! Scripted scenario for the static game mode.
//!
//! A script is a set of named event groups. Starting a group fires its events
//! one after the other, each after its own delay. Jobs created by an event
//! start another group once they are completed, and naming a group that
//! doesn't exist ends the scenario.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::job::JobManifest;

/// Group started when the scenario begins.
pub const FIRST_GROUP: &str = "init";
/// Delay before the scenario music starts, in milliseconds
pub const MUSIC_DELAY: f64 = 1000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TutorialEvent {
    #[serde(rename_all = "camelCase")]
    SendMessage { delay: f64, message_text: String },
    #[serde(rename_all = "camelCase")]
    CreateJob {
        delay: f64,
        message_text: String,
        job_manifest: JobManifest,
        on_complete: String,
    },
}

impl TutorialEvent {
    pub fn delay(&self) -> f64 {
        match self {
            TutorialEvent::SendMessage { delay, .. } | TutorialEvent::CreateJob { delay, .. } => *delay,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorialScript {
    groups: HashMap<String, Vec<TutorialEvent>>,
}

impl TutorialScript {
    pub fn group(&self, name: &str) -> Option<&[TutorialEvent]> {
        self.groups.get(name).map(Vec::as_slice)
    }
}

/// Something the economy has to act on, produced by [`TutorialRunner::tick`].
#[derive(Clone, Debug, PartialEq)]
pub enum TutorialAction {
    ShowMessage(String),
    CreateJob { manifest: JobManifest, on_complete: String },
    PlayMusic,
}

/// Events of one started group still to fire.
#[derive(Clone, Debug, PartialEq)]
struct Chain {
    queue: VecDeque<TutorialEvent>,
    /// Time left until the front event of `queue` fires
    countdown: f64,
}

#[derive(Clone, Debug)]
pub struct TutorialRunner {
    script: TutorialScript,
    /// Time left until the first group starts
    start: Option<f64>,
    /// Started groups, oldest first. They run side by side.
    chains: Vec<Chain>,
    finished: bool,
    music_countdown: Option<f64>,
    /// Delays are divided by this
    speedup: f64,
}

impl TutorialRunner {
    /// Starts the first group after `delay` milliseconds. Debug mode runs the
    /// script a hundred times faster.
    pub fn new(script: TutorialScript, delay: f64, debug: bool) -> Self {
        Self {
            script,
            start: Some(delay),
            chains: Vec::new(),
            finished: false,
            music_countdown: Some(MUSIC_DELAY),
            speedup: if debug { 100.0 } else { 1.0 },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Starts the named group now, alongside any group that is still firing.
    pub fn run_group(&mut self, name: &str) {
        self.start_group(name, 0.0);
    }

    fn start_group(&mut self, name: &str, overshoot: f64) {
        let Some(events) = self.script.group(name) else {
            log::info!("no tutorial group {name:?}, the tutorial is over");
            self.finished = true;
            return;
        };

        log::debug!("running tutorial group {name:?}");
        let queue: VecDeque<_> = events.iter().cloned().collect();
        if let Some(first) = queue.front() {
            self.chains.push(Chain {
                countdown: overshoot + first.delay() / self.speedup,
                queue,
            });
        }
    }

    pub fn tick(&mut self, dt: f64) -> Vec<TutorialAction> {
        let mut actions = Vec::new();

        if let Some(countdown) = &mut self.music_countdown {
            *countdown -= dt;
            if *countdown <= 0.0 {
                actions.push(TutorialAction::PlayMusic);
                self.music_countdown = None;
            }
        }

        for chain in &mut self.chains {
            chain.countdown -= dt;
        }

        if let Some(countdown) = &mut self.start {
            *countdown -= dt;
            if *countdown <= 0.0 {
                let overshoot = *countdown;
                self.start = None;
                self.start_group(FIRST_GROUP, overshoot);
            }
        }

        for chain in &mut self.chains {
            while chain.countdown <= 0.0 {
                let Some(event) = chain.queue.pop_front() else {
                    break;
                };
                if let Some(next) = chain.queue.front() {
                    chain.countdown += next.delay() / self.speedup;
                }
                fire(event, &mut actions);
            }
        }
        self.chains.retain(|chain| !chain.queue.is_empty());

        actions
    }
}

fn fire(event: TutorialEvent, actions: &mut Vec<TutorialAction>) {
    match event {
        TutorialEvent::SendMessage { message_text, .. } => {
            actions.push(TutorialAction::ShowMessage(message_text));
        }
        TutorialEvent::CreateJob {
            message_text,
            job_manifest,
            on_complete,
            ..
        } => {
            actions.push(TutorialAction::ShowMessage(message_text));
            actions.push(TutorialAction::CreateJob {
                manifest: job_manifest,
                on_complete,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> TutorialScript {
        serde_json::from_str(
            r#"{
                "init": [
                    { "type": "sendMessage", "delay": 100, "messageText": "Welcome!" },
                    { "type": "sendMessage", "delay": 50, "messageText": "Drive around." },
                    { "type": "createJob", "delay": 200, "messageText": "Pick this up.",
                      "jobManifest": {
                          "deliveries": [{ "spawnerId": 3, "destinationId": 4 }],
                          "description": "first job", "timeAdd": 0, "score": 1
                      },
                      "onComplete": "second" }
                ],
                "second": [
                    { "type": "sendMessage", "delay": 0, "messageText": "Nice!" },
                    { "type": "createJob", "delay": 0, "messageText": "One more.",
                      "jobManifest": { "deliveries": [], "description": "", "timeAdd": 0, "score": 0 },
                      "onComplete": "the end" }
                ]
            }"#,
        )
        .unwrap()
    }

    fn messages(actions: &[TutorialAction]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|action| match action {
                TutorialAction::ShowMessage(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_events_fire_in_sequence() {
        let mut runner = TutorialRunner::new(script(), 500.0, false);

        assert!(runner.tick(499.0).is_empty());
        assert!(runner.tick(1.0).is_empty());
        assert!(runner.tick(99.0).is_empty());
        assert_eq!(messages(&runner.tick(1.0)), ["Welcome!"]);
        assert!(runner.tick(49.0).is_empty());
        assert_eq!(messages(&runner.tick(1.0)), ["Drive around."]);

        let actions = runner.tick(200.0);
        assert_eq!(messages(&actions), ["Pick this up."]);
        assert!(matches!(
            &actions[1],
            TutorialAction::CreateJob { on_complete, manifest } if on_complete == "second" && manifest.description == "first job"
        ));

        // nothing more until the job is done
        assert_eq!(runner.tick(10_000.0), vec![TutorialAction::PlayMusic]);
        assert!(runner.tick(10_000.0).is_empty());
        assert!(!runner.is_finished());
    }

    #[test]
    fn test_music_starts_after_a_second() {
        let mut runner = TutorialRunner::new(script(), 5_000.0, false);
        assert!(runner.tick(999.0).is_empty());
        assert_eq!(runner.tick(1.0), vec![TutorialAction::PlayMusic]);
        assert!(runner.tick(1_000.0).is_empty());
    }

    #[test]
    fn test_zero_delays_fire_together() {
        let mut runner = TutorialRunner::new(script(), 5_000.0, false);
        runner.run_group("second");

        let actions = runner.tick(16.0);
        assert_eq!(messages(&actions), ["Nice!", "One more."]);

        runner.run_group("the end");
        assert!(runner.is_finished());
    }

    #[test]
    fn test_debug_mode_is_faster() {
        // 100 + 50 + 200 ms of delays shrink to 3.5 ms
        let mut runner = TutorialRunner::new(script(), 0.0, true);
        let actions = runner.tick(3.5);
        assert_eq!(messages(&actions), ["Welcome!", "Drive around.", "Pick this up."]);
    }

    #[test]
    fn test_missing_first_group_finishes() {
        let mut runner = TutorialRunner::new(TutorialScript::default(), 10.0, false);
        assert!(!runner.is_finished());
        runner.tick(16.0);
        assert!(runner.is_finished());
    }

    #[test]
    fn test_completed_job_keeps_its_group_running() {
        let script: TutorialScript = serde_json::from_str(
            r#"{
                "init": [
                    { "type": "createJob", "delay": 0, "messageText": "Go!",
                      "jobManifest": { "deliveries": [], "description": "", "timeAdd": 0, "score": 0 },
                      "onComplete": "second" },
                    { "type": "sendMessage", "delay": 1000, "messageText": "after job" }
                ],
                "second": [
                    { "type": "sendMessage", "delay": 0, "messageText": "Nice" },
                    { "type": "sendMessage", "delay": 500, "messageText": "Still here" }
                ]
            }"#,
        )
        .unwrap();
        let mut runner = TutorialRunner::new(script, 0.0, false);

        assert_eq!(messages(&runner.tick(16.0)), ["Go!"]);
        runner.run_group("second");

        assert_eq!(messages(&runner.tick(600.0)), ["Nice", "Still here"]);
        assert_eq!(messages(&runner.tick(400.0)), ["after job"]);
        assert!(!runner.is_finished());

        runner.run_group("missing");
        assert!(runner.is_finished());
    }
}
