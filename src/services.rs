//! Interfaces the simulation uses to talk to the outside world: audio, the
//! message bar, and player input. The front-end supplies the platform side.

use strum::{AsRefStr, EnumIter};

use crate::config::DebugFlags;
use crate::economy::Economy;

/// Every sound the simulation can ask for, registered under its snake_case name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Cue {
    Splash,
    Engine,
    Beep,
    Pickup,
    Brake,
    Congratulations,
    Intro,
    Truckin,
}

impl Cue {
    pub fn path(&self) -> &'static str {
        match self {
            Cue::Splash => "audio/sfx/splash.ogg",
            Cue::Engine => "audio/sfx/engine.ogg",
            Cue::Beep => "audio/sfx/beep.ogg",
            Cue::Pickup => "audio/sfx/pickup.wav",
            Cue::Brake => "audio/sfx/brake.ogg",
            Cue::Congratulations => "audio/sfx/congratulations.ogg",
            Cue::Intro => "audio/music/intro.ogg",
            Cue::Truckin => "audio/music/truckin.ogg",
        }
    }
}

pub trait AudioService {
    /// Starts a sound. It loops whenever `loop_start` is not `-1`; a `loop_end`
    /// of `0` loops to the end of the buffer.
    fn play(&mut self, name: &str, loop_start: f64, loop_end: f64);
    fn stop(&mut self, name: &str);
    fn set_playback_rate(&mut self, name: &str, rate: f64);
    fn play_music(&mut self, name: &str, start_offset: f64, loop_start: Option<f64>);

    fn play_once(&mut self, cue: Cue) {
        self.play(cue.as_ref(), -1.0, 0.0);
    }

    fn play_looped(&mut self, cue: Cue, loop_start: f64) {
        self.play(cue.as_ref(), loop_start, 0.0);
    }

    fn stop_cue(&mut self, cue: Cue) {
        self.stop(cue.as_ref());
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopRegion {
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    Play {
        name: String,
        looping: Option<LoopRegion>,
    },
    Stop(String),
    SetPlaybackRate(String, f64),
    PlayMusic {
        name: String,
        start_offset: f64,
        loop_start: Option<f64>,
    },
}

impl AudioCommand {
    pub fn name(&self) -> &str {
        match self {
            AudioCommand::Play { name, .. } | AudioCommand::PlayMusic { name, .. } => name,
            AudioCommand::Stop(name) | AudioCommand::SetPlaybackRate(name, _) => name,
        }
    }
}

/// Records audio requests made during a tick so the front-end can apply them
/// once the simulation has finished stepping.
#[derive(Debug, Default)]
pub struct AudioQueue {
    commands: Vec<AudioCommand>,
}

impl AudioQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[AudioCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> impl Iterator<Item = AudioCommand> + '_ {
        self.commands.drain(..)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl AudioService for AudioQueue {
    fn play(&mut self, name: &str, loop_start: f64, loop_end: f64) {
        let looping = (loop_start != -1.0).then_some(LoopRegion {
            start: loop_start,
            end: loop_end,
        });

        self.commands.push(AudioCommand::Play {
            name: name.to_owned(),
            looping,
        });
    }

    fn stop(&mut self, name: &str) {
        self.commands.push(AudioCommand::Stop(name.to_owned()));
    }

    fn set_playback_rate(&mut self, name: &str, rate: f64) {
        self.commands.push(AudioCommand::SetPlaybackRate(name.to_owned(), rate));
    }

    fn play_music(&mut self, name: &str, start_offset: f64, loop_start: Option<f64>) {
        self.commands.push(AudioCommand::PlayMusic {
            name: name.to_owned(),
            start_offset,
            loop_start,
        });
    }
}

pub trait MessageSink {
    fn set_message(&mut self, text: &str);
}

pub const WELCOME_MESSAGE: &str = "WASD or Arrow Keys will let you drive around!";

/// The text shown in the HUD message bar.
#[derive(Debug, Clone)]
pub struct MessageBar {
    message: String,
    revision: u64,
}

impl Default for MessageBar {
    fn default() -> Self {
        Self {
            message: WELCOME_MESSAGE.to_owned(),
            revision: 0,
        }
    }
}

impl MessageBar {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Bumped every time the message actually changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl MessageSink for MessageBar {
    fn set_message(&mut self, text: &str) {
        if self.message == text {
            return;
        }

        log::debug!("message: {text}");
        self.message = text.to_owned();
        self.revision += 1;
    }
}

/// The four driving controls, sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub accelerate: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub brake: bool,
}

/// Everything an object may touch while ticking, apart from the world itself.
pub struct SimulationContext<'a> {
    pub economy: &'a mut Economy,
    pub audio: &'a mut dyn AudioService,
    pub hud: &'a mut dyn MessageSink,
    pub input: InputState,
    pub debug: DebugFlags,
}
