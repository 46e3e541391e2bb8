//! The per-turn orchestrator.
//!
//! One captured utterance flows through identification, session routing,
//! fast command dispatch, full transcription, follow-up rescue, and
//! finally the quote dialogue. Every reply is spoken with the active
//! identity's voice preferences. A provider failure anywhere degrades the
//! turn; it never crashes the loop.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use verbatim_core::config::VerbatimConfig;
use verbatim_core::providers::{AsrProvider, CaptureSource, TtsProvider};
use verbatim_core::types::{Utterance, VoicePrefs};
use verbatim_intent::presets::{clamp_rate, clamp_volume};
use verbatim_intent::{classify, normalize, to_command, Command, IntentMapper};
use verbatim_speaker::{RouterState, SpeakerRouter, ENROLL_PROMPTS};
use verbatim_store::{PrefsStore, SpeakerStore};

use crate::manager::DialogueManager;

/// External capabilities the turn loop drives.
pub struct TurnProviders {
    pub asr: Arc<dyn AsrProvider>,
    pub tts: Arc<dyn TtsProvider>,
    pub capture: Arc<dyn CaptureSource>,
    /// Probabilistic intent fallback; absent when disabled.
    pub mapper: Option<IntentMapper>,
}

/// What one turn produced, after the reply has been spoken.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Session the turn was attributed to.
    pub session: String,
    /// Final transcript the reply was based on.
    pub transcript: String,
    pub reply: String,
}

/// The assistant: owns the routing state and wires every component of a
/// turn together.
pub struct Assistant {
    router: SpeakerRouter,
    state: RouterState,
    dialogue: DialogueManager,
    providers: TurnProviders,
    speaker_store: SpeakerStore,
    prefs_store: PrefsStore,
    /// ASR language hint; `None` means auto-detect.
    language: Option<String>,
    default_prefs: VoicePrefs,
}

impl Assistant {
    pub fn new(
        config: &VerbatimConfig,
        router: SpeakerRouter,
        dialogue: DialogueManager,
        providers: TurnProviders,
        speaker_store: SpeakerStore,
        prefs_store: PrefsStore,
    ) -> Self {
        let language = match config.asr.language.as_str() {
            "" | "auto" => None,
            lang => Some(lang.to_string()),
        };
        let default_prefs = VoicePrefs {
            voice: config.tts.voice.clone(),
            rate: config.tts.rate,
            volume: config.tts.volume,
        };
        Self {
            router,
            state: RouterState::new(),
            dialogue,
            providers,
            speaker_store,
            prefs_store,
            language,
            default_prefs,
        }
    }

    pub fn active_session(&self) -> &str {
        &self.state.active_session
    }

    pub fn pending_enroll(&self) -> bool {
        self.state.pending_enroll
    }

    /// Run one full turn: identify, route, dispatch, answer, speak.
    pub fn handle_turn(&mut self, utterance: Utterance) -> TurnOutcome {
        let now = Instant::now();
        let recognized = self.router.resolve_identity(&mut self.state, &utterance, now);

        // Fast transcript for command detection; session switching is
        // decided before any intent is handled.
        let fast_text = self.transcribe(&utterance, true);
        if let Some(rec) = &recognized {
            self.router
                .maybe_switch(&mut self.state, rec, utterance.duration_secs, &fast_text);
        }

        if !fast_text.is_empty() {
            if let Some(reply) = self.dispatch_command(&fast_text) {
                debug!(transcript = %fast_text, "Turn handled as fast command");
                return self.finish(fast_text, reply);
            }
        }

        let text = self.transcribe(&utterance, false);
        if text.is_empty() {
            return self.finish(text, "I didn't catch that. Please try again.".to_string());
        }

        // Follow-up rescue: an unidentified follow-up question sticks to
        // the last recognized speaker, and the switch rules run again so
        // the session follows.
        if recognized.is_none() {
            if let Some(rec) = self.router.followup_rescue(&self.state, &text, now) {
                self.router
                    .maybe_switch(&mut self.state, &rec, utterance.duration_secs, &text);
            }
        }

        if let Some(reply) = self.dispatch_command(&text) {
            return self.finish(text, reply);
        }

        let session = self.state.active_session.clone();
        let reply = self.dialogue.handle_turn(&session, &text);
        self.finish(text, reply)
    }

    fn finish(&mut self, transcript: String, reply: String) -> TurnOutcome {
        self.speak(&reply);
        TurnOutcome {
            session: self.state.active_session.clone(),
            transcript,
            reply,
        }
    }

    /// Transcribe the utterance's clip; text-only turns pass through.
    /// An ASR failure degrades to the text already on the utterance.
    fn transcribe(&self, utterance: &Utterance, fast: bool) -> String {
        let Some(clip) = utterance.clip.as_ref() else {
            return utterance.text.trim().to_string();
        };
        let language = self.language.as_deref();
        let result = if fast {
            self.providers.asr.transcribe_fast(clip, language)
        } else {
            self.providers.asr.transcribe(clip, language)
        };
        match result {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(fast, error = %e, "Transcription failed");
                utterance.text.trim().to_string()
            }
        }
    }

    /// Resolve a system command from the transcript and execute it.
    /// Returns the spoken reply, or `None` when the utterance is a query
    /// for the dialogue layer.
    fn dispatch_command(&mut self, text: &str) -> Option<String> {
        let command = classify(text, self.state.pending_enroll).or_else(|| {
            let mapper = self.providers.mapper.as_ref()?;
            if !mapper.should_consult(&normalize(text)) {
                return None;
            }
            to_command(&mapper.map(text))
        })?;
        Some(self.execute(command))
    }

    fn execute(&mut self, command: Command) -> String {
        let uid = self.state.active_session.clone();
        match command {
            Command::Smalltalk => "Hello.".to_string(),
            Command::Reset => {
                self.dialogue.clear(&uid);
                "Context cleared. Ask me a new quote.".to_string()
            }
            Command::OutOfScope => {
                "I can help with quotes. Say: 'find me the quote ...' or 'finish the quote ...'"
                    .to_string()
            }
            Command::ProvideName(Some(name)) => {
                self.state.pending_enroll = false;
                self.run_enrollment(&name)
            }
            Command::ProvideName(None) => {
                self.state.pending_enroll = true;
                "I'm waiting for your name. Please say: 'My name is ...'".to_string()
            }
            Command::Logout => {
                self.dialogue.clear(&uid);
                self.state.logout();
                info!(from = %uid, "Logged out");
                "Logged out. I'll use the default voice until you register again.".to_string()
            }
            Command::ListVoices => match self.providers.tts.list_voices() {
                Ok(voices) => {
                    let sample = voices
                        .iter()
                        .take(5)
                        .map(|(_, name)| name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    let sample = if sample.is_empty() { "none".to_string() } else { sample };
                    format!(
                        "I found {} system voices. For example: {}.",
                        voices.len(),
                        sample
                    )
                }
                Err(e) => {
                    warn!(error = %e, "Listing voices failed");
                    "I couldn't list the voices.".to_string()
                }
            },
            Command::TestVoice => {
                "This is your current voice setting. One, two, three.".to_string()
            }
            Command::SetVoice(asked) => match self.providers.tts.resolve_voice(&asked) {
                Ok(Some((id, name))) => match self.update_prefs(Some(&id), None, None) {
                    Some(_) => format!("Okay. I will use {name} for {uid}."),
                    None => "I couldn't save that.".to_string(),
                },
                Ok(None) => format!(
                    "I couldn't find a voice matching {asked}. Say 'list voices' to hear options."
                ),
                Err(e) => {
                    warn!(error = %e, "Voice resolution failed");
                    "I couldn't look up the voices.".to_string()
                }
            },
            Command::SetRate { rate, label } => match self.update_prefs(None, Some(rate), None) {
                Some(prefs) => match label {
                    Some(label) => format!("Okay. Rate set to {label} for {uid}."),
                    None => format!("Speaking rate set to {} for {uid}.", prefs.rate),
                },
                None => "I couldn't save that.".to_string(),
            },
            Command::AdjustRate(delta) => {
                let current = self.prefs_for(&uid).rate;
                let rate = clamp_rate(current as i64 + delta as i64);
                match self.update_prefs(None, Some(rate), None) {
                    Some(prefs) => format!("Done. New rate is {} for {uid}.", prefs.rate),
                    None => "I couldn't save that.".to_string(),
                }
            }
            Command::SetVolume { volume, label } => {
                match self.update_prefs(None, None, Some(volume)) {
                    Some(prefs) => match label {
                        Some(label) => format!("Okay. Volume set to {label} for {uid}."),
                        None => format!("Volume set to {:.2} for {uid}.", prefs.volume),
                    },
                    None => "I couldn't save that.".to_string(),
                }
            }
            Command::AdjustVolume(delta) => {
                let current = self.prefs_for(&uid).volume;
                let volume = clamp_volume(current + delta);
                match self.update_prefs(None, None, Some(volume)) {
                    Some(prefs) => format!("Done. New volume is {:.2} for {uid}.", prefs.volume),
                    None => "I couldn't save that.".to_string(),
                }
            }
            Command::RegisterAs(name) => self.run_enrollment(&name),
            Command::Register => {
                if !self.router.enabled() {
                    return "Speaker identification is disabled.".to_string();
                }
                // A recently recognized speaker re-enrolls directly.
                let window = self.router.config().recent_recognition_secs;
                if let Some(target) = self.state.recognized_within(window, Instant::now()) {
                    self.speak(&format!("I'll add more samples to {target}."));
                    return self.run_enrollment(&target);
                }
                self.state.pending_enroll = true;
                "Okay. Please say: 'My name is ...' with your full name.".to_string()
            }
            Command::NewQuote => {
                self.dialogue.clear(&uid);
                "Okay, fresh start. What's the new quote?".to_string()
            }
        }
    }

    /// Read the enrollment script, capture a sample per line, and enroll.
    /// On success the enrollee becomes the active session.
    fn run_enrollment(&mut self, name: &str) -> String {
        if !self.router.enabled() {
            return "Speaker identification is disabled.".to_string();
        }
        let preamble = if self.router.is_registered(name) {
            format!("{name} is already registered. I'll add more samples to your profile.")
        } else {
            format!("Creating a new profile for {name}.")
        };
        self.speak(&preamble);
        self.speak(&format!(
            "Okay {name}. We will read five short lines to register your voice."
        ));

        let mut samples = Vec::new();
        for (idx, line) in ENROLL_PROMPTS.iter().enumerate() {
            self.speak(&format!(
                "Line {}. After the beep, please read this line.",
                idx + 1
            ));
            self.speak(line);
            match self.providers.capture.record() {
                Ok(clip) => samples.push(clip),
                Err(e) => {
                    warn!(sample = idx + 1, error = %e, "Enrollment capture failed");
                    self.speak("Sorry, that sample failed. Let's move to the next line.");
                }
            }
        }

        match self.router.enroll(&self.speaker_store, name, &samples) {
            Ok(count) => {
                self.state.active_session = name.to_string();
                self.state.note_recognition(name, Instant::now());
                info!(name, count, "Enrollment complete");
                format!(
                    "All set. I have registered you as {name}. You can continue with your conversation."
                )
            }
            Err(e) => {
                warn!(name, error = %e, "Enrollment failed");
                "Sorry, I couldn't register your voice this time.".to_string()
            }
        }
    }

    fn prefs_for(&self, name: &str) -> VoicePrefs {
        match self.prefs_store.lookup(name) {
            Ok(Some(prefs)) => prefs,
            Ok(None) => self.default_prefs.clone(),
            Err(e) => {
                warn!(error = %e, "Preference lookup failed; using defaults");
                self.default_prefs.clone()
            }
        }
    }

    fn update_prefs(
        &self,
        voice: Option<&str>,
        rate: Option<u32>,
        volume: Option<f32>,
    ) -> Option<VoicePrefs> {
        let uid = &self.state.active_session;
        match self.prefs_store.update(uid, voice, rate, volume) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                warn!(error = %e, "Saving preferences failed");
                None
            }
        }
    }

    fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let prefs = self.prefs_for(&self.state.active_session);
        if let Err(e) = self.providers.tts.speak(text, &prefs) {
            warn!(error = %e, "TTS failed");
        }
    }
}
