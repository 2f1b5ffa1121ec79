// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted speech provider for pipeline ordering and concurrency tests.
//!
//! Latency and failures are keyed by substrings of the requested text, so a
//! test can make a later sentence resolve before an earlier one. The audio
//! payload is the sentence text itself.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use vocalis_core::types::{SpeechAudio, SpeechRequest};
use vocalis_core::{
    AdapterType, HealthStatus, PluginAdapter, SpeechAdapter, VocalisError, VoiceConfig,
};

#[derive(Default)]
struct Script {
    delays: Vec<(String, Duration)>,
    failures: Vec<String>,
}

#[derive(Default)]
struct Log {
    requested: Vec<String>,
    completed: Vec<String>,
    voices: Vec<VoiceConfig>,
}

pub struct MockSpeech {
    default_delay: Duration,
    script: Mutex<Script>,
    log: Mutex<Log>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::with_default_delay(Duration::from_millis(10))
    }

    pub fn with_default_delay(default_delay: Duration) -> Self {
        Self {
            default_delay,
            script: Mutex::new(Script::default()),
            log: Mutex::new(Log::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Requests whose text contains `needle` take `delay`.
    pub fn delay_for(self, needle: &str, delay: Duration) -> Self {
        lock(&self.script).delays.push((needle.to_string(), delay));
        self
    }

    /// Requests whose text contains `needle` fail with a provider error.
    pub fn fail_for(self, needle: &str) -> Self {
        lock(&self.script).failures.push(needle.to_string());
        self
    }

    /// Texts in the order synthesis was requested.
    pub fn requested(&self) -> Vec<String> {
        lock(&self.log).requested.clone()
    }

    /// Texts in the order synthesis finished (success or failure).
    pub fn completed(&self) -> Vec<String> {
        lock(&self.log).completed.clone()
    }

    /// Voice configurations received, in request order.
    pub fn voices(&self) -> Vec<VoiceConfig> {
        lock(&self.log).voices.clone()
    }

    /// Highest number of simultaneous calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Calls currently running. Calls abandoned mid-flight are released on drop.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSpeech {
    fn name(&self) -> &str {
        "mock-speech"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SpeechAdapter for MockSpeech {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, VocalisError> {
        let (delay, fails) = {
            let script = lock(&self.script);
            let delay = script
                .delays
                .iter()
                .find(|(needle, _)| request.text.contains(needle.as_str()))
                .map_or(self.default_delay, |(_, d)| *d);
            let fails = script
                .failures
                .iter()
                .any(|needle| request.text.contains(needle.as_str()));
            (delay, fails)
        };
        {
            let mut log = lock(&self.log);
            log.requested.push(request.text.clone());
            log.voices.push(request.voice.clone());
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        tokio::time::sleep(delay).await;
        lock(&self.log).completed.push(request.text.clone());

        if fails {
            return Err(VocalisError::provider(format!(
                "mock speech failure for {:?}",
                request.text
            )));
        }
        Ok(SpeechAudio {
            bytes: Bytes::from(request.text.into_bytes()),
            content_type: "audio/mpeg".to_string(),
            duration_hint: Some(delay),
        })
    }
}
