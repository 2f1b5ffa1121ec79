// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback sink that writes each sentence's audio to a numbered file and
//! prints captions as playback advances.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colored::Colorize;
use tracing::debug;
use vocalis_core::VocalisError;
use vocalis_speech::{PlaybackEvent, PlaybackSink};

pub struct FileSink {
    dir: PathBuf,
    echo: bool,
    files: Vec<PathBuf>,
    transcript: Vec<String>,
}

impl FileSink {
    /// Creates `dir` if needed.
    pub async fn create(dir: impl Into<PathBuf>, echo: bool) -> Result<Self, VocalisError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            VocalisError::Internal(format!("failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            echo,
            files: Vec::new(),
            transcript: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Audio files written so far, in playback order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Every sentence delivered, spoken or not, joined with spaces.
    pub fn transcript(&self) -> String {
        self.transcript.join(" ")
    }
}

#[async_trait]
impl PlaybackSink for FileSink {
    async fn play(&mut self, event: &PlaybackEvent) -> Result<(), VocalisError> {
        match event {
            PlaybackEvent::Audio {
                sequence,
                text,
                audio,
            } => {
                let path = self.dir.join(format!(
                    "{sequence:03}.{}",
                    extension_for(&audio.content_type)
                ));
                tokio::fs::write(&path, &audio.bytes).await.map_err(|e| {
                    VocalisError::Internal(format!("failed to write {}: {e}", path.display()))
                })?;
                debug!(sequence, path = %path.display(), bytes = audio.bytes.len(), "wrote audio");
                if self.echo {
                    println!("{} {text}", format!("[{sequence}]").dimmed());
                }
                self.files.push(path);
            }
            PlaybackEvent::Skip {
                sequence,
                text,
                reason,
            } => {
                debug!(sequence, reason = %reason, "caption without audio");
                if self.echo {
                    println!(
                        "{} {text} {}",
                        format!("[{sequence}]").dimmed(),
                        "(no audio)".yellow()
                    );
                }
            }
        }
        self.transcript.push(event.text().to_string());
        Ok(())
    }
}

fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/pcm" | "audio/l16" => "pcm",
        "audio/basic" | "audio/ulaw" => "ulaw",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" | "audio/opus" => "ogg",
        _ => "bin",
    }
}
