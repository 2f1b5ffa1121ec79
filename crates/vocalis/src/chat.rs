// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vocalis chat` and `vocalis speak`.
//!
//! A chat turn runs: recent history + memory retrieval, streamed model
//! reply, sentence-by-sentence speech into a [`FileSink`], then recording
//! of the user turn (with fragment extraction) and the spoken reply.

use std::path::PathBuf;

use colored::Colorize;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vocalis_config::VocalisConfig;
use vocalis_core::{
    ConversationTurn, ScoredFragment, Speaker, TenantScope, TurnStore, VocalisError,
};
use vocalis_memory::{format_memory_context, RecordOutcome, RetrievalQuery};
use vocalis_openai::OpenAiChat;
use vocalis_speech::{PlaybackSink, PlaybackSummary, SpeechPipeline};

use crate::services::{speech_pipeline, MemoryServices};
use crate::shutdown::install_signal_handler;
use crate::sink::FileSink;

/// Arguments shared by the speaking subcommands.
#[derive(Debug, Clone)]
pub struct SpeakOptions {
    pub out_dir: PathBuf,
    pub voice: Option<String>,
    pub quiet: bool,
}

/// History and grounding gathered before the model is called.
#[derive(Debug, Default)]
pub struct PreparedTurn {
    pub history: Vec<ConversationTurn>,
    pub memories: Vec<ScoredFragment>,
    pub memory_context: Option<String>,
}

/// Loads recent turns and relevant memories for `message`.
///
/// A history read failure degrades to no history. Retrieval only fails on
/// an isolation violation, which is returned.
pub async fn prepare_turn(
    memory: &MemoryServices,
    scope: &TenantScope,
    message: &str,
) -> Result<PreparedTurn, VocalisError> {
    let history = match memory
        .turns
        .recent_turns(scope, memory.config.context_turns)
        .await
    {
        Ok(turns) => turns,
        Err(e) => {
            warn!(error = %e, avatar_id = %scope.avatar_id, user_id = %scope.user_id, "history unavailable, continuing without it");
            Vec::new()
        }
    };

    let query = RetrievalQuery::from_config(message, scope.clone(), &memory.config);
    let memories = memory.retriever.retrieve(&query).await?;
    let memory_context = format_memory_context(&memories);

    Ok(PreparedTurn {
        history,
        memories,
        memory_context,
    })
}

/// Speaks a streamed reply into `sink` and returns what was played.
pub async fn speak_reply<S, K>(
    pipeline: &SpeechPipeline,
    reply: S,
    sink: &mut K,
    cancel: CancellationToken,
) -> Result<PlaybackSummary, VocalisError>
where
    S: Stream<Item = Result<String, VocalisError>> + Send + Unpin + 'static,
    K: PlaybackSink,
{
    pipeline.start(reply, cancel).drain_to(sink).await
}

/// Records the user's message, then the avatar's reply if anything was said.
pub async fn record_exchange(
    memory: &MemoryServices,
    scope: &TenantScope,
    message: &str,
    reply_text: &str,
    history: &[ConversationTurn],
) -> Result<RecordOutcome, VocalisError> {
    let user_turn = ConversationTurn::new(Speaker::User, message, scope.clone());
    let outcome = memory.recorder.record_turn(&user_turn, history).await?;

    if !reply_text.trim().is_empty() {
        let reply_turn = ConversationTurn::new(Speaker::Avatar, reply_text, scope.clone());
        memory.turns.save_turn(&reply_turn).await?;
    }
    Ok(outcome)
}

pub async fn run_chat(
    config: &VocalisConfig,
    scope: TenantScope,
    message: String,
    options: SpeakOptions,
) -> Result<(), VocalisError> {
    let cancel = install_signal_handler();

    let memory = MemoryServices::open(config).await?;
    let pipeline = speech_pipeline(config, options.voice.as_deref())?;
    let chat = OpenAiChat::new(config)?;

    let prepared = prepare_turn(&memory, &scope, &message).await?;
    info!(
        avatar_id = %scope.avatar_id,
        user_id = %scope.user_id,
        history = prepared.history.len(),
        memories = prepared.memories.len(),
        "turn prepared"
    );

    let messages = chat.build_messages(
        prepared.memory_context.as_deref(),
        &prepared.history,
        &message,
    );
    let reply = chat.stream_reply(messages).await?;

    let mut sink = FileSink::create(&options.out_dir, !options.quiet).await?;
    let summary = speak_reply(&pipeline, reply, &mut sink, cancel.clone()).await?;

    let outcome = record_exchange(
        &memory,
        &scope,
        &message,
        &sink.transcript(),
        &prepared.history,
    )
    .await?;

    print_summary(&summary, &sink);
    if outcome.stored > 0 && !options.quiet {
        println!("{}", format!("remembered {} new fragment(s)", outcome.stored).dimmed());
    }

    cancel.cancel();
    memory.shutdown().await
}

pub async fn run_speak(
    config: &VocalisConfig,
    text: String,
    options: SpeakOptions,
) -> Result<(), VocalisError> {
    let cancel = install_signal_handler();
    let pipeline = speech_pipeline(config, options.voice.as_deref())?;
    let mut sink = FileSink::create(&options.out_dir, !options.quiet).await?;

    let reply = futures::stream::iter(vec![Ok::<_, VocalisError>(text)]);
    let summary = speak_reply(&pipeline, reply, &mut sink, cancel.clone()).await?;

    print_summary(&summary, &sink);
    cancel.cancel();
    Ok(())
}

fn print_summary(summary: &PlaybackSummary, sink: &FileSink) {
    let status = if summary.cancelled {
        "cancelled".yellow()
    } else {
        "done".green()
    };
    eprintln!(
        "{status}: {} sentence(s) spoken, {} skipped, audio in {}",
        summary.played,
        summary.skipped,
        sink.dir().display()
    );
}
