use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::AudioSettings;

use super::sink::create_sink_at;
use super::source::{CurrentGeneration, fetch_source, probe_duration};
use super::types::{AudioCmd, OutputEvent};

/// Everything the thread knows about the currently bound source.
struct Bound {
    generation: u64,
    bytes: Option<Arc<[u8]>>,
    sink: Option<Sink>,
    /// Playback intent; honored as soon as the sink exists.
    want_playing: bool,
    /// Position the sink started at (after a seek) plus time played while paused in between.
    accumulated: Duration,
    started_at: Option<Instant>,
    ended: bool,
}

impl Bound {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            bytes: None,
            sink: None,
            want_playing: false,
            accumulated: Duration::ZERO,
            started_at: None,
            ended: false,
        }
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn start_clock(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop_clock(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    self_tx: Sender<AudioCmd>,
    events: Sender<OutputEvent>,
    agent: ureq::Agent,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                error!("no audio output device: {e}");
                drain_without_device(rx, events);
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut bound: Option<Bound> = None;
        let current = CurrentGeneration::default();
        let mut volume: f32 = 1.0;
        let tick = Duration::from_millis(audio_settings.position_interval_ms.max(1));

        loop {
            match rx.recv_timeout(tick) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load {
                        locator,
                        generation,
                    } => {
                        if let Some(old) = bound.take() {
                            if let Some(s) = old.sink {
                                s.stop();
                            }
                        }
                        bound = Some(Bound::new(generation));
                        current.set(generation);

                        debug!("fetching source {locator} (generation {generation})");
                        let tx = self_tx.clone();
                        let agent = agent.clone();
                        let current = current.clone();
                        thread::spawn(move || {
                            let result = fetch_source(&agent, &locator, &current, generation);
                            let _ = tx.send(AudioCmd::Fetched { generation, result });
                        });
                    }

                    AudioCmd::Fetched { generation, result } => {
                        let Some(b) = bound.as_mut().filter(|b| b.generation == generation) else {
                            debug!("discarding fetch for replaced source (generation {generation})");
                            continue;
                        };
                        let bytes = match result {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                let _ = events.send(OutputEvent::Failed {
                                    generation,
                                    message: e.to_string(),
                                });
                                continue;
                            }
                        };

                        if let Some(duration) = probe_duration(&bytes) {
                            let _ = events.send(OutputEvent::Duration {
                                generation,
                                duration,
                            });
                        }
                        b.bytes = Some(bytes);
                        if let Err(message) = rebuild_sink(&stream, b, volume) {
                            let _ = events.send(OutputEvent::Failed {
                                generation,
                                message,
                            });
                            continue;
                        }
                        let _ = events.send(OutputEvent::Ready { generation });
                    }

                    AudioCmd::Play => {
                        if let Some(b) = bound.as_mut() {
                            b.want_playing = true;
                            if let Some(s) = b.sink.as_ref() {
                                s.play();
                                b.start_clock();
                            }
                        }
                    }

                    AudioCmd::Pause => {
                        if let Some(b) = bound.as_mut() {
                            b.want_playing = false;
                            if let Some(s) = b.sink.as_ref() {
                                s.pause();
                            }
                            b.stop_clock();
                        }
                    }

                    AudioCmd::Seek(position) => {
                        // Scrubbing: rebuild the sink and skip into the source.
                        // Before the bytes arrive this only moves the start position.
                        let Some(b) = bound.as_mut() else {
                            continue;
                        };
                        b.accumulated = position;
                        b.started_at = None;
                        b.ended = false;
                        if b.bytes.is_some() {
                            if let Err(message) = rebuild_sink(&stream, b, volume) {
                                warn!("seek failed: {message}");
                            }
                        }
                    }

                    AudioCmd::SetVolume(v) => {
                        volume = v;
                        if let Some(s) = bound.as_ref().and_then(|b| b.sink.as_ref()) {
                            s.set_volume(volume);
                        }
                    }

                    AudioCmd::Quit { fade_out_ms } => {
                        if let Some(s) = bound.as_ref().and_then(|b| b.sink.as_ref()) {
                            // Fade out gently before stopping.
                            fade_out_sink(s, volume, fade_out_ms);
                            s.stop();
                        }
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    let Some(b) = bound.as_mut() else {
                        continue;
                    };
                    if !b.want_playing || b.ended {
                        continue;
                    }
                    let Some(s) = b.sink.as_ref() else {
                        continue;
                    };
                    if s.empty() {
                        b.ended = true;
                        b.stop_clock();
                        let _ = events.send(OutputEvent::Ended {
                            generation: b.generation,
                        });
                    } else {
                        let _ = events.send(OutputEvent::Position {
                            generation: b.generation,
                            position: b.elapsed(),
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// Replace the bound sink with a fresh one starting at the bound position.
fn rebuild_sink(stream: &OutputStream, b: &mut Bound, volume: f32) -> Result<(), String> {
    let Some(bytes) = b.bytes.clone() else {
        return Ok(());
    };
    if let Some(old) = b.sink.take() {
        old.stop();
    }

    b.stop_clock();
    let sink = create_sink_at(stream, &bytes, b.accumulated, volume).map_err(|e| e.to_string())?;
    if b.want_playing {
        sink.play();
        b.start_clock();
    }
    b.sink = Some(sink);
    Ok(())
}

fn fade_out_sink(sink: &Sink, volume: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(volume * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

/// Without a device every load fails; keep answering so the session stays consistent.
fn drain_without_device(rx: Receiver<AudioCmd>, events: Sender<OutputEvent>) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            AudioCmd::Load { generation, .. } => {
                let _ = events.send(OutputEvent::Failed {
                    generation,
                    message: "no audio output device".to_string(),
                });
            }
            AudioCmd::Quit { .. } => break,
            _ => {}
        }
    }
}
