//! Desktop presentation surface.
//!
//! One egui window: language selectors, input/output regions, the action
//! buttons, and a status line. The window never runs a workflow itself; it
//! dispatches intents to the session controller and drains the session
//! event channel each frame. The session module has no dependency on this
//! one, so the rendering stack stays swappable.

use eframe::egui;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::catalog::{Language, SourceSelection, AUTO_DISPLAY};
use crate::session::{Intent, SessionController, SessionEvent, SessionState, WorkflowStage};

pub struct VoiceBridgeApp {
    controller: Arc<SessionController>,
    state: Arc<Mutex<SessionState>>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    status: String,
    stage: WorkflowStage,
    realtime_active: bool,
}

impl VoiceBridgeApp {
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::StageChanged(stage) => self.stage = stage,
                SessionEvent::Notice(message) => self.status = message,
                SessionEvent::Failure { stage, message } => {
                    self.status = format!("{} failed: {message}", stage.as_str());
                }
                SessionEvent::RealtimeStarted => self.realtime_active = true,
                SessionEvent::RealtimeStopped => {
                    self.realtime_active = false;
                    self.status = "Real-time translation stopped.".to_string();
                }
            }
        }
    }
}

impl eframe::App for VoiceBridgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        let mut intent = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| ui.heading("VoiceBridge"));
            ui.add_space(8.0);

            {
                let mut state = self.state.lock();
                ui.horizontal(|ui| {
                    ui.label("Source language:");
                    egui::ComboBox::from_id_salt("source-lang")
                        .selected_text(state.source.display_name())
                        .show_ui(ui, |ui| {
                            ui.selectable_value(
                                &mut state.source,
                                SourceSelection::Auto,
                                AUTO_DISPLAY,
                            );
                            for lang in Language::all() {
                                ui.selectable_value(
                                    &mut state.source,
                                    SourceSelection::Fixed(*lang),
                                    lang.display_name(),
                                );
                            }
                        });

                    ui.label("Target language:");
                    egui::ComboBox::from_id_salt("target-lang")
                        .selected_text(state.target.display_name())
                        .show_ui(ui, |ui| {
                            for lang in Language::all() {
                                ui.selectable_value(&mut state.target, *lang, lang.display_name());
                            }
                        });
                });

                ui.add_space(8.0);
                ui.label("Enter text or use the microphone:");
                ui.add(
                    egui::TextEdit::multiline(&mut state.input)
                        .desired_rows(6)
                        .desired_width(f32::INFINITY),
                );
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Translate Text").clicked() {
                    intent = Some(Intent::TranslateText);
                }
                if ui.button("Copy Translation").clicked() {
                    intent = Some(Intent::CopyTranslation);
                }
                if ui.button("Text-to-Speech").clicked() {
                    intent = Some(Intent::TextToSpeech);
                }
            });
            ui.horizontal(|ui| {
                if ui.button("Speech-to-Text").clicked() {
                    intent = Some(Intent::SpeechToText);
                }
                if ui.button("Speech-to-Speech").clicked() {
                    intent = Some(Intent::SpeechToSpeech);
                }
                let realtime_label = if self.realtime_active {
                    "Stop Real-Time Translation"
                } else {
                    "Real-Time Speech Translation"
                };
                if ui.button(realtime_label).clicked() {
                    intent = Some(Intent::ToggleRealtime);
                }
            });

            ui.add_space(8.0);
            ui.label("Translated text:");
            let mut output = self.state.lock().output.clone();
            ui.add(
                egui::TextEdit::multiline(&mut output)
                    .desired_rows(8)
                    .desired_width(f32::INFINITY)
                    .interactive(false),
            );

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if self.stage != WorkflowStage::Idle {
                    ui.spinner();
                    ui.label(self.stage.as_str());
                    ui.separator();
                } else if self.realtime_active {
                    ui.spinner();
                    ui.label("real-time listening");
                    ui.separator();
                }
                ui.label(&self.status);
            });
        });

        if let Some(intent) = intent {
            self.controller.dispatch(intent);
        }

        // Background work mutates state outside the frame loop; keep
        // repainting while any of it is running.
        if self.stage != WorkflowStage::Idle || self.realtime_active {
            ctx.request_repaint_after(Duration::from_millis(150));
        }
    }
}

/// Open the window and block until it closes.
pub fn run(
    controller: Arc<SessionController>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
) -> eframe::Result<()> {
    let state = controller.state();
    let app = VoiceBridgeApp {
        controller,
        state,
        events,
        status: String::new(),
        stage: WorkflowStage::Idle,
        realtime_active: false,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([700.0, 650.0])
            .with_min_inner_size([560.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native("VoiceBridge", options, Box::new(move |_cc| Ok(Box::new(app))))
}
