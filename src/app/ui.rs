use eframe::egui::{self, Align, Color32, RichText};

use super::thumbnails::ImageKind;
use super::GalleryApp;
use crate::feed::{RowLayout, PREFETCH_ROWS, TARGET_CELL_WIDTH};
use crate::upload::TaskState;
use crate::utils::format::{format_eta, format_rate, format_size};

const SUCCESS_COLOR: Color32 = Color32::from_rgb(0, 180, 0);
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 50, 50);
const ACCENT_COLOR: Color32 = Color32::from_rgb(86, 156, 214);

impl GalleryApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| self.render_header(ui));
        egui::SidePanel::right("upload_panel")
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.render_upload_panel(ui));
            });
        egui::CentralPanel::default().show(ctx, |ui| self.render_gallery(ui));

        if self.lightbox.is_open() {
            self.render_lightbox(ctx);
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.heading("Event Photo Stream");
            ui.label(
                RichText::new("Browse the shared gallery and add photos of your own")
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
        });
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Server:");
            ui.add(egui::TextEdit::singleline(&mut self.server_url).desired_width(220.0));
            ui.label("Access code:");
            ui.add(
                egui::TextEdit::singleline(&mut self.access_code)
                    .desired_width(140.0)
                    .hint_text("from your invitation"),
            );
            ui.add_enabled_ui(self.can_connect(), |ui| {
                if ui.button("Connect").clicked() {
                    self.connect();
                }
            });
            ui.add_enabled_ui(self.api.is_some(), |ui| {
                if ui.button("🔄 Refresh").clicked() {
                    self.refresh_feed();
                }
            });
        });
        ui.add_space(8.0);
    }

    fn render_gallery(&mut self, ui: &mut egui::Ui) {
        if self.api.is_none() {
            ui.add_space(48.0);
            ui.vertical_centered(|ui| {
                ui.label("Enter the server address and your event access code to browse photos.");
            });
            return;
        }

        if let Some(error) = self.feed.error().map(str::to_string) {
            ui.add_space(8.0);
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(ERROR_COLOR, error);
                    if ui.button("Try Again").clicked() {
                        self.request_more_photos();
                    }
                });
            });
            ui.add_space(4.0);
        }

        if self.feed.is_empty() {
            ui.add_space(48.0);
            ui.vertical_centered(|ui| {
                if self.feed.is_loading() {
                    ui.add(egui::Spinner::new());
                    ui.label("Loading photos...");
                } else if self.feed.error().is_none() {
                    ui.heading("No Photos Yet");
                    ui.label("Be the first to share a photo from the event!");
                }
            });
            return;
        }

        ui.spacing_mut().item_spacing = egui::vec2(0.0, 0.0);
        let layout = RowLayout::compute(self.feed.len(), ui.available_width(), TARGET_CELL_WIDTH);
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show_rows(ui, layout.cell, layout.rows, |ui, rows| {
                for row in rows.clone() {
                    ui.horizontal(|ui| {
                        for index in layout.row_range(row) {
                            self.render_photo_cell(ui, index, layout.cell);
                        }
                    });
                }
                // Viewport proximity signal. This fires on every frame the
                // tail is near; the feed's in-flight guard absorbs it.
                if rows.end + PREFETCH_ROWS >= layout.rows && self.feed.error().is_none() {
                    self.request_more_photos();
                }
            });
    }

    fn render_photo_cell(&mut self, ui: &mut egui::Ui, index: usize, cell: f32) {
        let Some(record) = self.feed.get(index) else {
            return;
        };
        self.thumbnails.request(record, ImageKind::Thumbnail);

        let (rect, response) = ui.allocate_exact_size(egui::vec2(cell, cell), egui::Sense::click());
        if ui.is_rect_visible(rect) {
            let image_rect = rect.shrink(2.0);
            match self.thumbnails.get(record.id, ImageKind::Thumbnail) {
                Some(texture) => {
                    egui::Image::new(texture)
                        .rounding(4.0)
                        .paint_at(ui, image_rect);
                }
                None => {
                    ui.painter()
                        .rect_filled(image_rect, 4.0, ui.visuals().faint_bg_color);
                }
            }
            if response.hovered() {
                ui.painter()
                    .rect_stroke(image_rect, 4.0, egui::Stroke::new(2.0, ACCENT_COLOR));
            }
        }

        let response = response.on_hover_text(format!(
            "{}\n{}",
            record.original_filename,
            record.uploaded_at.format("%Y-%m-%d %H:%M")
        ));
        if response.clicked() {
            self.lightbox.open(index, self.feed.len());
        }
    }

    fn render_lightbox(&mut self, ctx: &egui::Context) {
        let Some(index) = self.lightbox.open_index() else {
            return;
        };
        let Some(record) = self.feed.get(index).cloned() else {
            return;
        };
        self.thumbnails.request(&record, ImageKind::Display);

        // Warm the neighbors so paging through feels instant.
        let items = self.feed.items();
        for neighbor in [index.saturating_sub(1), index + 1] {
            if neighbor != index {
                if let Some(neighbor) = items.get(neighbor) {
                    self.thumbnails.request(neighbor, ImageKind::Display);
                }
            }
        }

        let screen = ctx.screen_rect();
        egui::Area::new(egui::Id::new("lightbox"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(screen, 0.0, Color32::from_black_alpha(240));
                ui.allocate_ui_at_rect(screen.shrink(16.0), |ui| {
                    ui.vertical_centered(|ui| {
                        ui.horizontal(|ui| {
                            if let Some((position, total)) = self.lightbox.counter(&self.feed) {
                                ui.label(
                                    RichText::new(format!("{} / {}", position, total))
                                        .color(Color32::WHITE)
                                        .size(16.0),
                                );
                            }
                            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                                if ui.button("✕ Close").clicked() {
                                    self.lightbox.close();
                                }
                                if ui.button("🌐 Open in Browser").clicked() {
                                    if let Err(e) = open::that(&record.full_url) {
                                        eprintln!("Failed to open browser: {}", e);
                                    }
                                }
                            });
                        });

                        ui.add_space(8.0);
                        let image_area =
                            egui::vec2(ui.available_width(), ui.available_height() - 96.0);
                        // Fall back to the grid thumbnail while the
                        // display-size image is still on its way.
                        let texture = self
                            .thumbnails
                            .get(record.id, ImageKind::Display)
                            .or_else(|| self.thumbnails.get(record.id, ImageKind::Thumbnail));
                        match texture {
                            Some(texture) => {
                                ui.add(egui::Image::new(texture).max_size(image_area));
                            }
                            None => {
                                ui.add_space(image_area.y * 0.5);
                                ui.add(egui::Spinner::new());
                            }
                        }

                        ui.add_space(8.0);
                        ui.label(RichText::new(&record.original_filename).color(Color32::WHITE));
                        ui.label(
                            RichText::new(record.uploaded_at.format("%Y-%m-%d %H:%M").to_string())
                                .color(Color32::from_gray(170)),
                        );

                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            let nav_width = 220.0;
                            let indent = (ui.available_width() - nav_width) / 2.0;
                            ui.add_space(indent.max(0.0));

                            if ui
                                .add_enabled(index > 0, egui::Button::new("◀ Previous"))
                                .clicked()
                            {
                                self.lightbox.previous();
                            }
                            let can_advance =
                                index + 1 < self.feed.len() || self.feed.has_more();
                            if ui
                                .add_enabled(can_advance, egui::Button::new("Next ▶"))
                                .clicked()
                            {
                                self.lightbox_next();
                            }
                            if self.feed.is_loading() {
                                ui.add(egui::Spinner::new());
                            }
                        });
                    });
                });
            });
    }

    fn render_upload_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.heading("Share Your Photos");
        ui.add_space(4.0);

        if self.api.is_none() {
            ui.label("Connect to an event to start uploading.");
            return;
        }

        ui.horizontal(|ui| {
            if ui.button("📁 Add Files").clicked() {
                self.add_files();
            }
            if ui.button("🗂 Add Folder").clicked() {
                self.add_folder();
            }
        });

        if !self.pending_files.is_empty() {
            ui.add_space(8.0);
            ui.group(|ui| {
                ui.label(format!("Selected Photos ({})", self.pending_files.len()));
                ui.add_space(4.0);

                let mut remove = None;
                egui::ScrollArea::vertical()
                    .id_source("pending_files")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for (index, file) in self.pending_files.iter().enumerate() {
                            ui.horizontal(|ui| {
                                if ui.small_button("✕").clicked() {
                                    remove = Some(index);
                                }
                                ui.label(&file.name);
                                ui.label(
                                    RichText::new(format_size(file.size))
                                        .color(ui.visuals().weak_text_color()),
                                );
                            });
                        }
                    });
                if let Some(index) = remove {
                    self.pending_files.remove(index);
                }
            });

            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                let label = format!("📤 Upload {} Photos", self.pending_files.len());
                let button = egui::Button::new(label).min_size(egui::vec2(200.0, 36.0));
                if ui
                    .add_enabled(!self.uploader.is_active(), button)
                    .clicked()
                {
                    self.start_upload();
                }
            });
        }

        if let Some(progress) = self.uploader.progress() {
            ui.add_space(8.0);
            ui.group(|ui| {
                ui.label("📤 Uploading...");
                ui.add(
                    egui::ProgressBar::new(progress.fraction())
                        .show_percentage()
                        .fill(ACCENT_COLOR),
                );
                ui.label(format!(
                    "{} / {}",
                    format_size(progress.bytes_sent),
                    format_size(progress.bytes_total)
                ));
                match (progress.throughput, progress.eta) {
                    (Some(rate), Some(eta)) => {
                        ui.label(format!(
                            "{}, about {} left",
                            format_rate(rate),
                            format_eta(eta)
                        ));
                    }
                    _ => {
                        ui.label("Estimating speed...");
                    }
                }
                ui.label(format!(
                    "Files: {}/{} | ✅ {} | ❌ {}",
                    progress.files_done, progress.files_total, progress.succeeded, progress.failed
                ));

                ui.add_space(4.0);
                for task in self.uploader.tasks() {
                    ui.push_id(&task.file_key, |ui| {
                        ui.horizontal(|ui| match task.state {
                            TaskState::Pending => {
                                ui.label("⏳");
                                ui.label(&task.file_name);
                            }
                            TaskState::InFlight => {
                                ui.label("📤");
                                ui.label(&task.file_name);
                                ui.label(
                                    RichText::new(format!("{:.0}%", task.fraction() * 100.0))
                                        .color(ui.visuals().weak_text_color()),
                                );
                            }
                            TaskState::Succeeded => {
                                ui.label("✅");
                                ui.colored_label(SUCCESS_COLOR, &task.file_name);
                            }
                            TaskState::Failed => {
                                ui.label("❌");
                                ui.colored_label(
                                    ERROR_COLOR,
                                    format!(
                                        "{} - {}",
                                        task.file_name,
                                        task.error.as_deref().unwrap_or("Upload failed")
                                    ),
                                );
                            }
                        });
                    });
                }
            });
        }

        if self.last_report.is_some() {
            self.render_report(ui);
        }
    }

    fn render_report(&mut self, ui: &mut egui::Ui) {
        let mut dismiss = false;
        if let Some(report) = &self.last_report {
            ui.add_space(8.0);
            ui.group(|ui| {
                let color = if report.failed() == 0 {
                    SUCCESS_COLOR
                } else {
                    ERROR_COLOR
                };
                ui.colored_label(color, format!("Upload complete: {}", report.summary()));

                ui.horizontal(|ui| {
                    let toggle = if self.show_report_details {
                        "Hide Details"
                    } else {
                        "Show Details"
                    };
                    if ui.button(toggle).clicked() {
                        self.show_report_details = !self.show_report_details;
                    }
                    if ui.button("Dismiss").clicked() {
                        dismiss = true;
                    }
                });

                if self.show_report_details {
                    egui::Frame::none()
                        .fill(ui.style().visuals.extreme_bg_color)
                        .show(ui, |ui| {
                            ui.add_space(4.0);
                            for outcome in &report.outcomes {
                                ui.horizontal(|ui| {
                                    if outcome.success {
                                        ui.label("✅");
                                        ui.colored_label(SUCCESS_COLOR, &outcome.file_name);
                                    } else {
                                        ui.label("❌");
                                        ui.colored_label(
                                            ERROR_COLOR,
                                            format!(
                                                "{} - {}",
                                                outcome.file_name,
                                                outcome.error.as_deref().unwrap_or("Upload failed")
                                            ),
                                        );
                                    }
                                });
                            }
                            ui.add_space(4.0);
                        });
                }
            });
        }
        if dismiss {
            self.last_report = None;
        }
    }
}
