//! GUI for region-based PDF to spreadsheet conversion
//!
//! Pick a PDF and a page range, draw a rectangle on the page preview, and
//! convert the text inside the rectangle across the range into a two-column
//! CSV. The preview is drawn from the extractor's positioned words; the
//! dragged rectangle is remapped into PDF page coordinates before clipping.

use eframe::egui;
use pdf_clipper::{
    clip_region, extract_words, write_csv, ClipOptions, PageWords, PreviewMap,
};
use std::path::Path;

const WARNINGS: &str = "1. Characters outside the font's encoding may be dropped.\n\
                        2. Sub-numbered items inside a paragraph are not split into separate rows.";

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 780.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Region to Spreadsheet",
        options,
        Box::new(|_cc| Ok(Box::new(ClipApp::default()))),
    )
}

#[derive(Clone)]
enum Dialog {
    Error(String),
    Success(String),
}

struct ClipApp {
    pdf_path: String,
    save_dir: String,
    file_name: String,
    first_page: u32,
    last_page: u32,
    /// Words and size of the page shown in the preview
    preview: Option<PageWords>,
    /// The mapping the preview was last drawn with
    preview_map: Option<PreviewMap>,
    /// In-progress drag anchor, in canvas-local pixels
    drag_start: Option<egui::Pos2>,
    /// Selected rectangle corners, in canvas-local pixels
    selection: Option<(egui::Pos2, egui::Pos2)>,
    dialog: Option<Dialog>,
}

impl Default for ClipApp {
    fn default() -> Self {
        ClipApp {
            pdf_path: String::new(),
            save_dir: String::new(),
            file_name: "extracted.csv".to_string(),
            first_page: 1,
            last_page: 1,
            preview: None,
            preview_map: None,
            drag_start: None,
            selection: None,
            dialog: None,
        }
    }
}

impl eframe::App for ClipApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let controls_enabled = self.dialog.is_none();

        egui::TopBottomPanel::top("form").show(ctx, |ui| {
            ui.add_enabled_ui(controls_enabled, |ui| self.form_ui(ui));
        });

        egui::TopBottomPanel::bottom("actions").show(ctx, |ui| {
            ui.add_enabled_ui(controls_enabled, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(6.0);
                    if ui.button("Convert").clicked() {
                        self.convert();
                    }
                    ui.add_space(6.0);
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(controls_enabled, |ui| self.preview_ui(ui));
        });

        self.dialog_ui(ctx);
    }
}

impl ClipApp {
    fn form_ui(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        egui::Grid::new("form_grid")
            .num_columns(3)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("PDF file:");
                ui.add(egui::TextEdit::singleline(&mut self.pdf_path).desired_width(440.0));
                if ui.button("Browse…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("PDF files", &["pdf"])
                        .pick_file()
                    {
                        self.pdf_path = path.display().to_string();
                        self.load_preview();
                    }
                }
                ui.end_row();

                ui.label("Save location:");
                ui.add(egui::TextEdit::singleline(&mut self.save_dir).desired_width(440.0));
                if ui.button("Browse…").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.save_dir = dir.display().to_string();
                    }
                }
                ui.end_row();

                ui.label("File name:");
                ui.add(egui::TextEdit::singleline(&mut self.file_name).desired_width(440.0));
                ui.end_row();

                ui.label("Pages:");
                ui.horizontal(|ui| {
                    ui.add(egui::DragValue::new(&mut self.first_page).range(1..=9999));
                    ui.label("to");
                    ui.add(egui::DragValue::new(&mut self.last_page).range(1..=9999));
                });
                if ui.button("Apply").clicked() {
                    self.load_preview();
                }
                ui.end_row();
            });

        ui.add_space(2.0);
        ui.colored_label(egui::Color32::RED, WARNINGS);
        ui.add_space(4.0);
    }

    fn preview_ui(&mut self, ui: &mut egui::Ui) {
        let Some(page) = &self.preview else {
            ui.centered_and_justified(|ui| {
                ui.label("Select a PDF file and press Apply to load a page preview.");
            });
            return;
        };

        let avail = ui.available_size();
        let map = PreviewMap::fit(
            page.width,
            page.height,
            avail.x.max(50.0),
            avail.y.max(50.0),
        );
        self.preview_map = Some(map);

        let (preview_w, preview_h) = map.preview_size();
        let (response, painter) =
            ui.allocate_painter(egui::vec2(preview_w, preview_h), egui::Sense::drag());
        let origin = response.rect.min;

        painter.rect_filled(response.rect, 2.0, egui::Color32::WHITE);
        for word in &page.words {
            let (px, py) = map.to_preview(word.x0, word.y + word.height);
            painter.text(
                origin + egui::vec2(px, py),
                egui::Align2::LEFT_TOP,
                &word.text,
                egui::FontId::proportional((word.font_size * map.scale()).max(5.0)),
                egui::Color32::DARK_GRAY,
            );
        }

        // A new drag replaces the previous rectangle
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_start = Some((pos - origin).to_pos2());
                self.selection = None;
            }
        }
        if response.dragged() {
            if let (Some(start), Some(pos)) = (self.drag_start, response.interact_pointer_pos()) {
                self.selection = Some((start, (pos - origin).to_pos2()));
            }
        }
        if response.drag_stopped() {
            self.drag_start = None;
        }

        if let Some((a, b)) = self.selection {
            let rect = egui::Rect::from_two_pos(origin + a.to_vec2(), origin + b.to_vec2());
            painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.5, egui::Color32::RED));
        }
    }

    fn load_preview(&mut self) {
        if self.pdf_path.trim().is_empty() {
            return;
        }

        match extract_words(&self.pdf_path, self.first_page, self.first_page) {
            Ok(pages) => match pages.into_iter().next() {
                Some(page) => {
                    self.preview = Some(page);
                    self.selection = None;
                    self.drag_start = None;
                }
                None => {
                    self.dialog = Some(Dialog::Error(format!(
                        "Could not display page: page {} not found",
                        self.first_page
                    )));
                }
            },
            Err(e) => {
                self.dialog = Some(Dialog::Error(format!("Could not display page: {}", e)));
            }
        }
    }

    fn convert(&mut self) {
        let selection = match (self.preview_map, self.selection) {
            (Some(map), Some((a, b))) if !self.pdf_path.trim().is_empty() => (map, a, b),
            _ => {
                self.dialog = Some(Dialog::Error(
                    "Select a PDF file, a save location, and draw a rectangle first.".to_string(),
                ));
                return;
            }
        };
        if self.save_dir.trim().is_empty() || self.file_name.trim().is_empty() {
            self.dialog = Some(Dialog::Error(
                "Select a PDF file, a save location, and draw a rectangle first.".to_string(),
            ));
            return;
        }

        let (map, a, b) = selection;
        let options = ClipOptions {
            first_page: self.first_page,
            last_page: self.last_page,
            region: map.rect_to_page(a.x, a.y, b.x, b.y),
        };
        let save_path = Path::new(self.save_dir.trim()).join(self.file_name.trim());

        let outcome = clip_region(&self.pdf_path, &options).and_then(|result| {
            write_csv(&save_path, &result.rows)?;
            Ok(result)
        });

        match outcome {
            Ok(result) => {
                let mut message = format!(
                    "Converted {} rows.\nFile saved at: {}",
                    result.rows.len(),
                    save_path.display()
                );
                if !result.pages_without_text.is_empty() {
                    message.push_str(&format!(
                        "\nPages without extractable text: {:?}",
                        result.pages_without_text
                    ));
                }
                self.dialog = Some(Dialog::Success(message));
            }
            Err(e) => {
                self.dialog = Some(Dialog::Error(e.to_string()));
            }
        }
    }

    fn dialog_ui(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialog.clone() else {
            return;
        };
        let (title, message) = match &dialog {
            Dialog::Error(m) => ("Error", m),
            Dialog::Success(m) => ("Success", m),
        };

        let mut close = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            });
        if close {
            self.dialog = None;
        }
    }
}
