mod api;
mod app;
mod feed;
mod upload;
mod utils;

use app::GalleryApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 540.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Event Gallery",
        options,
        Box::new(|cc| Box::new(GalleryApp::new(cc))),
    )
}
