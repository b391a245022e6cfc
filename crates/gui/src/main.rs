//! Peakline GUI: egui viewer with an overview and a zoomable waveform view.

mod app;
mod painter;
mod playback;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 520.0])
            .with_min_inner_size([600.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Peakline",
        options,
        Box::new(|cc| Ok(Box::new(app::PeaklineApp::new(cc)))),
    )
}
