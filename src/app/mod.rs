mod thumbnails;
mod ui;

use std::sync::Arc;

use eframe::{egui, App};

use self::thumbnails::ThumbnailLoader;
use crate::api::{ApiError, PageResult, PhotoApi};
use crate::feed::{Lightbox, PhotoFeed};
use crate::upload::{collect_image_files, BatchReport, PendingFile, UploadCoordinator};

pub struct GalleryApp {
    server_url: String,
    access_code: String,
    api: Option<Arc<PhotoApi>>,
    feed: PhotoFeed,
    lightbox: Lightbox,
    uploader: UploadCoordinator,
    pending_files: Vec<PendingFile>,
    last_report: Option<BatchReport>,
    show_report_details: bool,
    thumbnails: ThumbnailLoader,
}

impl GalleryApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        println!("Initializing Event Gallery");
        Self {
            server_url: "http://localhost:8000".to_string(),
            access_code: String::new(),
            api: None,
            feed: PhotoFeed::new(),
            lightbox: Lightbox::new(),
            uploader: UploadCoordinator::new(),
            pending_files: Vec::new(),
            last_report: None,
            show_report_details: false,
            thumbnails: ThumbnailLoader::new(),
        }
    }

    /// The page-fetch primitive handed to the feed: runs the async client
    /// on the worker thread's own runtime.
    fn page_fetch(
        &self,
    ) -> Option<impl FnOnce(Option<String>) -> Result<PageResult, ApiError> + Send + 'static> {
        let api = Arc::clone(self.api.as_ref()?);
        Some(move |cursor: Option<String>| {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(api.fetch_photo_page(cursor.as_deref()))
        })
    }

    pub fn can_connect(&self) -> bool {
        !self.server_url.trim().is_empty() && !self.access_code.trim().is_empty()
    }

    pub fn connect(&mut self) {
        if !self.can_connect() {
            return;
        }
        println!("Connecting to {}", self.server_url.trim());
        self.api = Some(Arc::new(PhotoApi::new(
            self.server_url.trim(),
            self.access_code.trim(),
        )));
        self.refresh_feed();
    }

    pub fn refresh_feed(&mut self) {
        self.lightbox.close();
        if let Some(fetch) = self.page_fetch() {
            self.feed.refresh(fetch);
        }
    }

    pub fn request_more_photos(&mut self) {
        if let Some(fetch) = self.page_fetch() {
            self.feed.request_more(fetch);
        }
    }

    pub fn lightbox_next(&mut self) {
        if let Some(fetch) = self.page_fetch() {
            self.lightbox.next(&mut self.feed, fetch);
        }
    }

    pub fn add_files(&mut self) {
        let extensions: Vec<&str> = crate::upload::IMAGE_EXTENSIONS.to_vec();
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", &extensions)
            .pick_files()
        {
            for path in paths {
                if let Some(file) = PendingFile::from_path(&path) {
                    self.add_pending(file);
                }
            }
        }
    }

    pub fn add_folder(&mut self) {
        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
            let found = collect_image_files(&folder);
            println!("Found {} images in {}", found.len(), folder.display());
            for file in found {
                self.add_pending(file);
            }
        }
    }

    fn add_pending(&mut self, file: PendingFile) {
        let key = file.file_key();
        if self.pending_files.iter().any(|f| f.file_key() == key) {
            return;
        }
        self.pending_files.push(file);
    }

    pub fn start_upload(&mut self) {
        let Some(api) = self.api.as_ref().map(Arc::clone) else {
            return;
        };
        if self.pending_files.is_empty() || self.uploader.is_active() {
            return;
        }

        self.last_report = None;
        self.show_report_details = false;
        let files = std::mem::take(&mut self.pending_files);
        println!("Uploading {} photos", files.len());

        self.uploader.submit(files, move |file, on_progress| {
            api.upload_photo(file, on_progress)
                .map_err(|e| e.to_string())
        });
    }

    fn update_state(&mut self, ctx: &egui::Context) {
        self.feed.poll();
        self.lightbox.settle(&self.feed);

        if let Some(report) = self.uploader.poll() {
            for outcome in report.outcomes.iter().filter(|o| o.success) {
                if let Some(record) = &outcome.record {
                    println!("Uploaded {} as photo {}", outcome.file_name, record.id.0);
                }
            }
            let refresh = report.succeeded() > 0;
            self.last_report = Some(report);
            if refresh {
                // Pull the fresh uploads into the stream.
                self.refresh_feed();
            }
        }

        self.thumbnails.poll(ctx);

        if self.feed.is_loading() || self.uploader.is_active() || self.thumbnails.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    /// Directional and dismiss keys drive the lightbox; everything is
    /// ignored while it is closed.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        if !self.lightbox.is_open() {
            return;
        }
        let (previous, next, close) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if close {
            self.lightbox.close();
        } else {
            if previous {
                self.lightbox.previous();
            }
            if next {
                self.lightbox_next();
            }
        }
    }
}

impl App for GalleryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.handle_keys(ctx);
        self.render(ctx);
    }
}
