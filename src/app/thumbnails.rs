use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver, Sender};

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};

use crate::api::{PhotoId, PhotoRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Thumbnail,
    Display,
}

type ImageKey = (PhotoId, ImageKind);
type DecodeReply = (ImageKey, Result<ColorImage, String>);

/// Fetches and decodes photo images on worker threads and turns them into
/// egui textures as the replies drain. Keys that failed are remembered so
/// a broken image is not re-requested every frame.
pub struct ThumbnailLoader {
    textures: HashMap<ImageKey, TextureHandle>,
    in_flight: HashSet<ImageKey>,
    failed: HashSet<ImageKey>,
    reply_tx: Sender<DecodeReply>,
    reply_rx: Receiver<DecodeReply>,
}

impl ThumbnailLoader {
    pub fn new() -> Self {
        let (reply_tx, reply_rx) = channel();
        Self {
            textures: HashMap::new(),
            in_flight: HashSet::new(),
            failed: HashSet::new(),
            reply_tx,
            reply_rx,
        }
    }

    pub fn request(&mut self, record: &PhotoRecord, kind: ImageKind) {
        let key = (record.id, kind);
        if self.textures.contains_key(&key)
            || self.in_flight.contains(&key)
            || self.failed.contains(&key)
        {
            return;
        }
        self.in_flight.insert(key);

        let url = match kind {
            ImageKind::Thumbnail => record.thumbnail().to_string(),
            ImageKind::Display => record.full_url.clone(),
        };
        let reply_tx = self.reply_tx.clone();
        std::thread::spawn(move || {
            let _ = reply_tx.send((key, fetch_and_decode(&url)));
        });
    }

    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((key, result)) = self.reply_rx.try_recv() {
            self.in_flight.remove(&key);
            match result {
                Ok(image) => {
                    let (photo_id, kind) = key;
                    let name = format!("photo-{}-{:?}", photo_id.0, kind);
                    let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
                    self.textures.insert(key, handle);
                }
                Err(err) => {
                    eprintln!("Failed to load image: {}", err);
                    self.failed.insert(key);
                }
            }
        }
    }

    pub fn get(&self, id: PhotoId, kind: ImageKind) -> Option<&TextureHandle> {
        self.textures.get(&(id, kind))
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

fn fetch_and_decode(url: &str) -> Result<ColorImage, String> {
    let response = reqwest::blocking::get(url).map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("image request failed with status: {}", status));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?;

    let decoded = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}
