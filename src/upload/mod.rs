mod coordinator;
mod picker;
mod types;

pub use coordinator::{UploadCoordinator, MAX_CONCURRENT_UPLOADS};
pub use picker::{collect_image_files, is_image_file, PendingFile, IMAGE_EXTENSIONS};
pub use types::{
    BatchProgress, BatchReport, TaskState, UploadEvent, UploadEventKind, UploadOutcome, UploadTask,
};
