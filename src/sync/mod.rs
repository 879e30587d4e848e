pub mod pipeline;
pub mod rest;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod memory;

pub use pipeline::PropertySync;
pub use rest::RestStore;
pub use traits::{MediaUploader, PropertyStore};
pub use types::{ImageRow, PropertyRow, SaveReceipt, UploadFile};
