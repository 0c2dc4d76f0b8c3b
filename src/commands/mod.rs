pub mod sync_data;
pub mod upload_images;
