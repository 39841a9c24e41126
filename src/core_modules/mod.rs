pub mod alert;
pub mod background;
pub mod blob_extractor;
pub mod detection;
pub mod filters;
pub mod frame;
pub mod pixel;
pub mod region;
pub mod throttle;
pub mod utils;
