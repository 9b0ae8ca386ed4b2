//! Frame I/O for the booth: decoding uploads, the file-backed frame
//! source, and the PNG output sink.

pub mod frame_source;
pub mod load;
pub mod save;

pub use frame_source::FileFrameSource;
pub use load::{LoadError, load_frame, load_frame_bytes, load_strip_frames};
pub use save::{date_stamp, encode_png, save_png, timestamp_file_name};
