pub mod file;
pub mod wav;

pub use file::AudioFile;
pub use wav::{decode_header, encode_container, encode_header, WavFormat, WavHeader, HEADER_LEN};
