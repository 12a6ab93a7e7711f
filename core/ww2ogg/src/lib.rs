//! ww2ogg library for converting Wwise RIFF/RIFX Vorbis audio to Ogg Vorbis.

pub mod bit_reader;
pub mod bit_writer;
pub mod codebook;
pub mod crc32;
pub mod embedded_codebooks;
pub mod error;
pub mod ogg_stream;
pub mod packet;
mod setup;
pub mod vorbis_helpers;
pub mod wwise_riff_vorbis;

pub use bit_reader::*;
pub use bit_writer::*;
pub use codebook::*;
pub use error::*;
pub use ogg_stream::*;
pub use packet::*;
pub use vorbis_helpers::*;
pub use wwise_riff_vorbis::*;
