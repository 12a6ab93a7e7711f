//! Wwise RIFF/RIFX Vorbis converter.
//!
//! [`WwiseRiffVorbis`] parses a Wwise container (.wem), rebuilds the three
//! Vorbis headers the container stripped or repacked, and streams the audio
//! packets back out as a standard Ogg Vorbis bitstream.
//!
//! Wwise files differ from plain Ogg Vorbis in four ways, all undone here:
//!
//! 1. a RIFF/RIFX chunk container replaces the Ogg encapsulation;
//! 2. the identification and setup headers are stripped into compact
//!    `fmt`/`vorb` fields;
//! 3. codebooks are usually referenced by id in an external library instead
//!    of stored inline;
//! 4. newer files use "mod packets" whose first byte drops the packet-type
//!    bit and window-transition bits.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use ww2ogg::{CodebookLibrary, WwiseRiffVorbis};
//!
//! # fn main() -> Result<(), ww2ogg::Ww2OggError> {
//! let input = BufReader::new(File::open("audio.wem")?);
//! let codebooks = CodebookLibrary::embedded_standard();
//!
//! let mut converter = WwiseRiffVorbis::new(input, codebooks)?;
//! let mut output = File::create("audio.ogg")?;
//! converter.generate_ogg(&mut output)?;
//! # Ok(())
//! # }
//! ```

use crate::bit_reader::{BitRead, BitReader};
use crate::bit_writer::BitWrite;
use crate::codebook::{self, CodebookLibrary};
use crate::error::{Ww2OggError, Ww2OggResult};
use crate::ogg_stream::OggStream;
use crate::packet::{Packet, Packet8};
use crate::setup::{self, ModeTable};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

const VENDOR: &str = concat!(
    "converted from Audiokinetic Wwise by ww2ogg ",
    env!("CARGO_PKG_VERSION")
);

/// How to treat Wwise's modified audio packet layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcePacketFormat {
    /// Detect from the container.
    #[default]
    NoForce,
    /// Treat audio packets as modified regardless of detection.
    ForceModPackets,
    /// Treat audio packets as standard regardless of detection.
    ForceNoModPackets,
}

/// Conversion behavior switches.
///
/// # Example
///
/// ```
/// use ww2ogg::{ConversionOptions, ForcePacketFormat};
///
/// let options = ConversionOptions::new()
///     .with_inline_codebooks(true)
///     .with_force_packet_format(ForcePacketFormat::ForceNoModPackets);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Codebooks are stored inline in the setup packet; skip library lookup
    /// and rebuild each from its stripped inline form.
    pub inline_codebooks: bool,

    /// The setup packet already holds full Vorbis setup data; after the
    /// codebooks, copy the remainder verbatim.
    pub full_setup: bool,

    /// Override for mod-packet detection.
    pub force_packet_format: ForcePacketFormat,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether codebooks are inline in the setup packet.
    pub fn with_inline_codebooks(mut self, value: bool) -> Self {
        self.inline_codebooks = value;
        self
    }

    /// Set whether the setup packet carries full Vorbis setup.
    pub fn with_full_setup(mut self, value: bool) -> Self {
        self.full_setup = value;
        self
    }

    /// Set the packet format override.
    pub fn with_force_packet_format(mut self, format: ForcePacketFormat) -> Self {
        self.force_packet_format = format;
        self
    }
}

/// Builder for [`WwiseRiffVorbis`].
pub struct WwiseRiffVorbisBuilder<R> {
    input: R,
    codebooks: CodebookLibrary,
    options: ConversionOptions,
}

impl<R: Read + Seek> WwiseRiffVorbisBuilder<R> {
    pub fn new(input: R, codebooks: CodebookLibrary) -> Self {
        Self {
            input,
            codebooks,
            options: ConversionOptions::default(),
        }
    }

    /// Set whether codebooks are inline in the setup packet.
    pub fn inline_codebooks(mut self, value: bool) -> Self {
        self.options.inline_codebooks = value;
        self
    }

    /// Set whether the setup packet carries full Vorbis setup.
    pub fn full_setup(mut self, value: bool) -> Self {
        self.options.full_setup = value;
        self
    }

    /// Set the packet format override.
    pub fn force_packet_format(mut self, format: ForcePacketFormat) -> Self {
        self.options.force_packet_format = format;
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse the container and build the converter.
    pub fn build(self) -> Ww2OggResult<WwiseRiffVorbis<R>> {
        WwiseRiffVorbis::with_options(self.input, self.codebooks, self.options)
    }
}

/// Byte range of a RIFF chunk payload.
#[derive(Debug, Clone, Copy)]
struct ChunkLocation {
    offset: u64,
    size: u64,
}

/// Chunk payloads located during the scan.
#[derive(Debug, Clone, Copy, Default)]
struct ChunkInfo {
    fmt: Option<ChunkLocation>,
    cue: Option<ChunkLocation>,
    list: Option<ChunkLocation>,
    smpl: Option<ChunkLocation>,
    vorb: Option<ChunkLocation>,
    data: Option<ChunkLocation>,
}

/// Converter from a Wwise RIFF/RIFX Vorbis container to Ogg Vorbis.
pub struct WwiseRiffVorbis<R: Read + Seek> {
    input: R,
    codebooks: CodebookLibrary,
    inline_codebooks: bool,
    full_setup: bool,

    little_endian: bool,
    file_size: u64,
    riff_size: u64,
    chunks: ChunkInfo,

    // fmt
    channels: u16,
    sample_rate: u32,
    avg_bytes_per_second: u32,
    ext_unk: u16,
    subtype: u32,

    // cue / smpl
    cue_count: u32,
    loop_count: u32,
    loop_start: u32,
    loop_end: u32,

    // vorb (or the fmt-embedded equivalent, vorb_size == -1)
    vorb_offset: u64,
    vorb_size: i64,
    sample_count: u32,
    setup_packet_offset: u32,
    first_audio_packet_offset: u32,
    uid: u32,
    blocksize_0_pow: u8,
    blocksize_1_pow: u8,

    no_granule: bool,
    mod_packets: bool,
    header_triad_present: bool,
    old_packet_headers: bool,
}

impl<R: Read + Seek> WwiseRiffVorbis<R> {
    /// Parse `input` with default options.
    pub fn new(input: R, codebooks: CodebookLibrary) -> Ww2OggResult<Self> {
        Self::with_options(input, codebooks, ConversionOptions::default())
    }

    /// Start a builder for non-default options.
    pub fn builder(input: R, codebooks: CodebookLibrary) -> WwiseRiffVorbisBuilder<R> {
        WwiseRiffVorbisBuilder::new(input, codebooks)
    }

    /// Parse `input` with the given options.
    pub fn with_options(
        mut input: R,
        codebooks: CodebookLibrary,
        options: ConversionOptions,
    ) -> Ww2OggResult<Self> {
        input.seek(SeekFrom::End(0))?;
        let file_size = input.stream_position()?;
        input.seek(SeekFrom::Start(0))?;

        let mut riff_head = [0u8; 4];
        input.read_exact(&mut riff_head)?;
        let little_endian = match &riff_head {
            b"RIFF" => true,
            b"RIFX" => false,
            _ => return Err(Ww2OggError::parse("missing RIFF")),
        };

        let mut converter = Self {
            input,
            codebooks,
            inline_codebooks: options.inline_codebooks,
            full_setup: options.full_setup,
            little_endian,
            file_size,
            riff_size: 0,
            chunks: ChunkInfo::default(),
            channels: 0,
            sample_rate: 0,
            avg_bytes_per_second: 0,
            ext_unk: 0,
            subtype: 0,
            cue_count: 0,
            loop_count: 0,
            loop_start: 0,
            loop_end: 0,
            vorb_offset: 0,
            vorb_size: 0,
            sample_count: 0,
            setup_packet_offset: 0,
            first_audio_packet_offset: 0,
            uid: 0,
            blocksize_0_pow: 0,
            blocksize_1_pow: 0,
            no_granule: false,
            mod_packets: false,
            header_triad_present: false,
            old_packet_headers: false,
        };

        converter.riff_size = converter.read_u32()? as u64 + 8;
        if converter.riff_size > converter.file_size {
            return Err(Ww2OggError::parse("RIFF truncated"));
        }

        let mut wave_head = [0u8; 4];
        converter.input.read_exact(&mut wave_head)?;
        if &wave_head != b"WAVE" {
            return Err(Ww2OggError::parse("missing WAVE"));
        }

        converter.read_chunks()?;
        converter.parse_fmt_chunk()?;
        converter.parse_cue_chunk()?;
        converter.parse_smpl_chunk()?;
        converter.parse_vorb_chunk(options.force_packet_format)?;
        converter.validate_loops()?;

        Ok(converter)
    }

    /// Channel count from the `fmt` chunk.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate from the `fmt` chunk.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_u16(&mut self) -> Ww2OggResult<u16> {
        Ok(if self.little_endian {
            self.input.read_u16::<LittleEndian>()?
        } else {
            self.input.read_u16::<BigEndian>()?
        })
    }

    fn read_u32(&mut self) -> Ww2OggResult<u32> {
        Ok(if self.little_endian {
            self.input.read_u32::<LittleEndian>()?
        } else {
            self.input.read_u32::<BigEndian>()?
        })
    }

    fn read_chunks(&mut self) -> Ww2OggResult<()> {
        let mut chunk_offset: u64 = 12;

        while chunk_offset < self.riff_size {
            if chunk_offset + 8 > self.riff_size {
                return Err(Ww2OggError::parse("chunk header truncated"));
            }

            self.input.seek(SeekFrom::Start(chunk_offset))?;
            let mut chunk_type = [0u8; 4];
            self.input.read_exact(&mut chunk_type)?;
            let chunk_size = self.read_u32()? as u64;

            let location = ChunkLocation {
                offset: chunk_offset + 8,
                size: chunk_size,
            };
            match &chunk_type {
                b"fmt " => self.chunks.fmt = Some(location),
                b"cue " => self.chunks.cue = Some(location),
                b"LIST" => self.chunks.list = Some(location),
                b"smpl" => self.chunks.smpl = Some(location),
                b"vorb" => self.chunks.vorb = Some(location),
                b"data" => self.chunks.data = Some(location),
                _ => {}
            }

            chunk_offset = chunk_offset + 8 + chunk_size;
        }

        if chunk_offset > self.riff_size {
            return Err(Ww2OggError::parse("chunk truncated"));
        }
        if self.chunks.fmt.is_none() || self.chunks.data.is_none() {
            return Err(Ww2OggError::parse("expected fmt, data chunks"));
        }

        Ok(())
    }

    fn parse_fmt_chunk(&mut self) -> Ww2OggResult<()> {
        let fmt = self
            .chunks
            .fmt
            .ok_or_else(|| Ww2OggError::parse("missing fmt chunk"))?;
        let fmt_size = fmt.size;

        match self.chunks.vorb {
            None if fmt_size != 0x42 => {
                return Err(Ww2OggError::parse("expected 0x42 fmt if vorb missing"));
            }
            Some(vorb) => {
                if fmt_size != 0x28 && fmt_size != 0x18 && fmt_size != 0x12 {
                    return Err(Ww2OggError::parse("bad fmt size"));
                }
                self.vorb_offset = vorb.offset;
                self.vorb_size = vorb.size as i64;
            }
            None => {
                // vorb-equivalent fields live inside the extended fmt.
                self.vorb_offset = fmt.offset + 0x18;
                self.vorb_size = -1;
            }
        }

        self.input.seek(SeekFrom::Start(fmt.offset))?;
        if self.read_u16()? != 0xFFFF {
            return Err(Ww2OggError::parse("bad codec id"));
        }

        self.channels = self.read_u16()?;
        self.sample_rate = self.read_u32()?;
        self.avg_bytes_per_second = self.read_u32()?;

        if self.read_u16()? != 0 {
            return Err(Ww2OggError::parse("bad block align"));
        }
        if self.read_u16()? != 0 {
            return Err(Ww2OggError::parse("expected 0 bps"));
        }
        if self.read_u16()? as u64 != fmt_size - 0x12 {
            return Err(Ww2OggError::parse("bad extra fmt length"));
        }

        if fmt_size - 0x12 >= 2 {
            self.ext_unk = self.read_u16()?;
            if fmt_size - 0x12 >= 6 {
                self.subtype = self.read_u32()?;
            }
        }

        if fmt_size == 0x28 {
            let expected: [u8; 16] = [
                1, 0, 0, 0, 0, 0, 0x10, 0, 0x80, 0, 0, 0xAA, 0, 0x38, 0x9B, 0x71,
            ];
            let mut signature = [0u8; 16];
            self.input.read_exact(&mut signature)?;
            if signature != expected {
                return Err(Ww2OggError::parse("expected signature in extra fmt?"));
            }
        }

        Ok(())
    }

    fn parse_cue_chunk(&mut self) -> Ww2OggResult<()> {
        if let Some(cue) = self.chunks.cue {
            self.input.seek(SeekFrom::Start(cue.offset))?;
            self.cue_count = self.read_u32()?;
        }
        Ok(())
    }

    fn parse_smpl_chunk(&mut self) -> Ww2OggResult<()> {
        if let Some(smpl) = self.chunks.smpl {
            self.input.seek(SeekFrom::Start(smpl.offset + 0x1C))?;
            self.loop_count = self.read_u32()?;
            if self.loop_count != 1 {
                return Err(Ww2OggError::parse("expected one loop"));
            }

            self.input.seek(SeekFrom::Start(smpl.offset + 0x2C))?;
            self.loop_start = self.read_u32()?;
            self.loop_end = self.read_u32()?;
        }
        Ok(())
    }

    fn parse_vorb_chunk(&mut self, force_packet_format: ForcePacketFormat) -> Ww2OggResult<()> {
        match self.vorb_size {
            -1 | 0x28 | 0x2A | 0x2C | 0x32 | 0x34 => {
                self.input.seek(SeekFrom::Start(self.vorb_offset))?;
            }
            _ => return Err(Ww2OggError::parse("bad vorb size")),
        }

        self.sample_count = self.read_u32()?;

        match self.vorb_size {
            -1 | 0x2A => {
                self.no_granule = true;

                self.input.seek(SeekFrom::Start(self.vorb_offset + 0x4))?;
                let mod_signal = self.read_u32()?;

                if mod_signal != 0x4A
                    && mod_signal != 0x4B
                    && mod_signal != 0x69
                    && mod_signal != 0x70
                {
                    self.mod_packets = true;
                }
                self.input.seek(SeekFrom::Start(self.vorb_offset + 0x10))?;
            }
            _ => {
                self.input.seek(SeekFrom::Start(self.vorb_offset + 0x18))?;
            }
        }

        match force_packet_format {
            ForcePacketFormat::NoForce => {}
            ForcePacketFormat::ForceModPackets => self.mod_packets = true,
            ForcePacketFormat::ForceNoModPackets => self.mod_packets = false,
        }

        self.setup_packet_offset = self.read_u32()?;
        self.first_audio_packet_offset = self.read_u32()?;

        match self.vorb_size {
            -1 | 0x2A => self.input.seek(SeekFrom::Start(self.vorb_offset + 0x24))?,
            0x32 | 0x34 => self.input.seek(SeekFrom::Start(self.vorb_offset + 0x2C))?,
            _ => 0,
        };

        match self.vorb_size {
            0x28 | 0x2C => {
                self.header_triad_present = true;
                self.old_packet_headers = true;
            }
            -1 | 0x2A | 0x32 | 0x34 => {
                self.uid = self.read_u32()?;
                let mut pows = [0u8; 2];
                self.input.read_exact(&mut pows)?;
                self.blocksize_0_pow = pows[0];
                self.blocksize_1_pow = pows[1];
            }
            _ => {}
        }

        Ok(())
    }

    fn validate_loops(&mut self) -> Ww2OggResult<()> {
        if self.loop_count != 0 {
            if self.loop_end == 0 {
                self.loop_end = self.sample_count;
            } else {
                self.loop_end += 1;
            }

            if self.loop_start >= self.sample_count
                || self.loop_end > self.sample_count
                || self.loop_start > self.loop_end
            {
                return Err(Ww2OggError::parse("loops out of range"));
            }
        }
        Ok(())
    }

    fn log_info(&self) {
        tracing::debug!(
            "{} {} channel{} {} Hz {} bps",
            if self.little_endian { "RIFF WAVE" } else { "RIFX WAVE" },
            self.channels,
            if self.channels != 1 { "s" } else { "" },
            self.sample_rate,
            self.avg_bytes_per_second * 8
        );
        if self.loop_count != 0 {
            tracing::debug!("loop from {} to {}", self.loop_start, self.loop_end);
        }
        if let Some(cue) = self.chunks.cue {
            tracing::trace!("cue chunk at {:#x}, {} points", cue.offset, self.cue_count);
        }
        if let Some(list) = self.chunks.list {
            tracing::trace!("LIST chunk at {:#x} ignored", list.offset);
        }
        tracing::trace!(
            "uid {:08x}, subtype {:#x}, ext_unk {:#x}",
            self.uid,
            self.subtype,
            self.ext_unk
        );
        if self.old_packet_headers {
            tracing::trace!("8 byte (old) packet headers");
        } else if self.no_granule {
            tracing::trace!("2 byte packet headers, no granule");
        } else {
            tracing::trace!("6 byte packet headers");
        }
        tracing::trace!(
            header_triad = self.header_triad_present,
            full_setup = self.full_setup,
            inline_codebooks = self.inline_codebooks,
            mod_packets = self.mod_packets,
        );
    }

    /// Convert the parsed container into a complete Ogg Vorbis stream.
    ///
    /// Writes three header pages (identification, comment, setup) followed
    /// by one page per audio packet. On error, whatever was already written
    /// to `sink` is the caller's to discard.
    pub fn generate_ogg<W: Write>(&mut self, sink: W) -> Ww2OggResult<()> {
        self.log_info();

        let data = self
            .chunks
            .data
            .ok_or_else(|| Ww2OggError::parse("missing data chunk"))?;
        let data_offset = data.offset;
        let data_end = data.offset + data.size;

        let mut stream = OggStream::new(sink);

        let modes = if self.header_triad_present {
            self.write_header_triad(&mut stream, data_offset)?;
            ModeTable::default()
        } else {
            self.write_identification(&mut stream)?;
            self.write_comment(&mut stream)?;
            self.write_setup(&mut stream, data_offset)?
        };

        self.write_audio_packets(&mut stream, &modes, data_offset, data_end)
    }

    fn write_vorbis_packet_header<W: Write>(
        stream: &mut OggStream<W>,
        packet_type: u8,
    ) -> Ww2OggResult<()> {
        stream.write_bits(packet_type as u32, 8)?;
        stream.write_bytes(b"vorbis")
    }

    fn write_identification<W: Write>(&mut self, stream: &mut OggStream<W>) -> Ww2OggResult<()> {
        Self::write_vorbis_packet_header(stream, 1)?;
        stream.write_bits(0, 32)?; // version
        stream.write_bits(self.channels as u32, 8)?;
        stream.write_bits(self.sample_rate, 32)?;
        stream.write_bits(0, 32)?; // bitrate_maximum
        stream.write_bits(self.avg_bytes_per_second * 8, 32)?; // bitrate_nominal
        stream.write_bits(0, 32)?; // bitrate_minimum
        stream.write_bits(self.blocksize_0_pow as u32, 4)?;
        stream.write_bits(self.blocksize_1_pow as u32, 4)?;
        stream.write_bits(1, 1)?; // framing
        stream.flush_page(false, false)
    }

    fn write_comment<W: Write>(&mut self, stream: &mut OggStream<W>) -> Ww2OggResult<()> {
        Self::write_vorbis_packet_header(stream, 3)?;

        stream.write_bits(VENDOR.len() as u32, 32)?;
        stream.write_bytes(VENDOR.as_bytes())?;

        if self.loop_count == 0 {
            stream.write_bits(0, 32)?; // no user comments
        } else {
            stream.write_bits(2, 32)?;
            for comment in [
                format!("LoopStart={}", self.loop_start),
                format!("LoopEnd={}", self.loop_end),
            ] {
                stream.write_bits(comment.len() as u32, 32)?;
                stream.write_bytes(comment.as_bytes())?;
            }
        }

        stream.write_bits(1, 1)?; // framing
        stream.flush_page(false, false)
    }

    fn write_setup<W: Write>(
        &mut self,
        stream: &mut OggStream<W>,
        data_offset: u64,
    ) -> Ww2OggResult<ModeTable> {
        Self::write_vorbis_packet_header(stream, 5)?;

        let setup_packet = Packet::read(
            &mut self.input,
            data_offset + self.setup_packet_offset as u64,
            self.little_endian,
            self.no_granule,
        )?;
        if setup_packet.granule != 0 {
            return Err(Ww2OggError::parse("setup packet granule != 0"));
        }

        self.input.seek(SeekFrom::Start(setup_packet.offset))?;
        let mut reader = BitReader::new(&mut self.input);

        let codebook_count_less1 = reader.read_bits(8)?;
        let codebook_count = codebook_count_less1 + 1;
        stream.write_bits(codebook_count_less1, 8)?;

        if self.inline_codebooks {
            for _ in 0..codebook_count {
                if self.full_setup {
                    codebook::copy_codebook(&mut reader, stream)?;
                } else {
                    codebook::rebuild_codebook(&mut reader, None, stream)?;
                }
            }
        } else {
            for _ in 0..codebook_count {
                let codebook_id = reader.read_bits(10)?;
                match self.codebooks.rebuild(codebook_id as usize, stream) {
                    Ok(()) => {}
                    Err(Ww2OggError::InvalidCodebookId { .. }) => {
                        if codebook_id == 0x342 {
                            let codebook_identifier = reader.read_bits(14)?;
                            if codebook_identifier == 0x1590 {
                                // Full setup data disguised as an id stream.
                                return Err(Ww2OggError::parse(
                                    "invalid codebook id 0x342, try --full-setup",
                                ));
                            }
                        }
                        return Err(Ww2OggError::invalid_codebook_id(codebook_id as i32));
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        // Time-domain transform placeholder.
        stream.write_bits(0, 6)?; // time_count - 1
        stream.write_bits(0, 16)?; // dummy time config

        let modes = if self.full_setup {
            // The remainder, framing bit included, passes through verbatim.
            while reader.total_bits_read() < setup_packet.size as u64 * 8 {
                let bit = reader.read_bits(1)?;
                stream.write_bits(bit, 1)?;
            }
            ModeTable::default()
        } else {
            setup::rewrite_setup_body(self.channels, codebook_count, &mut reader, stream)?
        };

        if (reader.total_bits_read() + 7) / 8 != setup_packet.size as u64 {
            return Err(Ww2OggError::parse("didn't read exactly setup packet"));
        }
        if setup_packet.next_offset != data_offset + self.first_audio_packet_offset as u64 {
            return Err(Ww2OggError::parse(
                "first audio packet doesn't follow setup packet",
            ));
        }

        stream.flush_page(false, false)?;
        Ok(modes)
    }

    /// Legacy containers keep the three Vorbis headers intact behind 8-byte
    /// packet framing; copy each onto its own page, validating packet types
    /// and running the setup codebooks through the passthrough checker.
    fn write_header_triad<W: Write>(
        &mut self,
        stream: &mut OggStream<W>,
        data_offset: u64,
    ) -> Ww2OggResult<()> {
        let mut offset = data_offset + self.setup_packet_offset as u64;

        for (packet_type, name) in [(1u8, "information"), (3u8, "comment")] {
            let packet = Packet8::read(&mut self.input, offset, self.little_endian)?;
            if packet.granule != 0 {
                return Err(Ww2OggError::parse(format!("{name} packet granule != 0")));
            }

            self.input.seek(SeekFrom::Start(packet.offset))?;
            let first = self.input.read_u8()?;
            if first != packet_type {
                return Err(Ww2OggError::parse(format!("wrong type for {name} packet")));
            }

            stream.write_bits(first as u32, 8)?;
            for _ in 1..packet.size {
                let byte = self.input.read_u8()?;
                stream.write_bits(byte as u32, 8)?;
            }
            stream.flush_page(false, false)?;
            offset = packet.next_offset;
        }

        let setup_packet = Packet8::read(&mut self.input, offset, self.little_endian)?;
        if setup_packet.granule != 0 {
            return Err(Ww2OggError::parse("setup packet granule != 0"));
        }

        self.input.seek(SeekFrom::Start(setup_packet.offset))?;
        let mut reader = BitReader::new(&mut self.input);

        let packet_type = reader.read_bits(8)?;
        if packet_type != 5 {
            return Err(Ww2OggError::parse("wrong type for setup packet"));
        }
        stream.write_bits(packet_type, 8)?;
        for _ in 0..6 {
            let byte = reader.read_bits(8)?;
            stream.write_bits(byte, 8)?;
        }

        let codebook_count_less1 = reader.read_bits(8)?;
        stream.write_bits(codebook_count_less1, 8)?;
        for _ in 0..codebook_count_less1 + 1 {
            codebook::copy_codebook(&mut reader, stream)?;
        }

        while reader.total_bits_read() < setup_packet.size as u64 * 8 {
            let bit = reader.read_bits(1)?;
            stream.write_bits(bit, 1)?;
        }
        stream.flush_page(false, false)?;
        offset = setup_packet.next_offset;

        if offset != data_offset + self.first_audio_packet_offset as u64 {
            return Err(Ww2OggError::parse(
                "first audio packet doesn't follow setup packet",
            ));
        }
        Ok(())
    }

    fn write_audio_packets<W: Write>(
        &mut self,
        stream: &mut OggStream<W>,
        modes: &ModeTable,
        data_offset: u64,
        data_end: u64,
    ) -> Ww2OggResult<()> {
        let blocksize_0 = 1u32 << self.blocksize_0_pow;
        let blocksize_1 = 1u32 << self.blocksize_1_pow;
        let mut granule_pos: u64 = 0;
        let mut prev_blocksize = 0u32;
        let mut first_audio_packet = true;
        let mut prev_blockflag = false;

        let mut offset = data_offset + self.first_audio_packet_offset as u64;

        while offset < data_end {
            let (header_size, size, payload_offset, granule, next_offset) =
                if self.old_packet_headers {
                    let packet = Packet8::read(&mut self.input, offset, self.little_endian)?;
                    (
                        packet.header_size,
                        packet.size,
                        packet.offset,
                        packet.granule,
                        packet.next_offset,
                    )
                } else {
                    let packet = Packet::read(
                        &mut self.input,
                        offset,
                        self.little_endian,
                        self.no_granule,
                    )?;
                    (
                        packet.header_size,
                        packet.size,
                        packet.offset,
                        packet.granule,
                        packet.next_offset,
                    )
                };

            if offset + header_size > data_end {
                return Err(Ww2OggError::parse("page header truncated"));
            }

            let is_last_packet = next_offset == data_end;

            let current_granule = if self.no_granule {
                // Synthesize: each packet after the first contributes a
                // quarter of the previous and current window lengths.
                let curr_blocksize = if size > 0 && !modes.blockflag.is_empty() {
                    self.input.seek(SeekFrom::Start(payload_offset))?;
                    let first_byte = self.input.read_u8()?;
                    let raw = if self.mod_packets {
                        first_byte as u32
                    } else {
                        (first_byte >> 1) as u32
                    };
                    let mode_number = raw & ((1u32 << modes.bits) - 1);
                    match modes.blockflag.get(mode_number as usize) {
                        Some(true) => blocksize_1,
                        _ => blocksize_0,
                    }
                } else {
                    blocksize_0
                };

                if first_audio_packet {
                    first_audio_packet = false;
                } else {
                    granule_pos += ((prev_blocksize + curr_blocksize) / 4) as u64;
                }
                prev_blocksize = curr_blocksize;

                if is_last_packet && self.sample_count > 0 {
                    self.sample_count as u64
                } else {
                    granule_pos
                }
            } else if granule == 0xFFFF_FFFF {
                1
            } else {
                granule as u64
            };
            stream.set_granule(current_granule);

            self.input.seek(SeekFrom::Start(payload_offset))?;

            if self.mod_packets {
                if modes.blockflag.is_empty() {
                    return Err(Ww2OggError::parse("didn't load mode_blockflag"));
                }

                // Restore the packet-type bit the container dropped.
                stream.write_bits(0, 1)?;

                if size > 0 {
                    let (mode_number, remainder) = {
                        let mut bits = BitReader::new(&mut self.input);
                        let mode_number = bits.read_bits(modes.bits)?;
                        let remainder = bits.read_bits(8 - modes.bits)?;
                        (mode_number, remainder)
                    };
                    stream.write_bits(mode_number, modes.bits)?;

                    let long_window = *modes
                        .blockflag
                        .get(mode_number as usize)
                        .ok_or_else(|| Ww2OggError::parse("invalid mode number in audio packet"))?;

                    if long_window {
                        // Long windows carry the neighbours' flags; peek one
                        // packet ahead for the next one.
                        let next_blockflag = if next_offset + header_size <= data_end {
                            let next_packet = Packet::read(
                                &mut self.input,
                                next_offset,
                                self.little_endian,
                                self.no_granule,
                            )?;
                            if next_packet.size > 0 {
                                self.input.seek(SeekFrom::Start(next_packet.offset))?;
                                let mut bits = BitReader::new(&mut self.input);
                                let next_mode = bits.read_bits(modes.bits)?;
                                *modes.blockflag.get(next_mode as usize).ok_or_else(|| {
                                    Ww2OggError::parse("invalid mode number in audio packet")
                                })?
                            } else {
                                false
                            }
                        } else {
                            false
                        };

                        stream.write_bits(prev_blockflag as u32, 1)?;
                        stream.write_bits(next_blockflag as u32, 1)?;

                        self.input.seek(SeekFrom::Start(payload_offset + 1))?;
                    }

                    prev_blockflag = long_window;
                    stream.write_bits(remainder, 8 - modes.bits)?;

                    for _ in 1..size {
                        let byte = self.input.read_u8()?;
                        stream.write_bits(byte as u32, 8)?;
                    }
                }
            } else {
                for _ in 0..size {
                    let byte = self.input.read_u8()?;
                    stream.write_bits(byte as u32, 8)?;
                }
            }

            offset = next_offset;
            stream.flush_page(false, is_last_packet)?;
        }

        if offset > data_end {
            return Err(Ww2OggError::parse("page truncated"));
        }
        Ok(())
    }
}
