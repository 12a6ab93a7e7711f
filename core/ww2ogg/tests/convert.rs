//! End-to-end conversions over synthetic Wwise containers.

use std::io::Cursor;
use ww2ogg::{
    BitWrite, BitWriter, ConversionOptions, ForcePacketFormat, CodebookLibrary, Ww2OggError,
    WwiseRiffVorbis,
};

/// Synthetic .wem builder covering the container layouts the converter
/// accepts.
struct WemBuilder {
    little_endian: bool,
    channels: u16,
    sample_rate: u32,
    avg_bytes_per_second: u32,
    sample_count: u32,
    blocksize_0_pow: u8,
    blocksize_1_pow: u8,
    vorb_size: u32,
    /// 0x12, 0x18, or 0x28; ignored when `fmt_embedded`.
    fmt_size: u32,
    /// Embed the vorb fields in a 0x42 fmt chunk instead of a vorb chunk.
    fmt_embedded: bool,
    guid_ok: bool,
    mod_signal: u32,
    smpl_loop: Option<(u32, u32)>,
    smpl_loop_count: u32,
    setup: Vec<u8>,
    /// Payload plus granule (granule ignored for the 2-byte layout).
    packets: Vec<(Vec<u8>, u32)>,
    /// Padding inserted between setup and audio without telling the header.
    audio_offset_pad: usize,
}

impl WemBuilder {
    fn new(vorb_size: u32, setup: Vec<u8>) -> Self {
        Self {
            little_endian: true,
            channels: 1,
            sample_rate: 48000,
            avg_bytes_per_second: 6000,
            sample_count: 10000,
            blocksize_0_pow: 8,
            blocksize_1_pow: 11,
            vorb_size,
            fmt_size: 0x18,
            fmt_embedded: false,
            guid_ok: true,
            mod_signal: 0,
            smpl_loop: None,
            smpl_loop_count: 1,
            setup,
            packets: Vec::new(),
            audio_offset_pad: 0,
        }
    }

    fn push_u16(&self, out: &mut Vec<u8>, value: u16) {
        if self.little_endian {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn push_u32(&self, out: &mut Vec<u8>, value: u32) {
        if self.little_endian {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn no_granule(&self) -> bool {
        self.vorb_size == 0x2A
    }

    fn build(&self) -> Vec<u8> {
        // Setup packet, then audio packets, all framed per layout.
        let mut data = Vec::new();
        let packet_header = if self.no_granule() { 2 } else { 6 };

        self.push_u16(&mut data, self.setup.len() as u16);
        if !self.no_granule() {
            self.push_u32(&mut data, 0); // setup granule
        }
        data.extend_from_slice(&self.setup);

        data.extend_from_slice(&vec![0u8; self.audio_offset_pad]);
        let first_audio_packet_offset =
            (packet_header + self.setup.len() + self.audio_offset_pad) as u32;

        for (payload, granule) in &self.packets {
            self.push_u16(&mut data, payload.len() as u16);
            if !self.no_granule() {
                self.push_u32(&mut data, *granule);
            }
            data.extend_from_slice(payload);
        }

        let mut vorb = Vec::new();
        self.push_u32(&mut vorb, self.sample_count);
        match self.vorb_size {
            0x2A => {
                self.push_u32(&mut vorb, self.mod_signal);
                vorb.extend_from_slice(&[0u8; 0x10 - 0x8]);
                self.push_u32(&mut vorb, 0); // setup packet offset
                self.push_u32(&mut vorb, first_audio_packet_offset);
                vorb.extend_from_slice(&[0u8; 0x24 - 0x18]);
                self.push_u32(&mut vorb, 0xDEAD_BEEF); // uid
                vorb.push(self.blocksize_0_pow);
                vorb.push(self.blocksize_1_pow);
            }
            0x34 => {
                vorb.extend_from_slice(&[0u8; 0x18 - 0x4]);
                self.push_u32(&mut vorb, 0); // setup packet offset
                self.push_u32(&mut vorb, first_audio_packet_offset);
                vorb.extend_from_slice(&[0u8; 0x2C - 0x20]);
                self.push_u32(&mut vorb, 0xDEAD_BEEF); // uid
                vorb.push(self.blocksize_0_pow);
                vorb.push(self.blocksize_1_pow);
                vorb.extend_from_slice(&[0u8; 2]);
            }
            other => panic!("unsupported vorb layout {other:#x}"),
        }
        assert_eq!(vorb.len(), self.vorb_size as usize);

        let mut file = Vec::new();
        file.extend_from_slice(if self.little_endian { b"RIFF" } else { b"RIFX" });
        self.push_u32(&mut file, 0); // riff size, patched below
        file.extend_from_slice(b"WAVE");

        let fmt_size = if self.fmt_embedded { 0x42 } else { self.fmt_size };
        file.extend_from_slice(b"fmt ");
        self.push_u32(&mut file, fmt_size);
        self.push_u16(&mut file, 0xFFFF);
        self.push_u16(&mut file, self.channels);
        self.push_u32(&mut file, self.sample_rate);
        self.push_u32(&mut file, self.avg_bytes_per_second);
        self.push_u16(&mut file, 0); // block align
        self.push_u16(&mut file, 0); // bits per sample
        self.push_u16(&mut file, (fmt_size - 0x12) as u16); // extra size
        if fmt_size >= 0x18 {
            self.push_u16(&mut file, 0); // ext_unk
            self.push_u32(&mut file, 3); // subtype
        }
        if fmt_size == 0x28 {
            let mut guid = [
                1u8, 0, 0, 0, 0, 0, 0x10, 0, 0x80, 0, 0, 0xAA, 0, 0x38, 0x9B, 0x71,
            ];
            if !self.guid_ok {
                guid[0] = 2;
            }
            file.extend_from_slice(&guid);
        }
        if self.fmt_embedded {
            file.extend_from_slice(&vorb);
        }

        if let Some((loop_start, loop_end)) = self.smpl_loop {
            file.extend_from_slice(b"smpl");
            self.push_u32(&mut file, 0x34);
            file.extend_from_slice(&[0u8; 0x1C]);
            self.push_u32(&mut file, self.smpl_loop_count);
            file.extend_from_slice(&[0u8; 0x2C - 0x20]);
            self.push_u32(&mut file, loop_start);
            self.push_u32(&mut file, loop_end);
        }

        if !self.fmt_embedded {
            file.extend_from_slice(b"vorb");
            self.push_u32(&mut file, self.vorb_size);
            file.extend_from_slice(&vorb);
        }

        file.extend_from_slice(b"data");
        self.push_u32(&mut file, data.len() as u32);
        file.extend_from_slice(&data);

        let riff_size = file.len() as u32 - 8;
        let patch = if self.little_endian {
            riff_size.to_le_bytes()
        } else {
            riff_size.to_be_bytes()
        };
        file[4..8].copy_from_slice(&patch);
        file
    }
}

/// Compact (stripped) setup packet with one inline codebook, trivial
/// floor/residue/mapping, and the given mode blockflags.
fn stripped_setup(modes: &[bool]) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write_bits(0, 8).unwrap(); // codebook_count - 1
    write_inline_codebook(&mut w);
    write_compact_body(&mut w, modes);
    w.into_inner()
}

/// Same, but referencing the codebook library by the given 10-bit id.
fn library_setup(codebook_id: u32, modes: &[bool]) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write_bits(0, 8).unwrap(); // codebook_count - 1
    w.write_bits(codebook_id, 10).unwrap();
    write_compact_body(&mut w, modes);
    w.into_inner()
}

fn write_inline_codebook(w: &mut BitWriter) {
    w.write_bits(1, 4).unwrap(); // dimensions
    w.write_bits(4, 14).unwrap(); // entries
    w.write_bits(0, 1).unwrap(); // unordered
    w.write_bits(2, 3).unwrap(); // codeword length width
    w.write_bits(0, 1).unwrap(); // not sparse
    for _ in 0..4 {
        w.write_bits(1, 2).unwrap();
    }
    w.write_bits(0, 1).unwrap(); // lookup type 0
}

fn write_compact_body(w: &mut BitWriter, modes: &[bool]) {
    w.write_bits(0, 6).unwrap(); // floor count - 1
    w.write_bits(1, 5).unwrap(); // partitions
    w.write_bits(0, 4).unwrap(); // partition class
    w.write_bits(0, 3).unwrap(); // class dimension - 1
    w.write_bits(0, 2).unwrap(); // subclasses
    w.write_bits(0, 8).unwrap(); // subclass book + 1
    w.write_bits(0, 2).unwrap(); // multiplier - 1
    w.write_bits(1, 4).unwrap(); // rangebits
    w.write_bits(0, 1).unwrap(); // X value

    w.write_bits(0, 6).unwrap(); // residue count - 1
    w.write_bits(0, 2).unwrap(); // residue type
    w.write_bits(0, 24).unwrap(); // begin
    w.write_bits(128, 24).unwrap(); // end
    w.write_bits(7, 24).unwrap(); // partition size - 1
    w.write_bits(0, 6).unwrap(); // classifications - 1
    w.write_bits(0, 8).unwrap(); // classbook
    w.write_bits(0, 3).unwrap(); // cascade low
    w.write_bits(0, 1).unwrap(); // cascade flag

    w.write_bits(0, 6).unwrap(); // mapping count - 1
    w.write_bits(0, 1).unwrap(); // submaps flag
    w.write_bits(0, 1).unwrap(); // square polar flag
    w.write_bits(0, 2).unwrap(); // reserved
    w.write_bits(0, 8).unwrap(); // time config
    w.write_bits(0, 8).unwrap(); // floor number
    w.write_bits(0, 8).unwrap(); // residue number

    w.write_bits(modes.len() as u32 - 1, 6).unwrap();
    for &flag in modes {
        w.write_bits(flag as u32, 1).unwrap();
        w.write_bits(0, 8).unwrap(); // mapping number
    }
}

fn convert(file: &[u8], options: ConversionOptions) -> Result<Vec<u8>, Ww2OggError> {
    let mut converter = WwiseRiffVorbis::builder(Cursor::new(file), CodebookLibrary::empty())
        .options(options)
        .build()?;
    let mut out = Vec::new();
    converter.generate_ogg(&mut out)?;
    Ok(out)
}

fn convert_inline(file: &[u8]) -> Result<Vec<u8>, Ww2OggError> {
    convert(file, ConversionOptions::new().with_inline_codebooks(true))
}

#[derive(Debug)]
struct PageView {
    flags: u8,
    granule: u64,
    serial: u32,
    sequence: u32,
    payload: Vec<u8>,
}

fn parse_pages(ogg: &[u8]) -> Vec<PageView> {
    let mut pages = Vec::new();
    let mut offset = 0;
    while offset < ogg.len() {
        assert_eq!(&ogg[offset..offset + 4], b"OggS", "capture pattern");
        assert_eq!(ogg[offset + 4], 0, "version");

        let flags = ogg[offset + 5];
        let granule = u64::from_le_bytes(ogg[offset + 6..offset + 14].try_into().unwrap());
        let serial = u32::from_le_bytes(ogg[offset + 14..offset + 18].try_into().unwrap());
        let sequence = u32::from_le_bytes(ogg[offset + 18..offset + 22].try_into().unwrap());
        let stored_crc = u32::from_le_bytes(ogg[offset + 22..offset + 26].try_into().unwrap());

        let segments = ogg[offset + 26] as usize;
        let body: usize = ogg[offset + 27..offset + 27 + segments]
            .iter()
            .map(|&l| l as usize)
            .sum();
        let page_len = 27 + segments + body;

        let mut zeroed = ogg[offset..offset + page_len].to_vec();
        zeroed[22..26].fill(0);
        assert_eq!(
            ww2ogg::crc32::checksum(&zeroed),
            stored_crc,
            "page {sequence} CRC"
        );

        pages.push(PageView {
            flags,
            granule,
            serial,
            sequence,
            payload: ogg[offset + 27 + segments..offset + page_len].to_vec(),
        });
        offset += page_len;
    }
    pages
}

fn read_packets(ogg: &[u8]) -> Vec<Vec<u8>> {
    let mut reader = ogg::PacketReader::new(Cursor::new(ogg));
    let mut packets = Vec::new();
    while let Some(packet) = reader.read_packet().expect("ogg crate accepts our pages") {
        packets.push(packet.data);
    }
    packets
}

fn minimal_file() -> Vec<u8> {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.packets = vec![
        ((0..17u8).map(|i| i.wrapping_mul(2)).collect(), 384),
        (vec![0x10; 9], 768),
    ];
    builder.build()
}

#[test]
fn minimal_conversion_page_laws() {
    let ogg = convert_inline(&minimal_file()).unwrap();
    let pages = parse_pages(&ogg);

    assert_eq!(pages.len(), 5, "id, comment, setup, one page per packet");
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.serial, 1);
        assert_eq!(page.sequence, i as u32);
    }
    assert_eq!(pages[0].flags, 0b010, "first page of stream");
    assert_eq!(pages[1].flags, 0);
    assert_eq!(pages[2].flags, 0);
    assert_eq!(pages[3].flags, 0);
    assert_eq!(pages[4].flags, 0b100, "last page of stream");

    // Header pages carry granule 0; audio pages carry the source granules.
    assert_eq!(pages[0].granule, 0);
    assert_eq!(pages[1].granule, 0);
    assert_eq!(pages[2].granule, 0);
    assert_eq!(pages[3].granule, 384);
    assert_eq!(pages[4].granule, 768);

    // Standard packets pass through byte for byte.
    assert_eq!(
        pages[3].payload,
        (0..17u8).map(|i| i.wrapping_mul(2)).collect::<Vec<_>>()
    );
    assert_eq!(pages[4].payload, vec![0x10; 9]);
}

#[test]
fn header_packets_are_well_formed() {
    let ogg = convert_inline(&minimal_file()).unwrap();
    let packets = read_packets(&ogg);
    assert_eq!(packets.len(), 5);

    let id = &packets[0];
    assert_eq!(id[0], 1);
    assert_eq!(&id[1..7], b"vorbis");
    assert_eq!(u32::from_le_bytes(id[7..11].try_into().unwrap()), 0);
    assert_eq!(id[11], 1, "channels");
    assert_eq!(u32::from_le_bytes(id[12..16].try_into().unwrap()), 48000);
    assert_eq!(u32::from_le_bytes(id[16..20].try_into().unwrap()), 0);
    assert_eq!(
        u32::from_le_bytes(id[20..24].try_into().unwrap()),
        6000 * 8,
        "nominal bitrate"
    );
    assert_eq!(u32::from_le_bytes(id[24..28].try_into().unwrap()), 0);
    assert_eq!(id[28], 8 | 11 << 4, "blocksize pows");
    assert_eq!(id[29], 1, "framing");

    let comment = &packets[1];
    assert_eq!(comment[0], 3);
    assert_eq!(&comment[1..7], b"vorbis");
    let vendor_len = u32::from_le_bytes(comment[7..11].try_into().unwrap()) as usize;
    let vendor = std::str::from_utf8(&comment[11..11 + vendor_len]).unwrap();
    assert!(
        vendor.starts_with("converted from Audiokinetic Wwise by ww2ogg "),
        "vendor was {vendor:?}"
    );
    let comment_count =
        u32::from_le_bytes(comment[11 + vendor_len..15 + vendor_len].try_into().unwrap());
    assert_eq!(comment_count, 0);

    let setup = &packets[2];
    assert_eq!(setup[0], 5);
    assert_eq!(&setup[1..7], b"vorbis");
    assert_eq!(setup[7], 0, "codebook count - 1");
}

#[test]
fn loop_points_become_comments() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.sample_count = 5000;
    builder.smpl_loop = Some((1024, 0));
    builder.packets = vec![(vec![0x20; 4], 100)];
    let ogg = convert_inline(&builder.build()).unwrap();

    let packets = read_packets(&ogg);
    let comment = &packets[1];
    let vendor_len = u32::from_le_bytes(comment[7..11].try_into().unwrap()) as usize;
    let mut at = 11 + vendor_len;
    let count = u32::from_le_bytes(comment[at..at + 4].try_into().unwrap());
    assert_eq!(count, 2);
    at += 4;

    let mut comments = Vec::new();
    for _ in 0..2 {
        let len = u32::from_le_bytes(comment[at..at + 4].try_into().unwrap()) as usize;
        at += 4;
        comments.push(std::str::from_utf8(&comment[at..at + len]).unwrap().to_string());
        at += len;
    }
    // loop_end 0 normalizes to sample_count.
    assert_eq!(comments, vec!["LoopStart=1024", "LoopEnd=5000"]);
    assert_eq!(comment[at], 1, "framing");
}

#[test]
fn rifx_output_matches_riff() {
    let mut le = WemBuilder::new(0x34, stripped_setup(&[false]));
    le.packets = vec![(vec![0xA0, 0xA1, 0xA2], 256), (vec![0xB0; 5], 512)];
    let le_ogg = convert_inline(&le.build()).unwrap();

    let mut be = WemBuilder::new(0x34, stripped_setup(&[false]));
    be.little_endian = false;
    be.packets = vec![(vec![0xA0, 0xA1, 0xA2], 256), (vec![0xB0; 5], 512)];
    let be_ogg = convert_inline(&be.build()).unwrap();

    assert_eq!(le_ogg, be_ogg);
}

#[test]
fn granule_sentinel_becomes_one() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.packets = vec![(vec![0x42; 3], 0xFFFF_FFFF)];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);
    assert_eq!(pages[3].granule, 1);
}

#[test]
fn mod_packets_rebuild_window_bits() {
    // vorb 0x2A with an unrecognized signal value enables mod packets.
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false, true]));
    builder.packets = vec![
        (vec![0x00, 0xAB], 0), // mode 0, short window
        (vec![0x01, 0xCD], 0), // mode 1, long window
        (vec![0x00], 0),       // mode 0
    ];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);
    assert_eq!(pages.len(), 6);

    // Packet 2 gains: type 0, mode 1, prev 0 (packet 1 was short), next 0
    // (packet 3 is short), then the remaining 7 bits of its first byte and
    // the body.
    assert_eq!(pages[4].payload, vec![0x02, 0x68, 0x06]);

    // Packet 1: type 0, mode 0, remainder, body.
    assert_eq!(pages[3].payload, vec![0x00, 0x56, 0x01]);
}

#[test]
fn long_window_at_end_of_stream_peeks_false() {
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false, true]));
    builder.packets = vec![
        (vec![0x00, 0xAB], 0), // mode 0, short window
        (vec![0x01, 0xCD], 0), // mode 1, long window, nothing after it
    ];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);

    // No next packet to peek: next_blockflag comes out false, giving the
    // same bit layout as a short successor.
    assert_eq!(pages[4].payload, vec![0x02, 0x68, 0x06]);
    assert_eq!(pages[4].flags, 0b100);
}

#[test]
fn no_granule_synthesis_accumulates_quarter_blocks() {
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false, true]));
    builder.sample_count = 10000;
    builder.packets = vec![
        (vec![0x00, 0xAB], 0),
        (vec![0x01, 0xCD], 0),
        (vec![0x00], 0),
    ];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);

    // blocksizes 256/2048. First packet primes; second adds
    // (256 + 2048) / 4; the last writes sample_count.
    assert_eq!(pages[3].granule, 0);
    assert_eq!(pages[4].granule, 576);
    assert_eq!(pages[5].granule, 10000);
}

#[test]
fn no_granule_zero_sample_count_keeps_accumulated_value() {
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false]));
    builder.sample_count = 0;
    builder.packets = vec![(vec![0x00, 0x11], 0), (vec![0x00, 0x22], 0)];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);

    assert_eq!(pages[3].granule, 0);
    // (256 + 256) / 4, not forced to zero on the last packet.
    assert_eq!(pages[4].granule, 128);
}

#[test]
fn zero_size_mod_packet_emits_type_bit_only() {
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false]));
    builder.sample_count = 0;
    builder.packets = vec![(vec![0x00, 0x7F], 0), (Vec::new(), 0)];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);

    assert_eq!(pages.len(), 5);
    assert_eq!(pages[4].payload, vec![0x00], "one padded type bit");
    assert_eq!(pages[4].flags, 0b100);
}

#[test]
fn forced_packet_format_overrides_detection() {
    // Signal 0x4A would normally mean standard packets; force mod.
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false]));
    builder.mod_signal = 0x4A;
    builder.packets = vec![(vec![0x00, 0xAB], 0)];
    let file = builder.build();

    let standard = convert(
        &file,
        ConversionOptions::new().with_inline_codebooks(true),
    )
    .unwrap();
    let forced = convert(
        &file,
        ConversionOptions::new()
            .with_inline_codebooks(true)
            .with_force_packet_format(ForcePacketFormat::ForceModPackets),
    )
    .unwrap();

    let standard_pages = parse_pages(&standard);
    let forced_pages = parse_pages(&forced);
    assert_eq!(standard_pages[3].payload, vec![0x00, 0xAB]);
    assert_ne!(forced_pages[3].payload, standard_pages[3].payload);
}

#[test]
fn library_codebook_id_resolves_against_embedded_set() {
    let mut builder = WemBuilder::new(0x34, library_setup(0, &[false]));
    builder.packets = vec![(vec![0x04; 6], 64)];
    let file = builder.build();

    let mut converter = WwiseRiffVorbis::new(
        Cursor::new(&file[..]),
        CodebookLibrary::embedded_standard(),
    )
    .unwrap();
    let mut ogg = Vec::new();
    converter.generate_ogg(&mut ogg).unwrap();
    assert_eq!(parse_pages(&ogg).len(), 4);
}

#[test]
fn out_of_range_codebook_id() {
    let mut builder = WemBuilder::new(0x34, library_setup(999, &[false]));
    builder.packets = vec![(vec![0x04; 6], 64)];
    let file = builder.build();

    let mut converter = WwiseRiffVorbis::new(
        Cursor::new(&file[..]),
        CodebookLibrary::embedded_standard(),
    )
    .unwrap();
    let mut ogg = Vec::new();
    let result = converter.generate_ogg(&mut ogg);
    assert!(matches!(
        result,
        Err(Ww2OggError::InvalidCodebookId { id: 999 })
    ));
}

#[test]
fn full_setup_signature_suggests_flag() {
    // Library id 0x342 followed by the 14-bit 0x1590 marker means the file
    // actually holds full setup data.
    let mut w = BitWriter::new();
    w.write_bits(0, 8).unwrap();
    w.write_bits(0x342, 10).unwrap();
    w.write_bits(0x1590, 14).unwrap();
    w.write_bits(0, 8).unwrap(); // filler so the packet isn't empty
    let mut builder = WemBuilder::new(0x34, w.into_inner());
    builder.packets = vec![(vec![0x04; 6], 64)];
    let file = builder.build();

    let mut converter = WwiseRiffVorbis::new(
        Cursor::new(&file[..]),
        CodebookLibrary::embedded_standard(),
    )
    .unwrap();
    let mut ogg = Vec::new();
    let result = converter.generate_ogg(&mut ogg);
    match result {
        Err(Ww2OggError::Parse { message }) => {
            assert!(message.contains("--full-setup"), "message was {message:?}");
        }
        other => panic!("expected directed parse error, got {other:?}"),
    }
}

#[test]
fn header_triad_repack_is_identity() {
    // First conversion produces standard Vorbis headers; wrapping those in
    // a legacy 8-byte-framed container must convert back to the same bytes.
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.packets = vec![(vec![0x5A; 11], 300), (vec![0xC3; 7], 600)];
    let first = convert_inline(&builder.build()).unwrap();
    let packets = read_packets(&first);
    assert_eq!(packets.len(), 5);

    // Legacy container: vorb 0x28, triad + audio all behind 8-byte headers.
    let mut data = Vec::new();
    for packet in &packets[..3] {
        data.extend_from_slice(&(packet.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(packet);
    }
    let first_audio_packet_offset = data.len() as u32;
    for (packet, granule) in packets[3..].iter().zip([300u32, 600]) {
        data.extend_from_slice(&(packet.len() as u32).to_le_bytes());
        data.extend_from_slice(&granule.to_le_bytes());
        data.extend_from_slice(packet);
    }

    let mut vorb = Vec::new();
    vorb.extend_from_slice(&10000u32.to_le_bytes()); // sample count
    vorb.extend_from_slice(&[0u8; 0x18 - 0x4]);
    vorb.extend_from_slice(&0u32.to_le_bytes()); // setup packet offset
    vorb.extend_from_slice(&first_audio_packet_offset.to_le_bytes());
    vorb.extend_from_slice(&[0u8; 0x28 - 0x20]);
    assert_eq!(vorb.len(), 0x28);

    let mut file = Vec::new();
    file.extend_from_slice(b"RIFF");
    file.extend_from_slice(&0u32.to_le_bytes());
    file.extend_from_slice(b"WAVE");
    file.extend_from_slice(b"fmt ");
    file.extend_from_slice(&0x18u32.to_le_bytes());
    file.extend_from_slice(&0xFFFFu16.to_le_bytes());
    file.extend_from_slice(&1u16.to_le_bytes());
    file.extend_from_slice(&48000u32.to_le_bytes());
    file.extend_from_slice(&6000u32.to_le_bytes());
    file.extend_from_slice(&0u16.to_le_bytes());
    file.extend_from_slice(&0u16.to_le_bytes());
    file.extend_from_slice(&6u16.to_le_bytes());
    file.extend_from_slice(&0u16.to_le_bytes());
    file.extend_from_slice(&3u32.to_le_bytes());
    file.extend_from_slice(b"vorb");
    file.extend_from_slice(&0x28u32.to_le_bytes());
    file.extend_from_slice(&vorb);
    file.extend_from_slice(b"data");
    file.extend_from_slice(&(data.len() as u32).to_le_bytes());
    file.extend_from_slice(&data);
    let riff_size = (file.len() as u32 - 8).to_le_bytes();
    file[4..8].copy_from_slice(&riff_size);

    let second = convert(&file, ConversionOptions::new()).unwrap();
    assert_eq!(second, first);
}

#[test]
fn fmt_embedded_vorb_fields() {
    // fmt 0x42 without a vorb chunk: the vorb-equivalent fields live at
    // fmt + 0x18 and granules are synthesized.
    let mut builder = WemBuilder::new(0x2A, stripped_setup(&[false]));
    builder.fmt_embedded = true;
    builder.mod_signal = 0x4A; // standard packets
    builder.sample_count = 0;
    builder.packets = vec![(vec![0x00, 0x33], 0), (vec![0x00, 0x44], 0)];
    let ogg = convert_inline(&builder.build()).unwrap();
    let pages = parse_pages(&ogg);

    assert_eq!(pages.len(), 5);
    assert_eq!(pages[3].payload, vec![0x00, 0x33]);
    assert_eq!(pages[3].granule, 0);
    assert_eq!(pages[4].granule, 128);
}

#[test]
fn fmt_0x28_guid_is_checked() {
    let mut ok = WemBuilder::new(0x34, stripped_setup(&[false]));
    ok.fmt_size = 0x28;
    ok.packets = vec![(vec![0x00; 4], 10)];
    assert!(convert_inline(&ok.build()).is_ok());

    let mut bad = WemBuilder::new(0x34, stripped_setup(&[false]));
    bad.fmt_size = 0x28;
    bad.guid_ok = false;
    bad.packets = vec![(vec![0x00; 4], 10)];
    let result = convert_inline(&bad.build());
    match result {
        Err(Ww2OggError::Parse { message }) => assert!(message.contains("signature")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn fmt_0x12_has_no_extra_fields() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.fmt_size = 0x12;
    builder.packets = vec![(vec![0x00; 4], 10)];
    assert!(convert_inline(&builder.build()).is_ok());
}

#[test]
fn rejects_non_riff_input() {
    let result = convert_inline(b"JUNKJUNKJUNKJUNK");
    assert!(matches!(result, Err(Ww2OggError::Parse { .. })));
}

#[test]
fn rejects_truncated_riff() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.packets = vec![(vec![0x00; 4], 10)];
    let mut file = builder.build();
    file.truncate(file.len() - 3);
    let result = convert_inline(&file);
    match result {
        Err(Ww2OggError::Parse { message }) => assert!(message.contains("RIFF truncated")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn rejects_bad_codec_id() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.packets = vec![(vec![0x00; 4], 10)];
    let mut file = builder.build();
    // fmt codec id sits right after the chunk header.
    file[20] = 0x01;
    file[21] = 0x00;
    let result = convert_inline(&file);
    match result {
        Err(Ww2OggError::Parse { message }) => assert!(message.contains("bad codec id")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn rejects_multiple_loops() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.smpl_loop = Some((0, 100));
    builder.smpl_loop_count = 2;
    builder.packets = vec![(vec![0x00; 4], 10)];
    let result = convert_inline(&builder.build());
    match result {
        Err(Ww2OggError::Parse { message }) => assert!(message.contains("expected one loop")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn rejects_loop_out_of_range() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.sample_count = 1000;
    builder.smpl_loop = Some((2000, 0));
    builder.packets = vec![(vec![0x00; 4], 10)];
    let result = convert_inline(&builder.build());
    match result {
        Err(Ww2OggError::Parse { message }) => assert!(message.contains("loops out of range")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn rejects_misplaced_first_audio_packet() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.audio_offset_pad = 1;
    builder.packets = vec![(vec![0x00; 4], 10)];
    let result = convert_inline(&builder.build());
    match result {
        Err(Ww2OggError::Parse { message }) => {
            assert!(message.contains("first audio packet doesn't follow setup packet"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn rejects_truncated_audio_packet() {
    let mut builder = WemBuilder::new(0x34, stripped_setup(&[false]));
    builder.packets = vec![(vec![0x00; 4], 10)];
    let mut file = builder.build();
    // Inflate the audio packet's declared size past the data chunk.
    let size_offset = file.len() - 4 - 6;
    file[size_offset] = 0xFF;
    let result = convert_inline(&file);
    assert!(result.is_err());
}
