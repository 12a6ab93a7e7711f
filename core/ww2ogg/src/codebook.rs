//! Vorbis codebook rewriting.
//!
//! Wwise strips setup-header codebooks down to a compact form and usually
//! moves them out of the file entirely, referencing entries in an external
//! "packed codebook" library by id. This module owns both halves of the
//! round trip back to standard Vorbis:
//!
//! - [`CodebookLibrary`]: an indexed, read-only store of stripped codebooks
//!   (embedded sets, an external file, or empty for fully inline files).
//! - [`rebuild_codebook`]: stripped form in, standard Vorbis codebook out,
//!   with every field re-emitted at its specification width.
//! - [`copy_codebook`]: bit-exact passthrough for codebooks already in
//!   standard form (inline full-setup files and the legacy header triad).
//!
//! # Picking a library
//!
//! Different games ship different libraries. If conversion fails with a size
//! mismatch or an invalid codebook id, or the output decodes to noise, try
//! the other embedded set or an external `packed_codebooks.bin` via
//! [`CodebookSource::External`].

use crate::bit_reader::{BitRead, BitSliceReader};
use crate::bit_writer::BitWrite;
use crate::error::{Ww2OggError, Ww2OggResult};
use crate::vorbis_helpers::{book_map_type1_quantvals, ilog};
use byteorder::{ByteOrder, LittleEndian};
use std::path::{Path, PathBuf};

/// The 24-bit "BCV" identifier opening every standard Vorbis codebook.
pub const CODEBOOK_IDENTIFIER: u32 = 0x564342;

/// Where the conversion takes its codebooks from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CodebookSource {
    /// The embedded standard-Vorbis library.
    #[default]
    EmbeddedStandard,
    /// The embedded aoTuV 6.03 library.
    EmbeddedAotuv,
    /// A packed codebook file on disk.
    External(PathBuf),
    /// No library; the file must carry its codebooks inline.
    InlineOnly,
}

impl CodebookSource {
    /// Load the selected library.
    pub fn load(&self) -> Ww2OggResult<CodebookLibrary> {
        match self {
            CodebookSource::EmbeddedStandard => Ok(CodebookLibrary::embedded_standard()),
            CodebookSource::EmbeddedAotuv => Ok(CodebookLibrary::embedded_aotuv()),
            CodebookSource::External(path) => CodebookLibrary::from_file(path),
            CodebookSource::InlineOnly => Ok(CodebookLibrary::empty()),
        }
    }
}

/// Indexed store of stripped codebooks.
///
/// Codebook `i` occupies `data[offsets[i]..offsets[i+1]]`; the offset table
/// carries one trailing sentinel. An empty library is valid and means the
/// codebooks live inline in the audio file.
#[derive(Clone)]
pub struct CodebookLibrary {
    data: Vec<u8>,
    offsets: Vec<u32>,
}

impl CodebookLibrary {
    /// Create an empty library.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// The embedded standard-Vorbis library.
    pub fn embedded_standard() -> Self {
        Self::from_static(crate::embedded_codebooks::standard::CODEBOOKS)
    }

    /// The embedded aoTuV 6.03 library.
    pub fn embedded_aotuv() -> Self {
        Self::from_static(crate::embedded_codebooks::aotuv603::CODEBOOKS)
    }

    fn from_static(codebooks: &[&[u8]]) -> Self {
        let mut data = Vec::new();
        let mut offsets = Vec::with_capacity(codebooks.len() + 1);
        for codebook in codebooks {
            offsets.push(data.len() as u32);
            data.extend_from_slice(codebook);
        }
        offsets.push(data.len() as u32);
        Self { data, offsets }
    }

    /// Load a packed codebook file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Ww2OggResult<Self> {
        let data = std::fs::read(&path)
            .map_err(|_| Ww2OggError::file_open(path.as_ref().display().to_string()))?;
        Self::from_bytes(&data)
    }

    /// Parse the packed codebook layout: concatenated codebook bytes, an
    /// offset table, and a trailing 32-bit pointer to the table's start. The
    /// pointer doubles as the final table entry, sentinelling the end of the
    /// last codebook.
    pub fn from_bytes(data: &[u8]) -> Ww2OggResult<Self> {
        let len = data.len();
        if len < 4 {
            return Err(Ww2OggError::parse("codebook library too short"));
        }

        let table_offset = LittleEndian::read_u32(&data[len - 4..]) as usize;
        if table_offset > len - 4 || !(len - table_offset).is_multiple_of(4) {
            return Err(Ww2OggError::parse("invalid codebook library offset table"));
        }

        let entry_count = (len - table_offset) / 4;
        let mut offsets = Vec::with_capacity(entry_count);
        for i in 0..entry_count {
            let offset = LittleEndian::read_u32(&data[table_offset + i * 4..]);
            if offset as usize > table_offset {
                return Err(Ww2OggError::parse("invalid codebook offset"));
            }
            offsets.push(offset);
        }

        Ok(Self {
            data: data[..table_offset].to_vec(),
            offsets,
        })
    }

    /// Number of codebooks in the library.
    pub fn codebook_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// The stripped bytes of codebook `index`.
    pub fn get_codebook(&self, index: usize) -> Ww2OggResult<&[u8]> {
        if index >= self.codebook_count() {
            return Err(Ww2OggError::invalid_codebook_id(index as i32));
        }

        let start = self.offsets[index] as usize;
        let end = self.offsets[index + 1] as usize;
        if start > end || end > self.data.len() {
            return Err(Ww2OggError::parse("invalid codebook range"));
        }
        Ok(&self.data[start..end])
    }

    /// Rebuild codebook `index` into standard form, enforcing that the
    /// stripped data spans exactly the library entry's length.
    pub fn rebuild<W: BitWrite>(&self, index: usize, output: &mut W) -> Ww2OggResult<()> {
        let stripped = self.get_codebook(index)?;
        let mut reader = BitSliceReader::new(stripped);
        rebuild_codebook(&mut reader, Some(stripped.len() as u32), output)
    }
}

/// Rewrite one stripped codebook into standard Vorbis form.
///
/// With `declared_size`, the number of bytes consumed must match it on
/// completion or [`Ww2OggError::SizeMismatch`] is raised; library entries
/// always carry their size, inline codebooks never do.
pub fn rebuild_codebook<R: BitRead, W: BitWrite>(
    input: &mut R,
    declared_size: Option<u32>,
    output: &mut W,
) -> Ww2OggResult<()> {
    // IN: 4 bit dimensions, 14 bit entry count.
    // OUT: 24 bit identifier, 16 bit dimensions, 24 bit entry count.
    let dimensions = input.read_bits(4)?;
    let entries = input.read_bits(14)?;
    output.write_bits(CODEBOOK_IDENTIFIER, 24)?;
    output.write_bits(dimensions, 16)?;
    output.write_bits(entries, 24)?;

    let ordered = input.read_bits(1)?;
    output.write_bits(ordered, 1)?;

    if ordered != 0 {
        copy_ordered_lengths(input, output, entries)?;
    } else {
        // IN: 3 bit codeword length length, 1 bit sparse flag.
        let codeword_length_length = input.read_bits(3)?;
        let sparse = input.read_bits(1)?;

        if codeword_length_length == 0 || codeword_length_length > 5 {
            return Err(Ww2OggError::parse("nonsense codeword length"));
        }

        // OUT: 1 bit sparse flag only; the length width is fixed at 5.
        output.write_bits(sparse, 1)?;

        for _ in 0..entries {
            let present = if sparse != 0 {
                let bit = input.read_bits(1)?;
                output.write_bits(bit, 1)?;
                bit != 0
            } else {
                true
            };

            if present {
                let codeword_length = input.read_bits(codeword_length_length as u8)?;
                output.write_bits(codeword_length, 5)?;
            }
        }
    }

    // IN: 1 bit lookup type, widened to 4 bits on the way out.
    let lookup_type = input.read_bits(1)?;
    output.write_bits(lookup_type, 4)?;
    if lookup_type == 1 {
        copy_lookup1(input, output, entries, dimensions)?;
    }

    if let Some(size) = declared_size
        && size != 0
    {
        let bytes_read = input.total_bits_read() / 8 + 1;
        if bytes_read != size as u64 {
            return Err(Ww2OggError::size_mismatch(size as u64, bytes_read));
        }
    }

    Ok(())
}

/// Copy one standard-form codebook through unchanged, validating its
/// structure along the way. Used for inline full-setup files and the legacy
/// header triad.
pub fn copy_codebook<R: BitRead, W: BitWrite>(input: &mut R, output: &mut W) -> Ww2OggResult<()> {
    let id = input.read_bits(24)?;
    if id != CODEBOOK_IDENTIFIER {
        return Err(Ww2OggError::parse("invalid codebook identifier"));
    }
    let dimensions = input.read_bits(16)?;
    let entries = input.read_bits(24)?;

    output.write_bits(id, 24)?;
    output.write_bits(dimensions, 16)?;
    output.write_bits(entries, 24)?;

    let ordered = input.read_bits(1)?;
    output.write_bits(ordered, 1)?;

    if ordered != 0 {
        copy_ordered_lengths(input, output, entries)?;
    } else {
        let sparse = input.read_bits(1)?;
        output.write_bits(sparse, 1)?;

        for _ in 0..entries {
            let present = if sparse != 0 {
                let bit = input.read_bits(1)?;
                output.write_bits(bit, 1)?;
                bit != 0
            } else {
                true
            };

            if present {
                let codeword_length = input.read_bits(5)?;
                output.write_bits(codeword_length, 5)?;
            }
        }
    }

    let lookup_type = input.read_bits(4)?;
    output.write_bits(lookup_type, 4)?;
    match lookup_type {
        0 => {}
        1 => copy_lookup1(input, output, entries, dimensions)?,
        2 => return Err(Ww2OggError::parse("didn't expect lookup type 2")),
        _ => return Err(Ww2OggError::parse("invalid lookup type")),
    }

    Ok(())
}

/// Ordered codeword lengths: a 5-bit initial length, then run lengths of
/// `ilog(entries - current)` bits until every entry is covered.
fn copy_ordered_lengths<R: BitRead, W: BitWrite>(
    input: &mut R,
    output: &mut W,
    entries: u32,
) -> Ww2OggResult<()> {
    let initial_length = input.read_bits(5)?;
    output.write_bits(initial_length, 5)?;

    let mut current_entry = 0u32;
    while current_entry < entries {
        let width = ilog(entries - current_entry);
        let number = input.read_bits(width)?;
        output.write_bits(number, width)?;
        current_entry += number;
    }
    if current_entry > entries {
        return Err(Ww2OggError::parse("current_entry out of range"));
    }
    Ok(())
}

/// Type-1 lookup table payload, identical on both sides.
fn copy_lookup1<R: BitRead, W: BitWrite>(
    input: &mut R,
    output: &mut W,
    entries: u32,
    dimensions: u32,
) -> Ww2OggResult<()> {
    let min = input.read_bits(32)?;
    let max = input.read_bits(32)?;
    let value_length = input.read_bits(4)?;
    let sequence_flag = input.read_bits(1)?;
    output.write_bits(min, 32)?;
    output.write_bits(max, 32)?;
    output.write_bits(value_length, 4)?;
    output.write_bits(sequence_flag, 1)?;

    let quantvals = book_map_type1_quantvals(entries, dimensions);
    for _ in 0..quantvals {
        let value = input.read_bits(value_length as u8 + 1)?;
        output.write_bits(value, value_length as u8 + 1)?;
    }
    Ok(())
}
