//! Floor, residue, mapping, and mode rebuild for the setup header.
//!
//! Wwise keeps these sections in a compacted encoding; each field is read at
//! its compact width and re-emitted at the width the Vorbis I specification
//! mandates, validating every codebook/floor/residue/mapping index on the
//! way through.

use crate::bit_reader::BitRead;
use crate::bit_writer::BitWrite;
use crate::error::{Ww2OggError, Ww2OggResult};
use crate::vorbis_helpers::ilog;

/// Mode metadata recorded while rebuilding, needed later by the audio
/// packet rewriter.
#[derive(Debug, Default, Clone)]
pub(crate) struct ModeTable {
    /// Per-mode window flag: true selects the long block.
    pub blockflag: Vec<bool>,
    /// Width of a mode number in an audio packet: `ilog(mode_count - 1)`.
    pub bits: u8,
}

/// Rebuild everything after the codebooks and the time-domain placeholder:
/// floors, residues, mappings, modes, and the framing bit.
pub(crate) fn rewrite_setup_body<R: BitRead, W: BitWrite>(
    channels: u16,
    codebook_count: u32,
    input: &mut R,
    output: &mut W,
) -> Ww2OggResult<ModeTable> {
    let floor_count_less1 = input.read_bits(6)?;
    let floor_count = floor_count_less1 + 1;
    output.write_bits(floor_count_less1, 6)?;

    for _ in 0..floor_count {
        output.write_bits(1, 16)?; // floor type 1
        rewrite_floor(codebook_count, input, output)?;
    }

    let residue_count_less1 = input.read_bits(6)?;
    let residue_count = residue_count_less1 + 1;
    output.write_bits(residue_count_less1, 6)?;

    for _ in 0..residue_count {
        rewrite_residue(codebook_count, input, output)?;
    }

    let mapping_count_less1 = input.read_bits(6)?;
    let mapping_count = mapping_count_less1 + 1;
    output.write_bits(mapping_count_less1, 6)?;

    for _ in 0..mapping_count {
        rewrite_mapping(channels, floor_count, residue_count, input, output)?;
    }

    let mode_count_less1 = input.read_bits(6)?;
    let mode_count = mode_count_less1 + 1;
    output.write_bits(mode_count_less1, 6)?;

    let mut blockflag = Vec::with_capacity(mode_count as usize);
    for _ in 0..mode_count {
        let flag = input.read_bits(1)?;
        output.write_bits(flag, 1)?;
        blockflag.push(flag != 0);

        output.write_bits(0, 16)?; // windowtype
        output.write_bits(0, 16)?; // transformtype

        let mapping = input.read_bits(8)?;
        output.write_bits(mapping, 8)?;
        if mapping >= mapping_count {
            return Err(Ww2OggError::parse("invalid mode mapping"));
        }
    }

    output.write_bits(1, 1)?; // framing

    Ok(ModeTable {
        blockflag,
        bits: ilog(mode_count - 1),
    })
}

fn rewrite_floor<R: BitRead, W: BitWrite>(
    codebook_count: u32,
    input: &mut R,
    output: &mut W,
) -> Ww2OggResult<()> {
    let partitions = input.read_bits(5)?;
    output.write_bits(partitions, 5)?;

    let mut partition_class_list = Vec::with_capacity(partitions as usize);
    let mut maximum_class: i64 = -1;
    for _ in 0..partitions {
        let class = input.read_bits(4)?;
        output.write_bits(class, 4)?;
        maximum_class = maximum_class.max(class as i64);
        partition_class_list.push(class);
    }

    // [maximum_class + 1] class definitions; none at all when there are no
    // partitions.
    let mut class_dimensions = vec![0u32; (maximum_class + 1) as usize];
    for dimension in class_dimensions.iter_mut() {
        let dimensions_less1 = input.read_bits(3)?;
        output.write_bits(dimensions_less1, 3)?;
        *dimension = dimensions_less1 + 1;

        let subclasses = input.read_bits(2)?;
        output.write_bits(subclasses, 2)?;

        if subclasses != 0 {
            let masterbook = input.read_bits(8)?;
            output.write_bits(masterbook, 8)?;
            if masterbook >= codebook_count {
                return Err(Ww2OggError::parse("invalid floor1 masterbook"));
            }
        }

        for _ in 0..(1u32 << subclasses) {
            let subclass_book_plus1 = input.read_bits(8)?;
            output.write_bits(subclass_book_plus1, 8)?;
            let subclass_book = subclass_book_plus1 as i32 - 1;
            if subclass_book >= 0 && subclass_book as u32 >= codebook_count {
                return Err(Ww2OggError::parse("invalid floor1 subclass book"));
            }
        }
    }

    let multiplier_less1 = input.read_bits(2)?;
    output.write_bits(multiplier_less1, 2)?;

    let rangebits = input.read_bits(4)?;
    output.write_bits(rangebits, 4)?;

    for &class in &partition_class_list {
        for _ in 0..class_dimensions[class as usize] {
            let x = input.read_bits(rangebits as u8)?;
            output.write_bits(x, rangebits as u8)?;
        }
    }

    Ok(())
}

fn rewrite_residue<R: BitRead, W: BitWrite>(
    codebook_count: u32,
    input: &mut R,
    output: &mut W,
) -> Ww2OggResult<()> {
    // IN: 2 bit residue type, widened to 16 bits.
    let residue_type = input.read_bits(2)?;
    output.write_bits(residue_type, 16)?;
    if residue_type > 2 {
        return Err(Ww2OggError::parse("invalid residue type"));
    }

    let begin = input.read_bits(24)?;
    let end = input.read_bits(24)?;
    let partition_size_less1 = input.read_bits(24)?;
    let classifications_less1 = input.read_bits(6)?;
    let classbook = input.read_bits(8)?;
    let classifications = classifications_less1 + 1;

    output.write_bits(begin, 24)?;
    output.write_bits(end, 24)?;
    output.write_bits(partition_size_less1, 24)?;
    output.write_bits(classifications_less1, 6)?;
    output.write_bits(classbook, 8)?;

    if classbook >= codebook_count {
        return Err(Ww2OggError::parse("invalid residue classbook"));
    }

    let mut cascade = Vec::with_capacity(classifications as usize);
    for _ in 0..classifications {
        let low_bits = input.read_bits(3)?;
        output.write_bits(low_bits, 3)?;

        let bitflag = input.read_bits(1)?;
        output.write_bits(bitflag, 1)?;

        let high_bits = if bitflag != 0 {
            let high = input.read_bits(5)?;
            output.write_bits(high, 5)?;
            high
        } else {
            0
        };
        cascade.push(high_bits * 8 + low_bits);
    }

    for &bits in &cascade {
        for stage in 0..8 {
            if bits & (1 << stage) != 0 {
                let book = input.read_bits(8)?;
                output.write_bits(book, 8)?;
                if book >= codebook_count {
                    return Err(Ww2OggError::parse("invalid residue book"));
                }
            }
        }
    }

    Ok(())
}

fn rewrite_mapping<R: BitRead, W: BitWrite>(
    channels: u16,
    floor_count: u32,
    residue_count: u32,
    input: &mut R,
    output: &mut W,
) -> Ww2OggResult<()> {
    output.write_bits(0, 16)?; // mapping type 0

    let submaps_flag = input.read_bits(1)?;
    output.write_bits(submaps_flag, 1)?;

    let submaps = if submaps_flag != 0 {
        let submaps_less1 = input.read_bits(4)?;
        output.write_bits(submaps_less1, 4)?;
        submaps_less1 + 1
    } else {
        1
    };

    let square_polar_flag = input.read_bits(1)?;
    output.write_bits(square_polar_flag, 1)?;

    if square_polar_flag != 0 {
        let coupling_steps_less1 = input.read_bits(8)?;
        let coupling_steps = coupling_steps_less1 + 1;
        output.write_bits(coupling_steps_less1, 8)?;

        let coupling_bits = ilog(channels as u32 - 1);
        for _ in 0..coupling_steps {
            let magnitude = input.read_bits(coupling_bits)?;
            let angle = input.read_bits(coupling_bits)?;
            output.write_bits(magnitude, coupling_bits)?;
            output.write_bits(angle, coupling_bits)?;

            if angle == magnitude || magnitude >= channels as u32 || angle >= channels as u32 {
                return Err(Ww2OggError::parse("invalid coupling"));
            }
        }
    }

    let reserved = input.read_bits(2)?;
    output.write_bits(reserved, 2)?;
    if reserved != 0 {
        return Err(Ww2OggError::parse("mapping reserved field nonzero"));
    }

    if submaps > 1 {
        for _ in 0..channels {
            let mux = input.read_bits(4)?;
            output.write_bits(mux, 4)?;
            if mux >= submaps {
                return Err(Ww2OggError::parse("mapping_mux >= submaps"));
            }
        }
    }

    for _ in 0..submaps {
        let time_config = input.read_bits(8)?;
        output.write_bits(time_config, 8)?;

        let floor_number = input.read_bits(8)?;
        output.write_bits(floor_number, 8)?;
        if floor_number >= floor_count {
            return Err(Ww2OggError::parse("invalid floor mapping"));
        }

        let residue_number = input.read_bits(8)?;
        output.write_bits(residue_number, 8)?;
        if residue_number >= residue_count {
            return Err(Ww2OggError::parse("invalid residue mapping"));
        }
    }

    Ok(())
}
