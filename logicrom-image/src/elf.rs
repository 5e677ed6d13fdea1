use ::elf::abi::PT_LOAD;
use ::elf::endian::AnyEndian;
use ::elf::ElfBytes;
use tracing::trace;
use crate::{ImageError, Result};

/// Copy all the LOAD segments into a flat binary, like `objcopy -O binary`.
///
/// Segments are placed by physical address relative to the lowest one; gaps between them are
/// zero-filled. Segments with no file data (e.g. `.bss`) are skipped.
pub fn flatten(elf_data: &[u8]) -> Result<Vec<u8>> {
    let elf = ElfBytes::<AnyEndian>::minimal_parse(elf_data)?;
    let segments = elf.segments().ok_or(ImageError::NoLoadableSegments)?;

    let mut loads = Vec::new();
    for phdr in segments.iter() {
        if phdr.p_type == PT_LOAD && phdr.p_filesz > 0 {
            let data = elf.segment_data(&phdr)?;
            trace!("LOAD paddr={:#x} filesz={:#x}", phdr.p_paddr, phdr.p_filesz);
            loads.push((phdr.p_paddr, data));
        }
    }

    let base = loads.iter().map(|(paddr, _)| *paddr).min().ok_or(ImageError::NoLoadableSegments)?;
    let end = loads.iter()
        .map(|(paddr, data)| (paddr - base) as usize + data.len())
        .max()
        .unwrap_or(0);

    let mut bin = vec![0u8; end];
    for (paddr, data) in loads {
        let offset = (paddr - base) as usize;
        bin[offset..offset + data.len()].copy_from_slice(data);
    }

    Ok(bin)
}
