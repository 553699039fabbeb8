//! PNG serialization with a physical-resolution (pHYs) chunk
//!
//! The image crate produces the container; the pHYs chunk is then spliced in
//! directly after the IHDR chunk so print software picks up the intended DPI.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{ExportError, ExportResult};
use crate::raster::Raster;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Signature (8) plus the complete IHDR chunk (25).
pub const HEADER_PREFIX_LEN: usize = 33;

/// Length (4) + type (4) + payload (9) + CRC (4).
pub const PHYS_CHUNK_LEN: usize = 21;

const PHYS_TYPE: &[u8; 4] = b"pHYs";
const UNIT_METER: u8 = 1;

const fn make_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = make_crc_table();

/// CRC-32 as used by PNG and zlib (reflected 0xEDB88320, pre/post inverted).
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;
    for &b in bytes {
        c = CRC_TABLE[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}

/// `round(dpi / 25.4 * 1000)`
pub fn pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / 25.4 * 1000.0).round() as u32
}

/// Complete pHYs chunk with equal X/Y density in pixels per meter.
pub fn phys_chunk(pixels_per_meter: u32) -> [u8; PHYS_CHUNK_LEN] {
    let mut chunk = [0u8; PHYS_CHUNK_LEN];
    chunk[0..4].copy_from_slice(&9u32.to_be_bytes());
    chunk[4..8].copy_from_slice(PHYS_TYPE);
    chunk[8..12].copy_from_slice(&pixels_per_meter.to_be_bytes());
    chunk[12..16].copy_from_slice(&pixels_per_meter.to_be_bytes());
    chunk[16] = UNIT_METER;
    let crc = crc32(&chunk[4..17]);
    chunk[17..21].copy_from_slice(&crc.to_be_bytes());
    chunk
}

/// Splice `chunk` in after the signature and IHDR.
pub fn inject_phys(encoded: &[u8], chunk: &[u8; PHYS_CHUNK_LEN]) -> ExportResult<Vec<u8>> {
    if encoded.len() < HEADER_PREFIX_LEN {
        return Err(ExportError::ChunkInjection { len: encoded.len() });
    }
    let mut out = Vec::with_capacity(encoded.len() + PHYS_CHUNK_LEN);
    out.extend_from_slice(&encoded[..HEADER_PREFIX_LEN]);
    out.extend_from_slice(chunk);
    out.extend_from_slice(&encoded[HEADER_PREFIX_LEN..]);
    Ok(out)
}

/// Plain RGBA8 PNG, no metadata.
pub fn encode_rgba(rgba: &[u8], width: u32, height: u32) -> ExportResult<Vec<u8>> {
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded).write_image(rgba, width, height, ExtendedColorType::Rgba8)?;
    Ok(encoded)
}

/// Encode the raster and tag it with `dpi`.
pub fn encode_with_dpi(raster: &Raster, dpi: u32) -> ExportResult<Vec<u8>> {
    let encoded = encode_rgba(&raster.to_rgba(), raster.width(), raster.height())?;
    let ppm = pixels_per_meter(dpi);
    let tagged = inject_phys(&encoded, &phys_chunk(ppm))?;
    log::debug!("Encoded {}x{} PNG, {} bytes, {} px/m", raster.width(), raster.height(), tagged.len(), ppm);
    Ok(tagged)
}

/// Density fields of a pHYs chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDensity {
    pub x: u32,
    pub y: u32,
    pub unit: u8,
}

/// Walk the chunk list and return the first pHYs payload, if any.
pub fn read_phys(png: &[u8]) -> Option<PhysicalDensity> {
    if png.len() < PNG_SIGNATURE.len() || png[..8] != PNG_SIGNATURE {
        return None;
    }
    let mut pos = PNG_SIGNATURE.len();
    while pos + 12 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().ok()?) as usize;
        let kind = &png[pos + 4..pos + 8];
        let data_start = pos + 8;
        let data_end = data_start.checked_add(len)?;
        if data_end + 4 > png.len() {
            return None;
        }
        if kind == PHYS_TYPE && len == 9 {
            let data = &png[data_start..data_end];
            return Some(PhysicalDensity {
                x: u32::from_be_bytes(data[0..4].try_into().ok()?),
                y: u32::from_be_bytes(data[4..8].try_into().ok()?),
                unit: data[8],
            });
        }
        if kind == b"IEND" {
            return None;
        }
        pos = data_end + 4;
    }
    None
}
