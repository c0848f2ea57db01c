//! Just enough PNG parsing to recover image dimensions.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result, Stage};

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
// signature, chunk length, chunk type, width, height
const HEADER_LEN: usize = 8 + 4 + 4 + 4 + 4;

/// Reads the pixel height from the IHDR chunk of the PNG at `path`.
pub fn height(path: &Path) -> Result<u32> {
    let mut header = [0u8; HEADER_LEN];
    let mut file = File::open(path).map_err(Error::io(Stage::Output))?;
    file.read_exact(&mut header).map_err(|e| Error::InvalidImage {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    height_from_header(&header).map_err(|reason| Error::InvalidImage {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

fn height_from_header(header: &[u8; HEADER_LEN]) -> std::result::Result<u32, &'static str> {
    if header[..8] != SIGNATURE {
        return Err("missing PNG signature");
    }
    if &header[12..16] != b"IHDR" {
        return Err("first chunk is not IHDR");
    }
    let height = u32::from_be_bytes([header[20], header[21], header[22], header[23]]);
    if height == 0 {
        return Err("zero height");
    }
    Ok(height)
}
