use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::detect::image::{Image, Pixel};
use crate::error::PpmError;

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 4096;

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, PpmError> {
    let mut b = [0u8; 1];
    match reader.read(&mut b)? {
        0 => Ok(None),
        _ => Ok(Some(b[0])),
    }
}

/// Next whitespace-delimited header token, skipping `#` comments. Consumes
/// the single whitespace byte that ends the token. A comment directly after
/// a token ends it, and its newline stands in for that whitespace.
fn token<R: Read>(reader: &mut R, what: &str) -> Result<String, PpmError> {
    let mut tok = String::new();
    while let Some(b) = read_byte(reader)? {
        if b == b'#' {
            while let Some(c) = read_byte(reader)? {
                if c == b'\n' {
                    break;
                }
            }
            if tok.is_empty() {
                continue;
            }
            break;
        }
        if b.is_ascii_whitespace() {
            if tok.is_empty() {
                continue;
            }
            break;
        }
        tok.push(b as char);
    }
    if tok.is_empty() {
        return Err(PpmError::MalformedHeader(format!("missing {what}")));
    }
    Ok(tok)
}

fn number<R: Read>(reader: &mut R, what: &str) -> Result<u32, PpmError> {
    let tok = token(reader, what)?;
    tok.parse()
        .map_err(|_| PpmError::MalformedHeader(format!("invalid {what} {tok:?}")))
}

/// Decode a binary PPM (`P6`) image.
pub fn read_ppm<R: BufRead>(mut reader: R) -> Result<Image, PpmError> {
    let magic = token(&mut reader, "magic")?;
    if magic != "P6" {
        return Err(PpmError::BadMagic(magic));
    }

    let width = number(&mut reader, "width")?;
    let height = number(&mut reader, "height")?;
    if width == 0 || height == 0 {
        return Err(PpmError::MalformedHeader(format!(
            "empty image {width} x {height}"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(PpmError::TooLarge { width, height });
    }

    let maxval = number(&mut reader, "maxval")?;
    if maxval != 255 {
        return Err(PpmError::UnsupportedMaxval(maxval));
    }

    let expected = width as usize * height as usize * 3;
    let mut raw = Vec::with_capacity(expected);
    reader.take(expected as u64).read_to_end(&mut raw)?;
    if raw.len() < expected {
        return Err(PpmError::Truncated {
            expected,
            actual: raw.len(),
        });
    }

    debug!(width, height, "read ppm");
    let data = raw
        .chunks_exact(3)
        .map(|c| Pixel::new(c[0], c[1], c[2]))
        .collect();
    Ok(Image {
        width: width as u16,
        height: height as u16,
        data,
    })
}

/// Encode an image as binary PPM (`P6`).
pub fn write_ppm<W: Write>(mut writer: W, img: &Image) -> Result<(), PpmError> {
    write!(writer, "P6\n{} {}\n255\n", img.width, img.height)?;
    let raw: Vec<u8> = img.data.iter().flat_map(|p| [p.r, p.g, p.b]).collect();
    writer.write_all(&raw)?;
    writer.flush()?;
    Ok(())
}

pub fn read_ppm_file(path: impl AsRef<Path>) -> Result<Image, PpmError> {
    read_ppm(BufReader::new(File::open(path)?))
}

pub fn write_ppm_file(path: impl AsRef<Path>, img: &Image) -> Result<(), PpmError> {
    write_ppm(BufWriter::new(File::create(path)?), img)
}
