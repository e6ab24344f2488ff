/*
 Copyright (c) 2026 The remdet Developers

 This file is part of remdet

 remdet is free software: you can redistribute it and/or modify it
 under the terms of the GNU General Public License as published by the
 Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 remdet is distributed in the hope that it will be useful, but
 WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU General Public License for more details.
 You should have received a copy of the GNU General Public License
 along with remdet. If not, see <https://www.gnu.org/licenses/>.
*/

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use crate::model::{RemdetError, RemdetResult};
use crate::sample::DetSample;

/// Extensions recognised as headerless sample files when scanning folders.
pub const SAMPLE_EXTENSIONS: [&str; 4] = ["raw", "bin", "dat", "pcm"];

/// Byte order of 16-bit samples on disk. Ignored for 8-bit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// A sample type that can be read from and written to a raw byte stream.
pub trait RawSample: DetSample {
    const WIDTH: usize;

    /// Decode one sample from exactly `WIDTH` bytes.
    fn decode(bytes: &[u8], endian: Endianness) -> Self;

    fn encode_into(self, endian: Endianness, out: &mut Vec<u8>);
}

macro_rules! impl_raw_sample {
    ($t:ty) => {
        impl RawSample for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            #[inline]
            fn decode(bytes: &[u8], endian: Endianness) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                match endian {
                    Endianness::Little => <$t>::from_le_bytes(raw),
                    Endianness::Big => <$t>::from_be_bytes(raw),
                }
            }

            #[inline]
            fn encode_into(self, endian: Endianness, out: &mut Vec<u8>) {
                match endian {
                    Endianness::Little => out.extend_from_slice(&self.to_le_bytes()),
                    Endianness::Big => out.extend_from_slice(&self.to_be_bytes()),
                }
            }
        }
    };
}

impl_raw_sample!(i8);
impl_raw_sample!(u8);
impl_raw_sample!(i16);
impl_raw_sample!(u16);

/// Read a whole headerless sample stream.
pub fn read_samples<T: RawSample, R: Read>(mut reader: R, endian: Endianness) -> RemdetResult<Vec<T>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_samples(&bytes, endian)
}

pub fn decode_samples<T: RawSample>(bytes: &[u8], endian: Endianness) -> RemdetResult<Vec<T>> {
    if bytes.len() % T::WIDTH != 0 {
        return Err(RemdetError::Message(format!(
            "Input length {} is not a multiple of the {}-byte {} sample width",
            bytes.len(),
            T::WIDTH,
            T::SAMPLE_TYPE
        )));
    }
    Ok(bytes
        .chunks_exact(T::WIDTH)
        .map(|b| T::decode(b, endian))
        .collect())
}

pub fn write_samples<T: RawSample, W: Write>(
    mut writer: W,
    samples: &[T],
    endian: Endianness,
) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(samples.len() * T::WIDTH);
    for &s in samples {
        s.encode_into(endian, &mut bytes);
    }
    writer.write_all(&bytes)?;
    writer.flush()
}

/// Find all sample files in the provided paths, optionally recursing into directories
pub fn find_sample_files(paths: &[PathBuf], recurse: bool) -> io::Result<Vec<PathBuf>> {
    let mut file_paths = Vec::new();
    for path in paths {
        if path.is_dir() {
            if recurse {
                let entries: Vec<PathBuf> = fs::read_dir(path)?
                    .filter_map(|e| e.ok().map(|d| d.path()))
                    .collect();
                file_paths.extend(find_sample_files(&entries, recurse)?);
            } else {
                for entry in fs::read_dir(path)? {
                    let entry_path = entry?.path();
                    if is_sample_file(&entry_path) {
                        file_paths.push(entry_path.canonicalize()?);
                    }
                }
            }
        } else if is_sample_file(path) {
            file_paths.push(path.canonicalize()?);
        }
    }
    file_paths.sort();
    file_paths.dedup();
    Ok(file_paths)
}

/// Check if the provided path is a sample file based on its extension
pub fn is_sample_file(path: &Path) -> bool {
    if path.is_file()
        && let Some(ext) = path.extension()
        && let ext_lower = ext.to_ascii_lowercase().to_string_lossy().into_owned()
        && SAMPLE_EXTENSIONS.contains(&ext_lower.as_str())
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("remdet-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn byte_orders_decode_to_same_values() {
        let le = [0x34u8, 0x12, 0xff, 0xff];
        let be = [0x12u8, 0x34, 0xff, 0xff];
        let a: Vec<i16> = decode_samples(&le, Endianness::Little).unwrap();
        let b: Vec<i16> = decode_samples(&be, Endianness::Big).unwrap();
        assert_eq!(a, vec![0x1234, -1]);
        assert_eq!(a, b);
    }

    #[test]
    fn eight_bit_ignores_endianness() {
        let bytes = [0x80u8, 0x7f, 0x00];
        let a: Vec<i8> = decode_samples(&bytes, Endianness::Big).unwrap();
        let b: Vec<i8> = decode_samples(&bytes, Endianness::Little).unwrap();
        assert_eq!(a, vec![-128, 127, 0]);
        assert_eq!(a, b);
    }

    #[test]
    fn truncated_trailing_byte_rejected() {
        let bytes = [0u8, 1, 2];
        let r: RemdetResult<Vec<u16>> = decode_samples(&bytes, Endianness::Little);
        assert!(matches!(r, Err(RemdetError::Message(ref m)) if m.contains("not a multiple")));
    }

    #[test]
    fn write_then_read_big_endian() {
        let samples: Vec<u16> = vec![0, 1, 0xabcd, u16::MAX];
        let mut bytes = Vec::new();
        write_samples(&mut bytes, &samples, Endianness::Big).unwrap();
        assert_eq!(&bytes[4..6], &[0xab, 0xcd]);
        let back: Vec<u16> = read_samples(bytes.as_slice(), Endianness::Big).unwrap();
        assert_eq!(back, samples);
    }

    #[test]
    fn finds_sample_files_with_and_without_recursion() {
        let dir = scratch_dir("find");
        let nested = dir.join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.join("a.raw"), [0u8; 4]).unwrap();
        fs::write(dir.join("b.TXT"), [0u8; 4]).unwrap();
        fs::write(dir.join("c.Bin"), [0u8; 4]).unwrap();
        fs::write(nested.join("d.pcm"), [0u8; 4]).unwrap();

        let flat = find_sample_files(&[dir.clone()], false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.raw", "c.Bin"]);

        let deep = find_sample_files(&[dir.clone(), dir.join("a.raw")], true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().any(|p| p.ends_with("nested/d.pcm")));

        fs::remove_dir_all(&dir).unwrap();
    }
}
