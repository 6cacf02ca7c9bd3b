//! COCO run-length mask decoding
//!
//! Counts alternate between background and foreground runs, starting with
//! background, and walk the mask in column-major order. The compressed string
//! form packs each count into 5-bit groups offset from `'0'`, and from the
//! fourth count on stores each as a delta from the count two positions back.

use std::io;

use crate::types::{Counts, RleMask};

/// A decoded binary mask stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    pub height: usize,
    pub width: usize,
    data: Vec<u8>,
}

impl BinaryMask {
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.height && col < self.width {
            self.data.get(row * self.width + col).copied()
        } else {
            None
        }
    }

    /// Iterate `(row, col)` of every foreground pixel
    pub fn foreground(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value != 0)
            .map(move |(idx, _)| (idx / width, idx % width))
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Decode an RLE mask into an explicit binary mask.
///
/// The runs must cover exactly `height * width` pixels.
pub fn decode(rle: &RleMask) -> io::Result<BinaryMask> {
    let height = rle.height() as usize;
    let width = rle.width() as usize;

    let counts = match &rle.counts {
        Counts::Uncompressed(counts) => counts.clone(),
        Counts::Compressed(s) => decode_counts_string(s)?,
    };

    let covered: u64 = counts.iter().map(|&c| c as u64).sum();
    let total = height
        .checked_mul(width)
        .filter(|&total| total as u64 == covered)
        .ok_or_else(|| {
            invalid_data(format!(
                "RLE runs cover {} pixels but mask is {}x{}",
                covered, height, width
            ))
        })?;

    let mut data = vec![0u8; total];
    let mut pos = 0usize;
    let mut value = 0u8;

    for count in counts {
        let end = pos + count as usize;
        if value == 1 {
            // Column-major position to row-major storage
            for p in pos..end {
                let (col, row) = (p / height, p % height);
                data[row * width + col] = 1;
            }
        }
        pos = end;
        value = 1 - value;
    }

    Ok(BinaryMask {
        height,
        width,
        data,
    })
}

/// Decode the compressed counts string used by pycocotools
pub fn decode_counts_string(s: &str) -> io::Result<Vec<u32>> {
    let bytes = s.as_bytes();
    let mut counts: Vec<i64> = Vec::new();
    let mut p = 0;

    while p < bytes.len() {
        let mut x: i64 = 0;
        let mut k = 0;
        let mut more = true;
        while more {
            let byte = *bytes
                .get(p)
                .ok_or_else(|| invalid_data("truncated RLE counts string".to_string()))?;
            if !(48..48 + 64).contains(&byte) {
                return Err(invalid_data(format!(
                    "invalid character {:?} in RLE counts string",
                    byte as char
                )));
            }
            if k >= 12 {
                return Err(invalid_data("RLE count exceeds 64 bits".to_string()));
            }
            let c = (byte - 48) as i64;
            x |= (c & 0x1f) << (5 * k);
            more = c & 0x20 != 0;
            p += 1;
            k += 1;
            if !more && c & 0x10 != 0 {
                x |= -1i64 << (5 * k);
            }
        }
        if counts.len() > 2 {
            x += counts[counts.len() - 2];
        }
        counts.push(x);
    }

    counts
        .into_iter()
        .map(|c| u32::try_from(c).map_err(|_| invalid_data(format!("invalid RLE count {}", c))))
        .collect()
}
