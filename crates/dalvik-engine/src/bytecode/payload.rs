//! Payload tables embedded in the instruction stream
//!
//! `packed-switch`, `sparse-switch` and `fill-array-data` reference a side
//! table through a signed 32-bit offset relative to the referencing
//! instruction. Each table starts with a 16-bit signature:
//!
//! ```text
//! packed-switch:   u16 0x0100, u16 size, s32 first_key, s32[size] targets
//! sparse-switch:   u16 0x0200, u16 size, s32[size] keys, s32[size] targets
//! fill-array-data: u16 0x0300, u16 width, u32 count, u8[width * count] data
//! ```
//!
//! All multi-unit quantities are little-endian across consecutive code units.

use crate::vm::{VmError, VmResult};

/// Signature of a packed-switch table
pub const PACKED_SWITCH_SIGNATURE: u16 = 0x0100;
/// Signature of a sparse-switch table
pub const SPARSE_SWITCH_SIGNATURE: u16 = 0x0200;
/// Signature of a fill-array-data table
pub const ARRAY_DATA_SIGNATURE: u16 = 0x0300;

#[inline]
fn unit(units: &[u16], index: usize) -> VmResult<u16> {
    units.get(index).copied().ok_or(VmError::TruncatedPayload)
}

#[inline]
fn read_u32(units: &[u16], index: usize) -> VmResult<u32> {
    Ok(unit(units, index)? as u32 | (unit(units, index + 1)? as u32) << 16)
}

fn check_signature(units: &[u16], expected: u16) -> VmResult<()> {
    let found = unit(units, 0)?;
    if found != expected {
        return Err(VmError::BadPayload { expected, found });
    }
    Ok(())
}

// ============================================================================
// packed-switch
// ============================================================================

/// Decoded view of a packed-switch table
#[derive(Debug, Clone, Copy)]
pub struct PackedSwitch<'a> {
    first_key: i32,
    size: usize,
    targets: &'a [u16],
}

impl<'a> PackedSwitch<'a> {
    /// Decode a table starting at `units[0]`
    pub fn parse(units: &'a [u16]) -> VmResult<Self> {
        check_signature(units, PACKED_SWITCH_SIGNATURE)?;
        let size = unit(units, 1)? as usize;
        let first_key = read_u32(units, 2)? as i32;
        let end = 4 + size * 2;
        if units.len() < end {
            return Err(VmError::TruncatedPayload);
        }
        Ok(Self {
            first_key,
            size,
            targets: &units[4..end],
        })
    }

    /// Number of cases
    pub fn size(&self) -> usize {
        self.size
    }

    /// Key of the first case
    pub fn first_key(&self) -> i32 {
        self.first_key
    }

    /// Branch offset of case `index`
    pub fn target(&self, index: usize) -> i32 {
        (self.targets[index * 2] as u32 | (self.targets[index * 2 + 1] as u32) << 16) as i32
    }

    /// Branch offset for `test`, or `None` when the key is outside the table
    pub fn lookup(&self, test: i32) -> Option<i32> {
        let index = test as i64 - self.first_key as i64;
        if index < 0 || index >= self.size as i64 {
            return None;
        }
        Some(self.target(index as usize))
    }

    /// Total table size in code units
    pub fn width(&self) -> usize {
        4 + self.size * 2
    }
}

// ============================================================================
// sparse-switch
// ============================================================================

/// Decoded view of a sparse-switch table
///
/// Keys are sorted ascending, so lookup is a binary search.
#[derive(Debug, Clone, Copy)]
pub struct SparseSwitch<'a> {
    size: usize,
    keys: &'a [u16],
    targets: &'a [u16],
}

impl<'a> SparseSwitch<'a> {
    /// Decode a table starting at `units[0]`
    pub fn parse(units: &'a [u16]) -> VmResult<Self> {
        check_signature(units, SPARSE_SWITCH_SIGNATURE)?;
        let size = unit(units, 1)? as usize;
        let keys_end = 2 + size * 2;
        let end = keys_end + size * 2;
        if units.len() < end {
            return Err(VmError::TruncatedPayload);
        }
        Ok(Self {
            size,
            keys: &units[2..keys_end],
            targets: &units[keys_end..end],
        })
    }

    /// Number of cases
    pub fn size(&self) -> usize {
        self.size
    }

    /// Key of case `index`
    pub fn key(&self, index: usize) -> i32 {
        (self.keys[index * 2] as u32 | (self.keys[index * 2 + 1] as u32) << 16) as i32
    }

    /// Branch offset of case `index`
    pub fn target(&self, index: usize) -> i32 {
        (self.targets[index * 2] as u32 | (self.targets[index * 2 + 1] as u32) << 16) as i32
    }

    /// Branch offset for `test`, or `None` when no key matches
    pub fn lookup(&self, test: i32) -> Option<i32> {
        let mut lo = 0usize;
        let mut hi = self.size;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.key(mid);
            match test.cmp(&key) {
                std::cmp::Ordering::Less => hi = mid,
                std::cmp::Ordering::Greater => lo = mid + 1,
                std::cmp::Ordering::Equal => return Some(self.target(mid)),
            }
        }
        None
    }

    /// Total table size in code units
    pub fn width(&self) -> usize {
        2 + self.size * 4
    }
}

// ============================================================================
// fill-array-data
// ============================================================================

/// Decoded view of a fill-array-data table
#[derive(Debug, Clone, Copy)]
pub struct ArrayData<'a> {
    element_width: u16,
    count: u32,
    data: &'a [u16],
}

impl<'a> ArrayData<'a> {
    /// Decode a table starting at `units[0]`
    pub fn parse(units: &'a [u16]) -> VmResult<Self> {
        check_signature(units, ARRAY_DATA_SIGNATURE)?;
        let element_width = unit(units, 1)?;
        if !matches!(element_width, 1 | 2 | 4 | 8) {
            return Err(VmError::BadElementWidth(element_width));
        }
        let count = read_u32(units, 2)?;
        let byte_len = element_width as usize * count as usize;
        let end = 4 + (byte_len + 1) / 2;
        if units.len() < end {
            return Err(VmError::TruncatedPayload);
        }
        Ok(Self {
            element_width,
            count,
            data: &units[4..end],
        })
    }

    /// Width of one element in bytes (1, 2, 4 or 8)
    pub fn element_width(&self) -> u16 {
        self.element_width
    }

    /// Number of elements
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    fn byte(&self, offset: usize) -> u8 {
        let u = self.data[offset / 2];
        if offset % 2 == 0 {
            u as u8
        } else {
            (u >> 8) as u8
        }
    }

    /// Raw little-endian bits of element `index`, zero-extended
    pub fn element_bits(&self, index: u32) -> u64 {
        let width = self.element_width as usize;
        let base = index as usize * width;
        (0..width).fold(0u64, |acc, i| acc | (self.byte(base + i) as u64) << (8 * i))
    }

    /// Total table size in code units (including the trailing pad byte)
    pub fn width(&self) -> usize {
        4 + (self.element_width as usize * self.count as usize + 1) / 2
    }
}

/// Size in code units of the payload starting at `units[0]`, if it is one
///
/// Payloads are encoded as `nop` with a non-zero high byte, so the
/// disassembler uses this to step over them.
pub fn payload_width(units: &[u16]) -> Option<usize> {
    match units.first().copied()? {
        PACKED_SWITCH_SIGNATURE => PackedSwitch::parse(units).ok().map(|t| t.width()),
        SPARSE_SWITCH_SIGNATURE => SparseSwitch::parse(units).ok().map(|t| t.width()),
        ARRAY_DATA_SIGNATURE => ArrayData::parse(units).ok().map(|t| t.width()),
        _ => None,
    }
}
