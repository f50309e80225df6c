/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The byte-level contract between the coordinator and a block worker.
//!
//! Inbound (coordinator to worker): `rows * inner` raw bytes of the row band immediately
//! followed by `inner * cols` raw bytes of the column band. No header, no framing: both
//! lengths are implied by the block shape.
//!
//! Outbound (worker to coordinator): `rows * cols` signed 64-bit little-endian integers in
//! row-major order, again without framing.

use std::io::{ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Integer type carried on the outbound channel.
pub type WireInt = i64;

/// Width in bytes of one outbound integer.
pub const WIRE_INT_BYTES: usize = std::mem::size_of::<WireInt>();

/// Which part of the exchange a transfer error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    RowBand,
    ColumnBand,
    Results,
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RowBand => "row band",
            Self::ColumnBand => "column band",
            Self::Results => "result block",
        };
        f.write_str(name)
    }
}

/// Error type for channel transfers.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The stream ended before the full payload arrived. Counts are in bytes for bands and
    /// in integers for result blocks.
    #[error("short transfer of the {payload}: expected {expected}, received {received}")]
    Short {
        payload: Payload,
        expected: usize,
        received: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fill `buf` completely from `reader`.
///
/// Unlike `Read::read_exact`, a premature end of stream reports how many bytes did
/// arrive.
pub fn read_payload<R: Read + ?Sized>(
    reader: &mut R,
    payload: Payload,
    buf: &mut [u8],
) -> Result<(), TransferError> {
    let mut received = 0;
    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(TransferError::Short {
                    payload,
                    expected: buf.len(),
                    received,
                })
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Write a result block one integer at a time.
pub fn write_results<W: Write + ?Sized>(
    writer: &mut W,
    results: &[WireInt],
) -> Result<(), TransferError> {
    for &value in results {
        writer.write_i64::<LittleEndian>(value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read exactly `dst.len()` integers into `dst`.
pub fn read_results<R: Read + ?Sized>(
    reader: &mut R,
    dst: &mut [WireInt],
) -> Result<(), TransferError> {
    let expected = dst.len();
    for (received, slot) in dst.iter_mut().enumerate() {
        *slot = match reader.read_i64::<LittleEndian>() {
            Ok(value) => value,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(TransferError::Short {
                    payload: Payload::Results,
                    expected,
                    received,
                })
            }
            Err(e) => return Err(e.into()),
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn payload_reads_across_chunks() {
        // A reader that hands out one byte per call.
        struct Trickle(Vec<u8>);
        impl Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0.remove(0);
                Ok(1)
            }
        }

        let mut reader = Trickle(b"abcdef".to_vec());
        let mut first = [0u8; 4];
        read_payload(&mut reader, Payload::RowBand, &mut first).unwrap();
        assert_eq!(&first, b"abcd");

        let mut second = [0u8; 4];
        let err = read_payload(&mut reader, Payload::ColumnBand, &mut second).unwrap_err();
        match err {
            TransferError::Short {
                payload,
                expected,
                received,
            } => {
                assert_eq!(payload, Payload::ColumnBand);
                assert_eq!(expected, 4);
                assert_eq!(received, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn results_are_little_endian_i64() {
        let mut bytes = Vec::new();
        write_results(&mut bytes, &[1, -2, 0x0102_0304]).unwrap();
        assert_eq!(bytes.len(), 3 * WIRE_INT_BYTES);
        assert_eq!(&bytes[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..16], &[0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[16..20], &[4, 3, 2, 1]);

        let mut dst = [0; 3];
        read_results(&mut Cursor::new(bytes), &mut dst).unwrap();
        assert_eq!(dst, [1, -2, 0x0102_0304]);
    }

    #[test]
    fn short_result_block_counts_whole_integers() {
        let mut bytes = Vec::new();
        write_results(&mut bytes, &[7, 8]).unwrap();
        // Half of a third integer.
        bytes.extend_from_slice(&[0, 0, 0, 0]);

        let mut dst = [0; 4];
        let err = read_results(&mut Cursor::new(bytes), &mut dst).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Short {
                payload: Payload::Results,
                expected: 4,
                received: 2,
            }
        ));
        assert!(err.to_string().contains("result block"));
    }
}
