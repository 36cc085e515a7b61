//! DNS message encoding and decoding.
//!
//! Only what an A lookup needs: one question out, header plus answer
//! section back. Names in responses may use compression pointers.

use alloc::vec::Vec;

use super::{Answer, DnsResponse, HostName, Rcode, CLASS_IN, TYPE_A};
use crate::error::{NetworkError, Result};

const HEADER_LEN: usize = 12;
const FLAG_QR: u16 = 0x8000;
const FLAG_RD: u16 = 0x0100;
const POINTER_MASK: u8 = 0xC0;

/// Encode a single A/IN question into `buf`, returning the message length.
pub fn encode_query(id: u16, name: &HostName<'_>, recursion: bool, buf: &mut [u8]) -> Result<usize> {
    let name_len: usize = name.labels().map(|l| l.len() + 1).sum::<usize>() + 1;
    let total = HEADER_LEN + name_len + 4;
    if buf.len() < total {
        return Err(NetworkError::BufferTooSmall);
    }

    let flags: u16 = if recursion { FLAG_RD } else { 0 };
    buf[0..2].copy_from_slice(&id.to_be_bytes());
    buf[2..4].copy_from_slice(&flags.to_be_bytes());
    buf[4..6].copy_from_slice(&1u16.to_be_bytes());
    buf[6..12].fill(0);

    let mut pos = HEADER_LEN;
    for label in name.labels() {
        buf[pos] = label.len() as u8;
        pos += 1;
        buf[pos..pos + label.len()].copy_from_slice(label.as_bytes());
        pos += label.len();
    }
    buf[pos] = 0;
    pos += 1;
    buf[pos..pos + 2].copy_from_slice(&TYPE_A.to_be_bytes());
    buf[pos + 2..pos + 4].copy_from_slice(&CLASS_IN.to_be_bytes());
    Ok(pos + 4)
}

/// Decode a response message.
pub fn decode_response(msg: &[u8]) -> Result<DnsResponse> {
    if msg.len() < HEADER_LEN {
        return Err(NetworkError::ReceiveFailed);
    }
    let id = read_u16(msg, 0)?;
    let flags = read_u16(msg, 2)?;
    if flags & FLAG_QR == 0 {
        return Err(NetworkError::ReceiveFailed);
    }
    let rcode = Rcode((flags & 0x000F) as u8);
    let qdcount = read_u16(msg, 4)?;
    let ancount = read_u16(msg, 6)?;

    let mut pos = HEADER_LEN;
    for _ in 0..qdcount {
        pos = skip_name(msg, pos)?;
        pos += 4;
    }

    let mut answers = Vec::with_capacity(ancount as usize);
    for _ in 0..ancount {
        pos = skip_name(msg, pos)?;
        let rtype = read_u16(msg, pos)?;
        let class = read_u16(msg, pos + 2)?;
        let ttl = read_u32(msg, pos + 4)?;
        let rdlen = read_u16(msg, pos + 8)? as usize;
        pos += 10;
        let data = msg
            .get(pos..pos + rdlen)
            .ok_or(NetworkError::ReceiveFailed)?
            .to_vec();
        pos += rdlen;
        answers.push(Answer { rtype, class, ttl, data });
    }

    Ok(DnsResponse { id, rcode, answers })
}

/// Return the offset just past the name starting at `pos`.
fn skip_name(msg: &[u8], mut pos: usize) -> Result<usize> {
    loop {
        let len = *msg.get(pos).ok_or(NetworkError::ReceiveFailed)?;
        if len == 0 {
            return Ok(pos + 1);
        }
        if len & POINTER_MASK == POINTER_MASK {
            // A pointer always ends the name in place.
            if msg.get(pos + 1).is_none() {
                return Err(NetworkError::ReceiveFailed);
            }
            return Ok(pos + 2);
        }
        pos += 1 + len as usize;
    }
}

fn read_u16(msg: &[u8], at: usize) -> Result<u16> {
    msg.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(NetworkError::ReceiveFailed)
}

fn read_u32(msg: &[u8], at: usize) -> Result<u32> {
    msg.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(NetworkError::ReceiveFailed)
}
