//! Deterministic RLP wire format for the block access list.
//!
//! Each entry is a list with a fixed field order: address, access_index,
//! reads, changes, balance?, nonce?, code?. Optional fields are prefixed by
//! a one-byte presence discriminator so absent and present encodings never
//! collide.

use crate::bal::BalError;
use crate::types::{
    AccessEntry, BalanceChange, BlockAccessList, CodeChange, NonceChange, SlotChange, SlotRead,
};
use alloy_rlp::{length_of_length, BufMut, Decodable, Encodable, Error as RlpError, Header};

const PRESENT: u8 = 1;
const ABSENT: u8 = 0;

pub fn encode_bal(bal: &BlockAccessList) -> Vec<u8> {
    let mut out = Vec::with_capacity(bal.length());
    bal.encode(&mut out);
    out
}

pub fn decode_bal(mut bytes: &[u8]) -> Result<BlockAccessList, BalError> {
    let bal = BlockAccessList::decode(&mut bytes).map_err(|e| BalError::Rlp(e.to_string()))?;
    if !bytes.is_empty() {
        return Err(BalError::Rlp("trailing bytes after access list".into()));
    }
    Ok(bal)
}

fn list_header(payload: usize, out: &mut dyn BufMut) {
    Header {
        list: true,
        payload_length: payload,
    }
    .encode(out);
}

fn decode_list_header(buf: &mut &[u8]) -> Result<usize, RlpError> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(RlpError::UnexpectedString);
    }
    if buf.len() < header.payload_length {
        return Err(RlpError::InputTooShort);
    }
    Ok(header.payload_length)
}

fn check_consumed(started: usize, buf: &[u8], payload: usize) -> Result<(), RlpError> {
    let consumed = started - buf.len();
    if consumed != payload {
        return Err(RlpError::ListLengthMismatch {
            expected: payload,
            got: consumed,
        });
    }
    Ok(())
}

// Byte-string and list helpers built on the header primitives. `Vec<u8>`
// would RLP-encode as a list of integers, so byte payloads go through the
// string form explicitly.

fn bytes_length(bytes: &[u8]) -> usize {
    bytes.length()
}

fn encode_bytes(bytes: &[u8], out: &mut dyn BufMut) {
    bytes.encode(out);
}

fn decode_bytes(buf: &mut &[u8]) -> Result<Vec<u8>, RlpError> {
    let header = Header::decode(buf)?;
    if header.list {
        return Err(RlpError::UnexpectedList);
    }
    if buf.len() < header.payload_length {
        return Err(RlpError::InputTooShort);
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(payload.to_vec())
}

fn decode_fixed<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], RlpError> {
    decode_bytes(buf)?
        .as_slice()
        .try_into()
        .map_err(|_| RlpError::UnexpectedLength)
}

fn vec_length<T: Encodable>(items: &[T]) -> usize {
    let payload: usize = items.iter().map(Encodable::length).sum();
    payload + length_of_length(payload)
}

fn encode_vec<T: Encodable>(items: &[T], out: &mut dyn BufMut) {
    let payload: usize = items.iter().map(Encodable::length).sum();
    list_header(payload, out);
    for item in items {
        item.encode(out);
    }
}

fn decode_vec<T: Decodable>(buf: &mut &[u8]) -> Result<Vec<T>, RlpError> {
    let payload = decode_list_header(buf)?;
    let started = buf.len();
    let mut items = Vec::new();
    while started - buf.len() < payload {
        items.push(T::decode(buf)?);
    }
    check_consumed(started, buf, payload)?;
    Ok(items)
}

fn option_length<T: Encodable>(value: &Option<T>) -> usize {
    match value {
        Some(v) => PRESENT.length() + v.length(),
        None => ABSENT.length(),
    }
}

fn encode_option<T: Encodable>(value: &Option<T>, out: &mut dyn BufMut) {
    match value {
        Some(v) => {
            PRESENT.encode(out);
            v.encode(out);
        }
        None => ABSENT.encode(out),
    }
}

fn decode_option<T: Decodable>(buf: &mut &[u8]) -> Result<Option<T>, RlpError> {
    match u8::decode(buf)? {
        ABSENT => Ok(None),
        PRESENT => Ok(Some(T::decode(buf)?)),
        _ => Err(RlpError::Custom("invalid presence discriminator")),
    }
}

impl Encodable for SlotRead {
    fn length(&self) -> usize {
        let payload = bytes_length(&self.slot) + bytes_length(&self.value);
        payload + length_of_length(payload)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        let payload = bytes_length(&self.slot) + bytes_length(&self.value);
        list_header(payload, out);
        encode_bytes(&self.slot, out);
        encode_bytes(&self.value, out);
    }
}

impl Decodable for SlotRead {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let payload = decode_list_header(buf)?;
        let started = buf.len();
        let read = Self {
            slot: decode_fixed(buf)?,
            value: decode_fixed(buf)?,
        };
        check_consumed(started, buf, payload)?;
        Ok(read)
    }
}

impl Encodable for SlotChange {
    fn length(&self) -> usize {
        let payload =
            bytes_length(&self.slot) + bytes_length(&self.old) + bytes_length(&self.new);
        payload + length_of_length(payload)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        let payload =
            bytes_length(&self.slot) + bytes_length(&self.old) + bytes_length(&self.new);
        list_header(payload, out);
        encode_bytes(&self.slot, out);
        encode_bytes(&self.old, out);
        encode_bytes(&self.new, out);
    }
}

impl Decodable for SlotChange {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let payload = decode_list_header(buf)?;
        let started = buf.len();
        let change = Self {
            slot: decode_fixed(buf)?,
            old: decode_fixed(buf)?,
            new: decode_fixed(buf)?,
        };
        check_consumed(started, buf, payload)?;
        Ok(change)
    }
}

impl Encodable for BalanceChange {
    fn length(&self) -> usize {
        let payload = bytes_length(&self.old) + bytes_length(&self.new);
        payload + length_of_length(payload)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        let payload = bytes_length(&self.old) + bytes_length(&self.new);
        list_header(payload, out);
        encode_bytes(&self.old, out);
        encode_bytes(&self.new, out);
    }
}

impl Decodable for BalanceChange {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let payload = decode_list_header(buf)?;
        let started = buf.len();
        let change = Self {
            old: decode_fixed(buf)?,
            new: decode_fixed(buf)?,
        };
        check_consumed(started, buf, payload)?;
        Ok(change)
    }
}

impl Encodable for NonceChange {
    fn length(&self) -> usize {
        let payload = self.old.length() + self.new.length();
        payload + length_of_length(payload)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        let payload = self.old.length() + self.new.length();
        list_header(payload, out);
        self.old.encode(out);
        self.new.encode(out);
    }
}

impl Decodable for NonceChange {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let payload = decode_list_header(buf)?;
        let started = buf.len();
        let change = Self {
            old: u64::decode(buf)?,
            new: u64::decode(buf)?,
        };
        check_consumed(started, buf, payload)?;
        Ok(change)
    }
}

impl Encodable for CodeChange {
    fn length(&self) -> usize {
        let payload = bytes_length(&self.old) + bytes_length(&self.new);
        payload + length_of_length(payload)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        let payload = bytes_length(&self.old) + bytes_length(&self.new);
        list_header(payload, out);
        encode_bytes(&self.old, out);
        encode_bytes(&self.new, out);
    }
}

impl Decodable for CodeChange {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let payload = decode_list_header(buf)?;
        let started = buf.len();
        let change = Self {
            old: decode_bytes(buf)?,
            new: decode_bytes(buf)?,
        };
        check_consumed(started, buf, payload)?;
        Ok(change)
    }
}

impl AccessEntry {
    fn payload_length(&self) -> usize {
        bytes_length(&self.address)
            + self.access_index.length()
            + vec_length(&self.storage_reads)
            + vec_length(&self.storage_changes)
            + option_length(&self.balance_change)
            + option_length(&self.nonce_change)
            + option_length(&self.code_change)
    }
}

impl Encodable for AccessEntry {
    fn length(&self) -> usize {
        let payload = self.payload_length();
        payload + length_of_length(payload)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length(), out);
        encode_bytes(&self.address, out);
        self.access_index.encode(out);
        encode_vec(&self.storage_reads, out);
        encode_vec(&self.storage_changes, out);
        encode_option(&self.balance_change, out);
        encode_option(&self.nonce_change, out);
        encode_option(&self.code_change, out);
    }
}

impl Decodable for AccessEntry {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let payload = decode_list_header(buf)?;
        let started = buf.len();
        let entry = Self {
            address: decode_fixed(buf)?,
            access_index: u64::decode(buf)?,
            storage_reads: decode_vec(buf)?,
            storage_changes: decode_vec(buf)?,
            balance_change: decode_option(buf)?,
            nonce_change: decode_option(buf)?,
            code_change: decode_option(buf)?,
        };
        check_consumed(started, buf, payload)?;
        Ok(entry)
    }
}

impl Encodable for BlockAccessList {
    fn length(&self) -> usize {
        vec_length(&self.entries)
    }

    fn encode(&self, out: &mut dyn BufMut) {
        encode_vec(&self.entries, out);
    }
}

impl Decodable for BlockAccessList {
    fn decode(buf: &mut &[u8]) -> Result<Self, RlpError> {
        Ok(Self {
            entries: decode_vec(buf)?,
        })
    }
}
