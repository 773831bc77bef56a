/*
 * der.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pinhttp, a certificate-pinning HTTP/1.1 client.
 *
 * Pinhttp is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pinhttp is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pinhttp.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Just enough DER to read the subject common name of an X.509 certificate.
//!
//! Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm, signature }
//! tbsCertificate ::= SEQUENCE { [0] version OPTIONAL, serialNumber, signature, issuer,
//!                               validity, subject, ... }

const TAG_SEQUENCE: u8 = 0x30;
const TAG_SET: u8 = 0x31;
const TAG_OID: u8 = 0x06;
const TAG_VERSION: u8 = 0xa0;

const TAG_UTF8_STRING: u8 = 0x0c;
const TAG_PRINTABLE_STRING: u8 = 0x13;
const TAG_T61_STRING: u8 = 0x14;
const TAG_IA5_STRING: u8 = 0x16;
const TAG_BMP_STRING: u8 = 0x1e;

/// id-at-commonName (2.5.4.3)
const OID_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];

/// Cursor over a DER byte string.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn peek_tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Read one TLV; returns (tag, value).
    fn read(&mut self) -> Option<(u8, &'a [u8])> {
        let tag = *self.data.first()?;
        let first = *self.data.get(1)?;
        let mut pos = 2;
        let len = if first & 0x80 == 0 {
            first as usize
        } else {
            let n = (first & 0x7f) as usize;
            if n == 0 || n > 4 {
                return None;
            }
            let mut l = 0usize;
            for i in 0..n {
                l = (l << 8) | *self.data.get(pos + i)? as usize;
            }
            pos += n;
            l
        };
        let end = pos.checked_add(len)?;
        let value = self.data.get(pos..end)?;
        self.data = &self.data[end..];
        Some((tag, value))
    }

    fn expect(&mut self, tag: u8) -> Option<&'a [u8]> {
        match self.read()? {
            (t, v) if t == tag => Some(v),
            _ => None,
        }
    }
}

fn decode_string(tag: u8, value: &[u8]) -> Option<String> {
    match tag {
        TAG_UTF8_STRING | TAG_PRINTABLE_STRING | TAG_IA5_STRING => {
            std::str::from_utf8(value).ok().map(str::to_string)
        }
        // Teletex in practice carries Latin-1.
        TAG_T61_STRING => Some(value.iter().map(|&b| b as char).collect()),
        TAG_BMP_STRING => {
            if value.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = value
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        _ => None,
    }
}

/// First commonName attribute in a Name (SEQUENCE OF SET OF AttributeTypeAndValue).
fn common_name_in(name: &[u8]) -> Option<String> {
    let mut rdns = Reader::new(name);
    while !rdns.is_empty() {
        let set = rdns.expect(TAG_SET)?;
        let mut atvs = Reader::new(set);
        while !atvs.is_empty() {
            let atv = atvs.expect(TAG_SEQUENCE)?;
            let mut r = Reader::new(atv);
            let oid = r.expect(TAG_OID)?;
            if oid == OID_COMMON_NAME {
                let (tag, value) = r.read()?;
                return decode_string(tag, value);
            }
        }
    }
    None
}

/// Subject common name of a DER-encoded certificate, or None if absent or unparseable.
pub fn subject_common_name(cert: &[u8]) -> Option<String> {
    let mut outer = Reader::new(cert);
    let certificate = outer.expect(TAG_SEQUENCE)?;
    let mut c = Reader::new(certificate);
    let tbs = c.expect(TAG_SEQUENCE)?;
    let mut t = Reader::new(tbs);
    if t.peek_tag()? == TAG_VERSION {
        t.read()?;
    }
    t.read()?; // serialNumber
    t.read()?; // signature
    t.read()?; // issuer
    t.read()?; // validity
    let subject = t.expect(TAG_SEQUENCE)?;
    common_name_in(subject)
}
