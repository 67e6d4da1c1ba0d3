//! SSH wire encodings (RFC 4251 Section 5)
//!
//! Only the three data types the key exchange needs are provided:
//! `string`, `mpint` and `name-list`. Integers are always non-negative here,
//! so an mpint whose first byte has the top bit set without a `0x00` pad is
//! treated as malformed rather than as a negative number.

use crate::{Error, Result};
use num_bigint::BigUint;
use num_traits::Zero;

/// Append a big-endian `uint32`
pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// Append an SSH `string`: 4-byte length followed by the raw bytes
pub fn put_string(buf: &mut Vec<u8>, data: &[u8]) {
    put_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

/// Append an SSH `mpint`
pub fn put_mpint(buf: &mut Vec<u8>, value: &BigUint) {
    put_string(buf, &mpint_body(value));
}

/// Append an SSH `name-list`
pub fn put_name_list(buf: &mut Vec<u8>, names: &[String]) {
    put_string(buf, names.join(",").as_bytes());
}

/// Encode a value as a standalone SSH `mpint`
pub fn encode_mpint(value: &BigUint) -> Vec<u8> {
    let mut buf = Vec::new();
    put_mpint(&mut buf, value);
    buf
}

/// Two's-complement body of an mpint, without the length prefix.
///
/// Zero has an empty body. A `0x00` byte is prepended when the top bit of
/// the most significant byte is set.
pub fn mpint_body(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }

    // to_bytes_be never carries leading zeros for non-zero values
    let bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        let mut padded = Vec::with_capacity(bytes.len() + 1);
        padded.push(0);
        padded.extend_from_slice(&bytes);
        padded
    } else {
        bytes
    }
}

/// Left-pad an unsigned value to exactly `width` big-endian bytes
pub fn fixed_width(value: &BigUint, width: usize) -> Result<Vec<u8>> {
    let bytes = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    };
    if bytes.len() > width {
        return Err(Error::InternalInvariantError(format!(
            "value of {} bytes does not fit in {} bytes",
            bytes.len(),
            width
        )));
    }

    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}

/// Decode a buffer that must contain exactly one canonical mpint
pub fn decode_mpint(data: &[u8]) -> Result<BigUint> {
    let mut reader = Reader::new(data);
    let value = reader.read_mpint()?;
    reader.finish()?;
    Ok(value)
}

/// Bounds-checked cursor over an SSH message
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::MalformedEncoding(format!(
                "{} truncated: need {} bytes at offset {}, have {}",
                what,
                len,
                self.offset,
                self.remaining()
            )));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1, "byte")?[0])
    }

    /// Read a big-endian `uint32`
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4, "uint32")?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read fixed-size raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len, "raw bytes")
    }

    /// Read an SSH `string`
    pub fn read_string(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len, "string")
    }

    /// Read an SSH `mpint`, rejecting any encoding that does not round-trip
    pub fn read_mpint(&mut self) -> Result<BigUint> {
        let body = self.read_string()?;
        let value = BigUint::from_bytes_be(body);
        if mpint_body(&value) != body {
            return Err(Error::MalformedEncoding(format!(
                "non-canonical mpint of {} bytes",
                body.len()
            )));
        }
        Ok(value)
    }

    /// Read an SSH `name-list`
    pub fn read_name_list(&mut self) -> Result<Vec<String>> {
        let raw = self.read_string()?;
        let list = std::str::from_utf8(raw)
            .map_err(|_| Error::MalformedEncoding("name-list is not valid UTF-8".into()))?;
        if list.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(list.split(',').map(String::from).collect())
        }
    }

    /// Require that every byte has been consumed
    pub fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::MalformedEncoding(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::RandBigInt;
    use num_traits::One;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_encode_mpint() {
        assert_eq!(encode_mpint(&BigUint::zero()), vec![0, 0, 0, 0]);
        assert_eq!(encode_mpint(&BigUint::from(0x1234u32)), vec![0, 0, 0, 2, 0x12, 0x34]);
        assert_eq!(
            encode_mpint(&BigUint::from(0x8000u32)),
            vec![0, 0, 0, 3, 0, 0x80, 0x00]
        );
    }

    #[test]
    fn test_mpint_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let values = vec![
            BigUint::zero(),
            BigUint::one(),
            BigUint::one() << 159usize,
            rng.gen_biguint(1024),
            BigUint::from_bytes_be(&[0xff, 0x01, 0x02, 0x03]),
        ];

        for value in values {
            let encoded = encode_mpint(&value);
            assert_eq!(decode_mpint(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_mpint_rejects_padding() {
        // 0x1234 with a superfluous leading zero
        let padded = [0, 0, 0, 3, 0x00, 0x12, 0x34];
        assert!(matches!(decode_mpint(&padded), Err(Error::MalformedEncoding(_))));

        // zero must be the empty string
        let zero = [0, 0, 0, 1, 0x00];
        assert!(matches!(decode_mpint(&zero), Err(Error::MalformedEncoding(_))));
    }

    #[test]
    fn test_mpint_rejects_negative() {
        let negative = [0, 0, 0, 2, 0x80, 0x00];
        assert!(matches!(decode_mpint(&negative), Err(Error::MalformedEncoding(_))));
    }

    #[test]
    fn test_mpint_rejects_truncation_and_trailing() {
        assert!(decode_mpint(&[0, 0, 0, 4, 0x12]).is_err());
        assert!(decode_mpint(&[0, 0, 0]).is_err());
        assert!(decode_mpint(&[0, 0, 0, 1, 0x12, 0xff]).is_err());
    }

    #[test]
    fn test_fixed_width() {
        let value = BigUint::from(0x0102u32);
        assert_eq!(fixed_width(&value, 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(fixed_width(&BigUint::zero(), 2).unwrap(), vec![0, 0]);
        assert!(fixed_width(&(BigUint::one() << 160usize), 20).is_err());
    }

    #[test]
    fn test_name_list_write_read() {
        let names = vec!["diffie-hellman-group1-sha1".to_string(), "ssh-dss".to_string()];
        let mut buf = Vec::new();
        put_name_list(&mut buf, &names);
        put_name_list(&mut buf, &[]);

        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_name_list().unwrap(), names);
        assert!(reader.read_name_list().unwrap().is_empty());
        reader.finish().unwrap();
    }
}
