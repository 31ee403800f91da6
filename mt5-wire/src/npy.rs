// Location: mt5-wire/src/npy.rs
// Purpose: NumPy `.npy` (format 1.0) codec for rate and tick series
// Why: Time series are large; they travel as packed structured arrays that
//      numpy.load() reads directly instead of going through JSON

use crate::errors::WireError;
use crate::types::{Rate, Tick};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const PREAMBLE_LEN: usize = 10;
const ALIGNMENT: usize = 64;

/// A fixed-layout record that can be stored in a structured `.npy` array
pub trait ArrayRecord: Sized {
    /// `(name, dtype)` pairs in storage order, e.g. `("time", "<i8")`
    const FIELDS: &'static [(&'static str, &'static str)];
    /// Packed size of one record in bytes
    const ITEM_SIZE: usize;

    fn write_le(&self, out: &mut Vec<u8>);
    fn read_le(reader: &mut LeReader<'_>) -> Self;
}

/// Little-endian cursor over one packed record
pub struct LeReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> LeReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = self.buf.get(self.pos..self.pos + N) {
            out.copy_from_slice(src);
        }
        self.pos += N;
        out
    }

    pub fn i64(&mut self) -> i64 {
        i64::from_le_bytes(self.take())
    }

    pub fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    pub fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }

    pub fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }
}

impl ArrayRecord for Rate {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("time", "<i8"),
        ("open", "<f8"),
        ("high", "<f8"),
        ("low", "<f8"),
        ("close", "<f8"),
        ("tick_volume", "<u8"),
        ("spread", "<i4"),
        ("real_volume", "<u8"),
    ];
    const ITEM_SIZE: usize = 60;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&self.open.to_le_bytes());
        out.extend_from_slice(&self.high.to_le_bytes());
        out.extend_from_slice(&self.low.to_le_bytes());
        out.extend_from_slice(&self.close.to_le_bytes());
        out.extend_from_slice(&self.tick_volume.to_le_bytes());
        out.extend_from_slice(&self.spread.to_le_bytes());
        out.extend_from_slice(&self.real_volume.to_le_bytes());
    }

    fn read_le(r: &mut LeReader<'_>) -> Self {
        Self {
            time: r.i64(),
            open: r.f64(),
            high: r.f64(),
            low: r.f64(),
            close: r.f64(),
            tick_volume: r.u64(),
            spread: r.i32(),
            real_volume: r.u64(),
        }
    }
}

impl ArrayRecord for Tick {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("time", "<i8"),
        ("bid", "<f8"),
        ("ask", "<f8"),
        ("last", "<f8"),
        ("volume", "<u8"),
        ("time_msc", "<i8"),
        ("flags", "<u4"),
        ("volume_real", "<f8"),
    ];
    const ITEM_SIZE: usize = 60;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&self.bid.to_le_bytes());
        out.extend_from_slice(&self.ask.to_le_bytes());
        out.extend_from_slice(&self.last.to_le_bytes());
        out.extend_from_slice(&self.volume.to_le_bytes());
        out.extend_from_slice(&self.time_msc.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.volume_real.to_le_bytes());
    }

    fn read_le(r: &mut LeReader<'_>) -> Self {
        Self {
            time: r.i64(),
            bid: r.f64(),
            ask: r.f64(),
            last: r.f64(),
            volume: r.u64(),
            time_msc: r.i64(),
            flags: r.u32(),
            volume_real: r.f64(),
        }
    }
}

fn descr<T: ArrayRecord>() -> String {
    let fields: Vec<String> = T::FIELDS
        .iter()
        .map(|(name, dtype)| format!("('{}', '{}')", name, dtype))
        .collect();
    format!("[{}]", fields.join(", "))
}

/// Encode records as a one-dimensional structured `.npy` array
pub fn encode<T: ArrayRecord>(records: &[T]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': {}, 'fortran_order': False, 'shape': ({},), }}",
        descr::<T>(),
        records.len()
    );
    // Pad with spaces so the data section starts on an aligned offset; the
    // header always ends with a newline.
    let unpadded = PREAMBLE_LEN + header.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(PREAMBLE_LEN + header.len() + records.len() * T::ITEM_SIZE);
    out.extend_from_slice(MAGIC);
    out.push(1);
    out.push(0);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for record in records {
        record.write_le(&mut out);
    }
    out
}

/// Decode a `.npy` array produced by [`encode`] (or by numpy with the same dtype)
pub fn decode<T: ArrayRecord>(bytes: &[u8]) -> Result<Vec<T>, WireError> {
    if bytes.len() < PREAMBLE_LEN || &bytes[..6] != MAGIC {
        return Err(WireError::Array("missing .npy magic".to_string()));
    }
    if bytes[6] != 1 {
        return Err(WireError::Array(format!(
            "unsupported .npy version {}.{}",
            bytes[6], bytes[7]
        )));
    }

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = PREAMBLE_LEN + header_len;
    let header = bytes
        .get(PREAMBLE_LEN..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| WireError::Array("truncated header".to_string()))?;

    let expected = descr::<T>();
    if !header.contains(&expected) {
        return Err(WireError::Array(format!(
            "dtype mismatch: expected {}",
            expected
        )));
    }
    if header.contains("'fortran_order': True") {
        return Err(WireError::Array("fortran order is not supported".to_string()));
    }

    let count = parse_shape(header)?;
    let data = &bytes[data_start..];
    if data.len() != count * T::ITEM_SIZE {
        return Err(WireError::Array(format!(
            "expected {} bytes of data for {} records, found {}",
            count * T::ITEM_SIZE,
            count,
            data.len()
        )));
    }

    Ok(data
        .chunks_exact(T::ITEM_SIZE)
        .map(|chunk| T::read_le(&mut LeReader::new(chunk)))
        .collect())
}

fn parse_shape(header: &str) -> Result<usize, WireError> {
    let start = header
        .find("'shape': (")
        .map(|i| i + "'shape': (".len())
        .ok_or_else(|| WireError::Array("header has no shape".to_string()))?;
    let rest = &header[start..];
    let end = rest
        .find(|c: char| c == ',' || c == ')')
        .ok_or_else(|| WireError::Array("unterminated shape".to_string()))?;
    rest[..end]
        .trim()
        .parse()
        .map_err(|_| WireError::Array(format!("invalid shape '{}'", &rest[..end])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rates() -> Vec<Rate> {
        vec![
            Rate {
                time: 1_700_000_000,
                open: 1.0850,
                high: 1.0870,
                low: 1.0841,
                close: 1.0862,
                tick_volume: 1532,
                spread: 7,
                real_volume: 0,
            },
            Rate {
                time: 1_700_000_060,
                open: 1.0862,
                high: 1.0866,
                low: 1.0855,
                close: 1.0858,
                tick_volume: 980,
                spread: 6,
                real_volume: 0,
            },
        ]
    }

    #[test]
    fn test_header_is_aligned() {
        let bytes = encode(&sample_rates());
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;

        assert_eq!(&bytes[..6], MAGIC);
        assert_eq!((PREAMBLE_LEN + header_len) % ALIGNMENT, 0);
        assert_eq!(bytes[PREAMBLE_LEN + header_len - 1], b'\n');
        assert_eq!(bytes.len(), PREAMBLE_LEN + header_len + 2 * Rate::ITEM_SIZE);
    }

    #[test]
    fn test_header_describes_rate_layout() {
        let bytes = encode(&sample_rates());
        let header = std::str::from_utf8(&bytes[PREAMBLE_LEN..]).unwrap_or_default();
        let header = &header[..header.find('\n').unwrap()];

        assert!(header.starts_with("{'descr': [('time', '<i8'), ('open', '<f8')"));
        assert!(header.contains("('spread', '<i4')"));
        assert!(header.contains("'shape': (2,)"));
    }

    #[test]
    fn test_decode_recovers_ticks() {
        let ticks = vec![Tick {
            time: 1_700_000_000,
            bid: 1.1,
            ask: 1.1002,
            last: 0.0,
            volume: 0,
            time_msc: 1_700_000_000_123,
            flags: 6,
            volume_real: 0.0,
        }];

        let decoded: Vec<Tick> = decode(&encode(&ticks)).unwrap();
        assert_eq!(decoded, ticks);
    }

    #[test]
    fn test_empty_series_encodes_zero_length_shape() {
        let bytes = encode::<Rate>(&[]);
        let decoded: Vec<Rate> = decode(&bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_rejects_wrong_dtype() {
        let bytes = encode(&sample_rates());
        let err = decode::<Tick>(&bytes).unwrap_err();
        assert!(err.to_string().contains("dtype mismatch"));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let mut bytes = encode(&sample_rates());
        bytes.truncate(bytes.len() - 3);
        assert!(decode::<Rate>(&bytes).is_err());
    }
}
