//! Dictionary encoding and decoding
//!
//! Dictionary format:
//! - COUNT (1 byte): number of tuples that follow
//! - for each tuple:
//!   - KEY (4 bytes): little-endian key
//!   - TYPE (1 byte): 0 = byte array, 1 = C string, 2 = unsigned, 3 = signed
//!   - LENGTH (2 bytes): little-endian value length
//!   - VALUE (LENGTH bytes)
//!
//! C strings carry their NUL terminator inside LENGTH. Integers are 1, 2
//! or 4 bytes wide, little endian.

/// Size of the dictionary header (tuple count)
pub const DICT_HEADER_SIZE: usize = 1;

/// Size of a tuple header (KEY + TYPE + LENGTH)
pub const TUPLE_HEADER_SIZE: usize = 4 + 1 + 2;

/// Errors that can occur while encoding or decoding a dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DictionaryError {
    /// Destination buffer cannot hold the tuple
    NotEnoughStorage,
    /// Input ends before the declared content
    Truncated,
    /// Unknown value type code
    InvalidType,
    /// Integer value with a width other than 1, 2 or 4 bytes
    InvalidWidth,
    /// C string value is not valid UTF-8
    InvalidString,
    /// More tuples than the count byte can describe
    TooManyTuples,
}

/// Value type carried in the TYPE byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TupleType {
    ByteArray,
    CString,
    Uint,
    Int,
}

// Wire format values
const TYPE_BYTE_ARRAY: u8 = 0;
const TYPE_CSTRING: u8 = 1;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

impl TupleType {
    /// Parse a type from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TYPE_BYTE_ARRAY => Some(TupleType::ByteArray),
            TYPE_CSTRING => Some(TupleType::CString),
            TYPE_UINT => Some(TupleType::Uint),
            TYPE_INT => Some(TupleType::Int),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            TupleType::ByteArray => TYPE_BYTE_ARRAY,
            TupleType::CString => TYPE_CSTRING,
            TupleType::Uint => TYPE_UINT,
            TupleType::Int => TYPE_INT,
        }
    }

    /// Returns true for the two integer types
    pub fn is_integer(self) -> bool {
        matches!(self, TupleType::Uint | TupleType::Int)
    }
}

/// A typed tuple value, borrowed from the buffer it was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TupleValue<'a> {
    Bytes(&'a [u8]),
    CString(&'a str),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Int8(i8),
    Int16(i16),
    Int32(i32),
}

impl<'a> TupleValue<'a> {
    /// Wire type of this value
    pub fn tuple_type(&self) -> TupleType {
        match self {
            TupleValue::Bytes(_) => TupleType::ByteArray,
            TupleValue::CString(_) => TupleType::CString,
            TupleValue::Uint8(_) | TupleValue::Uint16(_) | TupleValue::Uint32(_) => TupleType::Uint,
            TupleValue::Int8(_) | TupleValue::Int16(_) | TupleValue::Int32(_) => TupleType::Int,
        }
    }

    /// Number of VALUE bytes on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            TupleValue::Bytes(bytes) => bytes.len(),
            TupleValue::CString(text) => text.len() + 1,
            TupleValue::Uint8(_) | TupleValue::Int8(_) => 1,
            TupleValue::Uint16(_) | TupleValue::Int16(_) => 2,
            TupleValue::Uint32(_) | TupleValue::Int32(_) => 4,
        }
    }

    /// Integer value regardless of width and signedness
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            TupleValue::Uint8(v) => Some(v as i64),
            TupleValue::Uint16(v) => Some(v as i64),
            TupleValue::Uint32(v) => Some(v as i64),
            TupleValue::Int8(v) => Some(v as i64),
            TupleValue::Int16(v) => Some(v as i64),
            TupleValue::Int32(v) => Some(v as i64),
            TupleValue::Bytes(_) | TupleValue::CString(_) => None,
        }
    }

    /// Text value, if this is a C string
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            TupleValue::CString(text) => Some(text),
            _ => None,
        }
    }

    /// Check whether `other` may replace this value under the same key
    ///
    /// Integers of any width and signedness are interchangeable; strings
    /// and byte arrays only match themselves.
    pub fn same_family(&self, other: &TupleValue<'_>) -> bool {
        let (a, b) = (self.tuple_type(), other.tuple_type());
        a == b || (a.is_integer() && b.is_integer())
    }

    /// Compare two values the way the sync store does
    ///
    /// Strings and byte arrays compare byte for byte, integers compare
    /// numerically.
    pub fn same_as(&self, other: &TupleValue<'_>) -> bool {
        match (self, other) {
            (TupleValue::Bytes(a), TupleValue::Bytes(b)) => a == b,
            (TupleValue::CString(a), TupleValue::CString(b)) => a.as_bytes() == b.as_bytes(),
            _ => match (self.as_integer(), other.as_integer()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Decode a value from its type and VALUE bytes
    fn decode(tuple_type: TupleType, bytes: &'a [u8]) -> Result<Self, DictionaryError> {
        match tuple_type {
            TupleType::ByteArray => Ok(TupleValue::Bytes(bytes)),
            TupleType::CString => {
                // Stop at the terminator; a missing one is tolerated
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                core::str::from_utf8(&bytes[..end])
                    .map(TupleValue::CString)
                    .map_err(|_| DictionaryError::InvalidString)
            }
            TupleType::Uint => match *bytes {
                [a] => Ok(TupleValue::Uint8(a)),
                [a, b] => Ok(TupleValue::Uint16(u16::from_le_bytes([a, b]))),
                [a, b, c, d] => Ok(TupleValue::Uint32(u32::from_le_bytes([a, b, c, d]))),
                _ => Err(DictionaryError::InvalidWidth),
            },
            TupleType::Int => match *bytes {
                [a] => Ok(TupleValue::Int8(a as i8)),
                [a, b] => Ok(TupleValue::Int16(i16::from_le_bytes([a, b]))),
                [a, b, c, d] => Ok(TupleValue::Int32(i32::from_le_bytes([a, b, c, d]))),
                _ => Err(DictionaryError::InvalidWidth),
            },
        }
    }

    /// Write VALUE bytes; `out` must be exactly `encoded_len()` long
    fn write_value(&self, out: &mut [u8]) {
        match *self {
            TupleValue::Bytes(bytes) => out.copy_from_slice(bytes),
            TupleValue::CString(text) => {
                out[..text.len()].copy_from_slice(text.as_bytes());
                out[text.len()] = 0;
            }
            TupleValue::Uint8(v) => out[0] = v,
            TupleValue::Uint16(v) => out.copy_from_slice(&v.to_le_bytes()),
            TupleValue::Uint32(v) => out.copy_from_slice(&v.to_le_bytes()),
            TupleValue::Int8(v) => out.copy_from_slice(&v.to_le_bytes()),
            TupleValue::Int16(v) => out.copy_from_slice(&v.to_le_bytes()),
            TupleValue::Int32(v) => out.copy_from_slice(&v.to_le_bytes()),
        }
    }
}

/// A key/value pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tuple<'a> {
    /// Dictionary key
    pub key: u32,
    /// Typed value
    pub value: TupleValue<'a>,
}

impl<'a> Tuple<'a> {
    pub fn new(key: impl Into<u32>, value: TupleValue<'a>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn uint8(key: impl Into<u32>, value: u8) -> Self {
        Self::new(key, TupleValue::Uint8(value))
    }

    pub fn int32(key: impl Into<u32>, value: i32) -> Self {
        Self::new(key, TupleValue::Int32(value))
    }

    pub fn cstring(key: impl Into<u32>, text: &'a str) -> Self {
        Self::new(key, TupleValue::CString(text))
    }

    pub fn bytes(key: impl Into<u32>, bytes: &'a [u8]) -> Self {
        Self::new(key, TupleValue::Bytes(bytes))
    }

    /// Encoded size including the tuple header
    pub fn encoded_len(&self) -> usize {
        TUPLE_HEADER_SIZE + self.value.encoded_len()
    }
}

/// Encoded size of a dictionary holding `tuples`
pub fn dictionary_size(tuples: &[Tuple<'_>]) -> usize {
    DICT_HEADER_SIZE + tuples.iter().map(Tuple::encoded_len).sum::<usize>()
}

/// Bounded dictionary encoder
///
/// Writes never go past the end of the destination slice. A tuple that
/// does not fit is rejected whole, and the bytes written so far remain a
/// valid dictionary.
#[derive(Debug)]
pub struct DictionaryWriter<'b> {
    buffer: &'b mut [u8],
    pos: usize,
    count: u8,
}

impl<'b> DictionaryWriter<'b> {
    /// Start an empty dictionary at the beginning of `buffer`
    pub fn new(buffer: &'b mut [u8]) -> Result<Self, DictionaryError> {
        if buffer.len() < DICT_HEADER_SIZE {
            return Err(DictionaryError::NotEnoughStorage);
        }
        buffer[0] = 0;
        Ok(Self {
            buffer,
            pos: DICT_HEADER_SIZE,
            count: 0,
        })
    }

    /// Append a tuple
    pub fn write(&mut self, tuple: &Tuple<'_>) -> Result<(), DictionaryError> {
        if self.count == u8::MAX {
            return Err(DictionaryError::TooManyTuples);
        }

        let value_len = tuple.value.encoded_len();
        let length = u16::try_from(value_len).map_err(|_| DictionaryError::NotEnoughStorage)?;
        let end = self.pos + TUPLE_HEADER_SIZE + value_len;
        if end > self.buffer.len() {
            return Err(DictionaryError::NotEnoughStorage);
        }

        let out = &mut self.buffer[self.pos..end];
        out[0..4].copy_from_slice(&tuple.key.to_le_bytes());
        out[4] = tuple.value.tuple_type().to_byte();
        out[5..7].copy_from_slice(&length.to_le_bytes());
        tuple.value.write_value(&mut out[TUPLE_HEADER_SIZE..]);

        self.pos = end;
        self.count += 1;
        self.buffer[0] = self.count;
        Ok(())
    }

    /// Append several tuples, stopping at the first failure
    pub fn write_all(&mut self, tuples: &[Tuple<'_>]) -> Result<(), DictionaryError> {
        for tuple in tuples {
            self.write(tuple)?;
        }
        Ok(())
    }

    /// Number of tuples written
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Bytes used so far
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Always false: the count byte is part of the dictionary
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Finish the dictionary, returning its encoded size
    pub fn finish(self) -> usize {
        self.pos
    }
}

/// Validating dictionary decoder
///
/// Iterates the tuples of an encoded dictionary. Iteration stops after
/// the first error.
#[derive(Debug, Clone)]
pub struct DictionaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    count: u8,
    remaining: u8,
}

impl<'a> DictionaryReader<'a> {
    /// Start reading an encoded dictionary
    pub fn new(data: &'a [u8]) -> Result<Self, DictionaryError> {
        let (&count, _) = data.split_first().ok_or(DictionaryError::Truncated)?;
        Ok(Self {
            data,
            pos: DICT_HEADER_SIZE,
            count,
            remaining: count,
        })
    }

    /// Number of tuples the header declares
    pub fn declared_count(&self) -> u8 {
        self.count
    }

    /// Look up a key, decoding every tuple before it
    pub fn find(&self, key: u32) -> Result<Option<Tuple<'a>>, DictionaryError> {
        for tuple in self.clone() {
            let tuple = tuple?;
            if tuple.key == key {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    /// Decode every tuple, returning the encoded size of the dictionary
    pub fn validate(data: &'a [u8]) -> Result<usize, DictionaryError> {
        let mut reader = Self::new(data)?;
        while reader.remaining > 0 {
            reader.read_tuple()?;
            reader.remaining -= 1;
        }
        Ok(reader.pos)
    }

    fn read_tuple(&mut self) -> Result<Tuple<'a>, DictionaryError> {
        let header = self
            .data
            .get(self.pos..self.pos + TUPLE_HEADER_SIZE)
            .ok_or(DictionaryError::Truncated)?;

        let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let tuple_type = TupleType::from_byte(header[4]).ok_or(DictionaryError::InvalidType)?;
        let length = u16::from_le_bytes([header[5], header[6]]) as usize;

        let start = self.pos + TUPLE_HEADER_SIZE;
        let bytes = self
            .data
            .get(start..start + length)
            .ok_or(DictionaryError::Truncated)?;
        let value = TupleValue::decode(tuple_type, bytes)?;

        self.pos = start + length;
        Ok(Tuple { key, value })
    }
}

impl<'a> Iterator for DictionaryReader<'a> {
    type Item = Result<Tuple<'a>, DictionaryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.read_tuple() {
            Ok(tuple) => {
                self.remaining -= 1;
                Some(Ok(tuple))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}
