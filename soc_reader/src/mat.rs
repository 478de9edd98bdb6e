//! MATLAB level-5 MAT-file decoder.
//!
//! Handles numeric, logical, char, cell and struct arrays, in either byte
//! order, including zlib-compressed top-level elements (the MATLAB 7 default).
//! Sparse arrays and HDF5-based v7.3 files are rejected.
//!
//! Mapping onto [`Node`]:
//! - numeric / logical arrays → `Node::Array` (column-major, real part only)
//! - char arrays → `Node::Text` for one row, `Node::List` of rows otherwise
//! - cell arrays → `Node::List`
//! - struct arrays → `Node::List` of `Node::Record`, one per element
use std::collections::BTreeMap;
use std::io::Read;

use flate2::read::ZlibDecoder;
use soc_traits::{Node, Variables};

use crate::error::{ReadError, Result};

const HEADER_LEN: usize = 128;
const HEADER_TEXT_LEN: usize = 116;
const VERSION_5: u16 = 0x0100;
const VERSION_73: u16 = 0x0200;

/// Cell/struct nesting accepted before decoding gives up.
pub const MAX_NESTING: usize = 64;
/// Upper bound on the inflated size of one compressed element.
pub const MAX_INFLATED_BYTES: u64 = 1 << 30;

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;
const MI_UTF8: u32 = 16;
const MI_UTF16: u32 = 17;
const MI_UTF32: u32 = 18;

const MX_CELL: u8 = 1;
const MX_STRUCT: u8 = 2;
const MX_OBJECT: u8 = 3;
const MX_CHAR: u8 = 4;
const MX_SPARSE: u8 = 5;
const MX_DOUBLE: u8 = 6;
const MX_UINT64: u8 = 15;

const FLAG_COMPLEX: u32 = 0x0800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        }
    }

    fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        }
    }
}

/// One decoded data element: type tag plus payload (padding stripped).
struct Element<'a> {
    ty: u32,
    data: &'a [u8],
    offset: usize,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    /// Fewer bytes left than one tag: only trailing padding remains.
    fn is_at_end(&self) -> bool {
        self.buf.len().saturating_sub(self.pos) < 8
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.buf.len() - self.pos;
        if n > available {
            return Err(ReadError::Truncated {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(self.endian.u32([b[0], b[1], b[2], b[3]]))
    }

    fn element(&mut self) -> Result<Element<'a>> {
        let offset = self.pos;
        let first = self.read_u32()?;
        if first >> 16 != 0 {
            // Small data element: byte count in the upper half of the tag word.
            let size = (first >> 16) as usize;
            let ty = first & 0xffff;
            let payload = self.take(4)?;
            if size > 4 {
                return Err(ReadError::Malformed {
                    offset,
                    reason: format!("small element claims {size} bytes"),
                });
            }
            return Ok(Element {
                ty,
                data: &payload[..size],
                offset,
            });
        }
        let ty = first;
        let size = self.read_u32()? as usize;
        let data = self.take(size)?;
        // Compressed elements are written without trailing padding.
        if ty != MI_COMPRESSED {
            let pad = (8 - size % 8) % 8;
            self.pos += pad.min(self.buf.len() - self.pos);
        }
        Ok(Element { ty, data, offset })
    }

    fn expect(&mut self, ty: u32, what: &str) -> Result<Element<'a>> {
        let el = self.element()?;
        if el.ty != ty {
            return Err(ReadError::Malformed {
                offset: el.offset,
                reason: format!("{what}: expected element type {ty}, found {}", el.ty),
            });
        }
        Ok(el)
    }
}

/// Decode a complete MAT file image into its top-level variables.
pub fn parse(bytes: &[u8]) -> Result<Variables> {
    if bytes.len() < HEADER_LEN {
        return Err(ReadError::Header(format!(
            "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    if !bytes[..HEADER_TEXT_LEN].starts_with(b"MATLAB") {
        return Err(ReadError::Header("missing 'MATLAB' text header".into()));
    }
    let endian = match &bytes[126..128] {
        b"IM" => Endian::Little,
        b"MI" => Endian::Big,
        other => {
            return Err(ReadError::Header(format!(
                "bad endian indicator {:?}",
                String::from_utf8_lossy(other)
            )));
        }
    };
    let version = endian.u16([bytes[124], bytes[125]]);
    if version == VERSION_73 {
        return Err(ReadError::Header(
            "v7.3 (HDF5) MAT files are not supported; re-save with -v7".into(),
        ));
    }
    if version != VERSION_5 {
        return Err(ReadError::Header(format!(
            "unsupported version 0x{version:04x}"
        )));
    }

    let mut vars = Variables::new();
    let mut cursor = Cursor::new(&bytes[HEADER_LEN..], endian);
    while !cursor.is_at_end() {
        let el = cursor.element()?;
        let decoded = match el.ty {
            MI_MATRIX => parse_matrix(el.data, endian, 0)?,
            MI_COMPRESSED => {
                let inflated = inflate(el.data)?;
                let mut inner = Cursor::new(&inflated, endian);
                let inner_el = inner.expect(MI_MATRIX, "compressed variable")?;
                parse_matrix(inner_el.data, endian, 0)?
            }
            other => {
                tracing::debug!(ty = other, offset = el.offset, "skipping top-level element");
                continue;
            }
        };
        let (name, node) = decoded;
        if name.is_empty() {
            tracing::warn!(offset = el.offset, "skipping unnamed top-level variable");
            continue;
        }
        tracing::debug!(%name, kind = node.kind(), "decoded variable");
        vars.insert(name, node);
    }
    Ok(vars)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_INFLATED_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ReadError::Inflate(e.to_string()))?;
    Ok(out)
}

/// Decode the payload of one miMATRIX element into `(name, node)`.
fn parse_matrix(data: &[u8], endian: Endian, depth: usize) -> Result<(String, Node)> {
    if depth > MAX_NESTING {
        return Err(ReadError::TooDeep(MAX_NESTING));
    }
    // MATLAB writes empty cells as zero-length matrices.
    if data.is_empty() {
        return Ok((String::new(), Node::Array(Vec::new())));
    }
    let mut c = Cursor::new(data, endian);

    let flags_el = c.expect(MI_UINT32, "array flags")?;
    if flags_el.data.len() < 8 {
        return Err(ReadError::Malformed {
            offset: flags_el.offset,
            reason: "array flags shorter than 8 bytes".into(),
        });
    }
    let d = flags_el.data;
    let flags = endian.u32([d[0], d[1], d[2], d[3]]);
    let class = (flags & 0xff) as u8;
    let complex = flags & FLAG_COMPLEX != 0;

    let dims_el = c.expect(MI_INT32, "dimensions")?;
    let dims = decode_numbers(dims_el.ty, dims_el.data, endian, dims_el.offset)?;
    let mut count: usize = 1;
    for dim in &dims {
        if *dim < 0.0 {
            return Err(ReadError::Malformed {
                offset: dims_el.offset,
                reason: format!("negative dimension {dim}"),
            });
        }
        count = count
            .checked_mul(*dim as usize)
            .ok_or_else(|| ReadError::Malformed {
                offset: dims_el.offset,
                reason: "element count overflows".into(),
            })?;
    }

    let name_el = c.expect(MI_INT8, "array name")?;
    let name = String::from_utf8_lossy(name_el.data).into_owned();

    // Every cell or struct element occupies at least one byte of payload.
    if matches!(class, MX_CELL | MX_STRUCT | MX_OBJECT) && count > data.len() {
        return Err(ReadError::Malformed {
            offset: dims_el.offset,
            reason: format!("dimensions imply {count} elements in a {}-byte matrix", data.len()),
        });
    }

    let node = match class {
        MX_CELL => {
            let mut items = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                let el = c.expect(MI_MATRIX, "cell item")?;
                items.push(parse_matrix(el.data, endian, depth + 1)?.1);
            }
            Node::List(items)
        }
        MX_STRUCT => Node::List(parse_struct(&mut c, count, endian, depth)?),
        MX_OBJECT => {
            let _class_name = c.expect(MI_INT8, "object class name")?;
            Node::List(parse_struct(&mut c, count, endian, depth)?)
        }
        MX_CHAR => {
            let el = c.element()?;
            decode_chars(&el, &dims, endian)?
        }
        MX_SPARSE => return Err(ReadError::UnsupportedClass("sparse".into())),
        MX_DOUBLE..=MX_UINT64 => {
            let real = c.element()?;
            let values = decode_numbers(real.ty, real.data, endian, real.offset)?;
            if values.len() != count {
                return Err(ReadError::Malformed {
                    offset: real.offset,
                    reason: format!(
                        "array {name:?} holds {} values, dimensions imply {count}",
                        values.len()
                    ),
                });
            }
            if complex {
                // Imaginary parts carry no meaning for instrument channels.
                let _imag = c.element()?;
                tracing::debug!(%name, "dropping imaginary part");
            }
            Node::Array(values)
        }
        other => return Err(ReadError::UnsupportedClass(format!("class id {other}"))),
    };
    Ok((name, node))
}

fn parse_struct(c: &mut Cursor<'_>, count: usize, endian: Endian, depth: usize) -> Result<Vec<Node>> {
    let len_el = c.expect(MI_INT32, "field name length")?;
    let field_len = decode_numbers(len_el.ty, len_el.data, endian, len_el.offset)?
        .first()
        .copied()
        .unwrap_or(0.0);
    if field_len < 0.0 {
        return Err(ReadError::Malformed {
            offset: len_el.offset,
            reason: format!("negative field name length {field_len}"),
        });
    }
    let field_len = field_len as usize;
    let names_el = c.expect(MI_INT8, "field names")?;
    let names: Vec<String> = if field_len == 0 {
        Vec::new()
    } else {
        names_el
            .data
            .chunks(field_len)
            .map(|chunk| {
                let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
                String::from_utf8_lossy(&chunk[..end]).into_owned()
            })
            .collect()
    };

    let mut elements = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let mut fields = BTreeMap::new();
        for name in &names {
            let el = c.expect(MI_MATRIX, "struct field")?;
            let (_, node) = parse_matrix(el.data, endian, depth + 1)?;
            fields.insert(name.clone(), node);
        }
        elements.push(Node::Record(fields));
    }
    Ok(elements)
}

macro_rules! decode_as {
    ($data:expr, $endian:expr, $t:ty) => {{
        const N: usize = std::mem::size_of::<$t>();
        $data
            .chunks_exact(N)
            .map(|chunk| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(chunk);
                let v = match $endian {
                    Endian::Little => <$t>::from_le_bytes(raw),
                    Endian::Big => <$t>::from_be_bytes(raw),
                };
                v as f64
            })
            .collect::<Vec<f64>>()
    }};
}

fn decode_numbers(ty: u32, data: &[u8], endian: Endian, offset: usize) -> Result<Vec<f64>> {
    let values = match ty {
        MI_INT8 => decode_as!(data, endian, i8),
        MI_UINT8 => decode_as!(data, endian, u8),
        MI_INT16 => decode_as!(data, endian, i16),
        MI_UINT16 => decode_as!(data, endian, u16),
        MI_INT32 => decode_as!(data, endian, i32),
        MI_UINT32 => decode_as!(data, endian, u32),
        MI_SINGLE => decode_as!(data, endian, f32),
        MI_DOUBLE => decode_as!(data, endian, f64),
        MI_INT64 => decode_as!(data, endian, i64),
        MI_UINT64 => decode_as!(data, endian, u64),
        other => {
            return Err(ReadError::Malformed {
                offset,
                reason: format!("element type {other} is not numeric"),
            });
        }
    };
    Ok(values)
}

fn decode_chars(el: &Element<'_>, dims: &[f64], endian: Endian) -> Result<Node> {
    let chars: Vec<char> = match el.ty {
        MI_UTF8 => String::from_utf8_lossy(el.data).chars().collect(),
        MI_INT8 | MI_UINT8 => el.data.iter().map(|&b| char::from(b)).collect(),
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = el
                .data
                .chunks_exact(2)
                .map(|b| endian.u16([b[0], b[1]]))
                .collect();
            char::decode_utf16(units)
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        MI_UTF32 | MI_UINT32 | MI_INT32 => el
            .data
            .chunks_exact(4)
            .map(|b| {
                char::from_u32(endian.u32([b[0], b[1], b[2], b[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        other => {
            return Err(ReadError::Malformed {
                offset: el.offset,
                reason: format!("element type {other} cannot hold characters"),
            });
        }
    };

    let rows = dims.first().copied().unwrap_or(0.0) as usize;
    if rows <= 1 || chars.len() % rows != 0 {
        return Ok(Node::Text(chars.into_iter().collect()));
    }
    // Column-major storage: character (r, c) sits at c * rows + r.
    let cols = chars.len() / rows;
    let lines = (0..rows)
        .map(|r| {
            let line: String = (0..cols).map(|c| chars[c * rows + r]).collect();
            Node::Text(line.trim_end().to_string())
        })
        .collect();
    Ok(Node::List(lines))
}
