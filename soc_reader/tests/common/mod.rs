//! Minimal little-endian MAT level-5 writer used to build fixtures.
#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const MI_INT8: u32 = 1;
pub const MI_INT32: u32 = 5;
pub const MI_UINT16: u32 = 4;
pub const MI_UINT32: u32 = 6;
pub const MI_DOUBLE: u32 = 9;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;

pub fn element(ty: u32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 16);
    out.extend(ty.to_le_bytes());
    out.extend((data.len() as u32).to_le_bytes());
    out.extend(data);
    while out.len() % 8 != 0 {
        out.push(0);
    }
    out
}

pub fn small_element(ty: u32, data: &[u8]) -> Vec<u8> {
    assert!(data.len() <= 4);
    let mut out = Vec::with_capacity(8);
    out.extend((((data.len() as u32) << 16) | ty).to_le_bytes());
    out.extend(data);
    out.resize(8, 0);
    out
}

fn matrix(class: u8, dims: &[i32], name: &str, body: &[u8]) -> Vec<u8> {
    let mut content = Vec::new();
    let mut flags = Vec::new();
    flags.extend(u32::from(class).to_le_bytes());
    flags.extend(0u32.to_le_bytes());
    content.extend(element(MI_UINT32, &flags));
    let dim_bytes: Vec<u8> = dims.iter().flat_map(|d| d.to_le_bytes()).collect();
    content.extend(element(MI_INT32, &dim_bytes));
    content.extend(element(MI_INT8, name.as_bytes()));
    content.extend(body);
    element(MI_MATRIX, &content)
}

pub fn double(name: &str, values: &[f64]) -> Vec<u8> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    matrix(6, &[1, values.len() as i32], name, &element(MI_DOUBLE, &bytes))
}

pub fn chars(name: &str, text: &str) -> Vec<u8> {
    let units: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    matrix(
        4,
        &[1, text.chars().count() as i32],
        name,
        &element(MI_UINT16, &units),
    )
}

pub fn cell(name: &str, items: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = items.concat();
    matrix(1, &[1, items.len() as i32], name, &body)
}

/// Struct array with `elements.len()` elements; each element lists its field
/// matrices in `fields` order.
pub fn structure(name: &str, fields: &[&str], elements: &[Vec<Vec<u8>>]) -> Vec<u8> {
    const FIELD_LEN: usize = 32;
    let mut body = small_element(MI_INT32, &(FIELD_LEN as i32).to_le_bytes());
    let mut names = Vec::new();
    for f in fields {
        let mut chunk = f.as_bytes().to_vec();
        chunk.resize(FIELD_LEN, 0);
        names.extend(chunk);
    }
    body.extend(element(MI_INT8, &names));
    for el in elements {
        assert_eq!(el.len(), fields.len());
        for field in el {
            body.extend(field);
        }
    }
    matrix(2, &[1, elements.len() as i32], name, &body)
}

pub fn compressed(el: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(el).unwrap();
    let data = enc.finish().unwrap();
    let mut out = Vec::new();
    out.extend(MI_COMPRESSED.to_le_bytes());
    out.extend((data.len() as u32).to_le_bytes());
    out.extend(data);
    out
}

pub fn file(vars: &[Vec<u8>]) -> Vec<u8> {
    let mut header = b"MATLAB 5.0 MAT-file, Platform: test".to_vec();
    header.resize(116, b' ');
    header.extend([0u8; 8]);
    header.extend(0x0100u16.to_le_bytes());
    header.extend(b"IM");
    for v in vars {
        header.extend(v);
    }
    header
}

/// One NASA-style cycle record with the usual four channels.
pub fn cycle(kind: &str, volts: &[f64]) -> Vec<Vec<u8>> {
    let n = volts.len();
    let data = structure(
        "",
        &[
            "Voltage_measured",
            "Current_measured",
            "Temperature_measured",
            "Time",
        ],
        &[vec![
            double("", volts),
            double("", &vec![-2.0; n]),
            double("", &vec![24.5; n]),
            double("", &(0..n).map(|i| i as f64 * 10.0).collect::<Vec<_>>()),
        ]],
    );
    vec![chars("", kind), double("", &[24.0]), data]
}
