//! Encoder integration tests.
//!
//! Tests verify:
//! - Directory chains and out-of-line values land where the layout says
//! - Custom coders take over encoding and decoding of their kind
//! - Write failures and structural limits surface as errors

use std::io::Cursor;

use tiff_dir::config::DEFAULT_MAX_DEPTH;
use tiff_dir::{
    decode, encode, encode_to, ByteOrder, Coder, CoderRegistry, Container, DecodeError, Decoder,
    Directory, EncodeError, Encoder, FieldCoder, FieldType, IoError, Value, ValueKind, SUB_IFDS,
};

use super::test_utils::{directory_offsets, read_u16, read_u32, sample_container, LimitedWriter};

const LE: ByteOrder = ByteOrder::LittleEndian;
const BE: ByteOrder = ByteOrder::BigEndian;

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_directories_follow_the_header_in_order() {
    let container = sample_container();
    let bytes = encode(&container, LE).unwrap();

    // Page has 7 entries plus the synthesized sub-directory entry
    let offsets = directory_offsets(&bytes);
    assert_eq!(offsets, vec![8, 8 + 2 + 8 * 12 + 4]);
    assert_eq!(read_u16(&bytes, offsets[1] as usize, LE), 2);
}

#[test]
fn test_out_of_line_offsets_are_aligned_and_in_bounds() {
    for order in [LE, BE] {
        let bytes = encode(&sample_container(), order).unwrap();

        for offset in directory_offsets(&bytes) {
            let offset = offset as usize;
            let count = read_u16(&bytes, offset, order) as usize;
            for i in 0..count {
                let entry = offset + 2 + i * 12;
                let type_code = read_u16(&bytes, entry + 2, order);
                let n = read_u32(&bytes, entry + 4, order);
                let field_type = FieldType::from_u16(type_code).unwrap();
                if field_type.fits_inline(n) {
                    continue;
                }
                let size = field_type.payload_size(n);
                let at = read_u32(&bytes, entry + 8, order) as u64;
                assert_eq!(at % 4, 0, "unaligned value at {}", at);
                assert!(at + size <= bytes.len() as u64, "value past end at {}", at);
            }
        }
    }
}

#[test]
fn test_values_follow_all_directories() {
    let container = Container::new()
        .with_directory(Directory::new().with_entry(270, Value::ascii("first page")))
        .with_directory(Directory::new().with_entry(270, Value::ascii("second page")));
    let bytes = encode(&container, BE).unwrap();

    let offsets = directory_offsets(&bytes);
    let last_directory_end = offsets[1] as usize + 2 + 12 + 4;
    let first_value = read_u32(&bytes, offsets[0] as usize + 10, BE) as usize;
    assert!(first_value >= last_directory_end);
    assert_eq!(&bytes[first_value..first_value + 11], b"first page\0");
}

#[test]
fn test_sub_ifd_entry_type_and_count() {
    let dir = Directory::new()
        .with_sub_directory(Directory::new())
        .with_sub_directory(Directory::new())
        .with_sub_directory(Directory::new());
    let bytes = encode(&Container::new().with_directory(dir), BE).unwrap();

    assert_eq!(read_u16(&bytes, 10, BE), SUB_IFDS);
    assert_eq!(read_u16(&bytes, 12, BE), FieldType::Long.as_u16());
    assert_eq!(read_u32(&bytes, 14, BE), 3);
}

#[test]
fn test_stored_sub_ifd_offsets_without_children_decode_cleanly() {
    // Offsets with nothing to point at are dropped rather than written
    let dir = Directory::new()
        .with_entry(SUB_IFDS, Value::Long(vec![8]))
        .with_entry(270, Value::ascii("page"));
    let bytes = encode(&Container::new().with_directory(dir), LE).unwrap();

    let decoded = decode(Cursor::new(bytes.to_vec())).unwrap();
    let page = &decoded.directories[0];
    assert_eq!(page.get(SUB_IFDS), None);
    assert!(page.sub_directories.is_empty());
    assert_eq!(page.get(270), Some(&Value::ascii("page")));
}

#[test]
fn test_encoder_nesting_limit_matches_decoder_default() {
    let deep = |levels: usize| {
        let dir = (0..levels).fold(Directory::new(), |child, _| {
            Directory::new().with_sub_directory(child)
        });
        Container::new().with_directory(dir)
    };

    let at_limit = deep(DEFAULT_MAX_DEPTH);
    let bytes = encode(&at_limit, LE).unwrap();
    assert_eq!(decode(Cursor::new(bytes.to_vec())).unwrap(), at_limit);

    assert!(matches!(
        encode(&deep(DEFAULT_MAX_DEPTH + 1), LE),
        Err(EncodeError::NestingTooDeep { .. })
    ));
}

// =============================================================================
// Custom Coder Tests
// =============================================================================

/// Writes LONG values under type code 13 (IFD) instead of 4.
struct IfdCoder;

impl Coder for IfdCoder {
    fn type_code(&self) -> u16 {
        13
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Long
    }

    fn payload_size(&self, count: u32) -> u64 {
        count as u64 * 4
    }

    fn unmarshal(&self, bytes: &[u8], count: u32, order: ByteOrder) -> Result<Value, DecodeError> {
        FieldCoder::new(FieldType::Long).unmarshal(bytes, count, order)
    }

    fn marshal(&self, value: &Value, order: ByteOrder) -> Result<(Vec<u8>, u32), EncodeError> {
        FieldCoder::new(FieldType::Long).marshal(value, order)
    }
}

#[test]
fn test_custom_coder_round_trip() {
    let mut registry = CoderRegistry::builtin();
    registry.register(IfdCoder);

    let container = Container::new().with_directory(
        Directory::new()
            .with_entry(1, Value::Long(vec![1, 2, 3]))
            .with_entry(2, Value::Short(vec![4])),
    );
    let bytes = Encoder::new(&registry, LE).encode(&container).unwrap();
    assert_eq!(read_u16(&bytes, 12, LE), 13);

    // Same registry reads it back
    let decoded = Decoder::new(&registry)
        .decode(Cursor::new(bytes.to_vec()))
        .unwrap();
    assert_eq!(decoded, container);

    // Built-in registry does not know type 13 and skips the entry
    let builtin = decode(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(builtin.directories[0].get(1), None);
    assert_eq!(builtin.directories[0].get(2), Some(&Value::Short(vec![4])));
}

#[test]
fn test_custom_coder_does_not_change_sub_ifd_type() {
    let mut registry = CoderRegistry::builtin();
    registry.register(IfdCoder);

    let dir = Directory::new().with_sub_directory(Directory::new().with_entry(1, Value::Byte(vec![1])));
    let container = Container::new().with_directory(dir);
    let bytes = Encoder::new(&registry, LE).encode(&container).unwrap();

    assert_eq!(read_u16(&bytes, 12, LE), FieldType::Long.as_u16());
    assert_eq!(decode(Cursor::new(bytes.to_vec())).unwrap(), container);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_write_failure_partway() {
    let mut writer = LimitedWriter::new(10);
    let result = encode_to(&sample_container(), LE, &mut writer);

    assert!(matches!(
        result,
        Err(EncodeError::Io(IoError::Write { .. }))
    ));
    assert_eq!(writer.written.len(), 10);
}

#[test]
fn test_interior_nul_aborts_whole_encode() {
    let container = sample_container().with_directory(
        Directory::new().with_entry(270, Value::Ascii(vec!["a\0b".to_string()])),
    );
    let mut out = Vec::new();
    let result = encode_to(&container, LE, &mut out);

    assert!(matches!(result, Err(EncodeError::InteriorNul { .. })));
    assert!(out.is_empty(), "nothing should be written on failure");
}

#[test]
fn test_too_many_entries() {
    let dir = (0..=u16::MAX).fold(Directory::new(), |dir, tag| {
        dir.with_entry(tag, Value::Byte(Vec::new()))
    });
    let result = encode(&Container::new().with_directory(dir), LE);

    assert!(matches!(
        result,
        Err(EncodeError::TooManyEntries { count: 65536 })
    ));
}

#[test]
fn test_largest_directory_encodes() {
    let dir = (0..u16::MAX).fold(Directory::new(), |dir, tag| {
        dir.with_entry(tag, Value::Byte(vec![1]))
    });
    let bytes = encode(&Container::new().with_directory(dir), LE).unwrap();

    assert_eq!(read_u16(&bytes, 8, LE), u16::MAX);
    assert_eq!(bytes.len(), 8 + 2 + 65535 * 12 + 4);
}

#[test]
fn test_encode_to_file() {
    let path = std::env::temp_dir().join(format!("tiff-dir-encode-{}.tif", std::process::id()));
    let file = std::fs::File::create(&path).unwrap();
    let written = encode_to(&sample_container(), BE, std::io::BufWriter::new(file)).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(bytes.len(), written);
    assert_eq!(&bytes[0..4], &[b'M', b'M', 0, 42]);
}
