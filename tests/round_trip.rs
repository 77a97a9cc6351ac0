mod common;

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};
use nbt_flavors::{
    Compression, Error, Flavor, MAX_DEPTH, NbtFile, NbtTree, NbtWriter, TagInfo, TagType,
    default_buffer_size, read_root_name, read_root_name_from, set_default_buffer_size,
};

use common::{FLAVORS, nested_compounds, sample};

fn sample_file(flavor: Flavor) -> NbtFile {
    let mut tree = NbtTree::new();
    let root = sample(&mut tree, flavor);
    NbtFile::with_root(tree, root, flavor).unwrap()
}

fn adler32(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

#[test]
fn every_flavor_round_trips() {
    for flavor in FLAVORS {
        let mut file = sample_file(flavor);
        let bytes = file.save_to_buffer(Compression::None).unwrap();

        let mut copy = NbtFile::new(flavor);
        let read = copy
            .load_from_buffer(&bytes, Compression::AutoDetect, None)
            .unwrap();
        assert_eq!(read, bytes.len() as u64, "{flavor:?}");

        let (a, b) = (file.root(), copy.root());
        assert!(file.tree().deep_eq(a, copy.tree(), b), "{flavor:?}");
        assert_eq!(copy.compression(), Compression::None);
        if flavor.has_unnamed_root_tag() {
            assert_eq!(copy.root_name(), None);
        } else {
            assert_eq!(copy.root_name(), Some("Level"));
        }

        // and the re-encoding is byte-identical
        assert_eq!(copy.save_to_buffer(Compression::None).unwrap(), bytes);
    }
}

#[test]
fn every_compression_round_trips() {
    for flavor in FLAVORS {
        let mut file = sample_file(flavor);
        let raw = file.save_to_buffer(Compression::None).unwrap();
        for compression in [Compression::None, Compression::GZip, Compression::ZLib] {
            let mut bytes = Vec::new();
            let written = file.save_to_writer(&mut bytes, compression).unwrap();
            assert_eq!(written, bytes.len() as u64);

            let mut copy = NbtFile::new(flavor);
            copy.load_from_buffer(&bytes, Compression::AutoDetect, None)
                .unwrap();
            assert_eq!(copy.compression(), compression);
            assert_eq!(copy.save_to_buffer(Compression::None).unwrap(), raw);
        }
    }
}

#[test]
fn gzip_output_is_standard() {
    let mut file = sample_file(Flavor::JAVA);
    let raw = file.save_to_buffer(Compression::None).unwrap();
    let gzip = file.save_to_buffer(Compression::GZip).unwrap();
    assert_eq!(&gzip[..2], &[0x1F, 0x8B]);

    let mut decoded = Vec::new();
    GzDecoder::new(&gzip[..]).read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn zlib_output_carries_adler32() {
    let mut file = sample_file(Flavor::JAVA);
    let raw = file.save_to_buffer(Compression::None).unwrap();
    let zlib = file.save_to_buffer(Compression::ZLib).unwrap();
    assert_eq!(zlib[0], 0x78);
    assert_eq!(((zlib[0] as u16) << 8 | zlib[1] as u16) % 31, 0);

    let trailer = u32::from_be_bytes(zlib[zlib.len() - 4..].try_into().unwrap());
    assert_eq!(trailer, adler32(&raw));

    let mut decoded = Vec::new();
    ZlibDecoder::new(&zlib[..]).read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn corrupted_zlib_header_is_rejected() {
    let mut file = sample_file(Flavor::JAVA);
    let mut zlib = file.save_to_buffer(Compression::ZLib).unwrap();
    zlib[1] ^= 0x01;
    let mut copy = NbtFile::new(Flavor::JAVA);
    assert!(matches!(
        copy.load_from_buffer(&zlib, Compression::ZLib, None),
        Err(Error::InvalidZlibHeader)
    ));
}

#[test]
fn auto_detect_needs_a_seekable_source() {
    let mut file = sample_file(Flavor::JAVA);
    let bytes = file.save_to_buffer(Compression::GZip).unwrap();

    let mut copy = NbtFile::new(Flavor::JAVA);
    assert!(matches!(
        copy.load_from_reader(&bytes[..], Compression::AutoDetect, None),
        Err(Error::NotSeekable)
    ));
    copy.load_from_reader(&bytes[..], Compression::GZip, None)
        .unwrap();
    assert!(copy.tree().contains(copy.try_root().unwrap(), "nested").unwrap());
}

#[test]
fn saving_needs_explicit_compression() {
    let mut file = sample_file(Flavor::JAVA);
    assert!(matches!(
        file.save_to_buffer(Compression::AutoDetect),
        Err(Error::CompressionRequired)
    ));
}

#[test]
fn named_flavors_refuse_unnamed_roots() {
    let mut file = sample_file(Flavor::JAVA);
    file.set_root_name(None).unwrap();
    assert!(matches!(
        file.save_to_buffer(Compression::None),
        Err(Error::UnnamedRoot)
    ));

    // the same tree is fine where roots have no names
    file.set_flavor(Flavor::JAVA_NETWORK);
    let bytes = file.save_to_buffer(Compression::None).unwrap();
    // the root marker is followed directly by the first child, TAG_Byte("byte")
    assert_eq!(&bytes[..5], &[0x0A, 0x01, 0x00, 0x04, b'b']);
}

#[test]
fn lazily_created_root() {
    let mut file = NbtFile::new(Flavor::JAVA);
    assert_eq!(file.try_root(), None);
    let root = file.root();
    assert_eq!(file.tree().tag_type(root).unwrap(), TagType::Compound);
    assert_eq!(file.root_name(), Some(""));
    assert_eq!(
        file.save_to_buffer(Compression::None).unwrap(),
        [0x0A, 0x00, 0x00, 0x00]
    );
}

#[test]
fn list_roots_follow_the_flavor() {
    let mut tree = NbtTree::new();
    let list = tree.list(TagType::Unknown);
    for n in [7i64, 8] {
        let item = tree.create(n);
        tree.list_push(list, item).unwrap();
    }
    assert!(matches!(
        NbtFile::with_root(tree.clone(), list, Flavor::JAVA),
        Err(Error::InvalidRoot(TagType::List))
    ));

    let mut file = NbtFile::with_root(tree, list, Flavor::BEDROCK).unwrap();
    let bytes = file.save_to_buffer(Compression::None).unwrap();
    // list marker, Long elements, count 2 as zigzag VarInt, then 14 and 16
    assert_eq!(bytes, [0x09, 0x04, 0x04, 0x0E, 0x10]);

    let mut copy = NbtFile::new(Flavor::BEDROCK);
    copy.load_from_buffer(&bytes, Compression::AutoDetect, None)
        .unwrap();
    let root = copy.root();
    assert_eq!(copy.tree().list_type(root).unwrap(), TagType::Long);
    assert!(copy.tree().deep_eq(root, file.tree(), list));

    let mut java = NbtFile::new(Flavor::JAVA);
    assert!(matches!(
        java.load_from_buffer(&bytes, Compression::None, None),
        Err(Error::InvalidRoot(TagType::List))
    ));
}

#[test]
fn bedrock_uses_little_endian_var_ints() {
    let mut tree = NbtTree::new();
    let root = tree.compound();
    let a = tree.create(-1i32);
    tree.compound_set(root, "a", a).unwrap();
    let f = tree.create(1.0f32);
    tree.compound_set(root, "f", f).unwrap();
    let mut file = NbtFile::with_root(tree, root, Flavor::BEDROCK).unwrap();
    assert_eq!(
        file.save_to_buffer(Compression::None).unwrap(),
        [
            0x0A, // unnamed root
            0x03, 0x00, 0x01, b'a', 0x01, // zigzag(-1) = 1
            0x05, 0x00, 0x01, b'f', 0x00, 0x00, 0x80, 0x3F, // little-endian 1.0
            0x00,
        ]
    );
}

#[test]
fn disallowed_arrays_fail_to_save() {
    let mut tree = NbtTree::new();
    let root = tree.compound();
    let longs = tree.create(vec![1i64]);
    tree.compound_set(root, "longs", longs).unwrap();
    let mut file = NbtFile::with_root(tree, root, Flavor::JAVA_ANVIL).unwrap();
    file.set_root_name(Some("r")).unwrap();
    assert!(matches!(
        file.save_to_buffer(Compression::None),
        Err(Error::DisallowedTag(TagType::LongArray))
    ));
}

#[test]
fn selector_skips_unwanted_tags() {
    let mut file = sample_file(Flavor::JAVA);
    let full = file.save_to_buffer(Compression::GZip).unwrap();

    let mut seen = Vec::new();
    let mut selector = |info: &TagInfo<'_>| {
        seen.push((info.name.map(str::to_owned), info.depth));
        info.name != Some("entities") && info.list_index != Some(1)
    };
    let mut partial = NbtFile::new(Flavor::JAVA);
    partial
        .load_from_buffer(&full, Compression::AutoDetect, Some(&mut selector))
        .unwrap();

    let root = partial.root();
    let tree = partial.tree();
    assert!(!tree.contains(root, "entities").unwrap());
    assert!(tree.contains(root, "nested").unwrap());
    let numbers = tree.child(root, "numbers").unwrap();
    let kept: Vec<i32> = tree
        .children(numbers)
        .unwrap()
        .map(|n| tree.value_as::<i32>(n).unwrap())
        .collect();
    assert_eq!(kept, [1, 300, -40_000]);

    // nothing below a skipped tag is offered to the selector
    assert!(!seen.iter().any(|(name, _)| name.as_deref() == Some("health")));
    assert!(seen.contains(&(Some("leaf".to_owned()), 3)));
}

#[test]
fn files_on_disk() {
    let dir = std::env::temp_dir().join(format!("nbt_flavors_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("level.dat");

    let mut file = sample_file(Flavor::JAVA);
    let written = file.save_to_file(&path, Compression::GZip).unwrap();
    assert_eq!(written, std::fs::metadata(&path).unwrap().len());
    assert_eq!(file.path(), Some(path.as_path()));

    assert_eq!(
        read_root_name(&path, Flavor::JAVA).unwrap().as_deref(),
        Some("Level")
    );

    let mut copy = NbtFile::new(Flavor::JAVA);
    copy.load_from_file(&path, Compression::AutoDetect, None)
        .unwrap();
    assert_eq!(copy.compression(), Compression::GZip);
    let (a, b) = (file.root(), copy.root());
    assert!(file.tree().deep_eq(a, copy.tree(), b));

    // save() reuses the remembered path and compression
    let root = copy.root();
    let extra = copy.tree_mut().create(1i8);
    copy.tree_mut().compound_set(root, "extra", extra).unwrap();
    copy.save().unwrap();
    let mut again = NbtFile::new(Flavor::JAVA);
    again
        .load_from_file(&path, Compression::GZip, None)
        .unwrap();
    let root = again.root();
    assert!(again.tree().contains(root, "extra").unwrap());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn tiny_buffers_change_nothing() {
    assert!(matches!(set_default_buffer_size(0), Err(Error::ZeroBufferSize)));
    assert!(default_buffer_size() > 0);

    let mut file = sample_file(Flavor::BEDROCK);
    assert!(matches!(file.set_buffer_size(0), Err(Error::ZeroBufferSize)));
    let expected = file.save_to_buffer(Compression::None).unwrap();
    file.set_buffer_size(1).unwrap();
    for compression in [Compression::None, Compression::GZip, Compression::ZLib] {
        let bytes = file.save_to_buffer(compression).unwrap();
        let mut copy = NbtFile::new(Flavor::BEDROCK);
        copy.set_buffer_size(3).unwrap();
        copy.load_from_buffer(&bytes, Compression::AutoDetect, None)
            .unwrap();
        assert_eq!(copy.save_to_buffer(Compression::None).unwrap(), expected);
    }
}

#[test]
fn save_without_path_fails() {
    let mut file = NbtFile::new(Flavor::JAVA);
    assert!(matches!(file.save(), Err(Error::NoPath)));
}

#[test]
fn root_name_from_a_stream() {
    let mut file = sample_file(Flavor::JAVA);
    let zlib = file.save_to_buffer(Compression::ZLib).unwrap();
    let name = read_root_name_from(std::io::Cursor::new(zlib), Compression::AutoDetect, Flavor::JAVA)
        .unwrap();
    assert_eq!(name.as_deref(), Some("Level"));

    let mut bedrock = sample_file(Flavor::BEDROCK);
    let raw = bedrock.save_to_buffer(Compression::None).unwrap();
    let name =
        read_root_name_from(std::io::Cursor::new(raw), Compression::None, Flavor::BEDROCK).unwrap();
    assert_eq!(name, None);
}

#[test]
fn truncated_input_is_end_of_file() {
    let mut file = sample_file(Flavor::JAVA);
    let bytes = file.save_to_buffer(Compression::None).unwrap();
    for cut in [1, 3, bytes.len() / 2, bytes.len() - 1] {
        let mut copy = NbtFile::new(Flavor::JAVA);
        assert!(matches!(
            copy.load_from_buffer(&bytes[..cut], Compression::None, None),
            Err(Error::EndOfFile)
        ), "cut at {cut}");
        // a failed load leaves the file untouched
        assert_eq!(copy.try_root(), None);
    }
}

#[cfg(feature = "shared")]
#[test]
fn shared_buffers() {
    let mut file = sample_file(Flavor::JAVA);
    let bytes = bytes::Bytes::from(file.save_to_buffer(Compression::ZLib).unwrap());
    let mut copy = NbtFile::new(Flavor::JAVA);
    copy.load_from_bytes(bytes.clone(), Compression::AutoDetect, None)
        .unwrap();
    let (a, b) = (file.root(), copy.root());
    assert!(file.tree().deep_eq(a, copy.tree(), b));
}

fn nested_file(flavor: Flavor, levels: usize) -> NbtFile {
    let mut file = NbtFile::new(flavor);
    let root = file.root();
    let tree = file.tree_mut();
    let inner = nested_compounds(tree, levels - 1);
    tree.compound_set(root, "n", inner).unwrap();
    file
}

#[test]
fn save_and_load_share_the_nesting_limit() {
    let mut deepest = nested_file(Flavor::JAVA, MAX_DEPTH);
    let bytes = deepest.save_to_buffer(Compression::None).unwrap();
    let mut copy = NbtFile::new(Flavor::JAVA);
    copy.load_from_buffer(&bytes, Compression::None, None).unwrap();
    let (root, copy_root) = (deepest.root(), copy.root());
    assert!(deepest.tree().deep_eq(root, copy.tree(), copy_root));

    for levels in [MAX_DEPTH + 1, 600] {
        let mut file = nested_file(Flavor::JAVA, levels);
        assert!(matches!(
            file.save_to_buffer(Compression::None),
            Err(Error::NestingTooDeep)
        ));
    }
}

#[test]
fn very_deep_tree_is_refused_on_save() {
    let mut file = nested_file(Flavor::BEDROCK, 200_000);
    assert!(matches!(
        file.save_to_buffer(Compression::GZip),
        Err(Error::NestingTooDeep)
    ));
}

#[test]
fn large_flat_compound_loads() {
    let mut writer = NbtWriter::new(Vec::new(), Some(""), Flavor::JAVA).unwrap();
    for i in 0..40_000 {
        writer.write_byte(Some(&format!("b{i}")), (i % 128) as i8).unwrap();
    }
    writer.end_compound().unwrap();
    let bytes = writer.finish().unwrap();

    let mut file = NbtFile::new(Flavor::JAVA);
    file.load_from_buffer(&bytes, Compression::None, None).unwrap();
    let root = file.root();
    assert_eq!(file.tree().len(root).unwrap(), 40_000);
    let last = file.tree().child(root, "b39999").unwrap();
    assert_eq!(file.tree().value_as::<i8>(last).unwrap(), (39_999 % 128) as i8);
}

#[test]
fn duplicate_names_are_rejected_unless_skipped() {
    // {a: 1b, b: 2b, a: 3b} under a root named ""
    let bytes = [
        0x0A, 0x00, 0x00, //
        0x01, 0x00, 0x01, b'a', 0x01, //
        0x01, 0x00, 0x01, b'b', 0x02, //
        0x01, 0x00, 0x01, b'a', 0x03, //
        0x00,
    ];
    let mut file = NbtFile::new(Flavor::JAVA);
    assert!(matches!(
        file.load_from_buffer(&bytes, Compression::None, None),
        Err(Error::DuplicateName(name)) if name == "a"
    ));

    let mut without_a = |info: &TagInfo<'_>| info.name != Some("a");
    file.load_from_buffer(&bytes, Compression::None, Some(&mut without_a))
        .unwrap();
    let root = file.root();
    assert_eq!(file.tree().len(root).unwrap(), 1);
    assert!(file.tree().contains(root, "b").unwrap());
}
