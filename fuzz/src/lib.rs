use bytes::Bytes;
use nbt_flavors::{Compression, Flavor, NbtFile, NbtReader, NbtTree, NbtWriter};

const FLAVORS: [Flavor; 5] = [
    Flavor::JAVA_LEGACY,
    Flavor::JAVA_ANVIL,
    Flavor::JAVA,
    Flavor::JAVA_NETWORK,
    Flavor::BEDROCK,
];

/// Loads `data` as a whole tree and, if that works, saves it again and checks that
/// the output loads back to an equal tree.
pub fn test_codec(data: &[u8], flavor: Flavor) {
    let mut file = NbtFile::new(flavor);
    if file.load_from_buffer(data, Compression::AutoDetect, None).is_err() {
        return;
    }
    let Ok(saved) = file.save_to_buffer(Compression::None) else {
        return;
    };
    let mut again = NbtFile::new(flavor);
    again
        .load_from_buffer(&saved, Compression::None, None)
        .expect("saved output must load");
    let (Some(a), Some(b)) = (file.try_root(), again.try_root()) else {
        panic!("loaded file without a root");
    };
    assert!(file.tree().deep_eq(a, again.tree(), b));
    assert_eq!(again.save_to_buffer(Compression::None).ok(), Some(saved));
}

/// Scans `data` with the cursor, and compares its materialised root with the codec.
pub fn test_cursor(data: &[u8], flavor: Flavor) {
    let mut reader = NbtReader::new(data, flavor);
    while let Ok(true) = reader.advance() {
        let _ = reader.tag_name();
        if reader.has_value() {
            let _ = reader.read_value();
        }
    }

    let mut tree = NbtTree::new();
    let materialised = NbtReader::new(data, flavor).read_as_tag(&mut tree);
    let mut file = NbtFile::new(flavor);
    let loaded = file.load_from_buffer(data, Compression::None, None);
    match (materialised, loaded, file.try_root()) {
        (Ok(handle), Ok(_), Some(root)) => assert!(tree.deep_eq(handle, file.tree(), root)),
        (Ok(_), Err(_), _) | (Err(_), Ok(_), _) => {
            panic!("cursor and codec disagree on {flavor:?}")
        }
        _ => {}
    }
}

/// Writes a loaded tree back through the cursor writer, which must accept it.
pub fn test_writer(data: &[u8], flavor: Flavor) {
    let mut file = NbtFile::new(flavor);
    if file.load_from_buffer(data, Compression::None, None).is_err() {
        return;
    }
    let root = file.root();
    let tree = file.tree();
    if tree.list_type(root).is_ok() {
        return;
    }
    let name = tree.name(root).ok().flatten().unwrap_or_default();
    let mut writer = NbtWriter::new(Vec::new(), Some(name), flavor).expect("root header");
    for child in tree.children(root).expect("compound root") {
        writer.write_tag(tree, child).expect("loaded tags are writable");
    }
    writer.end_compound().expect("root closes");
    writer.finish().expect("writer finishes");
}

pub fn test(data: &[u8]) {
    for flavor in FLAVORS {
        test_codec(data, flavor);
        test_cursor(data, flavor);
        test_writer(data, flavor);
    }
    let mut file = NbtFile::new(Flavor::JAVA);
    let _ = file.load_from_bytes(Bytes::copy_from_slice(data), Compression::AutoDetect, None);
}
