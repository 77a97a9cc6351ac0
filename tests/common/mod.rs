#![allow(dead_code)]

use nbt_flavors::{Flavor, NbtTree, TagHandle, TagType};

/// Every flavor preset.
pub const FLAVORS: [Flavor; 5] = [
    Flavor::JAVA_LEGACY,
    Flavor::JAVA_ANVIL,
    Flavor::JAVA,
    Flavor::JAVA_NETWORK,
    Flavor::BEDROCK,
];

/// Builds a compound holding every tag kind the flavor allows, including empty
/// containers and arrays, nested lists and a list of compounds.
pub fn sample(tree: &mut NbtTree, flavor: Flavor) -> TagHandle {
    let root = tree.compound();
    tree.rename(root, Some("Level")).unwrap();

    let values = [
        ("byte", tree.create(-7i8)),
        ("short", tree.create(-300i16)),
        ("int", tree.create(123_456i32)),
        ("long", tree.create(i64::MIN)),
        ("float", tree.create(0.5f32)),
        ("double", tree.create(-1.25e300f64)),
        ("string", tree.create("Hello, wörld")),
        ("empty string", tree.create("")),
        ("bytes", tree.create(vec![0i8, 1, -1, 127, -128])),
        ("no bytes", tree.create(Vec::<i8>::new())),
    ];
    for (name, tag) in values {
        tree.compound_set(root, name, tag).unwrap();
    }
    if flavor.allows_int_array() {
        let ints = tree.create(vec![i32::MIN, -1, 0, 1, i32::MAX]);
        tree.compound_set(root, "ints", ints).unwrap();
    }
    if flavor.allows_long_array() {
        let longs = tree.create(vec![i64::MIN, 0, i64::MAX]);
        tree.compound_set(root, "longs", longs).unwrap();
    }

    let empty_list = tree.list(TagType::Unknown);
    tree.compound_set(root, "empty list", empty_list).unwrap();
    let empty_compound = tree.compound();
    tree.compound_set(root, "empty compound", empty_compound).unwrap();

    let numbers = tree.list(TagType::Int);
    for n in [1i32, -2, 300, -40_000] {
        let item = tree.create(n);
        tree.list_push(numbers, item).unwrap();
    }
    tree.compound_set(root, "numbers", numbers).unwrap();

    let matrix = tree.list(TagType::List);
    for row in 0..3i16 {
        let inner = tree.list(TagType::Short);
        for col in 0..row {
            let item = tree.create(row * 10 + col);
            tree.list_push(inner, item).unwrap();
        }
        tree.list_push(matrix, inner).unwrap();
    }
    tree.compound_set(root, "matrix", matrix).unwrap();

    let entities = tree.list(TagType::Compound);
    for (id, health) in [("zombie", 20.0f32), ("creeper", 15.5)] {
        let entity = tree.compound();
        let id = tree.create(id);
        tree.compound_set(entity, "id", id).unwrap();
        let health = tree.create(health);
        tree.compound_set(entity, "health", health).unwrap();
        tree.list_push(entities, entity).unwrap();
    }
    tree.compound_set(root, "entities", entities).unwrap();

    let nested = tree.compound();
    let deeper = tree.compound();
    let leaf = tree.create(1i8);
    tree.compound_set(deeper, "leaf", leaf).unwrap();
    tree.compound_set(nested, "deeper", deeper).unwrap();
    tree.compound_set(root, "nested", nested).unwrap();

    root
}

/// The tree `Compound("root"){a: Int(5), b: List<Int>[1, 2, 3]}`.
pub fn small(tree: &mut NbtTree) -> TagHandle {
    let root = tree.compound();
    tree.rename(root, Some("root")).unwrap();
    let a = tree.create(5i32);
    tree.compound_set(root, "a", a).unwrap();
    let b = tree.list(TagType::Unknown);
    for n in [1i32, 2, 3] {
        let item = tree.create(n);
        tree.list_push(b, item).unwrap();
    }
    tree.compound_set(root, "b", b).unwrap();
    root
}

/// Wire form of [`small`] in the modern flavor, uncompressed.
pub const SMALL_BYTES: [u8; 37] = [
    0x0A, 0x00, 0x04, 0x72, 0x6F, 0x6F, 0x74, // TAG_Compound("root")
    0x03, 0x00, 0x01, 0x61, 0x00, 0x00, 0x00, 0x05, // TAG_Int("a"): 5
    0x09, 0x00, 0x01, 0x62, 0x03, 0x00, 0x00, 0x00, 0x03, // TAG_List("b"): 3 ints
    0x00, 0x00, 0x00, 0x01, //
    0x00, 0x00, 0x00, 0x02, //
    0x00, 0x00, 0x00, 0x03, //
    0x00, // TAG_End
];

/// Builds `levels` compounds nested inside each other, each holding the next under
/// "n". The outermost one is returned, detached and unnamed.
pub fn nested_compounds(tree: &mut NbtTree, levels: usize) -> TagHandle {
    let mut inner = tree.compound();
    for _ in 1..levels {
        let outer = tree.compound();
        tree.compound_set(outer, "n", inner).unwrap();
        inner = outer;
    }
    inner
}

/// Encodes `levels` nested compounds in the JAVA flavor: an empty-named root, and
/// below it one child "n" per further level.
pub fn nested_bytes(levels: usize) -> Vec<u8> {
    let mut bytes = vec![0x0A, 0x00, 0x00];
    for _ in 1..levels {
        bytes.extend_from_slice(&[0x0A, 0x00, 0x01, b'n']);
    }
    bytes.resize(bytes.len() + levels, 0x00);
    bytes
}
