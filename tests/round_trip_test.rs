use std::collections::{BTreeMap, HashMap};

use bytes::{Bytes, BytesMut};
use pretty_assertions::assert_eq;
use struct_pb::{
    calculate_size, deserialize, deserialize_into, serialize, serialize_into, serialize_to,
    Enumeration, Message, Sint, Varint,
};

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Vec3 {
    x: Option<f32>,
    y: Option<f32>,
    z: Option<f32>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Weapon {
    name: Option<String>,
    damage: Option<Varint<i32>>,
}

#[derive(Enumeration, Default, Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    #[default]
    Red,
    Green,
    Blue,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Monster {
    pos: Option<Vec3>,
    mana: Option<Varint<i32>>,
    hp: Option<Varint<i32>>,
    name: Option<String>,
    inventory: Option<Bytes>,
    color: Option<Color>,
    weapons: Vec<Weapon>,
    equipped: Option<Weapon>,
    path: Vec<Vec3>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Monsters {
    monsters: Vec<Monster>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Person {
    id: Option<Varint<i32>>,
    name: Option<String>,
    age: Option<Varint<i32>>,
    salary: Option<f64>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Persons {
    person_list: Vec<Person>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Rect32 {
    x: Option<Varint<i32>>,
    y: Option<Varint<i32>>,
    width: Option<Varint<i32>>,
    height: Option<Varint<i32>>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Rect32s {
    rect32_list: Vec<Rect32>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Inventory {
    counts: HashMap<String, Varint<u32>>,
    positions: BTreeMap<Sint<i32>, Vec3>,
    flags: BTreeMap<Varint<u64>, bool>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Node {
    value: Varint<i64>,
    child: Option<Box<Node>>,
    tags: Vec<String>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Repeated {
    ints: Vec<Varint<i32>>,
    zigzag: Vec<Sint<i64>>,
    doubles: Vec<f64>,
    flags: Vec<bool>,
    colors: Vec<Color>,
    blobs: Vec<Bytes>,
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Generic<T> {
    id: Varint<u32>,
    payload: Option<T>,
}

fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3 {
        x: Some(x),
        y: Some(y),
        z: Some(z),
    }
}

fn weapon(name: &str, damage: i32) -> Weapon {
    Weapon {
        name: Some(name.to_string()),
        damage: Some(Varint(damage)),
    }
}

fn create_monsters(count: usize) -> Monsters {
    let mut monsters = Monsters::default();
    for _ in 0..count / 2 {
        monsters.monsters.push(Monster {
            pos: Some(vec3(1.0, 2.0, 3.0)),
            mana: Some(Varint(16)),
            hp: Some(Varint(24)),
            name: Some("it is a test".to_string()),
            inventory: Some(Bytes::from_static(&[1, 2, 3, 4])),
            color: Some(Color::Red),
            weapons: vec![weapon("gun", 42), weapon("mission", 56)],
            equipped: Some(weapon("air craft", 67)),
            path: vec![vec3(7.0, 8.0, 9.0)],
        });
        monsters.monsters.push(Monster {
            pos: Some(vec3(11.0, 22.0, 33.0)),
            mana: Some(Varint(161)),
            hp: Some(Varint(241)),
            name: Some("it is a test, ok".to_string()),
            inventory: Some(Bytes::from_static(&[24, 25, 26, 24])),
            color: Some(Color::Blue),
            weapons: vec![weapon("gun", 421), weapon("mission", 561)],
            equipped: Some(weapon("air craft", 671)),
            path: vec![vec3(71.0, 82.0, 93.0)],
        });
    }
    monsters
}

fn chain(depth: usize) -> Node {
    let mut node = Node::default();
    for i in 0..depth {
        node = Node {
            value: Varint(i as i64 - 2),
            child: Some(Box::new(node)),
            tags: vec![format!("level{}", i)],
        };
    }
    node
}

fn assert_round_trip<T: Message + PartialEq + std::fmt::Debug>(value: &T) {
    let bytes = serialize(value);
    assert_eq!(bytes.len(), calculate_size(value));
    let decoded: T = deserialize(&bytes).unwrap();
    assert_eq!(&decoded, value);
}

#[test]
fn test_monsters_round_trip() {
    assert_round_trip(&create_monsters(20));
}

#[test]
fn test_persons_round_trip() {
    let persons = Persons {
        person_list: (0..50)
            .map(|_| Person {
                id: Some(Varint(65536)),
                name: Some("tom".to_string()),
                age: Some(Varint(65536)),
                salary: Some(65536.42),
            })
            .collect(),
    };
    assert_round_trip(&persons);
}

#[test]
fn test_rects_round_trip() {
    let rects = Rect32s {
        rect32_list: vec![
            Rect32 {
                x: Some(Varint(65536)),
                y: Some(Varint(65536)),
                width: Some(Varint(65536)),
                height: Some(Varint(65536)),
            };
            30
        ],
    };
    assert_round_trip(&rects);
    // Each rect: 4 * (1 tag + 3 varint bytes), plus 1 tag + 1 length.
    assert_eq!(calculate_size(&rects), 30 * 18);
}

#[test]
fn test_maps_round_trip() {
    let mut inventory = Inventory::default();
    inventory.counts.insert("arrow".to_string(), Varint(99));
    inventory.counts.insert("potion".to_string(), Varint(0));
    inventory.counts.insert(String::new(), Varint(7));
    inventory.positions.insert(Sint(-3), vec3(0.5, -0.5, 1.5));
    inventory.positions.insert(Sint(0), Vec3::default());
    inventory.flags.insert(Varint(u64::MAX), true);
    inventory.flags.insert(Varint(1), false);
    assert_round_trip(&inventory);
}

#[test]
fn test_map_entry_omits_defaults() {
    let mut inventory = Inventory::default();
    inventory.flags.insert(Varint(0), false);
    // Entry at field 3 with an empty body.
    assert_eq!(serialize(&inventory).to_vec(), vec![0x1A, 0x00]);

    let mut inventory = Inventory::default();
    inventory.flags.insert(Varint(5), true);
    assert_eq!(
        serialize(&inventory).to_vec(),
        vec![0x1A, 0x04, 0x08, 0x05, 0x10, 0x01]
    );
}

#[test]
fn test_map_entry_key_and_value_order_is_free() {
    // value before key, plus an unknown field 3 inside the entry.
    let data = [0x1A, 0x06, 0x10, 0x01, 0x18, 0x07, 0x08, 0x05];
    let inventory: Inventory = deserialize(&data).unwrap();
    assert_eq!(inventory.flags.get(&Varint(5)), Some(&true));
}

#[test]
fn test_empty_plain_message_field_comes_back_as_default() {
    #[derive(Message, Default, Clone, PartialEq, Debug)]
    struct Scene {
        origin: Vec3,
        color: Color,
    }

    // An all-zero nested message and the zero enum variant leave nothing on
    // the wire, and decode back from `Default`.
    let value = Scene::default();
    assert!(serialize(&value).is_empty());
    assert_eq!(deserialize::<Scene>(&[]).unwrap(), value);

    let value = Scene {
        origin: Vec3 {
            x: Some(0.0),
            ..Default::default()
        },
        color: Color::Red,
    };
    assert_eq!(serialize(&value).to_vec(), vec![0x0A, 0x05, 0x0D, 0, 0, 0, 0]);
    assert_round_trip(&value);
}

#[test]
fn test_recursive_message() {
    let node = chain(8);
    assert_round_trip(&node);
}

#[test]
fn test_repeated_kinds() {
    let value = Repeated {
        ints: vec![Varint(0), Varint(-1), Varint(i32::MAX)],
        zigzag: vec![Sint(i64::MIN), Sint(0), Sint(1)],
        doubles: vec![0.0, -0.0, f64::MAX, 1e-300],
        flags: vec![true, false, true],
        colors: vec![Color::Blue, Color::Red, Color::Green],
        blobs: vec![Bytes::new(), Bytes::from_static(b"\x00\xFF")],
    };
    assert_round_trip(&value);
}

#[test]
fn test_unpacked_repeated_scalars_are_accepted() {
    // Two separate records for field 1 instead of one packed record.
    let data = [0x08, 0x05, 0x08, 0x7F];
    let value: Repeated = deserialize(&data).unwrap();
    assert_eq!(value.ints, vec![Varint(5), Varint(127)]);

    // Packed and unpacked records for the same field concatenate.
    let data = [0x08, 0x01, 0x0A, 0x02, 0x02, 0x03];
    let value: Repeated = deserialize(&data).unwrap();
    assert_eq!(value.ints, vec![Varint(1), Varint(2), Varint(3)]);
}

#[test]
fn test_generic_message() {
    let value = Generic {
        id: Varint(7),
        payload: Some(weapon("bow", 3)),
    };
    assert_round_trip(&value);
    let value: Generic<String> = Generic {
        id: Varint(1),
        payload: Some(String::new()),
    };
    assert_eq!(serialize(&value).to_vec(), vec![0x08, 0x01, 0x12, 0x00]);
}

#[test]
fn test_deserialize_into_merges() {
    let mut monster = Monster {
        hp: Some(Varint(1)),
        name: Some("old".to_string()),
        weapons: vec![weapon("sword", 1)],
        equipped: Some(Weapon {
            name: Some("shield".to_string()),
            damage: None,
        }),
        ..Default::default()
    };
    let update = Monster {
        name: Some("new".to_string()),
        weapons: vec![weapon("axe", 2)],
        equipped: Some(Weapon {
            name: None,
            damage: Some(Varint(9)),
        }),
        ..Default::default()
    };
    let bytes = serialize(&update);
    let consumed = deserialize_into(&mut monster, &bytes).unwrap();
    assert_eq!(consumed, bytes.len());

    // Scalars are replaced, repeated fields appended, messages merged.
    assert_eq!(monster.hp, Some(Varint(1)));
    assert_eq!(monster.name.as_deref(), Some("new"));
    assert_eq!(monster.weapons, vec![weapon("sword", 1), weapon("axe", 2)]);
    assert_eq!(monster.equipped, Some(weapon("shield", 9)));
}

#[test]
fn test_serialize_to_appends() {
    let first = Person {
        id: Some(Varint(1)),
        ..Default::default()
    };
    let second = Person {
        name: Some("ann".to_string()),
        ..Default::default()
    };
    let mut buf = BytesMut::new();
    serialize_to(&mut buf, &first);
    serialize_to(&mut buf, &second);
    assert_eq!(buf.len(), calculate_size(&first) + calculate_size(&second));

    // Concatenated messages decode as their merge.
    let merged: Person = deserialize(&buf).unwrap();
    assert_eq!(merged.id, Some(Varint(1)));
    assert_eq!(merged.name.as_deref(), Some("ann"));
}

#[test]
fn test_serialize_into_fixed_buffer() {
    let monsters = create_monsters(2);
    let size = calculate_size(&monsters);
    let mut storage = vec![0u8; size];
    let mut writer = &mut storage[..];
    serialize_into(&mut writer, &monsters).unwrap();
    assert!(writer.is_empty());
    assert_eq!(storage, serialize(&monsters).to_vec());
}
