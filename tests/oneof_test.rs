use pretty_assertions::assert_eq;
use struct_pb::{
    calculate_size, deserialize, deserialize_into, serialize, Message, Oneof, Sint, Varint,
};

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Address {
    city: String,
}

#[derive(Oneof, Clone, PartialEq, Debug)]
enum Contact {
    #[pb(number = 4)]
    Email(String),
    #[pb(number = 5)]
    Phone(Varint<u64>),
    #[pb(number = 6)]
    Postal(Address),
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Profile {
    id: Varint<u32>,
    name: String,
    #[pb(oneof(4, 5, 6))]
    contact: Option<Contact>,
    score: Sint<i32>,
}

#[derive(Oneof, Clone, PartialEq, Debug)]
enum Shape {
    #[pb(number = 1)]
    Radius(f64),
    #[pb(number = 9)]
    Side(u32),
}

#[derive(Message, Default, Clone, PartialEq, Debug)]
struct Drawing {
    #[pb(oneof(1, 9))]
    shape: Option<Shape>,
    #[pb(number = 5)]
    label: String,
}

#[test]
fn test_oneof_numbers_are_exposed() {
    assert_eq!(Contact::FIELD_NUMBERS, &[4, 5, 6]);
    assert_eq!(Contact::Phone(Varint(1)).field_number(), 5);
    // `score` takes the implicit slot after `name`; the oneof takes none.
    assert_eq!(Profile::FIELD_NUMBERS, &[1, 2, 4, 5, 6, 3]);
    assert_eq!(Profile::field_index(5), Some(2));
    assert_eq!(Profile::field_index(3), Some(3));
}

#[test]
fn test_unset_oneof_is_omitted() {
    let value = Profile {
        id: Varint(1),
        ..Default::default()
    };
    assert_eq!(serialize(&value).to_vec(), vec![0x08, 0x01]);
}

#[test]
fn test_oneof_variant_written_at_its_number() {
    let value = Profile {
        id: Varint(1),
        name: String::new(),
        contact: Some(Contact::Email("a@b".to_string())),
        score: Sint(-1),
    };
    let bytes = serialize(&value);
    // Field 3 (score) comes before field 4 (email).
    assert_eq!(
        bytes.to_vec(),
        vec![0x08, 0x01, 0x18, 0x01, 0x22, 0x03, b'a', b'@', b'b']
    );
    assert_eq!(bytes.len(), calculate_size(&value));
    assert_eq!(deserialize::<Profile>(&bytes).unwrap(), value);
}

#[test]
fn test_oneof_default_value_is_still_written() {
    let value = Profile {
        contact: Some(Contact::Phone(Varint(0))),
        ..Default::default()
    };
    let bytes = serialize(&value);
    assert_eq!(bytes.to_vec(), vec![0x28, 0x00]);
    assert_eq!(deserialize::<Profile>(&bytes).unwrap(), value);
}

#[test]
fn test_oneof_message_variant() {
    let value = Profile {
        contact: Some(Contact::Postal(Address {
            city: "Oslo".to_string(),
        })),
        ..Default::default()
    };
    let bytes = serialize(&value);
    assert_eq!(
        bytes.to_vec(),
        vec![0x32, 0x06, 0x0A, 0x04, b'O', b's', b'l', b'o']
    );
    assert_eq!(deserialize::<Profile>(&bytes).unwrap(), value);
}

#[test]
fn test_last_variant_wins() {
    let mut data = serialize(&Profile {
        contact: Some(Contact::Email("x".to_string())),
        ..Default::default()
    })
    .to_vec();
    data.extend_from_slice(&serialize(&Profile {
        contact: Some(Contact::Phone(Varint(42))),
        ..Default::default()
    }));
    let value: Profile = deserialize(&data).unwrap();
    assert_eq!(value.contact, Some(Contact::Phone(Varint(42))));
}

#[test]
fn test_same_message_variant_merges() {
    let mut value = Profile {
        contact: Some(Contact::Postal(Address {
            city: "Bergen".to_string(),
        })),
        ..Default::default()
    };
    // An empty Postal record leaves the held address untouched.
    deserialize_into(&mut value, &[0x32, 0x00]).unwrap();
    assert_eq!(
        value.contact,
        Some(Contact::Postal(Address {
            city: "Bergen".to_string()
        }))
    );
}

#[test]
fn test_oneof_interleaves_with_explicit_numbers() {
    let value = Drawing {
        shape: Some(Shape::Side(7)),
        label: "sq".to_string(),
    };
    let bytes = serialize(&value);
    // label (5) is written before the side variant (9).
    assert_eq!(
        bytes.to_vec(),
        vec![0x2A, 0x02, b's', b'q', 0x4D, 0x07, 0x00, 0x00, 0x00]
    );
    assert_eq!(deserialize::<Drawing>(&bytes).unwrap(), value);

    let value = Drawing {
        shape: Some(Shape::Radius(0.0)),
        label: String::new(),
    };
    let bytes = serialize(&value);
    assert_eq!(bytes.to_vec(), vec![0x09, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(deserialize::<Drawing>(&bytes).unwrap(), value);
}
