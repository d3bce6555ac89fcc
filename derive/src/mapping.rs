//! Field-number assignment for derived messages.
//!
//! Members are numbered either implicitly (`first_field_number + i`) or all
//! explicitly. The resulting table answers both directions: index to numbers
//! for the generated `FIELD_NUMBERS`, and number to index for decoding. It
//! also fixes the ascending order in which the encoder visits fields.

use std::fmt;
use std::ops::RangeInclusive;

use itertools::Itertools;

pub const MIN_FIELD_NUMBER: u64 = 1;
pub const MAX_FIELD_NUMBER: u64 = 536_870_911;
/// Numbers reserved for the protobuf implementation itself.
pub const RESERVED_FIELD_NUMBERS: RangeInclusive<u64> = 19_000..=19_999;

/// How one struct member gets its field number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numbering {
    /// Next number in declaration order.
    Implicit,
    /// `#[pb(number = N)]`
    Explicit(u64),
    /// `#[pb(oneof(N, M, ...))]`: the member owns several numbers and does
    /// not take an implicit slot.
    Oneof(Vec<u64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    Invalid { member: usize, number: u64 },
    Reserved { member: usize, number: u64 },
    Duplicate { member: usize, number: u64, first: usize },
    Partial { member: usize },
    FirstWithExplicit { member: usize },
    EmptyOneof { member: usize },
}

impl MappingError {
    /// Index of the member the error should point at.
    pub fn member(&self) -> usize {
        match *self {
            MappingError::Invalid { member, .. }
            | MappingError::Reserved { member, .. }
            | MappingError::Duplicate { member, .. }
            | MappingError::Partial { member }
            | MappingError::FirstWithExplicit { member }
            | MappingError::EmptyOneof { member } => member,
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::Invalid { number, .. } => write!(
                f,
                "field number {} is out of range (must be {}..={})",
                number, MIN_FIELD_NUMBER, MAX_FIELD_NUMBER
            ),
            MappingError::Reserved { number, .. } => write!(
                f,
                "field number {} is in the reserved range {}..={}",
                number,
                RESERVED_FIELD_NUMBERS.start(),
                RESERVED_FIELD_NUMBERS.end()
            ),
            MappingError::Duplicate { number, .. } => {
                write!(f, "field number {} is used more than once", number)
            }
            MappingError::Partial { .. } => write!(
                f,
                "missing #[pb(number = ...)]: once one field has an explicit number, every field needs one"
            ),
            MappingError::FirstWithExplicit { .. } => write!(
                f,
                "explicit field numbers cannot be combined with #[pb(first_field_number = ...)]"
            ),
            MappingError::EmptyOneof { .. } => write!(f, "oneof must list at least one field number"),
        }
    }
}

/// Validated field numbers of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNumberMap {
    by_index: Vec<Vec<u32>>,
    sorted: Vec<(u32, usize)>,
}

impl FieldNumberMap {
    /// Assigns and validates numbers for `members` in declaration order.
    /// `first` is the container's `first_field_number`, if given.
    pub fn build(members: &[Numbering], first: Option<u64>) -> Result<Self, MappingError> {
        let explicit = members
            .iter()
            .position(|m| matches!(m, Numbering::Explicit(_)));
        if let Some(member) = explicit {
            if first.is_some_and(|first| first != MIN_FIELD_NUMBER) {
                return Err(MappingError::FirstWithExplicit { member });
            }
            if let Some(member) = members.iter().position(|m| *m == Numbering::Implicit) {
                return Err(MappingError::Partial { member });
            }
        }

        let mut next = first.unwrap_or(MIN_FIELD_NUMBER);
        let mut by_index = Vec::with_capacity(members.len());
        for (member, numbering) in members.iter().enumerate() {
            let numbers = match numbering {
                Numbering::Implicit => {
                    let number = next;
                    next = next.saturating_add(1);
                    vec![number]
                }
                Numbering::Explicit(number) => vec![*number],
                Numbering::Oneof(numbers) if numbers.is_empty() => {
                    return Err(MappingError::EmptyOneof { member });
                }
                Numbering::Oneof(numbers) => numbers.clone(),
            };
            by_index.push(
                numbers
                    .into_iter()
                    .map(|number| check_number(member, number))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }

        let sorted: Vec<(u32, usize)> = by_index
            .iter()
            .enumerate()
            .flat_map(|(member, numbers)| numbers.iter().map(move |&number| (number, member)))
            .sorted()
            .collect();
        if let Some(((number, first), (_, member))) = sorted
            .iter()
            .tuple_windows()
            .find(|((a, _), (b, _))| a == b)
        {
            return Err(MappingError::Duplicate {
                member: *member,
                number: u64::from(*number),
                first: *first,
            });
        }

        Ok(Self { by_index, sorted })
    }

    /// Numbers owned by member `index`; more than one only for a oneof.
    pub fn numbers(&self, index: usize) -> &[u32] {
        &self.by_index[index]
    }

    /// All numbers in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_index.iter().flatten().copied()
    }

    pub fn index_of(&self, number: u32) -> Option<usize> {
        self.sorted
            .binary_search_by_key(&number, |&(n, _)| n)
            .ok()
            .map(|pos| self.sorted[pos].1)
    }

    /// `(number, member index)` pairs in ascending number order.
    pub fn sorted(&self) -> &[(u32, usize)] {
        &self.sorted
    }
}

fn check_number(member: usize, number: u64) -> Result<u32, MappingError> {
    if !(MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&number) {
        return Err(MappingError::Invalid { member, number });
    }
    if RESERVED_FIELD_NUMBERS.contains(&number) {
        return Err(MappingError::Reserved { member, number });
    }
    Ok(number as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_numbering() {
        let map = FieldNumberMap::build(&vec![Numbering::Implicit; 3], None).unwrap();
        assert_eq!(map.declared().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(map.index_of(2), Some(1));
        assert_eq!(map.index_of(4), None);
    }

    #[test]
    fn test_first_field_number_shifts_implicit() {
        let map = FieldNumberMap::build(&vec![Numbering::Implicit; 2], Some(3)).unwrap();
        assert_eq!(map.numbers(0), &[3]);
        assert_eq!(map.numbers(1), &[4]);
    }

    #[test]
    fn test_explicit_numbers_sorted_for_encoding() {
        let members: Vec<_> = [6, 3, 4, 5, 1, 128]
            .into_iter()
            .map(Numbering::Explicit)
            .collect();
        let map = FieldNumberMap::build(&members, None).unwrap();
        assert_eq!(
            map.sorted(),
            &[(1, 4), (3, 1), (4, 2), (5, 3), (6, 0), (128, 5)]
        );
        assert_eq!(map.index_of(128), Some(5));
        assert_eq!(map.index_of(2), None);
    }

    #[test]
    fn test_oneof_owns_several_numbers() {
        let members = vec![
            Numbering::Implicit,
            Numbering::Oneof(vec![5, 6]),
            Numbering::Implicit,
        ];
        let map = FieldNumberMap::build(&members, None).unwrap();
        assert_eq!(map.declared().collect::<Vec<_>>(), vec![1, 5, 6, 2]);
        assert_eq!(map.index_of(6), Some(1));
        assert_eq!(map.index_of(2), Some(2));
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let members = vec![
            Numbering::Explicit(2),
            Numbering::Explicit(7),
            Numbering::Explicit(2),
        ];
        assert_eq!(
            FieldNumberMap::build(&members, None),
            Err(MappingError::Duplicate {
                member: 2,
                number: 2,
                first: 0
            })
        );
    }

    #[test]
    fn test_oneof_collision_with_implicit() {
        let members = vec![Numbering::Implicit, Numbering::Oneof(vec![1])];
        assert!(matches!(
            FieldNumberMap::build(&members, None),
            Err(MappingError::Duplicate { number: 1, .. })
        ));
    }

    #[test]
    fn test_out_of_range_and_reserved() {
        assert_eq!(
            FieldNumberMap::build(&[Numbering::Explicit(0)], None),
            Err(MappingError::Invalid {
                member: 0,
                number: 0
            })
        );
        assert!(matches!(
            FieldNumberMap::build(&[Numbering::Explicit(MAX_FIELD_NUMBER + 1)], None),
            Err(MappingError::Invalid { .. })
        ));
        assert!(matches!(
            FieldNumberMap::build(&[Numbering::Explicit(19_500)], None),
            Err(MappingError::Reserved { .. })
        ));
        assert!(matches!(
            FieldNumberMap::build(&[Numbering::Implicit], Some(0)),
            Err(MappingError::Invalid { .. })
        ));
    }

    #[test]
    fn test_explicit_rules() {
        let members = vec![Numbering::Explicit(1), Numbering::Implicit];
        assert_eq!(
            FieldNumberMap::build(&members, None),
            Err(MappingError::Partial { member: 1 })
        );
        assert_eq!(
            FieldNumberMap::build(&[Numbering::Explicit(1)], Some(3)),
            Err(MappingError::FirstWithExplicit { member: 0 })
        );
        assert!(FieldNumberMap::build(&[Numbering::Explicit(4)], Some(1)).is_ok());
        assert_eq!(
            FieldNumberMap::build(&[Numbering::Oneof(vec![])], None),
            Err(MappingError::EmptyOneof { member: 0 })
        );
    }
}
