//! Board constants and scoring tables used throughout the crate.

/// Index of a street on a player sheet (0-2).
pub type StreetId = usize;

/// Number of streets on every player sheet.
pub const STREET_COUNT: usize = 3;

/// Number of house slots in each street.
pub const STREET_LENS: [usize; STREET_COUNT] = [10, 11, 12];

/// Maximum number of parks that can be built in each street.
pub const PARK_MAXES: [u8; STREET_COUNT] = [3, 4, 5];

/// Slot index of each of the three pools, per street.
pub const POOL_LOCS: [[usize; 3]; STREET_COUNT] = [[2, 6, 7], [0, 3, 7], [1, 6, 10]];

/// Maximum number of agent cross-outs for each estate size (1-6).
pub const AGENT_MAXES: [u8; 6] = [1, 2, 3, 4, 4, 4];

/// Highest number a house can carry.
pub const MAX_HOUSE_NUMBER: u8 = 17;

/// Range of numbers printed on construction cards.
pub const MIN_CARD_NUMBER: u8 = 1;
pub const MAX_CARD_NUMBER: u8 = 15;

pub const MAX_REFUSALS: u8 = 3;
pub const MAX_TEMPS: u8 = 11;
pub const MAX_ROUNDABOUTS: usize = 2;

/// Largest score a single city plan may award.
pub const MAX_PLAN_SCORE: u32 = 99;

/// Largest estate that still scores.
pub const MAX_ESTATE_SIZE: usize = 6;

/// How far a temp effect may shift a card number in either direction.
pub const TEMP_SHIFT: u8 = 2;

/// Points for the first, second and third highest distinct temp counts.
pub const TEMP_SCORES: [i32; 3] = [7, 4, 1];

/// Points indexed by the total number of pools built.
pub const POOLS_SCORE: [i32; 10] = [0, 3, 6, 9, 13, 17, 21, 26, 31, 36];

/// Penalty indexed by the total number of bis houses.
pub const BIS_PENALTY: [i32; 10] = [0, 1, 3, 6, 9, 12, 16, 20, 24, 28];

/// Penalty indexed by refusals taken.
pub const REFUSAL_PENALTY: [i32; 4] = [0, 0, 3, 5];

/// Penalty indexed by roundabouts played.
pub const ROUNDABOUT_PENALTY: [i32; 3] = [0, 3, 8];

/// Value of one estate, indexed by `[size - 1][agents used for that size]`.
pub const ESTATE_SCORES: [&[i32]; MAX_ESTATE_SIZE] = [
    &[1, 3],
    &[2, 3, 4],
    &[3, 4, 5, 6],
    &[4, 5, 6, 7, 8],
    &[5, 6, 7, 8, 10],
    &[6, 7, 8, 10, 12],
];

/// Look up `table[index]`, saturating at the last entry.
pub fn clamped(table: &[i32], index: usize) -> i32 {
    match table.get(index) {
        Some(value) => *value,
        None => table.last().copied().unwrap_or(0),
    }
}

/// Find the slot index of pool `pool` in street `street`.
pub const fn pool_slot(street: StreetId, pool: usize) -> usize {
    POOL_LOCS[street][pool]
}

/// Find which pool (if any) sits on slot `index` of `street`.
pub fn pool_at(street: StreetId, index: usize) -> Option<usize> {
    POOL_LOCS
        .get(street)
        .and_then(|locs| locs.iter().position(|&slot| slot == index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_lookup() {
        assert_eq!(clamped(&REFUSAL_PENALTY, 2), 3);
        assert_eq!(clamped(&REFUSAL_PENALTY, 9), 5);
        assert_eq!(clamped(&BIS_PENALTY, 14), 28);
        assert_eq!(clamped(&[], 0), 0);
    }

    #[test]
    fn test_pool_lookup() {
        assert_eq!(pool_at(0, 6), Some(1));
        assert_eq!(pool_at(2, 10), Some(2));
        assert_eq!(pool_at(1, 1), None);
        assert_eq!(pool_slot(1, 0), 0);
    }

    #[test]
    fn test_estate_tables_cover_agent_maxes() {
        for (size, row) in ESTATE_SCORES.iter().enumerate() {
            assert_eq!(row.len(), AGENT_MAXES[size] as usize + 1);
        }
    }
}
