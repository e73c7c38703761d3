//! What a market cell has on its shelves.
//! Stock is a pure function of the session seed, the cell, and the party's best
//! level, so a market shows the same goods on every visit until someone levels up.
//! Buying does not deplete it.

use std::collections::HashMap;
use std::mem;

use crate::catalog::Catalog;
use crate::equipment::Item;
use crate::rng::{GameRng, shuffle};
use crate::types::Pos;

/// Items the party can already use, at most.
pub const USABLE_LIMIT: usize = 12;
/// Shelf size once higher-level previews are added.
pub const STOCK_LIMIT: usize = 16;
const USABLE_PER_LEVEL: usize = 4;
const PREVIEW_PER_LEVEL: usize = 2;
const USABLE_PER_KIND: usize = 2;
const LEVELS_BELOW: u32 = 2;
const PREVIEW_LEVELS: u32 = 3;

const MARKET_STREAM: u64 = 0x4d41_524b_4554_0000;

fn stream_for(at: Pos) -> u64 {
    MARKET_STREAM ^ (u64::from(at.y as u32) << 20) ^ u64::from(at.x as u32)
}

/// Shelf for the market at `at`. Usable goods come first, grouped by level from
/// `party_level - 2` up, then up to two previews from each of the next three levels.
pub fn stock<'c>(catalog: &'c Catalog, seed: u64, at: Pos, party_level: u32) -> Vec<&'c Item> {
    let mut shelf: Vec<&Item> = catalog.items.iter().collect();
    shuffle(&mut GameRng::stream(seed, stream_for(at)), &mut shelf);

    let level = party_level.max(1);
    let mut stock = Vec::with_capacity(STOCK_LIMIT);
    let mut per_kind = HashMap::new();
    for tier in level.saturating_sub(LEVELS_BELOW).max(1)..=level {
        for &item in shelf.iter().filter(|item| item.min_level == tier).take(USABLE_PER_LEVEL) {
            if stock.len() >= USABLE_LIMIT {
                break;
            }
            let count = per_kind.entry(mem::discriminant(&item.kind)).or_insert(0_usize);
            if *count < USABLE_PER_KIND {
                *count += 1;
                stock.push(item);
            }
        }
    }
    for tier in level + 1..=level + PREVIEW_LEVELS {
        for &item in shelf.iter().filter(|item| item.min_level == tier).take(PREVIEW_PER_LEVEL) {
            if stock.len() >= STOCK_LIMIT {
                break;
            }
            stock.push(item);
        }
    }
    stock
}
