// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colour-keyed material slots.
//!
//! Buildings may carry `building:colour` / `roof:colour` tags. The cache maps
//! each distinct colour to a slot id like `wall#a0522d` so that all features
//! sharing a colour share one material downstream. The cache belongs to the
//! generation session and is cleared between passes.

use rustc_hash::FxHashMap;
use std::sync::{Mutex, MutexGuard};

/// Named colours understood besides hex notation
const NAMED_COLOURS: &[(&str, [u8; 3])] = &[
    ("black", [0x00, 0x00, 0x00]),
    ("white", [0xff, 0xff, 0xff]),
    ("grey", [0x80, 0x80, 0x80]),
    ("gray", [0x80, 0x80, 0x80]),
    ("silver", [0xc0, 0xc0, 0xc0]),
    ("red", [0xff, 0x00, 0x00]),
    ("maroon", [0x80, 0x00, 0x00]),
    ("brown", [0xa5, 0x2a, 0x2a]),
    ("sienna", [0xa0, 0x52, 0x2d]),
    ("orange", [0xff, 0xa5, 0x00]),
    ("yellow", [0xff, 0xff, 0x00]),
    ("beige", [0xf5, 0xf5, 0xdc]),
    ("tan", [0xd2, 0xb4, 0x8c]),
    ("green", [0x00, 0x80, 0x00]),
    ("olive", [0x80, 0x80, 0x00]),
    ("blue", [0x00, 0x00, 0xff]),
    ("navy", [0x00, 0x00, 0x80]),
    ("teal", [0x00, 0x80, 0x80]),
    ("purple", [0x80, 0x00, 0x80]),
    ("pink", [0xff, 0xc0, 0xcb]),
];

/// Parse `#rgb`, `#rrggbb` (hash optional) or a named colour
pub fn parse_colour(value: &str) -> Option<[u8; 3]> {
    let value = value.trim().to_ascii_lowercase();

    if let Some(&(_, rgb)) = NAMED_COLOURS.iter().find(|(name, _)| *name == value) {
        return Some(rgb);
    }

    let hex = value.strip_prefix('#').unwrap_or(&value);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let d = c.to_digit(16)? as u8;
                rgb[i] = d * 17;
            }
            Some(rgb)
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            }
            Some(rgb)
        }
        _ => None,
    }
}

/// Session-scoped colour → slot cache, shared across worker threads
#[derive(Debug, Default)]
pub struct MaterialCache {
    slots: Mutex<FxHashMap<(String, [u8; 3]), String>>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<(String, [u8; 3]), String>> {
        // A panic elsewhere cannot leave the map half-written
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Slot id for `base` tinted by `colour`.
    ///
    /// Returns `base` unchanged when there is no colour or it does not parse.
    pub fn resolve(&self, base: &str, colour: Option<&str>) -> String {
        let Some(rgb) = colour.and_then(parse_colour) else {
            return base.to_string();
        };

        let mut slots = self.lock();
        slots
            .entry((base.to_string(), rgb))
            .or_insert_with(|| format!("{}#{:02x}{:02x}{:02x}", base, rgb[0], rgb[1], rgb[2]))
            .clone()
    }

    /// Number of distinct coloured slots handed out
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coloured slot ids handed out so far, sorted
    pub fn slots(&self) -> Vec<String> {
        let mut slots: Vec<String> = self.lock().values().cloned().collect();
        slots.sort();
        slots
    }

    /// Forget every colour (start of a new pass)
    pub fn reset(&self) {
        self.lock().clear();
    }
}
